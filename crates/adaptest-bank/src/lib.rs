//! adaptest-bank: Question banks and simulated test runs.
//!
//! An in-memory [`bank::QuestionBank`] that serves as the question pool of
//! the adaptive core, a TOML loader for banks, a simulated test-taker that
//! answers according to the Rasch model, and a driver that runs a complete
//! adaptive test and records it as a [`simulation::SimulationReport`].

pub mod bank;
pub mod parser;
pub mod respondent;
pub mod simulation;
