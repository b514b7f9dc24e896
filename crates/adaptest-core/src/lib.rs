//! adaptest-core: Computerized adaptive testing engine.
//!
//! This crate holds the decision core of an adaptive test: conversions
//! between the linear difficulty scale and logits, ability and standard
//! error estimation, next-difficulty selection, the stopping rules, the
//! nearest-level question search, and the item administration cycle that
//! ties them together. Storage, the question pool and grading are supplied
//! by the host through the traits in [`traits`].

pub mod administration;
pub mod availability;
pub mod config;
pub mod error;
pub mod estimator;
pub mod logit;
pub mod model;
pub mod selector;
pub mod stopping;
pub mod store;
pub mod traits;
