//! Whole-run simulation with JSON-persisted reports.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use adaptest_core::administration::{
    Collaborators, CycleRequest, DefaultItemAdministration, ItemAdministrationStrategy,
};
use adaptest_core::config::TestConfig;
use adaptest_core::estimator::{AbilityEstimate, ScaledAbility};
use adaptest_core::model::{
    AnswerOutcome, AttemptCatState, ItemAdministrationOutcome, ItemRef, QuestionId, QuestionRef,
    RunId, StopReason,
};
use adaptest_core::store::MemoryStore;
use adaptest_core::traits::{AnswerGrading, AttemptLifecycle, SessionStore};

use crate::bank::QuestionBank;
use crate::respondent::SimulatedRespondent;

/// One answered item of a simulated run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationStep {
    pub slot: u32,
    pub question_id: QuestionId,
    pub level: i32,
    pub outcome: AnswerOutcome,
    /// Estimates after this answer was recorded. Absent when the run
    /// stopped before the answer could be folded in.
    pub standard_error: Option<f64>,
    pub measure: Option<f64>,
}

/// A complete simulated run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationReport {
    /// Unique report identifier.
    pub id: Uuid,
    /// When the report was created.
    pub created_at: DateTime<Utc>,
    /// Bank the questions came from.
    pub bank_id: String,
    /// Configuration the run used.
    pub config: TestConfig,
    /// True ability of the simulated test-taker, on the linear scale.
    pub true_ability: i32,
    /// Seed of both the item selection and the respondent.
    pub seed: u64,
    pub steps: Vec<SimulationStep>,
    pub stop_reason: StopReason,
    pub final_estimate: Option<AbilityEstimate>,
    /// `final_estimate` placed back on the linear scale.
    pub estimated_ability: Option<ScaledAbility>,
    /// Sum of the marks of every answered item.
    pub raw_score: f64,
}

impl SimulationReport {
    /// Save the report as JSON to a file.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize report")?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, json)
            .with_context(|| format!("failed to write report to {}", path.display()))?;
        Ok(())
    }

    /// Load a report from a JSON file.
    pub fn load_json(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read report from {}", path.display()))?;
        let report: SimulationReport =
            serde_json::from_str(&content).context("failed to parse report JSON")?;
        Ok(report)
    }

    pub fn questions_attempted(&self) -> usize {
        self.steps.len()
    }

    /// Distance between the estimated and the true ability, on the linear
    /// scale.
    pub fn ability_error(&self) -> Option<f64> {
        self.estimated_ability
            .map(|scaled| scaled.level - f64::from(self.true_ability))
    }
}

/// Captures the terminal state handed to the lifecycle hook.
#[derive(Default)]
struct CompletionRecorder {
    stopped: Option<(StopReason, AttemptCatState)>,
}

impl AttemptLifecycle for CompletionRecorder {
    fn on_stopped(
        &mut self,
        run: RunId,
        reason: &StopReason,
        state: &AttemptCatState,
    ) -> Result<()> {
        if self.stopped.is_some() {
            anyhow::bail!("run {run} stopped twice");
        }
        self.stopped = Some((*reason, *state));
        Ok(())
    }
}

/// Drives one adaptive test against a bank with a simulated test-taker.
pub struct Simulation<'a> {
    config: &'a TestConfig,
    bank: &'a QuestionBank,
    seed: u64,
}

impl<'a> Simulation<'a> {
    pub fn new(config: &'a TestConfig, bank: &'a QuestionBank) -> Self {
        Self {
            config,
            bank,
            seed: 0,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run a full test for a test-taker whose true ability is `ability`.
    pub fn run(&self, ability: i32) -> Result<SimulationReport> {
        let config = self.config;
        config.validate()?;

        let run_id = Uuid::new_v4();
        let mut strategy = DefaultItemAdministration::seeded(self.seed);
        let mut respondent =
            SimulatedRespondent::seeded(ability, config.range, self.seed.wrapping_add(1));
        let mut store = MemoryStore::new();
        let mut recorder = CompletionRecorder::default();
        let mut history: Vec<ItemRef> = Vec::new();
        let mut steps: Vec<SimulationStep> = Vec::new();

        tracing::info!(
            run = %run_id,
            bank = %self.bank.id,
            ability,
            seed = self.seed,
            "starting simulation"
        );

        // Every cycle either stops or serves an item that is answered
        // straight away, so one cycle per question plus the final one.
        let max_cycles = config.maximum_questions as usize + 1;
        let stop_reason = loop {
            if history.len() > max_cycles {
                anyhow::bail!("run {run_id} did not stop after {max_cycles} cycles");
            }

            let outcome = {
                let mut collaborators = Collaborators {
                    pool: self.bank,
                    grading: respondent.sheet(),
                    store: &mut store,
                    lifecycle: &mut recorder,
                };
                strategy.administer(
                    config,
                    &CycleRequest::after_last(run_id, &history),
                    &mut collaborators,
                )?
            };

            if let (Some(step), Some(estimate)) = (
                steps.last_mut(),
                store.load_state(run_id)?.and_then(|s| s.estimate()),
            ) {
                if step.standard_error.is_none() {
                    step.standard_error = Some(estimate.standard_error);
                    step.measure = Some(estimate.measure);
                }
            }

            let item = match outcome {
                ItemAdministrationOutcome::Stop(reason) => break reason,
                ItemAdministrationOutcome::NextItem(QuestionRef::Fresh { question_id, level }) => {
                    ItemRef {
                        slot: history.len() as u32 + 1,
                        question_id,
                        level,
                    }
                }
                ItemAdministrationOutcome::NextItem(QuestionRef::Resume(item)) => {
                    tracing::warn!(run = %run_id, slot = item.slot, "resuming unanswered item");
                    history.pop();
                    steps.pop();
                    item
                }
            };

            let answer = respondent.respond(&item);
            history.push(item);
            steps.push(SimulationStep {
                slot: item.slot,
                question_id: item.question_id,
                level: item.level,
                outcome: answer,
                standard_error: None,
                measure: None,
            });
        };

        let final_state = match recorder.stopped.take() {
            Some((_, state)) => state,
            None => store.load_state(run_id)?.unwrap_or_default(),
        };
        store.purge(run_id)?;

        let final_estimate = final_state.estimate();
        let estimated_ability = final_estimate
            .map(|e| e.on_scale(&config.range))
            .transpose()?;
        let raw_score: f64 = history
            .iter()
            .filter_map(|item| respondent.sheet().mark(item))
            .sum();

        tracing::info!(
            run = %run_id,
            attempted = steps.len(),
            %stop_reason,
            measure = final_estimate.map(|e| e.measure),
            "simulation finished"
        );

        Ok(SimulationReport {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            bank_id: self.bank.id.clone(),
            config: config.clone(),
            true_ability: ability,
            seed: self.seed,
            steps,
            stop_reason,
            final_estimate,
            estimated_ability,
            raw_score,
        })
    }
}
