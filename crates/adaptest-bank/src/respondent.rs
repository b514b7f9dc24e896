//! Simulated test-taker.
//!
//! Answers follow the Rasch model: the probability of a correct answer is
//! the logistic function of ability minus item difficulty, both in logits.

use std::collections::HashMap;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use adaptest_core::logit::{linear_to_logit, logit_to_fraction};
use adaptest_core::model::{AnswerOutcome, DifficultyRange, ItemRef};
use adaptest_core::traits::AnswerGrading;

/// Probability that a test-taker at `ability` answers an item at `level`
/// correctly.
pub fn rasch_probability(ability: i32, level: i32, range: &DifficultyRange) -> f64 {
    logit_to_fraction(linear_to_logit(ability, range) - linear_to_logit(level, range))
}

/// Graded answers keyed by slot.
#[derive(Debug, Clone, Default)]
pub struct AnswerSheet {
    answers: HashMap<u32, AnswerOutcome>,
}

impl AnswerSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, item: &ItemRef, outcome: AnswerOutcome) {
        self.answers.insert(item.slot, outcome);
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Number of correct answers.
    pub fn raw_score(&self) -> f64 {
        self.answers
            .values()
            .filter(|o| o.is_correct())
            .count() as f64
    }
}

impl AnswerGrading for AnswerSheet {
    fn is_graded(&self, item: &ItemRef) -> bool {
        self.answers.contains_key(&item.slot)
    }

    fn is_correct(&self, item: &ItemRef) -> bool {
        self.answers
            .get(&item.slot)
            .is_some_and(|o| o.is_correct())
    }

    fn mark(&self, item: &ItemRef) -> Option<f64> {
        self.answers
            .get(&item.slot)
            .map(|o| if o.is_correct() { 1.0 } else { 0.0 })
    }
}

/// A test-taker with a fixed true ability on the linear scale.
pub struct SimulatedRespondent<R = StdRng> {
    ability: i32,
    range: DifficultyRange,
    rng: R,
    sheet: AnswerSheet,
}

impl SimulatedRespondent<StdRng> {
    pub fn seeded(ability: i32, range: DifficultyRange, seed: u64) -> Self {
        Self::new(ability, range, StdRng::seed_from_u64(seed))
    }
}

impl<R: Rng> SimulatedRespondent<R> {
    pub fn new(ability: i32, range: DifficultyRange, rng: R) -> Self {
        Self {
            ability,
            range,
            rng,
            sheet: AnswerSheet::new(),
        }
    }

    pub fn ability(&self) -> i32 {
        self.ability
    }

    /// Answer `item` and record the outcome on the sheet.
    pub fn respond(&mut self, item: &ItemRef) -> AnswerOutcome {
        let p = rasch_probability(self.ability, item.level, &self.range);
        let outcome = AnswerOutcome::from_correct(self.rng.gen_bool(p.clamp(0.0, 1.0)));
        tracing::debug!(slot = item.slot, level = item.level, p, %outcome, "simulated answer");
        self.sheet.record(item, outcome);
        outcome
    }

    pub fn sheet(&self) -> &AnswerSheet {
        &self.sheet
    }
}
