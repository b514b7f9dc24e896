//! Ability estimation from answer counts.
//!
//! Both estimators use the counts of correct and incorrect answers. When one
//! of the counts is zero, the zero count is raised by 0.5 and the other count
//! lowered by 0.5 so the ratio stays finite.

use serde::{Deserialize, Serialize};

use crate::error::{CatError, Result};
use crate::logit::{logit_to_percent, map_logit_to_scale, round_to, DifficultyLogit};
use crate::model::{AnsweredSummary, AttemptCatState, DifficultyRange};

const DECIMALS: i32 = 5;

/// Numerator and denominator of the correct/incorrect odds ratio.
fn adjusted_counts(correct: u32, incorrect: u32) -> Result<(f64, f64)> {
    let (c, i) = (f64::from(correct), f64::from(incorrect));
    match (correct, incorrect) {
        (0, 0) => Err(CatError::NoAnsweredQuestions),
        (_, 0) => Ok((c - 0.5, i + 0.5)),
        (0, _) => Ok((c + 0.5, i - 0.5)),
        _ => Ok((c, i)),
    }
}

/// Standard error of the ability estimate, rounded to 5 decimals.
pub fn estimate_standard_error(attempted: u32, correct: u32, incorrect: u32) -> Result<f64> {
    if attempted == 0 {
        return Err(CatError::ZeroAttempts);
    }
    let (c, i) = adjusted_counts(correct, incorrect)?;
    Ok(round_to((f64::from(attempted) / (c * i)).sqrt(), DECIMALS))
}

/// Ability measure in logits, rounded to 5 decimals.
///
/// The mean difficulty logit plus the log-odds of answering correctly.
pub fn estimate_measure(
    difficulty_sum: f64,
    attempted: u32,
    correct: u32,
    incorrect: u32,
) -> Result<f64> {
    if attempted == 0 {
        return Err(CatError::ZeroAttempts);
    }
    let (c, i) = adjusted_counts(correct, incorrect)?;
    let measure = difficulty_sum / f64::from(attempted) + (c / i).ln();
    Ok(round_to(measure, DECIMALS))
}

/// A pair of fresh estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AbilityEstimate {
    pub standard_error: f64,
    pub measure: f64,
}

/// An estimate expressed on the linear difficulty scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledAbility {
    /// Ability placed on `[lowest, highest]`.
    pub level: f64,
    /// Standard error as a percentage (`0..50`).
    pub error_percent: f64,
}

impl AbilityEstimate {
    pub fn estimate(
        difficulty_sum: f64,
        attempted: u32,
        summary: AnsweredSummary,
    ) -> Result<Self> {
        Ok(Self {
            standard_error: estimate_standard_error(
                attempted,
                summary.correct,
                summary.incorrect,
            )?,
            measure: estimate_measure(
                difficulty_sum,
                attempted,
                summary.correct,
                summary.incorrect,
            )?,
        })
    }

    pub fn on_scale(&self, range: &DifficultyRange) -> Result<ScaledAbility> {
        Ok(ScaledAbility {
            level: round_to(
                map_logit_to_scale(self.measure, range.highest(), range.lowest()),
                2,
            ),
            error_percent: round_to(logit_to_percent(self.standard_error)? * 100.0, 2),
        })
    }
}

impl AttemptCatState {
    /// Fold one answered item at `level` into the cumulative state.
    ///
    /// `summary` must already include the new answer.
    pub fn record_answer(
        &mut self,
        level: i32,
        range: &DifficultyRange,
        summary: AnsweredSummary,
    ) -> Result<AbilityEstimate> {
        let sum = DifficultyLogit::new(self.difficulty_sum)?
            + DifficultyLogit::from_level(level, range);
        let attempted = self.questions_attempted + 1;
        let estimate = AbilityEstimate::estimate(sum.value(), attempted, summary)?;

        self.difficulty_sum = sum.value();
        self.questions_attempted = attempted;
        self.standard_error = estimate.standard_error;
        self.ability_measure = estimate.measure;
        Ok(estimate)
    }

    /// The current estimates, or `None` before the first answer.
    pub fn estimate(&self) -> Option<AbilityEstimate> {
        (self.questions_attempted > 0).then_some(AbilityEstimate {
            standard_error: self.standard_error,
            measure: self.ability_measure,
        })
    }
}
