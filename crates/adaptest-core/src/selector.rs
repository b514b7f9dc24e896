//! Next-difficulty selection.

use crate::error::{CatError, Result};
use crate::logit::{linear_to_logit, logit_to_fraction, round_to};
use crate::model::{AnswerOutcome, AnsweredSummary, AttemptCatState, DifficultyRange, ItemRef};

/// Compute the next difficulty level from the last answer.
///
/// The logit of the last level is moved by `2 / attempted` towards harder
/// questions after a correct answer and towards easier ones after an
/// incorrect answer, then mapped back onto the linear scale. The result is
/// not clamped.
pub fn compute_next_difficulty(
    attempted: u32,
    last_correct: bool,
    range: &DifficultyRange,
    logit: f64,
) -> Result<i32> {
    if attempted == 0 {
        return Err(CatError::ZeroAttempts);
    }
    let step = 2.0 / f64::from(attempted);
    let adjusted = if last_correct { logit + step } else { logit - step };

    let p = round_to(logit_to_fraction(adjusted), 2);
    let level = f64::from(range.lowest()) + p * range.span() as f64;
    Ok(level.round() as i32)
}

/// State and level reconstructed from a run's answer history.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Replay {
    pub state: AttemptCatState,
    pub summary: AnsweredSummary,
    /// Level the selector points at after the last answer, kept in range.
    pub next_level: Option<i32>,
}

/// Feed every answered item, in order, through the estimator and the
/// difficulty selector.
pub fn replay_history(
    answered: &[(ItemRef, AnswerOutcome)],
    range: &DifficultyRange,
) -> Result<Replay> {
    let mut state = AttemptCatState::default();
    let mut summary = AnsweredSummary::default();
    let mut next_level = None;

    for (item, outcome) in answered {
        summary.record(*outcome);
        state.record_answer(item.level, range, summary)?;
        let level = compute_next_difficulty(
            state.questions_attempted,
            outcome.is_correct(),
            range,
            linear_to_logit(item.level, range),
        )?;
        next_level = Some(range.clamp(level));
    }

    Ok(Replay {
        state,
        summary,
        next_level,
    })
}
