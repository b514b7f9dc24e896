//! Stopping rules.
//!
//! Until the configured minimum number of questions has been attempted the
//! evaluator always continues. Once the minimum is reached it stops as soon
//! as the standard error falls to the configured limit.

use crate::error::Result;
use crate::logit::{logit_to_percent, percent_to_logit};
use crate::model::{AnswerOutcome, AnsweredSummary, DifficultyRange, NextDifficultyDecision, StopReason};
use crate::selector::compute_next_difficulty;

/// Decide whether to stop, or which level to aim for next.
///
/// `configured_error_percent` is a percentage in `[0, 50)`; `logit` is the
/// logit of the last administered level.
#[allow(clippy::too_many_arguments)]
pub fn determine_next_difficulty(
    attempted: u32,
    range: &DifficultyRange,
    configured_error_percent: f64,
    outcome: AnswerOutcome,
    summary: AnsweredSummary,
    logit: f64,
    current_standard_error: f64,
    ready_to_stop: bool,
) -> Result<NextDifficultyDecision> {
    let next_level = compute_next_difficulty(attempted, outcome.is_correct(), range, logit)?;
    if !ready_to_stop {
        return Ok(NextDifficultyDecision::Continue(next_level));
    }

    if summary.total() != attempted {
        tracing::warn!(
            attempted,
            answered = summary.total(),
            "answered summary disagrees with attempted count"
        );
        return Ok(NextDifficultyDecision::Stop(StopReason::SumMismatch {
            attempted,
            answered: summary.total(),
        }));
    }

    let threshold = percent_to_logit(configured_error_percent / 100.0)?;
    if current_standard_error <= threshold {
        let calculated = logit_to_percent(current_standard_error)?;
        return Ok(NextDifficultyDecision::Stop(StopReason::ErrorWithinLimits {
            calculated_percent: (calculated * 100.0).round() as u32,
            configured_percent: configured_error_percent.round() as u32,
        }));
    }

    Ok(NextDifficultyDecision::Continue(next_level))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatError;
    use crate::logit::linear_to_logit;

    fn range() -> DifficultyRange {
        DifficultyRange::new(1, 100).unwrap()
    }

    #[test]
    fn continues_before_minimum() {
        let r = range();
        let logit = linear_to_logit(50, &r);
        let decision = determine_next_difficulty(
            3,
            &r,
            5.0,
            AnswerOutcome::Correct,
            // Would be a mismatch if it were checked.
            AnsweredSummary::new(1, 0),
            logit,
            0.01,
            false,
        )
        .unwrap();
        let expected = compute_next_difficulty(3, true, &r, logit).unwrap();
        assert_eq!(decision, NextDifficultyDecision::Continue(expected));
    }

    #[test]
    fn sum_mismatch_stops() {
        let r = range();
        for (outcome, error) in [
            (AnswerOutcome::Correct, 0.01),
            (AnswerOutcome::Incorrect, 5.0),
        ] {
            let decision = determine_next_difficulty(
                10,
                &r,
                5.0,
                outcome,
                AnsweredSummary::new(4, 4),
                0.3,
                error,
                true,
            )
            .unwrap();
            assert_eq!(
                decision,
                NextDifficultyDecision::Stop(StopReason::SumMismatch {
                    attempted: 10,
                    answered: 8
                })
            );
        }
    }

    #[test]
    fn stops_when_error_within_limit() {
        let r = range();
        // percent_to_logit(0.2) = ln(0.7 / 0.3) ~ 0.847
        let decision = determine_next_difficulty(
            10,
            &r,
            20.0,
            AnswerOutcome::Correct,
            AnsweredSummary::new(7, 3),
            0.0,
            0.69007,
            true,
        )
        .unwrap();
        assert_eq!(
            decision,
            NextDifficultyDecision::Stop(StopReason::ErrorWithinLimits {
                calculated_percent: 17,
                configured_percent: 20
            })
        );
    }

    #[test]
    fn continues_when_error_above_limit() {
        let r = range();
        let decision = determine_next_difficulty(
            10,
            &r,
            5.0,
            AnswerOutcome::Incorrect,
            AnsweredSummary::new(7, 3),
            0.0,
            0.69007,
            true,
        )
        .unwrap();
        assert!(matches!(decision, NextDifficultyDecision::Continue(_)));
    }

    #[test]
    fn configured_percent_out_of_domain_is_an_error() {
        let r = range();
        let err = determine_next_difficulty(
            2,
            &r,
            50.0,
            AnswerOutcome::Correct,
            AnsweredSummary::new(1, 1),
            0.0,
            1.0,
            true,
        );
        assert_eq!(err, Err(CatError::PercentOutOfDomain(0.5)));
    }
}
