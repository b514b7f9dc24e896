//! Domain error types.
//!
//! These errors represent contract violations by the host: a non-finite
//! logit, a percentage outside the convertible domain, an estimator call with
//! nothing to estimate from, or an invalid test configuration. They are never
//! recovered inside the core. Normal test termination is not an error; see
//! [`crate::model::StopReason`].

use thiserror::Error;

/// Errors raised by the adaptive testing core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CatError {
    /// A logit was constructed from an infinite or NaN value.
    #[error("difficulty logit must be finite, got {0}")]
    InfiniteLogit(f64),

    /// A percentage outside `[0, 0.5)` was passed to a logit conversion.
    #[error("percent {0} is outside the convertible range [0, 0.5)")]
    PercentOutOfDomain(f64),

    /// A negative logit was passed where only non-negative values convert.
    #[error("logit {0} must be non-negative to convert to a percent")]
    NegativeLogit(f64),

    /// An estimator or selector was called with zero attempted questions.
    #[error("at least one attempted question is required")]
    ZeroAttempts,

    /// The answered summary holds neither correct nor incorrect answers.
    #[error("answered summary is empty (0 correct, 0 incorrect)")]
    NoAnsweredQuestions,

    /// The difficulty range does not satisfy `lowest < highest`.
    #[error("invalid difficulty range: lowest {lowest} must be below highest {highest}")]
    InvalidRange { lowest: i32, highest: i32 },

    /// Any other rejected test configuration value.
    #[error("invalid test configuration: {0}")]
    InvalidConfig(String),
}

impl CatError {
    /// Returns `true` for violations of a numeric contract, as opposed to a
    /// rejected configuration.
    pub fn is_domain_violation(&self) -> bool {
        !matches!(
            self,
            CatError::InvalidRange { .. } | CatError::InvalidConfig(_)
        )
    }
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CatError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        assert!(CatError::ZeroAttempts.is_domain_violation());
        assert!(CatError::InfiniteLogit(f64::INFINITY).is_domain_violation());
        assert!(!CatError::InvalidRange {
            lowest: 5,
            highest: 1
        }
        .is_domain_violation());
        assert!(!CatError::InvalidConfig("x".into()).is_domain_violation());
    }

    #[test]
    fn messages() {
        assert_eq!(
            CatError::PercentOutOfDomain(0.7).to_string(),
            "percent 0.7 is outside the convertible range [0, 0.5)"
        );
        assert_eq!(
            CatError::InvalidRange {
                lowest: 10,
                highest: 10
            }
            .to_string(),
            "invalid difficulty range: lowest 10 must be below highest 10"
        );
    }
}
