//! Conversions between the linear difficulty scale, logits and percentages.
//!
//! A logit is the log-odds `ln(p / (1 - p))` of a fraction `p` of the
//! difficulty scale. None of the functions here return an infinite value.

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::error::{CatError, Result};
use crate::model::DifficultyRange;

/// A finite difficulty or ability value on the logistic scale.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct DifficultyLogit(f64);

impl DifficultyLogit {
    pub fn new(value: f64) -> Result<Self> {
        if !value.is_finite() {
            return Err(CatError::InfiniteLogit(value));
        }
        Ok(Self(value))
    }

    /// Logit of a level on the linear scale; see [`linear_to_logit`].
    pub fn from_level(level: i32, range: &DifficultyRange) -> Self {
        Self(linear_to_logit(level, range))
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for DifficultyLogit {
    type Error = CatError;

    fn try_from(value: f64) -> Result<Self> {
        DifficultyLogit::new(value)
    }
}

impl From<DifficultyLogit> for f64 {
    fn from(logit: DifficultyLogit) -> f64 {
        logit.0
    }
}

impl Add for DifficultyLogit {
    type Output = DifficultyLogit;

    /// Panics if the sum overflows to infinity.
    fn add(self, rhs: Self) -> Self::Output {
        let sum = self.0 + rhs.0;
        assert!(
            sum.is_finite(),
            "difficulty logit sum overflowed: {} + {}",
            self.0,
            rhs.0
        );
        DifficultyLogit(sum)
    }
}

impl AddAssign for DifficultyLogit {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sum for DifficultyLogit {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(DifficultyLogit::default(), Add::add)
    }
}

/// Round half away from zero to `places` decimal places.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn logit(p: f64) -> f64 {
    (p / (1.0 - p)).ln()
}

/// Map a level onto the logit scale.
///
/// The fraction `(level - lowest) / (highest - lowest)` is pulled in by half
/// a scale step at the top end, and the infinite logit at the bottom end is
/// replaced by the logit of half a step. Levels outside the range are
/// treated as the nearest bound.
pub fn linear_to_logit(level: i32, range: &DifficultyRange) -> f64 {
    let span = range.span() as f64;
    let floor = 1.0 / span;
    let offset = i64::from(level) - i64::from(range.lowest());
    let mut p = (offset as f64 / span).clamp(0.0, 1.0);
    if p >= 1.0 {
        p = 1.0 - floor / 2.0;
    }

    let value = logit(p);
    if value.is_infinite() {
        let edge = logit(floor / 2.0).abs();
        return edge.copysign(value);
    }
    value
}

/// `ln((0.5 + percent) / (0.5 - percent))` for `percent` in `[0, 0.5)`.
pub fn percent_to_logit(percent: f64) -> Result<f64> {
    if !(0.0..0.5).contains(&percent) {
        return Err(CatError::PercentOutOfDomain(percent));
    }
    Ok(((0.5 + percent) / (0.5 - percent)).ln())
}

/// Inverse of [`percent_to_logit`] for non-negative logits.
pub fn logit_to_percent(logit: f64) -> Result<f64> {
    if logit.is_nan() || logit < 0.0 {
        return Err(CatError::NegativeLogit(logit));
    }
    Ok(1.0 / (1.0 + (-logit).exp()) - 0.5)
}

/// The logistic function `e^logit / (1 + e^logit)`.
pub fn logit_to_fraction(logit: f64) -> f64 {
    // Written as 1 / (1 + e^-x) so large positive logits do not overflow.
    1.0 / (1.0 + (-logit).exp())
}

/// Place a logit on the linear scale `[min, max]`.
pub fn map_logit_to_scale(logit: f64, max: i32, min: i32) -> f64 {
    (f64::from(max) - f64::from(min)) * logit_to_fraction(logit) + f64::from(min)
}
