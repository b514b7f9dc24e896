//! Core data model types for adaptest.
//!
//! These are the value types every component of the adaptive testing core
//! shares: the difficulty scale, administered items, answer outcomes, the
//! cumulative per-run state and the results of one administration cycle.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CatError, Result};

/// Identifier of one adaptive test run (one test-taker's attempt).
pub type RunId = Uuid;

/// Standard error recorded before any question has been answered.
pub const UNKNOWN_STANDARD_ERROR: f64 = 999.0;

/// Bounds of the linear difficulty scale for one test configuration.
///
/// Always satisfies `lowest < highest`; the constructor and the serde
/// deserializer both reject anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawRange")]
pub struct DifficultyRange {
    lowest: i32,
    highest: i32,
}

#[derive(Deserialize)]
struct RawRange {
    lowest: i32,
    highest: i32,
}

impl TryFrom<RawRange> for DifficultyRange {
    type Error = CatError;

    fn try_from(raw: RawRange) -> Result<Self> {
        DifficultyRange::new(raw.lowest, raw.highest)
    }
}

impl DifficultyRange {
    pub fn new(lowest: i32, highest: i32) -> Result<Self> {
        if lowest >= highest {
            return Err(CatError::InvalidRange { lowest, highest });
        }
        Ok(Self { lowest, highest })
    }

    pub fn lowest(&self) -> i32 {
        self.lowest
    }

    pub fn highest(&self) -> i32 {
        self.highest
    }

    /// Width of the scale, `highest - lowest`. Always positive; widened so
    /// that the full `i32` scale does not overflow.
    pub fn span(&self) -> i64 {
        i64::from(self.highest) - i64::from(self.lowest)
    }

    pub fn contains(&self, level: i32) -> bool {
        (self.lowest..=self.highest).contains(&level)
    }

    pub fn clamp(&self, level: i32) -> i32 {
        level.clamp(self.lowest, self.highest)
    }
}

impl Default for DifficultyRange {
    fn default() -> Self {
        Self {
            lowest: 1,
            highest: 100,
        }
    }
}

impl fmt::Display for DifficultyRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.lowest, self.highest)
    }
}

/// Identifier of a question in the question pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u64);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// A question that has been placed into a run at a given slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemRef {
    /// 1-based position of the item within the run.
    pub slot: u32,
    /// The question served in this slot.
    pub question_id: QuestionId,
    /// Difficulty level the question was served at.
    pub level: i32,
}

/// Whether a graded item was answered correctly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerOutcome {
    Correct,
    Incorrect,
}

impl AnswerOutcome {
    pub fn from_correct(correct: bool) -> Self {
        if correct {
            AnswerOutcome::Correct
        } else {
            AnswerOutcome::Incorrect
        }
    }

    pub fn is_correct(self) -> bool {
        self == AnswerOutcome::Correct
    }
}

impl fmt::Display for AnswerOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnswerOutcome::Correct => write!(f, "correct"),
            AnswerOutcome::Incorrect => write!(f, "incorrect"),
        }
    }
}

/// Counts of correct and incorrect answers across a run's history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsweredSummary {
    pub correct: u32,
    pub incorrect: u32,
}

impl AnsweredSummary {
    pub fn new(correct: u32, incorrect: u32) -> Self {
        Self { correct, incorrect }
    }

    pub fn total(&self) -> u32 {
        self.correct + self.incorrect
    }

    pub fn record(&mut self, outcome: AnswerOutcome) {
        match outcome {
            AnswerOutcome::Correct => self.correct += 1,
            AnswerOutcome::Incorrect => self.incorrect += 1,
        }
    }
}

impl FromIterator<AnswerOutcome> for AnsweredSummary {
    fn from_iter<I: IntoIterator<Item = AnswerOutcome>>(iter: I) -> Self {
        let mut summary = AnsweredSummary::default();
        for outcome in iter {
            summary.record(outcome);
        }
        summary
    }
}

/// Cumulative estimation state persisted for one run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttemptCatState {
    /// Sum of the logits of every level answered so far.
    pub difficulty_sum: f64,
    /// Standard error of the ability estimate, in logits.
    pub standard_error: f64,
    /// Ability measure, in logits.
    pub ability_measure: f64,
    /// Number of questions answered so far.
    pub questions_attempted: u32,
    /// Set once the run has stopped. A stopped run is never resumed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stopped: Option<StopReason>,
}

impl Default for AttemptCatState {
    fn default() -> Self {
        Self {
            difficulty_sum: 0.0,
            standard_error: UNKNOWN_STANDARD_ERROR,
            ability_measure: 0.0,
            questions_attempted: 0,
            stopped: None,
        }
    }
}

/// Why a run stopped. Every variant is a normal termination except
/// [`StopReason::SumMismatch`], which flags data drift between the session
/// store and the answer history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StopReason {
    /// The answered summary disagrees with the attempted count.
    SumMismatch { attempted: u32, answered: u32 },
    /// The standard error dropped to the configured limit.
    ErrorWithinLimits {
        calculated_percent: u32,
        configured_percent: u32,
    },
    /// The configured maximum number of questions has been attempted.
    MaximumQuestionsAttempted { maximum: u32 },
    /// The next level fell outside the difficulty range.
    LevelOutOfBounds { level: i32 },
    /// No unused question exists anywhere in the searchable range.
    NoQuestionAvailable { level: i32 },
}

impl StopReason {
    pub fn is_consistency_warning(&self) -> bool {
        matches!(self, StopReason::SumMismatch { .. })
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::SumMismatch {
                attempted,
                answered,
            } => write!(
                f,
                "sum mismatch: {attempted} questions attempted but {answered} answers recorded"
            ),
            StopReason::ErrorWithinLimits {
                calculated_percent,
                configured_percent,
            } => write!(
                f,
                "error within configured limits: calculated {calculated_percent}%, configured {configured_percent}%"
            ),
            StopReason::MaximumQuestionsAttempted { maximum } => {
                write!(f, "maximum questions attempted ({maximum})")
            }
            StopReason::LevelOutOfBounds { level } => {
                write!(f, "level out of bounds: {level}")
            }
            StopReason::NoQuestionAvailable { level } => {
                write!(f, "no question available at level {level}")
            }
        }
    }
}

/// Result of the stopping evaluator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextDifficultyDecision {
    Stop(StopReason),
    Continue(i32),
}

/// The item to serve next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionRef {
    /// A question not yet placed in the run, found at `level`.
    Fresh { question_id: QuestionId, level: i32 },
    /// An item already shown but not answered; serve it again.
    Resume(ItemRef),
}

impl QuestionRef {
    pub fn question_id(&self) -> QuestionId {
        match self {
            QuestionRef::Fresh { question_id, .. } => *question_id,
            QuestionRef::Resume(item) => item.question_id,
        }
    }

    pub fn level(&self) -> i32 {
        match self {
            QuestionRef::Fresh { level, .. } => *level,
            QuestionRef::Resume(item) => item.level,
        }
    }
}

/// Result of one item administration cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemAdministrationOutcome {
    Stop(StopReason),
    NextItem(QuestionRef),
}

impl ItemAdministrationOutcome {
    pub fn is_stop(&self) -> bool {
        matches!(self, ItemAdministrationOutcome::Stop(_))
    }

    pub fn stop_reason(&self) -> Option<&StopReason> {
        match self {
            ItemAdministrationOutcome::Stop(reason) => Some(reason),
            ItemAdministrationOutcome::NextItem(_) => None,
        }
    }

    pub fn next_item(&self) -> Option<&QuestionRef> {
        match self {
            ItemAdministrationOutcome::Stop(_) => None,
            ItemAdministrationOutcome::NextItem(question) => Some(question),
        }
    }
}

/// Which questions of the pool a test configuration draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolScope {
    /// Question categories in scope. Empty means every category.
    #[serde(default)]
    pub category_ids: Vec<u64>,
    /// Tag prefixes that mark a question's difficulty (e.g. `adpq_`).
    #[serde(default = "default_tag_prefixes")]
    pub tag_prefixes: Vec<String>,
}

/// Tag prefix used when a configuration names none.
pub const DEFAULT_TAG_PREFIX: &str = "adpq_";

fn default_tag_prefixes() -> Vec<String> {
    vec![DEFAULT_TAG_PREFIX.to_string()]
}

impl Default for PoolScope {
    fn default() -> Self {
        Self {
            category_ids: Vec::new(),
            tag_prefixes: default_tag_prefixes(),
        }
    }
}

impl PoolScope {
    pub fn includes_category(&self, category_id: u64) -> bool {
        self.category_ids.is_empty() || self.category_ids.contains(&category_id)
    }
}
