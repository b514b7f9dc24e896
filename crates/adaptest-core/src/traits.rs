//! Collaborator traits the administration cycle consumes.
//!
//! The host implements these against its own storage. `adaptest-bank`
//! provides in-memory implementations of the pool and grading traits;
//! [`crate::store::MemoryStore`] implements the session store.

use std::collections::{BTreeMap, HashSet};

use crate::availability::DifficultyQuestionAvailability;
use crate::model::{
    AnswerOutcome, AttemptCatState, ItemRef, PoolScope, QuestionId, RunId, StopReason,
};

// ---------------------------------------------------------------------------
// Question pool
// ---------------------------------------------------------------------------

/// Source of questions tagged with a difficulty level.
///
/// Implementations only report questions within `scope`.
pub trait QuestionPool {
    /// Number of questions per level in `[min_level, max_level]`.
    fn count_available_by_difficulty(
        &self,
        scope: &PoolScope,
        min_level: i32,
        max_level: i32,
    ) -> anyhow::Result<BTreeMap<i32, u32>>;

    /// Questions tagged with any of `level_tags`, minus `exclude`.
    fn find_questions(
        &self,
        scope: &PoolScope,
        level_tags: &[String],
        exclude: &HashSet<QuestionId>,
    ) -> anyhow::Result<Vec<QuestionId>>;
}

// ---------------------------------------------------------------------------
// Answer grading
// ---------------------------------------------------------------------------

/// Grading state of items already placed in a run.
pub trait AnswerGrading {
    /// Whether the item has been answered and graded.
    fn is_graded(&self, item: &ItemRef) -> bool;

    /// Whether the graded answer was correct.
    fn is_correct(&self, item: &ItemRef) -> bool;

    /// The mark awarded, if graded.
    fn mark(&self, item: &ItemRef) -> Option<f64>;

    /// Outcome of the item, or `None` while it is ungraded.
    fn outcome(&self, item: &ItemRef) -> Option<AnswerOutcome> {
        self.is_graded(item)
            .then(|| AnswerOutcome::from_correct(self.is_correct(item)))
    }
}

// ---------------------------------------------------------------------------
// Session store
// ---------------------------------------------------------------------------

/// Per-run persistence of the cumulative state and the availability cache.
///
/// The availability mapping can be rebuilt from the pool at any time, so an
/// implementation may drop it freely.
pub trait SessionStore {
    fn load_state(&self, run: RunId) -> anyhow::Result<Option<AttemptCatState>>;

    fn save_state(&mut self, run: RunId, state: &AttemptCatState) -> anyhow::Result<()>;

    fn load_availability(
        &self,
        run: RunId,
    ) -> anyhow::Result<Option<DifficultyQuestionAvailability>>;

    fn save_availability(
        &mut self,
        run: RunId,
        availability: &DifficultyQuestionAvailability,
    ) -> anyhow::Result<()>;

    /// Remove everything stored for the run.
    fn purge(&mut self, run: RunId) -> anyhow::Result<()>;
}

// ---------------------------------------------------------------------------
// Run lifecycle
// ---------------------------------------------------------------------------

/// Notified when a run reaches its terminal state.
pub trait AttemptLifecycle {
    /// Called once, on the first cycle that returns `Stop`. Later cycles of
    /// a stopped run return the stored reason without calling it again.
    fn on_stopped(
        &mut self,
        run: RunId,
        reason: &StopReason,
        state: &AttemptCatState,
    ) -> anyhow::Result<()>;
}

/// Lifecycle listener that does nothing.
pub struct NoopLifecycle;

impl AttemptLifecycle for NoopLifecycle {
    fn on_stopped(&mut self, _: RunId, _: &StopReason, _: &AttemptCatState) -> anyhow::Result<()> {
        Ok(())
    }
}
