//! Item administration: one question-answer cycle of an adaptive test.
//!
//! Each cycle looks at the item served last, folds its answer into the
//! cumulative state, asks the stopping rules whether to stop, and otherwise
//! picks the next question from the pool. Stopping is an ordinary outcome,
//! returned as [`ItemAdministrationOutcome::Stop`]; only contract violations
//! and collaborator failures are errors.

use std::collections::HashSet;

use anyhow::{Context, Result};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::availability::{fetch_questions, AvailabilityCache};
use crate::config::TestConfig;
use crate::logit::linear_to_logit;
use crate::model::{
    AnswerOutcome, AnsweredSummary, AttemptCatState, DifficultyRange, ItemAdministrationOutcome,
    ItemRef, NextDifficultyDecision, QuestionId, QuestionRef, RunId, StopReason,
};
use crate::selector::replay_history;
use crate::stopping::determine_next_difficulty;
use crate::traits::{AnswerGrading, AttemptLifecycle, QuestionPool, SessionStore};

/// Where a run stands at the start of a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdministrationState {
    /// No item is pending in this cycle.
    Fresh,
    /// The previous item was answered; a new one is needed.
    AwaitingNext,
    /// The previous item was served but not answered yet.
    Resuming,
    /// The run is over.
    Stopped,
}

impl AdministrationState {
    /// `stored` is the run's persisted state, if any. A run whose state
    /// carries a stop reason is `Stopped` whatever the previous item.
    pub fn classify(
        previous: Option<&ItemRef>,
        grading: &dyn AnswerGrading,
        stored: Option<&AttemptCatState>,
    ) -> Self {
        if stored.is_some_and(|state| state.stopped.is_some()) {
            return AdministrationState::Stopped;
        }
        match previous {
            None => AdministrationState::Fresh,
            Some(item) if grading.is_graded(item) => AdministrationState::AwaitingNext,
            Some(_) => AdministrationState::Resuming,
        }
    }
}

/// Input to one administration cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleRequest<'a> {
    pub run_id: RunId,
    /// The item the test-taker was last shown, if this cycle follows one.
    pub previous: Option<ItemRef>,
    /// Every item placed in the run so far, in slot order, including
    /// `previous`.
    pub history: &'a [ItemRef],
    /// Discard the cached availability mapping and rebuild it from the pool.
    pub rebuild_availability: bool,
}

impl<'a> CycleRequest<'a> {
    /// A cycle that follows the last item of `history`, or a fresh start
    /// when the history is empty.
    pub fn after_last(run_id: RunId, history: &'a [ItemRef]) -> Self {
        Self {
            run_id,
            previous: history.last().copied(),
            history,
            rebuild_availability: false,
        }
    }
}

/// The host services a cycle talks to.
pub struct Collaborators<'a> {
    pub pool: &'a dyn QuestionPool,
    pub grading: &'a dyn AnswerGrading,
    pub store: &'a mut dyn SessionStore,
    pub lifecycle: &'a mut dyn AttemptLifecycle,
}

/// A way of administering items. Hosts choose the strategy explicitly.
pub trait ItemAdministrationStrategy {
    fn administer(
        &mut self,
        config: &TestConfig,
        request: &CycleRequest<'_>,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<ItemAdministrationOutcome>;
}

/// Apply the monotonicity rule to the selector's suggestion and check the
/// result against the range.
///
/// After a correct answer the next level must be above the last one unless
/// the last one was already the highest; after an incorrect answer it must
/// be below unless the last one was already the lowest.
pub fn resolve_target_level(
    next_level: i32,
    last_level: i32,
    outcome: AnswerOutcome,
    range: &DifficultyRange,
) -> std::result::Result<i32, StopReason> {
    let target = match outcome {
        AnswerOutcome::Correct if next_level <= last_level && last_level < range.highest() => {
            last_level + 1
        }
        AnswerOutcome::Incorrect if next_level >= last_level && last_level > range.lowest() => {
            last_level - 1
        }
        _ => next_level,
    };
    if !range.contains(target) {
        return Err(StopReason::LevelOutOfBounds { level: target });
    }
    Ok(target)
}

/// Graded items of the history with their outcomes, in slot order.
pub fn answered_history(
    grading: &dyn AnswerGrading,
    history: &[ItemRef],
) -> Vec<(ItemRef, AnswerOutcome)> {
    history
        .iter()
        .filter_map(|item| grading.outcome(item).map(|outcome| (*item, outcome)))
        .collect()
}

enum Target {
    Level(i32),
    Stop(StopReason),
}

/// The default strategy: maximum-information selection on the logit scale
/// with a standard-error stopping rule.
///
/// When several questions are available at the chosen level one is picked
/// at random from `rng`.
pub struct DefaultItemAdministration<R = StdRng> {
    rng: R,
}

impl DefaultItemAdministration<StdRng> {
    /// Deterministic selection, for tests and reproducible simulations.
    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy())
    }
}

impl<R: Rng> DefaultItemAdministration<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Record the previous answer and work out where to go next.
    fn evaluate_previous(
        &self,
        config: &TestConfig,
        request: &CycleRequest<'_>,
        collaborators: &mut Collaborators<'_>,
        previous: &ItemRef,
        cache: &mut AvailabilityCache,
    ) -> Result<(Target, AttemptCatState)> {
        let range = &config.range;
        let outcome = collaborators
            .grading
            .outcome(previous)
            .with_context(|| format!("item in slot {} is not graded", previous.slot))?;
        let answered = answered_history(collaborators.grading, request.history);
        let summary: AnsweredSummary = answered.iter().map(|(_, o)| *o).collect();

        let mut state = match collaborators.store.load_state(request.run_id)? {
            Some(state) => state,
            None => {
                let earlier: Vec<_> = answered
                    .iter()
                    .copied()
                    .filter(|(item, _)| item.slot != previous.slot)
                    .collect();
                tracing::warn!(
                    run = %request.run_id,
                    answered = earlier.len(),
                    "no stored state, replaying answer history"
                );
                replay_history(&earlier, range)?.state
            }
        };

        let estimate = state.record_answer(previous.level, range, summary)?;
        cache.consume(previous.level);
        collaborators.store.save_state(request.run_id, &state)?;
        tracing::debug!(
            run = %request.run_id,
            slot = previous.slot,
            level = previous.level,
            %outcome,
            attempted = state.questions_attempted,
            standard_error = estimate.standard_error,
            measure = estimate.measure,
            "recorded answer"
        );

        let decision = determine_next_difficulty(
            state.questions_attempted,
            range,
            config.standard_error_percent,
            outcome,
            summary,
            linear_to_logit(previous.level, range),
            state.standard_error,
            state.questions_attempted >= config.minimum_questions,
        )?;

        let target = match decision {
            NextDifficultyDecision::Stop(reason) => Target::Stop(reason),
            NextDifficultyDecision::Continue(next) => {
                match resolve_target_level(next, previous.level, outcome, range) {
                    Ok(level) => Target::Level(level),
                    Err(reason) => Target::Stop(reason),
                }
            }
        };
        Ok((target, state))
    }

    /// Starting point for a cycle with no previous item.
    fn fresh_target(
        &self,
        config: &TestConfig,
        request: &CycleRequest<'_>,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<(Target, AttemptCatState)> {
        let answered = answered_history(collaborators.grading, request.history);
        let stored = collaborators.store.load_state(request.run_id)?;

        if answered.is_empty() {
            let state = stored.unwrap_or_default();
            collaborators.store.save_state(request.run_id, &state)?;
            return Ok((Target::Level(config.starting_level), state));
        }

        let replay = replay_history(&answered, &config.range)?;
        let state = match stored {
            Some(state) => state,
            None => {
                collaborators
                    .store
                    .save_state(request.run_id, &replay.state)?;
                replay.state
            }
        };
        let level = replay.next_level.unwrap_or(config.starting_level);
        Ok((Target::Level(level), state))
    }

    /// Mark the run stopped in the store and notify the lifecycle hook.
    fn stop(
        &self,
        run_id: RunId,
        reason: StopReason,
        mut state: AttemptCatState,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<ItemAdministrationOutcome> {
        state.stopped = Some(reason);
        collaborators.store.save_state(run_id, &state)?;
        tracing::info!(
            run = %run_id,
            state = ?AdministrationState::Stopped,
            attempted = state.questions_attempted,
            %reason,
            "run stopped"
        );
        collaborators.lifecycle.on_stopped(run_id, &reason, &state)?;
        Ok(ItemAdministrationOutcome::Stop(reason))
    }
}

impl<R: Rng> ItemAdministrationStrategy for DefaultItemAdministration<R> {
    fn administer(
        &mut self,
        config: &TestConfig,
        request: &CycleRequest<'_>,
        collaborators: &mut Collaborators<'_>,
    ) -> Result<ItemAdministrationOutcome> {
        let run_id = request.run_id;
        let previous = request.previous.as_ref();
        let stored = collaborators.store.load_state(run_id)?;
        let cycle_state =
            AdministrationState::classify(previous, collaborators.grading, stored.as_ref());
        tracing::debug!(run = %run_id, state = ?cycle_state, "administration cycle");

        if let Some(reason) = stored.and_then(|state| state.stopped) {
            return Ok(ItemAdministrationOutcome::Stop(reason));
        }

        let mut cache = AvailabilityCache::load(&*collaborators.store, run_id)?;
        let (target, state) = match (cycle_state, previous) {
            (AdministrationState::Resuming, Some(item)) => {
                return Ok(ItemAdministrationOutcome::NextItem(QuestionRef::Resume(*item)));
            }
            (AdministrationState::AwaitingNext, Some(item)) => {
                self.evaluate_previous(config, request, collaborators, item, &mut cache)?
            }
            _ => self.fresh_target(config, request, collaborators)?,
        };

        let level = match target {
            Target::Stop(reason) => {
                cache.save(collaborators.store, run_id)?;
                return self.stop(run_id, reason, state, collaborators);
            }
            Target::Level(level) => level,
        };

        if state.questions_attempted >= config.maximum_questions {
            cache.save(collaborators.store, run_id)?;
            let reason = StopReason::MaximumQuestionsAttempted {
                maximum: config.maximum_questions,
            };
            return self.stop(run_id, reason, state, collaborators);
        }

        let range = &config.range;
        if request.rebuild_availability {
            cache.rebuild(collaborators.pool, &config.scope, range, request.history)?;
        }
        let availability =
            cache.get_or_build(collaborators.pool, &config.scope, range, request.history)?;
        let exclude: HashSet<QuestionId> =
            request.history.iter().map(|item| item.question_id).collect();
        let found = fetch_questions(
            collaborators.pool,
            &config.scope,
            level,
            range.lowest(),
            range.highest(),
            availability,
            &exclude,
        )?;
        cache.save(collaborators.store, run_id)?;

        match found.questions.choose(&mut self.rng) {
            Some(&question_id) => {
                tracing::debug!(
                    run = %run_id,
                    requested_level = level,
                    level = found.level,
                    question = %question_id,
                    "selected next item"
                );
                Ok(ItemAdministrationOutcome::NextItem(QuestionRef::Fresh {
                    question_id,
                    level: found.level,
                }))
            }
            None => self.stop(
                run_id,
                StopReason::NoQuestionAvailable { level },
                state,
                collaborators,
            ),
        }
    }
}
