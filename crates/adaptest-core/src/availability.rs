//! Question availability per difficulty level, and the outward search for
//! the nearest level that still has an unused question.

use std::collections::{BTreeMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::model::{DifficultyRange, ItemRef, PoolScope, QuestionId, RunId};
use crate::traits::{QuestionPool, SessionStore};

/// Upper bound on the search radius, whatever the level bounds are.
pub const MAX_SEARCH_RADIUS: i64 = 100_000;

/// Parse the level out of a difficulty tag such as `adpq_42`.
pub fn difficulty_from_tag(prefixes: &[String], tag: &str) -> Option<i32> {
    prefixes
        .iter()
        .filter_map(|prefix| tag.strip_prefix(prefix.as_str()))
        .find_map(|rest| rest.parse().ok())
}

/// Every tag name that marks `level` under the given prefixes.
pub fn level_tag_names(prefixes: &[String], level: i32) -> Vec<String> {
    prefixes
        .iter()
        .map(|prefix| format!("{prefix}{level}"))
        .collect()
}

/// Count of unused questions at each difficulty level. A missing level has
/// no questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DifficultyQuestionAvailability {
    counts: BTreeMap<i32, u32>,
}

impl DifficultyQuestionAvailability {
    pub fn from_counts(counts: BTreeMap<i32, u32>) -> Self {
        Self { counts }
    }

    pub fn count_at(&self, level: i32) -> u32 {
        self.counts.get(&level).copied().unwrap_or(0)
    }

    pub fn has_questions_at(&self, level: i32) -> bool {
        self.count_at(level) > 0
    }

    /// Mark one question at `level` as used. Returns `false` if the level
    /// had nothing left.
    pub fn consume(&mut self, level: i32) -> bool {
        match self.counts.get_mut(&level) {
            Some(count) if *count > 0 => {
                *count -= 1;
                true
            }
            _ => false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Total unused questions across all levels.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&c| u64::from(c)).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (i32, u32)> + '_ {
        self.counts.iter().map(|(&level, &count)| (level, count))
    }
}

/// Per-run cache of the availability mapping.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityCache {
    mapping: Option<DifficultyQuestionAvailability>,
}

impl AvailabilityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mapping(mapping: DifficultyQuestionAvailability) -> Self {
        Self {
            mapping: Some(mapping),
        }
    }

    /// Load the cached mapping for `run`, if the store kept one.
    pub fn load(store: &dyn SessionStore, run: RunId) -> Result<Self> {
        Ok(Self {
            mapping: store.load_availability(run)?,
        })
    }

    /// Write the mapping back. A cache that was never built writes nothing.
    pub fn save(&self, store: &mut dyn SessionStore, run: RunId) -> Result<()> {
        if let Some(mapping) = &self.mapping {
            store.save_availability(run, mapping)?;
        }
        Ok(())
    }

    pub fn mapping(&self) -> Option<&DifficultyQuestionAvailability> {
        self.mapping.as_ref()
    }

    /// Rebuild the mapping from the pool, then subtract every item already
    /// administered in the run.
    pub fn rebuild(
        &mut self,
        pool: &dyn QuestionPool,
        scope: &PoolScope,
        range: &DifficultyRange,
        administered: &[ItemRef],
    ) -> Result<&DifficultyQuestionAvailability> {
        let counts = pool.count_available_by_difficulty(scope, range.lowest(), range.highest())?;
        let mut mapping = DifficultyQuestionAvailability::from_counts(counts);
        for item in administered {
            mapping.consume(item.level);
        }
        tracing::debug!(
            levels = mapping.counts.len(),
            total = mapping.total(),
            "rebuilt question availability"
        );
        Ok(&*self.mapping.insert(mapping))
    }

    /// The cached mapping, rebuilding it first when absent or empty.
    pub fn get_or_build(
        &mut self,
        pool: &dyn QuestionPool,
        scope: &PoolScope,
        range: &DifficultyRange,
        administered: &[ItemRef],
    ) -> Result<&DifficultyQuestionAvailability> {
        if self.mapping.as_ref().map_or(true, |m| m.is_empty()) {
            return self.rebuild(pool, scope, range, administered);
        }
        Ok(&*self.mapping.get_or_insert_with(Default::default))
    }

    /// Mark one question at `level` as used. A cache that was never built
    /// is left alone; the next build accounts for the item.
    pub fn consume(&mut self, level: i32) -> bool {
        self.mapping
            .as_mut()
            .is_some_and(|mapping| mapping.consume(level))
    }
}

/// Questions found by [`fetch_questions`] and the level they were found at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedQuestions {
    pub level: i32,
    pub questions: Vec<QuestionId>,
}

/// Find unused questions at `requested_level`, or at the nearest level in
/// `[min_level, max_level]` that still has some.
///
/// At equal distance the higher level wins. Returns an empty list at the
/// requested level when nothing is available anywhere in the window.
pub fn fetch_questions(
    pool: &dyn QuestionPool,
    scope: &PoolScope,
    requested_level: i32,
    min_level: i32,
    max_level: i32,
    availability: &DifficultyQuestionAvailability,
    exclude: &HashSet<QuestionId>,
) -> Result<FetchedQuestions> {
    let query = |level: i32| -> Result<FetchedQuestions> {
        let tags = level_tag_names(&scope.tag_prefixes, level);
        let questions = pool.find_questions(scope, &tags, exclude)?;
        tracing::debug!(
            requested_level,
            level,
            found = questions.len(),
            "queried question pool"
        );
        Ok(FetchedQuestions { level, questions })
    };

    if availability.has_questions_at(requested_level) {
        return query(requested_level);
    }

    let requested = i64::from(requested_level);
    let (min, max) = (i64::from(min_level), i64::from(max_level));
    let radius = (max - requested).max(requested - min).min(MAX_SEARCH_RADIUS);

    for i in 1..=radius {
        let up = requested + i;
        if up <= max && availability.has_questions_at(up as i32) {
            return query(up as i32);
        }
        let down = requested - i;
        if down >= min && availability.has_questions_at(down as i32) {
            return query(down as i32);
        }
    }

    Ok(FetchedQuestions {
        level: requested_level,
        questions: Vec::new(),
    })
}
