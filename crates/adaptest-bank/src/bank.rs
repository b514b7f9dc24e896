//! In-memory question bank.

use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use adaptest_core::availability::difficulty_from_tag;
use adaptest_core::model::{PoolScope, QuestionId};
use adaptest_core::traits::QuestionPool;

/// A question stored in a bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub name: String,
    /// Category the question belongs to.
    #[serde(default)]
    pub category_id: u64,
    /// Free-form tags. Difficulty is a tag such as `adpq_42`.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Question {
    /// The difficulty level of the question under the given tag prefixes.
    /// The first tag that parses wins.
    pub fn level(&self, prefixes: &[String]) -> Option<i32> {
        self.tags
            .iter()
            .find_map(|tag| difficulty_from_tag(prefixes, tag))
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }
}

/// A named collection of questions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionBank {
    pub id: String,
    pub name: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    pub fn new(id: impl Into<String>, name: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            questions,
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn get(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Append the questions of `other` to this bank.
    pub fn merge(&mut self, other: QuestionBank) {
        self.questions.extend(other.questions);
    }

    fn in_scope<'a>(&'a self, scope: &'a PoolScope) -> impl Iterator<Item = &'a Question> + 'a {
        self.questions
            .iter()
            .filter(move |q| scope.includes_category(q.category_id))
    }
}

impl QuestionPool for QuestionBank {
    fn count_available_by_difficulty(
        &self,
        scope: &PoolScope,
        min_level: i32,
        max_level: i32,
    ) -> anyhow::Result<BTreeMap<i32, u32>> {
        let mut counts = BTreeMap::new();
        for level in self
            .in_scope(scope)
            .filter_map(|q| q.level(&scope.tag_prefixes))
            .filter(|level| (min_level..=max_level).contains(level))
        {
            *counts.entry(level).or_insert(0) += 1;
        }
        Ok(counts)
    }

    fn find_questions(
        &self,
        scope: &PoolScope,
        level_tags: &[String],
        exclude: &HashSet<QuestionId>,
    ) -> anyhow::Result<Vec<QuestionId>> {
        Ok(self
            .in_scope(scope)
            .filter(|q| q.has_any_tag(level_tags) && !exclude.contains(&q.id))
            .map(|q| q.id)
            .collect())
    }
}
