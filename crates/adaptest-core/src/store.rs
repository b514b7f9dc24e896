//! In-memory session store.

use std::collections::HashMap;

use anyhow::Result;

use crate::availability::DifficultyQuestionAvailability;
use crate::model::{AttemptCatState, RunId};
use crate::traits::SessionStore;

/// Session store backed by hash maps. State lives as long as the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    states: HashMap<RunId, AttemptCatState>,
    availability: HashMap<RunId, DifficultyQuestionAvailability>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of runs with stored state.
    pub fn run_count(&self) -> usize {
        self.states.len()
    }

    /// Drop the availability cache of a run, as an expiring session would.
    pub fn forget_availability(&mut self, run: RunId) {
        self.availability.remove(&run);
    }
}

impl SessionStore for MemoryStore {
    fn load_state(&self, run: RunId) -> Result<Option<AttemptCatState>> {
        Ok(self.states.get(&run).copied())
    }

    fn save_state(&mut self, run: RunId, state: &AttemptCatState) -> Result<()> {
        self.states.insert(run, *state);
        Ok(())
    }

    fn load_availability(&self, run: RunId) -> Result<Option<DifficultyQuestionAvailability>> {
        Ok(self.availability.get(&run).cloned())
    }

    fn save_availability(
        &mut self,
        run: RunId,
        availability: &DifficultyQuestionAvailability,
    ) -> Result<()> {
        self.availability.insert(run, availability.clone());
        Ok(())
    }

    fn purge(&mut self, run: RunId) -> Result<()> {
        self.states.remove(&run);
        self.availability.remove(&run);
        Ok(())
    }
}
