use std::collections::HashMap;
use std::sync::RwLock;

use super::ProgressionStore;
use crate::character::progression::PlayerProgression;
use crate::core::error::{GameError, Result};
use crate::core::game_state::UserId;

/// In-process store, for tests and throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<UserId, PlayerProgression>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProgressionStore for MemoryStore {
    fn load(&self, user: &UserId) -> Result<PlayerProgression> {
        self.records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(user)
            .cloned()
            .ok_or_else(|| GameError::NotFound(user.clone()))
    }

    fn save(&self, user: &UserId, progression: &PlayerProgression) -> Result<()> {
        self.records
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(user.clone(), progression.clone());
        Ok(())
    }

    fn list(&self) -> Result<Vec<(UserId, PlayerProgression)>> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .iter()
            .map(|(id, progression)| (id.clone(), progression.clone()))
            .collect())
    }
}
