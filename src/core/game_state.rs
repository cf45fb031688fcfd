//! Player identity and the read-only snapshot handed to front ends.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::character::progression::PlayerProgression;
use crate::combat::types::Enemy;
use crate::core::log::LogEntry;
use crate::session::battle::BattleState;
use crate::skills::types::Skill;

/// Stable identifier the auth boundary resolves a credential to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// A fresh random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything a front end needs to draw one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub user_id: UserId,
    pub state: BattleState,
    pub progression: PlayerProgression,
    pub enemy: Option<Enemy>,
    pub skills: Vec<Skill>,
    /// Rounds of boosted critical chance left
    pub crit_bonus_rounds: u32,
    /// Newest log entries, newest first
    pub log: Vec<LogEntry>,
    /// Pass to `log_since` to poll for entries after this snapshot
    pub log_cursor: u64,
}
