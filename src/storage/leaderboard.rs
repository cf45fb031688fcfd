use serde::{Deserialize, Serialize};

use super::ProgressionStore;
use crate::core::error::Result;
use crate::core::game_state::UserId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub user_id: UserId,
    pub level: u32,
    pub exp: u64,
    pub gold: u64,
}

/// Top `limit` players by level, then experience. Ties fall back to user
/// id so the order is stable.
pub fn leaderboard(store: &dyn ProgressionStore, limit: usize) -> Result<Vec<LeaderboardEntry>> {
    let mut entries: Vec<LeaderboardEntry> = store
        .list()?
        .into_iter()
        .map(|(user_id, progression)| LeaderboardEntry {
            user_id,
            level: progression.level,
            exp: progression.exp,
            gold: progression.gold,
        })
        .collect();

    entries.sort_by(|a, b| {
        b.level
            .cmp(&a.level)
            .then(b.exp.cmp(&a.exp))
            .then(a.user_id.cmp(&b.user_id))
    });
    entries.truncate(limit);
    Ok(entries)
}
