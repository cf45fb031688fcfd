//! Per-user progression records.
//!
//! The engine treats storage as a key-value collaborator: load a record by
//! user id, save it back, enumerate everything for the leaderboard.

pub mod file;
pub mod leaderboard;
pub mod memory;

pub use file::FileStore;
pub use leaderboard::{leaderboard, LeaderboardEntry};
pub use memory::MemoryStore;

use crate::character::progression::PlayerProgression;
use crate::core::error::Result;
use crate::core::game_state::UserId;

pub trait ProgressionStore: Send + Sync {
    /// Fails with `GameError::NotFound` when the user has no record.
    fn load(&self, user: &UserId) -> Result<PlayerProgression>;

    fn save(&self, user: &UserId, progression: &PlayerProgression) -> Result<()>;

    fn list(&self) -> Result<Vec<(UserId, PlayerProgression)>>;
}
