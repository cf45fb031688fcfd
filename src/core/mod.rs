//! Shared configuration, constants, errors and the battle log.

pub mod config;
pub mod constants;
pub mod error;
pub mod game_state;
pub mod log;

pub use config::{CombatRules, EnemyRules, GameConfig, ProgressionRules, SessionConfig};
pub use error::{GameError, Result, StorageError};
pub use game_state::{GameSnapshot, UserId};
pub use log::{BattleLog, LogEntry, LogKind};
