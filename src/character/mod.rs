//! Player stats and persistent progression.

pub mod progression;
pub mod stats;

pub use progression::{
    exp_for_level, BattleRecord, BattleResult, DeathPenalty, ItemUse, LevelUp, PlayerProgression,
    UpgradeKind, VictoryReport,
};
pub use stats::StatBlock;
