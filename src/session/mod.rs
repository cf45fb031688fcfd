//! The battle state machine driven by the scheduler.

pub mod battle;

pub use battle::{BattleSession, BattleState, TickResult};
