//! Active abilities bought with gold and gated by cooldowns.

pub mod logic;
pub mod types;

pub use logic::SkillTable;
pub use types::{Skill, SkillEffect, SkillKey};
