//! Enemy catalog and round resolution.

pub mod catalog;
pub mod logic;
pub mod types;

pub use catalog::{default_templates, scale_template, EnemyCatalog};
pub use logic::{base_damage, resolve_round, AttackResult};
pub use types::{Enemy, EnemyTemplate, RoundOutcome};
