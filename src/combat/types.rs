use serde::{Deserialize, Serialize};

use crate::character::stats::StatBlock;

/// Base numbers for one enemy archetype, before level scaling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyTemplate {
    pub name: String,
    pub base_max_health: u32,
    pub base_attack: u32,
    pub base_exp_reward: u64,
    pub base_gold_reward: u64,
}

impl EnemyTemplate {
    pub fn new(
        name: &str,
        base_max_health: u32,
        base_attack: u32,
        base_exp_reward: u64,
        base_gold_reward: u64,
    ) -> Self {
        Self {
            name: name.to_string(),
            base_max_health,
            base_attack,
            base_exp_reward,
            base_gold_reward,
        }
    }
}

/// A concrete, level-scaled enemy. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enemy {
    pub name: String,
    pub level: u32,
    pub stats: StatBlock,
    pub exp_reward: u64,
    pub gold_reward: u64,
}

impl Enemy {
    pub fn is_alive(&self) -> bool {
        self.stats.is_alive()
    }
}

/// Everything that happened in one exchange. Log text is derived by the
/// caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Damage the player dealt to the enemy
    pub player_damage_dealt: u32,
    pub was_critical: bool,
    /// Damage the enemy dealt to the player (0 when dodged or no counter-hit)
    pub enemy_damage_dealt: u32,
    pub was_dodged: bool,
    pub enemy_defeated: bool,
    pub player_defeated: bool,
}

impl RoundOutcome {
    /// The enemy swung back this round (it survived the player's hit).
    pub fn enemy_countered(&self) -> bool {
        !self.enemy_defeated
    }
}
