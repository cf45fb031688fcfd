use serde::{Deserialize, Serialize};

use crate::core::constants::{STARTING_ATTACK, STARTING_DEFENSE, STARTING_HEALTH};

/// The four combat numbers shared by the player and every enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    pub health: u32,
    pub max_health: u32,
    pub attack: u32,
    pub defense: u32,
}

impl Default for StatBlock {
    fn default() -> Self {
        Self::new(STARTING_HEALTH, STARTING_ATTACK, STARTING_DEFENSE)
    }
}

impl StatBlock {
    /// A full-health block.
    pub fn new(max_health: u32, attack: u32, defense: u32) -> Self {
        debug_assert!(max_health > 0, "max_health must be positive");
        Self {
            health: max_health,
            max_health,
            attack,
            defense,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Keep `health` within `0..=max_health`. Called after every damage or
    /// heal application.
    pub fn clamp_health(&mut self) {
        self.health = self.health.min(self.max_health);
    }

    pub fn take_damage(&mut self, amount: u32) {
        self.health = self.health.saturating_sub(amount);
        self.clamp_health();
    }

    pub fn heal(&mut self, amount: u32) {
        self.health = self.health.saturating_add(amount);
        self.clamp_health();
    }

    pub fn restore_full(&mut self) {
        self.health = self.max_health;
    }

    /// Health as a fraction of max (0.0..=1.0), for health bars.
    pub fn health_fraction(&self) -> f64 {
        if self.max_health == 0 {
            0.0
        } else {
            self.health as f64 / self.max_health as f64
        }
    }
}
