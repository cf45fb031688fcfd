//! Enemy archetypes and level-scaled spawning.

use rand::Rng;

use super::types::{Enemy, EnemyTemplate};
use crate::character::stats::StatBlock;
use crate::core::config::EnemyRules;
use crate::core::constants::{ENEMY_DEFENSE_RATIO, ENEMY_LEVEL_SCALING};
use crate::core::error::{GameError, Result};

/// The built-in archetypes, trivial to boss-tier.
pub fn default_templates() -> Vec<EnemyTemplate> {
    vec![
        EnemyTemplate::new("Wild Boar", 50, 8, 10, 5),
        EnemyTemplate::new("Forest Wolf", 80, 12, 15, 8),
        EnemyTemplate::new("Mountain Bandit", 120, 18, 25, 12),
        EnemyTemplate::new("Cave Troll", 200, 25, 40, 20),
        EnemyTemplate::new("Elder Dragon", 500, 40, 100, 50),
    ]
}

/// Read-only, shareable across sessions.
#[derive(Debug, Clone)]
pub struct EnemyCatalog {
    templates: Vec<EnemyTemplate>,
    rules: EnemyRules,
}

impl EnemyCatalog {
    pub fn new(templates: Vec<EnemyTemplate>, rules: EnemyRules) -> Result<Self> {
        if templates.is_empty() {
            return Err(GameError::Configuration(
                "enemy catalog is empty".to_string(),
            ));
        }
        if rules.tier_level_divisor == 0 {
            return Err(GameError::Configuration(
                "tier_level_divisor must be positive".to_string(),
            ));
        }
        Ok(Self { templates, rules })
    }

    pub fn with_defaults(rules: EnemyRules) -> Result<Self> {
        Self::new(default_templates(), rules)
    }

    pub fn templates(&self) -> &[EnemyTemplate] {
        &self.templates
    }

    /// `clamp(floor(player_level / K), 0, N - 1)`
    pub fn template_index(&self, player_level: u32) -> usize {
        let tier = (player_level / self.rules.tier_level_divisor) as usize;
        tier.min(self.templates.len().saturating_sub(1))
    }

    /// Enemy level drawn uniformly from `player_level - j ..= player_level + j - 1`,
    /// floored at 1. A jitter of 0 pins it to the player's level.
    pub fn roll_enemy_level(&self, player_level: u32, rng: &mut impl Rng) -> u32 {
        let jitter = self.rules.level_jitter;
        if jitter == 0 {
            return player_level.max(1);
        }
        let offset = rng.gen_range(0..jitter.saturating_mul(2)) as i64 - jitter as i64;
        (player_level as i64 + offset).clamp(1, u32::MAX as i64) as u32
    }

    /// Build a fresh enemy for the given player level.
    pub fn spawn(&self, player_level: u32, rng: &mut impl Rng) -> Result<Enemy> {
        if self.templates.is_empty() {
            return Err(GameError::Configuration(
                "enemy catalog is empty".to_string(),
            ));
        }
        let template = &self.templates[self.template_index(player_level)];
        let level = self.roll_enemy_level(player_level, rng);
        Ok(scale_template(template, level))
    }
}

/// Apply the `1 + (level - 1) * 0.1` multiplier to health, attack and rewards.
/// Defense comes from the unscaled base attack.
pub fn scale_template(template: &EnemyTemplate, level: u32) -> Enemy {
    let multiplier = level_multiplier(level);
    let max_health = ((template.base_max_health as f64 * multiplier) as u32).max(1);
    let attack = (template.base_attack as f64 * multiplier) as u32;
    let defense = (template.base_attack as f64 * ENEMY_DEFENSE_RATIO) as u32;

    Enemy {
        name: template.name.clone(),
        level,
        stats: StatBlock::new(max_health, attack, defense),
        exp_reward: (template.base_exp_reward as f64 * multiplier) as u64,
        gold_reward: (template.base_gold_reward as f64 * multiplier) as u64,
    }
}

pub fn level_multiplier(level: u32) -> f64 {
    1.0 + (level.max(1) - 1) as f64 * ENEMY_LEVEL_SCALING
}
