//! Tunable game configuration.
//!
//! Every section defaults to the values in [`crate::core::constants`], so a
//! config file only needs the fields it overrides.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::constants::*;
use super::error::{GameError, Result};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub combat: CombatRules,
    pub enemies: EnemyRules,
    pub progression: ProgressionRules,
    pub session: SessionConfig,
    /// Random seed for reproducible sessions (None = entropy)
    pub seed: Option<u64>,
}

/// Probabilities and multipliers used by the round resolver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatRules {
    pub crit_chance: f64,
    pub crit_multiplier: f64,
    pub variance_min: f64,
    pub variance_max: f64,
    pub dodge_chance: f64,
}

impl Default for CombatRules {
    fn default() -> Self {
        Self {
            crit_chance: CRIT_CHANCE,
            crit_multiplier: CRIT_MULTIPLIER,
            variance_min: DAMAGE_VARIANCE_MIN,
            variance_max: DAMAGE_VARIANCE_MAX,
            dodge_chance: DODGE_CHANCE,
        }
    }
}

impl CombatRules {
    /// Flat `max(1, atk - def)` exchanges: no crits, no dodges, no variance.
    pub fn flat() -> Self {
        Self {
            crit_chance: 0.0,
            crit_multiplier: CRIT_MULTIPLIER,
            variance_min: 1.0,
            variance_max: 1.0,
            dodge_chance: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyRules {
    /// Player levels per catalog tier
    pub tier_level_divisor: u32,
    /// Enemy level is drawn from `player_level - jitter ..= player_level + jitter - 1`
    pub level_jitter: u32,
}

impl Default for EnemyRules {
    fn default() -> Self {
        Self {
            tier_level_divisor: ENEMY_TIER_LEVEL_DIVISOR,
            level_jitter: ENEMY_LEVEL_JITTER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionRules {
    pub loot_chance: f64,
    pub death_gold_loss_ratio: f64,
    pub death_health_ratio: f64,
    pub upgrade_cost: u64,
}

impl Default for ProgressionRules {
    fn default() -> Self {
        Self {
            loot_chance: LOOT_DROP_CHANCE,
            death_gold_loss_ratio: DEATH_GOLD_LOSS_RATIO,
            death_health_ratio: DEATH_HEALTH_RATIO,
            upgrade_cost: UPGRADE_COST,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tick_interval_ms: u64,
    pub death_recovery_ticks: u32,
    pub log_capacity: usize,
    pub autosave_interval_seconds: u64,
    pub save_retry_attempts: u32,
    pub save_retry_base_ms: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: TICK_INTERVAL_MS,
            death_recovery_ticks: DEATH_RECOVERY_TICKS,
            log_capacity: BATTLE_LOG_CAPACITY,
            autosave_interval_seconds: AUTOSAVE_INTERVAL_SECONDS,
            save_retry_attempts: SAVE_RETRY_ATTEMPTS,
            save_retry_base_ms: SAVE_RETRY_BASE_MS,
        }
    }
}

impl SessionConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn autosave_interval(&self) -> Duration {
        Duration::from_secs(self.autosave_interval_seconds)
    }
}

impl GameConfig {
    /// Load a JSON config file. A missing file yields the defaults; a file
    /// that exists but does not parse is an error.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| GameError::Configuration(format!("{}: {}", path.display(), e)))?;
        let config: Self = serde_json::from_str(&content)
            .map_err(|e| GameError::Configuration(format!("{}: {}", path.display(), e)))?;

        config.validate()?;
        info!("Loaded config from {:?}", path);
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let probability = |name: &str, p: f64| {
            if (0.0..=1.0).contains(&p) {
                Ok(())
            } else {
                Err(GameError::Configuration(format!(
                    "{} must be within 0..=1, got {}",
                    name, p
                )))
            }
        };

        probability("combat.crit_chance", self.combat.crit_chance)?;
        probability("combat.dodge_chance", self.combat.dodge_chance)?;
        probability("progression.loot_chance", self.progression.loot_chance)?;
        probability(
            "progression.death_gold_loss_ratio",
            self.progression.death_gold_loss_ratio,
        )?;
        probability(
            "progression.death_health_ratio",
            self.progression.death_health_ratio,
        )?;

        if self.combat.variance_min > self.combat.variance_max || self.combat.variance_min < 0.0 {
            return Err(GameError::Configuration(format!(
                "invalid damage variance range {}..={}",
                self.combat.variance_min, self.combat.variance_max
            )));
        }
        if self.enemies.tier_level_divisor == 0 {
            return Err(GameError::Configuration(
                "enemies.tier_level_divisor must be positive".to_string(),
            ));
        }
        if self.enemies.level_jitter > MAX_ENEMY_LEVEL_JITTER {
            return Err(GameError::Configuration(format!(
                "enemies.level_jitter must be at most {}, got {}",
                MAX_ENEMY_LEVEL_JITTER, self.enemies.level_jitter
            )));
        }
        if self.session.tick_interval_ms == 0 || self.session.autosave_interval_seconds == 0 {
            return Err(GameError::Configuration(
                "session intervals must be positive".to_string(),
            ));
        }
        if self.session.save_retry_attempts == 0 {
            warn!("session.save_retry_attempts is 0; saves are attempted once");
        }
        Ok(())
    }
}
