//! The player's persistent record: level, experience, gold, inventory,
//! stats and a short battle history.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::stats::StatBlock;
use crate::combat::types::Enemy;
use crate::core::config::ProgressionRules;
use crate::core::constants::*;
use crate::core::error::{GameError, Result};
use crate::items::{find_loot, roll_loot, Inventory, ItemEffect, LootTemplate};

/// XP required to advance from `level`.
pub fn exp_for_level(level: u32) -> u64 {
    level as u64 * EXP_PER_LEVEL
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradeKind {
    Attack,
    Defense,
    Health,
}

impl UpgradeKind {
    pub fn all() -> [UpgradeKind; 3] {
        [UpgradeKind::Attack, UpgradeKind::Defense, UpgradeKind::Health]
    }

    pub fn name(&self) -> &'static str {
        match self {
            UpgradeKind::Attack => "attack",
            UpgradeKind::Defense => "defense",
            UpgradeKind::Health => "health",
        }
    }
}

impl fmt::Display for UpgradeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for UpgradeKind {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self> {
        UpgradeKind::all()
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::Configuration(format!("unknown upgrade kind: {}", s)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleResult {
    Victory,
    Defeat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleRecord {
    pub enemy_name: String,
    pub enemy_level: u32,
    pub result: BattleResult,
    pub exp_gained: u64,
    pub gold_gained: u64,
    /// Gold lost to the death penalty (defeats only)
    #[serde(default)]
    pub gold_lost: u64,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LevelUp {
    pub new_level: u32,
    pub gold_bonus: u64,
}

/// What a victory paid out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VictoryReport {
    pub exp_gained: u64,
    pub gold_gained: u64,
    pub loot: Option<&'static LootTemplate>,
    pub level_ups: Vec<LevelUp>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeathPenalty {
    pub gold_lost: u64,
    pub health_restored: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemUse {
    pub effect: ItemEffect,
    pub level_ups: Vec<LevelUp>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerProgression {
    pub level: u32,
    pub exp: u64,
    pub exp_to_next_level: u64,
    pub gold: u64,
    pub inventory: Inventory,
    pub stats: StatBlock,
    pub history: VecDeque<BattleRecord>,
}

impl Default for PlayerProgression {
    fn default() -> Self {
        Self::new()
    }
}

impl PlayerProgression {
    /// A freshly registered character.
    pub fn new() -> Self {
        Self {
            level: STARTING_LEVEL,
            exp: 0,
            exp_to_next_level: exp_for_level(STARTING_LEVEL),
            gold: STARTING_GOLD,
            inventory: Inventory::new(),
            stats: StatBlock::default(),
            history: VecDeque::new(),
        }
    }

    /// Repair a record loaded from storage: level floor, threshold, health
    /// clamp, inventory stacks, history bound. Pending level-ups are applied.
    pub fn normalize(&mut self) -> Vec<LevelUp> {
        self.level = self.level.max(1);
        self.stats.max_health = self.stats.max_health.max(1);
        self.stats.clamp_health();
        self.exp_to_next_level = exp_for_level(self.level);
        self.inventory.normalize();
        while self.history.len() > BATTLE_HISTORY_CAPACITY {
            self.history.pop_back();
        }
        self.check_level_up()
    }

    /// Add experience and resolve any level-ups it causes.
    pub fn gain_exp(&mut self, amount: u64) -> Vec<LevelUp> {
        self.exp += amount;
        self.check_level_up()
    }

    /// Apply every level-up the current experience pays for, carrying the
    /// remainder. Loops so a single large award can cross several levels.
    pub fn check_level_up(&mut self) -> Vec<LevelUp> {
        let mut gained = Vec::new();

        while self.exp >= self.exp_to_next_level {
            self.exp -= self.exp_to_next_level;
            self.level += 1;
            self.exp_to_next_level = exp_for_level(self.level);

            self.stats.max_health += LEVEL_UP_MAX_HEALTH;
            self.stats.restore_full();
            self.stats.attack += LEVEL_UP_ATTACK;
            self.stats.defense += LEVEL_UP_DEFENSE;
            self.gold += LEVEL_UP_GOLD;

            gained.push(LevelUp {
                new_level: self.level,
                gold_bonus: LEVEL_UP_GOLD,
            });
        }

        debug_assert!(self.exp < self.exp_to_next_level);
        gained
    }

    /// Collect rewards for a defeated enemy: exp, gold, a possible drop.
    pub fn award_victory(
        &mut self,
        enemy: &Enemy,
        rules: &ProgressionRules,
        rng: &mut impl Rng,
    ) -> VictoryReport {
        self.gold += enemy.gold_reward;
        self.exp += enemy.exp_reward;

        let loot = roll_loot(rules.loot_chance, rng);
        if let Some(item) = loot {
            self.inventory.add(item.name, 1);
        }

        let level_ups = self.check_level_up();
        self.record_battle(BattleRecord {
            enemy_name: enemy.name.clone(),
            enemy_level: enemy.level,
            result: BattleResult::Victory,
            exp_gained: enemy.exp_reward,
            gold_gained: enemy.gold_reward,
            gold_lost: 0,
            timestamp: Utc::now(),
        });

        VictoryReport {
            exp_gained: enemy.exp_reward,
            gold_gained: enemy.gold_reward,
            loot,
            level_ups,
        }
    }

    /// Lose a share of gold and come back at partial health.
    pub fn apply_death_penalty(&mut self, rules: &ProgressionRules) -> DeathPenalty {
        let gold_lost = (self.gold as f64 * rules.death_gold_loss_ratio) as u64;
        self.gold = self.gold.saturating_sub(gold_lost);

        let health = (self.stats.max_health as f64 * rules.death_health_ratio) as u32;
        self.stats.health = health;
        self.stats.clamp_health();

        DeathPenalty {
            gold_lost,
            health_restored: self.stats.health,
        }
    }

    pub fn record_defeat(&mut self, enemy: &Enemy, penalty: &DeathPenalty) {
        self.record_battle(BattleRecord {
            enemy_name: enemy.name.clone(),
            enemy_level: enemy.level,
            result: BattleResult::Defeat,
            exp_gained: 0,
            gold_gained: 0,
            gold_lost: penalty.gold_lost,
            timestamp: Utc::now(),
        });
    }

    /// Newest first, bounded.
    pub fn record_battle(&mut self, record: BattleRecord) {
        if self.history.len() >= BATTLE_HISTORY_CAPACITY {
            self.history.pop_back();
        }
        self.history.push_front(record);
    }

    /// Spend gold on a permanent stat increase.
    pub fn purchase_upgrade(&mut self, kind: UpgradeKind, cost: u64) -> Result<()> {
        self.spend_gold(cost)?;
        match kind {
            UpgradeKind::Attack => self.stats.attack += UPGRADE_ATTACK,
            UpgradeKind::Defense => self.stats.defense += UPGRADE_DEFENSE,
            UpgradeKind::Health => {
                self.stats.max_health += UPGRADE_MAX_HEALTH;
                self.stats.restore_full();
            }
        }
        Ok(())
    }

    /// Deduct gold, or fail without touching it.
    pub fn spend_gold(&mut self, cost: u64) -> Result<()> {
        if self.gold < cost {
            return Err(GameError::InsufficientFunds {
                needed: cost,
                available: self.gold,
            });
        }
        self.gold -= cost;
        Ok(())
    }

    /// Consume one unit of a held item and apply its effect.
    pub fn use_item(&mut self, name: &str) -> Result<ItemUse> {
        let template = find_loot(name).ok_or_else(|| GameError::UnknownItem(name.to_string()))?;
        if !self.inventory.remove_one(name) {
            return Err(GameError::UnknownItem(name.to_string()));
        }

        let mut level_ups = Vec::new();
        match template.effect {
            ItemEffect::Heal(amount) => self.stats.heal(amount),
            ItemEffect::Attack(amount) => self.stats.attack += amount,
            ItemEffect::Defense(amount) => self.stats.defense += amount,
            ItemEffect::Exp(amount) => level_ups = self.gain_exp(amount),
            ItemEffect::Gold(amount) => self.gold += amount,
        }

        Ok(ItemUse {
            effect: template.effect,
            level_ups,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::catalog::scale_template;
    use crate::combat::types::EnemyTemplate;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn no_loot() -> ProgressionRules {
        ProgressionRules {
            loot_chance: 0.0,
            ..ProgressionRules::default()
        }
    }

    fn enemy_with_rewards(exp: u64, gold: u64) -> Enemy {
        scale_template(&EnemyTemplate::new("Test Boar", 50, 8, exp, gold), 1)
    }

    #[test]
    fn test_new_progression_defaults() {
        let p = PlayerProgression::new();
        assert_eq!(p.level, 1);
        assert_eq!(p.exp, 0);
        assert_eq!(p.exp_to_next_level, 100);
        assert_eq!(p.gold, 100);
        assert_eq!(p.stats, StatBlock::new(100, 10, 5));
        assert!(p.inventory.is_empty());
    }

    #[test]
    fn test_single_level_up_bonuses() {
        let mut p = PlayerProgression::new();
        p.stats.health = 40;
        let ups = p.gain_exp(120);

        assert_eq!(ups, vec![LevelUp { new_level: 2, gold_bonus: 50 }]);
        assert_eq!(p.level, 2);
        assert_eq!(p.exp, 20);
        assert_eq!(p.exp_to_next_level, 200);
        assert_eq!(p.stats.max_health, 120);
        assert_eq!(p.stats.health, 120);
        assert_eq!(p.stats.attack, 15);
        assert_eq!(p.stats.defense, 8);
        assert_eq!(p.gold, 150);
    }

    #[test]
    fn test_multi_level_jump() {
        let mut p = PlayerProgression::new();
        let ups = p.gain_exp(1000);

        // 100 + 200 + 300 + 400 = 1000
        assert_eq!(ups.len(), 4);
        assert_eq!(p.level, 5);
        assert_eq!(p.exp, 0);
        assert_eq!(p.exp_to_next_level, 500);
        assert!(p.exp < p.exp_to_next_level);
        assert_eq!(p.gold, 100 + 4 * 50);
    }

    #[test]
    fn test_award_victory_scenario() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut p = PlayerProgression::new();
        let enemy = enemy_with_rewards(250, 20);

        let report = p.award_victory(&enemy, &no_loot(), &mut rng);

        assert_eq!(report.exp_gained, 250);
        assert_eq!(report.gold_gained, 20);
        assert!(report.loot.is_none());
        assert_eq!(p.level, 2);
        assert_eq!(p.exp, 150);
        assert!(p.exp < p.exp_to_next_level);
        let levels = report.level_ups.len() as u64;
        assert_eq!(p.gold, 100 + 20 + 50 * levels);
        assert_eq!(p.history[0].result, BattleResult::Victory);
    }

    #[test]
    fn test_award_victory_guaranteed_loot() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut p = PlayerProgression::new();
        let rules = ProgressionRules {
            loot_chance: 1.0,
            ..ProgressionRules::default()
        };
        let report = p.award_victory(&enemy_with_rewards(1, 1), &rules, &mut rng);
        let item = report.loot.expect("loot");
        assert_eq!(p.inventory.quantity(item.name), 1);
    }

    #[test]
    fn test_death_penalty_percentage() {
        let mut p = PlayerProgression::new();
        p.gold = 200;
        p.stats.health = 0;

        let penalty = p.apply_death_penalty(&ProgressionRules::default());

        assert_eq!(penalty.gold_lost, 20);
        assert_eq!(p.gold, 180);
        assert_eq!(p.stats.health, 50);
        assert_eq!(penalty.health_restored, 50);
    }

    #[test]
    fn test_death_penalty_small_purse() {
        let mut p = PlayerProgression::new();
        p.gold = 9;
        let penalty = p.apply_death_penalty(&ProgressionRules::default());
        assert_eq!(penalty.gold_lost, 0);
        assert_eq!(p.gold, 9);
    }

    #[test]
    fn test_purchase_upgrades() {
        let mut p = PlayerProgression::new();
        p.gold = 150;
        p.stats.health = 10;

        p.purchase_upgrade(UpgradeKind::Attack, 50).unwrap();
        p.purchase_upgrade(UpgradeKind::Defense, 50).unwrap();
        p.purchase_upgrade(UpgradeKind::Health, 50).unwrap();

        assert_eq!(p.gold, 0);
        assert_eq!(p.stats.attack, 15);
        assert_eq!(p.stats.defense, 8);
        assert_eq!(p.stats.max_health, 130);
        assert_eq!(p.stats.health, 130);
    }

    #[test]
    fn test_purchase_upgrade_insufficient_funds_is_atomic() {
        let mut p = PlayerProgression::new();
        p.gold = 49;
        let before = p.clone();

        let err = p.purchase_upgrade(UpgradeKind::Attack, 50).unwrap_err();

        assert!(matches!(
            err,
            GameError::InsufficientFunds {
                needed: 50,
                available: 49
            }
        ));
        assert_eq!(p, before);
    }

    #[test]
    fn test_use_item_effects() {
        let mut p = PlayerProgression::new();
        p.inventory.add("Health Potion", 1);
        p.inventory.add("Experience Potion", 1);
        p.inventory.add("Gold Pouch", 1);
        p.stats.health = 30;

        p.use_item("Health Potion").unwrap();
        assert_eq!(p.stats.health, 80);

        let used = p.use_item("Experience Potion").unwrap();
        assert_eq!(used.level_ups.len(), 1);
        assert_eq!(p.level, 2);

        p.use_item("Gold Pouch").unwrap();
        assert_eq!(p.gold, 100 + 50 + 25);
        assert!(p.inventory.is_empty());
    }

    #[test]
    fn test_use_item_not_held() {
        let mut p = PlayerProgression::new();
        assert!(matches!(
            p.use_item("Strength Potion"),
            Err(GameError::UnknownItem(_))
        ));
        assert!(matches!(
            p.use_item("Mystery Box"),
            Err(GameError::UnknownItem(_))
        ));
    }

    #[test]
    fn test_history_is_bounded() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut p = PlayerProgression::new();
        for _ in 0..(BATTLE_HISTORY_CAPACITY + 5) {
            p.award_victory(&enemy_with_rewards(1, 1), &no_loot(), &mut rng);
        }
        assert_eq!(p.history.len(), BATTLE_HISTORY_CAPACITY);
    }

    #[test]
    fn test_normalize_repairs_loaded_record() {
        let json = r#"{ "level": 3, "exp": 700, "stats": { "health": 500, "max_health": 100, "attack": 10, "defense": 5 } }"#;
        let mut p: PlayerProgression = serde_json::from_str(json).unwrap();
        let ups = p.normalize();

        // 300 for level 3, then 400 for level 4
        assert_eq!(ups.len(), 2);
        assert_eq!(p.level, 5);
        assert_eq!(p.exp, 0);
        assert_eq!(p.exp_to_next_level, 500);
        assert_eq!(p.stats.max_health, 140);
        assert!(p.stats.health <= p.stats.max_health);
    }

    #[test]
    fn test_upgrade_kind_from_str() {
        assert_eq!("Attack".parse::<UpgradeKind>().unwrap(), UpgradeKind::Attack);
        assert_eq!("health".parse::<UpgradeKind>().unwrap(), UpgradeKind::Health);
        assert!("speed".parse::<UpgradeKind>().is_err());
    }
}
