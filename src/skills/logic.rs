//! Skill activation and cooldown bookkeeping.

use serde::{Deserialize, Serialize};

use super::types::{Skill, SkillEffect, SkillKey};
use crate::character::progression::PlayerProgression;
use crate::core::constants::{
    CRIT_SKILL_BONUS, CRIT_SKILL_ROUNDS, SKILL_BUFF_RATIO, SKILL_HEAL_RATIO,
};
use crate::core::error::{GameError, Result};

/// Per-session skill state. Not persisted; every session starts with all
/// skills ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillTable {
    skills: Vec<Skill>,
    crit_bonus_rounds: u32,
}

impl SkillTable {
    pub fn new(skills: Vec<Skill>) -> Result<Self> {
        if skills.is_empty() {
            return Err(GameError::Configuration("skill table is empty".to_string()));
        }
        Ok(Self {
            skills,
            crit_bonus_rounds: 0,
        })
    }

    pub fn with_defaults() -> Self {
        let skills = SkillKey::all()
            .into_iter()
            .map(|key| {
                let (cost, cooldown) = key.default_cost_and_cooldown();
                Skill::new(key, cost, cooldown)
            })
            .collect();
        Self {
            skills,
            crit_bonus_rounds: 0,
        }
    }

    pub fn skills(&self) -> &[Skill] {
        &self.skills
    }

    pub fn get(&self, key: SkillKey) -> Option<&Skill> {
        self.skills.iter().find(|skill| skill.key == key)
    }

    pub fn crit_bonus_rounds(&self) -> u32 {
        self.crit_bonus_rounds
    }

    /// Checks, in order: the skill exists, is off cooldown, and is
    /// affordable. Nothing is mutated unless all three pass.
    pub fn activate(&mut self, key: SkillKey, player: &mut PlayerProgression) -> Result<SkillEffect> {
        let skill = self
            .skills
            .iter_mut()
            .find(|skill| skill.key == key)
            .ok_or_else(|| GameError::UnknownSkill(key.to_string()))?;

        if !skill.is_ready() {
            return Err(GameError::OnCooldown {
                skill: key.to_string(),
                remaining: skill.cooldown,
            });
        }

        player.spend_gold(skill.cost)?;
        skill.cooldown = skill.max_cooldown;

        let stats = &mut player.stats;
        let effect = match key {
            SkillKey::Attack => {
                let boost = (stats.attack as f64 * SKILL_BUFF_RATIO) as u32;
                stats.attack += boost;
                SkillEffect::AttackBoost(boost)
            }
            SkillKey::Defense => {
                let boost = (stats.defense as f64 * SKILL_BUFF_RATIO) as u32;
                stats.defense += boost;
                SkillEffect::DefenseBoost(boost)
            }
            SkillKey::Heal => {
                let before = stats.health;
                stats.heal((stats.max_health as f64 * SKILL_HEAL_RATIO) as u32);
                SkillEffect::Healed(stats.health - before)
            }
            SkillKey::Critical => {
                self.crit_bonus_rounds = CRIT_SKILL_ROUNDS;
                SkillEffect::CriticalFocus {
                    rounds: CRIT_SKILL_ROUNDS,
                }
            }
        };

        Ok(effect)
    }

    /// One round has passed: every cooling skill moves one step closer.
    pub fn tick_cooldowns(&mut self) {
        for skill in &mut self.skills {
            skill.cooldown = skill.cooldown.saturating_sub(1);
            debug_assert!(skill.cooldown <= skill.max_cooldown);
        }
    }

    /// Extra crit chance for the coming round, consuming one boosted round.
    pub fn take_crit_bonus(&mut self) -> f64 {
        if self.crit_bonus_rounds == 0 {
            return 0.0;
        }
        self.crit_bonus_rounds -= 1;
        CRIT_SKILL_BONUS
    }
}

impl Default for SkillTable {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rich_player() -> PlayerProgression {
        let mut player = PlayerProgression::new();
        player.gold = 1000;
        player
    }

    #[test]
    fn test_empty_table_is_configuration_error() {
        assert!(matches!(
            SkillTable::new(Vec::new()),
            Err(GameError::Configuration(_))
        ));
    }

    #[test]
    fn test_attack_skill_boosts_and_charges() {
        let mut table = SkillTable::with_defaults();
        let mut player = rich_player();

        let effect = table.activate(SkillKey::Attack, &mut player).unwrap();

        assert_eq!(effect, SkillEffect::AttackBoost(5));
        assert_eq!(player.stats.attack, 15);
        assert_eq!(player.gold, 990);
        assert_eq!(table.get(SkillKey::Attack).unwrap().cooldown, 3);
    }

    #[test]
    fn test_defense_skill_floors_boost() {
        let mut table = SkillTable::with_defaults();
        let mut player = rich_player();

        table.activate(SkillKey::Defense, &mut player).unwrap();

        // floor(5 * 0.5) = 2
        assert_eq!(player.stats.defense, 7);
    }

    #[test]
    fn test_heal_caps_at_max_health() {
        let mut table = SkillTable::with_defaults();
        let mut player = rich_player();
        player.stats.health = 90;

        let effect = table.activate(SkillKey::Heal, &mut player).unwrap();

        assert_eq!(player.stats.health, 100);
        assert_eq!(effect, SkillEffect::Healed(10));
    }

    #[test]
    fn test_critical_grants_bonus_rounds() {
        let mut table = SkillTable::with_defaults();
        let mut player = rich_player();

        table.activate(SkillKey::Critical, &mut player).unwrap();
        assert_eq!(table.crit_bonus_rounds(), CRIT_SKILL_ROUNDS);

        for _ in 0..CRIT_SKILL_ROUNDS {
            assert_eq!(table.take_crit_bonus(), CRIT_SKILL_BONUS);
        }
        assert_eq!(table.take_crit_bonus(), 0.0);
    }

    #[test]
    fn test_on_cooldown_leaves_state_untouched() {
        let mut table = SkillTable::with_defaults();
        let mut player = rich_player();
        table.activate(SkillKey::Attack, &mut player).unwrap();
        let gold = player.gold;
        let attack = player.stats.attack;

        let err = table.activate(SkillKey::Attack, &mut player).unwrap_err();

        assert!(matches!(err, GameError::OnCooldown { remaining: 3, .. }));
        assert_eq!(player.gold, gold);
        assert_eq!(player.stats.attack, attack);
        assert_eq!(table.get(SkillKey::Attack).unwrap().cooldown, 3);
    }

    #[test]
    fn test_insufficient_funds_leaves_cooldown_ready() {
        let mut table = SkillTable::with_defaults();
        let mut player = PlayerProgression::new();
        player.gold = 9;

        let err = table.activate(SkillKey::Attack, &mut player).unwrap_err();

        assert!(matches!(
            err,
            GameError::InsufficientFunds {
                needed: 10,
                available: 9
            }
        ));
        assert_eq!(player.gold, 9);
        assert!(table.get(SkillKey::Attack).unwrap().is_ready());
    }

    #[test]
    fn test_cooldown_checked_before_funds() {
        let mut table = SkillTable::with_defaults();
        let mut player = PlayerProgression::new();
        player.gold = 10;
        table.activate(SkillKey::Attack, &mut player).unwrap();
        assert_eq!(player.gold, 0);

        let err = table.activate(SkillKey::Attack, &mut player).unwrap_err();
        assert!(matches!(err, GameError::OnCooldown { .. }));
    }

    #[test]
    fn test_missing_from_custom_table() {
        let mut table = SkillTable::new(vec![Skill::new(SkillKey::Heal, 20, 8)]).unwrap();
        let mut player = rich_player();
        assert!(matches!(
            table.activate(SkillKey::Attack, &mut player),
            Err(GameError::UnknownSkill(_))
        ));
    }

    #[test]
    fn test_cooldown_counts_down_to_ready() {
        let mut table = SkillTable::with_defaults();
        let mut player = rich_player();
        table.activate(SkillKey::Defense, &mut player).unwrap();

        for expected in (0..5).rev() {
            table.tick_cooldowns();
            assert_eq!(table.get(SkillKey::Defense).unwrap().cooldown, expected);
        }
        table.tick_cooldowns();
        assert_eq!(table.get(SkillKey::Defense).unwrap().cooldown, 0);
        assert!(table.activate(SkillKey::Defense, &mut player).is_ok());
    }
}
