use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::GameError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillKey {
    Attack,
    Defense,
    Heal,
    Critical,
}

impl SkillKey {
    pub fn all() -> [SkillKey; 4] {
        [
            SkillKey::Attack,
            SkillKey::Defense,
            SkillKey::Heal,
            SkillKey::Critical,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            SkillKey::Attack => "attack",
            SkillKey::Defense => "defense",
            SkillKey::Heal => "heal",
            SkillKey::Critical => "critical",
        }
    }

    /// `(cost, max_cooldown)` for the built-in table.
    pub fn default_cost_and_cooldown(&self) -> (u64, u32) {
        match self {
            SkillKey::Attack => (10, 3),
            SkillKey::Defense => (15, 5),
            SkillKey::Heal => (20, 8),
            SkillKey::Critical => (25, 10),
        }
    }
}

impl fmt::Display for SkillKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SkillKey {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SkillKey::all()
            .into_iter()
            .find(|key| key.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::UnknownSkill(s.to_string()))
    }
}

/// An active ability. `cooldown` counts down in combat rounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub key: SkillKey,
    pub cost: u64,
    pub max_cooldown: u32,
    pub cooldown: u32,
}

impl Skill {
    pub fn new(key: SkillKey, cost: u64, max_cooldown: u32) -> Self {
        Self {
            key,
            cost,
            max_cooldown,
            cooldown: 0,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.cooldown == 0
    }
}

/// What an activation did, for the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillEffect {
    AttackBoost(u32),
    DefenseBoost(u32),
    Healed(u32),
    CriticalFocus { rounds: u32 },
}

impl SkillEffect {
    pub fn describe(&self) -> String {
        match self {
            SkillEffect::AttackBoost(v) => format!("attack +{}", v),
            SkillEffect::DefenseBoost(v) => format!("defense +{}", v),
            SkillEffect::Healed(v) => format!("restored {} health", v),
            SkillEffect::CriticalFocus { rounds } => {
                format!("critical chance raised for {} rounds", rounds)
            }
        }
    }
}
