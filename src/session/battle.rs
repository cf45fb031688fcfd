//! The per-player battle state machine.
//!
//! `BattleSession` never performs I/O and never sleeps. A scheduler calls
//! [`BattleSession::tick`] at a fixed interval while the session is
//! fighting (or recovering from a death) and drains
//! [`BattleSession::take_dirty`] to decide when to persist.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::character::progression::{
    DeathPenalty, ItemUse, LevelUp, PlayerProgression, UpgradeKind, VictoryReport,
};
use crate::combat::catalog::EnemyCatalog;
use crate::combat::logic::resolve_round;
use crate::combat::types::{Enemy, RoundOutcome};
use crate::core::config::GameConfig;
use crate::core::error::Result;
use crate::core::game_state::{GameSnapshot, UserId};
use crate::core::log::{BattleLog, LogEntry, LogKind};
use crate::items::ItemEffect;
use crate::skills::{SkillEffect, SkillKey, SkillTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleState {
    Idle,
    Fighting,
    /// Recovering after a defeat; returns to `Idle` when the countdown ends
    Dead { remaining_ticks: u32 },
}

impl BattleState {
    /// States in which the scheduler must keep ticking.
    pub fn is_active(&self) -> bool {
        !matches!(self, BattleState::Idle)
    }
}

/// Everything that happened in one tick.
#[derive(Debug, Clone, Default)]
pub struct TickResult {
    /// A new enemy was spawned instead of fighting
    pub spawned_enemy: bool,
    pub round: Option<RoundOutcome>,
    pub enemy_name: Option<String>,
    pub victory: Option<VictoryReport>,
    pub death: Option<DeathPenalty>,
    /// The dead window ended this tick
    pub recovered: bool,
}

impl TickResult {
    pub fn had_combat(&self) -> bool {
        self.round.is_some()
    }
}

pub struct BattleSession {
    user_id: UserId,
    state: BattleState,
    player: PlayerProgression,
    enemy: Option<Enemy>,
    skills: SkillTable,
    log: BattleLog,
    catalog: Arc<EnemyCatalog>,
    config: Arc<GameConfig>,
    rng: StdRng,
    dirty: bool,
}

impl BattleSession {
    /// Open a session for a loaded (or fresh) progression record. The RNG
    /// is seeded from the config when it carries a seed.
    pub fn new(
        user_id: UserId,
        player: PlayerProgression,
        catalog: Arc<EnemyCatalog>,
        config: Arc<GameConfig>,
    ) -> Result<Self> {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(user_id, player, catalog, config, rng)
    }

    pub fn with_rng(
        user_id: UserId,
        player: PlayerProgression,
        catalog: Arc<EnemyCatalog>,
        config: Arc<GameConfig>,
        rng: StdRng,
    ) -> Result<Self> {
        let log = BattleLog::new(config.session.log_capacity);
        let mut session = Self {
            user_id,
            state: BattleState::Idle,
            player,
            enemy: None,
            skills: SkillTable::with_defaults(),
            log,
            catalog,
            config,
            rng,
            dirty: false,
        };

        let level_ups = session.player.normalize();
        if !level_ups.is_empty() {
            session.log_level_ups(&level_ups);
            session.dirty = true;
        }
        session.log.push(
            LogKind::System,
            format!("Welcome back! You are level {}.", session.player.level),
        );
        session.spawn_enemy()?;
        Ok(session)
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub fn state(&self) -> BattleState {
        self.state
    }

    pub fn player(&self) -> &PlayerProgression {
        &self.player
    }

    pub fn enemy(&self) -> Option<&Enemy> {
        self.enemy.as_ref()
    }

    pub fn skills(&self) -> &SkillTable {
        &self.skills
    }

    pub fn log(&self) -> &BattleLog {
        &self.log
    }

    pub fn log_since(&self, cursor: u64) -> Vec<LogEntry> {
        self.log.since(cursor)
    }

    /// True when progression changed since the last call.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Begin fighting the current enemy. Returns whether the state changed;
    /// refusals are reported through the log only.
    pub fn start(&mut self) -> bool {
        match self.state {
            BattleState::Fighting => return false,
            BattleState::Dead { remaining_ticks } => {
                self.log.push(
                    LogKind::System,
                    format!("You are still recovering ({} ticks left).", remaining_ticks),
                );
                return false;
            }
            BattleState::Idle => {}
        }

        let Some(enemy) = self.enemy.as_ref().filter(|enemy| enemy.is_alive()) else {
            self.log.push(LogKind::System, "There is no enemy to fight.");
            return false;
        };

        let message = format!("Battle started against {} (Lv.{}).", enemy.name, enemy.level);
        self.state = BattleState::Fighting;
        self.log.push(LogKind::System, message);
        info!(user = %self.user_id, "battle started");
        true
    }

    /// Stop fighting. A no-op unless currently fighting.
    pub fn stop(&mut self) -> bool {
        if self.state != BattleState::Fighting {
            return false;
        }
        self.state = BattleState::Idle;
        self.log.push(LogKind::System, "Battle stopped.");
        info!(user = %self.user_id, "battle stopped");
        true
    }

    /// Advance one time unit.
    pub fn tick(&mut self) -> Result<TickResult> {
        match self.state {
            BattleState::Idle => Ok(TickResult::default()),
            BattleState::Dead { remaining_ticks } => Ok(self.tick_dead(remaining_ticks)),
            BattleState::Fighting => self.tick_fighting(),
        }
    }

    fn tick_dead(&mut self, remaining_ticks: u32) -> TickResult {
        let remaining = remaining_ticks.saturating_sub(1);
        if remaining > 0 {
            self.state = BattleState::Dead {
                remaining_ticks: remaining,
            };
            return TickResult::default();
        }

        self.state = BattleState::Idle;
        self.log.push(LogKind::System, "You have recovered and are ready to fight.");
        TickResult {
            recovered: true,
            ..TickResult::default()
        }
    }

    fn tick_fighting(&mut self) -> Result<TickResult> {
        let mut result = TickResult::default();

        if !self.enemy.as_ref().is_some_and(Enemy::is_alive) {
            self.spawn_enemy()?;
            result.spawned_enemy = true;
            return Ok(result);
        }
        let Some(enemy) = self.enemy.as_mut() else {
            return Ok(result);
        };

        self.skills.tick_cooldowns();
        let crit_bonus = self.skills.take_crit_bonus();
        let outcome = resolve_round(
            &mut self.player.stats,
            &mut enemy.stats,
            &self.config.combat,
            crit_bonus,
            &mut self.rng,
        );
        result.round = Some(outcome);
        result.enemy_name = Some(enemy.name.clone());
        self.dirty = true;

        let enemy_name = enemy.name.clone();
        debug!(
            user = %self.user_id,
            dealt = outcome.player_damage_dealt,
            taken = outcome.enemy_damage_dealt,
            enemy_health = enemy.stats.health,
            "round resolved"
        );
        self.log_round(&enemy_name, &outcome);

        if outcome.enemy_defeated {
            let defeated = self.enemy.take();
            if let Some(defeated) = defeated {
                let report =
                    self.player
                        .award_victory(&defeated, &self.config.progression, &mut self.rng);
                self.log_victory(&defeated, &report);
                result.victory = Some(report);
            }
            self.spawn_enemy()?;
        } else if outcome.player_defeated {
            let penalty = self.player.apply_death_penalty(&self.config.progression);
            if let Some(enemy) = self.enemy.take() {
                self.player.record_defeat(&enemy, &penalty);
            }
            self.log.push(
                LogKind::System,
                format!(
                    "You were defeated by {}! Lost {} gold.",
                    enemy_name, penalty.gold_lost
                ),
            );
            info!(user = %self.user_id, gold_lost = penalty.gold_lost, "player defeated");

            let window = self.config.session.death_recovery_ticks;
            self.state = if window == 0 {
                BattleState::Idle
            } else {
                BattleState::Dead {
                    remaining_ticks: window,
                }
            };
            result.death = Some(penalty);
            self.spawn_enemy()?;
        }

        Ok(result)
    }

    /// Replace the current enemy with a fresh one scaled to the player.
    pub fn spawn_enemy(&mut self) -> Result<()> {
        let enemy = self.catalog.spawn(self.player.level, &mut self.rng)?;
        self.log.push(
            LogKind::System,
            format!("A wild {} (Lv.{}) appears!", enemy.name, enemy.level),
        );
        self.enemy = Some(enemy);
        Ok(())
    }

    pub fn use_skill(&mut self, key: SkillKey) -> Result<SkillEffect> {
        match self.skills.activate(key, &mut self.player) {
            Ok(effect) => {
                let cost = self.skills.get(key).map_or(0, |skill| skill.cost);
                self.log.push(
                    LogKind::Skill,
                    format!(
                        "Used {} skill for {} gold: {}.",
                        key,
                        cost,
                        effect.describe()
                    ),
                );
                self.dirty = true;
                Ok(effect)
            }
            Err(err) => {
                self.log.push(LogKind::System, err.to_string());
                Err(err)
            }
        }
    }

    pub fn use_skill_named(&mut self, name: &str) -> Result<SkillEffect> {
        match name.parse::<SkillKey>() {
            Ok(key) => self.use_skill(key),
            Err(err) => {
                self.log.push(LogKind::System, err.to_string());
                Err(err)
            }
        }
    }

    pub fn purchase_upgrade(&mut self, kind: UpgradeKind) -> Result<()> {
        let cost = self.config.progression.upgrade_cost;
        match self.player.purchase_upgrade(kind, cost) {
            Ok(()) => {
                self.log.push(
                    LogKind::System,
                    format!("Purchased {} upgrade for {} gold.", kind, cost),
                );
                self.dirty = true;
                Ok(())
            }
            Err(err) => {
                self.log.push(LogKind::System, err.to_string());
                Err(err)
            }
        }
    }

    pub fn use_item(&mut self, name: &str) -> Result<ItemUse> {
        match self.player.use_item(name) {
            Ok(used) => {
                let kind = match used.effect {
                    ItemEffect::Heal(_) => LogKind::Heal,
                    _ => LogKind::Loot,
                };
                self.log.push(
                    kind,
                    format!("Used {}: {}.", name, used.effect.describe()),
                );
                self.log_level_ups(&used.level_ups);
                self.dirty = true;
                Ok(used)
            }
            Err(err) => {
                self.log.push(LogKind::System, err.to_string());
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            user_id: self.user_id.clone(),
            state: self.state,
            progression: self.player.clone(),
            enemy: self.enemy.clone(),
            skills: self.skills.skills().to_vec(),
            crit_bonus_rounds: self.skills.crit_bonus_rounds(),
            log: self.log.entries().cloned().collect(),
            log_cursor: self.log.cursor(),
        }
    }

    fn log_round(&mut self, enemy_name: &str, outcome: &RoundOutcome) {
        if outcome.was_critical {
            self.log.push(
                LogKind::Critical,
                format!(
                    "Critical hit! You strike {} for {} damage.",
                    enemy_name, outcome.player_damage_dealt
                ),
            );
        } else {
            self.log.push(
                LogKind::Attack,
                format!(
                    "You hit {} for {} damage.",
                    enemy_name, outcome.player_damage_dealt
                ),
            );
        }

        if !outcome.enemy_countered() {
            return;
        }
        if outcome.was_dodged {
            self.log.push(
                LogKind::Dodge,
                format!("You dodged {}'s attack!", enemy_name),
            );
        } else {
            self.log.push(
                LogKind::Defense,
                format!(
                    "{} hits you for {} damage.",
                    enemy_name, outcome.enemy_damage_dealt
                ),
            );
        }
    }

    fn log_victory(&mut self, enemy: &Enemy, report: &VictoryReport) {
        self.log.push(
            LogKind::System,
            format!(
                "Defeated {}! Gained {} exp and {} gold.",
                enemy.name, report.exp_gained, report.gold_gained
            ),
        );
        if let Some(item) = report.loot {
            self.log
                .push(LogKind::Loot, format!("Found a {}!", item.name));
        }
        self.log_level_ups(&report.level_ups);
    }

    fn log_level_ups(&mut self, level_ups: &[LevelUp]) {
        for level_up in level_ups {
            self.log.push(
                LogKind::LevelUp,
                format!(
                    "Level up! You are now level {} (+{} gold).",
                    level_up.new_level, level_up.gold_bonus
                ),
            );
            info!(user = %self.user_id, level = level_up.new_level, "level up");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::types::EnemyTemplate;
    use crate::core::config::{CombatRules, EnemyRules, ProgressionRules};

    fn flat_config() -> GameConfig {
        GameConfig {
            combat: CombatRules::flat(),
            enemies: EnemyRules {
                level_jitter: 0,
                ..EnemyRules::default()
            },
            progression: ProgressionRules {
                loot_chance: 0.0,
                ..ProgressionRules::default()
            },
            seed: Some(42),
            ..GameConfig::default()
        }
    }

    fn session_with(templates: Vec<EnemyTemplate>, player: PlayerProgression) -> BattleSession {
        let config = Arc::new(flat_config());
        let catalog = Arc::new(EnemyCatalog::new(templates, config.enemies).unwrap());
        BattleSession::new(UserId::new("tester"), player, catalog, config).unwrap()
    }

    fn boar_session() -> BattleSession {
        session_with(
            vec![EnemyTemplate::new("Wild Boar", 50, 8, 10, 5)],
            PlayerProgression::new(),
        )
    }

    #[test]
    fn test_new_session_has_enemy_and_is_idle() {
        let session = boar_session();
        assert_eq!(session.state(), BattleState::Idle);
        assert!(session.enemy().is_some());
        assert!(!session.log().is_empty());
    }

    #[test]
    fn test_start_and_stop_transitions() {
        let mut session = boar_session();
        assert!(session.start());
        assert_eq!(session.state(), BattleState::Fighting);
        assert!(!session.start());

        assert!(session.stop());
        assert_eq!(session.state(), BattleState::Idle);
        assert!(!session.stop());
    }

    #[test]
    fn test_idle_tick_is_noop() {
        let mut session = boar_session();
        let before = session.player().clone();
        let result = session.tick().unwrap();
        assert!(!result.had_combat());
        assert_eq!(session.player(), &before);
    }

    #[test]
    fn test_fighting_tick_resolves_flat_round() {
        let mut session = boar_session();
        session.start();
        let result = session.tick().unwrap();

        let round = result.round.expect("combat happened");
        assert_eq!(round.player_damage_dealt, 8);
        assert_eq!(round.enemy_damage_dealt, 3);
        assert_eq!(session.enemy().unwrap().stats.health, 42);
        assert_eq!(session.player().stats.health, 97);
        assert!(session.take_dirty());
        assert!(!session.take_dirty());
    }

    #[test]
    fn test_victory_awards_and_respawns() {
        let mut session = boar_session();
        session.start();

        let mut victory = None;
        for _ in 0..20 {
            let result = session.tick().unwrap();
            if result.victory.is_some() {
                victory = result.victory;
                break;
            }
        }

        let report = victory.expect("boar should fall within 20 rounds");
        assert_eq!(report.exp_gained, 10);
        assert_eq!(session.player().gold, 105);
        assert_eq!(session.state(), BattleState::Fighting);
        let enemy = session.enemy().unwrap();
        assert_eq!(enemy.stats.health, enemy.stats.max_health);
    }

    #[test]
    fn test_death_enters_dead_window_then_idle() {
        let mut player = PlayerProgression::new();
        player.gold = 200;
        let mut session = session_with(
            vec![EnemyTemplate::new("Elder Dragon", 500, 40, 100, 50)],
            player,
        );
        session.start();

        let mut death = None;
        for _ in 0..20 {
            let result = session.tick().unwrap();
            if result.death.is_some() {
                death = result.death;
                break;
            }
        }

        let penalty = death.expect("dragon should win");
        assert_eq!(penalty.gold_lost, 20);
        assert_eq!(session.player().gold, 180);
        assert_eq!(session.player().stats.health, 50);
        assert_eq!(
            session.state(),
            BattleState::Dead {
                remaining_ticks: 3
            }
        );
        assert!(!session.start());

        assert!(!session.tick().unwrap().recovered);
        assert!(!session.tick().unwrap().recovered);
        assert!(session.tick().unwrap().recovered);
        assert_eq!(session.state(), BattleState::Idle);

        let enemy = session.enemy().unwrap();
        assert!(enemy.is_alive());
        assert!(session.start());
    }

    #[test]
    fn test_stop_is_noop_while_dead() {
        let mut session = session_with(
            vec![EnemyTemplate::new("Elder Dragon", 500, 40, 100, 50)],
            PlayerProgression::new(),
        );
        session.start();
        while session.state() == BattleState::Fighting {
            session.tick().unwrap();
        }
        assert!(!session.stop());
        assert!(matches!(session.state(), BattleState::Dead { .. }));
    }

    #[test]
    fn test_skill_failure_is_logged_not_fatal() {
        let mut player = PlayerProgression::new();
        player.gold = 5;
        let mut session = session_with(
            vec![EnemyTemplate::new("Wild Boar", 50, 8, 10, 5)],
            player,
        );
        let cursor = session.log().cursor();

        assert!(session.use_skill(SkillKey::Attack).is_err());
        let entries = session.log_since(cursor);
        assert_eq!(entries.len(), 1);
        assert!(entries[0].message.contains("Not enough gold"));
        assert_eq!(session.player().gold, 5);
    }

    #[test]
    fn test_cooldowns_tick_with_rounds() {
        let mut session = boar_session();
        session.use_skill(SkillKey::Attack).unwrap();
        session.start();
        session.tick().unwrap();
        assert_eq!(
            session.skills().get(SkillKey::Attack).unwrap().cooldown,
            2
        );
    }

    #[test]
    fn test_log_is_bounded() {
        let mut session = boar_session();
        session.start();
        for _ in 0..200 {
            session.tick().unwrap();
        }
        assert!(session.log().len() <= session.config.session.log_capacity);
    }

    #[test]
    fn test_snapshot_reflects_state() {
        let mut session = boar_session();
        session.start();
        session.tick().unwrap();
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, BattleState::Fighting);
        assert_eq!(snapshot.skills.len(), 4);
        assert_eq!(snapshot.log_cursor, session.log().cursor());
        assert_eq!(snapshot.log.first(), session.log().latest());
    }
}
