//! Round resolution: one player swing and, if the enemy survives, one
//! counter-attack.
//!
//! These functions are pure apart from the injected RNG, so a seeded
//! generator (or [`CombatRules::flat`]) gives fully reproducible rounds.

use rand::Rng;

use super::types::RoundOutcome;
use crate::character::stats::StatBlock;
use crate::core::config::CombatRules;

/// Result of the player's swing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackResult {
    pub damage: u32,
    pub is_crit: bool,
}

/// `max(1, attack - defense)`
pub fn base_damage(attack: u32, defense: u32) -> u32 {
    attack.saturating_sub(defense).max(1)
}

pub fn roll_chance(chance: f64, rng: &mut impl Rng) -> bool {
    rng.gen_bool(chance.clamp(0.0, 1.0))
}

/// Player swing. A crit multiplies base damage; otherwise a variance
/// roll is applied. Both are floored.
pub fn calculate_player_attack(
    attacker: &StatBlock,
    defender: &StatBlock,
    rules: &CombatRules,
    bonus_crit_chance: f64,
    rng: &mut impl Rng,
) -> AttackResult {
    let base = base_damage(attacker.attack, defender.defense);
    let is_crit = roll_chance(rules.crit_chance + bonus_crit_chance, rng);

    let damage = if is_crit {
        (base as f64 * rules.crit_multiplier) as u32
    } else {
        let variance = rng.gen_range(rules.variance_min..=rules.variance_max);
        (base as f64 * variance) as u32
    };

    AttackResult { damage, is_crit }
}

/// Enemy swing: flat damage, no variance, may be dodged. Returns
/// `(damage, was_dodged)`.
pub fn calculate_enemy_attack(
    attacker: &StatBlock,
    defender: &StatBlock,
    rules: &CombatRules,
    rng: &mut impl Rng,
) -> (u32, bool) {
    if roll_chance(rules.dodge_chance, rng) {
        (0, true)
    } else {
        (base_damage(attacker.attack, defender.defense), false)
    }
}

/// Resolve one exchange, mutating both stat blocks.
///
/// The player strikes first. A killing blow ends the round with no
/// counter-hit.
pub fn resolve_round(
    player: &mut StatBlock,
    enemy: &mut StatBlock,
    rules: &CombatRules,
    bonus_crit_chance: f64,
    rng: &mut impl Rng,
) -> RoundOutcome {
    let mut outcome = RoundOutcome::default();

    let attack = calculate_player_attack(player, enemy, rules, bonus_crit_chance, rng);
    enemy.take_damage(attack.damage);
    outcome.player_damage_dealt = attack.damage;
    outcome.was_critical = attack.is_crit;

    if !enemy.is_alive() {
        outcome.enemy_defeated = true;
        debug_assert!(player.health <= player.max_health);
        return outcome;
    }

    let (damage, dodged) = calculate_enemy_attack(enemy, player, rules, rng);
    player.take_damage(damage);
    outcome.enemy_damage_dealt = damage;
    outcome.was_dodged = dodged;
    outcome.player_defeated = !player.is_alive();

    debug_assert!(player.health <= player.max_health);
    debug_assert!(enemy.health <= enemy.max_health);
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn create_test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(12345)
    }

    fn player() -> StatBlock {
        StatBlock::new(100, 10, 5)
    }

    fn enemy() -> StatBlock {
        StatBlock::new(50, 8, 2)
    }

    #[test]
    fn test_base_damage_minimum_one() {
        assert_eq!(base_damage(10, 2), 8);
        assert_eq!(base_damage(5, 5), 1);
        assert_eq!(base_damage(3, 40), 1);
    }

    #[test]
    fn test_flat_round_scenario() {
        let mut rng = create_test_rng();
        let mut p = player();
        let mut e = enemy();

        let outcome = resolve_round(&mut p, &mut e, &CombatRules::flat(), 0.0, &mut rng);

        assert_eq!(outcome.player_damage_dealt, 8);
        assert_eq!(outcome.enemy_damage_dealt, 3);
        assert!(!outcome.was_critical);
        assert!(!outcome.was_dodged);
        assert_eq!(e.health, 42);
        assert_eq!(p.health, 97);
    }

    #[test]
    fn test_killing_blow_skips_counter() {
        let mut rng = create_test_rng();
        let mut p = player();
        let mut e = enemy();
        e.health = 5;

        let outcome = resolve_round(&mut p, &mut e, &CombatRules::flat(), 0.0, &mut rng);

        assert!(outcome.enemy_defeated);
        assert!(!outcome.enemy_countered());
        assert_eq!(outcome.enemy_damage_dealt, 0);
        assert_eq!(e.health, 0);
        assert_eq!(p.health, 100);
    }

    #[test]
    fn test_player_defeated_flag() {
        let mut rng = create_test_rng();
        let mut p = player();
        p.health = 2;
        let mut e = StatBlock::new(500, 40, 12);

        let outcome = resolve_round(&mut p, &mut e, &CombatRules::flat(), 0.0, &mut rng);

        assert!(outcome.player_defeated);
        assert_eq!(p.health, 0);
    }

    #[test]
    fn test_guaranteed_crit_multiplies() {
        let mut rng = create_test_rng();
        let rules = CombatRules {
            crit_chance: 1.0,
            ..CombatRules::flat()
        };
        let attack = calculate_player_attack(&player(), &enemy(), &rules, 0.0, &mut rng);
        assert!(attack.is_crit);
        assert_eq!(attack.damage, 12);
    }

    #[test]
    fn test_bonus_crit_chance_applies() {
        let mut rng = create_test_rng();
        let rules = CombatRules::flat();
        let attack = calculate_player_attack(&player(), &enemy(), &rules, 1.0, &mut rng);
        assert!(attack.is_crit);
    }

    #[test]
    fn test_guaranteed_dodge() {
        let mut rng = create_test_rng();
        let rules = CombatRules {
            dodge_chance: 1.0,
            ..CombatRules::flat()
        };
        let mut p = player();
        let mut e = enemy();
        let outcome = resolve_round(&mut p, &mut e, &rules, 0.0, &mut rng);
        assert!(outcome.was_dodged);
        assert_eq!(outcome.enemy_damage_dealt, 0);
        assert_eq!(p.health, 100);
    }

    #[test]
    fn test_variance_bounds() {
        let mut rng = create_test_rng();
        let rules = CombatRules {
            crit_chance: 0.0,
            ..CombatRules::default()
        };
        let attacker = StatBlock::new(100, 102, 0);
        let defender = StatBlock::new(100, 0, 2);
        for _ in 0..1000 {
            let attack = calculate_player_attack(&attacker, &defender, &rules, 0.0, &mut rng);
            assert!((80..=120).contains(&attack.damage), "{}", attack.damage);
        }
    }

    #[test]
    fn test_health_stays_in_bounds_over_many_rounds() {
        let mut rng = create_test_rng();
        let rules = CombatRules::default();
        for _ in 0..500 {
            let mut p = player();
            let mut e = StatBlock::new(80, 12, 3);
            while p.is_alive() && e.is_alive() {
                let outcome = resolve_round(&mut p, &mut e, &rules, 0.0, &mut rng);
                assert!(p.health <= p.max_health);
                assert!(e.health <= e.max_health);
                assert_eq!(outcome.enemy_defeated, !e.is_alive());
                assert_eq!(outcome.player_defeated, !p.is_alive());
            }
        }
    }

    #[test]
    fn test_same_seed_same_rounds() {
        let rules = CombatRules::default();
        let mut rng1 = ChaCha8Rng::seed_from_u64(99999);
        let mut rng2 = ChaCha8Rng::seed_from_u64(99999);
        let (mut p1, mut e1) = (player(), enemy());
        let (mut p2, mut e2) = (player(), enemy());
        for _ in 0..5 {
            let a = resolve_round(&mut p1, &mut e1, &rules, 0.0, &mut rng1);
            let b = resolve_round(&mut p2, &mut e2, &rules, 0.0, &mut rng2);
            assert_eq!(a, b);
        }
    }
}
