use rand::Rng;

use super::types::{ItemEffect, LootTemplate};

/// Consumables eligible to drop on victory.
pub const LOOT_TABLE: [LootTemplate; 5] = [
    LootTemplate {
        name: "Health Potion",
        effect: ItemEffect::Heal(50),
    },
    LootTemplate {
        name: "Strength Potion",
        effect: ItemEffect::Attack(5),
    },
    LootTemplate {
        name: "Defense Potion",
        effect: ItemEffect::Defense(3),
    },
    LootTemplate {
        name: "Experience Potion",
        effect: ItemEffect::Exp(100),
    },
    LootTemplate {
        name: "Gold Pouch",
        effect: ItemEffect::Gold(25),
    },
];

/// Roll for a drop; on success pick uniformly from the loot table.
pub fn roll_loot(drop_chance: f64, rng: &mut impl Rng) -> Option<&'static LootTemplate> {
    if !rng.gen_bool(drop_chance.clamp(0.0, 1.0)) {
        return None;
    }
    Some(&LOOT_TABLE[rng.gen_range(0..LOOT_TABLE.len())])
}

pub fn find_loot(name: &str) -> Option<&'static LootTemplate> {
    LOOT_TABLE.iter().find(|template| template.name == name)
}
