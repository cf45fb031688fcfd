//! Consumable loot: templates, drop rolls and the player's inventory.

pub mod drops;
pub mod types;

pub use drops::{find_loot, roll_loot, LOOT_TABLE};
pub use types::{Inventory, InventoryItem, ItemEffect, LootTemplate};
