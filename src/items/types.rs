use serde::{Deserialize, Serialize};

/// What a consumable does when used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemEffect {
    /// Restore health, capped at max health
    Heal(u32),
    /// Permanent attack bonus
    Attack(u32),
    /// Permanent defense bonus
    Defense(u32),
    /// Experience (level-ups apply)
    Exp(u64),
    Gold(u64),
}

impl ItemEffect {
    pub fn describe(&self) -> String {
        match self {
            ItemEffect::Heal(v) => format!("restores {} health", v),
            ItemEffect::Attack(v) => format!("+{} attack", v),
            ItemEffect::Defense(v) => format!("+{} defense", v),
            ItemEffect::Exp(v) => format!("+{} experience", v),
            ItemEffect::Gold(v) => format!("+{} gold", v),
        }
    }
}

/// A droppable consumable template.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LootTemplate {
    pub name: &'static str,
    pub effect: ItemEffect,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: String,
    pub quantity: u32,
}

/// Ordered stack list; names are unique and quantities are always positive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inventory {
    items: Vec<InventoryItem>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge by name: bump the existing stack or append a new one.
    pub fn add(&mut self, name: &str, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|item| item.name == name) {
            Some(existing) => existing.quantity += quantity,
            None => self.items.push(InventoryItem {
                name: name.to_string(),
                quantity,
            }),
        }
    }

    /// Take one unit; returns false when the item isn't held.
    pub fn remove_one(&mut self, name: &str) -> bool {
        let Some(index) = self.items.iter().position(|item| item.name == name) else {
            return false;
        };
        let item = &mut self.items[index];
        item.quantity -= 1;
        if item.quantity == 0 {
            self.items.remove(index);
        }
        true
    }

    pub fn quantity(&self, name: &str) -> u32 {
        self.items
            .iter()
            .find(|item| item.name == name)
            .map_or(0, |item| item.quantity)
    }

    pub fn items(&self) -> &[InventoryItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Drop zero-quantity stacks and merge duplicate names (used when
    /// normalizing a loaded record).
    pub fn normalize(&mut self) {
        let raw = std::mem::take(&mut self.items);
        for item in raw {
            self.add(&item.name, item.quantity);
        }
    }
}
