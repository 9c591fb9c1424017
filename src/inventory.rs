use serde::{Deserialize, Serialize};

use crate::errors::InventoryError;
use crate::item::Item;

pub const DEFAULT_INVENTORY_CAPACITY: usize = 10;

/// The player's bag: a bounded, ordered list of items plus a coin purse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    items: Vec<Item>,
    coins: u32,
    capacity: usize,
}

/// Item names and coin count, as published on the inventory channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub items: Vec<String>,
    pub coins: u32,
    pub capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::new(DEFAULT_INVENTORY_CAPACITY)
    }
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            coins: 0,
            capacity,
        }
    }

    /// Stores an item at the end of the bag. A full bag rejects it and stays
    /// unchanged.
    pub fn add_item(&mut self, item: Item) -> Result<(), InventoryError> {
        if self.is_full() {
            return Err(InventoryError::Full {
                capacity: self.capacity,
            });
        }
        self.items.push(item);
        Ok(())
    }

    /// Takes the item at `index` out of the bag, shifting later items down.
    pub fn remove_item(&mut self, index: usize) -> Result<Item, InventoryError> {
        if index >= self.items.len() {
            return Err(InventoryError::InvalidIndex {
                index,
                len: self.items.len(),
            });
        }
        Ok(self.items.remove(index))
    }

    pub fn item(&self, index: usize) -> Option<&Item> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[Item] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn add_coins(&mut self, amount: u32) {
        self.coins = self.coins.saturating_add(amount);
    }

    pub fn snapshot(&self) -> InventorySnapshot {
        InventorySnapshot {
            items: self.items.iter().map(|item| item.name.clone()).collect(),
            coins: self.coins,
            capacity: self.capacity,
        }
    }
}
