use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::categorizer::ItemCategorizer;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CartItemId(pub String);

impl CartItemId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    pub name: String,
    pub quantity: u32,
    pub category: String,
    pub added_at: DateTime<Utc>,
}

/// Effect of applying an add or remove command to a cart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CartChange {
    Added { id: CartItemId, name: String, quantity: u32 },
    Incremented { id: CartItemId, name: String, quantity: u32 },
    Removed { names: Vec<String> },
}

/// Cart mutations triggered by voice commands.
pub trait CartMutator {
    fn add_item(&mut self, name: &str, quantity: u32) -> CartChange;

    /// Removes every item whose name contains `pattern`, case-insensitively.
    fn remove_item(&mut self, pattern: &str) -> CartChange;

    /// Items in insertion order, most recently added last.
    fn items(&self) -> &[CartItem];
}

#[derive(Clone, Debug, Default, Serialize)]
pub struct ShoppingCart {
    items: Vec<CartItem>,
    #[serde(skip)]
    categorizer: ItemCategorizer,
}

impl ShoppingCart {
    pub fn new(categorizer: ItemCategorizer) -> Self {
        Self { items: Vec::new(), categorizer }
    }

    pub fn with_items(items: Vec<CartItem>, categorizer: ItemCategorizer) -> Self {
        Self { items, categorizer }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn increment(&mut self, id: &CartItemId) -> bool {
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_add(1);
                true
            }
            None => false,
        }
    }

    /// Decrements a quantity, never below one.
    pub fn decrement(&mut self, id: &CartItemId) -> bool {
        match self.items.iter_mut().find(|item| &item.id == id) {
            Some(item) => {
                item.quantity = item.quantity.saturating_sub(1).max(1);
                true
            }
            None => false,
        }
    }

    pub fn remove(&mut self, id: &CartItemId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| &item.id != id);
        before != self.items.len()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl CartMutator for ShoppingCart {
    fn add_item(&mut self, name: &str, quantity: u32) -> CartChange {
        let quantity = quantity.max(1);
        let lower = name.to_lowercase();

        if let Some(existing) = self.items.iter_mut().find(|item| item.name.to_lowercase() == lower) {
            existing.quantity = existing.quantity.saturating_add(quantity);
            debug!(
                event_name = "core.cart.incremented",
                item = %existing.name,
                quantity = existing.quantity,
                "cart item quantity incremented"
            );
            return CartChange::Incremented {
                id: existing.id.clone(),
                name: existing.name.clone(),
                quantity: existing.quantity,
            };
        }

        let item = CartItem {
            id: CartItemId::generate(),
            name: name.to_owned(),
            quantity,
            category: self.categorizer.categorize(name).to_owned(),
            added_at: Utc::now(),
        };
        debug!(
            event_name = "core.cart.added",
            item = %item.name,
            category = %item.category,
            quantity,
            "cart item added"
        );
        let change = CartChange::Added { id: item.id.clone(), name: item.name.clone(), quantity };
        self.items.push(item);
        change
    }

    fn remove_item(&mut self, pattern: &str) -> CartChange {
        let needle = pattern.to_lowercase();
        let mut names = Vec::new();
        self.items.retain(|item| {
            let matched = item.name.to_lowercase().contains(&needle);
            if matched {
                names.push(item.name.clone());
            }
            !matched
        });
        debug!(event_name = "core.cart.removed", pattern, removed = names.len(), "cart items removed");
        CartChange::Removed { names }
    }

    fn items(&self) -> &[CartItem] {
        &self.items
    }
}
