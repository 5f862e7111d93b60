//! The item registry.
//!
//! Items are append-only with dense 0-based ids. Id zero is the permanent
//! null item: it exists in every world, has no name, and absorbs property
//! writes silently.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use fabula_foundation::ItemId;

/// A declared item.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemDef {
    /// The name given at declaration.
    pub name: String,
    /// Whether the item was declared with a bare identifier. Bare items
    /// can be referenced by name in story source; string-named items are
    /// reached through runtime lookup.
    pub bare: bool,
    /// Doc comment lines attached to the declaration.
    pub docs: Vec<String>,
}

/// Append-only item registry.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ItemStore {
    items: Vec<ItemDef>,
    by_name: HashMap<String, ItemId>,
}

impl ItemStore {
    /// Creates a store holding only the null item.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: vec![ItemDef {
                name: String::new(),
                bare: false,
                docs: Vec::new(),
            }],
            by_name: HashMap::new(),
        }
    }

    /// Declares an item. Returns `None` when the name is already taken.
    pub fn declare(&mut self, name: &str, bare: bool, docs: Vec<String>) -> Option<ItemId> {
        if self.by_name.contains_key(name) {
            return None;
        }
        let id = ItemId::from_raw(u32::try_from(self.items.len()).unwrap_or(u32::MAX));
        self.items.push(ItemDef {
            name: name.to_string(),
            bare,
            docs,
        });
        self.by_name.insert(name.to_string(), id);
        Some(id)
    }

    /// Finds an item by declared name. Unknown names resolve to the null
    /// item.
    #[must_use]
    pub fn lookup(&self, name: &str) -> ItemId {
        self.by_name.get(name).copied().unwrap_or(ItemId::NULL)
    }

    /// Returns an item's definition.
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ItemDef> {
        self.items.get(id.index())
    }

    /// Returns an item's declared name. The null item and unknown ids
    /// read as the empty string.
    #[must_use]
    pub fn name(&self, id: ItemId) -> &str {
        self.items.get(id.index()).map_or("", |item| item.name.as_str())
    }

    /// Whether the item was declared with a bare identifier.
    #[must_use]
    pub fn is_bare(&self, id: ItemId) -> bool {
        self.items.get(id.index()).is_some_and(|item| item.bare)
    }

    /// Number of stored items, counting the null item.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the store is empty. Never true: the null item is always
    /// present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of real items, excluding the null item.
    #[must_use]
    pub fn count(&self) -> usize {
        self.items.len() - 1
    }
}

impl Default for ItemStore {
    fn default() -> Self {
        Self::new()
    }
}
