//! Sparse per-item property columns.
//!
//! Each declared property owns an independent `Vec<Value>` column indexed
//! by item id. Columns start empty and grow lazily by doubling on first
//! write past capacity, so a property set on three items out of ten
//! thousand costs a handful of words. Reads outside a column's capacity
//! yield zero without growing anything, which is exactly the default
//! value of every type.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use fabula_foundation::{ItemId, PropId, TypeId, Value};

/// A declared property.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyDef {
    /// The property's declared name.
    pub name: String,
    /// Type of the values the property stores.
    pub ty: TypeId,
    /// Doc comment lines attached to the declaration.
    pub docs: Vec<String>,
}

/// Column store for every declared property.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PropertyStore {
    defs: Vec<PropertyDef>,
    columns: Vec<Vec<Value>>,
}

impl PropertyStore {
    /// Creates a store holding only the builtin `name` property.
    #[must_use]
    pub fn new() -> Self {
        Self {
            defs: vec![PropertyDef {
                name: "name".to_string(),
                ty: TypeId::STRING,
                docs: Vec::new(),
            }],
            columns: vec![Vec::new()],
        }
    }

    /// Declares a property. Returns `None` when the name is already
    /// taken.
    pub fn declare(&mut self, name: &str, ty: TypeId, docs: Vec<String>) -> Option<PropId> {
        if self.defs.iter().any(|def| def.name == name) {
            return None;
        }
        let id = PropId::from_raw(u32::try_from(self.defs.len()).unwrap_or(u32::MAX));
        self.defs.push(PropertyDef {
            name: name.to_string(),
            ty,
            docs,
        });
        self.columns.push(Vec::new());
        Some(id)
    }

    /// Returns a property's definition.
    #[must_use]
    pub fn def(&self, prop: PropId) -> Option<&PropertyDef> {
        self.defs.get(prop.index())
    }

    /// Returns a property's declared name.
    #[must_use]
    pub fn name(&self, prop: PropId) -> &str {
        self.defs.get(prop.index()).map_or("", |def| def.name.as_str())
    }

    /// Returns the type a property stores. Unknown ids read as null.
    #[must_use]
    pub fn ty(&self, prop: PropId) -> TypeId {
        self.defs.get(prop.index()).map_or(TypeId::NULL, |def| def.ty)
    }

    /// Reads a property of an item.
    ///
    /// The null item, items beyond the column's capacity, and unknown
    /// properties all read as zero.
    #[must_use]
    pub fn get(&self, item: ItemId, prop: PropId) -> Value {
        self.columns
            .get(prop.index())
            .and_then(|col| col.get(item.index()))
            .copied()
            .unwrap_or(Value::NULL)
    }

    /// Writes a property of an item.
    ///
    /// Writes to the null item are dropped. A write past the column's
    /// capacity doubles the column until the slot exists, then stores.
    pub fn set(&mut self, item: ItemId, prop: PropId, value: Value) {
        if item == ItemId::NULL {
            return;
        }
        let Some(col) = self.columns.get_mut(prop.index()) else {
            return;
        };
        let idx = item.index();
        if idx >= col.len() {
            let mut capacity = col.len().max(1);
            while capacity <= idx {
                capacity *= 2;
            }
            col.resize(capacity, Value::NULL);
        }
        if let Some(slot) = col.get_mut(idx) {
            *slot = value;
        }
    }

    /// Number of declared properties, counting the builtin `name`.
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Whether no properties exist. Never true: `name` is always present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }
}

impl Default for PropertyStore {
    fn default() -> Self {
        Self::new()
    }
}
