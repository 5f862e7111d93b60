//! String interning.
//!
//! Every string a story touches, whether written in source or built at
//! run time by a text template, lives in one [`Interner`]. String values
//! carry the intern id, so equality between string values is an id
//! comparison.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Identifier of an interned string.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StrId(pub(crate) u32);

impl StrId {
    /// The empty string, present in every interner at id zero.
    pub const EMPTY: Self = Self(0);

    /// Returns the raw index of this string.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Reads a string id out of a runtime value. Out-of-range words clamp
    /// to the empty string.
    #[must_use]
    pub fn from_value(value: Value) -> Self {
        Self(u32::try_from(value.raw()).unwrap_or(0))
    }

    /// Converts this id to a runtime value.
    #[must_use]
    pub fn to_value(self) -> Value {
        Value::new(i64::from(self.0))
    }
}

impl fmt::Debug for StrId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StrId({})", self.0)
    }
}

/// Deduplicating string store.
#[derive(Clone, Debug)]
pub struct Interner {
    strings: Vec<Arc<str>>,
    ids: HashMap<Arc<str>, StrId>,
}

impl Interner {
    /// Creates a store holding only the empty string.
    #[must_use]
    pub fn new() -> Self {
        let mut interner = Self {
            strings: Vec::new(),
            ids: HashMap::new(),
        };
        interner.intern("");
        interner
    }

    /// Interns a string, returning the id of the existing copy if one is
    /// already stored.
    pub fn intern(&mut self, text: &str) -> StrId {
        if let Some(&id) = self.ids.get(text) {
            return id;
        }
        let id = StrId(u32::try_from(self.strings.len()).unwrap_or(u32::MAX));
        let shared: Arc<str> = Arc::from(text);
        self.strings.push(Arc::clone(&shared));
        self.ids.insert(shared, id);
        id
    }

    /// Returns the text of an interned string. Unknown ids resolve to the
    /// empty string.
    #[must_use]
    pub fn resolve(&self, id: StrId) -> &str {
        self.strings.get(id.index()).map_or("", |s| &**s)
    }

    /// Looks up a string without interning it.
    #[must_use]
    pub fn get(&self, text: &str) -> Option<StrId> {
        self.ids.get(text).copied()
    }

    /// Number of distinct strings stored, counting the empty string.
    #[must_use]
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// Whether the store holds no strings. A fresh interner is never
    /// empty because the empty string is pre-interned.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
