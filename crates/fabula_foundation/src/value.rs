//! The uniform runtime value.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A runtime value: one signed machine word.
///
/// Every value a running story touches is a single `i64`. The static type
/// decides how the word is read: integers hold themselves, booleans are
/// 0 or 1, strings hold an intern id, items hold an item id, enums hold
/// an ordinal, and delegates hold a function id. Zero is the default
/// reading for every type (null item, empty string, `false`, first enum
/// value, null function), so unset storage always reads back as a
/// well-formed value.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct Value(i64);

impl Value {
    /// The shared zero value: null item, empty string, false, null function.
    pub const NULL: Self = Self(0);
    /// Boolean false.
    pub const FALSE: Self = Self(0);
    /// Boolean true.
    pub const TRUE: Self = Self(1);

    /// Wraps a raw word.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Returns the raw word.
    #[must_use]
    pub const fn raw(self) -> i64 {
        self.0
    }

    /// Reads the word as a boolean. Anything nonzero is true.
    #[must_use]
    pub const fn truthy(self) -> bool {
        self.0 != 0
    }

    /// Reads the word as an id index. Negative or oversized words clamp
    /// to zero, the universal null id.
    #[must_use]
    pub fn index(self) -> usize {
        usize::try_from(self.0).unwrap_or(0)
    }
}

impl From<i64> for Value {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

impl From<bool> for Value {
    fn from(flag: bool) -> Self {
        if flag { Self::TRUE } else { Self::FALSE }
    }
}

impl From<Value> for i64 {
    fn from(value: Value) -> Self {
        value.0
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
