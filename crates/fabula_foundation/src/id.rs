//! Dense numeric handles for world and definition tables.
//!
//! Every store in Fabula is a flat vector indexed by one of these ids.
//! Index zero is reserved in the stores where a null member exists: the
//! null item, the property holding display names, and the null function
//! that delegate calls short-circuit.

use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::value::Value;

macro_rules! dense_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
        pub struct $name(pub(crate) u32);

        impl $name {
            /// Wraps a raw table index.
            #[must_use]
            pub const fn from_raw(raw: u32) -> Self {
                Self(raw)
            }

            /// Returns the raw table index.
            #[must_use]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Returns the index as a `usize` for direct table access.
            #[must_use]
            pub const fn index(self) -> usize {
                self.0 as usize
            }

            /// Reads an id out of a runtime value. Negative or oversized
            /// words clamp to index zero.
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

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!(stringify!($name), "({})"), self.0)
            }
        }
    };
}

dense_id! {
    /// Identity of an item in the world. Id zero is the null item.
    ItemId
}

dense_id! {
    /// Identity of a declared property. Id zero is the builtin `name`
    /// property.
    PropId
}

dense_id! {
    /// Identity of a compiled function body. Id zero is the null
    /// function, which does nothing and returns null.
    FuncId
}

dense_id! {
    /// Identity of a mutable global variable.
    GlobalId
}

dense_id! {
    /// Identity of a declared map.
    MapId
}

dense_id! {
    /// Identity of a compiled command.
    CommandId
}

impl ItemId {
    /// The permanent null item.
    pub const NULL: Self = Self(0);
}

impl PropId {
    /// The builtin `name` property holding display names.
    pub const NAME: Self = Self(0);
}

impl FuncId {
    /// The null function: calling it does nothing and yields null.
    pub const NULL: Self = Self(0);
}
