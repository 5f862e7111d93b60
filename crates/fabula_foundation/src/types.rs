//! The story type registry.
//!
//! Types compare by [`TypeId`] identity. The six builtin types occupy
//! fixed ids; enums and delegates are registered during compilation.
//! Delegate registration is structural: declaring or demanding a delegate
//! shape that already exists returns the original id, so two delegate
//! types with the same parameter and return shapes are the same type.

use std::collections::HashMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Identity of a registered type.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TypeId(pub(crate) u32);

impl TypeId {
    /// Items in the world.
    pub const ITEM: Self = Self(0);
    /// Interned text.
    pub const STRING: Self = Self(1);
    /// 64-bit integers.
    pub const INT: Self = Self(2);
    /// True or false.
    pub const BOOL: Self = Self(3);
    /// The absent return type of functions that return nothing.
    pub const VOID: Self = Self(4);
    /// The type of the `null` literal before it unifies with a real type.
    pub const NULL: Self = Self(5);

    /// Returns the raw index of this type.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// Shape of a registered type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeKind {
    /// The builtin item type.
    Item,
    /// The builtin string type.
    String,
    /// The builtin integer type.
    Int,
    /// The builtin boolean type.
    Bool,
    /// The builtin void type.
    Void,
    /// The builtin null type.
    Null,
    /// A declared enumeration.
    Enum {
        /// Ordered value names; a value's ordinal is its position here.
        values: Vec<String>,
    },
    /// A function shape usable as a value.
    Delegate {
        /// Parameter types in order.
        params: Vec<TypeId>,
        /// Return type, [`TypeId::VOID`] when the shape returns nothing.
        ret: TypeId,
    },
}

#[derive(Clone, Debug)]
struct TypeEntry {
    name: String,
    named: bool,
    kind: TypeKind,
}

const FALLBACK_KIND: TypeKind = TypeKind::Null;

/// Registry of every type a story declares or demands.
#[derive(Clone, Debug)]
pub struct TypeStore {
    entries: Vec<TypeEntry>,
    delegates: HashMap<(Vec<TypeId>, TypeId), TypeId>,
}

impl TypeStore {
    /// Creates a store holding the six builtin types at their fixed ids.
    #[must_use]
    pub fn new() -> Self {
        let builtins = [
            ("Item", TypeKind::Item),
            ("String", TypeKind::String),
            ("Int", TypeKind::Int),
            ("Bool", TypeKind::Bool),
            ("Void", TypeKind::Void),
            ("Null", TypeKind::Null),
        ];
        let entries = builtins
            .into_iter()
            .map(|(name, kind)| TypeEntry {
                name: name.to_string(),
                named: true,
                kind,
            })
            .collect();
        Self {
            entries,
            delegates: HashMap::new(),
        }
    }

    fn push(&mut self, entry: TypeEntry) -> TypeId {
        let id = TypeId(u32::try_from(self.entries.len()).unwrap_or(u32::MAX));
        self.entries.push(entry);
        id
    }

    /// Registers an enumeration with its ordered value names.
    pub fn declare_enum(&mut self, name: &str, values: Vec<String>) -> TypeId {
        self.push(TypeEntry {
            name: name.to_string(),
            named: true,
            kind: TypeKind::Enum { values },
        })
    }

    /// Returns the delegate type with the given shape, registering it
    /// under a synthesized name if it does not exist yet.
    pub fn delegate(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        if let Some(&id) = self.delegates.get(&(params.clone(), ret)) {
            return id;
        }
        let name = self.describe_delegate(&params, ret);
        let id = self.push(TypeEntry {
            name,
            named: false,
            kind: TypeKind::Delegate {
                params: params.clone(),
                ret,
            },
        });
        self.delegates.insert((params, ret), id);
        id
    }

    /// Registers a named delegate declaration.
    ///
    /// A declaration whose shape already exists aliases the earlier type;
    /// the first declared name sticks.
    pub fn declare_delegate(&mut self, name: &str, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        let id = self.delegate(params, ret);
        if let Some(entry) = self.entries.get_mut(id.index()) {
            if !entry.named {
                entry.name = name.to_string();
                entry.named = true;
            }
        }
        id
    }

    fn describe_delegate(&self, params: &[TypeId], ret: TypeId) -> String {
        let args = params
            .iter()
            .map(|p| self.name(*p))
            .collect::<Vec<_>>()
            .join(", ");
        if ret == TypeId::VOID {
            format!("delegate({args})")
        } else {
            format!("delegate({args}): {}", self.name(ret))
        }
    }

    /// Returns the shape of a type. Unknown ids read as the null type.
    #[must_use]
    pub fn kind(&self, id: TypeId) -> &TypeKind {
        self.entries.get(id.index()).map_or(&FALLBACK_KIND, |e| &e.kind)
    }

    /// Returns the display name of a type.
    #[must_use]
    pub fn name(&self, id: TypeId) -> &str {
        self.entries.get(id.index()).map_or("", |e| e.name.as_str())
    }

    /// Whether the type is an enumeration.
    #[must_use]
    pub fn is_enum(&self, id: TypeId) -> bool {
        matches!(self.kind(id), TypeKind::Enum { .. })
    }

    /// Returns an enum's value names, or an empty slice for other types.
    #[must_use]
    pub fn enum_values(&self, id: TypeId) -> &[String] {
        match self.kind(id) {
            TypeKind::Enum { values } => values,
            _ => &[],
        }
    }

    /// Looks up an enum value by exact name.
    #[must_use]
    pub fn enum_ordinal(&self, id: TypeId, value: &str) -> Option<i64> {
        self.enum_values(id)
            .iter()
            .position(|v| v == value)
            .map(|i| i as i64)
    }

    /// Looks up an enum value by name, ignoring ASCII case. Player input
    /// is matched this way.
    #[must_use]
    pub fn enum_ordinal_ci(&self, id: TypeId, value: &str) -> Option<i64> {
        self.enum_values(id)
            .iter()
            .position(|v| v.eq_ignore_ascii_case(value))
            .map(|i| i as i64)
    }

    /// Returns a delegate's parameter and return shape.
    #[must_use]
    pub fn delegate_shape(&self, id: TypeId) -> Option<(&[TypeId], TypeId)> {
        match self.kind(id) {
            TypeKind::Delegate { params, ret } => Some((params, *ret)),
            _ => None,
        }
    }

    /// Whether a value of type `src` may be stored in a slot of type
    /// `dst`. Besides identity, the null literal stores into any real
    /// type as the zero value.
    #[must_use]
    pub fn assignable(&self, dst: TypeId, src: TypeId) -> bool {
        if dst == TypeId::VOID || src == TypeId::VOID {
            return false;
        }
        dst == src || src == TypeId::NULL
    }

    /// Whether two types may be compared for equality.
    #[must_use]
    pub fn comparable(&self, a: TypeId, b: TypeId) -> bool {
        if a == TypeId::VOID || b == TypeId::VOID {
            return false;
        }
        a == b || a == TypeId::NULL || b == TypeId::NULL
    }

    /// Number of registered types, counting builtins.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the store holds no types. Never true in practice.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for TypeStore {
    fn default() -> Self {
        Self::new()
    }
}
