//! Call frames and compile-time slot allocation.
//!
//! A frame is a fixed block of values sized at compile time. Slot 0
//! always holds the return value; parameters fill the slots after it.
//! [`FrameBuilder`] hands out slots while a body compiles and records
//! the high-water mark, so sibling scopes reuse slots and the frame is
//! exactly as large as its deepest nesting.

use fabula_foundation::{TypeId, Value};

/// Slot 0 of every frame holds the function's return value.
pub const RETURN_SLOT: usize = 0;

/// The locals of one running function.
#[derive(Clone, Debug)]
pub struct Frame {
    slots: Box<[Value]>,
}

impl Frame {
    /// Creates a zeroed frame. A frame always has at least the return
    /// slot.
    #[must_use]
    pub fn new(size: usize) -> Self {
        Self {
            slots: vec![Value::NULL; size.max(1)].into_boxed_slice(),
        }
    }

    /// Reads a slot; out-of-range slots read as null.
    #[must_use]
    pub fn get(&self, slot: usize) -> Value {
        self.slots.get(slot).copied().unwrap_or(Value::NULL)
    }

    /// Writes a slot; out-of-range writes are dropped.
    pub fn set(&mut self, slot: usize, value: Value) {
        if let Some(cell) = self.slots.get_mut(slot) {
            *cell = value;
        }
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false; a frame keeps at least the return slot.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// A compile-time binding of a `$name` to a slot.
#[derive(Clone, Debug)]
pub struct Binding {
    pub name: String,
    pub slot: usize,
    pub ty: TypeId,
}

/// Restore point for closing a lexical scope.
#[derive(Clone, Copy, Debug)]
pub struct FrameMark {
    bindings: usize,
    next_slot: usize,
}

/// Allocates frame slots while one body compiles.
#[derive(Clone, Debug)]
pub struct FrameBuilder {
    bindings: Vec<Binding>,
    next_slot: usize,
    high_water: usize,
}

impl FrameBuilder {
    /// A fresh builder; slot 0 is reserved for the return value.
    #[must_use]
    pub fn new() -> Self {
        Self {
            bindings: Vec::new(),
            next_slot: RETURN_SLOT + 1,
            high_water: RETURN_SLOT + 1,
        }
    }

    /// Declares a name in the current scope. Returns the slot, or
    /// `None` when the name is already visible.
    pub fn declare(&mut self, name: &str, ty: TypeId) -> Option<usize> {
        if self.bindings.iter().any(|b| b.name == name) {
            return None;
        }
        let slot = self.bump();
        self.bindings.push(Binding {
            name: name.to_string(),
            slot,
            ty,
        });
        Some(slot)
    }

    /// Innermost visible binding for a name.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<(usize, TypeId)> {
        self.bindings
            .iter()
            .rev()
            .find(|b| b.name == name)
            .map(|b| (b.slot, b.ty))
    }

    /// Reserves an anonymous slot; loops use one for the filter operand.
    pub fn alloc_temp(&mut self) -> usize {
        self.bump()
    }

    fn bump(&mut self) -> usize {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.high_water = self.high_water.max(self.next_slot);
        slot
    }

    /// Snapshot taken on entering a scope.
    #[must_use]
    pub fn mark(&self) -> FrameMark {
        FrameMark {
            bindings: self.bindings.len(),
            next_slot: self.next_slot,
        }
    }

    /// Closes a scope: its names go out of sight and its slots become
    /// reusable by sibling scopes.
    pub fn release(&mut self, mark: FrameMark) {
        self.bindings.truncate(mark.bindings);
        self.next_slot = mark.next_slot;
    }

    /// Smallest frame that fits every slot that was ever live.
    #[must_use]
    pub fn frame_size(&self) -> usize {
        self.high_water
    }
}

impl Default for FrameBuilder {
    fn default() -> Self {
        Self::new()
    }
}
