//! The shared mutable story state.
//!
//! Everything a running story can change lives here, passed by explicit
//! borrow into the compiler and interpreter. There are no ambient
//! globals; two worlds in one process never touch.

use rand::Rng;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use fabula_foundation::{CommandId, Interner, ItemId, PropId, StrId, TypeStore, Value};

use crate::drawing::Drawings;
use crate::item::ItemStore;
use crate::property::PropertyStore;

/// Mutable state of one loaded story.
#[derive(Clone, Debug)]
pub struct World {
    /// Registered types.
    pub types: TypeStore,
    /// Every string the story has touched.
    pub interner: Interner,
    /// Declared items.
    pub items: ItemStore,
    /// Property columns.
    pub props: PropertyStore,
    /// Current values of mutable globals, indexed by global id.
    pub globals: Vec<Value>,
    /// Ordered story output the host has not drained yet.
    pub output: Vec<String>,
    /// Drawing primitives accumulated for the host.
    pub drawings: Drawings,
    /// Current turn number. A freshly loaded story is on turn 1.
    pub turn: u64,
    /// Commands registered for the current turn, in registration order.
    /// Cleared when the turn advances.
    pub registered_commands: Vec<CommandId>,
    rng: ChaCha8Rng,
}

impl World {
    /// Creates an empty world. The seed fixes the random intrinsic's
    /// sequence, so equal seeds give replayable stories.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            types: TypeStore::new(),
            interner: Interner::new(),
            items: ItemStore::new(),
            props: PropertyStore::new(),
            globals: Vec::new(),
            output: Vec::new(),
            drawings: Drawings::new(),
            turn: 0,
            registered_commands: Vec::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Appends a line of story output.
    pub fn say(&mut self, text: impl Into<String>) {
        self.output.push(text.into());
    }

    /// Takes the output accumulated since the last drain.
    pub fn drain_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.output)
    }

    /// Draws an integer in `[0, bound)`. Bounds at or below zero yield
    /// zero, keeping the operation total.
    pub fn roll(&mut self, bound: i64) -> i64 {
        if bound <= 0 {
            return 0;
        }
        self.rng.gen_range(0..bound)
    }

    /// Returns the name an item shows to the player: the `name` property
    /// when set, otherwise the declared name.
    #[must_use]
    pub fn display_name(&self, id: ItemId) -> &str {
        let value = self.props.get(id, PropId::NAME);
        if value == Value::NULL {
            self.items.name(id)
        } else {
            self.interner.resolve(StrId::from_value(value))
        }
    }
}
