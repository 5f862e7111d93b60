//! Compiled story definitions.
//!
//! The output of a successful compile: function bodies, command
//! triggers, lookup maps, global metadata, and the declaration lists
//! the serializer replays. Live values (globals, properties, the turn
//! counter) stay in the world; everything here is immutable once the
//! load finishes.

use fabula_foundation::{CommandId, FuncId, GlobalId, MapId, TypeId, Value};

use crate::command::CompiledTrigger;
use crate::stmt::Statement;

/// A declared parameter of a function, command, or delegate.
#[derive(Clone, Debug)]
pub struct Param {
    pub name: String,
    pub ty: TypeId,
}

/// A compiled function.
#[derive(Clone, Debug)]
pub struct Function {
    pub name: String,
    pub params: Vec<Param>,
    pub ret: TypeId,
    /// Slot count for the frame, return slot included.
    pub frame_size: usize,
    pub code: Vec<Statement>,
    pub docs: Vec<String>,
    /// Declared with `=> expr;` instead of a braced body.
    pub shorthand: bool,
}

/// A mutable story global. The live value sits in the world's global
/// column at the same index.
#[derive(Clone, Debug)]
pub struct GlobalDef {
    pub name: String,
    pub ty: TypeId,
    pub docs: Vec<String>,
}

/// An exhaustive `map` over an enum's ordinals.
#[derive(Clone, Debug)]
pub struct MapDef {
    pub name: String,
    pub input: TypeId,
    pub output: TypeId,
    /// One entry per ordinal of the input enum.
    pub table: Vec<Value>,
    pub docs: Vec<String>,
}

impl MapDef {
    /// Total lookup; out-of-range ordinals read as null.
    #[must_use]
    pub fn lookup(&self, key: Value) -> Value {
        self.table.get(key.index()).copied().unwrap_or(Value::NULL)
    }
}

/// A compiled command. The body is an ordinary function whose
/// parameters line up with the trigger's placeholders.
#[derive(Clone, Debug)]
pub struct Command {
    pub trigger: CompiledTrigger,
    pub body: FuncId,
    /// Declared at the top level, so always eligible for dispatch.
    /// Nested commands are eligible only after executing this turn.
    pub top_level: bool,
    pub docs: Vec<String>,
}

/// A named delegate declaration. The structural type lives in the type
/// store; the declaration keeps the author's parameter names.
#[derive(Clone, Debug)]
pub struct DelegateDecl {
    pub name: String,
    pub ty: TypeId,
    pub params: Vec<String>,
    pub docs: Vec<String>,
}

/// A declared enum, remembered in declaration order for the serializer.
#[derive(Clone, Debug)]
pub struct EnumDecl {
    pub ty: TypeId,
    pub docs: Vec<String>,
}

/// Everything the compiler produced from one include graph.
#[derive(Clone, Debug)]
pub struct Definitions {
    /// Index 0 is the null function: empty body, void return. Calling
    /// the null delegate runs it, which is the no-op.
    pub functions: Vec<Function>,
    pub commands: Vec<Command>,
    pub maps: Vec<MapDef>,
    pub globals: Vec<GlobalDef>,
    /// Declared enum types, in declaration order.
    pub enums: Vec<EnumDecl>,
    pub delegates: Vec<DelegateDecl>,
    /// Bodies of `game { ... }` blocks, run once at load.
    pub game_blocks: Vec<FuncId>,
    /// Bodies of `turn { ... }` blocks, run at every turn start.
    pub turn_blocks: Vec<FuncId>,
}

impl Definitions {
    /// An empty program with the null function pre-seeded.
    #[must_use]
    pub fn new() -> Self {
        Self {
            functions: vec![Function {
                name: "null".to_string(),
                params: Vec::new(),
                ret: TypeId::VOID,
                frame_size: 1,
                code: Vec::new(),
                docs: Vec::new(),
                shorthand: false,
            }],
            commands: Vec::new(),
            maps: Vec::new(),
            globals: Vec::new(),
            enums: Vec::new(),
            delegates: Vec::new(),
            game_blocks: Vec::new(),
            turn_blocks: Vec::new(),
        }
    }

    #[must_use]
    pub fn function(&self, id: FuncId) -> Option<&Function> {
        self.functions.get(id.index())
    }

    #[must_use]
    pub fn command(&self, id: CommandId) -> Option<&Command> {
        self.commands.get(id.index())
    }

    #[must_use]
    pub fn map(&self, id: MapId) -> Option<&MapDef> {
        self.maps.get(id.index())
    }

    #[must_use]
    pub fn global(&self, id: GlobalId) -> Option<&GlobalDef> {
        self.globals.get(id.index())
    }
}

impl Default for Definitions {
    fn default() -> Self {
        Self::new()
    }
}
