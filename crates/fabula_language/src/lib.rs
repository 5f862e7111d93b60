//! The story language: lexer, compiler, interpreter, and serializer.
//!
//! Source text flows through one pipeline:
//!
//! ```text
//! "while ($i < 3) { print(`{$i}`); }"
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ SOURCE          │  → lines, literate markdown unwrapped,
//! │ PROVIDER        │    includes resolved by name
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ LEXER           │  → Name("while"), Sym("("), Var("i"), ...
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ PARSER /        │  → typed expression trees inside a flat
//! │ COMPILER        │    statement array per function
//! └─────────────────┘
//!          │
//!          ├──────────────────────────┐
//!          ▼                          ▼
//! ┌─────────────────┐       ┌─────────────────┐
//! │ INTERPRETER     │       │ SERIALIZER      │
//! │ (frames, world) │       │ (source again)  │
//! └─────────────────┘       └─────────────────┘
//! ```
//!
//! Compilation is a single pass: declarations claim names as they
//! appear, bodies compile straight to statements, and constants fold
//! where both sides are known. Execution is total; every failure mode
//! a story can reach has a defined value.
//!
//! # Modules
//!
//! - [`source`] - Source providers and the literate markdown transform
//! - [`token`] - Token and symbol definitions
//! - [`lexer`] - Line-buffered regex scanner
//! - [`expr`] - Typed expression trees and constant evaluation
//! - [`stmt`] - Flat statement arrays and successor resolution
//! - [`frame`] - Call frames and lexical slot allocation
//! - [`intrinsics`] - Built-in callables
//! - [`defs`] - The compiled program
//! - [`command`] - Trigger compilation for player commands
//! - [`parser`] - The recursive-descent compiler
//! - [`exec`] - The statement interpreter
//! - [`regen`] - Source regeneration from a compiled program

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod command;
pub mod defs;
pub mod exec;
pub mod expr;
pub mod frame;
pub mod intrinsics;
pub mod lexer;
pub mod parser;
pub mod regen;
pub mod source;
pub mod stmt;
pub mod token;

// Re-export main types for convenience
pub use command::CompiledTrigger;
pub use defs::{Command, Definitions, Function, Param};
pub use exec::{advance_turn, display_value, run_function, Cx};
pub use parser::parse;
pub use regen::export_source;
pub use source::{FileProvider, MemoryProvider, SourceProvider};
