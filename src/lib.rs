//! Fabula - Embeddable interactive-fiction engine
//!
//! This crate re-exports all layers of the Fabula system for convenient access.
//! For detailed documentation, see the individual layer crates.
//!
//! # Architecture
//!
//! ```text
//! Layer 4: fabula_runtime    — Story loading, turn cycle, source export
//! Layer 3: fabula_parser     — Input matching, word map, responses
//! Layer 2: fabula_language   — Lexer, parser, compiler, interpreter
//! Layer 1: fabula_storage    — Items, properties, world state
//! Layer 0: fabula_foundation — Core types (Value, ids, Error)
//! ```
//!
//! # Example
//!
//! ```
//! use fabula::Story;
//!
//! let mut story = Story::load_str(
//!     "item lamp;\n\
//!      property on: Bool;\n\
//!      command \"turn on {$x: Item}\" {\n\
//!        $x.on = true;\n\
//!        print(\"The lamp glows.\");\n\
//!      }",
//! )
//! .unwrap();
//! let messages = story.command("turn on the lamp");
//! assert_eq!(messages, vec!["The lamp glows.".to_string()]);
//! ```

pub use fabula_foundation as foundation;
pub use fabula_language as language;
pub use fabula_parser as parser;
pub use fabula_runtime as runtime;
pub use fabula_storage as storage;

// Re-export main types for convenience
pub use fabula_runtime::{MatchConfig, Responses, Story};
