//! Integration tests for Layer 2: Language
//!
//! Tests for the lexer, the parser/compiler, the interpreter, and the
//! source exporter.

mod compiling;
mod execution;
mod exporting;
mod lexing;
