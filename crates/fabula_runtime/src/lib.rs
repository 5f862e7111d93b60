//! Story loading, turn cycle, and source export for Fabula.
//!
//! This crate provides:
//! - [`Story`] - One compiled world plus its matcher and turn cycle
//! - Loading from files, strings, or any [`fabula_language::SourceProvider`]
//! - Source-text export that reloads into the same observable state

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod story;

// Re-export main types for convenience
pub use fabula_parser::{MatchConfig, Responses};
pub use story::Story;
