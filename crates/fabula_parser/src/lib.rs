//! Natural language command matching for Fabula stories.
//!
//! This crate turns one line of player text into a compiled command
//! invocation, or into a message explaining why it could not.
//!
//! # Architecture
//!
//! ```text
//! "Take the RED ball!"
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ NORMALIZE       │  → "take red ball"
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ TRIGGER SCAN    │  → command "take {$x: Item}", capture "red ball"
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ WORD MAP        │  → noun "ball" + adjective "red" → one item
//! └─────────────────┘
//!          │
//!          ▼
//! ┌─────────────────┐
//! │ DISPATCH        │  → Run { command, args }  (or Fail / NoMatch)
//! └─────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`input`] - Input normalization and matching configuration
//! - [`wordmap`] - Per-turn noun/adjective index over the item store
//! - [`matcher`] - Trigger scan and typed argument conversion
//! - [`responses`] - Player-facing failure message templates

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod input;
pub mod matcher;
pub mod responses;
pub mod wordmap;

// Re-export main types for convenience
pub use input::{MatchConfig, normalize};
pub use matcher::{Dispatch, Matcher};
pub use responses::Responses;
pub use wordmap::{Resolution, WordMap};
