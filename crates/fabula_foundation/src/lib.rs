//! Core values, types, interning, and errors for Fabula.
//!
//! This crate provides:
//! - [`Value`] - The uniform one-word runtime value
//! - [`TypeStore`] - Registry of builtin, enum, and delegate types
//! - [`Interner`] - Deduplicating string store backing string values
//! - Dense id handles ([`ItemId`], [`PropId`], [`FuncId`], ...)
//! - [`Position`] - 1-based source locations
//! - [`Error`] - Positioned compile errors and I/O failures

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod id;
pub mod intern;
pub mod position;
pub mod types;
pub mod value;

pub use error::{Error, ErrorKind, Result};
pub use id::{CommandId, FuncId, GlobalId, ItemId, MapId, PropId};
pub use intern::{Interner, StrId};
pub use position::Position;
pub use types::{TypeId, TypeKind, TypeStore};
pub use value::Value;
