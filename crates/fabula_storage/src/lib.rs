//! Item storage, property columns, drawings, and world state for Fabula.
//!
//! This crate provides:
//! - [`ItemStore`] - Append-only item registry with a permanent null item
//! - [`PropertyStore`] - Lazily grown per-property value columns
//! - [`Drawings`] - Shape lists accumulated for host canvases
//! - [`World`] - The one mutable state object a running story touches

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod drawing;
pub mod item;
pub mod property;
pub mod world;

pub use drawing::{Drawings, Shape};
pub use item::{ItemDef, ItemStore};
pub use property::{PropertyDef, PropertyStore};
pub use world::World;
