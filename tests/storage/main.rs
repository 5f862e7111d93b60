//! Integration tests for Layer 1: Storage
//!
//! Tests for the item store, the sparse property columns, and shared
//! world state.

mod items;
