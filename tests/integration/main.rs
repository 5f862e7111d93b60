//! Cross-layer integration tests for Fabula
//!
//! Tests that drive a whole story through load, dispatch, the turn
//! cycle, and export.

mod round_trip;
mod scenario;
mod turn_cycle;
