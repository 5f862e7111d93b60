//! Integration tests for the fabula_parser crate.
//!
//! Tests for the natural-language command pipeline:
//! - Input normalization
//! - Noun and adjective resolution
//! - Trigger scanning and typed dispatch

mod dispatch_tests;
