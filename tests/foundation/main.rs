//! Integration tests for Layer 0: Foundation
//!
//! Tests for core types: the uniform value word, typed ids, the type
//! store, the interner, and positioned errors.

mod ids;
