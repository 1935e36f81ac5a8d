//! Shared test utilities for pipeling-config integration tests.
//!
//! This module provides:
//! - `ConfigHarness` for isolated configuration directories
//! - YAML builders for every block kind

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::ConfigHarness;
