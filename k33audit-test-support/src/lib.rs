//! Shared test utilities used across k33audit crates.

pub mod fixtures;
pub mod planarity;
pub mod tracing;
