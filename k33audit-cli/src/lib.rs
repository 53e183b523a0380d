//! Support library for the `k33audit` binary.
//!
//! Exposes the command pipeline and logging setup so tests can drive a batch
//! run without spawning the binary.

pub mod cli;
pub mod logging;
