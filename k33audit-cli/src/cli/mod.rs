//! Command-line interface orchestration for `k33audit`.
//!
//! The single `analyze` command runs the edge-deletion audit over a graph6
//! collection with an external `planarity` executable as the oracle.

mod commands;

pub use commands::{
    AnalyzeCommand, Cli, CliError, Command, RecordStatus, RecordSummary, RunSummary,
    render_summary, run_cli,
};

#[cfg(test)]
mod test_helpers;
