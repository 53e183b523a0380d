//! k33audit core library.
//!
//! Hunts for graphs on which a planarity engine's K3,3 search misses a
//! subgraph homeomorphic to K3,3. Graphs the search declares clean are
//! embedded; a K3,3-type obstruction is a direct finding, and a K5-type
//! obstruction triggers an edge-deletion search that re-queries the engine on
//! every single-edge deletion.

pub mod adjacency;
mod analysis;
mod batch;
mod error;
pub mod format;
mod graph;
pub mod graph6;
mod layout;
mod obstruction;
pub mod oracle;
mod search;
#[cfg(test)]
mod test_utils;

pub use crate::{
    analysis::{AnalysisContext, GraphAnalysis, GraphAnalyzer},
    batch::{BatchConfig, BatchDriver, BatchReport, DEFAULT_MAX_MISSED, RecordOutcome, RecordReport},
    error::{
        AnalysisError, AuditError, AuditErrorCode, FormatError, OracleError, OracleErrorCode,
        PathError, Result,
    },
    graph::{Edge, Graph, GraphError},
    layout::{DEFAULT_OUTPUT_ROOT, OutputLayout},
    obstruction::{ObstructionKind, classify},
    search::{EdgeDeletionSearch, SearchOptions, Trial, TrialOutcome, Verdict},
};
