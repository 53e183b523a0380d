//! Whole-graph pipeline: K3,3 search, embedding, classification and, when
//! only a K5 turns up, the edge-deletion search.

use std::path::{Path, PathBuf};

use tracing::{Span, error, field, info, info_span, instrument};

use crate::{
    adjacency,
    error::Result,
    obstruction::ObstructionKind,
    oracle::{EmbedOutcome, K33SearchOutcome, Oracle},
    search::{EdgeDeletionSearch, SearchOptions, Verdict, classify_file},
};

/// Per-graph logging and location handle.
///
/// One context is built for each analysed graph and handed to every step of
/// its pipeline. Spans opened by those steps hang off [`AnalysisContext::span`],
/// so log lines from concurrent analyses never mix.
#[derive(Clone, Debug)]
pub struct AnalysisContext {
    record: Option<usize>,
    working_dir: PathBuf,
    span: Span,
}

impl AnalysisContext {
    /// Creates a context for a stand-alone graph kept in `working_dir`.
    #[must_use]
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self::build(None, working_dir.into())
    }

    /// Creates a context for record `record` (one-based) of a collection.
    #[must_use]
    pub fn for_record(record: usize, working_dir: impl Into<PathBuf>) -> Self {
        Self::build(Some(record), working_dir.into())
    }

    fn build(record: Option<usize>, working_dir: PathBuf) -> Self {
        let span = info_span!(
            "analysis",
            record = record,
            dir = %working_dir.display(),
        );
        Self {
            record,
            working_dir,
            span,
        }
    }

    /// Record number, when the graph came from a collection.
    #[must_use]
    pub fn record(&self) -> Option<usize> {
        self.record
    }

    /// Directory holding the graph and its artefacts.
    #[must_use]
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    /// Span every step of this analysis is attached to.
    #[must_use]
    pub fn span(&self) -> &Span {
        &self.span
    }
}

/// What the pipeline concluded about one graph.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GraphAnalysis {
    /// The K3,3 search itself reported a K3,3.
    K33Reported,
    /// The K3,3 search found nothing and the graph is planar.
    Planar,
    /// The K3,3 search found nothing yet the embedder isolated a K3,3.
    MissedK33 {
        /// Obstruction written by the embedder.
        obstruction: PathBuf,
    },
    /// The embedder isolated a K5; the edge-deletion search ran.
    EdgeDeletion(Verdict),
}

impl GraphAnalysis {
    /// Returns `true` when the K3,3 search is shown, or likely, to have
    /// missed a K3,3.
    #[must_use]
    pub fn missed_k33(&self) -> bool {
        match self {
            Self::MissedK33 { .. } => true,
            Self::EdgeDeletion(verdict) => verdict.missed_k33(),
            Self::K33Reported | Self::Planar => false,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::K33Reported => "k33_reported",
            Self::Planar => "planar",
            Self::MissedK33 { .. } => "missed_k33",
            Self::EdgeDeletion(_) => "edge_deletion",
        }
    }
}

/// Runs the analysis pipeline against an [`Oracle`].
///
/// # Examples
/// ```
/// use k33audit_core::{GraphAnalyzer, SearchOptions};
/// use k33audit_core::oracle::InMemoryOracle;
///
/// let analyzer = GraphAnalyzer::new(InMemoryOracle::new())
///     .with_search_options(SearchOptions::new().with_sort_adjacency(false));
/// assert!(!analyzer.search_options().sort_adjacency());
/// ```
#[derive(Debug)]
pub struct GraphAnalyzer<O> {
    oracle: O,
    options: SearchOptions,
}

impl<O: Oracle> GraphAnalyzer<O> {
    /// Creates an analyzer with default [`SearchOptions`].
    #[must_use]
    pub fn new(oracle: O) -> Self {
        Self {
            oracle,
            options: SearchOptions::default(),
        }
    }

    /// Replaces the options handed to the edge-deletion search.
    #[must_use]
    pub fn with_search_options(mut self, options: SearchOptions) -> Self {
        self.options = options;
        self
    }

    /// Returns the oracle queries are issued to.
    #[must_use]
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Returns the options handed to the edge-deletion search.
    #[must_use]
    pub fn search_options(&self) -> SearchOptions {
        self.options
    }

    /// Transforms `graph_file` to an adjacency list and analyses the result.
    ///
    /// # Errors
    /// Propagates any transform failure and any error documented on
    /// [`GraphAnalyzer::analyze`].
    pub fn analyze_file(&self, context: &AnalysisContext, graph_file: &Path) -> Result<GraphAnalysis> {
        let adjacency_list = self.oracle.transform_to_adjacency_list(graph_file)?;
        self.analyze(context, &adjacency_list)
    }

    /// Analyses the adjacency list stored at `adjacency_list`.
    ///
    /// # Errors
    /// Returns [`crate::AuditError::Oracle`] when a query fails,
    /// [`crate::AuditError::Analysis`] when an obstruction is neither K5 nor
    /// K3,3 shaped or the list is one-based, and any error raised by the
    /// edge-deletion search.
    #[instrument(
        name = "analysis.graph",
        err,
        parent = context.span(),
        skip_all,
        fields(graph = %adjacency_list.display(), outcome = field::Empty),
    )]
    pub fn analyze(&self, context: &AnalysisContext, adjacency_list: &Path) -> Result<GraphAnalysis> {
        let analysis = self.pipeline(context, adjacency_list)?;
        Span::current().record("outcome", analysis.label());
        Ok(analysis)
    }

    fn pipeline(&self, context: &AnalysisContext, adjacency_list: &Path) -> Result<GraphAnalysis> {
        if self.oracle.search_for_k33(adjacency_list)? == K33SearchOutcome::ContainsK33 {
            return Ok(GraphAnalysis::K33Reported);
        }
        let EmbedOutcome::Nonplanar { obstruction } = self.oracle.planar_embed(adjacency_list)?
        else {
            return Ok(GraphAnalysis::Planar);
        };

        match classify_file(&obstruction)? {
            ObstructionKind::K33 => {
                error!(
                    graph = %adjacency_list.display(),
                    obstruction = %obstruction.display(),
                    "planarity found a K_{{3,3}} that was not found by K_{{3,3}} search"
                );
                Ok(GraphAnalysis::MissedK33 { obstruction })
            }
            ObstructionKind::K5 => {
                info!(
                    graph = %adjacency_list.display(),
                    "graph contains a subgraph homeomorphic to K_5; proceeding with edge-deletion analysis"
                );
                let graph = adjacency::read_graph(adjacency_list)?;
                let verdict = EdgeDeletionSearch::new(&self.oracle, self.options).run(
                    context,
                    &graph,
                    adjacency_list,
                )?;
                if verdict.missed_k33() {
                    let evidence = verdict
                        .evidence()
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ");
                    error!(
                        graph = %adjacency_list.display(),
                        %evidence,
                        "edge-deletion analysis found a K_{{3,3}} that was not found by K_{{3,3}} search"
                    );
                } else {
                    info!(
                        graph = %adjacency_list.display(),
                        "graph likely doesn't contain a K_{{3,3}}"
                    );
                }
                Ok(GraphAnalysis::EdgeDeletion(verdict))
            }
        }
    }
}
