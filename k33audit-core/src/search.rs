//! Edge-deletion search for K3,3 homeomorphs missed by the K3,3 search.
//!
//! The search starts from a graph the K3,3 search declared clean but whose
//! embedding failed with a K5-type obstruction. Every edge is deleted in turn
//! from a fresh copy of the graph and the copy is re-embedded. A trial whose
//! obstruction is K3,3-type, or whose K5-type obstruction is followed by a
//! positive K3,3 search, is evidence that the original graph contains a K3,3
//! after all. A negative verdict is a heuristic, not a proof.

use std::path::{Path, PathBuf};

use tracing::{Span, field, info, instrument, warn};

use crate::{
    adjacency,
    analysis::AnalysisContext,
    error::{AuditError, Result},
    graph::{Edge, Graph},
    obstruction::{ObstructionKind, classify},
    oracle::{EmbedOutcome, K33SearchOutcome, Oracle},
};

/// Suffix shared by the transform output and every trial graph.
pub(crate) const ADJACENCY_LIST_SUFFIX: &str = ".AdjList.out.txt";

/// Tuning for [`EdgeDeletionSearch`].
///
/// # Examples
/// ```
/// use k33audit_core::SearchOptions;
///
/// let options = SearchOptions::new().with_sort_adjacency(false);
/// assert!(!options.sort_adjacency());
/// assert!(SearchOptions::default().sort_adjacency());
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SearchOptions {
    sort_adjacency: bool,
}

impl SearchOptions {
    /// Creates options with sorted adjacency sequences.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sort_adjacency: true,
        }
    }

    /// Chooses whether neighbour sequences are sorted before scanning.
    ///
    /// Sorting makes the trial order independent of the order in which the
    /// engine happened to list neighbours.
    #[must_use]
    pub const fn with_sort_adjacency(mut self, sort: bool) -> Self {
        self.sort_adjacency = sort;
        self
    }

    /// Returns whether neighbour sequences are sorted before scanning.
    #[must_use]
    pub const fn sort_adjacency(&self) -> bool {
        self.sort_adjacency
    }
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of deleting a single edge.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum TrialOutcome {
    /// The edge-deleted graph is planar.
    Planar,
    /// The embedder isolated a K3,3-type obstruction.
    K33Obstruction {
        /// Obstruction written by the embedder.
        obstruction: PathBuf,
    },
    /// The obstruction was K5-type but the K3,3 search now finds a K3,3.
    K5ConfirmedK33 {
        /// Obstruction written by the embedder.
        obstruction: PathBuf,
    },
    /// The obstruction was K5-type and the K3,3 search still finds none.
    K5Inconclusive {
        /// Obstruction written by the embedder.
        obstruction: PathBuf,
    },
}

impl TrialOutcome {
    /// Returns `true` when the trial is definitive evidence of a missed K3,3.
    #[must_use]
    pub const fn is_evidence(&self) -> bool {
        matches!(
            self,
            Self::K33Obstruction { .. } | Self::K5ConfirmedK33 { .. }
        )
    }
}

/// One completed trial.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Trial {
    /// Edge removed from the original graph.
    pub edge: Edge,
    /// Adjacency list of the edge-deleted graph.
    pub graph_file: PathBuf,
    /// What the oracle made of it.
    pub outcome: TrialOutcome,
}

/// Conclusion of an edge-deletion search, with every trial that led to it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Verdict {
    trials: Vec<Trial>,
}

impl Verdict {
    /// Returns `true` when at least one trial produced definitive evidence.
    #[must_use]
    pub fn missed_k33(&self) -> bool {
        self.trials.iter().any(|trial| trial.outcome.is_evidence())
    }

    /// Edges whose removal produced definitive evidence, in scan order.
    #[must_use]
    pub fn evidence(&self) -> Vec<Edge> {
        self.trials
            .iter()
            .filter(|trial| trial.outcome.is_evidence())
            .map(|trial| trial.edge)
            .collect()
    }

    /// Every trial, in scan order.
    #[must_use]
    pub fn trials(&self) -> &[Trial] {
        &self.trials
    }
}

/// Where a single trial currently stands.
enum TrialPhase {
    Embedding,
    Classifying { obstruction: PathBuf },
    ConfirmingK33 { obstruction: PathBuf },
    Settled(TrialOutcome),
}

/// Drives single-edge deletion trials through an [`Oracle`].
#[derive(Debug)]
pub struct EdgeDeletionSearch<'a, O: ?Sized> {
    oracle: &'a O,
    options: SearchOptions,
}

impl<'a, O: Oracle + ?Sized> EdgeDeletionSearch<'a, O> {
    /// Creates a search issuing its queries to `oracle`.
    #[must_use]
    pub fn new(oracle: &'a O, options: SearchOptions) -> Self {
        Self { oracle, options }
    }

    /// Scans every edge of `graph`, which was read from `adjacency_list`.
    ///
    /// Trial graphs are written next to `adjacency_list` as
    /// `<record stem>.rem<u>-<v>.AdjList.out.txt`. `graph` itself is never
    /// modified; each trial works on its own copy. The scan is exhaustive and
    /// issues at most one embedding per edge.
    ///
    /// # Errors
    /// Stops at the first failing trial and returns its error wrapped in
    /// [`AuditError::Trial`]; no verdict is produced in that case.
    #[instrument(
        name = "search.edge_deletion",
        err,
        parent = context.span(),
        skip_all,
        fields(
            graph = %adjacency_list.display(),
            edges = graph.edge_count(),
            sorted = self.options.sort_adjacency(),
            trials = field::Empty,
            missed_k33 = field::Empty,
        ),
    )]
    pub fn run(
        &self,
        context: &AnalysisContext,
        graph: &Graph,
        adjacency_list: &Path,
    ) -> Result<Verdict> {
        let mut base = graph.clone();
        if self.options.sort_adjacency() {
            base.sort_adjacency();
        }
        let stem = record_stem(adjacency_list);
        let dir = adjacency_list.parent().unwrap_or_else(|| Path::new(""));

        let mut trials = Vec::with_capacity(base.edge_count());
        for edge in base.edges() {
            let graph_file = dir.join(format!(
                "{stem}.rem{}-{}{ADJACENCY_LIST_SUFFIX}",
                edge.u(),
                edge.v()
            ));
            let outcome = self
                .trial(&base, edge, adjacency_list, &graph_file)
                .map_err(|source| AuditError::Trial {
                    edge,
                    source: Box::new(source),
                })?;
            trials.push(Trial {
                edge,
                graph_file,
                outcome,
            });
        }

        let verdict = Verdict { trials };
        let span = Span::current();
        span.record("trials", verdict.trials().len());
        span.record("missed_k33", verdict.missed_k33());
        Ok(verdict)
    }

    fn trial(
        &self,
        base: &Graph,
        edge: Edge,
        origin: &Path,
        graph_file: &Path,
    ) -> Result<TrialOutcome> {
        let mut reduced = base.clone();
        reduced
            .delete_edge(edge.u(), edge.v())
            .map_err(|source| AuditError::Mutation {
                path: origin.to_path_buf(),
                source,
            })?;
        adjacency::write_graph(graph_file, &reduced)?;

        let mut phase = TrialPhase::Embedding;
        loop {
            phase = match phase {
                TrialPhase::Embedding => match self.oracle.planar_embed(graph_file)? {
                    EmbedOutcome::Planar => TrialPhase::Settled(TrialOutcome::Planar),
                    EmbedOutcome::Nonplanar { obstruction } => {
                        TrialPhase::Classifying { obstruction }
                    }
                },
                TrialPhase::Classifying { obstruction } => {
                    match classify_file(&obstruction)? {
                        ObstructionKind::K33 => {
                            info!(
                                %edge,
                                graph = %graph_file.display(),
                                obstruction = %obstruction.display(),
                                "edge-deleted graph contains a K_{{3,3}} missed by K_{{3,3}} search"
                            );
                            TrialPhase::Settled(TrialOutcome::K33Obstruction { obstruction })
                        }
                        ObstructionKind::K5 => TrialPhase::ConfirmingK33 { obstruction },
                    }
                }
                TrialPhase::ConfirmingK33 { obstruction } => {
                    match self.oracle.search_for_k33(graph_file)? {
                        K33SearchOutcome::ContainsK33 => {
                            info!(
                                %edge,
                                graph = %graph_file.display(),
                                obstruction = %obstruction.display(),
                                "K_{{3,3}} search finds a K_{{3,3}} once the edge is removed"
                            );
                            TrialPhase::Settled(TrialOutcome::K5ConfirmedK33 { obstruction })
                        }
                        K33SearchOutcome::NoK33 => {
                            warn!(
                                %edge,
                                graph = %graph_file.display(),
                                "edge-deleted graph still only shows a K_5 obstruction"
                            );
                            TrialPhase::Settled(TrialOutcome::K5Inconclusive { obstruction })
                        }
                    }
                }
                TrialPhase::Settled(outcome) => return Ok(outcome),
            };
        }
    }
}

/// Reads an obstruction file and classifies it.
pub(crate) fn classify_file(obstruction: &Path) -> Result<ObstructionKind> {
    let graph = adjacency::read_graph(obstruction)?;
    classify(&graph).map_err(|source| AuditError::Analysis {
        path: obstruction.to_path_buf(),
        source,
    })
}

/// Strips `.AdjList.out.txt` from the file name, falling back to the plain
/// file stem for other names.
fn record_stem(adjacency_list: &Path) -> String {
    let name = adjacency_list
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    match name.strip_suffix(ADJACENCY_LIST_SUFFIX) {
        Some(stem) => stem.to_owned(),
        None => adjacency_list
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default(),
    }
}
