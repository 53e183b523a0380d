//! Query contract for the external planarity engine.
//!
//! The analysis only ever asks three questions of the engine, all through the
//! [`Oracle`] trait. Implementations map the engine's three-way result
//! (OK / NONEMBEDDABLE / error) onto typed outcomes with [`interpret`], which
//! also cross-checks the engine's diagnostic text against its exit code.

mod memory;
mod process;

use std::{
    fmt,
    path::{Path, PathBuf},
};

use crate::error::{OracleError, Result};

pub use memory::{EmbedReply, InMemoryOracle, K33Reply, OracleCall};
pub use process::PlanarityProcess;

/// The queries issued to the engine.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum OracleQuery {
    /// `planarity -t -ta`: convert a graph file to an adjacency list.
    Transform,
    /// `planarity -s -3`: search for a subgraph homeomorphic to K3,3.
    K33Search,
    /// `planarity -s -p`: embed, or isolate a Kuratowski obstruction.
    PlanarEmbed,
}

impl OracleQuery {
    /// Diagnostic markers for the OK and NONEMBEDDABLE outcomes.
    const fn markers(self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::Transform => None,
            Self::K33Search => Some((
                "has no subgraph homeomorphic to",
                "has a subgraph homeomorphic to",
            )),
            Self::PlanarEmbed => Some(("is planar", "is not planar")),
        }
    }
}

impl fmt::Display for OracleQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Transform => "adjacency-list transform",
            Self::K33Search => "K_{3,3} search",
            Self::PlanarEmbed => "planar embedding",
        })
    }
}

/// Outcome of [`Oracle::search_for_k33`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum K33SearchOutcome {
    /// The engine found a subgraph homeomorphic to K3,3.
    ContainsK33,
    /// The engine reports no subgraph homeomorphic to K3,3.
    NoK33,
}

/// Outcome of [`Oracle::planar_embed`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EmbedOutcome {
    /// The graph is planar.
    Planar,
    /// The graph is not planar; the isolated obstruction was written to
    /// `obstruction` in adjacency-list form.
    Nonplanar {
        /// Adjacency-list file holding the obstruction.
        obstruction: PathBuf,
    },
}

/// Typed queries against the planarity engine.
///
/// Every method takes a fully resolved path to the graph file and writes its
/// artefacts next to it, named as described by [`Artifacts`]. Calls are
/// blocking and idempotent.
pub trait Oracle {
    /// Converts `graph_file` to a zero-based adjacency list and returns the
    /// path of the result.
    ///
    /// # Errors
    /// Returns [`crate::AuditError::Oracle`] for any non-success outcome.
    fn transform_to_adjacency_list(&self, graph_file: &Path) -> Result<PathBuf>;

    /// Runs the K3,3 homeomorph search on `graph_file`.
    ///
    /// # Errors
    /// Returns [`OracleError::Disagreement`] when the exit code and the
    /// diagnostic text disagree and [`OracleError::Failure`] for any other
    /// unexpected outcome.
    fn search_for_k33(&self, graph_file: &Path) -> Result<K33SearchOutcome>;

    /// Embeds `graph_file` or isolates a Kuratowski obstruction.
    ///
    /// # Errors
    /// As for [`Oracle::search_for_k33`].
    fn planar_embed(&self, graph_file: &Path) -> Result<EmbedOutcome>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn transform_to_adjacency_list(&self, graph_file: &Path) -> Result<PathBuf> {
        (**self).transform_to_adjacency_list(graph_file)
    }

    fn search_for_k33(&self, graph_file: &Path) -> Result<K33SearchOutcome> {
        (**self).search_for_k33(graph_file)
    }

    fn planar_embed(&self, graph_file: &Path) -> Result<EmbedOutcome> {
        (**self).planar_embed(graph_file)
    }
}

/// Names of the files the engine writes for a given input.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use k33audit_core::oracle::Artifacts;
///
/// let artifacts = Artifacts::for_input(Path::new("/runs/n5.g6.1/n5.g6.1.AdjList.out.txt"));
/// assert_eq!(
///     artifacts.obstruction(),
///     Path::new("/runs/n5.g6.1/n5.g6.1.AdjList.out.s.p.obstruction.txt"),
/// );
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Artifacts {
    dir: PathBuf,
    stem: String,
}

impl Artifacts {
    /// Derives artefact names from the input file's directory and stem.
    #[must_use]
    pub fn for_input(graph_file: &Path) -> Self {
        let dir = graph_file
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
        let stem = graph_file
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { dir, stem }
    }

    /// Directory holding the input and every artefact.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `<stem>.AdjList.out.txt`, written by the transform.
    #[must_use]
    pub fn adjacency_list(&self) -> PathBuf {
        self.named("AdjList.out.txt")
    }

    /// `<stem>.s.3.out.txt`, written by the K3,3 search.
    #[must_use]
    pub fn k33_report(&self) -> PathBuf {
        self.named("s.3.out.txt")
    }

    /// `<stem>.s.p.out.txt`, the embedding written for planar graphs.
    #[must_use]
    pub fn embedding(&self) -> PathBuf {
        self.named("s.p.out.txt")
    }

    /// `<stem>.s.p.obstruction.txt`, the obstruction for non-planar graphs.
    #[must_use]
    pub fn obstruction(&self) -> PathBuf {
        self.named("s.p.obstruction.txt")
    }

    fn named(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}.{suffix}", self.stem))
    }
}

/// Raw result of one engine invocation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct EngineOutput {
    /// Exit code, `None` when the process was terminated by a signal.
    pub status: Option<i32>,
    /// Captured standard output.
    pub stdout: String,
    /// Captured standard error.
    pub stderr: String,
}

/// The two definitive engine results.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum EngineResult {
    /// Exit code `0`: planar, or no K3,3 found.
    Ok,
    /// Exit code `1`: non-planar, or K3,3 found.
    NonEmbeddable,
}

/// Maps an engine invocation onto its definitive result.
///
/// Exit code `0` means OK and `1` means NONEMBEDDABLE; anything else is a
/// failure. For queries with diagnostic markers the standard output must
/// contain the marker matching the exit code. The transform only ever
/// succeeds with `0`.
///
/// # Errors
/// Returns [`OracleError::Failure`] for any other exit condition and
/// [`OracleError::Disagreement`] when the marker is missing.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use k33audit_core::oracle::{EngineOutput, EngineResult, OracleQuery, interpret};
///
/// let output = EngineOutput {
///     status: Some(1),
///     stdout: "The graph is not planar.\n".into(),
///     stderr: String::new(),
/// };
/// let result = interpret(OracleQuery::PlanarEmbed, Path::new("g.txt"), output)?;
/// assert_eq!(result, EngineResult::NonEmbeddable);
/// # Ok::<(), k33audit_core::OracleError>(())
/// ```
pub fn interpret(
    query: OracleQuery,
    graph: &Path,
    output: EngineOutput,
) -> core::result::Result<EngineResult, OracleError> {
    let result = match (query, output.status) {
        (_, Some(0)) => EngineResult::Ok,
        (OracleQuery::K33Search | OracleQuery::PlanarEmbed, Some(1)) => {
            EngineResult::NonEmbeddable
        }
        (_, status) => {
            return Err(OracleError::Failure {
                query,
                graph: graph.to_path_buf(),
                status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
    };

    if let Some((ok_marker, nonembeddable_marker)) = query.markers() {
        let (expected, status) = match result {
            EngineResult::Ok => (ok_marker, 0),
            EngineResult::NonEmbeddable => (nonembeddable_marker, 1),
        };
        if !output.stdout.contains(expected) {
            return Err(OracleError::Disagreement {
                query,
                graph: graph.to_path_buf(),
                status,
                expected,
                stdout: output.stdout,
            });
        }
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn output(status: Option<i32>, stdout: &str) -> EngineOutput {
        EngineOutput {
            status,
            stdout: stdout.to_owned(),
            stderr: String::new(),
        }
    }

    fn graph() -> &'static Path {
        Path::new("n5.g6.1.AdjList.out.txt")
    }

    #[rstest]
    #[case::k33_absent(OracleQuery::K33Search, 0, "The graph has no subgraph homeomorphic to K_{3,3}.", EngineResult::Ok)]
    #[case::k33_present(OracleQuery::K33Search, 1, "The graph has a subgraph homeomorphic to K_{3,3}.", EngineResult::NonEmbeddable)]
    #[case::planar(OracleQuery::PlanarEmbed, 0, "The graph is planar.", EngineResult::Ok)]
    #[case::nonplanar(OracleQuery::PlanarEmbed, 1, "The graph is not planar.", EngineResult::NonEmbeddable)]
    #[case::transform(OracleQuery::Transform, 0, "", EngineResult::Ok)]
    fn interpret_accepts_consistent_results(
        #[case] query: OracleQuery,
        #[case] status: i32,
        #[case] stdout: &str,
        #[case] expected: EngineResult,
    ) {
        let result = interpret(query, graph(), output(Some(status), stdout));
        assert_eq!(result.ok(), Some(expected));
    }

    #[rstest]
    #[case::nonplanar_without_marker(OracleQuery::PlanarEmbed, 1, "The graph is planar.")]
    #[case::planar_without_marker(OracleQuery::PlanarEmbed, 0, "The graph is not planar.")]
    #[case::k33_without_marker(OracleQuery::K33Search, 1, "The graph has no subgraph homeomorphic to K_{3,3}.")]
    #[case::silent_ok(OracleQuery::K33Search, 0, "")]
    fn interpret_reports_disagreement(
        #[case] query: OracleQuery,
        #[case] status: i32,
        #[case] stdout: &str,
    ) {
        match interpret(query, graph(), output(Some(status), stdout)) {
            Err(OracleError::Disagreement { status: reported, .. }) => {
                assert_eq!(reported, status);
            }
            other => panic!("expected disagreement, got {other:?}"),
        }
    }

    #[rstest]
    #[case::notok(OracleQuery::PlanarEmbed, Some(255))]
    #[case::negative(OracleQuery::K33Search, Some(-1))]
    #[case::signal(OracleQuery::K33Search, None)]
    #[case::transform_nonembeddable(OracleQuery::Transform, Some(1))]
    fn interpret_reports_failures(#[case] query: OracleQuery, #[case] status: Option<i32>) {
        assert!(matches!(
            interpret(query, graph(), output(status, "")),
            Err(OracleError::Failure { .. })
        ));
    }

    #[test]
    fn artifacts_for_a_bare_file_name_use_the_current_directory() {
        let artifacts = Artifacts::for_input(Path::new("g.txt"));
        assert_eq!(artifacts.dir(), Path::new("."));
        assert_eq!(artifacts.k33_report(), Path::new("./g.s.3.out.txt"));
        assert_eq!(artifacts.embedding(), Path::new("./g.s.p.out.txt"));
    }
}
