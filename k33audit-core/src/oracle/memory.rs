//! Deterministic in-process stand-in for the planarity engine.

use std::{
    fmt, fs,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use tracing::debug;

use super::{
    Artifacts, EmbedOutcome, EngineOutput, EngineResult, K33SearchOutcome, Oracle, OracleQuery,
    interpret,
};
use crate::{
    adjacency,
    error::{AuditError, FormatError, Result},
    graph::Graph,
    graph6,
};

/// Answer to a K3,3 search.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum K33Reply {
    /// Report that no K3,3 homeomorph exists.
    NoK33,
    /// Report that a K3,3 homeomorph exists.
    ContainsK33,
    /// Pretend the engine produced exactly this output.
    Engine(EngineOutput),
}

/// Answer to a planar embedding request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum EmbedReply {
    /// Report the graph as planar.
    Planar,
    /// Report the graph as non-planar and write this obstruction.
    Nonplanar(Graph),
    /// Pretend the engine produced exactly this output.
    Engine(EngineOutput),
}

/// One query received by an [`InMemoryOracle`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct OracleCall {
    /// Query issued.
    pub query: OracleQuery,
    /// Graph file the query concerned.
    pub graph: PathBuf,
}

type Rule<R> = Box<dyn Fn(&Graph) -> R + Send + Sync>;

/// [`Oracle`] answering from caller-supplied rules.
///
/// The oracle reads and writes the same files as [`super::PlanarityProcess`]:
/// the transform decodes a graph6 record into `<stem>.AdjList.out.txt`,
/// queries parse the adjacency list they are pointed at, and non-planar
/// answers write the obstruction next to the input. Replies are rendered as
/// engine output and passed through [`interpret`], so exit-code and marker
/// handling is shared with the real adapter.
///
/// # Examples
/// ```
/// use k33audit_core::oracle::{EmbedReply, InMemoryOracle, OracleQuery};
///
/// let oracle = InMemoryOracle::new().with_embed_rule(|graph| {
///     if graph.edge_count() > 9 {
///         EmbedReply::Nonplanar(graph.clone())
///     } else {
///         EmbedReply::Planar
///     }
/// });
/// assert_eq!(oracle.count(OracleQuery::PlanarEmbed), 0);
/// ```
pub struct InMemoryOracle {
    k33_rule: Rule<K33Reply>,
    embed_rule: Rule<EmbedReply>,
    calls: Mutex<Vec<OracleCall>>,
}

impl InMemoryOracle {
    /// Creates an oracle that reports every graph as planar and K3,3-free.
    #[must_use]
    pub fn new() -> Self {
        Self {
            k33_rule: Box::new(|_| K33Reply::NoK33),
            embed_rule: Box::new(|_| EmbedReply::Planar),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Replaces the rule answering K3,3 searches.
    #[must_use]
    pub fn with_k33_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Graph) -> K33Reply + Send + Sync + 'static,
    {
        self.k33_rule = Box::new(rule);
        self
    }

    /// Replaces the rule answering embedding requests.
    #[must_use]
    pub fn with_embed_rule<F>(mut self, rule: F) -> Self
    where
        F: Fn(&Graph) -> EmbedReply + Send + Sync + 'static,
    {
        self.embed_rule = Box::new(rule);
        self
    }

    /// Returns every call received so far, oldest first.
    #[must_use]
    pub fn calls(&self) -> Vec<OracleCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns how many times `query` was issued.
    #[must_use]
    pub fn count(&self, query: OracleQuery) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.query == query)
            .count()
    }

    fn record(&self, query: OracleQuery, graph: &Path) {
        debug!(%query, graph = %graph.display(), "in-memory oracle query");
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(OracleCall {
                query,
                graph: graph.to_path_buf(),
            });
    }
}

impl Default for InMemoryOracle {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InMemoryOracle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryOracle")
            .field("calls", &self.calls())
            .finish_non_exhaustive()
    }
}

fn engine(status: i32, stdout: &str) -> EngineOutput {
    EngineOutput {
        status: Some(status),
        stdout: stdout.to_owned(),
        stderr: String::new(),
    }
}

impl Oracle for InMemoryOracle {
    fn transform_to_adjacency_list(&self, graph_file: &Path) -> Result<PathBuf> {
        self.record(OracleQuery::Transform, graph_file);
        let text =
            fs::read_to_string(graph_file).map_err(|source| AuditError::io(graph_file, source))?;
        let record = text
            .lines()
            .find(|line| !line.trim().is_empty())
            .ok_or_else(|| AuditError::format(graph_file, FormatError::EmptyFile))?;
        let graph =
            graph6::decode(record).map_err(|source| AuditError::format(graph_file, source))?;
        let output = Artifacts::for_input(graph_file).adjacency_list();
        adjacency::write_graph(&output, &graph)?;
        Ok(output)
    }

    fn search_for_k33(&self, graph_file: &Path) -> Result<K33SearchOutcome> {
        self.record(OracleQuery::K33Search, graph_file);
        let graph = adjacency::read_graph(graph_file)?;
        let output = match (self.k33_rule)(&graph) {
            K33Reply::NoK33 => engine(
                0,
                "The graph has no subgraph homeomorphic to K_{3,3}.\n",
            ),
            K33Reply::ContainsK33 => {
                engine(1, "The graph has a subgraph homeomorphic to K_{3,3}.\n")
            }
            K33Reply::Engine(output) => output,
        };
        Ok(match interpret(OracleQuery::K33Search, graph_file, output)? {
            EngineResult::Ok => K33SearchOutcome::NoK33,
            EngineResult::NonEmbeddable => K33SearchOutcome::ContainsK33,
        })
    }

    fn planar_embed(&self, graph_file: &Path) -> Result<EmbedOutcome> {
        self.record(OracleQuery::PlanarEmbed, graph_file);
        let graph = adjacency::read_graph(graph_file)?;
        let (output, obstruction) = match (self.embed_rule)(&graph) {
            EmbedReply::Planar => (engine(0, "The graph is planar.\n"), None),
            EmbedReply::Nonplanar(obstruction) => {
                (engine(1, "The graph is not planar.\n"), Some(obstruction))
            }
            EmbedReply::Engine(output) => (output, None),
        };
        match interpret(OracleQuery::PlanarEmbed, graph_file, output)? {
            EngineResult::Ok => Ok(EmbedOutcome::Planar),
            EngineResult::NonEmbeddable => {
                let path = Artifacts::for_input(graph_file).obstruction();
                if let Some(obstruction) = obstruction {
                    adjacency::write_graph(&path, &obstruction)?;
                }
                Ok(EmbedOutcome::Nonplanar { obstruction: path })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::error::OracleError;

    fn k5() -> Graph {
        graph6::decode("D~{").expect("K5 record")
    }

    fn write_k5(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("k5.AdjList.out.txt");
        adjacency::write_graph(&path, &k5()).expect("write K5");
        path
    }

    #[test]
    fn transform_decodes_graph6_next_to_the_input() {
        let dir = TempDir::new().expect("temp dir");
        let input = dir.path().join("n5.g6.1.g6");
        fs::write(&input, "D~{\n").expect("write record");
        let oracle = InMemoryOracle::new();
        let output = oracle
            .transform_to_adjacency_list(&input)
            .expect("transform succeeds");
        assert_eq!(output, dir.path().join("n5.g6.1.AdjList.out.txt"));
        assert_eq!(adjacency::read_graph(&output).expect("parse"), k5());
    }

    #[test]
    fn nonplanar_replies_write_the_obstruction() {
        let dir = TempDir::new().expect("temp dir");
        let input = write_k5(&dir);
        let oracle = InMemoryOracle::new().with_embed_rule(|graph| EmbedReply::Nonplanar(graph.clone()));
        let outcome = oracle.planar_embed(&input).expect("embed succeeds");
        let EmbedOutcome::Nonplanar { obstruction } = outcome else {
            panic!("expected non-planar outcome");
        };
        assert_eq!(adjacency::read_graph(&obstruction).expect("parse"), k5());
        assert_eq!(
            oracle.calls(),
            vec![OracleCall {
                query: OracleQuery::PlanarEmbed,
                graph: input,
            }]
        );
    }

    #[test]
    fn injected_engine_output_is_interpreted() {
        let dir = TempDir::new().expect("temp dir");
        let input = write_k5(&dir);
        let oracle = InMemoryOracle::new().with_embed_rule(|_| {
            EmbedReply::Engine(EngineOutput {
                status: Some(1),
                stdout: "The graph is planar.\n".to_owned(),
                stderr: String::new(),
            })
        });
        let err = oracle.planar_embed(&input).expect_err("disagreement");
        assert!(matches!(
            err,
            AuditError::Oracle(OracleError::Disagreement { .. })
        ));
    }

    #[test]
    fn count_filters_by_query() {
        let dir = TempDir::new().expect("temp dir");
        let input = write_k5(&dir);
        let oracle = InMemoryOracle::new().with_k33_rule(|_| K33Reply::ContainsK33);
        assert_eq!(
            oracle.search_for_k33(&input).expect("search succeeds"),
            K33SearchOutcome::ContainsK33
        );
        assert_eq!(oracle.count(OracleQuery::K33Search), 1);
        assert_eq!(oracle.count(OracleQuery::PlanarEmbed), 0);
    }
}
