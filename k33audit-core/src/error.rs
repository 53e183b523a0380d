//! Error types for the k33audit core library.
//!
//! [`AuditError`] is the single error surfaced by the public API. Each variant
//! names the file it concerns and carries a typed source describing what went
//! wrong; [`AuditError::code`] yields a stable machine-readable code.

use std::{fmt, io, path::PathBuf};

use thiserror::Error;

use crate::{
    format::InputFormat,
    graph::{Edge, GraphError},
    oracle::OracleQuery,
};

macro_rules! define_error_codes {
    (
        $(#[$enum_meta:meta])*
        enum $CodeTy:ident for $ErrTy:ident {
            $(
                $(#[$variant_meta:meta])*
                $CodeVariant:ident => $ErrVariant:ident $( { $($pattern:tt)* } )? $( ( $($tuple:tt)* ) )? => $code:expr
            ),+ $(,)?
        }
    ) => {
        $(#[$enum_meta])*
        #[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
        #[non_exhaustive]
        pub enum $CodeTy {
            $(
                $(#[$variant_meta])*
                $CodeVariant,
            )+
        }

        impl $CodeTy {
            /// Return the stable machine-readable representation of this error code.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$CodeVariant => $code,)+
                }
            }
        }

        impl fmt::Display for $CodeTy {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl $ErrTy {
            #[doc = concat!(
                "Retrieve the stable [`",
                stringify!($CodeTy),
                "`] for this error."
            )]
            #[must_use]
            pub const fn code(&self) -> $CodeTy {
                match self {
                    $(Self::$ErrVariant $( { $($pattern)* } )? $( ( $($tuple)* ) )? => $CodeTy::$CodeVariant,)+
                }
            }
        }
    };
}

/// Problems with a path supplied by the caller.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum PathError {
    /// The path does not name an existing regular file.
    #[error("does not correspond to a file")]
    NotAFile,
    /// The path names a file where a directory was expected.
    #[error("corresponds to a file and can't be used as a directory")]
    IsAFile,
    /// The path does not name an executable file.
    #[error("does not correspond to an executable")]
    NotExecutable,
    /// The path lies inside the results directory a run would wipe.
    #[error("lies inside the results directory that would be replaced")]
    InsideOutput,
}

/// Problems with the encoding of a graph file.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum FormatError {
    /// The file has no content.
    #[error("file is empty")]
    EmptyFile,
    /// The first line matches none of the known encodings.
    #[error("unable to determine the file encoding")]
    UnknownEncoding,
    /// The encoding was recognised but is not accepted here.
    #[error("`{found}` input is not supported; please supply a .g6 file")]
    UnsupportedEncoding {
        /// Encoding that was detected.
        found: InputFormat,
    },
    /// The adjacency-list header `N=<order>` is missing or malformed.
    #[error("doesn't contain an adjacency list: invalid header")]
    MissingHeader,
    /// A vertex line could not be parsed.
    #[error("line {line} is malformed: `{content}`")]
    MalformedLine {
        /// One-based line number within the file.
        line: usize,
        /// Raw line content.
        content: String,
    },
    /// A vertex line lacks the `-1` terminator.
    #[error("line {line} is missing the -1 terminator")]
    MissingTerminator {
        /// One-based line number within the file.
        line: usize,
    },
    /// Vertex lines are not numbered consecutively from zero.
    #[error("line {line} describes vertex {found} but vertex {expected} was expected")]
    VertexOutOfOrder {
        /// One-based line number within the file.
        line: usize,
        /// Vertex label the line should carry.
        expected: usize,
        /// Vertex label the line carries.
        found: usize,
    },
    /// The number of vertex lines disagrees with the header.
    #[error("header declares {declared} vertices but {found} vertex lines were read")]
    OrderMismatch {
        /// Order declared by `N=`.
        declared: usize,
        /// Vertex lines actually present.
        found: usize,
    },
    /// An arc is listed from one endpoint only.
    #[error("vertex {u} lists {v} but vertex {v} does not list {u}")]
    AsymmetricAdjacency {
        /// Endpoint listing the arc.
        u: usize,
        /// Endpoint missing the reverse arc.
        v: usize,
    },
    /// A graph6 record could not be decoded.
    #[error("invalid graph6 record: {reason}")]
    InvalidGraph6 {
        /// What was wrong with the record.
        reason: &'static str,
    },
}

/// Disagreements between the analysis' structural assumptions and the data.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum AnalysisError {
    /// The obstruction's maximum degree matches neither K5 nor K3,3.
    #[error(
        "obstruction has neither K5 nor K3,3 characteristics (maximum degree {max_degree})"
    )]
    UnexpectedObstruction {
        /// Maximum degree observed in the obstruction.
        max_degree: usize,
    },
    /// The adjacency list uses one-based vertex labels.
    #[error("adjacency list is 1-based but 0-based indices are required")]
    OneBasedIndices,
}

/// Failures reported while querying the external planarity engine.
#[derive(Debug, Error)]
pub enum OracleError {
    /// The engine could not be started.
    #[error("failed to launch `{program}` for {query}: {source}", program = .program.display())]
    Spawn {
        /// Executable that failed to start.
        program: PathBuf,
        /// Query being issued.
        query: OracleQuery,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// The engine finished with an outcome other than the two definitive ones.
    #[error(
        "{query} failed on `{graph}` (exit code {status}):\n\tstdout: {stdout}\n\tstderr: {stderr}",
        graph = .graph.display(),
        status = describe_status(.status)
    )]
    Failure {
        /// Query being issued.
        query: OracleQuery,
        /// Graph file the query concerned.
        graph: PathBuf,
        /// Exit code, `None` when the process was terminated by a signal.
        status: Option<i32>,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },
    /// The exit code and the diagnostic text describe different outcomes.
    #[error(
        "{query} exit code {status} doesn't align with stdout for `{graph}`: expected `{expected}`\n\tstdout: {stdout}",
        graph = .graph.display()
    )]
    Disagreement {
        /// Query being issued.
        query: OracleQuery,
        /// Graph file the query concerned.
        graph: PathBuf,
        /// Exit code reported by the engine.
        status: i32,
        /// Marker the exit code implies.
        expected: &'static str,
        /// Captured standard output.
        stdout: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    status.map_or_else(|| "<signal>".to_owned(), |code| code.to_string())
}

/// Error type produced by every fallible k33audit operation.
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum AuditError {
    /// A caller-supplied path is unusable.
    #[error("path `{path}` {source}", path = .path.display())]
    Path {
        /// Offending path.
        path: PathBuf,
        /// What is wrong with it.
        #[source]
        source: PathError,
    },
    /// Filesystem I/O failed.
    #[error("i/o error on `{path}`: {source}", path = .path.display())]
    Io {
        /// Path being read or written.
        path: PathBuf,
        /// Underlying operating system error.
        #[source]
        source: io::Error,
    },
    /// A graph file is malformed.
    #[error("`{path}`: {source}", path = .path.display())]
    Format {
        /// File being decoded.
        path: PathBuf,
        /// Encoding problem.
        #[source]
        source: FormatError,
    },
    /// An adjacency-list line asked for an invalid arc.
    #[error("unable to add arc specified on line {line} of `{path}`: {source}", path = .path.display())]
    Graph {
        /// File being decoded.
        path: PathBuf,
        /// One-based line number.
        line: usize,
        /// Rejected mutation.
        #[source]
        source: GraphError,
    },
    /// A graph read from `path` rejected a mutation.
    #[error("unable to modify graph read from `{path}`: {source}", path = .path.display())]
    Mutation {
        /// File the graph was read from.
        path: PathBuf,
        /// Rejected mutation.
        #[source]
        source: GraphError,
    },
    /// The planarity engine failed or contradicted itself.
    #[error(transparent)]
    Oracle(#[from] OracleError),
    /// The data contradicts the analysis' structural assumptions.
    #[error("analysis of `{path}` failed: {source}", path = .path.display())]
    Analysis {
        /// File whose contents triggered the failure.
        path: PathBuf,
        /// Structural disagreement.
        #[source]
        source: AnalysisError,
    },
    /// A single-edge deletion trial failed.
    #[error("trial removing edge {edge} failed")]
    Trial {
        /// Edge removed by the failed trial.
        edge: Edge,
        /// Failure raised by the trial.
        #[source]
        source: Box<AuditError>,
    },
    /// Processing one record of a graph collection failed.
    #[error("failed while processing graph on record {record} of `{input}`", input = .input.display())]
    Record {
        /// One-based record (line) number.
        record: usize,
        /// Collection the record came from.
        input: PathBuf,
        /// Failure raised by the record's pipeline.
        #[source]
        source: Box<AuditError>,
    },
}

define_error_codes! {
    /// Stable codes describing [`AuditError`] variants.
    enum AuditErrorCode for AuditError {
        /// A caller-supplied path is unusable.
        Path => Path { .. } => "AUDIT_PATH",
        /// Filesystem I/O failed.
        Io => Io { .. } => "AUDIT_IO",
        /// A graph file is malformed.
        Format => Format { .. } => "AUDIT_FORMAT",
        /// An adjacency-list line asked for an invalid arc.
        Graph => Graph { .. } => "AUDIT_GRAPH",
        /// A graph rejected a mutation.
        Mutation => Mutation { .. } => "AUDIT_MUTATION",
        /// The planarity engine failed or contradicted itself.
        Oracle => Oracle(..) => "AUDIT_ORACLE",
        /// The data contradicts the analysis' structural assumptions.
        Analysis => Analysis { .. } => "AUDIT_ANALYSIS",
        /// A single-edge deletion trial failed.
        Trial => Trial { .. } => "AUDIT_TRIAL",
        /// Processing one record of a graph collection failed.
        Record => Record { .. } => "AUDIT_RECORD",
    }
}

define_error_codes! {
    /// Stable codes describing [`OracleError`] variants.
    enum OracleErrorCode for OracleError {
        /// The engine could not be started.
        Spawn => Spawn { .. } => "ORACLE_SPAWN",
        /// The engine finished with an unexpected outcome.
        Failure => Failure { .. } => "ORACLE_FAILURE",
        /// The exit code and diagnostic text disagree.
        Disagreement => Disagreement { .. } => "ORACLE_DISAGREEMENT",
    }
}

impl AuditError {
    /// Returns the innermost error, looking through [`AuditError::Trial`] and
    /// [`AuditError::Record`] context wrappers.
    #[must_use]
    pub fn root(&self) -> &Self {
        match self {
            Self::Trial { source, .. } | Self::Record { source, .. } => source.root(),
            other => other,
        }
    }

    /// Returns the code of [`AuditError::root`].
    #[must_use]
    pub fn root_code(&self) -> AuditErrorCode {
        self.root().code()
    }

    /// Returns the [`OracleErrorCode`] when the root cause is an oracle error.
    #[must_use]
    pub fn oracle_code(&self) -> Option<OracleErrorCode> {
        match self.root() {
            Self::Oracle(error) => Some(error.code()),
            _ => None,
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn format(path: impl Into<PathBuf>, source: FormatError) -> Self {
        Self::Format {
            path: path.into(),
            source,
        }
    }
}

/// Convenient alias for results returned by the core API.
pub type Result<T> = core::result::Result<T, AuditError>;

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::rstest;

    fn disagreement() -> AuditError {
        AuditError::Oracle(OracleError::Disagreement {
            query: OracleQuery::PlanarEmbed,
            graph: PathBuf::from("g.txt"),
            status: 1,
            expected: "is not planar",
            stdout: String::new(),
        })
    }

    #[test]
    fn root_looks_through_context_wrappers() {
        let wrapped = AuditError::Record {
            record: 3,
            input: PathBuf::from("n6.m12.g6"),
            source: Box::new(AuditError::Trial {
                edge: Edge::new(1, 2),
                source: Box::new(disagreement()),
            }),
        };
        assert_eq!(wrapped.code(), AuditErrorCode::Record);
        assert_eq!(wrapped.root_code(), AuditErrorCode::Oracle);
        assert_eq!(wrapped.oracle_code(), Some(OracleErrorCode::Disagreement));
        assert!(wrapped.to_string().contains("record 3"));
    }

    #[rstest]
    #[case(AuditErrorCode::Path, "AUDIT_PATH")]
    #[case(AuditErrorCode::Analysis, "AUDIT_ANALYSIS")]
    #[case(AuditErrorCode::Record, "AUDIT_RECORD")]
    fn codes_are_stable(#[case] code: AuditErrorCode, #[case] expected: &str) {
        assert_eq!(code.as_str(), expected);
        assert_eq!(code.to_string(), expected);
    }

    #[test]
    fn failure_message_reports_signal_termination() {
        let err = OracleError::Failure {
            query: OracleQuery::K33Search,
            graph: PathBuf::from("g.txt"),
            status: None,
            stdout: String::new(),
            stderr: "killed".to_owned(),
        };
        assert!(err.to_string().contains("<signal>"));
        assert_eq!(err.code(), OracleErrorCode::Failure);
    }
}
