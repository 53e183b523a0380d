//! Zero-based adjacency-list text codec.
//!
//! The format is the one the planarity engine reads and writes: a header line
//! `N=<order>` followed by one line per vertex, `u: v1 v2 ... -1`. Every edge
//! is listed from both endpoints, so parsing issues one [`Graph::add_arc`] per
//! listed neighbour and then checks that the result is symmetric.

use std::{fs, path::Path};

use crate::{
    error::{AnalysisError, AuditError, FormatError, Result},
    format::parse_order_header,
    graph::Graph,
};

const TERMINATOR: i64 = -1;

/// Parses adjacency-list `text`, attributing errors to `origin`.
///
/// # Errors
/// Returns [`AuditError::Format`] for a missing header, malformed or
/// unterminated lines, out-of-sequence vertex labels, a vertex count that
/// disagrees with the header, or an asymmetric edge listing;
/// [`AuditError::Graph`] when a line lists an invalid arc; and
/// [`AuditError::Analysis`] when the list is one-based.
///
/// # Examples
/// ```
/// use std::path::Path;
/// use k33audit_core::adjacency;
///
/// let graph = adjacency::parse("N=2\n0: 1 -1\n1: 0 -1\n", Path::new("pair.txt"))?;
/// assert_eq!(graph.edge_count(), 1);
/// # Ok::<(), k33audit_core::AuditError>(())
/// ```
pub fn parse(text: &str, origin: &Path) -> Result<Graph> {
    let format_error = |source| AuditError::format(origin, source);
    let mut lines = text.lines();
    let order = lines
        .next()
        .and_then(parse_order_header)
        .ok_or_else(|| format_error(FormatError::MissingHeader))?;

    let vertex_lines: Vec<(usize, &str)> = lines
        .enumerate()
        .map(|(index, raw)| (index + 2, raw))
        .filter(|(_, raw)| !raw.trim().is_empty())
        .collect();
    if vertex_lines
        .first()
        .is_some_and(|(_, raw)| leading_label(raw) == Some(1))
    {
        return Err(AuditError::Analysis {
            path: origin.to_path_buf(),
            source: AnalysisError::OneBasedIndices,
        });
    }
    // Count the lines before allocating from an externally written header.
    if vertex_lines.len() != order {
        return Err(format_error(FormatError::OrderMismatch {
            declared: order,
            found: vertex_lines.len(),
        }));
    }

    let mut graph = Graph::new(order);
    for (expected, (line, raw)) in vertex_lines.into_iter().enumerate() {
        let (label, neighbours) = parse_vertex_line(raw, line).map_err(format_error)?;
        if label != expected {
            return Err(format_error(FormatError::VertexOutOfOrder {
                line,
                expected,
                found: label,
            }));
        }
        for v in neighbours {
            graph.add_arc(label, v).map_err(|source| AuditError::Graph {
                path: origin.to_path_buf(),
                line,
                source,
            })?;
        }
    }

    if let Some((u, v)) = graph.first_asymmetric_arc() {
        return Err(format_error(FormatError::AsymmetricAdjacency { u, v }));
    }
    Ok(graph)
}

fn leading_label(raw: &str) -> Option<usize> {
    raw.split_once(':')
        .and_then(|(label, _)| label.trim().parse().ok())
}

fn parse_vertex_line(
    raw: &str,
    line: usize,
) -> core::result::Result<(usize, Vec<usize>), FormatError> {
    let malformed = || FormatError::MalformedLine {
        line,
        content: raw.to_owned(),
    };
    let (label, rest) = raw.split_once(':').ok_or_else(malformed)?;
    let label = label.trim().parse::<usize>().map_err(|_| malformed())?;
    let values = rest
        .split_whitespace()
        .map(str::parse::<i64>)
        .collect::<core::result::Result<Vec<_>, _>>()
        .map_err(|_| malformed())?;
    let Some((&last, body)) = values.split_last() else {
        return Err(FormatError::MissingTerminator { line });
    };
    if last != TERMINATOR {
        return Err(FormatError::MissingTerminator { line });
    }
    let neighbours = body
        .iter()
        .map(|&value| usize::try_from(value).map_err(|_| malformed()))
        .collect::<core::result::Result<Vec<_>, _>>()?;
    Ok((label, neighbours))
}

/// Reads and parses the adjacency list stored at `path`.
///
/// # Errors
/// Returns [`AuditError::Io`] when the file cannot be read, otherwise any
/// error documented on [`parse`].
pub fn read_graph(path: &Path) -> Result<Graph> {
    let text = fs::read_to_string(path).map_err(|source| AuditError::io(path, source))?;
    parse(&text, path)
}

/// Serialises `graph` to `path`, replacing any existing file.
///
/// # Errors
/// Returns [`AuditError::Io`] when the file cannot be written.
pub fn write_graph(path: &Path, graph: &Graph) -> Result<()> {
    fs::write(path, graph.to_adjacency_list()).map_err(|source| AuditError::io(path, source))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::PathBuf;

    use proptest::prelude::*;
    use rstest::rstest;

    use crate::{graph::GraphError, test_utils::arbitrary_graph};

    fn origin() -> PathBuf {
        PathBuf::from("graph.AdjList.out.txt")
    }

    #[test]
    fn parse_reads_engine_output() {
        let text = "N=3\n0: 2 1 -1\n1: 0 -1\n2: 0 -1\n";
        let graph = parse(text, &origin()).expect("valid adjacency list");
        assert_eq!(graph.order(), 3);
        assert_eq!(graph.neighbours(0), Some(&[2, 1][..]));
        assert_eq!(graph.to_adjacency_list(), text);
    }

    #[test]
    fn parse_tolerates_trailing_blank_lines() {
        let graph = parse("N=1\n0: -1\n\n", &origin()).expect("valid adjacency list");
        assert_eq!(graph.order(), 1);
    }

    #[test]
    fn missing_header_names_the_offending_file() {
        let err = parse("0: -1\n", &origin()).expect_err("header is required");
        assert!(matches!(
            &err,
            AuditError::Format { path, source: FormatError::MissingHeader } if *path == origin()
        ));
        assert!(err.to_string().contains("graph.AdjList.out.txt"));
    }

    #[rstest]
    #[case::no_colon("N=1\n0 -1\n", FormatError::MalformedLine { line: 2, content: "0 -1".to_owned() })]
    #[case::no_terminator("N=2\n0: 1\n1: 0 -1\n", FormatError::MissingTerminator { line: 2 })]
    #[case::out_of_order("N=2\n0: -1\n0: -1\n", FormatError::VertexOutOfOrder { line: 3, expected: 1, found: 0 })]
    #[case::too_few_lines("N=3\n0: -1\n1: -1\n", FormatError::OrderMismatch { declared: 3, found: 2 })]
    #[case::oversized_header("N=1000000000000000000\n", FormatError::OrderMismatch { declared: 1_000_000_000_000_000_000, found: 0 })]
    #[case::asymmetric("N=2\n0: 1 -1\n1: -1\n", FormatError::AsymmetricAdjacency { u: 0, v: 1 })]
    fn parse_rejects_malformed_lists(#[case] text: &str, #[case] expected: FormatError) {
        match parse(text, &origin()) {
            Err(AuditError::Format { source, .. }) => assert_eq!(source, expected),
            other => panic!("expected format error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_duplicate_neighbours_with_line_number() {
        match parse("N=2\n0: 1 1 -1\n1: 0 -1\n", &origin()) {
            Err(AuditError::Graph { line, source, .. }) => {
                assert_eq!(line, 2);
                assert_eq!(source, GraphError::DuplicateArc { u: 0, v: 1 });
            }
            other => panic!("expected graph error, got {other:?}"),
        }
    }

    #[test]
    fn parse_detects_one_based_lists() {
        let err = parse("N=2\n1: 2 0\n2: 1 0\n", &origin()).expect_err("one-based list");
        assert!(matches!(
            err,
            AuditError::Analysis {
                source: AnalysisError::OneBasedIndices,
                ..
            }
        ));
    }

    proptest! {
        #[test]
        fn serialise_then_parse_is_identity(graph in arbitrary_graph()) {
            let parsed = parse(&graph.to_adjacency_list(), &origin())
                .map_err(|err| TestCaseError::fail(err.to_string()))?;
            prop_assert_eq!(parsed, graph);
        }
    }
}
