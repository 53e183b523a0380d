//! In-memory simple undirected graph with adjacency-list storage.
//!
//! Vertices are numbered `0..order`. Each vertex owns an ordered sequence of
//! neighbour indices; the order is whatever the producer of the graph chose
//! (the planarity engine writes neighbours in reverse arc order), so nothing
//! here assumes the sequences are sorted.

use std::fmt;

use thiserror::Error;

/// Errors raised when a mutation would break the simple-graph invariants.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum GraphError {
    /// A vertex index fell outside `0..order`.
    #[error("vertex {vertex} is out of range for a graph of order {order}")]
    InvalidVertex {
        /// The offending index.
        vertex: usize,
        /// Order of the graph being mutated.
        order: usize,
    },
    /// Self-loops are not permitted.
    #[error("self-loop on vertex {vertex} is not permitted")]
    SelfLoop {
        /// Vertex that would have been joined to itself.
        vertex: usize,
    },
    /// The arc already exists.
    #[error("arc ({u}, {v}) already exists")]
    DuplicateArc {
        /// Tail of the arc.
        u: usize,
        /// Head of the arc.
        v: usize,
    },
    /// The edge to delete is not present.
    #[error("edge {{{u}, {v}}} is not present")]
    MissingEdge {
        /// First endpoint.
        u: usize,
        /// Second endpoint.
        v: usize,
    },
}

/// An undirected edge, stored with `u < v`.
///
/// # Examples
/// ```
/// use k33audit_core::Edge;
///
/// let edge = Edge::new(4, 2);
/// assert_eq!((edge.u(), edge.v()), (2, 4));
/// assert_eq!(edge.to_string(), "{2, 4}");
/// ```
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Edge {
    u: usize,
    v: usize,
}

impl Edge {
    /// Creates an edge, normalising the endpoint order.
    #[must_use]
    pub const fn new(a: usize, b: usize) -> Self {
        if a <= b {
            Self { u: a, v: b }
        } else {
            Self { u: b, v: a }
        }
    }

    /// Returns the smaller endpoint.
    #[must_use]
    pub const fn u(self) -> usize {
        self.u
    }

    /// Returns the larger endpoint.
    #[must_use]
    pub const fn v(self) -> usize {
        self.v
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}, {}}}", self.u, self.v)
    }
}

/// Simple undirected graph stored as one neighbour sequence per vertex.
///
/// `Clone` is a full deep copy; edge-deletion trials rely on this so that a
/// trial can never disturb the graph it was derived from.
///
/// # Examples
/// ```
/// use k33audit_core::Graph;
///
/// let mut graph = Graph::new(3);
/// graph.add_edge(0, 1)?;
/// graph.add_edge(1, 2)?;
/// assert_eq!(graph.max_degree(), 2);
/// assert_eq!(graph.to_adjacency_list(), "N=3\n0: 1 -1\n1: 0 2 -1\n2: 1 -1\n");
/// # Ok::<(), k33audit_core::GraphError>(())
/// ```
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Graph {
    adjacency: Vec<Vec<usize>>,
}

impl Graph {
    /// Creates an edgeless graph with `order` vertices.
    #[must_use]
    pub fn new(order: usize) -> Self {
        Self {
            adjacency: vec![Vec::new(); order],
        }
    }

    /// Returns the number of vertices.
    #[must_use]
    pub fn order(&self) -> usize {
        self.adjacency.len()
    }

    /// Returns the number of undirected edges, counting each pair once.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges().count()
    }

    /// Returns the neighbour sequence of `vertex`, or `None` when the index
    /// is out of range.
    #[must_use]
    pub fn neighbours(&self, vertex: usize) -> Option<&[usize]> {
        self.adjacency.get(vertex).map(Vec::as_slice)
    }

    /// Returns the degree of `vertex`, or `None` when the index is out of
    /// range.
    #[must_use]
    pub fn degree(&self, vertex: usize) -> Option<usize> {
        self.adjacency.get(vertex).map(Vec::len)
    }

    /// Returns the largest neighbour-sequence length, `0` for edgeless or
    /// empty graphs.
    #[must_use]
    pub fn max_degree(&self) -> usize {
        self.adjacency.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Returns `true` when `v` appears in the neighbour sequence of `u`.
    #[must_use]
    pub fn has_arc(&self, u: usize, v: usize) -> bool {
        self.adjacency
            .get(u)
            .is_some_and(|neighbours| neighbours.contains(&v))
    }

    /// Appends `v` to the neighbour sequence of `u`.
    ///
    /// Only one direction is recorded. Callers reading an encoding that lists
    /// every edge from both endpoints issue the complementary call themselves;
    /// [`Graph::add_edge`] does both at once.
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidVertex`] for an out-of-range index,
    /// [`GraphError::SelfLoop`] when `u == v` and [`GraphError::DuplicateArc`]
    /// when the arc already exists.
    pub fn add_arc(&mut self, u: usize, v: usize) -> Result<(), GraphError> {
        let order = self.order();
        if v >= order {
            return Err(GraphError::InvalidVertex { vertex: v, order });
        }
        if u == v {
            return Err(GraphError::SelfLoop { vertex: u });
        }
        let neighbours = self
            .adjacency
            .get_mut(u)
            .ok_or(GraphError::InvalidVertex { vertex: u, order })?;
        if neighbours.contains(&v) {
            return Err(GraphError::DuplicateArc { u, v });
        }
        neighbours.push(v);
        Ok(())
    }

    /// Adds the undirected edge `{u, v}` by recording both arcs.
    ///
    /// # Errors
    /// Propagates the [`GraphError`] of either arc. The graph is left
    /// unchanged when the first arc is rejected; the second arc can only be
    /// rejected if the graph was already asymmetric.
    pub fn add_edge(&mut self, u: usize, v: usize) -> Result<(), GraphError> {
        self.add_arc(u, v)?;
        self.add_arc(v, u)
    }

    /// Removes the undirected edge `{u, v}` from both neighbour sequences.
    ///
    /// # Errors
    /// Returns [`GraphError::InvalidVertex`] for an out-of-range index and
    /// [`GraphError::MissingEdge`] when either arc is absent. Nothing is
    /// removed on failure.
    pub fn delete_edge(&mut self, u: usize, v: usize) -> Result<(), GraphError> {
        let order = self.order();
        for vertex in [u, v] {
            if vertex >= order {
                return Err(GraphError::InvalidVertex { vertex, order });
            }
        }
        let forward = self.position(u, v).ok_or(GraphError::MissingEdge { u, v })?;
        let backward = self.position(v, u).ok_or(GraphError::MissingEdge { u, v })?;
        if let Some(neighbours) = self.adjacency.get_mut(u) {
            neighbours.remove(forward);
        }
        if let Some(neighbours) = self.adjacency.get_mut(v) {
            neighbours.remove(backward);
        }
        Ok(())
    }

    fn position(&self, u: usize, v: usize) -> Option<usize> {
        self.adjacency
            .get(u)
            .and_then(|neighbours| neighbours.iter().position(|&w| w == v))
    }

    /// Iterates every undirected edge exactly once.
    ///
    /// Vertices are visited in index order and, within a neighbour sequence,
    /// only neighbours greater than the vertex are reported. The visiting
    /// order therefore follows the stored sequence order.
    pub fn edges(&self) -> impl Iterator<Item = Edge> + '_ {
        self.adjacency.iter().enumerate().flat_map(|(u, neighbours)| {
            neighbours
                .iter()
                .filter(move |&&v| v > u)
                .map(move |&v| Edge::new(u, v))
        })
    }

    /// Sorts every neighbour sequence ascending.
    pub fn sort_adjacency(&mut self) {
        for neighbours in &mut self.adjacency {
            neighbours.sort_unstable();
        }
    }

    /// Returns the first arc `(u, v)` whose reverse arc is missing.
    #[must_use]
    pub fn first_asymmetric_arc(&self) -> Option<(usize, usize)> {
        self.adjacency.iter().enumerate().find_map(|(u, neighbours)| {
            neighbours
                .iter()
                .find(|&&v| !self.has_arc(v, u))
                .map(|&v| (u, v))
        })
    }

    /// Serialises the graph in the engine's zero-based adjacency-list text
    /// form: `N=<order>` followed by `u: v1 v2 ... -1` per vertex.
    #[must_use]
    pub fn to_adjacency_list(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "N={}", self.order())?;
        for (u, neighbours) in self.adjacency.iter().enumerate() {
            write!(f, "{u}:")?;
            for v in neighbours {
                write!(f, " {v}")?;
            }
            writeln!(f, " -1")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use proptest::{prelude::*, sample::Index};
    use rstest::rstest;

    use crate::test_utils::arbitrary_graph;

    fn path_graph(order: usize) -> Graph {
        let mut graph = Graph::new(order);
        for u in 1..order {
            graph
                .add_edge(u - 1, u)
                .unwrap_or_else(|err| panic!("path edge must be valid: {err}"));
        }
        graph
    }

    #[rstest]
    #[case::self_loop(1, 1, GraphError::SelfLoop { vertex: 1 })]
    #[case::tail_out_of_range(3, 0, GraphError::InvalidVertex { vertex: 3, order: 3 })]
    #[case::head_out_of_range(0, 7, GraphError::InvalidVertex { vertex: 7, order: 3 })]
    #[case::duplicate(0, 1, GraphError::DuplicateArc { u: 0, v: 1 })]
    fn add_arc_rejects_invalid_arcs(#[case] u: usize, #[case] v: usize, #[case] expected: GraphError) {
        let mut graph = path_graph(3);
        let before = graph.clone();
        let err = graph.add_arc(u, v).expect_err("arc must be rejected");
        assert_eq!(err, expected);
        assert_eq!(graph, before);
    }

    #[test]
    fn add_arc_records_a_single_direction() {
        let mut graph = Graph::new(2);
        graph.add_arc(0, 1).expect("arc must be accepted");
        assert!(graph.has_arc(0, 1));
        assert!(!graph.has_arc(1, 0));
        assert_eq!(graph.first_asymmetric_arc(), Some((0, 1)));
    }

    #[test]
    fn delete_edge_removes_both_directions() {
        let mut graph = path_graph(3);
        graph.delete_edge(2, 1).expect("edge must exist");
        assert_eq!(graph.neighbours(1), Some(&[0][..]));
        assert_eq!(graph.neighbours(2), Some(&[][..]));
        assert_eq!(graph.first_asymmetric_arc(), None);
    }

    #[rstest]
    #[case::absent(0, 2, GraphError::MissingEdge { u: 0, v: 2 })]
    #[case::out_of_range(0, 9, GraphError::InvalidVertex { vertex: 9, order: 3 })]
    fn delete_edge_rejects_missing_edges(#[case] u: usize, #[case] v: usize, #[case] expected: GraphError) {
        let mut graph = path_graph(3);
        assert_eq!(graph.delete_edge(u, v), Err(expected));
        assert_eq!(graph, path_graph(3));
    }

    #[test]
    fn delete_edge_leaves_graph_untouched_when_one_side_is_missing() {
        let mut graph = Graph::new(3);
        graph.add_arc(0, 1).expect("arc must be accepted");
        assert!(graph.delete_edge(0, 1).is_err());
        assert!(graph.has_arc(0, 1));
    }

    #[rstest]
    #[case::empty(Graph::new(0), 0)]
    #[case::edgeless(Graph::new(4), 0)]
    #[case::path(path_graph(4), 2)]
    fn max_degree_matches_longest_sequence(#[case] graph: Graph, #[case] expected: usize) {
        assert_eq!(graph.max_degree(), expected);
    }

    #[test]
    fn edges_follow_stored_order_and_skip_reverse_arcs() {
        let mut graph = Graph::new(4);
        graph.add_edge(0, 3).expect("edge");
        graph.add_edge(0, 1).expect("edge");
        graph.add_edge(2, 1).expect("edge");
        let edges: Vec<Edge> = graph.edges().collect();
        assert_eq!(edges, vec![Edge::new(0, 3), Edge::new(0, 1), Edge::new(1, 2)]);
        assert_eq!(graph.edge_count(), 3);

        graph.sort_adjacency();
        let sorted: Vec<Edge> = graph.edges().collect();
        assert_eq!(sorted, vec![Edge::new(0, 1), Edge::new(0, 3), Edge::new(1, 2)]);
    }

    #[test]
    fn clone_is_independent_of_the_original() {
        let original = path_graph(3);
        let mut copy = original.clone();
        copy.delete_edge(0, 1).expect("edge must exist");
        assert!(original.has_arc(0, 1));
        assert!(!copy.has_arc(0, 1));
    }

    #[test]
    fn display_terminates_every_line_with_sentinel() {
        let graph = Graph::new(2);
        assert_eq!(graph.to_adjacency_list(), "N=2\n0: -1\n1: -1\n");
    }

    #[test]
    fn degree_counts_listed_neighbours() {
        let graph = path_graph(3);
        assert_eq!(graph.degree(0), Some(1));
        assert_eq!(graph.degree(1), Some(2));
        assert_eq!(graph.degree(3), None);
    }

    proptest! {
        #[test]
        fn adding_then_deleting_an_absent_edge_restores_the_sequences(
            original in arbitrary_graph(),
            first in any::<Index>(),
            second in any::<Index>(),
        ) {
            let order = original.order();
            prop_assume!(order >= 2);
            let (u, v) = (first.index(order), second.index(order));
            prop_assume!(u != v && !original.has_arc(u, v));

            let mut graph = original.clone();
            graph.add_arc(u, v).map_err(|err| TestCaseError::fail(err.to_string()))?;
            graph.add_arc(v, u).map_err(|err| TestCaseError::fail(err.to_string()))?;
            graph.delete_edge(u, v).map_err(|err| TestCaseError::fail(err.to_string()))?;
            prop_assert_eq!(graph, original);
        }
    }
}
