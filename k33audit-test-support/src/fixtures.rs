//! Canned graphs in the encodings used at the engine boundary.
//!
//! Adjacency lists are written in the neighbour order produced by decoding the
//! matching graph6 record.

/// K5 as a graph6 record.
pub const K5_GRAPH6: &str = "D~{";

/// K3,3 with parts `{0, 1, 2}` and `{3, 4, 5}` as a graph6 record.
pub const K33_GRAPH6: &str = "EFz_";

/// The triangle as a graph6 record.
pub const TRIANGLE_GRAPH6: &str = "Bw";

/// K5 as a zero-based adjacency list.
pub const K5_ADJACENCY_LIST: &str = "\
N=5
0: 1 2 3 4 -1
1: 0 2 3 4 -1
2: 0 1 3 4 -1
3: 0 1 2 4 -1
4: 0 1 2 3 -1
";

/// K3,3 as a zero-based adjacency list.
pub const K33_ADJACENCY_LIST: &str = "\
N=6
0: 3 4 5 -1
1: 3 4 5 -1
2: 3 4 5 -1
3: 0 1 2 -1
4: 0 1 2 -1
5: 0 1 2 -1
";

/// The triangle as a zero-based adjacency list.
pub const TRIANGLE_ADJACENCY_LIST: &str = "\
N=3
0: 1 2 -1
1: 0 2 -1
2: 0 1 -1
";

/// Builds a graph6 collection from `records`, optionally headed by the
/// `>>graph6<<` token.
///
/// # Examples
/// ```
/// use k33audit_test_support::fixtures::{K5_GRAPH6, collection};
///
/// assert_eq!(collection(&[K5_GRAPH6], true), ">>graph6<<D~{\n");
/// ```
#[must_use]
pub fn collection(records: &[&str], header: bool) -> String {
    let mut text = String::new();
    if header {
        text.push_str(">>graph6<<");
    }
    for record in records {
        text.push_str(record);
        text.push('\n');
    }
    text
}
