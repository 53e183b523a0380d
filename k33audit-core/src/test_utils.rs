//! Shared generators for property tests.

use proptest::prelude::*;

use crate::graph::Graph;

/// Symmetric graphs of order below 12 with an arbitrary edge set.
pub(crate) fn arbitrary_graph() -> impl Strategy<Value = Graph> {
    (0usize..12).prop_flat_map(|order| {
        let pairs = order * order.saturating_sub(1) / 2;
        proptest::collection::vec(any::<bool>(), pairs).prop_map(move |bits| {
            let mut graph = Graph::new(order);
            let mut bits = bits.into_iter();
            for v in 1..order {
                for u in 0..v {
                    if bits.next().unwrap_or(false) {
                        graph.add_edge(u, v).expect("generated edges are fresh");
                    }
                }
            }
            graph
        })
    })
}
