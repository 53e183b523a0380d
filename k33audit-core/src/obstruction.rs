//! Coarse structural classification of Kuratowski obstructions.

use std::fmt;

use crate::{error::AnalysisError, graph::Graph};

/// The two Kuratowski obstruction families.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ObstructionKind {
    /// A subdivision of K3,3: every branch vertex has degree 3.
    K33,
    /// A subdivision of K5: every branch vertex has degree 4.
    K5,
}

impl fmt::Display for ObstructionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::K33 => "K_{3,3}",
            Self::K5 => "K_5",
        })
    }
}

/// Classifies an obstruction by its maximum degree.
///
/// Subdivision vertices have degree 2, so the maximum degree is the branch
/// degree: 3 for K3,3 and 4 for K5.
///
/// # Errors
/// Returns [`AnalysisError::UnexpectedObstruction`] for any other maximum
/// degree, which means the embedder returned something other than a
/// Kuratowski subgraph.
///
/// # Examples
/// ```
/// use k33audit_core::{Graph, ObstructionKind, classify};
///
/// let mut k5 = Graph::new(5);
/// for v in 1..5 {
///     for u in 0..v {
///         k5.add_edge(u, v)?;
///     }
/// }
/// assert_eq!(classify(&k5), Ok(ObstructionKind::K5));
/// # Ok::<(), k33audit_core::GraphError>(())
/// ```
pub fn classify(obstruction: &Graph) -> Result<ObstructionKind, AnalysisError> {
    match obstruction.max_degree() {
        3 => Ok(ObstructionKind::K33),
        4 => Ok(ObstructionKind::K5),
        max_degree => Err(AnalysisError::UnexpectedObstruction { max_degree }),
    }
}
