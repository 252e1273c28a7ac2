//! Edge identifier for the statement flow graph.

use std::fmt;

/// Index of an edge in a [`DirectedGraph`](crate::utils::graph::DirectedGraph).
///
/// Sequential edges are added when the flow graph is built; routed jump edges follow later,
/// one reachability pass at a time, so a larger id means a later admission.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EdgeId(pub(crate) usize);

impl EdgeId {
    /// Creates a new `EdgeId` from a raw index value.
    #[must_use]
    #[inline]
    pub const fn new(index: usize) -> Self {
        EdgeId(index)
    }

    /// Returns the raw index value of this edge identifier.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Debug for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EdgeId({})", self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_edge_id_admission_order() {
        let sequential = EdgeId::new(0);
        let routed = EdgeId::new(5);
        assert!(sequential < routed);
        assert_eq!(routed.index(), 5);
        assert_eq!(format!("{routed}"), "e5");
    }
}
