//! Trait definitions for graph abstractions.
//!
//! Algorithms in [`algorithms`](crate::utils::graph::algorithms) are written against these
//! traits rather than against [`DirectedGraph`](crate::utils::graph::DirectedGraph), so they
//! stay usable for any adjacency representation.
//!
//! - [`GraphBase`] - Core properties: node count
//! - [`Successors`] - Forward edge traversal (outgoing edges)

use crate::utils::graph::NodeId;

/// Core graph properties shared by every graph representation.
pub trait GraphBase {
    /// Returns the number of nodes in the graph.
    fn node_count(&self) -> usize;
}

/// Forward adjacency queries.
pub trait Successors: GraphBase {
    /// Returns the direct successors of `node`.
    ///
    /// Successors are yielded in edge insertion order. Nodes outside the graph have no
    /// successors.
    fn successors(&self, node: NodeId) -> impl Iterator<Item = NodeId>;
}
