//! Graph traversal algorithms.
//!
//! - [`Dfs`] - Iterative depth-first walker (pre-order)
//!
//! The walker is iterative so that deeply nested method bodies, whose flow graphs can be
//! very long chains, never exhaust the call stack. It does not borrow the graph between
//! steps, so the caller may add edges mid-walk and [`Dfs::push`] their targets to continue
//! from where the walk stands instead of starting over.

use crate::utils::{
    graph::{GraphBase, NodeId, Successors},
    BitSet,
};

/// Depth-first walker over graph nodes.
///
/// Each node is discovered once and yielded once, in pre-order. Nodes pushed after they
/// were discovered are ignored, so resuming from any number of new roots costs only the
/// nodes not yet seen.
#[derive(Debug, Clone)]
pub struct Dfs {
    stack: Vec<NodeId>,
    discovered: BitSet,
    expanded: usize,
}

impl Dfs {
    /// Creates a walker sized for `graph` with nothing on its stack.
    pub fn new<G: GraphBase>(graph: &G) -> Self {
        Dfs {
            stack: Vec::new(),
            discovered: BitSet::new(graph.node_count()),
            expanded: 0,
        }
    }

    /// Adds `node` as a root of the walk.
    ///
    /// Nodes already discovered and nodes outside the graph are ignored.
    pub fn push(&mut self, node: NodeId) {
        if self.discovered.insert(node.index()) {
            self.stack.push(node);
        }
    }

    /// Returns `true` if the walk has reached `node`.
    #[must_use]
    pub fn is_discovered(&self, node: NodeId) -> bool {
        self.discovered.contains(node.index())
    }

    /// Yields the next node and discovers its successors.
    ///
    /// Successors are read at this moment, so edges added to `graph` before a node is
    /// yielded are followed.
    pub fn next<G: Successors>(&mut self, graph: &G) -> Option<NodeId> {
        let node = self.stack.pop()?;
        self.expanded += 1;

        // Push in reverse so successors pop in insertion order
        let successors: Vec<NodeId> = graph.successors(node).collect();
        for &succ in successors.iter().rev() {
            self.push(succ);
        }

        Some(node)
    }

    /// Returns the number of nodes yielded so far.
    #[must_use]
    pub fn expanded(&self) -> usize {
        self.expanded
    }

    /// Consumes the walker, returning the set of discovered nodes.
    #[must_use]
    pub fn into_discovered(self) -> BitSet {
        self.discovered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::graph::DirectedGraph;

    fn walk(graph: &DirectedGraph<char, ()>, start: NodeId) -> Vec<NodeId> {
        let mut dfs = Dfs::new(graph);
        dfs.push(start);
        std::iter::from_fn(|| dfs.next(graph)).collect()
    }

    #[test]
    fn test_dfs_visits_reachable_only() {
        let mut graph: DirectedGraph<char, ()> = DirectedGraph::new();
        let a = graph.add_node('A');
        let b = graph.add_node('B');
        let c = graph.add_node('C');
        let d = graph.add_node('D');
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(b, c, ()).unwrap();
        graph.add_edge(d, a, ()).unwrap();

        assert_eq!(walk(&graph, a), vec![a, b, c]);
    }

    #[test]
    fn test_dfs_preorder_follows_insertion_order() {
        let mut graph: DirectedGraph<char, ()> = DirectedGraph::new();
        let a = graph.add_node('A');
        let b = graph.add_node('B');
        let c = graph.add_node('C');
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(a, c, ()).unwrap();

        assert_eq!(walk(&graph, a), vec![a, b, c]);
    }

    #[test]
    fn test_dfs_handles_cycles() {
        let mut graph: DirectedGraph<char, ()> = DirectedGraph::new();
        let a = graph.add_node('A');
        let b = graph.add_node('B');
        graph.add_edge(a, b, ()).unwrap();
        graph.add_edge(b, a, ()).unwrap();

        assert_eq!(walk(&graph, a).len(), 2);
    }

    #[test]
    fn test_dfs_invalid_start() {
        let graph: DirectedGraph<char, ()> = DirectedGraph::new();
        assert!(walk(&graph, NodeId::new(3)).is_empty());
    }

    #[test]
    fn test_resume_after_adding_edge() {
        let mut graph: DirectedGraph<char, ()> = DirectedGraph::new();
        let a = graph.add_node('A');
        let b = graph.add_node('B');
        let c = graph.add_node('C');
        graph.add_edge(a, b, ()).unwrap();

        let mut dfs = Dfs::new(&graph);
        dfs.push(a);
        while dfs.next(&graph).is_some() {}
        assert!(!dfs.is_discovered(c));

        graph.add_edge(b, c, ()).unwrap();
        dfs.push(c);
        dfs.push(a);
        assert_eq!(dfs.next(&graph), Some(c));
        assert_eq!(dfs.next(&graph), None);
        assert_eq!(dfs.expanded(), 3);
        assert_eq!(dfs.into_discovered().count(), 3);
    }
}
