//! Statement-level reachability.
//!
//! Builds the statement flow graph on top of [`DirectedGraph`] and marks every node that can
//! be reached from a method entry. Jumps and normal completions that cross a `finally` only
//! arrive if that `finally` can itself complete, which is a fact about reachability. Such
//! guarded edges are indexed by the handler ends they wait for and added to the graph while
//! a single walk is in progress: once the last of its handler ends is marked, an edge is
//! admitted and the walk continues from its target if its source is already marked. Each
//! flow node is expanded at most once, so the fixpoint costs time linear in the graph.

use std::collections::HashMap;

use crate::{
    analysis::cfg::{FlowEdgeKind, FlowNode},
    body::{Condition, HandlerKind, MethodBody, StatementId, StatementKind},
    utils::{
        graph::{algorithms::Dfs, DirectedGraph, EdgeId, NodeId},
        BitSet,
    },
    Result,
};

/// A jump resolved by the flow graph, waiting to be routed.
#[derive(Debug, Clone)]
pub(crate) struct Route {
    /// The jump statement.
    pub source: StatementId,
    /// Where control arrives when the jump completes.
    pub target: FlowNode,
    /// Bodies of the `finally` handlers the jump runs on its way out, innermost first.
    pub requires: Vec<StatementId>,
}

/// An edge that is only added once all of its crossed `finally` handlers can complete.
#[derive(Debug)]
struct PendingEdge {
    from: NodeId,
    to: NodeId,
    kind: FlowEdgeKind,
    requires: Vec<NodeId>,
}

/// Maps flow nodes to dense graph indices.
#[derive(Debug, Clone)]
struct NodeIndex {
    statements: usize,
    exits: HashMap<StatementId, usize>,
}

impl NodeIndex {
    fn get(&self, node: FlowNode) -> Option<NodeId> {
        match node {
            FlowNode::Entry(stmt) => Some(NodeId::new(stmt.index() * 2)),
            FlowNode::End(stmt) => Some(NodeId::new(stmt.index() * 2 + 1)),
            FlowNode::MethodExit(root) => self
                .exits
                .get(&root)
                .map(|slot| NodeId::new(self.statements * 2 + slot)),
        }
    }

    fn entry(&self, stmt: StatementId) -> NodeId {
        NodeId::new(stmt.index() * 2)
    }

    fn end(&self, stmt: StatementId) -> NodeId {
        NodeId::new(stmt.index() * 2 + 1)
    }
}

/// The result of the reachability fixpoint for one method body.
#[derive(Debug, Clone)]
pub struct Reachability {
    reachable: BitSet,
    index: NodeIndex,
    expanded: usize,
}

impl Reachability {
    /// A result in which nothing is reachable.
    pub(crate) fn empty() -> Self {
        Reachability {
            reachable: BitSet::new(0),
            index: NodeIndex {
                statements: 0,
                exits: HashMap::new(),
            },
            expanded: 0,
        }
    }

    /// Builds the flow graph and runs the fixpoint.
    ///
    /// `methods` lists the root of the outer method followed by every lambda body; each is
    /// an independent entry point. `routes` are the already-resolved jumps.
    pub(crate) fn compute(
        body: &MethodBody,
        methods: &[StatementId],
        routes: &[Route],
    ) -> Result<Self> {
        let index = NodeIndex {
            statements: body.len(),
            exits: methods
                .iter()
                .enumerate()
                .map(|(slot, &root)| (root, slot))
                .collect(),
        };

        let mut graph: DirectedGraph<FlowNode, FlowEdgeKind> =
            DirectedGraph::with_capacity(body.len() * 2 + methods.len(), body.len() * 3);
        for stmt in body.iter() {
            graph.add_node(FlowNode::Entry(stmt.id()));
            graph.add_node(FlowNode::End(stmt.id()));
        }
        for &root in methods {
            graph.add_node(FlowNode::MethodExit(root));
        }

        let mut pending = Vec::new();
        for stmt in body.iter() {
            add_statement_edges(&mut graph, &mut pending, &index, body, stmt.id())?;
        }

        for route in routes {
            let Some(to) = index.get(route.target) else {
                return Err(malformed_region!(
                    "jump {} targets {} outside any method",
                    route.source,
                    route.target
                ));
            };
            pending.push(PendingEdge {
                from: index.entry(route.source),
                to,
                kind: FlowEdgeKind::Jump,
                requires: route.requires.iter().map(|&f| index.end(f)).collect(),
            });
        }

        for &root in methods {
            if let Some(exit) = index.get(FlowNode::MethodExit(root)) {
                graph.add_edge(index.end(root), exit, FlowEdgeKind::Sequential)?;
            }
        }

        // Each pending edge counts the crossed handler ends it still waits for
        let mut missing = Vec::with_capacity(pending.len());
        let mut waiting: HashMap<NodeId, Vec<usize>> = HashMap::new();
        let mut ready = Vec::new();
        for (slot, edge) in pending.iter().enumerate() {
            missing.push(edge.requires.len());
            if edge.requires.is_empty() {
                ready.push(slot);
            }
            for &node in &edge.requires {
                waiting.entry(node).or_default().push(slot);
            }
        }

        let mut walk = Dfs::new(&graph);
        for &root in methods {
            walk.push(index.entry(root));
        }

        let mut admitted = 0;
        loop {
            for slot in ready.drain(..) {
                let edge = &pending[slot];
                let id: EdgeId = graph.add_edge(edge.from, edge.to, edge.kind)?;
                admitted += 1;
                let endpoints = (graph.edge_endpoints(id), graph.edge(id));
                if let (Some((from, to)), Some(kind)) = endpoints {
                    log::trace!(
                        "admitted {} {:?} edge {} -> {}",
                        id,
                        kind,
                        graph.node(from).map_or_else(String::new, ToString::to_string),
                        graph.node(to).map_or_else(String::new, ToString::to_string)
                    );
                }
                // Sources still undiscovered pick the edge up when the walk expands them
                if walk.is_discovered(edge.from) {
                    walk.push(edge.to);
                }
            }

            let Some(node) = walk.next(&graph) else {
                break;
            };
            if let Some(slots) = waiting.remove(&node) {
                for slot in slots {
                    missing[slot] -= 1;
                    if missing[slot] == 0 {
                        ready.push(slot);
                    }
                }
            }
        }

        let expanded = walk.expanded();
        let reachable = walk.into_discovered();
        log::trace!(
            "reachability: {} of {} flow nodes live over {} edges, {}/{} guarded edges admitted",
            reachable.count(),
            graph.node_count(),
            graph.edge_count(),
            admitted,
            pending.len()
        );

        Ok(Reachability {
            reachable,
            index,
            expanded,
        })
    }

    /// Returns `true` if `node` can be reached from a method entry.
    #[must_use]
    pub fn contains(&self, node: FlowNode) -> bool {
        self.index
            .get(node)
            .is_some_and(|id| self.reachable.contains(id.index()))
    }

    /// Returns `true` if `stmt` can start executing.
    #[must_use]
    pub fn is_reachable(&self, stmt: StatementId) -> bool {
        self.contains(FlowNode::Entry(stmt))
    }

    /// Returns `true` if `stmt` can complete normally.
    #[must_use]
    pub fn completes(&self, stmt: StatementId) -> bool {
        self.contains(FlowNode::End(stmt))
    }

    /// Returns the number of flow nodes the marking walk expanded.
    ///
    /// Admitting a guarded edge resumes the walk instead of restarting it, so this never
    /// exceeds the number of flow nodes.
    #[must_use]
    pub fn expanded(&self) -> usize {
        self.expanded
    }
}

fn add_statement_edges(
    graph: &mut DirectedGraph<FlowNode, FlowEdgeKind>,
    pending: &mut Vec<PendingEdge>,
    index: &NodeIndex,
    body: &MethodBody,
    id: StatementId,
) -> Result<()> {
    let entry = index.entry(id);
    let end = index.end(id);

    match body.kind(id) {
        StatementKind::Block(stmts) => {
            let mut previous = entry;
            for &child in stmts {
                graph.add_edge(previous, index.entry(child), FlowEdgeKind::Sequential)?;
                previous = index.end(child);
            }
            graph.add_edge(previous, end, FlowEdgeKind::Sequential)?;
        }
        StatementKind::Expression { .. } | StatementKind::Lambda { .. } => {
            graph.add_edge(entry, end, FlowEdgeKind::Sequential)?;
        }
        StatementKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            if *condition != Condition::Never {
                graph.add_edge(entry, index.entry(*then_branch), FlowEdgeKind::Conditional)?;
            }
            if *condition != Condition::Always {
                let target = else_branch.map_or(end, |e| index.entry(e));
                graph.add_edge(entry, target, FlowEdgeKind::Conditional)?;
            }
            graph.add_edge(index.end(*then_branch), end, FlowEdgeKind::Sequential)?;
            if let Some(else_branch) = else_branch {
                graph.add_edge(index.end(*else_branch), end, FlowEdgeKind::Sequential)?;
            }
        }
        StatementKind::Try(try_stmt) => {
            graph.add_edge(entry, index.entry(try_stmt.body), FlowEdgeKind::Sequential)?;

            let requires = match try_stmt.finally {
                Some(clause) => {
                    graph.add_edge(entry, index.entry(clause.body), FlowEdgeKind::Handler)?;
                    match clause.kind {
                        HandlerKind::Finally => vec![index.end(clause.body)],
                        HandlerKind::Fault => Vec::new(),
                    }
                }
                None => Vec::new(),
            };

            let mut completions = vec![try_stmt.body];
            for clause in &try_stmt.catches {
                graph.add_edge(entry, index.entry(clause.body), FlowEdgeKind::Handler)?;
                completions.push(clause.body);
            }
            for protected in completions {
                pending.push(PendingEdge {
                    from: index.end(protected),
                    to: end,
                    kind: FlowEdgeKind::Completion,
                    requires: requires.clone(),
                });
            }
        }
        StatementKind::Labeled { body: inner, .. }
        | StatementKind::Synthetic { body: inner, .. } => {
            graph.add_edge(entry, index.entry(*inner), FlowEdgeKind::Sequential)?;
            graph.add_edge(index.end(*inner), end, FlowEdgeKind::Sequential)?;
        }
        StatementKind::Loop {
            condition,
            body: inner,
        } => {
            if *condition != Condition::Never {
                graph.add_edge(entry, index.entry(*inner), FlowEdgeKind::Conditional)?;
            }
            if *condition != Condition::Always {
                graph.add_edge(entry, end, FlowEdgeKind::Conditional)?;
            }
            graph.add_edge(index.end(*inner), entry, FlowEdgeKind::BackEdge)?;
        }
        StatementKind::Switch { sections, default } => {
            for &section in sections {
                graph.add_edge(entry, index.entry(section), FlowEdgeKind::Conditional)?;
                graph.add_edge(index.end(section), end, FlowEdgeKind::Sequential)?;
            }
            if default.is_none() {
                graph.add_edge(entry, end, FlowEdgeKind::Conditional)?;
            }
        }
        // Jumps are routed separately; throws never complete
        StatementKind::Goto(_)
        | StatementKind::Break
        | StatementKind::Continue
        | StatementKind::Return
        | StatementKind::Throw
        | StatementKind::Rethrow => {}
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::MethodBodyBuilder;

    #[test]
    fn test_straight_line_is_reachable() {
        let mut b = MethodBodyBuilder::new();
        let e1 = b.expression(&[]);
        let e2 = b.expression(&[]);
        let root = b.block(vec![e1, e2]);
        let body = b.finish(root).unwrap();

        let reach = Reachability::compute(&body, &[root], &[]).unwrap();
        assert!(reach.is_reachable(e2));
        assert!(reach.completes(root));
        assert!(reach.contains(FlowNode::MethodExit(root)));
    }

    #[test]
    fn test_code_after_throw_is_dead() {
        let mut b = MethodBodyBuilder::new();
        let throw = b.throw_stmt();
        let after = b.expression(&[]);
        let root = b.block(vec![throw, after]);
        let body = b.finish(root).unwrap();

        let reach = Reachability::compute(&body, &[root], &[]).unwrap();
        assert!(reach.is_reachable(throw));
        assert!(!reach.completes(throw));
        assert!(!reach.is_reachable(after));
        assert!(!reach.contains(FlowNode::MethodExit(root)));
    }

    #[test]
    fn test_infinite_loop_never_completes() {
        let mut b = MethodBodyBuilder::new();
        let inner = b.block(vec![]);
        let looped = b.loop_stmt(Condition::Always, inner);
        let root = b.block(vec![looped]);
        let body = b.finish(root).unwrap();

        let reach = Reachability::compute(&body, &[root], &[]).unwrap();
        assert!(reach.is_reachable(inner));
        assert!(!reach.completes(looped));
    }

    #[test]
    fn test_try_completion_waits_for_finally() {
        // try { } finally { for (;;) { } } after;
        let mut b = MethodBodyBuilder::new();
        let try_body = b.block(vec![]);
        let spin_body = b.block(vec![]);
        let spin = b.loop_stmt(Condition::Always, spin_body);
        let handler = b.block(vec![spin]);
        let try_stmt = b.try_finally(try_body, handler);
        let after = b.expression(&[]);
        let root = b.block(vec![try_stmt, after]);
        let body = b.finish(root).unwrap();

        let reach = Reachability::compute(&body, &[root], &[]).unwrap();
        assert!(reach.completes(try_body));
        assert!(reach.is_reachable(handler));
        assert!(!reach.completes(try_stmt));
        assert!(!reach.is_reachable(after));
    }

    #[test]
    fn test_routed_jump_needs_every_crossed_finally() {
        let mut b = MethodBodyBuilder::new();
        let label = b.label();
        let jump = b.goto_stmt(label);
        let try_body = b.block(vec![jump]);
        let handler = b.block(vec![]);
        let try_stmt = b.try_finally(try_body, handler);
        let target = b.expression(&[]);
        let labeled = b.labeled(label, target);
        let root = b.block(vec![try_stmt, labeled]);
        let body = b.finish(root).unwrap();

        let route = Route {
            source: jump,
            target: FlowNode::Entry(labeled),
            requires: vec![handler],
        };
        let reach = Reachability::compute(&body, &[root], &[route]).unwrap();
        assert!(reach.is_reachable(target));
        assert!(reach.completes(handler));
        assert!(!reach.completes(try_stmt));
    }

    #[test]
    fn test_long_finally_chain_expands_each_node_once() {
        // try { f(); } finally { } repeated, each completion waiting on its own finally
        let mut b = MethodBodyBuilder::new();
        let mut stmts = Vec::new();
        for _ in 0..1000 {
            let f = b.expression(&[]);
            let try_body = b.block(vec![f]);
            let handler = b.block(vec![]);
            stmts.push(b.try_finally(try_body, handler));
        }
        let last = *stmts.last().unwrap();
        let root = b.block(stmts);
        let body = b.finish(root).unwrap();

        let reach = Reachability::compute(&body, &[root], &[]).unwrap();
        assert!(reach.completes(last));
        assert!(reach.contains(FlowNode::MethodExit(root)));
        assert!(reach.expanded() <= body.len() * 2 + 1);
    }

    #[test]
    fn test_fault_does_not_block_completion() {
        let mut b = MethodBodyBuilder::new();
        let try_body = b.block(vec![]);
        let throw = b.throw_stmt();
        let handler = b.block(vec![throw]);
        let try_stmt = b.try_fault(try_body, handler);
        let root = b.block(vec![try_stmt]);
        let body = b.finish(root).unwrap();

        let reach = Reachability::compute(&body, &[root], &[]).unwrap();
        assert!(!reach.completes(handler));
        assert!(reach.completes(try_stmt));
    }
}
