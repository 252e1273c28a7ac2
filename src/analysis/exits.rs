//! Exit edges of protected scopes.
//!
//! For a protected scope R, [`ExitAnalyzer`] finds every way control can leave R other than
//! by an exception: jumps whose target lies outside R, returns, rethrows from the catch
//! handler that owns them, and normal completion at the end of R. Each is reported as an
//! [`ExitEdge`]. Only [`ExitKind::Leave`] edges cross the boundary in the sense that matters
//! to the emitter, since they are the ones that must be compiled as a structured `leave`
//! and that keep a synthetic `finally` alive.
//!
//! # Examples
//!
//! ```rust
//! use ehscope::{
//!     analysis::{ControlFlowGraph, ExitAnalyzer, ExitKind, ExitQuery, ExitTarget},
//!     body::{Condition, MethodBodyBuilder},
//! };
//!
//! // while (true) { try { break; } finally { } }
//! let mut b = MethodBodyBuilder::new();
//! let brk = b.break_stmt();
//! let try_body = b.block(vec![brk]);
//! let handler = b.block(vec![]);
//! let try_stmt = b.try_finally(try_body, handler);
//! let loop_body = b.block(vec![try_stmt]);
//! let looped = b.loop_stmt(Condition::Always, loop_body);
//! let root = b.block(vec![looped]);
//! let body = b.finish(root)?;
//!
//! let cfg = ControlFlowGraph::new(&body)?;
//! let exits = ExitAnalyzer::new(&cfg).analyze(&ExitQuery::scope(try_body, try_stmt))?;
//!
//! let leaves: Vec<_> = exits.leaves().collect();
//! assert_eq!(leaves.len(), 1);
//! assert_eq!(leaves[0].target, ExitTarget::BreakOf(looped));
//! assert_eq!(leaves[0].kind, ExitKind::Leave);
//! # Ok::<(), ehscope::Error>(())
//! ```

use std::fmt;

use strum::{Display, EnumIter};

use crate::{
    analysis::cfg::{ControlFlowGraph, JumpTarget},
    body::{LabelId, StatementId, StatementKind},
    Result,
};

/// How control leaves a protected scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum ExitKind {
    /// A `goto`, `break`, `continue` or `return` whose target is outside the scope.
    Leave,
    /// A `throw;` rethrowing the exception caught by the scope.
    Rethrow,
    /// Normal completion at the end of the scope.
    FallThrough,
}

/// Where an exit edge arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExitTarget {
    /// The statement labeled with the given label.
    Label(LabelId),
    /// The point after the given loop or switch.
    BreakOf(StatementId),
    /// The condition test of the given loop.
    ContinueOf(StatementId),
    /// The point after the given statement.
    EndOf(StatementId),
    /// The method epilogue.
    MethodExit,
    /// The next enclosing exception handler.
    Unwind,
}

impl From<JumpTarget> for ExitTarget {
    fn from(target: JumpTarget) -> Self {
        match target {
            JumpTarget::Label { label, .. } => ExitTarget::Label(label),
            JumpTarget::Break(construct) => ExitTarget::BreakOf(construct),
            JumpTarget::Continue(construct) => ExitTarget::ContinueOf(construct),
            JumpTarget::Return(_) => ExitTarget::MethodExit,
        }
    }
}

impl fmt::Display for ExitTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExitTarget::Label(label) => write!(f, "{label}"),
            ExitTarget::BreakOf(stmt) => write!(f, "break({stmt})"),
            ExitTarget::ContinueOf(stmt) => write!(f, "continue({stmt})"),
            ExitTarget::EndOf(stmt) => write!(f, "end({stmt})"),
            ExitTarget::MethodExit => f.write_str("return"),
            ExitTarget::Unwind => f.write_str("unwind"),
        }
    }
}

/// One way control leaves a protected scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExitEdge {
    /// The statement transferring control; the scope itself for fall-through edges.
    pub source: StatementId,
    /// Where control arrives.
    pub target: ExitTarget,
    /// How the edge leaves the scope.
    pub kind: ExitKind,
    /// Whether the target can be reached on any path.
    ///
    /// A live jump whose target is dead (for example a `goto` past a `finally` that never
    /// completes) is still recorded, with this flag cleared.
    pub target_reachable: bool,
}

impl fmt::Display for ExitEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            ExitKind::Leave => "leave",
            ExitKind::Rethrow => "rethrow",
            ExitKind::FallThrough => "fallthrough",
        };
        write!(f, "{} -{}-> {}", self.source, kind, self.target)?;
        if !self.target_reachable {
            f.write_str(" (dead)")?;
        }
        Ok(())
    }
}

/// The exit edges of one scope, in document order of their sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExitSet {
    edges: Vec<ExitEdge>,
}

impl ExitSet {
    /// Returns all edges.
    #[must_use]
    pub fn edges(&self) -> &[ExitEdge] {
        &self.edges
    }

    /// Iterates over all edges.
    pub fn iter(&self) -> impl Iterator<Item = &ExitEdge> + '_ {
        self.edges.iter()
    }

    /// Returns the number of edges of every kind.
    #[must_use]
    pub fn len(&self) -> usize {
        self.edges.len()
    }

    /// Returns `true` if the scope has no edges of any kind.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Iterates over the [`ExitKind::Leave`] edges, the ones that cross the boundary.
    pub fn leaves(&self) -> impl Iterator<Item = &ExitEdge> + '_ {
        self.edges.iter().filter(|e| e.kind == ExitKind::Leave)
    }

    /// Returns `true` if no `Leave` edge crosses the boundary.
    #[must_use]
    pub fn is_exitless(&self) -> bool {
        self.leaves().next().is_none()
    }

    /// Returns `true` if the scope can complete normally.
    #[must_use]
    pub fn falls_through(&self) -> bool {
        self.edges.iter().any(|e| e.kind == ExitKind::FallThrough)
    }

    /// Returns `true` if the scope contains a `throw;` it owns.
    #[must_use]
    pub fn rethrows(&self) -> bool {
        self.edges.iter().any(|e| e.kind == ExitKind::Rethrow)
    }
}

impl<'s> IntoIterator for &'s ExitSet {
    type Item = &'s ExitEdge;
    type IntoIter = std::slice::Iter<'s, ExitEdge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

/// Describes the scope whose exits [`ExitAnalyzer::analyze`] should compute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExitQuery {
    /// Statements whose subtrees are searched for exits, in document order.
    pub sources: Vec<StatementId>,
    /// The scope a jump target must lie in to stay inside.
    pub boundary: StatementId,
    /// The statement whose end a normal completion falls through to.
    pub continuation: StatementId,
    /// The catch handler body whose `throw;` statements count as rethrow exits.
    pub rethrow_owner: Option<StatementId>,
}

impl ExitQuery {
    /// Queries a single scope completing into the end of `continuation`.
    #[must_use]
    pub fn scope(scope: StatementId, continuation: StatementId) -> Self {
        ExitQuery {
            sources: vec![scope],
            boundary: scope,
            continuation,
            rethrow_owner: None,
        }
    }

    /// Queries several sibling scopes treated as one, such as a `try` body with its catches.
    #[must_use]
    pub fn composite(
        sources: Vec<StatementId>,
        boundary: StatementId,
        continuation: StatementId,
    ) -> Self {
        ExitQuery {
            sources,
            boundary,
            continuation,
            rethrow_owner: None,
        }
    }

    /// Counts `throw;` statements owned by `catch_body` as rethrow exits.
    #[must_use]
    pub fn with_rethrow_owner(mut self, catch_body: StatementId) -> Self {
        self.rethrow_owner = Some(catch_body);
        self
    }
}

/// Computes exit edges over a [`ControlFlowGraph`].
#[derive(Debug, Clone, Copy)]
pub struct ExitAnalyzer<'c, 'a> {
    cfg: &'c ControlFlowGraph<'a>,
}

impl<'c, 'a> ExitAnalyzer<'c, 'a> {
    /// Creates an analyzer over `cfg`.
    #[must_use]
    pub fn new(cfg: &'c ControlFlowGraph<'a>) -> Self {
        ExitAnalyzer { cfg }
    }

    /// Computes the exit edges of the scope described by `query`.
    ///
    /// Sources are traversed in document order and lambda bodies are skipped, since a jump
    /// inside a lambda never leaves the enclosing method's regions. Statements that can
    /// never execute produce no edge.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatement`](crate::Error::UnknownStatement) if any statement
    /// named by `query` does not belong to the analyzed body.
    pub fn analyze(&self, query: &ExitQuery) -> Result<ExitSet> {
        let body = self.cfg.body();
        let named = query.sources.iter().chain([&query.boundary, &query.continuation]);
        for &stmt in named.chain(query.rethrow_owner.as_ref()) {
            body.statement(stmt)?;
        }

        let mut edges = Vec::new();

        for &source in &query.sources {
            let mut stack = vec![source];
            while let Some(stmt) = stack.pop() {
                let kind = body.kind(stmt);
                match kind {
                    StatementKind::Lambda { .. } => continue,
                    StatementKind::Rethrow => {
                        if query.rethrow_owner.is_some()
                            && self.cfg.is_reachable(stmt)
                            && self.cfg.innermost_catch(stmt) == query.rethrow_owner
                        {
                            edges.push(ExitEdge {
                                source: stmt,
                                target: ExitTarget::Unwind,
                                kind: ExitKind::Rethrow,
                                target_reachable: true,
                            });
                        }
                    }
                    _ if kind.is_jump() => {
                        if let Some(edge) = self.jump_exit(stmt, query.boundary) {
                            log::trace!("exit of {}: {}", query.boundary, edge);
                            edges.push(edge);
                        }
                    }
                    _ => {}
                }
                stack.extend(kind.children().into_iter().rev());
            }
        }

        if query.sources.iter().any(|&s| self.cfg.completes(s)) {
            edges.push(ExitEdge {
                source: query.boundary,
                target: ExitTarget::EndOf(query.continuation),
                kind: ExitKind::FallThrough,
                target_reachable: self.cfg.completes(query.continuation),
            });
        }

        Ok(ExitSet { edges })
    }

    fn jump_exit(&self, jump: StatementId, boundary: StatementId) -> Option<ExitEdge> {
        if !self.cfg.is_reachable(jump) {
            log::trace!("ignoring dead jump {jump}");
            return None;
        }

        let target = self.cfg.jump_target(jump)?;
        let leaves = match target {
            JumpTarget::Return(_) => true,
            other => !self.cfg.contains(boundary, other.scope()),
        };

        leaves.then(|| ExitEdge {
            source: jump,
            target: ExitTarget::from(*target),
            kind: ExitKind::Leave,
            target_reachable: self.cfg.target_reachable(jump),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::{CatchClause, Condition, MethodBodyBuilder};

    #[test]
    fn test_internal_goto_is_not_an_exit() {
        let mut b = MethodBodyBuilder::new();
        let label = b.label();
        let target = b.expression(&[]);
        let labeled = b.labeled(label, target);
        let jump = b.goto_stmt(label);
        let try_body = b.block(vec![labeled, jump]);
        let handler = b.block(vec![]);
        let try_stmt = b.try_finally(try_body, handler);
        let root = b.block(vec![try_stmt]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();

        let exits = ExitAnalyzer::new(&cfg)
            .analyze(&ExitQuery::scope(try_body, try_stmt))
            .unwrap();
        assert!(exits.is_exitless());
        assert_eq!(exits.len(), 0);
    }

    #[test]
    fn test_return_always_leaves() {
        let mut b = MethodBodyBuilder::new();
        let ret = b.return_stmt();
        let try_body = b.block(vec![ret]);
        let handler = b.block(vec![]);
        let try_stmt = b.try_finally(try_body, handler);
        let root = b.block(vec![try_stmt]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();

        let exits = ExitAnalyzer::new(&cfg)
            .analyze(&ExitQuery::scope(try_body, try_stmt))
            .unwrap();
        let leaves: Vec<_> = exits.leaves().copied().collect();
        assert_eq!(
            leaves,
            vec![ExitEdge {
                source: ret,
                target: ExitTarget::MethodExit,
                kind: ExitKind::Leave,
                target_reachable: true,
            }]
        );
        assert!(!exits.falls_through());
    }

    #[test]
    fn test_dead_return_is_ignored() {
        let mut b = MethodBodyBuilder::new();
        let throw = b.throw_stmt();
        let ret = b.return_stmt();
        let try_body = b.block(vec![throw, ret]);
        let handler = b.block(vec![]);
        let try_stmt = b.try_finally(try_body, handler);
        let root = b.block(vec![try_stmt]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();

        let exits = ExitAnalyzer::new(&cfg)
            .analyze(&ExitQuery::scope(try_body, try_stmt))
            .unwrap();
        assert!(exits.is_empty());
    }

    #[test]
    fn test_lambda_bodies_are_skipped() {
        let mut b = MethodBodyBuilder::new();
        let ret = b.return_stmt();
        let lambda_body = b.block(vec![ret]);
        let lambda = b.lambda(lambda_body);
        let try_body = b.block(vec![lambda]);
        let handler = b.block(vec![]);
        let try_stmt = b.try_finally(try_body, handler);
        let root = b.block(vec![try_stmt]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();

        let exits = ExitAnalyzer::new(&cfg)
            .analyze(&ExitQuery::scope(try_body, try_stmt))
            .unwrap();
        assert!(exits.is_exitless());
        assert!(exits.falls_through());
    }

    #[test]
    fn test_goto_past_divergent_finally_is_recorded_dead() {
        let mut b = MethodBodyBuilder::new();
        let label = b.label();
        let jump = b.goto_stmt(label);
        let try_body = b.block(vec![jump]);
        let spin_body = b.block(vec![]);
        let spin = b.loop_stmt(Condition::Always, spin_body);
        let handler = b.block(vec![spin]);
        let try_stmt = b.try_finally(try_body, handler);
        let call = b.expression(&[]);
        let labeled = b.labeled(label, call);
        let root = b.block(vec![try_stmt, labeled]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();

        let exits = ExitAnalyzer::new(&cfg)
            .analyze(&ExitQuery::scope(try_body, try_stmt))
            .unwrap();
        let leaves: Vec<_> = exits.leaves().collect();
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].target, ExitTarget::Label(label));
        assert!(!leaves[0].target_reachable);
    }

    #[test]
    fn test_statement_from_another_body_is_rejected() {
        let mut b = MethodBodyBuilder::new();
        let f = b.expression(&[]);
        let root = b.block(vec![f]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();
        let analyzer = ExitAnalyzer::new(&cfg);
        let foreign = StatementId::new(7);

        assert!(matches!(
            analyzer.analyze(&ExitQuery::scope(foreign, root)),
            Err(crate::Error::UnknownStatement(id)) if id == foreign
        ));
        assert!(analyzer.analyze(&ExitQuery::scope(root, foreign)).is_err());
        assert!(analyzer
            .analyze(&ExitQuery::scope(root, root).with_rethrow_owner(foreign))
            .is_err());
        assert!(analyzer.analyze(&ExitQuery::scope(root, root)).is_ok());
    }

    #[test]
    fn test_rethrow_belongs_to_owning_catch() {
        let mut b = MethodBodyBuilder::new();
        let try_body = b.block(vec![]);
        let rethrow = b.rethrow_stmt();
        let handler = b.block(vec![rethrow]);
        let try_stmt = b.try_catch(try_body, vec![CatchClause::new(handler)]);
        let root = b.block(vec![try_stmt]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();
        let analyzer = ExitAnalyzer::new(&cfg);

        let owned = analyzer
            .analyze(&ExitQuery::scope(handler, try_stmt).with_rethrow_owner(handler))
            .unwrap();
        assert!(owned.rethrows());
        assert!(owned.is_exitless());

        let unowned = analyzer.analyze(&ExitQuery::scope(handler, try_stmt)).unwrap();
        assert!(!unowned.rethrows());
    }

    #[test]
    fn test_continue_to_enclosing_loop_leaves() {
        let mut b = MethodBodyBuilder::new();
        let cont = b.continue_stmt();
        let user = b.block(vec![cont]);
        let using = b.using(user);
        let looped = b.loop_stmt(Condition::Unknown, using);
        let root = b.block(vec![looped]);
        let body = b.finish(root).unwrap();
        let cfg = ControlFlowGraph::new(&body).unwrap();

        let exits = ExitAnalyzer::new(&cfg)
            .analyze(&ExitQuery::scope(user, using))
            .unwrap();
        let edge = exits.leaves().next().copied().unwrap();
        assert_eq!(edge.target, ExitTarget::ContinueOf(looped));
        assert_eq!(edge.to_string(), format!("{cont} -leave-> continue({looped})"));
    }
}
