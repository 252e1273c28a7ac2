//! The lexical control flow graph of one method body.
//!
//! This module provides [`ControlFlowGraph`], which answers the three questions the region
//! builder asks about a statement tree: does one scope contain another, where does a jump go,
//! and can a statement execute or complete at all.

use std::collections::HashMap;

use crate::{
    analysis::cfg::{
        reachability::{Reachability, Route},
        FlowNode,
    },
    body::{HandlerKind, LabelId, MethodBody, StatementId, StatementKind, SyntheticKind},
    Error, Result,
};

/// The part a statement plays inside its parent's exception-handling construct.
///
/// Only the direct children of `try`, synthetic and lambda statements have a role; every
/// other statement is an ordinary nested statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScopeRole {
    /// The protected body of a `try`.
    TryBody,
    /// The handler body of the catch clause at the given index.
    CatchBody(usize),
    /// The `finally` or `fault` handler body.
    Handler(HandlerKind),
    /// The protected body of a desugared `using`/`lock`/`fixed`/`foreach`.
    SyntheticBody(SyntheticKind),
    /// The body of a lambda, which starts a separate method.
    LambdaBody,
}

impl ScopeRole {
    /// Returns `true` if the scope is a protected region or handler of the exception model.
    #[must_use]
    pub const fn is_protected(&self) -> bool {
        !matches!(self, ScopeRole::LambdaBody)
    }
}

/// The resolved target of a `goto`, `break`, `continue` or `return`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JumpTarget {
    /// `goto label`, arriving at the labeled statement.
    Label {
        /// The label named by the jump.
        label: LabelId,
        /// The `Labeled` statement defining it.
        statement: StatementId,
    },
    /// `break`, arriving after the given loop or switch.
    Break(StatementId),
    /// `continue`, arriving at the condition test of the given loop.
    Continue(StatementId),
    /// `return`, leaving the method whose root is the given statement.
    Return(StatementId),
}

impl JumpTarget {
    /// Returns the lexical scope the jump lands in.
    ///
    /// A jump leaves a region exactly when the region does not contain this scope.
    #[must_use]
    pub const fn scope(&self) -> StatementId {
        match self {
            JumpTarget::Label { statement, .. } => *statement,
            JumpTarget::Break(construct)
            | JumpTarget::Continue(construct)
            | JumpTarget::Return(construct) => *construct,
        }
    }

    /// Returns the flow node control arrives at.
    #[must_use]
    pub const fn flow_node(&self) -> FlowNode {
        match self {
            JumpTarget::Label { statement, .. } => FlowNode::Entry(*statement),
            JumpTarget::Break(construct) => FlowNode::End(*construct),
            JumpTarget::Continue(construct) => FlowNode::Entry(*construct),
            JumpTarget::Return(root) => FlowNode::MethodExit(*root),
        }
    }
}

/// Containment, jump resolution and reachability for one method body.
///
/// Construction numbers the statement tree once in pre- and post-order so that
/// [`contains`](Self::contains) is two integer comparisons, resolves every jump, checks that
/// no jump enters a protected scope or leaves a handler, and finally runs the reachability
/// fixpoint.
///
/// # Examples
///
/// ```rust
/// use ehscope::{analysis::ControlFlowGraph, body::MethodBodyBuilder};
///
/// let mut b = MethodBodyBuilder::new();
/// let ret = b.return_stmt();
/// let try_body = b.block(vec![ret]);
/// let handler = b.block(vec![]);
/// let try_stmt = b.try_finally(try_body, handler);
/// let root = b.block(vec![try_stmt]);
/// let body = b.finish(root)?;
///
/// let cfg = ControlFlowGraph::new(&body)?;
/// assert!(cfg.contains(try_stmt, ret));
/// assert!(!cfg.contains(ret, try_stmt));
/// assert!(cfg.target_reachable(ret));
/// # Ok::<(), ehscope::Error>(())
/// ```
#[derive(Debug)]
pub struct ControlFlowGraph<'a> {
    body: &'a MethodBody,
    /// Pre-order number per statement.
    pre: Vec<usize>,
    /// Post-order number per statement.
    post: Vec<usize>,
    /// Root of the method (outer or lambda) each statement belongs to.
    method_of: Vec<StatementId>,
    /// The outer method root followed by every lambda body.
    methods: Vec<StatementId>,
    targets: HashMap<StatementId, JumpTarget>,
    reachability: Reachability,
}

impl<'a> ControlFlowGraph<'a> {
    /// Analyzes `body`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedRegion`] if:
    /// - a `break` or `continue` has no enclosing loop or switch inside its method
    /// - a `goto` crosses a lambda boundary or jumps into a protected scope
    /// - a jump or `return` leaves a `finally`/`fault` handler
    /// - a `throw;` is not inside a catch handler of its own method
    ///
    /// Returns [`Error::UnresolvedLabel`] if a `goto` names an undefined label.
    pub fn new(body: &'a MethodBody) -> Result<Self> {
        let len = body.len();
        let mut cfg = ControlFlowGraph {
            body,
            pre: vec![0; len],
            post: vec![0; len],
            method_of: vec![body.root(); len],
            methods: Vec::new(),
            targets: HashMap::new(),
            reachability: Reachability::empty(),
        };
        cfg.number();

        let mut routes = Vec::new();
        for stmt in body.iter() {
            let id = stmt.id();
            match stmt.kind() {
                kind if kind.is_jump() => {
                    let target = cfg.resolve(id)?;
                    let requires = cfg.check_jump(id, &target)?;
                    cfg.targets.insert(id, target);
                    routes.push(Route {
                        source: id,
                        target: target.flow_node(),
                        requires,
                    });
                }
                StatementKind::Rethrow => {
                    if cfg.innermost_catch(id).is_none() {
                        return Err(malformed_region!(
                            "rethrow {} is not directly inside a catch handler",
                            id
                        ));
                    }
                }
                _ => {}
            }
        }

        cfg.reachability = Reachability::compute(body, &cfg.methods, &routes)?;
        log::trace!(
            "control flow graph: {} statements, {} methods, {} jumps",
            len,
            cfg.methods.len(),
            routes.len()
        );
        Ok(cfg)
    }

    /// Assigns pre/post numbers and method membership with an explicit stack.
    fn number(&mut self) {
        let root = self.body.root();
        self.methods.push(root);
        self.methods.extend(self.body.lambda_bodies());

        let mut counter = 0;
        let mut stack = vec![(root, false)];
        while let Some((id, finished)) = stack.pop() {
            if finished {
                self.post[id.index()] = counter;
                counter += 1;
                continue;
            }

            self.pre[id.index()] = counter;
            counter += 1;
            stack.push((id, true));

            let kind = self.body.kind(id);
            let method = match kind {
                StatementKind::Lambda { body } => Some(*body),
                _ => None,
            };
            for child in kind.children().into_iter().rev() {
                self.method_of[child.index()] = method.unwrap_or(self.method_of[id.index()]);
                stack.push((child, false));
            }
        }
    }

    fn resolve(&self, jump: StatementId) -> Result<JumpTarget> {
        let nearest = |accept: fn(&StatementKind) -> bool| {
            self.body
                .ancestors(jump)
                .take_while(|&a| !matches!(self.body.kind(a), StatementKind::Lambda { .. }))
                .find(|&a| accept(self.body.kind(a)))
        };

        match self.body.kind(jump) {
            StatementKind::Goto(label) => {
                let statement = self
                    .body
                    .label_target(*label)
                    .ok_or(Error::UnresolvedLabel(*label))?;
                if self.method_of(statement) != self.method_of(jump) {
                    return Err(malformed_region!(
                        "goto {} targets label {} across a lambda boundary",
                        jump,
                        label
                    ));
                }
                Ok(JumpTarget::Label {
                    label: *label,
                    statement,
                })
            }
            StatementKind::Break => nearest(|k| {
                matches!(k, StatementKind::Loop { .. } | StatementKind::Switch { .. })
            })
            .map(JumpTarget::Break)
            .ok_or_else(|| malformed_region!("break {} has no enclosing loop or switch", jump)),
            StatementKind::Continue => nearest(|k| matches!(k, StatementKind::Loop { .. }))
                .map(JumpTarget::Continue)
                .ok_or_else(|| malformed_region!("continue {} has no enclosing loop", jump)),
            StatementKind::Return => Ok(JumpTarget::Return(self.method_of(jump))),
            other => Err(malformed_region!(
                "{} statement {} is not a jump",
                other.name(),
                jump
            )),
        }
    }

    /// Checks the scopes a jump leaves and enters, returning the `finally` bodies it runs.
    fn check_jump(&self, jump: StatementId, target: &JumpTarget) -> Result<Vec<StatementId>> {
        let scope = target.scope();
        let mut requires = Vec::new();

        let mut current = jump;
        while !self.contains(current, scope) {
            match self.role(current) {
                Some(ScopeRole::Handler(kind)) => {
                    return Err(malformed_region!(
                        "{} {} leaves a {} handler",
                        self.body.kind(jump).name(),
                        jump,
                        kind
                    ));
                }
                Some(ScopeRole::TryBody | ScopeRole::CatchBody(_)) => {
                    if let Some(handler) = self.finally_of(current) {
                        requires.push(handler);
                    }
                }
                _ => {}
            }
            match self.body.parent(current) {
                Some(parent) => current = parent,
                None => break,
            }
        }

        if let JumpTarget::Label { statement, .. } = target {
            let common = current;
            let mut entered = *statement;
            while entered != common {
                if self.role(entered).is_some_and(|r| r.is_protected()) {
                    return Err(malformed_region!(
                        "goto {} jumps into protected scope {}",
                        jump,
                        entered
                    ));
                }
                match self.body.parent(entered) {
                    Some(parent) => entered = parent,
                    None => break,
                }
            }
        }

        Ok(requires)
    }

    /// Returns the `finally` body of the `try` whose protected part is `protected`.
    fn finally_of(&self, protected: StatementId) -> Option<StatementId> {
        let parent = self.body.parent(protected)?;
        match self.body.kind(parent) {
            StatementKind::Try(try_stmt) => try_stmt
                .finally
                .filter(|clause| clause.kind == HandlerKind::Finally)
                .map(|clause| clause.body),
            _ => None,
        }
    }

    /// Returns the method body being analyzed.
    #[must_use]
    pub fn body(&self) -> &'a MethodBody {
        self.body
    }

    /// Returns `true` if `inner` is `outer` or lexically nested inside it.
    ///
    /// Reflexive and antisymmetric: `contains(a, a)` always holds, and `contains(a, b)` with
    /// `contains(b, a)` implies `a == b`. Ids outside the body are contained in nothing.
    #[must_use]
    pub fn contains(&self, outer: StatementId, inner: StatementId) -> bool {
        let (o, i) = (outer.index(), inner.index());
        if o >= self.pre.len() || i >= self.pre.len() {
            return false;
        }
        self.pre[o] <= self.pre[i] && self.post[i] <= self.post[o]
    }

    /// Returns the root of the method `stmt` belongs to: the nearest enclosing lambda body,
    /// or the method root.
    #[must_use]
    pub fn method_of(&self, stmt: StatementId) -> StatementId {
        self.method_of
            .get(stmt.index())
            .copied()
            .unwrap_or(self.body.root())
    }

    /// Returns the outer method root followed by every lambda body.
    #[must_use]
    pub fn methods(&self) -> &[StatementId] {
        &self.methods
    }

    /// Returns the resolved target of a jump statement.
    #[must_use]
    pub fn jump_target(&self, jump: StatementId) -> Option<&JumpTarget> {
        self.targets.get(&jump)
    }

    /// Returns the role `stmt` plays in its parent's exception-handling construct.
    #[must_use]
    pub fn role(&self, stmt: StatementId) -> Option<ScopeRole> {
        let parent = self.body.get(stmt)?.parent()?;
        match self.body.kind(parent) {
            StatementKind::Try(try_stmt) => {
                if try_stmt.body == stmt {
                    return Some(ScopeRole::TryBody);
                }
                if let Some(idx) = try_stmt.catches.iter().position(|c| c.body == stmt) {
                    return Some(ScopeRole::CatchBody(idx));
                }
                try_stmt
                    .finally
                    .filter(|clause| clause.body == stmt)
                    .map(|clause| ScopeRole::Handler(clause.kind))
            }
            StatementKind::Synthetic { kind, .. } => Some(ScopeRole::SyntheticBody(*kind)),
            StatementKind::Lambda { .. } => Some(ScopeRole::LambdaBody),
            _ => None,
        }
    }

    /// Returns the body of the catch handler a `throw;` at `stmt` would rethrow from.
    ///
    /// `None` if `stmt` is not inside a catch handler of its own method, or if a
    /// `finally`/`fault` handler sits between it and the nearest catch.
    #[must_use]
    pub fn innermost_catch(&self, stmt: StatementId) -> Option<StatementId> {
        std::iter::once(stmt)
            .chain(self.body.ancestors(stmt))
            .find_map(|scope| match self.role(scope) {
                Some(ScopeRole::CatchBody(_)) => Some(Some(scope)),
                Some(ScopeRole::Handler(_) | ScopeRole::LambdaBody) => Some(None),
                _ => None,
            })
            .flatten()
    }

    /// Returns `true` if `stmt` can start executing.
    #[must_use]
    pub fn is_reachable(&self, stmt: StatementId) -> bool {
        self.reachability.is_reachable(stmt)
    }

    /// Returns `true` if `stmt` can complete normally.
    #[must_use]
    pub fn completes(&self, stmt: StatementId) -> bool {
        self.reachability.completes(stmt)
    }

    /// Returns `true` if the target of `jump` is reachable by any path.
    ///
    /// A jump out of a `finally`-protected body whose handler never completes has a dead
    /// target even when the jump itself is live.
    #[must_use]
    pub fn target_reachable(&self, jump: StatementId) -> bool {
        self.targets
            .get(&jump)
            .is_some_and(|target| self.reachability.contains(target.flow_node()))
    }

    /// Returns the reachability result.
    #[must_use]
    pub fn reachability(&self) -> &Reachability {
        &self.reachability
    }
}
