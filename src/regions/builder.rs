//! Construction of region trees from method bodies.
//!
//! [`RegionBuilder`] runs two passes over a method body. The first visits every synthetic
//! statement innermost first and decides whether its cleanup needs a `finally`, from the exit
//! edges of its body. The second lays the body out in document order through a
//! [`CodeLayout`], opening a region when a protected construct starts and closing it once all
//! of its children are closed. Regions are therefore numbered in pre-order and closed in
//! post-order.
//!
//! # Lowering
//!
//! | Statement                      | Regions                               |
//! |--------------------------------|---------------------------------------|
//! | `try {X} finally {Z}`          | `Finally(Try(X))`                     |
//! | `try {X} catch {Y}`            | `Try(Try(X), Catch(Y))`               |
//! | `try {X} catch {Y} finally {Z}`| `Finally(Try(Try(X), Catch(Y)))`      |
//! | `try {X} catch when (f) {Y}`   | `Try(Try(X), Filter, Catch(Y))`       |
//! | synthetic with crossing exits  | `Finally(Try(body))`, cleanup handler |
//! | synthetic without              | body, then inline cleanup             |
//!
//! User-written `finally` and `fault` handlers are never elided, whatever their exits.

use std::collections::HashMap;

use rayon::prelude::*;

use crate::{
    analysis::{
        ControlFlowGraph, ExitAnalyzer, ExitEdge, ExitQuery, ExitSet, ExitTarget, JumpTarget,
    },
    body::{
        Condition, HandlerKind, LocalId, MethodBody, StatementId, StatementKind, SyntheticKind,
        TryStatement,
    },
    codegen::{CodeLayout, Instruction, LabelKey},
    config::{BuilderConfig, SyntheticPolicy},
    regions::{CatchInfo, HandlerBounds, Region, RegionId, RegionKind, RegionOrigin, RegionTree},
    Result,
};

/// Builds [`RegionTree`]s for method bodies.
///
/// A builder holds only its configuration, so one instance can be shared across threads
/// and reused for any number of bodies.
///
/// # Examples
///
/// ```rust
/// use ehscope::{
///     body::{Condition, MethodBodyBuilder},
///     RegionBuilder, RegionKind,
/// };
///
/// // while (true) { try { break; } finally { } }
/// let mut b = MethodBodyBuilder::new();
/// let brk = b.break_stmt();
/// let try_body = b.block(vec![brk]);
/// let handler = b.block(vec![]);
/// let try_stmt = b.try_finally(try_body, handler);
/// let loop_body = b.block(vec![try_stmt]);
/// let looped = b.loop_stmt(Condition::Always, loop_body);
/// let root = b.block(vec![looped]);
/// let body = b.finish(root)?;
///
/// let tree = RegionBuilder::new().build(&body)?;
/// let finally = tree.regions_of_kind(RegionKind::Finally).next().unwrap();
/// assert_eq!(finally.exits().leaves().count(), 1);
/// println!("{tree}");
/// # Ok::<(), ehscope::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct RegionBuilder {
    config: BuilderConfig,
}

impl RegionBuilder {
    /// Creates a builder with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder with the given configuration.
    #[must_use]
    pub fn with_config(config: BuilderConfig) -> Self {
        RegionBuilder { config }
    }

    /// Returns the builder's configuration.
    #[must_use]
    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Builds the region tree of the outer method of `body`.
    ///
    /// Lambda bodies are laid out as a single closure instruction; use
    /// [`build_lambdas`](Self::build_lambdas) for their own trees.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedRegion`] if the body cannot be expressed as a valid
    /// region tree: an unresolvable `break` or `continue`, a jump into a protected scope or
    /// out of a handler, a stray `throw;`, or an exception local read outside its handler.
    /// Returns [`crate::Error::UnresolvedLabel`] for a `goto` to an undefined label.
    pub fn build(&self, body: &MethodBody) -> Result<RegionTree> {
        let cfg = ControlFlowGraph::new(body)?;
        check_exception_locals(&cfg)?;
        self.build_method(&cfg, body.root())
    }

    /// Builds one region tree per lambda body nested anywhere in `body`, in id order.
    ///
    /// # Errors
    ///
    /// Fails for the same reasons as [`build`](Self::build); an error in any lambda fails
    /// the whole call.
    pub fn build_lambdas(&self, body: &MethodBody) -> Result<Vec<RegionTree>> {
        let cfg = ControlFlowGraph::new(body)?;
        check_exception_locals(&cfg)?;
        let lambdas = cfg.methods().get(1..).unwrap_or_default();
        lambdas
            .par_iter()
            .map(|&root| self.build_method(&cfg, root))
            .collect()
    }

    /// Builds the outer method of every body in parallel.
    ///
    /// Bodies are independent, so the result at each index is exactly what
    /// [`build`](Self::build) returns for the body at that index.
    #[must_use]
    pub fn build_batch(&self, bodies: &[MethodBody]) -> Vec<Result<RegionTree>> {
        bodies.par_iter().map(|body| self.build(body)).collect()
    }

    fn build_method(&self, cfg: &ControlFlowGraph<'_>, root: StatementId) -> Result<RegionTree> {
        let decisions = self.decide(cfg, root)?;
        let tree = MethodEmitter::new(cfg, decisions).run(root)?;

        if self.config.validate {
            tree.validate()?;
        }

        log::debug!(
            "built {} regions over {} instructions for method {}",
            tree.len(),
            tree.instructions().len(),
            root
        );
        Ok(tree)
    }

    /// Decides for every synthetic statement of the method at `root` whether its cleanup
    /// gets a `finally`.
    fn decide(
        &self,
        cfg: &ControlFlowGraph<'_>,
        root: StatementId,
    ) -> Result<HashMap<StatementId, SyntheticDecision>> {
        let body = cfg.body();
        let analyzer = ExitAnalyzer::new(cfg);
        let mut decisions = HashMap::new();
        let mut stack = vec![(root, false)];

        while let Some((stmt, visited)) = stack.pop() {
            let kind = body.kind(stmt);
            if !visited {
                if matches!(kind, StatementKind::Lambda { .. }) {
                    continue;
                }
                stack.push((stmt, true));
                stack.extend(kind.children().into_iter().rev().map(|c| (c, false)));
                continue;
            }

            let StatementKind::Synthetic {
                kind: shape,
                body: inner,
            } = *kind
            else {
                continue;
            };

            let exits = analyzer.analyze(&ExitQuery::scope(inner, stmt))?;
            let crossing = exits
                .leaves()
                .filter(|edge| self.needs_cleanup(shape, edge))
                .count();
            let protect =
                self.config.policy(shape) == SyntheticPolicy::AlwaysProtect || crossing > 0;

            log::trace!(
                "{} {}: {} crossing exits, {}",
                shape,
                stmt,
                crossing,
                if protect { "protected" } else { "elided" }
            );
            decisions.insert(stmt, SyntheticDecision { protect, exits });
        }

        Ok(decisions)
    }

    fn needs_cleanup(&self, shape: SyntheticKind, edge: &ExitEdge) -> bool {
        !(shape == SyntheticKind::Fixed
            && !self.config.fixed_return_needs_cleanup
            && edge.target == ExitTarget::MethodExit)
    }
}

/// Outcome of the decision pass for one synthetic statement.
#[derive(Debug)]
struct SyntheticDecision {
    protect: bool,
    exits: ExitSet,
}

/// Lays out one method and collects its regions.
struct MethodEmitter<'c, 'a> {
    cfg: &'c ControlFlowGraph<'a>,
    analyzer: ExitAnalyzer<'c, 'a>,
    decisions: HashMap<StatementId, SyntheticDecision>,
    layout: CodeLayout,
    regions: Vec<Region>,
    /// Regions opened but not yet closed, innermost last.
    open: Vec<RegionId>,
    /// Protected bodies and handlers being emitted, innermost last.
    scopes: Vec<StatementId>,
}

impl<'c, 'a> MethodEmitter<'c, 'a> {
    fn new(
        cfg: &'c ControlFlowGraph<'a>,
        decisions: HashMap<StatementId, SyntheticDecision>,
    ) -> Self {
        MethodEmitter {
            cfg,
            analyzer: ExitAnalyzer::new(cfg),
            decisions,
            layout: CodeLayout::new(),
            regions: Vec::new(),
            open: Vec::new(),
            scopes: Vec::new(),
        }
    }

    fn run(mut self, root: StatementId) -> Result<RegionTree> {
        let method = self.open_region(RegionKind::Method, RegionOrigin::Method, root);
        self.emit(root)?;

        // A leave to the epilogue, or a branch to the end of the last statement, needs a
        // `ret` to land on.
        let end = self.layout.offset();
        if self.falls(root)
            || self.layout.is_referenced(LabelKey::MethodExit)
            || self.layout.is_branch_target(end)
        {
            self.layout.define_label(LabelKey::MethodExit)?;
            self.layout.emit(Instruction::Return);
        }

        let exits = self.analyzer.analyze(&ExitQuery::scope(root, root))?;
        self.close_region(method, exits);

        let instructions = self.layout.finish()?;
        Ok(RegionTree::new(self.regions, instructions, root))
    }

    /// Whether layout continues past `stmt`. Dead code is assumed to fall through, so a
    /// region holding only dead code still ends in its exit instruction.
    fn falls(&self, stmt: StatementId) -> bool {
        self.cfg.completes(stmt) || !self.cfg.is_reachable(stmt)
    }

    fn open_region(
        &mut self,
        kind: RegionKind,
        origin: RegionOrigin,
        statement: StatementId,
    ) -> RegionId {
        let id = RegionId::new(self.regions.len() as u32);
        let parent = self.open.last().copied();
        if let Some(parent) = parent.and_then(|p| self.regions.get_mut(p.index())) {
            parent.children.push(id);
        }

        let start = self.layout.offset();
        self.regions.push(Region {
            id,
            kind,
            origin,
            statement,
            start,
            end: start,
            parent,
            children: Vec::new(),
            handler: None,
            catch: None,
            exits: ExitSet::default(),
        });
        self.open.push(id);
        id
    }

    fn close_region(&mut self, id: RegionId, exits: ExitSet) {
        let end = self.layout.offset();
        if let Some(region) = self.regions.get_mut(id.index()) {
            region.end = end;
            region.exits = exits;
        }
        let closed = self.open.pop();
        debug_assert_eq!(closed, Some(id));
    }

    fn region_mut(&mut self, id: RegionId) -> Result<&mut Region> {
        self.regions
            .get_mut(id.index())
            .ok_or_else(|| malformed_region!("region {} was never opened", id))
    }

    fn emit(&mut self, stmt: StatementId) -> Result<()> {
        let body = self.cfg.body();
        if !self.cfg.is_reachable(stmt)
            && body.parent(stmt).is_some_and(|p| self.cfg.is_reachable(p))
        {
            log::warn!("laying out unreachable {} {}", body.kind(stmt).name(), stmt);
        }

        match body.kind(stmt) {
            StatementKind::Block(children) => {
                for &child in children {
                    self.emit(child)?;
                }
            }
            StatementKind::Expression { .. } => {
                self.layout.emit(Instruction::Code(stmt));
            }
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => self.emit_if(stmt, *then_branch, *else_branch)?,
            StatementKind::Try(try_stmt) => self.emit_try(stmt, try_stmt)?,
            StatementKind::Labeled { label, body } => {
                self.layout.define_label(LabelKey::User(*label))?;
                self.emit(*body)?;
            }
            StatementKind::Goto(_)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Return => self.emit_jump(stmt)?,
            StatementKind::Throw => {
                self.layout.emit(Instruction::Throw);
            }
            StatementKind::Rethrow => {
                self.layout.emit(Instruction::Rethrow);
            }
            StatementKind::Loop { condition, body } => {
                self.emit_loop(stmt, *condition, *body)?;
            }
            StatementKind::Switch { sections, default } => {
                self.emit_switch(stmt, sections, *default)?;
            }
            StatementKind::Synthetic { kind, body } => self.emit_synthetic(stmt, *kind, *body)?,
            StatementKind::Lambda { .. } => {
                self.layout.emit(Instruction::Closure(stmt));
            }
        }
        Ok(())
    }

    fn emit_jump(&mut self, jump: StatementId) -> Result<()> {
        let target = *self
            .cfg
            .jump_target(jump)
            .ok_or_else(|| malformed_region!("jump {} has no resolved target", jump))?;

        let label = match target {
            JumpTarget::Label { label, .. } => LabelKey::User(label),
            JumpTarget::Break(construct) => LabelKey::EndOf(construct),
            JumpTarget::Continue(construct) => LabelKey::Head(construct),
            JumpTarget::Return(_) => {
                if self.scopes.is_empty() {
                    self.layout.emit(Instruction::Return);
                } else {
                    self.layout.emit_leave(LabelKey::MethodExit);
                }
                return Ok(());
            }
        };

        let scope = target.scope();
        if self
            .scopes
            .iter()
            .all(|&open| self.cfg.contains(open, scope))
        {
            self.layout.emit_branch(label);
        } else {
            self.layout.emit_leave(label);
        }
        Ok(())
    }

    fn emit_if(
        &mut self,
        stmt: StatementId,
        then_branch: StatementId,
        else_branch: Option<StatementId>,
    ) -> Result<()> {
        self.layout
            .emit_branch_if(else_branch.map_or(LabelKey::EndOf(stmt), LabelKey::Else));
        self.emit(then_branch)?;

        if let Some(else_branch) = else_branch {
            if self.falls(then_branch) {
                self.layout.emit_branch(LabelKey::EndOf(stmt));
            }
            self.layout.define_label(LabelKey::Else(else_branch))?;
            self.emit(else_branch)?;
        }
        self.layout.define_label(LabelKey::EndOf(stmt))
    }

    fn emit_loop(
        &mut self,
        stmt: StatementId,
        condition: Condition,
        body: StatementId,
    ) -> Result<()> {
        self.layout.define_label(LabelKey::Head(stmt))?;
        if condition != Condition::Always {
            self.layout.emit_branch_if(LabelKey::EndOf(stmt));
        }
        self.emit(body)?;
        if self.falls(body) {
            self.layout.emit_branch(LabelKey::Head(stmt));
        }
        self.layout.define_label(LabelKey::EndOf(stmt))
    }

    fn emit_switch(
        &mut self,
        stmt: StatementId,
        sections: &[StatementId],
        default: Option<usize>,
    ) -> Result<()> {
        let cases: Vec<LabelKey> = sections.iter().map(|&s| LabelKey::Case(s)).collect();
        self.layout.emit_switch(&cases);
        match default.and_then(|idx| sections.get(idx)) {
            Some(&section) => self.layout.emit_branch(LabelKey::Case(section)),
            None => self.layout.emit_branch(LabelKey::EndOf(stmt)),
        };

        for &section in sections {
            self.layout.define_label(LabelKey::Case(section))?;
            self.emit(section)?;
            if self.falls(section) {
                self.layout.emit_branch(LabelKey::EndOf(stmt));
            }
        }
        self.layout.define_label(LabelKey::EndOf(stmt))
    }

    /// Emits a protected body or catch handler, closed by a `leave` to the end of `owner`.
    fn emit_protected(&mut self, scope: StatementId, owner: StatementId) -> Result<()> {
        self.scopes.push(scope);
        self.emit(scope)?;
        if self.falls(scope) {
            self.layout.emit_leave(LabelKey::EndOf(owner));
        }
        self.scopes.pop();
        Ok(())
    }

    /// Emits a `finally`/`fault` handler and returns its bounds.
    fn emit_handler(
        &mut self,
        region: RegionId,
        emit_body: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let start = self.layout.offset();
        emit_body(self)?;
        let end = self.layout.offset();
        self.region_mut(region)?.handler = Some(HandlerBounds { start, end });
        Ok(())
    }

    fn emit_try(&mut self, stmt: StatementId, try_stmt: &TryStatement) -> Result<()> {
        let outer = match try_stmt.finally {
            Some(clause) => {
                let kind = match clause.kind {
                    HandlerKind::Finally => RegionKind::Finally,
                    HandlerKind::Fault => RegionKind::Fault,
                };
                Some((self.open_region(kind, RegionOrigin::User, stmt), clause.body))
            }
            None => None,
        };
        let group = (!try_stmt.catches.is_empty())
            .then(|| self.open_region(RegionKind::Try, RegionOrigin::User, stmt));

        let protected = self.open_region(RegionKind::Try, RegionOrigin::User, try_stmt.body);
        self.emit_protected(try_stmt.body, stmt)?;
        let exits = self
            .analyzer
            .analyze(&ExitQuery::scope(try_stmt.body, stmt))?;
        self.close_region(protected, exits);

        for (clause, catch) in try_stmt.catches.iter().enumerate() {
            let info = CatchInfo {
                clause,
                exception_type: catch.exception_type.clone(),
                local: catch.local,
                filtered: catch.filter.is_some(),
            };

            if catch.filter.is_some() {
                let filter = self.open_region(RegionKind::Filter, RegionOrigin::User, catch.body);
                self.region_mut(filter)?.catch = Some(info.clone());
                self.layout.emit(Instruction::Filter {
                    statement: stmt,
                    clause,
                });
                self.layout.emit(Instruction::EndFilter);
                self.close_region(filter, ExitSet::default());
            }

            let handler = self.open_region(RegionKind::Catch, RegionOrigin::User, catch.body);
            self.region_mut(handler)?.catch = Some(info);
            self.emit_protected(catch.body, stmt)?;
            let exits = self
                .analyzer
                .analyze(&ExitQuery::scope(catch.body, stmt).with_rethrow_owner(catch.body))?;
            self.close_region(handler, exits);
        }

        let composite = ExitQuery::composite(
            std::iter::once(try_stmt.body)
                .chain(try_stmt.catches.iter().map(|c| c.body))
                .collect(),
            stmt,
            stmt,
        );
        if let Some(group) = group {
            let exits = self.analyzer.analyze(&composite)?;
            self.close_region(group, exits);
        }

        if let Some((region, handler)) = outer {
            self.emit_handler(region, |this| {
                this.scopes.push(handler);
                this.emit(handler)?;
                if this.falls(handler) {
                    this.layout.emit(Instruction::EndFinally);
                }
                this.scopes.pop();
                Ok(())
            })?;
            let exits = self.analyzer.analyze(&composite)?;
            self.close_region(region, exits);
        }

        self.layout.define_label(LabelKey::EndOf(stmt))
    }

    fn emit_synthetic(
        &mut self,
        stmt: StatementId,
        kind: SyntheticKind,
        body: StatementId,
    ) -> Result<()> {
        let decision = self
            .decisions
            .remove(&stmt)
            .ok_or_else(|| malformed_region!("no protection decision for {} {}", kind, stmt))?;

        if decision.protect {
            let origin = RegionOrigin::Synthetic(kind);
            let region = self.open_region(RegionKind::Finally, origin, stmt);
            let protected = self.open_region(RegionKind::Try, origin, body);
            self.emit_protected(body, stmt)?;
            self.close_region(protected, decision.exits.clone());

            self.emit_handler(region, |this| {
                this.layout.emit(Instruction::Cleanup {
                    statement: stmt,
                    kind,
                });
                this.layout.emit(Instruction::EndFinally);
                Ok(())
            })?;
            self.close_region(region, decision.exits);
        } else {
            self.emit(body)?;
            if self.falls(body) {
                self.layout.emit(Instruction::Cleanup {
                    statement: stmt,
                    kind,
                });
            }
        }

        self.layout.define_label(LabelKey::EndOf(stmt))
    }
}

/// Rejects reads of a catch-bound exception local outside the handler that binds it.
///
/// The local is in scope in its own clause's filter and anywhere inside the handler body,
/// nested filters included.
fn check_exception_locals(cfg: &ControlFlowGraph<'_>) -> Result<()> {
    let body = cfg.body();
    let mut bound: HashMap<LocalId, (StatementId, usize, StatementId)> = HashMap::new();
    for stmt in body.iter() {
        if let StatementKind::Try(try_stmt) = stmt.kind() {
            for (idx, clause) in try_stmt.catches.iter().enumerate() {
                if let Some(local) = clause.local {
                    bound.insert(local, (stmt.id(), idx, clause.body));
                }
            }
        }
    }
    if bound.is_empty() {
        return Ok(());
    }

    for stmt in body.iter() {
        match stmt.kind() {
            StatementKind::Expression { uses } => {
                for local in uses {
                    let Some(&(_, _, handler)) = bound.get(local) else {
                        continue;
                    };
                    if !cfg.contains(handler, stmt.id()) {
                        return Err(malformed_region!(
                            "exception local {} read by {} outside its handler {}",
                            local,
                            stmt.id(),
                            handler
                        ));
                    }
                }
            }
            StatementKind::Try(try_stmt) => {
                for (idx, clause) in try_stmt.catches.iter().enumerate() {
                    let Some(filter) = &clause.filter else {
                        continue;
                    };
                    for local in &filter.uses {
                        let Some(&(owner, owner_idx, handler)) = bound.get(local) else {
                            continue;
                        };
                        let own_clause = owner == stmt.id() && owner_idx == idx;
                        if !own_clause && !cfg.contains(handler, stmt.id()) {
                            return Err(malformed_region!(
                                "filter {} of {} reads exception local {} of handler {}",
                                idx,
                                stmt.id(),
                                local,
                                handler
                            ));
                        }
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}
