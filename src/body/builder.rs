//! Fluent construction of method bodies.
//!
//! [`MethodBodyBuilder`] allocates statements bottom-up: children are created first and
//! their ids handed to the container that adopts them. [`MethodBodyBuilder::finish`] then
//! wires parent back-references and checks the tree shape once, so every later stage can
//! index the arena without re-validating.
//!
//! # Examples
//!
//! ```rust
//! use ehscope::body::{Condition, MethodBodyBuilder};
//!
//! // while (true) { try { break; } finally { } }
//! let mut b = MethodBodyBuilder::new();
//! let brk = b.break_stmt();
//! let try_body = b.block(vec![brk]);
//! let fin = b.block(vec![]);
//! let try_stmt = b.try_finally(try_body, fin);
//! let loop_body = b.block(vec![try_stmt]);
//! let looped = b.loop_stmt(Condition::Always, loop_body);
//! let root = b.block(vec![looped]);
//!
//! let body = b.finish(root)?;
//! assert_eq!(body.root(), root);
//! # Ok::<(), ehscope::Error>(())
//! ```

use std::collections::HashSet;

use crate::{
    body::{
        CatchClause, Condition, FinallyClause, HandlerKind, LabelId, LocalId, MethodBody,
        Statement, StatementId, StatementKind, SyntheticKind, TryStatement,
    },
    Error, Result,
};

/// Builder for [`MethodBody`].
#[derive(Debug, Default)]
pub struct MethodBodyBuilder {
    statements: Vec<Statement>,
    label_count: u32,
    local_count: u32,
}

impl MethodBodyBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a fresh label.
    pub fn label(&mut self) -> LabelId {
        let label = LabelId::new(self.label_count);
        self.label_count += 1;
        label
    }

    /// Allocates a fresh local.
    pub fn local(&mut self) -> LocalId {
        let local = LocalId::new(self.local_count);
        self.local_count += 1;
        local
    }

    /// Adds a statement of arbitrary shape and returns its id.
    pub fn add(&mut self, kind: StatementKind) -> StatementId {
        #[allow(clippy::cast_possible_truncation)]
        let id = StatementId::new(self.statements.len() as u32);
        self.statements.push(Statement {
            id,
            parent: None,
            kind,
        });
        id
    }

    /// Adds an opaque expression statement reading `uses`.
    pub fn expression(&mut self, uses: &[LocalId]) -> StatementId {
        self.add(StatementKind::Expression {
            uses: uses.to_vec(),
        })
    }

    /// Adds a block.
    pub fn block(&mut self, stmts: Vec<StatementId>) -> StatementId {
        self.add(StatementKind::Block(stmts))
    }

    /// Adds an `if` statement.
    pub fn if_stmt(
        &mut self,
        condition: Condition,
        then_branch: StatementId,
        else_branch: Option<StatementId>,
    ) -> StatementId {
        self.add(StatementKind::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    /// Adds a `try` statement.
    pub fn try_statement(&mut self, try_stmt: TryStatement) -> StatementId {
        self.add(StatementKind::Try(try_stmt))
    }

    /// Adds `try { body } finally { handler }`.
    pub fn try_finally(&mut self, body: StatementId, handler: StatementId) -> StatementId {
        self.try_catch_finally(body, Vec::new(), handler)
    }

    /// Adds `try { body } fault { handler }`.
    pub fn try_fault(&mut self, body: StatementId, handler: StatementId) -> StatementId {
        self.try_statement(TryStatement {
            body,
            catches: Vec::new(),
            finally: Some(FinallyClause {
                kind: HandlerKind::Fault,
                body: handler,
            }),
        })
    }

    /// Adds `try { body } catch ...`.
    pub fn try_catch(&mut self, body: StatementId, catches: Vec<CatchClause>) -> StatementId {
        self.try_statement(TryStatement {
            body,
            catches,
            finally: None,
        })
    }

    /// Adds `try { body } catch ... finally { handler }`.
    pub fn try_catch_finally(
        &mut self,
        body: StatementId,
        catches: Vec<CatchClause>,
        handler: StatementId,
    ) -> StatementId {
        self.try_statement(TryStatement {
            body,
            catches,
            finally: Some(FinallyClause {
                kind: HandlerKind::Finally,
                body: handler,
            }),
        })
    }

    /// Adds `label: body`.
    pub fn labeled(&mut self, label: LabelId, body: StatementId) -> StatementId {
        self.add(StatementKind::Labeled { label, body })
    }

    /// Adds `goto label;`.
    pub fn goto_stmt(&mut self, label: LabelId) -> StatementId {
        self.add(StatementKind::Goto(label))
    }

    /// Adds `break;`.
    pub fn break_stmt(&mut self) -> StatementId {
        self.add(StatementKind::Break)
    }

    /// Adds `continue;`.
    pub fn continue_stmt(&mut self) -> StatementId {
        self.add(StatementKind::Continue)
    }

    /// Adds `return;`.
    pub fn return_stmt(&mut self) -> StatementId {
        self.add(StatementKind::Return)
    }

    /// Adds `throw expr;`.
    pub fn throw_stmt(&mut self) -> StatementId {
        self.add(StatementKind::Throw)
    }

    /// Adds `throw;`.
    pub fn rethrow_stmt(&mut self) -> StatementId {
        self.add(StatementKind::Rethrow)
    }

    /// Adds a pre-tested loop.
    pub fn loop_stmt(&mut self, condition: Condition, body: StatementId) -> StatementId {
        self.add(StatementKind::Loop { condition, body })
    }

    /// Adds a `switch` with the given sections and optional default section index.
    pub fn switch(&mut self, sections: Vec<StatementId>, default: Option<usize>) -> StatementId {
        self.add(StatementKind::Switch { sections, default })
    }

    /// Adds a desugared `using`/`lock`/`fixed`/`foreach`.
    pub fn synthetic(&mut self, kind: SyntheticKind, body: StatementId) -> StatementId {
        self.add(StatementKind::Synthetic { kind, body })
    }

    /// Adds a desugared `fixed` statement.
    pub fn fixed(&mut self, body: StatementId) -> StatementId {
        self.synthetic(SyntheticKind::Fixed, body)
    }

    /// Adds a desugared `using` statement.
    pub fn using(&mut self, body: StatementId) -> StatementId {
        self.synthetic(SyntheticKind::Using, body)
    }

    /// Adds a desugared `lock` statement.
    pub fn lock(&mut self, body: StatementId) -> StatementId {
        self.synthetic(SyntheticKind::Lock, body)
    }

    /// Adds a lambda whose body is built as a separate method.
    pub fn lambda(&mut self, body: StatementId) -> StatementId {
        self.add(StatementKind::Lambda { body })
    }

    /// Wires parent references, validates the tree shape and produces the method body.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownStatement`] if any referenced id was not allocated by this builder
    /// - [`Error::UnresolvedLabel`] if a `goto` names a label no statement defines
    /// - [`Error::MalformedRegion`] if a statement is adopted twice or not at all, a label is
    ///   defined twice, a `try` has no handlers, a catch local is bound twice, or a switch
    ///   default index is out of range
    pub fn finish(mut self, root: StatementId) -> Result<MethodBody> {
        let len = self.statements.len();
        if root.index() >= len {
            return Err(Error::UnknownStatement(root));
        }

        let mut labels: Vec<Option<StatementId>> = vec![None; self.label_count as usize];
        let mut bound_locals = HashSet::new();
        let mut adoptions = Vec::with_capacity(len);

        for stmt in &self.statements {
            for child in stmt.kind.children() {
                if child.index() >= len {
                    return Err(Error::UnknownStatement(child));
                }
                if child == root {
                    return Err(malformed_region!(
                        "method root {} is used as a child of {}",
                        root,
                        stmt.id
                    ));
                }
                adoptions.push((child, stmt.id));
            }

            match &stmt.kind {
                StatementKind::Labeled { label, .. } => {
                    let slot = labels
                        .get_mut(label.index())
                        .ok_or(Error::UnresolvedLabel(*label))?;
                    if let Some(previous) = slot.replace(stmt.id) {
                        return Err(malformed_region!(
                            "label {} is defined by both {} and {}",
                            label,
                            previous,
                            stmt.id
                        ));
                    }
                }
                StatementKind::Try(try_stmt) => {
                    if try_stmt.catches.is_empty() && try_stmt.finally.is_none() {
                        return Err(malformed_region!(
                            "try statement {} has neither catch nor finally",
                            stmt.id
                        ));
                    }
                    for local in try_stmt.catches.iter().filter_map(|c| c.local) {
                        if !bound_locals.insert(local) {
                            return Err(malformed_region!(
                                "exception local {} is bound by more than one catch clause",
                                local
                            ));
                        }
                    }
                }
                StatementKind::Switch { sections, default } => {
                    if default.is_some_and(|idx| idx >= sections.len()) {
                        return Err(malformed_region!(
                            "switch {} names a default section outside its {} sections",
                            stmt.id,
                            sections.len()
                        ));
                    }
                }
                _ => {}
            }
        }

        for (child, parent) in adoptions {
            let slot = &mut self.statements[child.index()].parent;
            if let Some(previous) = slot.replace(parent) {
                return Err(malformed_region!(
                    "statement {} is adopted by both {} and {}",
                    child,
                    previous,
                    parent
                ));
            }
        }

        // Every statement must hang off the root; this also rules out parent cycles
        let mut visited = vec![false; len];
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            visited[current.index()] = true;
            stack.extend(self.statements[current.index()].kind.children());
        }
        if let Some(orphan) = visited.iter().position(|seen| !seen) {
            return Err(malformed_region!(
                "statement S{} is not reachable from the method root",
                orphan
            ));
        }

        for stmt in &self.statements {
            if let StatementKind::Goto(label) = stmt.kind {
                if labels.get(label.index()).copied().flatten().is_none() {
                    return Err(Error::UnresolvedLabel(label));
                }
            }
        }

        Ok(MethodBody {
            statements: self.statements,
            root,
            labels,
            local_count: self.local_count,
        })
    }
}
