//! The statement arena of one method body.

use crate::{
    body::{LabelId, Statement, StatementId, StatementKind},
    Error, Result,
};

/// An immutable, validated statement tree for one method body.
///
/// Produced by [`MethodBodyBuilder::finish`](crate::body::MethodBodyBuilder::finish), which
/// guarantees that every statement except the root has exactly one parent, that the tree is
/// connected, and that every label is defined exactly once. Lambda bodies nested inside the
/// method live in the same arena; the region builder treats each as its own method.
#[derive(Debug, Clone)]
pub struct MethodBody {
    pub(crate) statements: Vec<Statement>,
    pub(crate) root: StatementId,
    /// Label index to the `Labeled` statement defining it, `None` for allocated but unused labels.
    pub(crate) labels: Vec<Option<StatementId>>,
    pub(crate) local_count: u32,
}

impl MethodBody {
    /// Returns the root statement of the method.
    #[must_use]
    pub fn root(&self) -> StatementId {
        self.root
    }

    /// Returns the number of statements in the arena.
    #[must_use]
    pub fn len(&self) -> usize {
        self.statements.len()
    }

    /// Returns `true` if the arena is empty. A finished body always has a root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    /// Returns the number of locals allocated for the method.
    #[must_use]
    pub fn local_count(&self) -> u32 {
        self.local_count
    }

    /// Looks up a statement by id.
    #[must_use]
    pub fn get(&self, id: StatementId) -> Option<&Statement> {
        self.statements.get(id.index())
    }

    /// Looks up a statement by id, failing for ids from another arena.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownStatement`] if `id` is out of range.
    pub fn statement(&self, id: StatementId) -> Result<&Statement> {
        self.get(id).ok_or(Error::UnknownStatement(id))
    }

    /// Returns the shape of a statement whose id is known to be valid.
    pub(crate) fn kind(&self, id: StatementId) -> &StatementKind {
        &self.statements[id.index()].kind
    }

    /// Returns the parent of a statement; ids outside the body have none.
    pub(crate) fn parent(&self, id: StatementId) -> Option<StatementId> {
        self.get(id).and_then(Statement::parent)
    }

    /// Returns the `Labeled` statement defining `label`.
    #[must_use]
    pub fn label_target(&self, label: LabelId) -> Option<StatementId> {
        self.labels.get(label.index()).copied().flatten()
    }

    /// Iterates over all statements in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Statement> + '_ {
        self.statements.iter()
    }

    /// Returns the bodies of all lambdas in the arena, in id order.
    pub fn lambda_bodies(&self) -> impl Iterator<Item = StatementId> + '_ {
        self.statements.iter().filter_map(|stmt| match stmt.kind {
            StatementKind::Lambda { body } => Some(body),
            _ => None,
        })
    }

    /// Returns the ancestors of `id`, innermost first, excluding `id` itself.
    pub(crate) fn ancestors(&self, id: StatementId) -> impl Iterator<Item = StatementId> + '_ {
        std::iter::successors(self.parent(id), move |&current| self.parent(current))
    }
}
