//! Statement representation for lexically scoped method bodies.
//!
//! A method body reaches the region builder as an arena of [`Statement`]s. Each statement
//! has a [`StatementId`] that doubles as its lexical scope identity, a back-reference to its
//! parent, and a [`StatementKind`] describing its shape. `using`, `lock`, `fixed` and
//! disposing `foreach` arrive already desugared into [`StatementKind::Synthetic`], which the
//! builder treats as `try { body } finally { cleanup }`.

use std::fmt;

use strum::{Display, EnumIter};

/// Identifies a statement inside a [`MethodBody`](crate::body::MethodBody).
///
/// Ids are assigned sequentially by [`MethodBodyBuilder`](crate::body::MethodBodyBuilder)
/// and index directly into the body's arena.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatementId(pub(crate) u32);

impl StatementId {
    /// Creates a new `StatementId` from a raw arena index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        StatementId(index)
    }

    /// Returns the arena index of this statement.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

impl fmt::Display for StatementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Identifies a user label targeted by `goto`.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LabelId(pub(crate) u32);

impl LabelId {
    /// Creates a new `LabelId` from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        LabelId(index)
    }

    /// Returns the raw index of this label.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

impl fmt::Display for LabelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

/// Identifies a local variable, including locals bound by `catch` clauses.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LocalId(pub(crate) u32);

impl LocalId {
    /// Creates a new `LocalId` from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        LocalId(index)
    }

    /// Returns the raw index of this local.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V_{}", self.0)
    }
}

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "V_{}", self.0)
    }
}

/// The exception type tested by a typed `catch` clause, as resolved by the binder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExceptionType(String);

impl ExceptionType {
    /// Creates an exception type from its fully qualified name.
    pub fn new(name: impl Into<String>) -> Self {
        ExceptionType(name.into())
    }

    /// Returns the fully qualified type name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// What the binder knows statically about a branch or loop condition.
///
/// Only the constant cases matter to reachability: `while (true)` and `for (;;)` are
/// [`Condition::Always`], which makes the end of the loop unreachable unless it is left by
/// `break`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum Condition {
    /// The condition is the constant `true`.
    Always,
    /// The condition is the constant `false`.
    Never,
    /// The condition is only known at run time.
    Unknown,
}

/// The source construct a synthetic protected statement was desugared from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SyntheticKind {
    /// `using (resource) { ... }`, cleanup disposes the resource.
    Using,
    /// `lock (obj) { ... }`, cleanup releases the monitor.
    Lock,
    /// `fixed (T* p = ...) { ... }`, cleanup unpins the pinned local.
    Fixed,
    /// `foreach` over a disposable enumerator, cleanup disposes the enumerator.
    ForEach,
}

/// Whether a handler that always runs is a `finally` or only runs on exception (`fault`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum HandlerKind {
    /// Runs on every exit from the protected block.
    Finally,
    /// Runs only when the protected block is left by an exception.
    Fault,
}

/// The `when` clause of a catch, evaluated with the exception in scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterExpression {
    /// Locals read by the filter expression.
    pub uses: Vec<LocalId>,
}

impl FilterExpression {
    /// Creates a filter expression reading the given locals.
    #[must_use]
    pub fn new(uses: Vec<LocalId>) -> Self {
        FilterExpression { uses }
    }
}

/// One `catch` clause of a [`TryStatement`].
///
/// Clause order is part of the contract: filters are evaluated top to bottom, so the
/// builder never reorders clauses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchClause {
    /// Exception type tested by the clause, `None` catches everything.
    pub exception_type: Option<ExceptionType>,
    /// Optional `when` filter.
    pub filter: Option<FilterExpression>,
    /// Local receiving the caught exception.
    pub local: Option<LocalId>,
    /// The handler body.
    pub body: StatementId,
}

impl CatchClause {
    /// Creates a catch-all clause with the given handler body.
    #[must_use]
    pub fn new(body: StatementId) -> Self {
        CatchClause {
            exception_type: None,
            filter: None,
            local: None,
            body,
        }
    }

    /// Restricts the clause to an exception type.
    #[must_use]
    pub fn with_type(mut self, exception_type: ExceptionType) -> Self {
        self.exception_type = Some(exception_type);
        self
    }

    /// Attaches a `when` filter to the clause.
    #[must_use]
    pub fn with_filter(mut self, filter: FilterExpression) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Binds the caught exception to a local.
    #[must_use]
    pub fn with_local(mut self, local: LocalId) -> Self {
        self.local = Some(local);
        self
    }
}

/// The `finally` or `fault` part of a [`TryStatement`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FinallyClause {
    /// Finally or fault.
    pub kind: HandlerKind,
    /// The handler body.
    pub body: StatementId,
}

/// A user-written `try` statement.
///
/// A well-formed try has at least one catch clause or a finally/fault clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TryStatement {
    /// The protected body.
    pub body: StatementId,
    /// Catch clauses in source order.
    pub catches: Vec<CatchClause>,
    /// Optional finally or fault clause.
    pub finally: Option<FinallyClause>,
}

/// The shape of a statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// `{ ... }`, children in document order.
    Block(Vec<StatementId>),
    /// Opaque straight-line code, such as an expression statement or declaration.
    Expression {
        /// Locals read by the expression.
        uses: Vec<LocalId>,
    },
    /// `if (condition) then_branch else else_branch`.
    If {
        /// Statically known value of the condition.
        condition: Condition,
        /// Taken when the condition holds.
        then_branch: StatementId,
        /// Taken otherwise.
        else_branch: Option<StatementId>,
    },
    /// `try` with catch clauses and an optional finally/fault.
    Try(TryStatement),
    /// `label: body`.
    Labeled {
        /// The label defined by this statement.
        label: LabelId,
        /// The labeled statement.
        body: StatementId,
    },
    /// `goto label;`
    Goto(LabelId),
    /// `break;`, targets the nearest enclosing loop or switch.
    Break,
    /// `continue;`, targets the nearest enclosing loop.
    Continue,
    /// `return;`, leaves every enclosing region up to the method boundary.
    Return,
    /// `throw expr;`
    Throw,
    /// `throw;` inside a catch handler.
    Rethrow,
    /// A pre-tested loop (`while`, `for`).
    Loop {
        /// Statically known value of the loop condition.
        condition: Condition,
        /// The loop body.
        body: StatementId,
    },
    /// `switch`, each section a statement; `break` leaves the switch.
    Switch {
        /// Switch sections in source order.
        sections: Vec<StatementId>,
        /// Index of the `default` section, if any.
        default: Option<usize>,
    },
    /// A `using`/`lock`/`fixed`/`foreach` desugared into try/finally.
    Synthetic {
        /// The source construct.
        kind: SyntheticKind,
        /// The protected body.
        body: StatementId,
    },
    /// A lambda or local function; its body is a separate method body.
    Lambda {
        /// The lambda body.
        body: StatementId,
    },
}

impl StatementKind {
    /// Returns the direct child statements in document order.
    ///
    /// For a `try` this is the body, each catch handler in clause order, then the
    /// finally/fault handler.
    #[must_use]
    pub fn children(&self) -> Vec<StatementId> {
        match self {
            StatementKind::Block(stmts) => stmts.clone(),
            StatementKind::If {
                then_branch,
                else_branch,
                ..
            } => std::iter::once(*then_branch).chain(*else_branch).collect(),
            StatementKind::Try(try_stmt) => std::iter::once(try_stmt.body)
                .chain(try_stmt.catches.iter().map(|c| c.body))
                .chain(try_stmt.finally.map(|f| f.body))
                .collect(),
            StatementKind::Labeled { body, .. }
            | StatementKind::Loop { body, .. }
            | StatementKind::Synthetic { body, .. }
            | StatementKind::Lambda { body } => vec![*body],
            StatementKind::Switch { sections, .. } => sections.clone(),
            StatementKind::Expression { .. }
            | StatementKind::Goto(_)
            | StatementKind::Break
            | StatementKind::Continue
            | StatementKind::Return
            | StatementKind::Throw
            | StatementKind::Rethrow => Vec::new(),
        }
    }

    /// Returns `true` for `goto`, `break`, `continue` and `return`.
    #[must_use]
    pub fn is_jump(&self) -> bool {
        matches!(
            self,
            StatementKind::Goto(_)
                | StatementKind::Break
                | StatementKind::Continue
                | StatementKind::Return
        )
    }

    /// Returns a short name for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            StatementKind::Block(_) => "block",
            StatementKind::Expression { .. } => "expression",
            StatementKind::If { .. } => "if",
            StatementKind::Try(_) => "try",
            StatementKind::Labeled { .. } => "labeled",
            StatementKind::Goto(_) => "goto",
            StatementKind::Break => "break",
            StatementKind::Continue => "continue",
            StatementKind::Return => "return",
            StatementKind::Throw => "throw",
            StatementKind::Rethrow => "rethrow",
            StatementKind::Loop { .. } => "loop",
            StatementKind::Switch { .. } => "switch",
            StatementKind::Synthetic { .. } => "synthetic",
            StatementKind::Lambda { .. } => "lambda",
        }
    }
}

/// A statement in the method body arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    pub(crate) id: StatementId,
    pub(crate) parent: Option<StatementId>,
    pub(crate) kind: StatementKind,
}

impl Statement {
    /// Returns the statement's id.
    #[must_use]
    pub fn id(&self) -> StatementId {
        self.id
    }

    /// Returns the enclosing statement, `None` for the method root.
    #[must_use]
    pub fn parent(&self) -> Option<StatementId> {
        self.parent
    }

    /// Returns the statement's shape.
    #[must_use]
    pub fn kind(&self) -> &StatementKind {
        &self.kind
    }
}
