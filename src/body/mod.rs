//! Lexically scoped method bodies.
//!
//! This module holds the input side of region building: the statement arena produced by a
//! binder after desugaring, and the builder used to assemble and validate it.
//!
//! # Key Components
//!
//! - [`MethodBody`] - Immutable, validated statement tree for one method
//! - [`MethodBodyBuilder`] - Allocates statements, labels and locals, then checks the tree
//! - [`StatementKind`] - Shapes of statements the region builder understands
//! - [`TryStatement`] / [`CatchClause`] / [`FinallyClause`] - User exception handling
//!
//! Statement ids double as lexical scope identities. Every statement except the root has
//! exactly one parent, so "does scope A enclose statement B" is an ancestor query that the
//! flow graph answers in constant time after numbering the tree once.

mod builder;
mod method;
mod statement;

pub use builder::MethodBodyBuilder;
pub use method::MethodBody;
pub use statement::{
    CatchClause, Condition, ExceptionType, FilterExpression, FinallyClause, HandlerKind, LabelId,
    LocalId, Statement, StatementId, StatementKind, SyntheticKind, TryStatement,
};
