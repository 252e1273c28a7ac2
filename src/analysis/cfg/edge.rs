//! Node and edge types of the statement flow graph.
//!
//! The flow graph has two nodes per statement, its entry and its end, plus one exit node per
//! method (the outer method and every lambda body). Reaching a statement's entry node means
//! the statement can execute; reaching its end node means it can complete normally.

use std::fmt;

use crate::body::StatementId;

/// A node of the statement flow graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowNode {
    /// Control is about to execute the statement.
    Entry(StatementId),
    /// The statement has completed normally.
    End(StatementId),
    /// The method whose root is the given statement has returned.
    MethodExit(StatementId),
}

impl fmt::Display for FlowNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowNode::Entry(stmt) => write!(f, "entry({stmt})"),
            FlowNode::End(stmt) => write!(f, "end({stmt})"),
            FlowNode::MethodExit(root) => write!(f, "exit({root})"),
        }
    }
}

/// The kind of control transfer represented by a flow edge.
///
/// # Examples
///
/// ```rust,ignore
/// use ehscope::analysis::FlowEdgeKind;
///
/// assert!(FlowEdgeKind::Jump.is_routed());
/// assert!(!FlowEdgeKind::Sequential.is_routed());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowEdgeKind {
    /// Straight-line flow between a container and its children, or between siblings.
    Sequential,

    /// One arm of an `if`, a `switch` section, or a loop condition test.
    Conditional,

    /// From the end of a loop body back to the loop's condition test.
    BackEdge,

    /// From the entry of a `try` into one of its handlers.
    ///
    /// Handlers are entered by the exception mechanism, so any executing `try` can reach
    /// them regardless of where inside the protected body the exception is raised.
    Handler,

    /// Normal completion of a protected body or catch handler out to the end of its `try`.
    ///
    /// Routed through the `finally` handler when the `try` has one.
    Completion,

    /// A `goto`, `break`, `continue` or `return` transferring to its target.
    ///
    /// Routed through every `finally` handler the jump crosses.
    Jump,
}

impl FlowEdgeKind {
    /// Returns `true` for edges that only exist if every `finally` they cross can complete.
    #[must_use]
    pub const fn is_routed(&self) -> bool {
        matches!(self, FlowEdgeKind::Completion | FlowEdgeKind::Jump)
    }
}
