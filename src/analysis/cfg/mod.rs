//! Lexical control flow for structured exception handling.
//!
//! This module answers containment, jump-target and reachability queries over a
//! [`MethodBody`](crate::body::MethodBody) statement tree.
//!
//! # Architecture
//!
//! The flow graph builds upon the generic [`crate::utils::graph::DirectedGraph`]
//! infrastructure: every statement contributes an entry node and an end node, and every
//! method (the outer method and each lambda body) an exit node. Jumps are resolved lexically
//! first, then routed through the `finally` handlers they cross.
//!
//! # Key Components
//!
//! - [`ControlFlowGraph`] - Containment, jump resolution and reachability queries
//! - [`JumpTarget`] - Where a `goto`/`break`/`continue`/`return` lands
//! - [`ScopeRole`] - The part a statement plays in an exception-handling construct
//! - [`Reachability`] - Result of the flow graph fixpoint
//! - [`FlowNode`] / [`FlowEdgeKind`] - Flow graph vocabulary
//!
//! # Examples
//!
//! ```rust
//! use ehscope::{analysis::ControlFlowGraph, body::{Condition, MethodBodyBuilder}};
//!
//! // for (;;) { } after();
//! let mut b = MethodBodyBuilder::new();
//! let spin_body = b.block(vec![]);
//! let spin = b.loop_stmt(Condition::Always, spin_body);
//! let after = b.expression(&[]);
//! let root = b.block(vec![spin, after]);
//! let body = b.finish(root)?;
//!
//! let cfg = ControlFlowGraph::new(&body)?;
//! assert!(cfg.is_reachable(spin));
//! assert!(!cfg.is_reachable(after));
//! # Ok::<(), ehscope::Error>(())
//! ```

mod edge;
mod graph;
mod reachability;

pub use edge::{FlowEdgeKind, FlowNode};
pub use graph::{ControlFlowGraph, JumpTarget, ScopeRole};
pub use reachability::Reachability;
