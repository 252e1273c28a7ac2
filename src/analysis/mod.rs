//! Control flow analysis of method bodies.
//!
//! This module provides the two analyses the region builder relies on. It builds upon the
//! generic graph infrastructure in [`crate::utils::graph`].
//!
//! # Architecture
//!
//! - [`cfg`] - Containment, jump resolution and reachability over the statement tree
//! - [`exits`] - Exit edges leaving a protected scope
//!
//! # Usage
//!
//! ```rust
//! use ehscope::{
//!     analysis::{ControlFlowGraph, ExitAnalyzer, ExitQuery},
//!     body::MethodBodyBuilder,
//! };
//!
//! let mut b = MethodBodyBuilder::new();
//! let ret = b.return_stmt();
//! let inner = b.block(vec![ret]);
//! let fixed = b.fixed(inner);
//! let root = b.block(vec![fixed]);
//! let body = b.finish(root)?;
//!
//! let cfg = ControlFlowGraph::new(&body)?;
//! let exits = ExitAnalyzer::new(&cfg).analyze(&ExitQuery::scope(inner, fixed))?;
//! assert_eq!(exits.leaves().count(), 1);
//! # Ok::<(), ehscope::Error>(())
//! ```

pub mod cfg;
pub mod exits;

// Re-export primary types at module level
pub use cfg::{ControlFlowGraph, FlowEdgeKind, FlowNode, JumpTarget, Reachability, ScopeRole};
pub use exits::{ExitAnalyzer, ExitEdge, ExitKind, ExitQuery, ExitSet, ExitTarget};
