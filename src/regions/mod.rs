//! Protected region trees.
//!
//! This module turns a [`MethodBody`](crate::body::MethodBody) into a [`RegionTree`]: the
//! nested `try`, `catch`, `filter`, `finally` and `fault` regions of one method, laid over the
//! instruction stream produced alongside them.
//!
//! # Key Components
//!
//! - [`RegionBuilder`] - Lowers method bodies, deciding which synthetic `finally` regions
//!   are needed
//! - [`RegionTree`] - The immutable result, with traversal, offset queries and the clause table
//! - [`Region`] - A node of the tree, carrying its kind, bounds and exit edges

mod builder;
mod region;
mod tree;

pub use builder::RegionBuilder;
pub use region::{CatchInfo, HandlerBounds, Region, RegionId, RegionKind, RegionOrigin};
pub use tree::RegionTree;
