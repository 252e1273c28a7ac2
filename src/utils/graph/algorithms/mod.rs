//! Graph algorithms.
//!
//! Generic algorithms over the [`Successors`](crate::utils::graph::Successors) trait.

mod traversal;

pub use traversal::Dfs;
