//! Generic directed graph infrastructure.
//!
//! The statement flow graph used for reachability is built on [`DirectedGraph`]; algorithms
//! in [`algorithms`] are written against the [`GraphBase`] and [`Successors`] traits.

mod directed;
mod edge;
mod node;
mod traits;

pub mod algorithms;

pub use directed::DirectedGraph;
pub use edge::EdgeId;
pub use node::NodeId;
pub use traits::{GraphBase, Successors};
