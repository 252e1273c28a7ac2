//! Factory methods for statement trees.

mod bodies;
mod malformed;

pub use bodies::*;
pub use malformed::*;
