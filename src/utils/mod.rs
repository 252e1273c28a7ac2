//! Internal utilities shared by the analyses.

mod bitset;
pub mod graph;

pub use bitset::BitSet;
