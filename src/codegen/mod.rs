//! Linear code layout and its exception clause table.
//!
//! The region builder lowers a statement tree into a flat stream of [`Instruction`]s through a
//! [`CodeLayout`], which owns offset assignment and symbolic label resolution. Once a tree has
//! been built it can be flattened into ECMA-335 style [`ExceptionClause`]s, or printed as an
//! indented listing through its `Display` implementation.
//!
//! # Key Components
//!
//! - [`Instruction`] - A laid out instruction, branch targets resolved to offsets
//! - [`CodeLayout`] - Append-only emitter with forward label patching
//! - [`LabelKey`] - Symbolic branch targets, from user labels to synthesized join points
//! - [`ExceptionClause`] - One row of the flattened clause table

pub(crate) mod clauses;
mod instruction;
mod layout;
mod listing;

pub use clauses::{ExceptionClause, ExceptionClauseFlags};
pub use instruction::{format_offset, Instruction};
pub use layout::{CodeLayout, LabelKey};
