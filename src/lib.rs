// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # ehscope
//!
//! Protected region construction for structured exception handling in CIL-style compiler
//! back ends.
//!
//! `ehscope` takes the lexically scoped statement tree of one method body, with `try`,
//! `catch`, `when` filters, `finally`, `fault` and the `using`/`lock`/`fixed`/`foreach`
//! statements desugared into `try/finally`, and produces the properly nested tree of
//! protected regions the runtime's exception model requires, together with the linear
//! instruction stream the regions refer to.
//!
//! ## Features
//!
//! - **Well-formed nesting** - Regions form a strict interval tree; `try/catch/finally` is
//!   lowered to a `finally` wrapping a catch group, as ECMA-335 demands
//! - **Exit analysis** - Every `goto`, `break`, `continue`, `return` and `throw;` leaving a
//!   protected scope is recorded as an exit edge, with reachability through divergent
//!   `finally` handlers
//! - **Synthetic elision** - Desugared statements only get a `finally` when control can
//!   actually leave their body early
//! - **Structural checks** - Jumps into protected scopes, jumps out of handlers and
//!   out-of-scope exception locals are rejected instead of producing an invalid tree
//! - **Parallel batches** - Independent method bodies are built on the `rayon` thread pool
//!
//! ## Quick Start
//!
//! ```rust
//! use ehscope::prelude::*;
//!
//! // try { f(); } catch (IOException) { g(); } finally { h(); }
//! let mut b = MethodBodyBuilder::new();
//! let f = b.expression(&[]);
//! let try_body = b.block(vec![f]);
//! let g = b.expression(&[]);
//! let catch_body = b.block(vec![g]);
//! let h = b.expression(&[]);
//! let handler = b.block(vec![h]);
//! let try_stmt = b.try_catch_finally(
//!     try_body,
//!     vec![CatchClause::new(catch_body).with_type(ExceptionType::new("System.IO.IOException"))],
//!     handler,
//! );
//! let root = b.block(vec![try_stmt]);
//! let body = b.finish(root)?;
//!
//! let tree = RegionBuilder::new().build(&body)?;
//! for clause in tree.exception_clauses() {
//!     println!("{clause}");
//! }
//! println!("{tree}");
//! # Ok::<(), ehscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`body`] - The input statement arena and its builder
//! - [`analysis`] - Containment, jump resolution, reachability and exit edges
//! - [`regions`] - The region builder and the resulting tree
//! - [`codegen`] - Instruction layout, the exception clause table and the text listing
//! - [`config`] - Builder configuration
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`]. Building never panics on malformed input;
//! it reports an [`Error::MalformedRegion`] naming the violated precondition.

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit tests
#[cfg(test)]
pub(crate) mod test;

pub(crate) mod utils;

/// Convenient re-exports of the most commonly used types.
///
/// # Example
///
/// ```rust
/// use ehscope::prelude::*;
///
/// let mut b = MethodBodyBuilder::new();
/// let root = b.block(vec![]);
/// let tree = RegionBuilder::new().build(&b.finish(root)?)?;
/// assert_eq!(tree.len(), 1);
/// # Ok::<(), ehscope::Error>(())
/// ```
pub mod prelude;

/// Lexically scoped method bodies.
///
/// The region builder's input: an arena of [`body::Statement`]s forming one tree per method,
/// built and validated through [`body::MethodBodyBuilder`].
pub mod body;

/// Control flow and exit analysis over method bodies.
///
/// - [`analysis::ControlFlowGraph`] - Containment, jump targets and reachability
/// - [`analysis::ExitAnalyzer`] - Exit edges of a protected scope
pub mod analysis;

/// Region tree construction.
pub mod regions;

/// Instruction layout and the exception clause table.
pub mod codegen;

/// Builder configuration.
pub mod config;

/// `ehscope` Result type
///
/// A type alias for `std::result::Result<T, Error>` where the error type is always
/// [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `ehscope` Error type
///
/// The main error type for all operations in this crate.
pub use error::Error;

/// Main entry point for building region trees.
pub use regions::{RegionBuilder, RegionKind, RegionTree};

/// Configuration of the region builder.
pub use config::{BuilderConfig, SyntheticPolicy};
