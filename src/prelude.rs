//! # ehscope Prelude
//!
//! This module provides a convenient prelude for the most commonly used types from the
//! ehscope library. Import this module to get quick access to everything needed to describe
//! a method body and build its regions.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all ehscope operations
pub use crate::Error;

/// The result type used throughout ehscope
pub use crate::Result;

/// Configuration of synthetic region elision and validation
pub use crate::config::{BuilderConfig, SyntheticPolicy};

// ================================================================================================
// Method Bodies
// ================================================================================================

/// Statement arena and its builder
pub use crate::body::{MethodBody, MethodBodyBuilder};

/// Statement identities and shapes
pub use crate::body::{LabelId, LocalId, Statement, StatementId, StatementKind};

/// Exception handling constructs
pub use crate::body::{
    CatchClause, Condition, ExceptionType, FilterExpression, FinallyClause, HandlerKind,
    SyntheticKind, TryStatement,
};

// ================================================================================================
// Analysis
// ================================================================================================

/// Containment, jump resolution and reachability
pub use crate::analysis::{ControlFlowGraph, JumpTarget, ScopeRole};

/// Exit edges of protected scopes
pub use crate::analysis::{ExitAnalyzer, ExitEdge, ExitKind, ExitQuery, ExitSet, ExitTarget};

// ================================================================================================
// Regions
// ================================================================================================

/// Region construction and the resulting tree
pub use crate::regions::{
    CatchInfo, HandlerBounds, Region, RegionBuilder, RegionId, RegionKind, RegionOrigin,
    RegionTree,
};

// ================================================================================================
// Code Generation
// ================================================================================================

/// Laid out instructions and the exception clause table
pub use crate::codegen::{ExceptionClause, ExceptionClauseFlags, Instruction};
