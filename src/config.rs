//! Configuration for the region builder.
//!
//! This module provides [`BuilderConfig`], which controls how desugared `using`, `lock`,
//! `fixed` and `foreach` statements are protected and whether the finished region tree is
//! checked against its structural invariants.

use strum::{Display, EnumIter};

use crate::body::SyntheticKind;

/// How a desugared statement's cleanup is protected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SyntheticPolicy {
    /// Emit a `finally` only if a jump or return leaves the body; otherwise append the
    /// cleanup inline after the body.
    ElideWhenExitless,
    /// Always wrap the body in a `finally`, like a user-written `try/finally`.
    AlwaysProtect,
}

/// Configuration for [`RegionBuilder`](crate::RegionBuilder).
///
/// The default elides every synthetic `finally` that no jump crosses, treats returns out of
/// a `fixed` statement as needing no cleanup (the pinned locals die with the frame), and
/// validates the finished tree only in debug builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuilderConfig {
    /// Policy for `using` statements (default: elide when exitless).
    pub using: SyntheticPolicy,

    /// Policy for `lock` statements (default: elide when exitless).
    pub lock: SyntheticPolicy,

    /// Policy for `fixed` statements (default: elide when exitless).
    pub fixed: SyntheticPolicy,

    /// Policy for disposing `foreach` loops (default: elide when exitless).
    pub foreach: SyntheticPolicy,

    /// Whether a `return` out of a `fixed` statement counts as a crossing exit (default: false).
    ///
    /// Pinned locals are released when the frame is popped, so a return needs no unpinning.
    /// Other jumps out of a `fixed` statement still keep the `finally`.
    pub fixed_return_needs_cleanup: bool,

    /// Check the nesting invariants of every built tree (default: on in debug builds).
    pub validate: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            using: SyntheticPolicy::ElideWhenExitless,
            lock: SyntheticPolicy::ElideWhenExitless,
            fixed: SyntheticPolicy::ElideWhenExitless,
            foreach: SyntheticPolicy::ElideWhenExitless,
            fixed_return_needs_cleanup: false,
            validate: cfg!(debug_assertions),
        }
    }
}

impl BuilderConfig {
    /// Creates a new configuration with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a "strict" configuration that always protects resource cleanup.
    ///
    /// `using`, `lock` and `foreach` always get a `finally`, so their cleanup also runs when
    /// the body throws. `fixed` keeps the eliding policy, since unpinning on an exception is
    /// unnecessary. Validation is always on.
    #[must_use]
    pub fn strict() -> Self {
        Self {
            using: SyntheticPolicy::AlwaysProtect,
            lock: SyntheticPolicy::AlwaysProtect,
            foreach: SyntheticPolicy::AlwaysProtect,
            validate: true,
            ..Self::default()
        }
    }

    /// Returns the policy for the given synthetic kind.
    #[must_use]
    pub fn policy(&self, kind: SyntheticKind) -> SyntheticPolicy {
        match kind {
            SyntheticKind::Using => self.using,
            SyntheticKind::Lock => self.lock,
            SyntheticKind::Fixed => self.fixed,
            SyntheticKind::ForEach => self.foreach,
        }
    }

    /// Sets the policy for one synthetic kind.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_policy(mut self, kind: SyntheticKind, policy: SyntheticPolicy) -> Self {
        match kind {
            SyntheticKind::Using => self.using = policy,
            SyntheticKind::Lock => self.lock = policy,
            SyntheticKind::Fixed => self.fixed = policy,
            SyntheticKind::ForEach => self.foreach = policy,
        }
        self
    }

    /// Sets whether returns out of `fixed` statements keep the `finally`.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_fixed_return_cleanup(mut self, enable: bool) -> Self {
        self.fixed_return_needs_cleanup = enable;
        self
    }

    /// Enables or disables validation of built trees.
    ///
    /// # Returns
    ///
    /// The modified configuration (builder pattern).
    #[must_use]
    pub fn with_validation(mut self, enable: bool) -> Self {
        self.validate = enable;
        self
    }
}
