//! Protected region nodes.

use std::fmt;

use strum::{Display, EnumIter};

use crate::{
    analysis::ExitSet,
    body::{ExceptionType, LocalId, StatementId, SyntheticKind},
    codegen::format_offset,
};

/// Identifies a region inside a [`RegionTree`](crate::RegionTree).
///
/// Ids are assigned in the order regions are opened, which is pre-order over the tree and
/// document order among siblings.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RegionId(pub(crate) u32);

impl RegionId {
    /// Creates a new `RegionId` from a raw index.
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        RegionId(index)
    }

    /// Returns the raw index of this region.
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// The kind of a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum RegionKind {
    /// The whole method body; the root of every tree.
    Method,
    /// A protected block. Either a plain body, or a catch group whose children are the
    /// protected body followed by its filters and catch handlers.
    Try,
    /// A catch handler.
    Catch,
    /// The filter block of the catch handler that immediately follows it.
    Filter,
    /// A `finally` wrapping its protected `Try` child; the handler code follows the child.
    Finally,
    /// Shaped like [`RegionKind::Finally`], but the handler only runs on exceptions.
    Fault,
}

impl RegionKind {
    /// Returns `true` for the kinds whose handler code is part of the region itself.
    #[must_use]
    pub const fn has_handler(&self) -> bool {
        matches!(self, RegionKind::Finally | RegionKind::Fault)
    }
}

/// Where a region came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegionOrigin {
    /// The method root region.
    Method,
    /// A user-written `try` statement.
    User,
    /// A desugared `using`/`lock`/`fixed`/`foreach`.
    Synthetic(SyntheticKind),
}

/// The instruction range of a `finally`/`fault` handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerBounds {
    /// First instruction of the handler.
    pub start: usize,
    /// One past the last instruction of the handler.
    pub end: usize,
}

/// What a `Catch` or `Filter` region catches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatchInfo {
    /// Index of the clause in source order.
    pub clause: usize,
    /// Caught exception type; `None` catches everything.
    pub exception_type: Option<ExceptionType>,
    /// Local receiving the exception.
    pub local: Option<LocalId>,
    /// Whether the clause has a `when` filter.
    pub filtered: bool,
}

/// A node of the region tree.
///
/// A region covers the half-open instruction range `[start, end)`. Its children are ordered,
/// disjoint and nested inside that range.
#[derive(Debug, Clone)]
pub struct Region {
    pub(crate) id: RegionId,
    pub(crate) kind: RegionKind,
    pub(crate) origin: RegionOrigin,
    pub(crate) statement: StatementId,
    pub(crate) start: usize,
    pub(crate) end: usize,
    pub(crate) parent: Option<RegionId>,
    pub(crate) children: Vec<RegionId>,
    pub(crate) handler: Option<HandlerBounds>,
    pub(crate) catch: Option<CatchInfo>,
    pub(crate) exits: ExitSet,
}

impl Region {
    /// Returns the region's id.
    #[must_use]
    pub fn id(&self) -> RegionId {
        self.id
    }

    /// Returns the region's kind.
    #[must_use]
    pub fn kind(&self) -> RegionKind {
        self.kind
    }

    /// Returns where the region came from.
    #[must_use]
    pub fn origin(&self) -> RegionOrigin {
        self.origin
    }

    /// Returns `true` if the region was introduced for a desugared statement.
    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        matches!(self.origin, RegionOrigin::Synthetic(_))
    }

    /// Returns the statement the region was built from.
    ///
    /// This is the `try` or synthetic statement for `Finally`, `Fault` and catch-group
    /// `Try` regions, the protected body for a body `Try`, and the handler body for `Catch`
    /// and `Filter` regions.
    #[must_use]
    pub fn statement(&self) -> StatementId {
        self.statement
    }

    /// Returns the first instruction offset of the region.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Returns one past the last instruction offset of the region.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Returns the number of instructions the region covers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns `true` if the region covers no instructions. Never the case in a valid tree.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Returns `true` if `offset` lies inside the region.
    #[must_use]
    pub fn covers(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns the parent region, `None` for the method root.
    #[must_use]
    pub fn parent(&self) -> Option<RegionId> {
        self.parent
    }

    /// Returns the child regions in document order.
    #[must_use]
    pub fn children(&self) -> &[RegionId] {
        &self.children
    }

    /// Returns the handler range of a `Finally` or `Fault` region.
    #[must_use]
    pub fn handler(&self) -> Option<HandlerBounds> {
        self.handler
    }

    /// Returns the clause information of a `Catch` or `Filter` region.
    #[must_use]
    pub fn catch_info(&self) -> Option<&CatchInfo> {
        self.catch.as_ref()
    }

    /// Returns the exit edges leaving the region.
    #[must_use]
    pub fn exits(&self) -> &ExitSet {
        &self.exits
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} [{}, {}) {}",
            self.id,
            self.kind,
            format_offset(self.start),
            format_offset(self.end),
            self.statement
        )?;
        if let RegionOrigin::Synthetic(kind) = self.origin {
            write!(f, " ({kind})")?;
        }
        Ok(())
    }
}
