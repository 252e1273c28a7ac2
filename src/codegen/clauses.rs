//! Exception clause table.
//!
//! This module flattens a [`RegionTree`] into the clause table of ECMA-335 method bodies: one
//! clause per catch handler, filter or `finally`/`fault`, each naming its protected range and
//! its handler range. Clauses are ordered inner before outer, the order the runtime searches
//! them in.
//!
//! # References
//! - ECMA-335 6th Edition, Partition II, Section 25.4.6 - Exception Handling

use std::fmt;

use bitflags::bitflags;

use crate::{
    body::ExceptionType,
    codegen::format_offset,
    regions::{Region, RegionId, RegionKind, RegionTree},
};

bitflags! {
    /// Exception clause flags defining the type of exception handling clause.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ExceptionClauseFlags: u16 {
        /// A typed exception clause.
        const EXCEPTION = 0x0000;

        /// An exception filter and handler clause.
        ///
        /// The filter block runs before the handler to decide whether it handles the
        /// exception.
        const FILTER = 0x0001;

        /// A finally clause, run on every exit from the protected range.
        const FINALLY = 0x0002;

        /// A fault clause, run only when the protected range is left by an exception.
        const FAULT = 0x0004;
    }
}

/// One entry of the exception clause table.
///
/// # Layout
///
/// ```text
/// try {
///     // try_offset -> try_offset + try_length
/// }
/// filter {
///     // filter_offset -> handler_offset (FILTER clauses only)
/// }
/// handler {
///     // handler_offset -> handler_offset + handler_length
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExceptionClause {
    /// Kind of clause.
    pub flags: ExceptionClauseFlags,
    /// First instruction of the protected range.
    pub try_offset: usize,
    /// Number of instructions in the protected range.
    pub try_length: usize,
    /// First instruction of the handler.
    pub handler_offset: usize,
    /// Number of instructions in the handler.
    pub handler_length: usize,
    /// Caught type of an `EXCEPTION` clause; `None` catches everything.
    pub exception_type: Option<ExceptionType>,
    /// First instruction of the filter block of a `FILTER` clause.
    pub filter_offset: Option<usize>,
    /// The `Catch`, `Finally` or `Fault` region the clause was produced from.
    pub region: RegionId,
}

impl ExceptionClause {
    /// Returns `true` if the handler runs on normal exits too.
    #[must_use]
    pub fn is_finally(&self) -> bool {
        self.flags.contains(ExceptionClauseFlags::FINALLY)
    }

    /// Returns `true` if `other`'s protected and handler ranges both lie inside this
    /// clause's protected range.
    #[must_use]
    pub fn encloses(&self, other: &ExceptionClause) -> bool {
        let end = self.try_offset + self.try_length;
        self.try_offset <= other.try_offset
            && other.try_offset + other.try_length <= end
            && self.try_offset <= other.handler_offset
            && other.handler_offset + other.handler_length <= end
    }
}

impl fmt::Display for ExceptionClause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            ".try {} to {} ",
            format_offset(self.try_offset),
            format_offset(self.try_offset + self.try_length)
        )?;
        if self.flags.contains(ExceptionClauseFlags::FILTER) {
            write!(f, "filter {} ", format_offset(self.filter_offset.unwrap_or(0)))?;
        } else if self.flags.contains(ExceptionClauseFlags::FINALLY) {
            f.write_str("finally ")?;
        } else if self.flags.contains(ExceptionClauseFlags::FAULT) {
            f.write_str("fault ")?;
        } else {
            match &self.exception_type {
                Some(ty) => write!(f, "catch {ty} ")?,
                None => f.write_str("catch [any] ")?,
            }
        }
        write!(
            f,
            "handler {} to {}",
            format_offset(self.handler_offset),
            format_offset(self.handler_offset + self.handler_length)
        )
    }
}

/// Produces the clause table of `tree` by a post-order walk.
pub(crate) fn collect(tree: &RegionTree) -> Vec<ExceptionClause> {
    let mut clauses = Vec::new();
    let mut stack = vec![(tree.root(), false)];

    while let Some((id, finished)) = stack.pop() {
        let Some(region) = tree.region(id) else {
            continue;
        };
        if !finished {
            stack.push((id, true));
            stack.extend(region.children().iter().rev().map(|&c| (c, false)));
            continue;
        }

        match region.kind() {
            RegionKind::Try => catch_clauses(tree, region, &mut clauses),
            RegionKind::Finally | RegionKind::Fault => {
                let protected = region.children().first().and_then(|&c| tree.region(c));
                if let (Some(protected), Some(handler)) = (protected, region.handler()) {
                    clauses.push(ExceptionClause {
                        flags: if region.kind() == RegionKind::Finally {
                            ExceptionClauseFlags::FINALLY
                        } else {
                            ExceptionClauseFlags::FAULT
                        },
                        try_offset: protected.start(),
                        try_length: protected.len(),
                        handler_offset: handler.start,
                        handler_length: handler.end - handler.start,
                        exception_type: None,
                        filter_offset: None,
                        region: region.id(),
                    });
                }
            }
            _ => {}
        }
    }

    clauses
}

/// Emits one clause per catch handler of a catch group, in clause order.
fn catch_clauses(tree: &RegionTree, group: &Region, clauses: &mut Vec<ExceptionClause>) {
    let children: Vec<&Region> = group
        .children()
        .iter()
        .filter_map(|&c| tree.region(c))
        .collect();
    let Some(protected) = children.first() else {
        return;
    };

    for (idx, handler) in children.iter().enumerate() {
        if handler.kind() != RegionKind::Catch {
            continue;
        }
        let filter = idx
            .checked_sub(1)
            .and_then(|p| children.get(p))
            .filter(|f| f.kind() == RegionKind::Filter);

        clauses.push(ExceptionClause {
            flags: if filter.is_some() {
                ExceptionClauseFlags::FILTER
            } else {
                ExceptionClauseFlags::EXCEPTION
            },
            try_offset: protected.start(),
            try_length: protected.len(),
            handler_offset: handler.start(),
            handler_length: handler.len(),
            exception_type: handler
                .catch_info()
                .and_then(|info| info.exception_type.clone()),
            filter_offset: filter.map(|f| f.start()),
            region: handler.id(),
        });
    }
}
