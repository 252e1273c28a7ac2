//! The nested-interval tree of protected regions.

use crate::{
    body::StatementId,
    codegen::{clauses, ExceptionClause, Instruction},
    regions::{Region, RegionId, RegionKind},
    Result,
};

/// The protected regions of one method body together with its laid out instructions.
///
/// Regions form a strict forest under a single [`RegionKind::Method`] root: every child's
/// instruction range lies within its parent's, siblings are ordered and never overlap, and a
/// `Filter` region immediately precedes the `Catch` region it guards. The tree is immutable
/// once built.
///
/// # Examples
///
/// ```rust
/// use ehscope::{body::MethodBodyBuilder, RegionBuilder, RegionKind};
///
/// // try { } finally { }
/// let mut b = MethodBodyBuilder::new();
/// let try_body = b.block(vec![]);
/// let handler = b.block(vec![]);
/// let try_stmt = b.try_finally(try_body, handler);
/// let root = b.block(vec![try_stmt]);
/// let body = b.finish(root)?;
///
/// let tree = RegionBuilder::new().build(&body)?;
/// let finally = tree.children(tree.root())[0];
/// assert_eq!(tree.region(finally).map(|r| r.kind()), Some(RegionKind::Finally));
/// assert_eq!(tree.exception_clauses().len(), 1);
/// # Ok::<(), ehscope::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RegionTree {
    regions: Vec<Region>,
    instructions: Vec<Instruction>,
    method: StatementId,
}

impl RegionTree {
    pub(crate) fn new(
        regions: Vec<Region>,
        instructions: Vec<Instruction>,
        method: StatementId,
    ) -> Self {
        RegionTree {
            regions,
            instructions,
            method,
        }
    }

    /// Returns the method root region.
    #[must_use]
    pub fn root(&self) -> RegionId {
        RegionId::new(0)
    }

    /// Returns the root statement of the method this tree was built for.
    #[must_use]
    pub fn method(&self) -> StatementId {
        self.method
    }

    /// Looks up a region.
    #[must_use]
    pub fn region(&self, id: RegionId) -> Option<&Region> {
        self.regions.get(id.index())
    }

    /// Returns the children of `id` in document order; empty for unknown ids.
    #[must_use]
    pub fn children(&self, id: RegionId) -> &[RegionId] {
        self.region(id).map_or(&[], Region::children)
    }

    /// Returns the parent of `id`.
    #[must_use]
    pub fn parent(&self, id: RegionId) -> Option<RegionId> {
        self.region(id).and_then(Region::parent)
    }

    /// Iterates over all regions in pre-order, the root first.
    pub fn iter(&self) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter()
    }

    /// Returns the number of regions, the root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    /// Returns `true` if the tree has no regions. A built tree always has its root.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    /// Returns the laid out instruction stream the region offsets refer to.
    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    /// Returns the regions of the given kind in pre-order.
    pub fn regions_of_kind(&self, kind: RegionKind) -> impl Iterator<Item = &Region> + '_ {
        self.regions.iter().filter(move |r| r.kind == kind)
    }

    /// Returns the regions active at `offset`, innermost first, excluding the method root.
    #[must_use]
    pub fn active_at(&self, offset: usize) -> Vec<RegionId> {
        let mut active = Vec::new();
        let mut current = self.root();
        'descend: loop {
            for &child in self.children(current) {
                if self.region(child).is_some_and(|r| r.covers(offset)) {
                    active.push(child);
                    current = child;
                    continue 'descend;
                }
            }
            break;
        }
        active.reverse();
        active
    }

    /// Returns the exception clause table, inner clauses before outer ones.
    #[must_use]
    pub fn exception_clauses(&self) -> Vec<ExceptionClause> {
        clauses::collect(self)
    }

    /// Checks the structural invariants of the tree.
    ///
    /// The builder runs this when [`BuilderConfig::validate`](crate::BuilderConfig) is set;
    /// a tree that fails it was built from input the builder should have rejected.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::MalformedRegion`] describing the first violated invariant.
    pub fn validate(&self) -> Result<()> {
        let Some(root) = self.region(self.root()) else {
            return Err(malformed_region!("region tree has no root"));
        };
        if root.kind != RegionKind::Method || root.parent.is_some() {
            return Err(malformed_region!("root {} is not a method region", root));
        }
        if root.start != 0 || root.end != self.instructions.len() {
            return Err(malformed_region!(
                "root {} does not span all {} instructions",
                root,
                self.instructions.len()
            ));
        }

        for region in &self.regions {
            if region.is_empty() {
                return Err(malformed_region!("region {} is empty", region));
            }
            self.validate_children(region)?;
            match region.kind {
                RegionKind::Method if region.id != self.root() => {
                    return Err(malformed_region!("nested method region {}", region));
                }
                RegionKind::Catch | RegionKind::Filter => self.validate_handler_clause(region)?,
                RegionKind::Finally | RegionKind::Fault => self.validate_finally(region)?,
                _ => {}
            }
        }
        Ok(())
    }

    fn validate_children(&self, region: &Region) -> Result<()> {
        let mut previous_end = region.start;
        for &child_id in &region.children {
            let Some(child) = self.region(child_id) else {
                return Err(malformed_region!("{} has unknown child {}", region, child_id));
            };
            if child.parent != Some(region.id) {
                return Err(malformed_region!(
                    "{} lists {} as a child but it has parent {:?}",
                    region,
                    child,
                    child.parent
                ));
            }
            if child.start < previous_end || child.end > region.end {
                return Err(malformed_region!(
                    "{} overlaps a sibling or escapes its parent {}",
                    child,
                    region
                ));
            }
            previous_end = child.end;
        }
        Ok(())
    }

    fn validate_handler_clause(&self, region: &Region) -> Result<()> {
        let group = region.parent.and_then(|p| self.region(p));
        let Some(group) = group.filter(|g| g.kind == RegionKind::Try) else {
            return Err(malformed_region!("{} is not inside a catch group", region));
        };
        let position = group.children.iter().position(|&c| c == region.id);
        let Some(position) = position.filter(|&p| p > 0) else {
            return Err(malformed_region!("{} precedes the protected body", region));
        };

        let next = group.children.get(position + 1).and_then(|&c| self.region(c));
        let filtered = region.catch.as_ref().is_some_and(|c| c.filtered);
        match region.kind {
            RegionKind::Filter => match next {
                Some(handler)
                    if handler.kind == RegionKind::Catch && handler.start == region.end => {}
                _ => {
                    return Err(malformed_region!(
                        "filter {} is not immediately followed by its catch",
                        region
                    ))
                }
            },
            _ if filtered => {
                let previous = self.region(group.children[position - 1]);
                if !previous.is_some_and(|f| f.kind == RegionKind::Filter && f.end == region.start)
                {
                    return Err(malformed_region!(
                        "filtered catch {} has no preceding filter",
                        region
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn validate_finally(&self, region: &Region) -> Result<()> {
        let Some(handler) = region.handler else {
            return Err(malformed_region!("{} has no handler bounds", region));
        };
        let protected = region.children.first().and_then(|&c| self.region(c));
        let Some(protected) = protected.filter(|p| p.kind == RegionKind::Try) else {
            return Err(malformed_region!("{} does not wrap a try region", region));
        };
        if protected.start != region.start
            || protected.end != handler.start
            || handler.end != region.end
            || handler.start >= handler.end
        {
            return Err(malformed_region!(
                "{} handler [{}, {}) does not follow its protected region {}",
                region,
                handler.start,
                handler.end,
                protected
            ));
        }
        Ok(())
    }
}
