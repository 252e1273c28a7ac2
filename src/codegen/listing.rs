//! Text listing of a region tree.
//!
//! Renders the instruction stream with the protected regions drawn as nested blocks, in the
//! style of an IL disassembler:
//!
//! ```text
//! .try
//! {
//!   IL_0000: code S0
//!   IL_0001: leave IL_0003
//! }  // end .try
//! finally
//! {
//!   IL_0002: endfinally
//! }  // end handler
//! IL_0003: ret
//! ```
//!
//! A catch group is drawn as its protected `.try` followed by its handlers; it only gets a
//! `.try` block of its own when a `finally` or `fault` protects it.

use std::fmt;

use crate::{
    codegen::format_offset,
    regions::{Region, RegionKind, RegionTree},
};

/// A bracketed block of the listing.
struct Block {
    start: usize,
    end: usize,
    order: usize,
    header: String,
    footer: &'static str,
}

fn block_of(tree: &RegionTree, region: &Region) -> Option<Block> {
    let (start, end) = (region.start(), region.end());
    let (start, end, header, footer) = match region.kind() {
        RegionKind::Method => return None,
        RegionKind::Try => {
            let is_group = tree.children(region.id()).iter().any(|&c| {
                tree.region(c)
                    .is_some_and(|r| matches!(r.kind(), RegionKind::Catch | RegionKind::Filter))
            });
            let protected_by_handler = region
                .parent()
                .and_then(|p| tree.region(p))
                .is_some_and(|p| p.kind().has_handler());
            if is_group && !protected_by_handler {
                return None;
            }
            (start, end, ".try".to_string(), ".try")
        }
        RegionKind::Catch => {
            let info = region.catch_info();
            let header = if info.is_some_and(|i| i.filtered) {
                "handler".to_string()
            } else {
                match info.and_then(|i| i.exception_type.as_ref()) {
                    Some(ty) => format!("catch {ty}"),
                    None => "catch [any]".to_string(),
                }
            };
            (start, end, header, "handler")
        }
        RegionKind::Filter => (start, end, "filter".to_string(), "filter"),
        RegionKind::Finally | RegionKind::Fault => {
            let handler = region.handler()?;
            let header = if region.kind() == RegionKind::Finally {
                "finally"
            } else {
                "fault"
            };
            (handler.start, handler.end, header.to_string(), "handler")
        }
    };

    Some(Block {
        start,
        end,
        order: region.id().index(),
        header,
        footer,
    })
}

impl fmt::Display for RegionTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut blocks: Vec<Block> = self.iter().filter_map(|r| block_of(self, r)).collect();
        blocks.sort_by(|a, b| {
            a.start
                .cmp(&b.start)
                .then(b.end.cmp(&a.end))
                .then(a.order.cmp(&b.order))
        });

        let instructions = self.instructions();
        let mut open: Vec<&Block> = Vec::new();
        let mut pending = blocks.iter().peekable();

        for offset in 0..=instructions.len() {
            while open.last().is_some_and(|b| b.end == offset) {
                if let Some(block) = open.pop() {
                    let indent = open.len() * 2;
                    writeln!(f, "{:indent$}}}  // end {}", "", block.footer)?;
                }
            }
            while let Some(block) = pending.next_if(|b| b.start == offset) {
                let indent = open.len() * 2;
                writeln!(f, "{:indent$}{}", "", block.header)?;
                writeln!(f, "{:indent$}{{", "")?;
                open.push(block);
            }
            if let Some(instruction) = instructions.get(offset) {
                let indent = open.len() * 2;
                writeln!(f, "{:indent$}{}: {}", "", format_offset(offset), instruction)?;
            }
        }

        Ok(())
    }
}
