use serde::Serialize;

use crate::model::{Resource, ResourceId};

use super::placement::clip;
use super::{ResourceIndex, TimelineWindow};

/// A room block drawn on its row. Same clipping rules as booking bars.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockPlacement {
    pub resource_id: ResourceId,
    pub row: usize,
    pub column_start: u32,
    pub column_end: u32,
    pub clipped_left: bool,
    pub clipped_right: bool,
    pub reason: Option<String>,
}

/// Blocks of every visible row, sorted by `(row, column_start)`.
pub fn block_placements(index: &ResourceIndex, window: &TimelineWindow) -> Vec<BlockPlacement> {
    let mut out: Vec<BlockPlacement> = index
        .rows()
        .iter()
        .enumerate()
        .flat_map(|(row, resource)| {
            resource.blocks.iter().filter_map(move |block| {
                let span = clip(block.start, block.end, window)?;
                Some(BlockPlacement {
                    resource_id: resource.id.clone(),
                    row,
                    column_start: span.column_start,
                    column_end: span.column_end,
                    clipped_left: span.clipped_left,
                    clipped_right: span.clipped_right,
                    reason: block.reason.clone(),
                })
            })
        })
        .collect();
    out.sort_by_key(|b| (b.row, b.column_start));
    out
}

/// Visible columns of `resource`'s row covered by any block.
pub fn blocked_columns(resource: &Resource, window: &TimelineWindow) -> Vec<u32> {
    let mut columns: Vec<u32> = resource
        .blocks
        .iter()
        .filter_map(|b| clip(b.start, b.end, window))
        .flat_map(|span| span.column_start..span.column_end)
        .collect();
    columns.sort_unstable();
    columns.dedup();
    columns
}
