use crate::model::{BlockId, BlockPatch, TimeBlockEntry};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Packs the movable blocks of one day end to end starting at `forced_start`.
///
/// Frozen and completed blocks stay where they are and never appear in the
/// result. Frozen blocks are obstacles: a block whose slot would overlap one
/// starts at the end of the first overlapping frozen block instead, in the
/// order frozen blocks appear in `blocks`. That push is not re-checked, so a
/// block can still land on a second frozen block. The first movable block is
/// placed at `forced_start` without any frozen check.
///
/// Unscheduled blocks are ignored. Running it again on its own output is a
/// no-op only when the day has no frozen or completed blocks: an obstacle
/// that ties with or follows a movable block can become that block's
/// predecessor once re-sorted.
pub fn rebalance(blocks: &[TimeBlockEntry], forced_start: i64) -> HashMap<BlockId, BlockPatch> {
    let mut scheduled: Vec<(&TimeBlockEntry, i64)> = blocks
        .iter()
        .filter_map(|b| b.start.map(|start| (b, start)))
        .collect();
    scheduled.sort_by_key(|(_, start)| *start);

    let frozen: Vec<(i64, i64)> = blocks
        .iter()
        .filter(|b| b.frozen())
        .filter_map(|b| Some((b.start?, b.end_time()?)))
        .collect();

    let mut result = HashMap::new();
    // start of each sorted block after any reassignment so far
    let mut effective: Vec<i64> = scheduled.iter().map(|(_, start)| *start).collect();
    let mut last_movable_end: Option<i64> = None;

    for idx in 0..scheduled.len() {
        let (block, _) = scheduled[idx];
        if block.frozen() || block.complete() {
            continue;
        }

        let start = match last_movable_end {
            None => {
                let end = forced_start + block.duration * 1000;
                if first_conflict(&frozen, forced_start, end).is_some() {
                    warn!(id = %block.id, forced_start, "first rebalanced block overlaps a frozen block");
                }
                forced_start
            }
            Some(movable_end) => {
                let (prev, _) = scheduled[idx - 1];
                let possible_start = forced_start
                    .max(effective[idx - 1] + prev.duration * 1000)
                    .max(movable_end);
                let possible_end = possible_start + block.duration * 1000;
                match first_conflict(&frozen, possible_start, possible_end) {
                    Some(frozen_end) => frozen_end,
                    None => possible_start,
                }
            }
        };

        debug!(id = %block.id, start, "rebalanced");
        effective[idx] = start;
        last_movable_end = Some(start + block.duration * 1000);
        result.insert(block.id.clone(), BlockPatch::start(start));
    }
    result
}

/// End of the first frozen span overlapping `[start, end)`.
fn first_conflict(frozen: &[(i64, i64)], start: i64, end: i64) -> Option<i64> {
    frozen
        .iter()
        .find(|(frozen_start, frozen_end)| !(end <= *frozen_start || start >= *frozen_end))
        .map(|(_, frozen_end)| *frozen_end)
}
