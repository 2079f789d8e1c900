use crate::model::{BlockId, TimeBlockEntry};
use std::collections::HashMap;

/// Greedy column assignment for side-by-side rendering of one day.
///
/// Blocks are visited in start order (stable, so equal starts keep input
/// order). Each goes into the first column whose last block has ended by the
/// time it starts, or into a new column appended at the end. Unscheduled
/// blocks are ignored.
pub fn assign_columns(blocks: &[TimeBlockEntry]) -> HashMap<BlockId, usize> {
    let mut ordered: Vec<(&TimeBlockEntry, i64, i64)> = blocks
        .iter()
        .filter_map(|b| Some((b, b.start?, b.end_time()?)))
        .collect();
    ordered.sort_by_key(|(_, start, _)| *start);

    // end time of the last block placed in each column
    let mut column_ends: Vec<i64> = Vec::new();
    let mut columns = HashMap::with_capacity(ordered.len());
    for (block, start, end) in ordered {
        let idx = match column_ends.iter().position(|last_end| *last_end <= start) {
            Some(idx) => {
                column_ends[idx] = end;
                idx
            }
            None => {
                column_ends.push(end);
                column_ends.len() - 1
            }
        };
        columns.insert(block.id.clone(), idx);
    }
    columns
}

/// Number of columns a mapping from [`assign_columns`] needs.
pub fn column_count(columns: &HashMap<BlockId, usize>) -> usize {
    columns.values().max().map_or(0, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn block(id: &str, start: i64, duration: i64) -> TimeBlockEntry {
        let mut block = TimeBlockEntry::new(id.to_string(), id);
        block.start = Some(start * 1000);
        block.duration = duration;
        block
    }

    #[test]
    fn empty_and_single() {
        assert!(assign_columns(&[]).is_empty());
        let columns = assign_columns(&[block("a", 10, 60)]);
        assert_eq!(columns.get("a"), Some(&0));
        assert_eq!(column_count(&columns), 1);
    }

    #[test]
    fn overlapping_block_opens_second_column() {
        let blocks = vec![block("A", 0, 3600), block("B", 1800, 1800), block("C", 10800, 900)];
        let columns = assign_columns(&blocks);
        assert_eq!(columns["A"], 0);
        assert_eq!(columns["B"], 1);
        assert_eq!(columns["C"], 0);
    }

    #[test]
    fn touching_blocks_share_a_column() {
        let blocks = vec![block("b", 3600, 60), block("a", 0, 3600)];
        let columns = assign_columns(&blocks);
        assert_eq!(columns["a"], 0);
        assert_eq!(columns["b"], 0);
    }

    #[test]
    fn first_free_column_is_reused() {
        // a and b run in parallel; b ends first, so c lands in column 1
        let blocks = vec![
            block("a", 0, 7200),
            block("b", 0, 1800),
            block("c", 1800, 600),
        ];
        let columns = assign_columns(&blocks);
        assert_eq!(columns["a"], 0);
        assert_eq!(columns["b"], 1);
        assert_eq!(columns["c"], 1);
    }

    #[test]
    fn unscheduled_blocks_are_ignored() {
        let pool = TimeBlockEntry::new("pool".into(), "later");
        let columns = assign_columns(&[pool, block("a", 0, 60)]);
        assert_eq!(columns.len(), 1);
        assert!(!columns.contains_key("pool"));
    }

    #[test]
    fn zero_duration_blocks_stack_in_one_column() {
        let blocks = vec![block("a", 0, 0), block("b", 0, 0), block("c", 0, 60)];
        let columns = assign_columns(&blocks);
        assert_eq!(columns["a"], 0);
        assert_eq!(columns["b"], 0);
        assert_eq!(columns["c"], 0);
    }

    fn arb_blocks() -> impl Strategy<Value = Vec<TimeBlockEntry>> {
        prop::collection::vec((0i64..48, 0i64..8), 0..24).prop_map(|spans| {
            spans
                .into_iter()
                .enumerate()
                .map(|(idx, (slot, len))| block(&format!("b{idx}"), slot * 1800, len * 900))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn blocks_sharing_a_column_never_overlap(blocks in arb_blocks()) {
            let columns = assign_columns(&blocks);
            prop_assert_eq!(columns.len(), blocks.len());
            for a in &blocks {
                for b in &blocks {
                    if a.id != b.id && columns[&a.id] == columns[&b.id] {
                        prop_assert!(!a.overlaps(b), "{} and {} share a column", a.id, b.id);
                    }
                }
            }
        }

        #[test]
        fn assignment_is_deterministic(blocks in arb_blocks()) {
            prop_assert_eq!(assign_columns(&blocks), assign_columns(&blocks));
        }
    }
}
