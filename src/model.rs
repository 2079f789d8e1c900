use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub type BlockId = String;

pub const DEFAULT_PRIORITY: u8 = 5;
pub const DEFAULT_DURATION_SECS: i64 = 60 * 60;
pub const DEFAULT_VIEW_START: &str = "08:00";
pub const DEFAULT_VIEW_END: &str = "18:00";

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;
const CLOCK_FORMAT: &str = "%H:%M";

/// A named, dated collection of time blocks plus the visible window of each day.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TaskList {
    pub name: String,
    /// Calendar date of day 0. Day `n` is `date + n` days.
    pub date: NaiveDate,
    pub view_start: String,
    pub view_end: String,
    #[serde(default)]
    pub time_block_entries: Vec<TimeBlockEntry>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TimeBlockEntry {
    pub id: BlockId,
    pub description: String,
    /// Seconds. A top-edge drag past the bottom edge can leave this negative.
    pub duration: i64,
    /// Epoch milliseconds; `None` keeps the block in the unscheduled pool.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<i64>,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub day: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_complete: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_frozen: Option<bool>,
}

/// Sparse field update for a single block. `None` leaves the field untouched.
///
/// `start` is doubly optional so a patch can also unschedule a block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlockPatch {
    pub description: Option<String>,
    pub duration: Option<i64>,
    pub start: Option<Option<i64>>,
    pub priority: Option<u8>,
    pub day: Option<u32>,
    pub is_complete: Option<bool>,
    pub is_frozen: Option<bool>,
}

#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum TaskListError {
    #[error("block not found: {0}")]
    BlockNotFound(String),
    #[error("duplicate block id: {0}")]
    DuplicateId(String),
    #[error("invalid time (use HH:MM): {0}")]
    InvalidTime(String),
    #[error("invalid view: {0}")]
    InvalidView(String),
    #[error("duration must not be negative, got {0}s")]
    NegativeDuration(i64),
    #[error("priority must be between 1 and 5, got {0}")]
    InvalidPriority(u8),
    #[error("unknown drag mode (use top, bottom or all): {0}")]
    InvalidDragMode(String),
}

fn default_priority() -> u8 {
    DEFAULT_PRIORITY
}

impl TimeBlockEntry {
    pub fn new(id: BlockId, description: impl Into<String>) -> Self {
        TimeBlockEntry {
            id,
            description: description.into(),
            duration: DEFAULT_DURATION_SECS,
            start: None,
            priority: DEFAULT_PRIORITY,
            day: 0,
            is_complete: None,
            is_frozen: None,
        }
    }

    pub fn is_scheduled(&self) -> bool {
        self.start.is_some()
    }

    /// End of the block in epoch milliseconds, only defined once scheduled.
    pub fn end_time(&self) -> Option<i64> {
        self.start.map(|start| start + self.duration * 1000)
    }

    pub fn complete(&self) -> bool {
        self.is_complete.unwrap_or(false)
    }

    pub fn frozen(&self) -> bool {
        self.is_frozen.unwrap_or(false)
    }

    /// Half-open interval overlap. Touching blocks do not overlap.
    pub fn overlaps(&self, other: &TimeBlockEntry) -> bool {
        match (self.start, self.end_time(), other.start, other.end_time()) {
            (Some(a_start), Some(a_end), Some(b_start), Some(b_end)) => {
                !(a_end <= b_start || a_start >= b_end)
            }
            _ => false,
        }
    }
}

impl BlockPatch {
    pub fn start(start: i64) -> Self {
        BlockPatch {
            start: Some(Some(start)),
            ..BlockPatch::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == BlockPatch::default()
    }

    pub fn apply_to(&self, block: &mut TimeBlockEntry) {
        if let Some(description) = &self.description {
            block.description = description.clone();
        }
        if let Some(duration) = self.duration {
            block.duration = duration;
        }
        if let Some(start) = self.start {
            block.start = start;
        }
        if let Some(priority) = self.priority {
            block.priority = priority;
        }
        if let Some(day) = self.day {
            block.day = day;
        }
        if let Some(complete) = self.is_complete {
            block.is_complete = Some(complete);
        }
        if let Some(frozen) = self.is_frozen {
            block.is_frozen = Some(frozen);
        }
    }
}

impl TaskList {
    pub fn default_named(name: impl Into<String>, date: NaiveDate) -> Self {
        TaskList {
            name: name.into(),
            date,
            view_start: DEFAULT_VIEW_START.into(),
            view_end: DEFAULT_VIEW_END.into(),
            time_block_entries: Vec::new(),
        }
    }

    pub fn blocks(&self) -> &[TimeBlockEntry] {
        &self.time_block_entries
    }

    pub fn get(&self, id: &str) -> Option<&TimeBlockEntry> {
        self.time_block_entries.iter().find(|b| b.id == id)
    }

    pub fn add(&mut self, entry: TimeBlockEntry) -> Result<(), TaskListError> {
        if self.get(&entry.id).is_some() {
            return Err(TaskListError::DuplicateId(entry.id));
        }
        validate_priority(entry.priority)?;
        validate_duration(entry.duration)?;
        self.time_block_entries.push(entry);
        Ok(())
    }

    pub fn remove(&mut self, id: &str) -> Option<TimeBlockEntry> {
        let idx = self.time_block_entries.iter().position(|b| b.id == id)?;
        Some(self.time_block_entries.remove(idx))
    }

    /// Applies `patch` to the block with `id`. Unknown ids are ignored and
    /// reported by returning `false`.
    pub fn apply_patch(&mut self, id: &str, patch: &BlockPatch) -> bool {
        match self.time_block_entries.iter_mut().find(|b| b.id == id) {
            Some(block) => {
                patch.apply_to(block);
                true
            }
            None => false,
        }
    }

    /// Returns how many patches found their block.
    pub fn apply_patch_bulk(&mut self, patches: &HashMap<BlockId, BlockPatch>) -> usize {
        patches
            .iter()
            .filter(|(id, patch)| self.apply_patch(id, patch))
            .count()
    }

    /// All blocks on `day`, scheduled or not, in collection order.
    pub fn blocks_for_day(&self, day: u32) -> Vec<TimeBlockEntry> {
        self.time_block_entries
            .iter()
            .filter(|b| b.day == day)
            .cloned()
            .collect()
    }

    pub fn scheduled_for_day(&self, day: u32) -> Vec<TimeBlockEntry> {
        self.time_block_entries
            .iter()
            .filter(|b| b.day == day && b.is_scheduled())
            .cloned()
            .collect()
    }

    /// Unscheduled pool ordered by priority. Equal priorities keep insertion order.
    pub fn unscheduled(&self) -> Vec<&TimeBlockEntry> {
        let mut pool: Vec<&TimeBlockEntry> = self
            .time_block_entries
            .iter()
            .filter(|b| !b.is_scheduled())
            .collect();
        pool.sort_by_key(|b| b.priority);
        pool
    }

    pub fn search(&self, text: &str) -> Vec<&TimeBlockEntry> {
        self.time_block_entries
            .iter()
            .filter(|b| b.description.contains(text))
            .collect()
    }

    pub fn day_origin_ms(&self, day: u32) -> i64 {
        self.date.and_time(NaiveTime::MIN).and_utc().timestamp_millis() + i64::from(day) * MS_PER_DAY
    }

    /// Visible `[start, end]` of `day` in epoch milliseconds.
    pub fn view_window(&self, day: u32) -> Result<(i64, i64), TaskListError> {
        let start = clock_offset_ms(&self.view_start)?;
        let end = clock_offset_ms(&self.view_end)?;
        if end <= start {
            return Err(TaskListError::InvalidView(format!(
                "end {} is not after start {}",
                self.view_end, self.view_start
            )));
        }
        let origin = self.day_origin_ms(day);
        Ok((origin + start, origin + end))
    }

    /// Where a newly scheduled block on `day` goes: after everything already
    /// scheduled that day, but never before the view start.
    pub fn next_open_start(&self, day: u32) -> Result<i64, TaskListError> {
        let (view_start, _) = self.view_window(day)?;
        Ok(self
            .time_block_entries
            .iter()
            .filter(|b| b.day == day)
            .filter_map(|b| b.end_time())
            .fold(view_start, i64::max))
    }

    /// Epoch milliseconds for `clock` (HH:MM) on `day`.
    pub fn time_on_day(&self, day: u32, clock: &str) -> Result<i64, TaskListError> {
        Ok(self.day_origin_ms(day) + clock_offset_ms(clock)?)
    }
}

pub fn validate_priority(priority: u8) -> Result<(), TaskListError> {
    if (1..=5).contains(&priority) {
        Ok(())
    } else {
        Err(TaskListError::InvalidPriority(priority))
    }
}

/// Stored durations are never negative; only drag output may dip below zero.
pub fn validate_duration(duration: i64) -> Result<(), TaskListError> {
    if duration >= 0 {
        Ok(())
    } else {
        Err(TaskListError::NegativeDuration(duration))
    }
}

pub fn parse_clock(input: &str) -> Result<NaiveTime, TaskListError> {
    NaiveTime::parse_from_str(input.trim(), CLOCK_FORMAT)
        .map_err(|_| TaskListError::InvalidTime(input.to_string()))
}

fn clock_offset_ms(input: &str) -> Result<i64, TaskListError> {
    let time = parse_clock(input)?;
    Ok(i64::from(time.num_seconds_from_midnight()) * 1000)
}

/// Formats epoch milliseconds as a UTC `HH:MM` clock reading.
pub fn format_clock(ms: i64) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.format(CLOCK_FORMAT).to_string(),
        None => "--:--".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> TaskList {
        TaskList::default_named("test", NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
    }

    fn scheduled(id: &str, start: i64, duration: i64) -> TimeBlockEntry {
        let mut block = TimeBlockEntry::new(id.to_string(), id);
        block.start = Some(start);
        block.duration = duration;
        block
    }

    #[test]
    fn end_time_only_for_scheduled_blocks() {
        let block = TimeBlockEntry::new("a".into(), "write");
        assert!(!block.is_scheduled());
        assert_eq!(block.end_time(), None);

        let block = scheduled("b", 1_000, 60);
        assert!(block.is_scheduled());
        assert_eq!(block.end_time(), Some(61_000));
    }

    #[test]
    fn touching_blocks_do_not_overlap() {
        let a = scheduled("a", 0, 3600);
        let b = scheduled("b", 3_600_000, 600);
        let c = scheduled("c", 1_800_000, 600);
        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(!a.overlaps(&TimeBlockEntry::new("d".into(), "pool")));
    }

    #[test]
    fn add_rejects_duplicate_ids_and_bad_priority() {
        let mut list = list();
        list.add(TimeBlockEntry::new("a".into(), "one")).unwrap();
        assert_eq!(
            list.add(TimeBlockEntry::new("a".into(), "two")),
            Err(TaskListError::DuplicateId("a".into()))
        );
        let mut bad = TimeBlockEntry::new("b".into(), "bad");
        bad.priority = 9;
        assert_eq!(list.add(bad), Err(TaskListError::InvalidPriority(9)));
    }

    #[test]
    fn add_rejects_negative_duration() {
        let mut list = list();
        let mut block = TimeBlockEntry::new("neg".into(), "backwards");
        block.duration = -5400;
        assert_eq!(list.add(block), Err(TaskListError::NegativeDuration(-5400)));
        assert!(list.get("neg").is_none());

        let mut empty = TimeBlockEntry::new("zero".into(), "marker");
        empty.duration = 0;
        assert!(list.add(empty).is_ok());
    }

    #[test]
    fn patches_on_unknown_ids_are_ignored() {
        let mut list = list();
        list.add(scheduled("a", 0, 60)).unwrap();
        assert!(!list.apply_patch("missing", &BlockPatch::start(5)));

        let mut bulk = HashMap::new();
        bulk.insert("a".to_string(), BlockPatch::start(7));
        bulk.insert("ghost".to_string(), BlockPatch::start(9));
        assert_eq!(list.apply_patch_bulk(&bulk), 1);
        assert_eq!(list.get("a").unwrap().start, Some(7));
    }

    #[test]
    fn patch_can_unschedule() {
        let mut list = list();
        list.add(scheduled("a", 0, 60)).unwrap();
        let patch = BlockPatch {
            start: Some(None),
            is_frozen: Some(true),
            ..BlockPatch::default()
        };
        assert!(list.apply_patch("a", &patch));
        let block = list.get("a").unwrap();
        assert!(!block.is_scheduled());
        assert!(block.frozen());
        assert!(!block.complete());
    }

    #[test]
    fn unscheduled_pool_sorts_by_priority_stably() {
        let mut list = list();
        for (id, priority) in [("a", 3), ("b", 1), ("c", 3), ("d", 2)] {
            let mut block = TimeBlockEntry::new(id.into(), id);
            block.priority = priority;
            list.add(block).unwrap();
        }
        list.add(scheduled("e", 0, 60)).unwrap();
        let ids: Vec<&str> = list.unscheduled().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn view_window_follows_day_offset() {
        let list = list();
        assert_eq!(list.view_window(0), Ok((8 * 3_600_000, 18 * 3_600_000)));
        assert_eq!(
            list.view_window(1),
            Ok((MS_PER_DAY + 8 * 3_600_000, MS_PER_DAY + 18 * 3_600_000))
        );
    }

    #[test]
    fn inverted_view_is_rejected() {
        let mut list = list();
        list.view_end = "07:00".into();
        assert!(matches!(list.view_window(0), Err(TaskListError::InvalidView(_))));
        list.view_end = "later".into();
        assert!(matches!(list.view_window(0), Err(TaskListError::InvalidTime(_))));
    }

    #[test]
    fn next_open_start_stacks_after_same_day_blocks() {
        let mut list = list();
        assert_eq!(list.next_open_start(0), Ok(8 * 3_600_000));

        list.add(scheduled("a", 9 * 3_600_000, 1800)).unwrap();
        let mut other_day = scheduled("b", 23 * 3_600_000, 1800);
        other_day.day = 1;
        list.add(other_day).unwrap();
        assert_eq!(list.next_open_start(0), Ok(9 * 3_600_000 + 1_800_000));

        // blocks ending before the view start do not pull it earlier
        list.apply_patch("a", &BlockPatch::start(0));
        assert_eq!(list.next_open_start(0), Ok(8 * 3_600_000));
    }

    #[test]
    fn clock_formatting_is_utc() {
        assert_eq!(format_clock(9 * 3_600_000 + 30 * 60_000), "09:30");
        assert_eq!(parse_clock(" 13:05 ").unwrap().num_seconds_from_midnight(), 47_100);
        assert!(parse_clock("25:00").is_err());
    }

    #[test]
    fn serializes_with_original_field_names() {
        let mut list = list();
        let mut block = scheduled("a", 0, 60);
        block.is_frozen = Some(true);
        list.add(block).unwrap();
        let yaml = serde_yaml::to_string(&list).unwrap();
        assert!(yaml.contains("timeBlockEntries"));
        assert!(yaml.contains("isFrozen: true"));
        assert!(!yaml.contains("isComplete"));
        let back: TaskList = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(back, list);
    }
}
