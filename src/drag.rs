use crate::model::{BlockId, BlockPatch, TaskList, TaskListError, TimeBlockEntry};
use std::str::FromStr;
use tracing::debug;

/// Granularity every dragged time snaps to.
pub const SNAP_MS: i64 = 30 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragMode {
    /// Resize from the start edge.
    Top,
    /// Resize from the end edge.
    Bottom,
    /// Move the whole block.
    All,
}

impl FromStr for DragMode {
    type Err = TaskListError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" => Ok(DragMode::Top),
            "bottom" => Ok(DragMode::Bottom),
            "all" => Ok(DragMode::All),
            other => Err(TaskListError::InvalidDragMode(other.to_string())),
        }
    }
}

/// Linear mapping between a time window and a vertical track.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeScale {
    domain_start: i64,
    domain_end: i64,
    height: f64,
}

impl TimeScale {
    pub fn new(domain_start: i64, domain_end: i64, height: f64) -> Result<Self, TaskListError> {
        if domain_end <= domain_start {
            return Err(TaskListError::InvalidView(
                "time scale domain must end after it starts".to_string(),
            ));
        }
        if !(height.is_finite() && height > 0.0) {
            return Err(TaskListError::InvalidView(format!(
                "track height must be positive, got {height}"
            )));
        }
        Ok(TimeScale {
            domain_start,
            domain_end,
            height,
        })
    }

    /// Scale over the view window of `day`.
    pub fn for_day(list: &TaskList, day: u32, height: f64) -> Result<Self, TaskListError> {
        let (start, end) = list.view_window(day)?;
        TimeScale::new(start, end, height)
    }

    fn span(&self) -> f64 {
        (self.domain_end - self.domain_start) as f64
    }

    pub fn pixel_at(&self, ms: i64) -> f64 {
        (ms - self.domain_start) as f64 * self.height / self.span()
    }

    /// Inverse of [`TimeScale::pixel_at`]; positions outside the track extrapolate.
    pub fn time_at(&self, y: f64) -> i64 {
        self.domain_start + (y * self.span() / self.height).round() as i64
    }
}

/// Rounds to the nearest [`SNAP_MS`] boundary. Exact midpoints go to the later slot.
pub fn snap(ms: i64) -> i64 {
    let floor = ms.div_euclid(SNAP_MS) * SNAP_MS;
    if (ms - floor) * 2 < SNAP_MS {
        floor
    } else {
        floor + SNAP_MS
    }
}

/// Computes the new start/duration of `block` for one pointer position.
///
/// `drag_start_time` is the block's start when the gesture began and is only
/// read in [`DragMode::All`]. Durations are not clamped: dragging the top edge
/// below the bottom edge yields a negative duration. Unscheduled blocks give
/// an empty patch.
///
/// Millisecond offsets become whole seconds by flooring (`div_euclid`). Snapped
/// times are whole seconds, so for a start with a sub-second remainder the
/// resized end lands on the old end rounded up to the next whole second.
pub fn apply_drag(
    block: &TimeBlockEntry,
    mode: DragMode,
    scale: &TimeScale,
    drag_start_y: f64,
    current_y: f64,
    drag_start_time: i64,
) -> BlockPatch {
    let Some(start) = block.start else {
        return BlockPatch::default();
    };
    match mode {
        DragMode::Top => {
            let new_start = snap(scale.time_at(current_y));
            BlockPatch {
                start: Some(Some(new_start)),
                duration: Some(block.duration - (new_start - start).div_euclid(1000)),
                ..BlockPatch::default()
            }
        }
        DragMode::Bottom => {
            let new_end = snap(scale.time_at(current_y));
            BlockPatch {
                duration: Some((new_end - start).div_euclid(1000)),
                ..BlockPatch::default()
            }
        }
        DragMode::All => {
            let delta = scale.time_at(current_y) - scale.time_at(drag_start_y);
            BlockPatch::start(snap(drag_start_time + delta))
        }
    }
}

/// State captured when a drag begins; each pointer move calls [`DragGesture::update`].
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    pub block_id: BlockId,
    pub mode: DragMode,
    pub start_y: f64,
    pub start_time: i64,
}

impl DragGesture {
    /// `None` when the block does not exist or has no place on the timeline.
    pub fn begin(list: &TaskList, block_id: &str, mode: DragMode, start_y: f64) -> Option<Self> {
        let start_time = list.get(block_id)?.start?;
        Some(DragGesture {
            block_id: block_id.to_string(),
            mode,
            start_y,
            start_time,
        })
    }

    /// Applies the gesture at `current_y` to the block as currently stored.
    /// Returns `false` when the block has disappeared since the drag began.
    pub fn update(&self, list: &mut TaskList, scale: &TimeScale, current_y: f64) -> bool {
        let Some(block) = list.get(&self.block_id) else {
            debug!(id = %self.block_id, "drag target vanished");
            return false;
        };
        let patch = apply_drag(block, self.mode, scale, self.start_y, current_y, self.start_time);
        debug!(id = %self.block_id, mode = ?self.mode, ?patch, "drag step");
        list.apply_patch(&self.block_id, &patch)
    }
}
