use crate::drag::DragMode;
use clap::{Parser, Subcommand};

pub const DEFAULT_TRACK_HEIGHT: f64 = 600.0;
/// Longest block accepted on the command line (one week).
pub const MAX_MINUTES: i64 = 7 * 24 * 60;

#[derive(Parser, Debug)]
#[command(name = "timeblock", version, about = "Plan a day as packed time blocks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Initialize a task list in the current directory
    Init {
        /// Optional list name
        #[arg(long)]
        name: Option<String>,
    },
    /// Show the timeline and the unscheduled pool
    List {
        /// Only show one day
        #[arg(long)]
        day: Option<u32>,
        /// Only show blocks whose description contains this text
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a new block
    Add {
        /// What the block is for
        description: String,
        /// Length in minutes
        #[arg(long, default_value_t = 60, value_parser = clap::value_parser!(i64).range(0..=MAX_MINUTES))]
        minutes: i64,
        /// 1 (highest) to 5
        #[arg(long, default_value_t = 5, value_parser = clap::value_parser!(u8).range(1..=5))]
        priority: u8,
        /// Day lane
        #[arg(long, default_value_t = 0)]
        day: u32,
        /// Schedule at this time (HH:MM); unscheduled otherwise
        #[arg(long)]
        at: Option<String>,
    },
    /// Edit an existing block
    Edit {
        /// Block id to edit
        block_id: String,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New length in minutes
        #[arg(long, value_parser = clap::value_parser!(i64).range(0..=MAX_MINUTES))]
        minutes: Option<i64>,
        /// New priority
        #[arg(long, value_parser = clap::value_parser!(u8).range(1..=5))]
        priority: Option<u8>,
        /// Move to another day lane
        #[arg(long)]
        day: Option<u32>,
        /// Flip the completed flag
        #[arg(long)]
        toggle_complete: bool,
        /// Flip the frozen flag
        #[arg(long)]
        toggle_frozen: bool,
    },
    /// Delete a block
    Remove {
        /// Block id to delete
        block_id: String,
    },
    /// Schedule an unscheduled block after the day's last block, or unschedule it
    Schedule {
        /// Block id to toggle
        block_id: String,
    },
    /// Print the column each scheduled block is drawn in
    Columns {
        #[arg(long, default_value_t = 0)]
        day: u32,
    },
    /// Apply one drag step to a block
    Drag {
        /// Block id being dragged
        block_id: String,
        /// top, bottom or all
        #[arg(long)]
        mode: DragMode,
        /// Pointer position when the drag began
        #[arg(long)]
        from: f64,
        /// Current pointer position
        #[arg(long)]
        to: f64,
        /// Track height the positions are measured against
        #[arg(long, default_value_t = DEFAULT_TRACK_HEIGHT)]
        height: f64,
    },
    /// Pack a day's movable blocks end to end
    Rebalance {
        #[arg(long, default_value_t = 0)]
        day: u32,
        /// Start packing here (HH:MM); defaults to the view start
        #[arg(long)]
        from: Option<String>,
    },
    /// Show or change the visible window
    View {
        /// Window start (HH:MM)
        #[arg(long)]
        start: Option<String>,
        /// Window end (HH:MM)
        #[arg(long)]
        end: Option<String>,
        /// Date of day 0 (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
}
