use crate::drag::{DragGesture, DragMode, TimeScale};
use crate::layout::{assign_columns, column_count};
use crate::model::{format_clock, BlockPatch, TaskList, TaskListError, TimeBlockEntry};
use crate::rebalance::rebalance as rebalance_day;
use crate::storage::{init_project_list, load_list, locate_list, save_list, ListLocation, ListScope};
use anyhow::{anyhow, bail, Context, Result};
use chrono::NaiveDate;
use rand::{distributions::Alphanumeric, Rng};
use std::collections::{BTreeSet, HashSet};
use std::env;
use tracing::info;

pub fn init(name: Option<String>) -> Result<()> {
    let location = init_project_list(name)?;
    println!("Initialized task list at {}", location.path.display());
    Ok(())
}

pub fn list(day: Option<u32>, search: Option<String>) -> Result<()> {
    let (list, location) = load_current_list()?;
    println!(
        "Tasks: {} ({}) {} view {}-{}",
        list.name,
        match location.scope {
            ListScope::Project => "project",
            ListScope::Global => "global",
        },
        list.date,
        list.view_start,
        list.view_end
    );
    let hits: Option<HashSet<&str>> = search
        .as_deref()
        .map(|text| list.search(text).into_iter().map(|b| b.id.as_str()).collect());
    let matches = |block: &TimeBlockEntry| {
        hits.as_ref()
            .map_or(true, |ids| ids.contains(block.id.as_str()))
    };

    let days: BTreeSet<u32> = list
        .blocks()
        .iter()
        .filter(|b| b.is_scheduled())
        .map(|b| b.day)
        .filter(|d| day.map_or(true, |only| only == *d))
        .collect();
    for d in days {
        let mut scheduled = list.scheduled_for_day(d);
        let columns = assign_columns(&scheduled);
        scheduled.sort_by_key(|b| b.start);
        println!("Day {} ({} columns)", d, column_count(&columns));
        for block in scheduled.iter().filter(|b| matches(*b)) {
            let clashes = scheduled
                .iter()
                .any(|other| other.id != block.id && other.overlaps(block));
            print_scheduled(block, columns.get(&block.id).copied().unwrap_or(0), clashes);
        }
        println!();
    }

    let pool: Vec<&TimeBlockEntry> = list
        .unscheduled()
        .into_iter()
        .filter(|b| day.map_or(true, |only| only == b.day))
        .filter(|b| matches(*b))
        .collect();
    println!("Unscheduled");
    if pool.is_empty() {
        println!("  (empty)");
    }
    for block in pool {
        print_unscheduled(block);
    }
    Ok(())
}

pub fn add(
    description: String,
    minutes: i64,
    priority: u8,
    day: u32,
    at: Option<String>,
) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    let start = match at.as_deref() {
        Some(clock) => Some(list.time_on_day(day, clock)?),
        None => None,
    };
    let id = generate_id();
    let mut block = TimeBlockEntry::new(id.clone(), description);
    block.duration = minutes_to_secs(minutes)?;
    block.priority = priority;
    block.day = day;
    block.start = start;
    list.add(block)
        .with_context(|| format!("adding block {}", id))?;
    save_list(&location, &list)?;
    info!(%id, day, "added block");
    println!("Added block {}", id);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn edit(
    block_id: String,
    description: Option<String>,
    minutes: Option<i64>,
    priority: Option<u8>,
    day: Option<u32>,
    toggle_complete: bool,
    toggle_frozen: bool,
) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    let current = list
        .get(&block_id)
        .ok_or_else(|| TaskListError::BlockNotFound(block_id.clone()))?;
    let duration = minutes.map(minutes_to_secs).transpose()?;
    let patch = BlockPatch {
        description,
        duration,
        priority,
        day,
        is_complete: toggle_complete.then(|| !current.complete()),
        is_frozen: toggle_frozen.then(|| !current.frozen()),
        ..BlockPatch::default()
    };
    if patch.is_empty() {
        bail!("nothing to change for block {}", block_id);
    }
    list.apply_patch(&block_id, &patch);
    save_list(&location, &list)?;
    println!("Updated block {}", block_id);
    Ok(())
}

pub fn remove(block_id: String) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    list.remove(&block_id)
        .ok_or_else(|| TaskListError::BlockNotFound(block_id.clone()))?;
    save_list(&location, &list)?;
    info!(id = %block_id, "removed block");
    println!("Removed block {}", block_id);
    Ok(())
}

pub fn schedule(block_id: String) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    let block = list
        .get(&block_id)
        .ok_or_else(|| TaskListError::BlockNotFound(block_id.clone()))?;
    let start = if block.is_scheduled() {
        None
    } else {
        Some(list.next_open_start(block.day)?)
    };
    list.apply_patch(
        &block_id,
        &BlockPatch {
            start: Some(start),
            ..BlockPatch::default()
        },
    );
    save_list(&location, &list)?;
    match start {
        Some(ms) => println!("Scheduled block {} at {}", block_id, format_clock(ms)),
        None => println!("Unscheduled block {}", block_id),
    }
    Ok(())
}

pub fn columns(day: u32) -> Result<()> {
    let (list, _) = load_current_list()?;
    let mut scheduled = list.scheduled_for_day(day);
    let columns = assign_columns(&scheduled);
    scheduled.sort_by_key(|b| b.start);
    println!("Day {}: {} columns", day, column_count(&columns));
    for block in &scheduled {
        if let Some(col) = columns.get(&block.id) {
            println!("  {} -> {} ({})", block.id, col, time_range(block));
        }
    }
    Ok(())
}

pub fn drag(block_id: String, mode: DragMode, from: f64, to: f64, height: f64) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    let gesture = DragGesture::begin(&list, &block_id, mode, from)
        .ok_or_else(|| anyhow!("block {} not found or not scheduled", block_id))?;
    let day = list.get(&block_id).map(|b| b.day).unwrap_or_default();
    let scale = TimeScale::for_day(&list, day, height)
        .with_context(|| format!("building time scale for day {}", day))?;
    if !gesture.update(&mut list, &scale, to) {
        bail!("block {} not found", block_id);
    }
    save_list(&location, &list)?;
    if let Some(block) = list.get(&block_id) {
        let top = block.start.map(|ms| scale.pixel_at(ms)).unwrap_or_default();
        println!(
            "Dragged block {} to {} (top at {:.0})",
            block_id,
            time_range(block),
            top
        );
    }
    Ok(())
}

pub fn rebalance(day: u32, from: Option<String>) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    let forced_start = match from.as_deref() {
        Some(clock) => list.time_on_day(day, clock)?,
        None => list.view_window(day)?.0,
    };
    let updates = rebalance_day(&list.blocks_for_day(day), forced_start);
    let applied = list.apply_patch_bulk(&updates);
    save_list(&location, &list)?;
    info!(day, applied, forced_start, "rebalanced day");
    println!(
        "Rebalanced {} blocks on day {} from {}",
        applied,
        day,
        format_clock(forced_start)
    );
    Ok(())
}

pub fn view(start: Option<String>, end: Option<String>, date: Option<String>) -> Result<()> {
    let (mut list, location) = load_current_list()?;
    let changed = start.is_some() || end.is_some() || date.is_some();
    if let Some(s) = start {
        list.view_start = s.trim().to_string();
    }
    if let Some(e) = end {
        list.view_end = e.trim().to_string();
    }
    if let Some(d) = date {
        list.date = NaiveDate::parse_from_str(d.trim(), "%Y-%m-%d")
            .map_err(|_| anyhow!("invalid date format (use YYYY-MM-DD): {}", d))?;
    }
    list.view_window(0)?;
    if changed {
        save_list(&location, &list)?;
    }
    println!("{} view {}-{}", list.date, list.view_start, list.view_end);
    Ok(())
}

fn load_current_list() -> Result<(TaskList, ListLocation)> {
    let cwd = env::current_dir()?;
    let location = locate_list(&cwd)?;
    let list = load_list(&location)?;
    Ok((list, location))
}

fn minutes_to_secs(minutes: i64) -> Result<i64> {
    minutes
        .checked_mul(60)
        .ok_or_else(|| anyhow!("duration of {} minutes is too long", minutes))
}

fn generate_id() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect()
}

fn time_range(block: &TimeBlockEntry) -> String {
    match (block.start, block.end_time()) {
        (Some(start), Some(end)) => format!("{}-{}", format_clock(start), format_clock(end)),
        _ => "unscheduled".to_string(),
    }
}

fn flags(block: &TimeBlockEntry) -> String {
    let mut out = String::new();
    if block.frozen() {
        out.push_str(" [frozen]");
    }
    if block.complete() {
        out.push_str(" [done]");
    }
    out
}

fn print_scheduled(block: &TimeBlockEntry, column: usize, clashes: bool) {
    println!(
        "  [{}] {} {}: {} (p{}){}{}",
        column,
        time_range(block),
        block.id,
        block.description,
        block.priority,
        flags(block),
        if clashes { " [overlap]" } else { "" }
    );
}

fn print_unscheduled(block: &TimeBlockEntry) {
    println!(
        "  - {}: {} (p{}, {}m, day {}){}",
        block.id,
        block.description,
        block.priority,
        block.duration / 60,
        block.day,
        flags(block)
    );
}
