mod cli;
mod commands;
mod drag;
mod layout;
mod model;
mod rebalance;
mod storage;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();
    let args = cli::Cli::parse();
    let command = args.command.unwrap_or(cli::Command::List {
        day: None,
        search: None,
    });
    match command {
        cli::Command::Init { name } => commands::init(name),
        cli::Command::List { day, search } => commands::list(day, search),
        cli::Command::Add {
            description,
            minutes,
            priority,
            day,
            at,
        } => commands::add(description, minutes, priority, day, at),
        cli::Command::Edit {
            block_id,
            description,
            minutes,
            priority,
            day,
            toggle_complete,
            toggle_frozen,
        } => commands::edit(
            block_id,
            description,
            minutes,
            priority,
            day,
            toggle_complete,
            toggle_frozen,
        ),
        cli::Command::Remove { block_id } => commands::remove(block_id),
        cli::Command::Schedule { block_id } => commands::schedule(block_id),
        cli::Command::Columns { day } => commands::columns(day),
        cli::Command::Drag {
            block_id,
            mode,
            from,
            to,
            height,
        } => commands::drag(block_id, mode, from, to, height),
        cli::Command::Rebalance { day, from } => commands::rebalance(day, from),
        cli::Command::View { start, end, date } => commands::view(start, end, date),
    }
}

/// Logs go to stderr so command output on stdout stays parseable.
fn init_tracing() {
    let filter = EnvFilter::try_from_env("TIMEBLOCK_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
