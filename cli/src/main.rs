//! Command-line directory watcher.
//!
//! Subscribes to one directory for create/delete events and prints one
//! line per decoded event, either human-readable
//! (`file a.txt created`) or as JSON with `--json`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use dirnotify::{Interest, WatchChannel};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

/// Watch one directory for entry creation and deletion.
#[derive(Debug, Parser)]
#[command(name = "dirnotify", version, about)]
struct Args {
    /// Directory to watch.
    dir: PathBuf,

    /// Emit events as JSON objects instead of plain lines.
    #[arg(long)]
    json: bool,

    /// Per-poll deadline in milliseconds; without it, polls block
    /// indefinitely.
    #[arg(long)]
    timeout_ms: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let mut channel = WatchChannel::open().context("failed to open notification channel")?;
    channel
        .subscribe(&args.dir, Interest::default())
        .with_context(|| format!("failed to subscribe to {}", args.dir.display()))?;
    info!(dir = %args.dir.display(), "watching");

    loop {
        let events = match args.timeout_ms {
            Some(ms) => {
                match channel.poll_events_timeout(Duration::from_millis(ms))? {
                    Some(events) => events,
                    None => {
                        debug!("no events before the deadline, polling again");
                        continue;
                    }
                }
            }
            None => channel.poll_events()?,
        };

        for event in events {
            if args.json {
                println!("{}", serde_json::to_string(&event)?);
            } else {
                println!("{event}");
            }
        }
    }
}
