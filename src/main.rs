//! Command-line front end.
//!
//! Mounts a table on a URL, serves the resulting request from an in-memory
//! page source and prints what the table would show:
//!
//! ```text
//! tablesync <url> [key=value ...]
//!
//!   data=<file.json>    rows to serve (JSON array); default: built-in sample
//!   config=<file.toml>  configuration file; other pairs are ignored
//!   color=<hex|oklch>   convert a color and exit
//!   <config key>=<v>    any `Config` field, e.g. server_filtering=true
//! ```
//!
//! Without `column_ids`, the columns are taken from the first row.
//!
//! Output is three lines: the canonical URL after the state settled, the
//! request query string, and the served page as JSON.

use futures_util::FutureExt;
use std::collections::BTreeMap;
use std::process::ExitCode;
use std::time::Instant;
use tablesync::app::{handle_event, Action, TableController, TableEvent};
use tablesync::query::{build_query_params, dispatch};
use tablesync::source::MemorySource;
use tablesync::sync::{History, MemoryHistory};
use tablesync::worker::FetchWorker;
use tablesync::{hex_to_oklch, oklch_to_hex, Config, Result};

const USAGE: &str = "usage: tablesync <url> [data=<file.json>] [config=<file.toml>] [color=<hex|oklch>] [key=value ...]";

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("tablesync: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<()> {
    let mut url = None;
    let mut pairs = BTreeMap::new();
    for arg in args {
        match arg.split_once('=') {
            Some((key, value)) if !arg.contains("://") => {
                pairs.insert(key.trim().to_string(), value.to_string());
            }
            _ => url = Some(arg.as_str()),
        }
    }

    if let Some(color) = pairs.get("color") {
        let converted = if color.trim_start().to_ascii_lowercase().starts_with("oklch") {
            oklch_to_hex(color)
        } else {
            hex_to_oklch(color)
        };
        println!("{converted}");
        return Ok(());
    }

    let Some(url) = url else {
        return Err(tablesync::TableSyncError::Config(USAGE.to_string()));
    };

    let mut config = match pairs.get("config") {
        Some(path) => Config::from_file(tablesync::infrastructure::expand_tilde(path))?,
        None => Config::from_map(&pairs),
    };
    tablesync::observability::init_tracing(&config);

    let source = match pairs.get("data") {
        Some(path) => MemorySource::from_file(tablesync::infrastructure::expand_tilde(path))?,
        None => MemorySource::sample(),
    };
    if config.column_ids.is_empty() {
        config.column_ids = source
            .rows()
            .first()
            .and_then(serde_json::Value::as_object)
            .map(|row| row.keys().cloned().collect())
            .unwrap_or_default();
    }
    let worker = FetchWorker::new(source, config.query_options());

    let history = MemoryHistory::parse(url)?;
    let mut table: TableController<_, serde_json::Value> =
        TableController::mount(&config, history, config.initial_state());

    let now = Instant::now();
    let mut pending = table.start(now);
    while let Some(action) = pending.pop() {
        match action {
            Action::Fetch(request) => {
                let Some(outcome) = dispatch(&worker, &request).now_or_never() else {
                    tracing::warn!(request_id = request.id, "fetch did not complete synchronously");
                    continue;
                };
                let (_, follow_up) = handle_event(&mut table, TableEvent::FetchCompleted(outcome), now)?;
                pending.extend(follow_up);
            }
            Action::Notify(toast) => {
                eprintln!(
                    "{}: {}",
                    toast.title.unwrap_or_default(),
                    toast.description.unwrap_or_default()
                );
            }
        }
    }
    table.flush_url(now);

    let params = build_query_params(&table.state(), &config.query_options());
    let page = table
        .result()
        .data
        .map(|page| serde_json::to_string_pretty(page.as_ref()))
        .transpose()?
        .unwrap_or_else(|| "null".to_string());

    println!("{}", table.history().location());
    println!("{params}");
    println!("{page}");
    Ok(())
}
