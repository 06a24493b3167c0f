use std::path::PathBuf;

use anyhow::{Context, Result};

use quiniela::config::{self, AppConfig};
use quiniela::db;
use quiniela::espn::GameSource;
use quiniela::results;

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    let db_path = flag_value("--db").map(PathBuf::from);
    let mut conn = db::open_configured(&cfg, db_path.as_deref())
        .context("unable to open sqlite database")?;
    let week = match flag_value("--week") {
        Some(raw) => raw.parse::<u32>().context("--week must be a number")?,
        None => config::current_week(&conn)?,
    };

    let summary = results::process_week(&mut conn, &cfg, week)?;

    println!("Results processed for week {}", summary.week);
    println!(
        "Source: {}",
        match summary.source {
            GameSource::Live => "ESPN scoreboard",
            GameSource::Fallback => "built-in sample games (scoreboard unavailable)",
        }
    );
    println!("Completed games in feed: {}", summary.completed_in_feed);
    println!(
        "Written: {} ({} new, {} updated)",
        summary.written(),
        summary.created,
        summary.updated
    );
    println!("Unchanged: {}", summary.unchanged);
    if summary.skipped > 0 {
        println!("Skipped (incomplete data): {}", summary.skipped);
    }
    if summary.completed_in_feed == 0 {
        println!("No completed games yet for week {}", summary.week);
    }

    Ok(())
}

fn flag_value(flag: &str) -> Option<String> {
    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let prefix = format!("{flag}=");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&prefix) {
            let trimmed = value.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
        if arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.trim().to_string());
            }
        }
    }
    None
}
