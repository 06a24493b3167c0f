use std::path::PathBuf;

use anyhow::{Context, Result};

use quiniela::config::{self, AppConfig};
use quiniela::db;
use quiniela::winners::{self, Declaration};

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

    match winners::declare_winners(&mut conn, week)? {
        Declaration::NoResults { week } => {
            println!("No results processed for week {week}; run process_results first");
        }
        Declaration::Declared { week, leagues } if leagues.is_empty() => {
            println!("Week {week}: no league had a correct pick, nothing declared");
        }
        Declaration::Declared { week, leagues } => {
            println!("Winners declared for week {week}");
            for league in leagues {
                let tie = if league.is_tie { " (tie)" } else { "" };
                println!(
                    " - {}: {} with {} points{tie}",
                    league.league_name,
                    league.winners.join(", "),
                    league.score
                );
            }
        }
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
