use std::path::PathBuf;

use anyhow::{Context, Result, bail};

use quiniela::config::{self, AppConfig};
use quiniela::db;
use quiniela::leagues;
use quiniela::standings::{self, StandingsScope};

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    let cfg = AppConfig::from_env();
    let db_path = flag_value("--db").map(PathBuf::from);
    let conn = db::open_configured(&cfg, db_path.as_deref())
        .context("unable to open sqlite database")?;
    let week = match flag_value("--week") {
        Some(raw) => raw.parse::<u32>().context("--week must be a number")?,
        None => config::current_week(&conn)?,
    };
    let (scope, label) = match flag_value("--league") {
        Some(code) => {
            let Some(league) = leagues::find_by_code(&conn, &code)? else {
                bail!("league code {code} not found");
            };
            (StandingsScope::League(league.id), league.name)
        }
        None => (StandingsScope::Global, "Global".to_string()),
    };

    let table = standings::standings(&conn, scope, Some(week))?;
    println!("Standings | {label} | week {week}");
    if table.is_empty() {
        println!("No picks yet");
        return Ok(());
    }
    println!("{:>3}  {:<20} {:>7} {:>5} {:>6}", "#", "User", "Correct", "Total", "%");
    for (idx, row) in table.iter().enumerate() {
        println!(
            "{:>3}  {:<20} {:>7} {:>5} {:>6.1}",
            idx + 1,
            row.username,
            row.correct_picks,
            row.total_picks,
            row.percentage
        );
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
