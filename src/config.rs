use std::env;
use std::path::PathBuf;

use chrono::{Datelike, Utc};
use log::info;
use rusqlite::{Connection, OptionalExtension, params};

use crate::{FIRST_WEEK, LAST_WEEK, QuinielaError, Result};

const APP_DIR: &str = "quiniela";
const DB_FILE: &str = "quiniela.sqlite";
const DEFAULT_ESPN_BASE_URL: &str = "https://site.api.espn.com";
const DEFAULT_AUTOLOCK_LEAD_MIN: i64 = 60;

pub const KEY_CURRENT_WEEK: &str = "current_week";
pub const KEY_PICKS_LOCKED: &str = "picks_locked";
pub const KEY_AUTOLOCK_WEEK: &str = "autolock_week";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub espn_base_url: String,
    pub season: i32,
    pub http_timeout_secs: u64,
    pub autolock_enabled: bool,
    pub autolock_lead_min: i64,
    pub autolock_poll_secs: u64,
    pub admin_username: String,
    pub admin_password: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let db_path = env::var("QUINIELA_DB")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or_else(default_db_path);
        let espn_base_url = env::var("ESPN_BASE_URL")
            .ok()
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| DEFAULT_ESPN_BASE_URL.to_string());
        let season = env::var("QUINIELA_SEASON")
            .ok()
            .and_then(|v| v.trim().parse::<i32>().ok())
            .unwrap_or_else(|| Utc::now().year());
        let http_timeout_secs = env::var("HTTP_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(10)
            .clamp(2, 60);
        let autolock_lead_min = env::var("AUTOLOCK_LEAD_MIN")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(DEFAULT_AUTOLOCK_LEAD_MIN)
            .clamp(0, 24 * 60);
        let autolock_poll_secs = env::var("AUTOLOCK_POLL_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(60)
            .max(10);
        let admin_username = env::var("QUINIELA_ADMIN_USER")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "admin".to_string());
        let admin_password = env::var("QUINIELA_ADMIN_PASSWORD")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            db_path,
            espn_base_url,
            season,
            http_timeout_secs,
            autolock_enabled: env_bool("AUTOLOCK_ENABLED", true),
            autolock_lead_min,
            autolock_poll_secs,
            admin_username,
            admin_password,
        }
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_data_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_data_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_DATA_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(
        PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR),
    )
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_ascii_lowercase())
        .map(|v| matches!(v.as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

// System config rows, read fresh on every call.

pub fn get_config(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT config_value FROM system_config WHERE config_key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    Ok(value)
}

pub fn set_config(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO system_config (config_key, config_value, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(config_key) DO UPDATE SET
            config_value = excluded.config_value,
            updated_at = excluded.updated_at",
        params![key, value, Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub fn current_week(conn: &Connection) -> Result<u32> {
    let week = get_config(conn, KEY_CURRENT_WEEK)?
        .and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|w| (FIRST_WEEK..=LAST_WEEK).contains(w))
        .unwrap_or(FIRST_WEEK);
    Ok(week)
}

pub fn validate_week(week: u32) -> Result<u32> {
    if (FIRST_WEEK..=LAST_WEEK).contains(&week) {
        Ok(week)
    } else {
        Err(QuinielaError::InvalidWeek(week))
    }
}

pub fn set_current_week(conn: &Connection, week: u32) -> Result<()> {
    let week = validate_week(week)?;
    set_config(conn, KEY_CURRENT_WEEK, &week.to_string())?;
    info!("current week set to {week}");
    Ok(())
}

pub fn picks_locked(conn: &Connection) -> Result<bool> {
    Ok(get_config(conn, KEY_PICKS_LOCKED)?.as_deref().map(str::trim) == Some("1"))
}

pub fn set_picks_locked(conn: &Connection, locked: bool) -> Result<()> {
    set_config(conn, KEY_PICKS_LOCKED, if locked { "1" } else { "0" })?;
    info!("picks {}", if locked { "locked" } else { "unlocked" });
    Ok(())
}

/// Flip the lock and return the new state.
pub fn toggle_picks_lock(conn: &Connection) -> Result<bool> {
    let next = !picks_locked(conn)?;
    set_picks_locked(conn, next)?;
    Ok(next)
}

/// Week the auto-lock last fired for, if any.
pub fn autolocked_week(conn: &Connection) -> Result<Option<u32>> {
    Ok(get_config(conn, KEY_AUTOLOCK_WEEK)?.and_then(|v| v.trim().parse::<u32>().ok()))
}

pub fn set_autolocked_week(conn: &Connection, week: u32) -> Result<()> {
    set_config(conn, KEY_AUTOLOCK_WEEK, &week.to_string())
}

/// Seed default rows without overwriting existing ones.
pub fn initialize_system_config(conn: &Connection) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    for (key, value) in [(KEY_CURRENT_WEEK, "1"), (KEY_PICKS_LOCKED, "0")] {
        conn.execute(
            "INSERT OR IGNORE INTO system_config (config_key, config_value, updated_at)
             VALUES (?1, ?2, ?3)",
            params![key, value, now],
        )?;
    }
    Ok(())
}
