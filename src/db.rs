//! SQLite storage: schema bootstrap, row types and the small lookups shared by
//! the other modules.

use std::path::Path;

use rusqlite::{Connection, OptionalExtension, Row, params};

use crate::config::{self, AppConfig};
use crate::selection::{TeamSelection, normalize_str};
use crate::{QuinielaError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub is_admin: bool,
    pub created_at: String,
}

impl User {
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) if !first.is_empty() && !last.is_empty() => {
                format!("{first} {last}")
            }
            _ => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: Option<String>,
    pub created_by: i64,
    pub is_active: bool,
    pub max_members: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickRow {
    pub id: i64,
    pub user_id: i64,
    pub league_id: i64,
    pub week: u32,
    pub game_id: String,
    pub selection: Option<String>,
    pub team_name: Option<String>,
    pub team_abbreviation: Option<String>,
}

impl PickRow {
    /// The structured columns win; legacy rows fall back to the raw selection.
    pub fn team(&self) -> TeamSelection {
        match (&self.team_name, &self.team_abbreviation) {
            (Some(name), Some(abbr)) => TeamSelection::new(name.clone(), abbr.clone()),
            _ => normalize_str(self.selection.as_deref().unwrap_or_default()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameResult {
    pub week: u32,
    pub game_id: String,
    pub winner: String,
    pub home_team: Option<String>,
    pub away_team: Option<String>,
    pub home_score: Option<i64>,
    pub away_score: Option<i64>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WinnerRow {
    pub user_id: i64,
    pub league_id: i64,
    pub week: u32,
    pub winner_username: String,
    pub score: u32,
    pub is_tie: bool,
    pub declared_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Stats {
    pub users: u64,
    pub leagues: u64,
    pub picks_this_week: u64,
    pub results_this_week: u64,
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode = WAL;")?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Open the configured database, or `override_path` when given.
pub fn open_configured(cfg: &AppConfig, override_path: Option<&Path>) -> Result<Connection> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(|| cfg.db_path.clone())
        .ok_or(QuinielaError::NotFound("database path"))?;
    open_db(&path)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            first_name TEXT NULL,
            last_name TEXT NULL,
            is_admin INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS leagues (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            description TEXT NULL,
            created_by INTEGER NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            max_members INTEGER NOT NULL DEFAULT 50,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS league_memberships (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            league_id INTEGER NOT NULL REFERENCES leagues(id),
            joined_at TEXT NOT NULL,
            is_active INTEGER NOT NULL DEFAULT 1,
            UNIQUE(user_id, league_id)
        );

        CREATE TABLE IF NOT EXISTS picks (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL REFERENCES users(id),
            league_id INTEGER NOT NULL REFERENCES leagues(id),
            week INTEGER NOT NULL,
            game_id TEXT NOT NULL,
            selection TEXT NULL,
            team_name TEXT NULL,
            team_abbreviation TEXT NULL,
            created_at TEXT NOT NULL,
            UNIQUE(user_id, league_id, week, game_id)
        );
        CREATE INDEX IF NOT EXISTS idx_picks_league_week ON picks(league_id, week);

        CREATE TABLE IF NOT EXISTS game_results (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            week INTEGER NOT NULL,
            game_id TEXT NOT NULL,
            winner TEXT NOT NULL,
            home_team TEXT NULL,
            away_team TEXT NULL,
            home_score INTEGER NULL,
            away_score INTEGER NULL,
            updated_at TEXT NOT NULL,
            UNIQUE(game_id, week)
        );

        CREATE TABLE IF NOT EXISTS winners_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            league_id INTEGER NOT NULL,
            week INTEGER NOT NULL,
            winner_username TEXT NOT NULL,
            score INTEGER NOT NULL,
            is_tie INTEGER NOT NULL DEFAULT 0,
            declared_at TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_winners_league_week ON winners_history(league_id, week);

        CREATE TABLE IF NOT EXISTS system_config (
            config_key TEXT PRIMARY KEY,
            config_value TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );
        "#,
    )?;
    config::initialize_system_config(conn)?;
    Ok(())
}

pub(crate) fn bool_to_i64(v: bool) -> i64 {
    if v { 1 } else { 0 }
}

pub(crate) const USER_COLUMNS: &str =
    "id, username, password_hash, first_name, last_name, is_admin, created_at";

pub(crate) fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        first_name: row.get(3)?,
        last_name: row.get(4)?,
        is_admin: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

pub(crate) const LEAGUE_COLUMNS: &str =
    "id, name, code, description, created_by, is_active, max_members, created_at";

pub(crate) fn league_from_row(row: &Row<'_>) -> rusqlite::Result<League> {
    Ok(League {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        description: row.get(3)?,
        created_by: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
        max_members: row.get::<_, u32>(6)?,
        created_at: row.get(7)?,
    })
}

pub(crate) const PICK_COLUMNS: &str =
    "id, user_id, league_id, week, game_id, selection, team_name, team_abbreviation";

pub(crate) fn pick_from_row(row: &Row<'_>) -> rusqlite::Result<PickRow> {
    Ok(PickRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        league_id: row.get(2)?,
        week: row.get::<_, u32>(3)?,
        game_id: row.get(4)?,
        selection: row.get(5)?,
        team_name: row.get(6)?,
        team_abbreviation: row.get(7)?,
    })
}

pub fn find_user(conn: &Connection, user_id: i64) -> Result<User> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![user_id],
        user_from_row,
    )
    .optional()?
    .ok_or(QuinielaError::NotFound("user"))
}

pub fn find_user_by_username(conn: &Connection, username: &str) -> Result<Option<User>> {
    let user = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()?;
    Ok(user)
}

pub fn find_league(conn: &Connection, league_id: i64) -> Result<League> {
    conn.query_row(
        &format!("SELECT {LEAGUE_COLUMNS} FROM leagues WHERE id = ?1"),
        params![league_id],
        league_from_row,
    )
    .optional()?
    .ok_or(QuinielaError::NotFound("league"))
}

pub fn results_for_week(conn: &Connection, week: u32) -> Result<Vec<GameResult>> {
    let mut stmt = conn.prepare(
        "SELECT week, game_id, winner, home_team, away_team, home_score, away_score, updated_at
         FROM game_results WHERE week = ?1 ORDER BY game_id",
    )?;
    let rows = stmt.query_map(params![week], |row| {
        Ok(GameResult {
            week: row.get::<_, u32>(0)?,
            game_id: row.get(1)?,
            winner: row.get(2)?,
            home_team: row.get(3)?,
            away_team: row.get(4)?,
            home_score: row.get(5)?,
            away_score: row.get(6)?,
            updated_at: row.get(7)?,
        })
    })?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn count_results_for_week(conn: &Connection, week: u32) -> Result<u64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM game_results WHERE week = ?1",
        params![week],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(n.max(0) as u64)
}

pub fn stats(conn: &Connection, week: u32) -> Result<Stats> {
    let count = |sql: &str| -> Result<u64> {
        let n = conn.query_row(sql, [], |row| row.get::<_, i64>(0))?;
        Ok(n.max(0) as u64)
    };
    let picks_this_week = conn.query_row(
        "SELECT COUNT(*) FROM picks WHERE week = ?1",
        params![week],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(Stats {
        users: count("SELECT COUNT(*) FROM users WHERE is_admin = 0")?,
        leagues: count("SELECT COUNT(*) FROM leagues WHERE is_active = 1")?,
        picks_this_week: picks_this_week.max(0) as u64,
        results_this_week: count_results_for_week(conn, week)?,
    })
}

#[cfg(test)]
mod tests {
    use super::{PickRow, User, open_in_memory, stats};
    use crate::selection::TeamSelection;

    #[test]
    fn schema_bootstraps_twice() {
        let conn = open_in_memory().expect("db");
        super::init_schema(&conn).expect("idempotent schema");
        let s = stats(&conn, 1).expect("stats");
        assert_eq!(s.users, 0);
        assert_eq!(s.results_this_week, 0);
    }

    #[test]
    fn pick_prefers_structured_columns() {
        let mut row = PickRow {
            id: 1,
            user_id: 1,
            league_id: 1,
            week: 1,
            game_id: "g".to_string(),
            selection: Some("Kansas City Chiefs".to_string()),
            team_name: Some("Kansas City Chiefs".to_string()),
            team_abbreviation: Some("KC".to_string()),
        };
        assert_eq!(row.team(), TeamSelection::new("Kansas City Chiefs", "KC"));

        row.team_name = None;
        row.team_abbreviation = None;
        assert_eq!(row.team(), TeamSelection::literal("Kansas City Chiefs"));
    }

    #[test]
    fn full_name_falls_back_to_username() {
        let mut user = User {
            id: 1,
            username: "pepe".to_string(),
            password_hash: String::new(),
            first_name: Some("Pepe".to_string()),
            last_name: None,
            is_admin: false,
            created_at: String::new(),
        };
        assert_eq!(user.full_name(), "pepe");
        user.last_name = Some("Lopez".to_string());
        assert_eq!(user.full_name(), "Pepe Lopez");
    }
}
