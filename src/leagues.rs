use chrono::Utc;
use log::info;
use rand::Rng;
use rusqlite::{Connection, OptionalExtension, params};

use crate::db::{self, LEAGUE_COLUMNS, League, USER_COLUMNS, User, league_from_row, user_from_row};
use crate::{QuinielaError, Result};

const CODE_LEN: usize = 6;
const MAX_CODE_LEN: usize = 10;
pub const DEFAULT_MAX_MEMBERS: u32 = 50;

#[derive(Debug, Clone, Default)]
pub struct NewLeague {
    pub name: String,
    /// Generated when empty.
    pub code: Option<String>,
    pub description: Option<String>,
    pub max_members: Option<u32>,
}

/// Admin edit of a league; every field is replaced.
#[derive(Debug, Clone)]
pub struct LeagueUpdate {
    pub name: String,
    pub description: Option<String>,
    pub max_members: u32,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinOutcome {
    Joined,
    Reactivated,
}

pub fn create_league(conn: &Connection, created_by: i64, new: &NewLeague) -> Result<League> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(QuinielaError::Validation("league name is required".into()));
    }
    let code = match new.code.as_deref().map(str::trim).filter(|c| !c.is_empty()) {
        Some(code) => {
            let code = code.to_ascii_uppercase();
            if code.len() > MAX_CODE_LEN {
                return Err(QuinielaError::Validation(format!(
                    "league code must have at most {MAX_CODE_LEN} characters"
                )));
            }
            if code_exists(conn, &code)? {
                return Err(QuinielaError::LeagueCodeTaken(code));
            }
            code
        }
        None => generate_league_code(conn)?,
    };
    let description = new
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let max_members = validate_max_members(new.max_members.unwrap_or(DEFAULT_MAX_MEMBERS))?;

    conn.execute(
        "INSERT INTO leagues (name, code, description, created_by, is_active, max_members, created_at)
         VALUES (?1, ?2, ?3, ?4, 1, ?5, ?6)",
        params![
            name,
            code,
            description,
            created_by,
            max_members,
            Utc::now().to_rfc3339(),
        ],
    )?;
    let league = db::find_league(conn, conn.last_insert_rowid())?;
    info!("created league {} ({})", league.name, league.code);
    Ok(league)
}

pub fn update_league(conn: &Connection, league_id: i64, update: &LeagueUpdate) -> Result<League> {
    let name = update.name.trim();
    if name.is_empty() {
        return Err(QuinielaError::Validation("league name is required".into()));
    }
    let max_members = validate_max_members(update.max_members)?;
    let description = update
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    db::find_league(conn, league_id)?;

    conn.execute(
        "UPDATE leagues SET name = ?1, description = ?2, max_members = ?3, is_active = ?4
         WHERE id = ?5",
        params![
            name,
            description,
            max_members,
            i64::from(update.is_active),
            league_id
        ],
    )?;
    let league = db::find_league(conn, league_id)?;
    info!(
        "updated league {} ({}){}",
        league.name,
        league.code,
        if league.is_active { "" } else { ", inactive" }
    );
    Ok(league)
}

fn validate_max_members(max_members: u32) -> Result<u32> {
    if max_members < 1 {
        return Err(QuinielaError::Validation(
            "max members must be at least 1".into(),
        ));
    }
    Ok(max_members)
}

/// Six random uppercase letters not used by any league yet.
pub fn generate_league_code(conn: &Connection) -> Result<String> {
    let mut rng = rand::thread_rng();
    loop {
        let code: String = (0..CODE_LEN)
            .map(|_| char::from(b'A' + rng.gen_range(0..26u8)))
            .collect();
        if !code_exists(conn, &code)? {
            return Ok(code);
        }
    }
}

fn code_exists(conn: &Connection, code: &str) -> Result<bool> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM leagues WHERE code = ?1",
        params![code],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(n > 0)
}

pub fn find_by_code(conn: &Connection, code: &str) -> Result<Option<League>> {
    let league = conn
        .query_row(
            &format!("SELECT {LEAGUE_COLUMNS} FROM leagues WHERE code = ?1"),
            params![code.trim().to_ascii_uppercase()],
            league_from_row,
        )
        .optional()?;
    Ok(league)
}

pub fn find_active_by_code(conn: &Connection, code: &str) -> Result<Option<League>> {
    Ok(find_by_code(conn, code)?.filter(|l| l.is_active))
}

pub fn member_count(conn: &Connection, league_id: i64) -> Result<u32> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM league_memberships WHERE league_id = ?1 AND is_active = 1",
        params![league_id],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(n.max(0) as u32)
}

pub fn is_active_member(conn: &Connection, user_id: i64, league_id: i64) -> Result<bool> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM league_memberships
         WHERE user_id = ?1 AND league_id = ?2 AND is_active = 1",
        params![user_id, league_id],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(n > 0)
}

pub fn join_league_by_code(conn: &Connection, user_id: i64, code: &str) -> Result<JoinOutcome> {
    let code = code.trim().to_ascii_uppercase();
    let league = find_active_by_code(conn, &code)?
        .ok_or_else(|| QuinielaError::UnknownLeagueCode(code.clone()))?;
    db::find_user(conn, user_id)?;
    attach_member(conn, user_id, &league, true)
}

/// Admin path: add a user to a league by id.
pub fn add_member(conn: &Connection, user_id: i64, league_id: i64) -> Result<JoinOutcome> {
    let league = db::find_league(conn, league_id)?;
    db::find_user(conn, user_id)?;
    attach_member(conn, user_id, &league, false)
}

fn attach_member(
    conn: &Connection,
    user_id: i64,
    league: &League,
    enforce_limit: bool,
) -> Result<JoinOutcome> {
    let existing = conn
        .query_row(
            "SELECT is_active FROM league_memberships WHERE user_id = ?1 AND league_id = ?2",
            params![user_id, league.id],
            |row| row.get::<_, i64>(0),
        )
        .optional()?;
    let now = Utc::now().to_rfc3339();

    match existing {
        Some(active) if active != 0 => Err(QuinielaError::AlreadyMember {
            league: league.name.clone(),
        }),
        Some(_) => {
            conn.execute(
                "UPDATE league_memberships SET is_active = 1, joined_at = ?1
                 WHERE user_id = ?2 AND league_id = ?3",
                params![now, user_id, league.id],
            )?;
            info!("reactivated user {user_id} in league {}", league.code);
            Ok(JoinOutcome::Reactivated)
        }
        None => {
            if enforce_limit && member_count(conn, league.id)? >= league.max_members {
                return Err(QuinielaError::LeagueFull {
                    league: league.name.clone(),
                    max_members: league.max_members,
                });
            }
            conn.execute(
                "INSERT INTO league_memberships (user_id, league_id, joined_at, is_active)
                 VALUES (?1, ?2, ?3, 1)",
                params![user_id, league.id, now],
            )?;
            info!("user {user_id} joined league {}", league.code);
            Ok(JoinOutcome::Joined)
        }
    }
}

/// Memberships are deactivated, never deleted, so picks keep their league.
pub fn remove_member(conn: &Connection, user_id: i64, league_id: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE league_memberships SET is_active = 0
         WHERE user_id = ?1 AND league_id = ?2 AND is_active = 1",
        params![user_id, league_id],
    )?;
    if changed == 0 {
        return Err(QuinielaError::NotAMember { user_id, league_id });
    }
    info!("removed user {user_id} from league {league_id}");
    Ok(())
}

/// Admins see every league; members see the leagues they are active in.
pub fn user_leagues(conn: &Connection, user_id: i64) -> Result<Vec<League>> {
    let user = db::find_user(conn, user_id)?;
    let sql = if user.is_admin {
        format!("SELECT {LEAGUE_COLUMNS} FROM leagues ORDER BY created_at DESC, id DESC")
    } else {
        let cols = LEAGUE_COLUMNS
            .split(", ")
            .map(|c| format!("l.{c}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "SELECT {cols} FROM leagues l
             JOIN league_memberships m ON m.league_id = l.id
             WHERE m.user_id = ?1 AND m.is_active = 1
             ORDER BY m.joined_at DESC, m.id DESC"
        )
    };
    let mut stmt = conn.prepare(&sql)?;
    let rows = if user.is_admin {
        stmt.query_map([], league_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
    } else {
        stmt.query_map(params![user_id], league_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };
    Ok(rows)
}

pub fn all_leagues(conn: &Connection) -> Result<Vec<League>> {
    let mut stmt = conn.prepare(&format!("SELECT {LEAGUE_COLUMNS} FROM leagues ORDER BY id"))?;
    let rows = stmt
        .query_map([], league_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Active members in user id order.
pub fn league_members(conn: &Connection, league_id: i64) -> Result<Vec<User>> {
    let cols = USER_COLUMNS
        .split(", ")
        .map(|c| format!("u.{c}"))
        .collect::<Vec<_>>()
        .join(", ");
    let mut stmt = conn.prepare(&format!(
        "SELECT {cols} FROM users u
         JOIN league_memberships m ON m.user_id = u.id
         WHERE m.league_id = ?1 AND m.is_active = 1
         ORDER BY u.id"
    ))?;
    let rows = stmt
        .query_map(params![league_id], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
