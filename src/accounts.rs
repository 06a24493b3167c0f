use chrono::Utc;
use log::info;
use rusqlite::{Connection, OptionalExtension, params};
use sha2::{Digest, Sha256};

use crate::config::AppConfig;
use crate::db::{self, USER_COLUMNS, User, user_from_row};
use crate::leagues;
use crate::{QuinielaError, Result};

const MIN_USERNAME_LEN: usize = 3;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone, Default)]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    pub first_name: String,
    pub last_name: String,
    pub league_code: String,
}

/// Hex SHA-256, unsalted; matches the hashes already stored for existing users.
pub fn hash_password(password: &str) -> String {
    format!("{:x}", Sha256::digest(password.as_bytes()))
}

pub fn verify_password(user: &User, password: &str) -> bool {
    user.password_hash == hash_password(password)
}

/// Create a member account and its first league membership in one transaction.
pub fn register_user(conn: &mut Connection, reg: &Registration) -> Result<User> {
    let username = reg.username.trim();
    let password = reg.password.trim();
    let league_code = reg.league_code.trim().to_ascii_uppercase();

    if username.is_empty() {
        return Err(QuinielaError::Validation("username is required".into()));
    }
    if username.chars().count() < MIN_USERNAME_LEN {
        return Err(QuinielaError::Validation(format!(
            "username must have at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if password.is_empty() {
        return Err(QuinielaError::Validation("password is required".into()));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(QuinielaError::Validation(format!(
            "password must have at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if password != reg.confirm_password.trim() {
        return Err(QuinielaError::Validation("passwords do not match".into()));
    }
    if league_code.is_empty() {
        return Err(QuinielaError::Validation("league code is required".into()));
    }

    if db::find_user_by_username(conn, username)?.is_some() {
        return Err(QuinielaError::UsernameTaken(username.to_string()));
    }
    let league = leagues::find_active_by_code(conn, &league_code)?
        .ok_or_else(|| QuinielaError::UnknownLeagueCode(league_code.clone()))?;

    let tx = conn.transaction()?;
    let now = Utc::now().to_rfc3339();
    tx.execute(
        "INSERT INTO users (username, password_hash, first_name, last_name, is_admin, created_at)
         VALUES (?1, ?2, ?3, ?4, 0, ?5)",
        params![
            username,
            hash_password(password),
            non_empty(&reg.first_name),
            non_empty(&reg.last_name),
            now,
        ],
    )?;
    let user_id = tx.last_insert_rowid();
    tx.execute(
        "INSERT INTO league_memberships (user_id, league_id, joined_at, is_active)
         VALUES (?1, ?2, ?3, 1)",
        params![user_id, league.id, now],
    )?;
    tx.commit()?;

    info!("registered {username} into league {}", league.code);
    db::find_user(conn, user_id)
}

pub fn authenticate(conn: &Connection, username: &str, password: &str) -> Result<Option<User>> {
    let user = db::find_user_by_username(conn, username.trim())?;
    Ok(user.filter(|u| verify_password(u, password)))
}

/// Insert a user directly; used for seeding admins and by tests.
pub fn create_user(
    conn: &Connection,
    username: &str,
    password: &str,
    is_admin: bool,
) -> Result<User> {
    if db::find_user_by_username(conn, username)?.is_some() {
        return Err(QuinielaError::UsernameTaken(username.to_string()));
    }
    conn.execute(
        "INSERT INTO users (username, password_hash, is_admin, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            username,
            hash_password(password),
            db::bool_to_i64(is_admin),
            Utc::now().to_rfc3339()
        ],
    )?;
    db::find_user(conn, conn.last_insert_rowid())
}

/// Returns the existing admin, or creates one when a password is configured.
pub fn ensure_default_admin(conn: &Connection, cfg: &AppConfig) -> Result<Option<User>> {
    let existing = conn
        .query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE is_admin = 1 ORDER BY id LIMIT 1"),
            [],
            user_from_row,
        )
        .optional()?;
    if existing.is_some() {
        return Ok(existing);
    }
    let Some(password) = cfg.admin_password.as_deref() else {
        return Ok(None);
    };
    let admin = create_user(conn, &cfg.admin_username, password, true)?;
    info!("seeded admin account {}", admin.username);
    Ok(Some(admin))
}

pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
    let rows = stmt.query_map([], user_from_row)?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

fn non_empty(s: &str) -> Option<&str> {
    let s = s.trim();
    if s.is_empty() { None } else { Some(s) }
}

#[cfg(test)]
mod tests {
    use super::hash_password;

    #[test]
    fn hash_is_hex_sha256() {
        assert_eq!(
            hash_password("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
