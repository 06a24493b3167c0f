//! Weekly NFL pick'em pools ("quinielas").
//!
//! Users join leagues by invite code, pick winners for the week's games and are
//! ranked by how many picks matched the ingested results.

pub mod accounts;
pub mod autolock;
pub mod config;
pub mod db;
pub mod espn;
pub mod fallback_games;
pub mod http_client;
pub mod leagues;
pub mod picks;
pub mod results;
pub mod selection;
pub mod standings;
pub mod state;
pub mod teams;
pub mod winners;
pub mod worker;

use thiserror::Error;

/// Lowest and highest regular-season week an admin may select.
pub const FIRST_WEEK: u32 = 1;
pub const LAST_WEEK: u32 = 18;

#[derive(Debug, Error)]
pub enum QuinielaError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("week {0} is outside 1..=18")]
    InvalidWeek(u32),

    #[error("picks are locked for week {week}")]
    PicksLocked { week: u32 },

    #[error("{0}")]
    Validation(String),

    #[error("username {0} already exists")]
    UsernameTaken(String),

    #[error("league code {0} not found or inactive")]
    UnknownLeagueCode(String),

    #[error("league code {0} is already in use")]
    LeagueCodeTaken(String),

    #[error("user is already a member of {league}")]
    AlreadyMember { league: String },

    #[error("league {league} reached its limit of {max_members} members")]
    LeagueFull { league: String, max_members: u32 },

    #[error("user {user_id} is not a member of league {league_id}")]
    NotAMember { user_id: i64, league_id: i64 },

    #[error("unknown team {0}")]
    UnknownTeam(String),

    #[error("{0} not found")]
    NotFound(&'static str),
}

pub type Result<T> = std::result::Result<T, QuinielaError>;
