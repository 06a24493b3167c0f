//! Lock pick submission shortly before the week's first kickoff.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use log::{info, warn};
use rusqlite::Connection;

use crate::Result;
use crate::config::{self, AppConfig};
use crate::espn::{self, GameSource, ScheduledGame};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockCheck {
    AlreadyLocked,
    Locked { deadline: DateTime<Utc> },
    NotYet { deadline: DateTime<Utc> },
    NoKickoffs,
    /// The week was auto-locked before and an admin reopened it.
    Reopened { week: u32 },
    /// Scoreboard unreachable; sample kickoffs are not a schedule.
    FeedUnavailable,
}

/// Earliest kickoff minus `lead`; games without a kickoff are ignored.
pub fn lock_deadline(games: &[ScheduledGame], lead: ChronoDuration) -> Option<DateTime<Utc>> {
    games
        .iter()
        .filter_map(|g| g.kickoff)
        .min()
        .map(|first| first - lead)
}

/// Lock `week` once its deadline has passed. Fires at most once per week, so a
/// manual unlock afterwards stays in place.
pub fn check_and_lock(
    conn: &Connection,
    week: u32,
    games: &[ScheduledGame],
    now: DateTime<Utc>,
    lead: ChronoDuration,
) -> Result<LockCheck> {
    if config::picks_locked(conn)? {
        return Ok(LockCheck::AlreadyLocked);
    }
    if config::autolocked_week(conn)? == Some(week) {
        return Ok(LockCheck::Reopened { week });
    }
    let Some(deadline) = lock_deadline(games, lead) else {
        return Ok(LockCheck::NoKickoffs);
    };
    if now < deadline {
        return Ok(LockCheck::NotYet { deadline });
    }
    config::set_picks_locked(conn, true)?;
    config::set_autolocked_week(conn, week)?;
    info!(
        "auto-locked picks for week {week}; deadline was {}",
        deadline.to_rfc3339()
    );
    Ok(LockCheck::Locked { deadline })
}

/// One auto-lock pass for the configured current week. Skips the scoreboard
/// request when there is nothing left to decide.
pub fn run_once(conn: &Connection, cfg: &AppConfig, now: DateTime<Utc>) -> Result<LockCheck> {
    if config::picks_locked(conn)? {
        return Ok(LockCheck::AlreadyLocked);
    }
    let week = config::current_week(conn)?;
    if config::autolocked_week(conn)? == Some(week) {
        return Ok(LockCheck::Reopened { week });
    }
    let games = espn::games_for_week(cfg, week);
    if games.source == GameSource::Fallback {
        warn!("week {week}: scoreboard unavailable, auto-lock skipped");
        return Ok(LockCheck::FeedUnavailable);
    }
    check_and_lock(
        conn,
        week,
        &games.games,
        now,
        ChronoDuration::minutes(cfg.autolock_lead_min),
    )
}
