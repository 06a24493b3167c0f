use std::collections::HashMap;

use chrono::Utc;
use log::{info, warn};
use rusqlite::{Connection, params};

use crate::config;
use crate::db::{self, PICK_COLUMNS, PickRow, pick_from_row};
use crate::leagues;
use crate::selection::{TeamSelection, is_correct};
use crate::teams;
use crate::{QuinielaError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickEntry {
    pub game_id: String,
    pub selection: String,
}

impl PickEntry {
    pub fn new(game_id: impl Into<String>, selection: impl Into<String>) -> Self {
        Self {
            game_id: game_id.into(),
            selection: selection.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmitSummary {
    pub week: u32,
    pub saved: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PickStatus {
    Correct,
    Incorrect,
    Pending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickOutcome {
    pub game_id: String,
    pub team: TeamSelection,
    pub status: PickStatus,
    pub winner: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MigrationSummary {
    pub migrated: usize,
    pub resolved: usize,
    pub unresolved: usize,
}

/// Save picks for the current week. Entries with an empty selection are
/// skipped; an unknown team rejects the whole submission.
pub fn submit_picks(
    conn: &mut Connection,
    user_id: i64,
    league_id: i64,
    entries: &[PickEntry],
) -> Result<SubmitSummary> {
    let week = config::current_week(conn)?;
    if config::picks_locked(conn)? {
        return Err(QuinielaError::PicksLocked { week });
    }
    let user = db::find_user(conn, user_id)?;
    db::find_league(conn, league_id)?;
    if !user.is_admin && !leagues::is_active_member(conn, user_id, league_id)? {
        return Err(QuinielaError::NotAMember { user_id, league_id });
    }

    let mut resolved = Vec::with_capacity(entries.len());
    for entry in entries {
        let game_id = entry.game_id.trim();
        let selection = entry.selection.trim();
        if game_id.is_empty() || selection.is_empty() {
            continue;
        }
        let team = teams::resolve_selection(selection)
            .ok_or_else(|| QuinielaError::UnknownTeam(selection.to_string()))?;
        resolved.push((game_id, team));
    }

    let tx = conn.transaction()?;
    let now = Utc::now().to_rfc3339();
    for (game_id, team) in &resolved {
        tx.execute(
            "INSERT INTO picks (user_id, league_id, week, game_id, selection, team_name, team_abbreviation, created_at)
             VALUES (?1, ?2, ?3, ?4, NULL, ?5, ?6, ?7)
             ON CONFLICT(user_id, league_id, week, game_id) DO UPDATE SET
                selection = NULL,
                team_name = excluded.team_name,
                team_abbreviation = excluded.team_abbreviation",
            params![user_id, league_id, week, game_id, team.name, team.abbreviation, now],
        )?;
    }
    tx.commit()?;

    info!(
        "saved {} picks for {} in league {league_id}, week {week}",
        resolved.len(),
        user.username
    );
    Ok(SubmitSummary {
        week,
        saved: resolved.len(),
    })
}

pub fn user_picks(
    conn: &Connection,
    user_id: i64,
    league_id: i64,
    week: u32,
) -> Result<Vec<PickRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PICK_COLUMNS} FROM picks
         WHERE user_id = ?1 AND league_id = ?2 AND week = ?3
         ORDER BY game_id"
    ))?;
    let rows = stmt
        .query_map(params![user_id, league_id, week], pick_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn picks_for_league_week(conn: &Connection, league_id: i64, week: u32) -> Result<Vec<PickRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PICK_COLUMNS} FROM picks WHERE league_id = ?1 AND week = ?2 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![league_id, week], pick_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn picks_for_week(conn: &Connection, week: u32) -> Result<Vec<PickRow>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PICK_COLUMNS} FROM picks WHERE week = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![week], pick_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn picks_submitted_count(conn: &Connection, week: u32) -> Result<u64> {
    let n = conn.query_row(
        "SELECT COUNT(*) FROM picks WHERE week = ?1",
        params![week],
        |row| row.get::<_, i64>(0),
    )?;
    Ok(n.max(0) as u64)
}

/// Per-pick verdicts for one user, league and week.
pub fn pick_outcomes(
    conn: &Connection,
    user_id: i64,
    league_id: i64,
    week: u32,
) -> Result<Vec<PickOutcome>> {
    let results: HashMap<String, String> = db::results_for_week(conn, week)?
        .into_iter()
        .map(|r| (r.game_id, r.winner))
        .collect();
    let outcomes = user_picks(conn, user_id, league_id, week)?
        .into_iter()
        .map(|pick| {
            let team = pick.team();
            let winner = results.get(&pick.game_id).cloned();
            let status = match winner.as_deref() {
                None => PickStatus::Pending,
                Some(w) if is_correct(&team, w) => PickStatus::Correct,
                Some(_) => PickStatus::Incorrect,
            };
            PickOutcome {
                game_id: pick.game_id,
                team,
                status,
                winner,
            }
        })
        .collect();
    Ok(outcomes)
}

/// Insert a pick with a raw, untyped selection the way older clients stored it.
pub fn insert_legacy_pick(
    conn: &Connection,
    user_id: i64,
    league_id: i64,
    week: u32,
    game_id: &str,
    selection: &str,
) -> Result<()> {
    conn.execute(
        "INSERT INTO picks (user_id, league_id, week, game_id, selection, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(user_id, league_id, week, game_id) DO UPDATE SET
            selection = excluded.selection,
            team_name = NULL,
            team_abbreviation = NULL",
        params![
            user_id,
            league_id,
            week,
            game_id,
            selection,
            Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Fill the structured team columns of legacy rows from their raw selection.
/// Selections the registry knows become canonical; the rest keep their
/// normalized name/abbreviation so they score exactly as before.
pub fn migrate_legacy_selections(conn: &mut Connection) -> Result<MigrationSummary> {
    let legacy: Vec<PickRow> = {
        let mut stmt = conn.prepare(&format!(
            "SELECT {PICK_COLUMNS} FROM picks
             WHERE selection IS NOT NULL AND (team_name IS NULL OR team_abbreviation IS NULL)"
        ))?;
        stmt.query_map([], pick_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
    };

    let mut summary = MigrationSummary::default();
    let tx = conn.transaction()?;
    for pick in &legacy {
        let normalized = pick.team();
        let team = match teams::resolve(&normalized.abbreviation)
            .or_else(|| teams::resolve(&normalized.name))
        {
            Some(team) => {
                summary.resolved += 1;
                team.selection()
            }
            None => {
                warn!(
                    "pick {} keeps unresolved selection {:?}",
                    pick.id, pick.selection
                );
                summary.unresolved += 1;
                normalized
            }
        };
        tx.execute(
            "UPDATE picks SET team_name = ?1, team_abbreviation = ?2 WHERE id = ?3",
            params![team.name, team.abbreviation, pick.id],
        )?;
        summary.migrated += 1;
    }
    tx.commit()?;

    info!(
        "migrated {} legacy picks ({} resolved, {} unresolved)",
        summary.migrated, summary.resolved, summary.unresolved
    );
    Ok(summary)
}
