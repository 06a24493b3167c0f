use std::collections::HashMap;

use rusqlite::{Connection, params};

use crate::config;
use crate::db::{self, PickRow, USER_COLUMNS, User, user_from_row};
use crate::leagues;
use crate::picks;
use crate::selection::is_correct;
use crate::Result;

#[derive(Debug, Clone, PartialEq)]
pub struct Standing {
    pub user_id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub correct_picks: u32,
    pub total_picks: u32,
    pub percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandingsScope {
    League(i64),
    /// Every non-admin user, counting picks from all leagues.
    Global,
}

pub fn percentage(correct: u32, total: u32) -> f64 {
    if total == 0 {
        0.0
    } else {
        f64::from(correct) / f64::from(total) * 100.0
    }
}

/// Rank `candidates` by correct picks.
///
/// `results` maps game id to declared winner for the week being ranked; picks
/// for games missing from it are pending and only count toward the total.
/// Candidates without picks are left out. The sort is stable, so equal
/// counts keep candidate order.
pub fn compute_standings(
    candidates: &[User],
    picks: &[PickRow],
    results: &HashMap<String, String>,
) -> Vec<Standing> {
    let mut tally: HashMap<i64, (u32, u32)> = HashMap::new();
    for pick in picks {
        let entry = tally.entry(pick.user_id).or_default();
        entry.1 += 1;
        if let Some(winner) = results.get(&pick.game_id)
            && is_correct(&pick.team(), winner)
        {
            entry.0 += 1;
        }
    }

    let mut out: Vec<Standing> = candidates
        .iter()
        .filter_map(|user| {
            let &(correct, total) = tally.get(&user.id)?;
            if total == 0 {
                return None;
            }
            Some(Standing {
                user_id: user.id,
                username: user.username.clone(),
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                correct_picks: correct,
                total_picks: total,
                percentage: percentage(correct, total),
            })
        })
        .collect();
    out.sort_by(|a, b| b.correct_picks.cmp(&a.correct_picks));
    out
}

pub fn results_map(conn: &Connection, week: u32) -> Result<HashMap<String, String>> {
    Ok(db::results_for_week(conn, week)?
        .into_iter()
        .map(|r| (r.game_id, r.winner))
        .collect())
}

/// Standings for `scope`; `week` defaults to the configured current week.
pub fn standings(
    conn: &Connection,
    scope: StandingsScope,
    week: Option<u32>,
) -> Result<Vec<Standing>> {
    let week = match week {
        Some(w) => config::validate_week(w)?,
        None => config::current_week(conn)?,
    };
    let (candidates, picks) = match scope {
        StandingsScope::League(league_id) => {
            db::find_league(conn, league_id)?;
            (
                leagues::league_members(conn, league_id)?,
                picks::picks_for_league_week(conn, league_id, week)?,
            )
        }
        StandingsScope::Global => (non_admin_users(conn)?, picks::picks_for_week(conn, week)?),
    };
    let results = results_map(conn, week)?;
    Ok(compute_standings(&candidates, &picks, &results))
}

fn non_admin_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE is_admin = ?1 ORDER BY id"
    ))?;
    let rows = stmt
        .query_map(params![0], user_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}
