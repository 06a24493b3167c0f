//! Weekly winner declaration per league.

use std::collections::HashMap;

use chrono::Utc;
use log::{debug, info};
use rusqlite::{Connection, params};

use crate::config;
use crate::db::{PickRow, WinnerRow, bool_to_i64};
use crate::leagues;
use crate::picks;
use crate::selection::is_correct;
use crate::standings::results_map;
use crate::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub user_id: i64,
    pub username: String,
    pub correct: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeekWinners {
    pub winners: Vec<Candidate>,
    pub score: u32,
    pub is_tie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueWinners {
    pub league_id: i64,
    pub league_name: String,
    pub winners: Vec<String>,
    pub score: u32,
    pub is_tie: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Declaration {
    NoResults { week: u32 },
    Declared { week: u32, leagues: Vec<LeagueWinners> },
}

/// Everyone at the top correct count wins. Candidates with zero correct picks
/// are ignored, so `None` means nobody scored.
pub fn select_winners(candidates: &[Candidate]) -> Option<WeekWinners> {
    let score = candidates.iter().map(|c| c.correct).max().filter(|&m| m > 0)?;
    let winners: Vec<Candidate> = candidates
        .iter()
        .filter(|c| c.correct == score)
        .cloned()
        .collect();
    let is_tie = winners.len() > 1;
    Some(WeekWinners {
        winners,
        score,
        is_tie,
    })
}

/// Correct counts for every user with picks, in user id order.
pub fn tally_correct(
    picks: &[PickRow],
    results: &HashMap<String, String>,
    usernames: &HashMap<i64, String>,
) -> Vec<Candidate> {
    let mut counts: HashMap<i64, u32> = HashMap::new();
    for pick in picks {
        let entry = counts.entry(pick.user_id).or_default();
        if let Some(winner) = results.get(&pick.game_id)
            && is_correct(&pick.team(), winner)
        {
            *entry += 1;
        }
    }
    let mut out: Vec<Candidate> = counts
        .into_iter()
        .filter_map(|(user_id, correct)| {
            Some(Candidate {
                user_id,
                username: usernames.get(&user_id)?.clone(),
                correct,
            })
        })
        .collect();
    out.sort_by_key(|c| c.user_id);
    out
}

/// Replace the winners of every active league with picks this week.
pub fn declare_winners(conn: &mut Connection, week: u32) -> Result<Declaration> {
    let week = config::validate_week(week)?;
    let results = results_map(conn, week)?;
    if results.is_empty() {
        info!("week {week}: no results processed, nothing declared");
        return Ok(Declaration::NoResults { week });
    }
    let usernames = usernames(conn)?;

    let tx = conn.transaction()?;
    let now = Utc::now().to_rfc3339();
    let mut declared = Vec::new();
    for league in leagues::all_leagues(&tx)?.into_iter().filter(|l| l.is_active) {
        let picks = picks::picks_for_league_week(&tx, league.id, week)?;
        if picks.is_empty() {
            continue;
        }
        let candidates = tally_correct(&picks, &results, &usernames);
        let Some(top) = select_winners(&candidates) else {
            debug!("league {}: no correct picks in week {week}", league.code);
            continue;
        };

        tx.execute(
            "DELETE FROM winners_history WHERE league_id = ?1 AND week = ?2",
            params![league.id, week],
        )?;
        for winner in &top.winners {
            tx.execute(
                "INSERT INTO winners_history
                    (user_id, league_id, week, winner_username, score, is_tie, declared_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    winner.user_id,
                    league.id,
                    week,
                    winner.username,
                    top.score,
                    bool_to_i64(top.is_tie),
                    now
                ],
            )?;
        }
        declared.push(LeagueWinners {
            league_id: league.id,
            league_name: league.name,
            winners: top.winners.into_iter().map(|w| w.username).collect(),
            score: top.score,
            is_tie: top.is_tie,
        });
    }
    tx.commit()?;

    info!("week {week}: declared winners in {} leagues", declared.len());
    Ok(Declaration::Declared {
        week,
        leagues: declared,
    })
}

/// Declared winners for a league, latest week first.
pub fn history_for_league(conn: &Connection, league_id: i64) -> Result<Vec<WinnerRow>> {
    let mut stmt = conn.prepare(
        "SELECT user_id, league_id, week, winner_username, score, is_tie, declared_at
         FROM winners_history WHERE league_id = ?1
         ORDER BY week DESC, id",
    )?;
    let rows = stmt
        .query_map(params![league_id], |row| {
            Ok(WinnerRow {
                user_id: row.get(0)?,
                league_id: row.get(1)?,
                week: row.get::<_, u32>(2)?,
                winner_username: row.get(3)?,
                score: row.get::<_, u32>(4)?,
                is_tie: row.get::<_, i64>(5)? != 0,
                declared_at: row.get(6)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn winners_for_week(conn: &Connection, league_id: i64, week: u32) -> Result<Vec<WinnerRow>> {
    Ok(history_for_league(conn, league_id)?
        .into_iter()
        .filter(|w| w.week == week)
        .collect())
}

fn usernames(conn: &Connection) -> Result<HashMap<i64, String>> {
    let mut stmt = conn.prepare("SELECT id, username FROM users")?;
    let map = stmt
        .query_map([], |row| Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?)))?
        .collect::<rusqlite::Result<HashMap<_, _>>>()?;
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::{Candidate, select_winners};

    fn c(id: i64, correct: u32) -> Candidate {
        Candidate {
            user_id: id,
            username: format!("u{id}"),
            correct,
        }
    }

    #[test]
    fn single_top_scorer_is_not_a_tie() {
        let top = select_winners(&[c(1, 3), c(2, 2)]).expect("winner");
        assert_eq!(top.winners, vec![c(1, 3)]);
        assert_eq!(top.score, 3);
        assert!(!top.is_tie);
    }

    #[test]
    fn shared_max_is_a_tie() {
        let top = select_winners(&[c(1, 2), c(2, 2), c(3, 1)]).expect("winner");
        assert_eq!(top.winners.len(), 2);
        assert!(top.is_tie);
    }

    #[test]
    fn nobody_scored_means_no_winner() {
        assert!(select_winners(&[c(1, 0), c(2, 0)]).is_none());
        assert!(select_winners(&[]).is_none());
    }
}
