//! Completed-game ingestion into `game_results`.

use chrono::Utc;
use log::{debug, info, warn};
use rusqlite::{Connection, OptionalExtension, params};

use crate::Result;
use crate::config::{self, AppConfig};
use crate::espn::{self, GameSource, ScheduledGame, WeekGames};

pub const TIE: &str = "TIE";

const COMPLETED_STATUSES: &[&str] = &["final", "status_final", "completed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestSummary {
    pub week: u32,
    pub completed_in_feed: usize,
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub source: GameSource,
}

impl IngestSummary {
    pub fn written(&self) -> usize {
        self.created + self.updated
    }
}

pub fn is_completed(game: &ScheduledGame) -> bool {
    game.status.completed
        || COMPLETED_STATUSES.contains(&game.status.description.to_lowercase().as_str())
}

/// Abbreviation of the higher score, or `TIE`.
pub fn derive_winner(game: &ScheduledGame) -> String {
    use std::cmp::Ordering;
    match game.home.score.cmp(&game.away.score) {
        Ordering::Greater => game.home.abbreviation.clone(),
        Ordering::Less => game.away.abbreviation.clone(),
        Ordering::Equal => TIE.to_string(),
    }
}

/// Fetch the week from the scoreboard and ingest it.
pub fn process_week(conn: &mut Connection, cfg: &AppConfig, week: u32) -> Result<IngestSummary> {
    let week = config::validate_week(week)?;
    let games = espn::games_for_week(cfg, week);
    ingest_week_results(conn, week, &games)
}

pub fn ingest_week_results(
    conn: &mut Connection,
    week: u32,
    games: &WeekGames,
) -> Result<IngestSummary> {
    let week = config::validate_week(week)?;
    let mut summary = IngestSummary {
        week,
        completed_in_feed: 0,
        created: 0,
        updated: 0,
        unchanged: 0,
        skipped: 0,
        source: games.source,
    };

    let tx = conn.transaction()?;
    let now = Utc::now().to_rfc3339();
    for game in games.games.iter().filter(|g| is_completed(g)) {
        summary.completed_in_feed += 1;
        let (home, away) = (game.home.abbreviation.as_str(), game.away.abbreviation.as_str());
        if game.id.is_empty() || home.is_empty() || away.is_empty() {
            warn!("skipping incomplete game id={:?} home={home:?} away={away:?}", game.id);
            summary.skipped += 1;
            continue;
        }
        let winner = derive_winner(game);
        let (home_score, away_score) = (i64::from(game.home.score), i64::from(game.away.score));

        let existing = tx
            .query_row(
                "SELECT home_team, away_team, home_score, away_score, winner
                 FROM game_results WHERE game_id = ?1 AND week = ?2",
                params![game.id, week],
                |row| {
                    Ok((
                        row.get::<_, Option<String>>(0)?,
                        row.get::<_, Option<String>>(1)?,
                        row.get::<_, Option<i64>>(2)?,
                        row.get::<_, Option<i64>>(3)?,
                        row.get::<_, String>(4)?,
                    ))
                },
            )
            .optional()?;

        match existing {
            None => {
                tx.execute(
                    "INSERT INTO game_results
                        (week, game_id, winner, home_team, away_team, home_score, away_score, updated_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                    params![week, game.id, winner, home, away, home_score, away_score, now],
                )?;
                summary.created += 1;
                debug!("new result {}: {away} @ {home} ({away_score}-{home_score})", game.id);
            }
            Some(stored) => {
                let fresh = (
                    Some(home.to_string()),
                    Some(away.to_string()),
                    Some(home_score),
                    Some(away_score),
                    winner.clone(),
                );
                if stored == fresh {
                    summary.unchanged += 1;
                    continue;
                }
                tx.execute(
                    "UPDATE game_results
                     SET home_team = ?1, away_team = ?2, home_score = ?3, away_score = ?4,
                         winner = ?5, updated_at = ?6
                     WHERE game_id = ?7 AND week = ?8",
                    params![home, away, home_score, away_score, winner, now, game.id, week],
                )?;
                summary.updated += 1;
                debug!("updated result {}: {away} @ {home} ({away_score}-{home_score})", game.id);
            }
        }
    }
    tx.commit()?;

    info!(
        "week {week}: {} of {} completed games written ({} new, {} updated, {} unchanged, {} skipped)",
        summary.written(),
        summary.completed_in_feed,
        summary.created,
        summary.updated,
        summary.unchanged,
        summary.skipped
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::{TIE, derive_winner, is_completed};
    use crate::fallback_games::sample_games;

    #[test]
    fn winner_is_higher_score_or_tie() {
        let mut game = sample_games(1).remove(0);
        game.home.score = 20;
        game.away.score = 17;
        assert_eq!(derive_winner(&game), "BUF");
        game.away.score = 27;
        assert_eq!(derive_winner(&game), "KC");
        game.home.score = 27;
        assert_eq!(derive_winner(&game), TIE);
    }

    #[test]
    fn completion_by_flag_or_status_text() {
        let mut game = sample_games(1).remove(0);
        assert!(!is_completed(&game));
        game.status.description = "Final".to_string();
        assert!(is_completed(&game));
        game.status.description = "In Progress".to_string();
        game.status.completed = true;
        assert!(is_completed(&game));
    }
}
