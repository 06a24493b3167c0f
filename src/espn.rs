//! ESPN NFL scoreboard client.

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDateTime, Utc};
use log::{debug, warn};
use serde::Deserialize;
use serde_json::Value;

use crate::config::AppConfig;
use crate::fallback_games;
use crate::http_client::http_client;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamSide {
    pub name: String,
    pub abbreviation: String,
    pub logo: String,
    pub score: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameStatus {
    pub description: String,
    pub completed: bool,
    pub clock: String,
    pub period: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledGame {
    pub id: String,
    pub name: String,
    pub date: String,
    pub kickoff: Option<DateTime<Utc>>,
    pub status: GameStatus,
    pub week: u32,
    pub home: TeamSide,
    pub away: TeamSide,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameSource {
    Live,
    Fallback,
}

#[derive(Debug, Clone)]
pub struct WeekGames {
    pub games: Vec<ScheduledGame>,
    pub source: GameSource,
}

pub fn scoreboard_url(base: &str, season: i32, week: u32) -> String {
    format!(
        "{}/apis/site/v2/sports/football/nfl/scoreboard?dates={season}&seasontype=2&week={week}",
        base.trim_end_matches('/')
    )
}

/// Live games for the week, or the built-in sample list when the scoreboard
/// is unreachable or unreadable. Never fails.
pub fn games_for_week(cfg: &AppConfig, week: u32) -> WeekGames {
    match fetch_week_games(cfg, week) {
        Ok(games) => WeekGames {
            games,
            source: GameSource::Live,
        },
        Err(err) => {
            warn!("scoreboard unavailable for week {week}, using sample games: {err:#}");
            WeekGames {
                games: fallback_games::sample_games(week),
                source: GameSource::Fallback,
            }
        }
    }
}

pub fn fetch_week_games(cfg: &AppConfig, week: u32) -> Result<Vec<ScheduledGame>> {
    let client = http_client(cfg.http_timeout_secs)?;
    let url = scoreboard_url(&cfg.espn_base_url, cfg.season, week);
    debug!("GET {url}");
    let body = client
        .get(&url)
        .send()
        .context("request failed")?
        .error_for_status()
        .context("scoreboard returned an error status")?
        .text()
        .context("failed to read scoreboard body")?;
    parse_scoreboard_json(&body, week)
}

/// Scoreboard body to games; or the sample list when it cannot be parsed.
pub fn parse_scoreboard_or_fallback(raw: &str, week: u32) -> WeekGames {
    match parse_scoreboard_json(raw, week) {
        Ok(games) => WeekGames {
            games,
            source: GameSource::Live,
        },
        Err(err) => {
            warn!("unreadable scoreboard for week {week}: {err:#}");
            WeekGames {
                games: fallback_games::sample_games(week),
                source: GameSource::Fallback,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Scoreboard {
    #[serde(default)]
    events: Vec<EspnEvent>,
}

#[derive(Debug, Deserialize)]
struct EspnEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    date: String,
    #[serde(default)]
    competitions: Vec<EspnCompetition>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetition {
    #[serde(default)]
    competitors: Vec<EspnCompetitor>,
    #[serde(default)]
    status: Option<EspnStatus>,
}

#[derive(Debug, Deserialize)]
struct EspnCompetitor {
    #[serde(rename = "homeAway", default)]
    home_away: String,
    #[serde(default)]
    team: EspnTeam,
    #[serde(default)]
    score: Value,
}

#[derive(Debug, Default, Deserialize)]
struct EspnTeam {
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    abbreviation: Option<String>,
    logo: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EspnStatus {
    #[serde(rename = "displayClock", default)]
    display_clock: String,
    #[serde(default)]
    period: u32,
    #[serde(rename = "type")]
    kind: Option<EspnStatusType>,
}

#[derive(Debug, Deserialize)]
struct EspnStatusType {
    description: Option<String>,
    #[serde(default)]
    completed: bool,
}

pub fn parse_scoreboard_json(raw: &str, week: u32) -> Result<Vec<ScheduledGame>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(Vec::new());
    }
    let board: Scoreboard = serde_json::from_str(trimmed).context("invalid scoreboard json")?;
    Ok(board
        .events
        .into_iter()
        .filter_map(|event| build_game(event, week))
        .collect())
}

fn build_game(event: EspnEvent, week: u32) -> Option<ScheduledGame> {
    let competition = event.competitions.into_iter().next()?;
    if competition.competitors.len() < 2 {
        return None;
    }
    let mut home = None;
    let mut away = None;
    for competitor in &competition.competitors {
        let side = team_side(competitor);
        if competitor.home_away == "home" {
            home = Some(side);
        } else {
            away = Some(side);
        }
    }
    let status = competition.status.map_or_else(
        || GameStatus {
            description: "Scheduled".to_string(),
            completed: false,
            clock: String::new(),
            period: 0,
        },
        |s| GameStatus {
            description: s
                .kind
                .as_ref()
                .and_then(|k| k.description.clone())
                .unwrap_or_else(|| "Scheduled".to_string()),
            completed: s.kind.as_ref().is_some_and(|k| k.completed),
            clock: s.display_clock,
            period: s.period,
        },
    );

    Some(ScheduledGame {
        kickoff: parse_kickoff(&event.date),
        id: event.id,
        name: event.name,
        date: event.date,
        status,
        week,
        home: home.unwrap_or_else(unknown_side),
        away: away.unwrap_or_else(unknown_side),
    })
}

fn team_side(competitor: &EspnCompetitor) -> TeamSide {
    let name = competitor
        .team
        .display_name
        .clone()
        .unwrap_or_else(|| "Unknown".to_string());
    let abbreviation = competitor
        .team
        .abbreviation
        .clone()
        .unwrap_or_else(|| name.chars().take(3).collect::<String>().to_uppercase());
    TeamSide {
        abbreviation,
        logo: competitor.team.logo.clone().unwrap_or_default(),
        score: parse_score(&competitor.score),
        name,
    }
}

fn unknown_side() -> TeamSide {
    TeamSide {
        name: "Unknown".to_string(),
        abbreviation: "UNK".to_string(),
        logo: String::new(),
        score: 0,
    }
}

/// Digits only; anything else scores zero.
fn parse_score(value: &Value) -> u32 {
    match value {
        Value::String(s) if !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()) => {
            s.parse().unwrap_or(0)
        }
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        _ => 0,
    }
}

/// ESPN dates usually omit seconds (`2024-09-08T17:00Z`).
pub fn parse_kickoff(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%MZ")
        .ok()
        .map(|naive| naive.and_utc())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{parse_kickoff, parse_score, scoreboard_url};

    #[test]
    fn url_uses_season_and_week() {
        assert_eq!(
            scoreboard_url("https://site.api.espn.com/", 2025, 3),
            "https://site.api.espn.com/apis/site/v2/sports/football/nfl/scoreboard?dates=2025&seasontype=2&week=3"
        );
    }

    #[test]
    fn non_numeric_scores_are_zero() {
        assert_eq!(parse_score(&json!("27")), 27);
        assert_eq!(parse_score(&json!("")), 0);
        assert_eq!(parse_score(&json!("-3")), 0);
        assert_eq!(parse_score(&json!(14)), 14);
        assert_eq!(parse_score(&json!(null)), 0);
    }

    #[test]
    fn kickoff_accepts_short_espn_format() {
        let a = parse_kickoff("2024-09-08T17:00Z").expect("short form");
        let b = parse_kickoff("2024-09-08T17:00:00Z").expect("rfc3339");
        assert_eq!(a, b);
        assert!(parse_kickoff("TBD").is_none());
        assert!(parse_kickoff("").is_none());
    }
}
