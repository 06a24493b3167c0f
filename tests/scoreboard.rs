use std::fs;
use std::path::PathBuf;

use quiniela::espn::{GameSource, parse_scoreboard_json, parse_scoreboard_or_fallback};
use quiniela::results::{TIE, derive_winner, is_completed};

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

#[test]
fn parses_espn_scoreboard_fixture() {
    let raw = read_fixture("espn_scoreboard.json");
    let games = parse_scoreboard_json(&raw, 1).expect("fixture should parse");

    // The event with a single competitor is dropped.
    assert_eq!(games.len(), 5);

    let opener = &games[0];
    assert_eq!(opener.id, "401671789");
    assert_eq!(opener.home.abbreviation, "KC");
    assert_eq!(opener.home.score, 27);
    assert_eq!(opener.away.name, "Baltimore Ravens");
    assert_eq!(opener.away.score, 20);
    assert_eq!(opener.status.description, "Final");
    assert!(opener.status.completed);
    assert_eq!(opener.week, 1);
    assert!(opener.kickoff.is_some());
}

#[test]
fn missing_abbreviation_and_score_fall_back() {
    let raw = read_fixture("espn_scoreboard.json");
    let games = parse_scoreboard_json(&raw, 1).expect("fixture should parse");
    let texans = games
        .iter()
        .find(|g| g.id == "401671820")
        .expect("texans game");
    assert_eq!(texans.home.abbreviation, "HOU");
    assert_eq!(texans.home.score, 0);
    assert_eq!(texans.home.logo, "");
    assert_eq!(texans.status.clock, "8:12");
    assert_eq!(texans.status.period, 2);
}

#[test]
fn completed_games_and_winners_from_fixture() {
    let raw = read_fixture("espn_scoreboard.json");
    let games = parse_scoreboard_json(&raw, 1).expect("fixture should parse");
    let completed = games
        .iter()
        .filter(|g| is_completed(g))
        .map(|g| (g.id.as_str(), derive_winner(g)))
        .collect::<Vec<_>>();
    assert_eq!(
        completed,
        vec![
            ("401671789", "KC".to_string()),
            ("401671805", "GB".to_string()),
            ("401671811", TIE.to_string()),
        ]
    );
}

#[test]
fn malformed_json_uses_sample_games() {
    let week = parse_scoreboard_or_fallback("{\"events\": [", 4);
    assert_eq!(week.source, GameSource::Fallback);
    let ids = week.games.iter().map(|g| g.id.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["mock_game_1", "mock_game_2"]);
    assert!(week.games.iter().all(|g| g.week == 4));
}

#[test]
fn empty_body_is_an_empty_live_week() {
    let week = parse_scoreboard_or_fallback("", 2);
    assert_eq!(week.source, GameSource::Live);
    assert!(week.games.is_empty());

    let week = parse_scoreboard_or_fallback("{}", 2);
    assert_eq!(week.source, GameSource::Live);
    assert!(week.games.is_empty());
}
