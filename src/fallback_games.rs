//! Built-in games served when the scoreboard cannot be reached.

use crate::espn::{GameStatus, ScheduledGame, TeamSide};

fn side(name: &str, abbreviation: &str) -> TeamSide {
    TeamSide {
        name: name.to_string(),
        abbreviation: abbreviation.to_string(),
        logo: format!(
            "https://a.espncdn.com/i/teamlogos/nfl/500/{}.png",
            abbreviation.to_ascii_lowercase()
        ),
        score: 0,
    }
}

fn scheduled(
    id: &str,
    date: &str,
    away: (&str, &str),
    home: (&str, &str),
    week: u32,
) -> ScheduledGame {
    let away = side(away.0, away.1);
    let home = side(home.0, home.1);
    ScheduledGame {
        id: id.to_string(),
        name: format!("{} at {}", away.name, home.name),
        date: date.to_string(),
        kickoff: crate::espn::parse_kickoff(date),
        status: GameStatus {
            description: "Scheduled".to_string(),
            completed: false,
            clock: String::new(),
            period: 0,
        },
        week,
        home,
        away,
    }
}

pub fn sample_games(week: u32) -> Vec<ScheduledGame> {
    vec![
        scheduled(
            "mock_game_1",
            "2024-01-21T23:30:00Z",
            ("Kansas City Chiefs", "KC"),
            ("Buffalo Bills", "BUF"),
            week,
        ),
        scheduled(
            "mock_game_2",
            "2024-01-22T02:00:00Z",
            ("San Francisco 49ers", "SF"),
            ("Philadelphia Eagles", "PHI"),
            week,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::sample_games;

    #[test]
    fn samples_are_scheduled_for_requested_week() {
        let games = sample_games(7);
        assert_eq!(games.len(), 2);
        assert!(games.iter().all(|g| g.week == 7 && !g.status.completed));
        assert_eq!(games[0].name, "Kansas City Chiefs at Buffalo Bills");
        assert_eq!(games[1].home.logo, "https://a.espncdn.com/i/teamlogos/nfl/500/phi.png");
        assert!(games[0].kickoff.is_some());
    }
}
