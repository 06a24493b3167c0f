use crate::selection::{TeamSelection, normalize_str};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Team {
    pub abbreviation: &'static str,
    pub name: &'static str,
}

impl Team {
    pub fn nickname(&self) -> &'static str {
        self.name.rsplit(' ').next().unwrap_or(self.name)
    }

    pub fn selection(&self) -> TeamSelection {
        TeamSelection::new(self.name, self.abbreviation)
    }
}

// Abbreviations follow the ESPN scoreboard, which is what results are stored as.
pub const NFL_TEAMS: &[Team] = &[
    Team { abbreviation: "ARI", name: "Arizona Cardinals" },
    Team { abbreviation: "ATL", name: "Atlanta Falcons" },
    Team { abbreviation: "BAL", name: "Baltimore Ravens" },
    Team { abbreviation: "BUF", name: "Buffalo Bills" },
    Team { abbreviation: "CAR", name: "Carolina Panthers" },
    Team { abbreviation: "CHI", name: "Chicago Bears" },
    Team { abbreviation: "CIN", name: "Cincinnati Bengals" },
    Team { abbreviation: "CLE", name: "Cleveland Browns" },
    Team { abbreviation: "DAL", name: "Dallas Cowboys" },
    Team { abbreviation: "DEN", name: "Denver Broncos" },
    Team { abbreviation: "DET", name: "Detroit Lions" },
    Team { abbreviation: "GB", name: "Green Bay Packers" },
    Team { abbreviation: "HOU", name: "Houston Texans" },
    Team { abbreviation: "IND", name: "Indianapolis Colts" },
    Team { abbreviation: "JAX", name: "Jacksonville Jaguars" },
    Team { abbreviation: "KC", name: "Kansas City Chiefs" },
    Team { abbreviation: "LV", name: "Las Vegas Raiders" },
    Team { abbreviation: "LAC", name: "Los Angeles Chargers" },
    Team { abbreviation: "LAR", name: "Los Angeles Rams" },
    Team { abbreviation: "MIA", name: "Miami Dolphins" },
    Team { abbreviation: "MIN", name: "Minnesota Vikings" },
    Team { abbreviation: "NE", name: "New England Patriots" },
    Team { abbreviation: "NO", name: "New Orleans Saints" },
    Team { abbreviation: "NYG", name: "New York Giants" },
    Team { abbreviation: "NYJ", name: "New York Jets" },
    Team { abbreviation: "PHI", name: "Philadelphia Eagles" },
    Team { abbreviation: "PIT", name: "Pittsburgh Steelers" },
    Team { abbreviation: "SF", name: "San Francisco 49ers" },
    Team { abbreviation: "SEA", name: "Seattle Seahawks" },
    Team { abbreviation: "TB", name: "Tampa Bay Buccaneers" },
    Team { abbreviation: "TEN", name: "Tennessee Titans" },
    Team { abbreviation: "WSH", name: "Washington Commanders" },
];

pub fn by_abbreviation(abbr: &str) -> Option<&'static Team> {
    let abbr = abbr.trim();
    NFL_TEAMS
        .iter()
        .find(|t| t.abbreviation.eq_ignore_ascii_case(abbr))
}

/// Resolve free text (abbreviation, full name, nickname) to a registry team.
pub fn resolve(raw: &str) -> Option<&'static Team> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    by_abbreviation(s)
        .or_else(|| NFL_TEAMS.iter().find(|t| t.name.eq_ignore_ascii_case(s)))
        .or_else(|| NFL_TEAMS.iter().find(|t| t.nickname().eq_ignore_ascii_case(s)))
}

/// Resolve a submitted selection, which may itself be a serialized mapping.
pub fn resolve_selection(raw: &str) -> Option<&'static Team> {
    let picked = normalize_str(raw.trim());
    resolve(&picked.abbreviation).or_else(|| resolve(&picked.name))
}

#[cfg(test)]
mod tests {
    use super::{NFL_TEAMS, resolve, resolve_selection};

    #[test]
    fn registry_has_every_franchise_once() {
        assert_eq!(NFL_TEAMS.len(), 32);
        let mut abbrs: Vec<_> = NFL_TEAMS.iter().map(|t| t.abbreviation).collect();
        abbrs.sort_unstable();
        abbrs.dedup();
        assert_eq!(abbrs.len(), 32);
    }

    #[test]
    fn resolves_names_nicknames_and_abbreviations() {
        assert_eq!(resolve("kc").map(|t| t.abbreviation), Some("KC"));
        assert_eq!(
            resolve("Kansas City Chiefs").map(|t| t.abbreviation),
            Some("KC")
        );
        assert_eq!(resolve("49ers").map(|t| t.abbreviation), Some("SF"));
        assert!(resolve("Springfield Atoms").is_none());
        assert!(resolve("  ").is_none());
    }

    #[test]
    fn resolves_dict_literal_selections() {
        let team = resolve_selection("{'name': 'Buffalo Bills', 'abbreviation': 'BUF'}");
        assert_eq!(team.map(|t| t.name), Some("Buffalo Bills"));
    }
}
