//! Admin console state and the messages exchanged with the worker thread.

use crate::autolock::LockCheck;
use crate::db::{Stats, WinnerRow};
use crate::results::IngestSummary;
use crate::standings::{Standing, StandingsScope};
use crate::winners::Declaration;
use crate::{FIRST_WEEK, LAST_WEEK};

const LOADING: &str = "Loading...";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Standings,
    Winners,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeagueSummary {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub members: u32,
}

/// Everything the console renders, read in one pass by the worker.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub week: u32,
    pub picks_locked: bool,
    pub leagues: Vec<LeagueSummary>,
    pub standings: Vec<Standing>,
    pub history: Vec<WinnerRow>,
    pub stats: Stats,
}

#[derive(Debug, Clone)]
pub enum Delta {
    SetSnapshot(Snapshot),
    Ingested(IngestSummary),
    Declared(Declaration),
    AutoLock(LockCheck),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    Refresh { scope: StandingsScope },
    SetWeek { week: u32 },
    ToggleLock,
    IngestResults { week: u32 },
    DeclareWinners { week: u32 },
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub screen: Screen,
    pub week: u32,
    pub picks_locked: bool,
    pub leagues: Vec<LeagueSummary>,
    /// 0 is the global scope; `n` selects `leagues[n - 1]`.
    pub scope_index: usize,
    pub standings: Vec<Standing>,
    pub history: Vec<WinnerRow>,
    pub stats: Stats,
    pub status: String,
    pub help_overlay: bool,
    pub loaded: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            screen: Screen::Standings,
            week: FIRST_WEEK,
            picks_locked: false,
            leagues: Vec::new(),
            scope_index: 0,
            standings: Vec::new(),
            history: Vec::new(),
            stats: Stats::default(),
            status: LOADING.to_string(),
            help_overlay: false,
            loaded: false,
        }
    }

    pub fn scope(&self) -> StandingsScope {
        match self.selected_league() {
            Some(league) => StandingsScope::League(league.id),
            None => StandingsScope::Global,
        }
    }

    pub fn selected_league(&self) -> Option<&LeagueSummary> {
        self.scope_index
            .checked_sub(1)
            .and_then(|idx| self.leagues.get(idx))
    }

    pub fn scope_label(&self) -> String {
        match self.selected_league() {
            Some(league) => format!("{} [{}]", league.name, league.code),
            None => "Global".to_string(),
        }
    }

    pub fn cycle_scope(&mut self) {
        self.scope_index = (self.scope_index + 1) % (self.leagues.len() + 1);
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Standings => Screen::Winners,
            Screen::Winners => Screen::Standings,
        };
    }

    pub fn next_week(&self) -> Option<u32> {
        (self.week < LAST_WEEK).then_some(self.week + 1)
    }

    pub fn prev_week(&self) -> Option<u32> {
        (self.week > FIRST_WEEK).then_some(self.week - 1)
    }
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::SetSnapshot(snapshot) => {
            let selected = state.selected_league().map(|l| l.id);
            state.week = snapshot.week;
            state.picks_locked = snapshot.picks_locked;
            state.leagues = snapshot.leagues;
            // Keep the same league selected if it still exists.
            state.scope_index = selected
                .and_then(|id| state.leagues.iter().position(|l| l.id == id))
                .map_or(0, |pos| pos + 1);
            state.standings = snapshot.standings;
            state.history = snapshot.history;
            state.stats = snapshot.stats;
            if !state.loaded && state.status == LOADING {
                state.status = "Ready".to_string();
            }
            state.loaded = true;
        }
        Delta::Ingested(summary) => {
            let source = match summary.source {
                crate::espn::GameSource::Live => "live",
                crate::espn::GameSource::Fallback => "fallback",
            };
            state.status = format!(
                "Week {}: {} of {} completed games written ({} new, {} updated) from {source} feed",
                summary.week,
                summary.written(),
                summary.completed_in_feed,
                summary.created,
                summary.updated
            );
        }
        Delta::Declared(Declaration::NoResults { week }) => {
            state.status = format!("Week {week}: no results processed yet");
        }
        Delta::Declared(Declaration::Declared { week, leagues }) => {
            state.status = if leagues.is_empty() {
                format!("Week {week}: no league had a correct pick")
            } else {
                let parts = leagues
                    .iter()
                    .map(|l| {
                        let tie = if l.is_tie { " (tie)" } else { "" };
                        format!("{}: {} ({}){tie}", l.league_name, l.winners.join(", "), l.score)
                    })
                    .collect::<Vec<_>>();
                format!("Week {week} winners | {}", parts.join(" | "))
            };
        }
        Delta::AutoLock(LockCheck::Locked { .. }) => {
            state.picks_locked = true;
            state.status = "Picks auto-locked before first kickoff".to_string();
        }
        Delta::AutoLock(_) => {}
        Delta::Failed(msg) => {
            state.status = format!("Failed: {msg}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AppState, LeagueSummary, Screen};
    use crate::standings::StandingsScope;

    fn league(id: i64) -> LeagueSummary {
        LeagueSummary {
            id,
            name: format!("L{id}"),
            code: format!("C{id}"),
            members: 0,
        }
    }

    #[test]
    fn scope_cycles_through_global_and_leagues() {
        let mut state = AppState::new();
        state.leagues = vec![league(4), league(9)];
        assert_eq!(state.scope(), StandingsScope::Global);
        state.cycle_scope();
        assert_eq!(state.scope(), StandingsScope::League(4));
        state.cycle_scope();
        assert_eq!(state.scope(), StandingsScope::League(9));
        state.cycle_scope();
        assert_eq!(state.scope(), StandingsScope::Global);
    }

    #[test]
    fn week_bounds() {
        let mut state = AppState::new();
        assert_eq!(state.prev_week(), None);
        assert_eq!(state.next_week(), Some(2));
        state.week = 18;
        assert_eq!(state.next_week(), None);
    }

    #[test]
    fn tab_toggles_screen() {
        let mut state = AppState::new();
        state.toggle_screen();
        assert_eq!(state.screen, Screen::Winners);
        state.toggle_screen();
        assert_eq!(state.screen, Screen::Standings);
    }
}
