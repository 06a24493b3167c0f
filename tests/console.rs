use quiniela::accounts;
use quiniela::config::AppConfig;
use quiniela::db;
use quiniela::leagues::{self, LeagueUpdate, NewLeague};
use quiniela::standings::StandingsScope;
use quiniela::state::{AppState, ConsoleCommand, Delta, apply_delta};
use quiniela::winners::Declaration;
use quiniela::worker;

fn test_config() -> AppConfig {
    AppConfig {
        db_path: None,
        espn_base_url: "http://127.0.0.1:9".to_string(),
        season: 2024,
        http_timeout_secs: 2,
        autolock_enabled: false,
        autolock_lead_min: 60,
        autolock_poll_secs: 60,
        admin_username: "admin".to_string(),
        admin_password: None,
    }
}

fn run(
    conn: &mut rusqlite::Connection,
    state: &mut AppState,
    scope: &mut StandingsScope,
    cmd: ConsoleCommand,
) -> Vec<Delta> {
    let deltas = worker::handle_command(conn, &test_config(), scope, cmd);
    for delta in deltas.clone() {
        apply_delta(state, delta);
    }
    deltas
}

#[test]
fn week_and_lock_commands_update_the_console() {
    let mut conn = db::open_in_memory().expect("db");
    let mut state = AppState::new();
    let mut scope = StandingsScope::Global;

    run(&mut conn, &mut state, &mut scope, ConsoleCommand::SetWeek { week: 4 });
    assert_eq!(state.week, 4);
    assert!(state.loaded);

    run(&mut conn, &mut state, &mut scope, ConsoleCommand::ToggleLock);
    assert!(state.picks_locked);
    run(&mut conn, &mut state, &mut scope, ConsoleCommand::ToggleLock);
    assert!(!state.picks_locked);
}

#[test]
fn invalid_week_reports_failure_and_keeps_week() {
    let mut conn = db::open_in_memory().expect("db");
    let mut state = AppState::new();
    let mut scope = StandingsScope::Global;

    let deltas = run(&mut conn, &mut state, &mut scope, ConsoleCommand::SetWeek { week: 19 });
    assert!(matches!(deltas.first(), Some(Delta::Failed(_))));
    assert!(matches!(deltas.last(), Some(Delta::SetSnapshot(_))));
    assert_eq!(state.week, 1);
    assert!(state.status.starts_with("Failed"));
}

#[test]
fn declare_without_results_is_reported() {
    let mut conn = db::open_in_memory().expect("db");
    let mut state = AppState::new();
    let mut scope = StandingsScope::Global;

    let deltas = run(
        &mut conn,
        &mut state,
        &mut scope,
        ConsoleCommand::DeclareWinners { week: 1 },
    );
    assert!(matches!(
        deltas.first(),
        Some(Delta::Declared(Declaration::NoResults { week: 1 }))
    ));
    assert_eq!(state.status, "Week 1: no results processed yet");
}

#[test]
fn refresh_switches_scope_and_lists_leagues() {
    let mut conn = db::open_in_memory().expect("db");
    let admin = accounts::create_user(&conn, "admin", "secret1", true).expect("admin");
    let league = leagues::create_league(
        &conn,
        admin.id,
        &NewLeague {
            name: "Oficina".to_string(),
            code: Some("OFI".to_string()),
            ..NewLeague::default()
        },
    )
    .expect("league");

    let mut state = AppState::new();
    let mut scope = StandingsScope::Global;
    run(
        &mut conn,
        &mut state,
        &mut scope,
        ConsoleCommand::Refresh { scope: StandingsScope::Global },
    );
    assert_eq!(state.leagues.len(), 1);
    assert_eq!(state.leagues[0].code, "OFI");

    state.cycle_scope();
    let next = state.scope();
    assert_eq!(next, StandingsScope::League(league.id));
    run(&mut conn, &mut state, &mut scope, ConsoleCommand::Refresh { scope: next });
    assert_eq!(scope, StandingsScope::League(league.id));
    assert_eq!(state.scope_label(), "Oficina [OFI]");
    assert!(state.standings.is_empty());
    assert!(state.history.is_empty());
}

#[test]
fn deactivated_league_drops_back_to_global() {
    let mut conn = db::open_in_memory().expect("db");
    let admin = accounts::create_user(&conn, "admin", "secret1", true).expect("admin");
    let league = leagues::create_league(
        &conn,
        admin.id,
        &NewLeague {
            name: "Oficina".to_string(),
            code: Some("OFI".to_string()),
            ..NewLeague::default()
        },
    )
    .expect("league");

    let mut state = AppState::new();
    let mut scope = StandingsScope::Global;
    let selected = StandingsScope::League(league.id);
    run(&mut conn, &mut state, &mut scope, ConsoleCommand::Refresh { scope: selected });
    state.cycle_scope();
    assert_eq!(state.scope(), selected);

    leagues::update_league(
        &conn,
        league.id,
        &LeagueUpdate {
            name: league.name.clone(),
            description: None,
            max_members: league.max_members,
            is_active: false,
        },
    )
    .expect("deactivate");
    run(&mut conn, &mut state, &mut scope, ConsoleCommand::Refresh { scope: selected });
    assert!(state.leagues.is_empty());
    assert_eq!(state.scope(), StandingsScope::Global);
    assert_eq!(state.scope_label(), "Global");
}
