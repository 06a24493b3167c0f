use rusqlite::{Connection, params};

use quiniela::accounts::{self, Registration};
use quiniela::config;
use quiniela::db::{self, League, User};
use quiniela::leagues::{self, LeagueUpdate, NewLeague};
use quiniela::picks::{self, PickEntry};
use quiniela::standings::{self, StandingsScope};
use quiniela::winners::{self, Declaration};

struct Pool {
    conn: Connection,
    admin: User,
    league: League,
}

fn pool() -> Pool {
    let conn = db::open_in_memory().expect("db");
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
    Pool { conn, admin, league }
}

fn member(pool: &mut Pool, username: &str) -> User {
    accounts::register_user(
        &mut pool.conn,
        &Registration {
            username: username.to_string(),
            password: "hunter22".to_string(),
            confirm_password: "hunter22".to_string(),
            league_code: pool.league.code.clone(),
            ..Registration::default()
        },
    )
    .expect("register")
}

fn pick(pool: &mut Pool, user: &User, league_id: i64, picks: &[(&str, &str)]) {
    let entries = picks
        .iter()
        .map(|(game, team)| PickEntry::new(*game, *team))
        .collect::<Vec<_>>();
    picks::submit_picks(&mut pool.conn, user.id, league_id, &entries).expect("submit");
}

fn result(conn: &Connection, week: u32, game: &str, winner: &str) {
    conn.execute(
        "INSERT INTO game_results (week, game_id, winner, updated_at) VALUES (?1, ?2, ?3, ?4)",
        params![week, game, winner, "2024-10-06T21:00:00Z"],
    )
    .expect("result");
}

fn week_five(pool: &mut Pool) -> (User, User) {
    config::set_current_week(&pool.conn, 5).expect("week");
    let a = member(pool, "alicia");
    let b = member(pool, "bruno");
    let league_id = pool.league.id;
    pick(pool, &a, league_id, &[("g1", "KC"), ("g2", "DAL"), ("g3", "SF")]);
    pick(pool, &b, league_id, &[("g1", "KC"), ("g2", "NYG"), ("g3", "SF")]);
    result(&pool.conn, 5, "g1", "KC");
    result(&pool.conn, 5, "g2", "DAL");
    result(&pool.conn, 5, "g3", "SF");
    (a, b)
}

#[test]
fn standings_rank_by_correct_picks() {
    let mut pool = pool();
    let (a, b) = week_five(&mut pool);
    let idle = member(&mut pool, "carla");

    let table = standings::standings(&pool.conn, StandingsScope::League(pool.league.id), None)
        .expect("standings");
    assert_eq!(table.len(), 2);
    assert!(table.iter().all(|s| s.user_id != idle.id));

    assert_eq!(table[0].user_id, a.id);
    assert_eq!((table[0].correct_picks, table[0].total_picks), (3, 3));
    assert!((table[0].percentage - 100.0).abs() < 1e-9);

    assert_eq!(table[1].user_id, b.id);
    assert_eq!((table[1].correct_picks, table[1].total_picks), (2, 3));
    assert!((table[1].percentage - 66.7).abs() < 0.05);
}

#[test]
fn standings_for_an_empty_week_are_empty() {
    let mut pool = pool();
    week_five(&mut pool);
    let table = standings::standings(&pool.conn, StandingsScope::League(pool.league.id), Some(6))
        .expect("standings");
    assert!(table.is_empty());
}

#[test]
fn global_standings_span_leagues_and_skip_admins() {
    let mut pool = pool();
    let (a, _) = week_five(&mut pool);
    let admin = pool.admin.clone();
    let league_id = pool.league.id;
    pick(&mut pool, &admin, league_id, &[("g1", "KC")]);

    let second = leagues::create_league(
        &pool.conn,
        admin.id,
        &NewLeague {
            name: "Familia".to_string(),
            ..NewLeague::default()
        },
    )
    .expect("league");
    leagues::add_member(&pool.conn, a.id, second.id).expect("add");
    pick(&mut pool, &a, second.id, &[("g1", "BAL")]);

    let table = standings::standings(&pool.conn, StandingsScope::Global, Some(5)).expect("global");
    assert_eq!(table.len(), 2);
    assert!(table.iter().all(|s| s.user_id != admin.id));
    let alicia = table.iter().find(|s| s.user_id == a.id).expect("alicia");
    assert_eq!((alicia.correct_picks, alicia.total_picks), (3, 4));
}

#[test]
fn kansas_city_by_name_does_not_match_abbreviation_winner() {
    let mut pool = pool();
    let a = member(&mut pool, "alicia");
    picks::insert_legacy_pick(&pool.conn, a.id, pool.league.id, 1, "g1", "Kansas City Chiefs")
        .expect("legacy pick");
    result(&pool.conn, 1, "g1", "KC");

    let table = standings::standings(&pool.conn, StandingsScope::League(pool.league.id), Some(1))
        .expect("standings");
    assert_eq!((table[0].correct_picks, table[0].total_picks), (0, 1));
}

#[test]
fn single_winner_is_declared_once() {
    let mut pool = pool();
    let (a, _) = week_five(&mut pool);

    for _ in 0..2 {
        let declaration = winners::declare_winners(&mut pool.conn, 5).expect("declare");
        let Declaration::Declared { week, leagues } = declaration else {
            panic!("expected a declaration");
        };
        assert_eq!(week, 5);
        assert_eq!(leagues.len(), 1);
        assert_eq!(leagues[0].winners, vec!["alicia".to_string()]);
        assert_eq!(leagues[0].score, 3);
        assert!(!leagues[0].is_tie);
    }

    let rows = winners::winners_for_week(&pool.conn, pool.league.id, 5).expect("history");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].user_id, a.id);
    assert_eq!(rows[0].score, 3);
    assert!(!rows[0].is_tie);
}

#[test]
fn shared_top_score_is_a_tie() {
    let mut pool = pool();
    config::set_current_week(&pool.conn, 2).expect("week");
    let a = member(&mut pool, "alicia");
    let b = member(&mut pool, "bruno");
    let league_id = pool.league.id;
    pick(&mut pool, &a, league_id, &[("g1", "KC"), ("g2", "DAL"), ("g3", "NYJ")]);
    pick(&mut pool, &b, league_id, &[("g1", "KC"), ("g2", "NYG"), ("g3", "SF")]);
    result(&pool.conn, 2, "g1", "KC");
    result(&pool.conn, 2, "g2", "DAL");
    result(&pool.conn, 2, "g3", "SF");

    winners::declare_winners(&mut pool.conn, 2).expect("declare");
    let rows = winners::winners_for_week(&pool.conn, league_id, 2).expect("history");
    assert_eq!(rows.len(), 2);
    assert!(rows.iter().all(|r| r.is_tie && r.score == 2));
    let mut names = rows.iter().map(|r| r.winner_username.as_str()).collect::<Vec<_>>();
    names.sort_unstable();
    assert_eq!(names, vec!["alicia", "bruno"]);
}

#[test]
fn declaring_without_results_writes_nothing() {
    let mut pool = pool();
    let a = member(&mut pool, "alicia");
    let league_id = pool.league.id;
    pick(&mut pool, &a, league_id, &[("g1", "KC")]);

    let declaration = winners::declare_winners(&mut pool.conn, 1).expect("declare");
    assert_eq!(declaration, Declaration::NoResults { week: 1 });
    assert!(winners::history_for_league(&pool.conn, league_id).expect("history").is_empty());
}

#[test]
fn league_without_correct_picks_keeps_previous_declaration() {
    let mut pool = pool();
    week_five(&mut pool);
    winners::declare_winners(&mut pool.conn, 5).expect("first declaration");

    // Results are corrected so nobody in the league picked right.
    pool.conn
        .execute("UPDATE game_results SET winner = 'TIE' WHERE week = 5", [])
        .expect("update");
    let declaration = winners::declare_winners(&mut pool.conn, 5).expect("second declaration");
    assert_eq!(
        declaration,
        Declaration::Declared {
            week: 5,
            leagues: Vec::new()
        }
    );
    let rows = winners::winners_for_week(&pool.conn, pool.league.id, 5).expect("history");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].winner_username, "alicia");
}

#[test]
fn failed_declaration_rolls_back_every_league() {
    let mut pool = pool();
    week_five(&mut pool);
    winners::declare_winners(&mut pool.conn, 5).expect("first declaration");
    let before = winners::winners_for_week(&pool.conn, pool.league.id, 5).expect("history");
    assert_eq!(before.len(), 1);

    pool.conn
        .execute_batch(
            "CREATE TRIGGER reject_winners BEFORE INSERT ON winners_history
             BEGIN SELECT RAISE(ABORT, 'winners table is read-only'); END;",
        )
        .expect("trigger");
    assert!(winners::declare_winners(&mut pool.conn, 5).is_err());

    let after = winners::winners_for_week(&pool.conn, pool.league.id, 5).expect("history");
    assert_eq!(after, before);
}

#[test]
fn inactive_leagues_are_not_declared() {
    let mut pool = pool();
    week_five(&mut pool);
    let league = pool.league.clone();
    leagues::update_league(
        &pool.conn,
        league.id,
        &LeagueUpdate {
            name: league.name.clone(),
            description: league.description.clone(),
            max_members: league.max_members,
            is_active: false,
        },
    )
    .expect("deactivate");

    let declaration = winners::declare_winners(&mut pool.conn, 5).expect("declare");
    assert_eq!(
        declaration,
        Declaration::Declared {
            week: 5,
            leagues: Vec::new()
        }
    );
    assert!(winners::history_for_league(&pool.conn, league.id).expect("history").is_empty());
}

#[test]
fn invalid_weeks_are_rejected() {
    let mut pool = pool();
    assert!(winners::declare_winners(&mut pool.conn, 0).is_err());
    assert!(winners::declare_winners(&mut pool.conn, 19).is_err());
    assert!(standings::standings(&pool.conn, StandingsScope::Global, Some(25)).is_err());
}
