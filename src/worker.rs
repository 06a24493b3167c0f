use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use chrono::Utc;
use log::{error, warn};
use rusqlite::Connection;

use crate::autolock;
use crate::config::{self, AppConfig};
use crate::db;
use crate::leagues;
use crate::results;
use crate::standings::{self, StandingsScope};
use crate::state::{ConsoleCommand, Delta, LeagueSummary, Snapshot};
use crate::winners;
use crate::Result;

const COMMAND_WAIT: Duration = Duration::from_millis(900);

pub fn spawn_worker(
    cfg: AppConfig,
    conn: Connection,
    tx: Sender<Delta>,
    cmd_rx: Receiver<ConsoleCommand>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut conn = conn;
        let mut scope = StandingsScope::Global;
        let autolock_interval = Duration::from_secs(cfg.autolock_poll_secs);
        let mut last_autolock: Option<Instant> = None;

        send_snapshot(&conn, scope, &tx);

        loop {
            match cmd_rx.recv_timeout(COMMAND_WAIT) {
                Ok(cmd) => {
                    for delta in handle_command(&mut conn, &cfg, &mut scope, cmd) {
                        if tx.send(delta).is_err() {
                            return;
                        }
                    }
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return,
            }

            if cfg.autolock_enabled
                && last_autolock.is_none_or(|at| at.elapsed() >= autolock_interval)
            {
                last_autolock = Some(Instant::now());
                match autolock::run_once(&conn, &cfg, Utc::now()) {
                    Ok(check @ autolock::LockCheck::Locked { .. }) => {
                        let _ = tx.send(Delta::AutoLock(check));
                        send_snapshot(&conn, scope, &tx);
                    }
                    Ok(_) => {}
                    Err(err) => warn!("auto-lock check failed: {err}"),
                }
            }
        }
    })
}

/// Run one console command and return the deltas to send back, always ending
/// with a fresh snapshot.
pub fn handle_command(
    conn: &mut Connection,
    cfg: &AppConfig,
    scope: &mut StandingsScope,
    cmd: ConsoleCommand,
) -> Vec<Delta> {
    let mut out = Vec::new();
    let outcome: Result<()> = match cmd {
        ConsoleCommand::Refresh { scope: next } => {
            *scope = next;
            Ok(())
        }
        ConsoleCommand::SetWeek { week } => config::set_current_week(conn, week),
        ConsoleCommand::ToggleLock => config::toggle_picks_lock(conn).map(|_| ()),
        ConsoleCommand::IngestResults { week } => {
            results::process_week(conn, cfg, week).map(|summary| {
                out.push(Delta::Ingested(summary));
            })
        }
        ConsoleCommand::DeclareWinners { week } => {
            winners::declare_winners(conn, week).map(|declaration| {
                out.push(Delta::Declared(declaration));
            })
        }
    };
    if let Err(err) = outcome {
        error!("command failed: {err}");
        out.push(Delta::Failed(err.to_string()));
    }
    match load_snapshot(conn, *scope) {
        Ok(snapshot) => out.push(Delta::SetSnapshot(snapshot)),
        Err(err) => out.push(Delta::Failed(err.to_string())),
    }
    out
}

pub fn load_snapshot(conn: &Connection, scope: StandingsScope) -> Result<Snapshot> {
    let week = config::current_week(conn)?;
    let mut summaries = Vec::new();
    for league in leagues::all_leagues(conn)?.into_iter().filter(|l| l.is_active) {
        summaries.push(LeagueSummary {
            members: leagues::member_count(conn, league.id)?,
            id: league.id,
            name: league.name,
            code: league.code,
        });
    }
    // A league deactivated since the last refresh falls back to global.
    let scope = match scope {
        StandingsScope::League(id) if !summaries.iter().any(|l| l.id == id) => {
            StandingsScope::Global
        }
        other => other,
    };
    let history = match scope {
        StandingsScope::League(id) => winners::history_for_league(conn, id)?,
        StandingsScope::Global => Vec::new(),
    };
    Ok(Snapshot {
        week,
        picks_locked: config::picks_locked(conn)?,
        leagues: summaries,
        standings: standings::standings(conn, scope, Some(week))?,
        history,
        stats: db::stats(conn, week)?,
    })
}

fn send_snapshot(conn: &Connection, scope: StandingsScope, tx: &Sender<Delta>) {
    let delta = match load_snapshot(conn, scope) {
        Ok(snapshot) => Delta::SetSnapshot(snapshot),
        Err(err) => Delta::Failed(err.to_string()),
    };
    let _ = tx.send(delta);
}
