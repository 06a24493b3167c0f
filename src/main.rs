use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use log::info;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table};
use tui_logger::{TuiLoggerLevelOutput, TuiLoggerWidget};

use quiniela::accounts;
use quiniela::config::AppConfig;
use quiniela::db;
use quiniela::state::{self, AppState, ConsoleCommand, Screen, apply_delta};
use quiniela::worker;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: mpsc::Sender<ConsoleCommand>,
}

impl App {
    fn new(cmd_tx: mpsc::Sender<ConsoleCommand>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            cmd_tx,
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            if matches!(key.code, KeyCode::Char('?') | KeyCode::Esc) {
                self.state.help_overlay = false;
            } else if key.code == KeyCode::Char('q') {
                self.should_quit = true;
            }
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('+') | KeyCode::Char('=') => {
                if let Some(week) = self.state.next_week() {
                    self.send(ConsoleCommand::SetWeek { week });
                }
            }
            KeyCode::Char('-') => {
                if let Some(week) = self.state.prev_week() {
                    self.send(ConsoleCommand::SetWeek { week });
                }
            }
            KeyCode::Char('L') => self.send(ConsoleCommand::ToggleLock),
            KeyCode::Char('p') => {
                self.state.status = format!("Processing results for week {}...", self.state.week);
                self.send(ConsoleCommand::IngestResults {
                    week: self.state.week,
                });
            }
            KeyCode::Char('w') => {
                self.state.status = format!("Declaring winners for week {}...", self.state.week);
                self.send(ConsoleCommand::DeclareWinners {
                    week: self.state.week,
                });
            }
            KeyCode::Char('l') => {
                self.state.cycle_scope();
                self.refresh();
            }
            KeyCode::Tab => self.state.toggle_screen(),
            KeyCode::Char('r') => self.refresh(),
            KeyCode::Char('?') => self.state.help_overlay = true,
            _ => {}
        }
    }

    fn refresh(&mut self) {
        self.send(ConsoleCommand::Refresh {
            scope: self.state.scope(),
        });
    }

    fn send(&mut self, cmd: ConsoleCommand) {
        if self.cmd_tx.send(cmd).is_err() {
            self.state.status = "Worker stopped; restart the console".to_string();
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");

    tui_logger::init_logger(log::LevelFilter::Debug).context("failed to install logger")?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let cfg = AppConfig::from_env();
    let conn = db::open_configured(&cfg, None).context("failed to open database")?;
    if accounts::ensure_default_admin(&conn, &cfg)?.is_none() {
        info!("no admin account; set QUINIELA_ADMIN_PASSWORD to seed one");
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    worker::spawn_worker(cfg, conn, tx, cmd_rx);

    let mut app = App::new(cmd_tx);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            app.on_key(key);
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn ui(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(6),
            Constraint::Length(8),
            Constraint::Length(3),
        ])
        .split(frame.area());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Standings => render_standings(frame, chunks[1], &app.state),
        Screen::Winners => render_winners(frame, chunks[1], &app.state),
    }

    let logs = TuiLoggerWidget::default()
        .block(Block::default().title("Log").borders(Borders::ALL))
        .output_separator(' ')
        .output_timestamp(Some("%H:%M:%S".to_string()))
        .output_level(Some(TuiLoggerLevelOutput::Abbreviated))
        .output_target(false)
        .output_file(false)
        .output_line(false)
        .style_error(Style::default().fg(Color::Red))
        .style_warn(Style::default().fg(Color::Yellow))
        .style_info(Style::default().fg(Color::Gray));
    frame.render_widget(logs, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.area());
    }
}

fn header_text(state: &AppState) -> String {
    let lock = if state.picks_locked { "LOCKED" } else { "open" };
    let screen = match state.screen {
        Screen::Standings => "Standings",
        Screen::Winners => "Winners",
    };
    let line1 = format!(
        "QUINIELA NFL | Week {} | Picks {lock} | {} | {screen}",
        state.week,
        state.scope_label()
    );
    let line2 = format!(
        "Users {} | Leagues {} | Picks this week {} | Results this week {}",
        state.stats.users,
        state.stats.leagues,
        state.stats.picks_this_week,
        state.stats.results_this_week
    );
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    format!(
        "{}\n+/- Week | L Lock | p Process results | w Declare winners | l League | Tab Screen | r Refresh | ? Help | q Quit",
        state.status
    )
}

fn render_standings(frame: &mut Frame, area: Rect, state: &AppState) {
    let members = state
        .selected_league()
        .map(|l| format!(" - {} members", l.members))
        .unwrap_or_default();
    let title = format!(
        "Standings - {}{members} - week {}",
        state.scope_label(),
        state.week
    );
    let block = Block::default().title(title).borders(Borders::ALL);
    if state.standings.is_empty() {
        let empty = Paragraph::new("No picks for this scope and week")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["#", "User", "Name", "Correct", "Total", "%"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = state.standings.iter().enumerate().map(|(idx, s)| {
        let name = match (s.first_name.as_deref(), s.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            _ => String::new(),
        };
        Row::new(vec![
            Cell::from((idx + 1).to_string()),
            Cell::from(s.username.clone()),
            Cell::from(name),
            Cell::from(s.correct_picks.to_string()),
            Cell::from(s.total_picks.to_string()),
            Cell::from(format!("{:.1}", s.percentage)),
        ])
    });
    let widths = [
        Constraint::Length(4),
        Constraint::Length(16),
        Constraint::Min(12),
        Constraint::Length(8),
        Constraint::Length(6),
        Constraint::Length(6),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_winners(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default()
        .title(format!("Winners history - {}", state.scope_label()))
        .borders(Borders::ALL);
    if state.selected_league().is_none() {
        let hint = Paragraph::new("Select a league with l to see its winners")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(hint, area);
        return;
    }
    if state.history.is_empty() {
        let empty = Paragraph::new("No winners declared yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }

    let header = Row::new(["Week", "Winner", "Score", "Tie", "Declared"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let rows = state.history.iter().map(|w| {
        Row::new(vec![
            Cell::from(w.week.to_string()),
            Cell::from(w.winner_username.clone()),
            Cell::from(w.score.to_string()),
            Cell::from(if w.is_tie { "yes" } else { "" }),
            Cell::from(w.declared_at.chars().take(16).collect::<String>()),
        ])
    });
    let widths = [
        Constraint::Length(6),
        Constraint::Min(16),
        Constraint::Length(6),
        Constraint::Length(4),
        Constraint::Length(18),
    ];
    let table = Table::new(rows, widths).header(header).block(block);
    frame.render_widget(table, area);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Quiniela admin console - Help",
        "",
        "  + / -        Next / previous week",
        "  L            Lock or unlock picks",
        "  p            Process results for the week",
        "  w            Declare winners for the week",
        "  l            Cycle league (global first)",
        "  Tab          Standings / winners history",
        "  r            Refresh",
        "  ?            Toggle help",
        "  q            Quit",
    ]
    .join("\n");

    let help = Paragraph::new(text)
        .block(Block::default().title("Help").borders(Borders::ALL))
        .style(Style::default());
    frame.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1]);

    horizontal[1]
}
