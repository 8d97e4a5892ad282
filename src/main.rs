use std::io;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crease_terminal::config::Config;
use crease_terminal::model::{Delivery, Id, Match};
use crease_terminal::progression::Phase;
use crease_terminal::provider;
use crease_terminal::scorecard::{self, NameBook};
use crease_terminal::state::{
    self, AppState, Extra, LiveMatch, Picker, Screen, WicketEntry, apply_delta,
};
use crease_terminal::stats;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>,
}

impl App {
    fn new(state: AppState, cmd_tx: Option<mpsc::Sender<state::ProviderCommand>>) -> Self {
        let mut app = Self {
            state,
            should_quit: false,
            cmd_tx,
        };
        app.flush_commands();
        app
    }

    fn flush_commands(&mut self) {
        let cmds = self.state.take_commands();
        let Some(tx) = &self.cmd_tx else {
            if !cmds.is_empty() {
                self.state.push_log("[WARN] Scoring service worker unavailable");
            }
            return;
        };
        let mut failed = false;
        for cmd in cmds {
            if tx.send(cmd).is_err() {
                failed = true;
            }
        }
        if failed {
            self.state.push_log("[WARN] Request could not be queued");
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.help_overlay {
            self.state.help_overlay = false;
            return;
        }
        if self.state.screen == Screen::Live && self.state.typing_dismissal() {
            self.on_dismissal_text_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => {
                self.should_quit = true;
                return;
            }
            KeyCode::Char('?') => {
                self.state.help_overlay = true;
                return;
            }
            _ => {}
        }
        match self.state.screen.clone() {
            Screen::Home => self.on_home_key(key),
            Screen::Setup => self.on_setup_key(key),
            Screen::Live => self.on_live_key(key),
            Screen::Scorecard { match_id } => match key.code {
                KeyCode::Esc | KeyCode::Char('b') => {
                    if self
                        .state
                        .live
                        .as_ref()
                        .is_some_and(|live| live.match_id == match_id)
                    {
                        self.state.screen = Screen::Live;
                    } else {
                        self.state.go_home();
                    }
                }
                KeyCode::Char('e') => self.export(),
                KeyCode::Char('r') => self.state.retry(Instant::now()),
                _ => {}
            },
        }
        self.flush_commands();
    }

    fn on_home_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_selection(-1),
            KeyCode::Char('n') => self.state.open_setup(),
            KeyCode::Char('r') => self.state.retry(Instant::now()),
            KeyCode::Char('s') => {
                if let Some(id) = self.state.selected_history().map(|e| e.id) {
                    self.state.open_scorecard(id);
                }
            }
            KeyCode::Enter => {
                let Some(entry) = self.state.selected_history().cloned() else {
                    return;
                };
                if entry.finished {
                    self.state.open_scorecard(entry.id);
                } else {
                    self.state.open_match(entry.id, Instant::now());
                }
            }
            _ => {}
        }
    }

    fn on_setup_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('j') | KeyCode::Down => self.state.move_selection(1),
            KeyCode::Char('k') | KeyCode::Up => self.state.move_selection(-1),
            KeyCode::Enter => self.state.setup_pick_team(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.setup_adjust_overs(1),
            KeyCode::Char('-') => self.state.setup_adjust_overs(-1),
            KeyCode::Char('c') => {
                if self.state.create_match() {
                    self.state.push_log("[INFO] Creating match");
                }
            }
            KeyCode::Char('r') => self.state.retry(Instant::now()),
            KeyCode::Esc | KeyCode::Char('b') => self.state.go_home(),
            _ => {}
        }
    }

    fn on_live_key(&mut self, key: KeyEvent) {
        let (picker_open, extra_pending) = match self.state.live.as_ref() {
            Some(live) => (live.picker.is_some(), live.extra.is_some()),
            None => (false, false),
        };
        if picker_open {
            match key.code {
                KeyCode::Char('j') | KeyCode::Down => self.state.picker_move(1),
                KeyCode::Char('k') | KeyCode::Up => self.state.picker_move(-1),
                KeyCode::Enter => self.state.picker_confirm(),
                // Only the wicket picker reacts to these.
                KeyCode::Char(c @ '0'..='6') => {
                    self.state.wicket_set_runs(c.to_digit(10).unwrap_or(0));
                }
                KeyCode::Char('n') => self.state.wicket_toggle_no_ball(),
                KeyCode::Char('o') => self.state.wicket_toggle_non_striker(),
                KeyCode::Esc => {
                    if !self.state.cancel_input() {
                        self.state.go_home();
                    }
                }
                _ => {}
            }
            return;
        }
        match key.code {
            KeyCode::Char(c @ '0'..='6') => {
                let runs = c.to_digit(10).unwrap_or(0);
                self.state.enter_runs(runs);
            }
            KeyCode::Enter if extra_pending => self.state.confirm_extra(),
            KeyCode::Esc if extra_pending => {
                self.state.cancel_input();
            }
            KeyCode::Char('w') => self.state.begin_extra(Extra::Wide),
            KeyCode::Char('n') => self.state.begin_extra(Extra::NoBall),
            KeyCode::Char('b') => self.state.begin_extra(Extra::Bye),
            KeyCode::Char('l') => self.state.begin_extra(Extra::LegBye),
            KeyCode::Char('x') => self.state.open_wicket_picker(),
            KeyCode::Char('r') => self.state.retry(Instant::now()),
            KeyCode::Char('m') => self.state.manual_setup(),
            KeyCode::Char('c') => self.state.dismiss_banner(),
            KeyCode::Char('s') => {
                if let Some(id) = self.state.live.as_ref().map(|l| l.match_id) {
                    self.state.open_scorecard(id);
                }
            }
            KeyCode::Char('e') => self.export(),
            KeyCode::Esc => self.state.go_home(),
            _ => {}
        }
    }

    fn on_dismissal_text_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => self.state.picker_confirm(),
            KeyCode::Esc => {
                self.state.cancel_input();
            }
            KeyCode::Backspace => self.state.wicket_backspace(),
            KeyCode::Char(c) => self.state.wicket_type(c),
            _ => {}
        }
    }

    fn export(&mut self) {
        let match_id = match (&self.state.screen, self.state.live.as_ref()) {
            (Screen::Scorecard { match_id }, _) => *match_id,
            (_, Some(live)) => live.match_id,
            _ => return,
        };
        self.state
            .export_scorecard(PathBuf::from(format!("scorecard_{match_id}.xlsx")));
    }
}

fn main() -> Result<()> {
    let config = Config::load();
    let backend = config.open_backend()?;
    let store = config.open_store();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let term_backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(term_backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    provider::spawn_provider(backend, tx, cmd_rx, config.match_poll);

    let mut state = AppState::new(store, config.setup_timeout);
    state.push_log(format!(
        "[INFO] Backend: {:?} | store: {}",
        config.backend_mode,
        state
            .store()
            .path()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "disabled".to_string())
    ));
    let mut app = App::new(state, Some(cmd_tx));
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }
        app.state.check_setup_timeout(Instant::now());
        app.flush_commands();

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
            Constraint::Min(1),
            Constraint::Length(5),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    let body = chunks[1];
    match &app.state.screen {
        Screen::Home => render_home(frame, body, &app.state),
        Screen::Setup => render_setup(frame, body, &app.state),
        Screen::Live => render_live(frame, body, &app.state),
        Screen::Scorecard { .. } => render_scorecard(frame, body, &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .block(Block::default().title("Console").borders(Borders::ALL));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state)).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(footer, chunks[3]);

    if let Some(banner) = &app.state.banner {
        render_banner(frame, body, banner);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let title = match &state.screen {
        Screen::Home => "CREASE | Match history".to_string(),
        Screen::Setup => "CREASE | New match".to_string(),
        Screen::Live => match state.live.as_ref().and_then(|l| l.record.as_ref()) {
            Some(m) => format!("CREASE | {} v {}", m.team_a_name, m.team_b_name),
            None => "CREASE | Live".to_string(),
        },
        Screen::Scorecard { match_id } => format!("CREASE | Scorecard {match_id}"),
    };
    let line1 = format!("  _||_  {title}");
    let line2 = " |    |".to_string();
    format!("{line1}\n{line2}")
}

fn footer_text(state: &AppState) -> String {
    match &state.screen {
        Screen::Home => "Enter Open | n New match | s Scorecard | j/k Move | r Reload | ? Help | q Quit",
        Screen::Setup => "Enter Pick team | +/- Overs | c Create | Esc Back | ? Help | q Quit",
        Screen::Live => {
            "0-6 Runs | w Wide | n No ball | b Bye | l Leg bye | x Wicket | s Card | r Retry | m Manual | Esc Home"
        }
        Screen::Scorecard { .. } => "e Export xlsx | r Refresh | Esc Back | q Quit",
    }
    .to_string()
}

fn render_home(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Matches").borders(Borders::ALL);
    if state.history.is_empty() {
        let empty = Paragraph::new("No matches yet. Press n to set one up.")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(empty, area);
        return;
    }
    let visible = area.height.saturating_sub(2) as usize;
    let (start, end) = visible_range(state.selected, state.history.len(), visible);
    let lines = (start..end)
        .map(|idx| {
            let entry = &state.history[idx];
            let marker = if idx == state.selected { "> " } else { "  " };
            let status = if entry.finished { "finished" } else { "in progress" };
            let line = format!(
                "{marker}{} v {}  {}  [{status}]",
                entry.team_a,
                entry.team_b,
                short_time(&entry.created_at)
            );
            if idx == state.selected {
                Line::styled(line, Style::default().fg(Color::White).bg(Color::DarkGray))
            } else {
                Line::raw(line)
            }
        })
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_setup(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = Vec::new();
    if state.teams.is_empty() {
        lines.push(Line::styled(
            "No teams loaded. Add teams with squad_admin, then press r.",
            Style::default().fg(Color::DarkGray),
        ));
    }
    for (idx, team) in state.teams.iter().enumerate() {
        let tag = if state.setup.team_a == Some(team.id) {
            "[A]"
        } else if state.setup.team_b == Some(team.id) {
            "[B]"
        } else {
            "   "
        };
        let line = format!(
            "{tag} {} ({} players, eleven {})",
            team.name,
            team.players.len(),
            team.squad.len()
        );
        if idx == state.setup.selected {
            lines.push(Line::styled(
                line,
                Style::default().fg(Color::White).bg(Color::DarkGray),
            ));
        } else {
            lines.push(Line::raw(line));
        }
    }
    frame.render_widget(
        Paragraph::new(lines).block(Block::default().title("Teams").borders(Borders::ALL)),
        columns[0],
    );

    let name = |id: Option<Id>| {
        state
            .teams
            .iter()
            .find(|t| Some(t.id) == id)
            .map(|t| t.name.clone())
            .unwrap_or_else(|| "-".to_string())
    };
    let rules = &state.rules.match_rules;
    let text = [
        format!("Tournament: {}", state.rules.name),
        String::new(),
        format!("Team A (bats first): {}", name(state.setup.team_a)),
        format!("Team B: {}", name(state.setup.team_b)),
        format!("Overs per innings: {}", state.setup.overs),
        format!("Players per side: {}", rules.players_per_side),
        format!("Max overs per bowler: {}", rules.max_overs_per_bowler),
        format!(
            "Free hit after no ball: {}",
            if rules.free_hit_on_no_ball { "yes" } else { "no" }
        ),
    ]
    .join("\n");
    frame.render_widget(
        Paragraph::new(text).block(Block::default().title("Match").borders(Borders::ALL)),
        columns[1],
    );
}

fn render_live(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(live) = state.live.as_ref() else {
        return;
    };
    let names = NameBook::from_teams(&state.teams);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(4),
            Constraint::Length(5),
            Constraint::Min(3),
        ])
        .split(area);

    let score = Paragraph::new(score_text(live))
        .block(Block::default().title("Score").borders(Borders::ALL));
    frame.render_widget(score, rows[0]);

    let crease = Paragraph::new(crease_text(live, &names))
        .block(Block::default().title("At the crease").borders(Borders::ALL));
    frame.render_widget(crease, rows[1]);

    let over = Paragraph::new(over_text(live))
        .wrap(Wrap { trim: true })
        .block(Block::default().title("This over").borders(Borders::ALL));
    frame.render_widget(over, rows[2]);

    if live.picker.is_some() {
        render_picker(frame, area, state, live);
    }
}

fn score_text(live: &LiveMatch) -> String {
    let p = &live.progression;
    let Some(record) = live.record.as_ref() else {
        return if live.stuck {
            "Match record unavailable. m Manual setup | r Retry | Esc Home".to_string()
        } else {
            "Loading match...".to_string()
        };
    };
    let deliveries = record.deliveries(p.innings);
    let totals = stats::innings_stats(deliveries);
    let batting = record
        .innings_no(p.innings)
        .map(|inn| record.team_name(inn.batting_team))
        .unwrap_or("?");
    let mut line1 = format!(
        "Inn {} | {batting} {}/{} ({} / {} ov) RR {:.2}",
        p.innings,
        totals.runs,
        totals.wickets,
        totals.overs,
        record.rules.overs_per_innings,
        totals.run_rate
    );
    if let Some(target) = live.target() {
        let remaining = record
            .rules
            .balls_per_innings()
            .saturating_sub(totals.legal_balls);
        let need = target.saturating_sub(totals.runs);
        line1.push_str(&format!(" | Target {target}, need {need} from {remaining}"));
        if let Some(rrr) = stats::required_run_rate(target, totals.runs, remaining) {
            line1.push_str(&format!(" (RRR {rrr:.2})"));
        }
    }
    let mut flags = vec![format!("Phase: {}", p.phase)];
    if p.free_hit {
        flags.push("FREE HIT".to_string());
    }
    if live.pending.is_some() {
        flags.push("submitting...".to_string());
    }
    if let Some(extra) = live.extra {
        flags.push(format!("{}: runs? (Enter for default)", extra.label()));
    }
    if let Some(result) = scorecard::result_line(record, Some(p.phase)) {
        flags.push(result);
    }
    format!("{line1}\n{}", flags.join(" | "))
}

fn crease_text(live: &LiveMatch, names: &NameBook) -> String {
    let p = &live.progression;
    let deliveries = live.deliveries();
    let batter = |id: Option<_>, mark: &str| match id {
        Some(id) => {
            let s = stats::batsman_stats(deliveries, id);
            format!(
                "{mark} {:<18} {:>3} ({:>3})  4s {}  6s {}  SR {:.1}",
                names.name(id),
                s.runs,
                s.balls,
                s.fours,
                s.sixes,
                s.strike_rate
            )
        }
        None => format!("{mark} (vacant)"),
    };
    let bowler = match p.bowler {
        Some(id) => {
            let s = stats::bowler_stats(deliveries, id);
            format!(
                "  {:<18} {}-{}-{}-{}  Econ {:.2}",
                names.name(id),
                s.overs,
                s.maidens,
                s.runs,
                s.wickets,
                s.economy
            )
        }
        None => "  (no bowler)".to_string(),
    };
    let (p_runs, p_balls) = stats::current_partnership(deliveries);
    [
        batter(p.striker, "*"),
        batter(p.non_striker, " "),
        bowler,
        format!("  Partnership {p_runs} ({p_balls})"),
    ]
    .join("\n")
}

fn over_text(live: &LiveMatch) -> String {
    let deliveries = live.deliveries();
    if deliveries.is_empty() {
        return match live.progression.phase {
            Phase::AwaitingInningsSetup | Phase::AwaitingInningsTransition => {
                "Pick openers and bowler to start the innings".to_string()
            }
            _ => "No balls bowled yet".to_string(),
        };
    }
    stats::current_over(deliveries)
        .iter()
        .map(ball_symbol)
        .collect::<Vec<_>>()
        .join("  ")
}

fn ball_symbol(d: &Delivery) -> String {
    if d.wicket.is_some() {
        return if d.runs > 0 {
            format!("W+{}", d.runs)
        } else {
            "W".to_string()
        };
    }
    let tag = if d.is_wide {
        "wd"
    } else if d.is_no_ball {
        "nb"
    } else if d.is_bye {
        "b"
    } else if d.is_leg_bye {
        "lb"
    } else {
        ""
    };
    match (d.runs, tag) {
        (0, "") => ".".to_string(),
        (n, t) => format!("{n}{t}"),
    }
}

fn render_picker(frame: &mut Frame, area: Rect, state: &AppState, live: &LiveMatch) {
    let Some(picker) = live.picker.as_ref() else {
        return;
    };
    let popup = centered_rect(50, 70, area);
    frame.render_widget(Clear, popup);
    let options = state.picker_options();
    let mut lines = if let Picker::Wicket {
        entry:
            WicketEntry {
                other: Some(text), ..
            },
        ..
    } = picker
    {
        vec![
            Line::raw(format!("{text}_")),
            Line::styled(
                "Enter to record, Esc to go back",
                Style::default().fg(Color::DarkGray),
            ),
        ]
    } else if options.is_empty() {
        vec![Line::styled(
            "No players available (check squads, then r)",
            Style::default().fg(Color::DarkGray),
        )]
    } else {
        options
            .iter()
            .enumerate()
            .map(|(idx, (label, _))| {
                if idx == picker.selected() {
                    Line::styled(
                        format!("> {label}"),
                        Style::default().fg(Color::White).bg(Color::DarkGray),
                    )
                } else {
                    Line::raw(format!("  {label}"))
                }
            })
            .collect()
    };
    if let Picker::Wicket { entry, .. } = picker
        && entry.other.is_none()
    {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("{}  (0-6 runs, n no ball, o non-striker)", entry.describe()),
            Style::default().fg(Color::Yellow),
        ));
    }
    let widget = Paragraph::new(lines).block(
        Block::default()
            .title(picker.title())
            .borders(Borders::ALL),
    );
    frame.render_widget(widget, popup);
}

fn render_scorecard(frame: &mut Frame, area: Rect, state: &AppState) {
    let block = Block::default().title("Scorecard").borders(Borders::ALL);
    let Some(m) = state.scorecard.as_ref() else {
        frame.render_widget(Paragraph::new("Loading scorecard...").block(block), area);
        return;
    };
    let names = NameBook::from_teams(&state.teams);
    frame.render_widget(
        Paragraph::new(scorecard_text(m, &names))
            .wrap(Wrap { trim: false })
            .block(block),
        area,
    );
}

fn scorecard_text(m: &Match, names: &NameBook) -> String {
    let mut lines = Vec::new();
    for card in scorecard::match_card(m, names) {
        lines.push(card.total_line());
        for row in &card.batting {
            lines.push(format!(
                "  {:<18} {:<24} {:>3} ({:>3}) 4s {} 6s {} SR {:.1}",
                row.name, row.dismissal, row.runs, row.balls, row.fours, row.sixes, row.strike_rate
            ));
        }
        lines.push(format!(
            "  Extras {} (w {}, nb {}, b {}, lb {})",
            card.extras.total(),
            card.extras.wides,
            card.extras.no_balls,
            card.extras.byes,
            card.extras.leg_byes
        ));
        if !card.fall_of_wickets.is_empty() {
            lines.push(format!("  FoW: {}", card.fall_of_wickets.join(", ")));
        }
        for row in &card.bowling {
            lines.push(format!(
                "  {:<18} {}-{}-{}-{}  Econ {:.2}",
                row.name, row.overs, row.maidens, row.runs, row.wickets, row.economy
            ));
        }
        lines.push(String::new());
    }
    if let Some(result) = scorecard::result_line(m, None) {
        lines.push(result);
    }
    lines.join("\n")
}

fn render_banner(frame: &mut Frame, area: Rect, text: &str) {
    let height = 3.min(area.height);
    let rect = Rect {
        x: area.x,
        y: area.y + area.height.saturating_sub(height),
        width: area.width,
        height,
    };
    frame.render_widget(Clear, rect);
    let banner = Paragraph::new(text)
        .style(Style::default().fg(Color::White).bg(Color::Red))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(banner, rect);
}

fn visible_range(selected: usize, total: usize, visible: usize) -> (usize, usize) {
    if total == 0 {
        return (0, 0);
    }
    if total <= visible {
        return (0, total);
    }

    let mut start = selected.saturating_sub(visible / 2);
    if start + visible > total {
        start = total - visible;
    }
    (start, start + visible)
}

fn short_time(raw: &str) -> String {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No alerts yet".to_string();
    }
    state
        .logs
        .iter()
        .rev()
        .take(3)
        .cloned()
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 70, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "Crease - Help",
        "",
        "Live scoring:",
        "  0-6          Runs off the bat",
        "  w / n        Wide / no ball, then runs or Enter",
        "  b / l        Bye / leg bye, then runs or Enter",
        "  x            Wicket (after n for a no-ball wicket)",
        "               in the list: 0-6 runs, n no ball,",
        "               o non-striker out, Other... to type",
        "  s            Scorecard",
        "  e            Export scorecard to xlsx",
        "  r            Retry after an error",
        "  m            Manual innings setup",
        "",
        "Lists:",
        "  j/k or ↑/↓   Move",
        "  Enter        Select",
        "  Esc          Back",
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
