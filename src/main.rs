use std::fs::{self, File};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::widgets::{Bar, BarChart, BarGroup, Block, Borders, Clear, Paragraph};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use datafutebol::cache::DatasetCache;
use datafutebol::config::{ConfigError, DataSource, EngineConfig};
use datafutebol::dataset::Dataset;
use datafutebol::demo::DemoSeason;
use datafutebol::export;
use datafutebol::pitch::{HEATMAP_COLS, HEATMAP_ROWS, MapKind, PitchMark};
use datafutebol::rankings::Grouping;
use datafutebol::state::{AppState, COMPARE_PRESETS, Screen};
use datafutebol::value::Value;

#[derive(Debug, clap::Parser)]
#[command(about = "Brasileirão event-log dashboard")]
struct Args {
    /// Event log (.csv or .parquet); falls back to DATAFUTEBOL_DATA.
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Engine config (JSON); falls back to DATAFUTEBOL_CONFIG.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Use the synthetic demo season instead of a file.
    #[arg(long)]
    demo: bool,
}

struct App {
    state: AppState,
    should_quit: bool,
    config: EngineConfig,
    source: Result<DataSource, ConfigError>,
}

impl App {
    fn new(config: EngineConfig, source: Result<DataSource, ConfigError>) -> Self {
        Self {
            state: AppState::new(),
            should_quit: false,
            config,
            source,
        }
    }

    fn load(&mut self) {
        match &self.source {
            Ok(DataSource::File(path)) => match DatasetCache::global().load(path, &self.config) {
                Ok(dataset) => self.state.set_dataset(dataset),
                Err(err) => {
                    warn!(error = %err, "dataset load failed");
                    self.state.clear_dataset(err);
                }
            },
            Ok(DataSource::Demo) => {
                let dataset = DemoSeason::default().dataset(&self.config);
                let dataset = DatasetCache::global().insert(Arc::new(dataset));
                self.state.set_dataset(dataset);
                self.state.push_log("[INFO] Demo season loaded (synthetic data)");
            }
            Err(err) => {
                warn!(error = %err, "no dataset configured");
                let message = err.to_string();
                self.state.clear_dataset(message);
            }
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.map_search_active {
            self.on_search_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.screen = Screen::Rankings,
            KeyCode::Char('2') => self.state.screen = Screen::Teams,
            KeyCode::Char('3') => self.state.screen = Screen::Compare,
            KeyCode::Char('4') => self.state.screen = Screen::Map,
            KeyCode::Tab => self.state.cycle_screen(),
            KeyCode::Char('j') | KeyCode::Down => self.state.select_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.select_prev(),
            KeyCode::Char('v') => self.state.cycle_view(),
            KeyCode::Char('m') => self.state.toggle_mode(),
            KeyCode::Char('g') => self.state.toggle_grouping(),
            KeyCode::Char('t') => self.state.cycle_team_filter(),
            KeyCode::Char('+') | KeyCode::Char('=') => self.state.adjust_min_games(1),
            KeyCode::Char('-') => self.state.adjust_min_games(-1),
            KeyCode::Char('s') => self.state.cycle_sort_column(),
            KeyCode::Char(' ') | KeyCode::Char('c') if self.state.screen == Screen::Rankings => {
                self.state.toggle_compare_selected()
            }
            KeyCode::Char('x') if self.state.screen == Screen::Compare => {
                self.state.remove_compare_selected()
            }
            KeyCode::Char('p') => self.state.cycle_compare_preset(),
            KeyCode::Char('a') => self.state.cycle_map_action(),
            KeyCode::Char('h') => self.state.toggle_map_kind(),
            KeyCode::Char('/') if self.state.screen == Screen::Map => {
                self.state.map_search_active = true;
            }
            KeyCode::Char('r') => self.load(),
            KeyCode::Char('e') => self.export(),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_search_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc => self.state.map_search_active = false,
            KeyCode::Backspace => self.state.pop_map_query(),
            KeyCode::Char(ch) => self.state.push_map_query(ch),
            _ => {}
        }
    }

    fn export(&mut self) {
        let Some(dataset) = self.state.dataset.clone() else {
            self.state.push_log("[INFO] Nothing to export");
            return;
        };
        let stamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        let path = PathBuf::from(format!("datafutebol_{stamp}.xlsx"));
        let now = Instant::now();
        match export::export_dataset(&dataset, &path, self.state.mode) {
            Ok(report) => {
                let message = format!(
                    "{} teams, {} matches, {} players",
                    report.teams, report.matches, report.players
                );
                self.state
                    .push_log(format!("[INFO] Exported {}: {message}", path.display()));
                self.state
                    .export
                    .finish(path.display().to_string(), message, false, now);
            }
            Err(err) => {
                warn!(error = %err, "export failed");
                self.state.push_log(format!("[ERROR] Export failed: {err:#}"));
                self.state
                    .export
                    .finish(path.display().to_string(), format!("{err:#}"), true, now);
            }
        }
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let args = Args::parse();
    let log_path = init_file_logging();

    let config = EngineConfig::resolve(args.config.as_deref()).context("loading engine config")?;
    let source = DataSource::resolve(args.data, args.demo);
    info!(source = ?source, "starting dashboard");

    let mut app = App::new(config, source);
    app.load();
    if let Some(path) = &log_path {
        app.state
            .push_log(format!("[INFO] Logging to {}", path.display()));
    }

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let res = run_app(&mut terminal, &mut app);

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

/// Logs go to a file so they don't tear the alternate screen.
fn init_file_logging() -> Option<PathBuf> {
    let base = std::env::var_os("XDG_CACHE_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".cache")))?;
    let dir = base.join("datafutebol");
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("datafutebol.log");
    let file = File::options().create(true).append(true).open(&path).ok()?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .ok()?;
    Some(path)
}

fn run_app<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        app.state.maybe_clear_export(Instant::now());
        terminal.draw(|f| ui(f, app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or(Duration::ZERO);
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    app.on_key(key);
                }
            }
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
            Constraint::Length(2),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(2),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(&app.state))
        .style(Style::default().add_modifier(Modifier::BOLD))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    match app.state.screen {
        Screen::Rankings => render_rankings(frame, chunks[1], &app.state),
        Screen::Teams => render_teams(frame, chunks[1], &app.state),
        Screen::Compare => render_compare(frame, chunks[1], &app.state),
        Screen::Map => render_map(frame, chunks[1], &app.state),
    }

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().title("Log").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(footer, chunks[3]);

    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(state: &AppState) -> String {
    let source = state
        .dataset
        .as_ref()
        .map(|d| dataset_label(d))
        .unwrap_or_else(|| "sem dados".to_string());
    let mut title = format!("DATAFUTEBOL | {} | {source}", state.screen.label());
    if state.screen == Screen::Rankings {
        title.push_str(&format!(
            " | {} | {} | {} | Time: {} | Jogos >= {}",
            state.view.label(),
            state.grouping.label(),
            state.mode.label(),
            state.team_filter.as_deref().unwrap_or("todos"),
            state.min_games
        ));
    }
    if state.export.active {
        let status = if state.export.failed { "FALHOU" } else { "OK" };
        title.push_str(&format!(" | Export {status}"));
    }
    title
}

fn dataset_label(dataset: &Dataset) -> String {
    let name = dataset
        .source()
        .and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "demo".to_string());
    format!("{name} ({} partidas)", dataset.match_count())
}

fn footer_text(state: &AppState) -> String {
    match state.screen {
        Screen::Rankings => {
            "Tab Screen | j/k Move | v View | g Group | m Mode | t Team | +/- Games | s Sort | Space Compare | e Export | ? Help | q Quit".to_string()
        }
        Screen::Teams => "Tab Screen | j/k Move | e Export | ? Help | q Quit".to_string(),
        Screen::Compare => {
            "Tab Screen | j/k Move | x Remove | p Metrics | ? Help | q Quit".to_string()
        }
        Screen::Map => {
            if state.map_search_active {
                "Type to search | Backspace Delete | Enter/Esc Done".to_string()
            } else {
                "Tab Screen | / Search | j/k Player | a Action | h Heatmap | ? Help | q Quit"
                    .to_string()
            }
        }
    }
}

const NAME_WIDTH: usize = 22;
const TEAM_WIDTH: usize = 18;
const STAT_WIDTH: usize = 11;

fn render_rankings(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(table) = state.ranking_table() else {
        render_empty(frame, area, "No dataset loaded");
        return;
    };
    if table.rows.is_empty() {
        render_empty(frame, area, "No rows match the current filters");
        return;
    }

    let fixed = NAME_WIDTH + TEAM_WIDTH + 4;
    let fit = (area.width as usize).saturating_sub(fixed) / STAT_WIDTH;
    let shown = table.columns.len().min(fit.max(1));
    let sort = state.sort_stat.unwrap_or(table.columns[0]);

    let mut header = format!(
        "{:<name$}{:<team$}{:>4}",
        if state.grouping == Grouping::Player { "Jogador" } else { "Time" },
        if state.grouping == Grouping::Player { "Time" } else { "" },
        "J",
        name = NAME_WIDTH,
        team = TEAM_WIDTH
    );
    for stat in &table.columns[..shown] {
        let marker = if *stat == sort { "▼" } else { "" };
        let label = truncate(&format!("{marker}{}", stat.label()), STAT_WIDTH - 1);
        header.push_str(&format!("{label:>width$}", width = STAT_WIDTH));
    }

    let mut lines = vec![Line::from(Span::styled(
        header,
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    let visible = area.height.saturating_sub(1) as usize;
    let (start, end) = visible_range(state.rankings_selected, table.rows.len(), visible);
    for idx in start..end {
        let row = &table.rows[idx];
        let team = if state.grouping == Grouping::Player {
            row.team.as_str()
        } else {
            ""
        };
        let mut text = format!(
            "{:<name$}{:<team_w$}{:>4}",
            truncate(row.name(), NAME_WIDTH - 1),
            truncate(team, TEAM_WIDTH - 1),
            row.games,
            name = NAME_WIDTH,
            team_w = TEAM_WIDTH
        );
        for value in &row.values[..shown] {
            text.push_str(&format!("{:>width$}", format_value(*value), width = STAT_WIDTH));
        }
        let picked = row.player.as_ref().is_some_and(|p| {
            state
                .compare_players
                .iter()
                .any(|k| k.player == *p && k.team == row.team)
        });
        let mut style = Style::default();
        if picked {
            style = style.fg(Color::Cyan);
        }
        if idx == state.rankings_selected {
            style = style.bg(Color::DarkGray).fg(Color::White);
        }
        lines.push(Line::from(Span::styled(text, style)));
    }
    frame.render_widget(Paragraph::new(lines), area);
}

fn render_teams(frame: &mut Frame, area: Rect, state: &AppState) {
    let season = state.season_rows();
    if season.is_empty() {
        render_empty(frame, area, "No two-team matches in dataset");
        return;
    }
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let mut lines = vec![Line::from(Span::styled(
        format!("{:<22}{:>4}{:>9}{:>12}", "Time", "J", "PPDA", "Field Tilt"),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    let visible = columns[0].height.saturating_sub(3) as usize;
    let (start, end) = visible_range(state.teams_selected, season.len(), visible);
    for idx in start..end {
        let team = &season[idx];
        let text = format!(
            "{:<22}{:>4}{:>9}{:>11.1}%",
            truncate(&team.team, 21),
            team.matches,
            format_value(team.ppda.round(2)),
            team.field_tilt
        );
        let style = if idx == state.teams_selected {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }
    let list = Paragraph::new(lines).block(Block::default().title("Temporada").borders(Borders::ALL));
    frame.render_widget(list, columns[0]);

    let matches = state.selected_team_matches();
    let mut detail = vec![Line::from(Span::styled(
        format!("{:<10}{:<20}{:>9}{:>9}", "Partida", "Adversário", "PPDA", "Tilt"),
        Style::default().add_modifier(Modifier::BOLD),
    ))];
    for m in &matches {
        let tilt_style = if m.field_tilt >= 50.0 {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Red)
        };
        detail.push(Line::from(vec![
            Span::raw(format!(
                "{:<10}{:<20}{:>9}",
                m.match_id,
                truncate(&m.opponent, 19),
                format_value(m.ppda)
            )),
            Span::styled(format!("{:>8.1}%", m.field_tilt), tilt_style),
        ]));
    }
    let title = season
        .get(state.teams_selected)
        .map(|t| format!("Partidas: {}", t.team))
        .unwrap_or_else(|| "Partidas".to_string());
    let detail = Paragraph::new(detail).block(Block::default().title(title).borders(Borders::ALL));
    frame.render_widget(detail, columns[1]);
}

const PLAYER_COLORS: [Color; 4] = [Color::Green, Color::Cyan, Color::Yellow, Color::Magenta];

fn render_compare(frame: &mut Frame, area: Rect, state: &AppState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(7), Constraint::Min(1)])
        .split(area);

    let preset = COMPARE_PRESETS[state.compare_preset % COMPARE_PRESETS.len()].0;
    let mut picked: Vec<Line> = state
        .compare_players
        .iter()
        .enumerate()
        .map(|(idx, key)| {
            let mut style = Style::default().fg(PLAYER_COLORS[idx % PLAYER_COLORS.len()]);
            if idx == state.compare_selected {
                style = style.bg(Color::DarkGray);
            }
            Line::from(Span::styled(key.to_string(), style))
        })
        .collect();
    if picked.is_empty() {
        picked.push(Line::from(Span::styled(
            "Pick 2-4 players with Space on the rankings screen",
            Style::default().fg(Color::DarkGray),
        )));
    }
    let list = Paragraph::new(picked).block(
        Block::default()
            .title(format!("Jogadores | Métricas: {preset}"))
            .borders(Borders::ALL),
    );
    frame.render_widget(list, rows[0]);

    let entries = match state.comparison() {
        Some(Ok(entries)) => entries,
        Some(Err(err)) => {
            render_empty(frame, rows[1], &err.to_string());
            return;
        }
        None => {
            render_empty(frame, rows[1], "No dataset loaded");
            return;
        }
    };

    let players = state.compare_players.len().max(1);
    let mut chart = BarChart::default()
        .block(Block::default().title("Percentis (por jogo)").borders(Borders::ALL))
        .direction(Direction::Horizontal)
        .bar_width(1)
        .bar_gap(0)
        .group_gap(1)
        .max(100);
    for stat in state.compare_stats() {
        let bars: Vec<Bar> = entries
            .iter()
            .filter(|e| e.stat == *stat)
            .enumerate()
            .map(|(idx, e)| {
                let pct = e.percentile.map_or(0, |p| (p * 100.0).round() as u64);
                Bar::default()
                    .value(pct)
                    .text_value(format!("{pct} ({})", format_value(e.value)))
                    .style(Style::default().fg(PLAYER_COLORS[idx % players % PLAYER_COLORS.len()]))
            })
            .collect();
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(stat.label()))
                .bars(&bars),
        );
    }
    frame.render_widget(chart, rows[1]);
}

fn render_map(frame: &mut Frame, area: Rect, state: &AppState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(30), Constraint::Min(10)])
        .split(area);

    let search = state.map_search();
    let mut lines = vec![Line::from(format!(
        "Busca: {}{}",
        state.map_query,
        if state.map_search_active { "_" } else { "" }
    ))];
    if search.fallback && !state.map_query.trim().is_empty() {
        lines.push(Line::from(Span::styled(
            "Nenhum jogador encontrado",
            Style::default().fg(Color::Red),
        )));
    }
    let visible = columns[0].height.saturating_sub(4) as usize;
    let (start, end) = visible_range(state.map_selected, search.players.len(), visible);
    for idx in start..end {
        let style = if idx == state.map_selected {
            Style::default().bg(Color::DarkGray).fg(Color::White)
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(truncate(&search.players[idx], 27), style)));
    }
    let list = Paragraph::new(lines).block(Block::default().title("Jogadores").borders(Borders::ALL));
    frame.render_widget(list, columns[0]);

    let player = state.map_player().unwrap_or_else(|| "-".to_string());
    let title = format!(
        "{} de {player} | {}",
        state.map_action.label(),
        state.map_kind.label()
    );
    let block = Block::default().title(title).borders(Borders::ALL);
    let inner = block.inner(columns[1]);
    frame.render_widget(block, columns[1]);

    let (w, h) = (inner.width as usize, inner.height as usize);
    if w == 0 || h == 0 {
        return;
    }
    let grid = match state.map_kind {
        MapKind::Locations => location_grid(&state.map_marks(), w, h),
        MapKind::Heatmap => match state.map_heatmap(HEATMAP_COLS, HEATMAP_ROWS) {
            Some(map) => heatmap_grid(&map, w, h),
            None => vec![vec![(' ', Color::Reset); w]; h],
        },
    };
    let lines: Vec<Line> = grid
        .into_iter()
        .map(|row| {
            Line::from(
                row.into_iter()
                    .map(|(ch, color)| Span::styled(ch.to_string(), Style::default().fg(color)))
                    .collect::<Vec<_>>(),
            )
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);
}

type Grid = Vec<Vec<(char, Color)>>;

fn pitch_grid(w: usize, h: usize) -> Grid {
    let mut grid = vec![vec![(' ', Color::Reset); w]; h];
    let half = w / 2;
    for row in grid.iter_mut() {
        row[half] = ('│', Color::DarkGray);
    }
    grid
}

fn to_cell(point: (f64, f64), w: usize, h: usize) -> Option<(usize, usize)> {
    let (x, y) = point;
    if !(0.0..=100.0).contains(&x) || !(0.0..=100.0).contains(&y) {
        return None;
    }
    let col = ((x / 100.0) * w as f64).floor() as usize;
    let row = (((100.0 - y) / 100.0) * h as f64).floor() as usize;
    Some((col.min(w - 1), row.min(h - 1)))
}

fn location_grid(marks: &[PitchMark], w: usize, h: usize) -> Grid {
    let mut grid = pitch_grid(w, h);
    for mark in marks {
        match mark {
            PitchMark::Arrow { from, to, successful } => {
                let color = if *successful { Color::Green } else { Color::Red };
                if let Some((c, r)) = to_cell(*from, w, h) {
                    grid[r][c] = ('·', color);
                }
                if let Some((c, r)) = to_cell(*to, w, h) {
                    grid[r][c] = ('►', color);
                }
            }
            PitchMark::Line { from, to } => {
                if let Some((c, r)) = to_cell(*from, w, h) {
                    grid[r][c] = ('-', Color::Blue);
                }
                if let Some((c, r)) = to_cell(*to, w, h) {
                    grid[r][c] = ('●', Color::Blue);
                }
            }
            PitchMark::Dot { at } => {
                if let Some((c, r)) = to_cell(*at, w, h) {
                    grid[r][c] = ('●', Color::Green);
                }
            }
        }
    }
    grid
}

fn heatmap_grid(map: &datafutebol::pitch::Heatmap, w: usize, h: usize) -> Grid {
    const SHADES: [char; 5] = [' ', '░', '▒', '▓', '█'];
    let mut grid = pitch_grid(w, h);
    let max = map.max();
    if max == 0 {
        return grid;
    }
    for (r, row) in grid.iter_mut().enumerate() {
        for (c, cell) in row.iter_mut().enumerate() {
            let bin_col = c * map.cols / w;
            let bin_row = (h - 1 - r) * map.rows / h;
            let count = map.count(bin_col, bin_row);
            if count == 0 {
                continue;
            }
            let level = (count as usize * (SHADES.len() - 1)).div_ceil(max as usize);
            let color = if level >= 3 { Color::Red } else { Color::Yellow };
            *cell = (SHADES[level.min(SHADES.len() - 1)], color);
        }
    }
    grid
}

fn render_empty(frame: &mut Frame, area: Rect, message: &str) {
    let empty = Paragraph::new(message.to_string()).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(empty, area);
}

fn format_value(value: Value) -> String {
    format!("{value:.2}")
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
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

fn console_text(state: &AppState) -> String {
    if state.logs.is_empty() {
        return "No messages yet".to_string();
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
        "Datafutebol - Help",
        "",
        "Global:",
        "  1-4 / Tab    Rankings, Teams, Compare, Map",
        "  j/k or ↑/↓   Move",
        "  r            Reload dataset",
        "  e            Export workbook (.xlsx)",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Rankings:",
        "  v            Passing / Attacking / Defending",
        "  g            Players / Teams",
        "  m            Total / Per game",
        "  t            Cycle team filter",
        "  + / -        Minimum games",
        "  s            Cycle sort column",
        "  Space        Add/remove player from comparison",
        "",
        "Compare:",
        "  p            Cycle metric preset",
        "  x            Remove highlighted player",
        "",
        "Map:",
        "  /            Search player",
        "  a            Cycle action",
        "  h            Locations / Heatmap",
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
