use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Utc;
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use frc_scorigami::config::ClientConfig;
use frc_scorigami::countdown::{countdown_label, minutes_until_refresh_at};
use frc_scorigami::leaderboard::format_time;
use frc_scorigami::matrix::Cell;
use frc_scorigami::provider::spawn_provider;
use frc_scorigami::scores::{AllianceColor, ScoreRecord, Year, roster_label};
use frc_scorigami::state::{
    AppState, FetchStatus, Loaded, ProviderCommand, RequestToken, Screen, apply_delta,
};

/// Terminal columns per matrix cell.
const CELL_WIDTH: u16 = 2;
const ROW_LABEL_WIDTH: u16 = 5;

struct App {
    state: AppState,
    should_quit: bool,
    cmd_tx: Option<mpsc::Sender<ProviderCommand>>,
    countdown_minutes: u32,
    last_countdown: Instant,
}

impl App {
    fn new(year: Year, cmd_tx: Option<mpsc::Sender<ProviderCommand>>) -> Self {
        Self {
            state: AppState::new(year),
            should_quit: false,
            cmd_tx,
            countdown_minutes: minutes_until_refresh_at(&Utc::now()),
            last_countdown: Instant::now(),
        }
    }

    fn on_key(&mut self, key: KeyEvent) {
        if self.state.picker.open {
            self.on_picker_key(key);
            return;
        }
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char('1') => self.state.set_screen(Screen::Matrix),
            KeyCode::Char('2') => self.state.set_screen(Screen::MostRecent),
            KeyCode::Char('3') => self.state.set_screen(Screen::MostCommon),
            KeyCode::Char('[') | KeyCode::Char(',') => {
                let year = self.state.view.year.prev();
                self.change_year(year);
            }
            KeyCode::Char(']') | KeyCode::Char('.') => {
                let year = self.state.view.year.next();
                self.change_year(year);
            }
            KeyCode::Char('y') => self.state.open_picker(),
            KeyCode::Char('h') | KeyCode::Char('H') => self.state.toggle_heatmap(),
            KeyCode::Char('r') | KeyCode::Char('R') => {
                let token = self.state.refresh();
                self.request_fetch(token);
            }
            KeyCode::Char('j') | KeyCode::Down => match self.state.view.screen {
                Screen::Matrix => self.state.move_cursor(1, 0),
                _ => self.state.scroll_down(),
            },
            KeyCode::Char('k') | KeyCode::Up => match self.state.view.screen {
                Screen::Matrix => self.state.move_cursor(-1, 0),
                _ => self.state.scroll_up(),
            },
            KeyCode::Left => self.state.move_cursor(0, -1),
            KeyCode::Right => self.state.move_cursor(0, 1),
            KeyCode::PageDown => self.state.move_cursor(10, 0),
            KeyCode::PageUp => self.state.move_cursor(-10, 0),
            KeyCode::Char('?') => self.state.help_overlay = !self.state.help_overlay,
            KeyCode::Esc => self.state.help_overlay = false,
            _ => {}
        }
    }

    fn on_picker_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.state.close_picker(),
            KeyCode::Char('j') | KeyCode::Down => self.state.picker_next(),
            KeyCode::Char('k') | KeyCode::Up => self.state.picker_prev(),
            KeyCode::Enter => {
                let year = self.state.picker_year();
                self.state.close_picker();
                if let Some(year) = year {
                    self.change_year(year);
                }
            }
            _ => {}
        }
    }

    fn change_year(&mut self, year: Year) {
        if year == self.state.view.year && self.state.status != FetchStatus::Idle {
            return;
        }
        match self.state.select_year(year) {
            Some(token) => self.request_fetch(token),
            None => self.state.push_log(format!("[INFO] {year} served from memory")),
        }
    }

    fn request_fetch(&mut self, token: RequestToken) {
        let Some(tx) = &self.cmd_tx else {
            self.state.push_log("[INFO] Score fetch unavailable");
            return;
        };
        if tx.send(ProviderCommand::FetchYear { token }).is_err() {
            self.state.push_log("[WARN] Score request failed");
        }
    }

    fn tick_countdown(&mut self) {
        if self.last_countdown.elapsed() >= Duration::from_secs(1) {
            self.countdown_minutes = minutes_until_refresh_at(&Utc::now());
            self.last_countdown = Instant::now();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
    let config = ClientConfig::from_env();

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = ratatui::backend::CrosstermBackend::new(stdout);
    let mut terminal = ratatui::Terminal::new(backend)?;

    let (tx, rx) = mpsc::channel();
    let (cmd_tx, cmd_rx) = mpsc::channel();
    let initial_year = config.initial_year;
    let provider = spawn_provider(config, tx, cmd_rx);

    let mut app = App::new(initial_year, Some(cmd_tx));
    app.change_year(initial_year);
    let res = run_app(&mut terminal, &mut app, rx);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    // Closing the command channel stops the provider once its current fetch returns.
    drop(app);
    drop(provider);

    if let Err(err) = res {
        eprintln!("error: {err}");
    }
    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    rx: mpsc::Receiver<frc_scorigami::state::Delta>,
) -> io::Result<()> {
    let tick_rate = Duration::from_millis(250);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(delta) = rx.try_recv() {
            apply_delta(&mut app.state, delta);
        }

        app.tick_countdown();

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
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
            Constraint::Length(1),
        ])
        .split(frame.size());

    let header = Paragraph::new(header_text(app))
        .block(Block::default().borders(Borders::BOTTOM));
    frame.render_widget(header, chunks[0]);

    render_body(frame, chunks[1], &app.state);

    let console = Paragraph::new(console_text(&app.state))
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().title("Console").borders(Borders::TOP));
    frame.render_widget(console, chunks[2]);

    let footer = Paragraph::new(footer_text(&app.state));
    frame.render_widget(footer, chunks[3]);

    if app.state.picker.open {
        render_year_picker(frame, frame.size(), &app.state);
    }
    if app.state.help_overlay {
        render_help_overlay(frame, frame.size());
    }
}

fn header_text(app: &App) -> String {
    let state = &app.state;
    let mut title = format!(
        "FRC SCORIGAMI | {} | {} | Heatmap: {}",
        state.view.year,
        screen_label(state.view.screen),
        if state.view.heatmap { "on" } else { "off" }
    );
    if state.is_loading() {
        title.push_str(" | Loading...");
    }
    let updated = state
        .loaded
        .as_ref()
        .and_then(|l| l.dataset.last_updated())
        .map(|s| format!("Updated: {s}"))
        .unwrap_or_else(|| "Updated: -".to_string());
    let summary = match &state.loaded {
        Some(loaded) => format!(
            "{} score pairs | {} matches | {} one-offs",
            loaded.matrix.distinct_pairs(),
            loaded.matrix.total_matches,
            loaded.matrix.single_occurrences
        ),
        None => String::new(),
    };
    let line2 = format!("{updated} | {}", countdown_label(app.countdown_minutes));
    format!("{title}\n{line2}\n{summary}")
}

fn footer_text(state: &AppState) -> String {
    if state.picker.open {
        return "j/k/↑/↓ Move | Enter Select | Esc Cancel".to_string();
    }
    match state.view.screen {
        Screen::Matrix => {
            "1/2/3 Screen | [/] Year | y Pick year | ←/→/↑/↓ Cursor | h Heatmap | r Refresh | ? Help | q Quit".to_string()
        }
        Screen::MostRecent | Screen::MostCommon => {
            "1/2/3 Screen | [/] Year | y Pick year | j/k/↑/↓ Scroll | r Refresh | ? Help | q Quit".to_string()
        }
    }
}

fn render_body(frame: &mut Frame, area: Rect, state: &AppState) {
    match (&state.status, &state.loaded) {
        (_, Some(loaded)) => match state.view.screen {
            Screen::Matrix => render_matrix(frame, area, state, loaded),
            Screen::MostRecent => render_board(frame, area, state, &loaded.recent_rows(), true),
            Screen::MostCommon => render_board(frame, area, state, &loaded.common_rows(), false),
        },
        (FetchStatus::Failed(msg), None) => {
            let err = Paragraph::new(msg.as_str()).style(Style::default().fg(Color::Red));
            frame.render_widget(err, area);
        }
        (FetchStatus::Loading, None) | (FetchStatus::Idle, None) | (FetchStatus::Ready, None) => {
            let loading = Paragraph::new("Loading...").style(Style::default().fg(Color::DarkGray));
            frame.render_widget(loading, area);
        }
    }
}

fn render_matrix(frame: &mut Frame, area: Rect, state: &AppState, loaded: &Loaded) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(2), Constraint::Length(3)])
        .split(area);

    let grid_area = sections[0];
    if grid_area.height < 2 || grid_area.width <= ROW_LABEL_WIDTH + CELL_WIDTH {
        let empty = Paragraph::new("Matrix needs more room")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, grid_area);
        return;
    }

    let matrix = &loaded.matrix;
    let mode = state.view.cell_mode();
    let total = matrix.max_winning as usize + 1;
    let visible_rows = (grid_area.height - 1) as usize;
    let visible_cols = ((grid_area.width - ROW_LABEL_WIDTH) / CELL_WIDTH) as usize;
    let (row_start, row_end) = visible_range(state.cursor.row as usize, total, visible_rows);
    let (col_start, col_end) = visible_range(state.cursor.col as usize, total, visible_cols);

    let mut lines = Vec::with_capacity(visible_rows + 1);
    lines.push(column_ruler(col_start, col_end));

    let rows = matrix.rows();
    for &a in &rows[row_start..row_end] {
        let populated = matrix.populated_columns(a);
        let mut spans = Vec::with_capacity(col_end - col_start + 1);
        spans.push(Span::styled(
            format!("{:>4} ", a),
            Style::default().fg(Color::DarkGray),
        ));
        for b in col_start as u32..col_end as u32 {
            let cell = if populated.last().is_some_and(|&last| b <= last) {
                matrix.cell(&loaded.dataset, a, b, mode)
            } else if b > a {
                Cell::Placeholder
            } else {
                Cell::Empty
            };
            let mut style = cell_style(cell);
            if state.cursor.row == a && state.cursor.col == b {
                style = style.add_modifier(Modifier::REVERSED);
            }
            spans.push(Span::styled(cell_glyph(cell), style));
        }
        lines.push(Line::from(spans));
    }
    frame.render_widget(Paragraph::new(lines), grid_area);

    let detail = Paragraph::new(cell_detail_lines(state))
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(detail, sections[1]);
}

fn column_ruler(start: usize, end: usize) -> Line<'static> {
    let mut ruler = " ".repeat(ROW_LABEL_WIDTH as usize);
    let mut col = start;
    while col < end {
        if col % 10 == 0 {
            let label = format!("{:<width$}", col, width = (CELL_WIDTH as usize) * 5);
            ruler.push_str(&label);
            col += 5;
        } else {
            ruler.push_str(&" ".repeat(CELL_WIDTH as usize));
            col += 1;
        }
    }
    Line::styled(ruler, Style::default().fg(Color::DarkGray))
}

fn cell_glyph(cell: Cell) -> &'static str {
    match cell {
        Cell::Placeholder => "  ",
        Cell::Empty => "· ",
        Cell::Occurred { .. } | Cell::Heat { .. } => "██",
    }
}

fn cell_style(cell: Cell) -> Style {
    match cell {
        Cell::Placeholder => Style::default(),
        Cell::Empty => Style::default().fg(Color::DarkGray),
        Cell::Occurred { .. } => Style::default().fg(Color::Green),
        Cell::Heat { bucket, .. } => Style::default().fg(heat_color(bucket)),
    }
}

fn heat_color(bucket: u8) -> Color {
    const RAMP: [u8; 10] = [230, 229, 228, 221, 214, 208, 202, 196, 160, 124];
    let idx = (bucket.clamp(1, 10) - 1) as usize;
    Color::Indexed(RAMP[idx])
}

fn cell_detail_lines(state: &AppState) -> Vec<Line<'static>> {
    let a = state.cursor.row;
    let b = state.cursor.col;
    match state.selected_record() {
        Some(record) => {
            let bucket = match state.selected_cell() {
                Some(Cell::Heat { bucket, .. }) => format!(" | heat {bucket}/10"),
                _ => String::new(),
            };
            vec![
                Line::from(format!(
                    "{} | {} match{}{} | first {} on {}",
                    record.score_label(),
                    record.count,
                    if record.count == 1 { "" } else { "es" },
                    bucket,
                    record.first.key,
                    format_time(record.first.actual_time)
                )),
                Line::from(roster_spans(record)),
            ]
        }
        None => vec![Line::styled(
            format!("{a} - {b} | Scorigami: never happened"),
            Style::default().fg(Color::DarkGray),
        )],
    }
}

fn roster_spans(record: &ScoreRecord) -> Vec<Span<'static>> {
    let first = &record.first;
    vec![
        Span::styled(
            roster_label(&first.winning_alliance),
            alliance_style(first.winning_color),
        ),
        Span::raw(" def. "),
        Span::styled(
            roster_label(&first.losing_alliance),
            alliance_style(first.losing_color()),
        ),
        Span::raw(" | "),
        Span::styled(
            first.match_url(),
            Style::default().add_modifier(Modifier::UNDERLINED),
        ),
    ]
}

fn alliance_style(color: AllianceColor) -> Style {
    match color {
        AllianceColor::Red => Style::default().fg(Color::Red),
        AllianceColor::Blue => Style::default().fg(Color::Blue),
    }
}

fn board_columns() -> [Constraint; 6] {
    [
        Constraint::Length(7),
        Constraint::Length(11),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(22),
        Constraint::Min(20),
    ]
}

fn render_board(
    frame: &mut Frame,
    area: Rect,
    state: &AppState,
    rows: &[&ScoreRecord],
    show_time: bool,
) {
    let sections = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let widths = board_columns();
    render_board_header(frame, sections[0], &widths, show_time);

    let list_area = sections[1];
    if rows.is_empty() {
        let empty = Paragraph::new("No scores for this year")
            .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(empty, list_area);
        return;
    }
    if list_area.height == 0 {
        return;
    }

    let visible = list_area.height as usize;
    let total = rows.len();
    let max_start = total.saturating_sub(visible);
    let start = state.table_scroll.min(max_start);
    let end = (start + visible).min(total);

    for (i, idx) in (start..end).enumerate() {
        let row_area = Rect {
            x: list_area.x,
            y: list_area.y + i as u16,
            width: list_area.width,
            height: 1,
        };
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(widths)
            .split(row_area);

        let record = rows[idx];
        let first = &record.first;
        let when = if show_time {
            format_time(first.actual_time)
        } else {
            first.key.clone()
        };

        render_cell_text(frame, cols[0], &record.count.to_string(), Style::default());
        render_cell_text(frame, cols[1], &record.score_label(), Style::default());
        render_cell_text(
            frame,
            cols[2],
            &roster_label(&first.winning_alliance),
            alliance_style(first.winning_color),
        );
        render_cell_text(
            frame,
            cols[3],
            &roster_label(&first.losing_alliance),
            alliance_style(first.losing_color()),
        );
        render_cell_text(frame, cols[4], &when, Style::default());
        render_cell_text(frame, cols[5], &first.match_url(), Style::default().fg(Color::Cyan));
    }
}

fn render_board_header(frame: &mut Frame, area: Rect, widths: &[Constraint], show_time: bool) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths)
        .split(area);
    let style = Style::default().add_modifier(Modifier::BOLD);

    render_cell_text(frame, cols[0], "Count", style);
    render_cell_text(frame, cols[1], "Score", style);
    render_cell_text(frame, cols[2], "Winners", style);
    render_cell_text(frame, cols[3], "Losers", style);
    render_cell_text(frame, cols[4], if show_time { "First played" } else { "First match" }, style);
    render_cell_text(frame, cols[5], "Link", style);
}

fn render_cell_text(frame: &mut Frame, area: Rect, text: &str, style: Style) {
    let text_area = Rect {
        x: area.x,
        y: area.y + (area.height / 2),
        width: area.width,
        height: 1,
    };
    let paragraph = Paragraph::new(text.to_string()).style(style);
    frame.render_widget(paragraph, text_area);
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

fn screen_label(screen: Screen) -> &'static str {
    match screen {
        Screen::Matrix => "MATRIX",
        Screen::MostRecent => "MOST RECENT",
        Screen::MostCommon => "MOST COMMON",
    }
}

fn render_year_picker(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup_area = centered_rect(30, 60, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default().title("Year").borders(Borders::ALL);
    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let years: Vec<Year> = Year::all().rev().collect();
    let (start, end) = visible_range(state.picker.selected, years.len(), inner.height as usize);
    let lines = (start..end)
        .map(|idx| {
            let year = years[idx];
            let prefix = if idx == state.picker.selected { "> " } else { "  " };
            let marker = if year == state.view.year { " *" } else { "" };
            let style = if idx == state.picker.selected {
                Style::default().fg(Color::White).bg(Color::DarkGray)
            } else {
                Style::default()
            };
            Line::styled(format!("{prefix}{year}{marker}"), style)
        })
        .collect::<Vec<_>>();
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 60, area);
    frame.render_widget(Clear, popup_area);

    let text = [
        "FRC Scorigami - Help",
        "",
        "Global:",
        "  1 / 2 / 3    Matrix / Most recent / Most common",
        "  [ / ]        Previous / next year",
        "  y            Pick year",
        "  r            Refetch this year",
        "  ?            Toggle help",
        "  q            Quit",
        "",
        "Matrix:",
        "  ←/→/↑/↓      Move cursor",
        "  PgUp/PgDn    Jump 10 rows",
        "  h            Toggle heatmap",
        "",
        "Tables:",
        "  j/k or ↑/↓   Scroll",
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
