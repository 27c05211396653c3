use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use pair_screener::config::{Config, VOLUME_GAUGE_FULL};
use pair_screener::display::{
    category_label, displayed_label, format_change, format_funding, format_price, format_volume,
    gauge_ratio, header_label, is_up, trend_arrow,
};
use pair_screener::fetcher::HttpPairSource;
use pair_screener::screener::ViewState;
use pair_screener::tui_app::{AppState, InputMode, KeyOutcome};
use pair_screener::types::{CategoryKind, SortField};

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let cfg = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {e}");
            std::process::exit(1);
        }
    };

    // Logs go to a file; stderr would draw over the alternate screen.
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&cfg.log_file)?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&cfg.log_level))
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .init();

    let source = match HttpPairSource::new(&cfg) {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to build HTTP client: {e}");
            eprintln!("Failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };
    info!("TUI started, source {}", source.url());

    let mut app = AppState::new(cfg.criteria.clone(), source.url().to_string());

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();

    let result = run_loop(&mut terminal, &mut app, &source, &mut table_state).await;

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

async fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState,
    source: &HttpPairSource,
    table_state: &mut TableState,
) -> io::Result<()> {
    // Show the loading screen, then do the one read.
    terminal.draw(|f| render(f, app, table_state))?;
    app.screener.load(source).await;

    loop {
        app.clamp_selection();
        table_state.select(app.selected);
        terminal.draw(|f| render(f, app, table_state))?;

        if !event::poll(Duration::from_millis(250))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key.code) {
            KeyOutcome::Quit => return Ok(()),
            KeyOutcome::Reload => {
                app.screener.begin_load();
                terminal.draw(|f| render(f, app, table_state))?;
                app.screener.load(source).await;
            }
            KeyOutcome::Continue => {}
        }
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, app: &mut AppState, table_state: &mut TableState) {
    let area = f.area();

    // Outer vertical split: header | filters | body | footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // header
            Constraint::Length(3), // filters
            Constraint::Min(0),    // body
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, app, chunks[0]);
    render_filters(f, app, chunks[1]);
    render_body(f, app, table_state, chunks[2]);
    render_footer(f, app, chunks[3]);
}

fn render_header(f: &mut Frame, app: &mut AppState, area: Rect) {
    let (count_text, count_color) = match app.screener.view_state() {
        ViewState::Loading => ("◌ loading".to_string(), Color::Yellow),
        ViewState::Empty => (displayed_label(0), Color::Red),
        ViewState::Rows(n) => (displayed_label(n), Color::Green),
    };

    let title_spans = vec![
        Span::styled(
            " Crypto Screener  ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        Span::styled(count_text, Style::default().fg(count_color)),
        Span::raw("  │  "),
        Span::styled(app.source_url.clone(), Style::default().fg(Color::DarkGray)),
    ];

    let paragraph = Paragraph::new(Line::from(title_spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    f.render_widget(paragraph, area);
}

fn render_filters(f: &mut Frame, app: &AppState, area: Rect) {
    let c = app.screener.criteria();
    let editing = |mode_matches: bool| {
        if mode_matches {
            Style::default().fg(Color::Black).bg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        }
    };

    let (price_text, volume_text) = match &app.mode {
        InputMode::MinPrice(buf) => (format!("{buf}_"), bound_label(c.min_volume)),
        InputMode::MinVolume(buf) => (bound_label(c.min_price), format!("{buf}_")),
        _ => (bound_label(c.min_price), bound_label(c.min_volume)),
    };
    let search_text = if app.mode == InputMode::Search {
        format!("{}_", c.search_text)
    } else if c.search_text.is_empty() {
        "—".to_string()
    } else {
        c.search_text.clone()
    };

    let label = Style::default().fg(Color::DarkGray);
    let spans = vec![
        Span::styled(" search: ", label),
        Span::styled(search_text, editing(app.mode == InputMode::Search)),
        Span::styled("  category: ", label),
        Span::styled(c.category_filter.to_string(), Style::default().fg(Color::Cyan)),
        Span::styled("  change: ", label),
        Span::styled(c.change_filter.to_string(), Style::default().fg(Color::Cyan)),
        Span::styled("  min price: ", label),
        Span::styled(price_text, editing(matches!(app.mode, InputMode::MinPrice(_)))),
        Span::styled("  min volume: ", label),
        Span::styled(volume_text, editing(matches!(app.mode, InputMode::MinVolume(_)))),
    ];

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray))
            .title(Span::styled(" FILTERS ", Style::default().fg(Color::Cyan))),
    );
    f.render_widget(paragraph, area);
}

fn render_body(f: &mut Frame, app: &mut AppState, table_state: &mut TableState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " TRADING PAIRS ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let message = match app.screener.view_state() {
        ViewState::Loading => Some(("Loading...", Color::Yellow)),
        ViewState::Empty => Some(("No pairs found", Color::DarkGray)),
        ViewState::Rows(_) => None,
    };
    if let Some((text, color)) = message {
        let paragraph = Paragraph::new(Span::styled(text, Style::default().fg(color)))
            .alignment(Alignment::Center)
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    let criteria = app.screener.criteria().clone();
    let sortable = |title: &str, field: SortField| {
        header_label(title, field, criteria.sort_field, criteria.sort_direction)
    };
    let header_cells = [
        "Symbol".to_string(),
        "Category".to_string(),
        sortable("[1] Price", SortField::LastPrice),
        sortable("[2] 24h%", SortField::PriceChangePercent24h),
        sortable("[3] Volume $", SortField::Volume24h),
        sortable("[4] Funding", SortField::FundingRate),
    ]
    .into_iter()
    .map(|h| Cell::from(h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = app
        .screener
        .rows()
        .into_iter()
        .map(|p| {
            let change_style = match is_up(p.price_change_percent_24h()) {
                Some(true) => Style::default().fg(Color::Black).bg(Color::Green),
                Some(false) => Style::default().fg(Color::White).bg(Color::Red),
                None => Style::default().fg(Color::DarkGray),
            };
            let funding_color = match is_up(p.funding_rate()) {
                Some(true) => Color::LightGreen,
                Some(false) => Color::LightRed,
                None => Color::DarkGray,
            };
            let volume_bar = bar(gauge_ratio(p.volume_24h(), VOLUME_GAUGE_FULL), 8);

            Row::new(vec![
                Cell::from(p.symbol.clone())
                    .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD)),
                Cell::from(category_label(&p.category))
                    .style(Style::default().fg(Color::White).bg(category_color(p.category_kind()))),
                Cell::from(format_price(p)),
                Cell::from(format!("{} {}", trend_arrow(p), format_change(p))).style(change_style),
                Cell::from(format!("{:>18} {volume_bar}", format_volume(p))),
                Cell::from(format_funding(p)).style(Style::default().fg(funding_color)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Min(12),
            Constraint::Length(10),
            Constraint::Length(16),
            Constraint::Length(12),
            Constraint::Length(28),
            Constraint::Length(14),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD));

    f.render_stateful_widget(table, area, table_state);
}

fn render_footer(f: &mut Frame, app: &AppState, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let line = if let Some(notice) = &app.notice {
        Line::from(Span::styled(format!(" {notice}"), Style::default().fg(Color::Red)))
    } else if app.mode != InputMode::Normal {
        Line::from(vec![
            Span::styled(" [Enter] ", key),
            Span::raw("apply  "),
            Span::styled("[Esc] ", key),
            Span::raw("done  "),
            Span::styled("[Backspace] ", key),
            Span::raw("delete"),
        ])
    } else {
        Line::from(vec![
            Span::styled(" [q] ", key),
            Span::raw("quit  "),
            Span::styled("[/] ", key),
            Span::raw("search  "),
            Span::styled("[c] ", key),
            Span::raw("category  "),
            Span::styled("[v] ", key),
            Span::raw("change  "),
            Span::styled("[p/o] ", key),
            Span::raw("min price/volume  "),
            Span::styled("[1-4] ", key),
            Span::raw("sort  "),
            Span::styled("[x] ", key),
            Span::raw("reset  "),
            Span::styled("[R] ", key),
            Span::raw("reload  "),
            Span::styled("[↑↓ / j k] ", key),
            Span::raw("scroll"),
        ])
    };
    f.render_widget(Paragraph::new(line).style(Style::default().fg(Color::White)), area);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn category_color(kind: CategoryKind) -> Color {
    match kind {
        CategoryKind::Linear => Color::Blue,
        CategoryKind::Inverse => Color::Magenta,
        CategoryKind::Spot => Color::Green,
        CategoryKind::Other => Color::DarkGray,
    }
}

fn bound_label(bound: Option<f64>) -> String {
    bound.map_or("—".to_string(), |v| v.to_string())
}

fn bar(ratio: f64, width: usize) -> String {
    let filled = (ratio * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width.saturating_sub(filled)))
}
