mod format;

use std::io;
use std::time::{Duration, Instant};

use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame, Terminal,
};
use tokio::sync::mpsc;

use banner_audit::client::{
    spawn_accounts_poller, ApiClient, Dashboard, PollEvent, QueryPhase, ViewDisplay,
};
use banner_audit::config::{
    ACCOUNTS_POLL_INTERVAL_SECS, API_URL, CHANNEL_CAPACITY, PAGE_POLL_INTERVAL_SECS,
};
use banner_audit::types::{QuerySpec, ResultPage};
use format::{format_money, format_optional_money, format_percent, format_time_ms, truncate};

/// How long a key poll may block before pending responses are merged again.
const INPUT_POLL_MS: u64 = 100;

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> io::Result<()> {
    let base_url = std::env::var("API_URL").unwrap_or_else(|_| API_URL.to_string());

    let client = match ApiClient::new(base_url) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("failed to build HTTP client: {e}");
            std::process::exit(1);
        }
    };

    let (events_tx, mut events_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let mut dash = Dashboard::new(client.clone(), events_tx.clone(), QuerySpec::default());
    let accounts_task = spawn_accounts_poller(
        client,
        events_tx,
        Duration::from_secs(ACCOUNTS_POLL_INTERVAL_SECS),
    );

    // Initial fetch before rendering
    dash.refresh();

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut table_state = TableState::default();

    let result = run_loop(&mut terminal, &mut dash, &mut events_rx, &mut table_state);

    accounts_task.abort();

    // Restore terminal regardless of result
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

// ---------------------------------------------------------------------------
// Main event loop
// ---------------------------------------------------------------------------

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    dash: &mut Dashboard<ApiClient>,
    events_rx: &mut mpsc::Receiver<PollEvent>,
    table_state: &mut TableState,
) -> io::Result<()> {
    let refresh_interval = Duration::from_secs(PAGE_POLL_INTERVAL_SECS);
    let mut last_tick = Instant::now();

    loop {
        while let Ok(ev) = events_rx.try_recv() {
            if dash.handle(ev) == Some(QueryPhase::Applied) {
                clamp_selection(table_state, dash.view.page());
            }
        }

        terminal.draw(|f| render(f, dash, table_state))?;

        if event::poll(Duration::from_millis(INPUT_POLL_MS))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Char('q') | KeyCode::Char('Q') => return Ok(()),
                        KeyCode::Char('r') | KeyCode::Char('R') => {
                            dash.refresh();
                            last_tick = Instant::now();
                        }
                        KeyCode::Right | KeyCode::Char('l') => dash.next_page(),
                        KeyCode::Left | KeyCode::Char('h') => dash.prev_page(),
                        KeyCode::Char('s') => dash.cycle_sort_field(),
                        KeyCode::Char('o') => dash.toggle_sort_order(),
                        KeyCode::Char('a') => dash.cycle_account_filter(),
                        KeyCode::Down | KeyCode::Char('j') => {
                            let len = dash.view.page().map_or(0, |p| p.rows.len());
                            let max = len.saturating_sub(1);
                            let next = table_state.selected().map_or(0, |i| (i + 1).min(max));
                            table_state.select(Some(next));
                        }
                        KeyCode::Up | KeyCode::Char('k') => {
                            let prev = table_state
                                .selected()
                                .map_or(0, |i| i.saturating_sub(1));
                            table_state.select(Some(prev));
                        }
                        _ => {}
                    }
                }
            }
        }

        if last_tick.elapsed() >= refresh_interval {
            dash.refresh();
            last_tick = Instant::now();
        }
    }
}

fn clamp_selection(state: &mut TableState, page: Option<&ResultPage>) {
    let len = page.map_or(0, |p| p.rows.len());
    match state.selected() {
        Some(_) if len == 0 => state.select(None),
        Some(i) if i >= len => state.select(Some(len - 1)),
        _ => {}
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render(f: &mut Frame, dash: &Dashboard<ApiClient>, table_state: &mut TableState) {
    let area = f.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // status + summary
            Constraint::Length(1), // current query
            Constraint::Min(0),    // table
            Constraint::Length(1), // footer
        ])
        .split(area);

    render_header(f, dash, chunks[0]);
    render_query_line(f, dash, chunks[1]);
    render_body(f, dash, table_state, chunks[2]);
    render_footer(f, chunks[3]);
}

fn render_header(f: &mut Frame, dash: &Dashboard<ApiClient>, area: Rect) {
    let (status_text, status_color) = match (dash.view.phase(), dash.view.error()) {
        (QueryPhase::Idle, _) | (QueryPhase::Requesting, None) if dash.view.page().is_none() => {
            ("◌ connecting".to_string(), Color::Yellow)
        }
        (_, Some(e)) => (format!("✗ {}", truncate(e, 40)), Color::Red),
        (QueryPhase::Requesting, None) => ("● refreshing".to_string(), Color::Green),
        _ => ("● connected".to_string(), Color::Green),
    };

    let mut spans = vec![
        Span::styled(
            " Disabled Banners  ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(status_text, Style::default().fg(status_color)),
    ];

    if let Some(page) = dash.view.page() {
        let s = &page.summary;
        for text in [
            format!("{} banners", s.total_banners),
            format!("spend {}", format_money(s.total_spend)),
            format!("{} clicks", s.total_clicks),
            format!("{} shows", s.total_shows),
            format!("CTR {}", format_percent(Some(s.avg_ctr))),
            format!("{} conv", s.total_conversions),
        ] {
            spans.push(Span::raw("  │  "));
            spans.push(Span::styled(text, Style::default().fg(Color::White)));
        }
    }

    let paragraph = Paragraph::new(Line::from(spans)).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::DarkGray)),
    );

    f.render_widget(paragraph, area);
}

fn render_query_line(f: &mut Frame, dash: &Dashboard<ApiClient>, area: Rect) {
    let spec = dash.view.spec();
    let account = spec.effective_account().unwrap_or("all accounts");
    let pages = dash
        .view
        .page()
        .map_or("?".to_string(), |p| p.total_pages.to_string());

    let mut spans = vec![
        Span::styled(" account: ", Style::default().fg(Color::DarkGray)),
        Span::styled(truncate(account, 30), Style::default().fg(Color::Cyan)),
        Span::styled("  sort: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{} {}", spec.sort_field, spec.sort_order)),
        Span::styled("  page: ", Style::default().fg(Color::DarkGray)),
        Span::raw(format!("{}/{}", spec.page, pages)),
    ];
    if let Some(e) = &dash.accounts.error {
        spans.push(Span::styled(
            format!("  accounts: {}", truncate(e, 30)),
            Style::default().fg(Color::Red),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(f: &mut Frame, dash: &Dashboard<ApiClient>, state: &mut TableState, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(Span::styled(
            " DISABLED ",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ));

    let message = match dash.view.display() {
        ViewDisplay::Rows(page) => {
            render_table(f, page, state, block, area);
            return;
        }
        ViewDisplay::Loading => ("loading…".to_string(), Color::Yellow),
        ViewDisplay::Unavailable(e) => (format!("no data yet: {}", truncate(e, 60)), Color::Red),
        ViewDisplay::Empty(_) => ("no disabled banners match this filter".to_string(), Color::DarkGray),
        ViewDisplay::OutOfRange(p) => (
            format!("page is past the end ({} pages); press ← to go back", p.total_pages),
            Color::DarkGray,
        ),
    };

    let paragraph = Paragraph::new(Line::from(Span::styled(
        message.0,
        Style::default().fg(message.1),
    )))
    .centered()
    .block(block);
    f.render_widget(paragraph, area);
}

fn render_table(f: &mut Frame, page: &ResultPage, state: &mut TableState, block: Block, area: Rect) {
    let header_cells = [
        "Time", "Banner", "Account", "Spend", "Clicks", "Shows", "CTR", "Conv", "ROI", "Reason",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)));
    let header = Row::new(header_cells).height(1);

    let rows: Vec<Row> = page
        .rows
        .iter()
        .map(|r| {
            let banner = r
                .banner_name
                .as_deref()
                .map(|n| truncate(n, 24))
                .unwrap_or_else(|| r.banner_id.to_string());
            let account = r.account_name.as_deref().map_or("—".to_string(), |a| truncate(a, 16));
            let roi_color = match r.roi {
                Some(v) if v >= 0.0 => Color::Green,
                Some(_) => Color::Red,
                None => Color::DarkGray,
            };

            Row::new(vec![
                Cell::from(format_time_ms(r.created_at)).style(Style::default().fg(Color::DarkGray)),
                Cell::from(banner),
                Cell::from(account).style(Style::default().fg(Color::Cyan)),
                Cell::from(format_optional_money(r.spend)),
                Cell::from(r.clicks.to_string()),
                Cell::from(r.shows.to_string()),
                Cell::from(format_percent(r.ctr)),
                Cell::from(r.conversions.to_string()),
                Cell::from(format_percent(r.roi)).style(Style::default().fg(roi_color)),
                Cell::from(r.reason.as_deref().map_or("—".to_string(), |s| truncate(s, 30)))
                    .style(Style::default().fg(Color::DarkGray)),
            ])
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(8),
            Constraint::Min(12),
            Constraint::Length(16),
            Constraint::Length(10),
            Constraint::Length(7),
            Constraint::Length(8),
            Constraint::Length(7),
            Constraint::Length(5),
            Constraint::Length(8),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(block)
    .row_highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    f.render_stateful_widget(table, area, state);
}

fn render_footer(f: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled(" [q] ", Style::default().fg(Color::Yellow)),
        Span::raw("quit  "),
        Span::styled("[r] ", Style::default().fg(Color::Yellow)),
        Span::raw("refresh  "),
        Span::styled("[←→] ", Style::default().fg(Color::Yellow)),
        Span::raw("page  "),
        Span::styled("[s/o] ", Style::default().fg(Color::Yellow)),
        Span::raw("sort field/order  "),
        Span::styled("[a] ", Style::default().fg(Color::Yellow)),
        Span::raw("account  "),
        Span::styled(
            format!("auto-refresh: {PAGE_POLL_INTERVAL_SECS}s"),
            Style::default().fg(Color::DarkGray),
        ),
    ]);
    let paragraph = Paragraph::new(line).style(Style::default().fg(Color::White));
    f.render_widget(paragraph, area);
}
