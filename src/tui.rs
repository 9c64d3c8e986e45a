use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::api::JobSource;
use crate::app::{AppState, DetailsTicket, Focus, SearchPhase, SearchTicket};
use crate::browser;
use crate::flows::{FlowEvent, FlowRunner};
use crate::markup;
use crate::models::SearchQuery;

const TICK: Duration = Duration::from_millis(100);

/// What a key press asks the loop to do beyond mutating state.
#[derive(Debug, PartialEq)]
pub enum Command {
    None,
    Quit,
    Search(SearchTicket),
    Details(DetailsTicket),
    Open(String),
}

pub fn run_browse(
    handle: Handle,
    source: Arc<dyn JobSource>,
    prefill: Option<SearchQuery>,
) -> Result<()> {
    let (runner, mut events) = FlowRunner::new(handle, source);
    let mut state = match prefill {
        Some(query) => {
            let mut state = AppState::with_query(query);
            if let Ok(ticket) = state.submit_search() {
                runner.search(ticket);
            }
            state
        }
        None => AppState::new(),
    };

    let _guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;
    run_loop(&mut terminal, &mut state, &runner, &mut events)
}

/// Raw mode and the alternate screen, undone on drop whichever way
/// `run_browse` exits.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> Result<Self> {
        enable_raw_mode().context("Failed to enable raw mode")?;
        let guard = TerminalGuard;
        stdout()
            .execute(EnterAlternateScreen)
            .context("Failed to enter alternate screen")?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Err(err) = disable_raw_mode() {
            tracing::warn!(%err, "failed to disable raw mode");
        }
        if let Err(err) = stdout().execute(LeaveAlternateScreen) {
            tracing::warn!(%err, "failed to leave alternate screen");
        }
    }
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    runner: &FlowRunner,
    events: &mut UnboundedReceiver<FlowEvent>,
) -> Result<()> {
    let mut list_state = ListState::default();

    loop {
        list_state.select((!state.jobs.is_empty()).then_some(state.cursor));
        terminal.draw(|frame| draw(frame, state, &mut list_state))?;

        if event::poll(TICK)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match handle_key(state, key) {
                        Command::Quit => break,
                        Command::Search(ticket) => runner.search(ticket),
                        Command::Details(ticket) => runner.details(ticket),
                        Command::Open(url) => {
                            if let Err(err) = browser::open_url(&url) {
                                state.error = Some(format!("{:#}", err));
                            }
                        }
                        Command::None => {}
                    }
                }
            }
        }

        while let Ok(event) = events.try_recv() {
            state.apply(event);
        }
    }
    Ok(())
}

pub fn handle_key(state: &mut AppState, key: KeyEvent) -> Command {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Command::Quit;
    }
    match key.code {
        KeyCode::Esc => return Command::Quit,
        KeyCode::Tab => {
            state.focus_next();
            return Command::None;
        }
        KeyCode::BackTab => {
            state.focus_prev();
            return Command::None;
        }
        _ => {}
    }

    match state.focus {
        Focus::Keywords | Focus::Location => match key.code {
            // the search button is disabled while a search is running
            KeyCode::Enter if state.loading => Command::None,
            KeyCode::Enter => match state.submit_search() {
                Ok(ticket) => Command::Search(ticket),
                Err(_) => Command::None,
            },
            KeyCode::Backspace => {
                state.backspace();
                Command::None
            }
            KeyCode::Down => {
                state.focus = Focus::Results;
                Command::None
            }
            KeyCode::Char(c) => {
                state.push_char(c);
                Command::None
            }
            _ => Command::None,
        },
        Focus::Results => match key.code {
            KeyCode::Char('q') => Command::Quit,
            KeyCode::Down | KeyCode::Char('j') => {
                state.cursor_next();
                Command::None
            }
            KeyCode::Up | KeyCode::Char('k') => {
                state.cursor_prev();
                Command::None
            }
            KeyCode::Char('J') | KeyCode::PageDown => {
                state.scroll_down();
                Command::None
            }
            KeyCode::Char('K') | KeyCode::PageUp => {
                state.scroll_up();
                Command::None
            }
            KeyCode::Enter => match state.select_at_cursor() {
                Some(ticket) => Command::Details(ticket),
                None => Command::None,
            },
            KeyCode::Char('o') => match state.apply_url() {
                Some(url) => Command::Open(url.to_string()),
                None => Command::None,
            },
            KeyCode::Char('/') => {
                state.focus = Focus::Keywords;
                Command::None
            }
            _ => Command::None,
        },
    }
}

fn draw(frame: &mut Frame, state: &AppState, list_state: &mut ListState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(frame.area());

    draw_form(frame, state, rows[0]);

    if let Some(error) = &state.error {
        let error_line = Paragraph::new(error.as_str())
            .style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD))
            .alignment(Alignment::Center);
        frame.render_widget(error_line, rows[1]);
    }

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(rows[2]);

    // Left panel: results
    let title = match state.last_search {
        Some(at) if !state.loading => {
            format!(" Jobs ({}) · {} ", state.jobs.len(), at.format("%H:%M:%S"))
        }
        _ => format!(" Jobs ({}) ", state.jobs.len()),
    };
    let list = List::new(results_items(state))
        .block(focus_block(title, state.focus == Focus::Results))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");
    frame.render_stateful_widget(list, panels[0], list_state);

    // Right panel: details
    let detail_widget = Paragraph::new(build_detail(state))
        .block(Block::default().borders(Borders::ALL).title(" Details "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));
    frame.render_widget(detail_widget, panels[1]);

    let help = Paragraph::new(
        " Tab:focus  Enter:search/select  j/k:navigate  J/K:scroll  o:open posting  /:edit search  Esc:quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, rows[3]);
}

fn draw_form(frame: &mut Frame, state: &AppState, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(40),
            Constraint::Percentage(20),
        ])
        .split(area);

    let keywords = Paragraph::new(state.keywords.as_str()).block(focus_block(
        " Keywords (e.g. Data Analyst) ".to_string(),
        state.focus == Focus::Keywords,
    ));
    frame.render_widget(keywords, columns[0]);

    let location = Paragraph::new(state.location.as_str()).block(focus_block(
        " Location (e.g. Mumbai) ".to_string(),
        state.focus == Focus::Location,
    ));
    frame.render_widget(location, columns[1]);

    let (label, style) = match state.phase {
        SearchPhase::Loading => ("Searching...", Style::default().fg(Color::DarkGray)),
        _ => ("Search", Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
    };
    let button = Paragraph::new(label)
        .style(style)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(button, columns[2]);
}

fn focus_block(title: String, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(title)
}

/// One row per job, or a single placeholder row when there is nothing to list.
pub fn results_items(state: &AppState) -> Vec<ListItem<'static>> {
    if state.jobs.is_empty() {
        let placeholder = if state.show_empty_message() {
            "No jobs found. Try searching above."
        } else {
            "Searching..."
        };
        return vec![ListItem::new(Span::styled(
            placeholder,
            Style::default().fg(Color::DarkGray),
        ))];
    }

    state
        .jobs
        .iter()
        .enumerate()
        .map(|(index, job)| {
            let marker = if state.selected == Some(index) { "●" } else { " " };
            let title = if job.title.is_empty() { "(untitled)" } else { job.title.as_str() };
            let mut subtitle = job.company.clone();
            if !job.location.is_empty() {
                if !subtitle.is_empty() {
                    subtitle.push_str(" · ");
                }
                subtitle.push_str(&job.location);
            }
            ListItem::new(vec![
                Line::from(vec![
                    Span::raw(format!("{} ", marker)),
                    Span::styled(truncate(title, 40), Style::default().add_modifier(Modifier::BOLD)),
                ]),
                Line::from(Span::styled(
                    format!("  {}", truncate(&subtitle, 40)),
                    Style::default().fg(Color::Gray),
                )),
            ])
        })
        .collect()
}

pub fn build_detail(state: &AppState) -> Text<'static> {
    let Some(job) = state.selected_job() else {
        return Text::from(Line::from(Span::styled(
            "Select a job to see details.",
            Style::default().fg(Color::DarkGray),
        )));
    };

    let mut lines: Vec<Line> = Vec::new();
    let bold = Style::default().add_modifier(Modifier::BOLD);

    let Some(details) = &state.job_details else {
        // Summary only: the lookup is in flight, failed, or impossible
        lines.push(Line::from(Span::styled(job.title.clone(), bold)));
        lines.push(Line::from(format!("Company: {}", job.company)));
        lines.push(Line::from(format!("Location: {}", job.location)));
        lines.push(Line::from(""));
        if state.details_loading {
            lines.push(Line::from(Span::styled(
                "Loading details...",
                Style::default().fg(Color::Yellow),
            )));
        } else {
            lines.push(Line::from(Span::styled(
                "(No description available)",
                Style::default().fg(Color::DarkGray),
            )));
        }
        if let Some(url) = state.apply_url() {
            lines.push(Line::from(""));
            lines.push(apply_line(url));
        }
        return Text::from(lines);
    };

    lines.push(Line::from(Span::styled(details.title.clone(), bold)));
    lines.push(Line::from(format!("Company: {}", details.company)));
    lines.push(Line::from(format!("Location: {}", details.location)));
    if let Some(salary) = details.salary.display() {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if let Some(contract) = &details.contract_type {
        lines.push(Line::from(format!("Contract: {}", contract)));
    }
    if let Some(job_type) = &details.job_type {
        lines.push(Line::from(format!("Type: {}", job_type)));
    }
    lines.push(Line::from(""));

    if let Some(description) = &details.description {
        lines.push(Line::from(Span::styled("Description", bold)));
        for line in markup::plain_text(description).lines() {
            lines.push(Line::from(line.to_string()));
        }
        lines.push(Line::from(""));
    }

    if let Some(url) = details.apply_url() {
        lines.push(apply_line(url));
    }

    Text::from(lines)
}

fn apply_line(url: &str) -> Line<'static> {
    Line::from(vec![
        Span::raw("Apply: "),
        Span::styled(
            url.to_string(),
            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
        ),
        Span::styled("  (o to open)", Style::default().fg(Color::DarkGray)),
    ])
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
