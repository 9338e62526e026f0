use std::io;
use std::time::{Duration, Instant};

use anyhow::Context;
use crossterm::event::{self, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use tracing::{debug, info};

use crate::api::{CreateOutcome, TaskApi};
use crate::config::Config;
use crate::render::MessageKind;
use crate::task::Status;
use crate::view::{
    MSG_ADD_FAILED, MSG_STATUS_UPDATED, MSG_TASK_ADDED, MSG_TASK_DELETED, StatusLine, TaskForm,
};

const TICK: Duration = Duration::from_millis(200);
const FORM_FIELDS: [&str; 4] = ["Title", "Description", "Priority", "Due date"];

struct BoardState {
    tasks: Vec<crate::task::Task>,
    insights: String,
    selected: usize,
    status: StatusLine,
    form: TaskForm,
    editing: Option<usize>,
    color: bool,
}

/// Interactive session: the task table, the insights line, a transient
/// status line and an add form, all kept in sync by re-fetching the full
/// list after every mutation. Network calls block the event loop; the
/// triggering keypress simply waits for its response.
pub fn run<A: TaskApi>(api: &A, cfg: &Config) -> anyhow::Result<()> {
    let color = cfg.get_bool("color").unwrap_or(true);

    enable_raw_mode().context("failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_session(&mut terminal, api, color);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn run_session<B: Backend, A: TaskApi>(
    terminal: &mut Terminal<B>,
    api: &A,
    color: bool,
) -> anyhow::Result<()> {
    let mut state = BoardState {
        tasks: vec![],
        insights: String::new(),
        selected: 0,
        status: StatusLine::new(),
        form: TaskForm::default(),
        editing: None,
        color,
    };

    reload(api, &mut state)?;
    info!(count = state.tasks.len(), "board session started");

    loop {
        terminal.draw(|f| draw(f, &state))?;

        if !event::poll(TICK)? {
            state.status.poll(Instant::now());
            continue;
        }

        let Event::Key(key) = event::read()? else {
            continue;
        };
        let now = Instant::now();

        if let Some(field) = state.editing {
            match key.code {
                KeyCode::Esc => state.editing = None,
                KeyCode::Tab | KeyCode::Down => {
                    state.editing = Some((field + 1) % FORM_FIELDS.len());
                }
                KeyCode::BackTab | KeyCode::Up => {
                    state.editing =
                        Some((field + FORM_FIELDS.len() - 1) % FORM_FIELDS.len());
                }
                KeyCode::Backspace => {
                    field_mut(&mut state.form, field).pop();
                }
                KeyCode::Enter => submit_form(api, &mut state, now)?,
                KeyCode::Char(c) => field_mut(&mut state.form, field).push(c),
                _ => {}
            }
        } else {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Char('a') => state.editing = Some(0),
                KeyCode::Char('r') => reload(api, &mut state)?,
                KeyCode::Up => state.selected = state.selected.saturating_sub(1),
                KeyCode::Down => {
                    if state.selected + 1 < state.tasks.len() {
                        state.selected += 1;
                    }
                }
                KeyCode::Char(' ') | KeyCode::Enter => toggle_selected(api, &mut state, now)?,
                KeyCode::Char('d') => delete_selected(api, &mut state, now)?,
                _ => {}
            }
        }

        state.status.poll(Instant::now());
    }
}

fn reload<A: TaskApi>(api: &A, state: &mut BoardState) -> anyhow::Result<()> {
    state.tasks = api.list_tasks()?;
    state.insights = api.insights()?.summary;

    if state.selected >= state.tasks.len() {
        state.selected = state.tasks.len().saturating_sub(1);
    }

    debug!(count = state.tasks.len(), "board reloaded");
    Ok(())
}

fn submit_form<A: TaskApi>(api: &A, state: &mut BoardState, now: Instant) -> anyhow::Result<()> {
    let new = match state.form.validate() {
        Ok(new) => new,
        Err(msg) => {
            state.status.set(msg, MessageKind::Error, now);
            return Ok(());
        }
    };

    match api.create_task(&new)? {
        CreateOutcome::Created(task) => {
            info!(id = task.id, "task created from board");
            state.status.set(MSG_TASK_ADDED, MessageKind::Success, now);
            state.form.clear_after_submit();
            state.editing = None;
            reload(api, state)
        }
        CreateOutcome::Rejected(_) => {
            // Form stays open, fields untouched.
            state.status.set(MSG_ADD_FAILED, MessageKind::Error, now);
            Ok(())
        }
    }
}

fn toggle_selected<A: TaskApi>(
    api: &A,
    state: &mut BoardState,
    now: Instant,
) -> anyhow::Result<()> {
    let Some(task) = state.tasks.get(state.selected) else {
        return Ok(());
    };

    api.set_status(task.id, task.status.toggled())?;
    state
        .status
        .set(MSG_STATUS_UPDATED, MessageKind::Success, now);
    reload(api, state)
}

fn delete_selected<A: TaskApi>(
    api: &A,
    state: &mut BoardState,
    now: Instant,
) -> anyhow::Result<()> {
    let Some(task) = state.tasks.get(state.selected) else {
        return Ok(());
    };

    api.delete_task(task.id)?;
    state.status.set(MSG_TASK_DELETED, MessageKind::Success, now);
    reload(api, state)
}

fn field_mut(form: &mut TaskForm, field: usize) -> &mut String {
    match field {
        0 => &mut form.title,
        1 => &mut form.description,
        2 => &mut form.priority,
        _ => &mut form.due_date,
    }
}

fn draw(f: &mut ratatui::Frame, state: &BoardState) {
    let bottom = if state.editing.is_some() {
        FORM_FIELDS.len() as u16 + 2
    } else {
        1
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![
            Constraint::Min(5),
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Length(bottom),
        ])
        .split(f.area());

    let rows: Vec<Row> = state
        .tasks
        .iter()
        .map(|t| {
            let style = if t.status == Status::Completed && state.color {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(t.id.to_string()),
                Cell::from(t.title.clone()),
                Cell::from(t.priority.clone().unwrap_or_default()),
                Cell::from(t.due_or_dash().to_string()),
                Cell::from(t.status.to_string()),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Percentage(45),
            Constraint::Length(8),
            Constraint::Length(12),
            Constraint::Length(10),
        ],
    )
    .header(Row::new(vec!["ID", "Title", "Pri", "Due", "Status"]).style(
        Style::default().add_modifier(Modifier::BOLD),
    ))
    .block(Block::default().borders(Borders::ALL).title("Tasks"))
    .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

    let mut table_state = TableState::default();
    if !state.tasks.is_empty() {
        table_state.select(Some(state.selected));
    }
    f.render_stateful_widget(table, chunks[0], &mut table_state);

    let insights = Paragraph::new(state.insights.as_str())
        .block(Block::default().borders(Borders::ALL).title("Insights"));
    f.render_widget(insights, chunks[1]);

    let message_style = match state.status.kind() {
        Some(MessageKind::Success) if state.color => Style::default().fg(Color::Green),
        Some(MessageKind::Error) if state.color => Style::default().fg(Color::Red),
        _ => Style::default(),
    };
    let message = Paragraph::new(state.status.text()).style(message_style);
    f.render_widget(message, chunks[2]);

    if let Some(active) = state.editing {
        let mut lines: Vec<Line> = Vec::with_capacity(FORM_FIELDS.len());
        for (idx, label) in FORM_FIELDS.iter().enumerate() {
            let marker = if idx == active { "> " } else { "  " };
            let value = match idx {
                0 => state.form.title.as_str(),
                1 => state.form.description.as_str(),
                2 => state.form.priority.as_str(),
                _ => state.form.due_date.as_str(),
            };
            let label_style = if idx == active {
                Style::default().add_modifier(Modifier::BOLD)
            } else {
                Style::default()
            };
            lines.push(Line::from(vec![
                Span::raw(marker),
                Span::styled(format!("{label}: "), label_style),
                Span::raw(value.to_string()),
            ]));
        }

        let form = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title("Add task (Enter: submit, Tab: next field, Esc: cancel)"),
        );
        f.render_widget(form, chunks[3]);
    } else {
        let help = Paragraph::new("a add  space toggle  d delete  r reload  q quit")
            .style(Style::default().add_modifier(Modifier::DIM));
        f.render_widget(help, chunks[3]);
    }
}
