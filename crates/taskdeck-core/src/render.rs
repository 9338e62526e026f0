use std::io::{self, IsTerminal, Write};

use anyhow::anyhow;
use chrono::NaiveDate;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::task::{Insights, Status, Task};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    Success,
    Error,
}

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    pub fn new(cfg: &Config) -> anyhow::Result<Self> {
        let color_cfg = cfg.get("color").unwrap_or_else(|| "on".to_string());
        let color = match color_cfg.to_ascii_lowercase().as_str() {
            "on" | "yes" | "true" | "1" => true,
            "off" | "no" | "false" | "0" => false,
            other => return Err(anyhow!("invalid color setting: {other}")),
        };

        Ok(Self { color })
    }

    /// One row per task, server order, nothing filtered out.
    #[tracing::instrument(skip(self, tasks, today))]
    pub fn print_task_table(&mut self, tasks: &[Task], today: NaiveDate) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();

        let headers = vec![
            "ID".to_string(),
            "Title".to_string(),
            "Pri".to_string(),
            "Due".to_string(),
            "Status".to_string(),
        ];

        let rows = self.task_rows(tasks, today);
        write_table(&mut out, headers, rows)?;
        Ok(())
    }

    fn task_rows(&self, tasks: &[Task], today: NaiveDate) -> Vec<Vec<String>> {
        let mut rows = Vec::with_capacity(tasks.len());

        for task in tasks {
            let id = self.paint(&task.id.to_string(), "33");

            let due = task.due_or_dash().to_string();
            let due = if is_overdue(task, today) {
                self.paint(&due, "31")
            } else {
                due
            };

            let status = match task.status {
                Status::Completed => self.paint("Completed", "32"),
                Status::Pending => "Pending".to_string(),
            };

            let priority = task.priority.clone().unwrap_or_default();

            rows.push(vec![id, task.title.clone(), priority, due, status]);
        }

        rows
    }

    /// Transient status line: green on success, red on error.
    pub fn print_message(&mut self, text: &str, kind: MessageKind) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        let code = match kind {
            MessageKind::Success => "32",
            MessageKind::Error => "31",
        };
        writeln!(out, "{}", self.paint(text, code))?;
        Ok(())
    }

    /// The summary string verbatim; no truncation or reformatting.
    pub fn print_insights(&mut self, insights: &Insights) -> anyhow::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out)?;
        writeln!(out, "{}", insights.summary)?;
        Ok(())
    }

    /// Color-free renderer for unit tests; the config path is exercised by
    /// `Renderer::new` itself.
    #[cfg(test)]
    pub(crate) fn plain() -> Self {
        Self { color: false }
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color || !io::stdout().is_terminal() {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

/// Overdue means a parseable past due date on a task that is still pending.
/// Unparseable due dates are shown as-is, unpainted.
fn is_overdue(task: &Task, today: NaiveDate) -> bool {
    if task.status != Status::Pending {
        return false;
    }
    match task.due_date.as_deref() {
        Some(due) if !due.is_empty() => NaiveDate::parse_from_str(due, "%Y-%m-%d")
            .map(|d| d < today)
            .unwrap_or(false),
        _ => false,
    }
}

fn write_table<W: Write>(
    mut writer: W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let column_count = headers.len();
    let mut widths = vec![0usize; column_count];

    for (idx, header) in headers.iter().enumerate() {
        widths[idx] = widths[idx].max(UnicodeWidthStr::width(header.as_str()));
    }

    for row in &rows {
        for (idx, cell) in row.iter().enumerate() {
            widths[idx] = widths[idx].max(UnicodeWidthStr::width(strip_ansi(cell).as_str()));
        }
    }

    for idx in 0..column_count {
        write!(writer, "{:width$} ", headers[idx], width = widths[idx])?;
    }
    writeln!(writer)?;

    for idx in 0..column_count {
        write!(writer, "{:-<width$} ", "", width = widths[idx])?;
    }
    writeln!(writer)?;

    for row in rows {
        for idx in 0..column_count {
            let cell = &row[idx];
            let visible_width = UnicodeWidthStr::width(strip_ansi(cell).as_str());
            let padding = widths[idx].saturating_sub(visible_width);
            write!(writer, "{}{} ", cell, " ".repeat(padding))?;
        }
        writeln!(writer)?;
    }

    Ok(())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut escaped = false;

    for ch in s.chars() {
        if escaped {
            if ch == 'm' {
                escaped = false;
            }
            continue;
        }

        if ch == '\x1b' {
            escaped = true;
            continue;
        }

        out.push(ch);
    }

    out
}
