use std::time::{Duration, Instant};

use crate::render::MessageKind;
use crate::task::NewTask;

/// How long a status message stays visible. Fixed, not configurable.
pub const MESSAGE_LINGER: Duration = Duration::from_secs(2);

pub const MSG_TITLE_REQUIRED: &str = "Enter a title!";
pub const MSG_TASK_ADDED: &str = "Task added!";
pub const MSG_ADD_FAILED: &str = "Failed to add task";
pub const MSG_TASK_DELETED: &str = "Task deleted!";
pub const MSG_STATUS_UPDATED: &str = "Status updated!";

/// The four add-form fields. Priority keeps its last selection across
/// submits; the other three are cleared after a successful create.
#[derive(Debug, Clone)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: String,
}

impl Default for TaskForm {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: "Medium".to_string(),
            due_date: String::new(),
        }
    }
}

impl TaskForm {
    /// The only validation this client performs: the trimmed title must be
    /// non-empty. Everything else goes to the server verbatim.
    pub fn validate(&self) -> Result<NewTask, &'static str> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(MSG_TITLE_REQUIRED);
        }

        Ok(NewTask {
            title: title.to_string(),
            description: self.description.trim().to_string(),
            priority: self.priority.clone(),
            due_date: self.due_date.clone(),
        })
    }

    pub fn clear_after_submit(&mut self) {
        self.title.clear();
        self.description.clear();
        self.due_date.clear();
    }
}

/// Transient status message. Every `set` schedules its own expiry and
/// nothing cancels the earlier ones, so an expiry from an overwritten
/// message still clears whatever text is current when it fires. That
/// matches the original behavior and is kept deliberately.
#[derive(Debug, Default)]
pub struct StatusLine {
    text: String,
    kind: Option<MessageKind>,
    expiries: Vec<Instant>,
}

impl StatusLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, text: &str, kind: MessageKind, now: Instant) {
        self.text = text.to_string();
        self.kind = Some(kind);
        self.expiries.push(now + MESSAGE_LINGER);
    }

    /// Drop expired timers; if any fired, the current text goes with them.
    pub fn poll(&mut self, now: Instant) {
        let before = self.expiries.len();
        self.expiries.retain(|deadline| *deadline > now);
        if self.expiries.len() < before {
            self.text.clear();
            self.kind = None;
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn kind(&self) -> Option<MessageKind> {
        self.kind
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
