use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Completion state of a task. The server stores exactly these two values,
/// capitalized, and the client only ever flips between them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Status {
    Pending,
    Completed,
}

impl Status {
    pub fn toggled(self) -> Self {
        match self {
            Status::Pending => Status::Completed,
            Status::Completed => Status::Pending,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Pending => write!(f, "Pending"),
            Status::Completed => write!(f, "Completed"),
        }
    }
}

/// A task as the server returns it. The client treats this as a transient,
/// non-authoritative copy: it is never mutated locally, only re-fetched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub priority: Option<String>,

    #[serde(default)]
    pub due_date: Option<String>,

    pub status: Status,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Task {
    /// Due date as the table shows it; absent, null, and empty are all `-`.
    pub fn due_or_dash(&self) -> &str {
        match self.due_date.as_deref() {
            Some(due) if !due.is_empty() => due,
            _ => "-",
        }
    }
}

/// Body of `POST /tasks`. The server assigns the id and forces the initial
/// status to Pending, so neither appears here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub priority: String,
    pub due_date: String,
}

/// Body of `PATCH /tasks/{id}`. Status is the only field this client ever
/// patches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StatusPatch {
    pub status: Status,
}

/// Server-computed summary from `GET /insights`. The summary string is shown
/// verbatim; the counters ride along for logging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insights {
    pub summary: String,

    #[serde(default)]
    pub total: u64,

    #[serde(default)]
    pub overdue: u64,

    #[serde(default)]
    pub due_soon: u64,

    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::{Status, StatusPatch, Task};

    #[test]
    fn toggle_is_a_two_value_involution() {
        assert_eq!(Status::Pending.toggled(), Status::Completed);
        assert_eq!(Status::Completed.toggled(), Status::Pending);
        assert_eq!(Status::Pending.toggled().toggled(), Status::Pending);
    }

    #[test]
    fn status_serializes_capitalized() {
        let body = serde_json::to_string(&StatusPatch {
            status: Status::Completed,
        })
        .expect("serialize patch");
        assert_eq!(body, r#"{"status":"Completed"}"#);
    }

    #[test]
    fn task_decodes_server_row_with_nulls_and_extras() {
        let raw = r#"{
            "id": 7,
            "title": "Buy milk",
            "description": null,
            "priority": "High",
            "due_date": "",
            "status": "Pending",
            "created_at": "2026-08-01 09:30:00",
            "archived": false
        }"#;
        let task: Task = serde_json::from_str(raw).expect("decode task");
        assert_eq!(task.id, 7);
        assert_eq!(task.title, "Buy milk");
        assert_eq!(task.description, None);
        assert_eq!(task.due_or_dash(), "-");
        assert_eq!(task.status, Status::Pending);
        assert!(task.extra.contains_key("archived"));
    }

    #[test]
    fn unknown_status_is_a_decode_error() {
        let raw = r#"{"id": 1, "title": "x", "status": "Archived"}"#;
        assert!(serde_json::from_str::<Task>(raw).is_err());
    }
}
