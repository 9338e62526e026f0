use anyhow::Context;
use reqwest::blocking::Client;
use tracing::{debug, info, warn};

use crate::task::{Insights, NewTask, Status, StatusPatch, Task};

/// Result of a create request. A non-2xx answer is an expected outcome (the
/// caller shows an error message and moves on), not a transport failure.
#[derive(Debug, Clone)]
pub enum CreateOutcome {
    Created(Task),
    Rejected(u16),
}

/// Capability seam between the view layer and the wire. The board and the
/// one-shot commands only ever see this trait; tests substitute a recording
/// fake.
pub trait TaskApi {
    /// `GET /tasks` — the full collection, server order, no paging.
    fn list_tasks(&self) -> anyhow::Result<Vec<Task>>;

    /// `POST /tasks` — any non-2xx answer is `Rejected`.
    fn create_task(&self, new: &NewTask) -> anyhow::Result<CreateOutcome>;

    /// `PATCH /tasks/{id}` with `{status}`. The response status is ignored:
    /// a server-side failure still looks like success to the caller.
    fn set_status(&self, id: u64, status: Status) -> anyhow::Result<()>;

    /// `DELETE /tasks/{id}`. The response status is ignored, same as above.
    fn delete_task(&self, id: u64) -> anyhow::Result<()>;

    /// `GET /insights` — server-computed summary.
    fn insights(&self) -> anyhow::Result<Insights>;
}

/// Blocking HTTP client for the task service. The base address is injected
/// at construction; nothing in this crate reads it from ambient state.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: String,
    http: Client,
}

impl ApiClient {
    pub fn new(base: &str) -> anyhow::Result<Self> {
        let http = Client::builder()
            .build()
            .context("failed to build http client")?;
        Ok(Self {
            base: base.trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }
}

impl TaskApi for ApiClient {
    #[tracing::instrument(skip(self))]
    fn list_tasks(&self) -> anyhow::Result<Vec<Task>> {
        let url = self.url("/tasks");
        let tasks: Vec<Task> = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} answered with an error status"))?
            .json()
            .with_context(|| format!("GET {url} returned malformed JSON"))?;

        debug!(count = tasks.len(), "fetched task list");
        Ok(tasks)
    }

    #[tracing::instrument(skip(self, new), fields(title = %new.title))]
    fn create_task(&self, new: &NewTask) -> anyhow::Result<CreateOutcome> {
        let url = self.url("/tasks");
        let resp = self
            .http
            .post(&url)
            .json(new)
            .send()
            .with_context(|| format!("POST {url} failed"))?;

        let status = resp.status();
        if status.is_success() {
            let task: Task = resp
                .json()
                .with_context(|| format!("POST {url} returned malformed JSON"))?;
            info!(id = task.id, "created task");
            Ok(CreateOutcome::Created(task))
        } else {
            warn!(status = status.as_u16(), "create rejected by server");
            Ok(CreateOutcome::Rejected(status.as_u16()))
        }
    }

    #[tracing::instrument(skip(self))]
    fn set_status(&self, id: u64, status: Status) -> anyhow::Result<()> {
        let url = self.url(&format!("/tasks/{id}"));
        let resp = self
            .http
            .patch(&url)
            .json(&StatusPatch { status })
            .send()
            .with_context(|| format!("PATCH {url} failed"))?;

        // Deliberately not checked; the caller reports success regardless.
        debug!(status = resp.status().as_u16(), "patch response ignored");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn delete_task(&self, id: u64) -> anyhow::Result<()> {
        let url = self.url(&format!("/tasks/{id}"));
        let resp = self
            .http
            .delete(&url)
            .send()
            .with_context(|| format!("DELETE {url} failed"))?;

        debug!(status = resp.status().as_u16(), "delete response ignored");
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    fn insights(&self) -> anyhow::Result<Insights> {
        let url = self.url("/insights");
        let insights: Insights = self
            .http
            .get(&url)
            .send()
            .with_context(|| format!("GET {url} failed"))?
            .error_for_status()
            .with_context(|| format!("GET {url} answered with an error status"))?
            .json()
            .with_context(|| format!("GET {url} returned malformed JSON"))?;

        debug!(
            total = insights.total,
            overdue = insights.overdue,
            "fetched insights"
        );
        Ok(insights)
    }
}
