use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::Write;

use taskdeck_core::api::{CreateOutcome, TaskApi};
use taskdeck_core::cli::Invocation;
use taskdeck_core::commands;
use taskdeck_core::config::Config;
use taskdeck_core::render::Renderer;
use taskdeck_core::task::{Insights, NewTask, Status, Task};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    List,
    Create(NewTask),
    SetStatus(u64, Status),
    Delete(u64),
    Insights,
}

struct RecordingApi {
    calls: RefCell<Vec<Call>>,
    tasks: Vec<Task>,
}

impl RecordingApi {
    fn new(tasks: Vec<Task>) -> Self {
        Self {
            calls: RefCell::new(vec![]),
            tasks,
        }
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }
}

impl TaskApi for RecordingApi {
    fn list_tasks(&self) -> anyhow::Result<Vec<Task>> {
        self.calls.borrow_mut().push(Call::List);
        Ok(self.tasks.clone())
    }

    fn create_task(&self, new: &NewTask) -> anyhow::Result<CreateOutcome> {
        self.calls.borrow_mut().push(Call::Create(new.clone()));
        let mut created = pending_task(99, &new.title);
        created.due_date = Some(new.due_date.clone());
        Ok(CreateOutcome::Created(created))
    }

    fn set_status(&self, id: u64, status: Status) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(Call::SetStatus(id, status));
        Ok(())
    }

    fn delete_task(&self, id: u64) -> anyhow::Result<()> {
        self.calls.borrow_mut().push(Call::Delete(id));
        Ok(())
    }

    fn insights(&self) -> anyhow::Result<Insights> {
        self.calls.borrow_mut().push(Call::Insights);
        Ok(Insights {
            summary: "Total tasks: 1 | Pending: 1".to_string(),
            total: 1,
            overdue: 0,
            due_soon: 0,
            extra: BTreeMap::new(),
        })
    }
}

fn pending_task(id: u64, title: &str) -> Task {
    Task {
        id,
        title: title.to_string(),
        description: None,
        priority: Some("High".to_string()),
        due_date: Some(String::new()),
        status: Status::Pending,
        created_at: None,
        extra: BTreeMap::new(),
    }
}

fn plain_config() -> Config {
    let mut rc = tempfile::NamedTempFile::new().expect("rc file");
    writeln!(rc, "color = off").expect("write rc");
    rc.flush().expect("flush rc");
    Config::load(Some(rc.path())).expect("load config")
}

fn invocation(command: &str, args: &[&str]) -> Invocation {
    Invocation {
        command: command.to_string(),
        command_args: args.iter().map(|s| s.to_string()).collect(),
    }
}

#[test]
fn list_loads_tasks_then_insights() {
    let api = RecordingApi::new(vec![pending_task(1, "Buy milk")]);
    let cfg = plain_config();
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    commands::dispatch(&api, &cfg, &mut renderer, invocation("list", &[])).expect("list");
    assert_eq!(api.calls(), vec![Call::List, Call::Insights]);
}

#[test]
fn toggling_the_example_task_patches_completed() {
    // The one-task example: empty due date, Pending, toggled once.
    let api = RecordingApi::new(vec![pending_task(1, "Buy milk")]);
    let cfg = plain_config();
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    commands::dispatch(&api, &cfg, &mut renderer, invocation("toggle", &["1"]))
        .expect("toggle");

    let calls = api.calls();
    assert_eq!(calls[1], Call::SetStatus(1, Status::Completed));
    // The mutation is followed by a full reload.
    assert_eq!(&calls[2..], &[Call::List, Call::Insights]);
}

#[test]
fn add_flow_creates_then_reloads() {
    let api = RecordingApi::new(vec![]);
    let cfg = plain_config();
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    commands::dispatch(
        &api,
        &cfg,
        &mut renderer,
        invocation("add", &["Water", "the", "plants", "due:2026-09-02"]),
    )
    .expect("add");

    let calls = api.calls();
    match &calls[0] {
        Call::Create(new) => {
            assert_eq!(new.title, "Water the plants");
            assert_eq!(new.due_date, "2026-09-02");
        }
        other => panic!("expected a create call, got {other:?}"),
    }
    assert_eq!(&calls[1..], &[Call::List, Call::Insights]);
}

#[test]
fn blank_add_never_reaches_the_api() {
    let api = RecordingApi::new(vec![]);
    let cfg = plain_config();
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    commands::dispatch(&api, &cfg, &mut renderer, invocation("add", &["  "])).expect("add");
    assert!(api.calls().is_empty());
}

#[test]
fn delete_reloads_unconditionally() {
    let api = RecordingApi::new(vec![pending_task(1, "Buy milk")]);
    let cfg = plain_config();
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    commands::dispatch(&api, &cfg, &mut renderer, invocation("delete", &["1"]))
        .expect("delete");
    assert_eq!(
        api.calls(),
        vec![Call::Delete(1), Call::List, Call::Insights]
    );
}

#[test]
fn unknown_commands_are_rejected() {
    let api = RecordingApi::new(vec![]);
    let cfg = plain_config();
    let mut renderer = Renderer::new(&cfg).expect("renderer");

    let err = commands::dispatch(&api, &cfg, &mut renderer, invocation("frobnicate", &[]))
        .expect_err("unknown command");
    assert!(err.to_string().contains("unknown command"));
    assert!(api.calls().is_empty());
}
