use anyhow::{Context, anyhow};
use chrono::{Local, NaiveDate};
use tracing::{debug, info, instrument, warn};

use crate::api::{CreateOutcome, TaskApi};
use crate::board;
use crate::cli::Invocation;
use crate::config::Config;
use crate::render::{MessageKind, Renderer};
use crate::view::{
    MSG_ADD_FAILED, MSG_STATUS_UPDATED, MSG_TASK_ADDED, MSG_TASK_DELETED, TaskForm,
};

pub fn known_command_names() -> Vec<&'static str> {
    vec![
        "add",
        "list",
        "toggle",
        "delete",
        "insights",
        "board",
        "_show",
        "help",
        "version",
    ]
}

pub fn expand_command_abbrev<'a>(token: &'a str, known: &[&'a str]) -> Option<&'a str> {
    if known.contains(&token) {
        return Some(token);
    }

    let mut matches = known.iter().copied().filter(|name| name.starts_with(token));
    let first = matches.next()?;
    if matches.next().is_some() {
        None
    } else {
        Some(first)
    }
}

#[instrument(skip(api, cfg, renderer, inv))]
pub fn dispatch<A: TaskApi>(
    api: &A,
    cfg: &Config,
    renderer: &mut Renderer,
    inv: Invocation,
) -> anyhow::Result<()> {
    let today = Local::now().date_naive();
    let command = inv.command.as_str();

    debug!(command, args = ?inv.command_args, "dispatching command");

    match command {
        "list" => cmd_list(api, renderer, today),
        "add" => cmd_add(api, renderer, &inv.command_args, today),
        "toggle" => cmd_toggle(api, renderer, &inv.command_args, today),
        "delete" => cmd_delete(api, renderer, &inv.command_args, today),
        "insights" => cmd_insights(api, renderer),
        "board" => board::run(api, cfg),
        "_show" => cmd_show(cfg),
        "help" => cmd_help(),
        "version" => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => Err(anyhow!("unknown command: {other}")),
    }
}

/// The on-load flow: full task list first, then the insights summary.
#[instrument(skip(api, renderer, today))]
fn cmd_list<A: TaskApi>(api: &A, renderer: &mut Renderer, today: NaiveDate) -> anyhow::Result<()> {
    let tasks = api.list_tasks()?;
    renderer.print_task_table(&tasks, today)?;

    let insights = api.insights()?;
    renderer.print_insights(&insights)?;
    Ok(())
}

#[instrument(skip(api, renderer, args, today))]
fn cmd_add<A: TaskApi>(
    api: &A,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let form = parse_add_args(args);

    let new = match form.validate() {
        Ok(new) => new,
        Err(msg) => {
            // No request leaves the client on a validation failure.
            renderer.print_message(msg, MessageKind::Error)?;
            return Ok(());
        }
    };

    match api.create_task(&new)? {
        CreateOutcome::Created(task) => {
            info!(id = task.id, "task created");
            renderer.print_message(MSG_TASK_ADDED, MessageKind::Success)?;
            cmd_list(api, renderer, today)
        }
        CreateOutcome::Rejected(status) => {
            warn!(status, "server rejected create");
            renderer.print_message(MSG_ADD_FAILED, MessageKind::Error)?;
            Ok(())
        }
    }
}

#[instrument(skip(api, renderer, args, today))]
fn cmd_toggle<A: TaskApi>(
    api: &A,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let id = parse_id(args)?;

    let tasks = api.list_tasks()?;
    let current = tasks
        .iter()
        .find(|t| t.id == id)
        .map(|t| t.status)
        .ok_or_else(|| anyhow!("no such task: {id}"))?;

    api.set_status(id, current.toggled())?;
    renderer.print_message(MSG_STATUS_UPDATED, MessageKind::Success)?;
    cmd_list(api, renderer, today)
}

#[instrument(skip(api, renderer, args, today))]
fn cmd_delete<A: TaskApi>(
    api: &A,
    renderer: &mut Renderer,
    args: &[String],
    today: NaiveDate,
) -> anyhow::Result<()> {
    let id = parse_id(args)?;

    // No confirmation, and the server's answer is not consulted.
    api.delete_task(id)?;
    renderer.print_message(MSG_TASK_DELETED, MessageKind::Success)?;
    cmd_list(api, renderer, today)
}

#[instrument(skip(api, renderer))]
fn cmd_insights<A: TaskApi>(api: &A, renderer: &mut Renderer) -> anyhow::Result<()> {
    let insights = api.insights()?;
    renderer.print_insights(&insights)?;
    Ok(())
}

fn cmd_show(cfg: &Config) -> anyhow::Result<()> {
    let mut pairs: Vec<(&String, &String)> = cfg.iter().collect();
    pairs.sort_by(|a, b| a.0.cmp(b.0));
    for (key, value) in pairs {
        println!("{key}={value}");
    }
    Ok(())
}

fn cmd_help() -> anyhow::Result<()> {
    println!("usage: taskdeck [options] <command> [args]");
    println!();
    println!("commands:");
    println!("  list                       show all tasks and the insights summary");
    println!("  add <title> [attrs]        create a task; attrs: desc:.. priority:.. due:YYYY-MM-DD");
    println!("  toggle <id>                flip a task between Pending and Completed");
    println!("  delete <id>                delete a task");
    println!("  insights                   show the insights summary");
    println!("  board                      interactive board session");
    println!("  help, version, _show");
    println!();
    println!("options: -v/-q verbosity, --api <url>, --rcfile <path>, rc.key=value overrides");
    Ok(())
}

/// Add arguments: `desc:`, `priority:` and `due:` attribute tokens anywhere
/// on the line, every other token becomes a title word.
fn parse_add_args(args: &[String]) -> TaskForm {
    let mut form = TaskForm::default();
    let mut title_words: Vec<&str> = Vec::new();

    for arg in args {
        if let Some(value) = arg.strip_prefix("desc:") {
            form.description = value.to_string();
        } else if let Some(value) = arg.strip_prefix("priority:") {
            form.priority = value.to_string();
        } else if let Some(value) = arg.strip_prefix("due:") {
            form.due_date = value.to_string();
        } else {
            title_words.push(arg);
        }
    }

    form.title = title_words.join(" ");
    form
}

fn parse_id(args: &[String]) -> anyhow::Result<u64> {
    let raw = args
        .first()
        .ok_or_else(|| anyhow!("expected a task id"))?;
    raw.parse::<u64>()
        .with_context(|| format!("invalid task id: {raw}"))
}
