mod resolve;
pub use resolve::CliError;

use std::path::Path;

use chrono::Local;

use crate::app::Itinerary;
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::kv::FileStore;
use crate::io::persist::LoadOutcome;
use crate::io::recovery;
use crate::model::config::Config;
use crate::model::project::{DEFAULT_COLOR, INBOX_ID, NewProject, ProjectUpdate};
use crate::model::state::ViewMode;
use crate::model::task::{NewTask, TaskUpdate};
use crate::ops::view;

use resolve::*;

type CmdResult = Result<(), Box<dyn std::error::Error>>;
type App = Itinerary<FileStore>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli, data_dir: &Path, config: &Config) -> CmdResult {
    let json = cli.json;
    let command = cli
        .command
        .unwrap_or_else(|| Commands::List(ListArgs::default()));

    match command {
        // Reads the log directly and must not touch saved state
        Commands::Recovery(args) => cmd_recovery(data_dir, args.limit, json),

        // Read commands
        Commands::List(args) => with_app(data_dir, config, |app| cmd_list(app, args, json)),
        Commands::Show(args) => with_app(data_dir, config, |app| cmd_show(app, args, json)),
        Commands::Filters => with_app(data_dir, config, |app| cmd_filters(app, json)),
        Commands::Counts => with_app(data_dir, config, |app| cmd_counts(app, json)),

        // Write commands
        Commands::Add(args) => with_app(data_dir, config, |app| cmd_add(app, args, json)),
        Commands::Edit(args) => with_app(data_dir, config, |app| cmd_edit(app, args)),
        Commands::Done(args) => with_app(data_dir, config, |app| cmd_done(app, args)),
        Commands::Rm(args) => with_app(data_dir, config, |app| cmd_rm(app, args)),

        // Project management
        Commands::Project(cmd) => with_app(data_dir, config, |app| cmd_project(app, cmd, json)),
    }
}

/// Open the session, run `f`, and report load or save problems on stderr
fn with_app(data_dir: &Path, config: &Config, f: impl FnOnce(&mut App) -> CmdResult) -> CmdResult {
    let mut app = Itinerary::open_with(data_dir, config);
    if let LoadOutcome::Discarded(reason) = app.load_outcome() {
        eprintln!(
            "warning: saved data could not be read ({}); starting fresh. See `itin recovery`.",
            reason
        );
    }

    let result = f(&mut app);

    if let Some(err) = app.last_save_error() {
        eprintln!("warning: changes were not saved: {}", err);
    }
    result
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

/// The view a `list` invocation asks for, or `None` to keep the selected one
fn requested_view(
    app: &App,
    args: &ListArgs,
) -> Result<Option<(ViewMode, Option<String>, Option<String>)>, CliError> {
    let view = match args.view.as_deref() {
        Some(v) => parse_view_arg(v)?,
        None if args.project.is_some() => ViewMode::Project,
        None if args.filter.is_some() => ViewMode::Filter,
        None if args.label.is_some() => ViewMode::Label,
        None => return Ok(None),
    };
    let state = app.state();
    let selection = match view {
        ViewMode::Today | ViewMode::Upcoming => (None, None),
        ViewMode::Project => {
            let query = args.project.as_deref().ok_or(CliError::MissingProject)?;
            (Some(resolve_project(state, query)?), None)
        }
        ViewMode::Label => (None, args.label.clone()),
        ViewMode::Filter => {
            let filter = match args.filter.as_deref() {
                Some(query) => Some(resolve_filter(state, query)?),
                None => None,
            };
            (None, filter)
        }
    };
    Ok(Some((view, selection.0, selection.1)))
}

fn cmd_list(app: &mut App, args: ListArgs, json: bool) -> CmdResult {
    if let Some((view, project_id, filter_id)) = requested_view(app, &args)? {
        app.set_selected_view(view, project_id, filter_id);
    }

    let now = Local::now();
    let state = app.state();
    let tasks = view::filtered_tasks(state, &now, app.store().week_start());
    let (open, completed) = view::partition(tasks);

    if json {
        let out = ViewJson {
            view: state.selected_view,
            title: view_title(state),
            description: view_description(state, &now, open.len() + completed.len()),
            tasks: open,
            completed,
        };
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        print_lines(&format_view_listing(state, &open, &completed, &now));
    }
    Ok(())
}

fn cmd_show(app: &App, args: ShowArgs, json: bool) -> CmdResult {
    let state = app.state();
    let id = resolve_task(state, &args.id)?;
    let task = state
        .task(&id)
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(task)?);
    } else {
        print_lines(&format_task_detail(task, state, &Local::now()));
    }
    Ok(())
}

fn cmd_filters(app: &App, json: bool) -> CmdResult {
    let now = Local::now();
    let state = app.state();
    let week_start = app.store().week_start();
    let rows: Vec<FilterJson> = state
        .filters
        .iter()
        .map(|filter| FilterJson {
            filter,
            matches: view::filter_count(state, filter, &now, week_start),
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{}", format_filter_line(row.filter, row.matches));
        }
    }
    Ok(())
}

fn cmd_counts(app: &App, json: bool) -> CmdResult {
    let counts = view::sidebar_counts(app.state(), &Local::now(), app.store().week_start());
    if json {
        println!("{}", serde_json::to_string_pretty(&counts)?);
    } else {
        println!("Today: {}", counts.today);
        println!("Upcoming: {}", counts.upcoming);
        for project in &counts.projects {
            println!("{}: {}", project.name, project.open);
        }
    }
    Ok(())
}

fn cmd_recovery(data_dir: &Path, limit: Option<usize>, json: bool) -> CmdResult {
    let entries = recovery::read_recovery_entries(data_dir, Some(limit.unwrap_or(10)));
    if json {
        let values: Vec<serde_json::Value> = entries.iter().map(|e| e.to_json()).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
    } else if entries.is_empty() {
        println!("recovery log is empty");
    } else {
        for entry in &entries {
            print!("{}", entry.to_markdown());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Task commands
// ---------------------------------------------------------------------------

fn cmd_add(app: &mut App, args: AddArgs, json: bool) -> CmdResult {
    let title = non_empty_title(&args.title)?;
    let state = app.state();

    // Default to the project being viewed, else Inbox
    let project_id = match args.project.as_deref() {
        Some(query) => resolve_project(state, query)?,
        None => match (state.selected_view, state.selected_project_id.as_deref()) {
            (ViewMode::Project, Some(pid)) if state.has_project(pid) => pid.to_string(),
            _ => INBOX_ID.to_string(),
        },
    };

    let mut new = NewTask::new(title, project_id);
    if let Some(desc) = args.desc {
        new = new.description(desc);
    }
    if let Some(p) = args.priority.as_deref() {
        new = new.priority(parse_priority_arg(p)?);
    }
    if let Some(due) = args.due.as_deref() {
        new = new.due(parse_due(due, &Local::now())?);
    }
    for label in args.labels {
        new = new.label(label);
    }

    let id = app.add_task(new);
    if json {
        println!("{}", serde_json::json!({ "id": id }));
    } else {
        println!("{}", id);
    }
    Ok(())
}

fn cmd_edit(app: &mut App, args: EditArgs) -> CmdResult {
    let state = app.state();
    let id = resolve_task(state, &args.id)?;

    let mut update = TaskUpdate::default();
    if let Some(title) = args.title.as_deref() {
        update.title = Some(non_empty_title(title)?);
    }
    if args.clear_desc {
        update.description = Some(None);
    } else if let Some(desc) = args.desc {
        update.description = Some(Some(desc));
    }
    if let Some(query) = args.project.as_deref() {
        update.project_id = Some(resolve_project(state, query)?);
    }
    if let Some(p) = args.priority.as_deref() {
        update.priority = Some(parse_priority_arg(p)?);
    }
    if args.clear_due {
        update.due_date = Some(None);
    } else if let Some(due) = args.due.as_deref() {
        update.due_date = Some(Some(parse_due(due, &Local::now())?));
    }
    if !args.labels.is_empty() {
        update.labels = Some(args.labels);
    }
    if update.is_empty() {
        return Err(CliError::NothingToChange.into());
    }

    app.update_task(&id, update);
    println!("{}", short_id(&id));
    Ok(())
}

fn cmd_done(app: &mut App, args: IdArg) -> CmdResult {
    let id = resolve_task(app.state(), &args.id)?;
    app.toggle_task(&id);
    let completed = app.state().task(&id).is_some_and(|t| t.completed);
    println!(
        "{} → {}",
        short_id(&id),
        if completed { "done" } else { "open" }
    );
    Ok(())
}

fn cmd_rm(app: &mut App, args: IdArg) -> CmdResult {
    let id = resolve_task(app.state(), &args.id)?;
    app.delete_task(&id);
    println!("deleted {}", short_id(&id));
    Ok(())
}

// ---------------------------------------------------------------------------
// Project commands
// ---------------------------------------------------------------------------

fn cmd_project(app: &mut App, cmd: ProjectCmd, json: bool) -> CmdResult {
    match cmd.action {
        ProjectAction::List => cmd_project_list(app, json),
        ProjectAction::Add(args) => {
            let name = non_empty_title(&args.name)?;
            let mut new = NewProject::new(name, args.color.unwrap_or_else(|| DEFAULT_COLOR.into()));
            new.icon = args.icon;
            let id = app.add_project(new);
            if json {
                println!("{}", serde_json::json!({ "id": id }));
            } else {
                println!("{}", id);
            }
            Ok(())
        }
        ProjectAction::Rename(args) => {
            let id = resolve_project(app.state(), &args.id)?;
            let name = non_empty_title(&args.name)?;
            app.update_project(
                &id,
                ProjectUpdate {
                    name: Some(name),
                    ..Default::default()
                },
            );
            println!("{}", short_id(&id));
            Ok(())
        }
        ProjectAction::Style(args) => {
            let id = resolve_project(app.state(), &args.id)?;
            let update = ProjectUpdate {
                name: None,
                color: args.color,
                icon: if args.clear_icon {
                    Some(None)
                } else {
                    args.icon.map(Some)
                },
            };
            if update == ProjectUpdate::default() {
                return Err(CliError::NothingToChange.into());
            }
            app.update_project(&id, update);
            println!("{}", short_id(&id));
            Ok(())
        }
        ProjectAction::Rm(args) => {
            let id = resolve_project(app.state(), &args.id)?;
            if id == INBOX_ID {
                return Err("the Inbox cannot be deleted".into());
            }
            let removed = app.state().count_tasks_in(&id);
            app.delete_project(&id);
            println!("deleted {} ({} tasks)", short_id(&id), removed);
            Ok(())
        }
    }
}

fn cmd_project_list(app: &App, json: bool) -> CmdResult {
    let state = app.state();
    let counts = view::sidebar_counts(state, &Local::now(), app.store().week_start());
    let rows: Vec<ProjectJson> = state
        .projects
        .iter()
        .zip(&counts.projects)
        .map(|(project, count)| ProjectJson {
            project,
            open: count.open,
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else {
        for row in &rows {
            println!("{}", format_project_line(row.project, row.open));
        }
    }
    Ok(())
}
