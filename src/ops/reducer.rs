//! Pure state reduction.
//!
//! `reduce` never mutates its input: every action produces a new `AppState`.
//! Actions carry all ids and timestamps they need, so the same state and
//! action always give the same result.

use chrono::{DateTime, Duration, Utc};

use crate::model::project::{INBOX_ID, Project, ProjectUpdate};
use crate::model::state::{AppState, PartialState, ViewMode};
use crate::model::task::{Task, TaskUpdate};

/// The closed set of state transitions
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    AddTask(Task),
    UpdateTask {
        id: String,
        update: TaskUpdate,
        at: DateTime<Utc>,
    },
    DeleteTask(String),
    ToggleTask {
        id: String,
        at: DateTime<Utc>,
    },
    AddProject(Project),
    UpdateProject {
        id: String,
        update: ProjectUpdate,
    },
    DeleteProject(String),
    SetView {
        view: ViewMode,
        project_id: Option<String>,
        filter_id: Option<String>,
    },
    LoadState {
        partial: PartialState,
        at: DateTime<Utc>,
    },
}

impl Action {
    /// Short name used in log events
    pub fn name(&self) -> &'static str {
        match self {
            Action::AddTask(_) => "add_task",
            Action::UpdateTask { .. } => "update_task",
            Action::DeleteTask(_) => "delete_task",
            Action::ToggleTask { .. } => "toggle_task",
            Action::AddProject(_) => "add_project",
            Action::UpdateProject { .. } => "update_project",
            Action::DeleteProject(_) => "delete_project",
            Action::SetView { .. } => "set_view",
            Action::LoadState { .. } => "load_state",
        }
    }
}

/// Apply `action` to `state`, returning the next state
pub fn reduce(state: &AppState, action: Action) -> AppState {
    let mut next = state.clone();
    match action {
        Action::AddTask(mut task) => {
            task.project_id = resolve_project(&next, task.project_id);
            next.tasks.push(task);
            recount_projects(&mut next);
        }
        Action::UpdateTask { id, update, at } => {
            let fallback = update
                .project_id
                .clone()
                .map(|pid| resolve_project(&next, pid));
            if let Some(task) = next.tasks.iter_mut().find(|t| t.id == id) {
                update.apply_to(task);
                if let Some(pid) = fallback {
                    task.project_id = pid;
                }
                touch(task, at);
                recount_projects(&mut next);
            }
        }
        Action::DeleteTask(id) => {
            next.tasks.retain(|t| t.id != id);
            recount_projects(&mut next);
        }
        Action::ToggleTask { id, at } => {
            if let Some(task) = next.tasks.iter_mut().find(|t| t.id == id) {
                task.completed = !task.completed;
                touch(task, at);
            }
        }
        Action::AddProject(project) => {
            next.projects.push(project);
            recount_projects(&mut next);
        }
        Action::UpdateProject { id, update } => {
            if let Some(project) = next.projects.iter_mut().find(|p| p.id == id) {
                update.apply_to(project);
            }
        }
        Action::DeleteProject(id) => {
            // The inbox is the fallback for orphaned input and stays put
            if id != INBOX_ID {
                next.projects.retain(|p| p.id != id);
                next.tasks.retain(|t| t.project_id != id);
                recount_projects(&mut next);
            }
        }
        Action::SetView {
            view,
            project_id,
            filter_id,
        } => {
            next.selected_view = view;
            next.selected_project_id = project_id;
            next.selected_filter_id = filter_id;
        }
        Action::LoadState { partial, at } => {
            next = partial.merge_into(state);
            if !next.has_project(INBOX_ID) {
                next.projects.insert(0, Project::inbox(at));
            }
            recount_projects(&mut next);
        }
    }
    next
}

/// Refresh `updated_at`, keeping it strictly increasing for the task
fn touch(task: &mut Task, at: DateTime<Utc>) {
    task.updated_at = if at > task.updated_at {
        at
    } else {
        task.updated_at + Duration::milliseconds(1)
    };
}

/// Unknown project ids fall back to the inbox
fn resolve_project(state: &AppState, project_id: String) -> String {
    if state.has_project(&project_id) {
        project_id
    } else {
        INBOX_ID.to_string()
    }
}

/// Recompute every project's task count from the task collection
fn recount_projects(state: &mut AppState) {
    let counts: Vec<usize> = state
        .projects
        .iter()
        .map(|p| state.count_tasks_in(&p.id))
        .collect();
    for (project, count) in state.projects.iter_mut().zip(counts) {
        project.tasks_count = count;
    }
}
