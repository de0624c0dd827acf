//! The owned state store.
//!
//! `Store` holds the single authoritative `AppState` behind an `Arc` and
//! swaps in a new snapshot per action. Snapshots handed out earlier stay
//! valid and unchanged.

use std::sync::Arc;

use chrono::{Local, Weekday};
use log::debug;
use uuid::Uuid;

use crate::model::filter::Filter;
use crate::model::project::{NewProject, Project, ProjectUpdate};
use crate::model::state::{AppState, PartialState, ViewMode};
use crate::model::task::{NewTask, Task, TaskUpdate};
use crate::ops::clock::Clock;
use crate::ops::reducer::{Action, reduce};
use crate::ops::view;

pub struct Store {
    state: Arc<AppState>,
    clock: Box<dyn Clock>,
    week_start: Weekday,
}

impl Store {
    /// A store holding the built-in initial state
    pub fn new(clock: Box<dyn Clock>) -> Self {
        let state = AppState::initial(clock.now());
        Store {
            state: Arc::new(state),
            clock,
            week_start: Weekday::Sun,
        }
    }

    pub fn with_week_start(mut self, week_start: Weekday) -> Self {
        self.week_start = week_start;
        self
    }

    // -----------------------------------------------------------------------
    // Read access
    // -----------------------------------------------------------------------

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// A shared handle to the current state that later actions won't change
    pub fn snapshot(&self) -> Arc<AppState> {
        Arc::clone(&self.state)
    }

    pub fn tasks(&self) -> &[Task] {
        &self.state.tasks
    }

    pub fn projects(&self) -> &[Project] {
        &self.state.projects
    }

    pub fn filters(&self) -> &[Filter] {
        &self.state.filters
    }

    pub fn selected_view(&self) -> ViewMode {
        self.state.selected_view
    }

    pub fn selected_project_id(&self) -> Option<&str> {
        self.state.selected_project_id.as_deref()
    }

    pub fn selected_filter_id(&self) -> Option<&str> {
        self.state.selected_filter_id.as_deref()
    }

    pub fn week_start(&self) -> Weekday {
        self.week_start
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    /// Tasks visible in the selected view, judged against local wall-clock time
    pub fn filtered_tasks(&self) -> Vec<&Task> {
        let now = self.clock.now().with_timezone(&Local);
        view::filtered_tasks(&self.state, &now, self.week_start)
    }

    // -----------------------------------------------------------------------
    // Mutations
    // -----------------------------------------------------------------------

    /// Add a task; returns its new id
    pub fn add_task(&mut self, new: NewTask) -> String {
        let id = Uuid::new_v4().to_string();
        let task = Task::from_new(id.clone(), new, self.clock.now());
        self.dispatch(Action::AddTask(task));
        id
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) {
        let at = self.clock.now();
        self.dispatch(Action::UpdateTask {
            id: id.to_string(),
            update,
            at,
        });
    }

    pub fn delete_task(&mut self, id: &str) {
        self.dispatch(Action::DeleteTask(id.to_string()));
    }

    pub fn toggle_task(&mut self, id: &str) {
        let at = self.clock.now();
        self.dispatch(Action::ToggleTask {
            id: id.to_string(),
            at,
        });
    }

    /// Add a project; returns its new id
    pub fn add_project(&mut self, new: NewProject) -> String {
        let id = Uuid::new_v4().to_string();
        let project = Project::from_new(id.clone(), new, self.clock.now());
        self.dispatch(Action::AddProject(project));
        id
    }

    pub fn update_project(&mut self, id: &str, update: ProjectUpdate) {
        self.dispatch(Action::UpdateProject {
            id: id.to_string(),
            update,
        });
    }

    /// Remove a project and every task in it
    pub fn delete_project(&mut self, id: &str) {
        self.dispatch(Action::DeleteProject(id.to_string()));
    }

    pub fn set_selected_view(
        &mut self,
        view: ViewMode,
        project_id: Option<String>,
        filter_id: Option<String>,
    ) {
        self.dispatch(Action::SetView {
            view,
            project_id,
            filter_id,
        });
    }

    /// Shallow-merge `partial` over the current state (startup hydration)
    pub fn load_state(&mut self, partial: PartialState) {
        let at = self.clock.now();
        self.dispatch(Action::LoadState { partial, at });
    }

    fn dispatch(&mut self, action: Action) {
        let name = action.name();
        let next = reduce(&self.state, action);
        debug!(
            "event=dispatch module=store action={} tasks={} projects={}",
            name,
            next.tasks.len(),
            next.projects.len()
        );
        self.state = Arc::new(next);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::Priority;
    use crate::ops::clock::ManualClock;
    use chrono::{Duration, TimeZone, Utc};

    fn store() -> (Store, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 2, 2, 12, 0, 0).unwrap());
        (Store::new(Box::new(clock.clone())), clock)
    }

    #[test]
    fn add_task_assigns_id_and_timestamps() {
        let (mut store, clock) = store();
        let id = store.add_task(NewTask::new("Buy milk", "inbox").priority(Priority::Medium));
        let task = store.state().task(&id).unwrap();
        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(task.created_at, clock.now());
        assert_eq!(task.updated_at, clock.now());
        assert_eq!(store.projects()[0].tasks_count, 1);
    }

    #[test]
    fn ids_are_unique() {
        let (mut store, _) = store();
        let a = store.add_task(NewTask::new("a", "inbox"));
        let b = store.add_task(NewTask::new("b", "inbox"));
        assert_ne!(a, b);
    }

    #[test]
    fn snapshots_survive_later_actions() {
        let (mut store, _) = store();
        let before = store.snapshot();
        store.add_task(NewTask::new("a", "inbox"));
        assert!(before.tasks.is_empty());
        assert_eq!(store.tasks().len(), 1);
    }

    #[test]
    fn update_refreshes_updated_at() {
        let (mut store, clock) = store();
        let id = store.add_task(NewTask::new("a", "inbox"));
        clock.advance(Duration::minutes(3));
        store.update_task(
            &id,
            TaskUpdate {
                title: Some("b".into()),
                ..Default::default()
            },
        );
        let task = store.state().task(&id).unwrap();
        assert_eq!(task.title, "b");
        assert_eq!(task.updated_at, clock.now());
        assert!(task.created_at < task.updated_at);
    }

    #[test]
    fn add_and_delete_project() {
        let (mut store, _) = store();
        let pid = store.add_project(NewProject::new("Work", "#ef4444"));
        store.add_task(NewTask::new("a", pid.clone()));
        assert_eq!(store.state().project(&pid).unwrap().tasks_count, 1);
        store.delete_project(&pid);
        assert!(store.state().project(&pid).is_none());
        assert!(store.tasks().is_empty());
    }

    #[test]
    fn update_project_merges() {
        let (mut store, _) = store();
        let pid = store.add_project(NewProject::new("Work", "#ef4444"));
        store.update_project(
            &pid,
            ProjectUpdate {
                name: Some("Office".into()),
                icon: Some(Some("Briefcase".into())),
                ..Default::default()
            },
        );
        let project = store.state().project(&pid).unwrap();
        assert_eq!(project.name, "Office");
        assert_eq!(project.color, "#ef4444");
        assert_eq!(project.icon.as_deref(), Some("Briefcase"));
    }

    #[test]
    fn set_selected_view_replaces_selection() {
        let (mut store, _) = store();
        store.set_selected_view(ViewMode::Project, Some("inbox".into()), None);
        assert_eq!(store.selected_view(), ViewMode::Project);
        assert_eq!(store.selected_project_id(), Some("inbox"));
        assert_eq!(store.selected_filter_id(), None);
    }
}
