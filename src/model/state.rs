use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::filter::Filter;
use super::project::{INBOX_ID, Project};
use super::task::Task;

/// Top-level task-list lens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    #[default]
    Today,
    Upcoming,
    Project,
    Label,
    Filter,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Today => "today",
            ViewMode::Upcoming => "upcoming",
            ViewMode::Project => "project",
            ViewMode::Label => "label",
            ViewMode::Filter => "filter",
        }
    }

    pub fn parse_view(s: &str) -> Option<ViewMode> {
        match s.trim().to_ascii_lowercase().as_str() {
            "today" => Some(ViewMode::Today),
            "upcoming" => Some(ViewMode::Upcoming),
            "project" => Some(ViewMode::Project),
            "label" => Some(ViewMode::Label),
            "filter" => Some(ViewMode::Filter),
            _ => None,
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The whole application state: unit of reduction and of persistence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub tasks: Vec<Task>,
    pub projects: Vec<Project>,
    pub filters: Vec<Filter>,
    pub selected_view: ViewMode,
    #[serde(default)]
    pub selected_project_id: Option<String>,
    /// Selected filter id; in the label view this carries the label name
    #[serde(default)]
    pub selected_filter_id: Option<String>,
}

impl AppState {
    /// Built-in state used on first start and when saved state is unusable:
    /// the Inbox project, the Today/Upcoming filters, Today view selected.
    pub fn initial(now: DateTime<Utc>) -> Self {
        AppState {
            tasks: Vec::new(),
            projects: vec![Project::inbox(now)],
            filters: Filter::builtin(),
            selected_view: ViewMode::Today,
            selected_project_id: None,
            selected_filter_id: Some("today".to_string()),
        }
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn project(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn filter(&self, id: &str) -> Option<&Filter> {
        self.filters.iter().find(|f| f.id == id)
    }

    pub fn has_project(&self, id: &str) -> bool {
        self.project(id).is_some()
    }

    pub fn inbox(&self) -> Option<&Project> {
        self.project(INBOX_ID)
    }

    /// Number of live tasks referencing `project_id`, computed from the tasks
    pub fn count_tasks_in(&self, project_id: &str) -> usize {
        self.tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .count()
    }
}

/// A state fragment merged over the current state by `load_state`.
/// Present fields replace, absent fields keep the current value. For the
/// selected ids an explicit `null` is present and clears the selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<Task>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub projects: Option<Vec<Project>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Filter>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_view: Option<ViewMode>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_project_id: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub selected_filter_id: Option<Option<String>>,
}

/// Any value found for the field, `null` included, counts as present
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

impl PartialState {
    /// Shallow merge over `base`
    pub fn merge_into(self, base: &AppState) -> AppState {
        AppState {
            tasks: self.tasks.unwrap_or_else(|| base.tasks.clone()),
            projects: self.projects.unwrap_or_else(|| base.projects.clone()),
            filters: self.filters.unwrap_or_else(|| base.filters.clone()),
            selected_view: self.selected_view.unwrap_or(base.selected_view),
            selected_project_id: self
                .selected_project_id
                .unwrap_or_else(|| base.selected_project_id.clone()),
            selected_filter_id: self
                .selected_filter_id
                .unwrap_or_else(|| base.selected_filter_id.clone()),
        }
    }
}

impl From<AppState> for PartialState {
    fn from(state: AppState) -> Self {
        PartialState {
            tasks: Some(state.tasks),
            projects: Some(state.projects),
            filters: Some(state.filters),
            selected_view: Some(state.selected_view),
            selected_project_id: Some(state.selected_project_id),
            selected_filter_id: Some(state.selected_filter_id),
        }
    }
}
