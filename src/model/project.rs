use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Id of the project every installation starts with
pub const INBOX_ID: &str = "inbox";

/// Default color token for new projects
pub const DEFAULT_COLOR: &str = "#3b82f6";

/// A project grouping tasks
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Opaque color token, e.g. `#3b82f6`
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    /// Number of live tasks referencing this project. Derived: the reducer
    /// recomputes it from the task collection.
    #[serde(default)]
    pub tasks_count: usize,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// The built-in Inbox project
    pub fn inbox(created_at: DateTime<Utc>) -> Self {
        Project {
            id: INBOX_ID.to_string(),
            name: "Inbox".to_string(),
            color: DEFAULT_COLOR.to_string(),
            icon: None,
            tasks_count: 0,
            created_at,
        }
    }

    pub fn from_new(id: String, new: NewProject, now: DateTime<Utc>) -> Self {
        Project {
            id,
            name: new.name,
            color: new.color,
            icon: new.icon,
            tasks_count: 0,
            created_at: now,
        }
    }

    pub fn is_inbox(&self) -> bool {
        self.id == INBOX_ID
    }
}

/// Caller-supplied fields for a new project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProject {
    pub name: String,
    pub color: String,
    pub icon: Option<String>,
}

impl NewProject {
    pub fn new(name: impl Into<String>, color: impl Into<String>) -> Self {
        NewProject {
            name: name.into(),
            color: color.into(),
            icon: None,
        }
    }
}

/// Partial update for a project. The task count is derived and not patchable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub color: Option<String>,
    pub icon: Option<Option<String>>,
}

impl ProjectUpdate {
    pub fn apply_to(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
        if let Some(icon) = &self.icon {
            project.icon = icon.clone();
        }
    }
}
