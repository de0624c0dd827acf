use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::timestamp;

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }

    /// Parse a priority name (case-insensitive)
    pub fn parse_priority(s: &str) -> Option<Priority> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Priority::Low),
            "medium" => Some(Priority::Medium),
            "high" => Some(Priority::High),
            _ => None,
        }
    }
}

/// A task as held in application state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub completed: bool,
    /// Owning project (`Project::id`)
    pub project_id: String,
    pub priority: Priority,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "timestamp::option"
    )]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
    /// Label names; duplicates are kept as given
    #[serde(default)]
    pub labels: Vec<String>,
}

impl Task {
    /// Build a task from caller input plus store-assigned identity and time
    pub fn from_new(id: String, new: NewTask, now: DateTime<Utc>) -> Self {
        Task {
            id,
            title: new.title,
            description: new.description,
            completed: new.completed,
            project_id: new.project_id,
            priority: new.priority,
            due_date: new.due_date,
            created_at: now,
            updated_at: now,
            labels: new.labels,
        }
    }

    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }
}

/// Caller-supplied fields for a new task (no id, no timestamps)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub project_id: String,
    pub priority: Priority,
    pub due_date: Option<DateTime<Utc>>,
    pub completed: bool,
    pub labels: Vec<String>,
}

impl NewTask {
    /// A new incomplete, low-priority task in the given project
    pub fn new(title: impl Into<String>, project_id: impl Into<String>) -> Self {
        NewTask {
            title: title.into(),
            description: None,
            project_id: project_id.into(),
            priority: Priority::default(),
            due_date: None,
            completed: false,
            labels: Vec::new(),
        }
    }

    pub fn priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    pub fn due(mut self, due: DateTime<Utc>) -> Self {
        self.due_date = Some(due);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }
}

/// Partial update for a task. `None` leaves a field unchanged; for the
/// optional fields `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub project_id: Option<String>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub labels: Option<Vec<String>>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        *self == TaskUpdate::default()
    }

    /// Merge the present fields into `task`. Timestamps are left to the caller.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
        if let Some(labels) = &self.labels {
            task.labels = labels.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> Task {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        Task::from_new(
            "t1".into(),
            NewTask::new("Write report", "inbox").label("work"),
            at,
        )
    }

    #[test]
    fn from_new_sets_both_timestamps() {
        let task = sample();
        assert_eq!(task.created_at, task.updated_at);
        assert!(!task.completed);
        assert_eq!(task.priority, Priority::Low);
        assert_eq!(task.labels, vec!["work"]);
    }

    #[test]
    fn update_merges_only_present_fields() {
        let mut task = sample();
        let update = TaskUpdate {
            title: Some("Write final report".into()),
            priority: Some(Priority::High),
            ..Default::default()
        };
        update.apply_to(&mut task);
        assert_eq!(task.title, "Write final report");
        assert_eq!(task.priority, Priority::High);
        assert_eq!(task.project_id, "inbox");
        assert_eq!(task.labels, vec!["work"]);
    }

    #[test]
    fn update_can_clear_optional_fields() {
        let mut task = sample();
        task.description = Some("draft".into());
        task.due_date = Some(task.created_at);
        let update = TaskUpdate {
            description: Some(None),
            due_date: Some(None),
            ..Default::default()
        };
        update.apply_to(&mut task);
        assert!(task.description.is_none());
        assert!(task.due_date.is_none());
    }

    #[test]
    fn parse_priority_is_case_insensitive() {
        assert_eq!(Priority::parse_priority("HIGH"), Some(Priority::High));
        assert_eq!(Priority::parse_priority(" medium "), Some(Priority::Medium));
        assert_eq!(Priority::parse_priority("urgent"), None);
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let json = serde_json::to_value(sample()).unwrap();
        assert_eq!(json["projectId"], "inbox");
        assert_eq!(json["priority"], "low");
        assert_eq!(json["createdAt"], "2026-03-01T08:00:00.000Z");
        assert!(json.get("dueDate").is_none());
        assert!(json.get("description").is_none());
    }
}
