use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;

use crate::model::filter::Filter;
use crate::model::project::Project;
use crate::model::state::{AppState, ViewMode};
use crate::model::task::{Priority, Task};

/// Length of the id prefix shown in listings
pub const SHORT_ID_LEN: usize = 8;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct ViewJson<'a> {
    pub view: ViewMode,
    pub title: String,
    pub description: String,
    pub tasks: Vec<&'a Task>,
    pub completed: Vec<&'a Task>,
}

#[derive(Serialize)]
pub struct ProjectJson<'a> {
    #[serde(flatten)]
    pub project: &'a Project,
    pub open: usize,
}

#[derive(Serialize)]
pub struct FilterJson<'a> {
    #[serde(flatten)]
    pub filter: &'a Filter,
    pub matches: usize,
}

// ---------------------------------------------------------------------------
// View headings
// ---------------------------------------------------------------------------

/// Heading for the selected view
pub fn view_title(state: &AppState) -> String {
    match state.selected_view {
        ViewMode::Today => "Today".to_string(),
        ViewMode::Upcoming => "Upcoming".to_string(),
        ViewMode::Project => state
            .selected_project_id
            .as_deref()
            .and_then(|id| state.project(id))
            .map(|p| p.name.clone())
            .unwrap_or_else(|| "Unknown Project".to_string()),
        ViewMode::Label => match state.selected_filter_id.as_deref() {
            Some(label) => format!("#{}", label),
            None => "Tasks".to_string(),
        },
        ViewMode::Filter => state
            .selected_filter_id
            .as_deref()
            .and_then(|id| state.filter(id))
            .map(|f| f.name.clone())
            .unwrap_or_else(|| "Tasks".to_string()),
    }
}

/// Sub-heading: today's date, the upcoming window, or a task count
pub fn view_description<Tz: TimeZone>(
    state: &AppState,
    now: &DateTime<Tz>,
    task_count: usize,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    match state.selected_view {
        ViewMode::Today => now.format("%A, %B %-d").to_string(),
        ViewMode::Upcoming => "Next 7 days".to_string(),
        ViewMode::Project => plural(task_count, "task"),
        ViewMode::Label | ViewMode::Filter => String::new(),
    }
}

/// "Today", "Tomorrow", or a short date like "Oct 16"
pub fn due_label<Tz: TimeZone>(due: &DateTime<Utc>, now: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let due = due.with_timezone(&now.timezone());
    let today = now.date_naive();
    if due.date_naive() == today {
        "Today".to_string()
    } else if today.succ_opt() == Some(due.date_naive()) {
        "Tomorrow".to_string()
    } else {
        due.format("%b %-d").to_string()
    }
}

fn plural(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", n, noun)
    }
}

// ---------------------------------------------------------------------------
// Task lines
// ---------------------------------------------------------------------------

pub fn short_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}

fn priority_marker(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "",
        Priority::Medium => " !",
        Priority::High => " !!",
    }
}

/// One-line rendering: `[x] 1a2b3c4d Title !! (Today) #label @Project`
pub fn format_task_line(task: &Task, state: &AppState, now: &DateTime<Local>) -> String {
    let mut line = format!(
        "[{}] {} {}{}",
        if task.completed { 'x' } else { ' ' },
        short_id(&task.id),
        task.title,
        priority_marker(task.priority),
    );
    if let Some(due) = &task.due_date {
        line.push_str(&format!(" ({})", due_label(due, now)));
    }
    for label in &task.labels {
        line.push_str(&format!(" #{}", label));
    }
    if state.selected_view != ViewMode::Project {
        if let Some(project) = state.project(&task.project_id) {
            line.push_str(&format!(" @{}", project.name));
        }
    }
    line
}

/// Full listing for a view: heading, open tasks, then the completed group
pub fn format_view_listing(
    state: &AppState,
    open: &[&Task],
    completed: &[&Task],
    now: &DateTime<Local>,
) -> Vec<String> {
    let mut lines = Vec::new();
    lines.push(format!("== {} ==", view_title(state)));
    let description = view_description(state, now, open.len() + completed.len());
    if !description.is_empty() {
        lines.push(description);
    }

    if open.is_empty() && completed.is_empty() {
        lines.push(String::new());
        lines.push("No tasks yet".to_string());
        return lines;
    }

    for task in open {
        lines.push(format_task_line(task, state, now));
    }
    if !completed.is_empty() {
        lines.push(String::new());
        lines.push(format!("Completed ({})", completed.len()));
        for task in completed {
            lines.push(format_task_line(task, state, now));
        }
    }
    lines
}

/// Full detail for one task
pub fn format_task_detail(task: &Task, state: &AppState, now: &DateTime<Local>) -> Vec<String> {
    let mut lines = vec![format!(
        "[{}] {}",
        if task.completed { 'x' } else { ' ' },
        task.title
    )];
    lines.push(format!("id: {}", task.id));
    let project = state
        .project(&task.project_id)
        .map(|p| p.name.as_str())
        .unwrap_or("?");
    lines.push(format!("project: {}", project));
    lines.push(format!("priority: {}", task.priority.as_str()));
    if let Some(due) = &task.due_date {
        lines.push(format!(
            "due: {} ({})",
            due.with_timezone(now.offset()).format("%Y-%m-%d %H:%M"),
            due_label(due, now)
        ));
    }
    if !task.labels.is_empty() {
        lines.push(format!("labels: {}", task.labels.join(", ")));
    }
    if let Some(description) = &task.description {
        lines.push("description:".to_string());
        for line in description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    lines
}

pub fn format_project_line(project: &Project, open: usize) -> String {
    let mut line = format!("{} {} ({})", short_id(&project.id), project.name, open);
    line.push_str(&format!(" {}", project.color));
    if let Some(icon) = &project.icon {
        line.push_str(&format!(" [{}]", icon));
    }
    line
}

pub fn format_filter_line(filter: &Filter, matches: usize) -> String {
    format!("{} {} ({}) query={}", filter.id, filter.name, matches, filter.query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::task::NewTask;
    use chrono::FixedOffset;

    fn now() -> DateTime<FixedOffset> {
        FixedOffset::west_opt(5 * 3600)
            .unwrap()
            .with_ymd_and_hms(2026, 10, 16, 20, 0, 0)
            .unwrap()
    }

    #[test]
    fn due_labels() {
        let now = now();
        // 01:00 UTC on the 17th is still the 16th at UTC-5
        let tonight = Utc.with_ymd_and_hms(2026, 10, 17, 1, 0, 0).unwrap();
        assert_eq!(due_label(&tonight, &now), "Today");
        let tomorrow = Utc.with_ymd_and_hms(2026, 10, 17, 15, 0, 0).unwrap();
        assert_eq!(due_label(&tomorrow, &now), "Tomorrow");
        let later = Utc.with_ymd_and_hms(2026, 11, 3, 15, 0, 0).unwrap();
        assert_eq!(due_label(&later, &now), "Nov 3");
    }

    #[test]
    fn titles_and_descriptions() {
        let mut state = AppState::initial(Utc::now());
        assert_eq!(view_title(&state), "Today");
        assert_eq!(view_description(&state, &now(), 0), "Friday, October 16");

        state.selected_view = ViewMode::Upcoming;
        assert_eq!(view_description(&state, &now(), 0), "Next 7 days");

        state.selected_view = ViewMode::Project;
        state.selected_project_id = Some("inbox".into());
        assert_eq!(view_title(&state), "Inbox");
        assert_eq!(view_description(&state, &now(), 1), "1 task");
        assert_eq!(view_description(&state, &now(), 3), "3 tasks");

        state.selected_project_id = Some("gone".into());
        assert_eq!(view_title(&state), "Unknown Project");

        state.selected_view = ViewMode::Filter;
        state.selected_filter_id = Some("upcoming".into());
        assert_eq!(view_title(&state), "Upcoming");
    }

    #[test]
    fn task_line_shows_marks() {
        let state = AppState::initial(Utc::now());
        let mut task = Task::from_new(
            "0123456789abcdef".into(),
            NewTask::new("Pay rent", "inbox")
                .priority(Priority::High)
                .label("money"),
            Utc::now(),
        );
        task.completed = true;
        let line = format_task_line(&task, &state, &Local::now());
        assert_eq!(line, "[x] 01234567 Pay rent !! #money @Inbox");
    }
}
