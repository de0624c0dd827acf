//! Derived task lists for the selected view.
//!
//! Pure functions of state and "now"; recompute on every render instead of
//! caching. Calendar rules use the time zone of `now`, so callers pass local
//! time for wall-clock day semantics.

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc, Weekday};
use log::debug;
use serde::Serialize;

use crate::model::filter::{Filter, FilterQuery};
use crate::model::state::{AppState, ViewMode};
use crate::model::task::Task;

/// Tasks visible in the currently selected view, in insertion order
pub fn filtered_tasks<'a, Tz: TimeZone>(
    state: &'a AppState,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> Vec<&'a Task> {
    match state.selected_view {
        ViewMode::Today => select(state, |t| is_due_today(t, now)),
        ViewMode::Upcoming => select(state, |t| is_upcoming(t, now, week_start)),
        ViewMode::Project => match state.selected_project_id.as_deref() {
            Some(pid) => select(state, |t| t.project_id == pid),
            None => Vec::new(),
        },
        ViewMode::Label => match state.selected_filter_id.as_deref() {
            Some(label) => select(state, |t| t.has_label(label)),
            None => state.tasks.iter().collect(),
        },
        ViewMode::Filter => {
            let filter = state
                .selected_filter_id
                .as_deref()
                .and_then(|id| state.filter(id));
            match filter {
                Some(filter) => select(state, |t| filter_matches(filter, t, now, week_start)),
                None => state.tasks.iter().collect(),
            }
        }
    }
}

/// Split into (incomplete, completed), each keeping the input order
pub fn partition<'a>(tasks: Vec<&'a Task>) -> (Vec<&'a Task>, Vec<&'a Task>) {
    tasks.into_iter().partition(|t| !t.completed)
}

/// Live number of tasks matched by a saved filter
pub fn filter_count<Tz: TimeZone>(
    state: &AppState,
    filter: &Filter,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> usize {
    state
        .tasks
        .iter()
        .filter(|t| filter_matches(filter, t, now, week_start))
        .count()
}

/// Counts shown next to sidebar entries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SidebarCounts {
    pub today: usize,
    pub upcoming: usize,
    pub projects: Vec<ProjectCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectCount {
    pub id: String,
    pub name: String,
    /// Incomplete tasks only
    pub open: usize,
}

pub fn sidebar_counts<Tz: TimeZone>(
    state: &AppState,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> SidebarCounts {
    SidebarCounts {
        today: select(state, |t| is_due_today(t, now)).len(),
        upcoming: select(state, |t| is_upcoming(t, now, week_start)).len(),
        projects: state
            .projects
            .iter()
            .map(|p| ProjectCount {
                id: p.id.clone(),
                name: p.name.clone(),
                open: select(state, |t| t.project_id == p.id && !t.completed).len(),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

fn select<'a>(state: &'a AppState, pred: impl Fn(&Task) -> bool) -> Vec<&'a Task> {
    state.tasks.iter().filter(|t| pred(t)).collect()
}

fn filter_matches<Tz: TimeZone>(
    filter: &Filter,
    task: &Task,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> bool {
    match filter.parsed_query() {
        Some(query) => query_matches(&query, task, now, week_start),
        None => {
            debug!(
                "event=filter_query module=view status=unparsed filter={} query={:?}",
                filter.id, filter.query
            );
            true
        }
    }
}

pub fn query_matches<Tz: TimeZone>(
    query: &FilterQuery,
    task: &Task,
    now: &DateTime<Tz>,
    week_start: Weekday,
) -> bool {
    match query {
        FilterQuery::All => true,
        FilterQuery::Today => is_due_today(task, now),
        FilterQuery::Upcoming => is_upcoming(task, now, week_start),
        FilterQuery::Completed => task.completed,
        FilterQuery::Priority(p) => task.priority == *p,
        FilterQuery::Label(label) => task.has_label(label),
        FilterQuery::Project(pid) => task.project_id == *pid,
    }
}

/// Incomplete and due on the same calendar day as `now`
fn is_due_today<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> bool {
    !task.completed && due_day(task, now) == Some(now.date_naive())
}

/// Incomplete and due tomorrow or anywhere in the current week
fn is_upcoming<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>, week_start: Weekday) -> bool {
    if task.completed {
        return false;
    }
    let Some(day) = due_day(task, now) else {
        return false;
    };
    let today = now.date_naive();
    today.succ_opt() == Some(day) || same_week(day, today, week_start)
}

fn due_day<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<NaiveDate> {
    task.due_date
        .map(|due: DateTime<Utc>| due.with_timezone(&now.timezone()).date_naive())
}

/// First day of the week containing `day`
pub fn week_start_of(day: NaiveDate, week_start: Weekday) -> NaiveDate {
    let offset = (7 + day.weekday().num_days_from_monday() - week_start.num_days_from_monday()) % 7;
    day - Duration::days(i64::from(offset))
}

fn same_week(a: NaiveDate, b: NaiveDate, week_start: Weekday) -> bool {
    week_start_of(a, week_start) == week_start_of(b, week_start)
}
