//! Argument resolution: ID prefixes, names, priorities, views and dates.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

use crate::model::state::{AppState, ViewMode};
use crate::model::task::Priority;

/// Error type for command-line arguments that cannot be resolved
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CliError {
    #[error("no {kind} matches '{query}'")]
    NoMatch { kind: &'static str, query: String },
    #[error("'{query}' is ambiguous: {count} {kind}s match")]
    Ambiguous {
        kind: &'static str,
        query: String,
        count: usize,
    },
    #[error("title cannot be empty")]
    EmptyTitle,
    #[error("invalid priority '{0}' (expected low, medium or high)")]
    InvalidPriority(String),
    #[error("invalid view '{0}' (expected today, upcoming, project, label or filter)")]
    InvalidView(String),
    #[error("invalid date '{0}' (expected YYYY-MM-DD, YYYY-MM-DDTHH:MM, today or tomorrow)")]
    InvalidDate(String),
    #[error("the project view needs --project")]
    MissingProject,
    #[error("nothing to change")]
    NothingToChange,
}

/// Exact id, else the single id starting with `query`
fn resolve_prefix<'a>(
    kind: &'static str,
    query: &str,
    ids: impl IntoIterator<Item = &'a str>,
) -> Result<String, CliError> {
    let no_match = || CliError::NoMatch {
        kind,
        query: query.to_string(),
    };
    if query.is_empty() {
        return Err(no_match());
    }
    let mut matches = Vec::new();
    for id in ids {
        if id == query {
            return Ok(id.to_string());
        }
        if id.starts_with(query) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [] => Err(no_match()),
        [id] => Ok(id.to_string()),
        _ => Err(CliError::Ambiguous {
            kind,
            query: query.to_string(),
            count: matches.len(),
        }),
    }
}

pub fn resolve_task(state: &AppState, query: &str) -> Result<String, CliError> {
    resolve_prefix("task", query, state.tasks.iter().map(|t| t.id.as_str()))
}

/// Projects resolve by case-insensitive name first, then by id prefix
pub fn resolve_project(state: &AppState, query: &str) -> Result<String, CliError> {
    let by_name: Vec<&str> = state
        .projects
        .iter()
        .filter(|p| p.name.eq_ignore_ascii_case(query))
        .map(|p| p.id.as_str())
        .collect();
    if let [id] = by_name.as_slice() {
        return Ok(id.to_string());
    }
    resolve_prefix("project", query, state.projects.iter().map(|p| p.id.as_str()))
}

pub fn resolve_filter(state: &AppState, query: &str) -> Result<String, CliError> {
    resolve_prefix("filter", query, state.filters.iter().map(|f| f.id.as_str()))
}

pub fn parse_priority_arg(s: &str) -> Result<Priority, CliError> {
    Priority::parse_priority(s).ok_or_else(|| CliError::InvalidPriority(s.to_string()))
}

pub fn parse_view_arg(s: &str) -> Result<ViewMode, CliError> {
    ViewMode::parse_view(s).ok_or_else(|| CliError::InvalidView(s.to_string()))
}

pub fn non_empty_title(title: &str) -> Result<String, CliError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyTitle)
    } else {
        Ok(trimmed.to_string())
    }
}

/// Parse a due date in the time zone of `now`. Bare dates mean midnight.
pub fn parse_due<Tz: TimeZone>(s: &str, now: &DateTime<Tz>) -> Result<DateTime<Utc>, CliError> {
    let invalid = || CliError::InvalidDate(s.to_string());
    let input = s.trim();
    let today = now.date_naive();

    let local = match input.to_ascii_lowercase().as_str() {
        "today" => today.and_time(NaiveTime::MIN),
        "tomorrow" => today
            .checked_add_days(Days::new(1))
            .ok_or_else(invalid)?
            .and_time(NaiveTime::MIN),
        _ => {
            if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
                date.and_time(NaiveTime::MIN)
            } else {
                NaiveDateTime::parse_from_str(input, "%Y-%m-%dT%H:%M").map_err(|_| invalid())?
            }
        }
    };

    first_valid_instant(&now.timezone(), local)
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(invalid)
}

/// The earliest instant at or after `local` that exists in `tz`. A local
/// time skipped by a forward clock change resolves to the end of the gap.
fn first_valid_instant<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Option<DateTime<Tz>> {
    (0..=24 * 60).find_map(|minutes| {
        let candidate = local.checked_add_signed(Duration::minutes(minutes))?;
        tz.from_local_datetime(&candidate).earliest()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::Project;
    use crate::model::task::{NewTask, Task};
    use chrono::{FixedOffset, MappedLocalTime};
    use pretty_assertions::assert_eq;

    /// UTC-3 until 2026-11-01 00:00 local, when clocks jump to 01:00 (UTC-2)
    #[derive(Debug, Clone, Copy)]
    struct MidnightJump;

    impl MidnightJump {
        fn before() -> FixedOffset {
            FixedOffset::west_opt(3 * 3600).unwrap()
        }

        fn after() -> FixedOffset {
            FixedOffset::west_opt(2 * 3600).unwrap()
        }

        fn gap_start() -> NaiveDateTime {
            NaiveDate::from_ymd_opt(2026, 11, 1)
                .unwrap()
                .and_time(NaiveTime::MIN)
        }
    }

    impl TimeZone for MidnightJump {
        type Offset = FixedOffset;

        fn from_offset(_offset: &FixedOffset) -> Self {
            MidnightJump
        }

        fn offset_from_local_date(&self, local: &NaiveDate) -> MappedLocalTime<FixedOffset> {
            self.offset_from_local_datetime(&local.and_time(NaiveTime::MIN))
        }

        fn offset_from_local_datetime(
            &self,
            local: &NaiveDateTime,
        ) -> MappedLocalTime<FixedOffset> {
            let gap_start = Self::gap_start();
            if *local < gap_start {
                MappedLocalTime::Single(Self::before())
            } else if *local < gap_start + Duration::hours(1) {
                MappedLocalTime::None
            } else {
                MappedLocalTime::Single(Self::after())
            }
        }

        fn offset_from_utc_date(&self, utc: &NaiveDate) -> FixedOffset {
            self.offset_from_utc_datetime(&utc.and_time(NaiveTime::MIN))
        }

        fn offset_from_utc_datetime(&self, utc: &NaiveDateTime) -> FixedOffset {
            if *utc < Self::gap_start() + Duration::hours(3) {
                Self::before()
            } else {
                Self::after()
            }
        }
    }

    fn state_with_tasks(ids: &[&str]) -> AppState {
        let now = Utc.with_ymd_and_hms(2026, 10, 16, 9, 0, 0).unwrap();
        let mut state = AppState::initial(now);
        for id in ids {
            state.tasks.push(Task::from_new(
                id.to_string(),
                NewTask::new("t", "inbox"),
                now,
            ));
        }
        state
    }

    #[test]
    fn prefixes_resolve_when_unique() {
        let state = state_with_tasks(&["abc123", "abd456", "ff00"]);
        assert_eq!(resolve_task(&state, "abc").unwrap(), "abc123");
        assert_eq!(resolve_task(&state, "f").unwrap(), "ff00");
        assert_eq!(
            resolve_task(&state, "ab"),
            Err(CliError::Ambiguous {
                kind: "task",
                query: "ab".into(),
                count: 2
            })
        );
        assert!(matches!(
            resolve_task(&state, "zz"),
            Err(CliError::NoMatch { .. })
        ));
        assert!(matches!(
            resolve_task(&state, ""),
            Err(CliError::NoMatch { .. })
        ));
    }

    #[test]
    fn exact_id_wins_over_longer_ids() {
        let state = state_with_tasks(&["ab", "abc"]);
        assert_eq!(resolve_task(&state, "ab").unwrap(), "ab");
    }

    #[test]
    fn projects_resolve_by_name() {
        let mut state = state_with_tasks(&[]);
        let now = Utc::now();
        state.projects.push(Project::from_new(
            "7f3e0000".into(),
            crate::model::project::NewProject::new("Work", "#000000"),
            now,
        ));
        assert_eq!(resolve_project(&state, "work").unwrap(), "7f3e0000");
        assert_eq!(resolve_project(&state, "INBOX").unwrap(), "inbox");
        assert_eq!(resolve_project(&state, "7f").unwrap(), "7f3e0000");
    }

    #[test]
    fn titles_are_trimmed_and_must_not_be_blank() {
        assert_eq!(non_empty_title("  Buy milk ").unwrap(), "Buy milk");
        assert_eq!(non_empty_title("   "), Err(CliError::EmptyTitle));
    }

    #[test]
    fn due_dates_use_the_local_zone() {
        let tz = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = tz.with_ymd_and_hms(2026, 10, 16, 15, 0, 0).unwrap();

        let date = parse_due("2026-10-20", &now).unwrap();
        assert_eq!(date, Utc.with_ymd_and_hms(2026, 10, 19, 22, 0, 0).unwrap());

        let datetime = parse_due("2026-10-20T09:30", &now).unwrap();
        assert_eq!(datetime, Utc.with_ymd_and_hms(2026, 10, 20, 7, 30, 0).unwrap());

        let today = parse_due("today", &now).unwrap();
        assert_eq!(today, Utc.with_ymd_and_hms(2026, 10, 15, 22, 0, 0).unwrap());

        let tomorrow = parse_due("Tomorrow", &now).unwrap();
        assert_eq!(tomorrow, Utc.with_ymd_and_hms(2026, 10, 16, 22, 0, 0).unwrap());

        assert!(matches!(
            parse_due("next week", &now),
            Err(CliError::InvalidDate(_))
        ));
    }

    #[test]
    fn views_and_priorities() {
        assert_eq!(parse_view_arg("upcoming").unwrap(), ViewMode::Upcoming);
        assert!(parse_view_arg("someday").is_err());
        assert_eq!(parse_priority_arg("high").unwrap(), Priority::High);
        assert!(parse_priority_arg("urgent").is_err());
    }

    #[test]
    fn due_date_in_a_skipped_midnight_moves_to_end_of_gap() {
        // Saturday 2026-10-31 12:00 local, the day before the jump
        let now = MidnightJump.from_utc_datetime(
            &NaiveDate::from_ymd_opt(2026, 10, 31)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
        );
        let end_of_gap = Utc.with_ymd_and_hms(2026, 11, 1, 3, 0, 0).unwrap();

        assert_eq!(parse_due("tomorrow", &now), Ok(end_of_gap));
        assert_eq!(parse_due("2026-11-01", &now), Ok(end_of_gap));
        assert_eq!(parse_due("2026-11-01T00:30", &now), Ok(end_of_gap));
        assert_eq!(
            parse_due("2026-11-02", &now),
            Ok(Utc.with_ymd_and_hms(2026, 11, 2, 2, 0, 0).unwrap())
        );
        assert_eq!(
            parse_due("today", &now),
            Ok(Utc.with_ymd_and_hms(2026, 10, 31, 3, 0, 0).unwrap())
        );
    }
}
