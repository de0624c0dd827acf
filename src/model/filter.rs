use serde::{Deserialize, Serialize};

use super::task::Priority;

/// A saved filter shown in the sidebar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Filter {
    pub id: String,
    pub name: String,
    pub icon: String,
    /// Query tag, see [`FilterQuery`]
    pub query: String,
    /// Match count as last persisted
    #[serde(default)]
    pub count: usize,
}

impl Filter {
    pub fn new(id: &str, name: &str, icon: &str, query: &str) -> Self {
        Filter {
            id: id.to_string(),
            name: name.to_string(),
            icon: icon.to_string(),
            query: query.to_string(),
            count: 0,
        }
    }

    /// The filters every installation starts with
    pub fn builtin() -> Vec<Filter> {
        vec![
            Filter::new("today", "Today", "Calendar", "today"),
            Filter::new("upcoming", "Upcoming", "CalendarDays", "upcoming"),
        ]
    }

    pub fn parsed_query(&self) -> Option<FilterQuery> {
        FilterQuery::parse(&self.query)
    }
}

/// Parsed form of a filter's query tag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterQuery {
    /// Every task
    All,
    /// Same rule as the Today view
    Today,
    /// Same rule as the Upcoming view
    Upcoming,
    /// Completed tasks
    Completed,
    /// `priority:<low|medium|high>`
    Priority(Priority),
    /// `label:<name>`
    Label(String),
    /// `project:<id>`
    Project(String),
}

impl FilterQuery {
    /// Parse a query tag. Returns `None` for anything unrecognised.
    pub fn parse(query: &str) -> Option<FilterQuery> {
        let query = query.trim();
        match query {
            "" | "all" => return Some(FilterQuery::All),
            "today" => return Some(FilterQuery::Today),
            "upcoming" => return Some(FilterQuery::Upcoming),
            "completed" => return Some(FilterQuery::Completed),
            _ => {}
        }
        let (key, value) = query.split_once(':')?;
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        match key.trim() {
            "priority" => Priority::parse_priority(value).map(FilterQuery::Priority),
            "label" => Some(FilterQuery::Label(value.to_string())),
            "project" => Some(FilterQuery::Project(value.to_string())),
            _ => None,
        }
    }
}
