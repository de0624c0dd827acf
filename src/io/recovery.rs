use std::fmt;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{info, warn};
use tempfile::NamedTempFile;

/// Self-documenting header written at the top of a new recovery log.
const FILE_HEADER: &str = "\
<!-- itinerary recovery log: append-only
     Saved state that could not be loaded, and state that could not be
     written, ends up here so nothing is silently lost.
     View with: itin recovery
     Safe to delete once you have what you need. -->

---
";

/// Separator between timestamp and category in an entry header
const HEADER_SEP: &str = " - ";

/// Size past which the log is trimmed before the next append
const MAX_LOG_SIZE: u64 = 1_048_576;

// ---------------------------------------------------------------------------
// Data types
// ---------------------------------------------------------------------------

/// Category of a recovery entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryCategory {
    /// Saved state was discarded at load time
    Parser,
    /// State could not be written to storage
    Write,
}

impl fmt::Display for RecoveryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecoveryCategory::Parser => write!(f, "parser"),
            RecoveryCategory::Write => write!(f, "write"),
        }
    }
}

impl RecoveryCategory {
    pub fn parse_category(s: &str) -> Option<Self> {
        match s {
            "parser" => Some(RecoveryCategory::Parser),
            "write" => Some(RecoveryCategory::Write),
            _ => None,
        }
    }
}

/// A single entry in the recovery log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryEntry {
    pub timestamp: DateTime<Utc>,
    pub category: RecoveryCategory,
    pub description: String,
    pub fields: Vec<(String, String)>,
    pub body: String,
}

// ---------------------------------------------------------------------------
// Path helper
// ---------------------------------------------------------------------------

/// Return the path to the recovery log file.
pub fn recovery_log_path(dir: &Path) -> PathBuf {
    dir.join(".recovery.log")
}

// ---------------------------------------------------------------------------
// Atomic file write
// ---------------------------------------------------------------------------

/// Write `content` to `path` atomically using a temp file + rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry formatting
// ---------------------------------------------------------------------------

impl RecoveryEntry {
    /// Format this entry as a markdown block for the recovery log.
    pub fn to_markdown(&self) -> String {
        let mut out = format!(
            "## {}{}{}: {}\n\n",
            self.timestamp
                .to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            HEADER_SEP,
            self.category,
            self.description,
        );

        for (key, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", key, value));
        }

        if !self.body.is_empty() {
            out.push('\n');
            out.push_str("```text\n");
            out.push_str(&self.body);
            if !self.body.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("```\n");
        }

        out.push('\n');
        out.push_str("---\n");
        out
    }

    /// Value of the first field named `name`
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Serialize to a JSON value for `itin recovery --json`.
    pub fn to_json(&self) -> serde_json::Value {
        let fields: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
            .collect();

        serde_json::json!({
            "timestamp": self.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            "category": self.category.to_string(),
            "description": self.description,
            "fields": fields,
            "body": self.body,
        })
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

/// Append a recovery entry to the log. Failures are logged, never returned.
pub fn log_recovery(dir: &Path, entry: RecoveryEntry) {
    if let Err(e) = append_entry(dir, &entry, MAX_LOG_SIZE) {
        warn!(
            "event=recovery_log module=recovery status=error category={} error={}",
            entry.category, e
        );
    }
}

/// Whether the newest `category` entry recorded for `key` already holds `body`
pub fn already_recorded(dir: &Path, category: RecoveryCategory, key: &str, body: &str) -> bool {
    read_recovery_entries(dir, None)
        .into_iter()
        .find(|e| e.category == category && e.field("Key") == Some(key))
        .is_some_and(|e| e.body.trim_end_matches('\n') == body.trim_end_matches('\n'))
}

fn append_entry(dir: &Path, entry: &RecoveryEntry, max_size: u64) -> io::Result<()> {
    std::fs::create_dir_all(dir)?;
    let path = recovery_log_path(dir);

    if let Ok(meta) = std::fs::metadata(&path)
        && meta.len() > max_size
    {
        if let Err(e) = trim_log(&path, max_size / 2) {
            warn!(
                "event=recovery_trim module=recovery status=error error={}",
                e
            );
        }
    }

    let needs_header = std::fs::metadata(&path).map_or(true, |m| m.len() == 0);

    let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
    if needs_header {
        file.write_all(FILE_HEADER.as_bytes())?;
    }
    file.write_all(entry.to_markdown().as_bytes())?;
    Ok(())
}

/// Rewrite the log keeping the newest entries that fit in `budget` bytes
fn trim_log(path: &Path, budget: u64) -> io::Result<()> {
    let content = std::fs::read_to_string(path)?;
    let entries = parse_entries(&content);

    let mut kept = Vec::new();
    let mut size = FILE_HEADER.len() as u64;
    for entry in entries.iter().rev() {
        let markdown = entry.to_markdown();
        size += markdown.len() as u64;
        if size > budget {
            break;
        }
        kept.push(markdown);
    }
    kept.reverse();

    let mut out = String::from(FILE_HEADER);
    for markdown in &kept {
        out.push_str(markdown);
    }
    atomic_write(path, out.as_bytes())?;
    info!(
        "event=recovery_trim module=recovery status=ok kept={} dropped={}",
        kept.len(),
        entries.len() - kept.len()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Reading entries
// ---------------------------------------------------------------------------

/// Read recovery entries, most recent first.
pub fn read_recovery_entries(dir: &Path, limit: Option<usize>) -> Vec<RecoveryEntry> {
    let content = match std::fs::read_to_string(recovery_log_path(dir)) {
        Ok(c) => c,
        Err(_) => return Vec::new(),
    };

    let mut entries = parse_entries(&content);
    if let Some(n) = limit {
        let skip = entries.len().saturating_sub(n);
        entries = entries.into_iter().skip(skip).collect();
    }
    entries.reverse();
    entries
}

/// Parse all entries from the log content string, oldest first.
fn parse_entries(content: &str) -> Vec<RecoveryEntry> {
    let mut entries = Vec::new();
    let mut lines = content.lines();

    while let Some(line) = lines.next() {
        let Some(header) = line.strip_prefix("## ") else {
            continue;
        };
        let Some((timestamp, category, description)) = parse_entry_header(header) else {
            continue;
        };

        let mut fields = Vec::new();
        let mut body = String::new();
        let mut in_code_block = false;

        for line in lines.by_ref() {
            if in_code_block {
                if line == "```" {
                    in_code_block = false;
                } else {
                    if !body.is_empty() {
                        body.push('\n');
                    }
                    body.push_str(line);
                }
                continue;
            }

            if line == "---" {
                break;
            }
            if line.starts_with("```") {
                in_code_block = true;
                continue;
            }

            if let Some((key, value)) = line.trim().split_once(": ") {
                fields.push((key.to_string(), value.to_string()));
            }
        }

        entries.push(RecoveryEntry {
            timestamp,
            category,
            description,
            fields,
            body,
        });
    }

    entries
}

/// Parse an entry header: `<timestamp> - <category>: <description>`
fn parse_entry_header(header: &str) -> Option<(DateTime<Utc>, RecoveryCategory, String)> {
    let (timestamp_str, rest) = header.split_once(HEADER_SEP)?;
    let timestamp = DateTime::parse_from_rfc3339(timestamp_str)
        .ok()?
        .with_timezone(&Utc);
    let (category_str, description) = rest.split_once(": ")?;
    let category = RecoveryCategory::parse_category(category_str)?;
    Some((timestamp, category, description.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn entry(desc: &str, body: &str) -> RecoveryEntry {
        RecoveryEntry {
            timestamp: Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap(),
            category: RecoveryCategory::Parser,
            description: desc.to_string(),
            fields: vec![("Key".to_string(), "itinerary-data".to_string())],
            body: body.to_string(),
        }
    }

    #[test]
    fn atomic_write_replaces_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        atomic_write(&path, b"first").unwrap();
        atomic_write(&path, b"second").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[test]
    fn log_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        log_recovery(dir.path(), entry("saved state discarded", "{\"tasks\": ["));
        let mut second = entry("state not written", "{}\n");
        second.category = RecoveryCategory::Write;
        log_recovery(dir.path(), second);

        let entries = read_recovery_entries(dir.path(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].category, RecoveryCategory::Write);
        assert_eq!(entries[0].body, "{}");
        assert_eq!(entries[1].description, "saved state discarded");
        assert_eq!(entries[1].body, "{\"tasks\": [");
        assert_eq!(
            entries[1].fields,
            vec![("Key".to_string(), "itinerary-data".to_string())]
        );

        let content = std::fs::read_to_string(recovery_log_path(dir.path())).unwrap();
        assert!(content.starts_with("<!-- itinerary recovery log"));
        assert_eq!(content.matches("<!--").count(), 1);
    }

    #[test]
    fn read_limit_keeps_most_recent() {
        let dir = TempDir::new().unwrap();
        log_recovery(dir.path(), entry("one", ""));
        log_recovery(dir.path(), entry("two", ""));
        log_recovery(dir.path(), entry("three", ""));
        let entries = read_recovery_entries(dir.path(), Some(2));
        let names: Vec<&str> = entries.iter().map(|e| e.description.as_str()).collect();
        assert_eq!(names, vec!["three", "two"]);
    }

    #[test]
    fn missing_log_reads_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_recovery_entries(dir.path(), None).is_empty());
    }

    #[test]
    fn oversized_log_keeps_newest_entries() {
        let dir = TempDir::new().unwrap();
        let big = "x".repeat(400);
        for i in 0..10 {
            append_entry(dir.path(), &entry(&format!("entry {i}"), &big), u64::MAX).unwrap();
        }
        let path = recovery_log_path(dir.path());
        let before = std::fs::metadata(&path).unwrap().len();

        append_entry(dir.path(), &entry("entry 10", &big), 2_000).unwrap();
        let after = std::fs::metadata(&path).unwrap().len();
        assert!(after < before);

        let entries = read_recovery_entries(dir.path(), None);
        assert!(entries.len() < 11);
        assert_eq!(entries[0].description, "entry 10");
        assert_eq!(entries[1].description, "entry 9");
        assert_eq!(entries[0].body, big);

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("<!-- itinerary recovery log"));
        assert_eq!(content.matches("<!--").count(), 1);
    }

    #[test]
    fn already_recorded_checks_newest_matching_entry() {
        let dir = TempDir::new().unwrap();
        assert!(!already_recorded(dir.path(), RecoveryCategory::Parser, "itinerary-data", "{bad"));

        log_recovery(dir.path(), entry("discarded", "{bad\n"));
        assert!(already_recorded(dir.path(), RecoveryCategory::Parser, "itinerary-data", "{bad\n"));
        assert!(!already_recorded(dir.path(), RecoveryCategory::Parser, "other-key", "{bad"));
        assert!(!already_recorded(dir.path(), RecoveryCategory::Write, "itinerary-data", "{bad"));

        log_recovery(dir.path(), entry("discarded", "{worse"));
        assert!(!already_recorded(dir.path(), RecoveryCategory::Parser, "itinerary-data", "{bad"));
    }

    #[test]
    fn to_json_shape() {
        let json = entry("x", "body").to_json();
        assert_eq!(json["category"], "parser");
        assert_eq!(json["fields"]["Key"], "itinerary-data");
        assert_eq!(json["timestamp"], "2026-05-01T12:00:00Z");
    }
}
