//! Persistence adapter: the whole `AppState` as one JSON blob under one key.
//!
//! Field names are camelCase and dates use the textual form from
//! [`crate::model::timestamp`], so a blob written by one session loads in
//! the next with dates equal to the millisecond.

use std::path::Path;

use chrono::Utc;
use log::{debug, info, warn};

use crate::io::kv::{KeyValueStore, KvError};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::state::{AppState, PartialState};
use crate::ops::store::Store;

/// Error type for persistence operations
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("could not encode state: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("could not parse saved state: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("storage error: {0}")]
    Storage(#[from] KvError),
}

/// What happened during hydration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Nothing saved under the key; built-in state kept
    Empty,
    /// Saved state merged into the store
    Loaded,
    /// Saved state was unusable and discarded; built-in state kept
    Discarded(String),
}

/// Encode the full state in its persisted textual form
pub fn encode_state(state: &AppState) -> Result<String, PersistError> {
    serde_json::to_string(state).map_err(PersistError::Encode)
}

/// Decode a persisted blob into a state fragment for `Store::load_state`.
///
/// A blob without `tasks` decodes to an empty task list. Other missing
/// fields, `projects` included, stay absent so the store keeps its current
/// values (the built-in Inbox at startup).
pub fn decode_state(text: &str) -> Result<PartialState, PersistError> {
    let mut partial: PartialState = serde_json::from_str(text).map_err(PersistError::Decode)?;
    if partial.tasks.is_none() {
        partial.tasks = Some(Vec::new());
    }
    Ok(partial)
}

/// Overwrite the stored blob with `state`
pub fn save(kv: &mut dyn KeyValueStore, key: &str, state: &AppState) -> Result<(), PersistError> {
    let text = encode_state(state)?;
    kv.set(key, &text)?;
    Ok(())
}

/// Restore saved state into `store`. Never fails: unreadable or malformed
/// data is logged, copied to the recovery log when `recovery_dir` is set,
/// and the store keeps its built-in state.
pub fn hydrate(
    kv: &dyn KeyValueStore,
    key: &str,
    store: &mut Store,
    recovery_dir: Option<&Path>,
) -> LoadOutcome {
    let text = match kv.get(key) {
        Ok(Some(text)) => text,
        Ok(None) => {
            info!("event=state_load module=persist status=empty key={}", key);
            return LoadOutcome::Empty;
        }
        Err(e) => {
            warn!(
                "event=state_load module=persist status=error key={} error={}",
                key, e
            );
            if let (KvError::NotText { lossy, .. }, Some(dir)) = (&e, recovery_dir) {
                record_discarded(dir, key, &e.to_string(), lossy);
            }
            return LoadOutcome::Discarded(e.to_string());
        }
    };

    match decode_state(&text) {
        Ok(partial) => {
            store.load_state(partial);
            info!(
                "event=state_load module=persist status=ok key={} tasks={} projects={}",
                key,
                store.tasks().len(),
                store.projects().len()
            );
            LoadOutcome::Loaded
        }
        Err(e) => {
            warn!(
                "event=state_load module=persist status=discarded key={} error={}",
                key, e
            );
            if let Some(dir) = recovery_dir {
                record_discarded(dir, key, &e.to_string(), &text);
            }
            LoadOutcome::Discarded(e.to_string())
        }
    }
}

/// Copy a discarded blob to the recovery log unless the newest entry for
/// `key` already holds it. The blob stays on disk until the next save, so
/// read-only runs would otherwise record it again each time.
fn record_discarded(dir: &Path, key: &str, error: &str, body: &str) {
    if recovery::already_recorded(dir, RecoveryCategory::Parser, key, body) {
        debug!(
            "event=recovery_log module=persist status=skipped key={} reason=already_recorded",
            key
        );
        return;
    }
    recovery::log_recovery(
        dir,
        RecoveryEntry {
            timestamp: Utc::now(),
            category: RecoveryCategory::Parser,
            description: "saved state discarded".to_string(),
            fields: vec![
                ("Key".to_string(), key.to_string()),
                ("Error".to_string(), error.to_string()),
            ],
            body: body.to_string(),
        },
    );
}
