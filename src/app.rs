//! Application session: the store plus its persistence.
//!
//! `Itinerary` is built once at startup, hydrates from storage, and mirrors
//! the state back to storage after every operation. A failed write never
//! loses in-memory state: it is logged, the unsaved blob goes to the
//! recovery log, and the error is kept for the caller to report.

use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{error, info};

use crate::io::config_io::{self, ConfigError};
use crate::io::kv::{FileStore, KeyValueStore};
use crate::io::persist::{self, LoadOutcome, PersistError};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::model::config::Config;
use crate::model::project::{NewProject, ProjectUpdate};
use crate::model::state::{AppState, ViewMode};
use crate::model::task::{NewTask, Task, TaskUpdate};
use crate::ops::clock::{Clock, SystemClock};
use crate::ops::store::Store;

pub struct Itinerary<K: KeyValueStore> {
    store: Store,
    kv: K,
    key: String,
    recovery_dir: Option<PathBuf>,
    load_outcome: LoadOutcome,
    last_save_error: Option<String>,
}

impl Itinerary<FileStore> {
    /// Open the file-backed session rooted at `data_dir`, reading
    /// `itinerary.toml` from it when present.
    pub fn open(data_dir: &Path) -> Result<Self, ConfigError> {
        let config = config_io::read_config(data_dir)?;
        Ok(Self::open_with(data_dir, &config))
    }

    /// Open the file-backed session with an already loaded config
    pub fn open_with(data_dir: &Path, config: &Config) -> Self {
        Self::new(
            FileStore::new(data_dir),
            Box::new(SystemClock),
            config,
            Some(data_dir.to_path_buf()),
        )
    }
}

impl<K: KeyValueStore> Itinerary<K> {
    /// Build a session over any key-value store and hydrate it
    pub fn new(kv: K, clock: Box<dyn Clock>, config: &Config, recovery_dir: Option<PathBuf>) -> Self {
        let mut store = Store::new(clock).with_week_start(config.calendar.week_start.weekday());
        let key = config.storage.key.clone();
        let load_outcome = persist::hydrate(&kv, &key, &mut store, recovery_dir.as_deref());
        Itinerary {
            store,
            kv,
            key,
            recovery_dir,
            load_outcome,
            last_save_error: None,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn state(&self) -> &AppState {
        self.store.state()
    }

    pub fn kv(&self) -> &K {
        &self.kv
    }

    pub fn load_outcome(&self) -> &LoadOutcome {
        &self.load_outcome
    }

    /// The most recent storage write failure, cleared by the next good save
    pub fn last_save_error(&self) -> Option<&str> {
        self.last_save_error.as_deref()
    }

    pub fn filtered_tasks(&self) -> Vec<&Task> {
        self.store.filtered_tasks()
    }

    // -----------------------------------------------------------------------
    // Operations (forwarded to the store, then saved)
    // -----------------------------------------------------------------------

    pub fn add_task(&mut self, new: NewTask) -> String {
        let id = self.store.add_task(new);
        self.persist();
        id
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) {
        self.store.update_task(id, update);
        self.persist();
    }

    pub fn delete_task(&mut self, id: &str) {
        self.store.delete_task(id);
        self.persist();
    }

    pub fn toggle_task(&mut self, id: &str) {
        self.store.toggle_task(id);
        self.persist();
    }

    pub fn add_project(&mut self, new: NewProject) -> String {
        let id = self.store.add_project(new);
        self.persist();
        id
    }

    pub fn update_project(&mut self, id: &str, update: ProjectUpdate) {
        self.store.update_project(id, update);
        self.persist();
    }

    pub fn delete_project(&mut self, id: &str) {
        self.store.delete_project(id);
        self.persist();
    }

    pub fn set_selected_view(
        &mut self,
        view: ViewMode,
        project_id: Option<String>,
        filter_id: Option<String>,
    ) {
        self.store.set_selected_view(view, project_id, filter_id);
        self.persist();
    }

    /// Write the current state to storage
    pub fn save(&mut self) -> Result<(), PersistError> {
        persist::save(&mut self.kv, &self.key, self.store.state())
    }

    fn persist(&mut self) {
        match self.save() {
            Ok(()) => {
                self.last_save_error = None;
                info!("event=state_save module=app status=ok key={}", self.key);
            }
            Err(e) => {
                error!(
                    "event=state_save module=app status=error key={} error={}",
                    self.key, e
                );
                if let Some(dir) = &self.recovery_dir {
                    recovery::log_recovery(
                        dir,
                        RecoveryEntry {
                            timestamp: Utc::now(),
                            category: RecoveryCategory::Write,
                            description: "state write failed".to_string(),
                            fields: vec![
                                ("Key".to_string(), self.key.clone()),
                                ("Error".to_string(), e.to_string()),
                            ],
                            body: persist::encode_state(self.store.state()).unwrap_or_default(),
                        },
                    );
                }
                self.last_save_error = Some(e.to_string());
            }
        }
    }
}
