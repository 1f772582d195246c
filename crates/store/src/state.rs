//! Combined persisted state and its JSON file backing.
//!
//! The whole bot state lives in one document:
//! ```text
//! {
//!   "chatId": 123456789,
//!   "participants": [ { "id", "displayName", "position" }, ... ],
//!   "vacations": { "<ownerId>": [ { "id", "start", "end",
//!                                   "announcedStart", "announcedEnd" } ] },
//!   "lastWeeklyTrigger": "2024-06-03"
//! }
//! ```
//! Every mutating operation rewrites the full document before reporting
//! success. A document that fails to load falls back to the empty default.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use rota_core::{ChatId, RotaError};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::roster::RosterStore;
use crate::vacation::VacationStore;

/// The single persisted snapshot of roster, vacations, and scheduler state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StateDocument {
    /// Notification destination, set once by the activation command.
    pub chat_id: Option<ChatId>,
    pub participants: RosterStore,
    pub vacations: VacationStore,
    /// Calendar day the weekly hand-off last fired.
    pub last_weekly_trigger: Option<NaiveDate>,
}

/// JSON file persistence for [`StateDocument`].
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document, falling back to the empty default on any failure.
    pub fn load(&self) -> StateDocument {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no state file, starting empty");
                return StateDocument::default();
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read state file, starting empty");
                return StateDocument::default();
            }
        };
        match serde_json::from_str(&json) {
            Ok(doc) => doc,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to parse state file, starting empty");
                StateDocument::default()
            }
        }
    }

    /// Rewrite the full document. The triggering operation must not report
    /// success unless this returns `Ok`.
    pub fn save(&self, doc: &StateDocument) -> Result<(), RotaError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(doc)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
