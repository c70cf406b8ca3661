//! Task db codec and storage boundary.
//!
//! The persisted form is a single JSON object mapping username to record,
//! pretty-printed so it stays hand-editable. Loading fails soft: an absent
//! or unparsable file yields an empty db, so the tool always has a valid
//! in-memory state to operate on. Saving rewrites the whole file; write
//! failures surface.
//!
//! Older db files may map a username directly to a bare task array instead
//! of a record object. That shape is normalized on load (wrapped into a
//! record with an empty current pointer); the normalization is idempotent.

use std::collections::BTreeMap;
use std::path::Path;

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::task::{Record, Task};

/// Errors from the store codec and file boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum StoreError {
    #[error("failed to parse task db: {message}")]
    #[diagnostic(
        code(donext::store::parse),
        help(
            "The db file is not valid JSON for the expected layout. \
             Fix it by hand or move it aside to start fresh."
        )
    )]
    Parse { message: String },

    #[error("failed to serialize task db: {message}")]
    #[diagnostic(
        code(donext::store::serialize),
        help("This indicates a bug in the task model rather than bad input.")
    )]
    Serialize { message: String },

    #[error("failed to write task db: {path}")]
    #[diagnostic(
        code(donext::store::write),
        help(
            "Check that the parent directory exists, you have write \
             permissions, and the disk is not full."
        )
    )]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// A record as it may appear on disk: the current object shape, or the
/// legacy bare task array.
#[derive(Deserialize)]
#[serde(untagged)]
enum RecordShape {
    Modern(Record),
    Legacy(Vec<Task>),
}

impl From<RecordShape> for Record {
    fn from(shape: RecordShape) -> Self {
        match shape {
            RecordShape::Modern(record) => record,
            RecordShape::Legacy(tasks) => Record {
                tasks,
                current: String::new(),
            },
        }
    }
}

/// In-memory task db: username to record, serialized as a plain JSON map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct TaskDb {
    users: BTreeMap<String, Record>,
}

impl TaskDb {
    /// Decode a db from its JSON text, normalizing legacy-shaped users.
    pub fn from_json(input: &str) -> StoreResult<Self> {
        let raw: BTreeMap<String, RecordShape> =
            serde_json::from_str(input).map_err(|e| StoreError::Parse {
                message: e.to_string(),
            })?;
        Ok(Self {
            users: raw.into_iter().map(|(k, v)| (k, v.into())).collect(),
        })
    }

    /// Encode the db as pretty-printed JSON.
    pub fn to_json_pretty(&self) -> StoreResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialize {
            message: e.to_string(),
        })
    }

    /// Load the db from `path`, treating an absent or broken file as empty.
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "task db unreadable, starting empty");
                return Self::default();
            }
        };
        match Self::from_json(&content) {
            Ok(db) => db,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "task db unparsable, starting empty");
                Self::default()
            }
        }
    }

    /// Persist the full db to `path`, creating parent directories as needed.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let json = self.to_json_pretty()?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                    path: parent.display().to_string(),
                    source: e,
                })?;
            }
        }
        std::fs::write(path, json).map_err(|e| StoreError::Write {
            path: path.display().to_string(),
            source: e,
        })?;
        tracing::debug!(path = %path.display(), users = self.users.len(), "task db saved");
        Ok(())
    }

    /// The user's record, created empty on first touch.
    pub fn ensure_record(&mut self, user: &str) -> &mut Record {
        self.users.entry(user.to_string()).or_default()
    }

    /// Read-only lookup; does not create a record.
    pub fn record(&self, user: &str) -> Option<&Record> {
        self.users.get(user)
    }
}
