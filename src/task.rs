//! Task and record model.
//!
//! A `Record` is one user's full task state: an ordered task list plus a
//! "current task" pointer. The pointer stores the task's creation timestamp,
//! so it is a lookup-by-field, never an ownership reference. A pointer whose
//! task has been removed is stale and resolves to "no current task" at read
//! time; only explicit mutation clears it.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Timestamp format written to the task db: microsecond ISO-8601, UTC.
pub const CREATED_AT_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f";

/// A single task owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Display text.
    pub text: String,
    /// Creation instant. Doubles as the task's identity for the record's
    /// `current` pointer, so it must not be rewritten after creation.
    pub created_at: String,
    /// Completion flag.
    #[serde(default)]
    pub done: bool,
    /// Free-form category; empty means uncategorized.
    #[serde(default)]
    pub category: String,
    /// Preferred by the recommender regardless of style.
    #[serde(default)]
    pub priority: bool,
}

impl Task {
    /// Create a task stamped with the current UTC instant.
    pub fn new(text: impl Into<String>, category: impl Into<String>, priority: bool) -> Self {
        Self {
            text: text.into(),
            created_at: Utc::now().format(CREATED_AT_FORMAT).to_string(),
            done: false,
            category: category.into(),
            priority,
        }
    }

    /// Render as a numbered list line, e.g. `2. [x] (!) [home] Buy milk (added ...)`.
    pub fn display_line(&self, index: usize) -> String {
        let status = if self.done { "x" } else { " " };
        let bang = if self.priority { "(!) " } else { "" };
        let cat = if self.category.is_empty() {
            String::new()
        } else {
            format!("[{}] ", self.category)
        };
        format!(
            "{index}. [{status}] {bang}{cat}{} (added {})",
            self.text, self.created_at
        )
    }
}

/// One user's task state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Tasks in insertion order; display indices are 1-based positions here.
    #[serde(default)]
    pub tasks: Vec<Task>,
    /// `created_at` of the current task, or empty for none.
    #[serde(default)]
    pub current: String,
}

impl Record {
    /// Resolve the current-task pointer against the live task list.
    ///
    /// Returns `None` when the pointer is empty or stale (the referenced
    /// task was removed). Staleness is not repaired here.
    pub fn current_task(&self) -> Option<&Task> {
        if self.current.is_empty() {
            return None;
        }
        self.tasks.iter().find(|t| t.created_at == self.current)
    }
}
