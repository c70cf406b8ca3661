//! Next-task recommendation.
//!
//! Picks a not-done task and makes it current. Priority tasks are a hard
//! override: when any unfinished priority task exists, the pool narrows to
//! those regardless of style. The style is a soft category-affinity filter
//! relative to the current task, and falls back to the whole pool when it
//! would leave nothing, so a recommendation is always produced when any
//! eligible task exists.
//!
//! The random source is injected so tests can assert exact selections with
//! a seeded rng.

use std::fmt;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::task::{Record, Task};

/// Category-affinity style for recommendations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Stay in the current task's category.
    Type,
    /// Switch to a different category.
    Dispersed,
}

impl Style {
    /// Serialize to a short label.
    pub fn as_label(&self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Dispersed => "dispersed",
        }
    }

    /// Parse from label (case-insensitive).
    pub fn from_label(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "type" => Some(Self::Type),
            "dispersed" => Some(Self::Dispersed),
            _ => None,
        }
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_label())
    }
}

/// Choose a not-done task, make it current, and return a copy of it.
///
/// Returns `None` (leaving the pointer untouched) when every task is done
/// or the record is empty.
pub fn recommend(record: &mut Record, style: Style, rng: &mut impl Rng) -> Option<Task> {
    let ref_category = record.current_task().map(|t| t.category.clone());

    let eligible: Vec<usize> = record
        .tasks
        .iter()
        .enumerate()
        .filter(|(_, t)| !t.done)
        .map(|(i, _)| i)
        .collect();

    let prioritized: Vec<usize> = eligible
        .iter()
        .copied()
        .filter(|&i| record.tasks[i].priority)
        .collect();
    let pool = if prioritized.is_empty() {
        eligible
    } else {
        prioritized
    };

    // The style filter only applies when there is a current task to compare
    // against and an actual choice to steer.
    let pool = match &ref_category {
        Some(cat) if pool.len() > 1 => {
            let filtered: Vec<usize> = pool
                .iter()
                .copied()
                .filter(|&i| match style {
                    Style::Type => record.tasks[i].category == *cat,
                    Style::Dispersed => record.tasks[i].category != *cat,
                })
                .collect();
            if filtered.is_empty() { pool } else { filtered }
        }
        _ => pool,
    };

    let &chosen = pool.choose(rng)?;
    record.current = record.tasks[chosen].created_at.clone();
    Some(record.tasks[chosen].clone())
}
