//! Task operations: add, remove, complete, prioritize, list, and the
//! current-task pointer.
//!
//! Every operation validates fully before mutating, so a failed call leaves
//! the record exactly as it was. Tasks are addressed by their 1-based display
//! position, which is recomputed on every listing; removal shifts later
//! positions down, so callers re-list before addressing again. Persistence
//! is the caller's job: load the db, apply operations, save.

use miette::Diagnostic;
use thiserror::Error;

use crate::task::{Record, Task};

/// Errors from task operations.
#[derive(Debug, Error, Diagnostic)]
pub enum OpsError {
    #[error("task text must not be empty")]
    #[diagnostic(
        code(donext::ops::empty_text),
        help("Provide a non-empty task description, e.g. `donext add \"Buy milk\"`.")
    )]
    EmptyText,

    #[error("index {index} out of range 1..={len}")]
    #[diagnostic(
        code(donext::ops::index_out_of_range),
        help(
            "Task indices are 1-based display positions and shift after a \
             removal. Run `list` to see the current indices."
        )
    )]
    IndexOutOfRange { index: usize, len: usize },
}

pub type OpsResult<T> = std::result::Result<T, OpsError>;

/// Map a 1-based display index to a vec position, bounds-checked.
fn check_index(record: &Record, index: usize) -> OpsResult<usize> {
    if index < 1 || index > record.tasks.len() {
        return Err(OpsError::IndexOutOfRange {
            index,
            len: record.tasks.len(),
        });
    }
    Ok(index - 1)
}

/// Append a new task stamped with the current UTC instant.
pub fn add<'a>(
    record: &'a mut Record,
    text: &str,
    category: &str,
    priority: bool,
) -> OpsResult<&'a Task> {
    let text = text.trim();
    if text.is_empty() {
        return Err(OpsError::EmptyText);
    }
    record.tasks.push(Task::new(text, category, priority));
    Ok(&record.tasks[record.tasks.len() - 1])
}

/// Delete the task at `index`, returning it.
///
/// Clears the current-task pointer when it referenced the removed task.
pub fn remove(record: &mut Record, index: usize) -> OpsResult<Task> {
    let i = check_index(record, index)?;
    let removed = record.tasks.remove(i);
    if record.current == removed.created_at {
        record.current.clear();
    }
    Ok(removed)
}

/// Drop all tasks and the current-task pointer.
pub fn clear(record: &mut Record) {
    record.tasks.clear();
    record.current.clear();
}

/// Mark the task at `index` done. Idempotent.
pub fn mark_done(record: &mut Record, index: usize) -> OpsResult<&Task> {
    let i = check_index(record, index)?;
    record.tasks[i].done = true;
    Ok(&record.tasks[i])
}

/// Flag the task at `index` for the recommender. Idempotent.
pub fn promote(record: &mut Record, index: usize) -> OpsResult<&Task> {
    set_priority(record, index, true)
}

/// Remove the recommender flag from the task at `index`. Idempotent.
pub fn demote(record: &mut Record, index: usize) -> OpsResult<&Task> {
    set_priority(record, index, false)
}

fn set_priority(record: &mut Record, index: usize, priority: bool) -> OpsResult<&Task> {
    let i = check_index(record, index)?;
    record.tasks[i].priority = priority;
    Ok(&record.tasks[i])
}

/// Iterate `(1-based index, task)` pairs in insertion order, optionally
/// filtered to an exact category match.
pub fn list<'a>(
    record: &'a Record,
    category: Option<&'a str>,
) -> impl Iterator<Item = (usize, &'a Task)> {
    record
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (i + 1, t))
        .filter(move |(_, t)| category.is_none_or(|c| t.category == c))
}

/// Iterate priority tasks regardless of done-state; the done marker is part
/// of the display, not the filter.
pub fn list_priorities(record: &Record) -> impl Iterator<Item = (usize, &Task)> {
    record
        .tasks
        .iter()
        .enumerate()
        .map(|(i, t)| (i + 1, t))
        .filter(|(_, t)| t.priority)
}

/// Point the current-task pointer at the task at `index`.
pub fn select(record: &mut Record, index: usize) -> OpsResult<&Task> {
    let i = check_index(record, index)?;
    record.current = record.tasks[i].created_at.clone();
    Ok(&record.tasks[i])
}

/// Clear the current-task pointer unconditionally.
pub fn unselect(record: &mut Record) {
    record.current.clear();
}

/// Resolve the current task, `None` when unset or stale.
pub fn current_task(record: &Record) -> Option<&Task> {
    record.current_task()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(text: &str, created_at: &str) -> Task {
        Task {
            text: text.into(),
            created_at: created_at.into(),
            done: false,
            category: String::new(),
            priority: false,
        }
    }

    /// Record with tasks t1..tn whose created_at values are distinct.
    fn record_with(texts: &[&str]) -> Record {
        let mut record = Record::default();
        for (i, text) in texts.iter().enumerate() {
            record
                .tasks
                .push(task(text, &format!("2024-01-01T00:00:00.{:06}", i + 1)));
        }
        record
    }

    #[test]
    fn add_appends_in_order() {
        let mut record = Record::default();
        add(&mut record, "first", "", false).unwrap();
        add(&mut record, "second", "home", true).unwrap();

        assert_eq!(record.tasks.len(), 2);
        assert_eq!(record.tasks[0].text, "first");
        assert_eq!(record.tasks[1].text, "second");
        assert_eq!(record.tasks[1].category, "home");
        assert!(record.tasks[1].priority);
    }

    #[test]
    fn add_trims_and_rejects_empty_text() {
        let mut record = Record::default();
        assert!(matches!(add(&mut record, "", "", false), Err(OpsError::EmptyText)));
        assert!(matches!(add(&mut record, "   ", "", false), Err(OpsError::EmptyText)));
        assert!(record.tasks.is_empty());

        add(&mut record, "  padded  ", "", false).unwrap();
        assert_eq!(record.tasks[0].text, "padded");
    }

    #[test]
    fn remove_valid_index_shrinks_by_one() {
        let mut record = record_with(&["a", "b", "c"]);
        let removed = remove(&mut record, 2).unwrap();
        assert_eq!(removed.text, "b");
        assert_eq!(record.tasks.len(), 2);
        // Later tasks shift down one display position.
        assert_eq!(record.tasks[0].text, "a");
        assert_eq!(record.tasks[1].text, "c");
    }

    #[test]
    fn index_ops_out_of_range_leave_record_unchanged() {
        let mut record = record_with(&["only"]);
        record.current = record.tasks[0].created_at.clone();
        let before = record.clone();

        for index in [0, 2, 99] {
            assert!(matches!(
                remove(&mut record, index),
                Err(OpsError::IndexOutOfRange { .. })
            ));
            assert!(matches!(
                mark_done(&mut record, index),
                Err(OpsError::IndexOutOfRange { .. })
            ));
            assert!(matches!(
                promote(&mut record, index),
                Err(OpsError::IndexOutOfRange { .. })
            ));
            assert!(matches!(
                demote(&mut record, index),
                Err(OpsError::IndexOutOfRange { .. })
            ));
            assert!(matches!(
                select(&mut record, index),
                Err(OpsError::IndexOutOfRange { .. })
            ));
            assert_eq!(record, before);
        }
    }

    #[test]
    fn remove_current_task_clears_pointer() {
        let mut record = record_with(&["first", "second"]);
        select(&mut record, 1).unwrap();
        assert!(!record.current.is_empty());

        remove(&mut record, 1).unwrap();
        assert_eq!(record.current, "");
    }

    #[test]
    fn remove_other_task_keeps_pointer() {
        let mut record = record_with(&["first", "second"]);
        select(&mut record, 1).unwrap();
        let pointer = record.current.clone();

        remove(&mut record, 2).unwrap();
        assert_eq!(record.current, pointer);
        assert_eq!(current_task(&record).unwrap().text, "first");
    }

    #[test]
    fn select_survives_later_adds_but_not_removal() {
        let mut record = record_with(&["a", "b"]);
        select(&mut record, 2).unwrap();

        // Identity is by created_at, not position.
        add(&mut record, "c", "", false).unwrap();
        assert_eq!(current_task(&record).unwrap().text, "b");

        remove(&mut record, 2).unwrap();
        assert!(current_task(&record).is_none());
    }

    #[test]
    fn mark_done_idempotent() {
        let mut record = record_with(&["t"]);
        mark_done(&mut record, 1).unwrap();
        let once = record.clone();
        mark_done(&mut record, 1).unwrap();
        assert_eq!(record, once);
        assert!(record.tasks[0].done);
    }

    #[test]
    fn promote_demote_idempotent() {
        let mut record = record_with(&["t"]);

        promote(&mut record, 1).unwrap();
        let promoted = record.clone();
        promote(&mut record, 1).unwrap();
        assert_eq!(record, promoted);
        assert!(record.tasks[0].priority);

        demote(&mut record, 1).unwrap();
        let demoted = record.clone();
        demote(&mut record, 1).unwrap();
        assert_eq!(record, demoted);
        assert!(!record.tasks[0].priority);
    }

    #[test]
    fn clear_always_empties() {
        let mut record = record_with(&["a", "b"]);
        select(&mut record, 1).unwrap();
        clear(&mut record);
        assert!(record.tasks.is_empty());
        assert_eq!(record.current, "");

        // Clearing an already-empty record is fine too.
        clear(&mut record);
        assert!(record.tasks.is_empty());
    }

    #[test]
    fn unselect_clears_pointer() {
        let mut record = record_with(&["t"]);
        select(&mut record, 1).unwrap();
        unselect(&mut record);
        assert_eq!(record.current, "");
        assert!(current_task(&record).is_none());
    }

    #[test]
    fn list_is_restartable_and_filters_by_category() {
        let mut record = record_with(&["a", "b", "c"]);
        record.tasks[0].category = "home".into();
        record.tasks[2].category = "home".into();

        let all: Vec<_> = list(&record, None).map(|(i, t)| (i, t.text.clone())).collect();
        assert_eq!(
            all,
            vec![(1, "a".into()), (2, "b".into()), (3, "c".into())]
        );

        // Indices are display positions, not positions within the filter.
        let home: Vec<_> = list(&record, Some("home")).map(|(i, _)| i).collect();
        assert_eq!(home, vec![1, 3]);

        // Restartable: a second pass sees the same pairs.
        let again: Vec<_> = list(&record, Some("home")).map(|(i, _)| i).collect();
        assert_eq!(again, home);

        assert_eq!(list(&record, Some("nope")).count(), 0);
    }

    #[test]
    fn list_priorities_ignores_done_state() {
        let mut record = record_with(&["a", "b", "c"]);
        record.tasks[0].priority = true;
        record.tasks[2].priority = true;
        record.tasks[2].done = true;

        let got: Vec<_> = list_priorities(&record).map(|(i, _)| i).collect();
        assert_eq!(got, vec![1, 3]);
    }
}
