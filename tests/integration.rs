//! End-to-end integration tests for donext.
//!
//! These tests exercise full flows through the library API the way the CLI
//! drives it: load the db, apply operations, save, reload.

use rand::SeedableRng;
use rand::rngs::StdRng;

use donext::generate::{self, GenerateError, GeneratedTask, TaskGenerator};
use donext::ops::{self, OpsError};
use donext::recommend::{self, Style};
use donext::store::TaskDb;

#[test]
fn add_select_remove_flow() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks_db.json");

    let mut db = TaskDb::load(&path);
    let record = db.ensure_record("alice");
    ops::add(record, "first", "", false).unwrap();
    ops::add(record, "second", "", false).unwrap();
    ops::select(record, 2).unwrap();
    db.save(&path).unwrap();

    // Removing task 1 shifts "second" to position 1 but the pointer still
    // resolves to it by timestamp.
    let mut db = TaskDb::load(&path);
    let record = db.ensure_record("alice");
    let removed = ops::remove(record, 1).unwrap();
    assert_eq!(removed.text, "first");
    assert_eq!(ops::current_task(record).unwrap().text, "second");
    db.save(&path).unwrap();

    // Removing the current task clears the pointer.
    let mut db = TaskDb::load(&path);
    let record = db.ensure_record("alice");
    ops::remove(record, 1).unwrap();
    assert_eq!(record.current, "");
    assert!(ops::current_task(record).is_none());
}

#[test]
fn out_of_range_index_changes_nothing_on_disk() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks_db.json");

    let mut db = TaskDb::load(&path);
    ops::add(db.ensure_record("bob"), "only", "", false).unwrap();
    db.save(&path).unwrap();
    let saved = TaskDb::load(&path);

    let mut db = TaskDb::load(&path);
    let record = db.ensure_record("bob");
    assert!(matches!(
        ops::remove(record, 7),
        Err(OpsError::IndexOutOfRange { index: 7, len: 1 })
    ));
    // The failed operation is not persisted; db content is unchanged.
    assert_eq!(db, saved);
}

#[test]
fn recommend_flow_prefers_priority_and_persists_pointer() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks_db.json");

    let mut db = TaskDb::load(&path);
    let record = db.ensure_record("carol");
    ops::add(record, "routine", "chores", false).unwrap();
    ops::add(record, "urgent", "work", false).unwrap();
    ops::promote(record, 2).unwrap();

    let mut rng = StdRng::seed_from_u64(7);
    let picked = recommend::recommend(record, Style::Dispersed, &mut rng).unwrap();
    assert_eq!(picked.text, "urgent");
    db.save(&path).unwrap();

    let db = TaskDb::load(&path);
    let record = db.record("carol").unwrap();
    assert_eq!(ops::current_task(record).unwrap().text, "urgent");
}

#[test]
fn generate_fallback_then_list_by_category() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("tasks_db.json");

    let mut db = TaskDb::load(&path);
    let record = db.ensure_record("dave");
    let added = generate::generate_fallback(record, "Buy milk, Call Bob; Clean");
    assert_eq!(added, 3);
    db.save(&path).unwrap();

    let db = TaskDb::load(&path);
    let record = db.record("dave").unwrap();
    let texts: Vec<_> = ops::list(record, None).map(|(_, t)| t.text.as_str()).collect();
    assert_eq!(texts, vec!["Buy milk", "Call Bob", "Clean"]);
    // Splitter output is uncategorized, so a category filter sees nothing.
    assert_eq!(ops::list(record, Some("home")).count(), 0);
}

struct CannedGenerator;

impl TaskGenerator for CannedGenerator {
    fn generate(&self, _prompt: &str) -> Result<Vec<GeneratedTask>, GenerateError> {
        Ok(vec![
            GeneratedTask {
                text: "Vacuum the living room".into(),
                category: "cleaning".into(),
                priority: false,
            },
            GeneratedTask {
                text: "Load the washing machine".into(),
                category: "laundry".into(),
                priority: true,
            },
        ])
    }
}

#[test]
fn generate_with_source_carries_fields_and_feeds_recommender() {
    let mut db = TaskDb::default();
    let record = db.ensure_record("erin");

    let added = generate::generate_with(record, "household chores", &CannedGenerator).unwrap();
    assert_eq!(added, 2);

    // The generated priority task wins the recommendation.
    let mut rng = StdRng::seed_from_u64(1);
    let picked = recommend::recommend(record, Style::Type, &mut rng).unwrap();
    assert_eq!(picked.text, "Load the washing machine");
}
