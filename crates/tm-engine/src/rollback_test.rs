use super::*;
use crate::rebuild::rebuild;
use tm_core::{ColumnSpec, ColumnType, TableName};

const ABC: &str = "
    CREATE TABLE t (a INTEGER, b TEXT, c TEXT);
    CREATE INDEX idx_t_b ON t (b);
    INSERT INTO t VALUES (1, 'x', 'p'), (2, 'y', 'q');
";

fn plan() -> MigrationPlan {
    MigrationPlan::new("t", "v2")
        .unwrap()
        .column(ColumnSpec::new("a", ColumnType::Integer))
        .column(ColumnSpec::new("c", ColumnType::Text))
        .remove("b")
}

/// Rebuild `t` to `plan()` and return the run record a runner would keep.
fn rebuilt(store: &Store) -> MigrationRun {
    store.conn().execute_batch(ABC).unwrap();
    let state = inspect(store.conn(), &TableName::new("t"))
        .unwrap()
        .into_state()
        .unwrap();
    let backup = TableName::new("t_v1_backup");
    let outcome = rebuild(store, &plan(), &state, &backup).unwrap();

    let mut run = MigrationRun::new(TableName::new("t"), "v2".parse().unwrap(), "x".into());
    run.backup_table = Some(backup);
    run.row_count_before = Some(outcome.row_count_before);
    run.captured_objects = outcome.captured;
    run
}

fn columns(store: &Store) -> Vec<String> {
    inspect(store.conn(), &TableName::new("t"))
        .unwrap()
        .into_state()
        .unwrap()
        .columns
        .into_iter()
        .map(|c| c.name)
        .collect()
}

#[test]
fn test_rollback_restores_original() {
    let store = Store::open_memory().unwrap();
    let run = rebuilt(&store);

    let outcome = rollback(&store, &plan(), &run).unwrap();
    assert_eq!(outcome.restored_rows, 2);
    assert_eq!(outcome.replayed, 1);
    assert_eq!(columns(&store), vec!["a", "b", "c"]);
    assert!(!tm_db::table_exists(store.conn(), "t_v1_backup").unwrap());

    let state = inspect(store.conn(), &TableName::new("t"))
        .unwrap()
        .into_state()
        .unwrap();
    assert!(state.has_index("idx_t_b"));
}

#[test]
fn test_refuses_when_live_structure_changed() {
    let store = Store::open_memory().unwrap();
    let run = rebuilt(&store);
    store
        .conn()
        .execute_batch("ALTER TABLE t ADD COLUMN later TEXT")
        .unwrap();

    let err = rollback(&store, &plan(), &run).unwrap_err();
    assert!(matches!(err, MigrateError::RollbackStructureMismatch { .. }));
    assert_eq!(columns(&store), vec!["a", "c", "later"]);
    assert!(tm_db::table_exists(store.conn(), "t_v1_backup").unwrap());
}

#[test]
fn test_refuses_when_backup_was_dropped() {
    let store = Store::open_memory().unwrap();
    let run = rebuilt(&store);
    store
        .conn()
        .execute_batch("DROP TABLE t_v1_backup")
        .unwrap();

    let err = rollback(&store, &plan(), &run).unwrap_err();
    assert!(matches!(err, MigrateError::BackupMissing { .. }));
    assert_eq!(columns(&store), vec!["a", "c"]);
}

#[test]
fn test_structure_difference_checks_types() {
    let store = Store::open_memory().unwrap();
    store
        .conn()
        .execute_batch("CREATE TABLE t (a TEXT, c TEXT)")
        .unwrap();
    let state = inspect(store.conn(), &TableName::new("t"))
        .unwrap()
        .into_state()
        .unwrap();
    let details = structure_difference(&plan(), &state).unwrap();
    assert!(details.contains("column 'a' is TEXT"));
}
