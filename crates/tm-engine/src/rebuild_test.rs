use super::*;
use tm_core::{ColumnSpec, ColumnType, IndexSpec, TriggerEvent, TriggerSpec};
use tm_db::inspect;

fn store_with(sql: &str) -> Store {
    let store = Store::open_memory().unwrap();
    store.conn().execute_batch(sql).unwrap();
    store
}

fn state(store: &Store, table: &str) -> TableState {
    inspect(store.conn(), &TableName::new(table))
        .unwrap()
        .into_state()
        .unwrap()
}

fn count(store: &Store, table: &str) -> u64 {
    row_count(store.conn(), &TableName::new(table)).unwrap()
}

const ABC: &str = "
    CREATE TABLE t (a INTEGER, b TEXT, c TEXT);
    CREATE INDEX idx_t_b ON t (b);
    INSERT INTO t VALUES (1, 'x', 'p'), (2, 'y', 'q'), (3, 'z', 'r');
";

fn drop_b_plan() -> MigrationPlan {
    MigrationPlan::new("t", "v2")
        .unwrap()
        .column(ColumnSpec::new("a", ColumnType::Integer))
        .column(ColumnSpec::new("c", ColumnType::Text))
        .remove("b")
}

#[test]
fn test_copy_columns_maps_sources() {
    let store = store_with(ABC);
    let plan = MigrationPlan::new("t", "v2")
        .unwrap()
        .column(ColumnSpec::new("A", ColumnType::Integer))
        .column(ColumnSpec::new("d", ColumnType::Text).renamed_from("b"))
        .column(ColumnSpec::new("e", ColumnType::Text));

    let columns = copy_columns(&plan, &state(&store, "t"));
    assert_eq!(
        columns,
        vec![
            CopyColumn {
                target: "A".into(),
                source: Some("a".into())
            },
            CopyColumn {
                target: "d".into(),
                source: Some("b".into())
            },
            CopyColumn {
                target: "e".into(),
                source: None
            },
        ]
    );
    assert_eq!(
        copy_sql(&TableName::new("t"), &TableName::new("t__rebuild"), &columns),
        r#"INSERT OR IGNORE INTO "t__rebuild" ("A", "d") SELECT "a", "b" FROM "t""#
    );
}

#[test]
fn test_copy_sql_without_shared_columns_keeps_rows() {
    let columns = vec![CopyColumn {
        target: "x".into(),
        source: None,
    }];
    assert_eq!(
        copy_sql(&TableName::new("t"), &TableName::new("s"), &columns),
        r#"INSERT OR IGNORE INTO "s" (rowid) SELECT rowid FROM "t""#
    );
}

#[test]
fn test_rebuild_drops_column_and_keeps_backup() {
    let store = store_with(ABC);
    let backup = TableName::new("t_v1_backup");
    let outcome = rebuild(&store, &drop_b_plan(), &state(&store, "t"), &backup).unwrap();

    assert_eq!(outcome.row_count_before, 3);
    assert_eq!(outcome.row_count_after, 3);
    assert_eq!(state(&store, "t").column_names(), vec!["a", "c"]);
    assert_eq!(state(&store, "t_v1_backup").column_names(), vec!["a", "b", "c"]);
    assert_eq!(count(&store, "t_v1_backup"), 3);
    assert!(!tm_db::table_exists(store.conn(), "t__rebuild").unwrap());

    // The original's index moved out of the way and was captured
    assert_eq!(outcome.captured.len(), 1);
    assert!(outcome.captured[0].contains("idx_t_b"));
    assert!(state(&store, "t_v1_backup").indexes.is_empty());
}

#[test]
fn test_rebuild_creates_plan_objects() {
    let store = store_with(ABC);
    let plan = drop_b_plan()
        .column(ColumnSpec::new("updated_at", ColumnType::Timestamp))
        .index(IndexSpec::new("idx_t_b", &["c"]))
        .trigger(TriggerSpec::new(
            "trg_t_touch",
            TriggerEvent::AfterUpdate,
            "UPDATE t SET updated_at = CURRENT_TIMESTAMP WHERE a = NEW.a",
        ));
    let backup = TableName::new("t_base_backup");
    let outcome = rebuild(&store, &plan, &state(&store, "t"), &backup).unwrap();

    let live = state(&store, "t");
    assert!(live.has_index("idx_t_b"));
    assert_eq!(live.indexes[0].columns, vec!["c"]);
    assert!(live.has_trigger("trg_t_touch"));
    assert_eq!(outcome.created.indexes, vec!["idx_t_b"]);
    assert_eq!(outcome.created.triggers, vec!["trg_t_touch"]);
}

#[test]
fn test_row_loss_aborts_before_rename() {
    let store = store_with(ABC);
    let plan = drop_b_plan().column(ColumnSpec::new("required", ColumnType::Text).not_null());
    let backup = TableName::new("t_v1_backup");
    let err = rebuild(&store, &plan, &state(&store, "t"), &backup).unwrap_err();

    assert!(matches!(
        err,
        MigrateError::RowCountMismatch {
            before: 3,
            after: 0,
            ..
        }
    ));
    assert_eq!(state(&store, "t").column_names(), vec!["a", "b", "c"]);
    assert!(state(&store, "t").has_index("idx_t_b"));
    assert!(!tm_db::table_exists(store.conn(), "t_v1_backup").unwrap());
    assert!(!tm_db::table_exists(store.conn(), "t__rebuild").unwrap());
}

#[test]
fn test_existing_backup_is_never_overwritten() {
    let store = store_with(ABC);
    store
        .conn()
        .execute_batch("CREATE TABLE t_v1_backup (old TEXT)")
        .unwrap();
    let err = rebuild(&store, &drop_b_plan(), &state(&store, "t"), &TableName::new("t_v1_backup"))
        .unwrap_err();

    assert!(matches!(err, MigrateError::BackupNameCollision { .. }));
    assert_eq!(state(&store, "t").column_names(), vec!["a", "b", "c"]);
    assert_eq!(state(&store, "t_v1_backup").column_names(), vec!["old"]);
}

#[test]
fn test_leftover_shadow_is_reported() {
    let store = store_with(ABC);
    store
        .conn()
        .execute_batch("CREATE TABLE t__rebuild (a INTEGER)")
        .unwrap();
    let err = rebuild(&store, &drop_b_plan(), &state(&store, "t"), &TableName::new("t_v1_backup"))
        .unwrap_err();
    assert!(matches!(err, MigrateError::ShadowTableExists { .. }));
}

#[test]
fn test_renamed_column_carries_data() {
    let store = store_with(ABC);
    let plan = MigrationPlan::new("t", "v2")
        .unwrap()
        .column(ColumnSpec::new("a", ColumnType::Integer))
        .column(ColumnSpec::new("label", ColumnType::Text).renamed_from("b"))
        .column(ColumnSpec::new("c", ColumnType::Text));
    rebuild(&store, &plan, &state(&store, "t"), &TableName::new("t_v1_backup")).unwrap();

    let label: String = store
        .conn()
        .query_row("SELECT label FROM t WHERE a = 2", [], |row| row.get(0))
        .unwrap();
    assert_eq!(label, "y");
}
