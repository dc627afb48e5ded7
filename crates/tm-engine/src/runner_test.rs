use super::*;
use std::cell::RefCell;
use std::rc::Rc;
use tm_core::{ColumnSpec, ColumnType, IndexSpec};

fn leads_v1() -> MigrationPlan {
    MigrationPlan::new("leads", "v1")
        .unwrap()
        .column(ColumnSpec::new("id", ColumnType::Integer))
        .column(ColumnSpec::new("email", ColumnType::Text))
}

fn auto(store: &Store) -> MigrationRunner<'_> {
    MigrationRunner::new(store, Confirmation::AutoConfirm).unwrap()
}

#[test]
fn test_bootstrap_absent_table() {
    let store = Store::open_memory().unwrap();
    let outcome = auto(&store).apply(&leads_v1()).unwrap();

    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.run.mode, Some(RunMode::Bootstrap));
    assert_eq!(outcome.run.status, RunStatus::Succeeded);
    let state = outcome.state.unwrap();
    assert_eq!(state.column_names(), vec!["id", "email"]);
}

#[test]
fn test_undeclared_column_is_refused_before_mutation() {
    let store = Store::open_memory().unwrap();
    store
        .conn()
        .execute_batch("CREATE TABLE leads (id INTEGER, email TEXT, phone TEXT)")
        .unwrap();
    let plan = leads_v1().column(ColumnSpec::new("score", ColumnType::Integer));
    let outcome = auto(&store).apply(&plan).unwrap();

    assert!(matches!(
        outcome.error,
        Some(MigrateError::UndeclaredColumns { ref columns, .. })
            if columns == &vec!["phone".to_string()]
    ));
    assert_eq!(outcome.run.status, RunStatus::Failed);
    let state = inspect(store.conn(), &plan.table).unwrap().into_state().unwrap();
    assert!(!state.has_column("score"));
}

#[test]
fn test_changed_plan_is_rejected() {
    let store = Store::open_memory().unwrap();
    let mut runner = auto(&store);
    assert!(runner.apply(&leads_v1()).unwrap().is_success());

    let mut edited = leads_v1();
    edited.description = Some("edited after the fact".into());
    let outcome = runner.apply(&edited).unwrap();
    assert!(matches!(outcome.error, Some(MigrateError::PlanChanged { .. })));
}

#[test]
fn test_declined_rebuild_records_failed_run() {
    let store = Store::open_memory().unwrap();
    auto(&store).apply(&leads_v1()).unwrap();

    let asked = Rc::new(RefCell::new(Vec::new()));
    let log = Rc::clone(&asked);
    let prompt = move |q: &str| {
        log.borrow_mut().push(q.to_string());
        false
    };
    let plan = MigrationPlan::new("leads", "v2")
        .unwrap()
        .column(ColumnSpec::new("id", ColumnType::Integer))
        .remove("email");

    let mut runner = MigrationRunner::new(&store, Confirmation::interactive(prompt)).unwrap();
    let outcome = runner.apply(&plan).unwrap();

    assert!(matches!(
        outcome.error,
        Some(MigrateError::ConfirmationDeclined { .. })
    ));
    assert_eq!(asked.borrow().len(), 1);
    assert!(asked.borrow()[0].contains("leads_v1_backup"));
    let state = inspect(store.conn(), &plan.table).unwrap().into_state().unwrap();
    assert!(state.has_column("email"));

    let runs = run_log::list_runs(store.conn(), Some("leads")).unwrap();
    assert_eq!(runs[0].status, RunStatus::Failed);
}

#[test]
fn test_additive_plan_is_not_confirmed() {
    let store = Store::open_memory().unwrap();
    auto(&store).apply(&leads_v1()).unwrap();

    let prompt = |_: &str| -> bool { panic!("additive runs must not prompt") };
    let plan = MigrationPlan::new("leads", "v2")
        .unwrap()
        .column(ColumnSpec::new("id", ColumnType::Integer))
        .column(ColumnSpec::new("email", ColumnType::Text))
        .column(ColumnSpec::new("score", ColumnType::Integer));
    let outcome = MigrationRunner::new(&store, Confirmation::interactive(prompt))
        .unwrap()
        .apply(&plan)
        .unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.run.added_columns, vec!["score"]);
}

#[test]
fn test_index_name_held_elsewhere_is_refused() {
    let store = Store::open_memory().unwrap();
    store
        .conn()
        .execute_batch("CREATE TABLE other (x TEXT); CREATE INDEX idx_email ON other (x);")
        .unwrap();
    let plan = leads_v1().index(IndexSpec::new("idx_email", &["email"]));
    let outcome = auto(&store).apply(&plan).unwrap();
    assert!(matches!(
        outcome.error,
        Some(MigrateError::IndexNameCollision { .. })
    ));
    assert!(!tm_db::table_exists(store.conn(), "leads").unwrap());
}

#[test]
fn test_from_version_falls_back_to_base() {
    let store = Store::open_memory().unwrap();
    store
        .conn()
        .execute_batch("CREATE TABLE leads (id INTEGER, email TEXT)")
        .unwrap();
    let plan = MigrationPlan::new("leads", "v3")
        .unwrap()
        .column(ColumnSpec::new("id", ColumnType::Integer))
        .remove("email");
    let outcome = auto(&store).apply(&plan).unwrap();
    assert!(outcome.is_success(), "{:?}", outcome.error);
    assert_eq!(outcome.run.from_version.as_deref(), Some(BASE_VERSION));
    assert_eq!(
        outcome.run.backup_table.unwrap().as_str(),
        "leads_base_backup"
    );
}

#[test]
fn test_apply_version_without_plans() {
    let store = Store::open_memory().unwrap();
    let catalog = PlanCatalog::from_plans(vec![leads_v1()]).unwrap();
    let mut runner = auto(&store).with_catalog(&catalog);
    let err = runner
        .apply_version(&"v9".parse().unwrap(), None)
        .unwrap_err();
    assert!(matches!(err, MigrateError::PlanNotFound { .. }));
}
