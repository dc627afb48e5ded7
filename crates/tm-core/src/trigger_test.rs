use super::*;

fn touch_updated_at() -> TriggerSpec {
    TriggerSpec::new(
        "trg_metrics_touch",
        TriggerEvent::AfterUpdate,
        "UPDATE metrics SET updated_at = CURRENT_TIMESTAMP WHERE rowid = NEW.rowid;",
    )
}

#[test]
fn test_create_sql() {
    let sql = touch_updated_at().create_sql(&TableName::new("metrics"));
    assert_eq!(
        sql,
        r#"CREATE TRIGGER "trg_metrics_touch" AFTER UPDATE ON "metrics" FOR EACH ROW BEGIN UPDATE metrics SET updated_at = CURRENT_TIMESTAMP WHERE rowid = NEW.rowid; END"#
    );
}

#[test]
fn test_validate_owning_row_update() {
    touch_updated_at()
        .validate(&TableName::new("metrics"))
        .unwrap();
}

#[test]
fn test_validate_is_case_insensitive_on_table() {
    let trigger = TriggerSpec::new(
        "trg",
        TriggerEvent::AfterInsert,
        r#"UPDATE "Metrics" SET n = 1 WHERE rowid = NEW.rowid"#,
    );
    trigger.validate(&TableName::new("metrics")).unwrap();
}

#[test]
fn test_validate_rejects_fan_out() {
    let trigger = TriggerSpec::new(
        "trg_audit",
        TriggerEvent::AfterDelete,
        "INSERT INTO audit_log (id) VALUES (OLD.rowid)",
    );
    let err = trigger.validate(&TableName::new("metrics")).unwrap_err();
    assert!(err.to_string().contains("audit_log"), "{err}");
}

#[test]
fn test_validate_rejects_subquery_on_other_table() {
    let trigger = TriggerSpec::new(
        "trg",
        TriggerEvent::AfterUpdate,
        "UPDATE metrics SET cost = (SELECT MAX(cost) FROM budgets) WHERE rowid = NEW.rowid",
    );
    assert!(trigger.validate(&TableName::new("metrics")).is_err());
}

#[test]
fn test_validate_rejects_multiple_statements() {
    let trigger = TriggerSpec::new(
        "trg",
        TriggerEvent::AfterUpdate,
        "UPDATE metrics SET a = 1; UPDATE metrics SET b = 2",
    );
    assert!(trigger.validate(&TableName::new("metrics")).is_err());
}

#[test]
fn test_validate_rejects_non_dml() {
    let trigger = TriggerSpec::new("trg", TriggerEvent::AfterUpdate, "DROP TABLE metrics");
    assert!(trigger.validate(&TableName::new("metrics")).is_err());
}

#[test]
fn test_deserialize_event() {
    let trigger: TriggerSpec = serde_yaml::from_str(
        r#"
name: trg_touch
event: after_update
body: UPDATE metrics SET updated_at = CURRENT_TIMESTAMP WHERE rowid = NEW.rowid
"#,
    )
    .unwrap();
    assert_eq!(trigger.event, TriggerEvent::AfterUpdate);
}
