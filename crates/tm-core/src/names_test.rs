use super::*;

#[test]
fn test_table_name_creation() {
    let name = TableName::new("metrics");
    assert_eq!(name.as_str(), "metrics");
    assert_eq!(format!("{}", name), "metrics");
}

#[test]
fn test_identifier_equality() {
    let name = ColumnName::new("cost");
    assert_eq!(name, "cost");
    assert_eq!(name, *"cost");
    assert_eq!(name, "cost".to_string());
}

#[test]
fn test_matches_is_case_insensitive() {
    let name = ColumnName::new("Producer");
    assert!(name.matches("producer"));
    assert!(name.matches("PRODUCER"));
    assert!(!name.matches("producers"));
}

#[test]
fn test_try_new_rejects_empty() {
    assert!(TableName::try_new("").is_none());
}

#[test]
fn test_try_new_rejects_reserved_prefix() {
    assert!(TableName::try_new("sqlite_sequence").is_none());
    assert!(IndexName::try_new("SQLITE_autoindex_x_1").is_none());
}

#[test]
fn test_try_from_reports_reason() {
    let err = TriggerName::try_from("").unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn test_quoted_escapes_double_quotes() {
    let name = ColumnName::new(r#"odd"name"#);
    assert_eq!(name.quoted(), r#""odd""name""#);
}

#[test]
fn test_shadow_and_backup_names() {
    let table = TableName::new("metrics");
    assert_eq!(table.shadow().as_str(), "metrics__rebuild");
    assert_eq!(table.backup("v1").as_str(), "metrics_v1_backup");
}

#[test]
fn test_deserialize_rejects_empty() {
    let result: Result<TableName, _> = serde_yaml::from_str("''");
    assert!(result.is_err());
}

#[test]
fn test_deserialize_valid() {
    let name: ColumnName = serde_yaml::from_str("platform").unwrap();
    assert_eq!(name, "platform");
}
