use super::*;

#[test]
fn test_parse_column_types() {
    assert_eq!("integer".parse::<ColumnType>().unwrap(), ColumnType::Integer);
    assert_eq!("TEXT".parse::<ColumnType>().unwrap(), ColumnType::Text);
    assert_eq!("date".parse::<ColumnType>().unwrap(), ColumnType::Date);
    assert_eq!(
        "timestamp".parse::<ColumnType>().unwrap(),
        ColumnType::Timestamp
    );
    assert_eq!(
        "decimal(10, 2)".parse::<ColumnType>().unwrap(),
        ColumnType::Decimal {
            precision: 10,
            scale: 2
        }
    );
}

#[test]
fn test_parse_rejects_unknown_type() {
    assert!("blob".parse::<ColumnType>().is_err());
    assert!("decimal(10)".parse::<ColumnType>().is_err());
    assert!("decimal(2,5)".parse::<ColumnType>().is_err());
}

#[test]
fn test_type_matches_declared_ignores_case_and_spacing() {
    let t = ColumnType::Decimal {
        precision: 12,
        scale: 4,
    };
    assert!(t.matches_declared("decimal(12, 4)"));
    assert!(!t.matches_declared("DECIMAL(12,2)"));
    assert!(ColumnType::Text.matches_declared("text"));
}

#[test]
fn test_definition_sql() {
    let col = ColumnSpec::new("cost", ColumnType::Decimal {
        precision: 10,
        scale: 2,
    })
    .not_null()
    .with_default(ColumnDefault::Literal(Literal::Integer(0)));
    assert_eq!(col.definition_sql(), r#""cost" DECIMAL(10,2) NOT NULL DEFAULT 0"#);
}

#[test]
fn test_definition_sql_text_default_is_escaped() {
    let col = ColumnSpec::new("producer", ColumnType::Text)
        .with_default(ColumnDefault::Literal(Literal::Text("n'a".to_string())));
    assert_eq!(col.definition_sql(), r#""producer" TEXT DEFAULT 'n''a'"#);
}

#[test]
fn test_key_is_rendered_only_inside_create_table() {
    let id = ColumnSpec::new("id", ColumnType::Integer).autoincrement();
    assert!(id.primary_key);
    assert_eq!(id.definition_sql(), r#""id" INTEGER"#);
    assert_eq!(
        id.table_definition_sql(true),
        r#""id" INTEGER PRIMARY KEY AUTOINCREMENT"#
    );
    assert_eq!(id.table_definition_sql(false), r#""id" INTEGER"#);
}

#[test]
fn test_can_add_natively() {
    assert!(ColumnSpec::new("a", ColumnType::Text).can_add_natively());
    assert!(!ColumnSpec::new("a", ColumnType::Text)
        .not_null()
        .can_add_natively());
    assert!(ColumnSpec::new("a", ColumnType::Text)
        .not_null()
        .with_default(ColumnDefault::Literal(Literal::Text(String::new())))
        .can_add_natively());
    assert!(!ColumnSpec::new("a", ColumnType::Timestamp)
        .with_default(ColumnDefault::CurrentTimestamp)
        .can_add_natively());
    assert!(!ColumnSpec::new("a", ColumnType::Integer)
        .primary_key()
        .can_add_natively());
}

#[test]
fn test_default_matches() {
    let plain = ColumnSpec::new("a", ColumnType::Text);
    assert!(plain.default_matches(None));
    assert!(plain.default_matches(Some("NULL")));
    assert!(!plain.default_matches(Some("'x'")));

    let ts =
        ColumnSpec::new("b", ColumnType::Timestamp).with_default(ColumnDefault::CurrentTimestamp);
    assert!(ts.default_matches(Some("current_timestamp")));
    assert!(!ts.default_matches(None));

    let text = ColumnSpec::new("c", ColumnType::Text)
        .with_default(ColumnDefault::Literal(Literal::Text("x".to_string())));
    assert!(text.default_matches(Some("'x'")));
}

#[test]
fn test_deserialize_column_spec_yaml() {
    let col: ColumnSpec = serde_yaml::from_str(
        r#"
name: updated_at
type: timestamp
nullable: false
default: current_timestamp
"#,
    )
    .unwrap();
    assert_eq!(col.name, "updated_at");
    assert_eq!(col.column_type, ColumnType::Timestamp);
    assert!(!col.nullable);
    assert_eq!(col.default, Some(ColumnDefault::CurrentTimestamp));
}

#[test]
fn test_deserialize_literal_default_and_rename() {
    let col: ColumnSpec = serde_yaml::from_str(
        r#"
name: producer
type: text
default:
  literal: unknown
renamed_from: creator_name
"#,
    )
    .unwrap();
    assert!(col.nullable);
    assert_eq!(
        col.default,
        Some(ColumnDefault::Literal(Literal::Text("unknown".to_string())))
    );
    assert_eq!(col.renamed_from.unwrap(), "creator_name");
}

#[test]
fn test_deserialize_rejects_unknown_fields() {
    let result: Result<ColumnSpec, _> =
        serde_yaml::from_str("name: a\ntype: text\nprimary: true\n");
    assert!(result.is_err());
}
