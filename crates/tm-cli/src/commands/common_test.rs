use super::*;

#[test]
fn test_column_widths_follow_longest_cell() {
    let widths = calculate_column_widths(
        &["TABLE", "V"],
        &[vec!["metrics".into(), "v10".into()], vec!["t".into(), "v2".into()]],
    );
    assert_eq!(widths, vec![7, 3]);
}

#[test]
fn test_format_table() {
    let lines = format_table(
        &["TABLE", "STATUS"],
        &[vec!["leads".into(), "succeeded".into()]],
    );
    assert_eq!(
        lines,
        vec![
            "TABLE  STATUS",
            "-----  ---------",
            "leads  succeeded",
        ]
    );
}

#[test]
fn test_exit_codes() {
    let declined = MigrateError::ConfirmationDeclined {
        table: "t".into(),
        action: "Rollback".into(),
    };
    assert_eq!(exit_code_for(&declined), EXIT_DECLINED);

    let mismatch = MigrateError::VerificationMismatch {
        table: "t".into(),
        mismatches: vec![tm_engine::Mismatch::TableAbsent],
    };
    assert_eq!(exit_code_for(&mismatch), EXIT_MISMATCH);

    let count = MigrateError::RowCountMismatch {
        table: "t".into(),
        before: 3,
        after: 2,
    };
    assert_eq!(exit_code_for(&count), EXIT_FAILED);

    let missing = MigrateError::PlanNotFound {
        version: "v9".into(),
        table: None,
    };
    assert_eq!(exit_code_for(&missing), EXIT_USAGE);
}
