use super::*;
use std::fs;
use tempfile::tempdir;

fn plan_yaml(table: &str, version: &str, columns: &[&str]) -> String {
    let mut yaml = format!("version: {version}\ntable: {table}\ncolumns:\n");
    for c in columns {
        yaml.push_str(&format!("  - name: {c}\n    type: text\n"));
    }
    yaml
}

#[test]
fn test_load_discovers_nested_plans() {
    let dir = tempdir().unwrap();
    let nested = dir.path().join("metrics");
    fs::create_dir_all(&nested).unwrap();
    fs::write(nested.join("v1.yml"), plan_yaml("metrics", "v1", &["a"])).unwrap();
    fs::write(nested.join("v2.yaml"), plan_yaml("metrics", "v2", &["a", "b"])).unwrap();
    fs::write(dir.path().join("users_v1.yml"), plan_yaml("users", "v1", &["id"])).unwrap();
    fs::write(dir.path().join("README.md"), "not a plan").unwrap();

    let catalog = PlanCatalog::load(&[dir.path().to_path_buf()]).unwrap();
    assert_eq!(catalog.len(), 3);
    assert_eq!(catalog.for_table("metrics").len(), 2);

    let v2: PlanVersion = "v2".parse().unwrap();
    let prev = catalog.predecessor("metrics", &v2).unwrap();
    assert_eq!(prev.version.as_str(), "v1");
    assert!(catalog.predecessor("users", &"v1".parse().unwrap()).is_none());
}

#[test]
fn test_at_version_filters_by_table() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.yml"), plan_yaml("metrics", "v1", &["a"])).unwrap();
    fs::write(dir.path().join("b.yml"), plan_yaml("users", "v1", &["id"])).unwrap();

    let catalog = PlanCatalog::load(&[dir.path().to_path_buf()]).unwrap();
    let v1: PlanVersion = "v1".parse().unwrap();
    assert_eq!(catalog.at_version(&v1, None).len(), 2);
    assert_eq!(catalog.at_version(&v1, Some("users")).len(), 1);
    assert!(catalog.at_version(&"v9".parse().unwrap(), None).is_empty());
}

#[test]
fn test_duplicate_table_version_rejected() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.yml"), plan_yaml("metrics", "v1", &["a"])).unwrap();
    fs::write(dir.path().join("b.yml"), plan_yaml("metrics", "v1.0", &["b"])).unwrap();

    let err = PlanCatalog::load(&[dir.path().to_path_buf()]).unwrap_err();
    assert!(matches!(err, CoreError::DuplicatePlan { .. }), "{err}");
}

#[test]
fn test_missing_dir_is_an_error() {
    let dir = tempdir().unwrap();
    let err = PlanCatalog::load(&[dir.path().join("nope")]).unwrap_err();
    assert!(matches!(err, CoreError::PlanDirNotFound { .. }));
}

#[test]
fn test_parse_error_names_file() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("bad.yml"), "version: v1\ntable: t\ncolumns: 3\n").unwrap();
    let err = PlanCatalog::load(&[dir.path().to_path_buf()]).unwrap_err();
    assert!(err.to_string().contains("bad.yml"), "{err}");
}

#[test]
fn test_invalid_plan_rejected_at_load() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("bad.yml"),
        "version: v1\ntable: t\ncolumns:\n  - name: a\n    type: text\nremoved_columns: [a]\n",
    )
    .unwrap();
    assert!(PlanCatalog::load(&[dir.path().to_path_buf()]).is_err());
}
