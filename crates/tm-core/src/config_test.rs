use super::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_parse_minimal_config() {
    let config: Config = serde_yaml::from_str("name: reports\n").unwrap();
    assert_eq!(config.name, "reports");
    assert_eq!(config.plan_paths, vec!["plans"]);
    assert_eq!(config.database.path, "tidemark.db");
    assert_eq!(config.database.busy_timeout_ms, 5000);
    assert_eq!(config.confirmation, ConfirmationMode::Interactive);
}

#[test]
fn test_parse_full_config() {
    let config: Config = serde_yaml::from_str(
        r#"
name: reports
database:
  path: data/app.db
  busy_timeout_ms: 250
plan_paths: [migrations/plans, extra]
confirmation: auto
"#,
    )
    .unwrap();
    assert_eq!(config.confirmation, ConfirmationMode::Auto);
    assert_eq!(config.database.busy_timeout_ms, 250);

    let root = Path::new("/srv/app");
    assert_eq!(
        config.database_path(root),
        PathBuf::from("/srv/app/data/app.db")
    );
    assert_eq!(
        config.plan_dirs(root),
        vec![
            PathBuf::from("/srv/app/migrations/plans"),
            PathBuf::from("/srv/app/extra")
        ]
    );
}

#[test]
fn test_memory_database_path_passes_through() {
    let config: Config =
        serde_yaml::from_str("name: t\ndatabase:\n  path: \":memory:\"\n").unwrap();
    assert_eq!(
        config.database_path(Path::new("/x")),
        PathBuf::from(":memory:")
    );
}

#[test]
fn test_unknown_field_rejected() {
    let result: Result<Config, _> = serde_yaml::from_str("name: t\nplans: [x]\n");
    assert!(result.is_err());
}

#[test]
fn test_load_from_dir() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yml"), "name: from_dir\n").unwrap();
    let config = Config::load_from_dir(dir.path()).unwrap();
    assert_eq!(config.name, "from_dir");
}

#[test]
fn test_load_from_dir_yaml_extension() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("tidemark.yaml"), "name: alt\n").unwrap();
    assert_eq!(Config::load_from_dir(dir.path()).unwrap().name, "alt");
}

#[test]
fn test_load_missing_config() {
    let dir = tempdir().unwrap();
    let err = Config::load_from_dir(dir.path()).unwrap_err();
    assert!(matches!(err, CoreError::ConfigNotFound { .. }));
}

#[test]
fn test_empty_name_rejected() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("tidemark.yml");
    fs::write(&path, "name: ''\n").unwrap();
    assert!(matches!(
        Config::load(&path).unwrap_err(),
        CoreError::ConfigInvalid { .. }
    ));
}
