use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    Cli::command().debug_assert();
}

#[test]
fn migrate_flags_parse() {
    let cli = Cli::try_parse_from([
        "tidemark",
        "-p",
        "proj",
        "migrate",
        "--plan",
        "v2",
        "--rollback",
        "--yes",
    ])
    .unwrap();
    assert_eq!(cli.global.project_dir, "proj");
    match cli.command {
        Commands::Migrate(args) => {
            assert_eq!(args.plan, "v2");
            assert!(args.rollback);
            assert!(args.yes);
            assert!(!args.force_rebuild);
            assert!(args.table.is_none());
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn migrate_requires_plan() {
    assert!(Cli::try_parse_from(["tidemark", "migrate"]).is_err());
}

#[test]
fn global_flags_after_subcommand() {
    let cli = Cli::try_parse_from(["tidemark", "status", "-v", "-d", "other.db", "-o", "json"])
        .unwrap();
    assert!(cli.global.verbose);
    assert_eq!(cli.global.database.as_deref(), Some("other.db"));
    match cli.command {
        Commands::Status(args) => assert_eq!(args.output, OutputFormat::Json),
        other => panic!("unexpected command: {other:?}"),
    }
}
