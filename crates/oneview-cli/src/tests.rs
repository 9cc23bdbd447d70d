use clap::Parser;

use super::*;

#[test]
fn parses_search_with_coordinates() {
    let cli = Cli::try_parse_from([
        "oneview-cli",
        "search",
        "iphone",
        "--lat",
        "19.0760",
        "--lng",
        "72.8777",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Some(Commands::Search { query, lat, lng }) => {
            assert_eq!(query, "iphone");
            assert_eq!(lat.as_deref(), Some("19.0760"));
            assert_eq!(lng.as_deref(), Some("72.8777"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn search_accepts_negative_coordinates() {
    let cli = Cli::try_parse_from([
        "oneview-cli",
        "search",
        "laptop",
        "--lat",
        "-33.86",
        "--lng",
        "151.21",
    ])
    .expect("expected valid cli args");

    assert!(matches!(
        cli.command,
        Some(Commands::Search { lat: Some(ref lat), .. }) if lat == "-33.86"
    ));
}

#[test]
fn search_requires_a_query() {
    assert!(Cli::try_parse_from(["oneview-cli", "search"]).is_err());
}

#[test]
fn parses_seed_defaults() {
    let cli = Cli::try_parse_from(["oneview-cli", "seed"]).expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Seed {
            seed: None,
            reset: false,
            dry_run: false
        })
    ));
}

#[test]
fn parses_seed_with_flags() {
    let cli = Cli::try_parse_from(["oneview-cli", "seed", "--seed", "7", "--reset", "--dry-run"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Seed {
            seed: Some(7),
            reset: true,
            dry_run: true
        })
    ));
}

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["oneview-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["oneview-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}
