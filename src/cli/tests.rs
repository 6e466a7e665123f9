use super::*;
use crate::value::Scalar;

#[test]
fn test_build_config_levels() {
    let cli = Cli::try_parse_from(["useful", "load", "app.yaml"]).unwrap();
    let config = cli.build_config();
    assert_eq!(config.log_level.as_deref(), Some("warn"));
    assert_eq!(config.log_format, LogFormat::Text);

    let cli = Cli::try_parse_from(["useful", "--verbose", "load", "app.yaml"]).unwrap();
    assert_eq!(cli.build_config().log_level.as_deref(), Some("debug"));

    let cli = Cli::try_parse_from(["useful", "flatten", "app.yaml", "-q"]).unwrap();
    assert_eq!(cli.build_config().log_level, None);
}

#[test]
fn test_verbose_conflicts_with_quiet() {
    assert!(Cli::try_parse_from(["useful", "-v", "-q", "load", "app.yaml"]).is_err());
}

#[test]
fn test_log_format_json() {
    let cli = Cli::try_parse_from(["useful", "--log-format", "json", "load", "app.yaml"]).unwrap();
    assert_eq!(cli.build_config().log_format, LogFormat::Json);
}

#[test]
fn test_load_arguments() {
    let cli = Cli::try_parse_from([
        "useful", "load", "app.yaml", "--set", "port=8080", "--set", "host=db", "-o", "yaml",
    ])
    .unwrap();

    match cli.command {
        Commands::Load(cmd) => {
            assert_eq!(cmd.uri, "app.yaml");
            assert_eq!(cmd.output, OutputFormat::Yaml);
            assert!(!cmd.generic);
            assert_eq!(
                cmd.assignments,
                vec![
                    ("port".to_string(), Scalar::Int(8080)),
                    ("host".to_string(), Scalar::String("db".to_string())),
                ]
            );
        }
        other => panic!("expected load, got {other:?}"),
    }
}

#[test]
fn test_invalid_assignment_rejected() {
    assert!(Cli::try_parse_from(["useful", "load", "app.yaml", "--set", "port"]).is_err());
}

#[test]
fn test_flatten_defaults() {
    let cli = Cli::try_parse_from(["useful", "flatten", "app.json"]).unwrap();
    match cli.command {
        Commands::Flatten(cmd) => {
            assert_eq!(cmd.separator, ".");
            assert!(!cmd.reverse);
        }
        other => panic!("expected flatten, got {other:?}"),
    }
}
