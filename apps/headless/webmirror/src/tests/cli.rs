use crate::cli::Cli;

use std::path::PathBuf;

use clap::Parser;

#[test]
fn given_no_arguments_when_parsed_then_everything_comes_from_config() {
    let cli = Cli::try_parse_from(["webmirror"]).expect("parses");

    assert_eq!(cli.config, None);
    assert_eq!(cli.page_url, None);
    assert_eq!(cli.ws_port, None);
    assert!(!cli.no_input);
}

#[test]
fn given_overrides_when_parsed_then_they_are_captured() {
    let cli = Cli::try_parse_from([
        "webmirror",
        "--config",
        "/etc/webmirror/client.toml",
        "--page-url",
        "https://app.example.com/",
        "--ws-port",
        "9001",
        "--no-input",
    ])
    .expect("parses");

    assert_eq!(cli.config, Some(PathBuf::from("/etc/webmirror/client.toml")));
    assert_eq!(cli.page_url.as_deref(), Some("https://app.example.com/"));
    assert_eq!(cli.ws_port, Some(9001));
    assert!(cli.no_input);
}

#[test]
fn given_non_numeric_port_when_parsed_then_rejected() {
    assert!(Cli::try_parse_from(["webmirror", "--ws-port", "http"]).is_err());
}
