use blog_feed::load_config::{load_config, TOKEN_ENV};
use blog_feed_core::config::{DEFAULT_API_BASE, DEFAULT_PREVIEW_LIMIT, DEFAULT_TIMEOUT_SECS};
use serial_test::serial;
use std::env;
use std::fs::write;
use tempfile::NamedTempFile;

fn config_file(yaml: &str) -> NamedTempFile {
    let file = NamedTempFile::new().expect("temp file");
    write(file.path(), yaml).unwrap();
    file
}

const MINIMAL: &str = r#"
source:
  account: octocat
  repository: notes
  branch: main
  path: posts
"#;

/// A config with only a source gets the default host and display settings.
#[test]
#[serial]
fn test_load_config_minimal_uses_defaults() {
    env::remove_var(TOKEN_ENV);
    let file = config_file(MINIMAL);

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.source.account, "octocat");
    assert_eq!(config.source.repository, "notes");
    assert_eq!(config.source.branch, "main");
    assert_eq!(config.source.path, "posts");
    assert_eq!(config.host.api_base, DEFAULT_API_BASE);
    assert_eq!(config.host.timeout_secs, DEFAULT_TIMEOUT_SECS);
    assert_eq!(config.display.preview_limit, DEFAULT_PREVIEW_LIMIT);
    assert!(config.host.token.is_none());
}

#[test]
#[serial]
fn test_load_config_applies_overrides() {
    env::remove_var(TOKEN_ENV);
    let file = config_file(
        r#"
source:
  account: octocat
  repository: notes
  branch: drafts
  path: /content/posts/
host:
  api_base: "http://localhost:9000"
  timeout_secs: 3
display:
  excerpt_length: 80
"#,
    );

    let config = load_config(file.path()).expect("Config should load");

    assert_eq!(config.source.directory(), "content/posts");
    assert_eq!(config.host.api_base, "http://localhost:9000");
    assert_eq!(config.host.timeout_secs, 3);
    // Unset fields inside a partially given section keep their defaults.
    assert_eq!(config.host.raw_base, "https://raw.githubusercontent.com");
    assert_eq!(config.display.excerpt_length, 80);
    assert_eq!(config.display.preview_limit, DEFAULT_PREVIEW_LIMIT);
}

#[test]
#[serial]
fn test_load_config_invalid_yaml_fails() {
    let file = config_file("source: [this is: not valid");

    let err = load_config(file.path()).expect_err("Invalid YAML must fail");
    let msg = err.to_string();
    assert!(
        msg.contains("parse") && msg.contains("YAML"),
        "unexpected error: {msg}"
    );
}

#[test]
#[serial]
fn test_load_config_rejects_empty_source_fields() {
    let file = config_file(
        r#"
source:
  account: octocat
  repository: notes
  branch: ""
  path: posts
"#,
    );

    let err = load_config(file.path()).expect_err("Empty branch must fail");
    let msg = err.to_string();
    assert!(msg.contains("Invalid source"), "unexpected error: {msg}");
    assert!(msg.contains("branch"), "unexpected error: {msg}");
}

#[test]
#[serial]
fn test_load_config_missing_file_fails() {
    let err = load_config("/nonexistent/blog-feed.yaml").expect_err("Missing file must fail");
    assert!(err.to_string().contains("Failed to read config file"));
}

/// The token comes from the environment only; blank values count as unset.
#[test]
#[serial]
fn test_load_config_injects_token_from_env() {
    let file = config_file(MINIMAL);

    env::set_var(TOKEN_ENV, "ghp_example");
    let config = load_config(file.path()).expect("Config should load");
    assert_eq!(config.host.token.as_deref(), Some("ghp_example"));
    assert!(!format!("{:?}", config.host).contains("ghp_example"));

    env::set_var(TOKEN_ENV, "   ");
    let config = load_config(file.path()).expect("Config should load");
    assert!(config.host.token.is_none());

    env::remove_var(TOKEN_ENV);
}
