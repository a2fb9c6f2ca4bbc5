//! Configuration loading tests.

use clap::Parser;
use prom2statsd_lib::cli::Cli;
use prom2statsd_lib::core::{BridgeError, Config, ConfigBuilder, QueryType};
use std::io::Write;
use std::time::Duration;

#[test]
fn test_default_config() {
    let config = Config::default();
    assert_eq!(config.prometheus.address, "127.0.0.1:9090");
    assert_eq!(config.dogstatsd.address, "127.0.0.1:8125");
    assert_eq!(config.dogstatsd.namespace, "prometheus.");
    assert_eq!(config.interval, Duration::from_secs(10));
    assert!(config.telemetry.enabled);
    // A bridge without queries has nothing to do.
    assert!(config.validate().is_err());
}

#[tokio::test]
async fn test_load_config_file_with_cli_overrides() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
prometheus:
  address: "http://prom:9090"
interval: 1m
queries:
  - type: milliseconds
    name: latency
    query: histogram_quantile(0.99, rate(latency_bucket[5m]))
"#
    )
    .unwrap();

    let path = file.path().to_str().unwrap().to_string();
    let cli = Cli::try_parse_from([
        "prom2statsd",
        "--config",
        path.as_str(),
        "--interval",
        "5",
        "--query",
        "gauge:up",
    ])
    .unwrap();

    let config = cli.load_config().await.unwrap();

    assert_eq!(config.prometheus.base_url(), "http://prom:9090");
    assert_eq!(config.interval, Duration::from_secs(5));
    assert_eq!(config.queries.len(), 2);
    assert_eq!(config.queries[0].kind(), QueryType::Milliseconds);
    assert_eq!(config.queries[0].name(), "latency");
    assert_eq!(config.queries[1].kind(), QueryType::Gauge);
}

#[tokio::test]
async fn test_missing_explicit_config_file_is_error() {
    let cli = Cli::try_parse_from([
        "prom2statsd",
        "--config",
        "/nonexistent/prom2statsd.yaml",
        "--query",
        "gauge:up",
    ])
    .unwrap();

    assert!(matches!(cli.load_config().await, Err(BridgeError::Config(_))));
}

#[test]
fn test_set_query_in_file_is_rejected() {
    let result = ConfigBuilder::new().from_yaml(
        r#"
queries:
  - type: gauge
    query: up
  - type: set
    query: count(up)
"#,
    );

    let err = result.err().unwrap();
    assert!(matches!(err, BridgeError::Config(_)));
    assert!(err.to_string().contains("cannot handle query type 'set' (yet)"));
}

#[test]
fn test_invalid_yaml() {
    assert!(ConfigBuilder::new().from_yaml("queries: [").is_err());
    assert!(ConfigBuilder::new().from_yaml("interval: soon").is_err());
}
