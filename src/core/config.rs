//! Configuration management for the bridge.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by `cli`)
//! - Validation and defaults

use crate::core::{BridgeError, Query, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Complete configuration for the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Query backend configuration
    pub prometheus: PrometheusConfig,
    /// Push collector configuration
    pub dogstatsd: DogStatsdConfig,
    /// Self-telemetry endpoint configuration
    pub telemetry: TelemetryConfig,
    /// Time between ticks
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Queries evaluated on every tick, in order
    pub queries: Vec<Query>,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// Prometheus query API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrometheusConfig {
    /// Address of the Prometheus server, with or without scheme
    pub address: String,
    /// Upper bound on a single query request
    #[serde(with = "humantime_serde")]
    pub timeout: Duration,
}

/// DogStatsD collector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DogStatsdConfig {
    /// UDP address of the agent
    pub address: String,
    /// Prefix prepended to every pushed metric name
    pub namespace: String,
}

/// Self-telemetry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Serve the scrape endpoint
    pub enabled: bool,
    /// Listen address of the scrape endpoint
    pub listen_address: SocketAddr,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            prometheus: PrometheusConfig::default(),
            dogstatsd: DogStatsdConfig::default(),
            telemetry: TelemetryConfig::default(),
            interval: Duration::from_secs(10),
            queries: Vec::new(),
            debug: false,
        }
    }
}

impl Default for PrometheusConfig {
    fn default() -> Self {
        PrometheusConfig {
            address: "127.0.0.1:9090".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl Default for DogStatsdConfig {
    fn default() -> Self {
        DogStatsdConfig {
            address: "127.0.0.1:8125".to_string(),
            namespace: "prometheus.".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        TelemetryConfig {
            enabled: true,
            listen_address: SocketAddr::from(([0, 0, 0, 0], 9102)),
        }
    }
}

impl PrometheusConfig {
    /// Base URL of the query API, defaulting the scheme to `http`.
    pub fn base_url(&self) -> String {
        let address = self.address.trim().trim_end_matches('/');
        if address.starts_with("http://") || address.starts_with("https://") {
            address.to_string()
        } else {
            format!("http://{}", address)
        }
    }
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(BridgeError::config("interval must be greater than 0"));
        }

        if self.prometheus.address.trim().is_empty() {
            return Err(BridgeError::config("prometheus address must not be empty"));
        }

        reqwest::Url::parse(&self.prometheus.base_url()).map_err(|e| {
            BridgeError::config(format!(
                "invalid prometheus address '{}': {}",
                self.prometheus.address, e
            ))
        })?;

        if self.prometheus.timeout.is_zero() {
            return Err(BridgeError::config("prometheus timeout must be greater than 0"));
        }

        if self.dogstatsd.address.trim().is_empty() {
            return Err(BridgeError::config("dogstatsd address must not be empty"));
        }

        validate_host_port(&self.dogstatsd.address)?;

        if self.queries.is_empty() {
            return Err(BridgeError::config(
                "no queries configured: add a `queries` section or pass --query",
            ));
        }

        Ok(())
    }
}

/// Check that a DogStatsD address has the `host:port` shape a UDP socket
/// can be connected to. The host itself is resolved at connect time.
fn validate_host_port(address: &str) -> Result<()> {
    let invalid = |reason: &str| {
        BridgeError::config(format!("invalid dogstatsd address '{}': {}", address, reason))
    };

    let (host, port) = address.trim().rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if host.is_empty() {
        return Err(invalid("missing host"));
    }
    port.parse::<u16>().map_err(|_| invalid("port must be a number between 0 and 65535"))?;

    Ok(())
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| BridgeError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set the Prometheus address
    pub fn prometheus_address(mut self, address: impl Into<String>) -> Self {
        self.config.prometheus.address = address.into();
        self
    }

    /// Set the DogStatsD address
    pub fn dogstatsd_address(mut self, address: impl Into<String>) -> Self {
        self.config.dogstatsd.address = address.into();
        self
    }

    /// Set the metric name prefix
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config.dogstatsd.namespace = namespace.into();
        self
    }

    /// Set the tick interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.interval = interval;
        self
    }

    /// Set the self-telemetry listen address
    pub fn listen_address(mut self, address: SocketAddr) -> Self {
        self.config.telemetry.listen_address = address;
        self
    }

    /// Append a query after those already configured
    pub fn query(mut self, query: Query) -> Self {
        self.config.queries.push(query);
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::QueryType;

    fn up() -> Query {
        Query::new(QueryType::Gauge, "", "up").unwrap()
    }

    #[test]
    fn test_default_config_needs_queries() {
        let config = Config::default();
        assert!(config.validate().is_err());

        let config = ConfigBuilder::new().query(up()).build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_zero_interval_rejected() {
        let config = ConfigBuilder::new()
            .query(up())
            .interval(Duration::ZERO)
            .build();
        assert!(matches!(config, Err(BridgeError::Config(_))));
    }

    #[test]
    fn test_unparsable_addresses_rejected() {
        let config = ConfigBuilder::new()
            .query(up())
            .prometheus_address("http://prom:notaport")
            .build();
        assert!(matches!(config, Err(BridgeError::Config(_))));

        for address in ["agent", ":8125", "agent:", "agent:99999", "agent:statsd"] {
            let err = ConfigBuilder::new()
                .query(up())
                .dogstatsd_address(address)
                .build()
                .err()
                .unwrap();
            assert!(matches!(err, BridgeError::Config(_)), "{} accepted", address);
            assert!(err.to_string().contains("invalid dogstatsd address"));
        }

        let config = ConfigBuilder::new()
            .query(up())
            .prometheus_address("prom.monitoring.svc:9090")
            .dogstatsd_address("[::1]:8125")
            .build();
        assert!(config.is_ok());
    }

    #[test]
    fn test_base_url() {
        let mut config = PrometheusConfig::default();
        assert_eq!(config.base_url(), "http://127.0.0.1:9090");

        config.address = "https://prom.example.com/".to_string();
        assert_eq!(config.base_url(), "https://prom.example.com");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r#"
prometheus:
  address: "prom:9090"
  timeout: 5s
dogstatsd:
  address: "agent:8125"
  namespace: ""
interval: 15s
queries:
  - type: gauge
    query: up
  - type: counter
    name: reqs
    query: sum(http_requests_total)
"#;

        let config = ConfigBuilder::new().from_yaml(yaml).unwrap().build().unwrap();

        assert_eq!(config.prometheus.address, "prom:9090");
        assert_eq!(config.prometheus.timeout, Duration::from_secs(5));
        assert_eq!(config.dogstatsd.namespace, "");
        assert_eq!(config.interval, Duration::from_secs(15));
        assert_eq!(config.queries.len(), 2);
        assert_eq!(config.queries[1].kind(), QueryType::Counter);
        assert_eq!(config.queries[1].name(), "reqs");
        assert_eq!(config.telemetry.listen_address.port(), 9102);
    }

    #[test]
    fn test_yaml_set_query_rejected() {
        let yaml = r#"
queries:
  - type: set
    name: users
    query: count(up)
"#;
        let err = ConfigBuilder::new().from_yaml(yaml).err().unwrap();
        assert!(err.to_string().contains("cannot handle query type 'set' (yet)"));
    }

    #[test]
    fn test_yaml_unknown_type_rejected() {
        let yaml = r#"
queries:
  - type: summary
    query: up
"#;
        let err = ConfigBuilder::new().from_yaml(yaml).err().unwrap();
        assert!(err.to_string().contains("unknown query type 'summary'"));
    }
}
