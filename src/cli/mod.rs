//! Command-line interface for prom2statsd.
//!
//! Flags mirror the configuration file; anything given on the command
//! line wins over the file, which wins over the built-in defaults.

use crate::api;
use crate::backend::PrometheusClient;
use crate::bridge::{QueryRunner, Scheduler};
use crate::core::{BridgeError, Config, ConfigBuilder, Query, Result};
use crate::push::DogStatsdClient;
use crate::telemetry::Telemetry;
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Evaluate Prometheus queries on an interval and push the results to DogStatsD.
#[derive(Parser, Debug)]
#[command(name = "prom2statsd")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Prometheus address (host:port or URL)
    #[arg(long, env = "PROM2STATSD_PROMETHEUS_ADDRESS")]
    pub prometheus_address: Option<String>,

    /// DogStatsD agent address (host:port)
    #[arg(long, env = "PROM2STATSD_DOGSTATSD_ADDRESS")]
    pub dogstatsd_address: Option<String>,

    /// Prefix prepended to every pushed metric name
    #[arg(long, env = "PROM2STATSD_NAMESPACE")]
    pub namespace: Option<String>,

    /// Seconds between query rounds
    #[arg(long, env = "PROM2STATSD_INTERVAL")]
    pub interval: Option<u64>,

    /// Query in the form TYPE:EXPR or TYPE/NAME:EXPR (repeatable)
    #[arg(short, long = "query", value_parser = parse_query)]
    pub queries: Vec<Query>,

    /// Listen address of the self-telemetry endpoint
    #[arg(long, env = "PROM2STATSD_LISTEN_ADDRESS")]
    pub listen_address: Option<SocketAddr>,

    /// Configuration file path (default: ~/.config/prom2statsd/config.yaml)
    #[arg(short, long, env = "PROM2STATSD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, env = "PROM2STATSD_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

fn parse_query(value: &str) -> std::result::Result<Query, String> {
    Query::from_flag(value).map_err(|e| e.to_string())
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments and environment variables (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        let config_path = match &self.config {
            Some(path) => Some(path.clone()),
            None => dirs::config_dir()
                .map(|d| d.join("prom2statsd").join("config.yaml"))
                .filter(|p| p.exists()),
        };

        if let Some(path) = config_path {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    builder = builder.from_yaml(&content)?;
                    tracing::info!("Loaded configuration from: {:?}", path);
                },
                Err(e) => {
                    return Err(BridgeError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                },
            }
        }

        self.build_config_from_args(builder)
    }

    fn build_config_from_args(&self, mut builder: ConfigBuilder) -> Result<Config> {
        if let Some(address) = &self.prometheus_address {
            builder = builder.prometheus_address(address.as_str());
        }
        if let Some(address) = &self.dogstatsd_address {
            builder = builder.dogstatsd_address(address.as_str());
        }
        if let Some(namespace) = &self.namespace {
            builder = builder.namespace(namespace.as_str());
        }
        if let Some(secs) = self.interval {
            builder = builder.interval(Duration::from_secs(secs));
        }
        if let Some(addr) = self.listen_address {
            builder = builder.listen_address(addr);
        }
        for query in &self.queries {
            builder = builder.query(query.clone());
        }

        builder.debug(self.debug).build()
    }

    /// Initialize logging based on configuration.
    pub fn init_logging(&self) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let env_log_level =
            std::env::var("PROM2STATSD_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let log_level = if self.debug {
            "debug"
        } else {
            env_log_level.as_str()
        };

        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true).compact())
            .try_init()
            .map_err(|e| BridgeError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Execute the bridge.
pub async fn execute(cli: Cli) -> Result<()> {
    cli.init_logging()?;

    let config = cli.load_config().await?;

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Prometheus: {}", config.prometheus.base_url());
        println!("  DogStatsD: {} (namespace {:?})", config.dogstatsd.address, config.dogstatsd.namespace);
        println!("  Interval: {:?}", config.interval);
        for query in &config.queries {
            println!("  {} {:?}: {}", query.kind(), query.name(), query.query());
        }
        return Ok(());
    }

    run(config).await
}

/// Wire the clients, start the scheduler and serve telemetry until ctrl-c.
pub async fn run(config: Config) -> Result<()> {
    let telemetry = Arc::new(Telemetry::new()?);
    let backend = Arc::new(PrometheusClient::new(
        config.prometheus.base_url(),
        config.prometheus.timeout,
    )?);
    let push = Arc::new(
        DogStatsdClient::connect(&config.dogstatsd.address, config.dogstatsd.namespace.as_str())
            .await?,
    );

    // Bind before starting the scheduler so a taken port fails startup.
    let listener = if config.telemetry.enabled {
        Some(api::bind(config.telemetry.listen_address).await?)
    } else {
        None
    };

    let runner = QueryRunner::new(backend, push, Arc::clone(&telemetry));
    let scheduler = Scheduler::new(runner, config.queries.clone(), config.interval).spawn();

    tracing::info!(
        prometheus = %config.prometheus.base_url(),
        dogstatsd = %config.dogstatsd.address,
        interval = ?config.interval,
        queries = config.queries.len(),
        "prom2statsd started"
    );

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for shutdown signal: {}", e);
        }
        tracing::info!("Received shutdown signal, stopping...");
    };

    let served = match listener {
        Some(listener) => api::serve(listener, telemetry, shutdown).await,
        None => {
            shutdown.await;
            Ok(())
        },
    };

    scheduler.shutdown().await?;
    served
}
