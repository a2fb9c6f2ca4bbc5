//! Push collector seam and the DogStatsD UDP client.

use crate::core::{BridgeError, Result};
use std::fmt::Display;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use tokio::net::UdpSocket;

/// Downstream collector accepting one data point per call.
#[async_trait::async_trait]
pub trait PushClient: Send + Sync {
    /// Submit a gauge value.
    async fn gauge(&self, name: &str, value: f64, tags: &[String]) -> Result<()>;

    /// Submit a counter increment.
    async fn count(&self, name: &str, value: i64, tags: &[String]) -> Result<()>;

    /// Submit a histogram sample.
    async fn histogram(&self, name: &str, value: f64, tags: &[String]) -> Result<()>;

    /// Submit a timing in milliseconds.
    async fn timing_ms(&self, name: &str, value: f64, tags: &[String]) -> Result<()>;
}

/// Render one DogStatsD datagram: `<ns><name>:<value>|<type>[|#tags]`.
pub fn format_line(
    namespace: &str,
    name: &str,
    value: impl Display,
    metric_type: &str,
    tags: &[String],
) -> String {
    let mut line = format!("{}{}:{}|{}", namespace, name, value, metric_type);
    if !tags.is_empty() {
        line.push_str("|#");
        line.push_str(&tags.join(","));
    }
    line
}

/// DogStatsD client sending one UDP datagram per data point.
#[derive(Debug)]
pub struct DogStatsdClient {
    socket: UdpSocket,
    namespace: String,
}

impl DogStatsdClient {
    /// Resolve `address`, bind an ephemeral local socket of the same
    /// address family and connect it to the agent.
    pub async fn connect(address: &str, namespace: impl Into<String>) -> Result<Self> {
        let invalid = |reason: String| {
            BridgeError::config(format!("invalid dogstatsd address {}: {}", address, reason))
        };

        let target = tokio::net::lookup_host(address)
            .await
            .map_err(|e| invalid(e.to_string()))?
            .next()
            .ok_or_else(|| invalid("no addresses resolved".to_string()))?;

        let local: SocketAddr = if target.is_ipv6() {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(local).await?;
        socket.connect(target).await.map_err(|e| invalid(e.to_string()))?;

        let namespace = namespace.into();
        tracing::debug!(address, %target, namespace = %namespace, "DogStatsD client connected");

        Ok(Self { socket, namespace })
    }

    async fn send(&self, name: &str, value: impl Display, metric_type: &str, tags: &[String]) -> Result<()> {
        let line = format_line(&self.namespace, name, value, metric_type, tags);
        self.socket
            .send(line.as_bytes())
            .await
            .map_err(|e| BridgeError::push(name, e.to_string()))?;
        tracing::trace!(%line, "pushed");
        Ok(())
    }
}

#[async_trait::async_trait]
impl PushClient for DogStatsdClient {
    async fn gauge(&self, name: &str, value: f64, tags: &[String]) -> Result<()> {
        self.send(name, value, "g", tags).await
    }

    async fn count(&self, name: &str, value: i64, tags: &[String]) -> Result<()> {
        self.send(name, value, "c", tags).await
    }

    async fn histogram(&self, name: &str, value: f64, tags: &[String]) -> Result<()> {
        self.send(name, value, "h", tags).await
    }

    async fn timing_ms(&self, name: &str, value: f64, tags: &[String]) -> Result<()> {
        self.send(name, value, "ms", tags).await
    }
}
