//! One-shot health probes against service endpoints.
//!
//! A probe performs exactly one network round-trip and never retries or
//! raises: transport-level failures are folded into an unhealthy outcome
//! with the underlying error preserved. Retry and backoff belong to the
//! startup sequencer, not here.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use tokio::net::TcpStream;
use url::Url;

/// A probeable service endpoint.
#[derive(Clone, Debug, Serialize)]
pub enum Endpoint {
    /// An HTTP endpoint answered with a status code.
    Http(Url),

    /// A raw TCP endpoint where a successful connect means healthy.
    Tcp(SocketAddr),
}

impl std::fmt::Display for Endpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http(url) => write!(f, "{url}"),
            Self::Tcp(addr) => write!(f, "tcp://{addr}"),
        }
    }
}

/// Decides whether an observed response means healthy. Kept as data so
/// the same shape covers HTTP pings and plain connect checks.
#[derive(Clone, Debug, Serialize)]
pub enum StatusPredicate {
    /// Any 2xx status (or a successful TCP connect).
    Success,

    /// One of the listed HTTP statuses.
    OneOf(Vec<u16>),
}

impl StatusPredicate {
    /// Returns whether the given HTTP status satisfies the predicate.
    #[must_use]
    pub fn matches_status(&self, status: u16) -> bool {
        match self {
            Self::Success => (200..300).contains(&status),
            Self::OneOf(statuses) => statuses.contains(&status),
        }
    }
}

/// The health contract of one service: where to probe and what counts
/// as healthy.
#[derive(Clone, Debug, Serialize)]
pub struct HealthCheck {
    /// The endpoint to probe.
    pub endpoint: Endpoint,

    /// The predicate applied to the response.
    pub predicate: StatusPredicate,
}

/// The result of a single probe. Produced fresh on every call and never
/// cached across probes.
#[derive(Clone, Debug, Serialize)]
pub struct HealthCheckOutcome {
    /// The service that was probed.
    pub service: String,

    /// Whether the predicate was satisfied.
    pub healthy: bool,

    /// How long the round-trip took.
    pub latency: Duration,

    /// The raw status line or transport error.
    pub detail: String,
}

/// Performs one bounded-time readiness check against a single endpoint.
#[async_trait]
pub trait Prober
where
    Self: Send + Sync,
{
    /// Probes the endpoint once, within the given timeout.
    async fn probe(
        &self,
        service: &str,
        check: &HealthCheck,
        timeout: Duration,
    ) -> HealthCheckOutcome;
}

/// Prober backed by a shared HTTP client and raw TCP connects.
#[derive(Clone, Debug, Default)]
pub struct HttpProber {
    client: Client,
}

impl HttpProber {
    /// Creates a new `HttpProber`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }
}

#[async_trait]
impl Prober for HttpProber {
    async fn probe(
        &self,
        service: &str,
        check: &HealthCheck,
        timeout: Duration,
    ) -> HealthCheckOutcome {
        let started = Instant::now();

        let (healthy, detail) = match &check.endpoint {
            Endpoint::Http(url) => {
                match self.client.get(url.clone()).timeout(timeout).send().await {
                    Ok(response) => {
                        let status = response.status().as_u16();
                        (
                            check.predicate.matches_status(status),
                            format!("HTTP {status} from {url}"),
                        )
                    }
                    Err(e) => (false, format!("request to {url} failed: {e}")),
                }
            }
            Endpoint::Tcp(addr) => {
                match tokio::time::timeout(timeout, TcpStream::connect(addr)).await {
                    Ok(Ok(_)) => (true, format!("tcp connect to {addr} succeeded")),
                    Ok(Err(e)) => (false, format!("tcp connect to {addr} failed: {e}")),
                    Err(_) => (false, format!("tcp connect to {addr} timed out")),
                }
            }
        };

        HealthCheckOutcome {
            service: service.to_string(),
            healthy,
            latency: started.elapsed(),
            detail,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_predicate_accepts_2xx_only() {
        let predicate = StatusPredicate::Success;

        assert!(predicate.matches_status(200));
        assert!(predicate.matches_status(204));
        assert!(!predicate.matches_status(302));
        assert!(!predicate.matches_status(503));
    }

    #[test]
    fn test_one_of_predicate_matches_listed_statuses() {
        let predicate = StatusPredicate::OneOf(vec![200, 401]);

        assert!(predicate.matches_status(401));
        assert!(!predicate.matches_status(500));
    }

    #[tokio::test]
    async fn test_tcp_probe_reports_healthy_for_listening_socket() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let check = HealthCheck {
            endpoint: Endpoint::Tcp(addr),
            predicate: StatusPredicate::Success,
        };

        let outcome = HttpProber::new()
            .probe("db", &check, Duration::from_secs(1))
            .await;

        assert!(outcome.healthy);
        assert_eq!(outcome.service, "db");
    }

    #[tokio::test]
    async fn test_tcp_probe_absorbs_connection_refused() {
        // Bind then drop to get a port that is very likely closed.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let check = HealthCheck {
            endpoint: Endpoint::Tcp(addr),
            predicate: StatusPredicate::Success,
        };

        let outcome = HttpProber::new()
            .probe("db", &check, Duration::from_secs(1))
            .await;

        assert!(!outcome.healthy);
        assert!(!outcome.detail.is_empty());
    }
}
