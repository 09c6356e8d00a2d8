//! Readiness polling
//!
//! A fixed-budget sleep-then-probe loop. A policy with `retry_budget = n`
//! probes at most `n + 1` times, sleeping `interval` before every probe, and
//! stops at the first status in `[200, 400)`.

use crate::core::models::HealthCheckPolicy;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("{0}")]
    Other(String),
}

/// Anything that can answer "what status does this URL return right now"
#[async_trait]
pub trait ReadinessProbe: Send + Sync {
    async fn status(&self, url: &str) -> Result<u16, ProbeError>;
}

/// Plain HTTP GET probe
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
}

impl HttpProbe {
    pub fn new() -> Self {
        // No overall timeout: the cluster-health URL asks Elasticsearch to
        // hold the request for up to 120s itself.
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReadinessProbe for HttpProbe {
    async fn status(&self, url: &str) -> Result<u16, ProbeError> {
        let response = self.client.get(url).send().await?;
        Ok(response.status().as_u16())
    }
}

pub fn is_ready_status(code: u16) -> bool {
    (200..400).contains(&code)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl PollOutcome {
    pub fn is_ready(&self) -> bool {
        matches!(self, PollOutcome::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            PollOutcome::Ready { attempts } | PollOutcome::Exhausted { attempts } => *attempts,
        }
    }
}

pub struct HealthPoller<'a> {
    probe: &'a dyn ReadinessProbe,
}

impl<'a> HealthPoller<'a> {
    pub fn new(probe: &'a dyn ReadinessProbe) -> Self {
        Self { probe }
    }

    pub async fn await_healthy(&self, policy: &HealthCheckPolicy) -> PollOutcome {
        let name = &policy.service_name;
        let mut attempts = 0;

        for retries_left in (0..=policy.retry_budget).rev() {
            println!("Waiting for {name} to start. {retries_left} retries left");
            tokio::time::sleep(policy.interval).await;
            attempts += 1;

            match self.probe.status(&policy.url).await {
                Ok(code) if is_ready_status(code) => {
                    println!("{name} has successfully been started.");
                    return PollOutcome::Ready { attempts };
                }
                Ok(code) => debug!(service = %name, code, attempts, "not ready yet"),
                Err(err) => debug!(service = %name, attempts, "probe failed: {}", err),
            }
        }

        PollOutcome::Exhausted { attempts }
    }
}
