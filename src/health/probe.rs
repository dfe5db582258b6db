use crate::domain::health::HealthStatus;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// One health check against a processor. Never fails: any problem is
/// reported as a failing status.
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    async fn probe(&self, base_url: &str) -> HealthStatus;
}

pub fn health_url(base_url: &str) -> String {
    format!("{}/payments/service-health", base_url.trim_end_matches('/'))
}

pub struct HttpHealthProbe {
    pub client: reqwest::Client,
    pub timeout: Duration,
}

impl HttpHealthProbe {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(4)
            .timeout(timeout)
            .build()?;
        Ok(Self { client, timeout })
    }
}

#[async_trait::async_trait]
impl HealthProbe for HttpHealthProbe {
    async fn probe(&self, base_url: &str) -> HealthStatus {
        let url = health_url(base_url);
        let resp = match self.client.get(&url).timeout(self.timeout).send().await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!("health probe {} failed: {}", url, e);
                return HealthStatus::failing();
            }
        };

        if !resp.status().is_success() {
            tracing::warn!("health probe {} returned HTTP {}", url, resp.status().as_u16());
            return HealthStatus::failing();
        }

        match resp.json::<HealthStatus>().await {
            Ok(status) => status,
            Err(e) => {
                tracing::warn!("health probe {} returned a malformed body: {}", url, e);
                HealthStatus::failing()
            }
        }
    }
}

/// Probe answering from a fixed table keyed by base URL; unknown URLs
/// report failing.
#[derive(Default)]
pub struct StaticHealthProbe {
    statuses: Mutex<HashMap<String, HealthStatus>>,
    calls: AtomicUsize,
}

impl StaticHealthProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(self, base_url: &str, status: HealthStatus) -> Self {
        self.set_status(base_url, status);
        self
    }

    pub fn set_status(&self, base_url: &str, status: HealthStatus) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.insert(base_url.to_string(), status);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl HealthProbe for StaticHealthProbe {
    async fn probe(&self, base_url: &str) -> HealthStatus {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.statuses
            .lock()
            .ok()
            .and_then(|s| s.get(base_url).copied())
            .unwrap_or_else(HealthStatus::failing)
    }
}
