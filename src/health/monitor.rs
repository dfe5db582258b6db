use crate::domain::health::HealthStatus;
use crate::health::cache::HealthStatusCache;
use crate::health::probe::HealthProbe;
use crate::service::task::TaskSlot;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub name: String,
    pub base_url: String,
}

impl ProbeTarget {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HealthMonitorConfig {
    pub targets: Vec<ProbeTarget>,
    pub poll_interval: Duration,
    pub cache_ttl_seconds: u64,
    /// Cross-instance probe slot length; 0 probes on every tick.
    pub probe_window_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Refreshed(HealthStatus),
    /// Another instance holds the probe slot.
    Skipped,
}

/// Polls every processor's health endpoint on a fixed cadence and keeps
/// the shared cache fresh.
pub struct HealthMonitor {
    cache: Arc<dyn HealthStatusCache>,
    probe: Arc<dyn HealthProbe>,
    config: HealthMonitorConfig,
    task: TaskSlot,
}

impl HealthMonitor {
    pub fn new(
        cache: Arc<dyn HealthStatusCache>,
        probe: Arc<dyn HealthProbe>,
        config: HealthMonitorConfig,
    ) -> Self {
        Self {
            cache,
            probe,
            config,
            task: TaskSlot::new("health monitor"),
        }
    }

    pub fn config(&self) -> &HealthMonitorConfig {
        &self.config
    }

    pub fn start(&self) -> bool {
        let cache = self.cache.clone();
        let probe = self.probe.clone();
        let config = self.config.clone();

        self.task.start(move |token| async move {
            let mut interval = tokio::time::interval(config.poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {}
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = refresh_all(&cache, &probe, &config) => {}
                }
            }
        })
    }

    pub async fn stop(&self) {
        self.task.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }

    /// Runs one monitoring tick immediately.
    pub async fn refresh_now(&self) -> Vec<(String, ProbeOutcome)> {
        refresh_all(&self.cache, &self.probe, &self.config).await
    }
}

async fn refresh_all(
    cache: &Arc<dyn HealthStatusCache>,
    probe: &Arc<dyn HealthProbe>,
    config: &HealthMonitorConfig,
) -> Vec<(String, ProbeOutcome)> {
    let mut probes = JoinSet::new();
    for target in config.targets.iter().cloned() {
        let cache = cache.clone();
        let probe = probe.clone();
        let ttl = config.cache_ttl_seconds;
        let window = config.probe_window_seconds;
        probes.spawn(async move {
            let outcome = refresh_one(cache.as_ref(), probe.as_ref(), &target, ttl, window).await;
            (target.name, outcome)
        });
    }

    let mut outcomes = Vec::with_capacity(config.targets.len());
    while let Some(joined) = probes.join_next().await {
        match joined {
            Ok((name, Ok(outcome))) => {
                tracing::debug!("health of {}: {:?}", name, outcome);
                outcomes.push((name, outcome));
            }
            Ok((name, Err(e))) => tracing::warn!("health refresh for {} failed: {:#}", name, e),
            Err(e) => tracing::error!("health probe task failed: {}", e),
        }
    }
    outcomes
}

async fn refresh_one(
    cache: &dyn HealthStatusCache,
    probe: &dyn HealthProbe,
    target: &ProbeTarget,
    ttl_seconds: u64,
    window_seconds: u64,
) -> anyhow::Result<ProbeOutcome> {
    if window_seconds > 0 && !cache.claim_probe_slot(&target.name, window_seconds).await? {
        return Ok(ProbeOutcome::Skipped);
    }

    let status = probe.probe(&target.base_url).await;
    cache.set(&target.name, status, ttl_seconds).await?;
    Ok(ProbeOutcome::Refreshed(status))
}
