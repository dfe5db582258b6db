use payments_router::domain::health::HealthStatus;
use payments_router::health::cache::{HealthStatusCache, InMemoryHealthCache};
use payments_router::health::monitor::{
    HealthMonitor, HealthMonitorConfig, ProbeOutcome, ProbeTarget,
};
use payments_router::health::probe::StaticHealthProbe;
use std::sync::Arc;
use std::time::Duration;

const DEFAULT_URL: &str = "http://default.test";
const FALLBACK_URL: &str = "http://fallback.test";

fn config(probe_window_seconds: u64) -> HealthMonitorConfig {
    HealthMonitorConfig {
        targets: vec![
            ProbeTarget::new("default", DEFAULT_URL),
            ProbeTarget::new("fallback", FALLBACK_URL),
        ],
        poll_interval: Duration::from_secs(5),
        cache_ttl_seconds: 12,
        probe_window_seconds,
    }
}

fn outcome_of(outcomes: &[(String, ProbeOutcome)], name: &str) -> Option<ProbeOutcome> {
    outcomes
        .iter()
        .find(|(n, _)| n == name)
        .map(|(_, outcome)| *outcome)
}

#[tokio::test]
async fn refresh_writes_every_target_to_cache() {
    let cache = InMemoryHealthCache::new();
    let probe = Arc::new(
        StaticHealthProbe::new()
            .with_status(DEFAULT_URL, HealthStatus::healthy(120))
            .with_status(FALLBACK_URL, HealthStatus::healthy(15)),
    );
    let monitor = HealthMonitor::new(Arc::new(cache.clone()), probe.clone(), config(0));

    let outcomes = monitor.refresh_now().await;

    assert_eq!(outcomes.len(), monitor.config().targets.len());
    assert_eq!(
        outcome_of(&outcomes, "default"),
        Some(ProbeOutcome::Refreshed(HealthStatus::healthy(120)))
    );
    assert_eq!(
        cache.get("fallback").await.unwrap(),
        Some(HealthStatus::healthy(15))
    );
    assert_eq!(probe.calls(), 2);
}

#[tokio::test]
async fn one_failing_target_does_not_affect_the_other() {
    let cache = InMemoryHealthCache::new();
    // fallback URL is unknown to the probe and reports failing
    let probe = Arc::new(StaticHealthProbe::new().with_status(DEFAULT_URL, HealthStatus::healthy(30)));
    let monitor = HealthMonitor::new(Arc::new(cache.clone()), probe, config(0));

    monitor.refresh_now().await;

    assert_eq!(cache.get("default").await.unwrap(), Some(HealthStatus::healthy(30)));
    assert_eq!(cache.get("fallback").await.unwrap(), Some(HealthStatus::failing()));
}

#[tokio::test(start_paused = true)]
async fn probe_slot_limits_checks_per_window() {
    let cache = InMemoryHealthCache::new();
    let probe = Arc::new(
        StaticHealthProbe::new()
            .with_status(DEFAULT_URL, HealthStatus::healthy(1))
            .with_status(FALLBACK_URL, HealthStatus::healthy(1)),
    );
    let monitor = HealthMonitor::new(Arc::new(cache.clone()), probe.clone(), config(5));

    monitor.refresh_now().await;
    let second = monitor.refresh_now().await;

    assert_eq!(outcome_of(&second, "default"), Some(ProbeOutcome::Skipped));
    assert_eq!(outcome_of(&second, "fallback"), Some(ProbeOutcome::Skipped));
    assert_eq!(probe.calls(), 2);
    // skipped ticks leave the cached value alone
    assert_eq!(cache.get("default").await.unwrap(), Some(HealthStatus::healthy(1)));

    tokio::time::advance(Duration::from_secs(6)).await;
    let third = monitor.refresh_now().await;
    assert_eq!(
        outcome_of(&third, "default"),
        Some(ProbeOutcome::Refreshed(HealthStatus::healthy(1)))
    );
    assert_eq!(probe.calls(), 4);
}

#[tokio::test(start_paused = true)]
async fn monitor_polls_until_stopped() {
    let cache = InMemoryHealthCache::new();
    let probe = Arc::new(
        StaticHealthProbe::new()
            .with_status(DEFAULT_URL, HealthStatus::healthy(80))
            .with_status(FALLBACK_URL, HealthStatus::failing()),
    );
    let monitor = HealthMonitor::new(Arc::new(cache.clone()), probe.clone(), config(0));

    assert!(monitor.start());
    assert!(!monitor.start());
    assert!(monitor.is_running());

    // ticks at 0s, 5s and 10s
    tokio::time::sleep(Duration::from_millis(12_500)).await;
    assert_eq!(probe.calls(), 6);
    assert_eq!(cache.get("default").await.unwrap(), Some(HealthStatus::healthy(80)));

    monitor.stop().await;
    assert!(!monitor.is_running());
    monitor.stop().await;

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(probe.calls(), 6);
    // with polling stopped, cached entries expire
    assert_eq!(cache.get("default").await.unwrap(), None);

    assert!(monitor.start());
    monitor.stop().await;
}

#[tokio::test(start_paused = true)]
async fn stale_status_is_refreshed_on_next_tick() {
    let cache = InMemoryHealthCache::new();
    let probe = Arc::new(
        StaticHealthProbe::new()
            .with_status(DEFAULT_URL, HealthStatus::failing())
            .with_status(FALLBACK_URL, HealthStatus::healthy(5)),
    );
    let monitor = HealthMonitor::new(Arc::new(cache.clone()), probe.clone(), config(0));
    monitor.start();
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(cache.get("default").await.unwrap(), Some(HealthStatus::failing()));

    probe.set_status(DEFAULT_URL, HealthStatus::healthy(5));
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert_eq!(cache.get("default").await.unwrap(), Some(HealthStatus::healthy(5)));

    monitor.stop().await;
}
