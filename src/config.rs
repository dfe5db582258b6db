use crate::health::cache::MAX_TTL_SECONDS;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Redis,
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub redis_url: String,
    pub storage_backend: StorageBackend,
    pub default_processor_url: String,
    pub fallback_processor_url: String,
    pub processor_timeout: Duration,
    pub health_probe_timeout: Duration,
    pub health_poll_interval: Duration,
    pub health_cache_ttl_secs: u64,
    pub health_probe_window_secs: u64,
    pub max_response_time_ms: Option<u64>,
    pub worker_poll_interval: Duration,
    pub worker_count: usize,
    pub record_buffer_capacity: usize,
    pub payments_queue: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:9999".to_string(),
            redis_url: "redis://127.0.0.1:6379/".to_string(),
            storage_backend: StorageBackend::Redis,
            default_processor_url: "http://payment-processor-default:8080".to_string(),
            fallback_processor_url: "http://payment-processor-fallback:8080".to_string(),
            processor_timeout: Duration::from_millis(1000),
            health_probe_timeout: Duration::from_millis(500),
            health_poll_interval: Duration::from_millis(5200),
            health_cache_ttl_secs: 10,
            health_probe_window_secs: 5,
            max_response_time_ms: None,
            worker_poll_interval: Duration::from_millis(100),
            worker_count: 1,
            record_buffer_capacity: 1024,
            payments_queue: crate::queue::PAYMENTS_QUEUE.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        let text = |key: &str, default: String| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(default)
        };
        let number = |key: &str, default: u64| {
            lookup(key)
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(default)
        };
        let millis = |key: &str, default: Duration| {
            Duration::from_millis(number(key, default.as_millis() as u64))
        };

        let storage_backend = match lookup("STORAGE_BACKEND").as_deref().map(str::trim) {
            Some("memory") => StorageBackend::Memory,
            _ => StorageBackend::Redis,
        };

        let cfg = Self {
            bind_addr: text("BIND_ADDR", d.bind_addr),
            redis_url: text("REDIS_URL", d.redis_url),
            storage_backend,
            default_processor_url: text("DEFAULT_PROCESSOR_URL", d.default_processor_url),
            fallback_processor_url: text("FALLBACK_PROCESSOR_URL", d.fallback_processor_url),
            processor_timeout: millis("PROCESSOR_TIMEOUT_MS", d.processor_timeout),
            health_probe_timeout: millis("HEALTH_PROBE_TIMEOUT_MS", d.health_probe_timeout),
            health_poll_interval: millis("HEALTH_POLL_INTERVAL_MS", d.health_poll_interval),
            health_cache_ttl_secs: number("HEALTH_CACHE_TTL_SECS", d.health_cache_ttl_secs),
            health_probe_window_secs: number(
                "HEALTH_PROBE_WINDOW_SECS",
                d.health_probe_window_secs,
            ),
            max_response_time_ms: lookup("ROUTING_MAX_RESPONSE_TIME_MS")
                .and_then(|v| v.trim().parse::<u64>().ok()),
            worker_poll_interval: millis("WORKER_POLL_INTERVAL_MS", d.worker_poll_interval),
            worker_count: number("WORKER_COUNT", d.worker_count as u64) as usize,
            record_buffer_capacity: number(
                "RECORD_BUFFER_CAPACITY",
                d.record_buffer_capacity as u64,
            ) as usize,
            payments_queue: text("PAYMENTS_QUEUE", d.payments_queue),
        };
        cfg.sanitized()
    }

    /// Replaces values that would break the runtime with safe ones.
    pub fn sanitized(mut self) -> Self {
        let d = Self::default();
        if self.health_poll_interval.is_zero() {
            tracing::warn!("HEALTH_POLL_INTERVAL_MS must be > 0, using default");
            self.health_poll_interval = d.health_poll_interval;
        }
        if self.worker_poll_interval.is_zero() {
            tracing::warn!("WORKER_POLL_INTERVAL_MS must be > 0, using default");
            self.worker_poll_interval = d.worker_poll_interval;
        }
        if self.processor_timeout.is_zero() {
            self.processor_timeout = d.processor_timeout;
        }
        if self.health_probe_timeout.is_zero() {
            self.health_probe_timeout = d.health_probe_timeout;
        }
        if self.health_cache_ttl_secs > MAX_TTL_SECONDS {
            tracing::warn!(
                "HEALTH_CACHE_TTL_SECS={} is too large, using {}",
                self.health_cache_ttl_secs,
                MAX_TTL_SECONDS
            );
            self.health_cache_ttl_secs = MAX_TTL_SECONDS;
        }
        let max_window = MAX_TTL_SECONDS / 2;
        if self.health_probe_window_secs > max_window {
            tracing::warn!(
                "HEALTH_PROBE_WINDOW_SECS={} is too large, using {}",
                self.health_probe_window_secs,
                max_window
            );
            self.health_probe_window_secs = max_window;
        }

        // the cache must outlive one missed tick
        let poll_secs = self.health_poll_interval.as_secs();
        let min_ttl = poll_secs + 1;
        if self.health_cache_ttl_secs <= poll_secs {
            tracing::warn!(
                "HEALTH_CACHE_TTL_SECS={} does not exceed the poll interval, using {}",
                self.health_cache_ttl_secs,
                min_ttl * 2
            );
            self.health_cache_ttl_secs = min_ttl * 2;
        }
        // an instance holding the probe slot skips ticks until the window
        // ends; its own entries must survive until the next probe
        if self.health_probe_window_secs >= self.health_cache_ttl_secs {
            let ttl = self.health_probe_window_secs + min_ttl;
            tracing::warn!(
                "HEALTH_CACHE_TTL_SECS={} does not exceed HEALTH_PROBE_WINDOW_SECS={}, using {}",
                self.health_cache_ttl_secs,
                self.health_probe_window_secs,
                ttl
            );
            self.health_cache_ttl_secs = ttl;
        }
        self.worker_count = self.worker_count.max(1);
        self.record_buffer_capacity = self.record_buffer_capacity.max(1);
        self
    }
}
