use payments_router::config::{AppConfig, StorageBackend};
use payments_router::domain::payment::ProcessorName;
use payments_router::health::cache::{HealthStatusCache, InMemoryHealthCache};
use payments_router::health::monitor::{HealthMonitor, HealthMonitorConfig, ProbeTarget};
use payments_router::health::probe::HttpHealthProbe;
use payments_router::health::store_redis::RedisHealthCache;
use payments_router::processors::http::HttpPaymentProcessor;
use payments_router::queue::memory::InMemoryQueue;
use payments_router::queue::store_redis::RedisStreamQueue;
use payments_router::queue::{QueueBackend, QueueManager};
use payments_router::routing::policy::FeePreferencePolicy;
use payments_router::service::payment_service::PaymentService;
use payments_router::service::worker::{BackgroundWorker, PaymentWorker};
use payments_router::storage::memory::InMemoryRecordStore;
use payments_router::storage::store_redis::RedisRecordStore;
use payments_router::storage::writer::RecordWriter;
use payments_router::storage::RecordStore;
use payments_router::AppState;
use redis::aio::ConnectionManager;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cfg = AppConfig::from_env();

    let (redis_conn, health_cache, queue_backend, record_store) = match cfg.storage_backend {
        StorageBackend::Redis => {
            let client = redis::Client::open(cfg.redis_url.clone())?;
            let conn = ConnectionManager::new(client).await?;
            let health_cache: Arc<dyn HealthStatusCache> =
                Arc::new(RedisHealthCache::new(conn.clone()));
            let queue_backend: Arc<dyn QueueBackend> =
                Arc::new(RedisStreamQueue::new(conn.clone()));
            let record_store: Arc<dyn RecordStore> = Arc::new(RedisRecordStore::new(conn.clone()));
            (Some(conn), health_cache, queue_backend, record_store)
        }
        StorageBackend::Memory => {
            tracing::warn!("STORAGE_BACKEND=memory: state is local to this process");
            let health_cache: Arc<dyn HealthStatusCache> = Arc::new(InMemoryHealthCache::new());
            let queue_backend: Arc<dyn QueueBackend> = Arc::new(InMemoryQueue::new());
            let record_store: Arc<dyn RecordStore> = Arc::new(InMemoryRecordStore::new());
            (None, health_cache, queue_backend, record_store)
        }
    };

    let default_processor = Arc::new(HttpPaymentProcessor::new(
        ProcessorName::Default,
        cfg.default_processor_url.clone(),
        cfg.processor_timeout,
    )?);
    let fallback_processor = Arc::new(HttpPaymentProcessor::new(
        ProcessorName::Fallback,
        cfg.fallback_processor_url.clone(),
        cfg.processor_timeout,
    )?);

    let health_monitor = Arc::new(HealthMonitor::new(
        health_cache.clone(),
        Arc::new(HttpHealthProbe::new(cfg.health_probe_timeout)?),
        HealthMonitorConfig {
            targets: vec![
                ProbeTarget::new(ProcessorName::Default.as_str(), cfg.default_processor_url.clone()),
                ProbeTarget::new(ProcessorName::Fallback.as_str(), cfg.fallback_processor_url.clone()),
            ],
            poll_interval: cfg.health_poll_interval,
            cache_ttl_seconds: cfg.health_cache_ttl_secs,
            probe_window_seconds: cfg.health_probe_window_secs,
        },
    ));

    let queue = QueueManager::new(queue_backend, cfg.payments_queue.clone());
    let records = RecordWriter::spawn(record_store.clone(), cfg.record_buffer_capacity);

    let payment_service = PaymentService {
        default: default_processor,
        fallback: fallback_processor,
        health_cache,
        policy: Arc::new(FeePreferencePolicy::new(cfg.max_response_time_ms)),
        queue: queue.clone(),
        records: records.clone(),
        record_store,
    };

    let worker = Arc::new(PaymentWorker::new(queue, payment_service.clone()));
    let workers: Vec<BackgroundWorker> = (0..cfg.worker_count)
        .map(|_| BackgroundWorker::new(worker.clone(), cfg.worker_poll_interval))
        .collect();

    health_monitor.start();
    for w in &workers {
        w.start();
    }
    let monitor_config = health_monitor.config();
    tracing::info!(
        "started health monitor ({} targets every {:?}, ttl {}s) and {} payment worker(s)",
        monitor_config.targets.len(),
        monitor_config.poll_interval,
        monitor_config.cache_ttl_seconds,
        workers.len()
    );

    let state = AppState {
        payment_service,
        health_monitor: health_monitor.clone(),
        workers: Arc::new(workers),
        redis: redis_conn,
    };

    let app = payments_router::http::routes::router(state.clone());

    let listener = tokio::net::TcpListener::bind(&cfg.bind_addr).await?;
    tracing::info!("listening on {}", cfg.bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("shutting down background tasks");
    for w in state.workers.iter() {
        w.stop().await;
    }
    health_monitor.stop().await;
    records.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
