use crate::health::monitor::HealthMonitor;
use crate::service::payment_service::PaymentService;
use crate::service::worker::BackgroundWorker;
use redis::aio::ConnectionManager;
use std::sync::Arc;

pub mod config;
pub mod domain {
    pub mod health;
    pub mod payment;
}
pub mod error;
pub mod health {
    pub mod cache;
    pub mod monitor;
    pub mod probe;
    pub mod store_redis;
}
pub mod http {
    pub mod handlers {
        pub mod ops;
        pub mod payments;
    }
    pub mod routes;
}
pub mod processors;
pub mod queue;
pub mod routing {
    pub mod policy;
}
pub mod service {
    pub mod payment_service;
    pub mod task;
    pub mod worker;
}
pub mod storage;

#[derive(Clone)]
pub struct AppState {
    pub payment_service: PaymentService,
    pub health_monitor: Arc<HealthMonitor>,
    pub workers: Arc<Vec<BackgroundWorker>>,
    /// `None` when running on in-memory backends.
    pub redis: Option<ConnectionManager>,
}

impl AppState {
    pub fn is_health_monitor_running(&self) -> bool {
        self.health_monitor.is_running()
    }

    pub fn are_workers_running(&self) -> bool {
        !self.workers.is_empty() && self.workers.iter().all(BackgroundWorker::is_running)
    }
}
