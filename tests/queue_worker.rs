use payments_router::domain::health::HealthStatus;
use payments_router::domain::payment::{PaymentRequest, ProcessorName, QueueMessage};
use payments_router::error::QueueError;
use payments_router::health::cache::{HealthStatusCache, InMemoryHealthCache};
use payments_router::processors::mock::{MockBehavior, MockProcessor};
use payments_router::queue::memory::InMemoryQueue;
use payments_router::queue::{QueueBackend, QueueManager, PAYMENTS_QUEUE};
use payments_router::routing::policy::FeePreferencePolicy;
use payments_router::service::payment_service::PaymentService;
use payments_router::service::worker::{BackgroundWorker, PaymentWorker};
use payments_router::storage::memory::InMemoryRecordStore;
use payments_router::storage::writer::RecordWriter;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

fn payment(amount: i64) -> PaymentRequest {
    PaymentRequest::new(Uuid::new_v4(), Decimal::new(amount, 0)).unwrap()
}

/// Fails the first `failures` dequeues, then behaves like its inner queue.
struct FlakyQueue {
    inner: InMemoryQueue,
    failures: AtomicUsize,
}

#[async_trait::async_trait]
impl QueueBackend for FlakyQueue {
    async fn enqueue(&self, queue_name: &str, message: QueueMessage) -> Result<(), QueueError> {
        self.inner.enqueue(queue_name, message).await
    }

    async fn dequeue(&self, queue_name: &str) -> Result<Option<QueueMessage>, QueueError> {
        let failing = self
            .failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(QueueError::Malformed("connection reset".to_string()));
        }
        self.inner.dequeue(queue_name).await
    }
}

struct Fixture {
    worker: Arc<PaymentWorker>,
    default: Arc<MockProcessor>,
    cache: InMemoryHealthCache,
    queue: InMemoryQueue,
    store: InMemoryRecordStore,
}

async fn fixture() -> Fixture {
    let default = Arc::new(MockProcessor::new(
        ProcessorName::Default,
        MockBehavior::AlwaysSuccess,
    ));
    let fallback = Arc::new(MockProcessor::new(
        ProcessorName::Fallback,
        MockBehavior::AlwaysSuccess,
    ));
    let cache = InMemoryHealthCache::new();
    cache.set("default", HealthStatus::healthy(10), 3600).await.unwrap();
    cache.set("fallback", HealthStatus::healthy(10), 3600).await.unwrap();

    let queue = InMemoryQueue::new();
    let store = InMemoryRecordStore::new();
    let manager = QueueManager::new(Arc::new(queue.clone()), PAYMENTS_QUEUE);

    let service = PaymentService {
        default: default.clone(),
        fallback,
        health_cache: Arc::new(cache.clone()),
        policy: Arc::new(FeePreferencePolicy::default()),
        queue: manager.clone(),
        records: RecordWriter::spawn(Arc::new(store.clone()), 64),
        record_store: Arc::new(store.clone()),
    };

    Fixture {
        worker: Arc::new(PaymentWorker::new(manager, service)),
        default,
        cache,
        queue,
        store,
    }
}

#[tokio::test]
async fn queue_is_fifo_and_empties() {
    let queue = QueueManager::new(Arc::new(InMemoryQueue::new()), PAYMENTS_QUEUE);
    let (a, b, c) = (payment(1), payment(2), payment(3));
    for p in [&a, &b, &c] {
        queue.add_payment(p).await.unwrap();
    }

    for expected in [&a, &b, &c] {
        let next = queue.next_payment().await.unwrap().unwrap();
        assert_eq!(next.correlation_id, expected.correlation_id);
        assert_eq!(next.amount, expected.amount);
    }
    assert!(queue.next_payment().await.unwrap().is_none());
}

#[tokio::test]
async fn queues_are_isolated_by_name() {
    let backend = Arc::new(InMemoryQueue::new());
    let payments = QueueManager::new(backend.clone(), PAYMENTS_QUEUE);
    let other = QueueManager::new(backend.clone(), "other:queue");

    payments.add_payment(&payment(5)).await.unwrap();

    assert!(other.next_payment().await.unwrap().is_none());
    assert_eq!(backend.len(PAYMENTS_QUEUE).await, 1);
}

#[tokio::test]
async fn malformed_message_is_reported() {
    let backend = Arc::new(InMemoryQueue::new());
    backend
        .enqueue(
            PAYMENTS_QUEUE,
            [("correlationId".to_string(), "nope".to_string())]
                .into_iter()
                .collect(),
        )
        .await
        .unwrap();

    let queue = QueueManager::new(backend, PAYMENTS_QUEUE);
    assert!(queue.next_payment().await.is_err());
}

#[tokio::test]
async fn worker_step_routes_one_payment() {
    let f = fixture().await;
    assert!(!f.worker.process_next_payment().await.unwrap());

    let req = payment(12);
    f.worker.queue.add_payment(&req).await.unwrap();

    assert!(f.worker.process_next_payment().await.unwrap());
    assert_eq!(f.default.seen(), vec![req.correlation_id]);
    assert_eq!(f.queue.len(PAYMENTS_QUEUE).await, 0);
}

#[tokio::test]
async fn failed_routing_still_consumes_the_message() {
    let f = fixture().await;
    f.cache.set("default", HealthStatus::failing(), 3600).await.unwrap();
    f.cache.set("fallback", HealthStatus::failing(), 3600).await.unwrap();
    f.worker.queue.add_payment(&payment(12)).await.unwrap();

    assert!(f.worker.process_next_payment().await.is_err());
    assert_eq!(f.queue.len(PAYMENTS_QUEUE).await, 0);
    assert_eq!(f.default.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn background_worker_drains_queue_and_stops() {
    let f = fixture().await;
    for i in 0..5 {
        f.worker.queue.add_payment(&payment(10 + i)).await.unwrap();
    }

    let bg = BackgroundWorker::new(f.worker.clone(), Duration::from_millis(100));
    assert!(bg.start());
    assert!(!bg.start());
    assert!(bg.is_running());

    for _ in 0..50 {
        if bg.processed_count() == 5 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(bg.processed_count(), 5);

    bg.stop().await;
    assert!(!bg.is_running());
    bg.stop().await;

    f.worker.payment_service.records.flush().await.unwrap();
    assert_eq!(f.store.len().await, 5);

    f.worker.queue.add_payment(&payment(99)).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(f.queue.len(PAYMENTS_QUEUE).await, 1);
}

#[tokio::test(start_paused = true)]
async fn concurrent_workers_never_share_a_message() {
    let f = fixture().await;
    let mut expected = HashSet::new();
    for i in 0..20 {
        let req = payment(1 + i);
        expected.insert(req.correlation_id);
        f.worker.queue.add_payment(&req).await.unwrap();
    }

    let workers: Vec<BackgroundWorker> = (0..3)
        .map(|_| BackgroundWorker::new(f.worker.clone(), Duration::from_millis(10)))
        .collect();
    for w in &workers {
        w.start();
    }

    for _ in 0..200 {
        if f.queue.len(PAYMENTS_QUEUE).await == 0 && f.default.calls() == 20 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    for w in &workers {
        w.stop().await;
    }

    let seen = f.default.seen();
    assert_eq!(seen.len(), 20);
    assert_eq!(seen.into_iter().collect::<HashSet<_>>(), expected);
    assert_eq!(
        workers.iter().map(BackgroundWorker::processed_count).sum::<u64>(),
        20
    );
}

#[tokio::test(start_paused = true)]
async fn worker_survives_dequeue_errors() {
    let f = fixture().await;
    let inner = InMemoryQueue::new();
    let flaky = QueueManager::new(
        Arc::new(FlakyQueue {
            inner: inner.clone(),
            failures: AtomicUsize::new(1),
        }),
        PAYMENTS_QUEUE,
    );
    let req = payment(30);
    flaky.add_payment(&req).await.unwrap();

    let worker = Arc::new(PaymentWorker::new(
        flaky,
        f.worker.payment_service.clone(),
    ));
    let bg = BackgroundWorker::new(worker, Duration::from_millis(100));
    bg.start();

    // first poll hits the error and backs off
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(bg.is_running());
    assert_eq!(bg.processed_count(), 0);
    assert_eq!(inner.len(PAYMENTS_QUEUE).await, 1);

    for _ in 0..20 {
        if bg.processed_count() == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    assert_eq!(bg.processed_count(), 1);
    assert!(bg.is_running());
    assert_eq!(f.default.seen(), vec![req.correlation_id]);
    assert_eq!(inner.len(PAYMENTS_QUEUE).await, 0);

    bg.stop().await;
}
