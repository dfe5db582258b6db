use std::future::Future;
use std::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns at most one long-lived background task and its cancellation token.
pub struct TaskSlot {
    name: &'static str,
    running: Mutex<Option<Running>>,
}

impl TaskSlot {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            running: Mutex::new(None),
        }
    }

    /// Spawns the task unless one is already running. Returns whether a new
    /// task was spawned.
    pub fn start<F, Fut>(&self, task: F) -> bool
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let Ok(mut running) = self.running.lock() else {
            return false;
        };
        if running.as_ref().is_some_and(|r| !r.handle.is_finished()) {
            return false;
        }

        let token = CancellationToken::new();
        let handle = tokio::spawn(task(token.clone()));
        *running = Some(Running { token, handle });
        tracing::info!("{} started", self.name);
        true
    }

    /// Cancels the task and waits for it to finish. No-op when idle.
    pub async fn stop(&self) {
        let running = self.running.lock().ok().and_then(|mut r| r.take());
        let Some(running) = running else {
            return;
        };

        running.token.cancel();
        match running.handle.await {
            Ok(()) => {}
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::error!("{} ended abnormally: {}", self.name, e),
        }
        tracing::info!("{} stopped", self.name);
    }

    pub fn is_running(&self) -> bool {
        self.running
            .lock()
            .map(|r| r.as_ref().is_some_and(|r| !r.handle.is_finished()))
            .unwrap_or(false)
    }
}
