use crate::domain::payment::ProcessorRecord;
use crate::error::StorageError;
use crate::service::task::TaskSlot;
use crate::storage::RecordStore;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;

enum Command {
    Store(ProcessorRecord),
    Flush(oneshot::Sender<()>),
}

/// Hands records to a single writer task through a bounded buffer so the
/// payment path does not wait on storage round trips. `submit` waits for
/// buffer space; nothing is dropped.
#[derive(Clone)]
pub struct RecordWriter {
    tx: mpsc::Sender<Command>,
    task: Arc<TaskSlot>,
}

impl RecordWriter {
    pub fn spawn(store: Arc<dyn RecordStore>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = Arc::new(TaskSlot::new("record writer"));
        task.start(move |token| run(store, rx, token));
        Self { tx, task }
    }

    pub async fn submit(&self, record: ProcessorRecord) -> Result<(), StorageError> {
        self.tx
            .send(Command::Store(record))
            .await
            .map_err(|_| StorageError::WriterClosed)
    }

    /// Resolves once every record submitted before this call was written
    /// (or its failure logged).
    pub async fn flush(&self) -> Result<(), StorageError> {
        let (ack, done) = oneshot::channel();
        self.tx
            .send(Command::Flush(ack))
            .await
            .map_err(|_| StorageError::WriterClosed)?;
        done.await.map_err(|_| StorageError::WriterClosed)
    }

    /// Writes out everything still buffered, then stops the writer task.
    pub async fn shutdown(&self) {
        self.task.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.task.is_running()
    }
}

async fn run(
    store: Arc<dyn RecordStore>,
    mut rx: mpsc::Receiver<Command>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            command = rx.recv() => match command {
                Some(command) => handle(store.as_ref(), command).await,
                None => break,
            },
            _ = token.cancelled() => {
                rx.close();
                while let Some(command) = rx.recv().await {
                    handle(store.as_ref(), command).await;
                }
                break;
            }
        }
    }
}

async fn handle(store: &dyn RecordStore, command: Command) {
    match command {
        Command::Store(record) => {
            if let Err(e) = store.store_payment(&record).await {
                tracing::error!(
                    "failed to store payment {} ({}): {}",
                    record.correlation_id,
                    record.processor,
                    e
                );
            }
        }
        Command::Flush(ack) => {
            let _ = ack.send(());
        }
    }
}
