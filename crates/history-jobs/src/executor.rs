//! Bounded queue plus a single persistence worker.
//!
//! One executor exists per import service, so per entity type and engine.
//! The single worker is what makes persistence FIFO within an executor.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::config::ExecutorConfig;
use crate::error::JobError;
use crate::job::ImportJob;
use crate::stats::{ExecutorStats, StatsCounters};
use crate::writer::DocumentWriter;

/// Asynchronous, bounded, draining job executor.
pub struct JobExecutor<T> {
    name: String,
    capacity: usize,
    sender: Mutex<Option<mpsc::Sender<ImportJob<T>>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    pending: Arc<AtomicUsize>,
    stats: Arc<StatsCounters>,
}

impl<T: Send + Sync + 'static> JobExecutor<T> {
    /// Create the executor and start its worker on the current runtime.
    pub fn spawn(
        name: impl Into<String>,
        config: &ExecutorConfig,
        writer: Arc<dyn DocumentWriter<T>>,
    ) -> Self {
        let name = name.into();
        let capacity = config.effective_capacity();
        let (sender, receiver) = mpsc::channel(capacity);
        let pending = Arc::new(AtomicUsize::new(0));
        let stats = Arc::new(StatsCounters::default());

        let handle = tokio::spawn(run_worker(
            name.clone(),
            receiver,
            writer,
            pending.clone(),
            stats.clone(),
        ));

        debug!(executor = %name, capacity, "Job executor started");

        Self {
            name,
            capacity,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            pending,
            stats,
        }
    }

    /// Enqueue a job, waiting while the queue is full.
    ///
    /// The wait is the pipeline's only backpressure point. After
    /// [`shutdown`](Self::shutdown) the job is completed immediately and
    /// [`JobError::Closed`] is returned.
    pub async fn submit(&self, job: ImportJob<T>) -> Result<(), JobError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let Some(sender) = sender else {
            return Err(self.reject(job));
        };

        // reserve() is cancel safe; counters move only once a slot is held
        let permit = match sender.reserve().await {
            Ok(permit) => permit,
            Err(_) => return Err(self.reject(job)),
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        self.stats.record_submit();
        debug!(executor = %self.name, items = job.len(), "Job submitted");
        permit.send(job);
        Ok(())
    }

    fn reject(&self, job: ImportJob<T>) -> JobError {
        warn!(executor = %self.name, items = job.len(), "Executor closed, completing job without persisting");
        self.stats.record_reject();
        job.complete();
        JobError::Closed(self.name.clone())
    }

    /// True while a job is queued or being persisted.
    pub fn has_pending_work(&self) -> bool {
        self.pending.load(Ordering::SeqCst) > 0
    }

    /// Stop accepting jobs, persist everything already queued, then return.
    ///
    /// Calling it again is a no-op.
    pub async fn shutdown(&self) -> Result<(), JobError> {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let handle = self
            .worker
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();

        let Some(handle) = handle else {
            return Ok(());
        };

        info!(executor = %self.name, pending = self.pending.load(Ordering::SeqCst), "Draining job executor");
        drop(sender);

        match handle.await {
            Ok(()) => {
                info!(executor = %self.name, "Job executor shut down");
                Ok(())
            }
            Err(e) => {
                error!(executor = %self.name, error = %e, "Job executor worker failed");
                Err(JobError::WorkerPanicked(self.name.clone()))
            }
        }
    }

    /// Whether `submit` still accepts jobs.
    pub fn is_open(&self) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> ExecutorStats {
        self.stats.snapshot()
    }

    /// Executor name, used in logs.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Queue capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

async fn run_worker<T: Send + Sync + 'static>(
    name: String,
    mut receiver: mpsc::Receiver<ImportJob<T>>,
    writer: Arc<dyn DocumentWriter<T>>,
    pending: Arc<AtomicUsize>,
    stats: Arc<StatsCounters>,
) {
    while let Some(job) = receiver.recv().await {
        let items = job.len();
        let result = if job.is_empty() {
            Ok(())
        } else {
            writer.persist(job.items()).await
        };

        match result {
            Ok(()) => {
                stats.record_success(items);
                debug!(executor = %name, writer = writer.name(), items, "Job persisted");
            }
            Err(e) if e.is_recoverable() => {
                stats.record_failure();
                warn!(executor = %name, writer = writer.name(), items, error = %e, "Job persistence failed");
            }
            Err(e) => {
                stats.record_failure();
                error!(executor = %name, writer = writer.name(), items, error = %e, "Job persistence failed");
            }
        }

        pending.fetch_sub(1, Ordering::SeqCst);
        job.complete();
    }
    debug!(executor = %name, "Job executor worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PersistError;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;
    use tokio::sync::{oneshot, Semaphore};

    /// Records batches; optionally waits on a gate before each write.
    struct TestWriter {
        batches: Mutex<Vec<Vec<u32>>>,
        gate: Option<Semaphore>,
        fail: AtomicBool,
    }

    impl TestWriter {
        fn new() -> Self {
            Self {
                batches: Mutex::new(Vec::new()),
                gate: None,
                fail: AtomicBool::new(false),
            }
        }

        fn gated() -> Self {
            Self {
                gate: Some(Semaphore::new(0)),
                ..Self::new()
            }
        }

        fn release(&self, jobs: usize) {
            if let Some(gate) = &self.gate {
                gate.add_permits(jobs);
            }
        }

        fn batches(&self) -> Vec<Vec<u32>> {
            self.batches.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentWriter<u32> for TestWriter {
        async fn persist(&self, batch: &[u32]) -> Result<(), PersistError> {
            if let Some(gate) = &self.gate {
                gate.acquire().await.unwrap().forget();
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(PersistError::Recoverable("store unavailable".to_string()));
            }
            self.batches.lock().unwrap().push(batch.to_vec());
            Ok(())
        }
    }

    fn job(items: Vec<u32>) -> (ImportJob<u32>, oneshot::Receiver<()>) {
        let (tx, rx) = oneshot::channel();
        let job = ImportJob::new(
            items,
            Box::new(move || {
                let _ = tx.send(());
            }),
        );
        (job, rx)
    }

    #[tokio::test]
    async fn test_jobs_persist_in_submission_order() {
        let writer = Arc::new(TestWriter::new());
        let executor = JobExecutor::spawn("fifo", &ExecutorConfig::with_capacity(2), writer.clone());

        let mut receivers = Vec::new();
        for i in 0..5 {
            let (job, rx) = job(vec![i, i + 100]);
            executor.submit(job).await.unwrap();
            receivers.push(rx);
        }
        for rx in receivers {
            rx.await.unwrap();
        }

        let firsts: Vec<u32> = writer.batches().iter().map(|b| b[0]).collect();
        assert_eq!(firsts, vec![0, 1, 2, 3, 4]);
        let stats = executor.stats();
        assert_eq!(stats.submitted, 5);
        assert_eq!(stats.completed, 5);
        assert_eq!(stats.items_persisted, 10);
    }

    #[tokio::test]
    async fn test_failed_persist_still_completes() {
        let writer = Arc::new(TestWriter::new());
        writer.fail.store(true, Ordering::SeqCst);
        let executor = JobExecutor::spawn("failing", &ExecutorConfig::default(), writer.clone());

        let (job, rx) = job(vec![1]);
        executor.submit(job).await.unwrap();
        tokio::time::timeout(Duration::from_secs(1), rx)
            .await
            .unwrap()
            .unwrap();

        let stats = executor.stats();
        assert_eq!(stats.failed, 1);
        assert_eq!(stats.items_persisted, 0);

        // Worker keeps running after a failure
        writer.fail.store(false, Ordering::SeqCst);
        let (job, rx) = self::job(vec![2]);
        executor.submit(job).await.unwrap();
        rx.await.unwrap();
        assert_eq!(writer.batches(), vec![vec![2]]);
    }

    #[tokio::test]
    async fn test_submit_blocks_when_queue_full() {
        let writer = Arc::new(TestWriter::gated());
        let executor = Arc::new(JobExecutor::spawn(
            "bounded",
            &ExecutorConfig::with_capacity(1),
            writer.clone(),
        ));

        // First job is picked up by the worker and parks on the gate
        let (first, first_rx) = job(vec![1]);
        executor.submit(first).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Second job fills the single slot
        let (second, _second_rx) = job(vec![2]);
        executor.submit(second).await.unwrap();

        // Third has to wait
        let (third, _third_rx) = job(vec![3]);
        let blocked = {
            let executor = executor.clone();
            tokio::spawn(async move { executor.submit(third).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!blocked.is_finished());
        assert!(executor.has_pending_work());

        writer.release(3);
        blocked.await.unwrap().unwrap();
        first_rx.await.unwrap();

        executor.shutdown().await.unwrap();
        assert_eq!(writer.batches(), vec![vec![1], vec![2], vec![3]]);
        assert!(!executor.has_pending_work());
    }

    #[tokio::test]
    async fn test_shutdown_drains_queue() {
        let writer = Arc::new(TestWriter::gated());
        let executor = JobExecutor::spawn("drain", &ExecutorConfig::with_capacity(8), writer.clone());

        let mut receivers = Vec::new();
        for i in 0..4 {
            let (job, rx) = job(vec![i]);
            executor.submit(job).await.unwrap();
            receivers.push(rx);
        }

        writer.release(4);
        executor.shutdown().await.unwrap();

        for rx in receivers {
            rx.await.unwrap();
        }
        assert_eq!(writer.batches().len(), 4);
        assert_eq!(executor.stats().completed, 4);
    }

    #[tokio::test]
    async fn test_submit_after_shutdown_completes_job() {
        let writer = Arc::new(TestWriter::new());
        let executor = JobExecutor::spawn("closed", &ExecutorConfig::default(), writer.clone());
        executor.shutdown().await.unwrap();
        assert!(!executor.is_open());

        let (job, rx) = job(vec![9]);
        let result = executor.submit(job).await;
        assert!(matches!(result, Err(JobError::Closed(_))));
        rx.await.unwrap();
        assert!(writer.batches().is_empty());
        assert_eq!(executor.stats().rejected, 1);

        // Second shutdown is a no-op
        executor.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_has_pending_work_while_persisting() {
        let writer = Arc::new(TestWriter::gated());
        let executor = JobExecutor::spawn("pending", &ExecutorConfig::default(), writer.clone());
        assert!(!executor.has_pending_work());

        let (job, rx) = job(vec![1]);
        executor.submit(job).await.unwrap();
        assert!(executor.has_pending_work());

        writer.release(1);
        rx.await.unwrap();
        assert!(!executor.has_pending_work());
    }
}
