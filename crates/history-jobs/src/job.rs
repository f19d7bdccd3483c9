//! A page's worth of documents plus its completion callback.

/// Completion callback, run exactly once per job.
pub type OnComplete = Box<dyn FnOnce() + Send + 'static>;

/// Single-use unit of work handed to a [`crate::JobExecutor`].
///
/// The callback fires when the job is completed explicitly or, failing
/// that, when the job is dropped. A job lost to a panicking writer or a
/// closed queue therefore still releases its caller.
pub struct ImportJob<T> {
    items: Vec<T>,
    on_complete: Option<OnComplete>,
}

impl<T> ImportJob<T> {
    /// Create a job from a batch and its callback.
    pub fn new(items: Vec<T>, on_complete: OnComplete) -> Self {
        Self {
            items,
            on_complete: Some(on_complete),
        }
    }

    /// Documents in this job, in mapping order.
    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Number of documents.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the job carries no documents.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Run the completion callback now.
    pub fn complete(mut self) {
        self.fire();
    }

    fn fire(&mut self) {
        if let Some(callback) = self.on_complete.take() {
            callback();
        }
    }
}

impl<T> Drop for ImportJob<T> {
    fn drop(&mut self) {
        self.fire();
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for ImportJob<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImportJob")
            .field("items", &self.items)
            .field("completed", &self.on_complete.is_none())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_job(items: Vec<u32>) -> (ImportJob<u32>, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let job = ImportJob::new(
            items,
            Box::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );
        (job, calls)
    }

    #[test]
    fn test_complete_runs_callback_once() {
        let (job, calls) = counting_job(vec![1, 2, 3]);
        assert_eq!(job.len(), 3);
        assert_eq!(job.items(), &[1, 2, 3]);
        job.complete();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_runs_callback() {
        let (job, calls) = counting_job(Vec::new());
        assert!(job.is_empty());
        drop(job);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
