//! Shared page-import template.
//!
//! Every entity type runs the same flow: map the page, and either submit
//! one job with the surviving documents or complete the page directly.
//! What differs per entity type lives in its [`ImportStrategy`].

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use history_jobs::{DocumentWriter, ExecutorConfig, ExecutorStats, ImportJob, JobExecutor, OnComplete};
use history_types::EntityType;

use crate::error::ImportError;
use crate::stats::PageStats;

/// Entity-specific half of an import service.
#[async_trait]
pub trait ImportStrategy: Send + Sync {
    /// Engine record type of one page entry
    type Record: Send + 'static;
    /// Store document type
    type Document: Send + Sync + 'static;

    fn entity_type(&self) -> EntityType;

    fn engine_alias(&self) -> &str;

    /// Resolve, map, filter, and adapt one page.
    ///
    /// Malformed or unresolvable records are logged, counted in `stats`,
    /// and left out of the result; they never fail the page.
    async fn map_page(
        &self,
        page: Vec<Self::Record>,
        stats: &mut PageStats,
    ) -> Vec<Self::Document>;
}

/// Import service for one entity type of one engine.
pub struct ImportService<S: ImportStrategy> {
    strategy: S,
    executor: JobExecutor<S::Document>,
}

impl<S: ImportStrategy> ImportService<S> {
    /// Wrap a strategy and an already running executor.
    pub fn new(strategy: S, executor: JobExecutor<S::Document>) -> Self {
        Self { strategy, executor }
    }

    /// Start a dedicated executor for `strategy`.
    pub fn spawn(
        strategy: S,
        config: &ExecutorConfig,
        writer: Arc<dyn DocumentWriter<S::Document>>,
    ) -> Self {
        let name = format!("{}/{}", strategy.engine_alias(), strategy.entity_type());
        let executor = JobExecutor::spawn(name, config, writer);
        Self::new(strategy, executor)
    }

    /// Import one page.
    ///
    /// An empty page does nothing, not even call `on_complete`. Otherwise
    /// `on_complete` runs exactly once: after persistence if a job was
    /// submitted, or right away if nothing survived mapping.
    pub async fn execute_import(
        &self,
        page: Vec<S::Record>,
        on_complete: OnComplete,
    ) -> Result<PageStats, ImportError> {
        if page.is_empty() {
            debug!(entity = %self.strategy.entity_type(), "Empty page, nothing to import");
            return Ok(PageStats::default());
        }

        let mut stats = PageStats::new(page.len());
        let documents = self.strategy.map_page(page, &mut stats).await;

        if documents.is_empty() {
            debug!(
                entity = %self.strategy.entity_type(),
                received = stats.received,
                dropped = stats.dropped,
                "No documents to persist, completing page"
            );
            on_complete();
            return Ok(stats);
        }

        stats.submitted = documents.len();
        debug!(
            entity = %self.strategy.entity_type(),
            received = stats.received,
            dropped = stats.dropped,
            submitted = stats.submitted,
            "Submitting import job"
        );
        self.executor
            .submit(ImportJob::new(documents, on_complete))
            .await?;
        Ok(stats)
    }

    /// True while this service's executor has queued or running jobs.
    pub fn has_pending_work(&self) -> bool {
        self.executor.has_pending_work()
    }

    /// Drain and stop the executor.
    pub async fn shutdown(&self) -> Result<(), ImportError> {
        self.executor.shutdown().await?;
        Ok(())
    }

    pub fn stats(&self) -> ExecutorStats {
        self.executor.stats()
    }

    pub fn entity_type(&self) -> EntityType {
        self.strategy.entity_type()
    }

    pub fn strategy(&self) -> &S {
        &self.strategy
    }
}
