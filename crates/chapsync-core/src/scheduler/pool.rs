//! Fixed pool of chapter workers draining a shared job queue.
//!
//! Each worker runs chapters one after another and keeps its own
//! `CompletionRecord`. When a worker stops (queue closed or shutdown) it
//! hands its record to the change reporter, if one is configured.

use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinSet;

use crate::config::SyncConfig;
use crate::control::CancellationToken;
use crate::downloader::HttpClient;
use crate::model::{ChapterJob, CompletionRecord};
use crate::report::ChangeReporter;

use super::chapter::{ChapterOutcome, ChapterProcessor};

pub struct WorkerPool {
    processor: Arc<ChapterProcessor>,
    reporter: Option<Arc<ChangeReporter>>,
}

impl WorkerPool {
    pub fn new(processor: Arc<ChapterProcessor>) -> Self {
        Self {
            processor,
            reporter: None,
        }
    }

    pub fn with_reporter(mut self, reporter: Option<Arc<ChangeReporter>>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Wires processor, gate, slot pool and reporter from config.
    /// Must be called inside a Tokio runtime.
    pub fn from_config(
        cfg: &SyncConfig,
        client: HttpClient,
        cancel: CancellationToken,
        single_chapter: bool,
    ) -> Self {
        let processor = ChapterProcessor::from_config(cfg, client, cancel, single_chapter);
        let reporter = cfg
            .report_path()
            .map(|path| Arc::new(ChangeReporter::new(path)));
        Self::new(Arc::new(processor)).with_reporter(reporter)
    }

    pub fn processor(&self) -> &Arc<ChapterProcessor> {
        &self.processor
    }

    /// Runs `pool_size` workers (at least one) until `jobs` is closed and
    /// drained, or shutdown is signalled. Returns one record per worker,
    /// ordered by worker index.
    pub async fn run(
        &self,
        jobs: mpsc::Receiver<ChapterJob>,
        pool_size: usize,
    ) -> Vec<CompletionRecord> {
        let pool_size = pool_size.max(1);
        let jobs = Arc::new(Mutex::new(jobs));

        let mut join_set = JoinSet::new();
        for worker in 0..pool_size {
            let jobs = Arc::clone(&jobs);
            let processor = Arc::clone(&self.processor);
            let reporter = self.reporter.clone();
            join_set.spawn(run_worker(worker, jobs, processor, reporter));
        }

        let mut records = Vec::with_capacity(pool_size);
        while let Some(res) = join_set.join_next().await {
            match res {
                Ok(record) => records.push(record),
                Err(e) => tracing::error!("chapter worker join: {}", e),
            }
        }
        records.sort_by_key(|r| r.worker);
        records
    }
}

/// Next job from the shared queue, or `None` when the queue is closed or shutdown fires.
async fn next_job(
    jobs: &Mutex<mpsc::Receiver<ChapterJob>>,
    cancel: &CancellationToken,
) -> Option<ChapterJob> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        job = async { jobs.lock().await.recv().await } => job,
    }
}

async fn run_worker(
    worker: usize,
    jobs: Arc<Mutex<mpsc::Receiver<ChapterJob>>>,
    processor: Arc<ChapterProcessor>,
    reporter: Option<Arc<ChangeReporter>>,
) -> CompletionRecord {
    let cancel = processor.cancel_token().clone();
    let mut record = CompletionRecord::new(worker);

    while let Some(job) = next_job(&jobs, &cancel).await {
        if cancel.is_cancelled() {
            break;
        }
        match processor.process(&job).await {
            Ok(ChapterOutcome::Archived { pages }) => {
                tracing::info!(
                    worker,
                    chapter = %job.chapter.id,
                    pages,
                    "archived {}",
                    job.archive_path.display()
                );
                record.push(job.chapter);
            }
            Ok(ChapterOutcome::Cancelled) => {}
            Err(e) => {
                tracing::error!(worker, chapter = %job.chapter.id, "chapter failed: {}", e);
            }
        }
    }

    tracing::debug!(worker, completed = record.len(), "chapter worker stopped");
    if let Some(reporter) = reporter {
        if !record.is_empty() {
            reporter.report(&record.chapters).await;
        }
    }
    record
}
