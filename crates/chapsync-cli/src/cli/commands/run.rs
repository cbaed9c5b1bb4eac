//! `chapsync run` – download the chapters listed in a manifest.

use anyhow::{Context, Result};
use chapsync_core::config::SyncConfig;
use chapsync_core::control::CancellationToken;
use chapsync_core::downloader::HttpClient;
use chapsync_core::scheduler::WorkerPool;
use std::path::PathBuf;

use crate::cli::manifest;

const QUEUE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct RunOptions {
    pub manifest: PathBuf,
    pub chapter: Option<String>,
    pub workers: Option<usize>,
}

impl RunOptions {
    /// Single-chapter mode runs one worker; otherwise the flag wins over config.
    fn worker_count(&self, cfg: &SyncConfig) -> usize {
        if self.chapter.is_some() {
            1
        } else {
            self.workers.unwrap_or(cfg.workers).max(1)
        }
    }
}

pub async fn run_sync(cfg: &SyncConfig, opts: RunOptions) -> Result<()> {
    let reader = manifest::open(&opts.manifest).await?;

    let cancel = CancellationToken::new();
    let signal_handle = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("interrupt received, finishing in-flight transfers");
                cancel.cancel();
            }
        })
    };

    let (tx, rx) = tokio::sync::mpsc::channel(QUEUE_DEPTH);
    let feeder = {
        let cancel = cancel.clone();
        let only = opts.chapter.clone();
        tokio::spawn(async move { manifest::feed_jobs(reader, only.as_deref(), tx, cancel).await })
    };

    let single_chapter = opts.chapter.is_some();
    let pool = WorkerPool::from_config(
        cfg,
        HttpClient::new(&cfg.http),
        cancel.clone(),
        single_chapter,
    );
    let workers = opts.worker_count(cfg);
    tracing::info!(workers, single_chapter, "starting chapter workers");

    let records = pool.run(rx, workers).await;
    let queued = feeder.await.context("manifest reader join")??;
    signal_handle.abort();

    let archived: usize = records.iter().map(|r| r.len()).sum();
    if let Some(id) = &opts.chapter {
        if queued == 0 {
            anyhow::bail!("chapter {} not found in manifest", id);
        }
    }
    if cancel.is_cancelled() {
        println!("Interrupted: archived {} of {} queued chapter(s).", archived, queued);
    } else {
        println!("Archived {} of {} chapter(s).", archived, queued);
    }
    tracing::info!(archived, queued, "run completed");
    Ok(())
}
