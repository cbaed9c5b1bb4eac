//! Process one chapter job: pace, resolve, fan out page transfers, fan in, archive.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

use crate::archive::{pack_directory, ArchiveError};
use crate::config::SyncConfig;
use crate::control::CancellationToken;
use crate::downloader::{
    fetch_page, page_file_name, page_url, resolve_distribution, HttpClient, ResolveError,
    TransferError,
};
use crate::model::ChapterJob;

use super::gate::RateGate;
use super::slots::TransferSlots;

/// Why a chapter produced no archive (cancellation is not an error; see `ChapterOutcome`).
#[derive(Debug, thiserror::Error)]
pub enum ChapterError {
    #[error("create staging dir under {path}: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("resolve distribution: {0}")]
    Resolve(#[from] ResolveError),
    #[error("{failed} of {total} pages failed (first: {first})")]
    Page {
        failed: usize,
        total: usize,
        first: TransferError,
    },
    #[error("archive: {0}")]
    Archive(#[from] ArchiveError),
    #[error("archive task: {0}")]
    Task(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterOutcome {
    /// Every page downloaded and the archive was written.
    Archived { pages: usize },
    /// Shutdown was signalled before the chapter could finish. No archive was written.
    Cancelled,
}

/// Downloads chapters. Shared by all workers; holds the process-wide gate and slot pool.
#[derive(Debug)]
pub struct ChapterProcessor {
    client: HttpClient,
    gate: Arc<RateGate>,
    slots: Arc<TransferSlots>,
    cancel: CancellationToken,
    temp_root: PathBuf,
    resolve_endpoint: String,
}

impl ChapterProcessor {
    pub fn new(
        client: HttpClient,
        gate: Arc<RateGate>,
        slots: Arc<TransferSlots>,
        cancel: CancellationToken,
        temp_root: impl Into<PathBuf>,
        resolve_endpoint: impl Into<String>,
    ) -> Self {
        Self {
            client,
            gate,
            slots,
            cancel,
            temp_root: temp_root.into(),
            resolve_endpoint: resolve_endpoint.into(),
        }
    }

    /// Builds a processor from config. `single_chapter` disables rate pacing.
    /// Must be called inside a Tokio runtime.
    pub fn from_config(
        cfg: &SyncConfig,
        client: HttpClient,
        cancel: CancellationToken,
        single_chapter: bool,
    ) -> Self {
        let gate = if single_chapter {
            RateGate::unpaced()
        } else {
            RateGate::default()
        };
        Self::new(
            client,
            Arc::new(gate),
            Arc::new(TransferSlots::new(cfg.transfer_slots)),
            cancel,
            cfg.temp_root(),
            cfg.resolve_endpoint.clone(),
        )
    }

    pub fn slots(&self) -> &Arc<TransferSlots> {
        &self.slots
    }

    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Downloads every page of `job.chapter` and archives them at `job.archive_path`.
    ///
    /// The staging directory is removed on every path. All page tasks are
    /// joined before this returns, including after cancellation. If the
    /// returned future is dropped early, transfers already started keep their
    /// slots until curl finishes.
    pub async fn process(&self, job: &ChapterJob) -> Result<ChapterOutcome, ChapterError> {
        let chapter = &job.chapter;
        tracing::debug!(
            chapter = %chapter.id,
            archive = %job.archive_path.display(),
            "started downloading"
        );

        let staging = tempfile::Builder::new()
            .prefix("chapsync")
            .tempdir_in(&self.temp_root)
            .map_err(|source| ChapterError::Staging {
                path: self.temp_root.clone(),
                source,
            })?;

        if self.gate.acquire(&self.cancel).await.is_err() {
            return Ok(ChapterOutcome::Cancelled);
        }

        let dist =
            resolve_distribution(&self.client, &self.resolve_endpoint, &chapter.id).await?;

        let pages = chapter.page_filenames();
        let total = pages.len();
        let mut tasks = JoinSet::new();
        let mut cancelled = false;
        for (index, name) in pages.iter().enumerate() {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }
            let url = page_url(&dist.base_url, chapter.hash(), name);
            let dest = staging.path().join(page_file_name(index, total, name));
            let client = self.client.clone();
            let slots = Arc::clone(&self.slots);
            let cancel = self.cancel.clone();
            let chapter_id = chapter.id.clone();
            tasks.spawn(async move {
                let res = transfer_page(&client, &slots, &cancel, &url, &dest).await;
                if let Err(e) = &res {
                    if !e.is_closed() {
                        tracing::error!(
                            chapter = %chapter_id,
                            page = index + 1,
                            url = %url,
                            "page download failed: {}",
                            e
                        );
                    }
                }
                res
            });
        }

        let launched = tasks.len();
        let mut failed = 0usize;
        let mut first: Option<TransferError> = None;
        while let Some(joined) = tasks.join_next().await {
            let res = joined.unwrap_or_else(|e| {
                Err(TransferError::Io(io::Error::other(format!("page task: {}", e))))
            });
            match res {
                Ok(_) => {}
                Err(TransferError::Closed) => cancelled = true,
                Err(e) => {
                    failed += 1;
                    first.get_or_insert(e);
                }
            }
        }

        if let Some(first) = first {
            return Err(ChapterError::Page {
                failed,
                total,
                first,
            });
        }
        if cancelled || self.cancel.is_cancelled() {
            tracing::debug!(
                chapter = %chapter.id,
                launched,
                "chapter interrupted by shutdown"
            );
            return Ok(ChapterOutcome::Cancelled);
        }

        let staging_path = staging.path().to_path_buf();
        let archive_path = job.archive_path.clone();
        let entries =
            tokio::task::spawn_blocking(move || pack_directory(&staging_path, &archive_path))
                .await
                .map_err(|e| ChapterError::Task(e.to_string()))??;

        if let Err(e) = staging.close() {
            tracing::warn!(chapter = %chapter.id, "remove staging dir: {}", e);
        }

        tracing::debug!(
            chapter = %chapter.id,
            archive = %job.archive_path.display(),
            pages = entries,
            "finished downloading"
        );
        Ok(ChapterOutcome::Archived { pages: entries })
    }
}

/// One page: check shutdown, take a slot, download, release the slot.
async fn transfer_page(
    client: &HttpClient,
    slots: &TransferSlots,
    cancel: &CancellationToken,
    url: &str,
    dest: &Path,
) -> Result<u64, TransferError> {
    if cancel.is_cancelled() {
        return Err(TransferError::Closed);
    }
    let slot = slots.acquire(cancel).await?;

    let client = client.clone();
    let url = url.to_string();
    let dest = dest.to_path_buf();
    // The slot lives as long as the curl transfer, even if this task is aborted.
    tokio::task::spawn_blocking(move || {
        let _slot = slot;
        fetch_page(&client, &url, &dest)
    })
    .await
    .map_err(|e| TransferError::Io(io::Error::other(format!("page task: {}", e))))?
}
