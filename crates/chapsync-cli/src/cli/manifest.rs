//! Job manifest: one JSON `ChapterJob` per line, from a file or stdin.
//!
//! The manifest is produced by a catalog listing; this module only feeds it
//! into the worker pool's queue.

use anyhow::{Context, Result};
use chapsync_core::control::CancellationToken;
use chapsync_core::model::ChapterJob;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Opens `path` for line reading; "-" means stdin.
pub async fn open(path: &Path) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(BufReader::new(tokio::io::stdin())));
    }
    let file = tokio::fs::File::open(path)
        .await
        .with_context(|| format!("open manifest: {}", path.display()))?;
    Ok(Box::new(BufReader::new(file)))
}

/// Parses one manifest line. Blank lines yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ChapterJob>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let job = serde_json::from_str(line).context("invalid chapter job")?;
    Ok(Some(job))
}

/// Sends every job in `reader` to `tx` until EOF, shutdown, or the pool hangs up.
/// Malformed lines are logged and skipped. With `only`, just that chapter is
/// queued and reading stops at the first match. Returns the number queued.
pub async fn feed_jobs<R>(
    reader: R,
    only: Option<&str>,
    tx: mpsc::Sender<ChapterJob>,
    cancel: CancellationToken,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    let mut queued = 0usize;
    let mut line_no = 0usize;

    loop {
        let line = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            line = lines.next_line() => line.context("read manifest")?,
        };
        let Some(line) = line else { break };
        line_no += 1;

        let job = match parse_line(&line) {
            Ok(Some(job)) => job,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!(line = line_no, "skipping manifest entry: {:#}", e);
                continue;
            }
        };
        if only.is_some_and(|id| id != job.chapter.id) {
            continue;
        }

        if tx.send(job).await.is_err() {
            break;
        }
        queued += 1;
        if only.is_some() {
            break;
        }
    }

    Ok(queued)
}
