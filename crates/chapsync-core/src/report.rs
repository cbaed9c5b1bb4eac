//! Change report: an HTML fragment listing newly archived chapters, prepended
//! to whatever the previous run left at the report path.
//!
//! Reporting never fails a chapter. Every error is logged and dropped.

use crate::model::ChapterMetadata;
use std::io;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("read previous report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("write report {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub(crate) fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Renders the fragment for `chapters` followed by `previous` byte for byte.
/// The previous report is not required to be UTF-8.
pub fn render(chapters: &[ChapterMetadata], previous: &[u8]) -> Vec<u8> {
    let mut fragment = String::from("<section class=\"chapsync-diff\">\n");
    for ch in chapters {
        fragment.push_str(&format!(
            "<p><b>{}</b>: <i>{}</i></p>\n",
            escape_html(ch.publish_at()),
            escape_html(ch.title())
        ));
    }
    fragment.push_str("</section>\n");

    let mut out = fragment.into_bytes();
    out.extend_from_slice(previous);
    out
}

/// Writes change reports to a fixed path.
///
/// Shared by all workers. Writes are serialized, so each report is rendered
/// on top of the previous writer's output.
#[derive(Debug)]
pub struct ChangeReporter {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ChangeReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Prepends an entry per chapter to the report. Errors are logged, not returned.
    pub async fn report(&self, chapters: &[ChapterMetadata]) {
        match self.try_report(chapters).await {
            Ok(()) => tracing::debug!(
                path = %self.path.display(),
                chapters = chapters.len(),
                "change report updated"
            ),
            Err(e) => tracing::error!("exporting diff: {}", e),
        }
    }

    pub async fn try_report(&self, chapters: &[ChapterMetadata]) -> Result<(), ReportError> {
        let _guard = self.lock.lock().await;

        let previous = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(source) => {
                return Err(ReportError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let rendered = render(chapters, &previous);
        tokio::fs::write(&self.path, rendered)
            .await
            .map_err(|source| ReportError::Write {
                path: self.path.clone(),
                source,
            })
    }
}
