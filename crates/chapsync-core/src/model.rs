//! Chapter jobs and the catalog metadata they carry.
//!
//! Field names follow the catalog's JSON (camelCase), so a job manifest
//! produced by a catalog listing can be deserialized directly.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One chapter to download and archive. Immutable once enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterJob {
    pub chapter: ChapterMetadata,
    /// Where the finished archive is written.
    pub archive_path: PathBuf,
}

/// Catalog entry for a chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMetadata {
    pub id: String,
    pub attributes: ChapterAttributes,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterAttributes {
    /// Content hash used in page URLs.
    pub hash: String,
    /// Page filenames in reading order.
    #[serde(default)]
    pub data: Vec<String>,
    #[serde(default)]
    pub publish_at: String,
    #[serde(default)]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translated_language: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<u32>,
}

impl ChapterMetadata {
    pub fn hash(&self) -> &str {
        &self.attributes.hash
    }

    pub fn page_filenames(&self) -> &[String] {
        &self.attributes.data
    }

    pub fn publish_at(&self) -> &str {
        &self.attributes.publish_at
    }

    pub fn title(&self) -> &str {
        &self.attributes.title
    }
}

/// Response of the distribution-resolution call. Valid for one chapter only.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistributionInfo {
    #[serde(default)]
    pub base_url: String,
}

/// Chapters a single worker archived successfully, in completion order.
#[derive(Debug, Clone, Default)]
pub struct CompletionRecord {
    pub worker: usize,
    pub chapters: Vec<ChapterMetadata>,
}

impl CompletionRecord {
    pub fn new(worker: usize) -> Self {
        Self {
            worker,
            chapters: Vec::new(),
        }
    }

    pub fn push(&mut self, chapter: ChapterMetadata) {
        self.chapters.push(chapter);
    }

    pub fn is_empty(&self) -> bool {
        self.chapters.is_empty()
    }

    pub fn len(&self) -> usize {
        self.chapters.len()
    }
}
