//! Result types produced by the extractor and the walker.

use crate::error::ChapterWarning;
use crate::pipeline::resolve::ChapterPosition;
use crate::pipeline::title::ChapterKind;
use serde::{Deserialize, Serialize};

/// One fully processed chapter, ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRecord {
    /// URL the chapter was extracted from.
    pub source_url: String,
    pub position: ChapterPosition,
    pub kind: ChapterKind,
    /// Display title (also embedded in `filename`).
    pub title: String,
    /// `"{arc:02}.{chapter:02} {title}.{ext}"`.
    pub filename: String,
    /// Normalized paragraphs in page order.
    pub paragraphs: Vec<String>,
    /// Non-fatal problems met while extracting.
    pub warnings: Vec<ChapterWarning>,
}

impl ChapterRecord {
    /// `# {title}` followed by a blank line.
    pub fn heading_line(&self) -> String {
        format!("# {}\n\n", self.title)
    }

    /// Full chapter file content.
    pub fn to_markdown(&self) -> String {
        let body_len: usize = self.paragraphs.iter().map(|p| p.len() + 2).sum();
        let mut out = String::with_capacity(self.title.len() + 4 + body_len);
        out.push_str(&self.heading_line());
        for p in &self.paragraphs {
            out.push_str(p);
            out.push_str("\n\n");
        }
        out
    }
}

/// What happened to one chapter during a walk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterSummary {
    pub filename: String,
    pub source_url: String,
    pub position: ChapterPosition,
    pub kind: ChapterKind,
    pub paragraphs: usize,
    pub warnings: Vec<ChapterWarning>,
    /// `true` when the file already existed and skip-existing was on.
    pub skipped: bool,
}

impl ChapterSummary {
    pub(crate) fn from_record(record: &ChapterRecord, skipped: bool) -> Self {
        Self {
            filename: record.filename.clone(),
            source_url: record.source_url.clone(),
            position: record.position,
            kind: record.kind,
            paragraphs: record.paragraphs.len(),
            warnings: record.warnings.clone(),
            skipped,
        }
    }
}

/// Aggregate counters for a walk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalkStats {
    pub pages_fetched: usize,
    pub chapters_written: usize,
    pub chapters_skipped: usize,
    pub warnings: usize,
    /// `true` when the walk stopped because of the configured limit rather
    /// than because the last page had no next-chapter link.
    pub stopped_at_limit: bool,
    pub total_duration_ms: u64,
}

/// Everything a walk returns.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WalkOutput {
    pub chapters: Vec<ChapterSummary>,
    pub stats: WalkStats,
}
