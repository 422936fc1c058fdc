//! Chapter persistence.
//!
//! The walker only asks two things of storage: does a chapter file already
//! exist, and write this chapter. [`DirStore`] keeps one file per chapter in
//! a directory, which is the layout the publisher later concatenates.

use crate::error::SerialError;
use crate::output::ChapterRecord;
use std::future::Future;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Destination for finished chapters.
pub trait ChapterStore {
    /// Whether a chapter file named `filename` is already present.
    fn exists(&self, filename: &str) -> impl Future<Output = Result<bool, SerialError>> + Send;

    /// Persist `record` under `record.filename`, replacing any previous file.
    fn write(&self, record: &ChapterRecord) -> impl Future<Output = Result<(), SerialError>> + Send;
}

/// One Markdown file per chapter inside `root`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, filename: &str) -> PathBuf {
        self.root.join(filename)
    }
}

impl ChapterStore for DirStore {
    async fn exists(&self, filename: &str) -> Result<bool, SerialError> {
        let path = self.path_of(filename);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| SerialError::ReadFailed { path, source: e })
    }

    async fn write(&self, record: &ChapterRecord) -> Result<(), SerialError> {
        let path = self.path_of(&record.filename);
        let write_failed = |e: std::io::Error| SerialError::OutputWriteFailed {
            path: path.clone(),
            source: e,
        };

        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(write_failed)?;

        // Atomic write: temp file in the same directory, then rename over
        // the target. A crash mid-write never leaves a truncated chapter.
        let tmp = tempfile::Builder::new()
            .prefix(".serial2md-")
            .suffix(".tmp")
            .tempfile_in(&self.root)
            .map_err(write_failed)?
            .into_temp_path();
        tokio::fs::write(&tmp, record.to_markdown())
            .await
            .map_err(write_failed)?;
        tmp.persist(&path).map_err(|e| write_failed(e.error))?;

        debug!("Wrote {}", path.display());
        Ok(())
    }
}
