//! Collection assembly: concatenate stored chapters into one document.
//!
//! The combined file plus a `meta.txt` metadata block is what an external
//! converter such as pandoc expects, e.g.
//! `pandoc meta.txt worm.md -o worm.epub`. Running the converter is left to
//! the caller.

use crate::book::BookProfile;
use crate::error::SerialError;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Name of the metadata file written next to the assembled document.
pub const METADATA_FILENAME: &str = "meta.txt";

/// Where [`publish`] put things.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Published {
    pub document: PathBuf,
    pub metadata: PathBuf,
    pub chapters: usize,
}

/// Concatenate every `*.{extension}` file in `dir`, sorted by filename.
///
/// Returns the combined text and the number of chapter files used. Hidden
/// files (leftover temp files included) are ignored.
pub async fn assemble(dir: impl AsRef<Path>, extension: &str) -> Result<(String, usize), SerialError> {
    let dir = dir.as_ref();
    let read_failed = |e: std::io::Error| SerialError::ReadFailed {
        path: dir.to_path_buf(),
        source: e,
    };

    let mut names = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await.map_err(read_failed)?;
    while let Some(entry) = entries.next_entry().await.map_err(read_failed)? {
        let path = entry.path();
        let is_chapter = entry.file_type().await.map_err(read_failed)?.is_file()
            && path.extension().is_some_and(|e| e == extension)
            && !entry.file_name().to_string_lossy().starts_with('.');
        if is_chapter {
            names.push(entry.file_name());
        }
    }
    names.sort();

    let mut combined = String::new();
    for name in &names {
        let path = dir.join(name);
        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SerialError::ReadFailed { path, source: e })?;
        combined.push_str(&text);
    }
    Ok((combined, names.len()))
}

/// Pandoc-style metadata block for `profile`.
pub fn metadata_block(profile: &BookProfile) -> String {
    format!(
        "---\ntitle: {}\nauthor: {}\nlanguage: {}\n---\n",
        profile.title, profile.author, profile.language
    )
}

/// Assemble `dir` into `output` and write [`METADATA_FILENAME`] beside it.
pub async fn publish(
    dir: impl AsRef<Path>,
    extension: &str,
    output: impl AsRef<Path>,
    profile: &BookProfile,
) -> Result<Published, SerialError> {
    let output = output.as_ref();
    let (combined, chapters) = assemble(dir, extension).await?;

    let parent = output
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| SerialError::OutputWriteFailed {
            path: parent.to_path_buf(),
            source: e,
        })?;

    let metadata = parent.join(METADATA_FILENAME);
    write_file(output, &combined).await?;
    write_file(&metadata, &metadata_block(profile)).await?;

    info!(
        "Assembled {} chapters into {} ({} bytes)",
        chapters,
        output.display(),
        combined.len()
    );
    Ok(Published {
        document: output.to_path_buf(),
        metadata,
        chapters,
    })
}

async fn write_file(path: &Path, content: &str) -> Result<(), SerialError> {
    tokio::fs::write(path, content)
        .await
        .map_err(|e| SerialError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;

    #[test]
    fn worm_metadata_block() {
        assert_eq!(
            metadata_block(&Book::Worm.profile()),
            "---\ntitle: Worm\nauthor: John \"Wildbow\" McCrae\nlanguage: en-US\n---\n"
        );
    }

    #[tokio::test]
    async fn assembles_in_filename_order() {
        let dir = tempfile::tempdir().unwrap();
        for (name, body) in [
            ("02.01 B 2.1.md", "# B 2.1\n\nthree\n\n"),
            ("01.02 A 1.2.md", "# A 1.2\n\ntwo\n\n"),
            ("01.01 A 1.1.md", "# A 1.1\n\none\n\n"),
            ("notes.txt", "ignored"),
            (".serial2md-x.md", "ignored"),
        ] {
            std::fs::write(dir.path().join(name), body).unwrap();
        }

        let (text, count) = assemble(dir.path(), "md").await.unwrap();
        assert_eq!(count, 3);
        assert_eq!(
            text,
            "# A 1.1\n\none\n\n# A 1.2\n\ntwo\n\n# B 2.1\n\nthree\n\n"
        );
    }

    #[tokio::test]
    async fn publish_writes_document_and_metadata() {
        let data = tempfile::tempdir().unwrap();
        std::fs::write(data.path().join("01.01 Bonds 1.1.md"), "# Bonds 1.1\n\nx\n\n").unwrap();
        let out = tempfile::tempdir().unwrap();
        let target = out.path().join("pact.md");

        let published = publish(data.path(), "md", &target, &Book::Pact.profile())
            .await
            .unwrap();

        assert_eq!(published.chapters, 1);
        assert_eq!(published.metadata, out.path().join(METADATA_FILENAME));
        assert_eq!(
            std::fs::read_to_string(&target).unwrap(),
            "# Bonds 1.1\n\nx\n\n"
        );
        assert!(std::fs::read_to_string(&published.metadata)
            .unwrap()
            .starts_with("---\ntitle: Pact\n"));
    }

    #[tokio::test]
    async fn missing_directory_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = assemble(dir.path().join("nope"), "md").await.unwrap_err();
        assert!(matches!(err, SerialError::ReadFailed { .. }));
    }
}
