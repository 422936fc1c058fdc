//! Error types for the serial2md library.
//!
//! Two distinct types reflect two distinct failure modes:
//!
//! * **Fatal** [`SerialError`]: the walk cannot continue (unknown book,
//!   network failure, a page that does not have the expected structure, a
//!   heading that does not parse). Returned as `Err(SerialError)` and halts
//!   the whole run. Chapters already written stay on disk.
//!
//! * **Non-fatal** [`ChapterWarning`]: something in a single chapter was
//!   off (an image without alt text) but the chapter was still produced.
//!   Stored on the [`crate::output::ChapterRecord`] and reported inline.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the serial2md library.
#[derive(Debug, Error)]
pub enum SerialError {
    // ── Startup errors ────────────────────────────────────────────────────
    /// The book identifier is not one of the known serials.
    #[error("Unknown book '{name}'\nKnown books: {known}")]
    UnknownBook { name: String, known: String },

    /// A custom book profile file could not be read or parsed.
    #[error("Failed to load book profile '{path}': {detail}")]
    ProfileLoadFailed { path: PathBuf, detail: String },

    /// A URL (start URL or chapter link) could not be parsed.
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    // ── Fetch errors ──────────────────────────────────────────────────────
    /// The page could not be fetched (connection error or non-2xx status).
    #[error("Failed to fetch '{url}': {reason}\nCheck your internet connection.")]
    FetchFailed { url: String, reason: String },

    /// The request exceeded the configured timeout.
    #[error("Fetching '{url}' timed out after {secs}s\nIncrease --timeout.")]
    FetchTimeout { url: String, secs: u64 },

    // ── Structure errors ──────────────────────────────────────────────────
    /// An element every chapter page is expected to carry was not found.
    #[error("Page '{url}' has no {what}")]
    MissingElement { url: String, what: &'static str },

    /// A chapter heading did not match the `"<name> <arc>.<chapter>"` shape.
    #[error("Malformed chapter heading '{heading}': {reason}")]
    MalformedHeading { heading: String, reason: String },

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Could not read a chapter file or directory while assembling.
    #[error("Failed to read '{path}': {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal problem found while extracting a single chapter.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum ChapterWarning {
    /// An inline image had no `alt` attribute; it was replaced with nothing.
    #[error("image without alt text{}", src_suffix(.src))]
    MissingAltText { src: Option<String> },
}

fn src_suffix(src: &Option<String>) -> String {
    src.as_deref()
        .map(|s| format!(" ({s})"))
        .unwrap_or_default()
}
