//! # serial2md
//!
//! Download a web serial chapter by chapter and turn it into Markdown files
//! ready for e-book conversion.
//!
//! Serials such as *Worm*, *Pact* and *Twig* are published as blog posts
//! linked by "Next Chapter" anchors. Their headings follow an
//! `"<arc name> <arc>.<chapter>"` convention with exceptions for interludes,
//! epilogues and a few named specials. This crate follows the links, works
//! out a stable `(arc, chapter)` position for every post and writes one file
//! per chapter named so that a plain filename sort gives reading order.
//!
//! ## Pipeline Overview
//!
//! ```text
//! first chapter URL
//!  │
//!  ├─ 1. Fetch     GET the page (reqwest, optional retry)
//!  ├─ 2. Extract   heading, paragraphs, next link (scraper)
//!  ├─ 3. Classify  numbered / interlude / epilogue / named special
//!  ├─ 4. Resolve   previous (arc, chapter) + title → next (arc, chapter)
//!  ├─ 5. Normalize paragraph fragments → Markdown
//!  ├─ 6. Store     "{arc:02}.{chapter:02} {title}.md"
//!  └─ 7. Publish   concatenate + meta.txt (optional)
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use serial2md::{walk_book, Book, WalkConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = WalkConfig::builder().output_dir("worm").build()?;
//!     let output = walk_book(&Book::Worm.profile(), &config).await?;
//!     eprintln!("{} chapters written", output.stats.chapters_written);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `serial2md` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! serial2md = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod book;
pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod publish;
pub mod store;
pub mod walk;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use book::{Book, BookProfile, EpilogueRule};
pub use config::{WalkConfig, WalkConfigBuilder};
pub use error::{ChapterWarning, SerialError};
pub use output::{ChapterRecord, ChapterSummary, WalkOutput, WalkStats};
pub use pipeline::fetch::{HttpFetcher, PageFetcher, RawPage};
pub use pipeline::resolve::ChapterPosition;
pub use pipeline::title::{ChapterKind, ChapterTitle};
pub use progress::{NoopProgressCallback, ProgressCallback, WalkProgressCallback};
pub use publish::{assemble, metadata_block, publish, Published};
pub use store::{ChapterStore, DirStore};
pub use walk::{walk, walk_book, walk_book_sync, WalkerState};
