//! Pagination walker: follow "Next Chapter" links from the first chapter to
//! the last, extracting and storing each page on the way.
//!
//! ## Flow
//!
//! ```text
//! Fetching(url) ──fetch──▶ extract ──▶ store ──▶ next link? ──yes──▶ Fetching(next)
//!                                                       └──no───▶ Done
//! ```
//!
//! The walk is strictly sequential: the next URL is only known after the
//! current page has been parsed. Any fatal error stops the walk; chapters
//! already written stay on disk, so a rerun with `skip_existing` resumes
//! cheaply.

use crate::book::BookProfile;
use crate::config::WalkConfig;
use crate::error::SerialError;
use crate::output::{ChapterSummary, WalkOutput, WalkStats};
use crate::pipeline::extract::extract_chapter;
use crate::pipeline::fetch::{HttpFetcher, PageFetcher};
use crate::pipeline::resolve::ChapterPosition;
use crate::progress::{NoopProgressCallback, ProgressCallback, WalkProgressCallback};
use crate::store::{ChapterStore, DirStore};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use url::Url;

/// Everything the walker carries from one page to the next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkerState {
    /// Position of the last chapter processed.
    pub position: ChapterPosition,
    /// Paragraphs still to drop from an author's note that began earlier.
    pub skip_next: u32,
    /// Where to go next; `None` once the last chapter has been seen.
    pub next_url: Option<Url>,
}

impl WalkerState {
    /// State before the first page: position `(1, 0)`, nothing pending.
    pub fn initial() -> Self {
        Self {
            position: ChapterPosition::INITIAL,
            skip_next: 0,
            next_url: None,
        }
    }
}

impl Default for WalkerState {
    fn default() -> Self {
        Self::initial()
    }
}

#[derive(Debug)]
enum Step {
    Fetching(Url),
    Done { at_limit: bool },
}

/// Walk `profile` with the given fetcher and store.
///
/// Returns one [`ChapterSummary`] per chapter seen plus aggregate stats.
pub async fn walk<F, S>(
    profile: &BookProfile,
    config: &WalkConfig,
    fetcher: &F,
    store: &S,
) -> Result<WalkOutput, SerialError>
where
    F: PageFetcher,
    S: ChapterStore,
{
    let started = Instant::now();
    let progress: ProgressCallback = config
        .progress_callback
        .clone()
        .unwrap_or_else(|| Arc::new(NoopProgressCallback));

    let start = start_url(profile, config)?;
    info!("Walking '{}' from {}", profile.title, start);
    progress.on_walk_start(&profile.title, start.as_str());

    let mut state = WalkerState::initial();
    let mut stats = WalkStats::default();
    let mut chapters = Vec::new();
    let mut step = Step::Fetching(start);

    while let Step::Fetching(url) = step {
        let page = fetcher.fetch(&url).await?;
        stats.pages_fetched += 1;

        let (record, next_state) = extract_chapter(&page, profile, &state, &config.extension)?;
        state = next_state;
        let index = chapters.len() + 1;

        for w in &record.warnings {
            progress.on_warning(&record.filename, &w.to_string());
        }
        stats.warnings += record.warnings.len();

        let skipped = config.skip_existing && store.exists(&record.filename).await?;
        if skipped {
            debug!("{} exists, skipping", record.filename);
            stats.chapters_skipped += 1;
            progress.on_chapter_skipped(index, &record.filename);
        } else {
            store.write(&record).await?;
            stats.chapters_written += 1;
            progress.on_chapter_written(index, &record.filename, record.paragraphs.len());
        }
        chapters.push(ChapterSummary::from_record(&record, skipped));

        step = match (&state.next_url, config.limit) {
            (_, Some(limit)) if chapters.len() >= limit => Step::Done { at_limit: true },
            (Some(next), _) => Step::Fetching(next.clone()),
            (None, _) => Step::Done { at_limit: false },
        };
        if let Step::Done { at_limit } = step {
            // A limit hit on the last page is still a natural end.
            stats.stopped_at_limit = at_limit && state.next_url.is_some();
        }
    }

    stats.total_duration_ms = started.elapsed().as_millis() as u64;
    info!(
        "Walk of '{}' finished: {} written, {} skipped, {} warnings in {}ms",
        profile.title,
        stats.chapters_written,
        stats.chapters_skipped,
        stats.warnings,
        stats.total_duration_ms
    );
    progress.on_walk_complete(stats.chapters_written, stats.chapters_skipped);

    Ok(WalkOutput { chapters, stats })
}

/// Walk `profile` over HTTP into `config.output_dir`.
pub async fn walk_book(profile: &BookProfile, config: &WalkConfig) -> Result<WalkOutput, SerialError> {
    let fetcher = HttpFetcher::new(config)?;
    let store = DirStore::new(&config.output_dir);
    walk(profile, config, &fetcher, &store).await
}

/// Synchronous wrapper around [`walk_book`].
///
/// Creates a temporary tokio runtime internally.
pub fn walk_book_sync(profile: &BookProfile, config: &WalkConfig) -> Result<WalkOutput, SerialError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| SerialError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(walk_book(profile, config))
}

fn start_url(profile: &BookProfile, config: &WalkConfig) -> Result<Url, SerialError> {
    let raw = config
        .start_url
        .as_deref()
        .unwrap_or(&profile.first_chapter_url);
    Url::parse(raw).map_err(|e| SerialError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;

    #[test]
    fn initial_state() {
        let s = WalkerState::initial();
        assert!(s.position.is_initial());
        assert_eq!(s.skip_next, 0);
        assert!(s.next_url.is_none());
        assert_eq!(s, WalkerState::default());
    }

    #[test]
    fn start_url_prefers_override() {
        let profile = Book::Worm.profile();
        let default = start_url(&profile, &WalkConfig::default()).unwrap();
        assert_eq!(default.as_str(), profile.first_chapter_url);

        let config = WalkConfig::builder()
            .start_url("https://mirror.example.org/1-1/")
            .build()
            .unwrap();
        assert_eq!(
            start_url(&profile, &config).unwrap().host_str(),
            Some("mirror.example.org")
        );
    }

    #[test]
    fn bad_profile_url_is_reported() {
        let mut profile = Book::Twig.profile();
        profile.first_chapter_url = "twig".into();
        let err = start_url(&profile, &WalkConfig::default()).unwrap_err();
        assert!(matches!(err, SerialError::InvalidUrl { .. }));
    }
}
