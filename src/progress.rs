//! Progress-callback trait for per-chapter walk events.
//!
//! Inject an [`Arc<dyn WalkProgressCallback>`] via
//! [`crate::config::WalkConfigBuilder::progress_callback`] to receive events
//! as the walker moves through the book. The total chapter count is unknown
//! until the last page has been seen, so events carry running counts only.
//!
//! # Example
//!
//! ```rust
//! use serial2md::{WalkConfig, WalkProgressCallback};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     written: AtomicUsize,
//! }
//!
//! impl WalkProgressCallback for CountingCallback {
//!     fn on_chapter_written(&self, index: usize, filename: &str, paragraphs: usize) {
//!         self.written.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("#{index} {filename} ({paragraphs} paragraphs)");
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { written: AtomicUsize::new(0) });
//!
//! let config = WalkConfig::builder()
//!     .progress_callback(counter as Arc<dyn WalkProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the walker as it processes each chapter.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. The walk is sequential, but the trait is
/// `Send + Sync` so the callback can be shared with other tasks.
pub trait WalkProgressCallback: Send + Sync {
    /// Called once before the first page is fetched.
    fn on_walk_start(&self, book: &str, start_url: &str) {
        let _ = (book, start_url);
    }

    /// Called after a chapter file has been written.
    ///
    /// # Arguments
    /// * `index`       1-indexed count of chapters seen so far
    /// * `filename`    name of the written file
    /// * `paragraphs`  number of paragraphs in the chapter
    fn on_chapter_written(&self, index: usize, filename: &str, paragraphs: usize) {
        let _ = (index, filename, paragraphs);
    }

    /// Called when a chapter is left alone because its file already exists.
    fn on_chapter_skipped(&self, index: usize, filename: &str) {
        let _ = (index, filename);
    }

    /// Called for each non-fatal problem found in a chapter.
    fn on_warning(&self, filename: &str, warning: &str) {
        let _ = (filename, warning);
    }

    /// Called once when the walk ends without error.
    ///
    /// # Arguments
    /// * `written`  chapters written
    /// * `skipped`  chapters skipped because they already existed
    fn on_walk_complete(&self, written: usize, skipped: usize) {
        let _ = (written, skipped);
    }
}

/// A no-op implementation for callers that don't need progress events.
///
/// This is what the walker uses when no callback is configured.
pub struct NoopProgressCallback;

impl WalkProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::WalkConfig`].
pub type ProgressCallback = Arc<dyn WalkProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct TrackingCallback {
        written: AtomicUsize,
        skipped: AtomicUsize,
        warnings: Mutex<Vec<String>>,
        final_written: AtomicUsize,
    }

    impl WalkProgressCallback for TrackingCallback {
        fn on_chapter_written(&self, _index: usize, _filename: &str, _paragraphs: usize) {
            self.written.fetch_add(1, Ordering::SeqCst);
        }

        fn on_chapter_skipped(&self, _index: usize, _filename: &str) {
            self.skipped.fetch_add(1, Ordering::SeqCst);
        }

        fn on_warning(&self, filename: &str, warning: &str) {
            self.warnings
                .lock()
                .unwrap()
                .push(format!("{filename}: {warning}"));
        }

        fn on_walk_complete(&self, written: usize, _skipped: usize) {
            self.final_written.store(written, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_walk_start("Worm", "https://example.com/1-1/");
        cb.on_chapter_written(1, "01.01 Gestation 1.1.md", 40);
        cb.on_chapter_skipped(2, "01.02 Gestation 1.2.md");
        cb.on_warning("01.02 Gestation 1.2.md", "image without alt text");
        cb.on_walk_complete(1, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_chapter_written(1, "01.01 A 1.1.md", 10);
        tracker.on_chapter_skipped(2, "01.02 A 1.2.md");
        tracker.on_chapter_written(3, "01.03 A 1.3.md", 12);
        tracker.on_warning("01.03 A 1.3.md", "image without alt text");
        tracker.on_walk_complete(2, 1);

        assert_eq!(tracker.written.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.skipped.load(Ordering::SeqCst), 1);
        assert_eq!(tracker.final_written.load(Ordering::SeqCst), 2);
        assert_eq!(
            *tracker.warnings.lock().unwrap(),
            vec!["01.03 A 1.3.md: image without alt text".to_string()]
        );
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_walk_start("Pact", "https://example.com/");
        cb.on_chapter_written(1, "01.01 Bonds 1.1.md", 3);
    }
}
