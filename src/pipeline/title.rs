//! Chapter title classification.
//!
//! A heading such as `"Interlude 10.5 (Bonus)"`, `"Teneral e.1"` or
//! `"Gestation 1.1"` is sorted into a [`ChapterKind`] using the markers of
//! the book's [`BookProfile`], and given the display title used both in the
//! chapter's `#` heading and in its filename.

use crate::book::BookProfile;
use serde::{Deserialize, Serialize};

/// Display title shared by every generic interlude.
pub const INTERLUDE_TITLE: &str = "Interlude";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChapterKind {
    /// Regular `"<arc name> <arc>.<chapter>"` chapter.
    Numbered,
    /// Generic interlude; its own sub-number is discarded.
    Interlude,
    /// Part of the book's final epilogue arc.
    Epilogue,
    /// Always-named chapter outside the numbering ("Pages", "Histories").
    NamedSpecial,
}

/// The classified identity of one chapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterTitle {
    /// Heading text as found on the page (or the forced first-chapter title).
    pub raw: String,
    pub kind: ChapterKind,
    /// Filename-safe title used in output.
    pub display: String,
}

/// Classify a heading for `profile`.
///
/// `at_start` is true while the walk position is still at its initial value;
/// books whose first page carries a navigational heading then get their
/// canonical first-chapter title instead.
pub fn classify(heading: &str, profile: &BookProfile, at_start: bool) -> ChapterTitle {
    let raw = match (&profile.first_chapter_title, at_start) {
        (Some(forced), true) => forced.clone(),
        _ => collapse_whitespace(heading),
    };

    let (kind, display) = if profile
        .interlude_marker
        .as_deref()
        .is_some_and(|m| raw.contains(m))
    {
        (ChapterKind::Interlude, INTERLUDE_TITLE.to_string())
    } else if let Some(name) = profile
        .named_specials
        .iter()
        .find(|m| raw.contains(m.as_str()))
    {
        (ChapterKind::NamedSpecial, name.clone())
    } else if profile
        .epilogue
        .as_ref()
        .is_some_and(|e| raw.contains(&e.marker))
    {
        (ChapterKind::Epilogue, raw.clone())
    } else {
        (ChapterKind::Numbered, raw.clone())
    };

    ChapterTitle {
        display: safe_display(&display),
        raw,
        kind,
    }
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Strip characters that may not appear in a filename component.
fn safe_display(title: &str) -> String {
    let options = sanitize_filename::Options {
        // Length is capped on the whole filename by `ChapterPosition::filename`.
        truncate: false,
        windows: true,
        replacement: "",
    };
    collapse_whitespace(&sanitize_filename::sanitize_with_options(title, options))
}
