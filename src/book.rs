//! Known web serials and the per-book rules the pipeline consults.
//!
//! Every title-format quirk lives in a [`BookProfile`] value rather than in
//! `if title == …` branches scattered through the classifier and resolver.
//! Supporting another serial that follows the same conventions means adding
//! a profile (or loading one from JSON), not touching the pipeline.

use crate::error::SerialError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// The serials this crate knows how to walk out of the box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Book {
    Worm,
    Pact,
    Twig,
}

impl Book {
    /// Every built-in book, in a stable order.
    pub const ALL: [Book; 3] = [Book::Worm, Book::Pact, Book::Twig];

    /// Lower-case identifier used on the command line.
    pub fn id(self) -> &'static str {
        match self {
            Book::Worm => "worm",
            Book::Pact => "pact",
            Book::Twig => "twig",
        }
    }

    /// The rules for this book.
    pub fn profile(self) -> BookProfile {
        match self {
            Book::Worm => BookProfile {
                title: "Worm".into(),
                author: "John \"Wildbow\" McCrae".into(),
                language: "en-US".into(),
                first_chapter_url: "https://parahumans.wordpress.com/2011/06/11/1-1/".into(),
                interlude_marker: Some("Interlude".into()),
                named_specials: Vec::new(),
                epilogue: Some(EpilogueRule {
                    marker: "e.".into(),
                    arc: 31,
                }),
                first_chapter_title: None,
            },
            Book::Pact => BookProfile {
                title: "Pact".into(),
                author: "John \"Wildbow\" McCrae".into(),
                language: "en-US".into(),
                first_chapter_url: "https://pactwebserial.wordpress.com/2013/12/17/bonds-1-1/"
                    .into(),
                interlude_marker: Some("Interlude".into()),
                named_specials: Vec::new(),
                epilogue: Some(EpilogueRule {
                    marker: "Epilogue".into(),
                    arc: 17,
                }),
                // The first post renders the blog's navigation heading last.
                first_chapter_title: Some("Bonds 1.1".into()),
            },
            Book::Twig => BookProfile {
                title: "Twig".into(),
                author: "John \"Wildbow\" McCrae".into(),
                language: "en-US".into(),
                first_chapter_url: "https://twigserial.wordpress.com/2014/12/24/taking-root-1-1/"
                    .into(),
                interlude_marker: None,
                named_specials: vec!["Pages".into(), "Histories".into()],
                epilogue: Some(EpilogueRule {
                    marker: "Epilogue".into(),
                    arc: 18,
                }),
                first_chapter_title: None,
            },
        }
    }

    fn known_ids() -> String {
        Self::ALL
            .iter()
            .map(|b| b.id())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for Book {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Book {
    type Err = SerialError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|b| b.id() == wanted)
            .ok_or_else(|| SerialError::UnknownBook {
                name: s.to_string(),
                known: Self::known_ids(),
            })
    }
}

/// How a book marks its epilogue and where that epilogue sorts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpilogueRule {
    /// Substring of the heading that identifies an epilogue chapter.
    pub marker: String,
    /// Arc number every epilogue chapter is filed under.
    pub arc: u32,
}

/// Per-book constants consumed by the classifier, resolver and publisher.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookProfile {
    pub title: String,
    pub author: String,
    pub language: String,

    /// Where the walk starts.
    pub first_chapter_url: String,

    /// Substring marking a generic interlude. `None` when the book numbers
    /// its interludes inside the regular `arc.chapter` scheme.
    #[serde(default)]
    pub interlude_marker: Option<String>,

    /// Substrings marking always-named chapters outside the numbering.
    #[serde(default)]
    pub named_specials: Vec<String>,

    #[serde(default)]
    pub epilogue: Option<EpilogueRule>,

    /// Title forced onto the first page instead of its own heading.
    #[serde(default)]
    pub first_chapter_title: Option<String>,
}

impl BookProfile {
    /// Load a custom profile from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SerialError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| SerialError::ProfileLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        serde_json::from_str(&raw).map_err(|e| SerialError::ProfileLoadFailed {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_books_case_insensitively() {
        assert_eq!("worm".parse::<Book>().unwrap(), Book::Worm);
        assert_eq!(" Pact ".parse::<Book>().unwrap(), Book::Pact);
        assert_eq!("TWIG".parse::<Book>().unwrap(), Book::Twig);
    }

    #[test]
    fn unknown_book_is_rejected() {
        let err = "ward".parse::<Book>().unwrap_err();
        match err {
            SerialError::UnknownBook { name, known } => {
                assert_eq!(name, "ward");
                assert_eq!(known, "worm, pact, twig");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn builtin_epilogue_arcs() {
        assert_eq!(Book::Worm.profile().epilogue.unwrap().arc, 31);
        assert_eq!(Book::Pact.profile().epilogue.unwrap().arc, 17);
    }

    #[test]
    fn profile_json_defaults_optional_fields() {
        let json = r#"{
            "title": "Example",
            "author": "Someone",
            "language": "en-GB",
            "first_chapter_url": "https://example.com/1-1/"
        }"#;
        let p: BookProfile = serde_json::from_str(json).unwrap();
        assert_eq!(p.interlude_marker, None);
        assert!(p.named_specials.is_empty());
        assert_eq!(p.epilogue, None);
        assert_eq!(p.first_chapter_title, None);
    }

    #[test]
    fn profile_loads_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("book.json");
        let json = serde_json::to_string(&Book::Twig.profile()).unwrap();
        std::fs::write(&path, json).unwrap();
        assert_eq!(BookProfile::from_json_file(&path).unwrap(), Book::Twig.profile());
    }

    #[test]
    fn missing_profile_file_is_a_load_error() {
        let err = BookProfile::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, SerialError::ProfileLoadFailed { .. }));
    }
}
