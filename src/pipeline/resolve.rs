//! Arc/chapter number resolution.
//!
//! Serial blogs do not number their posts consistently: interludes sit
//! between numbered chapters, epilogues use a separate scheme, and arc names
//! change every arc. The resolver turns a classified title plus the previous
//! position into the next `(arc, chapter)` pair so that filenames sort in
//! reading order.
//!
//! Numbers the author skipped on purpose are passed through as parsed; the
//! resolver never "repairs" the book's own numbering.

use crate::book::BookProfile;
use crate::error::SerialError;
use crate::pipeline::title::{ChapterKind, ChapterTitle};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest filename, in bytes, common filesystems accept.
pub const MAX_FILENAME_BYTES: usize = 255;

/// Two-level position of a chapter within the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ChapterPosition {
    pub arc: u32,
    pub chapter: u32,
}

impl ChapterPosition {
    /// Position before the first chapter has been seen.
    pub const INITIAL: ChapterPosition = ChapterPosition { arc: 1, chapter: 0 };

    pub const fn new(arc: u32, chapter: u32) -> Self {
        Self { arc, chapter }
    }

    pub fn is_initial(&self) -> bool {
        *self == Self::INITIAL
    }

    fn next_chapter(self) -> Self {
        Self::new(self.arc, self.chapter + 1)
    }

    /// Output filename: `"{arc:02}.{chapter:02} {title}.{ext}"`.
    ///
    /// Two-digit padding keeps lexicographic order equal to reading order as
    /// long as both numbers stay below 100. The title is cut on a character
    /// boundary so the whole name fits in [`MAX_FILENAME_BYTES`].
    pub fn filename(&self, display_title: &str, extension: &str) -> String {
        let prefix = format!("{:02}.{:02} ", self.arc, self.chapter);
        let budget = MAX_FILENAME_BYTES.saturating_sub(prefix.len() + 1 + extension.len());
        let mut end = display_title.len().min(budget);
        while !display_title.is_char_boundary(end) {
            end -= 1;
        }
        let title = display_title[..end].trim_end_matches([' ', '.']);
        format!("{prefix}{title}.{extension}")
    }
}

impl fmt::Display for ChapterPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.arc, self.chapter)
    }
}

/// Compute the position of `title` given the previous position.
pub fn resolve(
    title: &ChapterTitle,
    current: ChapterPosition,
    profile: &BookProfile,
) -> Result<ChapterPosition, SerialError> {
    match title.kind {
        ChapterKind::Interlude | ChapterKind::NamedSpecial => Ok(current.next_chapter()),
        ChapterKind::Epilogue => {
            let rule = profile
                .epilogue
                .as_ref()
                .ok_or_else(|| SerialError::MalformedHeading {
                    heading: title.raw.clone(),
                    reason: format!("'{}' defines no epilogue arc", profile.title),
                })?;
            if current.arc == rule.arc {
                Ok(current.next_chapter())
            } else {
                Ok(ChapterPosition::new(rule.arc, 1))
            }
        }
        ChapterKind::Numbered => {
            let arc = parse_arc(&title.raw)?;
            if arc == current.arc {
                Ok(current.next_chapter())
            } else {
                Ok(ChapterPosition::new(arc, 1))
            }
        }
    }
}

/// Arc number of a `"<name> <arc>.<chapter>"` heading.
pub fn parse_arc(heading: &str) -> Result<u32, SerialError> {
    let malformed = |reason: &str| SerialError::MalformedHeading {
        heading: heading.to_string(),
        reason: reason.to_string(),
    };

    let token = heading
        .split_whitespace()
        .last()
        .ok_or_else(|| malformed("heading is empty"))?;
    let arc = token
        .split('.')
        .next()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| malformed("expected '<arc>.<chapter>' as the last word"))?;
    arc.parse::<u32>()
        .map_err(|e| malformed(&format!("arc number '{arc}' is not an integer ({e})")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::Book;
    use crate::pipeline::title::classify;
    use proptest::prelude::*;

    fn step(heading: &str, book: Book, pos: (u32, u32)) -> (u32, u32) {
        let profile = book.profile();
        let current = ChapterPosition::new(pos.0, pos.1);
        let title = classify(heading, &profile, current.is_initial());
        let next = resolve(&title, current, &profile).unwrap();
        (next.arc, next.chapter)
    }

    #[test]
    fn first_chapter_of_pact() {
        let profile = Book::Pact.profile();
        let title = classify("Bonds 1.1", &profile, true);
        let next = resolve(&title, ChapterPosition::INITIAL, &profile).unwrap();
        assert_eq!(next, ChapterPosition::new(1, 1));
        assert_eq!(next.filename(&title.display, "md"), "01.01 Bonds 1.1.md");
    }

    #[test]
    fn interlude_continues_arc_numbering() {
        assert_eq!(step("Interlude", Book::Worm, (12, 3)), (12, 4));
        assert_eq!(step("Interlude 12½", Book::Worm, (12, 3)), (12, 4));
    }

    #[test]
    fn arc_transition_resets_chapter() {
        assert_eq!(step("Extermination 13.1", Book::Worm, (12, 9)), (13, 1));
    }

    #[test]
    fn same_arc_increments() {
        assert_eq!(step("Hive 5.3", Book::Worm, (5, 2)), (5, 3));
    }

    #[test]
    fn named_special_increments_within_arc() {
        assert_eq!(step("Pages 4", Book::Twig, (4, 9)), (4, 10));
    }

    #[test]
    fn multi_part_epilogue() {
        assert_eq!(step("Teneral e.1", Book::Worm, (30, 7)), (31, 1));
        assert_eq!(step("Teneral e.2", Book::Worm, (31, 1)), (31, 2));
        assert_eq!(step("Epilogue", Book::Pact, (16, 12)), (17, 1));
        assert_eq!(step("Epilogue (Part 2)", Book::Pact, (17, 1)), (17, 2));
    }

    #[test]
    fn skipped_numbers_pass_through() {
        // The book jumps an arc; the resolver trusts the heading.
        assert_eq!(step("Speck 30.1", Book::Worm, (28, 4)), (30, 1));
        // And may go backwards when the author's numbering does.
        assert_eq!(step("Colony 15.1", Book::Worm, (16, 2)), (15, 1));
    }

    #[test]
    fn malformed_heading_is_fatal() {
        let profile = Book::Worm.profile();
        for heading in ["Gestation", "Gestation X.1", "", "Gestation .1"] {
            let title = classify(heading, &profile, false);
            let err = resolve(&title, ChapterPosition::new(1, 1), &profile).unwrap_err();
            assert!(
                matches!(err, SerialError::MalformedHeading { .. }),
                "{heading:?} gave {err:?}"
            );
        }
    }

    #[test]
    fn epilogue_without_rule_is_an_error() {
        let mut profile = Book::Worm.profile();
        let title = classify("Teneral e.1", &profile, false);
        profile.epilogue = None;
        assert!(resolve(&title, ChapterPosition::new(30, 1), &profile).is_err());
    }

    #[test]
    fn parse_arc_takes_last_token() {
        assert_eq!(parse_arc("Taking Root 1.1").unwrap(), 1);
        assert_eq!(parse_arc("Forest for the Trees 17.10").unwrap(), 17);
        assert_eq!(parse_arc("Bitter Pill 15").unwrap(), 15);
    }

    #[test]
    fn filename_format_is_zero_padded() {
        assert_eq!(
            ChapterPosition::new(3, 12).filename("Agitation 3.12", "md"),
            "03.12 Agitation 3.12.md"
        );
        assert_eq!(
            ChapterPosition::new(31, 1).filename("Teneral e.1", "txt"),
            "31.01 Teneral e.1.txt"
        );
    }

    #[test]
    fn long_titles_are_cut_to_fit_the_filename_limit() {
        let title = "a".repeat(300);
        let name = ChapterPosition::new(1, 2).filename(&title, "md");
        assert_eq!(name.len(), MAX_FILENAME_BYTES);
        assert!(name.starts_with("01.02 aaa"));
        assert!(name.ends_with("a.md"));

        // Multi-byte characters are never split.
        let title = "é".repeat(200);
        let name = ChapterPosition::new(12, 3).filename(&title, "markdown");
        assert!(name.len() <= MAX_FILENAME_BYTES);
        assert!(name.ends_with("é.markdown"));
    }

    #[test]
    fn long_classified_title_yields_valid_filename() {
        let profile = Book::Worm.profile();
        let heading = format!("{} 3.1", "Gestation".repeat(40));
        let title = classify(&heading, &profile, false);
        assert_eq!(title.display, heading);
        let pos = resolve(&title, ChapterPosition::new(2, 9), &profile).unwrap();
        assert_eq!(pos, ChapterPosition::new(3, 1));
        assert!(pos.filename(&title.display, "md").len() <= MAX_FILENAME_BYTES);
    }

    fn numbered_walk(arcs: &[u32]) -> Vec<ChapterPosition> {
        let profile = Book::Worm.profile();
        let mut pos = ChapterPosition::INITIAL;
        let mut out = Vec::new();
        for (i, arc) in arcs.iter().enumerate() {
            let title = classify(&format!("Arc {arc}.{i}"), &profile, false);
            pos = resolve(&title, pos, &profile).unwrap();
            out.push(pos);
        }
        out
    }

    proptest! {
        #[test]
        fn arc_change_always_yields_chapter_one(
            arc in 1u32..99, cur_arc in 1u32..99, cur_ch in 0u32..99
        ) {
            prop_assume!(arc != cur_arc);
            let profile = Book::Worm.profile();
            let title = classify(&format!("Name {arc}.5"), &profile, false);
            let next = resolve(&title, ChapterPosition::new(cur_arc, cur_ch), &profile).unwrap();
            prop_assert_eq!(next, ChapterPosition::new(arc, 1));
        }

        #[test]
        fn chapters_run_from_one_within_each_arc(
            mut arcs in proptest::collection::vec(1u32..30, 1..60)
        ) {
            arcs.sort_unstable();
            let positions = numbered_walk(&arcs);
            for (i, pos) in positions.iter().enumerate() {
                prop_assert_eq!(pos.arc, arcs[i]);
                let starts_arc = (i == 0 && arcs[0] != 1) || (i > 0 && arcs[i - 1] != arcs[i]);
                if starts_arc {
                    prop_assert_eq!(pos.chapter, 1);
                } else if i > 0 {
                    prop_assert_eq!(pos.chapter, positions[i - 1].chapter + 1);
                }
            }
        }

        #[test]
        fn filenames_sort_in_reading_order(
            mut arcs in proptest::collection::vec(1u32..99, 1..60)
        ) {
            arcs.sort_unstable();
            let names: Vec<String> = numbered_walk(&arcs)
                .iter()
                .filter(|p| p.chapter < 100)
                .map(|p| p.filename("Title", "md"))
                .collect();
            let mut sorted = names.clone();
            sorted.sort();
            prop_assert_eq!(names, sorted);
        }
    }
}
