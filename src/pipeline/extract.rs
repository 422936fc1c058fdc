//! Chapter extraction: one fetched page → one [`ChapterRecord`].
//!
//! The page is parsed with `scraper`. Everything inside the blog's comment
//! section is ignored, the last `<h1>` outside it is the chapter heading, and
//! every `<p>` outside it is a candidate paragraph. Navigation paragraphs and
//! author's notes are dropped here; the rest goes through
//! [`normalize_paragraph`].

use crate::book::BookProfile;
use crate::error::SerialError;
use crate::output::ChapterRecord;
use crate::pipeline::fetch::RawPage;
use crate::pipeline::normalize::{normalize_paragraph, Fragment, Paragraph};
use crate::pipeline::resolve::resolve;
use crate::pipeline::title::classify;
use crate::walk::WalkerState;
use ego_tree::{NodeId, NodeRef};
use once_cell::sync::Lazy;
use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};

/// Link text of the pointer to the following chapter.
pub const NEXT_CHAPTER: &str = "Next Chapter";
/// Link text of the pointer to the preceding chapter.
pub const LAST_CHAPTER: &str = "Last Chapter";
/// Opening words of the author's-note boilerplate; the note spans two paragraphs.
pub const AUTHOR_NOTE_PREAMBLE: &str = "Brief note from the author:";

static COMMENTS: Lazy<Selector> = Lazy::new(|| Selector::parse("div#comments").unwrap());
static HEADING: Lazy<Selector> = Lazy::new(|| Selector::parse("h1").unwrap());
static PARAGRAPH: Lazy<Selector> = Lazy::new(|| Selector::parse("p").unwrap());
static LINK: Lazy<Selector> = Lazy::new(|| Selector::parse("a[href]").unwrap());

/// Extract the chapter on `page` and return it with the advanced walk state.
///
/// The returned state carries the resolved position, the pending skip
/// counter and the next-chapter URL (`None` on the last page).
pub fn extract_chapter(
    page: &RawPage,
    profile: &BookProfile,
    state: &WalkerState,
    extension: &str,
) -> Result<(ChapterRecord, WalkerState), SerialError> {
    let document = Html::parse_document(&page.html);
    let url = page.url.as_str();

    let comments = document
        .select(&COMMENTS)
        .next()
        .ok_or_else(|| SerialError::MissingElement {
            url: url.to_string(),
            what: "comments region (div#comments)",
        })?
        .id();
    let in_content = |el: &ElementRef<'_>| !is_within(el, comments);

    // ── Heading → title → position ───────────────────────────────────────
    let heading = document
        .select(&HEADING)
        .filter(in_content)
        .last()
        .map(|h| h.text().collect::<String>())
        .ok_or_else(|| SerialError::MissingElement {
            url: url.to_string(),
            what: "chapter heading (h1)",
        })?;

    let title = classify(&heading, profile, state.position.is_initial());
    let position = resolve(&title, state.position, profile)?;
    debug!(
        "{}: '{}' → {} ({:?})",
        url, title.display, position, title.kind
    );

    // ── Paragraphs ───────────────────────────────────────────────────────
    let mut skip_next = state.skip_next;
    let mut paragraphs = Vec::new();
    let mut warnings = Vec::new();

    for p in document.select(&PARAGRAPH).filter(in_content) {
        let text = p.text().collect::<String>().replace('\u{a0}', " ");

        if is_navigation(&text) {
            continue;
        }
        if text.trim_start().starts_with(AUTHOR_NOTE_PREAMBLE) {
            skip_next = 1;
            continue;
        }

        let mut paragraph = Paragraph::new(fragments(*p));
        if text.trim().is_empty() && !contains_image(&paragraph.fragments) {
            continue;
        }
        if skip_next > 0 {
            skip_next -= 1;
            continue;
        }
        if let Some(style) = p.value().attr("style") {
            paragraph = paragraph.with_style(style);
        }

        let normalized = normalize_paragraph(&paragraph);
        for w in &normalized.warnings {
            warn!("{}: {}", title.display, w);
        }
        warnings.extend(normalized.warnings);
        if !normalized.text.is_empty() {
            paragraphs.push(normalized.text);
        }
    }

    // ── Next chapter link ────────────────────────────────────────────────
    let next_url = document
        .select(&LINK)
        .filter(in_content)
        .filter(|a| a.text().collect::<String>().trim() == NEXT_CHAPTER)
        .filter_map(|a| a.value().attr("href"))
        .last()
        .map(|href| {
            page.url.join(href).map_err(|e| SerialError::InvalidUrl {
                url: href.to_string(),
                reason: e.to_string(),
            })
        })
        .transpose()?;

    let record = ChapterRecord {
        source_url: url.to_string(),
        position,
        kind: title.kind,
        filename: position.filename(&title.display, extension),
        title: title.display,
        paragraphs,
        warnings,
    };
    let next_state = WalkerState {
        position,
        skip_next,
        next_url,
    };
    Ok((record, next_state))
}

fn is_within(el: &ElementRef<'_>, region: NodeId) -> bool {
    el.id() == region || el.ancestors().any(|a| a.id() == region)
}

/// A paragraph holding nothing but "Last Chapter" / "Next Chapter" labels.
fn is_navigation(text: &str) -> bool {
    if !text.contains(NEXT_CHAPTER) && !text.contains(LAST_CHAPTER) {
        return false;
    }
    text.replace(NEXT_CHAPTER, "")
        .replace(LAST_CHAPTER, "")
        .trim()
        .is_empty()
}

/// Convert a DOM subtree into normalizer fragments.
fn fragments(node: NodeRef<'_, Node>) -> Vec<Fragment> {
    node.children()
        .filter_map(|child| match child.value() {
            Node::Text(t) => Some(Fragment::Text((**t).to_owned())),
            Node::Element(el) => Some(match el.name() {
                "em" | "i" => Fragment::Emphasis(fragments(child)),
                "strong" | "b" => Fragment::Strong(fragments(child)),
                "img" => Fragment::Image {
                    alt: el.attr("alt").map(str::to_owned),
                    src: el.attr("src").map(str::to_owned),
                },
                "br" => Fragment::LineBreak,
                _ => Fragment::Span(fragments(child)),
            }),
            _ => None,
        })
        .collect()
}

fn contains_image(fragments: &[Fragment]) -> bool {
    fragments.iter().any(|f| match f {
        Fragment::Image { .. } => true,
        Fragment::Emphasis(c) | Fragment::Strong(c) | Fragment::Span(c) => contains_image(c),
        _ => false,
    })
}
