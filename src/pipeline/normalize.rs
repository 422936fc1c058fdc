//! Paragraph normalization: inline chapter markup → Markdown prose.
//!
//! The extractor hands each `<p>` over as a small [`Fragment`] tree, already
//! detached from the HTML DOM. Working on that tree rather than on serialized
//! HTML keeps the rules independent of how the parser happens to print tags.
//!
//! ## Rule Order
//!
//! 1. Images become their alt text (missing alt → [`ChapterWarning`])
//! 2. Non-breaking spaces become spaces; space runs collapse to one
//! 3. Literal `\`, `*` and `_` are backslash-escaped
//! 4. Emphasis → `*…*`, bold → `**…**`, boundary spaces moved outside
//! 5. The scene-break glyph becomes `-`, unless it is the whole paragraph
//! 6. A `padding-left` style turns the paragraph into a blockquote
//! 7. Leading/trailing whitespace is trimmed

use crate::error::ChapterWarning;
use once_cell::sync::Lazy;
use regex::Regex;

/// Decorative glyph the source blogs use between scenes.
pub const SCENE_BREAK: char = '■';

/// One piece of a paragraph's inline content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    Emphasis(Vec<Fragment>),
    Strong(Vec<Fragment>),
    Image {
        alt: Option<String>,
        src: Option<String>,
    },
    LineBreak,
    /// Any other inline element (`<span>`, `<a>`, …); only its children count.
    Span(Vec<Fragment>),
}

/// A paragraph as handed to the normalizer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Paragraph {
    pub fragments: Vec<Fragment>,
    /// Raw `style` attribute of the paragraph element, if any.
    pub style: Option<String>,
}

impl Paragraph {
    pub fn new(fragments: Vec<Fragment>) -> Self {
        Self {
            fragments,
            style: None,
        }
    }

    pub fn with_style(mut self, style: impl Into<String>) -> Self {
        self.style = Some(style.into());
        self
    }

    /// Concatenated text content, ignoring markup and images.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        collect_text(&self.fragments, &mut out);
        out
    }

    fn is_indented(&self) -> bool {
        self.style
            .as_deref()
            .is_some_and(|s| s.contains("padding-left"))
    }
}

fn collect_text(fragments: &[Fragment], out: &mut String) {
    for f in fragments {
        match f {
            Fragment::Text(t) => out.push_str(t),
            Fragment::Emphasis(c) | Fragment::Strong(c) | Fragment::Span(c) => {
                collect_text(c, out)
            }
            Fragment::LineBreak => out.push('\n'),
            Fragment::Image { .. } => {}
        }
    }
}

/// Normalized paragraph text plus any non-fatal findings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Normalized {
    pub text: String,
    pub warnings: Vec<ChapterWarning>,
}

static RE_SPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r" {2,}").unwrap());
static RE_SPACE_AFTER_NEWLINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n +").unwrap());

/// Apply every normalization rule to one paragraph.
pub fn normalize_paragraph(paragraph: &Paragraph) -> Normalized {
    // Rule 5, whole-paragraph case: keep the scene break verbatim.
    let plain = paragraph.plain_text().replace('\u{a0}', " ");
    if plain.trim() == SCENE_BREAK.to_string() && !has_image(&paragraph.fragments) {
        return Normalized {
            text: SCENE_BREAK.to_string(),
            warnings: Vec::new(),
        };
    }

    let indented = paragraph.is_indented();
    let mut renderer = Renderer {
        line_break: if indented { "\n> " } else { "\\\n" },
        warnings: Vec::new(),
    };
    let mut text = String::new();
    renderer.render(&paragraph.fragments, &mut text);

    let text = RE_SPACE_RUNS.replace_all(&text, " ");
    let text = RE_SPACE_AFTER_NEWLINE.replace_all(&text, "\n");
    // A break with nothing on one side would leave a dangling `\` or `>`.
    let (_, text, _) = split_edge_breaks(&text, renderer.line_break);
    let text = text.trim();
    let text = if indented && !text.is_empty() {
        format!("> {text}")
    } else {
        text.to_string()
    };

    Normalized {
        text,
        warnings: renderer.warnings,
    }
}

fn has_image(fragments: &[Fragment]) -> bool {
    fragments.iter().any(|f| match f {
        Fragment::Image { .. } => true,
        Fragment::Emphasis(c) | Fragment::Strong(c) | Fragment::Span(c) => has_image(c),
        _ => false,
    })
}

struct Renderer {
    line_break: &'static str,
    warnings: Vec<ChapterWarning>,
}

impl Renderer {
    fn render(&mut self, fragments: &[Fragment], out: &mut String) {
        for f in fragments {
            match f {
                Fragment::Text(t) => push_text(t, out),
                Fragment::Emphasis(children) => {
                    let mut inner = String::new();
                    self.render(children, &mut inner);
                    self.wrap(&inner, "*", out);
                }
                Fragment::Strong(children) => {
                    let mut inner = String::new();
                    self.render(children, &mut inner);
                    self.wrap(&inner, "**", out);
                }
                Fragment::Image { alt: Some(alt), .. } => push_text(alt, out),
                Fragment::Image { alt: None, src } => {
                    self.warnings
                        .push(ChapterWarning::MissingAltText { src: src.clone() });
                }
                Fragment::LineBreak => out.push_str(self.line_break),
                Fragment::Span(children) => self.render(children, out),
            }
        }
    }

    /// Surround `inner` with `marker`, keeping boundary spaces and line
    /// breaks outside it.
    fn wrap(&self, inner: &str, marker: &str, out: &mut String) {
        let (lead, core, trail) = split_edge_breaks(inner, self.line_break);
        if core.is_empty() {
            out.push_str(inner);
            return;
        }
        out.push_str(lead);
        out.push_str(marker);
        out.push_str(core);
        out.push_str(marker);
        out.push_str(trail);
    }
}

fn push_text(raw: &str, out: &mut String) {
    let cleaned: String = raw
        .chars()
        .map(|c| match c {
            '\u{a0}' | '\n' | '\r' | '\t' => ' ',
            SCENE_BREAK => '-',
            c => c,
        })
        .collect();
    out.push_str(&escape_markdown(&cleaned));
}

/// Split `s` into leading spaces/breaks, core, and trailing spaces/breaks.
fn split_edge_breaks<'a>(s: &'a str, line_break: &str) -> (&'a str, &'a str, &'a str) {
    let (head, tail) = (
        line_break.trim_start_matches(' '),
        line_break.trim_end_matches(' '),
    );
    let mut core = s;
    loop {
        let t = core.trim_start_matches(' ');
        match t.strip_prefix(head) {
            Some(rest) => core = rest,
            None => {
                core = t;
                break;
            }
        }
    }
    let start = s.len() - core.len();
    loop {
        let t = core.trim_end_matches(' ');
        match t.strip_suffix(tail) {
            Some(rest) => core = rest,
            None => {
                core = t;
                break;
            }
        }
    }
    let end = start + core.len();
    (&s[..start], core, &s[end..])
}

/// Backslash-escape the characters Markdown would read as formatting.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '*' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Left inverse of [`escape_markdown`].
pub fn unescape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(&next) = chars.peek() {
                if matches!(next, '\\' | '*' | '_') {
                    out.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}
