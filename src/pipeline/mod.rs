//! Per-page stages of a walk.
//!
//! Each submodule implements one step; the walker in [`crate::walk`] chains
//! them for every page.
//!
//! ## Data Flow
//!
//! ```text
//! fetch ──▶ extract ──┬──▶ title ──▶ resolve      (heading → position)
//! (HTTP)   (scraper)  └──▶ normalize              (p → Markdown)
//! ```
//!
//! 1. [`fetch`]      URL to raw markup; the only stage with network I/O
//! 2. [`extract`]    parse the page, pick heading, paragraphs and next link
//! 3. [`title`]      classify the heading (numbered, interlude, epilogue, …)
//! 4. [`resolve`]    turn the classification into an `(arc, chapter)` pair
//! 5. [`normalize`]  render paragraph fragments as Markdown text

pub mod extract;
pub mod fetch;
pub mod normalize;
pub mod resolve;
pub mod title;
