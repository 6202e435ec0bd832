//! Derived content fields for note bodies.
//!
//! # Responsibility
//! - Reduce a note body to searchable plain text plus word/char counts.
//!
//! # Invariants
//! - Derivation is pure; the repository re-runs it on every content write.
//! - Plaintext never contains markup or runs of whitespace.

use crate::model::item::ContentType;
use once_cell::sync::Lazy;
use regex::Regex;

static HTML_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("static pattern must compile"));
static MARKDOWN_LINK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!?\[([^\]]*)\]\([^)]*\)").expect("static pattern must compile"));
static MARKDOWN_HEADING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^#{1,6}\s+").expect("static pattern must compile"));
static MARKDOWN_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^```[^\n]*$").expect("static pattern must compile"));
static MARKDOWN_MARKS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)[*_`~]|^>\s?").expect("static pattern must compile"));
static WHITESPACE_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("static pattern must compile"));

/// Fields recomputed from a note body whenever `content` is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedContent {
    pub plaintext: String,
    pub word_count: i64,
    pub char_count: i64,
}

/// Strips markup according to the declared format and counts the result.
pub fn derive_content(content: &str, content_type: ContentType) -> DerivedContent {
    let stripped = match content_type {
        ContentType::Html => strip_html(content),
        ContentType::Markdown => strip_markdown(content),
        ContentType::Plain | ContentType::Custom => content.to_string(),
    };

    let plaintext = WHITESPACE_RUN
        .replace_all(stripped.trim(), " ")
        .into_owned();
    DerivedContent {
        word_count: plaintext.split_whitespace().count() as i64,
        char_count: plaintext.chars().count() as i64,
        plaintext,
    }
}

fn strip_html(content: &str) -> String {
    let without_tags = HTML_TAG.replace_all(content, " ");
    without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
}

fn strip_markdown(content: &str) -> String {
    let no_fences = MARKDOWN_FENCE.replace_all(content, "");
    let no_links = MARKDOWN_LINK.replace_all(&no_fences, "$1");
    let no_headings = MARKDOWN_HEADING.replace_all(&no_links, "");
    MARKDOWN_MARKS.replace_all(&no_headings, "").into_owned()
}
