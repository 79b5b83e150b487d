//! HTML sanitizer for scraped page text. Pure, never fails — malformed input
//! degrades to an empty string.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DOCTYPE_RE: Regex = Regex::new(r"(?i)<!DOCTYPE[^>]*>").unwrap();
    // Tolerates an unterminated final tag at end of input.
    static ref TAG_RE: Regex = Regex::new(r"</?[^>]+(>|$)").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Strips markup and decodes a fixed entity set from scraped job-page text.
///
/// Order matters: tags are removed before entities are decoded (so decoded
/// `<`/`>` cannot be re-interpreted as markup within the same pass), and
/// whitespace collapses last so decoded non-breaking spaces fold into the
/// surrounding runs.
pub fn sanitize(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let text = DOCTYPE_RE.replace_all(raw, "");
    let text = TAG_RE.replace_all(&text, "");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE_RE.replace_all(&text, " ").trim().to_string()
}
