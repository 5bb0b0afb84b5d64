//! `Key: value` front-matter at the top of a page.
//!
//! ```text
//! ---                      optional opening fence
//! Title: Rust notes        → title: ["Rust notes"]
//! Tags: rust               → tags:  ["rust",
//!     cli                               "cli"]     (4+ space continuation)
//! ---                      closing fence, or the first blank line
//! ```
//!
//! Keys are lower-cased. The first line that is neither a key, a
//! continuation, a fence nor blank ends the block and stays in the body.

use std::collections::BTreeMap;

/// Front-matter key → every value given for it, in order.
pub type Metadata = BTreeMap<String, Vec<String>>;

/// Split `text` into its front-matter and the remaining body.
pub fn split(text: &str) -> (Metadata, &str) {
    let mut meta = Metadata::new();
    let mut key: Option<String> = None;
    let mut offset = 0;

    for (index, raw) in text.split_inclusive('\n').enumerate() {
        let line = raw.trim_end_matches(['\n', '\r']);

        if index == 0 && is_fence(line, &["---"]) {
            offset += raw.len();
            continue;
        }
        if line.trim().is_empty() || is_fence(line, &["---", "..."]) {
            offset += raw.len();
            break;
        }

        if let Some((k, value)) = parse_entry(line) {
            meta.entry(k.clone()).or_default().push(value.to_owned());
            key = Some(k);
        } else if let (Some(value), Some(k)) = (continuation(line), key.as_ref()) {
            meta.entry(k.clone()).or_default().push(value.to_owned());
        } else {
            break;
        }
        offset += raw.len();
    }

    (meta, &text[offset..])
}

/// First value of `key`, if present.
pub fn first<'a>(meta: &'a Metadata, key: &str) -> Option<&'a str> {
    meta.get(key).and_then(|values| values.first()).map(String::as_str)
}

/// `---`, `...`, optionally followed by whitespace and anything.
fn is_fence(line: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| {
        line.strip_prefix(marker)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(char::is_whitespace))
    })
}

/// `Key: value` with up to three leading spaces.
fn parse_entry(line: &str) -> Option<(String, &str)> {
    let trimmed = line.trim_start_matches(' ');
    if line.len() - trimmed.len() > 3 {
        return None;
    }
    let (key, value) = trimmed.split_once(':')?;
    let valid = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    valid.then(|| (key.to_ascii_lowercase(), value.trim()))
}

/// A line indented four or more spaces continuing the previous key.
fn continuation(line: &str) -> Option<&str> {
    line.starts_with("    ").then(|| line.trim())
}
