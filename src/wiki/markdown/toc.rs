//! Heading ids and the `[TOC]` table of contents.

use super::{escape_href, escape_html};
use std::collections::HashSet;

/// Placeholder paragraph replaced by the rendered table of contents.
pub const MARKER: &str = "<p>[TOC]</p>";

#[derive(Debug)]
struct Entry {
    level: u8,
    id: String,
    text: String,
}

/// Headings collected while rendering one page.
#[derive(Debug, Default)]
pub struct Toc {
    entries: Vec<Entry>,
    /// Every id handed out so far, explicit ones included.
    issued: HashSet<String>,
}

impl Toc {
    /// Register a heading and return its unique id.
    ///
    /// An explicit id (`# Title {#custom}`) is kept as is.
    pub fn add(&mut self, level: u8, text: &str, explicit: Option<&str>) -> String {
        let id = match explicit {
            Some(id) => id.to_owned(),
            None => self.unique(slugify(text)),
        };
        self.issued.insert(id.clone());
        self.entries.push(Entry {
            level,
            id: id.clone(),
            text: text.trim().to_owned(),
        });
        id
    }

    /// `id` unless taken, otherwise bump its `_N` suffix until it is free.
    fn unique(&self, mut id: String) -> String {
        while id.is_empty() || self.issued.contains(&id) {
            id = match split_suffix(&id) {
                Some((stem, n)) => format!("{stem}_{}", n + 1),
                None => format!("{id}_1"),
            };
        }
        id
    }

    /// Nested `<ul>` lists following heading levels.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<div class=\"toc\">\n");
        let mut stack: Vec<u8> = Vec::new();

        for entry in &self.entries {
            // Close deeper or equal levels, then open one list per new depth
            while stack.last().is_some_and(|&level| level > entry.level) {
                stack.pop();
                html.push_str("</li>\n</ul>\n");
            }
            if stack.last() == Some(&entry.level) {
                html.push_str("</li>\n");
            } else {
                stack.push(entry.level);
                html.push_str("<ul>\n");
            }
            html.push_str(&format!(
                "<li><a href=\"#{}\">{}</a>",
                escape_href(&entry.id),
                escape_html(&entry.text)
            ));
        }
        while stack.pop().is_some() {
            html.push_str("</li>\n</ul>\n");
        }

        html.push_str("</div>\n");
        html
    }
}

/// `name_12` → `("name", 12)`
fn split_suffix(id: &str) -> Option<(&str, u64)> {
    let (stem, digits) = id.rsplit_once('_')?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(|n| (stem, n))
}

/// Lower-case, drop punctuation, join words with `-`.
pub fn slugify(text: &str) -> String {
    let cleaned: String = text
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || *c == '-' || *c == '_')
        .flat_map(char::to_lowercase)
        .collect();
    cleaned.split_whitespace().collect::<Vec<_>>().join("-")
}
