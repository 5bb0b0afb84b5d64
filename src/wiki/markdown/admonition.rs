//! `!!!` admonition blocks.
//!
//! ```text
//! !!! warning "Mind the gap"
//!     Indented body, rendered as markdown.
//! ```
//!
//! The header line must start at column 0. The body is every following
//! line indented by four spaces (or a tab); blank lines inside the body are
//! kept as long as an indented line follows them.

/// A run of plain markdown, or one admonition block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Markdown(String),
    Admonition {
        /// Space separated CSS classes, e.g. `"note"` or `"danger highlight"`.
        kind: String,
        /// `None` when the header used an explicit empty title (`""`).
        title: Option<String>,
        body: String,
    },
}

/// Split `text` into markdown runs and admonition blocks.
///
/// Header-looking lines inside fenced code are left alone.
pub fn split(text: &str) -> Vec<Segment> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let mut segments = Vec::new();
    let mut markdown = String::new();
    let mut fence: Option<&str> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        let bare = line.trim_end();

        if let Some(marker) = fence {
            if bare.trim_start().starts_with(marker) {
                fence = None;
            }
            markdown.push_str(line);
            i += 1;
            continue;
        }
        if let Some(marker) = fence_marker(bare) {
            fence = Some(marker);
            markdown.push_str(line);
            i += 1;
            continue;
        }

        let Some((kind, title)) = parse_header(bare) else {
            markdown.push_str(line);
            i += 1;
            continue;
        };

        // Body: indented lines, with blank lines allowed between them
        let mut end = i + 1;
        let mut last_indented = i;
        while end < lines.len() {
            let candidate = lines[end];
            if is_indented(candidate) {
                last_indented = end;
            } else if !candidate.trim().is_empty() {
                break;
            }
            end += 1;
        }

        let body: String = lines[i + 1..=last_indented]
            .iter()
            .map(|l| dedent(l))
            .collect();

        if !markdown.is_empty() {
            segments.push(Segment::Markdown(std::mem::take(&mut markdown)));
        }
        segments.push(Segment::Admonition { kind, title, body });
        i = last_indented + 1;
    }

    if !markdown.is_empty() {
        segments.push(Segment::Markdown(markdown));
    }
    segments
}

/// Parse `!!! kind [kind...] ["title"]`.
fn parse_header(line: &str) -> Option<(String, Option<String>)> {
    let rest = line.strip_prefix("!!!")?;
    let rest = rest.strip_prefix(' ').unwrap_or(rest).trim_end();

    let (kinds, title) = match rest.find('"') {
        Some(quote) => {
            let quoted = rest[quote + 1..].strip_suffix('"')?;
            (&rest[..quote], Some(quoted.to_owned()))
        }
        None => (rest, None),
    };

    let kinds: Vec<&str> = kinds.split_whitespace().collect();
    let valid = !kinds.is_empty()
        && kinds.iter().all(|k| {
            k.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        });
    if !valid {
        return None;
    }

    let title = match title {
        Some(t) if t.is_empty() => None,
        Some(t) => Some(t),
        None => Some(capitalize(kinds[0])),
    };
    Some((kinds.join(" "), title))
}

fn fence_marker(line: &str) -> Option<&'static str> {
    let trimmed = line.trim_start();
    if trimmed.starts_with("```") {
        Some("```")
    } else if trimmed.starts_with("~~~") {
        Some("~~~")
    } else {
        None
    }
}

fn is_indented(line: &str) -> bool {
    line.starts_with("    ") || line.starts_with('\t')
}

fn dedent(line: &str) -> &str {
    line.strip_prefix("    ")
        .or_else(|| line.strip_prefix('\t'))
        .unwrap_or_else(|| line.trim_start_matches(' '))
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
