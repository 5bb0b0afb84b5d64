//! File name sanitizing and URL path utilities.

use std::path::{Component, Path};

/// Characters forbidden in stored file names
const FORBIDDEN_CHARS: &[char] = &[
    '<', '>', ':', '|', '?', '*', '#', '\\', '/', '"', '\t', '\r', '\n', '\0',
];

/// Remove forbidden characters and replace whitespace with underscores
fn sanitize_text(text: &str) -> String {
    text.trim()
        .chars()
        .filter(|c| !FORBIDDEN_CHARS.contains(c))
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// Reduce a client-supplied file name to a safe base name.
///
/// Directory parts are dropped, then forbidden characters; leading dots are
/// trimmed so the result is never hidden, `.` or `..`.
/// Returns `None` when nothing usable is left.
pub fn sanitize_file_name(name: &str) -> Option<String> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = sanitize_text(base);
    let cleaned = cleaned.trim_start_matches('.');
    (!cleaned.is_empty()).then(|| cleaned.to_owned())
}

/// `a/b/c.md` → `/a/b/c.md`, always with forward slashes.
pub fn url_path(path: &Path) -> String {
    let parts: Vec<_> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect();
    format!("/{}", parts.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_text() {
        assert_eq!(sanitize_text("  hello world  "), "hello_world");
        assert_eq!(sanitize_text("a<b>c:d|e?f*g#h"), "abcdefgh");
    }

    #[test]
    fn test_sanitize_file_name_drops_directories() {
        assert_eq!(sanitize_file_name("../../etc/passwd").as_deref(), Some("passwd"));
        assert_eq!(sanitize_file_name("C:\\Users\\me\\cat.png").as_deref(), Some("cat.png"));
        assert_eq!(sanitize_file_name("my photo.jpg").as_deref(), Some("my_photo.jpg"));
    }

    #[test]
    fn test_sanitize_file_name_rejects_empty_and_dots() {
        assert_eq!(sanitize_file_name(""), None);
        assert_eq!(sanitize_file_name(".."), None);
        assert_eq!(sanitize_file_name("dir/"), None);
        assert_eq!(sanitize_file_name("???"), None);
        assert_eq!(sanitize_file_name(".hidden").as_deref(), Some("hidden"));
    }

    #[test]
    fn test_url_path() {
        assert_eq!(url_path(Path::new("a/b/c.md")), "/a/b/c.md");
        assert_eq!(url_path(Path::new("")), "/");
        assert_eq!(url_path(Path::new("/x/./y")), "/x/y");
    }
}
