//! Logical page path -> markdown file path resolution.
//!
//! Pure path arithmetic, nothing here touches the filesystem.
//!
//! ```text
//! "notes/rust"            → notes/rust.md   → <root>/notes/rust.md
//! "notes/rust.md"         → notes/rust.md   → <root>/notes/rust.md
//! "<root>/notes/rust.md"  → notes/rust.md   → <root>/notes/rust.md
//! ```

use std::{
    ffi::OsString,
    path::{Component, Path, PathBuf},
};

/// Markdown file extension, without the dot.
pub const MARKDOWN_EXT: &str = "md";

/// A page path relative to the content root, and its absolute counterpart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Always ends in `.md`.
    pub relative: PathBuf,
    pub absolute: PathBuf,
}

/// Resolve a caller-supplied page path against `root`.
///
/// A leading `root` prefix is stripped first, so resolving an already
/// resolved absolute path gives the same result. `.md` is appended to the
/// file name when missing.
pub fn resolve(path: impl AsRef<Path>, root: &Path) -> ResolvedPath {
    let path = path.as_ref();
    let stripped = path.strip_prefix(root).unwrap_or(path);

    // Keep only plain names: `/`, `C:\`, `.` and `..` would let the join escape the root
    let mut relative: PathBuf = stripped
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect();

    if !has_markdown_ext(&relative) {
        let mut name: OsString = relative.file_name().map(OsString::from).unwrap_or_default();
        name.push(".");
        name.push(MARKDOWN_EXT);
        relative.set_file_name(name);
    }

    ResolvedPath {
        absolute: root.join(&relative),
        relative,
    }
}

/// Whether the final component ends in `.md`.
pub fn has_markdown_ext(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == MARKDOWN_EXT)
}

/// Remove a trailing `.md`, leaving other paths untouched.
///
/// `notes/rust.md` → `notes/rust`, which is also where child pages live.
pub fn strip_markdown_ext(path: &Path) -> PathBuf {
    if has_markdown_ext(path) {
        path.with_extension("")
    } else {
        path.to_path_buf()
    }
}
