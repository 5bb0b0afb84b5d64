//! A single markdown page and its immediate children.
//!
//! A page `notes.md` may have child pages stored in a sibling directory
//! named after it:
//!
//! ```text
//! notes.md          ← depth 0
//! notes/
//!   rust.md         ← depth 1, listed in `subpages`
//!   rust/
//!     cli.md        ← not discovered from `notes`
//! ```

use super::{
    error::{Result, WikiError},
    markdown::{Metadata, Renderer, meta},
    path::{self, ResolvedPath},
};
use crate::{debug, utils::git::VersionControl};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

#[derive(Debug, Clone)]
pub struct Page {
    root: PathBuf,
    path: ResolvedPath,
    /// Empty means the page does not exist yet.
    markdown: String,
    /// Front-matter of the last render, `None` before the first one.
    meta: Option<Metadata>,
    depth: usize,
    subpages: Vec<Page>,
}

impl Page {
    /// Resolve `path` under `root` and load whatever is on disk.
    pub fn open(path: impl AsRef<Path>, root: &Path, depth: usize) -> Result<Self> {
        let mut page = Self {
            root: root.to_path_buf(),
            path: path::resolve(path, root),
            markdown: String::new(),
            meta: None,
            depth,
            subpages: Vec::new(),
        };
        page.load()?;
        Ok(page)
    }

    /// Read the markdown file (if any) and, at depth 0, discover child pages.
    pub fn load(&mut self) -> Result<()> {
        match fs::read_to_string(&self.path.absolute) {
            Ok(text) => {
                debug!("page"; "loaded {}", self.path.relative.display());
                self.markdown = text;
                self.meta = None;
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(WikiError::io(&self.path.absolute)(err)),
        }

        self.subpages.clear();
        if self.depth == 0 {
            self.discover_subpages()?;
        }
        Ok(())
    }

    /// One level of `*.md` files in the directory named after this page.
    fn discover_subpages(&mut self) -> Result<()> {
        let dir = path::strip_markdown_ext(&self.path.absolute);
        if !dir.is_dir() {
            return Ok(());
        }

        let mut children: Vec<PathBuf> = fs::read_dir(&dir)
            .map_err(WikiError::io(&dir))?
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|ft| ft.is_file()))
            .map(|entry| entry.path())
            .filter(|p| path::has_markdown_ext(p))
            .collect();
        children.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

        for child in children {
            let page = Self::open(&child, &self.root, self.depth + 1)?;
            debug!("page"; "subpage {} at depth {}", page.relpath().display(), page.depth());
            self.subpages.push(page);
        }
        Ok(())
    }

    /// Write the page to disk, refresh its metadata and commit the change.
    pub fn save(&mut self, renderer: &Renderer, vcs: &dyn VersionControl) -> Result<()> {
        if let Some(parent) = self.path.absolute.parent() {
            fs::create_dir_all(parent).map_err(WikiError::io(parent))?;
        }
        fs::write(&self.path.absolute, &self.markdown).map_err(WikiError::io(&self.path.absolute))?;
        self.render(renderer);

        vcs.stage(&[self.path.absolute.as_path()])?;
        if vcs.has_staged_changes()? {
            vcs.commit(&format!("Change {}", self.title(renderer)))?;
        }
        Ok(())
    }

    /// Front-matter `title`, then the first `# ` heading, then the path.
    ///
    /// Front-matter is whatever `renderer` extracts, so with the `meta`
    /// extension off a `Title:` line is plain text.
    pub fn title(&self, renderer: &Renderer) -> String {
        let parsed;
        let meta = match &self.meta {
            Some(meta) => meta,
            None => {
                parsed = renderer.metadata(&self.markdown);
                &parsed
            }
        };
        if let Some(title) = meta::first(meta, "title") {
            return title.to_owned();
        }

        self.markdown
            .lines()
            .find_map(|line| line.strip_prefix("# "))
            .map(str::to_owned)
            .unwrap_or_else(|| {
                path::strip_markdown_ext(&self.path.relative)
                    .to_string_lossy()
                    .into_owned()
            })
    }

    /// Render to HTML, keeping the extracted metadata.
    pub fn render(&mut self, renderer: &Renderer) -> String {
        let rendered = renderer.render(&self.markdown);
        self.meta = Some(rendered.meta);
        rendered.html
    }

    pub fn set_markdown(&mut self, markdown: impl Into<String>) {
        self.markdown = markdown.into();
        self.meta = None;
    }

    pub fn relpath(&self) -> &Path {
        &self.path.relative
    }

    pub fn path(&self) -> &Path {
        &self.path.absolute
    }

    pub fn markdown(&self) -> &str {
        &self.markdown
    }

    pub const fn depth(&self) -> usize {
        self.depth
    }

    pub fn subpages(&self) -> &[Page] {
        &self.subpages
    }

    pub fn exists(&self) -> bool {
        !self.markdown.is_empty()
    }

    #[allow(dead_code)] // Reserved API
    pub fn meta(&self) -> Option<&Metadata> {
        self.meta.as_ref()
    }
}
