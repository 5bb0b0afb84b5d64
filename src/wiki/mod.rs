//! The wiki: pages, the recent files index and the todo list under one root.
//!
//! [`Wiki`] is built once at startup and shared by reference with every
//! request handler. State that changes between requests sits behind its own
//! lock:
//!
//! | Lock      | Guards                                        |
//! |-----------|-----------------------------------------------|
//! | `todos`   | the todo list and its file                    |
//! | `recent`  | the recent files index                        |
//! | `writes`  | markdown and upload writes, and their commits |

pub mod error;
pub mod journal;
pub mod markdown;
pub mod page;
pub mod path;
pub mod recent;
pub mod todo;

pub use error::{Result, WikiError};
pub use page::Page;
pub use recent::{RecentFile, RecentFileManager};
pub use todo::{Record, TodoList};

use crate::{
    config::Config,
    debug, log,
    utils::{git::VersionControl, slug},
};
use chrono::Local;
use markdown::Renderer;
use parking_lot::Mutex;
use std::{
    fs, io,
    path::{Component, Path, PathBuf},
};

/// Logical path of the built-in help page.
pub const HELP_PAGE: &str = "help";

const HELP_TEXT: &str = include_str!("../embed/help.md");

pub struct Wiki {
    root: PathBuf,
    renderer: Renderer,
    vcs: Box<dyn VersionControl + Send + Sync>,
    recent: Mutex<RecentFileManager>,
    todos: Mutex<TodoList>,
    writes: Mutex<()>,
}

impl Wiki {
    /// Open the todo store and scan the content root.
    pub fn new(config: &Config, vcs: Box<dyn VersionControl + Send + Sync>) -> Result<Self> {
        let root = config.root.clone();
        let todos = TodoList::open(config.todo_path(), config.todo.id_ceiling)?;
        let recent = RecentFileManager::new(&root, &config.recent, &[config.todo.file.as_str()])?;
        let renderer = Renderer::new(&config.wiki.extensions);

        let names: Vec<_> = renderer.extensions().iter().map(|ext| ext.name()).collect();
        debug!("wiki"; "markdown extensions: {}", names.join(", "));
        debug!("todo"; "{} items in {}", todos.len(), todos.path().display());
        debug!(
            "recent";
            "{} files indexed under {}, showing {} by default",
            recent.len(),
            recent.root().display(),
            recent.default_limit()
        );

        Ok(Self {
            renderer,
            vcs,
            recent: Mutex::new(recent),
            todos: Mutex::new(todos),
            writes: Mutex::new(()),
            root,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn vcs(&self) -> &dyn VersionControl {
        self.vcs.as_ref()
    }

    // ------------------------------------------------------------------------
    // Pages
    // ------------------------------------------------------------------------

    /// Load the page at `path`, with its children.
    pub fn page(&self, path: impl AsRef<Path>) -> Result<Page> {
        Page::open(path, &self.root, 0)
    }

    /// Replace the content of `path`, commit it and mark it as recent.
    pub fn save_page(&self, path: impl AsRef<Path>, markdown: impl Into<String>) -> Result<Page> {
        let _guard = self.writes.lock();

        let mut page = self.page(path)?;
        page.set_markdown(markdown);
        page.save(&self.renderer, self.vcs())?;

        self.recent.lock().update(page.path());
        log!("page"; "saved {}", page.relpath().display());
        Ok(page)
    }

    /// Remove the markdown file of `path` and commit the deletion.
    pub fn delete_page(&self, path: impl AsRef<Path>) -> Result<()> {
        let _guard = self.writes.lock();

        let resolved = path::resolve(path, &self.root);
        match fs::remove_file(&resolved.absolute) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(WikiError::PageNotFound(resolved.relative));
            }
            Err(err) => return Err(WikiError::io(&resolved.absolute)(err)),
        }
        self.recent.lock().delete(&resolved.absolute);

        self.commit(
            &resolved.absolute,
            &format!("Delete {}", resolved.relative.display()),
        )?;
        log!("page"; "deleted {}", resolved.relative.display());
        Ok(())
    }

    /// Store an uploaded file in `dir` and return its URL path.
    ///
    /// Only the sanitized base name of `filename` is used.
    pub fn store_upload(&self, dir: impl AsRef<Path>, filename: &str, bytes: &[u8]) -> Result<String> {
        let name = slug::sanitize_file_name(filename)
            .ok_or_else(|| WikiError::BadInput(format!("unusable file name `{filename}`")))?;

        let relative_dir: PathBuf = dir
            .as_ref()
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        let relative = relative_dir.join(&name);
        let absolute = self.root.join(&relative);

        let _guard = self.writes.lock();
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).map_err(WikiError::io(parent))?;
        }
        fs::write(&absolute, bytes).map_err(WikiError::io(&absolute))?;
        self.commit(&absolute, &format!("Add {name}"))?;
        self.recent.lock().update(&absolute);

        log!("upload"; "stored {}", relative.display());
        Ok(slug::url_path(&relative))
    }

    /// Stage `path` and commit when something changed.
    fn commit(&self, path: &Path, message: &str) -> Result<()> {
        self.vcs.stage(&[path])?;
        if self.vcs.has_staged_changes()? {
            self.vcs.commit(message)?;
        }
        Ok(())
    }

    /// Write the built-in help page unless it already has content.
    pub fn ensure_help_page(&self) -> Result<bool> {
        if self.page(HELP_PAGE)?.exists() {
            return Ok(false);
        }
        self.save_page(HELP_PAGE, HELP_TEXT)?;
        Ok(true)
    }

    // ------------------------------------------------------------------------
    // Recent Files
    // ------------------------------------------------------------------------

    /// Snapshot of the newest entries, see [`RecentFileManager::get`].
    pub fn recent(&self, limit: Option<usize>) -> Result<Vec<RecentFile>> {
        Ok(self.recent.lock().get(limit)?.to_vec())
    }

    /// Up to `limit` recent markdown files, loaded as pages.
    pub fn recent_pages(&self, limit: usize) -> Result<Vec<Page>> {
        let files = self.recent.lock().all().to_vec();
        files
            .iter()
            .filter(|file| path::has_markdown_ext(&file.path))
            .take(limit)
            .map(|file| Page::open(&file.path, &self.root, 1))
            .collect()
    }

    // ------------------------------------------------------------------------
    // Todos
    // ------------------------------------------------------------------------

    pub fn todos(&self) -> Vec<Record> {
        self.todos.lock().items().to_vec()
    }

    pub fn upsert_todo(&self, record: Record) -> Result<u64> {
        self.todos.lock().upsert(record)
    }

    /// Delete a todo; a done one is archived to today's journal first.
    pub fn delete_todo(&self, id: u64) -> Result<Record> {
        let mut todos = self.todos.lock();
        let Some(record) = todos.get(id) else {
            return Err(WikiError::TodoNotFound(id));
        };

        if todo::is_done(record) {
            let _guard = self.writes.lock();
            let page = journal::archive(
                record,
                Local::now().date_naive(),
                &self.root,
                &self.renderer,
                self.vcs(),
            )?;
            self.recent.lock().update(page.path());
            log!("journal"; "archived todo {id} to {}", page.relpath().display());
        }

        todos.delete(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::git::NoVersionControl;
    use serde_json::json;
    use std::{collections::HashSet, sync::Arc, thread};
    use tempfile::TempDir;

    fn wiki(dir: &TempDir) -> Wiki {
        let config = Config {
            root: dir.path().to_path_buf(),
            ..Default::default()
        };
        Wiki::new(&config, Box::new(NoVersionControl)).unwrap()
    }

    fn record(value: serde_json::Value) -> Record {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_save_page_updates_recent() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        wiki.save_page("a", "# A").unwrap();
        wiki.save_page("b", "# B").unwrap();
        wiki.save_page("a", "# A again").unwrap();

        let recent = wiki.recent(None).unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].path, dir.path().join("a.md"));

        let pages = wiki.recent_pages(9).unwrap();
        assert_eq!(pages[0].title(wiki.renderer()), "A again");
    }

    #[test]
    fn test_delete_page() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);
        wiki.save_page("gone", "x").unwrap();

        wiki.delete_page("gone").unwrap();
        assert!(!dir.path().join("gone.md").exists());
        assert!(wiki.recent(None).unwrap().is_empty());

        assert!(matches!(wiki.delete_page("gone"), Err(WikiError::PageNotFound(_))));
    }

    #[test]
    fn test_store_upload() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let url = wiki.store_upload("notes", "../../cat photo.png", b"png").unwrap();
        assert_eq!(url, "/notes/cat_photo.png");
        assert_eq!(fs::read(dir.path().join("notes/cat_photo.png")).unwrap(), b"png");

        let url = wiki.store_upload("", "top.txt", b"t").unwrap();
        assert_eq!(url, "/top.txt");

        assert!(matches!(wiki.store_upload("", "..", b""), Err(WikiError::BadInput(_))));
    }

    #[test]
    fn test_ensure_help_page_once() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        assert!(wiki.ensure_help_page().unwrap());
        assert!(!wiki.ensure_help_page().unwrap());
        assert_eq!(wiki.page(HELP_PAGE).unwrap().title(wiki.renderer()), "Help");
    }

    #[test]
    fn test_delete_done_todo_archives_to_journal() {
        let dir = TempDir::new().unwrap();
        let wiki = wiki(&dir);

        let open = wiki.upsert_todo(record(json!({"text": "open one"}))).unwrap();
        let done = wiki.upsert_todo(record(json!({"text": "done one"}))).unwrap();
        wiki.upsert_todo(record(json!({"id": done, "done": true}))).unwrap();

        wiki.delete_todo(open).unwrap();
        let journal_page = journal::page_path(Local::now().date_naive());
        assert!(!wiki.page(&journal_page).unwrap().exists());

        wiki.delete_todo(done).unwrap();
        let page = wiki.page(&journal_page).unwrap();
        assert!(page.markdown().contains(&format!("* {done}: done one")));
        assert!(wiki.todos().is_empty());

        assert!(matches!(wiki.delete_todo(done), Err(WikiError::TodoNotFound(_))));
    }

    #[test]
    fn test_concurrent_upserts_get_unique_ids() {
        let dir = TempDir::new().unwrap();
        let wiki = Arc::new(wiki(&dir));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let wiki = Arc::clone(&wiki);
                thread::spawn(move || {
                    (0..10)
                        .map(|i| {
                            wiki.upsert_todo(record(json!({"text": format!("{t}-{i}")})))
                                .unwrap()
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        let ids: Vec<u64> = handles
            .into_iter()
            .flat_map(|h| h.join().unwrap())
            .collect();
        let unique: HashSet<_> = ids.iter().copied().collect();
        assert_eq!(unique.len(), 80);

        let on_disk = TodoList::open(dir.path().join("todos.json"), 1024).unwrap();
        assert_eq!(on_disk.len(), 80);
        assert_eq!(on_disk.items(), wiki.todos().as_slice());
    }
}
