//! Most-recently-modified index of files under the content root.
//!
//! Built once by walking the tree, then kept current by the wiki as pages
//! are saved and deleted instead of rescanning.

use super::error::{Result, WikiError};
use crate::config::RecentConfig;
use serde::Serialize;
use std::{
    path::{Component, Path, PathBuf},
    time::{SystemTime, UNIX_EPOCH},
};
use walkdir::WalkDir;

/// Directory names never descended into.
const PRUNED_DIRS: &[&str] = &[".git"];

/// Extensions tracked when the caller does not name any.
const DEFAULT_EXTENSIONS: &[&str] = &["md"];

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecentFile {
    pub path: PathBuf,
    /// Seconds since the Unix epoch.
    pub mtime: f64,
}

/// Walk `directory` and return tracked files, newest first.
///
/// - `limit`: `None` keeps every file.
/// - `extensions`: `None` means `["md"]`; an empty list keeps every file.
/// - `ignored`: file names skipped by exact match (the todo store).
///
/// Files with identical modification times keep their walk order, which is
/// sorted by file name.
pub fn scan(
    directory: &Path,
    limit: Option<usize>,
    extensions: Option<&[String]>,
    ignored: &[&str],
) -> Result<Vec<RecentFile>> {
    let walker = WalkDir::new(directory)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            !(entry.file_type().is_dir()
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| PRUNED_DIRS.contains(&name)))
        });

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| {
            let path = err.path().unwrap_or(directory).to_path_buf();
            WikiError::Io(path, err.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }

        let name = entry.file_name().to_string_lossy();
        if ignored.contains(&name.as_ref()) || !is_tracked(&name, extensions) {
            continue;
        }

        let modified = entry
            .metadata()
            .map_err(|err| WikiError::Io(entry.path().to_path_buf(), err.into()))?
            .modified()
            .map_err(WikiError::io(entry.path()))?;

        files.push(RecentFile {
            path: entry.into_path(),
            mtime: epoch_seconds(modified),
        });
    }

    files.sort_by(|a, b| b.mtime.total_cmp(&a.mtime));
    if let Some(limit) = limit {
        files.truncate(limit);
    }
    Ok(files)
}

/// Whether the text after the last `.` of `name` is one of `extensions`.
fn is_tracked(name: &str, extensions: Option<&[String]>) -> bool {
    let suffix = match name.rsplit_once('.') {
        Some((_, suffix)) => suffix,
        None => "",
    };
    match extensions {
        None => DEFAULT_EXTENSIONS.contains(&suffix),
        Some([]) => true,
        Some(extensions) => extensions.iter().any(|ext| ext == suffix),
    }
}

fn epoch_seconds(time: SystemTime) -> f64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

#[derive(Debug)]
pub struct RecentFileManager {
    root: PathBuf,
    limit: usize,
    extensions: Vec<String>,
    ignored: Vec<String>,
    /// Newest first, no duplicate paths.
    entries: Vec<RecentFile>,
}

impl RecentFileManager {
    /// Scan `root` with the configured limit and extensions.
    ///
    /// `ignored` file names are left out of every scan.
    pub fn new(root: &Path, config: &RecentConfig, ignored: &[&str]) -> Result<Self> {
        let mut manager = Self {
            root: root.to_path_buf(),
            limit: config.limit,
            extensions: config.extensions.clone(),
            ignored: ignored.iter().map(|name| (*name).to_owned()).collect(),
            entries: Vec::new(),
        };
        manager.rescan(Some(config.limit), None)?;
        Ok(manager)
    }

    /// Replace every entry with a fresh scan of the root.
    ///
    /// `None` for `extensions` uses the configured ones.
    pub fn rescan(&mut self, limit: Option<usize>, extensions: Option<&[String]>) -> Result<()> {
        let extensions = extensions.unwrap_or(&self.extensions);
        let ignored: Vec<&str> = self.ignored.iter().map(String::as_str).collect();
        self.entries = scan(&self.root, limit, Some(extensions), &ignored)?;
        Ok(())
    }

    /// Move `path` to the front, stamped with the current time.
    pub fn update(&mut self, path: impl AsRef<Path>) {
        let path = self.rooted(path.as_ref());
        self.entries.retain(|entry| entry.path != path);
        self.entries.insert(
            0,
            RecentFile {
                path,
                mtime: epoch_seconds(SystemTime::now()),
            },
        );
    }

    /// Up to `limit` entries, newest first. `None` uses the configured limit.
    pub fn get(&self, limit: Option<usize>) -> Result<&[RecentFile]> {
        let limit = match limit {
            Some(0) => return Err(WikiError::ZeroLimit),
            Some(limit) => limit,
            None => self.limit,
        };
        Ok(&self.entries[..limit.min(self.entries.len())])
    }

    pub fn all(&self) -> &[RecentFile] {
        &self.entries
    }

    /// Remove `path`; absent paths are ignored.
    pub fn delete(&mut self, path: impl AsRef<Path>) {
        let path = self.rooted(path.as_ref());
        self.entries.retain(|entry| entry.path != path);
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub const fn default_limit(&self) -> usize {
        self.limit
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[allow(dead_code)] // Reserved API
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `path` under the root, unless it already is.
    fn rooted(&self, path: &Path) -> PathBuf {
        if path.starts_with(&self.root) {
            return path.to_path_buf();
        }
        let relative: PathBuf = path
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .collect();
        self.root.join(relative)
    }
}
