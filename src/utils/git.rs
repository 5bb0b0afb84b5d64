//! Version control for content changes.
//!
//! Every write to the content root goes through a [`VersionControl`]:
//! stage the touched paths, then commit if anything is actually staged.
//! The repository is opened with `gix`; staging and committing run the
//! `git` binary so hooks, config and signing behave as on the command line.

use crate::{exec, exec_status, log, utils::command};
use anyhow::{Result, anyhow, bail};
use gix::ThreadSafeRepository;
use std::path::{Path, PathBuf};

/// Stage-and-commit capability handed to the wiki.
pub trait VersionControl {
    /// Stage `paths`, including deletions.
    fn stage(&self, paths: &[&Path]) -> Result<()>;

    /// Whether the index differs from `HEAD`.
    fn has_staged_changes(&self) -> Result<bool>;

    fn commit(&self, message: &str) -> Result<()>;

    fn is_enabled(&self) -> bool {
        true
    }
}

/// Accepts everything and records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoVersionControl;

impl VersionControl for NoVersionControl {
    fn stage(&self, _paths: &[&Path]) -> Result<()> {
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        Ok(false)
    }

    fn commit(&self, _message: &str) -> Result<()> {
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        false
    }
}

/// A git repository whose work tree is the content root.
pub struct GitRepository {
    repo: ThreadSafeRepository,
    root: PathBuf,
}

impl GitRepository {
    /// Open the repository at `root` (its `.git` directory).
    pub fn open(root: &Path) -> Result<Self> {
        let repo = gix::open(root)?;
        let root = repo
            .path()
            .parent()
            .ok_or_else(|| anyhow!("Invalid repository path"))?
            .to_path_buf();
        Ok(Self {
            repo: repo.into_sync(),
            root,
        })
    }

    /// `HEAD` commit id, `None` before the first commit.
    pub fn head_id(&self) -> Option<gix::ObjectId> {
        self.repo.to_thread_local().head_id().ok().map(|id| id.detach())
    }
}

impl VersionControl for GitRepository {
    fn stage(&self, paths: &[&Path]) -> Result<()> {
        if paths.is_empty() {
            return Ok(());
        }
        let args: Vec<_> = paths.iter().map(command::to_os).collect();
        command::exec(
            Some(self.root.as_path()),
            &command::to_cmd_vec(["git", "add", "-A", "--"]),
            &command::filter_args(&args),
        )?;
        Ok(())
    }

    fn has_staged_changes(&self) -> Result<bool> {
        let status = exec_status!(self.root.as_path(); ["git"]; "diff", "--cached", "--quiet")?;
        match status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => bail!("`git diff --cached` failed with {status}"),
        }
    }

    fn commit(&self, message: &str) -> Result<()> {
        if message.trim().is_empty() {
            bail!("Commit message cannot be empty");
        }
        exec!(self.root.as_path(); ["git"]; "commit", "--quiet", "-m", message)?;
        if let Some(id) = self.head_id() {
            log!("git"; "commit {} {message}", id.to_hex_with_len(7));
        }
        Ok(())
    }
}

/// Git when `enabled` and `root` has a `.git` directory, otherwise a no-op.
pub fn detect(root: &Path, enabled: bool) -> Result<Box<dyn VersionControl + Send + Sync>> {
    if enabled && root.join(".git").exists() {
        Ok(Box::new(GitRepository::open(root)?))
    } else {
        Ok(Box::new(NoVersionControl))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    /// Run `f` in a fresh repository, skipping when `git` is unavailable.
    fn with_temp_repo<F>(f: F)
    where
        F: FnOnce(&Path, &GitRepository),
    {
        if exec!(["git"]; "--version").is_err() {
            return;
        }
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        exec!(dir; ["git"]; "init", "--quiet").unwrap();
        exec!(dir; ["git"]; "config", "user.name", "wiki").unwrap();
        exec!(dir; ["git"]; "config", "user.email", "wiki@localhost").unwrap();
        exec!(dir; ["git"]; "config", "commit.gpgsign", "false").unwrap();

        let repo = GitRepository::open(dir).expect("Failed to open repo");
        f(dir, &repo);
    }

    fn head_summary(repo: &GitRepository) -> String {
        let repo_local = repo.repo.to_thread_local();
        let mut head = repo_local.head().unwrap();
        let commit = head.peel_to_commit_in_place().unwrap();
        commit.message().unwrap().summary().to_string()
    }

    #[test]
    fn test_stage_and_commit() {
        with_temp_repo(|dir, repo| {
            let file_path = dir.join("index.md");
            fs::write(&file_path, "# Index\n").unwrap();

            assert!(!repo.has_staged_changes().unwrap());
            repo.stage(&[file_path.as_path()]).unwrap();
            assert!(repo.has_staged_changes().unwrap());

            repo.commit("Change Index").unwrap();
            assert!(!repo.has_staged_changes().unwrap());
            assert_eq!(head_summary(repo), "Change Index");
        });
    }

    #[test]
    fn test_stage_deletion() {
        with_temp_repo(|dir, repo| {
            let file_path = dir.join("gone.md");
            fs::write(&file_path, "x").unwrap();
            repo.stage(&[file_path.as_path()]).unwrap();
            repo.commit("Add gone.md").unwrap();

            fs::remove_file(&file_path).unwrap();
            repo.stage(&[file_path.as_path()]).unwrap();
            assert!(repo.has_staged_changes().unwrap());
            repo.commit("Delete gone.md").unwrap();
            assert_eq!(head_summary(repo), "Delete gone.md");
        });
    }

    #[test]
    fn test_commit_empty_message() {
        with_temp_repo(|_dir, repo| {
            let result = repo.commit("   ");
            assert_eq!(result.unwrap_err().to_string(), "Commit message cannot be empty");
        });
    }

    #[test]
    fn test_detect() {
        let plain = TempDir::new().unwrap();
        assert!(!detect(plain.path(), true).unwrap().is_enabled());

        with_temp_repo(|dir, _repo| {
            assert!(detect(dir, true).unwrap().is_enabled());
            assert!(!detect(dir, false).unwrap().is_enabled());
        });
    }

    #[test]
    fn test_no_version_control() {
        let vcs = NoVersionControl;
        vcs.stage(&[Path::new("a.md")]).unwrap();
        assert!(!vcs.has_staged_changes().unwrap());
        vcs.commit("anything").unwrap();
    }
}
