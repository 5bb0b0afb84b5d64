//! Wiki configuration management for `selfwiki.toml`.
//!
//! The config file lives in the content root and is optional; every field
//! has a default.
//!
//! # Sections
//!
//! | Section     | Purpose                                      |
//! |-------------|----------------------------------------------|
//! | `[wiki]`    | Markdown extensions, help page               |
//! | `[recent]`  | Recent files index (limit, extensions)       |
//! | `[todo]`    | Todo store file and id ceiling               |
//! | `[serve]`   | HTTP server (interface, port)                |
//! | `[git]`     | Commit-on-save                               |
//!
//! # Example
//!
//! ```toml
//! [recent]
//! limit = 20
//! extensions = ["md"]
//!
//! [todo]
//! id_ceiling = 1024
//!
//! [serve]
//! port = 4000
//! ```

mod content;
pub mod defaults;
mod error;
mod serve;

pub use content::{GitConfig, RecentConfig, TodoConfig, WikiConfig};
pub use error::ConfigError;
pub use serve::ServeConfig;

use crate::cli::{Cli, Commands};
use anyhow::{Result, bail};
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// Root Configuration
// ============================================================================

/// Root configuration structure representing selfwiki.toml
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Absolute content root (set after loading)
    #[serde(skip)]
    pub root: PathBuf,

    /// Absolute path to the config file (set after loading)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Page rendering settings
    #[serde(default)]
    pub wiki: WikiConfig,

    /// Recent files index settings
    #[serde(default)]
    pub recent: RecentConfig,

    /// Todo store settings
    #[serde(default)]
    pub todo: TodoConfig,

    /// HTTP server settings
    #[serde(default)]
    pub serve: ServeConfig,

    /// Version control settings
    #[serde(default)]
    pub git: GitConfig,
}

impl Config {
    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    /// Load configuration from file path
    pub fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Read(path.to_path_buf(), err))?;
        Self::from_str(&content)
    }

    /// Resolve the content root, read the optional config file inside it,
    /// and apply CLI overrides.
    ///
    /// The content root is created when it does not exist yet.
    pub fn load(cli: &Cli) -> Result<Self> {
        let root = Self::content_root(cli.root.as_deref());
        fs::create_dir_all(&root).map_err(|err| ConfigError::ContentRoot(root.clone(), err))?;
        let root = Self::normalize_path(&root);

        let config_path = root.join(&cli.config);
        let mut config = if config_path.is_file() {
            Self::from_path(&config_path)?
        } else {
            Self::default()
        };
        config.root = root;
        config.config_path = config_path;
        config.update_with_cli(cli);
        config.validate()?;

        Ok(config)
    }

    /// Absolute path of the todo store.
    pub fn todo_path(&self) -> PathBuf {
        self.root.join(&self.todo.file)
    }

    /// Expand `~` in the CLI/env root, falling back to the default root.
    fn content_root(cli_root: Option<&Path>) -> PathBuf {
        let raw = cli_root
            .map(|p| p.to_string_lossy().into_owned())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(defaults::content_root);
        PathBuf::from(shellexpand::tilde(&raw).into_owned())
    }

    /// Update configuration with CLI arguments
    pub fn update_with_cli(&mut self, cli: &Cli) {
        if let Commands::Serve {
            interface,
            port,
            no_git,
        } = cli.command()
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            if no_git {
                self.git.enable = false;
            }
        }
    }

    /// Update config option if CLI value is provided
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    /// Normalize a path to absolute, using canonicalize if the path exists
    fn normalize_path(path: &Path) -> PathBuf {
        path.canonicalize().unwrap_or_else(|_| {
            if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map(|cwd| cwd.join(path))
                    .unwrap_or_else(|_| path.to_path_buf())
            }
        })
    }

    /// Validate configuration values that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.recent.limit == 0 {
            bail!(ConfigError::invalid("recent", "limit", "must be greater than 0"));
        }

        if self.todo.id_ceiling == 0 {
            bail!(ConfigError::invalid("todo", "id_ceiling", "must be greater than 0"));
        }

        let file = &self.todo.file;
        if file.is_empty() || file.contains(['/', '\\']) || file == "." || file == ".." {
            bail!(ConfigError::invalid("todo", "file", "must be a plain file name"));
        }

        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
