//! Errors raised while locating and reading the wiki configuration.

use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot create content root `{0}`")]
    ContentRoot(PathBuf, #[source] io::Error),

    #[error("cannot read wiki config `{0}`")]
    Read(PathBuf, #[source] io::Error),

    #[error("malformed wiki config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value serde accepted but the wiki cannot run with.
    #[error("`[{section}] {field}` {reason}")]
    Invalid {
        section: &'static str,
        field: &'static str,
        reason: &'static str,
    },
}

impl ConfigError {
    pub const fn invalid(section: &'static str, field: &'static str, reason: &'static str) -> Self {
        Self::Invalid {
            section,
            field,
            reason,
        }
    }
}
