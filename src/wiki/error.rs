//! Error types for the page model, recency index and todo store.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T, E = WikiError> = std::result::Result<T, E>;

/// Errors surfaced by wiki operations.
///
/// Nothing in the core logs these; the serving layer decides how each one
/// becomes a response.
#[derive(Debug, Error)]
pub enum WikiError {
    #[error("page `{0}` does not exist")]
    PageNotFound(PathBuf),

    #[error("todo {0} does not exist")]
    TodoNotFound(u64),

    #[error("bad input: {0}")]
    BadInput(String),

    #[error("no free todo id below {0}")]
    IdSpaceExhausted(u64),

    #[error("requesting zero recent files makes no sense, use `all()` instead")]
    ZeroLimit,

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("malformed JSON in `{0}`")]
    Json(PathBuf, #[source] serde_json::Error),

    /// Valid JSON that breaks the todo store's id rules.
    #[error("corrupt todo store `{0}`: {1}")]
    CorruptTodos(PathBuf, String),

    #[error(transparent)]
    Vcs(#[from] anyhow::Error),
}

impl WikiError {
    /// Wrap an IO error with the path it happened on.
    pub fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |err| Self::Io(path, err)
    }
}
