//! `[wiki]`, `[recent]`, `[todo]` and `[git]` section configuration.
//!
//! Settings for what lives under the content root and how it is tracked.

use super::defaults;
use crate::wiki::markdown::Extension;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[wiki]` section in selfwiki.toml - page rendering.
///
/// # Example
/// ```toml
/// [wiki]
/// extensions = ["extra", "meta", "toc", "wikilinks"]
/// help_page = false
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct WikiConfig {
    /// Markdown extensions enabled for rendering.
    #[serde(default = "defaults::wiki::extensions")]
    #[educe(Default = defaults::wiki::extensions())]
    pub extensions: Vec<Extension>,

    /// Create the built-in `help` page on startup when it is missing.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub help_page: bool,
}

/// `[recent]` section - the recently modified files index.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct RecentConfig {
    /// Entries kept by the startup scan and returned by default.
    #[serde(default = "defaults::recent::limit")]
    #[educe(Default = defaults::recent::limit())]
    pub limit: usize,

    /// File extensions (without the dot) tracked by the index.
    /// An empty list tracks every file.
    #[serde(default = "defaults::recent::extensions")]
    #[educe(Default = defaults::recent::extensions())]
    pub extensions: Vec<String>,
}

/// `[todo]` section - the todo store.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct TodoConfig {
    /// File name of the JSON store, directly under the content root.
    #[serde(default = "defaults::todo::file")]
    #[educe(Default = defaults::todo::file())]
    pub file: String,

    /// Auto-assigned ids are taken from `[0, id_ceiling)`.
    #[serde(default = "defaults::todo::id_ceiling")]
    #[educe(Default = defaults::todo::id_ceiling())]
    pub id_ceiling: u64,
}

/// `[git]` section - commit-on-save.
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct GitConfig {
    /// Commit every write when the content root is a git repository.
    #[serde(default = "defaults::r#true")]
    #[educe(Default = true)]
    pub enable: bool,
}

#[cfg(test)]
mod tests {
    use super::super::Config;
    use crate::wiki::markdown::Extension;

    #[test]
    fn test_content_defaults() {
        let config: Config = toml::from_str("").unwrap();

        assert_eq!(config.wiki.extensions, Extension::ALL.to_vec());
        assert!(config.wiki.help_page);
        assert_eq!(config.recent.limit, 20);
        assert_eq!(config.recent.extensions, vec!["md".to_string()]);
        assert_eq!(config.todo.file, "todos.json");
        assert_eq!(config.todo.id_ceiling, 1024);
        assert!(config.git.enable);
    }

    #[test]
    fn test_content_overrides() {
        let config = r#"
            [wiki]
            extensions = ["meta", "wikilinks"]

            [recent]
            limit = 5
            extensions = []

            [todo]
            file = "tasks.json"
            id_ceiling = 16

            [git]
            enable = false
        "#;
        let config: Config = toml::from_str(config).unwrap();

        assert_eq!(
            config.wiki.extensions,
            vec![Extension::Meta, Extension::WikiLinks]
        );
        assert_eq!(config.recent.limit, 5);
        assert!(config.recent.extensions.is_empty());
        assert_eq!(config.todo.file, "tasks.json");
        assert_eq!(config.todo.id_ceiling, 16);
        assert!(!config.git.enable);
    }

    #[test]
    fn test_unknown_extension_rejected() {
        let config = r#"
            [wiki]
            extensions = ["mathjax"]
        "#;
        assert!(toml::from_str::<Config>(config).is_err());
    }
}
