//! Command-line interface definitions.
//!
//! Defines all CLI arguments and subcommands using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// selfwiki: an opinionated wiki engine and task manager
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Content root holding pages, uploads and the todo store
    #[arg(short, long, env = "SELF_WIKI_CONTENT_ROOT", global = true)]
    pub root: Option<PathBuf>,

    /// Config file name, relative to the content root
    #[arg(short = 'C', long, default_value = "selfwiki.toml", global = true)]
    pub config: PathBuf,

    /// Turn on debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Serve the wiki (default when no subcommand is given)
    Serve {
        /// Address to bind on
        #[arg(short, long)]
        interface: Option<String>,

        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,

        /// Never commit changes, even if the content root is a git repository
        #[arg(long)]
        no_git: bool,
    },

    /// Print the most recently modified files under the content root
    Recent {
        /// Number of entries to print
        #[arg(short, long)]
        limit: Option<usize>,

        /// File extensions to include (repeatable), defaults to `[recent].extensions`
        #[arg(short, long = "ext")]
        extensions: Vec<String>,
    },
}

impl Default for Commands {
    fn default() -> Self {
        Self::Serve {
            interface: None,
            port: None,
            no_git: false,
        }
    }
}

impl Cli {
    /// The subcommand to run, `serve` when none was given.
    pub fn command(&self) -> Commands {
        self.command.clone().unwrap_or_default()
    }
}
