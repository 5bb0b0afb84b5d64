//! selfwiki - a personal wiki and todo manager backed by markdown files.

mod cli;
mod config;
mod logger;
mod serve;
mod utils;
mod wiki;

use anyhow::{Result, bail};
use chrono::{DateTime, Local};
use clap::Parser;
use cli::{Cli, Commands};
use config::Config;
use serve::serve_wiki;
use std::time::{Duration, UNIX_EPOCH};
use wiki::{Wiki, recent};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::set_verbose(cli.debug);
    let config = Config::load(&cli)?;
    debug!("config"; "content root {}", config.root.display());

    match cli.command() {
        Commands::Serve { .. } => run_server(&config),
        Commands::Recent { limit, extensions } => print_recent(&config, limit, extensions),
    }
}

/// Open the wiki at the configured root and serve it.
fn run_server(config: &Config) -> Result<()> {
    let vcs = utils::git::detect(&config.root, config.git.enable)?;
    log!("wiki"; "content root {}", config.root.display());
    log!("git"; "{}", if vcs.is_enabled() { "committing changes" } else { "disabled" });

    let wiki = Wiki::new(config, vcs)?;
    if config.wiki.help_page && wiki.ensure_help_page()? {
        log!("wiki"; "created help page");
    }

    serve_wiki(&config.serve, &wiki)
}

/// Print recently modified files, newest first.
fn print_recent(config: &Config, limit: Option<usize>, extensions: Vec<String>) -> Result<()> {
    let limit = limit.unwrap_or(config.recent.limit);
    if limit == 0 {
        bail!("--limit must be greater than 0");
    }
    let extensions = if extensions.is_empty() {
        config.recent.extensions.clone()
    } else {
        extensions
    };

    let files = recent::scan(
        &config.root,
        Some(limit),
        Some(extensions.as_slice()),
        &[config.todo.file.as_str()],
    )?;
    for file in files {
        let modified: DateTime<Local> = (UNIX_EPOCH + Duration::from_secs_f64(file.mtime)).into();
        let relative = file.path.strip_prefix(&config.root).unwrap_or(&file.path);
        println!("{}  {}", modified.format("%Y-%m-%d %H:%M"), relative.display());
    }
    Ok(())
}
