//! External command execution utilities.
//!
//! Used to drive the `git` binary for staging and committing.

use crate::log;
use anyhow::{Context, Result};
use std::{
    ffi::OsString,
    path::Path,
    process::{Command, ExitStatus, Output},
};

// ============================================================================
// Macros
// ============================================================================

/// Run an external command with arguments, failing on a non-zero exit.
///
/// # Examples
/// ```ignore
/// // Without working directory
/// exec!(["git"]; "--version")?;
///
/// // With working directory
/// exec!(root; ["git"]; "add", "-A", "--", path)?;
/// ```
#[macro_export]
macro_rules! exec {
    ($cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            None,
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec(
            Some($root),
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
}

/// Run an external command and return its exit status, whatever it is.
///
/// For commands that answer through their status, like `git diff --quiet`.
#[macro_export]
macro_rules! exec_status {
    ($root:expr; $cmd:expr; $($arg:expr),* $(,)?) => {{
        $crate::utils::command::exec_status(
            Some($root),
            &$crate::utils::command::to_cmd_vec($cmd),
            &$crate::utils::command::filter_args(&[$($crate::utils::command::to_os($arg)),*]),
        )
    }};
}

// ============================================================================
// Argument Conversion
// ============================================================================

/// Convert to OsString.
#[inline]
pub fn to_os<S: Into<OsString>>(s: S) -> OsString {
    s.into()
}

/// Trait for converting to command vector.
pub trait ToCmd {
    fn to_cmd(self) -> Vec<OsString>;
}

impl<const N: usize> ToCmd for [&str; N] {
    #[inline]
    fn to_cmd(self) -> Vec<OsString> {
        self.into_iter().map(OsString::from).collect()
    }
}

/// Convert command to Vec<OsString>.
#[inline]
pub fn to_cmd_vec<C: ToCmd>(cmd: C) -> Vec<OsString> {
    cmd.to_cmd()
}

/// Filter out empty args.
#[inline]
pub fn filter_args(args: &[OsString]) -> Vec<OsString> {
    args.iter().filter(|a| !a.is_empty()).cloned().collect()
}

// ============================================================================
// Command Execution
// ============================================================================

/// Execute a command and capture its output.
///
/// # Errors
/// Returns error if command fails to execute or returns non-zero exit code.
pub fn exec(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<Output> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;

    log_output(&name, &output)?;
    Ok(output)
}

/// Execute a command with its output discarded and return the exit status.
///
/// # Errors
/// Returns error only if the command cannot be started.
pub fn exec_status(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<ExitStatus> {
    let (name, mut command) = prepare(root, cmd, args)?;

    let output = command
        .output()
        .with_context(|| format!("Failed to execute `{name}`"))?;
    Ok(output.status)
}

/// Prepare a Command from components.
fn prepare(root: Option<&Path>, cmd: &[OsString], args: &[OsString]) -> Result<(String, Command)> {
    let name = cmd
        .first()
        .and_then(|s| s.to_str())
        .context("Empty command")?
        .to_owned();

    let mut command = Command::new(&cmd[0]);
    command.args(&cmd[1..]).args(args);

    if let Some(dir) = root {
        command.current_dir(dir);
    }

    Ok((name, command))
}

// ============================================================================
// Output Filtering
// ============================================================================

/// Lines starting with one of `starts_with` and containing all of `contains`.
struct FilterRule {
    starts_with: &'static [&'static str],
    contains: &'static [&'static str],
}

impl FilterRule {
    const fn new(starts_with: &'static [&'static str], contains: &'static [&'static str]) -> Self {
        Self { starts_with, contains }
    }

    fn matches(&self, line: &str) -> bool {
        let lower = line.trim().to_ascii_lowercase();
        let has_prefix = self.starts_with.is_empty()
            || self.starts_with.iter().any(|p| lower.starts_with(p));
        let has_keywords = self.contains.iter().all(|kw| lower.contains(kw));
        has_prefix && has_keywords
    }
}

// Git noise example:
//   hint: Using 'master' as the name for the initial branch.
//   warning: in the working copy of 'a.md', LF will be replaced by CRLF
const NOISE: &[FilterRule] = &[
    FilterRule::new(&["hint:"], &[]),
    FilterRule::new(&["warning:"], &["will be replaced by"]),
];

fn is_noise(line: &str) -> bool {
    line.trim().is_empty() || NOISE.iter().any(|rule| rule.matches(line))
}

/// First meaningful stderr line onwards.
fn extract_error(stderr: &str) -> &str {
    stderr
        .lines()
        .find(|line| !is_noise(line))
        .map(|first| {
            let offset = first.as_ptr() as usize - stderr.as_ptr() as usize;
            &stderr[offset..]
        })
        .unwrap_or(stderr)
        .trim()
}

/// Log command output, filtering known noise.
fn log_output(name: &str, output: &Output) -> Result<()> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);

    if !output.status.success() {
        let error_msg = extract_error(stderr.trim());
        if error_msg.is_empty() {
            anyhow::bail!("Command `{name}` failed with {}", output.status);
        }
        anyhow::bail!("Command `{name}` failed with {}: {error_msg}", output.status);
    }

    for line in stdout.lines().chain(stderr.lines()) {
        if !is_noise(line) {
            log!(name; "{}", line.trim_end());
        }
    }

    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
