//! Daily journal pages collecting finished to-dos.
//!
//! A done record deleted on 2024-03-09 ends up in `journal/2024/03/09.md`:
//!
//! ```markdown
//! # Journal 2024/03/09
//!
//! ## Done
//!
//! * 3: water the plants
//! ```

use super::{
    error::Result,
    markdown::Renderer,
    page::Page,
    todo::{self, Record},
};
use crate::utils::git::VersionControl;
use chrono::NaiveDate;
use regex::Regex;
use std::{path::Path, sync::LazyLock};

/// A `Done` heading of any level, anywhere in the page.
static DONE_HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^#+ *Done *$").expect("done heading pattern is valid"));

/// Logical page path of the journal for `date`.
pub fn page_path(date: NaiveDate) -> String {
    date.format("journal/%Y/%m/%d").to_string()
}

/// Append `record` to the journal page of `date` and save it.
pub fn archive(
    record: &Record,
    date: NaiveDate,
    root: &Path,
    renderer: &Renderer,
    vcs: &dyn VersionControl,
) -> Result<Page> {
    let mut page = Page::open(page_path(date), root, 0)?;
    let entry = entry_line(record);

    let markdown = if page.exists() {
        let mut markdown = page.markdown().to_owned();
        if !DONE_HEADING.is_match(&markdown) {
            markdown.push_str("\n\n## Done\n\n");
        }
        markdown.push_str(&entry);
        markdown
    } else {
        format!(
            "# Journal {}\n\n## Done\n\n{entry}",
            date.format("%Y/%m/%d")
        )
    };

    page.set_markdown(markdown);
    page.save(renderer, vcs)?;
    Ok(page)
}

/// `* <id>: <text>`
fn entry_line(record: &Record) -> String {
    let id = todo::record_id(record).map(|id| id.to_string()).unwrap_or_default();
    let text = todo::record_text(record).unwrap_or_default();
    format!("* {id}: {text}\n")
}
