//! HTML views for pages and the editor.

use crate::{
    utils::slug,
    wiki::{
        Page,
        markdown::{Renderer, escape_href, escape_html},
        path,
    },
};

const PAGE_TEMPLATE: &str = include_str!("../embed/serve/page.html");
const EDIT_TEMPLATE: &str = include_str!("../embed/serve/edit.html");
const STYLE: &str = include_str!("../embed/serve/wiki.css");
const SCRIPT: &str = include_str!("../embed/serve/wiki.js");

/// `notes/rust.md` → `/notes/rust`
pub fn page_url(page: &Page) -> String {
    slug::url_path(&path::strip_markdown_ext(page.relpath()))
}

/// `<li>` links to `pages`, one per line.
fn link_list(renderer: &Renderer, pages: &[Page]) -> String {
    pages
        .iter()
        .map(|page| {
            format!(
                "            <li><a href=\"{}\">{}</a></li>",
                escape_href(&page_url(page)),
                escape_html(&page.title(renderer))
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// A rendered page with its children and the recent pages.
#[allow(clippy::literal_string_with_formatting_args)]
pub fn page_view(renderer: &Renderer, page: &Page, content: &str, recent: &[Page]) -> String {
    PAGE_TEMPLATE
        .replace("{style}", STYLE)
        .replace("{script}", SCRIPT)
        .replace("{title}", &escape_html(&page.title(renderer)))
        .replace("{page_url}", &escape_href(&page_url(page)))
        .replace("{subpages}", &link_list(renderer, page.subpages()))
        .replace("{recent}", &link_list(renderer, recent))
        .replace("{content}", content)
}

/// The editor for `page`, pre-filled with its markdown.
#[allow(clippy::literal_string_with_formatting_args)]
pub fn edit_view(renderer: &Renderer, page: &Page, recent: &[Page]) -> String {
    EDIT_TEMPLATE
        .replace("{style}", STYLE)
        .replace("{script}", SCRIPT)
        .replace("{title}", &escape_html(&page.title(renderer)))
        .replace("{page_url}", &escape_href(&page_url(page)))
        .replace("{recent}", &link_list(renderer, recent))
        .replace("{markdown}", &escape_html(page.markdown()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_view() {
        let dir = TempDir::new().unwrap();
        let mut page = Page::open("notes/rust", dir.path(), 0).unwrap();
        page.set_markdown("# Rust <3");

        let html = page_view(&Renderer::default(), &page, "<h1>Rust &lt;3</h1>", &[]);
        assert!(html.contains("<title>Rust &lt;3</title>"));
        assert!(html.contains("data-page=\"/notes/rust\""));
        assert!(html.contains("<h1>Rust &lt;3</h1>"));
        assert!(!html.contains("{content}"));
    }

    #[test]
    fn test_edit_view_escapes_markdown() {
        let dir = TempDir::new().unwrap();
        let mut page = Page::open("index", dir.path(), 0).unwrap();
        page.set_markdown("</textarea><script>");

        let html = edit_view(&Renderer::default(), &page, &[page.clone()]);
        assert!(html.contains("&lt;/textarea&gt;&lt;script&gt;"));
        assert!(html.contains("<li><a href=\"/index\">"));
    }
}
