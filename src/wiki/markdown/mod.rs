//! Markdown → HTML rendering with a configurable extension set.
//!
//! Built on `pulldown-cmark`; the extensions below are layered on top of its
//! event stream.
//!
//! | Extension    | Effect                                                |
//! |--------------|-------------------------------------------------------|
//! | `extra`      | tables, footnotes, strikethrough, task lists, `{#id}` |
//! | `admonition` | `!!! note "Title"` blocks                             |
//! | `codehilite` | code wrapped in `div.codehilite`, `language-*` class  |
//! | `meta`       | `Key: value` front-matter → metadata                  |
//! | `sane_lists` | CommonMark list semantics                             |
//! | `smarty`     | curly quotes, dashes, ellipses                        |
//! | `toc`        | heading ids, `[TOC]` placeholder                      |
//! | `wikilinks`  | `[[Page Name]]` → `/Page_Name/`                       |

mod admonition;
pub mod meta;
mod toc;

pub use meta::Metadata;

use admonition::Segment;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use toc::Toc;

/// `[[Label]]`: word characters, spaces and dashes.
static WIKILINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([\w -]+)\]\]").expect("wikilink pattern is valid"));

// ============================================================================
// Extensions
// ============================================================================

/// A markdown extension, named as in `[wiki].extensions`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extension {
    Extra,
    Admonition,
    #[serde(rename = "codehilite")]
    CodeHilite,
    Meta,
    SaneLists,
    Smarty,
    Toc,
    #[serde(rename = "wikilinks")]
    WikiLinks,
}

impl Extension {
    pub const ALL: [Self; 8] = [
        Self::Extra,
        Self::Admonition,
        Self::CodeHilite,
        Self::Meta,
        Self::SaneLists,
        Self::Smarty,
        Self::Toc,
        Self::WikiLinks,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Extra => "extra",
            Self::Admonition => "admonition",
            Self::CodeHilite => "codehilite",
            Self::Meta => "meta",
            Self::SaneLists => "sane_lists",
            Self::Smarty => "smarty",
            Self::Toc => "toc",
            Self::WikiLinks => "wikilinks",
        }
    }
}

// ============================================================================
// Renderer
// ============================================================================

/// Output of one render: HTML plus whatever front-matter was extracted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rendered {
    pub html: String,
    pub meta: Metadata,
}

/// Stateless markdown converter; rendering the same text twice yields the
/// same output.
#[derive(Debug, Clone)]
pub struct Renderer {
    extensions: Vec<Extension>,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(&Extension::ALL)
    }
}

impl Renderer {
    pub fn new(extensions: &[Extension]) -> Self {
        let mut unique = Vec::with_capacity(extensions.len());
        for &extension in extensions {
            if !unique.contains(&extension) {
                unique.push(extension);
            }
        }
        Self { extensions: unique }
    }

    pub fn extensions(&self) -> &[Extension] {
        &self.extensions
    }

    #[inline]
    fn enabled(&self, extension: Extension) -> bool {
        self.extensions.contains(&extension)
    }

    /// Front-matter of `text`, without rendering anything.
    ///
    /// Empty when the `meta` extension is off.
    pub fn metadata(&self, text: &str) -> Metadata {
        if self.enabled(Extension::Meta) {
            meta::split(text).0
        } else {
            Metadata::new()
        }
    }

    /// Convert `text` to HTML, extracting front-matter on the way.
    pub fn render(&self, text: &str) -> Rendered {
        let (meta, body) = if self.enabled(Extension::Meta) {
            meta::split(text)
        } else {
            (Metadata::new(), text)
        };

        let mut toc = Toc::default();
        let mut html = self.render_body(body, &mut toc);

        if self.enabled(Extension::Toc) && html.contains(toc::MARKER) {
            html = html.replace(toc::MARKER, toc.to_html().trim_end());
        }

        Rendered { html, meta }
    }

    /// Render markdown, expanding admonitions when enabled.
    fn render_body(&self, text: &str, toc: &mut Toc) -> String {
        if !self.enabled(Extension::Admonition) {
            return self.render_markdown(text, toc);
        }

        let mut html = String::new();
        for segment in admonition::split(text) {
            match segment {
                Segment::Markdown(markdown) => html.push_str(&self.render_markdown(&markdown, toc)),
                Segment::Admonition { kind, title, body } => {
                    html.push_str(&format!("<div class=\"admonition {}\">\n", escape_html(&kind)));
                    if let Some(title) = title {
                        html.push_str(&format!(
                            "<p class=\"admonition-title\">{}</p>\n",
                            escape_html(&title)
                        ));
                    }
                    html.push_str(&self.render_body(&body, toc));
                    html.push_str("</div>\n");
                }
            }
        }
        html
    }

    fn options(&self) -> Options {
        let mut options = Options::empty();
        if self.enabled(Extension::Extra) {
            options.insert(Options::ENABLE_TABLES);
            options.insert(Options::ENABLE_FOOTNOTES);
            options.insert(Options::ENABLE_STRIKETHROUGH);
            options.insert(Options::ENABLE_TASKLISTS);
            options.insert(Options::ENABLE_HEADING_ATTRIBUTES);
        }
        if self.enabled(Extension::Smarty) {
            options.insert(Options::ENABLE_SMART_PUNCTUATION);
        }
        options
    }

    /// Run one markdown run through pulldown-cmark and the event rewrites.
    fn render_markdown(&self, text: &str, toc: &mut Toc) -> String {
        let mut events = EventSink::new(self.enabled(Extension::WikiLinks));
        let codehilite = self.enabled(Extension::CodeHilite);
        let track_headings = self.enabled(Extension::Toc);
        let mut in_code = false;

        for event in Parser::new_ext(text, self.options()) {
            match event {
                Event::Text(text) if !in_code => events.text(&text),
                Event::Start(Tag::CodeBlock(kind)) => {
                    in_code = true;
                    if codehilite {
                        events.push(Event::Html(code_open_tag(&kind).into()));
                    } else {
                        events.push(Event::Start(Tag::CodeBlock(kind)));
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    in_code = false;
                    if codehilite {
                        events.push(Event::Html("</code></pre></div>\n".into()));
                    } else {
                        events.push(Event::End(TagEnd::CodeBlock));
                    }
                }
                Event::Start(Tag::Heading {
                    level,
                    id,
                    classes,
                    attrs,
                }) if track_headings => events.open_heading(level, id, classes, attrs),
                Event::End(TagEnd::Heading(_)) if track_headings => events.close_heading(toc),
                other => events.push(other),
            }
        }

        let mut html = String::new();
        pulldown_cmark::html::push_html(&mut html, events.finish().into_iter());
        html
    }
}

// ============================================================================
// Event Rewriting
// ============================================================================

/// A heading whose events are held back until its text (and so its id) is known.
struct PendingHeading<'a> {
    level: HeadingLevel,
    id: Option<CowStr<'a>>,
    classes: Vec<CowStr<'a>>,
    attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    text: String,
    events: Vec<Event<'a>>,
}

/// Collects rewritten events.
///
/// Adjacent text events are merged first: pulldown-cmark splits `[[Page]]`
/// into several text events since brackets are potential link syntax.
struct EventSink<'a> {
    out: Vec<Event<'a>>,
    text: String,
    heading: Option<PendingHeading<'a>>,
    wikilinks: bool,
}

impl<'a> EventSink<'a> {
    fn new(wikilinks: bool) -> Self {
        Self {
            out: Vec::new(),
            text: String::new(),
            heading: None,
            wikilinks,
        }
    }

    fn text(&mut self, text: &str) {
        self.text.push_str(text);
    }

    fn push(&mut self, event: Event<'a>) {
        self.flush_text();
        if let Some(heading) = self.heading.as_mut()
            && let Event::Code(code) = &event
        {
            heading.text.push_str(code);
        }
        self.emit(event);
    }

    fn emit(&mut self, event: Event<'a>) {
        match self.heading.as_mut() {
            Some(heading) => heading.events.push(event),
            None => self.out.push(event),
        }
    }

    fn flush_text(&mut self) {
        if self.text.is_empty() {
            return;
        }
        let text = std::mem::take(&mut self.text);
        if let Some(heading) = self.heading.as_mut() {
            heading.text.push_str(&text);
        }

        if !self.wikilinks {
            self.emit(Event::Text(text.into()));
            return;
        }

        let mut last = 0;
        let mut pieces = Vec::new();
        for caps in WIKILINK.captures_iter(&text) {
            let (Some(whole), Some(label)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                pieces.push(Event::Text(text[last..whole.start()].to_owned().into()));
            }
            pieces.push(Event::InlineHtml(wikilink_html(label.as_str()).into()));
            last = whole.end();
        }
        if last < text.len() {
            pieces.push(Event::Text(text[last..].to_owned().into()));
        }
        for piece in pieces {
            self.emit(piece);
        }
    }

    fn open_heading(
        &mut self,
        level: HeadingLevel,
        id: Option<CowStr<'a>>,
        classes: Vec<CowStr<'a>>,
        attrs: Vec<(CowStr<'a>, Option<CowStr<'a>>)>,
    ) {
        self.flush_text();
        self.heading = Some(PendingHeading {
            level,
            id,
            classes,
            attrs,
            text: String::new(),
            events: Vec::new(),
        });
    }

    fn close_heading(&mut self, toc: &mut Toc) {
        self.flush_text();
        let Some(heading) = self.heading.take() else {
            return;
        };
        let id = toc.add(heading.level as u8, &heading.text, heading.id.as_deref());

        self.out.push(Event::Start(Tag::Heading {
            level: heading.level,
            id: Some(id.into()),
            classes: heading.classes,
            attrs: heading.attrs,
        }));
        self.out.extend(heading.events);
        self.out.push(Event::End(TagEnd::Heading(heading.level)));
    }

    fn finish(mut self) -> Vec<Event<'a>> {
        self.flush_text();
        self.out
    }
}

fn code_open_tag(kind: &CodeBlockKind<'_>) -> String {
    let lang = match kind {
        CodeBlockKind::Fenced(info) => info.split_whitespace().next().unwrap_or(""),
        CodeBlockKind::Indented => "",
    };
    if lang.is_empty() {
        "<div class=\"codehilite\"><pre><code>".into()
    } else {
        format!(
            "<div class=\"codehilite\"><pre><code class=\"language-{}\">",
            escape_html(lang)
        )
    }
}

/// `[[Page Name]]` → `<a class="wikilink" href="/Page_Name/">Page Name</a>`
fn wikilink_html(label: &str) -> String {
    let label = label.trim();
    let target = label.replace(' ', "_");
    format!(
        "<a class=\"wikilink\" href=\"/{}/\">{}</a>",
        escape_href(&target),
        escape_html(label)
    )
}

/// Escape text for use in HTML content and quoted attribute values.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    // Writing into a `String` never fails
    pulldown_cmark_escape::escape_html(&mut escaped, text)
        .map(|()| escaped)
        .unwrap_or_default()
}

/// Escape a URL for an `href` attribute, percent-encoding unsafe bytes.
pub fn escape_href(url: &str) -> String {
    let mut escaped = String::with_capacity(url.len());
    pulldown_cmark_escape::escape_href(&mut escaped, url)
        .map(|()| escaped)
        .unwrap_or_default()
}

// ============================================================================
// Tests
// ============================================================================
