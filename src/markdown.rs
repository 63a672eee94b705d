//! Markdown parsing and rendering.
//!
//! This is the boundary between catmd and the markdown engine. Parsing is done
//! by `pulldown-cmark`; rendering back to CommonMark by `pulldown-cmark-to-cmark`.
//! Nothing else in the crate touches markdown syntax directly: every
//! transformation works on the parsed event stream, never on raw text.
//!
//! ## The Tree
//!
//! A parsed document is kept as its complete, owned event stream. `Start` and
//! `End` events delimit subtrees, so the stream is a pre-order serialization of
//! the document tree:
//!
//! ```text
//! # A            Start(Heading H1) Text("A") End(Heading H1)
//! See [B](b.md)  Start(Paragraph) Text("See ") Start(Link b.md) Text("B")
//!                End(Link) End(Paragraph)
//! ```
//!
//! Events are converted to `'static` on parse, so a [`Document`] owns its tree
//! outright and any slice of it can be cloned into an independent copy.
//!
//! ## Extracted Metadata
//!
//! Alongside the tree, parsing extracts what the pipeline needs to reason
//! about a document without walking events again:
//!
//! - [`Header`]s with level, text, and a generated anchor id
//! - [`Link`]s in document order, including footnote references
//! - [`FootnoteDefinition`]s with their content as portable inline events
//!
//! ## Anchor Ids
//!
//! Header ids follow the GitHub convention: lowercase alphanumerics, spaces
//! become `-`, `-` and `_` are kept, everything else is dropped. An explicit
//! `{#id}` attribute wins. Repeated ids within one document get `-1`, `-2`, ...
//! suffixes in document order.

use pulldown_cmark::{CowStr, Event, HeadingLevel, LinkType, Options, Parser, Tag, TagEnd};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error(transparent)]
    Format(#[from] pulldown_cmark_to_cmark::Error),
}

/// Markdown extensions understood by the parser.
pub const PARSER_OPTIONS: Options = Options::empty()
    .union(Options::ENABLE_TABLES)
    .union(Options::ENABLE_FOOTNOTES)
    .union(Options::ENABLE_STRIKETHROUGH)
    .union(Options::ENABLE_TASKLISTS)
    .union(Options::ENABLE_HEADING_ATTRIBUTES);

/// A heading found in a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    /// Heading level, 1 through 6.
    pub level: u8,
    /// Plain text content, trimmed.
    pub text: String,
    /// Anchor identifier (explicit attribute or generated from `text`).
    pub id: String,
}

/// A link found in a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Destination as written. For footnote references this is the footnote id.
    pub destination: String,
    /// Display text.
    pub text: String,
    /// True for `[^id]` footnote references.
    pub is_footnote: bool,
    /// True for `<scheme:...>` and `<user@host>` autolinks, which are never internal.
    pub is_autolink: bool,
}

/// A footnote definition with its content as inline events.
///
/// The content is owned and detached from the tree it came from: inserting a
/// clone anywhere produces an independent copy.
#[derive(Debug, Clone, PartialEq)]
pub struct FootnoteDefinition {
    pub id: String,
    pub content: Vec<Event<'static>>,
}

/// A parsed markdown document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Canonical absolute path identifying the document.
    pub path: PathBuf,
    /// Original source text.
    pub source: String,
    /// The document tree as an owned event stream. Transformations rewrite this.
    pub events: Vec<Event<'static>>,
    pub headers: Vec<Header>,
    pub links: Vec<Link>,
    pub footnotes: Vec<FootnoteDefinition>,
}

impl Document {
    /// Parse `source` and extract headers, links, and footnotes.
    pub fn parse(path: impl Into<PathBuf>, source: String) -> Self {
        let events = parse_events(&source);
        let headers = extract_headers(&events);
        let links = extract_links(&events);
        let footnotes = extract_footnotes(&events);
        Self {
            path: path.into(),
            source,
            events,
            headers,
            links,
            footnotes,
        }
    }

    /// Base name of the document, extension included (`guide.md`).
    pub fn file_name(&self) -> String {
        file_name(&self.path)
    }

    /// Render the current tree back to markdown.
    pub fn render(&self) -> Result<String, RenderError> {
        render(&self.events)
    }
}

/// Base name of a path, extension included, or the whole path if it has none.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// Parse markdown into an owned event stream.
pub fn parse_events(source: &str) -> Vec<Event<'static>> {
    Parser::new_ext(source, PARSER_OPTIONS)
        .map(Event::into_static)
        .collect()
}

/// Render an event stream back to CommonMark.
pub fn render(events: &[Event<'static>]) -> Result<String, RenderError> {
    let mut out = String::new();
    pulldown_cmark_to_cmark::cmark(events.iter(), &mut out)?;
    Ok(out)
}

/// Generate a GitHub-style anchor id from heading text.
pub fn heading_id(text: &str) -> String {
    let mut id = String::with_capacity(text.len());
    for c in text.trim().chars() {
        match c {
            ' ' => id.push('-'),
            '-' | '_' => id.push(c),
            c if c.is_alphanumeric() => id.extend(c.to_lowercase()),
            _ => {}
        }
    }
    id
}

/// Numeric value of a heading level.
pub fn level_number(level: HeadingLevel) -> u8 {
    level as u8
}

/// The next level down, saturating at `H6`.
pub fn demoted(level: HeadingLevel) -> HeadingLevel {
    use HeadingLevel::*;
    match level {
        H1 => H2,
        H2 => H3,
        H3 => H4,
        H4 => H5,
        H5 | H6 => H6,
    }
}

/// Events for a plain-text heading: `Start`, `Text`, `End`.
pub fn heading_events(level: HeadingLevel, text: &str) -> [Event<'static>; 3] {
    [
        Event::Start(Tag::Heading {
            level,
            id: None,
            classes: Vec::new(),
            attrs: Vec::new(),
        }),
        Event::Text(CowStr::from(text.to_string())),
        Event::End(TagEnd::Heading(level)),
    ]
}

fn extract_headers(events: &[Event<'static>]) -> Vec<Header> {
    let mut headers = Vec::new();
    let mut seen = HashSet::new();
    let mut iter = events.iter();

    while let Some(event) = iter.next() {
        let Event::Start(Tag::Heading { level, id, .. }) = event else {
            continue;
        };

        let mut text = String::new();
        for inner in iter.by_ref() {
            match inner {
                Event::End(TagEnd::Heading(_)) => break,
                Event::Text(t) | Event::Code(t) => text.push_str(t),
                Event::SoftBreak | Event::HardBreak => text.push(' '),
                _ => {}
            }
        }
        let text = text.trim().to_string();

        let id = match id {
            Some(explicit) => {
                seen.insert(explicit.to_string());
                explicit.to_string()
            }
            None => unique_id(heading_id(&text), &mut seen),
        };

        headers.push(Header {
            level: level_number(*level),
            text,
            id,
        });
    }

    headers
}

fn unique_id(base: String, seen: &mut HashSet<String>) -> String {
    let base = if base.is_empty() {
        "heading".to_string()
    } else {
        base
    };
    let mut candidate = base.clone();
    let mut suffix = 0;
    while seen.contains(&candidate) {
        suffix += 1;
        candidate = format!("{base}-{suffix}");
    }
    seen.insert(candidate.clone());
    candidate
}

fn extract_links(events: &[Event<'static>]) -> Vec<Link> {
    let mut links: Vec<Link> = Vec::new();
    // Index of the link whose text is being collected
    let mut open: Option<usize> = None;

    for event in events {
        match event {
            Event::Start(Tag::Link {
                link_type,
                dest_url,
                ..
            }) => {
                links.push(Link {
                    destination: dest_url.to_string(),
                    text: String::new(),
                    is_footnote: false,
                    is_autolink: matches!(link_type, LinkType::Autolink | LinkType::Email),
                });
                open = Some(links.len() - 1);
            }
            Event::End(TagEnd::Link) => {
                if let Some(link) = open.take().and_then(|i| links.get_mut(i)) {
                    link.text = link.text.trim().to_string();
                }
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some(link) = open.and_then(|i| links.get_mut(i)) {
                    link.text.push_str(text);
                }
            }
            Event::FootnoteReference(id) => links.push(Link {
                destination: id.to_string(),
                text: id.to_string(),
                is_footnote: true,
                is_autolink: false,
            }),
            _ => {}
        }
    }

    links
}

fn extract_footnotes(events: &[Event<'static>]) -> Vec<FootnoteDefinition> {
    let mut footnotes = Vec::new();
    let mut iter = events.iter();

    while let Some(event) = iter.next() {
        let Event::Start(Tag::FootnoteDefinition(id)) = event else {
            continue;
        };
        let body = iter
            .by_ref()
            .take_while(|e| !matches!(e, Event::End(TagEnd::FootnoteDefinition)));
        footnotes.push(FootnoteDefinition {
            id: id.to_string(),
            content: inline_content(body),
        });
    }

    footnotes
}

/// Flatten block content into inline events.
///
/// Paragraph and other block wrappers are dropped and consecutive blocks are
/// joined by a single space. Code blocks become code spans, block HTML becomes
/// inline HTML. Inline structure (links, emphasis, code) is kept as events.
pub fn inline_content<'e>(body: impl IntoIterator<Item = &'e Event<'static>>) -> Vec<Event<'static>> {
    let mut out = Vec::new();
    let mut pending_space = false;
    let mut code_block: Option<String> = None;

    for event in body {
        if let Some(code) = code_block.as_mut()
            && let Event::Text(text) = event
        {
            code.push_str(text);
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(_)) => code_block = Some(String::new()),
            Event::End(TagEnd::CodeBlock) => {
                if let Some(code) = code_block.take() {
                    let code = code.trim_end().to_string();
                    push_inline(&mut out, &mut pending_space, Event::Code(code.into()));
                }
                pending_space = true;
            }
            Event::Start(tag) if is_inline_tag(tag) => {
                push_inline(&mut out, &mut pending_space, event.clone());
            }
            Event::End(end) if is_inline_end(end) => out.push(event.clone()),
            Event::Start(_) => {}
            Event::End(_) => pending_space = !out.is_empty(),
            Event::Text(_)
            | Event::Code(_)
            | Event::InlineMath(_)
            | Event::InlineHtml(_)
            | Event::FootnoteReference(_)
            | Event::SoftBreak => push_inline(&mut out, &mut pending_space, event.clone()),
            Event::HardBreak => push_inline(&mut out, &mut pending_space, Event::SoftBreak),
            Event::Html(html) => {
                let html = html.trim_end().to_string();
                push_inline(&mut out, &mut pending_space, Event::InlineHtml(html.into()));
            }
            Event::DisplayMath(math) => {
                push_inline(&mut out, &mut pending_space, Event::InlineMath(math.clone()));
            }
            // Rules and task markers have no inline form
            _ => {}
        }
    }

    trim_edges(&mut out);
    out
}

fn push_inline(out: &mut Vec<Event<'static>>, pending_space: &mut bool, event: Event<'static>) {
    if *pending_space && !out.is_empty() {
        out.push(Event::Text(" ".into()));
    }
    *pending_space = false;
    out.push(event);
}

fn trim_edges(events: &mut [Event<'static>]) {
    if let Some(Event::Text(text)) = events.first_mut() {
        *text = text.trim_start().to_string().into();
    }
    if let Some(Event::Text(text)) = events.last_mut() {
        *text = text.trim_end().to_string().into();
    }
}

fn is_inline_tag(tag: &Tag<'_>) -> bool {
    matches!(
        tag,
        Tag::Emphasis
            | Tag::Strong
            | Tag::Strikethrough
            | Tag::Link { .. }
            | Tag::Image { .. }
    )
}

fn is_inline_end(end: &TagEnd) -> bool {
    matches!(
        end,
        TagEnd::Emphasis
            | TagEnd::Strong
            | TagEnd::Strikethrough
            | TagEnd::Link
            | TagEnd::Image
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(source: &str) -> Document {
        Document::parse("/docs/test.md", source.to_string())
    }

    // =========================================================================
    // Headers
    // =========================================================================

    #[test]
    fn headers_in_document_order() {
        let doc = parse("# Title\n\n## Section\n\ntext\n\n### Deep\n");
        let levels: Vec<u8> = doc.headers.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(doc.headers[1].text, "Section");
    }

    #[test]
    fn header_ids_generated_from_text() {
        let doc = parse("# Hello, World!\n\n## Running `catmd` in CI\n");
        assert_eq!(doc.headers[0].id, "hello-world");
        assert_eq!(doc.headers[1].id, "running-catmd-in-ci");
    }

    #[test]
    fn explicit_header_id_wins() {
        let doc = parse("# Title {#custom}\n");
        assert_eq!(doc.headers[0].id, "custom");
        assert_eq!(doc.headers[0].text, "Title");
    }

    #[test]
    fn duplicate_header_ids_get_suffixes() {
        let doc = parse("## Usage\n\n## Usage\n\n## Usage\n");
        let ids: Vec<&str> = doc.headers.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(ids, vec!["usage", "usage-1", "usage-2"]);
    }

    #[test]
    fn setext_headers_are_headers() {
        let doc = parse("Title\n=====\n\nSub\n---\n");
        let levels: Vec<u8> = doc.headers.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 2]);
    }

    #[test]
    fn heading_id_conventions() {
        assert_eq!(heading_id("Getting Started"), "getting-started");
        assert_eq!(heading_id("with_underscores-and-dashes"), "with_underscores-and-dashes");
        assert_eq!(heading_id("3. Applications"), "3-applications");
        assert_eq!(heading_id("  padded  "), "padded");
        assert_eq!(heading_id("!!!"), "");
    }

    #[test]
    fn demotion_saturates_at_h6() {
        assert_eq!(demoted(HeadingLevel::H1), HeadingLevel::H2);
        assert_eq!(demoted(HeadingLevel::H5), HeadingLevel::H6);
        assert_eq!(demoted(HeadingLevel::H6), HeadingLevel::H6);
    }

    // =========================================================================
    // Links
    // =========================================================================

    #[test]
    fn links_in_document_order() {
        let doc = parse("See [B](b.md) and [site](https://example.com).\n");
        let dests: Vec<&str> = doc.links.iter().map(|l| l.destination.as_str()).collect();
        assert_eq!(dests, vec!["b.md", "https://example.com"]);
        assert_eq!(doc.links[0].text, "B");
        assert!(!doc.links[0].is_footnote);
    }

    #[test]
    fn footnote_references_are_links() {
        let doc = parse("Text[^note].\n\n[^note]: Content.\n");
        let footnote = doc.links.iter().find(|l| l.is_footnote).unwrap();
        assert_eq!(footnote.destination, "note");
    }

    #[test]
    fn autolinks_are_flagged() {
        let doc = parse("Mail <me@example.com> or visit <https://example.com>.\n");
        assert_eq!(doc.links.len(), 2);
        assert!(doc.links.iter().all(|l| l.is_autolink));
    }

    #[test]
    fn reference_links_resolve_destination() {
        let doc = parse("See [the guide][g].\n\n[g]: guide.md\n");
        assert_eq!(doc.links[0].destination, "guide.md");
        assert_eq!(doc.links[0].text, "the guide");
    }

    // =========================================================================
    // Footnotes
    // =========================================================================

    #[test]
    fn footnote_content_is_inline() {
        let doc = parse("Text[^1].\n\n[^1]: See more.\n");
        assert_eq!(doc.footnotes.len(), 1);
        assert_eq!(doc.footnotes[0].id, "1");
        assert_eq!(doc.footnotes[0].content, vec![Event::Text("See more.".into())]);
    }

    #[test]
    fn footnote_content_keeps_links() {
        let doc = parse("Text[^1].\n\n[^1]: See [B](b.md) for *more*.\n");
        let content = &doc.footnotes[0].content;
        assert!(content.iter().any(|e| matches!(
            e,
            Event::Start(Tag::Link { dest_url, .. }) if dest_url.as_ref() == "b.md"
        )));
        assert!(content.iter().any(|e| matches!(e, Event::Start(Tag::Emphasis))));
        assert!(!content.iter().any(|e| matches!(e, Event::Start(Tag::Paragraph))));
    }

    #[test]
    fn multi_paragraph_footnote_joined_by_space() {
        let events = parse_events("First.\n\nSecond.\n");
        let content = inline_content(&events);
        let rendered = render(&content).unwrap();
        assert_eq!(rendered, "First. Second.");
    }

    #[test]
    fn code_block_becomes_code_span() {
        let events = parse_events("```\nlet x = 1;\n```\n");
        let content = inline_content(&events);
        assert_eq!(content, vec![Event::Code("let x = 1;".into())]);
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    #[test]
    fn render_reproduces_common_syntax() {
        let doc = parse("# Title\n\nSome *emphasis* and [a link](x.md).\n");
        let rendered = doc.render().unwrap();
        assert!(rendered.starts_with("# Title"));
        assert!(rendered.contains("*emphasis*"));
        assert!(rendered.contains("[a link](x.md)"));
    }

    #[test]
    fn heading_events_render_as_atx() {
        let rendered = render(&heading_events(HeadingLevel::H1, "guide.md")).unwrap();
        assert_eq!(rendered, "# guide.md");
    }

    #[test]
    fn render_error_keeps_renderer_message() {
        let err = RenderError::from(pulldown_cmark_to_cmark::Error::UnexpectedEvent);
        assert_eq!(
            err.to_string(),
            pulldown_cmark_to_cmark::Error::UnexpectedEvent.to_string()
        );
    }

    #[test]
    fn file_name_includes_extension() {
        let doc = parse("");
        assert_eq!(doc.file_name(), "test.md");
    }
}
