//! Footnote inlining.
//!
//! Footnotes do not survive concatenation well: ids collide across documents
//! and definitions pile up at arbitrary points in the output. Instead, each
//! reference is replaced by its content in parentheses and every definition
//! is removed:
//!
//! ```text
//! Text[^1].            →   Text (See more).
//!
//! [^1]: See more.
//! ```
//!
//! The inlined content is a copy of the definition's inline events, not
//! flattened text, so links and emphasis inside a footnote stay structured.
//! Link rewriting runs afterwards and sees links that came from footnotes like
//! any other. Each reference gets its own copy.
//!
//! References inside footnote content are expanded recursively. A reference
//! back to a footnote that is already being expanded is dropped.
//!
//! `[^label]` with no matching definition is not a footnote reference at all:
//! the parser reads it as literal text, and it is rendered escaped (`\[^label\]`).

use crate::config::FootnotesConfig;
use crate::markdown::Document;
use pulldown_cmark::{CowStr, Event, Tag, TagEnd};
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

/// Inline every footnote reference and remove every definition.
///
/// Returns the number of references replaced. A document without footnotes
/// is left unchanged, so applying this twice is the same as applying it once.
pub fn inline(document: &mut Document, config: &FootnotesConfig) -> usize {
    let definitions: HashMap<String, Vec<Event<'static>>> = document
        .footnotes
        .drain(..)
        .map(|footnote| (footnote.id, footnote.content))
        .collect();

    let events = std::mem::take(&mut document.events);
    let mut out = Vec::with_capacity(events.len());
    let mut definition_depth = 0usize;
    let mut inlined = 0;

    for event in events {
        match event {
            Event::Start(Tag::FootnoteDefinition(_)) => definition_depth += 1,
            Event::End(TagEnd::FootnoteDefinition) => {
                definition_depth = definition_depth.saturating_sub(1);
            }
            _ if definition_depth > 0 => {}
            Event::FootnoteReference(id) => {
                let mut expanding = Vec::new();
                if expand(&id, &definitions, config, &mut expanding, &mut out, &document.path) {
                    inlined += 1;
                }
            }
            other => out.push(other),
        }
    }

    document.events = out;
    document.links.retain(|link| !link.is_footnote);
    inlined
}

/// Append ` (content)` for footnote `id` to `out`. Returns false if nothing was inlined.
fn expand(
    id: &str,
    definitions: &HashMap<String, Vec<Event<'static>>>,
    config: &FootnotesConfig,
    expanding: &mut Vec<String>,
    out: &mut Vec<Event<'static>>,
    path: &Path,
) -> bool {
    // The parser only emits references whose label has a definition.
    let Some(content) = definitions.get(id) else {
        return false;
    };
    if expanding.iter().any(|open| open == id) {
        warn!(footnote = id, document = %path.display(), "dropping circular footnote reference");
        return false;
    }

    expanding.push(id.to_string());
    let mut body = Vec::with_capacity(content.len());
    for event in content {
        match event {
            Event::FootnoteReference(inner) => {
                expand(inner, definitions, config, expanding, &mut body, path);
            }
            other => body.push(other.clone()),
        }
    }
    expanding.pop();

    if config.trim_trailing_period {
        trim_trailing_period(&mut body);
    }
    if body.is_empty() {
        return false;
    }

    let opening = match out.last() {
        Some(Event::Text(text)) if text.ends_with(char::is_whitespace) => "(",
        _ => " (",
    };
    out.push(Event::Text(opening.into()));
    out.extend(body);
    out.push(Event::Text(")".into()));
    true
}

/// Drop a single sentence-ending `.` from the end of the content.
fn trim_trailing_period(body: &mut Vec<Event<'static>>) {
    let Some(Event::Text(text)) = body.last_mut() else {
        return;
    };
    if !text.ends_with('.') || text.ends_with("..") {
        return;
    }
    let trimmed = text[..text.len() - 1].trim_end().to_string();
    if trimmed.is_empty() {
        body.pop();
    } else {
        *text = CowStr::from(trimmed);
    }
}
