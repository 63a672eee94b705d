//! Anchor resolution and link rewriting.
//!
//! Once documents are concatenated, a link to `b.md` must become a link to
//! the place in the combined output where `b.md` begins. That place is the
//! level-1 header the document opens with after header normalization:
//!
//! | Target's header action | Anchor |
//! |------------------------|--------|
//! | keep as-is             | `#` + id of its own leading header |
//! | synthesized            | `#` + file name (`#b.md`) |
//!
//! A fragment on the original link is re-attached after the anchor as
//! written: `b.md#usage` becomes `#b.md#usage`.
//!
//! Links to documents that were not traversed keep their destination
//! byte-for-byte.

use crate::headers::HeaderAction;
use crate::links::{self, LinkClass, ScopeBoundary};
use crate::markdown::Document;
use crate::traversal::Entry;
use pulldown_cmark::{CowStr, Event, LinkType, Tag};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Anchor of every traversed document, keyed by canonical path.
#[derive(Debug, Clone, Default)]
pub struct AnchorIndex {
    anchors: HashMap<PathBuf, String>,
}

impl AnchorIndex {
    /// Build from traversal entries. Uses each entry's header decision, which
    /// is the final outcome regardless of whether it has been applied yet.
    pub fn build(entries: &[Entry]) -> Self {
        let anchors = entries
            .iter()
            .map(|entry| {
                (
                    entry.document.path.clone(),
                    target_anchor(&entry.document, entry.action),
                )
            })
            .collect();
        Self { anchors }
    }

    pub fn get(&self, path: &Path) -> Option<&str> {
        self.anchors.get(path).map(String::as_str)
    }
}

/// The anchor a document is reached by in the combined output.
///
/// `document` must still carry its original headers.
pub fn target_anchor(document: &Document, action: HeaderAction) -> String {
    match (action, document.headers.first()) {
        (HeaderAction::KeepAsIs, Some(header)) => format!("#{}", header.id),
        _ => format!("#{}", document.file_name()),
    }
}

/// Point every internal link to a traversed document at its anchor.
///
/// Returns the number of links rewritten. Rewritten links become inline
/// links, so reference-style definitions are no longer needed for them.
pub fn rewrite_links(document: &mut Document, scope: &ScopeBoundary, index: &AnchorIndex) -> usize {
    let mut rewritten = 0;
    for event in &mut document.events {
        let Event::Start(Tag::Link {
            link_type, dest_url, ..
        }) = event
        else {
            continue;
        };
        if matches!(link_type, LinkType::Autolink | LinkType::Email) {
            continue;
        }
        let Some(destination) = resolve(dest_url, &document.path, scope, index) else {
            continue;
        };
        *dest_url = CowStr::from(destination);
        *link_type = LinkType::Inline;
        rewritten += 1;
    }
    rewritten
}

/// The rewritten destination, or `None` if the link should stay as written.
fn resolve(destination: &str, current: &Path, scope: &ScopeBoundary, index: &AnchorIndex) -> Option<String> {
    let LinkClass::Internal(target) = links::classify(destination, current, scope).ok()? else {
        return None;
    };
    let anchor = index.get(&target.path)?;
    Some(match target.fragment {
        Some(fragment) => format!("{anchor}{fragment}"),
        None => anchor.to_string(),
    })
}
