//! Depth-first document traversal.
//!
//! Starting from the root document, internal links are followed depth-first
//! in the order they appear. The result is a [`TraversalOrder`]: every
//! reachable document exactly once, in the order it will be emitted.
//!
//! ```text
//! a.md ──▶ b.md ──▶ d.md        order: a, b, d, c
//!   └────▶ c.md
//! ```
//!
//! The walk uses an explicit stack. A document's link targets are pushed in
//! reverse so the first link is popped first. A path is marked visited when it
//! is popped, so a document linked from several places appears at its first
//! depth-first position, and cycles terminate.
//!
//! Targets that do not exist, lie outside the scope, or have an extension
//! outside the configured list are never queued. Targets that exist but
//! cannot be read as UTF-8 text are recorded in [`TraversalOrder::skipped`]
//! and never retried.

use crate::files::FileSource;
use crate::headers::{self, HeaderAction};
use crate::links::{self, LinkClass, ScopeBoundary};
use crate::markdown::Document;
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum TraversalError {
    #[error("cannot read root document {path}: {reason}")]
    UnreadableRoot { path: PathBuf, reason: String },
}

/// A document that made it into the output, with its header decision.
#[derive(Debug, Clone)]
pub struct Entry {
    pub document: Document,
    /// Decided from the document's original headers, before any rewriting.
    pub action: HeaderAction,
}

/// A document that was linked but could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub path: PathBuf,
    pub reason: String,
}

/// Documents in emission order. The root is always first.
#[derive(Debug, Default)]
pub struct TraversalOrder {
    pub entries: Vec<Entry>,
    pub skipped: Vec<Skipped>,
}

impl TraversalOrder {
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.entries.iter().map(|entry| entry.document.path.as_path())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths().any(|p| p == path)
    }
}

/// Walk the link graph from `root`, a validated canonical path.
///
/// Fails only if the root itself cannot be loaded; every other problem is
/// logged and the walk continues.
pub fn traverse(
    root: &Path,
    scope: &ScopeBoundary,
    files: &impl FileSource,
    extensions: &[String],
) -> Result<TraversalOrder, TraversalError> {
    let mut order = TraversalOrder::default();
    let mut visited: HashSet<PathBuf> = HashSet::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(path) = stack.pop() {
        if !visited.insert(path.clone()) {
            continue;
        }

        let document = match load(&path, files) {
            Ok(document) => document,
            Err(reason) if path == root => {
                return Err(TraversalError::UnreadableRoot { path, reason });
            }
            Err(reason) => {
                warn!(document = %path.display(), %reason, "skipping document");
                order.skipped.push(Skipped { path, reason });
                continue;
            }
        };

        let targets = internal_targets(&document, scope, files, extensions);
        debug!(
            document = %path.display(),
            links = targets.len(),
            "visiting document"
        );
        for target in targets.into_iter().rev() {
            if !visited.contains(&target) {
                stack.push(target);
            }
        }

        let action = headers::decide(&document.headers);
        order.entries.push(Entry { document, action });
    }

    Ok(order)
}

/// Read and parse one document. The error is a human-readable reason.
fn load(path: &Path, files: &impl FileSource) -> Result<Document, String> {
    let bytes = files.read(path).map_err(|err| err.to_string())?;
    let source = String::from_utf8(bytes).map_err(|_| "not valid UTF-8".to_string())?;
    Ok(Document::parse(path, source))
}

/// Existing in-scope markdown files linked from `document`, in link order.
///
/// Footnote references and autolinks are never followed. Links that cannot
/// be resolved are logged and dropped.
pub fn internal_targets(
    document: &Document,
    scope: &ScopeBoundary,
    files: &impl FileSource,
    extensions: &[String],
) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    for link in document
        .links
        .iter()
        .filter(|link| !link.is_footnote && !link.is_autolink)
    {
        let target = match links::classify(&link.destination, &document.path, scope) {
            Ok(LinkClass::Internal(target)) => target,
            Ok(LinkClass::External) => continue,
            Err(err) => {
                warn!(document = %document.path.display(), "{err}");
                continue;
            }
        };

        if !links::has_extension(&target.path, extensions) {
            debug!(target = %target.path.display(), "not a markdown target");
            continue;
        }
        if !files.is_file(&target.path) {
            debug!(target = %target.path.display(), "link target does not exist");
            continue;
        }
        targets.push(target.path);
    }
    targets
}
