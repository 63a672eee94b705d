//! # catmd
//!
//! Concatenate a set of linked markdown documents into one. Starting from a
//! root document, internal links are followed depth-first; every reachable
//! document is written once, links between them become intra-document
//! anchors, and footnotes are folded into the surrounding text.
//!
//! # Architecture: Traverse, Then Transform
//!
//! ```text
//! 1. Traverse   root.md  →  TraversalOrder   (link graph → ordered documents)
//! 2. Transform  each document, in order:
//!                 headers   → exactly one leading level-1 header
//!                 footnotes → inlined as " (content)"
//!                 links     → "#anchor" of the target's section
//! 3. Assemble   render + join with the separator → one document
//! ```
//!
//! Traversal finishes before any document is transformed. Anchors depend on
//! the header outcome of the *target* document, so every outcome has to be
//! known before the first link is rewritten.
//!
//! All transformations work on the parsed event stream from `pulldown-cmark`,
//! never on raw text, and render back to CommonMark at the end.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`markdown`] | Parse to an owned event stream, extract headers, links, footnotes; render |
//! | [`files`] | `FileSource` trait over the file system, with the `OsFiles` implementation |
//! | [`links`] | Link classification (internal/external), scope boundary, root validation |
//! | [`traversal`] | Cycle-safe depth-first traversal producing the emission order |
//! | [`headers`] | Header rule engine: keep, synthesize, or synthesize and demote |
//! | [`footnotes`] | Footnote inlining |
//! | [`anchors`] | Anchor resolution and link rewriting |
//! | [`assemble`] | End-to-end pipeline, output assembly, unreachable-document check |
//! | [`config`] | `catmd.toml` loading, validation, and merging over stock defaults |
//! | [`output`] | CLI output formatting for run summaries and check plans |
//!
//! # Design Decisions
//!
//! ## Scope Boundary
//!
//! Only files at or below the scope directory are followed. By default that
//! is the root document's directory, so `catmd docs/index.md` never wanders
//! into the rest of the repository through a `../` link. Links that leave the
//! scope are treated exactly like web links: kept as written.
//!
//! ## First Reach Wins
//!
//! A document linked from several places is emitted at the position of the
//! first link that reaches it depth-first. Later links to it, including links
//! back up a cycle, become anchors to that one copy.
//!
//! ## Recover Locally, Fail Globally
//!
//! Broken links, missing files, and unreadable documents are logged and
//! skipped. Only a root that cannot be used at all stops a run.

pub mod anchors;
pub mod assemble;
pub mod config;
pub mod files;
pub mod footnotes;
pub mod headers;
pub mod links;
pub mod markdown;
pub mod output;
pub mod traversal;

#[cfg(test)]
pub(crate) mod test_helpers;
