//! The end-to-end pipeline and output assembly.
//!
//! ```text
//! validate root ─▶ scope ─▶ traverse ─▶ for each document, in order:
//!                                         headers::apply
//!                                         footnotes::inline
//!                                         anchors::rewrite_links
//!                                         render ─▶ sink
//! ```
//!
//! The per-document steps run in that order: anchors depend on the final
//! header outcome of every target, and links inside footnotes must already be
//! in place when links are rewritten.
//!
//! Rendered documents are written in traversal order, joined by the
//! configured separator, with a single trailing newline.
//!
//! [`plan`] runs the same traversal without rendering and also lists the
//! markdown files in the scope that no link reaches.

use crate::anchors::{self, AnchorIndex};
use crate::config::Config;
use crate::files::FileSource;
use crate::footnotes;
use crate::headers::{self, HeaderAction};
use crate::links::{self, RootError, ScopeBoundary};
use crate::markdown::RenderError;
use crate::traversal::{self, Entry, Skipped, TraversalError, TraversalOrder};
use serde::Serialize;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConcatError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Root(#[from] RootError),
    #[error(transparent)]
    Traversal(#[from] TraversalError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

/// What happened to one emitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    /// Text of the level-1 header that opens the document's section.
    pub title: String,
    /// Anchor other documents use to link here.
    pub anchor: String,
    pub action: HeaderAction,
    pub footnotes_inlined: usize,
    pub links_rewritten: usize,
}

/// Summary of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub scope: PathBuf,
    pub documents: Vec<DocumentReport>,
    pub skipped: Vec<Skipped>,
}

/// A traversal without output: what would be emitted, and what would not.
#[derive(Debug, Clone, Serialize)]
pub struct Plan {
    pub scope: PathBuf,
    pub documents: Vec<PlannedDocument>,
    pub skipped: Vec<Skipped>,
    /// Markdown files in the scope that no traversed link reaches.
    pub unreachable: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedDocument {
    pub path: PathBuf,
    pub title: String,
    pub anchor: String,
    pub action: HeaderAction,
}

/// Validate the root, settle the scope, and traverse.
pub fn prepare(
    root: &Path,
    explicit_scope: Option<&Path>,
    config: &Config,
    files: &impl FileSource,
) -> Result<(ScopeBoundary, TraversalOrder), ConcatError> {
    let root = links::validate_root(root, files, &config.extensions)?;
    let scope = links::determine_scope(&root, explicit_scope, files)?;
    let order = traversal::traverse(&root, &scope, files, &config.extensions)?;
    Ok((scope, order))
}

/// Concatenate everything reachable from `root` into `sink`.
pub fn concatenate(
    root: &Path,
    explicit_scope: Option<&Path>,
    config: &Config,
    files: &impl FileSource,
    sink: &mut impl Write,
) -> Result<Report, ConcatError> {
    let (scope, order) = prepare(root, explicit_scope, config, files)?;
    assemble(order, &scope, config, sink)
}

/// Transform and write every document of a traversal, in order.
pub fn assemble(
    order: TraversalOrder,
    scope: &ScopeBoundary,
    config: &Config,
    sink: &mut impl Write,
) -> Result<Report, ConcatError> {
    let index = AnchorIndex::build(&order.entries);
    let mut documents = Vec::with_capacity(order.entries.len());

    for (position, Entry { mut document, action }) in order.entries.into_iter().enumerate() {
        let anchor = anchors::target_anchor(&document, action);
        let title = headers::section_title(&document, action);

        headers::apply(&mut document, action);
        let footnotes_inlined = footnotes::inline(&mut document, &config.footnotes);
        let links_rewritten = anchors::rewrite_links(&mut document, scope, &index);
        let rendered = document.render()?;

        if position > 0 {
            sink.write_all(config.separator.as_bytes())?;
        }
        sink.write_all(rendered.trim_end_matches('\n').as_bytes())?;

        info!(
            document = %document.path.display(),
            %anchor,
            footnotes_inlined,
            links_rewritten,
            "emitted document"
        );
        documents.push(DocumentReport {
            path: document.path,
            title,
            anchor,
            action,
            footnotes_inlined,
            links_rewritten,
        });
    }

    sink.write_all(b"\n")?;
    sink.flush()?;

    Ok(Report {
        scope: scope.path().to_path_buf(),
        documents,
        skipped: order.skipped,
    })
}

/// Traverse without writing, and find unreachable documents in the scope.
pub fn plan(
    root: &Path,
    explicit_scope: Option<&Path>,
    config: &Config,
    files: &impl FileSource,
) -> Result<Plan, ConcatError> {
    let (scope, order) = prepare(root, explicit_scope, config, files)?;
    let unreachable = unreachable_documents(&scope, &order, &config.extensions);
    let documents = order
        .entries
        .iter()
        .map(|entry| PlannedDocument {
            path: entry.document.path.clone(),
            title: headers::section_title(&entry.document, entry.action),
            anchor: anchors::target_anchor(&entry.document, entry.action),
            action: entry.action,
        })
        .collect();

    Ok(Plan {
        scope: scope.path().to_path_buf(),
        documents,
        skipped: order.skipped,
        unreachable,
    })
}

/// Markdown files under the scope directory that are not in `order`, sorted.
///
/// Hidden files and directories are ignored.
pub fn unreachable_documents(
    scope: &ScopeBoundary,
    order: &TraversalOrder,
    extensions: &[String],
) -> Vec<PathBuf> {
    WalkDir::new(scope.path())
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry))
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!("skipping unreadable directory entry: {err}");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(walkdir::DirEntry::into_path)
        .filter(|path| links::has_extension(path, extensions))
        .filter(|path| !order.contains(path))
        .collect()
}

fn is_hidden(entry: &walkdir::DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::files::OsFiles;
    use crate::test_helpers::{MemoryFiles, write_tree};

    fn run(files: &MemoryFiles, root: &str) -> (String, Report) {
        let mut out = Vec::new();
        let report = concatenate(Path::new(root), None, &Config::default(), files, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), report)
    }

    fn lines(out: &str) -> Vec<&str> {
        out.lines().filter(|l| !l.is_empty()).collect()
    }

    #[test]
    fn single_document_with_leading_header() {
        let files = MemoryFiles::new().with_file("/p/a.md", "# Alpha\n\nBody text.\n");
        let (out, report) = run(&files, "/p/a.md");
        assert_eq!(lines(&out), vec!["# Alpha", "Body text."]);
        assert!(out.ends_with('\n'));
        assert_eq!(report.documents.len(), 1);
        assert_eq!(report.documents[0].anchor, "#alpha");
    }

    #[test]
    fn linked_document_is_demoted_and_anchored() {
        let files = MemoryFiles::new()
            .with_file("/p/a.md", "# A\n\nSee [B](b.md).\n")
            .with_file("/p/b.md", "## Sub\n\n# B\n");
        let (out, report) = run(&files, "/p/a.md");
        assert_eq!(
            lines(&out),
            vec!["# A", "See [B](#b.md).", "# b.md", "### Sub", "## B"]
        );
        assert_eq!(report.documents[0].links_rewritten, 1);
        assert_eq!(report.documents[1].action, HeaderAction::SynthesizeAndDemoteAll);
    }

    #[test]
    fn documents_joined_by_separator() {
        let files = MemoryFiles::new()
            .with_file("/p/a.md", "# A\n\n[B](b.md)\n")
            .with_file("/p/b.md", "# B\n");
        let config = Config {
            separator: "\n\n---\n\n".to_string(),
            ..Config::default()
        };
        let mut out = Vec::new();
        concatenate(Path::new("/p/a.md"), None, &config, &files, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("# A"), "{out}");
        assert!(out.ends_with("[B](#b)\n\n---\n\n# B\n"), "{out}");
    }

    #[test]
    fn footnote_link_is_rewritten_after_inlining() {
        let files = MemoryFiles::new()
            .with_file("/p/a.md", "# A\n\nText[^1].\n\n[^1]: See [B](b.md).\n")
            .with_file("/p/b.md", "Body\n");
        let (out, report) = run(&files, "/p/a.md");
        assert!(out.contains("Text (See [B](#b.md))."), "{out}");
        assert_eq!(report.documents[0].footnotes_inlined, 1);
    }

    #[test]
    fn invalid_root_is_structural_error() {
        let files = MemoryFiles::new().with_file("/p/a.txt", "");
        let mut out = Vec::new();
        let result = concatenate(Path::new("/p/a.txt"), None, &Config::default(), &files, &mut out);
        assert!(matches!(result, Err(ConcatError::Root(RootError::UnsupportedExtension(_)))));
        assert!(out.is_empty());
    }

    #[test]
    fn skipped_documents_are_reported() {
        let files = MemoryFiles::new()
            .with_file("/p/a.md", "# A\n\n[B](b.md)\n")
            .with_file("/p/b.md", vec![0xffu8]);
        let (out, report) = run(&files, "/p/a.md");
        assert!(out.contains("[B](b.md)"), "{out}");
        assert_eq!(report.skipped.len(), 1);
    }

    // =========================================================================
    // plan / unreachable_documents
    // =========================================================================

    #[test]
    fn plan_lists_unreachable_markdown() {
        let tmp = write_tree(&[
            ("index.md", "# Index\n\n[Guide](guide/setup.md)\n"),
            ("guide/setup.md", "Setup\n"),
            ("orphan.md", "# Orphan\n"),
            ("guide/old.markdown", "Old\n"),
            ("notes.txt", "not markdown"),
            (".hidden/secret.md", "hidden"),
        ]);
        let root = tmp.path().join("index.md");
        let plan = plan(&root, None, &Config::default(), &OsFiles).unwrap();

        let anchors: Vec<&str> = plan.documents.iter().map(|d| d.anchor.as_str()).collect();
        assert_eq!(anchors, vec!["#index", "#setup.md"]);

        let unreachable: Vec<String> = plan
            .unreachable
            .iter()
            .map(|p| p.strip_prefix(&plan.scope).unwrap().display().to_string())
            .collect();
        assert_eq!(unreachable, vec!["guide/old.markdown", "orphan.md"]);
    }

    #[test]
    fn plan_with_everything_reachable() {
        let tmp = write_tree(&[("a.md", "[B](b.md)"), ("b.md", "[A](a.md)")]);
        let plan = plan(&tmp.path().join("a.md"), None, &Config::default(), &OsFiles).unwrap();
        assert_eq!(plan.documents.len(), 2);
        assert!(plan.unreachable.is_empty());
    }
}
