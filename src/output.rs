//! CLI output formatting.
//!
//! # Information-First Display
//!
//! Every document is shown by its section title and positional index, the
//! way it appears in the combined output. Paths are secondary context on
//! indented `Source:` lines, relative to the scope directory.
//!
//! # Output Format
//!
//! ## Run summary (stderr, after writing to a file)
//!
//! ```text
//! 001 Getting Started
//!     Source: index.md
//!     Anchor: #getting-started
//! 002 setup.md (header added, demoted)
//!     Source: guide/setup.md
//!     Anchor: #setup.md
//!     Footnotes: 2 inlined
//!     Links: 1 rewritten
//!
//! Skipped
//!     guide/broken.md: not valid UTF-8
//!
//! Wrote 2 documents to book.md
//! ```
//!
//! ## Check
//!
//! ```text
//! Documents
//! 001 Getting Started
//!     Source: index.md
//!     Anchor: #getting-started
//!
//! Unreachable
//!     orphan.md
//!
//! 1 document, 0 skipped, 1 unreachable
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper. Format functions are pure: no I/O,
//! no side effects.

use crate::assemble::{Plan, Report};
use crate::headers::HeaderAction;
use crate::traversal::Skipped;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Path relative to the scope, or the full path if it lies outside.
fn relative(path: &Path, scope: &Path) -> String {
    path.strip_prefix(scope)
        .unwrap_or(path)
        .display()
        .to_string()
}

/// Format a document header line: index, title, and what happened to its headers.
///
/// ```text
/// 001 Getting Started
/// 002 setup.md (header added)
/// ```
fn document_header(index: usize, title: &str, action: HeaderAction) -> String {
    let detail = match action {
        HeaderAction::KeepAsIs => "",
        HeaderAction::SynthesizeAndKeepLevels => " (header added)",
        HeaderAction::SynthesizeAndDemoteAll => " (header added, demoted)",
    };
    format!("{} {}{}", format_index(index), title, detail)
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

fn skipped_section(skipped: &[Skipped], scope: &Path, lines: &mut Vec<String>) {
    if skipped.is_empty() {
        return;
    }
    lines.push(String::new());
    lines.push("Skipped".to_string());
    for entry in skipped {
        lines.push(format!(
            "{}{}: {}",
            indent(1),
            relative(&entry.path, scope),
            entry.reason
        ));
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Format the summary of a completed run.
pub fn format_run_report(report: &Report, destination: &Path) -> Vec<String> {
    let mut lines = Vec::new();

    for (i, doc) in report.documents.iter().enumerate() {
        lines.push(document_header(i + 1, &doc.title, doc.action));
        lines.push(format!("{}Source: {}", indent(1), relative(&doc.path, &report.scope)));
        lines.push(format!("{}Anchor: {}", indent(1), doc.anchor));
        if doc.footnotes_inlined > 0 {
            lines.push(format!("{}Footnotes: {} inlined", indent(1), doc.footnotes_inlined));
        }
        if doc.links_rewritten > 0 {
            lines.push(format!("{}Links: {} rewritten", indent(1), doc.links_rewritten));
        }
    }

    skipped_section(&report.skipped, &report.scope, &mut lines);

    lines.push(String::new());
    lines.push(format!(
        "Wrote {} to {}",
        plural(report.documents.len(), "document"),
        destination.display()
    ));
    lines
}

/// Print the run summary to stderr.
pub fn print_run_report(report: &Report, destination: &Path) {
    for line in format_run_report(report, destination) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

/// Format the traversal plan and unreachable documents.
pub fn format_plan(plan: &Plan) -> Vec<String> {
    let mut lines = vec!["Documents".to_string()];

    for (i, doc) in plan.documents.iter().enumerate() {
        lines.push(document_header(i + 1, &doc.title, doc.action));
        lines.push(format!("{}Source: {}", indent(1), relative(&doc.path, &plan.scope)));
        lines.push(format!("{}Anchor: {}", indent(1), doc.anchor));
    }

    skipped_section(&plan.skipped, &plan.scope, &mut lines);

    if !plan.unreachable.is_empty() {
        lines.push(String::new());
        lines.push("Unreachable".to_string());
        for path in &plan.unreachable {
            lines.push(format!("{}{}", indent(1), relative(path, &plan.scope)));
        }
    }

    lines.push(String::new());
    lines.push(format!(
        "{}, {} skipped, {} unreachable",
        plural(plan.documents.len(), "document"),
        plan.skipped.len(),
        plan.unreachable.len()
    ));
    lines
}

/// Print the plan to stdout.
pub fn print_plan(plan: &Plan) {
    for line in format_plan(plan) {
        println!("{}", line);
    }
}

/// The plan as pretty-printed JSON.
pub fn plan_json(plan: &Plan) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(plan)
}
