//! Header normalization.
//!
//! Every document must open its section of the combined output with exactly
//! one level-1 header, and everything it contains must nest below that header.
//!
//! ## Rules
//!
//! | Level-1 headers | First header is level 1 | Action |
//! |-----------------|-------------------------|--------|
//! | 0               | n/a                     | Synthesize `# filename`, keep levels |
//! | 1               | yes                     | Keep as-is |
//! | 1               | no                      | Synthesize `# filename`, demote all |
//! | more than 1     | n/a                     | Synthesize `# filename`, demote all |
//!
//! Demotion is all-or-nothing: every header in the document moves down one
//! level (saturating at 6), so the relative hierarchy is preserved.

use crate::markdown::{self, Document, Header};
use pulldown_cmark::{Event, HeadingLevel, Tag, TagEnd};
use serde::Serialize;

/// What to do with a document's headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum HeaderAction {
    /// The document already opens with its only level-1 header.
    KeepAsIs,
    /// No level-1 headers: add one from the filename, levels unchanged.
    SynthesizeAndKeepLevels,
    /// Conflicting level-1 headers: add one from the filename and demote all.
    SynthesizeAndDemoteAll,
}

impl HeaderAction {
    /// Whether a synthetic header is added.
    pub fn synthesizes(self) -> bool {
        !matches!(self, HeaderAction::KeepAsIs)
    }
}

/// Decide the action for a document from its ordered headers.
pub fn decide(headers: &[Header]) -> HeaderAction {
    let top_level = headers.iter().filter(|h| h.level == 1).count();
    match top_level {
        0 => HeaderAction::SynthesizeAndKeepLevels,
        1 if headers.first().is_some_and(|h| h.level == 1) => HeaderAction::KeepAsIs,
        _ => HeaderAction::SynthesizeAndDemoteAll,
    }
}

/// Text of the level-1 header the document opens with once `action` is applied.
pub fn section_title(document: &Document, action: HeaderAction) -> String {
    match (action, document.headers.first()) {
        (HeaderAction::KeepAsIs, Some(header)) => header.text.clone(),
        _ => document.file_name(),
    }
}

/// Apply `action` to the document tree and its header list.
pub fn apply(document: &mut Document, action: HeaderAction) {
    if action == HeaderAction::SynthesizeAndDemoteAll {
        demote_all(document);
    }
    if action.synthesizes() {
        let name = document.file_name();
        document
            .events
            .splice(0..0, markdown::heading_events(HeadingLevel::H1, &name));
        document.headers.insert(
            0,
            Header {
                level: 1,
                text: name.clone(),
                id: name,
            },
        );
    }
}

fn demote_all(document: &mut Document) {
    for event in &mut document.events {
        match event {
            Event::Start(Tag::Heading { level, .. }) | Event::End(TagEnd::Heading(level)) => {
                *level = markdown::demoted(*level);
            }
            _ => {}
        }
    }
    for header in &mut document.headers {
        header.level = (header.level + 1).min(6);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(level: u8, text: &str) -> Header {
        Header {
            level,
            text: text.to_string(),
            id: markdown::heading_id(text),
        }
    }

    // =========================================================================
    // decide
    // =========================================================================

    #[test]
    fn no_headers_synthesizes() {
        assert_eq!(decide(&[]), HeaderAction::SynthesizeAndKeepLevels);
    }

    #[test]
    fn only_sub_headers_synthesizes_without_demotion() {
        let headers = [header(2, "Methods"), header(3, "GET"), header(2, "Examples")];
        assert_eq!(decide(&headers), HeaderAction::SynthesizeAndKeepLevels);
    }

    #[test]
    fn single_leading_top_level_is_kept() {
        let headers = [header(1, "Main Title"), header(2, "Intro")];
        assert_eq!(decide(&headers), HeaderAction::KeepAsIs);
    }

    #[test]
    fn single_top_level_not_first_demotes() {
        let headers = [header(2, "Intro"), header(1, "Main Title")];
        assert_eq!(decide(&headers), HeaderAction::SynthesizeAndDemoteAll);
    }

    #[test]
    fn multiple_top_level_demotes() {
        let headers = [header(1, "First"), header(2, "Sub"), header(1, "Second")];
        assert_eq!(decide(&headers), HeaderAction::SynthesizeAndDemoteAll);
    }

    // =========================================================================
    // apply
    // =========================================================================

    fn apply_to(source: &str) -> (Document, HeaderAction) {
        let mut doc = Document::parse("/docs/b.md", source.to_string());
        let action = decide(&doc.headers);
        apply(&mut doc, action);
        (doc, action)
    }

    #[test]
    fn keep_as_is_leaves_tree_untouched() {
        let (doc, action) = apply_to("# Title\n\n## Sub\n");
        assert_eq!(action, HeaderAction::KeepAsIs);
        let rendered = doc.render().unwrap();
        let lines: Vec<&str> = rendered.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["# Title", "## Sub"]);
    }

    #[test]
    fn synthesize_prepends_filename_header() {
        let (doc, _) = apply_to("Intro text.\n\n## Sub\n");
        let rendered = doc.render().unwrap();
        assert!(rendered.starts_with("# b.md\n"));
        assert!(rendered.contains("\n## Sub"));
        assert_eq!(doc.headers[0].text, "b.md");
    }

    #[test]
    fn demotion_shifts_every_level() {
        let (doc, action) = apply_to("## Sub\n\n# B\n");
        assert_eq!(action, HeaderAction::SynthesizeAndDemoteAll);
        let rendered = doc.render().unwrap();
        let lines: Vec<&str> = rendered.lines().filter(|l| !l.is_empty()).collect();
        assert_eq!(lines, vec!["# b.md", "### Sub", "## B"]);
        let levels: Vec<u8> = doc.headers.iter().map(|h| h.level).collect();
        assert_eq!(levels, vec![1, 3, 2]);
    }

    #[test]
    fn demotion_caps_at_six() {
        let (doc, _) = apply_to("# One\n\n# Two\n\n###### Six\n");
        let rendered = doc.render().unwrap();
        assert!(rendered.contains("###### Six"));
        assert!(!rendered.contains("#######"));
    }

    #[test]
    fn section_title_matches_applied_header() {
        for source in ["# Title\n", "## Sub\n", "# a\n\n# b\n"] {
            let doc = Document::parse("/docs/b.md", source.to_string());
            let action = decide(&doc.headers);
            let title = section_title(&doc, action);
            let (applied, _) = apply_to(source);
            assert_eq!(title, applied.headers[0].text, "source: {source:?}");
        }
    }

    #[test]
    fn exactly_one_top_level_after_apply() {
        for source in ["", "## a\n", "# a\n", "## a\n\n# b\n", "# a\n\n# b\n"] {
            let (doc, _) = apply_to(source);
            let top = doc.headers.iter().filter(|h| h.level == 1).count();
            assert_eq!(top, 1, "source: {source:?}");
            assert_eq!(doc.headers[0].level, 1, "source: {source:?}");
        }
    }
}
