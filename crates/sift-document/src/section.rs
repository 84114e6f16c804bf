//! Section tree structures.
//!
//! A parsed document is a forest of [`Section`] nodes plus a flat id map
//! ([`Outline`]). Sections reference each other by id only, so the persisted
//! form has no cycles; the tree shape is reconstructed on demand from the
//! id map.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::FieldKind;

/// A byte range within the original document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    /// Start byte offset (inclusive).
    pub start: usize,
    /// End byte offset (exclusive).
    pub end: usize,
}

impl Span {
    /// Creates a span from start and end offsets.
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// True if `offset` lies within the span.
    pub fn contains(&self, offset: usize) -> bool {
        self.start <= offset && offset < self.end
    }
}

/// The kind of a content block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BlockKind {
    /// A paragraph of prose.
    Paragraph,
    /// A bullet or ordered list, items newline-joined.
    List,
    /// A fenced or indented code block.
    Code {
        /// Language tag of a fenced block, if any.
        language: Option<String>,
    },
    /// A block quote.
    Quote,
    /// A table, cells flattened to text.
    Table,
}

/// A block of content owned by a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBlock {
    /// Block kind.
    #[serde(flatten)]
    pub kind: BlockKind,
    /// The block's visible text.
    pub text: String,
    /// Byte range of the block in the original document.
    pub position: Span,
}

/// A node of the document hierarchy.
///
/// Either a heading (depth 1-6) or the synthetic body root (depth 0, empty
/// text) that owns content preceding the first heading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    /// Per-document identifier, assigned in document order ("s0", "s1", …).
    pub id: String,
    /// Heading level variant, or `Body` for the synthetic root.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// 1-6 for headings, 0 for the synthetic root.
    pub depth: u8,
    /// Visible heading text, empty for the synthetic root.
    pub text: String,
    /// Byte range of the heading syntax in the original document.
    pub position: Span,
    /// Owning section id, absent for roots.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub parent_id: Option<String>,
    /// Child section ids in document order.
    pub children_ids: Vec<String>,
    /// Content blocks in document order.
    pub content: Vec<ContentBlock>,
}

impl Section {
    /// A short summary of the section (no children, no content).
    pub fn summary(&self) -> SectionSummary {
        SectionSummary {
            id: self.id.clone(),
            kind: self.kind,
            text: self.text.clone(),
            depth: self.depth,
        }
    }
}

/// A lightweight reference to a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionSummary {
    /// Section id.
    pub id: String,
    /// Section kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Heading text.
    pub text: String,
    /// Hierarchy depth.
    pub depth: u8,
}

/// The section forest of one document: ordered roots plus the flat id map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Root section ids in document order.
    pub structure: Vec<String>,
    /// Every section of the document, keyed by id.
    pub sections: BTreeMap<String, Section>,
}

impl Outline {
    /// Looks up a section by id.
    pub fn section(&self, id: &str) -> Option<&Section> {
        self.sections.get(id)
    }

    /// Number of sections.
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True if the document has no sections.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All sections in document order.
    ///
    /// Ids are "s{n}" with n assigned in document order; the map's string
    /// order does not agree with it past ten sections, so order is recovered
    /// from the numeric suffix.
    pub fn in_document_order(&self) -> Vec<&Section> {
        let mut sections: Vec<&Section> = self.sections.values().collect();
        sections.sort_by_key(|s| section_ordinal(&s.id));
        sections
    }

    /// Ancestors of `id` from the root down to its direct parent.
    pub fn ancestors(&self, id: &str) -> Vec<&Section> {
        let mut chain = Vec::new();
        let mut current = self.section(id).and_then(|s| s.parent_id.as_deref());
        while let Some(parent_id) = current {
            match self.section(parent_id) {
                Some(parent) => {
                    chain.push(parent);
                    current = parent.parent_id.as_deref();
                }
                None => break,
            }
        }
        chain.reverse();
        chain
    }

    /// The first section (document order) of the given kind whose text
    /// equals `text`.
    pub fn find_heading(&self, kind: FieldKind, text: &str) -> Option<&Section> {
        self.in_document_order()
            .into_iter()
            .find(|s| s.kind == kind && s.text == text)
    }

    /// The section owning the byte `offset` of the original document.
    ///
    /// A section whose content block covers the offset wins; otherwise the
    /// section whose heading starts nearest before the offset.
    pub fn owner_of_offset(&self, offset: usize) -> Option<&Section> {
        let ordered = self.in_document_order();

        if let Some(owner) = ordered
            .iter()
            .find(|s| s.content.iter().any(|b| b.position.contains(offset)))
        {
            return Some(owner);
        }

        ordered
            .into_iter()
            .filter(|s| s.position.start <= offset)
            .max_by_key(|s| s.position.start)
    }

    /// The first root section, if any.
    pub fn first_root(&self) -> Option<&Section> {
        self.structure.first().and_then(|id| self.section(id))
    }
}

/// Document-order rank of a section id ("s12" -> 12).
fn section_ordinal(id: &str) -> usize {
    id.strip_prefix('s')
        .and_then(|n| n.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(id: &str, kind: FieldKind, depth: u8, text: &str, start: usize) -> Section {
        Section {
            id: id.to_string(),
            kind,
            depth,
            text: text.to_string(),
            position: Span::new(start, start + 6),
            parent_id: None,
            children_ids: vec![],
            content: vec![],
        }
    }

    fn outline_of(sections: Vec<Section>) -> Outline {
        let mut outline = Outline::default();
        for s in sections {
            if s.parent_id.is_none() {
                outline.structure.push(s.id.clone());
            }
            outline.sections.insert(s.id.clone(), s);
        }
        outline
    }

    #[test]
    fn document_order_is_numeric_not_lexicographic() {
        let mut sections = Vec::new();
        for n in 0..12 {
            sections.push(section(&format!("s{n}"), FieldKind::H2, 2, "x", n * 10));
        }
        let outline = outline_of(sections);
        let ids: Vec<&str> = outline
            .in_document_order()
            .iter()
            .map(|s| s.id.as_str())
            .collect();
        assert_eq!(ids[1], "s1");
        assert_eq!(ids[10], "s10");
        assert_eq!(ids[11], "s11");
    }

    #[test]
    fn ancestors_walk_to_root() {
        let mut a = section("s0", FieldKind::H1, 1, "A", 0);
        let mut b = section("s1", FieldKind::H2, 2, "B", 10);
        let mut c = section("s2", FieldKind::H3, 3, "C", 20);
        b.parent_id = Some("s0".into());
        c.parent_id = Some("s1".into());
        a.children_ids = vec!["s1".into()];
        b.children_ids = vec!["s2".into()];

        let outline = outline_of(vec![a, b, c]);
        let chain: Vec<&str> = outline
            .ancestors("s2")
            .iter()
            .map(|s| s.text.as_str())
            .collect();
        assert_eq!(chain, vec!["A", "B"]);
        assert!(outline.ancestors("s0").is_empty());
    }

    #[test]
    fn owner_prefers_containing_content_block() {
        let mut a = section("s0", FieldKind::H1, 1, "A", 0);
        a.content.push(ContentBlock {
            kind: BlockKind::Paragraph,
            text: "para".into(),
            position: Span::new(10, 30),
        });
        let b = section("s1", FieldKind::H1, 1, "B", 40);

        let outline = outline_of(vec![a, b]);
        assert_eq!(outline.owner_of_offset(15).unwrap().id, "s0");
        // 45 is in no block; nearest preceding heading is B.
        assert_eq!(outline.owner_of_offset(45).unwrap().id, "s1");
        // Before everything with no block: first heading at 0 still owns it.
        assert_eq!(outline.owner_of_offset(0).unwrap().id, "s0");
    }

    #[test]
    fn find_heading_matches_kind_and_text() {
        let a = section("s0", FieldKind::H1, 1, "Intro", 0);
        let b = section("s1", FieldKind::H2, 2, "Intro", 10);
        let outline = outline_of(vec![a, b]);

        assert_eq!(
            outline.find_heading(FieldKind::H2, "Intro").unwrap().id,
            "s1"
        );
        assert!(outline.find_heading(FieldKind::H3, "Intro").is_none());
    }

    #[test]
    fn serde_roundtrip() {
        let mut a = section("s0", FieldKind::H1, 1, "A", 0);
        a.content.push(ContentBlock {
            kind: BlockKind::Code {
                language: Some("rust".into()),
            },
            text: "fn main() {}".into(),
            position: Span::new(10, 30),
        });
        let outline = outline_of(vec![a]);

        let json = serde_json::to_string(&outline).unwrap();
        let back: Outline = serde_json::from_str(&json).unwrap();
        assert_eq!(back, outline);
        assert!(json.contains("\"type\":\"h1\""));
    }
}
