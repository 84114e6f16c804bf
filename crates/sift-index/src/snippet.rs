//! Snippet extraction.
//!
//! After ranking, every query term is re-found inside the matched record's
//! fields: heading fields line by line against their folded projections,
//! title and body by scanning the folded text with word-boundary regexes
//! and recovering raw byte positions through the offset map. Each occurrence
//! becomes a [`Snippet`] attributed to the owning section, which makes the
//! result navigable (parent, siblings, breadcrumbs) without loading the
//! document again.

use std::cell::OnceCell;
use std::sync::Arc;

use regex::Regex;
use serde::Serialize;

use sift_document::{FieldKind, Section};
use sift_normalize::{OffsetMap, normalize};
use sift_query::MatchTerm;

use crate::record::DocumentRecord;

/// Heading summary carried by a snippet for direct display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeadingRef {
    /// Section id.
    pub id: String,
    /// Section kind.
    #[serde(rename = "type")]
    pub kind: FieldKind,
    /// Heading text (empty for the synthetic body root).
    pub text: String,
    /// Hierarchy depth.
    pub depth: u8,
}

/// One match occurrence with its context window and owning section.
#[derive(Debug, Clone, Serialize)]
pub struct Snippet {
    /// The context window, or the matched heading line in heading mode.
    pub text: String,
    /// The field the match was found in.
    #[serde(rename = "section_type")]
    pub field: FieldKind,
    /// Byte offset of the match in the body text (or in the heading
    /// projection for heading and title matches).
    pub position: usize,
    /// Path of the matched document.
    pub document_path: String,
    /// Title of the matched document.
    pub document_title: String,
    /// Tags of the matched document.
    pub tags: Vec<String>,
    /// Ranking score of the document (larger is better).
    pub rank: f32,
    /// Owning section id, when the match could be attributed.
    pub section_id: Option<String>,
    /// The owning section's parent id.
    pub parent_id: Option<String>,
    /// The owning section's children ids.
    pub children_ids: Vec<String>,
    /// Number of content blocks in the owning section.
    pub content_count: usize,
    /// Heading summary of the owning section.
    pub heading: Option<HeadingRef>,
    /// Lazily loaded document for navigation, cached per snippet.
    #[serde(skip)]
    pub(crate) document: OnceCell<Option<Arc<DocumentRecord>>>,
}

impl Snippet {
    /// A snippet with document fields filled and no section attribution.
    fn bare(record: &DocumentRecord, rank: f32, field: FieldKind) -> Self {
        Self {
            text: String::new(),
            field,
            position: 0,
            document_path: record.path.clone(),
            document_title: record.title().to_string(),
            tags: record.tags.clone(),
            rank,
            section_id: None,
            parent_id: None,
            children_ids: Vec::new(),
            content_count: 0,
            heading: None,
            document: OnceCell::new(),
        }
    }

    /// Attaches section navigation data.
    fn attach(&mut self, section: &Section) {
        self.section_id = Some(section.id.clone());
        self.parent_id = section.parent_id.clone();
        self.children_ids = section.children_ids.clone();
        self.content_count = section.content.len();
        self.heading = Some(HeadingRef {
            id: section.id.clone(),
            kind: section.kind,
            text: section.text.clone(),
            depth: section.depth,
        });
    }
}

/// A document-only snippet for searches that skip extraction.
pub(crate) fn document_snippet(record: &DocumentRecord, rank: f32) -> Snippet {
    Snippet::bare(record, rank, FieldKind::Title)
}

/// Extracts up to `limit` snippets for the given terms from one record.
///
/// Fields are visited title first, then h1..h6, then body; matches within a
/// field come out left to right. When nothing matches, one fallback snippet
/// with the leading body (or title) text is emitted so every ranked hit
/// stays presentable.
pub(crate) fn extract_snippets(
    record: &DocumentRecord,
    rank: f32,
    terms: &[MatchTerm],
    length: usize,
    limit: usize,
) -> Vec<Snippet> {
    let matchers = build_matchers(terms);
    let mut out = Vec::new();

    for kind in FieldKind::ALL {
        if out.len() >= limit {
            break;
        }
        let raw = record.fields.raw(kind);
        if raw.is_empty() || matchers.is_empty() {
            continue;
        }

        if kind.is_heading() {
            heading_snippets(record, rank, kind, &matchers, limit, &mut out);
        } else {
            window_snippets(record, rank, kind, &matchers, length, limit, &mut out);
        }
    }

    if out.is_empty() {
        out.push(fallback_snippet(record, rank, length));
    }
    out
}

/// Word-boundary regexes for the term list, in term order.
///
/// A prefix term keeps its left boundary and drops the right one.
fn build_matchers(terms: &[MatchTerm]) -> Vec<Regex> {
    terms
        .iter()
        .filter_map(|term| {
            let escaped = regex::escape(&term.text);
            let pattern = if term.prefix {
                format!(r"\b{escaped}")
            } else {
                format!(r"\b{escaped}\b")
            };
            Regex::new(&pattern).ok()
        })
        .collect()
}

/// Matches heading projections line by line.
///
/// Each matched line becomes one snippet whose text is the raw heading line
/// and whose section is looked up by (level, text) in the section index.
fn heading_snippets(
    record: &DocumentRecord,
    rank: f32,
    kind: FieldKind,
    matchers: &[Regex],
    limit: usize,
    out: &mut Vec<Snippet>,
) {
    let raw = record.fields.raw(kind);

    let mut offset = 0;
    for line in raw.split('\n') {
        if out.len() >= limit {
            return;
        }
        let folded = normalize(line);
        if matchers.iter().any(|m| m.is_match(&folded)) {
            let mut snippet = Snippet::bare(record, rank, kind);
            snippet.text = line.to_string();
            snippet.position = offset;
            if let Some(section) = record.outline.find_heading(kind, line) {
                snippet.attach(section);
            }
            out.push(snippet);
        }
        offset += line.len() + 1;
    }
}

/// Scans a folded field and cuts context windows around each occurrence.
fn window_snippets(
    record: &DocumentRecord,
    rank: f32,
    kind: FieldKind,
    matchers: &[Regex],
    length: usize,
    limit: usize,
    out: &mut Vec<Snippet>,
) {
    let raw = record.fields.raw(kind);
    let norm = record.fields.norm(kind);
    let map = OffsetMap::new(raw, norm);

    // (raw byte position, term index), position-ordered, one per position.
    let mut hits: Vec<(usize, usize)> = Vec::new();
    for (term_idx, matcher) in matchers.iter().enumerate() {
        for m in matcher.find_iter(norm) {
            hits.push((map.norm_to_raw(m.start()), term_idx));
        }
    }
    hits.sort_unstable();
    hits.dedup_by_key(|(pos, _)| *pos);

    for (raw_pos, _) in hits {
        if out.len() >= limit {
            return;
        }

        let mut snippet = Snippet::bare(record, rank, kind);
        snippet.text = context_window(raw, &map, raw_pos, length);
        snippet.position = raw_pos;

        let section = match kind {
            FieldKind::Title => record.outline.find_heading(FieldKind::H1, raw),
            _ => record.outline.owner_of_offset(raw_pos),
        };
        if let Some(section) = section {
            snippet.attach(section);
        }
        out.push(snippet);
    }
}

/// Cuts a `length`-char window centered on the match, with ellipsis markers
/// on trimmed edges. Slicing stays on char boundaries via the offset map.
fn context_window(raw: &str, map: &OffsetMap, raw_pos: usize, length: usize) -> String {
    let char_count = map.char_count();
    let at = map.raw_char_index(raw_pos);
    let start = at.saturating_sub(length / 2);
    let end = (start + length).min(char_count);

    let slice = raw[map.raw_byte_at(start)..map.raw_byte_at(end)].trim();

    let mut text = String::new();
    if start > 0 {
        text.push('…');
    }
    text.push_str(slice);
    if end < char_count {
        text.push('…');
    }
    text
}

/// The no-match fallback: leading body (or title) text, attributed to the
/// first root section.
fn fallback_snippet(record: &DocumentRecord, rank: f32, length: usize) -> Snippet {
    let (kind, raw) = if record.body().is_empty() {
        (FieldKind::Title, record.fields.raw(FieldKind::Title))
    } else {
        (FieldKind::Body, record.body())
    };

    let mut snippet = Snippet::bare(record, rank, kind);
    let end = raw
        .char_indices()
        .nth(length)
        .map_or(raw.len(), |(idx, _)| idx);
    snippet.text = raw[..end].trim().to_string();

    if let Some(section) = record.outline.first_root() {
        snippet.attach(section);
    }
    snippet
}

#[cfg(test)]
mod tests {
    use sift_document::{ParseOptions, parse_markdown};
    use sift_query::match_terms;

    use super::*;

    fn record(source: &str) -> DocumentRecord {
        let parsed = parse_markdown(source, ParseOptions::default());
        DocumentRecord::build("/d/a.md", source, parsed, vec![], None)
    }

    fn snippets(source: &str, query: &str) -> Vec<Snippet> {
        extract_snippets(&record(source), 1.0, &match_terms(query), 160, 5)
    }

    #[test]
    fn accented_title_matches_plain_query() {
        let out = snippets("# Viaje al Mediterráneo\n\nUn texto.\n", "mediterraneo");
        assert_eq!(out[0].field, FieldKind::Title);
        assert!(out[0].text.contains("Mediterráneo"));
        // Attributed to the h1 section behind the title.
        let heading = out[0].heading.as_ref().unwrap();
        assert_eq!(heading.text, "Viaje al Mediterráneo");
        assert_eq!(heading.depth, 1);
    }

    #[test]
    fn heading_snippet_is_whole_line() {
        // P6: a heading-backed snippet equals one line of the projection.
        let source = "# Top\n\n## Install guide\n\n## Other\n\n## Another guide\n";
        let out = snippets(source, "guide");
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].text, "Install guide");
        assert_eq!(out[1].text, "Another guide");
        assert_eq!(out[0].field, FieldKind::H2);
        // Positions index into the newline-joined h2 projection.
        assert_eq!(out[0].position, 0);
        assert_eq!(out[1].position, "Install guide\nOther\n".len());
        assert!(out.iter().all(|s| s.section_id.is_some()));
    }

    #[test]
    fn body_match_gets_context_window_and_ellipses() {
        let filler = "palabra ".repeat(60);
        let source = format!("# T\n\n{filler}objetivo aquí {filler}\n");
        let out = extract_snippets(&record(&source), 1.0, &match_terms("objetivo"), 40, 5);

        let body = out
            .iter()
            .find(|s| s.field == FieldKind::Body)
            .expect("body snippet");
        assert!(body.text.starts_with('…'));
        assert!(body.text.ends_with('…'));
        assert!(body.text.contains("objetivo"));
        // Position is a byte offset into the original markdown.
        assert_eq!(&source[body.position..body.position + 8], "objetivo");
    }

    #[test]
    fn body_position_survives_accents_before_match() {
        // Multibyte accented chars before the match shift raw bytes
        // relative to the folded text.
        let source = "# Canción\n\náéíóú áéíóú target word\n";
        let out = extract_snippets(&record(source), 1.0, &match_terms("target"), 80, 5);
        let body = out.iter().find(|s| s.field == FieldKind::Body).unwrap();
        assert_eq!(&source[body.position..body.position + 6], "target");
    }

    #[test]
    fn body_match_attributed_to_owning_section() {
        let source = "# A\n\nalpha here.\n\n## B\n\nbeta content target.\n";
        let out = snippets(source, "target");
        let body = out.iter().find(|s| s.field == FieldKind::Body).unwrap();
        assert_eq!(body.heading.as_ref().unwrap().text, "B");
    }

    #[test]
    fn prefix_term_matches_word_start_only() {
        let source = "# T\n\nmediterraneo y tramed texto\n";
        let hits = snippets(source, "medit*");
        assert_eq!(hits.iter().filter(|s| s.field == FieldKind::Body).count(), 1);
        // Non-prefix form of an infix never matches.
        let record = record(source);
        let none = extract_snippets(&record, 1.0, &match_terms("raneo"), 160, 5);
        assert!(none.iter().all(|s| s.text != "mediterraneo"));
    }

    #[test]
    fn per_document_limit_is_honored() {
        let source = "# T\n\nuno target dos target tres target cuatro target.\n";
        let out = extract_snippets(&record(source), 1.0, &match_terms("target"), 20, 2);
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn one_snippet_per_heading_line_even_with_two_terms() {
        let source = "# Top\n\n## alpha beta\n";
        let out = snippets(source, "alpha beta");
        let h2: Vec<_> = out.iter().filter(|s| s.field == FieldKind::H2).collect();
        assert_eq!(h2.len(), 1);
    }

    #[test]
    fn fallback_snippet_when_nothing_matches() {
        let source = "# Title here\n\nSome body text.\n";
        let out = snippets(source, "nomatchword");
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].field, FieldKind::Body);
        assert!(out[0].text.starts_with("# Title here"));
        assert_eq!(out[0].position, 0);
        // Attributed to the first root section.
        assert!(out[0].section_id.is_some());
    }

    #[test]
    fn field_order_is_title_headings_body() {
        let source = "# guide\n\n## guide\n\nguide in body.\n";
        let out = snippets(source, "guide");
        assert_eq!(out[0].field, FieldKind::Title);
        assert_eq!(out[1].field, FieldKind::H2);
        assert_eq!(out[2].field, FieldKind::Body);
    }
}
