//! Stored document records.
//!
//! A [`DocumentRecord`] is the unit of indexing and retrieval: one per
//! document path, holding every raw column byte-for-byte, the folded
//! (normalized) columns the engine indexes, the section forest, tags and
//! the source modification time. Conversion to and from Tantivy documents
//! happens here; the section tree travels as JSON blobs.

use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use tantivy::{
    TantivyDocument,
    schema::{Field, Value},
};

use sift_document::{FieldKind, Outline, ParsedDocument};
use sift_normalize::normalize;

use crate::{
    IndexError,
    schema::{IndexSchema, UNTAGGED},
};

/// The raw and normalized text of every searchable column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTexts {
    /// Raw column values in [`FieldKind::ALL`] order.
    raw: [String; 8],
    /// Normalized column values, char-aligned with their raw counterparts.
    norm: [String; 8],
}

impl Serialize for FieldTexts {
    /// Serializes the raw columns keyed by field name; normalized columns
    /// are derivable and omitted.
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(8))?;
        for kind in FieldKind::ALL {
            map.serialize_entry(kind.as_str(), self.raw(kind))?;
        }
        map.end()
    }
}

/// Position of a field kind in the column arrays.
fn ordinal(kind: FieldKind) -> usize {
    match kind {
        FieldKind::Title => 0,
        FieldKind::H1 => 1,
        FieldKind::H2 => 2,
        FieldKind::H3 => 3,
        FieldKind::H4 => 4,
        FieldKind::H5 => 5,
        FieldKind::H6 => 6,
        FieldKind::Body => 7,
    }
}

impl FieldTexts {
    /// The raw text of a field.
    pub fn raw(&self, kind: FieldKind) -> &str {
        &self.raw[ordinal(kind)]
    }

    /// The normalized text of a field.
    pub fn norm(&self, kind: FieldKind) -> &str {
        &self.norm[ordinal(kind)]
    }

    /// Sets a field from its raw text, deriving the normalized form.
    fn set(&mut self, kind: FieldKind, raw: String) {
        self.norm[ordinal(kind)] = normalize(&raw);
        self.raw[ordinal(kind)] = raw;
    }

    /// Restores a field pair loaded from storage.
    fn restore(&mut self, kind: FieldKind, raw: String, norm: String) {
        self.raw[ordinal(kind)] = raw;
        self.norm[ordinal(kind)] = norm;
    }
}

/// One stored document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRecord {
    /// Stable identity: absolute file path or synthesized buffer path.
    pub path: String,
    /// Raw and normalized column texts. The body column holds the full
    /// original Markdown; offsets in sections refer into it.
    #[serde(flatten)]
    pub fields: FieldTexts,
    /// Tags, including the detected language code when present.
    pub tags: Vec<String>,
    /// Section forest and flat id map.
    pub outline: Outline,
    /// Source modification time in milliseconds, absent for buffers.
    pub mtime: Option<i64>,
}

impl DocumentRecord {
    /// Builds a record from a parsed document.
    ///
    /// `source` is the full Markdown text; it becomes the body column so
    /// that section spans and snippet offsets stay valid against it.
    pub fn build(
        path: impl Into<String>,
        source: &str,
        parsed: ParsedDocument,
        tags: Vec<String>,
        mtime: Option<i64>,
    ) -> Self {
        let mut fields = FieldTexts::default();
        fields.set(FieldKind::Title, parsed.projections.title.clone());
        for level in 1..=6u8 {
            let kind = FieldKind::heading(level);
            fields.set(kind, parsed.projections.field(kind).to_string());
        }
        fields.set(FieldKind::Body, source.to_string());

        Self {
            path: path.into(),
            fields,
            tags,
            outline: parsed.outline,
            mtime,
        }
    }

    /// The document title (first h1), empty when the document has none.
    pub fn title(&self) -> &str {
        self.fields.raw(FieldKind::Title)
    }

    /// The full original Markdown text.
    pub fn body(&self) -> &str {
        self.fields.raw(FieldKind::Body)
    }

    /// Clips the body column to `[position, position + length)`.
    ///
    /// Used by record retrieval when the caller asks for a window instead
    /// of the whole text. Byte bounds snap down to char boundaries; the
    /// normalized body is refolded from the clipped text to stay aligned.
    pub fn clip_body(&mut self, position: usize, length: usize) {
        let body = self.fields.raw(FieldKind::Body);
        let start = floor_char_boundary(body, position);
        let end = floor_char_boundary(body, position.saturating_add(length));
        let clipped = body[start..end.max(start)].to_string();
        self.fields.set(FieldKind::Body, clipped);
    }

    /// Converts the record into a Tantivy document.
    pub fn to_tantivy(&self, schema: &IndexSchema) -> Result<TantivyDocument, IndexError> {
        let mut doc = TantivyDocument::new();
        doc.add_text(schema.path, &self.path);

        for kind in FieldKind::ALL {
            doc.add_text(schema.raw_field(kind), self.fields.raw(kind));
            doc.add_text(schema.norm_field(kind), self.fields.norm(kind));
        }

        for tag in &self.tags {
            doc.add_text(schema.tags, tag);
            doc.add_text(schema.tag_filter, tag);
        }
        if self.tags.is_empty() {
            doc.add_text(schema.tag_filter, UNTAGGED);
        }

        let structure = serde_json::to_string(&self.outline.structure)
            .map_err(|e| self.corrupt(&e.to_string()))?;
        let sections = serde_json::to_string(&self.outline.sections)
            .map_err(|e| self.corrupt(&e.to_string()))?;
        doc.add_text(schema.structure, &structure);
        doc.add_text(schema.sections, &sections);

        if let Some(mtime) = self.mtime {
            doc.add_i64(schema.mtime, mtime);
        }

        Ok(doc)
    }

    /// Reconstructs a record from a stored Tantivy document.
    pub fn from_tantivy(doc: &TantivyDocument, schema: &IndexSchema) -> Result<Self, IndexError> {
        let path = doc
            .get_first(schema.path)
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .ok_or_else(|| IndexError::CorruptRecord {
                path: String::new(),
                message: "missing path column".to_string(),
            })?;

        let mut fields = FieldTexts::default();
        for kind in FieldKind::ALL {
            let raw = stored_text(doc, schema.raw_field(kind));
            let norm = stored_text(doc, schema.norm_field(kind));
            fields.restore(kind, raw, norm);
        }

        let tags: Vec<String> = doc
            .get_all(schema.tags)
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();

        let corrupt = |message: &str| IndexError::CorruptRecord {
            path: path.clone(),
            message: message.to_string(),
        };
        let structure: Vec<String> =
            serde_json::from_str(&stored_text(doc, schema.structure))
                .map_err(|e| corrupt(&e.to_string()))?;
        let sections = serde_json::from_str(&stored_text(doc, schema.sections))
            .map_err(|e| corrupt(&e.to_string()))?;

        let mtime = doc.get_first(schema.mtime).and_then(|v| v.as_i64());

        Ok(Self {
            path,
            fields,
            tags,
            outline: Outline {
                structure,
                sections,
            },
            mtime,
        })
    }

    /// Builds a corrupt-record error for this record's path.
    fn corrupt(&self, message: &str) -> IndexError {
        IndexError::CorruptRecord {
            path: self.path.clone(),
            message: message.to_string(),
        }
    }
}

/// The nearest char boundary at or below `index`.
fn floor_char_boundary(s: &str, mut index: usize) -> usize {
    index = index.min(s.len());
    while index > 0 && !s.is_char_boundary(index) {
        index -= 1;
    }
    index
}

/// Reads a stored text value, empty when absent.
fn stored_text(doc: &TantivyDocument, field: Field) -> String {
    doc.get_first(field)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use sift_document::{ParseOptions, parse_markdown};

    use super::*;

    fn record_for(source: &str) -> DocumentRecord {
        let parsed = parse_markdown(source, ParseOptions::default());
        DocumentRecord::build("/docs/a.md", source, parsed, vec!["x".into()], Some(1000))
    }

    #[test]
    fn body_column_is_full_source() {
        let source = "# Viaje al Mediterráneo\n\nUn texto de prueba.\n";
        let record = record_for(source);
        assert_eq!(record.body(), source);
        assert_eq!(record.fields.norm(FieldKind::Body), normalize(source));
    }

    #[test]
    fn title_is_first_h1() {
        let record = record_for("# Viaje al Mediterráneo\n\ntexto.\n");
        assert_eq!(record.title(), "Viaje al Mediterráneo");
        assert_eq!(
            record.fields.norm(FieldKind::Title),
            "viaje al mediterraneo"
        );
    }

    #[test]
    fn norm_columns_align_char_for_char() {
        // I1: raw and normalized columns have equal char counts.
        let record = record_for("# Ñandú\n\n## Sección Á\n\ncafé con leche.\n");
        for kind in FieldKind::ALL {
            assert_eq!(
                record.fields.raw(kind).chars().count(),
                record.fields.norm(kind).chars().count(),
                "misaligned {kind}"
            );
        }
    }

    #[test]
    fn tantivy_roundtrip() {
        let schema = IndexSchema::new();
        let record = record_for("# Title\n\npre.\n\n## Sub\n\nbody text.\n");

        let doc = record.to_tantivy(&schema).unwrap();
        let back = DocumentRecord::from_tantivy(&doc, &schema).unwrap();

        assert_eq!(back.path, record.path);
        assert_eq!(back.title(), record.title());
        assert_eq!(back.body(), record.body());
        assert_eq!(back.tags, record.tags);
        assert_eq!(back.mtime, Some(1000));
        assert_eq!(back.outline, record.outline);
    }

    #[test]
    fn clip_body_windows_the_text() {
        let source = "# T\n\n0123456789abcdefghij\n";
        let mut record = record_for(source);
        record.clip_body(5, 10);
        assert_eq!(record.body(), "0123456789");
        assert_eq!(record.fields.norm(FieldKind::Body), "0123456789");

        let mut past_end = record_for(source);
        past_end.clip_body(1000, 10);
        assert_eq!(past_end.body(), "");
    }

    #[test]
    fn missing_mtime_stays_absent() {
        let parsed = parse_markdown("# T\n", ParseOptions::default());
        let record = DocumentRecord::build("buffer://1", "# T\n", parsed, vec![], None);
        let schema = IndexSchema::new();

        let doc = record.to_tantivy(&schema).unwrap();
        let back = DocumentRecord::from_tantivy(&doc, &schema).unwrap();
        assert_eq!(back.mtime, None);
    }
}
