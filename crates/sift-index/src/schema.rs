//! Index schema definition for the sift store.
//!
//! One Tantivy document per stored record. Every searchable field exists as
//! a raw column (stored only, returned to callers byte-for-byte) and a
//! `_normalized` column (folded text, tokenized and indexed, also stored for
//! the snippet extractor). Alongside them:
//! - `path`: raw-token primary key (stored, indexed for point lookups)
//! - `collection`: stored tag values
//! - `tag_filter`: indexed-only tag tokens plus the untagged sentinel
//! - `structure` / `sections_index`: stored JSON blobs of the section tree
//! - `mtime`: stored milliseconds, absent for in-memory documents

use std::array;

use tantivy::{
    schema::{Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions},
    tokenizer::{LowerCaser, SimpleTokenizer, TextAnalyzer},
};

use sift_document::FieldKind;

/// Name of the tokenizer registered with Tantivy for normalized columns.
pub const SIFT_TOKENIZER: &str = "sift_text";

/// Tag token written to `tag_filter` for documents with no tags.
///
/// Untagged documents are global: a tag-filtered search matches them too.
pub const UNTAGGED: &str = "__untagged__";

/// Handles to all fields in the index schema.
#[derive(Debug, Clone)]
pub struct IndexSchema {
    /// The underlying Tantivy schema.
    schema: Schema,
    /// Primary key: document path.
    pub path: Field,
    /// Raw columns in [`FieldKind::ALL`] order.
    raw: [Field; 8],
    /// Normalized columns in [`FieldKind::ALL`] order.
    norm: [Field; 8],
    /// Stored tag values.
    pub tags: Field,
    /// Indexed-only tag tokens (plus [`UNTAGGED`]).
    pub tag_filter: Field,
    /// Stored JSON: root section ids in document order.
    pub structure: Field,
    /// Stored JSON: section id map.
    pub sections: Field,
    /// Stored modification time in milliseconds.
    pub mtime: Field,
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

impl IndexSchema {
    /// Creates the schema with all columns configured.
    pub fn new() -> Self {
        let mut builder = Schema::builder();

        // Path: raw token so deletes and lookups hit exactly one record.
        let path = builder.add_text_field("path", STRING | STORED);

        let norm_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer(SIFT_TOKENIZER)
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();

        let raw: [Field; 8] =
            array::from_fn(|i| builder.add_text_field(FieldKind::ALL[i].as_str(), STORED));
        let norm: [Field; 8] = array::from_fn(|i| {
            builder.add_text_field(
                &format!("{}_normalized", FieldKind::ALL[i].as_str()),
                norm_options.clone(),
            )
        });

        let tags = builder.add_text_field("collection", STRING | STORED);
        let tag_filter = builder.add_text_field("tag_filter", STRING);
        let structure = builder.add_text_field("structure", STORED);
        let sections = builder.add_text_field("sections_index", STORED);
        let mtime = builder.add_i64_field("mtime", STORED);

        let schema = builder.build();

        Self {
            schema,
            path,
            raw,
            norm,
            tags,
            tag_filter,
            structure,
            sections,
            mtime,
        }
    }

    /// Returns a reference to the underlying Tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The raw (stored-only) column for a field.
    pub fn raw_field(&self, kind: FieldKind) -> Field {
        self.raw[ordinal(kind)]
    }

    /// The normalized (indexed) column for a field.
    pub fn norm_field(&self, kind: FieldKind) -> Field {
        self.norm[ordinal(kind)]
    }
}

impl Default for IndexSchema {
    fn default() -> Self {
        Self::new()
    }
}

/// Builds the analyzer for normalized columns.
///
/// Column text is already accent- and case-folded before it reaches the
/// index, so the pipeline only splits words and lowercases query-side input
/// for safety. No stemming: matching is exact-word (or explicit prefix).
pub fn build_analyzer() -> TextAnalyzer {
    TextAnalyzer::builder(SimpleTokenizer::default())
        .filter(LowerCaser)
        .build()
}
