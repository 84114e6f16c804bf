//! Index writer for mutating the persistent store.
//!
//! All mutations go through a [`StoreWriter`] and become visible atomically
//! at [`StoreWriter::commit`]. Replacing a document is delete-then-add under
//! the same path inside one commit, so readers never observe a
//! half-indexed document.

use tantivy::{Index, IndexWriter as TantivyIndexWriter, Term};

use crate::{IndexError, record::DocumentRecord, schema::IndexSchema};

/// Default heap size for the index writer (30 MB).
const DEFAULT_HEAP_SIZE: usize = 30_000_000;

/// Writes documents to the store.
pub struct StoreWriter {
    /// The underlying Tantivy writer.
    writer: TantivyIndexWriter,
    /// Schema with field handles.
    schema: IndexSchema,
}

impl StoreWriter {
    /// Creates a writer for an open index.
    pub(crate) fn new(index: &Index, schema: IndexSchema) -> Result<Self, IndexError> {
        let writer = index
            .writer(DEFAULT_HEAP_SIZE)
            .map_err(|e| IndexError::write(&e))?;
        Ok(Self { writer, schema })
    }

    /// Inserts a record, replacing any existing record with the same path.
    #[allow(clippy::needless_pass_by_ref_mut)] // Semantic mutability - Tantivy uses interior mutability
    pub fn upsert(&mut self, record: &DocumentRecord) -> Result<(), IndexError> {
        let term = Term::from_field_text(self.schema.path, &record.path);
        self.writer.delete_term(term);

        let doc = record.to_tantivy(&self.schema)?;
        self.writer
            .add_document(doc)
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Deletes the record with the given path, if present.
    #[allow(clippy::needless_pass_by_ref_mut)] // Semantic mutability - Tantivy uses interior mutability
    pub fn delete_path(&mut self, path: &str) {
        let term = Term::from_field_text(self.schema.path, path);
        self.writer.delete_term(term);
    }

    /// Deletes every record carrying the given tag.
    #[allow(clippy::needless_pass_by_ref_mut)] // Semantic mutability - Tantivy uses interior mutability
    pub fn delete_tag(&mut self, tag: &str) {
        let term = Term::from_field_text(self.schema.tag_filter, tag);
        self.writer.delete_term(term);
    }

    /// Deletes all records.
    #[allow(clippy::needless_pass_by_ref_mut)] // Semantic mutability - Tantivy uses interior mutability
    pub fn delete_all(&mut self) -> Result<(), IndexError> {
        self.writer
            .delete_all_documents()
            .map_err(|e| IndexError::write(&e))?;
        Ok(())
    }

    /// Commits all pending changes, making them visible to readers.
    pub fn commit(&mut self) -> Result<(), IndexError> {
        self.writer.commit().map_err(|e| IndexError::commit(&e))?;
        Ok(())
    }
}
