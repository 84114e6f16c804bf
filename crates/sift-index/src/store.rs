//! The persistent store.
//!
//! [`Store`] owns the Tantivy index directory. Point lookups (get / has /
//! mtime) run exact term queries on the path column; enumeration loads the
//! full doc set, which is fine at the embedded corpus sizes this engine
//! targets. A fresh reader is taken per call so every read observes the
//! latest commit.

use std::{collections::BTreeMap, fs, path::Path, sync::Arc};

use globset::Glob;
use serde::Serialize;
use tantivy::{
    Index, TantivyDocument,
    collector::{DocSetCollector, TopDocs},
    directory::MmapDirectory,
    query::{AllQuery, TermQuery},
    schema::{IndexRecordOption, Value},
};

use crate::{
    IndexError,
    record::DocumentRecord,
    schema::{IndexSchema, SIFT_TOKENIZER, build_analyzer},
    writer::StoreWriter,
};

/// Resolves stored document structures for snippet navigation.
///
/// Implemented by [`Store`] and by the index manager facade; snippets take
/// the source explicitly so they stay plain data.
pub trait StructureSource {
    /// Loads the record backing `path`, or `None` if it is not stored.
    fn load_document(&self, path: &str) -> Result<Option<Arc<DocumentRecord>>, IndexError>;
}

/// Handle to an open index directory.
pub struct Store {
    /// The Tantivy index.
    index: Index,
    /// Schema with field handles.
    schema: IndexSchema,
}

impl Store {
    /// Opens or creates the index at `dir`.
    pub fn open(dir: &Path) -> Result<Self, IndexError> {
        fs::create_dir_all(dir)?;

        let schema = IndexSchema::new();
        let mmap = MmapDirectory::open(dir).map_err(|e| {
            let err: tantivy::TantivyError = e.into();
            IndexError::open_index(dir.to_path_buf(), &err)
        })?;
        let index = Index::open_or_create(mmap, schema.schema().clone())
            .map_err(|e| IndexError::open_index(dir.to_path_buf(), &e))?;
        index.tokenizers().register(SIFT_TOKENIZER, build_analyzer());

        Ok(Self { index, schema })
    }

    /// The schema of this store.
    pub fn schema(&self) -> &IndexSchema {
        &self.schema
    }

    /// Creates a writer for this store.
    pub fn writer(&self) -> Result<StoreWriter, IndexError> {
        StoreWriter::new(&self.index, self.schema.clone())
    }

    /// A searcher over the latest committed state.
    pub(crate) fn searcher(&self) -> Result<tantivy::Searcher, IndexError> {
        let reader = self.index.reader().map_err(|e| IndexError::write(&e))?;
        Ok(reader.searcher())
    }

    /// Exact-match query on the path column.
    fn path_query(&self, path: &str) -> TermQuery {
        TermQuery::new(
            tantivy::Term::from_field_text(self.schema.path, path),
            IndexRecordOption::Basic,
        )
    }

    /// Loads the stored Tantivy document for a path.
    fn doc_for_path(&self, path: &str) -> Result<Option<TantivyDocument>, IndexError> {
        let searcher = self.searcher()?;
        let top = searcher
            .search(&self.path_query(path), &TopDocs::with_limit(1))
            .map_err(|e| IndexError::write(&e))?;

        match top.first() {
            Some((_, addr)) => {
                let doc = searcher.doc(*addr).map_err(|e| IndexError::write(&e))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    /// Loads the full record for a path.
    pub fn get(&self, path: &str) -> Result<Option<DocumentRecord>, IndexError> {
        match self.doc_for_path(path)? {
            Some(doc) => Ok(Some(DocumentRecord::from_tantivy(&doc, &self.schema)?)),
            None => Ok(None),
        }
    }

    /// True if a record with this path is stored.
    pub fn has(&self, path: &str) -> Result<bool, IndexError> {
        Ok(self.doc_for_path(path)?.is_some())
    }

    /// The stored mtime for a path: `None` if the document is absent,
    /// `Some(None)` if stored without an mtime.
    pub fn stored_mtime(&self, path: &str) -> Result<Option<Option<i64>>, IndexError> {
        Ok(self
            .doc_for_path(path)?
            .map(|doc| doc.get_first(self.schema.mtime).and_then(|v| v.as_i64())))
    }

    /// Number of stored documents.
    pub fn len(&self) -> Result<u64, IndexError> {
        Ok(self.searcher()?.num_docs())
    }

    /// True if the store holds no documents.
    pub fn is_empty(&self) -> Result<bool, IndexError> {
        Ok(self.len()? == 0)
    }

    /// Every stored record.
    pub fn all(&self) -> Result<Vec<DocumentRecord>, IndexError> {
        let searcher = self.searcher()?;
        let addresses = searcher
            .search(&AllQuery, &DocSetCollector)
            .map_err(|e| IndexError::write(&e))?;

        let mut records = Vec::with_capacity(addresses.len());
        for addr in addresses {
            let doc: TantivyDocument = searcher.doc(addr).map_err(|e| IndexError::write(&e))?;
            records.push(DocumentRecord::from_tantivy(&doc, &self.schema)?);
        }
        records.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(records)
    }

    /// All records whose path matches the glob pattern.
    pub fn matching(&self, pattern: &str) -> Result<Vec<DocumentRecord>, IndexError> {
        let glob = Glob::new(pattern)
            .map_err(|source| IndexError::Pattern {
                pattern: pattern.to_string(),
                source,
            })?
            .compile_matcher();

        Ok(self
            .all()?
            .into_iter()
            .filter(|r| glob.is_match(&r.path))
            .collect())
    }

    /// Per-tag document counts plus the total, optionally restricted to
    /// documents carrying `tag`.
    pub fn stats(&self, tag: Option<&str>) -> Result<StoreStats, IndexError> {
        let mut stats = StoreStats::default();
        for record in self.all()? {
            if let Some(tag) = tag
                && !record.tags.iter().any(|t| t == tag)
            {
                continue;
            }
            stats.documents += 1;
            stats.sections += record.outline.len();
            for t in &record.tags {
                *stats.by_tag.entry(t.clone()).or_insert(0) += 1;
            }
        }
        Ok(stats)
    }
}

/// Aggregate counts over the store.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StoreStats {
    /// Number of documents.
    pub documents: usize,
    /// Total number of sections across documents.
    pub sections: usize,
    /// Documents per tag.
    pub by_tag: BTreeMap<String, usize>,
}

impl StructureSource for Store {
    fn load_document(&self, path: &str) -> Result<Option<Arc<DocumentRecord>>, IndexError> {
        Ok(self.get(path)?.map(Arc::new))
    }
}
