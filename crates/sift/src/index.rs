//! The index manager.
//!
//! [`SearchIndex`] is the public facade: it orchestrates converters, the
//! structural parser and the persistent store. Indexing is sequential and
//! synchronous; every mutating call commits before returning, so a query
//! issued after `add` resolves sees the added documents. Per-file failures
//! during a directory add are logged and tallied, never fatal to the batch.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
    time::UNIX_EPOCH,
};

use uuid::Uuid;

use sift_config::Config;
use sift_document::{Converter, ConverterSet, ParseOptions, parse_markdown};
use sift_index::{
    DocumentRecord, ExtendOptions, IndexError, ScanOptions, SearchOptions, SearchResponse,
    SectionDetails, Snippet, Store, StoreStats, StructureSource, scan, section_details,
};

use crate::Error;

/// Filesystem timestamps can quantize; differences within this tolerance
/// count as unchanged.
const MTIME_TOLERANCE_MS: i64 = 1000;

/// Scheme prefix reserved for in-memory documents, disjoint from
/// filesystem paths.
const BUFFER_SCHEME: &str = "buffer://";

/// Detects the language of a document's text.
///
/// External collaborator: when registered, the returned code fills the
/// reserved language slot in the document's tags.
pub trait LanguageDetector {
    /// A short language code (e.g. "es"), or `None` when undetectable.
    fn detect(&self, text: &str) -> Option<String>;
}

/// Options for [`SearchIndex::add`].
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Tags attached to every indexed document.
    pub tags: Vec<String>,
    /// Exclusion globs for directory scans.
    pub exclude: Vec<String>,
    /// Whether directory scans descend into subdirectories.
    pub recursive: bool,
    /// Skip documents that are already stored.
    pub skip_existing: bool,
    /// Re-index documents even when already stored.
    pub update: bool,
    /// Re-index stored documents only when the source mtime moved.
    pub check_modified: bool,
}

impl Default for AddOptions {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            exclude: vec!["node_modules".to_string(), ".git".to_string()],
            recursive: true,
            skip_existing: true,
            update: false,
            check_modified: true,
        }
    }
}

/// Statistics from one add call.
#[derive(Debug, Clone, Default)]
pub struct AddStats {
    /// Documents written to the store.
    pub indexed: usize,
    /// Candidates skipped as already up to date.
    pub skipped: usize,
    /// Candidates that failed to convert or read.
    pub failed: usize,
    /// Per-file error messages for the failures.
    pub errors: Vec<(PathBuf, String)>,
}

/// Options for [`SearchIndex::get`].
#[derive(Debug, Clone)]
pub struct GetOptions {
    /// When set, clip the body to a window starting here.
    pub position: Option<usize>,
    /// Window length in bytes.
    pub length: usize,
}

impl Default for GetOptions {
    fn default() -> Self {
        Self {
            position: None,
            length: 5000,
        }
    }
}

/// The embedded search engine facade.
pub struct SearchIndex {
    /// Engine configuration.
    config: Config,
    /// Persistent store.
    store: Store,
    /// Converters keyed by extension.
    converters: ConverterSet,
    /// Optional language detection hook.
    detector: Option<Box<dyn LanguageDetector>>,
}

impl SearchIndex {
    /// Opens (or creates) the engine described by `config`.
    pub fn open(config: Config) -> Result<Self, Error> {
        config.validate()?;
        let store = Store::open(&config.db_path)?;
        Ok(Self {
            config,
            store,
            converters: ConverterSet::builtin(),
            detector: None,
        })
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Registers a converter for a file extension (e.g. "epub").
    pub fn register_converter(&mut self, extension: &str, converter: Box<dyn Converter>) {
        self.converters.register(extension, converter);
    }

    /// Installs the language detection hook.
    pub fn set_language_detector(&mut self, detector: Box<dyn LanguageDetector>) {
        self.detector = Some(detector);
    }

    /// Indexes a file or a directory of files.
    ///
    /// Directory adds process candidates in scan order; a failing file is
    /// logged and counted, the batch continues. A failing single-file add
    /// surfaces its error.
    pub fn add(&mut self, input: &Path, options: &AddOptions) -> Result<AddStats, Error> {
        if !input.exists() {
            return Err(Error::InputNotFound(input.to_path_buf()));
        }

        let mut stats = AddStats::default();

        if input.is_dir() {
            let scan_options = ScanOptions {
                exclude: options.exclude.clone(),
                recursive: options.recursive,
            };
            let extensions = self.converters.extensions();
            let candidates = scan(input, &scan_options, &extensions)?;

            for candidate in candidates {
                match self.add_file(&candidate, options) {
                    Ok(true) => stats.indexed += 1,
                    Ok(false) => stats.skipped += 1,
                    Err(error) => {
                        tracing::warn!(path = %candidate.display(), %error, "skipping file");
                        stats.failed += 1;
                        stats.errors.push((candidate, error.to_string()));
                    }
                }
            }
        } else {
            let extension = extension_of(input);
            if !self.converters.supports(&extension) {
                return Err(Error::UnsupportedFormat(input.to_path_buf()));
            }
            if self.add_file(input, options)? {
                stats.indexed += 1;
            } else {
                stats.skipped += 1;
            }
        }

        Ok(stats)
    }

    /// Indexes an in-memory buffer under a fresh `buffer://` path.
    ///
    /// Returns the synthesized path; buffers carry no mtime and are always
    /// indexed as new records.
    pub fn add_buffer(&mut self, bytes: &[u8], options: &AddOptions) -> Result<String, Error> {
        let path = format!("{BUFFER_SCHEME}{}", Uuid::new_v4());
        let converter = self
            .converters
            .get("md")
            .ok_or_else(|| Error::UnsupportedFormat(PathBuf::from(&path)))?;
        let markdown = converter.convert(bytes).map_err(|e| Error::Converter {
            path: PathBuf::from(&path),
            message: e.to_string(),
        })?;

        self.index_markdown(&path, &markdown, &options.tags, None)?;
        Ok(path)
    }

    /// Converts and indexes one file. Returns false when skipped.
    fn add_file(&mut self, path: &Path, options: &AddOptions) -> Result<bool, Error> {
        let abs = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
        let key = abs.to_string_lossy().into_owned();
        let mtime = file_mtime_ms(&abs);

        if self.store.has(&key)? && !options.update {
            if options.check_modified {
                let unchanged = match (self.store.stored_mtime(&key)?, mtime) {
                    (Some(Some(stored)), Some(current)) => {
                        (current - stored).abs() <= MTIME_TOLERANCE_MS
                    }
                    // Stored without an mtime: treat as stale.
                    _ => false,
                };
                if unchanged {
                    return Ok(false);
                }
            } else if options.skip_existing {
                return Ok(false);
            }
        }

        let extension = extension_of(&abs);
        let converter = self
            .converters
            .get(&extension)
            .ok_or_else(|| Error::UnsupportedFormat(abs.clone()))?;

        let bytes = fs::read(&abs).map_err(|source| Error::ReadFile {
            path: abs.clone(),
            source,
        })?;
        let markdown = converter.convert(&bytes).map_err(|e| Error::Converter {
            path: abs.clone(),
            message: e.to_string(),
        })?;

        self.index_markdown(&key, &markdown, &options.tags, mtime)?;
        Ok(true)
    }

    /// Parses Markdown and writes the record in one commit.
    fn index_markdown(
        &mut self,
        path: &str,
        markdown: &str,
        tags: &[String],
        mtime: Option<i64>,
    ) -> Result<(), Error> {
        let parsed = parse_markdown(
            markdown,
            ParseOptions {
                include_code_blocks: self.config.include_code_blocks,
            },
        );

        let mut tags = tags.to_vec();
        if let Some(detector) = &self.detector
            && let Some(language) = detector.detect(markdown)
            && !tags.contains(&language)
        {
            tags.push(language);
        }

        let record = DocumentRecord::build(path, markdown, parsed, tags, mtime);
        let mut writer = self.store.writer()?;
        writer.upsert(&record)?;
        writer.commit()?;
        Ok(())
    }

    /// Runs a query with explicit options.
    pub fn search(&self, query: &str, options: &SearchOptions) -> Result<SearchResponse, Error> {
        Ok(self.store.search(query, options, &self.config.weights)?)
    }

    /// Search options seeded from the configured defaults.
    pub fn search_options(&self) -> SearchOptions {
        SearchOptions::with_defaults(&self.config.search)
    }

    /// Loads a stored record, optionally with the body clipped to a window.
    pub fn get(&self, path: &str, options: &GetOptions) -> Result<Option<DocumentRecord>, Error> {
        let mut record = self.store.get(path)?;
        if let Some(record) = record.as_mut()
            && let Some(position) = options.position
        {
            record.clip_body(position, options.length);
        }
        Ok(record)
    }

    /// All records whose path matches the glob pattern.
    pub fn get_multiple(&self, pattern: &str) -> Result<Vec<DocumentRecord>, Error> {
        Ok(self.store.matching(pattern)?)
    }

    /// Detail view of one section of one document.
    ///
    /// Unknown documents and unknown ids both yield `None`.
    pub fn get_heading_by_id(
        &self,
        path: &str,
        heading_id: &str,
    ) -> Result<Option<SectionDetails>, Error> {
        let Some(record) = self.store.get(path)? else {
            return Ok(None);
        };
        Ok(record
            .outline
            .section(heading_id)
            .map(|section| section_details(&record, section)))
    }

    /// True if a record with this path is stored.
    pub fn has_document(&self, path: &str) -> Result<bool, Error> {
        Ok(self.store.has(path)?)
    }

    /// Removes one document. Returns whether it was present.
    pub fn remove_document(&mut self, path: &str) -> Result<bool, Error> {
        let existed = self.store.has(path)?;
        if existed {
            let mut writer = self.store.writer()?;
            writer.delete_path(path);
            writer.commit()?;
        }
        Ok(existed)
    }

    /// Removes every document carrying the tag. Returns how many there were.
    pub fn remove_by_tag(&mut self, tag: &str) -> Result<usize, Error> {
        let count = self.store.stats(Some(tag))?.documents;
        if count > 0 {
            let mut writer = self.store.writer()?;
            writer.delete_tag(tag);
            writer.commit()?;
        }
        Ok(count)
    }

    /// Removes all documents.
    pub fn clear(&mut self) -> Result<(), Error> {
        let mut writer = self.store.writer()?;
        writer.delete_all()?;
        writer.commit()?;
        Ok(())
    }

    /// Aggregate counts, optionally restricted to one tag.
    pub fn stats(&self, tag: Option<&str>) -> Result<StoreStats, Error> {
        Ok(self.store.stats(tag)?)
    }

    /// Closes the engine. All writes are already committed; this exists for
    /// API symmetry with `open`.
    pub fn close(self) -> Result<(), Error> {
        Ok(())
    }

    /// Extended text for a snippet (see [`Snippet::extended_text`]).
    pub fn snippet_text(
        &self,
        snippet: &Snippet,
        options: ExtendOptions,
    ) -> Result<String, Error> {
        Ok(snippet.extended_text(&self.store, options)?)
    }
}

impl StructureSource for SearchIndex {
    fn load_document(&self, path: &str) -> Result<Option<Arc<DocumentRecord>>, IndexError> {
        self.store.load_document(path)
    }
}

/// Lowercase extension of a path, empty when absent.
fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Modification time of a file in milliseconds since the epoch.
fn file_mtime_ms(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let millis = modified.duration_since(UNIX_EPOCH).ok()?.as_millis();
    i64::try_from(millis).ok()
}
