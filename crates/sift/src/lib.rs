//! sift: embedded full-text search over structured text documents.
//!
//! sift indexes Markdown (and anything a registered converter can turn into
//! Markdown), extracts each document's heading hierarchy, and answers
//! ranked queries with in-context snippets that navigate back into that
//! hierarchy.
//!
//! # Indexing and searching
//!
//! ```no_run
//! use sift::{AddOptions, Config, SearchIndex};
//!
//! # fn main() -> Result<(), sift::Error> {
//! let mut index = SearchIndex::open(Config::default())?;
//! index.add("./docs".as_ref(), &AddOptions::default())?;
//!
//! let results = index.search("title:guia OR mediterraneo", &index.search_options())?;
//! for snippet in &results.results {
//!     println!("{}: {}", snippet.document_path, snippet.text);
//!     println!("  {}", snippet.breadcrumbs_text(&index, None)?);
//! }
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod error;
mod index;

pub use error::Error;
pub use index::{AddOptions, AddStats, GetOptions, LanguageDetector, SearchIndex};

pub use sift_config::{Config, SearchDefaults, Weights};
pub use sift_document::{
    BlockKind, ContentBlock, Converter, ConverterSet, FieldKind, Outline, Section,
    SectionSummary, Span,
};
pub use sift_index::{
    DocumentRecord, ExtendOptions, HeadingRef, ScanOptions, SearchOptions, SearchResponse,
    SectionDetails, Snippet, StoreStats, StructureSource,
};
