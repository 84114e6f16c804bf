//! Tantivy-backed persistent full-text store for sift.
//!
//! This crate owns everything between the parsed document and the ranked
//! result:
//! - Schema and record storage: raw + normalized columns per field, section
//!   tree blobs, tags, mtime ([`Store`], [`StoreWriter`])
//! - Query rewriting and compilation to weighted engine queries
//! - Search execution with tag filtering and counting
//! - Snippet extraction and lazy navigation over the section tree
//! - Directory scanning for batch indexing

#![warn(missing_docs)]

mod discovery;
mod error;
mod navigate;
mod query;
mod record;
mod schema;
mod search;
mod snippet;
mod store;
mod writer;

pub use discovery::{ScanOptions, scan};
pub use error::IndexError;
pub use navigate::{ExtendOptions, SectionDetails, section_details};
pub use query::{CompileError, QueryCompiler, rewrite};
pub use record::{DocumentRecord, FieldTexts};
pub use schema::{IndexSchema, SIFT_TOKENIZER, UNTAGGED, build_analyzer};
pub use search::{SearchOptions, SearchResponse};
pub use snippet::{HeadingRef, Snippet};
pub use store::{Store, StoreStats, StructureSource};
pub use writer::StoreWriter;
