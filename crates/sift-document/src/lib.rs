//! Markdown structural parsing for sift.
//!
//! This crate turns Markdown text into the structures the index stores and
//! navigates:
//! - A forest of heading [`Section`]s with a flat per-document id map
//! - Per-field text projections (title, h1..h6, body)
//! - Content blocks (paragraphs, lists, code, quotes, tables) with byte
//!   spans into the original text
//!
//! It also defines the [`Converter`] contract that normalizes non-Markdown
//! sources to Markdown before parsing.

#![warn(missing_docs)]

mod convert;
mod error;
mod field;
mod parse;
mod section;

pub use convert::{
    ConvertError, Converter, ConverterSet, MarkdownConverter, PlainTextConverter,
};
pub use error::DocumentError;
pub use field::FieldKind;
pub use parse::{ParseOptions, ParsedDocument, Projections, parse_markdown};
pub use section::{BlockKind, ContentBlock, Outline, Section, SectionSummary, Span};
