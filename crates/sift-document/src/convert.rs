//! The converter contract.
//!
//! Non-Markdown sources are normalized to Markdown text by converters keyed
//! on the lowercase file extension. Markdown and plain text converters are
//! built in; richer formats (epub, pdf, srt) are external collaborators that
//! embedders register through [`ConverterSet::register`]. A converter
//! failure is never fatal to a batch: the indexer skips the file.

use std::collections::HashMap;
use std::str;

use thiserror::Error;

/// Error produced by a converter.
#[derive(Debug, Error)]
pub enum ConvertError {
    /// The input bytes are not valid UTF-8.
    #[error("input is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] str::Utf8Error),

    /// The converter rejected the input.
    #[error("{0}")]
    Rejected(String),
}

/// Converts source bytes of one format into Markdown text.
pub trait Converter {
    /// Converts `bytes` to Markdown.
    fn convert(&self, bytes: &[u8]) -> Result<String, ConvertError>;
}

/// Passes Markdown sources through unchanged.
pub struct MarkdownConverter;

impl Converter for MarkdownConverter {
    fn convert(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        Ok(str::from_utf8(bytes)?.to_string())
    }
}

/// Treats plain text as Markdown (paragraphs split on blank lines).
pub struct PlainTextConverter;

impl Converter for PlainTextConverter {
    fn convert(&self, bytes: &[u8]) -> Result<String, ConvertError> {
        Ok(str::from_utf8(bytes)?.to_string())
    }
}

/// Registry of converters keyed by lowercase file extension.
pub struct ConverterSet {
    converters: HashMap<String, Box<dyn Converter>>,
}

impl ConverterSet {
    /// A registry with the built-in Markdown and plain text converters.
    pub fn builtin() -> Self {
        let mut set = Self {
            converters: HashMap::new(),
        };
        set.register("md", Box::new(MarkdownConverter));
        set.register("markdown", Box::new(MarkdownConverter));
        set.register("txt", Box::new(PlainTextConverter));
        set
    }

    /// Registers (or replaces) the converter for an extension.
    pub fn register(&mut self, extension: &str, converter: Box<dyn Converter>) {
        self.converters
            .insert(extension.to_lowercase(), converter);
    }

    /// The converter for an extension, if registered.
    pub fn get(&self, extension: &str) -> Option<&dyn Converter> {
        self.converters
            .get(&extension.to_lowercase())
            .map(AsRef::as_ref)
    }

    /// True if a converter is registered for the extension.
    pub fn supports(&self, extension: &str) -> bool {
        self.converters.contains_key(&extension.to_lowercase())
    }

    /// Registered extensions, sorted.
    pub fn extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for ConverterSet {
    fn default() -> Self {
        Self::builtin()
    }
}
