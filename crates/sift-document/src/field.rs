//! The searchable-field sum type.
//!
//! One variant per addressable column. The parser, storage layer, snippet
//! extractor and snippet output all speak this type instead of passing
//! heading depths around as integers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A searchable field of a document record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    /// The document title (first h1 or supplied title).
    Title,
    /// Level-1 headings after the first.
    H1,
    /// Level-2 headings.
    H2,
    /// Level-3 headings.
    H3,
    /// Level-4 headings.
    H4,
    /// Level-5 headings.
    H5,
    /// Level-6 headings.
    H6,
    /// The document body. Also the kind of the synthetic root section that
    /// owns content preceding the first heading.
    Body,
}

impl FieldKind {
    /// All fields in extraction order: title first, body last.
    pub const ALL: [Self; 8] = [
        Self::Title,
        Self::H1,
        Self::H2,
        Self::H3,
        Self::H4,
        Self::H5,
        Self::H6,
        Self::Body,
    ];

    /// The field for a heading of `level` (clamped to 1-6).
    pub fn heading(level: u8) -> Self {
        match level {
            0 | 1 => Self::H1,
            2 => Self::H2,
            3 => Self::H3,
            4 => Self::H4,
            5 => Self::H5,
            _ => Self::H6,
        }
    }

    /// The heading level (1-6) for heading fields, `None` otherwise.
    pub fn level(self) -> Option<u8> {
        match self {
            Self::H1 => Some(1),
            Self::H2 => Some(2),
            Self::H3 => Some(3),
            Self::H4 => Some(4),
            Self::H5 => Some(5),
            Self::H6 => Some(6),
            Self::Title | Self::Body => None,
        }
    }

    /// Lowercase name used in query syntax, snippet output and storage
    /// column names.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::H1 => "h1",
            Self::H2 => "h2",
            Self::H3 => "h3",
            Self::H4 => "h4",
            Self::H5 => "h5",
            Self::H6 => "h6",
            Self::Body => "body",
        }
    }

    /// Parses a field name as accepted in query syntax.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "title" => Some(Self::Title),
            "h1" => Some(Self::H1),
            "h2" => Some(Self::H2),
            "h3" => Some(Self::H3),
            "h4" => Some(Self::H4),
            "h5" => Some(Self::H5),
            "h6" => Some(Self::H6),
            "body" => Some(Self::Body),
            _ => None,
        }
    }

    /// True for the six heading variants.
    pub fn is_heading(self) -> bool {
        self.level().is_some()
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
