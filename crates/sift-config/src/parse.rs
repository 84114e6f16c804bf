//! Configuration file parsing.
//!
//! Parses a sift TOML file into intermediate raw structures that preserve
//! the optional nature of every field, then resolves them against the
//! built-in defaults.

use std::{fs, path::Path};

use serde::Deserialize;

use crate::{Config, ConfigError, SearchDefaults, Weights};

/// Raw configuration as parsed directly from a TOML file.
///
/// All fields are optional so a partial file only overrides what it names.
/// This mirrors the TOML schema exactly.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawConfig {
    /// Path of the index directory.
    pub db_path: Option<String>,
    /// Whether fenced code blocks are indexed and attached to sections.
    pub include_code_blocks: Option<bool>,
    /// Per-field ranking weights.
    pub weights: Option<RawWeights>,
    /// Search defaults section.
    pub search: Option<RawSearchDefaults>,
}

/// Raw per-field weights.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawWeights {
    /// Weight of the title column.
    pub title: Option<f32>,
    /// Weight of the h1 column.
    pub h1: Option<f32>,
    /// Weight of the h2 column.
    pub h2: Option<f32>,
    /// Weight of the h3 column.
    pub h3: Option<f32>,
    /// Weight of the h4 column.
    pub h4: Option<f32>,
    /// Weight of the h5 column.
    pub h5: Option<f32>,
    /// Weight of the h6 column.
    pub h6: Option<f32>,
    /// Weight of the body column.
    pub body: Option<f32>,
}

/// Raw search defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RawSearchDefaults {
    /// Maximum results per query.
    pub limit: Option<usize>,
    /// Snippet context window in characters.
    pub snippet_length: Option<usize>,
    /// Maximum snippets extracted per document.
    pub snippets_per_doc: Option<usize>,
}

/// Parses a TOML string into a raw configuration.
pub fn parse_toml(content: &str, path: &Path) -> Result<RawConfig, ConfigError> {
    toml::from_str(content).map_err(|source| ConfigError::ParseToml {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads and parses a configuration file.
pub fn parse_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_toml(&content, path)
}

/// Resolves a raw configuration against the defaults.
pub fn resolve(raw: RawConfig) -> Config {
    let defaults = Config::default();
    let weights = raw.weights.unwrap_or_default();
    let search = raw.search.unwrap_or_default();

    Config {
        db_path: raw.db_path.map_or(defaults.db_path, Into::into),
        include_code_blocks: raw
            .include_code_blocks
            .unwrap_or(defaults.include_code_blocks),
        weights: Weights {
            title: weights.title.unwrap_or(defaults.weights.title),
            h1: weights.h1.unwrap_or(defaults.weights.h1),
            h2: weights.h2.unwrap_or(defaults.weights.h2),
            h3: weights.h3.unwrap_or(defaults.weights.h3),
            h4: weights.h4.unwrap_or(defaults.weights.h4),
            h5: weights.h5.unwrap_or(defaults.weights.h5),
            h6: weights.h6.unwrap_or(defaults.weights.h6),
            body: weights.body.unwrap_or(defaults.weights.body),
        },
        search: SearchDefaults {
            limit: search.limit.unwrap_or(defaults.search.limit),
            snippet_length: search
                .snippet_length
                .unwrap_or(defaults.search.snippet_length),
            snippets_per_doc: search
                .snippets_per_doc
                .unwrap_or(defaults.search.snippets_per_doc),
        },
    }
}
