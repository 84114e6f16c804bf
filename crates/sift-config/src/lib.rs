//! Configuration for the sift search engine.
//!
//! A [`Config`] is normally built programmatically with [`Config::default`]
//! plus field updates, or loaded from a TOML file with [`Config::load`].
//! All defaults are exposed as constants so embedders and the CLI can
//! reference them in help text.

#![warn(missing_docs)]

mod error;
mod parse;

use std::path::{Path, PathBuf};

pub use error::ConfigError;
pub use parse::{RawConfig, RawSearchDefaults, RawWeights, parse_file, parse_toml, resolve};

/// Default index directory.
pub const DEFAULT_DB_PATH: &str = "./db/sift";

/// Default setting for indexing fenced code blocks (Config.include_code_blocks).
pub const DEFAULT_INCLUDE_CODE_BLOCKS: bool = false;

/// Default maximum results for search (SearchDefaults.limit).
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Default snippet context window in characters (SearchDefaults.snippet_length).
pub const DEFAULT_SNIPPET_LENGTH: usize = 160;

/// Default maximum snippets per document (SearchDefaults.snippets_per_doc).
pub const DEFAULT_SNIPPETS_PER_DOC: usize = 5;

/// Default ranking weight of the title column.
pub const DEFAULT_WEIGHT_TITLE: f32 = 10.0;

/// Default ranking weight of the body column.
pub const DEFAULT_WEIGHT_BODY: f32 = 1.0;

/// Default ranking weights of the h1..h6 columns, by level.
pub const DEFAULT_WEIGHT_HEADINGS: [f32; 6] = [9.0, 7.0, 5.0, 3.0, 2.0, 1.5];

/// Engine configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the persistent index.
    pub db_path: PathBuf,
    /// Whether fenced code blocks contribute to the body projection and to
    /// section content.
    pub include_code_blocks: bool,
    /// Per-field ranking weights.
    pub weights: Weights,
    /// Search defaults applied when a query omits an option.
    pub search: SearchDefaults,
}

/// Per-field BM25 weights.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    /// Weight of the title column.
    pub title: f32,
    /// Weight of the h1 column.
    pub h1: f32,
    /// Weight of the h2 column.
    pub h2: f32,
    /// Weight of the h3 column.
    pub h3: f32,
    /// Weight of the h4 column.
    pub h4: f32,
    /// Weight of the h5 column.
    pub h5: f32,
    /// Weight of the h6 column.
    pub h6: f32,
    /// Weight of the body column.
    pub body: f32,
}

/// Defaults applied to search options the caller leaves unset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchDefaults {
    /// Maximum results per query.
    pub limit: usize,
    /// Snippet context window in characters.
    pub snippet_length: usize,
    /// Maximum snippets extracted per document.
    pub snippets_per_doc: usize,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            title: DEFAULT_WEIGHT_TITLE,
            h1: DEFAULT_WEIGHT_HEADINGS[0],
            h2: DEFAULT_WEIGHT_HEADINGS[1],
            h3: DEFAULT_WEIGHT_HEADINGS[2],
            h4: DEFAULT_WEIGHT_HEADINGS[3],
            h5: DEFAULT_WEIGHT_HEADINGS[4],
            h6: DEFAULT_WEIGHT_HEADINGS[5],
            body: DEFAULT_WEIGHT_BODY,
        }
    }
}

impl Weights {
    /// Weight of the heading column at `level` (1-6).
    pub fn heading(&self, level: u8) -> f32 {
        match level {
            1 => self.h1,
            2 => self.h2,
            3 => self.h3,
            4 => self.h4,
            5 => self.h5,
            _ => self.h6,
        }
    }

    /// All weights paired with their field names, title first, body last.
    pub fn entries(&self) -> [(&'static str, f32); 8] {
        [
            ("title", self.title),
            ("h1", self.h1),
            ("h2", self.h2),
            ("h3", self.h3),
            ("h4", self.h4),
            ("h5", self.h5),
            ("h6", self.h6),
            ("body", self.body),
        ]
    }
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            limit: DEFAULT_SEARCH_LIMIT,
            snippet_length: DEFAULT_SNIPPET_LENGTH,
            snippets_per_doc: DEFAULT_SNIPPETS_PER_DOC,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            include_code_blocks: DEFAULT_INCLUDE_CODE_BLOCKS,
            weights: Weights::default(),
            search: SearchDefaults::default(),
        }
    }
}

impl Config {
    /// Loads a configuration from a TOML file, applying defaults for any
    /// field the file does not set, and validates it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let config = resolve(parse_file(path)?);
        config.validate()?;
        Ok(config)
    }

    /// Checks invariants: positive weights and non-zero search defaults.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in self.weights.entries() {
            if value <= 0.0 {
                return Err(ConfigError::NonPositiveWeight { field, value });
            }
        }
        if self.search.limit == 0 {
            return Err(ConfigError::ZeroSearchSetting { setting: "limit" });
        }
        if self.search.snippet_length == 0 {
            return Err(ConfigError::ZeroSearchSetting {
                setting: "snippet_length",
            });
        }
        if self.search.snippets_per_doc == 0 {
            return Err(ConfigError::ZeroSearchSetting {
                setting: "snippets_per_doc",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn default_weights_match_constants() {
        let weights = Weights::default();
        assert!((weights.title - 10.0).abs() < f32::EPSILON);
        assert!((weights.heading(1) - 9.0).abs() < f32::EPSILON);
        assert!((weights.heading(6) - 1.5).abs() < f32::EPSILON);
        assert!((weights.body - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn default_config_is_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn rejects_non_positive_weight() {
        let mut config = Config::default();
        config.weights.h3 = 0.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("h3"));
    }

    #[test]
    fn rejects_zero_limit() {
        let mut config = Config::default();
        config.search.limit = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("limit"));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        fs::write(&path, "db_path = \"custom/index\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.db_path, PathBuf::from("custom/index"));
        assert_eq!(config.search.limit, DEFAULT_SEARCH_LIMIT);
    }

    #[test]
    fn load_rejects_invalid_weight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sift.toml");
        fs::write(&path, "[weights]\nbody = -1.0\n").unwrap();

        assert!(Config::load(&path).is_err());
    }
}
