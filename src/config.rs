//! Explorer configuration.
//!
//! Loaded from TOML. Malformed documents are errors; well-formed but
//! out-of-range index parameters fall back to their defaults.

use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::Result;
use crate::oracle::{
    OracleConfig, SuffixKind, DEFAULT_INCLUDE_DENSE, DEFAULT_SPARSE_DENSE_RATIO,
    DEFAULT_SUFFIX_LEN, MAX_SUFFIX_LEN,
};

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub index: IndexSettings,
    pub display: DisplaySettings,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn oracle_config(&self) -> OracleConfig {
        self.index.validate()
    }
}

/// Which suffix flavors to store; both selected means mixed suffixes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixFlag {
    Hash,
    Real,
}

/// Unvalidated index parameters as a user supplied them.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct IndexSettings {
    pub include_dense: bool,
    pub sparse_dense_ratio: i64,
    pub suffix: Vec<SuffixFlag>,
    pub suffix_len: i64,
}

impl Default for IndexSettings {
    fn default() -> Self {
        Self {
            include_dense: DEFAULT_INCLUDE_DENSE,
            sparse_dense_ratio: i64::from(DEFAULT_SPARSE_DENSE_RATIO),
            suffix: Vec::new(),
            suffix_len: i64::from(DEFAULT_SUFFIX_LEN),
        }
    }
}

impl IndexSettings {
    /// Parse a ratio typed as text. Unparseable text yields the default.
    pub fn parse_ratio(text: &str) -> i64 {
        text.trim()
            .parse()
            .unwrap_or(i64::from(DEFAULT_SPARSE_DENSE_RATIO))
    }

    /// Parse a suffix length typed as text. Unparseable text yields the default.
    pub fn parse_suffix_len(text: &str) -> i64 {
        text.trim().parse().unwrap_or(i64::from(DEFAULT_SUFFIX_LEN))
    }

    pub fn suffix_kind(&self) -> SuffixKind {
        SuffixKind::from_flags(
            self.suffix.contains(&SuffixFlag::Hash),
            self.suffix.contains(&SuffixFlag::Real),
        )
    }

    pub fn validate(&self) -> OracleConfig {
        let sparse_dense_ratio = match u32::try_from(self.sparse_dense_ratio) {
            Ok(ratio) => ratio,
            Err(_) => {
                warn!(
                    value = self.sparse_dense_ratio,
                    default = DEFAULT_SPARSE_DENSE_RATIO,
                    "sparse_dense_ratio out of range, using default"
                );
                DEFAULT_SPARSE_DENSE_RATIO
            }
        };

        let suffix_len = match u32::try_from(self.suffix_len) {
            Ok(len) if (1..=MAX_SUFFIX_LEN).contains(&len) => len,
            _ => {
                warn!(
                    value = self.suffix_len,
                    default = DEFAULT_SUFFIX_LEN,
                    "suffix_len out of range, using default"
                );
                DEFAULT_SUFFIX_LEN
            }
        };

        OracleConfig {
            include_dense: self.include_dense,
            sparse_dense_ratio,
            suffix_kind: self.suffix_kind(),
            suffix_len,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplaySettings {
    /// Bits between separators in rendered bitstrings; 0 disables grouping.
    pub group_size: usize,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self { group_size: 8 }
    }
}
