//! The index oracle seam.
//!
//! The succinct range filter itself lives outside this crate. It is consumed
//! through [`IndexOracle`]: approximate membership answers (no false
//! negatives, possibly false positives) and, optionally, the raw per-level
//! arrays of its encoding for inspection.
//!
//! [`FstOracle`] is an exact stand-in backed by an FST set. It never reports
//! false positives and exposes no layout.

use fst::{IntoStreamer, Set, Streamer};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::RangeQuery;

// =============================================================================
// Configuration
// =============================================================================

pub const DEFAULT_INCLUDE_DENSE: bool = true;
pub const DEFAULT_SPARSE_DENSE_RATIO: u32 = 16;
pub const DEFAULT_SUFFIX_LEN: u32 = 8;
pub const MAX_SUFFIX_LEN: u32 = 64;

/// What the index stores after each key's unique prefix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuffixKind {
    #[default]
    None,
    Hash,
    Real,
    Mixed,
}

impl SuffixKind {
    pub fn from_flags(hash: bool, real: bool) -> Self {
        match (hash, real) {
            (true, true) => SuffixKind::Mixed,
            (true, false) => SuffixKind::Hash,
            (false, true) => SuffixKind::Real,
            (false, false) => SuffixKind::None,
        }
    }
}

/// Validated index construction parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct OracleConfig {
    pub include_dense: bool,
    pub sparse_dense_ratio: u32,
    pub suffix_kind: SuffixKind,
    /// Always within `1..=MAX_SUFFIX_LEN`.
    pub suffix_len: u32,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            include_dense: DEFAULT_INCLUDE_DENSE,
            sparse_dense_ratio: DEFAULT_SPARSE_DENSE_RATIO,
            suffix_kind: SuffixKind::None,
            suffix_len: DEFAULT_SUFFIX_LEN,
        }
    }
}

impl OracleConfig {
    pub fn hash_suffix_len(&self) -> u32 {
        match self.suffix_kind {
            SuffixKind::Hash | SuffixKind::Mixed => self.suffix_len,
            SuffixKind::None | SuffixKind::Real => 0,
        }
    }

    pub fn real_suffix_len(&self) -> u32 {
        match self.suffix_kind {
            SuffixKind::Real | SuffixKind::Mixed => self.suffix_len,
            SuffixKind::None | SuffixKind::Hash => 0,
        }
    }
}

// =============================================================================
// Layout
// =============================================================================

/// Raw arrays of a built index, one inner vector per trie level.
///
/// Arrays of 64-bit words are carried as pairs of 32-bit values (high word
/// first), see [`crate::bits::unpack_nested64`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexLayout {
    pub labels: Vec<Vec<u32>>,
    pub bitmap_labels: Vec<Vec<u32>>,
    pub bitmap_child_indicator_bits: Vec<Vec<u32>>,
    pub prefixkey_indicator_bits: Vec<Vec<u32>>,
    pub child_indicator_bits: Vec<Vec<u32>>,
    pub louds_bits: Vec<Vec<u32>>,
    pub suffixes: Vec<Vec<u32>>,
    pub suffix_counts: Vec<u32>,
    pub node_counts: Vec<u32>,
    pub height: u32,
    pub sparse_start_level: u32,
    /// Bits per stored suffix (hash plus real).
    pub suffix_len: u32,
    pub serialized_size: u64,
    pub memory_usage: u64,
}

// =============================================================================
// Oracle traits
// =============================================================================

/// An approximate membership index over a key set.
pub trait IndexOracle {
    /// Point membership. Never false for a key that was indexed.
    fn lookup_key(&self, key: &[u8]) -> bool;

    /// Whether some key may fall within `query`. Not authoritative: callers
    /// that need the matching keys use [`crate::query::exact_range`].
    fn lookup_range(&self, query: &RangeQuery) -> bool;

    fn layout(&self) -> Option<&IndexLayout> {
        None
    }
}

/// Builds an oracle for a non-empty, normalized key set.
pub trait OracleBuilder {
    type Oracle: IndexOracle;

    fn build(&self, keys: &[String], config: &OracleConfig) -> Result<Self::Oracle>;
}

// =============================================================================
// FST-backed reference oracle
// =============================================================================

/// Exact oracle over an FST set.
pub struct FstOracle {
    set: Set<Vec<u8>>,
}

impl FstOracle {
    /// Keys must be sorted and unique.
    pub fn from_sorted<K: AsRef<[u8]>>(keys: &[K]) -> Result<Self> {
        let set = Set::from_iter(keys.iter().map(|k| k.as_ref()))?;
        Ok(Self { set })
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }
}

impl IndexOracle for FstOracle {
    fn lookup_key(&self, key: &[u8]) -> bool {
        self.set.contains(key)
    }

    fn lookup_range(&self, query: &RangeQuery) -> bool {
        let range = self.set.range();
        let range = if query.begin_inclusive {
            range.ge(&query.begin)
        } else {
            range.gt(&query.begin)
        };
        let range = if query.end_inclusive {
            range.le(&query.end)
        } else {
            range.lt(&query.end)
        };
        let mut stream = range.into_stream();
        stream.next().is_some()
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FstOracleBuilder;

impl OracleBuilder for FstOracleBuilder {
    type Oracle = FstOracle;

    fn build(&self, keys: &[String], _config: &OracleConfig) -> Result<FstOracle> {
        FstOracle::from_sorted(keys)
    }
}
