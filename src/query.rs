//! Exact point and range membership over the sorted key list.
//!
//! This is the ground truth that approximate index answers are compared
//! against. It never looks at the trie or at an index.

use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Range bounds; each end is inclusive or exclusive independently.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(test, derive(proptest_derive::Arbitrary))]
pub struct RangeQuery {
    pub begin: String,
    pub begin_inclusive: bool,
    pub end: String,
    pub end_inclusive: bool,
}

impl RangeQuery {
    pub fn new(
        begin: impl Into<String>,
        begin_inclusive: bool,
        end: impl Into<String>,
        end_inclusive: bool,
    ) -> Self {
        Self {
            begin: begin.into(),
            begin_inclusive,
            end: end.into(),
            end_inclusive,
        }
    }

    /// Returns true if `key` lies within both bounds.
    pub fn contains(&self, key: &[u8]) -> bool {
        let begin = self.begin.as_bytes();
        let end = self.end.as_bytes();
        let above = if self.begin_inclusive { key >= begin } else { key > begin };
        let below = if self.end_inclusive { key <= end } else { key < end };
        above && below
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RangeResult {
    /// True iff `keys` is non-empty.
    pub found: bool,
    /// Matching keys in sorted order.
    pub keys: Vec<String>,
}

/// Returns true if `key` is one of `keys`.
pub fn exact_point<K: AsRef<[u8]>>(keys: &[K], key: &[u8]) -> bool {
    keys.binary_search_by(|k| k.as_ref().cmp(key)).is_ok()
}

/// Index range of `keys` matching `query`. Empty when the bounds cross.
pub fn range_bounds<K: AsRef<[u8]>>(keys: &[K], query: &RangeQuery) -> Range<usize> {
    bounds_by(keys, |k| k.as_ref(), query)
}

/// All keys matching `query`, in order.
pub fn exact_range<K: AsRef<str>>(keys: &[K], query: &RangeQuery) -> RangeResult {
    let matches: Vec<String> = keys[bounds_by(keys, |k| k.as_ref().as_bytes(), query)]
        .iter()
        .map(|k| k.as_ref().to_owned())
        .collect();
    RangeResult {
        found: !matches.is_empty(),
        keys: matches,
    }
}

fn bounds_by<T>(keys: &[T], bytes: impl Fn(&T) -> &[u8], query: &RangeQuery) -> Range<usize> {
    let begin = query.begin.as_bytes();
    let end = query.end.as_bytes();

    let start = if query.begin_inclusive {
        keys.partition_point(|k| bytes(k) < begin)
    } else {
        keys.partition_point(|k| bytes(k) <= begin)
    };
    let stop = if query.end_inclusive {
        keys.partition_point(|k| bytes(k) <= end)
    } else {
        keys.partition_point(|k| bytes(k) < end)
    };

    start..stop.max(start)
}
