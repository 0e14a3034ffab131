//! Key normalization.
//!
//! A key is the literal content of one input line. Lines are split on `\r`
//! and `\n`, empty lines are dropped, and the rest is sorted in byte order
//! and deduplicated.

/// Normalize raw multi-line text into a strictly increasing key list.
pub fn normalize(input: &str) -> Vec<String> {
    let mut keys: Vec<String> = input
        .split(['\r', '\n'])
        .filter(|line| !line.is_empty())
        .map(str::to_owned)
        .collect();

    // `String`'s `Ord` is byte-wise, matching the trie's label order.
    keys.sort_unstable();
    keys.dedup();
    keys
}

/// Returns true if `keys` is strictly increasing (sorted, no duplicates).
pub fn is_normalized<K: AsRef<[u8]>>(keys: &[K]) -> bool {
    keys.windows(2).all(|w| w[0].as_ref() < w[1].as_ref())
}
