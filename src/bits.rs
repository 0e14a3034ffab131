//! Formatting of raw bit-packed index arrays.
//!
//! Words are 32-bit and rendered most significant bit first. Everything here
//! is total over well-formed input, except unpacking flattened arrays whose
//! sizes overrun the supplied values.

use crate::error::{Error, Result};
use crate::oracle::{IndexLayout, OracleConfig, SuffixKind};

pub const WORD_BITS: usize = 32;
pub const BITS_PER_BYTE: usize = 8;
pub const SEPARATOR: char = ' ';
/// Rendering of an empty bitstring.
pub const EMPTY_SET: &str = "\u{2205}";

// =============================================================================
// Bitstrings
// =============================================================================

/// Binary expansion of `words`, with a separator after every `group_size`
/// bits (`0` disables grouping). A trailing separator is dropped.
pub fn to_bitstring(words: &[u32], group_size: usize) -> String {
    to_bitstring_partial(words, words.len() * WORD_BITS, group_size)
}

/// Like [`to_bitstring`], but stops after `bit_count` bits.
pub fn to_bitstring_partial(words: &[u32], bit_count: usize, group_size: usize) -> String {
    let bit_count = bit_count.min(words.len() * WORD_BITS);
    let separators = if group_size == 0 { 0 } else { bit_count / group_size };
    let mut s = String::with_capacity(bit_count + separators);

    for total in 0..bit_count {
        let word = words[total / WORD_BITS];
        let mask = 0x8000_0000u32 >> (total % WORD_BITS);
        s.push(if word & mask != 0 { '1' } else { '0' });
        if group_size != 0 && total % group_size == group_size - 1 {
            s.push(SEPARATOR);
        }
    }

    if s.ends_with(SEPARATOR) {
        s.pop();
    }
    s
}

// =============================================================================
// Printable text
// =============================================================================

/// Decode each bitstring as 8-bit characters. See [`decode_printable`].
pub fn to_printable_text<S: AsRef<str>>(bitstrings: &[S]) -> Vec<String> {
    bitstrings
        .iter()
        .map(|b| decode_printable(b.as_ref(), BITS_PER_BYTE))
        .collect()
}

/// Decode one bitstring in chunks of `bits_per_byte` bits.
///
/// If every chunk is printable ASCII the text itself is returned; otherwise
/// every chunk is rendered as two hex digits behind `0x`, with a leading
/// zero nibble when the digit count is odd. An empty bitstring renders as
/// [`EMPTY_SET`].
pub fn decode_printable(bitstring: &str, bits_per_byte: usize) -> String {
    let bits_per_byte = bits_per_byte.max(1);
    let codes: Vec<u32> = bitstring
        .as_bytes()
        .chunks(bits_per_byte)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u32, |acc, &b| (acc << 1) | u32::from(b == b'1'))
        })
        .collect();

    if codes.is_empty() {
        return EMPTY_SET.to_owned();
    }

    let printable = codes.iter().all(|c| (0x20..=0x7e).contains(c));
    if printable {
        return codes.iter().filter_map(|&c| char::from_u32(c)).collect();
    }

    let hex: String = codes.iter().map(|c| format!("{:02x}", c)).collect();
    if hex.len() % 2 == 0 {
        format!("0x{hex}")
    } else {
        format!("0x0{hex}")
    }
}

// =============================================================================
// Flattened per-level arrays
// =============================================================================

/// Split `values` into one vector per entry of `sizes`.
pub fn unpack_nested(sizes: &[u32], values: &[u32]) -> Result<Vec<Vec<u32>>> {
    unpack_with_width(sizes, values, 1)
}

/// Split `values` into one vector per entry of `sizes`, where each counted
/// element is a 64-bit word carried as two values (high, low). The result
/// keeps the two halves, so level `i` holds `2 * sizes[i]` words.
pub fn unpack_nested64(sizes: &[u32], values: &[u32]) -> Result<Vec<Vec<u32>>> {
    unpack_with_width(sizes, values, 2)
}

fn unpack_with_width(sizes: &[u32], values: &[u32], width: usize) -> Result<Vec<Vec<u32>>> {
    let expected: usize = sizes.iter().map(|&n| n as usize * width).sum();
    if expected > values.len() {
        return Err(Error::MalformedArray {
            expected,
            available: values.len(),
        });
    }

    let mut offset = 0;
    Ok(sizes
        .iter()
        .map(|&n| {
            let len = n as usize * width;
            let level = values[offset..offset + len].to_vec();
            offset += len;
            level
        })
        .collect())
}

// =============================================================================
// Suffix labels
// =============================================================================

/// One label per stored suffix, grouped per level.
///
/// Real suffixes of whole bytes are shown as text; everything else as bits.
/// Flattened, the labels line up with terminal nodes' suffix ordinals.
pub fn suffix_labels(layout: &IndexLayout, config: &OracleConfig) -> Vec<Vec<String>> {
    let suffix_len = layout.suffix_len as usize;
    if suffix_len == 0 {
        return Vec::new();
    }
    let as_text = config.suffix_kind == SuffixKind::Real && suffix_len % BITS_PER_BYTE == 0;

    layout
        .suffixes
        .iter()
        .enumerate()
        .map(|(level, words)| {
            let count = layout.suffix_counts.get(level).copied().unwrap_or(0) as usize;
            if count == 0 {
                return Vec::new();
            }
            let text = to_bitstring_partial(words, count * suffix_len, suffix_len);
            text.split(SEPARATOR)
                .map(|bits| {
                    if as_text {
                        decode_printable(bits, BITS_PER_BYTE)
                    } else {
                        bits.to_owned()
                    }
                })
                .collect()
        })
        .collect()
}

// =============================================================================
// Layout rendering
// =============================================================================

/// Human-readable view of one level of an [`IndexLayout`].
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct LevelView {
    pub level: usize,
    pub node_count: u32,
    pub suffix_count: u32,
    pub labels: String,
    pub bitmap_labels: String,
    pub bitmap_child_indicator_bits: String,
    pub prefixkey_indicator_bits: String,
    pub child_indicator_bits: String,
    pub louds_bits: String,
    pub suffixes: String,
}

pub fn render_layout(layout: &IndexLayout, group_size: usize) -> Vec<LevelView> {
    let levels = [
        layout.labels.len(),
        layout.bitmap_labels.len(),
        layout.child_indicator_bits.len(),
        layout.louds_bits.len(),
        layout.suffixes.len(),
        layout.node_counts.len(),
    ]
    .into_iter()
    .max()
    .unwrap_or(0);

    let bits = |arrays: &[Vec<u32>], level: usize| {
        arrays
            .get(level)
            .map(|words| to_bitstring(words, group_size))
            .unwrap_or_default()
    };

    (0..levels)
        .map(|level| LevelView {
            level,
            node_count: layout.node_counts.get(level).copied().unwrap_or(0),
            suffix_count: layout.suffix_counts.get(level).copied().unwrap_or(0),
            labels: layout
                .labels
                .get(level)
                .map(Vec::as_slice)
                .map(render_labels)
                .unwrap_or_default(),
            bitmap_labels: bits(&layout.bitmap_labels, level),
            bitmap_child_indicator_bits: bits(&layout.bitmap_child_indicator_bits, level),
            prefixkey_indicator_bits: bits(&layout.prefixkey_indicator_bits, level),
            child_indicator_bits: bits(&layout.child_indicator_bits, level),
            louds_bits: bits(&layout.louds_bits, level),
            suffixes: bits(&layout.suffixes, level),
        })
        .collect()
}

/// Label bytes as characters, non-printable ones as `\xNN`.
fn render_labels(labels: &[u32]) -> String {
    labels
        .iter()
        .map(|&l| match u8::try_from(l) {
            Ok(b) if (0x20..=0x7e).contains(&b) => (b as char).to_string(),
            _ => format!("\\x{:02x}", l),
        })
        .collect()
}
