//! Error types for the explorer's outer seams.
//!
//! The key normalizer, trie builder, exact evaluator, highlighter and bit
//! decoder are total and never return these.

use thiserror::Error;

/// Error variants for configuration loading and oracle plumbing.
#[derive(Debug, Error)]
pub enum Error {
    /// Reading a configuration file failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration document is not valid TOML for [`crate::config::Config`].
    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    /// The reference oracle could not build its key set.
    #[error("fst error: {0}")]
    Fst(#[from] fst::Error),

    /// A flattened per-level array claims more values than were supplied.
    #[error("malformed array: sizes require {expected} values, {available} available")]
    MalformedArray { expected: usize, available: usize },
}

/// A specialized Result type for explorer operations.
pub type Result<T> = std::result::Result<T, Error>;
