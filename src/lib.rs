//! # surf-explorer
//!
//! The index-independent core of a succinct range filter visualizer.
//!
//! Given free-text keys, this crate normalizes them, reconstructs the
//! compressed trie the filter encodes (level by level, with stable node ids
//! across rebuilds), answers exact point and range membership as ground
//! truth, replays queries over the trie to highlight the path taken, and
//! decodes the filter's raw bit arrays for inspection.
//!
//! The filter itself is an external collaborator behind [`IndexOracle`].
//!
//! ## Example
//!
//! ```rust
//! use surf_explorer::{Explorer, FstOracleBuilder, NodeClass, OracleConfig, Query};
//!
//! let mut explorer = Explorer::new(FstOracleBuilder, OracleConfig::default());
//! explorer.set_input("far\nfast\nfat\ns\ntop\ntoy\ntrie\ntrip\ntry");
//! assert_eq!(explorer.keys().len(), 9);
//!
//! explorer.set_query(Query::Point { key: "fast".into() });
//! let graph = explorer.graph();
//! assert!(graph.nodes.iter().any(|n| n.class == NodeClass::Success));
//! ```

#![warn(clippy::all)]

pub mod bits;
pub mod config;
pub mod error;
pub mod explorer;
pub mod highlight;
pub mod keys;
pub mod oracle;
pub mod query;
pub mod trie;

pub use config::Config;
pub use error::{Error, Result};
pub use explorer::{Explorer, TreeStats};
pub use highlight::{EdgeClass, HighlightedGraph, NodeClass, Query};
pub use oracle::{FstOracle, FstOracleBuilder, IndexLayout, IndexOracle, OracleBuilder, OracleConfig, SuffixKind};
pub use query::{RangeQuery, RangeResult};
pub use trie::{Label, Tree, TreeBuilder};

#[cfg(test)]
mod proptests;
