//! Session host for the recomputation pipeline.
//!
//! Raw input is normalized into keys; a key change rebuilds the trie and the
//! index oracle; the graph is derived from the trie and the active query on
//! demand. The trie builder's id counter lives here for the lifetime of the
//! session.

use serde::Serialize;
use tracing::{debug, warn};

use crate::bits::{render_layout, suffix_labels, LevelView};
use crate::highlight::{highlight, plan, HighlightedGraph, Query};
use crate::keys::normalize;
use crate::oracle::{IndexLayout, IndexOracle, OracleBuilder, OracleConfig, SuffixKind};
use crate::query::{exact_point, exact_range, RangeQuery, RangeResult};
use crate::trie::{Tree, TreeBuilder};

/// Structural statistics for display.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    pub key_count: usize,
    pub node_count: usize,
    pub terminal_count: usize,
    pub height: usize,
    /// The remaining fields come from the index layout and are zero without one.
    pub serialized_size: u64,
    pub memory_usage: u64,
    pub index_height: u32,
    pub sparse_start_level: u32,
}

pub struct Explorer<B: OracleBuilder> {
    builder: B,
    config: OracleConfig,
    trees: TreeBuilder,
    input: String,
    keys: Vec<String>,
    tree: Tree,
    oracle: Option<B::Oracle>,
    query: Query,
}

impl<B: OracleBuilder> Explorer<B> {
    pub fn new(builder: B, config: OracleConfig) -> Self {
        let mut trees = TreeBuilder::new();
        let tree = trees.build::<String>(&[]);
        Self {
            builder,
            config,
            trees,
            input: String::new(),
            keys: Vec::new(),
            tree,
            oracle: None,
            query: Query::None,
        }
    }

    #[inline]
    pub fn input(&self) -> &str {
        &self.input
    }

    #[inline]
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    #[inline]
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    #[inline]
    pub fn config(&self) -> &OracleConfig {
        &self.config
    }

    #[inline]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// The current index, if one could be built.
    pub fn oracle(&self) -> Option<&B::Oracle> {
        self.oracle.as_ref()
    }

    /// Replace the raw input. Returns true if the key set changed, in which
    /// case the trie and index were rebuilt.
    pub fn set_input(&mut self, input: impl Into<String>) -> bool {
        self.input = input.into();
        let keys = normalize(&self.input);
        if keys == self.keys {
            return false;
        }
        self.keys = keys;
        self.tree = self.trees.build(&self.keys);
        self.rebuild_oracle();
        true
    }

    pub fn set_config(&mut self, config: OracleConfig) {
        if config == self.config {
            return;
        }
        self.config = config;
        self.rebuild_oracle();
    }

    pub fn set_query(&mut self, query: Query) {
        self.query = query;
    }

    fn rebuild_oracle(&mut self) {
        self.oracle = None;
        if self.keys.is_empty() {
            return;
        }
        match self.builder.build(&self.keys, &self.config) {
            Ok(oracle) => {
                debug!(keys = self.keys.len(), config = ?self.config, "built index");
                self.oracle = Some(oracle);
            }
            Err(e) => {
                warn!(error = %e, keys = self.keys.len(), "index build failed, queries degrade to false");
            }
        }
    }

    fn dyn_oracle(&self) -> Option<&dyn IndexOracle> {
        self.oracle.as_ref().map(|o| o as &dyn IndexOracle)
    }

    fn layout(&self) -> Option<&IndexLayout> {
        self.oracle.as_ref().and_then(|o| o.layout())
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// Approximate point answer; false without an index.
    pub fn lookup_key(&self, key: &str) -> bool {
        self.oracle
            .as_ref()
            .is_some_and(|o| o.lookup_key(key.as_bytes()))
    }

    /// Approximate range answer; false without an index.
    pub fn lookup_range(&self, query: &RangeQuery) -> bool {
        self.oracle.as_ref().is_some_and(|o| o.lookup_range(query))
    }

    pub fn exact_point(&self, key: &str) -> bool {
        exact_point(&self.keys, key.as_bytes())
    }

    pub fn exact_range(&self, query: &RangeQuery) -> RangeResult {
        exact_range(&self.keys, query)
    }

    // -------------------------------------------------------------------------
    // Display
    // -------------------------------------------------------------------------

    /// Suffix labels indexed by terminal suffix ordinal. Empty when no suffixes
    /// are stored or the index exposes no layout.
    pub fn suffix_labels(&self) -> Vec<String> {
        if self.config.suffix_kind == SuffixKind::None {
            return Vec::new();
        }
        self.layout()
            .map(|layout| suffix_labels(layout, &self.config).into_iter().flatten().collect())
            .unwrap_or_default()
    }

    /// Freshly decorated graph for the current tree and query.
    pub fn graph(&self) -> HighlightedGraph {
        let plan = plan(&self.query, &self.keys, self.dyn_oracle());
        highlight(&self.tree, &self.keys, &self.suffix_labels(), plan.as_ref())
    }

    pub fn layout_view(&self, group_size: usize) -> Vec<LevelView> {
        self.layout()
            .map(|layout| render_layout(layout, group_size))
            .unwrap_or_default()
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            key_count: self.keys.len(),
            node_count: self.tree.node_count(),
            terminal_count: self.tree.terminal_count(),
            height: self.tree.height(),
            ..TreeStats::default()
        };
        if let Some(layout) = self.layout() {
            stats.serialized_size = layout.serialized_size;
            stats.memory_usage = layout.memory_usage;
            stats.index_height = layout.height;
            stats.sparse_start_level = layout.sparse_start_level;
        }
        stats
    }
}
