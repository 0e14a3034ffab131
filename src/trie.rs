//! Level-order reconstruction of the compressed trie over a normalized key set.
//!
//! Nodes and edges live in flat vectors and refer to each other by index.
//! A node either branches (it covers two or more keys sharing a prefix) or
//! terminates (exactly one key remains). Nodes are created breadth-first, so
//! the node vector doubles as the work queue.

use std::borrow::Cow;
use std::fmt;

use smallvec::SmallVec;
use tracing::debug;

use crate::keys::is_normalized;

/// Index of the root node in [`Tree::nodes`].
pub const ROOT: usize = 0;

// =============================================================================
// Labels
// =============================================================================

/// Edge label: a key byte, or the terminator marking that a key ends at the
/// parent node.
///
/// `Terminator` orders before every byte, matching the order in which sorted
/// keys present their discriminators (a key that ends here sorts before every
/// key extending it).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Label {
    Terminator,
    Byte(u8),
}

impl Label {
    /// Discriminator of `key` at depth `level`.
    #[inline]
    pub fn at(key: &[u8], level: usize) -> Self {
        match key.get(level) {
            Some(&b) => Label::Byte(b),
            None => Label::Terminator,
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Label::Terminator => f.write_str("$"),
            Label::Byte(b) if (0x20..=0x7e).contains(&b) => write!(f, "{}", b as char),
            Label::Byte(b) => write!(f, "\\x{:02x}", b),
        }
    }
}

// =============================================================================
// Nodes and edges
// =============================================================================

/// Back-reference from a parent to one of its children.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildRef {
    /// Index into [`Tree::nodes`].
    pub node: usize,
    /// Index into [`Tree::edges`].
    pub edge: usize,
}

/// Contiguous slice of the key list covered by a node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyRange {
    pub offset: usize,
    pub count: usize,
}

impl KeyRange {
    #[inline]
    pub fn end(self) -> usize {
        self.offset + self.count
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Shared prefix of two or more keys. The root of an empty key set is
    /// also `Internal`, covering nothing.
    Internal,
    /// Exactly one key remains; `suffix` is the creation-order ordinal among
    /// terminal nodes.
    Terminal { suffix: usize },
}

#[derive(Clone, Debug)]
pub struct TrieNode {
    pub id: u64,
    /// Number of key bytes consumed from the root.
    pub level: u32,
    pub keys: KeyRange,
    pub kind: NodeKind,
    /// Sorted by label; labels are unique.
    children: SmallVec<[(Label, ChildRef); 4]>,
}

impl TrieNode {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        matches!(self.kind, NodeKind::Terminal { .. })
    }

    #[inline]
    pub fn suffix_ordinal(&self) -> Option<usize> {
        match self.kind {
            NodeKind::Terminal { suffix } => Some(suffix),
            NodeKind::Internal => None,
        }
    }

    pub fn child(&self, label: Label) -> Option<ChildRef> {
        self.children
            .binary_search_by_key(&label, |&(l, _)| l)
            .ok()
            .map(|i| self.children[i].1)
    }

    pub fn children(&self) -> impl Iterator<Item = (Label, ChildRef)> + '_ {
        self.children.iter().copied()
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrieEdge {
    pub from: u64,
    pub to: u64,
    pub label: Label,
}

// =============================================================================
// Tree
// =============================================================================

/// A fully built trie. Never mutated after construction.
#[derive(Clone, Debug)]
pub struct Tree {
    nodes: Vec<TrieNode>,
    edges: Vec<TrieEdge>,
    /// Node indices per level, in creation order.
    levels: Vec<Vec<usize>>,
    terminal_count: usize,
}

impl Tree {
    #[inline]
    pub fn nodes(&self) -> &[TrieNode] {
        &self.nodes
    }

    #[inline]
    pub fn edges(&self) -> &[TrieEdge] {
        &self.edges
    }

    #[inline]
    pub fn levels(&self) -> &[Vec<usize>] {
        &self.levels
    }

    #[inline]
    pub fn root(&self) -> &TrieNode {
        &self.nodes[ROOT]
    }

    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn terminal_count(&self) -> usize {
        self.terminal_count
    }

    /// Number of levels, counting the root's.
    #[inline]
    pub fn height(&self) -> usize {
        self.levels.len()
    }

    /// Resolve a node id to its index. Ids handed out by any other build
    /// resolve to `None`.
    pub fn node_index(&self, id: u64) -> Option<usize> {
        let index = usize::try_from(id.checked_sub(self.root().id)?).ok()?;
        (index < self.nodes.len()).then_some(index)
    }

    /// Tooltip text for the node at `index`, given the keys the tree was
    /// built from.
    pub fn title<K: AsRef<str>>(&self, index: usize, keys: &[K]) -> String {
        let node = &self.nodes[index];
        let first = keys.get(node.keys.offset).map(|k| k.as_ref().as_bytes());
        match node.kind {
            NodeKind::Terminal { .. } => {
                format!("Suffix of key \"{}\"", lossy(first.unwrap_or_default()))
            }
            NodeKind::Internal => {
                let prefix = first
                    .map(|k| &k[..k.len().min(node.level as usize)])
                    .unwrap_or_default();
                format!("Common prefix \"{}\"", lossy(prefix))
            }
        }
    }
}

fn lossy(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

// =============================================================================
// Builder
// =============================================================================

/// Builds trees and owns the node id counter.
///
/// Ids keep increasing across builds for the lifetime of the builder, so ids
/// from a previous tree never collide with the current one.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    next_id: u64,
}

impl TreeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id the next built root will receive.
    #[inline]
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Build the trie over `keys`, which must be strictly increasing.
    pub fn build<K: AsRef<[u8]>>(&mut self, keys: &[K]) -> Tree {
        debug_assert!(is_normalized(keys), "keys must be sorted and unique");

        let mut state = BuildState {
            base_id: self.next_id,
            nodes: Vec::new(),
            edges: Vec::new(),
            levels: Vec::new(),
            next_suffix: 0,
        };
        state.push_node(
            0,
            KeyRange {
                offset: 0,
                count: keys.len(),
            },
        );

        // Children are appended behind the cursor, so walking the node vector
        // in order is the breadth-first queue.
        let mut cursor = 0;
        while cursor < state.nodes.len() {
            let parent = cursor;
            cursor += 1;

            let (level, range) = (state.nodes[parent].level, state.nodes[parent].keys);
            if range.count <= 1 {
                continue;
            }

            let depth = level as usize;
            let mut group_start = range.offset;
            let mut group_label = Label::at(keys[group_start].as_ref(), depth);
            for i in range.offset + 1..range.end() {
                let label = Label::at(keys[i].as_ref(), depth);
                if label != group_label {
                    state.push_child(parent, group_label, group_start, i - group_start);
                    group_start = i;
                    group_label = label;
                }
            }
            state.push_child(parent, group_label, group_start, range.end() - group_start);
        }

        self.next_id += state.nodes.len() as u64;
        let tree = Tree {
            nodes: state.nodes,
            edges: state.edges,
            levels: state.levels,
            terminal_count: state.next_suffix,
        };
        debug!(
            keys = keys.len(),
            nodes = tree.node_count(),
            height = tree.height(),
            first_id = state.base_id,
            "built trie"
        );
        tree
    }
}

struct BuildState {
    base_id: u64,
    nodes: Vec<TrieNode>,
    edges: Vec<TrieEdge>,
    levels: Vec<Vec<usize>>,
    next_suffix: usize,
}

impl BuildState {
    fn push_node(&mut self, level: u32, keys: KeyRange) -> usize {
        let index = self.nodes.len();
        let kind = if keys.count == 1 {
            let suffix = self.next_suffix;
            self.next_suffix += 1;
            NodeKind::Terminal { suffix }
        } else {
            NodeKind::Internal
        };

        self.nodes.push(TrieNode {
            id: self.base_id + index as u64,
            level,
            keys,
            kind,
            children: SmallVec::new(),
        });

        let depth = level as usize;
        if depth == self.levels.len() {
            self.levels.push(Vec::new());
        }
        self.levels[depth].push(index);
        index
    }

    fn push_child(&mut self, parent: usize, label: Label, offset: usize, count: usize) {
        let level = self.nodes[parent].level + 1;
        let node = self.push_node(level, KeyRange { offset, count });
        let edge = self.edges.len();
        self.edges.push(TrieEdge {
            from: self.nodes[parent].id,
            to: self.nodes[node].id,
            label,
        });

        let children = &mut self.nodes[parent].children;
        debug_assert!(children.last().map_or(true, |&(l, _)| l < label));
        children.push((label, ChildRef { node, edge }));
    }
}
