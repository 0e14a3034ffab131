//! Query replay over a built trie.
//!
//! A query key is walked byte by byte from the root. Nodes passed through are
//! marked `Traversing`, followed edges `Bold`, and the node where the walk
//! stops is marked `Success` or `Failure` depending on the query answer.
//! Decoration always happens on a fresh copy; the [`Tree`] is never touched.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::bits::EMPTY_SET;
use crate::oracle::IndexOracle;
use crate::query::{exact_range, RangeQuery};
use crate::trie::{Label, Tree, ROOT};

// =============================================================================
// Queries and visual classes
// =============================================================================

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Query {
    #[default]
    None,
    Point {
        key: String,
    },
    Range(RangeQuery),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeClass {
    #[default]
    Neutral,
    Traversing,
    Success,
    Failure,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeClass {
    #[default]
    Thin,
    Bold,
}

// =============================================================================
// Graph
// =============================================================================

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphNode {
    pub id: u64,
    pub level: u32,
    /// Suffix label for terminal nodes, empty for internal ones.
    pub label: String,
    pub title: String,
    pub terminal: bool,
    pub class: NodeClass,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GraphEdge {
    pub from: u64,
    pub to: u64,
    pub label: String,
    pub class: EdgeClass,
}

/// Render-ready copy of a [`Tree`], index-aligned with its nodes and edges.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct HighlightedGraph {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl HighlightedGraph {
    /// Undecorated copy of `tree`. Terminal nodes take their label from
    /// `suffix_labels` by suffix ordinal, falling back to the empty-set sign.
    pub fn neutral<K: AsRef<str>>(tree: &Tree, keys: &[K], suffix_labels: &[String]) -> Self {
        let nodes = tree
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| GraphNode {
                id: node.id,
                level: node.level,
                label: match node.suffix_ordinal() {
                    Some(ordinal) => suffix_labels
                        .get(ordinal)
                        .cloned()
                        .unwrap_or_else(|| EMPTY_SET.to_owned()),
                    None => String::new(),
                },
                title: tree.title(index, keys),
                terminal: node.is_terminal(),
                class: NodeClass::Neutral,
            })
            .collect();

        let edges = tree
            .edges()
            .iter()
            .map(|edge| GraphEdge {
                from: edge.from,
                to: edge.to,
                label: edge.label.to_string(),
                class: EdgeClass::Thin,
            })
            .collect();

        Self { nodes, edges }
    }

    fn mark(&mut self, traversal: &Traversal, found: bool) {
        let (&last, passed) = match traversal.nodes.split_last() {
            Some(split) => split,
            None => return,
        };
        for &node in passed {
            self.nodes[node].class = NodeClass::Traversing;
        }
        for &edge in &traversal.edges {
            self.edges[edge].class = EdgeClass::Bold;
        }
        self.nodes[last].class = if found {
            NodeClass::Success
        } else {
            NodeClass::Failure
        };
    }
}

// =============================================================================
// Replay
// =============================================================================

/// Path taken by one key through a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Traversal {
    /// Node indices from the root to the stopping node, inclusive.
    pub nodes: Vec<usize>,
    /// Edge indices followed, one fewer than `nodes`.
    pub edges: Vec<usize>,
    /// Key bytes matched by edges.
    pub consumed: usize,
    /// Whether a terminator edge was followed after the whole key matched.
    pub terminated: bool,
}

impl Traversal {
    /// Index of the node where the walk stopped.
    pub fn last(&self) -> usize {
        self.nodes.last().copied().unwrap_or(ROOT)
    }
}

/// Walk `key` from the root, stopping where no child matches.
pub fn replay(tree: &Tree, key: &[u8]) -> Traversal {
    let mut traversal = Traversal {
        nodes: vec![ROOT],
        edges: Vec::new(),
        consumed: 0,
        terminated: false,
    };
    let mut node = ROOT;

    for &b in key {
        match tree.nodes()[node].child(Label::Byte(b)) {
            Some(child) => {
                traversal.edges.push(child.edge);
                traversal.nodes.push(child.node);
                traversal.consumed += 1;
                node = child.node;
            }
            None => break,
        }
    }

    if traversal.consumed == key.len() {
        if let Some(child) = tree.nodes()[node].child(Label::Terminator) {
            traversal.edges.push(child.edge);
            traversal.nodes.push(child.node);
            traversal.terminated = true;
        }
    }

    traversal
}

/// Keys to replay and the answer that colors where they stop.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TraversalPlan {
    pub keys: Vec<String>,
    pub found: bool,
}

/// Resolve `query` into a replay plan.
///
/// Point queries take their answer from `oracle` and are not planned at all
/// without one. Range queries replay every exactly matching key; the index's
/// own range answer is not consulted.
pub fn plan<K: AsRef<str>>(
    query: &Query,
    keys: &[K],
    oracle: Option<&dyn IndexOracle>,
) -> Option<TraversalPlan> {
    match query {
        Query::None => None,
        Query::Point { key } => oracle.map(|oracle| TraversalPlan {
            found: oracle.lookup_key(key.as_bytes()),
            keys: vec![key.clone()],
        }),
        Query::Range(range) => {
            let exact = exact_range(keys, range);
            Some(TraversalPlan {
                found: exact.found,
                keys: exact.keys,
            })
        }
    }
}

/// Decorate a fresh copy of `tree` with the replay of every planned key.
///
/// Keys are applied in order and later marks overwrite earlier ones.
pub fn highlight<K: AsRef<str>>(
    tree: &Tree,
    keys: &[K],
    suffix_labels: &[String],
    plan: Option<&TraversalPlan>,
) -> HighlightedGraph {
    let mut graph = HighlightedGraph::neutral(tree, keys, suffix_labels);
    let Some(plan) = plan else {
        return graph;
    };

    for key in &plan.keys {
        let traversal = replay(tree, key.as_bytes());
        trace!(
            key = %key,
            consumed = traversal.consumed,
            terminated = traversal.terminated,
            found = plan.found,
            "replayed query key"
        );
        graph.mark(&traversal, plan.found);
    }
    graph
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FstOracle;
    use crate::trie::TreeBuilder;

    const KEYS: [&str; 4] = ["a", "ab", "b", "c"];

    fn graph_for(keys: &[&str], query: &Query) -> (Tree, HighlightedGraph) {
        let tree = TreeBuilder::new().build(keys);
        let oracle = FstOracle::from_sorted(keys).unwrap();
        let plan = plan(query, keys, Some(&oracle));
        let graph = highlight(&tree, keys, &[], plan.as_ref());
        (tree, graph)
    }

    fn point(key: &str) -> Query {
        Query::Point {
            key: key.to_owned(),
        }
    }

    #[test]
    fn test_replay_reaches_terminal_through_terminator() {
        let tree = TreeBuilder::new().build(&KEYS);
        let t = replay(&tree, b"a");
        assert_eq!(t.consumed, 1);
        assert!(t.terminated);
        assert_eq!(t.nodes.len(), 3);
        assert_eq!(t.edges.len(), 2);
        assert!(tree.nodes()[t.last()].is_terminal());
        assert_eq!(tree.nodes()[t.last()].keys.offset, 0);
    }

    #[test]
    fn test_replay_stops_on_divergence() {
        let tree = TreeBuilder::new().build(&KEYS);
        let t = replay(&tree, b"d");
        assert_eq!(t.nodes, vec![ROOT]);
        assert!(t.edges.is_empty());

        // "c" is terminal after one byte; the rest of the key is not walked.
        let t = replay(&tree, b"cat");
        assert_eq!(t.consumed, 1);
        assert!(!t.terminated);
        assert!(tree.nodes()[t.last()].is_terminal());
    }

    #[test]
    fn test_point_hit() {
        let (tree, graph) = graph_for(&KEYS, &point("ab"));
        let t = replay(&tree, b"ab");
        assert_eq!(graph.nodes[t.last()].class, NodeClass::Success);
        for &n in &t.nodes[..t.nodes.len() - 1] {
            assert_eq!(graph.nodes[n].class, NodeClass::Traversing);
        }
        for &e in &t.edges {
            assert_eq!(graph.edges[e].class, EdgeClass::Bold);
        }
        let bold = graph.edges.iter().filter(|e| e.class == EdgeClass::Bold).count();
        assert_eq!(bold, t.edges.len());
    }

    #[test]
    fn test_point_miss_marks_failure() {
        let (_, graph) = graph_for(&KEYS, &point("zz"));
        assert_eq!(graph.nodes[ROOT].class, NodeClass::Failure);
        assert!(graph.edges.iter().all(|e| e.class == EdgeClass::Thin));
    }

    #[test]
    fn test_point_without_oracle_is_not_highlighted() {
        let tree = TreeBuilder::new().build(&KEYS);
        assert_eq!(plan(&point("a"), &KEYS, None), None);
        let graph = highlight(&tree, &KEYS, &[], None);
        assert_eq!(graph, HighlightedGraph::neutral(&tree, &KEYS, &[]));
    }

    #[test]
    fn test_range_replays_every_match() {
        let query = Query::Range(RangeQuery::new("a", true, "b", false));
        let (tree, graph) = graph_for(&KEYS, &query);
        for key in ["a", "ab"] {
            let t = replay(&tree, key.as_bytes());
            assert_eq!(graph.nodes[t.last()].class, NodeClass::Success, "{key}");
        }
        for key in ["b", "c"] {
            let t = replay(&tree, key.as_bytes());
            assert_eq!(graph.nodes[t.last()].class, NodeClass::Neutral, "{key}");
        }
    }

    #[test]
    fn test_empty_range_highlights_nothing() {
        let query = Query::Range(RangeQuery::new("x", true, "z", true));
        let (tree, graph) = graph_for(&KEYS, &query);
        assert_eq!(graph, HighlightedGraph::neutral(&tree, &KEYS, &[]));
    }

    #[test]
    fn test_tree_is_not_mutated() {
        let tree = TreeBuilder::new().build(&KEYS);
        let before = format!("{tree:?}");
        let plan = TraversalPlan {
            keys: vec!["ab".to_owned()],
            found: false,
        };
        let _ = highlight(&tree, &KEYS, &[], Some(&plan));
        assert_eq!(format!("{tree:?}"), before);
    }

    #[test]
    fn test_labels_and_titles() {
        let tree = TreeBuilder::new().build(&["ab", "abc"]);
        let labels = vec!["s0".to_owned()];
        let graph = highlight(&tree, &["ab", "abc"], &labels, None);

        let terminals: Vec<&str> = graph
            .nodes
            .iter()
            .filter(|n| n.terminal)
            .map(|n| n.label.as_str())
            .collect();
        assert_eq!(terminals, vec!["s0", EMPTY_SET]);
        assert_eq!(graph.nodes[ROOT].title, "Common prefix \"\"");
        assert!(graph.edges.iter().any(|e| e.label == "$"));
    }

    #[test]
    fn test_graph_serializes_classes_lowercase() {
        let (_, graph) = graph_for(&["a", "b"], &point("a"));
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"][0]["class"], "traversing");
        assert_eq!(json["edges"][0]["class"], "bold");
    }

    #[test]
    fn test_query_serde() {
        let q: Query = serde_json::from_str(r#"{"mode":"point","key":"ab"}"#).unwrap();
        assert_eq!(q, point("ab"));
        let q: Query = serde_json::from_str(
            r#"{"mode":"range","begin":"a","begin_inclusive":true,"end":"b","end_inclusive":false}"#,
        )
        .unwrap();
        assert_eq!(q, Query::Range(RangeQuery::new("a", true, "b", false)));
    }
}
