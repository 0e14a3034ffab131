use crate::{FstOracle, IndexOracle, Label, NodeClass, Query, RangeQuery, Tree, TreeBuilder};

use crate::bits::{decode_printable, to_bitstring, BITS_PER_BYTE};
use crate::highlight::{highlight, plan, replay};
use crate::keys::{is_normalized, normalize};
use crate::query::{exact_point, exact_range};
use crate::trie::{KeyRange, NodeKind, ROOT};
use proptest::prelude::*;
use std::collections::HashSet;

fn validate_tree(t: &Tree, keys: &[String]) {
    assert_eq!(t.root().keys, KeyRange { offset: 0, count: keys.len() });
    assert_eq!(t.edges().len() + 1, t.node_count(), "every non-root node has one parent edge");

    let mut prev_suffix = None;
    for (index, node) in t.nodes().iter().enumerate() {
        assert_eq!(node.id, t.root().id + index as u64, "ids must be consecutive");
        if index > 0 {
            assert!(t.nodes()[index - 1].level <= node.level, "nodes must be level-ordered");
        }

        match node.kind {
            NodeKind::Internal => assert!(
                node.keys.count >= 2 || (index == ROOT && keys.is_empty()),
                "internal node covers {} keys",
                node.keys.count
            ),
            NodeKind::Terminal { suffix } => {
                assert_eq!(node.keys.count, 1);
                assert_eq!(node.child_count(), 0);
                assert_eq!(suffix, prev_suffix.map_or(0, |s| s + 1), "suffix ordinals must be dense");
                prev_suffix = Some(suffix);
            }
        }

        // Children partition the parent's key range in label order.
        let mut next_offset = node.keys.offset;
        let mut prev_label = None;
        for (label, child) in node.children() {
            assert!(prev_label < Some(label), "child labels must be strictly increasing");
            prev_label = Some(label);

            let child_node = &t.nodes()[child.node];
            assert_eq!(child_node.keys.offset, next_offset);
            next_offset = child_node.keys.end();

            let depth = node.level as usize;
            for key in &keys[child_node.keys.offset..child_node.keys.end()] {
                assert_eq!(Label::at(key.as_bytes(), depth), label);
            }
        }
        if node.child_count() > 0 {
            assert_eq!(next_offset, node.keys.end());
        }
    }
    assert_eq!(t.terminal_count(), keys.len());
}

fn input_strategy() -> impl Strategy<Value = String> {
    // A narrow alphabet keeps shared prefixes (and prefix keys) common.
    prop::collection::vec("[a-d]{0,5}", 0..=40).prop_map(|lines| lines.join("\n"))
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_normalize_idempotent(input in "[a-c\\r\\n ]{0,64}") {
        let keys = normalize(&input);
        prop_assert!(is_normalized(&keys));
        prop_assert!(keys.iter().all(|k| !k.is_empty()));
        prop_assert_eq!(normalize(&keys.join("\n")), keys);
    }

    #[test]
    fn prop_tree_structure(input in input_strategy()) {
        let keys = normalize(&input);
        let tree = TreeBuilder::new().build(&keys);
        validate_tree(&tree, &keys);
    }

    #[test]
    fn prop_every_key_reaches_its_own_terminal(input in input_strategy()) {
        let keys = normalize(&input);
        let tree = TreeBuilder::new().build(&keys);

        let mut reached = HashSet::new();
        for (i, key) in keys.iter().enumerate() {
            let t = replay(&tree, key.as_bytes());
            let node = &tree.nodes()[t.last()];
            prop_assert!(node.is_terminal(), "{:?} stopped at a non-terminal", key);
            prop_assert_eq!(node.keys.offset, i);
            prop_assert!(reached.insert(t.last()));
        }
    }

    #[test]
    fn prop_point_hits_are_successful(input in input_strategy()) {
        let keys = normalize(&input);
        prop_assume!(!keys.is_empty());
        let tree = TreeBuilder::new().build(&keys);
        let oracle = FstOracle::from_sorted(&keys).unwrap();

        for key in &keys {
            let query = Query::Point { key: key.clone() };
            let plan = plan(&query, &keys, Some(&oracle));
            let graph = highlight(&tree, &keys, &[], plan.as_ref());
            let last = replay(&tree, key.as_bytes()).last();
            prop_assert_eq!(graph.nodes[last].class, NodeClass::Success);
        }
    }

    #[test]
    fn prop_exact_range_matches_predicate(input in input_strategy(), query in any::<RangeQuery>()) {
        let keys = normalize(&input);
        let result = exact_range(&keys, &query);

        prop_assert!(is_normalized(&result.keys));
        prop_assert_eq!(result.found, !result.keys.is_empty());
        let expected: Vec<String> = keys
            .iter()
            .filter(|k| query.contains(k.as_bytes()))
            .cloned()
            .collect();
        prop_assert_eq!(&result.keys, &expected);

        if query.begin > query.end {
            prop_assert!(result.keys.is_empty());
        }
    }

    #[test]
    fn prop_fst_oracle_has_no_false_negatives(input in input_strategy(), probe in "[a-d]{0,5}") {
        let keys = normalize(&input);
        prop_assume!(!keys.is_empty());
        let oracle = FstOracle::from_sorted(&keys).unwrap();
        for key in &keys {
            prop_assert!(oracle.lookup_key(key.as_bytes()));
        }
        prop_assert_eq!(oracle.lookup_key(probe.as_bytes()), exact_point(&keys, probe.as_bytes()));
    }

    #[test]
    fn prop_bitstring_bits(words in prop::collection::vec(any::<u32>(), 0..8), group in 0usize..=40) {
        let s = to_bitstring(&words, group);
        let bits: Vec<char> = s.chars().filter(|&c| c != ' ').collect();
        prop_assert_eq!(bits.len(), words.len() * 32);
        prop_assert!(!s.ends_with(' '));
        for (i, &bit) in bits.iter().enumerate() {
            let set = words[i / 32] & (0x8000_0000 >> (i % 32)) != 0;
            prop_assert_eq!(bit, if set { '1' } else { '0' });
        }
    }

    #[test]
    fn prop_printable_text_round_trip(text in "[ -~]{1,16}") {
        let bits: String = text.bytes().map(|b| format!("{:08b}", b)).collect();
        prop_assert_eq!(decode_printable(&bits, BITS_PER_BYTE), text);
    }
}

#[test]
fn rebuilds_never_share_ids() {
    let inputs = ["a\nb", "a\nab\nabc", "", "x", "a\nb"];
    let mut builder = TreeBuilder::new();
    let mut seen = HashSet::new();
    for input in inputs {
        let keys = normalize(input);
        let tree = builder.build(&keys);
        validate_tree(&tree, &keys);
        for node in tree.nodes() {
            assert!(seen.insert(node.id), "id {} reused", node.id);
        }
    }
}
