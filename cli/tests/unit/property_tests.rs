//! Property-based tests for critical validation and generation logic.
//!
//! Uses `proptest` to verify invariants across many random inputs.

#![allow(clippy::expect_used)]

use std::collections::HashSet;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

use autoship_cli::domain::config::{VALID_CONFIG_KEYS, validate_config_key};
use autoship_cli::domain::deploy::shell_quote;
use autoship_cli::domain::terraform::{SSH_PORT, SUFFIX_LEN, generate_suffix, ingress_ports};
use autoship_cli::domain::tree::{TreeNode, parse_listing, render_listing};

// ============================================================================
// ingress_ports() property tests
// ============================================================================

proptest! {
    /// SSH is always present exactly once, as the last port.
    #[test]
    fn prop_ingress_ends_with_single_ssh(ports in prop::collection::vec(1u16..=65535, 0..8)) {
        let ingress = ingress_ports(&ports);
        prop_assert_eq!(ingress.last().copied(), Some(SSH_PORT));
        prop_assert_eq!(ingress.iter().filter(|p| **p == SSH_PORT).count(), 1);
    }

    /// No duplicates, and application ports keep their first-seen order.
    #[test]
    fn prop_ingress_is_deduplicated_in_order(ports in prop::collection::vec(1u16..=65535, 0..8)) {
        let ingress = ingress_ports(&ports);
        let unique: HashSet<_> = ingress.iter().collect();
        prop_assert_eq!(unique.len(), ingress.len());

        let mut expected: Vec<u16> = Vec::new();
        for p in &ports {
            if *p != SSH_PORT && !expected.contains(p) {
                expected.push(*p);
            }
        }
        prop_assert_eq!(&ingress[..ingress.len() - 1], expected.as_slice());
    }
}

// ============================================================================
// generate_suffix() property tests
// ============================================================================

proptest! {
    /// Suffixes are always six characters from [a-z0-9].
    #[test]
    fn prop_suffix_has_valid_format(seed in any::<u64>()) {
        let mut rng = StdRng::seed_from_u64(seed);
        let suffix = generate_suffix(&mut rng);
        prop_assert_eq!(suffix.len(), SUFFIX_LEN);
        prop_assert!(
            suffix.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()),
            "bad suffix: {}", suffix
        );
    }
}

#[test]
fn test_suffix_variety_batch() {
    let mut rng = StdRng::seed_from_u64(7);
    let suffixes: HashSet<_> = (0..100).map(|_| generate_suffix(&mut rng)).collect();
    assert!(suffixes.len() > 95, "suffixes collide too often");
}

// ============================================================================
// Tree listing property tests
// ============================================================================

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_.-]{0,8}"
}

fn arb_tree() -> impl Strategy<Value = TreeNode> {
    let leaf = arb_name().prop_map(|n| TreeNode::file(&n));
    leaf.prop_recursive(3, 24, 4, |inner| {
        (arb_name(), prop::collection::vec(inner, 0..4))
            .prop_map(|(name, children)| TreeNode::dir(&name, children))
    })
}

/// Paths of a tree in render order, directories before their contents.
fn flatten(node: &TreeNode, prefix: &str, out: &mut Vec<(String, bool)>) {
    for child in &node.children {
        let path = if prefix.is_empty() {
            child.name.clone()
        } else {
            format!("{prefix}/{}", child.name)
        };
        out.push((path.clone(), child.is_dir));
        if child.is_dir {
            flatten(child, &path, out);
        }
    }
}

proptest! {
    /// Parsing a rendered listing recovers every path.
    #[test]
    fn prop_parse_listing_inverts_render(children in prop::collection::vec(arb_tree(), 0..5)) {
        let mut root = TreeNode::dir("project", children);
        root.sort();
        let listing = render_listing(&root);

        let mut expected = Vec::new();
        flatten(&root, "", &mut expected);
        let parsed: Vec<(String, bool)> = parse_listing(&listing)
            .into_iter()
            .map(|p| (p.path, p.is_dir))
            .collect();
        prop_assert_eq!(parsed, expected);
    }
}

// ============================================================================
// Config key and shell quoting property tests
// ============================================================================

proptest! {
    /// Only whitelisted keys validate.
    #[test]
    fn prop_unknown_config_keys_rejected(key in "[a-z._]{1,30}") {
        let known = VALID_CONFIG_KEYS.contains(&key.as_str());
        prop_assert_eq!(validate_config_key(&key).is_ok(), known);
    }

    /// Quoted values never leave a single quote unescaped.
    #[test]
    fn prop_shell_quote_is_single_word(value in ".{0,40}") {
        let quoted = shell_quote(&value);
        if quoted.starts_with('\'') {
            prop_assert!(quoted.ends_with('\''));
            let inner = &quoted[1..quoted.len() - 1];
            prop_assert_eq!(inner.replace(r"'\''", ""), value.replace('\'', ""));
        } else {
            prop_assert_eq!(quoted, value);
        }
    }
}
