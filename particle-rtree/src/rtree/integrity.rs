//! Structural integrity checks for the R-Tree.

use std::fmt;

use super::rtree_config::RTreeConfig;
use super::rtree_types::Node;

/// Result of a full-tree integrity check
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    /// Total nodes visited
    pub nodes_checked: u64,
    /// Total leaf entries visited
    pub entries_checked: u64,
    /// Summary of findings
    pub is_valid: bool,
    /// Detailed error messages
    pub errors: Vec<String>,
}

impl IntegrityReport {
    pub fn new() -> Self {
        Self {
            nodes_checked: 0,
            entries_checked: 0,
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub(crate) fn fail(&mut self, message: String) {
        self.is_valid = false;
        self.errors.push(message);
    }
}

impl Default for IntegrityReport {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for IntegrityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "IntegrityReport(valid: {}, nodes: {}, entries: {}",
            self.is_valid, self.nodes_checked, self.entries_checked
        )?;
        for error in &self.errors {
            write!(f, "; {}", error)?;
        }
        write!(f, ")")
    }
}

/// Walks the whole tree and reports every violated invariant:
/// - cached boxes equal the union of their contents
/// - no node holds more than `max_entries` items
/// - no non-root node holds fewer than `min_entries` items
/// - an internal root has at least two children
/// - all leaves sit at the same depth
/// - every entry box is finite and well-formed
/// - the number of entries matches `expected_entries`
pub(crate) fn check_tree<P>(
    root: Option<&Node<P>>,
    config: &RTreeConfig,
    expected_entries: u64,
) -> IntegrityReport {
    let mut report = IntegrityReport::new();

    if let Some(root) = root {
        if let Node::Internal { children, .. } = root {
            if children.len() < 2 {
                report.fail(format!(
                    "internal root has {} children; it should have collapsed",
                    children.len()
                ));
            }
        }
        if root.is_leaf() && root.is_empty() {
            report.fail("root leaf is empty; the tree should have no root".to_string());
        }

        let mut leaf_depth = None;
        check_node(root, 0, true, config, &mut leaf_depth, &mut report);
    }

    if report.entries_checked != expected_entries {
        report.fail(format!(
            "tree holds {} entries but {} were recorded",
            report.entries_checked, expected_entries
        ));
    }

    report
}

fn check_node<P>(
    node: &Node<P>,
    depth: usize,
    is_root: bool,
    config: &RTreeConfig,
    leaf_depth: &mut Option<usize>,
    report: &mut IntegrityReport,
) {
    report.nodes_checked += 1;

    let cached = *node.bbox();
    let computed = node.compute_bbox();
    if cached != computed {
        report.fail(format!(
            "node at depth {} caches {} but its contents span {}",
            depth, cached, computed
        ));
    }

    if node.is_overfull(config.max_entries()) {
        report.fail(format!(
            "node at depth {} holds {} items, above the limit of {}",
            depth,
            node.len(),
            config.max_entries()
        ));
    }
    if !is_root && node.is_underfull(config.min_entries()) {
        report.fail(format!(
            "node at depth {} holds {} items, below the minimum of {}",
            depth,
            node.len(),
            config.min_entries()
        ));
    }

    match node {
        Node::Leaf { entries, .. } => {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => report.fail(format!(
                    "leaf at depth {} but other leaves are at depth {}",
                    depth, expected
                )),
                Some(_) => {}
            }
            for entry in entries {
                report.entries_checked += 1;
                if !entry.bbox.is_valid() {
                    report.fail(format!("entry has malformed bounds {}", entry.bbox));
                }
            }
        }
        Node::Internal { children, .. } => {
            for child in children {
                check_node(child, depth + 1, false, config, leaf_depth, report);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bounding_box::BoundingBox;
    use crate::rtree::rtree_types::Entry;
    use std::sync::Arc;

    fn leaf(boxes: &[(f64, f64)]) -> Node<u32> {
        Node::new_leaf(
            boxes
                .iter()
                .map(|&(x, y)| Entry::new(BoundingBox::new(x, y, x + 1.0, y + 1.0), Arc::new(0)))
                .collect(),
        )
    }

    #[test]
    fn test_empty_tree_is_valid() {
        let report = check_tree::<u32>(None, &RTreeConfig::default(), 0);
        assert!(report.is_valid, "{}", report);
        assert_eq!(report.nodes_checked, 0);
    }

    #[test]
    fn test_valid_two_level_tree() {
        let root = Node::new_internal(vec![
            leaf(&[(0.0, 0.0), (1.0, 1.0)]),
            leaf(&[(5.0, 5.0), (6.0, 6.0)]),
        ]);
        let report = check_tree(Some(&root), &RTreeConfig::default(), 4);
        assert!(report.is_valid, "{}", report);
        assert_eq!(report.nodes_checked, 3);
        assert_eq!(report.entries_checked, 4);
    }

    #[test]
    fn test_detects_stale_bounds() {
        let mut root = leaf(&[(0.0, 0.0), (4.0, 4.0)]);
        if let Node::Leaf { entries, .. } = &mut root {
            entries[1].bbox = BoundingBox::new(40.0, 40.0, 41.0, 41.0);
        }
        let report = check_tree(Some(&root), &RTreeConfig::default(), 2);
        assert!(!report.is_valid);
        assert!(report.errors[0].contains("caches"));
    }

    #[test]
    fn test_detects_overfull_and_underfull_nodes() {
        let root = Node::new_internal(vec![
            leaf(&[(0.0, 0.0), (1.0, 1.0), (2.0, 2.0), (3.0, 3.0)]),
            leaf(&[(5.0, 5.0)]),
        ]);
        let report = check_tree(Some(&root), &RTreeConfig::default(), 5);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("above the limit")));
        assert!(report.errors.iter().any(|e| e.contains("below the minimum")));
    }

    #[test]
    fn test_detects_unbalanced_leaves() {
        let deep = Node::new_internal(vec![leaf(&[(0.0, 0.0), (1.0, 1.0)]), leaf(&[(2.0, 2.0), (3.0, 3.0)])]);
        let shallow = leaf(&[(8.0, 8.0), (9.0, 9.0)]);
        let root = Node::new_internal(vec![deep, shallow]);
        let report = check_tree(Some(&root), &RTreeConfig::default(), 6);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("other leaves")));
    }

    #[test]
    fn test_detects_uncollapsed_root_and_count_mismatch() {
        let root = Node::new_internal(vec![leaf(&[(0.0, 0.0), (1.0, 1.0)])]);
        let report = check_tree(Some(&root), &RTreeConfig::default(), 3);
        assert!(!report.is_valid);
        assert!(report.errors.iter().any(|e| e.contains("collapsed")));
        assert!(report.errors.iter().any(|e| e.contains("were recorded")));
    }
}
