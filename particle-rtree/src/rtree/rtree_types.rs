//! Core types and data structures for the in-memory R-Tree.
//!
//! This module defines the fundamental types used throughout the R-Tree:
//! - Error types and result types
//! - Node types (Leaf and Internal)
//! - Statistics structures

use std::fmt;
use std::sync::Arc;
use thiserror::Error;

use crate::bounding_box::{union_all, BoundingBox};

// ============================================================================
// Error Types
// ============================================================================

/// Errors that can occur in spatial indexing operations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SpatialError {
    /// Non-finite coordinates, a negative radius or an inverted box.
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

/// Result type for spatial operations
pub type SpatialResult<T> = Result<T, SpatialError>;

// ============================================================================
// Statistics
// ============================================================================

/// Shape of the tree at a point in time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RTreeStats {
    pub total_entries: u64,
    /// Number of levels; 0 for an empty tree, 1 when the root is a leaf
    pub tree_height: u32,
    pub node_count: u64,
    pub leaf_count: u64,
}

/// Statistics about a rebuild
#[derive(Debug, Clone)]
pub struct RebuildStats {
    /// Total entries reinserted
    pub entries_reindexed: u64,
    pub nodes_before: u64,
    pub nodes_after: u64,
    pub height_before: u32,
    pub height_after: u32,
}

// ============================================================================
// Node Types
// ============================================================================

/// An entry in a leaf node: a payload reference and the box it was indexed under.
pub struct Entry<P> {
    pub bbox: BoundingBox,
    pub payload: Arc<P>,
}

impl<P> Entry<P> {
    pub fn new(bbox: BoundingBox, payload: Arc<P>) -> Self {
        Self { bbox, payload }
    }

    /// Reference identity, never geometric or value equality.
    pub fn refers_to(&self, payload: &Arc<P>) -> bool {
        Arc::ptr_eq(&self.payload, payload)
    }
}

impl<P> Clone for Entry<P> {
    fn clone(&self) -> Self {
        Self {
            bbox: self.bbox,
            payload: Arc::clone(&self.payload),
        }
    }
}

impl<P> fmt::Debug for Entry<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("bbox", &self.bbox)
            .field("payload", &Arc::as_ptr(&self.payload))
            .finish()
    }
}

/// Node types in the R-Tree
///
/// `bbox` is a cache of the union of the node's immediate contents and must
/// be refreshed after every structural mutation.
pub enum Node<P> {
    /// Leaf node containing actual entries
    Leaf {
        bbox: BoundingBox,
        entries: Vec<Entry<P>>,
    },
    /// Internal node containing child nodes
    Internal {
        bbox: BoundingBox,
        children: Vec<Node<P>>,
    },
}

impl<P> Node<P> {
    pub fn new_leaf(entries: Vec<Entry<P>>) -> Self {
        let mut node = Node::Leaf {
            bbox: BoundingBox::empty(),
            entries,
        };
        node.refresh_bbox();
        node
    }

    pub fn new_internal(children: Vec<Node<P>>) -> Self {
        let mut node = Node::Internal {
            bbox: BoundingBox::empty(),
            children,
        };
        node.refresh_bbox();
        node
    }

    /// The cached bounding box.
    pub fn bbox(&self) -> &BoundingBox {
        match self {
            Node::Leaf { bbox, .. } => bbox,
            Node::Internal { bbox, .. } => bbox,
        }
    }

    /// Get the bounding box enclosing all children/entries
    pub fn compute_bbox(&self) -> BoundingBox {
        match self {
            Node::Leaf { entries, .. } => union_all(entries.iter().map(|e| &e.bbox)),
            Node::Internal { children, .. } => union_all(children.iter().map(|c| c.bbox())),
        }
    }

    /// Recomputes the cached box from the immediate contents.
    pub fn refresh_bbox(&mut self) {
        let computed = self.compute_bbox();
        match self {
            Node::Leaf { bbox, .. } => *bbox = computed,
            Node::Internal { bbox, .. } => *bbox = computed,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, Node::Leaf { .. })
    }

    pub fn len(&self) -> usize {
        match self {
            Node::Leaf { entries, .. } => entries.len(),
            Node::Internal { children, .. } => children.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_overfull(&self, max_entries: usize) -> bool {
        self.len() > max_entries
    }

    pub fn is_underfull(&self, min_entries: usize) -> bool {
        self.len() < min_entries
    }

    /// Number of levels below and including this node. Leaves are at height 1.
    pub fn height(&self) -> u32 {
        match self {
            Node::Leaf { .. } => 1,
            Node::Internal { children, .. } => {
                1 + children.first().map(|c| c.height()).unwrap_or(0)
            }
        }
    }

    /// Consumes the subtree and moves every leaf entry into `out`.
    pub fn drain_entries_into(self, out: &mut Vec<Entry<P>>) {
        match self {
            Node::Leaf { entries, .. } => out.extend(entries),
            Node::Internal { children, .. } => {
                for child in children {
                    child.drain_entries_into(out);
                }
            }
        }
    }

    /// Visits every leaf entry in the subtree.
    pub fn for_each_entry<F: FnMut(&Entry<P>)>(&self, f: &mut F) {
        match self {
            Node::Leaf { entries, .. } => entries.iter().for_each(|e| f(e)),
            Node::Internal { children, .. } => {
                for child in children {
                    child.for_each_entry(f);
                }
            }
        }
    }
}

impl<P> fmt::Debug for Node<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Leaf { bbox, entries } => f
                .debug_struct("Leaf")
                .field("bbox", bbox)
                .field("entries", entries)
                .finish(),
            Node::Internal { bbox, children } => f
                .debug_struct("Internal")
                .field("bbox", bbox)
                .field("children", children)
                .finish(),
        }
    }
}
