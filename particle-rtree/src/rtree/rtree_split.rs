//! Axial node splitting.
//!
//! An overflowing node is cut along the axis on which its contents are most
//! spread out. Items are ordered by the center of their boxes on that axis
//! and divided into a lower and an upper half. Cutting across the long axis
//! keeps the two halves' boxes from overlapping much, which bounds query
//! fan-out.

use crate::bounding_box::BoundingBox;

use super::rtree_types::{Entry, Node};

/// Axis along which a node is split.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitAxis {
    X,
    Y,
}

impl SplitAxis {
    fn index(self) -> usize {
        match self {
            SplitAxis::X => 0,
            SplitAxis::Y => 1,
        }
    }
}

/// Anything that carries a bounding box: leaf entries and child nodes.
pub trait Bounded {
    fn bounds(&self) -> &BoundingBox;
}

impl<P> Bounded for Entry<P> {
    fn bounds(&self) -> &BoundingBox {
        &self.bbox
    }
}

impl<P> Bounded for Node<P> {
    fn bounds(&self) -> &BoundingBox {
        self.bbox()
    }
}

/// Picks the axis of greatest extent. Equal extents resolve to `X`.
pub fn choose_split_axis(bbox: &BoundingBox) -> SplitAxis {
    if bbox.height() > bbox.width() {
        SplitAxis::Y
    } else {
        SplitAxis::X
    }
}

/// Splits a node holding at least two items into two nodes of the same kind.
///
/// Every item ends up in exactly one half, both halves are non-empty and
/// their sizes differ by at most one. The lower half gets `len / 2` items.
pub fn split_node<P>(node: Node<P>) -> (Node<P>, Node<P>) {
    debug_assert!(node.len() >= 2, "cannot split a node with {} items", node.len());
    let axis = choose_split_axis(&node.compute_bbox());

    match node {
        Node::Leaf { entries, .. } => {
            let (lower, upper) = split_by_center(entries, axis);
            (Node::new_leaf(lower), Node::new_leaf(upper))
        }
        Node::Internal { children, .. } => {
            let (lower, upper) = split_by_center(children, axis);
            (Node::new_internal(lower), Node::new_internal(upper))
        }
    }
}

fn split_by_center<T: Bounded>(mut items: Vec<T>, axis: SplitAxis) -> (Vec<T>, Vec<T>) {
    let axis = axis.index();
    items.sort_by(|a, b| center_on(a.bounds(), axis).total_cmp(&center_on(b.bounds(), axis)));

    let mid = items.len() / 2;
    let upper = items.split_off(mid);
    (items, upper)
}

fn center_on(bbox: &BoundingBox, axis: usize) -> f64 {
    let center = bbox.center();
    if axis == 0 {
        center.x
    } else {
        center.y
    }
}
