// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The layout seam.
//!
//! Layout algorithms live outside this crate. A [`Scene`](crate::scene::Scene)
//! with an installed [`LayoutEngine`] asks it once per render to lay out the
//! whole tree against the target viewport size, then writes the resulting
//! parent-relative rectangles back into the [`NodeStore`]. Writing an
//! unchanged rectangle does not mark the node dirty, so a stable layout
//! produces no damage.

use alloc::vec::Vec;

use kurbo::{Rect, Size};

use crate::node::{NodeId, NodeStore};

/// Base text direction handed to the layout engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Left to right.
    #[default]
    Ltr,
    /// Right to left.
    Rtl,
}

/// Computes parent-relative rectangles for a subtree.
pub trait LayoutEngine {
    /// Lays out the subtree rooted at `root` within `available`, pushing one
    /// rectangle per node into `out`.
    ///
    /// Nodes omitted from `out` keep their current layout rectangle.
    fn compute_layout(
        &mut self,
        tree: &NodeStore,
        root: NodeId,
        available: Size,
        direction: Direction,
        out: &mut LayoutResults,
    );
}

/// Per-node rectangles produced by a [`LayoutEngine`].
#[derive(Clone, Debug, Default)]
pub struct LayoutResults {
    rects: Vec<(NodeId, Rect)>,
}

impl LayoutResults {
    /// Creates an empty result buffer.
    #[must_use]
    pub const fn new() -> Self {
        Self { rects: Vec::new() }
    }

    /// Records the parent-relative rectangle of `node`.
    pub fn set(&mut self, node: NodeId, rect: Rect) {
        self.rects.push((node, rect));
    }

    /// Returns the recorded rectangles in insertion order.
    #[must_use]
    pub fn rects(&self) -> &[(NodeId, Rect)] {
        &self.rects
    }

    /// Returns the number of recorded rectangles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rects.len()
    }

    /// Returns `true` if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }

    /// Clears all recorded rectangles.
    pub fn clear(&mut self) {
        self.rects.clear();
    }

    /// Writes every recorded rectangle into `tree`, skipping stale handles.
    ///
    /// Later entries for the same node win.
    pub fn apply(&self, tree: &mut NodeStore) {
        for &(node, rect) in &self.rects {
            if tree.is_alive(node) {
                tree.set_layout_rect(node, rect);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Column;

    impl LayoutEngine for Column {
        fn compute_layout(
            &mut self,
            tree: &NodeStore,
            root: NodeId,
            available: Size,
            _direction: Direction,
            out: &mut LayoutResults,
        ) {
            out.set(root, Rect::from_origin_size((0.0, 0.0), available));
            let mut y = 0.0;
            for child in tree.children(root) {
                out.set(child, Rect::new(0.0, y, available.width, y + 10.0));
                y += 10.0;
            }
        }
    }

    #[test]
    fn apply_writes_rects() {
        let mut tree = NodeStore::new();
        let root = tree.create_node();
        let a = tree.create_node();
        let b = tree.create_node();
        tree.add_child(root, a);
        tree.add_child(root, b);

        let mut out = LayoutResults::new();
        Column.compute_layout(&tree, root, Size::new(50.0, 40.0), Direction::Ltr, &mut out);
        assert_eq!(out.len(), 3);
        out.apply(&mut tree);

        assert_eq!(tree.layout_rect(b), Rect::new(0.0, 10.0, 50.0, 20.0));
    }

    #[test]
    fn stable_layout_produces_no_geometry_changes() {
        let mut tree = NodeStore::new();
        let root = tree.create_node();
        let mut out = LayoutResults::new();
        Column.compute_layout(&tree, root, Size::new(5.0, 5.0), Direction::Rtl, &mut out);
        out.apply(&mut tree);
        let _ = tree.evaluate();

        out.apply(&mut tree);
        assert!(tree.evaluate().geometry.is_empty());
    }

    #[test]
    fn stale_handles_are_skipped() {
        let mut tree = NodeStore::new();
        let gone = tree.create_node();
        tree.destroy_node(gone);
        let mut out = LayoutResults::new();
        out.set(gone, Rect::new(0.0, 0.0, 1.0, 1.0));
        out.apply(&mut tree);
    }
}
