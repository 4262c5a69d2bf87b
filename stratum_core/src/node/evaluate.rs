// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree evaluation and change collection.
//!
//! Evaluation follows a drain-recompute pattern for each dirty channel:
//!
//! 1. **GEOMETRY** — Drain dirty indices, recompute each node's
//!    `world_rect` as the layout rectangle offset by the parent's world
//!    origin.
//! 2. **VISIBILITY** — Drain dirty indices, recompute
//!    `effective_visible` as `parent_effective_visible && visible` and
//!    record transitions.
//! 3. **CONTENT** / **HINTS** — Drain dirty indices (no recomputation).
//! 4. **DAMAGE** — Drain dirty indices and move each node's pending
//!    damage region out of the store.
//! 5. **TOPOLOGY** — Drain and report whether anything moved.
//!
//! Recomputed indices are processed parent-before-child (sorted by depth),
//! so inherited values always read an up-to-date parent.

use alloc::vec::Vec;

use kurbo::Vec2;

use super::id::{INVALID, NodeId};
use super::store::NodeStore;
use crate::dirty;
use crate::region::Region;

/// The set of changes produced by a single [`NodeStore::evaluate`] call.
///
/// Fields hold raw slot indices so consumers can index the store's arrays
/// through the `*_at()` accessors without generation checks.
#[derive(Clone, Debug, Default)]
pub struct NodeChanges {
    /// Nodes whose world rectangle was recomputed.
    pub geometry: Vec<u32>,
    /// Nodes that became effectively visible.
    pub shown: Vec<u32>,
    /// Nodes that became effectively hidden.
    pub hidden: Vec<u32>,
    /// Nodes whose content surface changed.
    pub content: Vec<u32>,
    /// Nodes whose hints, flags, or tracker changed.
    pub hints: Vec<u32>,
    /// Self-declared damage, node-local, per node.
    pub damage: Vec<(u32, Region)>,
    /// Nodes that moved in the tree (including every descendant of a moved
    /// node), deduplicated.
    pub reparented: Vec<u32>,
    /// Nodes created since the last evaluate.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last evaluate.
    pub removed: Vec<NodeId>,
    /// Whether the tree topology changed.
    pub topology_changed: bool,
}

impl NodeChanges {
    /// Clears all change lists.
    pub fn clear(&mut self) {
        self.geometry.clear();
        self.shown.clear();
        self.hidden.clear();
        self.content.clear();
        self.hints.clear();
        self.damage.clear();
        self.reparented.clear();
        self.added.clear();
        self.removed.clear();
        self.topology_changed = false;
    }

    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.geometry.is_empty()
            && self.shown.is_empty()
            && self.hidden.is_empty()
            && self.content.is_empty()
            && self.hints.is_empty()
            && self.damage.is_empty()
            && self.reparented.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

impl NodeStore {
    /// Evaluates the tree, recomputing inherited properties and returning
    /// the set of changes.
    pub fn evaluate(&mut self) -> NodeChanges {
        let mut changes = NodeChanges::default();
        self.evaluate_into(&mut changes);
        changes
    }

    /// Like [`evaluate`](Self::evaluate), but reuses a caller-provided buffer.
    pub fn evaluate_into(&mut self, changes: &mut NodeChanges) {
        changes.clear();

        // GEOMETRY: world = layout offset by the parent's world origin.
        let mut geometry: Vec<u32> = self
            .dirty
            .drain(dirty::GEOMETRY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();
        self.sort_parent_first(&mut geometry);
        for &idx in &geometry {
            let p = self.parent[idx as usize];
            let origin = if p != INVALID {
                self.world_rect[p as usize].origin().to_vec2()
            } else {
                Vec2::ZERO
            };
            self.world_rect[idx as usize] = self.layout_rect[idx as usize] + origin;
        }
        changes.geometry = geometry;

        // VISIBILITY: effective = parent effective && own flag.
        let mut visibility: Vec<u32> = self
            .dirty
            .drain(dirty::VISIBILITY)
            .affected()
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();
        self.sort_parent_first(&mut visibility);
        for &idx in &visibility {
            let p = self.parent[idx as usize];
            let parent_visible = p == INVALID || self.effective_visible[p as usize];
            let new_visible = parent_visible && self.visible[idx as usize];
            if new_visible != self.effective_visible[idx as usize] {
                if new_visible {
                    changes.shown.push(idx);
                } else {
                    changes.hidden.push(idx);
                }
                self.effective_visible[idx as usize] = new_visible;
            }
        }

        changes.content = self
            .dirty
            .drain(dirty::CONTENT)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        changes.hints = self
            .dirty
            .drain(dirty::HINTS)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();

        let damaged: Vec<u32> = self
            .dirty
            .drain(dirty::DAMAGE)
            .deterministic()
            .run()
            .filter(|&idx| self.alive[idx as usize])
            .collect();
        for idx in damaged {
            let region = core::mem::take(&mut self.damage[idx as usize]);
            if !region.is_empty() {
                changes.damage.push((idx, region));
            }
        }

        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // A moved node drags its subtree to a new z position.
        let moved = core::mem::take(&mut self.pending_reparented);
        for idx in moved {
            if self.alive[idx as usize] {
                self.collect_subtree(idx, &mut changes.reparented);
            }
        }
        changes.reparented.sort_unstable();
        changes.reparented.dedup();

        core::mem::swap(&mut self.pending_added, &mut changes.added);
        changes.added.retain(|&idx| self.alive[idx as usize]);
        core::mem::swap(&mut self.pending_removed, &mut changes.removed);
    }

    /// Returns the depth of a node (roots are at depth 0).
    pub(crate) fn depth_at(&self, idx: u32) -> u32 {
        let mut depth = 0;
        let mut cur = self.parent[idx as usize];
        while cur != INVALID {
            depth += 1;
            cur = self.parent[cur as usize];
        }
        depth
    }

    fn sort_parent_first(&self, indices: &mut [u32]) {
        indices.sort_by_cached_key(|&idx| (self.depth_at(idx), idx));
    }

    fn collect_subtree(&self, idx: u32, out: &mut Vec<u32>) {
        out.push(idx);
        let mut child = self.first_child[idx as usize];
        while child != INVALID {
            self.collect_subtree(child, out);
            child = self.next_sibling[child as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use kurbo::Rect;

    use super::*;
    use crate::node::SurfaceId;
    use crate::region::IRect;

    #[test]
    fn evaluate_computes_world_rects() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();

        store.set_layout_rect(parent, Rect::new(10.0, 20.0, 110.0, 120.0));
        store.set_layout_rect(child, Rect::new(5.0, 5.0, 15.0, 15.0));
        store.add_child(parent, child);

        let _changes = store.evaluate();

        assert_eq!(store.world_rect(parent), Rect::new(10.0, 20.0, 110.0, 120.0));
        assert_eq!(store.world_rect(child), Rect::new(15.0, 25.0, 25.0, 35.0));
    }

    #[test]
    fn parent_move_propagates_to_grandchildren() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();
        store.add_child(a, b);
        store.add_child(b, c);
        store.set_layout_rect(b, Rect::new(1.0, 1.0, 50.0, 50.0));
        store.set_layout_rect(c, Rect::new(2.0, 2.0, 4.0, 4.0));
        let _ = store.evaluate();
        assert_eq!(store.world_rect(c), Rect::new(3.0, 3.0, 5.0, 5.0));

        store.set_layout_rect(a, Rect::new(100.0, 0.0, 200.0, 100.0));
        let changes = store.evaluate();
        assert!(changes.geometry.contains(&c.idx));
        assert_eq!(store.world_rect(c), Rect::new(103.0, 3.0, 105.0, 5.0));
    }

    #[test]
    fn hidden_parent_hides_subtree() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();
        store.add_child(parent, child);
        let _ = store.evaluate();

        store.set_visible(parent, false);
        let changes = store.evaluate();
        assert!(!store.effective_visible(child));
        assert!(changes.hidden.contains(&parent.idx));
        assert!(changes.hidden.contains(&child.idx));

        store.set_visible(parent, true);
        let changes = store.evaluate();
        assert!(store.effective_visible(child));
        assert!(changes.shown.contains(&child.idx));
    }

    #[test]
    fn hidden_child_stays_hidden_when_parent_shown() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();
        store.add_child(parent, child);
        store.set_visible(child, false);
        store.set_visible(parent, false);
        let _ = store.evaluate();

        store.set_visible(parent, true);
        let changes = store.evaluate();
        assert!(!store.effective_visible(child));
        assert!(!changes.shown.contains(&child.idx));
    }

    #[test]
    fn reparent_reports_whole_subtree() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let leaf = store.create_node();
        store.add_child(root, a);
        store.add_child(root, b);
        store.add_child(a, leaf);
        let _ = store.evaluate();

        store.reparent(a, b);
        let changes = store.evaluate();
        assert!(changes.topology_changed);
        assert!(changes.reparented.contains(&a.idx));
        assert!(changes.reparented.contains(&leaf.idx));
        assert!(!changes.reparented.contains(&b.idx));
    }

    #[test]
    fn lifecycle_lists_are_reported_once() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        let changes = store.evaluate();
        assert_eq!(changes.added, [a.idx]);

        store.destroy_node(a);
        let changes = store.evaluate();
        assert_eq!(changes.removed, [a]);
        assert!(changes.added.is_empty());

        let changes = store.evaluate();
        assert!(changes.is_empty());
    }

    #[test]
    fn created_then_destroyed_is_not_added() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        store.destroy_node(a);
        let changes = store.evaluate();
        assert!(changes.added.is_empty());
        assert_eq!(changes.removed, [a]);
    }

    #[test]
    fn content_and_damage_are_collected() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        let _ = store.evaluate();

        store.set_content(a, Some(SurfaceId(1)));
        store.add_damage(a, IRect::new(1, 1, 2, 2));
        let changes = store.evaluate();
        assert_eq!(changes.content, [a.idx]);
        assert_eq!(changes.damage.len(), 1);
    }
}
