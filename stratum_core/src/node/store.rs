// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays node storage with allocation, topology, and property management.

use alloc::vec::Vec;

use kurbo::Rect;
use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use super::id::{INVALID, NodeId, SurfaceId};
use super::traverse::Children;
use crate::dirty;
use crate::region::{IRect, Region};
use crate::tracker::BackgroundTracker;

bitflags::bitflags! {
    /// Per-node behaviour flags consumed by the scene.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct NodeFlags: u8 {
        /// Descendants are clipped to this node's rectangle.
        const CLIPS_CHILDREN = 1 << 0;
        /// The subtree is rendered by a nested scene; traversal stops here.
        const SCENE_BOUNDARY = 1 << 1;
        /// The node caches its content in a baked surface.
        const BAKEABLE = 1 << 2;
        /// The node composites a live capture of what is behind it.
        const BACKGROUND_EFFECT = 1 << 3;
    }
}

/// Struct-of-arrays storage for all nodes.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Regions attached to a node (opaque hint, invisible hint, declared damage)
/// are expressed in node-local logical units: `(0, 0)` is the top-left corner
/// of the node's world rectangle.
#[derive(Debug)]
pub struct NodeStore {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) last_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Local properties (set by callers or the layout engine) --
    pub(crate) layout_rect: Vec<Rect>,
    pub(crate) visible: Vec<bool>,
    pub(crate) flags: Vec<NodeFlags>,
    pub(crate) content: Vec<Option<SurfaceId>>,
    pub(crate) opaque: Vec<Region>,
    pub(crate) invisible: Vec<Region>,
    pub(crate) damage: Vec<Region>,
    pub(crate) tracker: Vec<Option<BackgroundTracker>>,

    // -- Computed properties (written by evaluate) --
    pub(crate) world_rect: Vec<Rect>,
    pub(crate) effective_visible: Vec<bool>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Dirty tracking --
    pub(crate) dirty: DirtyTracker<u32>,

    // -- Lifecycle tracking --
    pub(crate) pending_added: Vec<u32>,
    pub(crate) pending_removed: Vec<NodeId>,
    pub(crate) pending_reparented: Vec<u32>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    /// Creates an empty node store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            last_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            layout_rect: Vec::new(),
            visible: Vec::new(),
            flags: Vec::new(),
            content: Vec::new(),
            opaque: Vec::new(),
            invisible: Vec::new(),
            damage: Vec::new(),
            tracker: Vec::new(),
            world_rect: Vec::new(),
            effective_visible: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_reparented: Vec::new(),
        }
    }

    // -- Allocation API --

    /// Creates a new node and returns its handle.
    ///
    /// The node starts visible, with an empty layout rectangle, no content,
    /// no hints, no flags, and no parent.
    pub fn create_node(&mut self) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            let i = idx as usize;
            self.generation[i] += 1;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.last_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.layout_rect[i] = Rect::ZERO;
            self.visible[i] = true;
            self.flags[i] = NodeFlags::empty();
            self.content[i] = None;
            self.opaque[i].clear();
            self.invisible[i].clear();
            self.damage[i].clear();
            self.tracker[i] = None;
            self.world_rect[i] = Rect::ZERO;
            self.effective_visible[i] = true;
            self.alive[i] = true;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.last_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.layout_rect.push(Rect::ZERO);
            self.visible.push(true);
            self.flags.push(NodeFlags::empty());
            self.content.push(None);
            self.opaque.push(Region::new());
            self.invisible.push(Region::new());
            self.damage.push(Region::new());
            self.tracker.push(None);
            self.world_rect.push(Rect::ZERO);
            self.effective_visible.push(true);
            self.generation.push(0);
            self.alive.push(true);
            idx
        };

        self.pending_added.push(idx);
        self.dirty.mark(idx, dirty::TOPOLOGY);

        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Destroys a node, freeing its slot for reuse.
    ///
    /// Every scene that presented the node damages its last visible area on
    /// the next render.
    ///
    /// # Panics
    ///
    /// Panics if the node has children (remove them first) or if the handle
    /// is stale.
    pub fn destroy_node(&mut self, id: NodeId) {
        self.validate(id);
        let idx = id.idx;
        assert!(
            self.first_child[idx as usize] == INVALID,
            "cannot destroy node with children"
        );

        if self.parent[idx as usize] != INVALID {
            self.unlink_from_parent(idx);
        }

        self.dirty.remove_key(idx);

        // Bump generation so old handles immediately fail validation.
        self.generation[idx as usize] += 1;
        self.alive[idx as usize] = false;
        self.damage[idx as usize].clear();
        self.tracker[idx as usize] = None;

        self.free_list.push(idx);
        self.pending_removed.push(id);
        self.dirty.mark(idx, dirty::TOPOLOGY);
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.alive[id.idx as usize]
            && self.generation[id.idx as usize] == id.generation
    }

    /// Returns the live handle for a raw slot index, if the slot is in use.
    #[must_use]
    pub fn id_at(&self, idx: u32) -> Option<NodeId> {
        (idx < self.len && self.alive[idx as usize]).then(|| NodeId {
            idx,
            generation: self.generation[idx as usize],
        })
    }

    // -- Topology API --

    /// Adds `child` as the last (front-most) child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, or if `child` already has a parent.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            self.parent[child.idx as usize] == INVALID,
            "child already has a parent"
        );
        self.link_last(parent.idx, child.idx);
    }

    /// Removes `child` from its current parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        assert!(self.parent[c as usize] != INVALID, "node has no parent");

        let p = self.parent[c as usize];
        self.unlink_from_parent(c);

        self.dirty.remove_dependency(c, p, dirty::GEOMETRY);
        self.dirty.remove_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.pending_reparented.push(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Moves `child` to be the front-most child of `new_parent`.
    ///
    /// If `child` already has a parent, it is removed first.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    pub fn reparent(&mut self, child: NodeId, new_parent: NodeId) {
        self.validate(child);
        self.validate(new_parent);

        let c = child.idx;
        if self.parent[c as usize] != INVALID {
            let old_p = self.parent[c as usize];
            self.unlink_from_parent(c);
            self.dirty.remove_dependency(c, old_p, dirty::GEOMETRY);
            self.dirty.remove_dependency(c, old_p, dirty::VISIBILITY);
            self.dirty.mark(old_p, dirty::TOPOLOGY);
        }
        self.link_last(new_parent.idx, c);
    }

    /// Inserts `child` directly behind `sibling` in z order.
    ///
    /// `child` must not already have a parent. `sibling` must have a parent.
    ///
    /// # Panics
    ///
    /// Panics if handles are stale, `child` already has a parent, or `sibling`
    /// has no parent.
    pub fn insert_before(&mut self, child: NodeId, sibling: NodeId) {
        self.validate(child);
        self.validate(sibling);
        let c = child.idx;
        let s = sibling.idx;
        assert!(
            self.parent[c as usize] == INVALID,
            "child already has a parent"
        );
        let p = self.parent[s as usize];
        assert!(p != INVALID, "sibling has no parent");

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];

        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;

        self.attach_bookkeeping(p, c);
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        self.id_at(self.parent[id.idx as usize])
    }

    /// Returns an iterator over the direct children of a node, back to front.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(
            self,
            self.first_child[id.idx as usize],
            self.last_child[id.idx as usize],
        )
    }

    /// Returns whether the node has at least one child.
    #[must_use]
    pub fn has_children(&self, id: NodeId) -> bool {
        self.validate(id);
        self.first_child[id.idx as usize] != INVALID
    }

    // -- Property getters (read-only, no dirty marking) --

    /// Returns the parent-relative layout rectangle.
    #[must_use]
    pub fn layout_rect(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.layout_rect[id.idx as usize]
    }

    /// Returns the node's own visibility flag.
    #[must_use]
    pub fn visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.visible[id.idx as usize]
    }

    /// Returns the node flags.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> NodeFlags {
        self.validate(id);
        self.flags[id.idx as usize]
    }

    /// Returns the content surface.
    #[must_use]
    pub fn content(&self, id: NodeId) -> Option<SurfaceId> {
        self.validate(id);
        self.content[id.idx as usize]
    }

    /// Returns the declared opaque region (node-local).
    #[must_use]
    pub fn opaque_region(&self, id: NodeId) -> &Region {
        self.validate(id);
        &self.opaque[id.idx as usize]
    }

    /// Returns the declared fully transparent region (node-local).
    #[must_use]
    pub fn invisible_region(&self, id: NodeId) -> &Region {
        self.validate(id);
        &self.invisible[id.idx as usize]
    }

    /// Returns the background tracker configuration, if any.
    #[must_use]
    pub fn background_tracker(&self, id: NodeId) -> Option<&BackgroundTracker> {
        self.validate(id);
        self.tracker[id.idx as usize].as_ref()
    }

    /// Returns the computed world rectangle.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn world_rect(&self, id: NodeId) -> Rect {
        self.validate(id);
        self.world_rect[id.idx as usize]
    }

    /// Returns whether the node and all of its ancestors are visible.
    ///
    /// Only valid after [`evaluate`](Self::evaluate) has been called.
    #[must_use]
    pub fn effective_visible(&self, id: NodeId) -> bool {
        self.validate(id);
        self.effective_visible[id.idx as usize]
    }

    // -- Mutation API (auto-marks dirty) --

    /// Sets the parent-relative layout rectangle.
    ///
    /// Marks the GEOMETRY channel with eager propagation to descendants when
    /// the value actually changes.
    pub fn set_layout_rect(&mut self, id: NodeId, rect: Rect) {
        self.validate(id);
        if self.layout_rect[id.idx as usize] == rect {
            return;
        }
        self.layout_rect[id.idx as usize] = rect;
        self.dirty.mark_with(id.idx, dirty::GEOMETRY, &EagerPolicy);
    }

    /// Shows or hides the node and its subtree.
    pub fn set_visible(&mut self, id: NodeId, visible: bool) {
        self.validate(id);
        if self.visible[id.idx as usize] == visible {
            return;
        }
        self.visible[id.idx as usize] = visible;
        self.dirty.mark_with(id.idx, dirty::VISIBILITY, &EagerPolicy);
    }

    /// Sets the node flags.
    pub fn set_flags(&mut self, id: NodeId, flags: NodeFlags) {
        self.validate(id);
        self.flags[id.idx as usize] = flags;
        self.dirty.mark(id.idx, dirty::HINTS);
    }

    /// Sets the content surface. `None` turns the node into a group.
    pub fn set_content(&mut self, id: NodeId, content: Option<SurfaceId>) {
        self.validate(id);
        self.content[id.idx as usize] = content;
        self.dirty.mark(id.idx, dirty::CONTENT);
    }

    /// Declares which node-local pixels are fully opaque.
    pub fn set_opaque_region(&mut self, id: NodeId, region: Region) {
        self.validate(id);
        self.opaque[id.idx as usize] = region;
        self.dirty.mark(id.idx, dirty::HINTS);
    }

    /// Declares which node-local pixels are fully transparent.
    pub fn set_invisible_region(&mut self, id: NodeId, region: Region) {
        self.validate(id);
        self.invisible[id.idx as usize] = region;
        self.dirty.mark(id.idx, dirty::HINTS);
    }

    /// Attaches or removes a background damage tracker.
    pub fn set_background_tracker(&mut self, id: NodeId, tracker: Option<BackgroundTracker>) {
        self.validate(id);
        self.tracker[id.idx as usize] = tracker;
        self.dirty.mark(id.idx, dirty::HINTS);
    }

    /// Declares that a node-local rectangle of the node's content changed.
    ///
    /// Damage accumulates until the next [`evaluate`](Self::evaluate).
    pub fn add_damage(&mut self, id: NodeId, rect: IRect) {
        self.validate(id);
        self.damage[id.idx as usize].union_rect(rect);
        self.dirty.mark(id.idx, dirty::DAMAGE);
    }

    /// Declares that a node-local region of the node's content changed.
    pub fn add_damage_region(&mut self, id: NodeId, region: &Region) {
        self.validate(id);
        self.damage[id.idx as usize].union_with(region);
        self.dirty.mark(id.idx, dirty::DAMAGE);
    }

    // -- Raw-index accessors for the scene --
    //
    // These accept raw slot indices rather than `NodeId` handles, skipping
    // generation validation. Only use with indices reached through topology
    // links of a live node.

    #[inline]
    pub(crate) fn world_rect_at(&self, idx: u32) -> Rect {
        self.world_rect[idx as usize]
    }

    #[inline]
    pub(crate) fn effective_visible_at(&self, idx: u32) -> bool {
        self.effective_visible[idx as usize]
    }

    #[inline]
    pub(crate) fn flags_at(&self, idx: u32) -> NodeFlags {
        self.flags[idx as usize]
    }

    #[inline]
    pub(crate) fn content_at(&self, idx: u32) -> Option<SurfaceId> {
        self.content[idx as usize]
    }

    #[inline]
    pub(crate) fn opaque_at(&self, idx: u32) -> &Region {
        &self.opaque[idx as usize]
    }

    #[inline]
    pub(crate) fn invisible_at(&self, idx: u32) -> &Region {
        &self.invisible[idx as usize]
    }

    #[inline]
    pub(crate) fn tracker_at(&self, idx: u32) -> Option<&BackgroundTracker> {
        self.tracker[idx as usize].as_ref()
    }

    #[inline]
    pub(crate) fn last_child_at(&self, idx: u32) -> u32 {
        self.last_child[idx as usize]
    }

    #[inline]
    pub(crate) fn prev_sibling_at(&self, idx: u32) -> u32 {
        self.prev_sibling[idx as usize]
    }

    #[inline]
    pub(crate) fn has_children_at(&self, idx: u32) -> bool {
        self.first_child[idx as usize] != INVALID
    }

    #[inline]
    pub(crate) fn generation_at(&self, idx: u32) -> u32 {
        self.generation[idx as usize]
    }

    #[inline]
    pub(crate) fn handle_at(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    // -- Internal helpers --

    /// Panics if the handle is stale.
    pub(crate) fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }

    /// Appends `c` as the last child of `p` and records the attachment.
    fn link_last(&mut self, p: u32, c: u32) {
        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = INVALID;
        let last = self.last_child[p as usize];
        self.prev_sibling[c as usize] = last;
        if last == INVALID {
            self.first_child[p as usize] = c;
        } else {
            self.next_sibling[last as usize] = c;
        }
        self.last_child[p as usize] = c;
        self.attach_bookkeeping(p, c);
    }

    /// Dirty edges and lifecycle marks shared by every attach operation.
    fn attach_bookkeeping(&mut self, p: u32, c: u32) {
        if self.next_sibling[c as usize] == INVALID {
            self.last_child[p as usize] = c;
        }
        let _ = self.dirty.add_dependency(c, p, dirty::GEOMETRY);
        let _ = self.dirty.add_dependency(c, p, dirty::VISIBILITY);

        self.mark_subtree_inherited_dirty(c);
        self.pending_reparented.push(c);
        self.dirty.mark(p, dirty::TOPOLOGY);
    }

    /// Removes `idx` from its parent's child list without touching dirty state.
    fn unlink_from_parent(&mut self, idx: u32) {
        let p = self.parent[idx as usize];
        let prev = self.prev_sibling[idx as usize];
        let next = self.next_sibling[idx as usize];

        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }

        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        } else {
            self.last_child[p as usize] = prev;
        }

        self.parent[idx as usize] = INVALID;
        self.prev_sibling[idx as usize] = INVALID;
        self.next_sibling[idx as usize] = INVALID;
    }

    /// Marks the subtree rooted at `idx` dirty for inherited channels.
    fn mark_subtree_inherited_dirty(&mut self, idx: u32) {
        self.dirty.mark_with(idx, dirty::GEOMETRY, &EagerPolicy);
        self.dirty.mark_with(idx, dirty::VISIBILITY, &EagerPolicy);
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn create_and_destroy() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        assert!(store.is_alive(id));
        store.destroy_node(id);
        assert!(!store.is_alive(id));
        assert_eq!(store.id_at(id.index()), None);
    }

    #[test]
    fn generation_prevents_stale_access() {
        let mut store = NodeStore::new();
        let id1 = store.create_node();
        store.destroy_node(id1);
        let id2 = store.create_node();
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1));
        assert!(store.is_alive(id2));
        assert_eq!(id1.idx, id2.idx);
        assert_ne!(id1.generation, id2.generation);
    }

    #[test]
    fn reused_slot_starts_clean() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        store.set_content(id, Some(SurfaceId(3)));
        store.set_visible(id, false);
        store.set_opaque_region(id, Region::from(IRect::new(0, 0, 4, 4)));
        store.destroy_node(id);

        let fresh = store.create_node();
        assert_eq!(fresh.index(), id.index());
        assert_eq!(store.content(fresh), None);
        assert!(store.visible(fresh));
        assert!(store.opaque_region(fresh).is_empty());
    }

    #[test]
    fn add_child_and_query() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child1 = store.create_node();
        let child2 = store.create_node();

        store.add_child(parent, child1);
        store.add_child(parent, child2);

        assert_eq!(store.parent(child1), Some(parent));
        assert_eq!(store.parent(child2), Some(parent));
        assert_eq!(store.parent(parent), None);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![child1, child2]);
        let front_to_back: Vec<_> = store.children(parent).rev().collect();
        assert_eq!(front_to_back, vec![child2, child1]);
    }

    #[test]
    fn children_iterator_meets_in_the_middle() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let kids: Vec<_> = (0..3).map(|_| store.create_node()).collect();
        for &k in &kids {
            store.add_child(parent, k);
        }
        let mut it = store.children(parent);
        assert_eq!(it.next(), Some(kids[0]));
        assert_eq!(it.next_back(), Some(kids[2]));
        assert_eq!(it.next(), Some(kids[1]));
        assert_eq!(it.next_back(), None);
        assert_eq!(it.next(), None);
    }

    #[test]
    fn remove_from_parent_works() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();

        store.add_child(parent, child);
        store.remove_from_parent(child);
        assert_eq!(store.parent(child), None);
        assert!(store.children(parent).next().is_none());
        assert!(!store.has_children(parent));
    }

    #[test]
    fn remove_last_child_updates_tail() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        store.add_child(parent, a);
        store.add_child(parent, b);
        store.remove_from_parent(b);

        let c = store.create_node();
        store.add_child(parent, c);
        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, c]);
    }

    #[test]
    fn insert_before_works() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();

        store.add_child(parent, a);
        store.add_child(parent, c);
        store.insert_before(b, c);

        let kids: Vec<_> = store.children(parent).collect();
        assert_eq!(kids, vec![a, b, c]);
        let rev: Vec<_> = store.children(parent).rev().collect();
        assert_eq!(rev, vec![c, b, a]);
    }

    #[test]
    fn reparent_works() {
        let mut store = NodeStore::new();
        let p1 = store.create_node();
        let p2 = store.create_node();
        let child = store.create_node();

        store.add_child(p1, child);
        store.reparent(child, p2);
        assert_eq!(store.parent(child), Some(p2));
        assert!(store.children(p1).next().is_none());
    }

    #[test]
    #[should_panic(expected = "cannot destroy node with children")]
    fn destroy_with_children_panics() {
        let mut store = NodeStore::new();
        let parent = store.create_node();
        let child = store.create_node();
        store.add_child(parent, child);
        store.destroy_node(parent);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_set_layout_rect() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        store.destroy_node(id);
        store.set_layout_rect(id, Rect::new(0.0, 0.0, 1.0, 1.0));
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn destroyed_handle_panics_on_add_child() {
        let mut store = NodeStore::new();
        let root = store.create_node();
        let id = store.create_node();
        store.destroy_node(id);
        store.add_child(root, id);
    }

    #[test]
    #[should_panic(expected = "child already has a parent")]
    fn double_attach_panics() {
        let mut store = NodeStore::new();
        let a = store.create_node();
        let b = store.create_node();
        let c = store.create_node();
        store.add_child(a, c);
        store.add_child(b, c);
    }

    #[test]
    fn set_layout_rect_marks_only_on_change() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        let _ = store.evaluate();

        store.set_layout_rect(id, Rect::new(0.0, 0.0, 10.0, 10.0));
        let changes = store.evaluate();
        assert!(changes.geometry.contains(&id.idx));

        store.set_layout_rect(id, Rect::new(0.0, 0.0, 10.0, 10.0));
        let changes = store.evaluate();
        assert!(changes.geometry.is_empty(), "same value is not a change");
    }

    #[test]
    fn add_damage_accumulates_until_evaluate() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        let _ = store.evaluate();

        store.add_damage(id, IRect::new(0, 0, 5, 5));
        store.add_damage(id, IRect::new(5, 0, 10, 5));
        let changes = store.evaluate();
        assert_eq!(changes.damage.len(), 1);
        assert_eq!(changes.damage[0].0, id.idx);
        assert_eq!(changes.damage[0].1, Region::from(IRect::new(0, 0, 10, 5)));

        let changes = store.evaluate();
        assert!(changes.damage.is_empty());
    }

    #[test]
    fn hint_setters_mark_hints() {
        let mut store = NodeStore::new();
        let id = store.create_node();
        let _ = store.evaluate();

        store.set_opaque_region(id, Region::from(IRect::new(0, 0, 2, 2)));
        let changes = store.evaluate();
        assert!(changes.hints.contains(&id.idx));

        store.set_flags(id, NodeFlags::CLIPS_CHILDREN);
        let changes = store.evaluate();
        assert!(changes.hints.contains(&id.idx));
    }
}
