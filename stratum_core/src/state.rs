// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-(node, target) render state.
//!
//! Every target owns a [`StateTable`] indexed by node slot. A slot is tagged
//! with the generation of the node it was created for, so a recycled node
//! slot never inherits the history of the node that previously lived there.

use alloc::vec::Vec;

use crate::dirty::Changes;
use crate::region::{IRect, Region};
use crate::tracker::CaptureState;

/// Outcome of the visibility pass for one node.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Visibility {
    /// The node takes part in this frame.
    #[default]
    Visible,
    /// The node is hidden but its subtree was presented last frame; its
    /// previous area is damaged once, then it becomes [`Skipped`](Self::Skipped).
    PendingClear,
    /// The node and its subtree are not traversed.
    Skipped,
}

/// Cached-surface bookkeeping for bakeable nodes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct BakeState {
    /// Scene-space size of the baked surface.
    pub(crate) size: (i32, i32),
    /// Target scale the surface was baked at.
    pub(crate) scale: (f64, f64),
    /// Whether the surface holds the node's current content.
    pub(crate) valid: bool,
}

impl BakeState {
    pub(crate) fn is_stale(&self, rect: IRect, scale: (f64, f64)) -> bool {
        !self.valid || self.size != (rect.width(), rect.height()) || self.scale != scale
    }
}

/// What a target remembers about one node.
///
/// Created the first time the node is visited on the target; all regions are
/// in the target's scene space.
#[derive(Clone, Debug, Default)]
pub struct NodeTargetState {
    pub(crate) generation: u32,
    pub(crate) last_visited_frame: u64,

    pub(crate) prev_scene_clip: Region,
    pub(crate) prev_scene_rect: Option<IRect>,
    pub(crate) prev_subtree_visible: bool,

    pub(crate) changes: Changes,
    /// Self-declared damage, node-local, not yet consumed.
    pub(crate) pending_damage: Region,

    pub(crate) visibility: Visibility,
    pub(crate) scene_rect: IRect,
    pub(crate) clip: Region,
    pub(crate) damage: Region,
    pub(crate) opaque: Region,
    pub(crate) translucent: Region,
    pub(crate) invisible: Region,
    /// Diagnostic snapshot; not used for drawing.
    pub(crate) opaque_overlay: Region,
    pub(crate) rendered: bool,

    pub(crate) bake: BakeState,
    pub(crate) capture: Option<CaptureState>,
}

impl NodeTargetState {
    fn new(generation: u32) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Visible clip presented in the most recent render.
    #[must_use]
    pub fn prev_scene_clip(&self) -> &Region {
        &self.prev_scene_clip
    }

    /// Scene rectangle as of the most recent render, if ever visited.
    #[must_use]
    pub fn prev_scene_rect(&self) -> Option<IRect> {
        self.prev_scene_rect
    }

    /// Changes accumulated since the last visit.
    #[must_use]
    pub fn changes(&self) -> Changes {
        self.changes
    }

    /// Visibility decided by the most recent render.
    #[must_use]
    pub fn visibility(&self) -> Visibility {
        self.visibility
    }

    /// Damage this node contributed in the most recent render.
    #[must_use]
    pub fn damage(&self) -> &Region {
        &self.damage
    }

    /// Opaque part of the clip in the most recent render.
    #[must_use]
    pub fn opaque(&self) -> &Region {
        &self.opaque
    }

    /// Blended part of the clip in the most recent render.
    #[must_use]
    pub fn translucent(&self) -> &Region {
        &self.translucent
    }

    /// Fully transparent part of the clip in the most recent render.
    #[must_use]
    pub fn invisible(&self) -> &Region {
        &self.invisible
    }

    /// Opaque content in front of the node, clipped to its bound.
    ///
    /// Diagnostic only. The draw pass never reads it: the clip already has
    /// this area subtracted.
    #[must_use]
    pub fn opaque_overlay(&self) -> &Region {
        &self.opaque_overlay
    }

    /// Capture bookkeeping, if the node carries a background tracker.
    #[must_use]
    pub fn capture(&self) -> Option<&CaptureState> {
        self.capture.as_ref()
    }

    /// Resets the per-frame output fields before a visit.
    pub(crate) fn clear_frame(&mut self) {
        self.clip.clear();
        self.damage.clear();
        self.opaque.clear();
        self.translucent.clear();
        self.invisible.clear();
        self.opaque_overlay.clear();
        self.rendered = false;
    }
}

/// Slot arena of [`NodeTargetState`] indexed by node slot.
#[derive(Clone, Debug, Default)]
pub struct StateTable {
    slots: Vec<Option<NodeTargetState>>,
}

impl StateTable {
    /// Creates an empty table.
    #[must_use]
    pub const fn new() -> Self {
        Self { slots: Vec::new() }
    }

    /// Returns the state of the node at `idx` if it belongs to `generation`.
    #[must_use]
    pub fn get(&self, idx: u32, generation: u32) -> Option<&NodeTargetState> {
        self.slots
            .get(idx as usize)
            .and_then(Option::as_ref)
            .filter(|s| s.generation == generation)
    }

    /// Mutable variant of [`get`](Self::get).
    pub fn get_mut(&mut self, idx: u32, generation: u32) -> Option<&mut NodeTargetState> {
        self.slots
            .get_mut(idx as usize)
            .and_then(Option::as_mut)
            .filter(|s| s.generation == generation)
    }

    /// Returns the state of the node at `idx`, creating it (or replacing the
    /// state of a previous occupant of the slot) as needed.
    pub fn get_or_create(&mut self, idx: u32, generation: u32) -> &mut NodeTargetState {
        let i = idx as usize;
        if i >= self.slots.len() {
            self.slots.resize_with(i + 1, || None);
        }
        let slot = &mut self.slots[i];
        if slot.as_ref().is_some_and(|s| s.generation != generation) {
            *slot = None;
        }
        slot.get_or_insert_with(|| NodeTargetState::new(generation))
    }

    /// Erases the state of the node at `idx` if it belongs to `generation`.
    pub fn remove(&mut self, idx: u32, generation: u32) -> Option<NodeTargetState> {
        let slot = self.slots.get_mut(idx as usize)?;
        if slot.as_ref().is_some_and(|s| s.generation == generation) {
            slot.take()
        } else {
            None
        }
    }

    /// Iterates over all live states mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut NodeTargetState> {
        self.slots.iter_mut().filter_map(Option::as_mut)
    }

    /// Number of live states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// Returns `true` if no state exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_mismatch_hides_state() {
        let mut table = StateTable::new();
        table.get_or_create(3, 0).prev_subtree_visible = true;
        assert!(table.get(3, 0).is_some());
        assert!(table.get(3, 1).is_none());
        assert!(table.get(7, 0).is_none());
    }

    #[test]
    fn recycled_slot_starts_fresh() {
        let mut table = StateTable::new();
        table.get_or_create(0, 0).prev_scene_rect = Some(IRect::new(0, 0, 1, 1));
        let fresh = table.get_or_create(0, 1);
        assert_eq!(fresh.prev_scene_rect, None);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn remove_checks_generation() {
        let mut table = StateTable::new();
        let _ = table.get_or_create(2, 5);
        assert!(table.remove(2, 4).is_none());
        assert!(table.remove(2, 5).is_some());
        assert!(table.is_empty());
    }

    #[test]
    fn bake_staleness() {
        let mut bake = BakeState::default();
        let rect = IRect::new(0, 0, 10, 10);
        assert!(bake.is_stale(rect, (1.0, 1.0)));
        bake = BakeState {
            size: (10, 10),
            scale: (1.0, 1.0),
            valid: true,
        };
        assert!(!bake.is_stale(rect, (1.0, 1.0)));
        assert!(bake.is_stale(rect, (2.0, 2.0)));
        assert!(bake.is_stale(IRect::new(0, 0, 11, 10), (1.0, 1.0)));
    }
}
