// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage and occlusion pass, and damage reconciliation.
//!
//! The pass walks front to back. For every node it computes the visible
//! clip (scene rect ∩ clipping bound − opaque content in front), derives
//! the node's damage by comparing the clip with last frame's, splits the
//! clip into opaque / translucent / invisible parts, and grows the target's
//! opaque accumulator.
//!
//! Reconciliation then adds damage the walk cannot see (nodes that left the
//! traversal, background-tracker spill, one-shot extra damage), records the
//! frame in the damage ring, and reconstructs the damage of the buffer being
//! painted from its age.

use alloc::vec::Vec;

use kurbo::Point;

use super::{FailureKind, RenderStats, ResourceFailure};
use crate::dirty::Changes;
use crate::node::{INVALID, NodeFlags, NodeId, NodeStore};
use crate::paint::{BakeRequest, Painter};
use crate::region::{IRect, Region};
use crate::state::{BakeState, Visibility};
use crate::target::{SceneMapping, Target};
use crate::tracker::CaptureState;

#[cfg(feature = "trace-rich")]
use crate::trace::NodeDamage;

/// Per-render bookkeeping shared by the passes.
#[derive(Debug, Default)]
pub(super) struct Frame {
    /// Rendered nodes, front to back.
    pub(super) order: Vec<u32>,
    /// Nodes with an active background tracker, front to back.
    pub(super) trackers: Vec<u32>,
    pub(super) stats: RenderStats,
    pub(super) failures: Vec<ResourceFailure>,
    #[cfg(feature = "trace-rich")]
    pub(super) node_damage: Vec<NodeDamage>,
}

struct Pass<'a> {
    tree: &'a NodeStore,
    target: &'a mut Target,
    painter: &'a mut dyn Painter,
    frame: &'a mut Frame,
    mapping: SceneMapping,
    viewport: IRect,
    scale: (f64, f64),
}

pub(super) fn run(
    tree: &NodeStore,
    root: NodeId,
    target: &mut Target,
    painter: &mut dyn Painter,
    frame: &mut Frame,
) {
    let config = target.config();
    let scale = (config.scale_x, config.scale_y);
    let mut pass = Pass {
        tree,
        mapping: target.mapping(),
        viewport: target.scene_viewport(),
        scale,
        target,
        painter,
        frame,
    };
    let bound = pass.viewport;
    let _ = pass.visit(root.index(), bound);
}

impl Pass<'_> {
    /// Processes the subtree at `idx`; returns whether anything in it has a
    /// non-empty clip.
    fn visit(&mut self, idx: u32, bound: IRect) -> bool {
        let tree = self.tree;
        let generation = tree.generation_at(idx);
        let Some(state) = self.target.states.get_mut(idx, generation) else {
            return false;
        };
        if state.visibility == Visibility::Skipped {
            state.clear_frame();
            state.changes = Changes::empty();
            state.pending_damage.clear();
            state.prev_subtree_visible = false;
            return false;
        }
        let visible = state.visibility == Visibility::Visible;

        let flags = tree.flags_at(idx);
        let world = tree.world_rect_at(idx);
        let scene_rect = self.mapping.rect_outer(world);

        // Children are in front of their parent: process them first.
        let mut subtree_visible = false;
        if !flags.contains(NodeFlags::SCENE_BOUNDARY) {
            let child_bound = if flags.contains(NodeFlags::CLIPS_CHILDREN) {
                bound.intersect(scene_rect)
            } else {
                bound
            };
            let mut child = tree.last_child_at(idx);
            while child != INVALID {
                subtree_visible |= self.visit(child, child_bound);
                child = tree.prev_sibling_at(child);
            }
        }

        self.frame.stats.visited += 1;
        let origin = world.origin();
        let mut clip = if visible {
            Region::from(scene_rect.intersect(bound))
        } else {
            Region::new()
        };
        clip.subtract_with(&self.target.opaque);

        let Some(state) = self.target.states.get_mut(idx, generation) else {
            return subtree_visible;
        };
        state.clear_frame();
        state.scene_rect = scene_rect;

        let prev_clip = core::mem::take(&mut state.prev_scene_clip);
        let changes = state.changes;
        let conservative =
            state.prev_scene_rect != Some(scene_rect) || changes.intersects(Changes::CONSERVATIVE);
        let damage = if conservative {
            prev_clip.union(&clip)
        } else {
            let mut d = prev_clip.xor(&clip);
            if changes.intersects(Changes::REPAINT) {
                d.union_with(&clip);
            } else if !state.pending_damage.is_empty() {
                let mut own = self.mapping.local_region(origin, &state.pending_damage, false);
                own.intersect_with(&clip);
                d.union_with(&own);
            }
            d
        };

        // Split the clip.
        let content = tree.content_at(idx);
        let tracker = tree.tracker_at(idx);
        let mut rendered = false;
        if !clip.is_empty() {
            let mut invisible = self.mapping.local_region(origin, tree.invisible_at(idx), true);
            invisible.intersect_with(&clip);
            self.target.invisible.union_with(&invisible);

            if content.is_some() && !invisible.contains(&clip) && world.area() > 0.0 {
                rendered = true;
                let effect = flags.contains(NodeFlags::BACKGROUND_EFFECT) || tracker.is_some();
                let opaque = if effect {
                    Region::new()
                } else {
                    let mut o = self.mapping.local_region(origin, tree.opaque_at(idx), true);
                    o.intersect_with(&clip);
                    o.subtract_with(&invisible);
                    o
                };
                state.translucent = clip.subtract(&opaque).subtract(&invisible);
                state.opaque_overlay = self.target.opaque.clone();
                state.opaque_overlay.intersect_rect(bound);
                self.target.opaque.union_with(&opaque);
                state.opaque = opaque;
            }
            state.invisible = invisible;
        }

        state.rendered = rendered;
        state.prev_subtree_visible = subtree_visible || !clip.is_empty();
        state.prev_scene_rect = Some(scene_rect);
        state.changes = Changes::empty();
        state.pending_damage.clear();
        state.prev_scene_clip = clip.clone();
        state.clip = clip;
        state.damage = damage.clone();
        let subtree_visible = state.prev_subtree_visible;

        // Damage reaches the target and every tracker in front.
        if !damage.is_empty() {
            self.target.damage.union_with(&damage);
            for &t in &self.frame.trackers {
                let tg = tree.generation_at(t);
                if let Some(capture) = self
                    .target
                    .states
                    .get_mut(t, tg)
                    .and_then(|s| s.capture.as_mut())
                {
                    capture.fold(&damage);
                }
            }
            #[cfg(feature = "trace-rich")]
            self.frame.node_damage.push(NodeDamage {
                node_index: idx,
                bounds: damage.bounds(),
                area: damage.area(),
            });
        }

        if rendered {
            self.frame.stats.rendered += 1;
            self.frame.order.push(idx);
            if flags.contains(NodeFlags::BAKEABLE) {
                self.bake(idx, scene_rect, &damage);
            }
        }

        self.update_tracker(idx, rendered, origin, &damage);
        subtree_visible
    }

    /// Refreshes the cached surface of a bakeable node when stale or damaged.
    fn bake(&mut self, idx: u32, scene_rect: IRect, damage: &Region) {
        let tree = self.tree;
        let generation = tree.generation_at(idx);
        let Some(content) = tree.content_at(idx) else {
            return;
        };
        let Some(state) = self.target.states.get_mut(idx, generation) else {
            return;
        };
        let stale = state.bake.is_stale(scene_rect, self.scale);
        if !stale && damage.is_empty() {
            return;
        }
        let request_damage = if stale {
            Region::from(scene_rect)
        } else {
            let mut d = damage.clone();
            d.intersect_rect(scene_rect);
            d
        };
        let request = BakeRequest {
            node: tree.handle_at(idx),
            content,
            rect: scene_rect,
            scale_x: self.scale.0,
            scale_y: self.scale.1,
            damage: &request_damage,
        };
        match self.painter.bake(&request) {
            Ok(()) => {
                state.bake = BakeState {
                    size: (scene_rect.width(), scene_rect.height()),
                    scale: self.scale,
                    valid: true,
                };
                self.frame.stats.bakes += 1;
            }
            Err(error) => {
                state.bake.valid = false;
                self.frame.failures.push(ResourceFailure {
                    node: tree.handle_at(idx),
                    kind: FailureKind::Bake,
                    error,
                });
            }
        }
    }

    /// Activates, refreshes or drops the capture bookkeeping of `idx`.
    ///
    /// A tracker that does not render this frame stops receiving damage, so
    /// its capture is invalidated and fully repainted once it comes back.
    fn update_tracker(&mut self, idx: u32, rendered: bool, origin: Point, damage: &Region) {
        let tree = self.tree;
        let generation = tree.generation_at(idx);
        let Some(state) = self.target.states.get_mut(idx, generation) else {
            return;
        };
        let Some(tracker) = tree.tracker_at(idx) else {
            state.capture = None;
            return;
        };
        let capture = state.capture.get_or_insert_with(CaptureState::default);
        if !rendered {
            capture.invalidate();
            return;
        }
        let rect = self
            .mapping
            .rect_outer(tracker.capture + origin.to_vec2())
            .intersect(self.viewport);
        capture.begin_frame(rect);
        // Newly exposed parts of the effect need fresh capture content.
        capture.fold(damage);
        self.frame.trackers.push(idx);
    }
}

/// Adds damage invisible to the walk, records the frame in the ring, and
/// returns the damage of the buffer being painted plus whether it is the
/// full capture region.
pub(super) fn reconcile(tree: &NodeStore, target: &mut Target, frame: &mut Frame) -> (Region, bool) {
    let frame_index = target.frame;

    // Nodes that dropped out of the traversal without a tree change.
    let mut orphan = core::mem::take(&mut target.orphan_damage);
    for state in target.states.iter_mut() {
        if state.last_visited_frame != frame_index {
            if !state.prev_scene_clip.is_empty() {
                orphan.union_with(&state.prev_scene_clip);
                state.prev_scene_clip.clear();
            }
            state.prev_subtree_visible = false;
            state.rendered = false;
            if let Some(capture) = &mut state.capture {
                capture.invalidate();
            }
        }
    }
    orphan.union_with(&target.take_extra_damage());

    // Positional order is lost for orphans, so every tracker takes them.
    if !orphan.is_empty() {
        for &t in &frame.trackers {
            if let Some(capture) = target
                .states
                .get_mut(t, tree.generation_at(t))
                .and_then(|s| s.capture.as_mut())
            {
                capture.fold(&orphan);
            }
        }
    }
    target.damage.union_with(&orphan);

    // Tracker spill, back to front so nested trackers feed the ones in front.
    let mapping = target.mapping();
    for pos in (0..frame.trackers.len()).rev() {
        let t = frame.trackers[pos];
        let Some(tracker) = tree.tracker_at(t) else {
            continue;
        };
        let origin = tree.world_rect_at(t).origin();
        let Some(state) = target.states.get_mut(t, tree.generation_at(t)) else {
            continue;
        };
        let Some(capture) = &state.capture else {
            continue;
        };
        let mut spill = capture.captured_damage.inflate(tracker.spread);
        let mut anyway = mapping.local_region(origin, &tracker.paint_anyway, false);
        anyway.intersect_rect(capture.scene_capture);
        spill.union_with(&anyway);
        spill.intersect_with(&state.translucent);
        if spill.is_empty() {
            continue;
        }
        state.damage.union_with(&spill);
        for &front in &frame.trackers[..pos] {
            if let Some(capture) = target
                .states
                .get_mut(front, tree.generation_at(front))
                .and_then(|s| s.capture.as_mut())
            {
                capture.fold(&spill);
            }
        }
        target.damage.union_with(&spill);
    }

    // Buffer age.
    let capture_region = target.capture_region();
    target.damage.intersect_with(&capture_region);
    let force = target.take_force_full();
    let recorded = if force {
        capture_region.clone()
    } else {
        target.damage.clone()
    };
    target.ring.record(&recorded);
    let history = if force {
        None
    } else {
        target.ring.accumulate(target.age())
    };
    target.ring.advance();

    match history {
        Some(mut damage) => {
            damage.intersect_with(&capture_region);
            (damage, false)
        }
        None => (capture_region, true),
    }
}
