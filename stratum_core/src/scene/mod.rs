// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render scheduler.
//!
//! A [`Scene`] owns a [`NodeStore`] and any number of [`Target`]s. Each call
//! to [`Scene::render`] runs one pipeline for one target:
//!
//! ```text
//!   layout ──► evaluate ──► fan out changes to every target
//!                                   │
//!            ┌──────────────────────┘
//!            ▼
//!   visibility pass ──► damage & occlusion pass (+ bakes)
//!                                   │
//!            ┌──────────────────────┘
//!            ▼
//!   reconcile (orphans, trackers, buffer age) ──► ordered draw ──► reset
//! ```
//!
//! Both tree passes walk front to back: children in reverse z order, each
//! subtree before its parent. Opaque content in front is therefore known
//! before the content it hides is clipped, which keeps occlusion sound.
//! Drawing walks the recorded order backwards.

mod damage;
mod draw;
mod visibility;

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::fmt;
use core::sync::atomic::{AtomicU32, Ordering};

use crate::dirty::Changes;
use crate::layout::{Direction, LayoutEngine, LayoutResults};
use crate::node::{NodeChanges, NodeId, NodeStore};
use crate::paint::{Painter, SurfaceError, TargetInfo};
use crate::region::Region;
use crate::state::NodeTargetState;
use crate::target::{Target, TargetConfig, TargetId};
use crate::trace::{
    PhaseBeginEvent, PhaseEndEvent, PhaseKind, RenderBeginEvent, RenderSummary,
    ResourceFailureEvent, Tracer,
};

/// Source of scene tags; every scene gets a distinct one.
static NEXT_SCENE_TAG: AtomicU32 = AtomicU32::new(1);

/// Which painter operation failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// Refreshing a bakeable node's cached surface.
    Bake,
    /// Starting a background capture.
    Capture,
}

/// A painter resource failure that occurred during a render.
///
/// The affected cache or capture is left invalid and retried on the next
/// render.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ResourceFailure {
    /// Node whose surface could not be provided.
    pub node: NodeId,
    /// Operation that failed.
    pub kind: FailureKind,
    /// Error reported by the painter.
    pub error: SurfaceError,
}

/// Counters collected during one render.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct RenderStats {
    /// Nodes visited by the damage pass (not skipped).
    pub visited: u32,
    /// Nodes that will draw this frame.
    pub rendered: u32,
    /// Nodes whose subtree was not traversed.
    pub skipped: u32,
    /// Hidden nodes whose previous area was cleared this frame.
    pub pending_clear: u32,
    /// Successful bakes.
    pub bakes: u32,
    /// Successful background captures.
    pub captures: u32,
    /// `paint_region` and `composite_effect` calls issued.
    pub draw_calls: u32,
    /// Pixels in the output damage.
    pub damage_area: u64,
    /// Pixels in the output opaque region.
    pub opaque_area: u64,
    /// Whether the whole capture region was repainted.
    pub full_damage: bool,
}

/// Result of one render. All regions are in the target's scene space.
#[derive(Clone, Debug, Default)]
pub struct RenderOutput {
    /// Pixels repainted this render, including buffer-age history.
    pub damage: Region,
    /// Pixels covered by opaque content.
    pub opaque: Region,
    /// Pixels declared fully transparent by their nodes.
    pub invisible: Region,
    /// Counters.
    pub stats: RenderStats,
    /// Painter failures; affected surfaces are retried next render.
    pub failures: Vec<ResourceFailure>,
}

/// Retained node tree plus its render targets.
pub struct Scene {
    tag: u32,
    tree: NodeStore,
    root: Option<NodeId>,
    layout: Option<Box<dyn LayoutEngine>>,
    layout_enabled: bool,
    direction: Direction,

    targets: Vec<Option<Target>>,
    target_generations: Vec<u32>,
    free_targets: Vec<u32>,

    changes: NodeChanges,
    layout_results: LayoutResults,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("tag", &self.tag)
            .field("root", &self.root)
            .field("layout_enabled", &self.layout_enabled)
            .field("direction", &self.direction)
            .field("targets", &self.targets.iter().flatten().count())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Creates an empty scene with no root and no layout engine.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tag: NEXT_SCENE_TAG.fetch_add(1, Ordering::Relaxed),
            tree: NodeStore::new(),
            root: None,
            layout: None,
            layout_enabled: true,
            direction: Direction::Ltr,
            targets: Vec::new(),
            target_generations: Vec::new(),
            free_targets: Vec::new(),
            changes: NodeChanges::default(),
            layout_results: LayoutResults::new(),
        }
    }

    // -- Tree --

    /// Returns the node tree.
    #[must_use]
    pub fn tree(&self) -> &NodeStore {
        &self.tree
    }

    /// Returns the node tree for mutation.
    pub fn tree_mut(&mut self) -> &mut NodeStore {
        &mut self.tree
    }

    /// Sets the node every render starts from.
    pub fn set_root(&mut self, root: Option<NodeId>) {
        self.root = root;
    }

    /// Returns the root node.
    #[must_use]
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// Installs the layout engine called at the start of every render.
    pub fn set_layout_engine(&mut self, engine: Option<Box<dyn LayoutEngine>>) {
        self.layout = engine;
    }

    /// Enables or disables the layout step (for callers that lay out the
    /// tree themselves).
    pub fn set_layout_enabled(&mut self, enabled: bool) {
        self.layout_enabled = enabled;
    }

    /// Sets the base direction handed to the layout engine.
    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    // -- Targets --

    /// Creates a target. Its first render repaints everything.
    pub fn create_target(&mut self, config: TargetConfig) -> TargetId {
        let idx = if let Some(idx) = self.free_targets.pop() {
            self.target_generations[idx as usize] += 1;
            idx
        } else {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "target counts stay far below u32::MAX"
            )]
            let idx = self.targets.len() as u32;
            self.targets.push(None);
            self.target_generations.push(0);
            idx
        };
        let id = TargetId {
            scene: self.tag,
            idx,
            generation: self.target_generations[idx as usize],
        };
        self.targets[idx as usize] = Some(Target::new(id, config));
        id
    }

    /// Destroys a target and all of its per-node state.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or belongs to another scene.
    pub fn destroy_target(&mut self, id: TargetId) {
        let idx = self.validate_target(id);
        self.targets[idx] = None;
        self.free_targets.push(id.idx);
    }

    /// Returns a target.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or belongs to another scene.
    #[must_use]
    pub fn target(&self, id: TargetId) -> &Target {
        let idx = self.validate_target(id);
        match &self.targets[idx] {
            Some(t) => t,
            None => panic!("stale TargetId: {id:?}"),
        }
    }

    /// Returns a target for configuration.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or belongs to another scene.
    pub fn target_mut(&mut self, id: TargetId) -> &mut Target {
        let idx = self.validate_target(id);
        match &mut self.targets[idx] {
            Some(t) => t,
            None => panic!("stale TargetId: {id:?}"),
        }
    }

    /// Returns whether the handle refers to a live target of this scene.
    #[must_use]
    pub fn is_target_alive(&self, id: TargetId) -> bool {
        id.scene == self.tag
            && self
                .targets
                .get(id.idx as usize)
                .is_some_and(Option::is_some)
            && self.target_generations[id.idx as usize] == id.generation
    }

    /// Returns what `target` remembers about `node`, if it was ever visited.
    #[must_use]
    pub fn node_state(&self, target: TargetId, node: NodeId) -> Option<&NodeTargetState> {
        self.target(target)
            .states
            .get(node.index(), node.generation())
    }

    /// Returns whether `node` drew into `target` in the target's most recent
    /// render.
    #[must_use]
    pub fn is_rendered(&self, target: TargetId, node: NodeId) -> bool {
        let t = self.target(target);
        t.states
            .get(node.index(), node.generation())
            .is_some_and(|s| s.rendered && s.last_visited_frame == t.frame)
    }

    // -- Rendering --

    /// Renders `target` through `painter`.
    ///
    /// # Panics
    ///
    /// Panics if the target handle is stale or foreign, the viewport or
    /// destination is empty, the buffer age exceeds
    /// [`DAMAGE_RING_CAPACITY`](crate::ring::DAMAGE_RING_CAPACITY), or the
    /// scene has no live root.
    pub fn render(&mut self, target: TargetId, painter: &mut dyn Painter) -> RenderOutput {
        self.render_traced(target, painter, &mut Tracer::none())
    }

    /// Like [`render`](Self::render), reporting progress to `tracer`.
    pub fn render_traced(
        &mut self,
        id: TargetId,
        painter: &mut dyn Painter,
        tracer: &mut Tracer<'_>,
    ) -> RenderOutput {
        let slot = self.validate_target(id);
        let root = match self.root {
            Some(root) if self.tree.is_alive(root) => root,
            _ => panic!("render requires a live root node"),
        };
        let Some(target) = &mut self.targets[slot] else {
            panic!("stale TargetId: {id:?}");
        };
        target.validate_config();
        target.frame += 1;
        let frame_index = target.frame;

        tracer.render_begin(&RenderBeginEvent {
            frame_index,
            target: id,
            age: target.age(),
        });

        // Layout and evaluation.
        phase_begin(tracer, frame_index, id, PhaseKind::Layout);
        if self.layout_enabled
            && let Some(engine) = &mut self.layout
        {
            self.layout_results.clear();
            let available = target.config().viewport.size();
            engine.compute_layout(
                &self.tree,
                root,
                available,
                self.direction,
                &mut self.layout_results,
            );
            self.layout_results.apply(&mut self.tree);
        }
        self.tree.evaluate_into(&mut self.changes);
        fan_out(&self.tree, &self.changes, &mut self.targets);
        phase_end(tracer, frame_index, id, PhaseKind::Layout);

        let Some(target) = &mut self.targets[slot] else {
            panic!("stale TargetId: {id:?}");
        };
        if target.is_force_full() {
            for state in target.states.iter_mut() {
                if let Some(capture) = &mut state.capture {
                    capture.invalidate();
                }
            }
        }

        let mut frame = damage::Frame::default();

        phase_begin(tracer, frame_index, id, PhaseKind::Visibility);
        visibility::run(&self.tree, root, target, &mut frame.stats);
        phase_end(tracer, frame_index, id, PhaseKind::Visibility);

        phase_begin(tracer, frame_index, id, PhaseKind::Damage);
        damage::run(&self.tree, root, target, painter, &mut frame);
        phase_end(tracer, frame_index, id, PhaseKind::Damage);

        phase_begin(tracer, frame_index, id, PhaseKind::Reconcile);
        let (output_damage, full) = damage::reconcile(&self.tree, target, &mut frame);
        phase_end(tracer, frame_index, id, PhaseKind::Reconcile);

        phase_begin(tracer, frame_index, id, PhaseKind::Draw);
        let info = TargetInfo {
            target: id,
            scene_viewport: target.scene_viewport(),
            destination: target.config().destination,
            transform: target.config().transform,
            scale_x: target.config().scale_x,
            scale_y: target.config().scale_y,
            background: target.config().background,
            frame: frame_index,
        };
        draw::run(&self.tree, target, painter, &mut frame, &output_damage, &info);
        phase_end(tracer, frame_index, id, PhaseKind::Draw);

        let capture = target.capture_region();
        let opaque = target.opaque.intersect(&capture);
        let invisible = target.invisible.intersect(&capture);
        target.reset_accumulators();

        frame.stats.damage_area = output_damage.area();
        frame.stats.opaque_area = opaque.area();
        frame.stats.full_damage = full;

        for &failure in &frame.failures {
            tracer.resource_failure(&ResourceFailureEvent {
                frame_index,
                target: id,
                failure,
            });
        }
        #[cfg(feature = "trace-rich")]
        {
            tracer.node_damage(frame_index, &frame.node_damage);
            let rects: Vec<crate::trace::DamageRect> = output_damage
                .rects()
                .iter()
                .map(|&r| crate::trace::DamageRect::from(r))
                .collect();
            tracer.damage_rects(frame_index, &rects);
        }
        tracer.render_summary(&RenderSummary {
            frame_index,
            target: id,
            stats: frame.stats,
        });

        RenderOutput {
            damage: output_damage,
            opaque,
            invisible,
            stats: frame.stats,
            failures: frame.failures,
        }
    }

    /// Panics unless `id` is a live target of this scene; returns its slot.
    fn validate_target(&self, id: TargetId) -> usize {
        assert!(
            id.scene == self.tag,
            "TargetId belongs to another scene: {id:?} (this scene: {})",
            self.tag
        );
        assert!(self.is_target_alive(id), "stale TargetId: {id:?}");
        id.idx as usize
    }
}

/// Folds one evaluation's changes into every target's per-node state.
///
/// Removed and reparented nodes hand their previous clip to the target's
/// orphan damage, since the traversal may never reach them again.
fn fan_out(tree: &NodeStore, changes: &NodeChanges, targets: &mut [Option<Target>]) {
    if changes.is_empty() {
        return;
    }
    for target in targets.iter_mut().flatten() {
        for &id in &changes.removed {
            if let Some(state) = target.states.remove(id.index(), id.generation()) {
                target.orphan_damage.union_with(&state.prev_scene_clip);
            }
        }
        for &idx in &changes.reparented {
            let generation = tree.generation_at(idx);
            if let Some(state) = target.states.get_mut(idx, generation) {
                target.orphan_damage.union_with(&state.prev_scene_clip);
                state.prev_scene_clip.clear();
                state.changes |= Changes::PARENT;
            }
        }

        let mut mark = |indices: &[u32], bit: Changes| {
            for &idx in indices {
                let generation = tree.generation_at(idx);
                if let Some(state) = target.states.get_mut(idx, generation) {
                    state.changes |= bit;
                }
            }
        };
        mark(&changes.geometry, Changes::GEOMETRY);
        mark(&changes.shown, Changes::VISIBILITY);
        mark(&changes.hidden, Changes::VISIBILITY);
        mark(&changes.content, Changes::CONTENT);
        mark(&changes.hints, Changes::HINTS);

        for (idx, region) in &changes.damage {
            let generation = tree.generation_at(*idx);
            if let Some(state) = target.states.get_mut(*idx, generation) {
                state.pending_damage.union_with(region);
                state.changes |= Changes::DAMAGE;
            }
        }
    }
}

fn phase_begin(tracer: &mut Tracer<'_>, frame_index: u64, target: TargetId, phase: PhaseKind) {
    tracer.phase_begin(&PhaseBeginEvent {
        frame_index,
        target,
        phase,
    });
}

fn phase_end(tracer: &mut Tracer<'_>, frame_index: u64, target: TargetId, phase: PhaseKind) {
    tracer.phase_end(&PhaseEndEvent {
        frame_index,
        target,
        phase,
    });
}
