// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Visibility ("begin") pass.
//!
//! Creates per-node state on first visit and decides, per node, whether the
//! damage pass should process it ([`Visibility::Visible`]), clear what it
//! presented last frame ([`Visibility::PendingClear`]), or skip its subtree
//! ([`Visibility::Skipped`]).

use kurbo::Rect;

use super::RenderStats;
use crate::node::{INVALID, NodeFlags, NodeId, NodeStore};
use crate::state::Visibility;
use crate::target::Target;

pub(super) fn run(tree: &NodeStore, root: NodeId, target: &mut Target, stats: &mut RenderStats) {
    let viewport = target.config().viewport;
    let frame = target.frame;
    visit(tree, root.index(), false, false, viewport, target, frame, stats);
}

fn visit(
    tree: &NodeStore,
    idx: u32,
    parent_clips: bool,
    ancestor_hidden: bool,
    viewport: Rect,
    target: &mut Target,
    frame: u64,
    stats: &mut RenderStats,
) {
    let flags = tree.flags_at(idx);
    let world = tree.world_rect_at(idx);

    // Outside a clipping parent and unable to spill children outside itself.
    let culled = parent_clips
        && world.intersect(viewport).area() <= 0.0
        && (flags.contains(NodeFlags::CLIPS_CHILDREN) || !tree.has_children_at(idx));
    let hidden = ancestor_hidden || !tree.effective_visible_at(idx) || culled;

    let state = target.states.get_or_create(idx, tree.generation_at(idx));
    state.last_visited_frame = frame;
    state.visibility = if !hidden {
        Visibility::Visible
    } else if state.prev_subtree_visible {
        stats.pending_clear += 1;
        Visibility::PendingClear
    } else {
        stats.skipped += 1;
        Visibility::Skipped
    };

    if state.visibility == Visibility::Skipped || flags.contains(NodeFlags::SCENE_BOUNDARY) {
        return;
    }

    let clips = flags.contains(NodeFlags::CLIPS_CHILDREN);
    let mut child = tree.last_child_at(idx);
    while child != INVALID {
        visit(tree, child, clips, hidden, viewport, target, frame, stats);
        child = tree.prev_sibling_at(child);
    }
}
