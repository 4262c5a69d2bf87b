// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Ordered draw pass.
//!
//! Opaque content first (`Replace`, order irrelevant since opaque regions
//! are disjoint), then the background under whatever is left, then
//! translucent content back to front (`Blend`). Background trackers are
//! refreshed when the back-to-front walk reaches them, so everything behind
//! a tracker is final when its capture is painted.

use alloc::vec::Vec;

use super::damage::Frame;
use super::{FailureKind, ResourceFailure};
use crate::node::{NodeFlags, NodeStore};
use crate::paint::{CaptureInfo, DrawMode, NodeDraw, Painter, TargetInfo};
use crate::region::Region;
use crate::state::NodeTargetState;
use crate::target::Target;
use crate::tracker::CaptureMode;

/// One rendered node in paint (back-to-front) order.
#[derive(Debug)]
struct Item {
    idx: u32,
    generation: u32,
    /// Opaque part to paint on the main target.
    opaque: Region,
    /// Translucent part to paint on the main target.
    translucent: Region,
    /// Area hidden by redirecting trackers in front of this node.
    covered: Region,
    /// Active tracker whose capture is usable this frame.
    tracker: bool,
    capture_ok: bool,
}

struct Draw<'a> {
    tree: &'a NodeStore,
    target: &'a mut Target,
    painter: &'a mut dyn Painter,
    frame: &'a mut Frame,
    damage: &'a Region,
    items: Vec<Item>,
}

pub(super) fn run(
    tree: &NodeStore,
    target: &mut Target,
    painter: &mut dyn Painter,
    frame: &mut Frame,
    damage: &Region,
    info: &TargetInfo,
) {
    painter.bind_target(info);

    // Front to back: collect redirect covers as we go.
    let mut items = Vec::with_capacity(frame.order.len());
    let mut covered = Region::new();
    for &idx in &frame.order {
        let generation = tree.generation_at(idx);
        let Some(state) = target.states.get(idx, generation) else {
            continue;
        };
        let mut opaque = state.opaque.intersect(damage);
        let mut translucent = state.translucent.intersect(damage);
        if !covered.is_empty() {
            opaque.subtract_with(&covered);
            translucent.subtract_with(&covered);
        }
        let tracker = frame.trackers.contains(&idx);
        items.push(Item {
            idx,
            generation,
            opaque,
            translucent,
            covered: covered.clone(),
            tracker,
            capture_ok: false,
        });
        if tracker && let Some(cover) = redirect_cover(tree, idx, state) {
            covered.union_with(&cover);
        }
    }
    items.reverse();

    let mut draw = Draw {
        tree,
        target,
        painter,
        frame,
        damage,
        items,
    };

    // Opaque.
    for i in 0..draw.items.len() {
        let region = core::mem::take(&mut draw.items[i].opaque);
        draw.paint(i, &region, DrawMode::Replace);
    }

    // Background.
    let mut background = damage.subtract(&draw.target.opaque);
    background.subtract_with(&covered);
    if !background.is_empty() {
        draw.painter
            .fill_background(&background, draw.target.config().background);
    }

    // Translucent, back to front.
    for i in 0..draw.items.len() {
        if draw.items[i].tracker {
            draw.refresh_tracker(i);
        }
        let region = core::mem::take(&mut draw.items[i].translucent);
        draw.paint(i, &region, DrawMode::Blend);
    }

    draw.painter.finish();
}

/// Capture ∩ translucent area of a redirecting tracker.
fn redirect_cover(tree: &NodeStore, idx: u32, state: &NodeTargetState) -> Option<Region> {
    let tracker = tree.tracker_at(idx)?;
    if tracker.mode != CaptureMode::Redirect {
        return None;
    }
    let capture = state.capture.as_ref()?;
    let mut cover = state.translucent.clone();
    cover.intersect_rect(capture.scene_capture);
    Some(cover)
}

impl Draw<'_> {
    fn state(&self, i: usize) -> Option<&NodeTargetState> {
        let item = &self.items[i];
        self.target.states.get(item.idx, item.generation)
    }

    /// Draws `region` of item `i`'s content.
    fn paint(&mut self, i: usize, region: &Region, mode: DrawMode) {
        if region.is_empty() {
            return;
        }
        let idx = self.items[i].idx;
        let Some(content) = self.tree.content_at(idx) else {
            return;
        };
        let Some((scene_rect, bake_valid)) = self.state(i).map(|s| (s.scene_rect, s.bake.valid))
        else {
            return;
        };
        let baked = self.tree.flags_at(idx).contains(NodeFlags::BAKEABLE) && bake_valid;
        let draw = NodeDraw {
            node: self.tree.handle_at(idx),
            content,
            scene_rect,
            region,
            mode,
            baked,
        };
        self.painter.paint_region(&draw);
        self.frame.stats.draw_calls += 1;
    }

    /// Repaints the damaged part of tracker `i`'s capture, then composites
    /// the effect onto the main target.
    fn refresh_tracker(&mut self, i: usize) {
        let tree = self.tree;
        let idx = self.items[i].idx;
        let Some(tracker) = tree.tracker_at(idx) else {
            return;
        };
        let origin = tree.world_rect_at(idx).origin();
        let mapping = self.target.mapping();
        let Some(state) = self.state(i) else {
            return;
        };
        let Some(capture) = &state.capture else {
            return;
        };
        let rect = capture.scene_capture;
        let valid = capture.valid;
        let mut repaint = capture.captured_damage.clone();
        repaint.union_with(&mapping.local_region(origin, &tracker.paint_anyway, false));
        repaint.intersect_rect(rect);
        let mut own_cover = state.translucent.clone();
        own_cover.intersect_rect(rect);
        let mut composite = own_cover.intersect(self.damage);
        composite.subtract_with(&self.items[i].covered);

        let node = tree.handle_at(idx);
        let ok = if repaint.is_empty() {
            valid
        } else {
            let info = CaptureInfo {
                node,
                rect,
                scale: tracker.scale,
                region: &repaint,
            };
            match self.painter.begin_background_capture(&info) {
                Ok(()) => {
                    self.paint_behind(i, &repaint);
                    self.painter.end_background_capture(node);
                    self.frame.stats.captures += 1;
                    true
                }
                Err(error) => {
                    self.frame.failures.push(ResourceFailure {
                        node,
                        kind: FailureKind::Capture,
                        error,
                    });
                    let generation = self.items[i].generation;
                    if let Some(capture) = self
                        .target
                        .states
                        .get_mut(idx, generation)
                        .and_then(|s| s.capture.as_mut())
                    {
                        capture.invalidate();
                    }
                    false
                }
            }
        };
        self.items[i].capture_ok = ok;

        if ok {
            if !composite.is_empty() {
                self.painter.composite_effect(node, &composite);
                self.frame.stats.draw_calls += 1;
            }
        } else if tracker.mode == CaptureMode::Redirect {
            // Nothing replaces the redirected content: paint it here.
            let mut fallback = own_cover.intersect(self.damage);
            fallback.subtract_with(&self.items[i].covered);
            self.paint_behind(i, &fallback);
        }
    }

    /// Paints everything behind item `i` inside `region`, into whatever
    /// destination is current.
    fn paint_behind(&mut self, i: usize, region: &Region) {
        if region.is_empty() {
            return;
        }
        let mut background = region.clone();
        for b in 0..i {
            if let Some(state) = self.state(b) {
                background.subtract_with(&state.opaque);
            }
        }
        if !background.is_empty() {
            self.painter
                .fill_background(&background, self.target.config().background);
        }
        for b in 0..i {
            let Some(state) = self.state(b) else {
                continue;
            };
            let opaque = state.opaque.intersect(region);
            self.paint(b, &opaque, DrawMode::Replace);
        }
        for b in 0..i {
            let Some(state) = self.state(b) else {
                continue;
            };
            let translucent = state.translucent.intersect(region);
            if self.items[b].tracker && self.items[b].capture_ok {
                let rect = state.capture.as_ref().map(|c| c.scene_capture);
                if let Some(rect) = rect {
                    let mut composite = translucent.clone();
                    composite.intersect_rect(rect);
                    if !composite.is_empty() {
                        let node = self.tree.handle_at(self.items[b].idx);
                        self.painter.composite_effect(node, &composite);
                        self.frame.stats.draw_calls += 1;
                    }
                }
            }
            self.paint(b, &translucent, DrawMode::Blend);
        }
    }
}
