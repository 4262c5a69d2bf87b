// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Background damage trackers.
//!
//! A node carrying a [`BackgroundTracker`] composites a live capture of the
//! content behind it (blur, frosted glass, magnifiers). The scene keeps the
//! capture up to date incrementally: damage from every node behind the
//! tracker is folded into a per-target accumulator, and only that part of the
//! capture surface is repainted.

use kurbo::Rect;

use crate::region::{IRect, Region};

/// How content behind a tracker reaches the main target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CaptureMode {
    /// Behind-content is painted into both the capture and the main target.
    #[default]
    Mirror,
    /// Behind-content inside the covered area is painted only into the
    /// capture; the effect composite replaces it on the main target.
    Redirect,
}

/// Background tracker configuration attached to a node.
///
/// `capture` and `paint_anyway` are node-local logical coordinates.
#[derive(Clone, Debug, PartialEq)]
pub struct BackgroundTracker {
    /// Area behind the node that the effect samples.
    pub capture: Rect,
    /// Resolution of the capture surface relative to the target.
    pub scale: f64,
    /// Area of the effect output repainted whenever the capture is updated,
    /// even if no damage reached it.
    pub paint_anyway: Region,
    /// How far (in target pixels) damage under the capture bleeds into the
    /// effect output.
    pub spread: i32,
    /// Capture mode.
    pub mode: CaptureMode,
}

impl BackgroundTracker {
    /// Creates a mirror-mode tracker at full scale with no spread.
    #[must_use]
    pub const fn new(capture: Rect) -> Self {
        Self {
            capture,
            scale: 1.0,
            paint_anyway: Region::new(),
            spread: 0,
            mode: CaptureMode::Mirror,
        }
    }

    /// Sets the capture mode.
    #[must_use]
    pub fn with_mode(mut self, mode: CaptureMode) -> Self {
        self.mode = mode;
        self
    }

    /// Sets the damage spread.
    #[must_use]
    pub fn with_spread(mut self, spread: i32) -> Self {
        self.spread = spread.max(0);
        self
    }

    /// Sets the capture scale.
    #[must_use]
    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }

    /// Sets the paint-anyway region.
    #[must_use]
    pub fn with_paint_anyway(mut self, region: Region) -> Self {
        self.paint_anyway = region;
        self
    }
}

/// Per-target bookkeeping of a tracker's capture surface.
#[derive(Clone, Debug, Default)]
pub struct CaptureState {
    /// Capture rectangle in scene space as of the last update.
    pub(crate) scene_capture: IRect,
    /// Damage under the capture accumulated this frame (scene space).
    pub(crate) captured_damage: Region,
    /// Whether the capture surface holds usable content.
    pub(crate) valid: bool,
}

impl CaptureState {
    /// Prepares the capture for a new frame.
    ///
    /// An invalid or moved capture is entirely damaged.
    pub(crate) fn begin_frame(&mut self, scene_capture: IRect) {
        self.captured_damage.clear();
        if !self.valid || self.scene_capture != scene_capture {
            self.scene_capture = scene_capture;
            self.captured_damage = Region::from(scene_capture);
            self.valid = true;
        }
    }

    /// Folds damage from content behind the tracker.
    pub(crate) fn fold(&mut self, damage: &Region) {
        if damage.intersects_rect(self.scene_capture) {
            let mut d = damage.clone();
            d.intersect_rect(self.scene_capture);
            self.captured_damage.union_with(&d);
        }
    }

    /// Marks the capture surface unusable so the next frame repaints it.
    pub(crate) fn invalidate(&mut self) {
        self.valid = false;
    }

    /// Returns the capture rectangle in scene space.
    #[must_use]
    pub fn scene_capture(&self) -> IRect {
        self.scene_capture
    }

    /// Returns this frame's damage under the capture.
    #[must_use]
    pub fn captured_damage(&self) -> &Region {
        &self.captured_damage
    }

    /// Returns whether the capture surface holds usable content.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_damages_whole_capture() {
        let mut c = CaptureState::default();
        let rect = IRect::new(0, 0, 10, 10);
        c.begin_frame(rect);
        assert_eq!(c.captured_damage(), &Region::from(rect));

        c.begin_frame(rect);
        assert!(c.captured_damage().is_empty());
    }

    #[test]
    fn moved_or_invalid_capture_is_fully_damaged() {
        let mut c = CaptureState::default();
        c.begin_frame(IRect::new(0, 0, 10, 10));
        c.begin_frame(IRect::new(1, 0, 11, 10));
        assert_eq!(c.captured_damage().area(), 100);

        c.invalidate();
        c.begin_frame(IRect::new(1, 0, 11, 10));
        assert_eq!(c.captured_damage().area(), 100);
    }

    #[test]
    fn fold_clips_to_capture() {
        let mut c = CaptureState::default();
        c.begin_frame(IRect::new(0, 0, 10, 10));
        c.begin_frame(IRect::new(0, 0, 10, 10));
        c.fold(&Region::from(IRect::new(5, 5, 20, 20)));
        c.fold(&Region::from(IRect::new(50, 50, 60, 60)));
        assert_eq!(c.captured_damage(), &Region::from(IRect::new(5, 5, 10, 10)));
    }

    #[test]
    fn builder_clamps_spread() {
        let t = BackgroundTracker::new(Rect::new(0.0, 0.0, 4.0, 4.0))
            .with_spread(-3)
            .with_mode(CaptureMode::Redirect);
        assert_eq!(t.spread, 0);
        assert_eq!(t.mode, CaptureMode::Redirect);
    }
}
