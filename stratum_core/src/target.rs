// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets.
//!
//! A [`Target`] is one render destination of a [`Scene`](crate::scene::Scene):
//! a window surface, an offscreen texture, a thumbnail. Several targets may
//! present the same node tree at different viewports, scales and transforms;
//! each keeps its own damage history and per-node state.
//!
//! # Coordinate spaces
//!
//! - **World** — tree coordinates (logical units, `f64`).
//! - **Scene** — target-local integer pixels: the viewport origin maps to
//!   `(0, 0)` and logical units are multiplied by the target scale. All
//!   region bookkeeping happens here, so targets sharing a tree never leak
//!   absolute coordinates into cached regions.
//! - **Buffer** — the destination surface: scene space rotated/flipped by
//!   [`Transform`] and offset by the destination origin.

use core::fmt;

use kurbo::{Affine, Point, Rect};

use crate::paint::Color;
use crate::region::{IRect, Region};
use crate::ring::DamageRing;
use crate::state::StateTable;

/// A handle to a target owned by a [`Scene`](crate::scene::Scene).
///
/// Carries the tag of the owning scene, so a handle passed to the wrong
/// scene is detected, and a generation counter so a handle to a destroyed
/// target is detected.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct TargetId {
    pub(crate) scene: u32,
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl TargetId {
    /// Returns the raw slot index (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }
}

impl fmt::Debug for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "TargetId({}@gen{} in scene {})",
            self.idx, self.generation, self.scene
        )
    }
}

/// Output orientation of a target, as reported by display servers.
///
/// Rotations are clockwise. Flipped variants mirror horizontally before
/// rotating.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Transform {
    /// No transform.
    #[default]
    Normal,
    /// 90° clockwise.
    Rotate90,
    /// 180°.
    Rotate180,
    /// 270° clockwise.
    Rotate270,
    /// Horizontal mirror.
    Flipped,
    /// Mirror, then 90° clockwise.
    Flipped90,
    /// Mirror, then 180°.
    Flipped180,
    /// Mirror, then 270° clockwise.
    Flipped270,
}

impl Transform {
    /// Returns `true` if the transform exchanges width and height.
    #[must_use]
    pub const fn swaps_axes(self) -> bool {
        matches!(
            self,
            Self::Rotate90 | Self::Rotate270 | Self::Flipped90 | Self::Flipped270
        )
    }

    /// Returns the transform that undoes this one.
    #[must_use]
    pub const fn inverse(self) -> Self {
        match self {
            Self::Rotate90 => Self::Rotate270,
            Self::Rotate270 => Self::Rotate90,
            other => other,
        }
    }

    /// Size of a `width × height` space after the transform.
    #[must_use]
    pub const fn output_size(self, width: i32, height: i32) -> (i32, i32) {
        if self.swaps_axes() {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Maps a rectangle inside a `width × height` space.
    #[must_use]
    pub const fn map_rect(self, r: IRect, width: i32, height: i32) -> IRect {
        let (w, h) = (width, height);
        match self {
            Self::Normal => r,
            Self::Rotate90 => IRect::new(h - r.y1, r.x0, h - r.y0, r.x1),
            Self::Rotate180 => IRect::new(w - r.x1, h - r.y1, w - r.x0, h - r.y0),
            Self::Rotate270 => IRect::new(r.y0, w - r.x1, r.y1, w - r.x0),
            Self::Flipped => IRect::new(w - r.x1, r.y0, w - r.x0, r.y1),
            Self::Flipped90 => IRect::new(h - r.y1, w - r.x1, h - r.y0, w - r.x0),
            Self::Flipped180 => IRect::new(r.x0, h - r.y1, r.x1, h - r.y0),
            Self::Flipped270 => IRect::new(r.y0, r.x0, r.y1, r.x1),
        }
    }
}

/// World to scene mapping detached from the target, so passes can map
/// while holding mutable borrows of per-node state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SceneMapping {
    xf: Affine,
}

impl SceneMapping {
    pub(crate) fn rect_outer(self, world: Rect) -> IRect {
        IRect::from_rect_outer(self.xf.transform_rect_bbox(world))
    }

    pub(crate) fn local_region(self, origin: Point, region: &Region, inner: bool) -> Region {
        let offset = origin.to_vec2();
        region.map_rects(|r| {
            let scene = self.xf.transform_rect_bbox(r.to_rect() + offset);
            if inner {
                IRect::from_rect_inner(scene)
            } else {
                IRect::from_rect_outer(scene)
            }
        })
    }
}

/// Static configuration of a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetConfig {
    /// Logical rectangle of the tree presented by the target.
    pub viewport: Rect,
    /// Physical rectangle of the destination buffer that receives the
    /// output.
    pub destination: IRect,
    /// Horizontal device scale.
    pub scale_x: f64,
    /// Vertical device scale.
    pub scale_y: f64,
    /// Output orientation.
    pub transform: Transform,
    /// Colour painted where no node covers the damage.
    pub background: Color,
}

impl TargetConfig {
    /// Creates a configuration with unit scale, no transform and a
    /// transparent background.
    #[must_use]
    pub const fn new(viewport: Rect, destination: IRect) -> Self {
        Self {
            viewport,
            destination,
            scale_x: 1.0,
            scale_y: 1.0,
            transform: Transform::Normal,
            background: Color::TRANSPARENT,
        }
    }
}

/// One render destination with its damage history.
#[derive(Debug)]
pub struct Target {
    pub(crate) id: TargetId,
    config: TargetConfig,
    age: u8,
    clip: Option<Region>,
    extra_damage: Region,
    force_full: bool,

    pub(crate) ring: DamageRing,
    pub(crate) states: StateTable,
    pub(crate) frame: u64,

    // -- Transient accumulators (valid during a render) --
    pub(crate) damage: Region,
    pub(crate) opaque: Region,
    pub(crate) invisible: Region,
    pub(crate) orphan_damage: Region,
}

impl Target {
    pub(crate) fn new(id: TargetId, config: TargetConfig) -> Self {
        Self {
            id,
            config,
            age: 0,
            clip: None,
            extra_damage: Region::new(),
            force_full: true,
            ring: DamageRing::new(),
            states: StateTable::new(),
            frame: 0,
            damage: Region::new(),
            opaque: Region::new(),
            invisible: Region::new(),
            orphan_damage: Region::new(),
        }
    }

    /// Returns the handle of this target.
    #[must_use]
    pub fn id(&self) -> TargetId {
        self.id
    }

    /// Returns the current configuration.
    #[must_use]
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    /// Returns the buffer age used by the next render.
    #[must_use]
    pub fn age(&self) -> u8 {
        self.age
    }

    /// Returns the clip region (scene space), if any.
    #[must_use]
    pub fn clip(&self) -> Option<&Region> {
        self.clip.as_ref()
    }

    /// Returns the number of completed renders.
    #[must_use]
    pub fn frame(&self) -> u64 {
        self.frame
    }

    // -- Setters --

    /// Sets the presented viewport. Invalidates the history when changed.
    pub fn set_viewport(&mut self, viewport: Rect) {
        if self.config.viewport != viewport {
            self.config.viewport = viewport;
            self.invalidate();
        }
    }

    /// Sets the destination rectangle. Invalidates the history when changed.
    pub fn set_destination(&mut self, destination: IRect) {
        if self.config.destination != destination {
            self.config.destination = destination;
            self.invalidate();
        }
    }

    /// Sets the device scale. Invalidates the history when changed.
    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        if self.config.scale_x != scale_x || self.config.scale_y != scale_y {
            self.config.scale_x = scale_x;
            self.config.scale_y = scale_y;
            self.invalidate();
        }
    }

    /// Sets the output transform. Invalidates the history when changed.
    pub fn set_transform(&mut self, transform: Transform) {
        if self.config.transform != transform {
            self.config.transform = transform;
            self.invalidate();
        }
    }

    /// Sets the background colour. Invalidates the history when changed.
    pub fn set_background(&mut self, background: Color) {
        if self.config.background != background {
            self.config.background = background;
            self.invalidate();
        }
    }

    /// Sets the age of the buffer the next render paints into.
    ///
    /// `0` means the buffer contents are undefined. Ages above
    /// [`DAMAGE_RING_CAPACITY`](crate::ring::DAMAGE_RING_CAPACITY) are
    /// rejected at render time.
    pub fn set_age(&mut self, age: u8) {
        self.age = age;
    }

    /// Restricts rendering to a scene-space region. Persists across renders.
    pub fn set_clip(&mut self, clip: Option<Region>) {
        if self.clip != clip {
            self.clip = clip;
            self.invalidate();
        }
    }

    /// Adds scene-space damage to the next render only.
    pub fn add_extra_damage(&mut self, damage: &Region) {
        self.extra_damage.union_with(damage);
    }

    /// Forces the next render to repaint the whole capture region and drops
    /// the damage history.
    pub fn invalidate(&mut self) {
        self.force_full = true;
        self.ring.reset();
    }

    pub(crate) fn take_extra_damage(&mut self) -> Region {
        core::mem::take(&mut self.extra_damage)
    }

    pub(crate) fn take_force_full(&mut self) -> bool {
        core::mem::replace(&mut self.force_full, false)
    }

    pub(crate) fn is_force_full(&self) -> bool {
        self.force_full
    }

    // -- Coordinate mapping --

    /// Zero-origin scene viewport: the viewport size times the scale,
    /// rounded up.
    #[must_use]
    pub fn scene_viewport(&self) -> IRect {
        let vp = self.config.viewport;
        IRect::from_rect_outer(Rect::new(
            0.0,
            0.0,
            vp.width() * self.config.scale_x,
            vp.height() * self.config.scale_y,
        ))
    }

    /// Area of the scene a render may touch: the scene viewport, restricted
    /// by the clip region.
    #[must_use]
    pub fn capture_region(&self) -> Region {
        let mut region = Region::from(self.scene_viewport());
        if let Some(clip) = &self.clip {
            region.intersect_with(clip);
        }
        region
    }

    /// World to scene mapping.
    #[must_use]
    pub fn world_to_scene(&self) -> Affine {
        Affine::scale_non_uniform(self.config.scale_x, self.config.scale_y)
            * Affine::translate(-self.config.viewport.origin().to_vec2())
    }

    /// Maps a world rectangle to the smallest covering scene rectangle.
    #[must_use]
    pub fn scene_rect_outer(&self, world: Rect) -> IRect {
        self.mapping().rect_outer(world)
    }

    /// Maps a node-local region (origin at `node_origin`, world units) to
    /// scene space.
    ///
    /// Damage rounds outward; `inner` rounds inward for opaque and
    /// invisible hints, so partially covered pixels never count as covered.
    #[must_use]
    pub fn map_local_region(&self, node_origin: Point, region: &Region, inner: bool) -> Region {
        self.mapping().local_region(node_origin, region, inner)
    }

    pub(crate) fn mapping(&self) -> SceneMapping {
        SceneMapping {
            xf: self.world_to_scene(),
        }
    }

    /// Maps a scene rectangle into the destination buffer.
    #[must_use]
    pub fn scene_to_buffer(&self, r: IRect) -> IRect {
        let vp = self.scene_viewport();
        let dst = self.config.destination;
        self.config
            .transform
            .map_rect(r, vp.width(), vp.height())
            .translate(dst.x0, dst.y0)
    }

    /// Maps a scene region into the destination buffer.
    #[must_use]
    pub fn scene_region_to_buffer(&self, region: &Region) -> Region {
        region.map_rects(|r| self.scene_to_buffer(r))
    }

    /// Panics unless the configuration can be rendered.
    pub(crate) fn validate_config(&self) {
        let vp = self.config.viewport;
        assert!(
            vp.width() > 0.0 && vp.height() > 0.0,
            "target viewport is empty: {vp:?}"
        );
        assert!(
            !self.config.destination.is_empty(),
            "target destination is empty: {:?}",
            self.config.destination
        );
        assert!(
            self.config.scale_x > 0.0 && self.config.scale_y > 0.0,
            "target scale must be positive"
        );
        assert!(
            usize::from(self.age) <= crate::ring::DAMAGE_RING_CAPACITY,
            "buffer age {} exceeds damage ring capacity {}",
            self.age,
            crate::ring::DAMAGE_RING_CAPACITY
        );
    }

    /// Clears the transient accumulators.
    pub(crate) fn reset_accumulators(&mut self) {
        self.damage.clear();
        self.opaque.clear();
        self.invisible.clear();
        self.orphan_damage.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Transform; 8] = [
        Transform::Normal,
        Transform::Rotate90,
        Transform::Rotate180,
        Transform::Rotate270,
        Transform::Flipped,
        Transform::Flipped90,
        Transform::Flipped180,
        Transform::Flipped270,
    ];

    fn target(config: TargetConfig) -> Target {
        let id = TargetId {
            scene: 0,
            idx: 0,
            generation: 0,
        };
        Target::new(id, config)
    }

    #[test]
    fn inverse_round_trips_every_transform() {
        let r = IRect::new(3, 5, 10, 20);
        for t in ALL {
            let (w, h) = t.output_size(40, 30);
            let mapped = t.map_rect(r, 40, 30);
            assert!(IRect::new(0, 0, w, h).contains_rect(mapped), "{t:?}");
            assert_eq!(t.inverse().map_rect(mapped, w, h), r, "{t:?}");
        }
    }

    #[test]
    fn rotate90_moves_top_left_to_top_right() {
        let r = IRect::new(0, 0, 10, 5);
        assert_eq!(
            Transform::Rotate90.map_rect(r, 100, 50),
            IRect::new(45, 0, 50, 10)
        );
    }

    #[test]
    fn scene_viewport_is_zero_origin_and_scaled() {
        let mut config = TargetConfig::new(
            Rect::new(100.0, 100.0, 200.5, 150.0),
            IRect::new(0, 0, 202, 100),
        );
        config.scale_x = 2.0;
        config.scale_y = 2.0;
        let t = target(config);
        assert_eq!(t.scene_viewport(), IRect::new(0, 0, 201, 100));
        assert_eq!(
            t.scene_rect_outer(Rect::new(110.0, 100.0, 120.25, 101.0)),
            IRect::new(20, 0, 41, 2)
        );
    }

    #[test]
    fn inner_mapping_drops_partial_pixels() {
        let mut config = TargetConfig::new(Rect::new(0.0, 0.0, 10.0, 10.0), IRect::new(0, 0, 15, 15));
        config.scale_x = 1.5;
        config.scale_y = 1.5;
        let t = target(config);
        let region = Region::from(IRect::new(0, 0, 1, 1));
        let origin = Point::new(1.0, 1.0);
        // Local (0,0,1,1) at origin (1,1) is scene (1.5,1.5,3,3).
        assert_eq!(
            t.map_local_region(origin, &region, true),
            Region::from(IRect::new(2, 2, 3, 3))
        );
        assert_eq!(
            t.map_local_region(origin, &region, false),
            Region::from(IRect::new(1, 1, 3, 3))
        );
    }

    #[test]
    fn setters_invalidate_only_on_change() {
        let mut t = target(TargetConfig::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            IRect::new(0, 0, 10, 10),
        ));
        assert!(t.take_force_full());
        t.set_viewport(Rect::new(0.0, 0.0, 10.0, 10.0));
        assert!(!t.is_force_full());
        t.set_transform(Transform::Rotate180);
        assert!(t.take_force_full());
        t.set_age(2);
        assert!(!t.is_force_full());
    }

    #[test]
    fn capture_region_honours_clip() {
        let mut t = target(TargetConfig::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            IRect::new(0, 0, 10, 10),
        ));
        t.set_clip(Some(Region::from(IRect::new(5, 5, 20, 20))));
        assert_eq!(t.capture_region(), Region::from(IRect::new(5, 5, 10, 10)));
    }

    #[test]
    #[should_panic(expected = "exceeds damage ring capacity")]
    fn oversized_age_is_rejected() {
        let mut t = target(TargetConfig::new(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            IRect::new(0, 0, 10, 10),
        ));
        t.set_age(5);
        t.validate_config();
    }
}
