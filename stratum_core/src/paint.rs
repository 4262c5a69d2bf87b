// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The paint backend interface.
//!
//! The scene decides *what* to redraw and in *which order*; a [`Painter`]
//! rasterizes. All regions handed to a painter are in scene space (see
//! [`target`](crate::target)); the painter maps them into its buffer using
//! the [`TargetInfo`] received in [`Painter::bind_target`].
//!
//! Per render the scene issues, in order:
//!
//! 1. [`bake`](Painter::bake) for every bakeable node whose cache is stale;
//! 2. [`bind_target`](Painter::bind_target);
//! 3. opaque content with [`DrawMode::Replace`];
//! 4. [`fill_background`](Painter::fill_background) for damage nothing
//!    opaque covers;
//! 5. translucent content back to front with [`DrawMode::Blend`],
//!    interleaved with background captures
//!    ([`begin_background_capture`](Painter::begin_background_capture) …
//!    [`end_background_capture`](Painter::end_background_capture)) and
//!    [`composite_effect`](Painter::composite_effect);
//! 6. [`finish`](Painter::finish).
//!
//! Between `begin_background_capture` and `end_background_capture`, every
//! `fill_background` and `paint_region` call targets the capture surface.

use core::fmt;

use crate::node::{NodeId, SurfaceId};
use crate::region::{IRect, Region};
use crate::target::{TargetId, Transform};

/// An 8-bit RGBA colour with straight (non-premultiplied) alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Fully transparent black.
    pub const TRANSPARENT: Self = Self::from_rgba8(0, 0, 0, 0);
    /// Opaque black.
    pub const BLACK: Self = Self::from_rgba8(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::from_rgba8(255, 255, 255, 255);

    /// Creates a colour from its components.
    #[must_use]
    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Returns `true` if the alpha is 255.
    #[must_use]
    pub const fn is_opaque(self) -> bool {
        self.a == u8::MAX
    }
}

/// How drawn pixels combine with what is already in the buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DrawMode {
    /// Overwrite destination pixels (the region is known to be opaque).
    Replace,
    /// Source-over blending.
    Blend,
}

/// Why a painter could not provide a surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceError {
    /// Allocating a surface of the given size failed.
    Allocation {
        /// Requested width in pixels.
        width: u32,
        /// Requested height in pixels.
        height: u32,
    },
    /// The underlying device or context was lost.
    Lost,
    /// The painter does not support the operation.
    Unsupported,
}

impl fmt::Display for SurfaceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Allocation { width, height } => {
                write!(f, "failed to allocate a {width}x{height} surface")
            }
            Self::Lost => f.write_str("rendering device lost"),
            Self::Unsupported => f.write_str("operation not supported by painter"),
        }
    }
}

impl core::error::Error for SurfaceError {}

/// Everything a painter needs to map scene space onto its buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetInfo {
    /// Target being rendered.
    pub target: TargetId,
    /// Zero-origin scene viewport.
    pub scene_viewport: IRect,
    /// Destination rectangle in the buffer.
    pub destination: IRect,
    /// Output orientation.
    pub transform: Transform,
    /// Horizontal device scale.
    pub scale_x: f64,
    /// Vertical device scale.
    pub scale_y: f64,
    /// Background colour.
    pub background: Color,
    /// Render counter of the target.
    pub frame: u64,
}

impl TargetInfo {
    /// Maps a scene rectangle into buffer space.
    #[must_use]
    pub const fn scene_to_buffer(&self, r: IRect) -> IRect {
        let vp = self.scene_viewport;
        self.transform
            .map_rect(r, vp.width(), vp.height())
            .translate(self.destination.x0, self.destination.y0)
    }
}

/// A request to draw part of one node's content.
#[derive(Clone, Copy, Debug)]
pub struct NodeDraw<'a> {
    /// Node being drawn.
    pub node: NodeId,
    /// Surface holding the content.
    pub content: SurfaceId,
    /// Scene rectangle the content is stretched over.
    pub scene_rect: IRect,
    /// Pixels to touch (scene space, inside `scene_rect`).
    pub region: &'a Region,
    /// Replace or blend.
    pub mode: DrawMode,
    /// Draw from the node's baked surface rather than its live content.
    pub baked: bool,
}

/// A request to refresh a node's cached surface.
#[derive(Clone, Copy, Debug)]
pub struct BakeRequest<'a> {
    /// Node being baked.
    pub node: NodeId,
    /// Surface holding the live content.
    pub content: SurfaceId,
    /// Scene rectangle the cached surface covers; its size is the surface
    /// size.
    pub rect: IRect,
    /// Target scale the surface is rendered at.
    pub scale_x: f64,
    /// Target scale the surface is rendered at.
    pub scale_y: f64,
    /// Part of `rect` to re-render (scene space).
    pub damage: &'a Region,
}

/// A request to start repainting a background capture.
#[derive(Clone, Copy, Debug)]
pub struct CaptureInfo<'a> {
    /// Node carrying the tracker.
    pub node: NodeId,
    /// Scene rectangle captured.
    pub rect: IRect,
    /// Capture resolution relative to the target.
    pub scale: f64,
    /// Part of `rect` about to be repainted (scene space).
    pub region: &'a Region,
}

/// A 2D paint backend driven by the scene.
pub trait Painter {
    /// Starts a render into the given target.
    fn bind_target(&mut self, target: &TargetInfo);

    /// Draws `draw.region` of a node's content.
    fn paint_region(&mut self, draw: &NodeDraw<'_>);

    /// Fills `region` with the target's background colour, replacing
    /// whatever is there.
    fn fill_background(&mut self, region: &Region, color: Color);

    /// Refreshes the cached surface of a bakeable node.
    ///
    /// The default implementation keeps no cache.
    fn bake(&mut self, request: &BakeRequest<'_>) -> Result<(), SurfaceError> {
        _ = request;
        Ok(())
    }

    /// Redirects subsequent drawing into the capture surface of a tracker
    /// node, allocating or resizing the surface as needed.
    fn begin_background_capture(&mut self, capture: &CaptureInfo<'_>) -> Result<(), SurfaceError>;

    /// Returns drawing to the main target.
    fn end_background_capture(&mut self, node: NodeId);

    /// Composites the effect of a tracker node over `region` of the current
    /// destination, reading its capture surface.
    fn composite_effect(&mut self, node: NodeId, region: &Region);

    /// Ends the render.
    fn finish(&mut self);
}
