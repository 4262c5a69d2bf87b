// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! CPU painter for solid-colour surfaces.
//!
//! Every [`SurfaceId`] is a uniformly coloured surface, so a node's content
//! maps onto whole buffer rectangles under any output transform and the
//! painter never resamples. That makes it exact enough to compare partial
//! renders against full ones pixel for pixel.
//!
//! Rasterization goes through [`tiny_skia`]: [`DrawMode::Replace`] fills with
//! [`BlendMode::Source`] and [`DrawMode::Blend`] with
//! [`BlendMode::SourceOver`]. The background effect reads the capture and
//! halves its colour channels, replacing the destination.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use stratum_core::node::{NodeId, SurfaceId};
use stratum_core::paint::{
    BakeRequest, CaptureInfo, Color, DrawMode, NodeDraw, Painter, SurfaceError, TargetInfo,
};
use stratum_core::region::{IRect, Region};
use tiny_skia::{BlendMode, IntRect, Paint, Pixmap, PremultipliedColorU8, Transform};

fn paint_for(color: Color, mode: DrawMode) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color_rgba8(color.r, color.g, color.b, color.a);
    paint.anti_alias = false;
    paint.blend_mode = match mode {
        DrawMode::Replace => BlendMode::Source,
        DrawMode::Blend => BlendMode::SourceOver,
    };
    paint
}

fn fill(pixmap: &mut Pixmap, rect: IRect, paint: &Paint<'_>) {
    if let Some(r) = IntRect::from_ltrb(rect.x0, rect.y0, rect.x1, rect.y1) {
        pixmap.fill_rect(r.to_rect(), paint, Transform::identity(), None);
    }
}

fn pixel_index(pixmap: &Pixmap, x: i32, y: i32) -> Option<usize> {
    let x = u32::try_from(x).ok().filter(|&x| x < pixmap.width())?;
    let y = u32::try_from(y).ok().filter(|&y| y < pixmap.height())?;
    Some(y as usize * pixmap.width() as usize + x as usize)
}

fn darken(px: PremultipliedColorU8) -> PremultipliedColorU8 {
    PremultipliedColorU8::from_rgba(px.red() / 2, px.green() / 2, px.blue() / 2, px.alpha())
        .unwrap_or(PremultipliedColorU8::TRANSPARENT)
}

#[derive(Debug)]
struct Capture {
    node: NodeId,
    rect: IRect,
    pixmap: Pixmap,
}

/// A [`Painter`] that rasterizes into a [`tiny_skia::Pixmap`].
///
/// Surfaces are registered with [`set_surface_color`](Self::set_surface_color);
/// content referring to an unknown surface draws nothing. Background
/// captures are kept at scene resolution.
#[derive(Debug)]
pub struct SoftwarePainter {
    pixmap: Pixmap,
    surfaces: BTreeMap<SurfaceId, Color>,
    baked: Vec<(NodeId, Color)>,
    captures: Vec<Capture>,
    capturing: Option<usize>,
    info: Option<TargetInfo>,
    max_capture_area: Option<u64>,
}

impl SoftwarePainter {
    /// Creates a painter with a transparent `width` × `height` buffer.
    ///
    /// Fails for an empty buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, SurfaceError> {
        let pixmap = Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;
        Ok(Self {
            pixmap,
            surfaces: BTreeMap::new(),
            baked: Vec::new(),
            captures: Vec::new(),
            capturing: None,
            info: None,
            max_capture_area: None,
        })
    }

    /// Sets the colour of a surface.
    pub fn set_surface_color(&mut self, surface: SurfaceId, color: Color) {
        self.surfaces.insert(surface, color);
    }

    /// Makes captures larger than `area` pixels fail to allocate.
    pub fn set_max_capture_area(&mut self, area: Option<u64>) {
        self.max_capture_area = area;
    }

    /// The buffer.
    #[must_use]
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// The buffer, mutably; swap it out to emulate multiple buffering.
    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// The capture surface of a tracker node, if allocated.
    #[must_use]
    pub fn capture(&self, node: NodeId) -> Option<&Pixmap> {
        self.captures
            .iter()
            .find(|c| c.node == node)
            .map(|c| &c.pixmap)
    }

    /// Frees the cache and capture surfaces of a node.
    pub fn release(&mut self, node: NodeId) {
        self.baked.retain(|(n, _)| *n != node);
        self.captures.retain(|c| c.node != node);
        self.capturing = None;
    }

    fn content_color(&self, draw: &NodeDraw<'_>) -> Option<Color> {
        if draw.baked
            && let Some((_, color)) = self.baked.iter().find(|(n, _)| *n == draw.node)
        {
            return Some(*color);
        }
        self.surfaces.get(&draw.content).copied()
    }

    /// Fills a scene rectangle in the current destination.
    fn write(&mut self, rect: IRect, paint: &Paint<'_>) {
        if let Some(i) = self.capturing {
            let capture = &mut self.captures[i];
            let local = rect
                .intersect(capture.rect)
                .translate(-capture.rect.x0, -capture.rect.y0);
            fill(&mut capture.pixmap, local, paint);
        } else if let Some(info) = self.info {
            let clipped = rect.intersect(info.scene_viewport);
            if !clipped.is_empty() {
                fill(&mut self.pixmap, info.scene_to_buffer(clipped), paint);
            }
        }
    }

    /// Stores one scene pixel in the current destination.
    fn write_pixel(&mut self, x: i32, y: i32, px: PremultipliedColorU8) {
        let (pixmap, bx, by) = if let Some(i) = self.capturing {
            let capture = &mut self.captures[i];
            if !capture.rect.contains_point(x, y) {
                return;
            }
            (&mut capture.pixmap, x - capture.rect.x0, y - capture.rect.y0)
        } else if let Some(info) = self.info {
            if !info.scene_viewport.contains_point(x, y) {
                return;
            }
            let b = info.scene_to_buffer(IRect::new(x, y, x + 1, y + 1));
            (&mut self.pixmap, b.x0, b.y0)
        } else {
            return;
        };
        if let Some(i) = pixel_index(pixmap, bx, by) {
            pixmap.pixels_mut()[i] = px;
        }
    }

    fn capture_pixel(&self, node: NodeId, x: i32, y: i32) -> Option<PremultipliedColorU8> {
        let capture = self.captures.iter().find(|c| c.node == node)?;
        let i = pixel_index(&capture.pixmap, x - capture.rect.x0, y - capture.rect.y0)?;
        Some(capture.pixmap.pixels()[i])
    }
}

impl Painter for SoftwarePainter {
    fn bind_target(&mut self, target: &TargetInfo) {
        self.info = Some(*target);
        self.capturing = None;
    }

    fn paint_region(&mut self, draw: &NodeDraw<'_>) {
        let Some(color) = self.content_color(draw) else {
            return;
        };
        let paint = paint_for(color, draw.mode);
        for &r in draw.region.rects() {
            self.write(r.intersect(draw.scene_rect), &paint);
        }
    }

    fn fill_background(&mut self, region: &Region, color: Color) {
        let paint = paint_for(color, DrawMode::Replace);
        for &r in region.rects() {
            self.write(r, &paint);
        }
    }

    fn bake(&mut self, request: &BakeRequest<'_>) -> Result<(), SurfaceError> {
        let color = self
            .surfaces
            .get(&request.content)
            .copied()
            .unwrap_or(Color::TRANSPARENT);
        match self.baked.iter_mut().find(|(n, _)| *n == request.node) {
            Some(entry) => entry.1 = color,
            None => self.baked.push((request.node, color)),
        }
        Ok(())
    }

    fn begin_background_capture(&mut self, capture: &CaptureInfo<'_>) -> Result<(), SurfaceError> {
        let rect = capture.rect;
        let width = u32::try_from(rect.width()).unwrap_or(0);
        let height = u32::try_from(rect.height()).unwrap_or(0);
        if self.max_capture_area.is_some_and(|max| rect.area() > max) {
            return Err(SurfaceError::Allocation { width, height });
        }
        let existing = self.captures.iter().position(|c| c.node == capture.node);
        let i = match existing {
            Some(i) if self.captures[i].rect == rect => i,
            _ => {
                let pixmap =
                    Pixmap::new(width, height).ok_or(SurfaceError::Allocation { width, height })?;
                let entry = Capture {
                    node: capture.node,
                    rect,
                    pixmap,
                };
                match existing {
                    Some(i) => {
                        self.captures[i] = entry;
                        i
                    }
                    None => {
                        self.captures.push(entry);
                        self.captures.len() - 1
                    }
                }
            }
        };
        self.capturing = Some(i);
        Ok(())
    }

    fn end_background_capture(&mut self, _node: NodeId) {
        self.capturing = None;
    }

    fn composite_effect(&mut self, node: NodeId, region: &Region) {
        for &r in region.rects() {
            for y in r.y0..r.y1 {
                for x in r.x0..r.x1 {
                    if let Some(px) = self.capture_pixel(node, x, y) {
                        self.write_pixel(x, y, darken(px));
                    }
                }
            }
        }
    }

    fn finish(&mut self) {
        self.capturing = None;
    }
}
