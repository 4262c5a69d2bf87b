// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paint plan: the recorded painter calls of one render.

use alloc::vec::Vec;

use stratum_core::node::{NodeId, SurfaceId};
use stratum_core::paint::{
    BakeRequest, CaptureInfo, Color, DrawMode, NodeDraw, Painter, SurfaceError, TargetInfo,
};
use stratum_core::region::{IRect, Region};

/// A single recorded painter call.
///
/// Regions are in scene space, exactly as the scene issued them.
#[derive(Clone, Debug, PartialEq)]
pub enum PaintOp {
    /// Part of a node's content.
    Paint {
        /// The node this op originates from.
        node: NodeId,
        /// The surface to draw.
        surface: SurfaceId,
        /// Scene rectangle the content is stretched over.
        scene_rect: IRect,
        /// Pixels to touch.
        region: Region,
        /// Replace or blend.
        mode: DrawMode,
        /// Whether the baked surface is drawn.
        baked: bool,
    },
    /// Background fill.
    Fill {
        /// Pixels to fill.
        region: Region,
        /// Fill colour.
        color: Color,
    },
    /// Cached surface refresh.
    Bake {
        /// Node being baked.
        node: NodeId,
        /// Live content.
        surface: SurfaceId,
        /// Scene rectangle the cache covers.
        rect: IRect,
        /// Scale the cache is rendered at.
        scale: (f64, f64),
        /// Part of `rect` re-rendered.
        damage: Region,
    },
    /// Start of a background capture.
    BeginCapture {
        /// Tracker node.
        node: NodeId,
        /// Scene rectangle captured.
        rect: IRect,
        /// Capture resolution relative to the target.
        scale: f64,
        /// Part of `rect` repainted.
        region: Region,
    },
    /// End of a background capture.
    EndCapture {
        /// Tracker node.
        node: NodeId,
    },
    /// Effect composite over the current destination.
    Composite {
        /// Tracker node.
        node: NodeId,
        /// Pixels covered.
        region: Region,
    },
}

/// The ordered painter calls of one render into one target.
///
/// A `PaintPlan` is itself a [`Painter`]: pass it to
/// [`Scene::render`](stratum_core::scene::Scene::render) to record, then
/// [`replay`](Self::replay) it into a real painter, or inspect
/// [`ops`](Self::ops) directly. Recording appends; call
/// [`clear`](Self::clear) between renders.
#[derive(Clone, Debug, Default)]
pub struct PaintPlan {
    /// Target bound by the recorded render, if any.
    pub target: Option<TargetInfo>,
    /// Recorded calls in issue order.
    pub ops: Vec<PaintOp>,
    /// Whether `finish` was seen.
    pub finished: bool,
}

impl PaintPlan {
    /// Creates an empty plan.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Clears the plan for reuse.
    pub fn clear(&mut self) {
        self.target = None;
        self.ops.clear();
        self.finished = false;
    }

    /// Returns `true` if no draw work was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Returns the number of `Paint` and `Composite` ops.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.ops
            .iter()
            .filter(|op| matches!(op, PaintOp::Paint { .. } | PaintOp::Composite { .. }))
            .count()
    }

    /// Total pixels touched by `Paint` and `Fill` ops on the main target.
    #[must_use]
    pub fn painted_area(&self) -> u64 {
        let mut depth = 0_u32;
        let mut area = 0;
        for op in &self.ops {
            match op {
                PaintOp::BeginCapture { .. } => depth += 1,
                PaintOp::EndCapture { .. } => depth = depth.saturating_sub(1),
                PaintOp::Paint { region, .. } | PaintOp::Fill { region, .. } if depth == 0 => {
                    area += region.area();
                }
                _ => {}
            }
        }
        area
    }

    /// Replays the recorded calls into `painter`.
    ///
    /// Bakes are replayed before the target is bound, as during a render.
    /// Stops at the first bake or capture the painter cannot provide.
    pub fn replay(&self, painter: &mut dyn Painter) -> Result<(), SurfaceError> {
        let mut bound = false;
        for op in &self.ops {
            if !bound && !matches!(op, PaintOp::Bake { .. }) {
                self.bind(painter);
                bound = true;
            }
            match op {
                PaintOp::Paint {
                    node,
                    surface,
                    scene_rect,
                    region,
                    mode,
                    baked,
                } => painter.paint_region(&NodeDraw {
                    node: *node,
                    content: *surface,
                    scene_rect: *scene_rect,
                    region,
                    mode: *mode,
                    baked: *baked,
                }),
                PaintOp::Fill { region, color } => painter.fill_background(region, *color),
                PaintOp::Bake {
                    node,
                    surface,
                    rect,
                    scale,
                    damage,
                } => painter.bake(&BakeRequest {
                    node: *node,
                    content: *surface,
                    rect: *rect,
                    scale_x: scale.0,
                    scale_y: scale.1,
                    damage,
                })?,
                PaintOp::BeginCapture {
                    node,
                    rect,
                    scale,
                    region,
                } => painter.begin_background_capture(&CaptureInfo {
                    node: *node,
                    rect: *rect,
                    scale: *scale,
                    region,
                })?,
                PaintOp::EndCapture { node } => painter.end_background_capture(*node),
                PaintOp::Composite { node, region } => painter.composite_effect(*node, region),
            }
        }
        if !bound {
            self.bind(painter);
        }
        if self.finished {
            painter.finish();
        }
        Ok(())
    }

    fn bind(&self, painter: &mut dyn Painter) {
        if let Some(info) = &self.target {
            painter.bind_target(info);
        }
    }
}

impl Painter for PaintPlan {
    fn bind_target(&mut self, target: &TargetInfo) {
        self.target = Some(*target);
    }

    fn paint_region(&mut self, draw: &NodeDraw<'_>) {
        self.ops.push(PaintOp::Paint {
            node: draw.node,
            surface: draw.content,
            scene_rect: draw.scene_rect,
            region: draw.region.clone(),
            mode: draw.mode,
            baked: draw.baked,
        });
    }

    fn fill_background(&mut self, region: &Region, color: Color) {
        self.ops.push(PaintOp::Fill {
            region: region.clone(),
            color,
        });
    }

    fn bake(&mut self, request: &BakeRequest<'_>) -> Result<(), SurfaceError> {
        self.ops.push(PaintOp::Bake {
            node: request.node,
            surface: request.content,
            rect: request.rect,
            scale: (request.scale_x, request.scale_y),
            damage: request.damage.clone(),
        });
        Ok(())
    }

    fn begin_background_capture(&mut self, capture: &CaptureInfo<'_>) -> Result<(), SurfaceError> {
        self.ops.push(PaintOp::BeginCapture {
            node: capture.node,
            rect: capture.rect,
            scale: capture.scale,
            region: capture.region.clone(),
        });
        Ok(())
    }

    fn end_background_capture(&mut self, node: NodeId) {
        self.ops.push(PaintOp::EndCapture { node });
    }

    fn composite_effect(&mut self, node: NodeId, region: &Region) {
        self.ops.push(PaintOp::Composite {
            node,
            region: region.clone(),
        });
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::node::NodeStore;

    use super::*;

    fn region(x0: i32, y0: i32, x1: i32, y1: i32) -> Region {
        Region::from(IRect::new(x0, y0, x1, y1))
    }

    #[test]
    fn painted_area_ignores_capture_work() {
        let node = NodeStore::new().create_node();
        let plan = PaintPlan {
            target: None,
            ops: alloc::vec![
                PaintOp::Fill {
                    region: region(0, 0, 10, 10),
                    color: Color::BLACK,
                },
                PaintOp::BeginCapture {
                    node,
                    rect: IRect::new(0, 0, 4, 4),
                    scale: 1.0,
                    region: region(0, 0, 4, 4),
                },
                PaintOp::Fill {
                    region: region(0, 0, 4, 4),
                    color: Color::BLACK,
                },
                PaintOp::EndCapture { node },
                PaintOp::Composite {
                    node,
                    region: region(0, 0, 4, 4),
                },
            ],
            finished: true,
        };
        assert_eq!(plan.painted_area(), 100);
        assert_eq!(plan.draw_count(), 1);
    }

    #[test]
    fn replay_reproduces_the_recording() {
        let node = NodeStore::new().create_node();
        let damage = region(0, 0, 2, 2);
        let mut plan = PaintPlan::new();
        plan.bake(&BakeRequest {
            node,
            content: SurfaceId(1),
            rect: IRect::new(0, 0, 2, 2),
            scale_x: 1.0,
            scale_y: 1.0,
            damage: &damage,
        })
        .unwrap();
        plan.paint_region(&NodeDraw {
            node,
            content: SurfaceId(1),
            scene_rect: IRect::new(0, 0, 2, 2),
            region: &damage,
            mode: DrawMode::Blend,
            baked: true,
        });
        plan.fill_background(&damage, Color::WHITE);
        plan.finish();

        let mut copy = PaintPlan::new();
        plan.replay(&mut copy).unwrap();
        assert_eq!(copy.ops, plan.ops);
        assert!(copy.finished);

        plan.clear();
        assert!(plan.is_empty());
        assert!(!plan.finished);
    }
}
