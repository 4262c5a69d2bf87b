// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer-space damage for swap-with-damage style presentation.

use alloc::vec::Vec;

use stratum_core::region::IRect;
use stratum_core::scene::RenderOutput;
use stratum_core::target::Target;

/// A region of the output buffer that was repainted.
///
/// Backends hand this to presentation APIs that accept damage hints so the
/// compositor only re-reads what changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum DamageRegion {
    /// The entire buffer was repainted.
    #[default]
    Full,
    /// Disjoint rectangles in buffer pixels.
    Rects(Vec<IRect>),
    /// Nothing changed; the previous frame can be presented as is.
    None,
}

impl DamageRegion {
    /// Converts a render's scene-space damage into buffer space.
    ///
    /// A full repaint of an unclipped target reports [`Full`](Self::Full).
    #[must_use]
    pub fn from_output(output: &RenderOutput, target: &Target) -> Self {
        if output.damage.is_empty() {
            return Self::None;
        }
        if output.stats.full_damage && target.clip().is_none() {
            return Self::Full;
        }
        let buffer = target.scene_region_to_buffer(&output.damage);
        Self::Rects(buffer.rects().to_vec())
    }

    /// Returns `true` if no region needs presenting.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Rectangles as `[x, y, width, height]`, or `None` for a full repaint.
    #[must_use]
    pub fn to_xywh(&self) -> Option<Vec<[i32; 4]>> {
        match self {
            Self::Full => None,
            Self::Rects(rects) => Some(
                rects
                    .iter()
                    .map(|r| [r.x0, r.y0, r.width(), r.height()])
                    .collect(),
            ),
            Self::None => Some(Vec::new()),
        }
    }

    /// Merges another damage region into this one.
    pub fn merge(&mut self, other: &Self) {
        match (&*self, other) {
            (Self::Full, _) | (_, Self::Full) => *self = Self::Full,
            (Self::None, _) => *self = other.clone(),
            (_, Self::None) => {}
            (Self::Rects(a), Self::Rects(b)) => {
                let mut merged = a.clone();
                merged.extend_from_slice(b);
                *self = Self::Rects(merged);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use kurbo::Rect;
    use stratum_core::node::SurfaceId;
    use stratum_core::paint::Color;
    use stratum_core::region::Region;
    use stratum_core::scene::Scene;
    use stratum_core::target::{TargetConfig, Transform};

    use super::*;
    use crate::PaintPlan;

    #[test]
    fn merge_full_wins() {
        let mut d = DamageRegion::Rects(vec![IRect::new(0, 0, 1, 1)]);
        d.merge(&DamageRegion::Full);
        assert_eq!(d, DamageRegion::Full);

        let mut d = DamageRegion::None;
        d.merge(&DamageRegion::Rects(vec![IRect::new(0, 0, 1, 1)]));
        assert_eq!(d, DamageRegion::Rects(vec![IRect::new(0, 0, 1, 1)]));
        assert_eq!(d.to_xywh(), Some(vec![[0, 0, 1, 1]]));
    }

    #[test]
    fn output_damage_maps_through_transform() {
        let mut scene = Scene::new();
        let root = scene.tree_mut().create_node();
        scene
            .tree_mut()
            .set_layout_rect(root, Rect::new(0.0, 0.0, 40.0, 20.0));
        scene.set_root(Some(root));
        let child = scene.tree_mut().create_node();
        scene
            .tree_mut()
            .set_layout_rect(child, Rect::new(0.0, 0.0, 10.0, 5.0));
        scene.tree_mut().set_content(child, Some(SurfaceId(1)));
        scene.tree_mut().add_child(root, child);

        let mut config = TargetConfig::new(Rect::new(0.0, 0.0, 40.0, 20.0), IRect::new(0, 0, 20, 40));
        config.transform = Transform::Rotate90;
        config.background = Color::BLACK;
        let target = scene.create_target(config);
        let mut plan = PaintPlan::new();

        let out = scene.render(target, &mut plan);
        assert_eq!(
            DamageRegion::from_output(&out, scene.target(target)),
            DamageRegion::Full
        );

        scene.tree_mut().set_content(child, Some(SurfaceId(2)));
        scene.target_mut(target).set_age(1);
        plan.clear();
        let out = scene.render(target, &mut plan);
        assert_eq!(out.damage, Region::from(IRect::new(0, 0, 10, 5)));
        assert_eq!(
            DamageRegion::from_output(&out, scene.target(target)),
            DamageRegion::Rects(vec![IRect::new(15, 0, 20, 10)])
        );

        plan.clear();
        let out = scene.render(target, &mut plan);
        assert!(DamageRegion::from_output(&out, scene.target(target)).is_empty());
        assert!(plan.is_empty());
        assert!(plan.finished);
    }
}
