// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for stratum
//! diagnostics.
//!
//! This crate provides [`TraceSink`](stratum_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording, every record
//!   stamped with its offset from the start of recording, with
//!   [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON from recorded
//!   bytes.

pub mod chrome;
pub mod pretty;
pub mod recorder;

#[cfg(test)]
mod test_support {
    use kurbo::Rect;
    use stratum_core::node::{NodeId, SurfaceId};
    use stratum_core::paint::{
        BakeRequest, CaptureInfo, Color, NodeDraw, Painter, SurfaceError, TargetInfo,
    };
    use stratum_core::region::{IRect, Region};
    use stratum_core::scene::Scene;
    use stratum_core::target::{TargetConfig, TargetId};

    /// Painter that draws nothing and fails every bake.
    pub(crate) struct NullPainter;

    impl Painter for NullPainter {
        fn bind_target(&mut self, _target: &TargetInfo) {}
        fn paint_region(&mut self, _draw: &NodeDraw<'_>) {}
        fn fill_background(&mut self, _region: &Region, _color: Color) {}
        fn bake(&mut self, _request: &BakeRequest<'_>) -> Result<(), SurfaceError> {
            Err(SurfaceError::Unsupported)
        }
        fn begin_background_capture(
            &mut self,
            _capture: &CaptureInfo<'_>,
        ) -> Result<(), SurfaceError> {
            Ok(())
        }
        fn end_background_capture(&mut self, _node: NodeId) {}
        fn composite_effect(&mut self, _node: NodeId, _region: &Region) {}
        fn finish(&mut self) {}
    }

    /// A 32×16 scene with one content node; returns the scene, a target
    /// covering it, and the node.
    pub(crate) fn test_scene() -> (Scene, TargetId, NodeId) {
        let mut scene = Scene::new();
        let tree = scene.tree_mut();
        let root = tree.create_node();
        tree.set_layout_rect(root, Rect::new(0.0, 0.0, 32.0, 16.0));
        let child = tree.create_node();
        tree.set_layout_rect(child, Rect::new(4.0, 4.0, 12.0, 12.0));
        tree.set_content(child, Some(SurfaceId(1)));
        tree.add_child(root, child);
        scene.set_root(Some(root));
        let target = scene.create_target(TargetConfig::new(
            Rect::new(0.0, 0.0, 32.0, 16.0),
            IRect::new(0, 0, 32, 16),
        ));
        (scene, target, child)
    }
}
