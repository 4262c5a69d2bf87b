// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for the render pipeline.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that
//! [`Scene::render_traced`](crate::scene::Scene::render_traced) calls at each
//! stage. All method bodies default to no-ops, so implementing only the
//! events you care about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing (zero overhead). When
//! **on**, each method performs a single `Option` branch before dispatching.
//!
//! Events carry no timestamps: `stratum_core` is `no_std` and has no clock.
//! Sinks that want timings stamp events on arrival.
//!
//! # Crate features
//!
//! - `trace` — enables the `Tracer` method bodies (one branch per call).
//! - `trace-rich` (implies `trace`) — gates [`NodeDamage`] and [`DamageRect`]
//!   events plus the corresponding `TraceSink` methods.

use crate::scene::{RenderStats, ResourceFailure};
use crate::target::TargetId;

#[cfg(feature = "trace-rich")]
use crate::region::IRect;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a render is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Layout engine call and tree evaluation.
    Layout,
    /// Visibility ("begin") pass.
    Visibility,
    /// Damage and occlusion pass, including bakes.
    Damage,
    /// Orphan, tracker and buffer-age damage reconciliation.
    Reconcile,
    /// Ordered draw pass.
    Draw,
}

impl PhaseKind {
    /// Every phase, in pipeline order.
    pub const ALL: [Self; 5] = [
        Self::Layout,
        Self::Visibility,
        Self::Damage,
        Self::Reconcile,
        Self::Draw,
    ];

    /// Short lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Layout => "layout",
            Self::Visibility => "visibility",
            Self::Damage => "damage",
            Self::Reconcile => "reconcile",
            Self::Draw => "draw",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when a render starts, after validation.
#[derive(Clone, Copy, Debug)]
pub struct RenderBeginEvent {
    /// Render counter of the target (starts at 1).
    pub frame_index: u64,
    /// Target being rendered.
    pub target: TargetId,
    /// Buffer age requested for this render.
    pub age: u8,
}

/// Marks the beginning of a render phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Render counter.
    pub frame_index: u64,
    /// Target being rendered.
    pub target: TargetId,
    /// Which phase is starting.
    pub phase: PhaseKind,
}

/// Marks the end of a render phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Render counter.
    pub frame_index: u64,
    /// Target being rendered.
    pub target: TargetId,
    /// Which phase is ending.
    pub phase: PhaseKind,
}

/// Emitted when the painter fails to provide a surface.
#[derive(Clone, Copy, Debug)]
pub struct ResourceFailureEvent {
    /// Render counter.
    pub frame_index: u64,
    /// Target being rendered.
    pub target: TargetId,
    /// What failed.
    pub failure: ResourceFailure,
}

/// Per-render summary.
#[derive(Clone, Copy, Debug)]
pub struct RenderSummary {
    /// Render counter.
    pub frame_index: u64,
    /// Target rendered.
    pub target: TargetId,
    /// Counters collected during the render.
    pub stats: RenderStats,
}

/// Damage contributed by one node (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct NodeDamage {
    /// Slot index of the node.
    pub node_index: u32,
    /// Bounds of the damage, scene space.
    pub bounds: IRect,
    /// Damaged pixel count.
    pub area: u64,
}

/// An axis-aligned output damage rectangle (requires `trace-rich`).
#[cfg(feature = "trace-rich")]
#[derive(Clone, Copy, Debug)]
pub struct DamageRect {
    /// Left edge.
    pub x: i32,
    /// Top edge.
    pub y: i32,
    /// Width.
    pub width: u32,
    /// Height.
    pub height: u32,
}

#[cfg(feature = "trace-rich")]
impl From<IRect> for DamageRect {
    fn from(r: IRect) -> Self {
        Self {
            x: r.x0,
            y: r.y0,
            width: u32::try_from(r.width()).unwrap_or(0),
            height: u32::try_from(r.height()).unwrap_or(0),
        }
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the render pipeline.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a render starts.
    fn on_render_begin(&mut self, e: &RenderBeginEvent) {
        _ = e;
    }

    /// Called at the beginning of a render phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a render phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when a bake or capture could not get a surface.
    fn on_resource_failure(&mut self, e: &ResourceFailureEvent) {
        _ = e;
    }

    /// Called with the per-render summary.
    fn on_render_summary(&mut self, s: &RenderSummary) {
        _ = s;
    }

    /// Called with per-node damage (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    fn on_node_damage(&mut self, frame_index: u64, damage: &[NodeDamage]) {
        _ = (frame_index, damage);
    }

    /// Called with the output damage rectangles (requires `trace-rich`
    /// feature).
    #[cfg(feature = "trace-rich")]
    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        _ = (frame_index, rects);
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Returns `true` if events reach a sink.
    #[inline]
    #[must_use]
    pub fn is_active(&self) -> bool {
        #[cfg(feature = "trace")]
        {
            self.sink.is_some()
        }
        #[cfg(not(feature = "trace"))]
        {
            false
        }
    }

    /// Emits a [`RenderBeginEvent`].
    #[inline]
    pub fn render_begin(&mut self, e: &RenderBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_render_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseBeginEvent`].
    #[inline]
    pub fn phase_begin(&mut self, e: &PhaseBeginEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_begin(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`PhaseEndEvent`].
    #[inline]
    pub fn phase_end(&mut self, e: &PhaseEndEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_phase_end(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`ResourceFailureEvent`].
    #[inline]
    pub fn resource_failure(&mut self, e: &ResourceFailureEvent) {
        #[cfg(feature = "trace")]
        if let Some(s) = &mut self.sink {
            s.on_resource_failure(e);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = e;
        }
    }

    /// Emits a [`RenderSummary`].
    #[inline]
    pub fn render_summary(&mut self, s: &RenderSummary) {
        #[cfg(feature = "trace")]
        if let Some(sink) = &mut self.sink {
            sink.on_render_summary(s);
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = s;
        }
    }

    /// Emits per-node damage (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn node_damage(&mut self, frame_index: u64, damage: &[NodeDamage]) {
        if let Some(s) = &mut self.sink {
            s.on_node_damage(frame_index, damage);
        }
    }

    /// Emits output damage rectangles (requires `trace-rich` feature).
    #[cfg(feature = "trace-rich")]
    #[inline]
    pub fn damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        if let Some(s) = &mut self.sink {
            s.on_damage_rects(frame_index, rects);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> TargetId {
        TargetId {
            scene: 1,
            idx: 0,
            generation: 0,
        }
    }

    fn sample_begin() -> RenderBeginEvent {
        RenderBeginEvent {
            frame_index: 42,
            target: target(),
            age: 2,
        }
    }

    #[test]
    fn noop_sink_compiles() {
        let mut sink = NoopSink;
        sink.on_render_begin(&sample_begin());
        sink.on_phase_begin(&PhaseBeginEvent {
            frame_index: 42,
            target: target(),
            phase: PhaseKind::Damage,
        });
        sink.on_render_summary(&RenderSummary {
            frame_index: 42,
            target: target(),
            stats: RenderStats::default(),
        });
    }

    #[test]
    fn tracer_none_does_nothing() {
        let mut tracer = Tracer::none();
        assert!(!tracer.is_active());
        tracer.render_begin(&sample_begin());
    }

    #[test]
    fn phase_names_are_distinct() {
        for (i, a) in PhaseKind::ALL.iter().enumerate() {
            for b in &PhaseKind::ALL[i + 1..] {
                assert_ne!(a.name(), b.name());
            }
        }
    }

    #[cfg(feature = "trace")]
    #[test]
    fn tracer_dispatches_to_sink() {
        use alloc::vec::Vec;

        struct RecordingSink {
            frames: Vec<u64>,
        }
        impl TraceSink for RecordingSink {
            fn on_render_begin(&mut self, e: &RenderBeginEvent) {
                self.frames.push(e.frame_index);
            }
        }

        let mut sink = RecordingSink { frames: Vec::new() };
        let mut tracer = Tracer::new(&mut sink);
        assert!(tracer.is_active());
        tracer.render_begin(&sample_begin());
        // Access sink after tracer is dropped.
        drop(tracer);
        assert_eq!(sink.frames, &[42]);
    }

    #[cfg(feature = "trace-rich")]
    #[test]
    fn damage_rect_from_irect() {
        let r = DamageRect::from(IRect::new(2, 3, 12, 8));
        assert_eq!((r.x, r.y, r.width, r.height), (2, 3, 10, 5));
    }
}
