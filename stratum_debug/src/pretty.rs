// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Phase lines
//! carry the time elapsed since the sink was created.

use std::io::Write;
use std::time::Instant;

use stratum_core::trace::{
    DamageRect, NodeDamage, PhaseBeginEvent, PhaseEndEvent, RenderBeginEvent, RenderSummary,
    ResourceFailureEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
    start: Instant,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("start", &self.start)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer,
            start: Instant::now(),
        }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer,
            start: Instant::now(),
        }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn elapsed_us(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1e6
    }
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_render_begin(&mut self, e: &RenderBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[render] frame={} target={} age={}",
            e.frame_index,
            e.target.index(),
            e.age,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let at = self.elapsed_us();
        let _ = writeln!(
            self.writer,
            "[phase:begin] frame={} {} at {at:.1}µs",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let at = self.elapsed_us();
        let _ = writeln!(
            self.writer,
            "[phase:end] frame={} {} at {at:.1}µs",
            e.frame_index,
            e.phase.name(),
        );
    }

    fn on_resource_failure(&mut self, e: &ResourceFailureEvent) {
        let _ = writeln!(
            self.writer,
            "[failure] frame={} node={} {:?}: {}",
            e.frame_index,
            e.failure.node.index(),
            e.failure.kind,
            e.failure.error,
        );
    }

    fn on_render_summary(&mut self, s: &RenderSummary) {
        let st = &s.stats;
        let _ = writeln!(
            self.writer,
            "[summary] frame={} target={} visited={} rendered={} skipped={} \
             bakes={} captures={} draws={} damage={}px{} opaque={}px",
            s.frame_index,
            s.target.index(),
            st.visited,
            st.rendered,
            st.skipped,
            st.bakes,
            st.captures,
            st.draw_calls,
            st.damage_area,
            if st.full_damage { " (full)" } else { "" },
            st.opaque_area,
        );
    }

    fn on_node_damage(&mut self, frame_index: u64, damage: &[NodeDamage]) {
        let _ = writeln!(
            self.writer,
            "[node-damage] frame={frame_index} count={}",
            damage.len(),
        );
        for d in damage {
            let _ = writeln!(
                self.writer,
                "  node={} bounds={:?} area={}",
                d.node_index, d.bounds, d.area,
            );
        }
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        let _ = writeln!(
            self.writer,
            "[damage] frame={frame_index} rects={}",
            rects.len(),
        );
        for r in rects {
            let _ = writeln!(
                self.writer,
                "  ({}, {}) {}x{}",
                r.x, r.y, r.width, r.height,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use stratum_core::trace::Tracer;

    use super::*;
    use crate::test_support::{NullPainter, test_scene};

    #[test]
    fn prints_one_line_per_event() {
        let (mut scene, target, _) = test_scene();
        let mut sink = PrettyPrintSink::with_writer(Vec::new());
        let mut tracer = Tracer::new(&mut sink);
        let _ = scene.render_traced(target, &mut NullPainter, &mut tracer);
        drop(tracer);

        let output = String::from_utf8(sink.into_writer()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("[render] frame=1 target=0 age=0"));
        assert!(lines[1].starts_with("[phase:begin] frame=1 layout at "));
        assert!(lines.iter().any(|l| l.starts_with("[phase:end] frame=1 draw")));
        assert!(lines.iter().any(|l| l.starts_with("[damage] frame=1 rects=1")));
        assert!(lines.iter().any(|l| l.contains("  (0, 0) 32x16")));
        let summary = lines.last().unwrap();
        assert!(summary.starts_with("[summary] frame=1 target=0"));
        assert!(summary.contains("damage=512px (full)"));
    }
}
