// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each prefixed with a tag and the
//! nanoseconds elapsed since recording started. [`decode`] reads them back as
//! an iterator of [`Record`].
//!
//! Rich events ([`on_node_damage`](TraceSink::on_node_damage),
//! [`on_damage_rects`](TraceSink::on_damage_rects)) store only the count and
//! total area.

use std::time::Instant;

use stratum_core::scene::{FailureKind, RenderStats};
use stratum_core::trace::{
    DamageRect, NodeDamage, PhaseBeginEvent, PhaseEndEvent, PhaseKind, RenderBeginEvent,
    RenderSummary, ResourceFailureEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_RENDER_BEGIN: u8 = 1;
const TAG_PHASE_BEGIN: u8 = 2;
const TAG_PHASE_END: u8 = 3;
const TAG_RESOURCE_FAILURE: u8 = 4;
const TAG_RENDER_SUMMARY: u8 = 5;
const TAG_NODE_DAMAGE_COUNT: u8 = 6;
const TAG_DAMAGE_RECTS_COUNT: u8 = 7;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug)]
pub struct RecorderSink {
    buf: Vec<u8>,
    start: Instant,
}

impl Default for RecorderSink {
    fn default() -> Self {
        Self::new()
    }
}

impl RecorderSink {
    /// Creates an empty recorder; offsets are measured from now.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buf: Vec::new(),
            start: Instant::now(),
        }
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn begin(&mut self, tag: u8) {
        let nanos = u64::try_from(self.start.elapsed().as_nanos()).unwrap_or(u64::MAX);
        self.write_u8(tag);
        self.write_u64(nanos);
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Layout => 0,
            PhaseKind::Visibility => 1,
            PhaseKind::Damage => 2,
            PhaseKind::Reconcile => 3,
            PhaseKind::Draw => 4,
        });
    }

    fn write_count(&mut self, frame_index: u64, count: usize, area: u64) {
        self.write_u64(frame_index);
        self.write_u32(u32::try_from(count).unwrap_or(u32::MAX));
        self.write_u64(area);
    }
}

impl TraceSink for RecorderSink {
    fn on_render_begin(&mut self, e: &RenderBeginEvent) {
        self.begin(TAG_RENDER_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.index());
        self.write_u8(e.age);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.begin(TAG_PHASE_BEGIN);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.index());
        self.write_phase(e.phase);
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.begin(TAG_PHASE_END);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.index());
        self.write_phase(e.phase);
    }

    fn on_resource_failure(&mut self, e: &ResourceFailureEvent) {
        self.begin(TAG_RESOURCE_FAILURE);
        self.write_u64(e.frame_index);
        self.write_u32(e.target.index());
        self.write_u32(e.failure.node.index());
        self.write_u8(match e.failure.kind {
            FailureKind::Bake => 0,
            FailureKind::Capture => 1,
        });
    }

    fn on_render_summary(&mut self, s: &RenderSummary) {
        self.begin(TAG_RENDER_SUMMARY);
        self.write_u64(s.frame_index);
        self.write_u32(s.target.index());
        let st = &s.stats;
        for v in [
            st.visited,
            st.rendered,
            st.skipped,
            st.pending_clear,
            st.bakes,
            st.captures,
            st.draw_calls,
        ] {
            self.write_u32(v);
        }
        self.write_u64(st.damage_area);
        self.write_u64(st.opaque_area);
        self.write_u8(u8::from(st.full_damage));
    }

    fn on_node_damage(&mut self, frame_index: u64, damage: &[NodeDamage]) {
        self.begin(TAG_NODE_DAMAGE_COUNT);
        let area = damage.iter().map(|d| d.area).sum();
        self.write_count(frame_index, damage.len(), area);
    }

    fn on_damage_rects(&mut self, frame_index: u64, rects: &[DamageRect]) {
        self.begin(TAG_DAMAGE_RECTS_COUNT);
        let area = rects
            .iter()
            .map(|r| u64::from(r.width) * u64::from(r.height))
            .sum();
        self.write_count(frame_index, rects.len(), area);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event. Targets and nodes are identified by slot index.
#[derive(Clone, Debug, PartialEq)]
pub enum RecordedEvent {
    /// A [`RenderBeginEvent`].
    RenderBegin {
        /// Render counter.
        frame_index: u64,
        /// Target slot.
        target: u32,
        /// Buffer age.
        age: u8,
    },
    /// A [`PhaseBeginEvent`].
    PhaseBegin {
        /// Render counter.
        frame_index: u64,
        /// Target slot.
        target: u32,
        /// Phase.
        phase: PhaseKind,
    },
    /// A [`PhaseEndEvent`].
    PhaseEnd {
        /// Render counter.
        frame_index: u64,
        /// Target slot.
        target: u32,
        /// Phase.
        phase: PhaseKind,
    },
    /// A [`ResourceFailureEvent`].
    ResourceFailure {
        /// Render counter.
        frame_index: u64,
        /// Target slot.
        target: u32,
        /// Node slot.
        node: u32,
        /// What failed.
        kind: FailureKind,
    },
    /// A [`RenderSummary`].
    RenderSummary {
        /// Render counter.
        frame_index: u64,
        /// Target slot.
        target: u32,
        /// Counters.
        stats: RenderStats,
    },
    /// Per-node damage count for a render.
    NodeDamageCount {
        /// Render counter.
        frame_index: u64,
        /// Number of damaged nodes.
        count: u32,
        /// Sum of their damaged areas.
        area: u64,
    },
    /// Output damage-rect count for a render.
    DamageRectsCount {
        /// Render counter.
        frame_index: u64,
        /// Number of rects.
        count: u32,
        /// Total area.
        area: u64,
    },
}

/// One decoded record.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Nanoseconds between the start of recording and the event.
    pub offset_nanos: u64,
    /// The event.
    pub event: RecordedEvent,
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`Record`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded records.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let bytes = self.data.get(self.pos..end)?.try_into().ok()?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[b]| b)
    }

    fn read_u32(&mut self) -> Option<u32> {
        self.take().map(u32::from_le_bytes)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take().map(u64::from_le_bytes)
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        PhaseKind::ALL.get(usize::from(self.read_u8()?)).copied()
    }

    fn decode_render_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::RenderBegin {
            frame_index: self.read_u64()?,
            target: self.read_u32()?,
            age: self.read_u8()?,
        })
    }

    fn decode_phase(&mut self, begin: bool) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let target = self.read_u32()?;
        let phase = self.read_phase()?;
        Some(if begin {
            RecordedEvent::PhaseBegin {
                frame_index,
                target,
                phase,
            }
        } else {
            RecordedEvent::PhaseEnd {
                frame_index,
                target,
                phase,
            }
        })
    }

    fn decode_resource_failure(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ResourceFailure {
            frame_index: self.read_u64()?,
            target: self.read_u32()?,
            node: self.read_u32()?,
            kind: match self.read_u8()? {
                0 => FailureKind::Bake,
                _ => FailureKind::Capture,
            },
        })
    }

    fn decode_render_summary(&mut self) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let target = self.read_u32()?;
        let stats = RenderStats {
            visited: self.read_u32()?,
            rendered: self.read_u32()?,
            skipped: self.read_u32()?,
            pending_clear: self.read_u32()?,
            bakes: self.read_u32()?,
            captures: self.read_u32()?,
            draw_calls: self.read_u32()?,
            damage_area: self.read_u64()?,
            opaque_area: self.read_u64()?,
            full_damage: self.read_u8()? != 0,
        };
        Some(RecordedEvent::RenderSummary {
            frame_index,
            target,
            stats,
        })
    }

    fn decode_count(&mut self, nodes: bool) -> Option<RecordedEvent> {
        let frame_index = self.read_u64()?;
        let count = self.read_u32()?;
        let area = self.read_u64()?;
        Some(if nodes {
            RecordedEvent::NodeDamageCount {
                frame_index,
                count,
                area,
            }
        } else {
            RecordedEvent::DamageRectsCount {
                frame_index,
                count,
                area,
            }
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = Record;

    fn next(&mut self) -> Option<Self::Item> {
        let tag = self.read_u8()?;
        let offset_nanos = self.read_u64()?;
        let event = match tag {
            TAG_RENDER_BEGIN => self.decode_render_begin(),
            TAG_PHASE_BEGIN => self.decode_phase(true),
            TAG_PHASE_END => self.decode_phase(false),
            TAG_RESOURCE_FAILURE => self.decode_resource_failure(),
            TAG_RENDER_SUMMARY => self.decode_render_summary(),
            TAG_NODE_DAMAGE_COUNT => self.decode_count(true),
            TAG_DAMAGE_RECTS_COUNT => self.decode_count(false),
            _ => None, // unknown tag → stop iteration
        }?;
        Some(Record {
            offset_nanos,
            event,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
