// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//! Each target becomes its own process row.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are the recording offsets in microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    // Rich events carry no target; attribute them to the last one begun.
    let mut current_target = 0;

    for record in decode(bytes) {
        let ts = nanos_to_us(record.offset_nanos);
        match record.event {
            RecordedEvent::RenderBegin {
                frame_index,
                target,
                age,
            } => {
                current_target = target;
                events.push(json!({
                    "ph": "i",
                    "name": "RenderBegin",
                    "cat": "Render",
                    "ts": ts,
                    "pid": target,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "age": age,
                    }
                }));
            }
            RecordedEvent::PhaseBegin {
                frame_index,
                target,
                phase,
            } => {
                events.push(json!({
                    "ph": "B",
                    "name": phase.name(),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": target,
                    "tid": 0,
                    "args": {
                        "frame_index": frame_index,
                    }
                }));
            }
            RecordedEvent::PhaseEnd {
                frame_index,
                target,
                phase,
            } => {
                events.push(json!({
                    "ph": "E",
                    "name": phase.name(),
                    "cat": "Phase",
                    "ts": ts,
                    "pid": target,
                    "tid": 0,
                    "args": {
                        "frame_index": frame_index,
                    }
                }));
            }
            RecordedEvent::ResourceFailure {
                frame_index,
                target,
                node,
                kind,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "ResourceFailure",
                    "cat": "Render",
                    "ts": ts,
                    "pid": target,
                    "tid": 0,
                    "s": "t",
                    "args": {
                        "frame_index": frame_index,
                        "node": node,
                        "kind": format!("{kind:?}"),
                    }
                }));
            }
            RecordedEvent::RenderSummary {
                frame_index,
                target,
                stats,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "RenderSummary",
                    "cat": "Summary",
                    "ts": ts,
                    "pid": target,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "visited": stats.visited,
                        "rendered": stats.rendered,
                        "skipped": stats.skipped,
                        "pending_clear": stats.pending_clear,
                        "bakes": stats.bakes,
                        "captures": stats.captures,
                        "draw_calls": stats.draw_calls,
                        "damage_area": stats.damage_area,
                        "opaque_area": stats.opaque_area,
                        "full_damage": stats.full_damage,
                    }
                }));
                events.push(json!({
                    "ph": "C",
                    "name": "damage_area",
                    "ts": ts,
                    "pid": target,
                    "args": {
                        "damage": stats.damage_area,
                        "opaque": stats.opaque_area,
                    }
                }));
            }
            RecordedEvent::NodeDamageCount {
                frame_index,
                count,
                area,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "NodeDamage",
                    "cat": "Rich",
                    "ts": ts,
                    "pid": current_target,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                        "area": area,
                    }
                }));
            }
            RecordedEvent::DamageRectsCount {
                frame_index,
                count,
                area,
            } => {
                events.push(json!({
                    "ph": "i",
                    "name": "DamageRects",
                    "cat": "Rich",
                    "ts": ts,
                    "pid": current_target,
                    "tid": 0,
                    "s": "p",
                    "args": {
                        "frame_index": frame_index,
                        "count": count,
                        "area": area,
                    }
                }));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn nanos_to_us(nanos: u64) -> f64 {
    nanos as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use stratum_core::trace::Tracer;

    use super::*;
    use crate::recorder::RecorderSink;
    use crate::test_support::{NullPainter, test_scene};

    #[test]
    fn export_produces_valid_json() {
        let (mut scene, target, _) = test_scene();
        let mut rec = RecorderSink::new();
        let mut tracer = Tracer::new(&mut rec);
        let _ = scene.render_traced(target, &mut NullPainter, &mut tracer);
        drop(tracer);

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        // Should parse as a JSON array.
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();

        // First event is the instant RenderBegin.
        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "RenderBegin");

        // Then the layout phase opens and closes.
        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "layout");
        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["name"], "layout");

        let begins = parsed.iter().filter(|e| e["ph"] == "B").count();
        let ends = parsed.iter().filter(|e| e["ph"] == "E").count();
        assert_eq!(begins, 5);
        assert_eq!(ends, 5);

        let summary = parsed
            .iter()
            .find(|e| e["name"] == "RenderSummary")
            .unwrap();
        assert_eq!(summary["args"]["damage_area"], 512);
        assert_eq!(summary["args"]["full_damage"], true);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
