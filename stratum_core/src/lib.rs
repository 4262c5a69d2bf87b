// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Damage-tracking render scheduling for retained-mode node trees.
//!
//! `stratum_core` decides, for every render of a scene into a target, which
//! pixels must be repainted, which nodes contribute to them, and in what
//! order they are drawn. It is `no_std` compatible (with `alloc`) and keeps
//! the node tree in struct-of-arrays storage with generational handles.
//!
//! # Architecture
//!
//! A render runs as a fixed sequence of passes over one target:
//!
//! ```text
//!   LayoutEngine (optional) ──► NodeStore::evaluate() ──► NodeChanges
//!                                                             │
//!                 ┌───────────────────────────────────────────┘
//!                 ▼
//!   fan-out into every Target's per-node state
//!                 │
//!                 ▼
//!   visibility ──► damage (front to back) ──► reconcile ──► draw ──► RenderOutput
//!                                                  │
//!                                             DamageRing
//! ```
//!
//! **[`node`]**: Struct-of-arrays node tree with generational handles.
//! Geometry, visibility, content and region hints are set by the caller;
//! world rectangles and effective visibility are computed by evaluation.
//!
//! **[`dirty`]**: Multi-channel dirty tracking via `understory_dirty`.
//! GEOMETRY and VISIBILITY propagate to descendants; CONTENT, HINTS and
//! DAMAGE are local; TOPOLOGY triggers a traversal rebuild.
//!
//! **[`region`]**: Integer rectangles and banded pixel regions.
//!
//! **[`target`]**: Render targets with viewport, scale, output transform
//! and buffer-age history ([`ring`]).
//!
//! **[`state`]**: Per-node, per-target state carried between renders.
//!
//! **[`tracker`]**: Background trackers for effects that sample what is
//! behind them.
//!
//! **[`scene`]**: The [`Scene`](scene::Scene) that owns the tree and its
//! targets and runs renders.
//!
//! **[`paint`]**: The [`Painter`](paint::Painter) trait that renderers
//! implement to receive the ordered draw pass.
//!
//! **[`layout`]**: Pluggable layout engines that write node rectangles.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! render instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   damage and damage-rect events.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod layout;
pub mod node;
pub mod paint;
pub mod region;
pub mod ring;
pub mod scene;
pub mod state;
pub mod target;
pub mod trace;
pub mod tracker;
