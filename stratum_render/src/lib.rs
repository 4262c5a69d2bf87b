// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Painter-side helpers for stratum.
//!
//! This crate sits between [`stratum_core`]'s render scheduling and
//! backend-specific presentation. It provides:
//!
//! - [`PaintPlan`]: a recording [`Painter`](stratum_core::paint::Painter)
//!   whose [`PaintOp`]s can be inspected or replayed
//! - [`SoftwarePainter`]: a CPU painter for solid-colour surfaces drawing
//!   into a [`tiny_skia::Pixmap`]
//! - [`DamageRegion`]: a render's damage in buffer pixels, for
//!   swap-with-damage style presentation

#![no_std]
#![cfg_attr(docsrs, feature(doc_cfg))]

extern crate alloc;

mod damage;
mod plan;
mod software;

pub use damage::DamageRegion;
pub use plan::{PaintOp, PaintPlan};
pub use software::SoftwarePainter;
pub use tiny_skia;
