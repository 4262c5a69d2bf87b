// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channels and the per-target change bitset.
//!
//! The [`NodeStore`](crate::node::NodeStore) uses multi-channel dirty
//! tracking (via [`understory_dirty`]) to collect node mutations between
//! renders. Each channel represents an independent category of change.
//!
//! # Propagation semantics
//!
//! - **Propagating** — [`GEOMETRY`] and [`VISIBILITY`] use
//!   [`EagerPolicy`](understory_dirty::EagerPolicy) and have dependency
//!   edges from child to parent, because world rectangles and effective
//!   visibility are inherited.
//! - **Local-only** — [`CONTENT`], [`HINTS`] and [`DAMAGE`] only mark the
//!   modified node.
//! - **Structural** — [`TOPOLOGY`] is marked on tree mutations and does not
//!   propagate.
//!
//! # Consumption
//!
//! [`NodeStore::evaluate`](crate::node::NodeStore::evaluate) drains every
//! channel into [`NodeChanges`](crate::node::NodeChanges). The scene then
//! folds those lists into a [`Changes`] bitset on every target's
//! per-node state, so each target sees every change exactly once no matter
//! how many renders other targets performed in between.

use understory_dirty::Channel;

/// Layout rectangle changed; world rectangles of descendants are recomputed.
pub const GEOMETRY: Channel = Channel::new(0);

/// Visibility flag changed; effective visibility of descendants is
/// recomputed.
pub const VISIBILITY: Channel = Channel::new(1);

/// Drawn content changed.
pub const CONTENT: Channel = Channel::new(2);

/// Opaque/invisible hints, flags or background tracker changed.
pub const HINTS: Channel = Channel::new(3);

/// The node declared damage on a sub-region of itself.
pub const DAMAGE: Channel = Channel::new(4);

/// Tree topology changed.
pub const TOPOLOGY: Channel = Channel::new(5);

bitflags::bitflags! {
    /// What changed about a node since it was last visited on a target.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct Changes: u8 {
        /// World rectangle recomputed.
        const GEOMETRY = 1 << 0;
        /// Effective visibility toggled.
        const VISIBILITY = 1 << 1;
        /// Content surface replaced.
        const CONTENT = 1 << 2;
        /// Opaque/invisible hints or flags changed.
        const HINTS = 1 << 3;
        /// Self-declared damage is pending.
        const DAMAGE = 1 << 4;
        /// The node was attached to a different parent or reordered.
        const PARENT = 1 << 5;
    }
}

impl Changes {
    /// Changes that invalidate the previous clip as a diff baseline.
    pub const CONSERVATIVE: Self = Self::VISIBILITY.union(Self::PARENT);

    /// Changes that repaint the whole clip even when geometry is stable.
    pub const REPAINT: Self = Self::CONTENT.union(Self::HINTS);
}
