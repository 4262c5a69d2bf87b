// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Buffer-age damage history.
//!
//! Swapchains hand back buffers whose contents are `age` frames old. To
//! repaint such a buffer correctly, the renderer must redraw the union of the
//! damage of the last `age` frames (including the current one). The
//! [`DamageRing`] keeps that history in a fixed array indexed modulo
//! [`DAMAGE_RING_CAPACITY`].

use crate::region::Region;

/// Number of frames of damage history kept per target.
///
/// Buffer ages above this value cannot be reconstructed and are rejected.
pub const DAMAGE_RING_CAPACITY: usize = 4;

/// Circular history of per-frame damage.
///
/// Per render the caller [`record`](Self::record)s the current frame's
/// damage, queries [`accumulate`](Self::accumulate), then
/// [`advance`](Self::advance)s.
#[derive(Clone, Debug, Default)]
pub struct DamageRing {
    slots: [Region; DAMAGE_RING_CAPACITY],
    index: usize,
    valid: usize,
}

impl DamageRing {
    /// Creates an empty ring with no valid history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all history.
    pub fn reset(&mut self) {
        for slot in &mut self.slots {
            slot.clear();
        }
        self.valid = 0;
    }

    /// Stores the damage of the current frame in the current slot.
    pub fn record(&mut self, damage: &Region) {
        self.slots[self.index].clone_from(damage);
        self.valid = (self.valid + 1).min(DAMAGE_RING_CAPACITY);
    }

    /// Returns the union of the last `age` recorded frames, newest first.
    ///
    /// Returns `None` when `age` is zero or exceeds the recorded history, in
    /// which case the buffer contents are unknown and must be fully redrawn.
    #[must_use]
    pub fn accumulate(&self, age: u8) -> Option<Region> {
        let age = usize::from(age);
        if age == 0 || age > self.valid {
            return None;
        }
        let mut out = Region::new();
        for back in 0..age {
            let slot = (self.index + DAMAGE_RING_CAPACITY - back) % DAMAGE_RING_CAPACITY;
            out.union_with(&self.slots[slot]);
        }
        Some(out)
    }

    /// Moves to the next slot.
    pub fn advance(&mut self) {
        self.index = (self.index + 1) % DAMAGE_RING_CAPACITY;
    }

    /// Number of frames of valid history.
    #[must_use]
    pub fn valid_frames(&self) -> usize {
        self.valid
    }
}
