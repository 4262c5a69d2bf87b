// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

/// An iterator over the direct children of a node in z order
/// (back to front).
///
/// Reversing it yields front to back. Created by [`NodeStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a NodeStore,
    front: u32,
    back: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a NodeStore, first: u32, last: u32) -> Self {
        Self {
            store,
            front: first,
            back: last,
        }
    }

    fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.store.generation[idx as usize],
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.front == INVALID {
            return None;
        }
        let idx = self.front;
        if idx == self.back {
            self.front = INVALID;
            self.back = INVALID;
        } else {
            self.front = self.store.next_sibling[idx as usize];
        }
        Some(self.handle(idx))
    }
}

impl DoubleEndedIterator for Children<'_> {
    fn next_back(&mut self) -> Option<NodeId> {
        if self.back == INVALID {
            return None;
        }
        let idx = self.back;
        if idx == self.front {
            self.front = INVALID;
            self.back = INVALID;
        } else {
            self.back = self.store.prev_sibling[idx as usize];
        }
        Some(self.handle(idx))
    }
}
