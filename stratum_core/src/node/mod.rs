// Copyright 2026 the Stratum Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node tree data model.
//!
//! A *node* is an element of the layout tree that may draw content. Each
//! node has:
//!
//! - An identity ([`NodeId`]) — a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology — parent, first/last child and sibling links forming an ordered
//!   tree. Later siblings are in front of earlier ones.
//! - **Local properties** set by the caller or a
//!   [`LayoutEngine`](crate::layout::LayoutEngine):
//!   [`layout rect`](NodeStore::set_layout_rect),
//!   [`visibility`](NodeStore::set_visible), [`flags`](NodeStore::set_flags),
//!   [`content`](NodeStore::set_content), opaque and invisible hints,
//!   an optional [`background tracker`](NodeStore::set_background_tracker),
//!   and declared [`damage`](NodeStore::add_damage).
//! - **Computed properties** produced by [`evaluate`](NodeStore::evaluate):
//!   `world_rect` (layout rect offset by the parent's world origin) and
//!   `effective_visible` (conjunction of ancestor visibility flags).
//!
//! # Dirty tracking
//!
//! Property mutations automatically mark the corresponding dirty channel
//! (see [`dirty`](crate::dirty)). Evaluation drains the channels into
//! [`NodeChanges`], which a [`Scene`](crate::scene::Scene) fans out to every
//! render target.

mod evaluate;
mod id;
mod store;
mod traverse;

pub use evaluate::NodeChanges;
pub use id::{INVALID, NodeId, SurfaceId};
pub use store::{NodeFlags, NodeStore};
pub use traverse::Children;
