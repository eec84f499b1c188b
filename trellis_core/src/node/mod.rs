// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Retained tree data model.
//!
//! A *work node* is one buffer of one tree position. Each position owns up to
//! two buffers:
//!
//! - the **current** buffer, describing what was last committed to the host;
//! - the **work-in-progress** buffer, rebuilt by a render pass from the
//!   current one.
//!
//! Buffers are linked by parent, first-child and next-sibling indices into
//! the [`NodeStore`] arena; [`INVALID`] marks a missing link. Pairing goes
//! through the position slot rather than a pointer between buffers, so no
//! node ever references another one by ownership.
//!
//! # Effects
//!
//! Render passes record pending host mutations as [`EffectFlags`] on the
//! work-in-progress buffers and fold them upward into `subtree_flags` as they
//! complete. The commit reads these bits to visit only the changed parts of
//! the tree.

mod flags;
mod id;
mod store;
pub(crate) mod traverse;

pub use flags::{EffectFlags, NodeKind};
pub use id::{INVALID, NodeId, PositionId};
pub(crate) use store::{NodeState, Payload, WorkNode};
pub use store::NodeStore;
pub use traverse::Children;
