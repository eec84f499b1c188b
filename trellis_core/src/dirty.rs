// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Scheduling is recorded with [`understory_dirty`]: whenever an update is
//! enqueued for a position, the position's slot index is marked on the
//! [`UPDATE`] channel of the root's tracker. A flush drains the channel and
//! runs one render pass if any marked position is still alive. Each root owns
//! its store, so a live position is always part of that root's tree and no
//! walk up to the root is needed.
//!
//! Positions released by a deletion are removed from the tracker, so a
//! setter that outlives its component cannot keep a stale mark alive.

use understory_dirty::Channel;

/// An update was enqueued on the position (root render or state cell).
pub const UPDATE: Channel = Channel::new(0);
