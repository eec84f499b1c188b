// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host adapter contract.
//!
//! The reconciler never touches a native tree directly. Platform crates (a
//! DOM backend, an in-memory test host) implement [`HostAdapter`] and hand
//! out opaque [`HostRef`] handles for the instances they create. The core
//! stores those handles on work nodes and passes them back when it needs to
//! attach, move, patch, or remove an instance.
//!
//! # Call order
//!
//! During a render pass only the creation calls and
//! [`append_child_initial`](HostAdapter::append_child_initial) are made, and
//! only on instances that are not yet attached to the container (off-host
//! construction). All calls that touch the visible tree happen during
//! commit, once per flagged change:
//!
//! ```text
//!   render pass                         commit
//!   ───────────                         ──────
//!   create_element_instance             append_child / insert_before
//!   create_text_instance                apply_text_update / apply_props_update
//!   append_child_initial                remove_child
//! ```

use core::fmt;

use crate::element::Props;

/// An opaque reference to an instance owned by a [`HostAdapter`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HostRef(pub u32);

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostRef({})", self.0)
    }
}

/// Creates and mutates native instances on behalf of the reconciler.
pub trait HostAdapter {
    /// Creates a detached element instance for the tag `ty`.
    fn create_element_instance(&mut self, ty: &str, props: &Props) -> HostRef;

    /// Creates a detached text instance.
    fn create_text_instance(&mut self, text: &str) -> HostRef;

    /// Appends `child` to a parent that is still being built off-host.
    fn append_child_initial(&mut self, parent: HostRef, child: HostRef);

    /// Appends `child` as the last child of `container`, moving it if it is
    /// already attached.
    fn append_child(&mut self, container: HostRef, child: HostRef);

    /// Inserts `child` into `container` before `before`, moving it if it is
    /// already attached.
    fn insert_before(&mut self, child: HostRef, container: HostRef, before: HostRef);

    /// Removes `child` (and with it the child's whole host subtree) from
    /// `container`.
    fn remove_child(&mut self, child: HostRef, container: HostRef);

    /// Replaces the content of a text instance.
    fn apply_text_update(&mut self, instance: HostRef, text: &str);

    /// Patches an element instance from `prev` to `next` attributes.
    fn apply_props_update(&mut self, instance: HostRef, prev: &Props, next: &Props);
}
