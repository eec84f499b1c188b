// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental tree reconciliation with double-buffered work nodes.
//!
//! `trellis_core` turns a sequence of declarative tree descriptions
//! ([`Markup`](element::Markup)) into the minimal set of mutations on a
//! retained host tree (a DOM, or anything implementing
//! [`HostAdapter`](host::HostAdapter)). It is `no_std` compatible (with
//! `alloc`) and keeps its tree in an index-based arena.
//!
//! # Architecture
//!
//! One synchronous pass runs per trigger:
//!
//! ```text
//!   Root::render / StateSetter::set
//!       │  enqueue Update, mark position
//!       ▼
//!   UpdateScheduler ──► Root::flush()
//!                           │  clone current root
//!                           ▼
//!   begin ──► ChildReconciler ──► complete   (work-in-progress tree)
//!                           │  effect flags bubbled to the root
//!                           ▼
//!   commit ──► HostAdapter calls ──► swap current / work-in-progress
//! ```
//!
//! **[`element`]**: Declarative descriptions: [`Element`](element::Element)
//! builders, keys, props, and function [`Component`](element::Component)s.
//!
//! **[`node`]**: The [`NodeStore`](node::NodeStore) arena. Each tree
//! position owns at most two buffers (current and work in progress) that
//! swap roles on every commit.
//!
//! **[`update`]**: Single-slot update queues and their reducer.
//!
//! **[`state`]**: Component state cells read through an explicit
//! [`RenderContext`](state::RenderContext), and the
//! [`UpdateScheduler`](state::UpdateScheduler) their setters report to.
//!
//! **[`root`]**: The [`Root`](root::Root) handle: render, flush, and the
//! attached-props side table used by event layers.
//!
//! **[`host`]**: The [`HostAdapter`](host::HostAdapter) trait that platform
//! backends implement.
//!
//! **[`dirty`]**: Scheduling channel for `understory_dirty`.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! pass instrumentation, with zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Example
//!
//! ```rust
//! use trellis_core::element::{Element, Markup};
//! use trellis_core::host::{HostAdapter, HostRef};
//! use trellis_core::element::Props;
//! use trellis_core::root::Root;
//!
//! #[derive(Default)]
//! struct Counter {
//!     next: u32,
//!     inserts: u32,
//! }
//!
//! impl HostAdapter for Counter {
//!     fn create_element_instance(&mut self, _: &str, _: &Props) -> HostRef {
//!         self.next += 1;
//!         HostRef(self.next)
//!     }
//!     fn create_text_instance(&mut self, _: &str) -> HostRef {
//!         self.next += 1;
//!         HostRef(self.next)
//!     }
//!     fn append_child_initial(&mut self, _: HostRef, _: HostRef) {}
//!     fn append_child(&mut self, _: HostRef, _: HostRef) {
//!         self.inserts += 1;
//!     }
//!     fn insert_before(&mut self, _: HostRef, _: HostRef, _: HostRef) {
//!         self.inserts += 1;
//!     }
//!     fn remove_child(&mut self, _: HostRef, _: HostRef) {}
//!     fn apply_text_update(&mut self, _: HostRef, _: &str) {}
//!     fn apply_props_update(&mut self, _: HostRef, _: &Props, _: &Props) {}
//! }
//!
//! let mut host = Counter::default();
//! let mut root = Root::new(HostRef(0));
//! let list = |items: &[&str]| -> Markup {
//!     Element::host("ul")
//!         .children(
//!             items
//!                 .iter()
//!                 .map(|&k| Element::host("li").key(k).child(k).into())
//!                 .collect::<Vec<Markup>>(),
//!         )
//!         .into()
//! };
//!
//! root.render(list(&["a", "b"]), &mut host).unwrap();
//! assert_eq!(host.inserts, 1, "the whole list is inserted at once");
//!
//! let summary = root.render(list(&["b", "a"]), &mut host).unwrap();
//! assert_eq!(summary.placements, 1, "one item moves");
//! ```
//!
//! # Crate features
//!
//! - `std` (disabled by default): Enables `std` support in dependencies.
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).
//! - `trace-rich` (disabled by default, implies `trace`): Gates per-node
//!   effect records.

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod dirty;
pub mod element;
pub mod error;
pub mod host;
pub mod node;
pub mod root;
pub mod state;
pub mod trace;
pub mod update;

mod commit;
mod reconcile;
mod work;
