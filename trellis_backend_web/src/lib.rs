// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Web backend for trellis.
//!
//! This crate provides integration with browser APIs:
//!
//! - [`DomHost`]: a [`HostAdapter`] that creates and mutates DOM nodes
//!
//! Event layers find the element a DOM event landed on with
//! [`DomHost::host_ref_of`], then read its handlers through
//! [`Root::read_attached_props`](trellis_core::root::Root::read_attached_props).

#![no_std]

extern crate alloc;

mod dom;

pub use dom::{DomHost, attribute_value};
pub use trellis_core::host::{HostAdapter, HostRef};
