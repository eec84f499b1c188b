// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use super::id::{INVALID, NodeId};
use super::store::NodeStore;

/// An iterator over the direct children of a node.
///
/// Created by [`NodeStore::children`].
#[derive(Debug)]
pub struct Children<'a> {
    store: &'a NodeStore,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(store: &'a NodeStore, first: u32) -> Self {
        Self {
            store,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.store.nodes[idx as usize].next_sibling;
        Some(self.store.node_id(idx))
    }
}

/// Collects the buffer indices of `root` and all its descendants, in
/// pre-order.
///
/// Only child and sibling links are followed, so the walk never leaves the
/// subtree even if parent links point elsewhere.
pub(crate) fn subtree(store: &NodeStore, root: u32) -> alloc::vec::Vec<u32> {
    let mut out = alloc::vec::Vec::new();
    let mut stack = alloc::vec![root];
    while let Some(idx) = stack.pop() {
        out.push(idx);
        let mut kids = alloc::vec::Vec::new();
        let mut child = store.nodes[idx as usize].first_child;
        while child != INVALID {
            kids.push(child);
            child = store.nodes[child as usize].next_sibling;
        }
        stack.extend(kids.into_iter().rev());
    }
    out
}
