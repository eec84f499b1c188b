// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Commit of a finished work-in-progress tree.
//!
//! The commit walks the finished tree once, descending only into subtrees
//! whose `subtree_flags` carry a mutation, and applies each node's effects
//! after its children (post-order). Every flag is cleared right after the
//! host call it stands for, so each change reaches the host exactly once.
//!
//! Deleted subtrees are detached from the host and unlinked immediately, but
//! their positions are released only after the walk: the walk may still read
//! buffers of the previous tree.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::Props;
use crate::host::{HostAdapter, HostRef};
use crate::node::{EffectFlags, INVALID, NodeKind, NodeStore, traverse};
use crate::state::UpdateScheduler;
#[cfg(feature = "trace-rich")]
use crate::trace::EffectRecord;
use crate::trace::{CommitSummary, EffectKind, Tracer};

/// Applies the effects recorded in the tree rooted at `root`.
pub(crate) struct Commit<'a, H: ?Sized> {
    pub(crate) store: &'a mut NodeStore,
    pub(crate) host: &'a mut H,
    pub(crate) attached: &'a mut BTreeMap<HostRef, Rc<Props>>,
    pub(crate) scheduler: &'a UpdateScheduler,
    summary: CommitSummary,
    released: Vec<u32>,
    #[cfg(feature = "trace-rich")]
    effects: Vec<EffectRecord>,
}

impl<'a, H: HostAdapter + ?Sized> Commit<'a, H> {
    pub(crate) fn new(
        store: &'a mut NodeStore,
        host: &'a mut H,
        attached: &'a mut BTreeMap<HostRef, Rc<Props>>,
        scheduler: &'a UpdateScheduler,
        pass_index: u64,
    ) -> Self {
        Self {
            store,
            host,
            attached,
            scheduler,
            summary: CommitSummary {
                pass_index,
                ..CommitSummary::default()
            },
            released: Vec::new(),
            #[cfg(feature = "trace-rich")]
            effects: Vec::new(),
        }
    }

    /// Runs the commit and returns what it did.
    pub(crate) fn run(mut self, root: u32, tracer: &mut Tracer<'_>) -> CommitSummary {
        let node = &self.store.nodes[root as usize];
        if (node.flags | node.subtree_flags).intersects(EffectFlags::MUTATION_MASK) {
            self.commit_mutation_effects(root);
        }

        for pos in core::mem::take(&mut self.released) {
            self.scheduler.forget(pos);
            self.store.release_position(pos);
            self.summary.released += 1;
        }

        #[cfg(feature = "trace-rich")]
        tracer.effects(self.summary.pass_index, &self.effects);
        #[cfg(not(feature = "trace-rich"))]
        {
            _ = tracer;
        }
        self.summary
    }

    fn commit_mutation_effects(&mut self, root: u32) {
        let mut next = root;
        while next != INVALID {
            let node = &self.store.nodes[next as usize];
            let child = node.first_child;
            if child != INVALID && node.subtree_flags.intersects(EffectFlags::MUTATION_MASK) {
                next = child;
                continue;
            }

            let mut done = next;
            next = loop {
                self.commit_effects_on(done);
                if done == root {
                    break INVALID;
                }
                let sibling = self.store.nodes[done as usize].next_sibling;
                if sibling != INVALID {
                    break sibling;
                }
                done = self.store.nodes[done as usize].parent;
                if done == INVALID {
                    break INVALID;
                }
            };
        }
    }

    fn commit_effects_on(&mut self, idx: u32) {
        self.summary.visited += 1;
        let flags = self.store.nodes[idx as usize].flags;

        if flags.contains(EffectFlags::PLACEMENT) {
            self.commit_placement(idx);
            self.store.nodes[idx as usize]
                .flags
                .remove(EffectFlags::PLACEMENT);
            self.summary.placements += 1;
            self.record(idx, EffectKind::Placement);
        }
        if flags.contains(EffectFlags::UPDATE) {
            self.commit_update(idx);
            self.store.nodes[idx as usize].flags.remove(EffectFlags::UPDATE);
            self.summary.updates += 1;
            self.record(idx, EffectKind::Update);
        }
        if flags.contains(EffectFlags::CHILD_DELETION) {
            let deletions = core::mem::take(&mut self.store.nodes[idx as usize].deletions);
            for deleted in deletions {
                self.record(deleted, EffectKind::Deletion);
                self.commit_deletion(idx, deleted);
                self.summary.deletions += 1;
            }
            self.store.nodes[idx as usize]
                .flags
                .remove(EffectFlags::CHILD_DELETION);
        }
        self.store.nodes[idx as usize].subtree_flags = EffectFlags::NONE;
    }

    fn commit_placement(&mut self, idx: u32) {
        let parent = self.store.nodes[idx as usize].parent;
        let Some(host_parent) = self.nearest_host_parent(parent) else {
            tracing::error!(node = idx, "no host parent for placement; skipping");
            return;
        };
        let before = self.host_sibling(idx);
        self.insert_or_append(idx, host_parent, before);
    }

    /// Returns the host instance of `from` or its nearest element/root
    /// ancestor.
    fn nearest_host_parent(&self, from: u32) -> Option<HostRef> {
        let mut node = from;
        while node != INVALID {
            let n = &self.store.nodes[node as usize];
            if n.kind.is_host_parent() {
                return n.host;
            }
            node = n.parent;
        }
        None
    }

    /// Finds the host instance that a placed node must be inserted before.
    ///
    /// The anchor is the first host node after `idx` in document order that
    /// shares its host parent and is not itself being placed. Components are
    /// looked through; an element boundary ends the search.
    fn host_sibling(&self, idx: u32) -> Option<HostRef> {
        let nodes = &self.store.nodes;
        let mut node = idx;
        'siblings: loop {
            while nodes[node as usize].next_sibling == INVALID {
                let parent = nodes[node as usize].parent;
                if parent == INVALID || nodes[parent as usize].kind.is_host_parent() {
                    return None;
                }
                node = parent;
            }
            node = nodes[node as usize].next_sibling;

            while !nodes[node as usize].kind.is_host() {
                if nodes[node as usize].flags.contains(EffectFlags::PLACEMENT) {
                    continue 'siblings;
                }
                let child = nodes[node as usize].first_child;
                if child == INVALID {
                    continue 'siblings;
                }
                node = child;
            }

            if !nodes[node as usize].flags.contains(EffectFlags::PLACEMENT) {
                return nodes[node as usize].host;
            }
        }
    }

    fn insert_or_append(&mut self, idx: u32, parent: HostRef, before: Option<HostRef>) {
        let node = &self.store.nodes[idx as usize];
        if node.kind.is_host() {
            if let Some(instance) = node.host {
                match before {
                    Some(before) => self.host.insert_before(instance, parent, before),
                    None => self.host.append_child(parent, instance),
                }
            }
            return;
        }
        let mut child = node.first_child;
        while child != INVALID {
            self.insert_or_append(child, parent, before);
            child = self.store.nodes[child as usize].next_sibling;
        }
    }

    fn commit_update(&mut self, idx: u32) {
        let node = &self.store.nodes[idx as usize];
        let Some(instance) = node.host else {
            return;
        };
        match node.kind {
            NodeKind::HostText => {
                if let Some(text) = node.committed.text() {
                    self.host.apply_text_update(instance, text);
                }
            }
            NodeKind::HostElement => {
                let Some(next) = node.committed.props().cloned() else {
                    return;
                };
                let current = self.store.alternate_of(idx);
                let prev = (current != INVALID)
                    .then(|| self.store.nodes[current as usize].committed.props().cloned())
                    .flatten()
                    .unwrap_or_default();
                self.host.apply_props_update(instance, &prev, &next);
                self.attached.insert(instance, next);
            }
            NodeKind::Root | NodeKind::Component => {}
        }
    }

    /// Detaches the subtree of `deleted` (a previous child of `parent`) from
    /// the host and schedules its positions for release.
    fn commit_deletion(&mut self, parent: u32, deleted: u32) {
        let host_parent = self.nearest_host_parent(parent);

        let mut top_level = Vec::new();
        let mut stack = alloc::vec![deleted];
        while let Some(node) = stack.pop() {
            let n = &self.store.nodes[node as usize];
            if n.kind.is_host() {
                if let Some(instance) = n.host {
                    top_level.push(instance);
                }
                continue;
            }
            let mut child = n.first_child;
            let mut kids = Vec::new();
            while child != INVALID {
                kids.push(child);
                child = self.store.nodes[child as usize].next_sibling;
            }
            stack.extend(kids.into_iter().rev());
        }

        match host_parent {
            Some(container) => {
                for instance in top_level {
                    self.host.remove_child(instance, container);
                }
            }
            None if !top_level.is_empty() => {
                tracing::error!(node = deleted, "no host parent for deletion; skipping removal");
            }
            None => {}
        }

        for node in traverse::subtree(self.store, deleted) {
            let n = &mut self.store.nodes[node as usize];
            if let Some(instance) = n.host.take() {
                self.attached.remove(&instance);
            }
            n.parent = INVALID;
            n.first_child = INVALID;
            n.next_sibling = INVALID;
            self.released.push(n.position);
        }
    }

    #[cfg(feature = "trace-rich")]
    fn record(&mut self, idx: u32, effect: EffectKind) {
        let node = &self.store.nodes[idx as usize];
        self.effects.push(EffectRecord {
            position: node.position,
            node_kind: node.kind,
            effect,
        });
    }

    #[cfg(not(feature = "trace-rich"))]
    #[inline]
    fn record(&mut self, idx: u32, effect: EffectKind) {
        _ = (idx, effect);
    }
}
