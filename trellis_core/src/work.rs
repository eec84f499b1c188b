// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Begin/complete traversal of a render pass.
//!
//! The pass walks the work-in-progress tree depth first without a stack,
//! using the parent and sibling links the reconciler maintains:
//!
//! ```text
//!   begin(node) ──► first child? ──yes──► begin(child) ...
//!                        │no
//!                        ▼
//!   complete(node) ──► sibling? ──yes──► begin(sibling) ...
//!                        │no
//!                        ▼
//!                  complete(parent) ... up to the root
//! ```
//!
//! *Begin* computes a node's new children: the root folds its pending update
//! into its declarative children, elements take theirs from props, and
//! components render through a [`RenderContext`]. *Complete* builds host
//! instances for newly mounted nodes (attaching their host descendants off
//! the visible tree), flags changed ones for update, and folds effects into
//! the parent's subtree flags.

use alloc::rc::Rc;
use alloc::vec::Vec;

use crate::element::{ElementType, Markup, Props};
use crate::error::RenderError;
use crate::host::{HostAdapter, HostRef};
use crate::node::{EffectFlags, INVALID, NodeKind, NodeState, NodeStore};
use crate::reconcile::ChildReconciler;
use crate::state::{Drained, RenderContext, UpdateScheduler};
use crate::update::process;

/// Mutable state of one render pass.
#[derive(Debug)]
pub(crate) struct Pass<'a> {
    pub(crate) store: &'a mut NodeStore,
    pub(crate) scheduler: &'a UpdateScheduler,
    /// Updates taken out of queues, restored if the pass aborts.
    pub(crate) drained: Vec<Drained>,
    /// Props of element instances created by this pass, published to the
    /// attached-props table on commit.
    pub(crate) staged_props: Vec<(HostRef, Rc<Props>)>,
    /// Nodes visited by the begin phase.
    pub(crate) visited: u32,
}

impl<'a> Pass<'a> {
    pub(crate) fn new(store: &'a mut NodeStore, scheduler: &'a UpdateScheduler) -> Self {
        Self {
            store,
            scheduler,
            drained: Vec::new(),
            staged_props: Vec::new(),
            visited: 0,
        }
    }

    /// Renders the tree below `root` to completion.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by a component; the work-in-progress
    /// tree is then incomplete and must be discarded.
    pub(crate) fn run<H: HostAdapter + ?Sized>(
        &mut self,
        host: &mut H,
        root: u32,
    ) -> Result<(), RenderError> {
        let mut next = root;
        while next != INVALID {
            self.visited += 1;
            let child = self.begin_work(next)?;
            if child != INVALID {
                next = child;
                continue;
            }

            let mut node = next;
            next = loop {
                self.complete_work(host, node);
                if node == root {
                    break INVALID;
                }
                let sibling = self.store.nodes[node as usize].next_sibling;
                if sibling != INVALID {
                    break sibling;
                }
                node = self.store.nodes[node as usize].parent;
                if node == INVALID {
                    break INVALID;
                }
            };
        }
        Ok(())
    }

    /// Computes the children of `wip` and returns the first one.
    fn begin_work(&mut self, wip: u32) -> Result<u32, RenderError> {
        let current = self.store.alternate_of(wip);
        let first = match self.store.nodes[wip as usize].kind {
            NodeKind::Root => self.update_root(wip, current),
            NodeKind::HostElement => {
                let props = self.store.nodes[wip as usize].pending.props().cloned();
                match props {
                    Some(props) => self.reconcile(wip, current, props.children()),
                    None => INVALID,
                }
            }
            NodeKind::HostText => INVALID,
            NodeKind::Component => self.update_component(wip, current)?,
        };
        let node = &mut self.store.nodes[wip as usize];
        node.committed = node.pending.clone();
        Ok(first)
    }

    fn update_root(&mut self, wip: u32, current: u32) -> u32 {
        let node = &self.store.nodes[wip as usize];
        let base = match &node.state {
            NodeState::Children(children) => children.clone(),
            _ => Markup::Empty,
        };
        let Some(queue) = node.queue.clone() else {
            return self.reconcile(wip, current, &base);
        };

        let pending = queue.borrow_mut().take();
        let children = process(&base, pending.as_ref());
        if let Some(update) = pending {
            self.drained.push(Drained::Root(queue, update));
        }
        self.store.nodes[wip as usize].state = NodeState::Children(children.clone());
        self.reconcile(wip, current, &children)
    }

    fn update_component(&mut self, wip: u32, current: u32) -> Result<u32, RenderError> {
        let node = &mut self.store.nodes[wip as usize];
        let (component, props) = match (&node.ty, node.pending.props()) {
            (Some(ElementType::Component(component)), Some(props)) => {
                (*component, Rc::clone(props))
            }
            _ => return Ok(INVALID),
        };
        let mut cells = match core::mem::take(&mut node.state) {
            NodeState::Cells(cells) => cells,
            _ => Vec::new(),
        };
        let pos = node.position;
        let position = self.store.position_id(pos);

        let mut cx = RenderContext::new(
            component.name(),
            position,
            &mut cells,
            current == INVALID,
            self.scheduler,
            &mut self.drained,
        );
        let rendered = component
            .render(&props, &mut cx)
            .and_then(|children| cx.finish().map(|()| children));
        self.store.nodes[wip as usize].state = NodeState::Cells(cells);

        let children = rendered?;
        Ok(self.reconcile(wip, current, &children))
    }

    fn reconcile(&mut self, wip: u32, current: u32, children: &Markup) -> u32 {
        let first = if current == INVALID {
            ChildReconciler::MOUNT.reconcile_children(self.store, wip, INVALID, children)
        } else {
            let current_first = self.store.nodes[current as usize].first_child;
            ChildReconciler::TRACK.reconcile_children(self.store, wip, current_first, children)
        };
        self.store.nodes[wip as usize].first_child = first;
        first
    }

    /// Builds or diffs the host side of `wip` and bubbles its effects.
    fn complete_work<H: HostAdapter + ?Sized>(&mut self, host: &mut H, wip: u32) {
        let current = self.store.alternate_of(wip);
        let node = &self.store.nodes[wip as usize];
        let existing = if current != INVALID { node.host } else { None };

        match node.kind {
            NodeKind::HostElement => {
                let Some(props) = node.pending.props().cloned() else {
                    self.store.bubble_effects(wip);
                    return;
                };
                if existing.is_some() {
                    let changed = self.store.nodes[current as usize]
                        .committed
                        .props()
                        .is_none_or(|old| !old.attrs_eq(&props));
                    if changed {
                        self.store.nodes[wip as usize].flags |= EffectFlags::UPDATE;
                    }
                } else {
                    let tag = match &node.ty {
                        Some(ElementType::Host(tag)) => Rc::clone(tag),
                        _ => Rc::from(""),
                    };
                    let instance = host.create_element_instance(&tag, &props);
                    append_all_children(self.store, host, instance, wip);
                    self.store.nodes[wip as usize].host = Some(instance);
                    self.staged_props.push((instance, props));
                }
            }
            NodeKind::HostText => {
                let Some(text) = node.pending.text().cloned() else {
                    self.store.bubble_effects(wip);
                    return;
                };
                if existing.is_some() {
                    let changed = self.store.nodes[current as usize]
                        .committed
                        .text()
                        .is_none_or(|old| *old != text);
                    if changed {
                        self.store.nodes[wip as usize].flags |= EffectFlags::UPDATE;
                    }
                } else {
                    let instance = host.create_text_instance(&text);
                    self.store.nodes[wip as usize].host = Some(instance);
                }
            }
            NodeKind::Root | NodeKind::Component => {}
        }
        self.store.bubble_effects(wip);
    }
}

/// Attaches the top-level host descendants of `wip` to `parent`, off the
/// visible tree.
///
/// Host nodes are attached without descending into them; components are
/// looked through.
fn append_all_children<H: HostAdapter + ?Sized>(
    store: &NodeStore,
    host: &mut H,
    parent: HostRef,
    wip: u32,
) {
    let mut node = store.nodes[wip as usize].first_child;
    while node != INVALID {
        let n = &store.nodes[node as usize];
        if n.kind.is_host() {
            if let Some(child) = n.host {
                host.append_child_initial(parent, child);
            }
        } else if n.first_child != INVALID {
            node = n.first_child;
            continue;
        }

        while store.nodes[node as usize].next_sibling == INVALID {
            let up = store.nodes[node as usize].parent;
            if up == INVALID || up == wip {
                return;
            }
            node = up;
        }
        node = store.nodes[node as usize].next_sibling;
    }
}
