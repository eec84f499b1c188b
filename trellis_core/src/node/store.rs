// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Arena storage for work nodes and their position slots.

use alloc::rc::Rc;
use alloc::string::ToString;
use alloc::vec::Vec;

use crate::element::{Element, ElementType, Key, Markup, Props};
use crate::error::RenderError;
use crate::host::HostRef;
use crate::state::StateCell;
use crate::update::{SharedQueue, shared_queue};

use super::flags::{EffectFlags, NodeKind};
use super::id::{INVALID, NodeId, PositionId};
use super::traverse::Children;

/// Input of a node: element props, text content, or nothing (root).
#[derive(Clone, Debug, Default)]
pub(crate) enum Payload {
    #[default]
    None,
    Props(Rc<Props>),
    Text(Rc<str>),
}

impl Payload {
    pub(crate) fn props(&self) -> Option<&Rc<Props>> {
        match self {
            Self::Props(props) => Some(props),
            _ => None,
        }
    }

    pub(crate) fn text(&self) -> Option<&Rc<str>> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Memoized result of processing a node's updates.
#[derive(Clone, Debug, Default)]
pub(crate) enum NodeState {
    #[default]
    None,
    /// Root: the declarative children last rendered.
    Children(Markup),
    /// Component: its state cells in call order.
    Cells(Vec<StateCell>),
}

/// One buffer of one tree position.
#[derive(Clone, Debug)]
pub(crate) struct WorkNode {
    pub(crate) kind: NodeKind,
    pub(crate) key: Option<Key>,
    pub(crate) ty: Option<ElementType>,
    pub(crate) host: Option<HostRef>,
    pub(crate) position: u32,

    // -- Topology --
    pub(crate) parent: u32,
    pub(crate) first_child: u32,
    pub(crate) next_sibling: u32,
    pub(crate) index: usize,

    // -- Render inputs and memoized outputs --
    pub(crate) pending: Payload,
    pub(crate) committed: Payload,
    pub(crate) state: NodeState,
    pub(crate) queue: Option<SharedQueue<Markup>>,

    // -- Effects --
    pub(crate) flags: EffectFlags,
    pub(crate) subtree_flags: EffectFlags,
    pub(crate) deletions: Vec<u32>,
}

impl WorkNode {
    fn new(kind: NodeKind, position: u32) -> Self {
        Self {
            kind,
            key: None,
            ty: None,
            host: None,
            position,
            parent: INVALID,
            first_child: INVALID,
            next_sibling: INVALID,
            index: 0,
            pending: Payload::None,
            committed: Payload::None,
            state: NodeState::None,
            queue: None,
            flags: EffectFlags::NONE,
            subtree_flags: EffectFlags::NONE,
            deletions: Vec::new(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct Position {
    buffers: [u32; 2],
    generation: u32,
    alive: bool,
}

/// Arena of work-node buffers, grouped into tree positions.
///
/// Every logical position in the tree owns a slot holding at most two buffer
/// indices: the buffer in the committed ("current") tree and the one being
/// rebuilt by a render pass ("work in progress"). The two roles swap on every
/// commit, so a position never owns more than two buffers no matter how many
/// passes run.
///
/// Buffers and positions are addressed by generational handles
/// ([`NodeId`], [`PositionId`]); released slots go onto free lists and old
/// handles fail validation.
#[derive(Debug)]
pub struct NodeStore {
    pub(crate) nodes: Vec<WorkNode>,
    node_generation: Vec<u32>,
    node_alive: Vec<bool>,
    free_nodes: Vec<u32>,

    positions: Vec<Position>,
    free_positions: Vec<u32>,

    // -- Pass journal --
    created: Vec<u32>,
    in_pass: bool,
}

impl NodeStore {
    pub(crate) fn new() -> Self {
        Self {
            nodes: Vec::new(),
            node_generation: Vec::new(),
            node_alive: Vec::new(),
            free_nodes: Vec::new(),
            positions: Vec::new(),
            free_positions: Vec::new(),
            created: Vec::new(),
            in_pass: false,
        }
    }

    // -- Allocation --

    fn alloc_node(&mut self, node: WorkNode) -> u32 {
        if let Some(idx) = self.free_nodes.pop() {
            self.nodes[idx as usize] = node;
            self.node_alive[idx as usize] = true;
            idx
        } else {
            let idx = u32::try_from(self.nodes.len()).unwrap_or(INVALID);
            assert!(idx != INVALID, "node store exhausted");
            self.nodes.push(node);
            self.node_generation.push(0);
            self.node_alive.push(true);
            idx
        }
    }

    /// Allocates a fresh position with a single buffer and returns the
    /// buffer index.
    fn alloc_position(&mut self, kind: NodeKind) -> u32 {
        let pos = if let Some(pos) = self.free_positions.pop() {
            let slot = &mut self.positions[pos as usize];
            slot.alive = true;
            slot.buffers = [INVALID; 2];
            pos
        } else {
            let pos = u32::try_from(self.positions.len()).unwrap_or(INVALID);
            assert!(pos != INVALID, "position table exhausted");
            self.positions.push(Position {
                buffers: [INVALID; 2],
                generation: 0,
                alive: true,
            });
            pos
        };

        let idx = self.alloc_node(WorkNode::new(kind, pos));
        self.positions[pos as usize].buffers[0] = idx;
        if self.in_pass {
            self.created.push(pos);
        }
        idx
    }

    /// Creates the root buffer for a container.
    pub(crate) fn create_root(&mut self, container: HostRef) -> u32 {
        let idx = self.alloc_position(NodeKind::Root);
        let node = &mut self.nodes[idx as usize];
        node.host = Some(container);
        node.queue = Some(shared_queue());
        node.state = NodeState::Children(Markup::Empty);
        idx
    }

    /// Creates a new position for `element`.
    ///
    /// Host tags must be non-empty and free of whitespace.
    pub(crate) fn create_node_for_element(&mut self, element: &Element) -> Result<u32, RenderError> {
        let (kind, state) = match &element.ty {
            ElementType::Host(tag) => {
                if tag.is_empty() || tag.chars().any(char::is_whitespace) {
                    return Err(RenderError::UnrecognizedElementType(tag.to_string()));
                }
                (NodeKind::HostElement, NodeState::None)
            }
            ElementType::Component(_) => (NodeKind::Component, NodeState::Cells(Vec::new())),
        };
        let idx = self.alloc_position(kind);
        let node = &mut self.nodes[idx as usize];
        node.key = element.key.clone();
        node.ty = Some(element.ty.clone());
        node.pending = Payload::Props(Rc::clone(&element.props));
        node.state = state;
        Ok(idx)
    }

    /// Creates a new position for a text node.
    pub(crate) fn create_node_for_text(&mut self, text: Rc<str>) -> u32 {
        let idx = self.alloc_position(NodeKind::HostText);
        self.nodes[idx as usize].pending = Payload::Text(text);
        idx
    }

    /// Returns the work-in-progress buffer paired with `current`, prepared
    /// for a render with `pending` as input.
    ///
    /// The first call for a position allocates its second buffer; later
    /// calls reuse it. Effects are reset; identity, host handle, queue,
    /// memoized state and the child list are copied from `current`.
    pub(crate) fn clone_for_work(&mut self, current: u32, pending: Payload) -> u32 {
        let pos = self.nodes[current as usize].position;
        let other = self.alternate_of(current);
        let wip = if other == INVALID {
            let kind = self.nodes[current as usize].kind;
            let idx = self.alloc_node(WorkNode::new(kind, pos));
            let slot = &mut self.positions[pos as usize];
            if slot.buffers[0] == current {
                slot.buffers[1] = idx;
            } else {
                slot.buffers[0] = idx;
            }
            idx
        } else {
            other
        };

        let mut deletions = core::mem::take(&mut self.nodes[wip as usize].deletions);
        deletions.clear();
        let src = &self.nodes[current as usize];
        let copy = WorkNode {
            kind: src.kind,
            key: src.key.clone(),
            ty: src.ty.clone(),
            host: src.host,
            position: pos,
            parent: src.parent,
            first_child: src.first_child,
            next_sibling: src.next_sibling,
            index: src.index,
            pending,
            committed: src.committed.clone(),
            state: src.state.clone(),
            queue: src.queue.clone(),
            flags: EffectFlags::NONE,
            subtree_flags: EffectFlags::NONE,
            deletions,
        };
        self.nodes[wip as usize] = copy;
        wip
    }

    /// Returns the other buffer of `idx`'s position, or [`INVALID`].
    pub(crate) fn alternate_of(&self, idx: u32) -> u32 {
        let buffers = self.positions[self.nodes[idx as usize].position as usize].buffers;
        if buffers[0] == idx { buffers[1] } else { buffers[0] }
    }

    /// ORs every child's flags into `idx`'s subtree flags and points each
    /// child's parent link at `idx`.
    pub(crate) fn bubble_effects(&mut self, idx: u32) {
        let mut subtree = EffectFlags::NONE;
        let mut child = self.nodes[idx as usize].first_child;
        while child != INVALID {
            let node = &mut self.nodes[child as usize];
            subtree |= node.flags | node.subtree_flags;
            node.parent = idx;
            child = node.next_sibling;
        }
        self.nodes[idx as usize].subtree_flags |= subtree;
    }

    /// Frees both buffers of a position and invalidates its handles.
    pub(crate) fn release_position(&mut self, pos: u32) {
        let slot = &mut self.positions[pos as usize];
        if !slot.alive {
            return;
        }
        let buffers = slot.buffers;
        slot.alive = false;
        slot.buffers = [INVALID; 2];
        slot.generation += 1;
        self.free_positions.push(pos);

        for idx in buffers {
            if idx == INVALID {
                continue;
            }
            let kind = self.nodes[idx as usize].kind;
            self.nodes[idx as usize] = WorkNode::new(kind, INVALID);
            self.node_generation[idx as usize] += 1;
            self.node_alive[idx as usize] = false;
            self.free_nodes.push(idx);
        }
    }

    // -- Pass journal --

    /// Starts recording positions created by a render pass.
    pub(crate) fn begin_pass(&mut self) {
        self.created.clear();
        self.in_pass = true;
    }

    /// Releases every position created since [`begin_pass`](Self::begin_pass).
    pub(crate) fn rollback_pass(&mut self) -> usize {
        self.in_pass = false;
        let created = core::mem::take(&mut self.created);
        let released = created.len();
        for pos in created {
            self.release_position(pos);
        }
        released
    }

    /// Keeps the positions created by the pass.
    pub(crate) fn finish_pass(&mut self) {
        self.in_pass = false;
        self.created.clear();
    }

    // -- Handles --

    pub(crate) fn node_id(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.node_generation[idx as usize],
        }
    }

    pub(crate) fn position_id(&self, pos: u32) -> PositionId {
        PositionId {
            idx: pos,
            generation: self.positions[pos as usize].generation,
        }
    }

    /// Returns the buffers of a live position slot.
    pub(crate) fn position_buffers(&self, pos: u32) -> Option<[u32; 2]> {
        self.positions
            .get(pos as usize)
            .filter(|slot| slot.alive)
            .map(|slot| slot.buffers)
    }

    // -- Inspection API --

    /// Returns whether the given handle refers to a live buffer.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        (id.idx as usize) < self.nodes.len()
            && self.node_generation[id.idx as usize] == id.generation
            && self.node_alive[id.idx as usize]
    }

    /// Returns whether the given handle refers to a mounted position.
    #[must_use]
    pub fn is_position_alive(&self, id: PositionId) -> bool {
        self.positions
            .get(id.idx as usize)
            .is_some_and(|slot| slot.alive && slot.generation == id.generation)
    }

    /// Returns the kind of a node.
    #[must_use]
    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.validate(id);
        self.nodes[id.idx as usize].kind
    }

    /// Returns the key of a node, if any.
    #[must_use]
    pub fn key(&self, id: NodeId) -> Option<&Key> {
        self.validate(id);
        self.nodes[id.idx as usize].key.as_ref()
    }

    /// Returns the host instance of a node, if one was created.
    #[must_use]
    pub fn host(&self, id: NodeId) -> Option<HostRef> {
        self.validate(id);
        self.nodes[id.idx as usize].host
    }

    /// Returns the parent of a node, if any.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.nodes[id.idx as usize].parent;
        (p != INVALID).then(|| self.node_id(p))
    }

    /// Returns an iterator over the direct children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.nodes[id.idx as usize].first_child)
    }

    /// Returns the other buffer of the node's position, if allocated.
    #[must_use]
    pub fn alternate(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let other = self.alternate_of(id.idx);
        (other != INVALID).then(|| self.node_id(other))
    }

    /// Returns the position a node belongs to.
    #[must_use]
    pub fn position(&self, id: NodeId) -> PositionId {
        self.validate(id);
        self.position_id(self.nodes[id.idx as usize].position)
    }

    /// Returns the node's own pending effects.
    #[must_use]
    pub fn flags(&self, id: NodeId) -> EffectFlags {
        self.validate(id);
        self.nodes[id.idx as usize].flags
    }

    /// Returns the union of effects pending below the node.
    #[must_use]
    pub fn subtree_flags(&self, id: NodeId) -> EffectFlags {
        self.validate(id);
        self.nodes[id.idx as usize].subtree_flags
    }

    /// Returns the committed props of an element or component node.
    #[must_use]
    pub fn props(&self, id: NodeId) -> Option<&Props> {
        self.validate(id);
        self.nodes[id.idx as usize].committed.props().map(|p| &**p)
    }

    /// Returns the committed content of a text node.
    #[must_use]
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.validate(id);
        self.nodes[id.idx as usize].committed.text().map(|t| &**t)
    }

    /// Returns how many buffers a position currently owns (0 if released).
    #[must_use]
    pub fn buffer_count(&self, id: PositionId) -> usize {
        if !self.is_position_alive(id) {
            return 0;
        }
        self.positions[id.idx as usize]
            .buffers
            .iter()
            .filter(|&&b| b != INVALID)
            .count()
    }

    /// Returns the number of mounted positions, the root included.
    #[must_use]
    pub fn live_positions(&self) -> usize {
        self.positions.iter().filter(|slot| slot.alive).count()
    }

    /// Returns the number of allocated buffers.
    #[must_use]
    pub fn live_buffers(&self) -> usize {
        self.node_alive.iter().filter(|&&alive| alive).count()
    }

    /// Panics if the handle is stale.
    fn validate(&self, id: NodeId) {
        assert!(
            self.is_alive(id),
            "stale NodeId: {id:?} (current gen: {})",
            self.node_generation
                .get(id.idx as usize)
                .copied()
                .unwrap_or(u32::MAX)
        );
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn div(key: &str) -> Element {
        Element::host("div").key(key).build()
    }

    #[test]
    fn clone_for_work_allocates_once_then_reuses() {
        let mut store = NodeStore::new();
        let a = store.create_node_for_element(&div("a")).unwrap();
        let props = store.nodes[a as usize].pending.clone();
        store.nodes[a as usize].committed = props.clone();

        let wip = store.clone_for_work(a, props.clone());
        assert_ne!(wip, a);
        assert_eq!(store.alternate_of(a), wip);
        assert_eq!(store.alternate_of(wip), a);
        assert_eq!(store.live_buffers(), 2);

        store.nodes[wip as usize].flags = EffectFlags::UPDATE;
        store.nodes[wip as usize].deletions.push(7);

        let again = store.clone_for_work(a, props);
        assert_eq!(again, wip, "second clone reuses the paired buffer");
        assert!(store.nodes[again as usize].flags.is_empty());
        assert!(store.nodes[again as usize].deletions.is_empty());
        assert_eq!(store.live_buffers(), 2);

        let pos = store.position(store.node_id(a));
        assert_eq!(store.buffer_count(pos), 2);
    }

    #[test]
    fn clone_copies_identity_and_links() {
        let mut store = NodeStore::new();
        let root = store.create_root(HostRef(0));
        let child = store.create_node_for_text(Rc::from("hi"));
        store.nodes[root as usize].first_child = child;

        let wip = store.clone_for_work(root, Payload::None);
        let node = &store.nodes[wip as usize];
        assert_eq!(node.kind, NodeKind::Root);
        assert_eq!(node.host, Some(HostRef(0)));
        assert_eq!(node.first_child, child);
        assert!(node.queue.is_some());
    }

    #[test]
    fn empty_host_tag_is_unrecognized() {
        let mut store = NodeStore::new();
        let err = store
            .create_node_for_element(&Element::host("").build())
            .unwrap_err();
        assert!(matches!(err, RenderError::UnrecognizedElementType(_)));
        assert_eq!(store.live_positions(), 0);
    }

    #[test]
    fn bubble_effects_unions_children_and_sets_parent() {
        let mut store = NodeStore::new();
        let parent = store.create_node_for_element(&div("p")).unwrap();
        let a = store.create_node_for_element(&div("a")).unwrap();
        let b = store.create_node_for_element(&div("b")).unwrap();
        store.nodes[parent as usize].first_child = a;
        store.nodes[a as usize].next_sibling = b;
        store.nodes[a as usize].flags = EffectFlags::PLACEMENT;
        store.nodes[b as usize].subtree_flags = EffectFlags::UPDATE;

        store.bubble_effects(parent);

        assert_eq!(
            store.nodes[parent as usize].subtree_flags,
            EffectFlags::PLACEMENT | EffectFlags::UPDATE
        );
        assert_eq!(store.nodes[a as usize].parent, parent);
        assert_eq!(store.nodes[b as usize].parent, parent);
    }

    #[test]
    fn release_invalidates_handles_and_recycles_slots() {
        let mut store = NodeStore::new();
        let a = store.create_node_for_element(&div("a")).unwrap();
        let id = store.node_id(a);
        let pos = store.position(id);
        let wip = store.clone_for_work(a, Payload::None);
        let wip_id = store.node_id(wip);

        store.release_position(pos.idx);
        assert!(!store.is_alive(id));
        assert!(!store.is_alive(wip_id));
        assert!(!store.is_position_alive(pos));
        assert_eq!(store.buffer_count(pos), 0);

        let b = store.create_node_for_element(&div("b")).unwrap();
        let reused = store.position(store.node_id(b));
        assert_eq!(reused.idx, pos.idx);
        assert_ne!(reused, pos);
    }

    #[test]
    fn rollback_releases_positions_created_in_pass() {
        let mut store = NodeStore::new();
        let kept = store.create_node_for_element(&div("kept")).unwrap();
        store.begin_pass();
        let _ = store.create_node_for_element(&div("a")).unwrap();
        let _ = store.create_node_for_text(Rc::from("t"));
        assert_eq!(store.live_positions(), 3);

        assert_eq!(store.rollback_pass(), 2);
        assert_eq!(store.live_positions(), 1);
        assert!(store.is_alive(store.node_id(kept)));
    }

    #[test]
    fn finish_keeps_positions() {
        let mut store = NodeStore::new();
        store.begin_pass();
        let a = store.create_node_for_element(&div("a")).unwrap();
        store.finish_pass();
        assert_eq!(store.rollback_pass(), 0);
        assert!(store.is_alive(store.node_id(a)));
        let kids: Vec<NodeId> = store.children(store.node_id(a)).collect();
        assert_eq!(kids, vec![]);
    }

    #[test]
    #[should_panic(expected = "stale NodeId")]
    fn released_handle_panics_on_kind() {
        let mut store = NodeStore::new();
        let a = store.create_node_for_text(Rc::from("x"));
        let id = store.node_id(a);
        store.release_position(store.nodes[a as usize].position);
        let _ = store.kind(id);
    }
}
