// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Child reconciliation.
//!
//! Given the first previous child of a node and the node's new declarative
//! children, [`ChildReconciler::reconcile_children`] builds the new child
//! list, reusing previous buffers whose key and type match, and records the
//! structural effects on the way:
//!
//! - [`PLACEMENT`](EffectFlags::PLACEMENT) on children that are new or that
//!   moved left of a child kept in place;
//! - [`CHILD_DELETION`](EffectFlags::CHILD_DELETION) on the parent, with the
//!   removed children in its deletion list.
//!
//! Two instances exist. [`ChildReconciler::TRACK`] records effects and is
//! used for nodes that were committed before. [`ChildReconciler::MOUNT`]
//! records nothing: its nodes are inserted into the host as part of an
//! ancestor's placement.
//!
//! # Keyed lists
//!
//! Children are matched by key, or by index when they have none. Reused
//! children are visited in new order while remembering the largest previous
//! index kept in place (`last_placed_index`). A reused child whose previous
//! index is smaller moved left and is flagged for placement; otherwise it
//! stays and raises `last_placed_index`. Reversing `[A, B, C]` therefore
//! keeps `C`, moves `B` and `A`, and creates nothing.

use alloc::collections::BTreeMap;
use alloc::rc::Rc;

use crate::element::{Element, Key, Markup};
use crate::node::{EffectFlags, INVALID, NodeKind, NodeStore, Payload};

/// Map key used to find a previous child for a new entry.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
enum LookupKey {
    Key(Key),
    Index(usize),
}

impl LookupKey {
    fn of(key: Option<&Key>, index: usize) -> Self {
        key.map_or(Self::Index(index), |key| Self::Key(key.clone()))
    }
}

/// Diffs previous children against new declarative children.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ChildReconciler {
    track_effects: bool,
}

impl ChildReconciler {
    /// Records placements and deletions.
    pub(crate) const TRACK: Self = Self {
        track_effects: true,
    };
    /// Builds a fresh subtree without bookkeeping.
    pub(crate) const MOUNT: Self = Self {
        track_effects: false,
    };

    /// Reconciles the children of `parent` and returns its new first child,
    /// or [`INVALID`] if it has none.
    pub(crate) fn reconcile_children(
        self,
        store: &mut NodeStore,
        parent: u32,
        current_first: u32,
        children: &Markup,
    ) -> u32 {
        match children {
            Markup::Element(element) => {
                let child = self.reconcile_single_element(store, parent, current_first, element);
                self.place_single_child(store, child)
            }
            Markup::Text(text) => {
                let child = self.reconcile_single_text(store, parent, current_first, text);
                self.place_single_child(store, child)
            }
            Markup::List(items) => self.reconcile_list(store, parent, current_first, items),
            Markup::Empty => {
                self.delete_remaining_children(store, parent, current_first);
                INVALID
            }
        }
    }

    fn reconcile_single_element(
        self,
        store: &mut NodeStore,
        parent: u32,
        current_first: u32,
        element: &Element,
    ) -> u32 {
        let mut child = current_first;
        while child != INVALID {
            let node = &store.nodes[child as usize];
            let next = node.next_sibling;
            if node.key == element.key {
                if node.kind != NodeKind::HostText && node.ty.as_ref() == Some(&element.ty) {
                    let existing =
                        self.use_node(store, child, Payload::Props(Rc::clone(&element.props)));
                    store.nodes[existing as usize].parent = parent;
                    self.delete_remaining_children(store, parent, next);
                    return existing;
                }
                self.delete_remaining_children(store, parent, child);
                break;
            }
            self.delete_child(store, parent, child);
            child = next;
        }
        self.create_element_child(store, parent, element)
    }

    fn reconcile_single_text(
        self,
        store: &mut NodeStore,
        parent: u32,
        current_first: u32,
        text: &Rc<str>,
    ) -> u32 {
        let mut child = current_first;
        while child != INVALID {
            let node = &store.nodes[child as usize];
            let next = node.next_sibling;
            if node.kind == NodeKind::HostText {
                let existing = self.use_node(store, child, Payload::Text(Rc::clone(text)));
                store.nodes[existing as usize].parent = parent;
                self.delete_remaining_children(store, parent, next);
                return existing;
            }
            self.delete_child(store, parent, child);
            child = next;
        }
        let created = store.create_node_for_text(Rc::clone(text));
        store.nodes[created as usize].parent = parent;
        created
    }

    fn reconcile_list(
        self,
        store: &mut NodeStore,
        parent: u32,
        current_first: u32,
        items: &[Markup],
    ) -> u32 {
        let mut existing = BTreeMap::new();
        let mut child = current_first;
        while child != INVALID {
            let node = &store.nodes[child as usize];
            let slot = LookupKey::of(node.key.as_ref(), node.index);
            let next = node.next_sibling;
            if let Some(shadowed) = existing.insert(slot, child) {
                tracing::warn!(
                    node = child,
                    "duplicate key among siblings; deleting the earlier child"
                );
                self.delete_child(store, parent, shadowed);
            }
            child = next;
        }

        let mut last_placed_index = 0;
        let mut first_new = INVALID;
        let mut last_new = INVALID;

        for (i, item) in items.iter().enumerate() {
            let Some(new) = self.update_from_map(store, parent, &mut existing, i, item) else {
                continue;
            };
            let node = &mut store.nodes[new as usize];
            node.index = i;
            node.parent = parent;
            node.next_sibling = INVALID;
            if last_new == INVALID {
                first_new = new;
            } else {
                store.nodes[last_new as usize].next_sibling = new;
            }
            last_new = new;

            if !self.track_effects {
                continue;
            }
            let current = store.alternate_of(new);
            if current == INVALID {
                store.nodes[new as usize].flags |= EffectFlags::PLACEMENT;
                continue;
            }
            let old_index = store.nodes[current as usize].index;
            if old_index < last_placed_index {
                store.nodes[new as usize].flags |= EffectFlags::PLACEMENT;
            } else {
                last_placed_index = old_index;
            }
        }

        for (_, unclaimed) in existing {
            self.delete_child(store, parent, unclaimed);
        }
        first_new
    }

    /// Finds or creates the node for the list entry at `index`.
    fn update_from_map(
        self,
        store: &mut NodeStore,
        parent: u32,
        existing: &mut BTreeMap<LookupKey, u32>,
        index: usize,
        item: &Markup,
    ) -> Option<u32> {
        match item {
            Markup::Text(text) => {
                let slot = LookupKey::Index(index);
                if let Some(&before) = existing.get(&slot) {
                    if store.nodes[before as usize].kind == NodeKind::HostText {
                        existing.remove(&slot);
                        return Some(self.use_node(store, before, Payload::Text(Rc::clone(text))));
                    }
                }
                Some(store.create_node_for_text(Rc::clone(text)))
            }
            Markup::Element(element) => {
                let slot = LookupKey::of(element.key.as_ref(), index);
                if let Some(&before) = existing.get(&slot) {
                    let node = &store.nodes[before as usize];
                    if node.kind != NodeKind::HostText && node.ty.as_ref() == Some(&element.ty) {
                        existing.remove(&slot);
                        let props = Payload::Props(Rc::clone(&element.props));
                        return Some(self.use_node(store, before, props));
                    }
                }
                let created = self.create_element_child(store, parent, element);
                (created != INVALID).then_some(created)
            }
            Markup::List(_) => {
                tracing::warn!(index, "skipping nested list inside a child list");
                None
            }
            Markup::Empty => None,
        }
    }

    fn create_element_child(self, store: &mut NodeStore, parent: u32, element: &Element) -> u32 {
        match store.create_node_for_element(element) {
            Ok(created) => {
                store.nodes[created as usize].parent = parent;
                created
            }
            Err(err) => {
                tracing::warn!(%err, "skipping element subtree");
                INVALID
            }
        }
    }

    /// Prepares the paired buffer of a previous child for reuse.
    fn use_node(self, store: &mut NodeStore, current: u32, payload: Payload) -> u32 {
        let wip = store.clone_for_work(current, payload);
        let node = &mut store.nodes[wip as usize];
        node.index = 0;
        node.next_sibling = INVALID;
        wip
    }

    fn place_single_child(self, store: &mut NodeStore, child: u32) -> u32 {
        if self.track_effects && child != INVALID && store.alternate_of(child) == INVALID {
            store.nodes[child as usize].flags |= EffectFlags::PLACEMENT;
        }
        child
    }

    fn delete_child(self, store: &mut NodeStore, parent: u32, child: u32) {
        if !self.track_effects {
            return;
        }
        let node = &mut store.nodes[parent as usize];
        node.deletions.push(child);
        node.flags |= EffectFlags::CHILD_DELETION;
    }

    fn delete_remaining_children(self, store: &mut NodeStore, parent: u32, first: u32) {
        if !self.track_effects {
            return;
        }
        let mut child = first;
        while child != INVALID {
            let next = store.nodes[child as usize].next_sibling;
            self.delete_child(store, parent, child);
            child = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;
    use alloc::vec::Vec;

    use super::*;
    use crate::element::Element;
    use crate::host::HostRef;

    /// Mounts `children` under a fresh root and promotes the result to a
    /// committed tree. Returns the root buffer.
    fn mounted(store: &mut NodeStore, children: &Markup) -> u32 {
        let root = store.create_root(HostRef(0));
        let first = ChildReconciler::MOUNT.reconcile_children(store, root, INVALID, children);
        store.nodes[root as usize].first_child = first;
        let mut child = first;
        while child != INVALID {
            let node = &mut store.nodes[child as usize];
            node.committed = node.pending.clone();
            child = node.next_sibling;
        }
        root
    }

    fn rerender(store: &mut NodeStore, root: u32, children: &Markup) -> u32 {
        let wip = store.clone_for_work(root, Payload::None);
        let first = store.nodes[root as usize].first_child;
        let new_first = ChildReconciler::TRACK.reconcile_children(store, wip, first, children);
        store.nodes[wip as usize].first_child = new_first;
        wip
    }

    fn keyed(keys: &[&str]) -> Markup {
        Markup::List(
            keys.iter()
                .map(|k| Element::host("li").key(*k).child(*k).into())
                .collect(),
        )
    }

    fn child_list(store: &NodeStore, parent: u32) -> Vec<u32> {
        let mut out = Vec::new();
        let mut child = store.nodes[parent as usize].first_child;
        while child != INVALID {
            out.push(child);
            child = store.nodes[child as usize].next_sibling;
        }
        out
    }

    fn key_of(store: &NodeStore, idx: u32) -> &str {
        store.nodes[idx as usize].key.as_ref().map_or("", Key::as_str)
    }

    #[test]
    fn mount_records_no_effects() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "b"]));
        for child in child_list(&store, root) {
            assert!(store.nodes[child as usize].flags.is_empty());
        }
        assert!(store.nodes[root as usize].deletions.is_empty());
    }

    #[test]
    fn reversal_reuses_all_and_moves_two() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "b", "c"]));
        let before = store.live_positions();
        let wip = rerender(&mut store, root, &keyed(&["c", "b", "a"]));

        assert_eq!(store.live_positions(), before, "nothing created");
        let kids = child_list(&store, wip);
        let keys: Vec<&str> = kids.iter().map(|&k| key_of(&store, k)).collect();
        assert_eq!(keys, vec!["c", "b", "a"]);
        for &k in &kids {
            assert_ne!(store.alternate_of(k), INVALID, "every child is reused");
        }
        let moved: Vec<&str> = kids
            .iter()
            .filter(|&&k| store.nodes[k as usize].flags.contains(EffectFlags::PLACEMENT))
            .map(|&k| key_of(&store, k))
            .collect();
        assert_eq!(moved, vec!["b", "a"]);
        assert!(store.nodes[wip as usize].deletions.is_empty());
    }

    #[test]
    fn removed_keys_are_deleted_and_new_ones_placed() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "b", "c"]));
        let old_b = child_list(&store, root)[1];
        let wip = rerender(&mut store, root, &keyed(&["a", "c", "d"]));

        let node = &store.nodes[wip as usize];
        assert_eq!(node.deletions, vec![old_b]);
        assert!(node.flags.contains(EffectFlags::CHILD_DELETION));

        let kids = child_list(&store, wip);
        assert!(store.nodes[kids[0] as usize].flags.is_empty());
        assert!(store.nodes[kids[1] as usize].flags.is_empty());
        assert_eq!(store.nodes[kids[2] as usize].flags, EffectFlags::PLACEMENT);
    }

    #[test]
    fn single_type_mismatch_deletes_and_creates() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &Element::host("p").key("k").into());
        let old = child_list(&store, root)[0];
        let wip = rerender(&mut store, root, &Element::host("span").key("k").into());

        assert_eq!(store.nodes[wip as usize].deletions, vec![old]);
        let new = child_list(&store, wip)[0];
        assert_eq!(store.alternate_of(new), INVALID);
        assert_eq!(store.nodes[new as usize].flags, EffectFlags::PLACEMENT);
    }

    #[test]
    fn single_element_deletes_unmatched_siblings() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "b", "c"]));
        let old = child_list(&store, root);
        let wip = rerender(&mut store, root, &Element::host("li").key("b").into());

        assert_eq!(store.nodes[wip as usize].deletions, vec![old[0], old[2]]);
        let kept = child_list(&store, wip);
        assert_eq!(kept.len(), 1);
        assert_eq!(store.alternate_of(kept[0]), old[1]);
        assert!(store.nodes[kept[0] as usize].flags.is_empty());
    }

    #[test]
    fn text_reuses_first_text_child() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &Markup::from("old"));
        let old = child_list(&store, root)[0];
        let wip = rerender(&mut store, root, &Markup::from("new"));

        let new = child_list(&store, wip)[0];
        assert_eq!(store.alternate_of(new), old);
        assert_eq!(
            store.nodes[new as usize].pending.text().map(|t| &**t),
            Some("new")
        );
    }

    #[test]
    fn text_replaces_element_children() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "b"]));
        let old = child_list(&store, root);
        let wip = rerender(&mut store, root, &Markup::from("text"));

        assert_eq!(store.nodes[wip as usize].deletions, old);
        let kids = child_list(&store, wip);
        assert_eq!(kids.len(), 1);
        assert_eq!(store.alternate_of(kids[0]), INVALID);
        assert_eq!(store.nodes[kids[0] as usize].flags, EffectFlags::PLACEMENT);
    }

    #[test]
    fn text_reuse_deletes_the_siblings_after_it() {
        let mut store = NodeStore::new();
        let before = Markup::List(vec![
            Markup::from("x"),
            Element::host("li").key("b").child("b").into(),
        ]);
        let root = mounted(&mut store, &before);
        let old = child_list(&store, root);
        let wip = rerender(&mut store, root, &Markup::from("y"));

        assert_eq!(store.nodes[wip as usize].deletions, vec![old[1]]);
        let kids = child_list(&store, wip);
        assert_eq!(kids.len(), 1);
        assert_eq!(store.alternate_of(kids[0]), old[0]);
        assert!(store.nodes[kids[0] as usize].flags.is_empty());
    }

    #[test]
    fn empty_deletes_every_previous_child() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "b"]));
        let old = child_list(&store, root);
        let wip = rerender(&mut store, root, &Markup::Empty);
        assert_eq!(store.nodes[wip as usize].deletions, old);
        assert_eq!(store.nodes[wip as usize].first_child, INVALID);
    }

    #[test]
    fn nested_list_and_bad_tag_are_skipped() {
        let mut store = NodeStore::new();
        let root = store.create_root(HostRef(0));
        let children = Markup::List(vec![
            Markup::List(vec![Markup::from("x")]),
            Element::host("").into(),
            Markup::from("ok"),
        ]);
        let first = ChildReconciler::MOUNT.reconcile_children(&mut store, root, INVALID, &children);
        store.nodes[root as usize].first_child = first;
        let kids = child_list(&store, root);
        assert_eq!(kids.len(), 1);
        assert_eq!(store.nodes[kids[0] as usize].index, 2);
    }

    #[test]
    fn unkeyed_entries_match_by_index() {
        let mut store = NodeStore::new();
        let list = |a: &str, b: &str| {
            Markup::List(vec![
                Element::host("b").child(a).into(),
                Markup::from(b),
            ])
        };
        let root = mounted(&mut store, &list("1", "2"));
        let old = child_list(&store, root);
        let wip = rerender(&mut store, root, &list("3", "4"));
        let new = child_list(&store, wip);
        assert_eq!(store.alternate_of(new[0]), old[0]);
        assert_eq!(store.alternate_of(new[1]), old[1]);
        assert!(store.nodes[wip as usize].deletions.is_empty());
    }

    #[test]
    fn duplicate_previous_keys_do_not_leak() {
        let mut store = NodeStore::new();
        let root = mounted(&mut store, &keyed(&["a", "a"]));
        let old = child_list(&store, root);
        let wip = rerender(&mut store, root, &keyed(&["a"]));

        assert_eq!(store.nodes[wip as usize].deletions, vec![old[0]]);
        let kept = child_list(&store, wip);
        assert_eq!(kept.len(), 1);
        assert_eq!(store.alternate_of(kept[0]), old[1]);
    }
}
