// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory host adapter for exercising the reconciler without a DOM.
//!
//! [`MemoryHost`] keeps a small DOM-like tree of element and text instances,
//! logs every [`HostAdapter`] call as a [`HostOp`], and counts them in
//! [`MutationCounts`]. Tests assert on the serialized tree
//! ([`MemoryHost::to_markup`]) and on the call counts.

#![no_std]

extern crate alloc;

use alloc::collections::BTreeMap;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt::Write as _;

use trellis_core::element::{PropValue, Props};
use trellis_core::host::{HostAdapter, HostRef};

/// One recorded [`HostAdapter`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HostOp {
    /// `create_element_instance`.
    CreateElement {
        /// New instance.
        instance: HostRef,
        /// Tag name.
        tag: String,
    },
    /// `create_text_instance`.
    CreateText {
        /// New instance.
        instance: HostRef,
        /// Initial content.
        text: String,
    },
    /// `append_child_initial`.
    AppendInitial {
        /// Parent under construction.
        parent: HostRef,
        /// Attached child.
        child: HostRef,
    },
    /// `append_child`.
    Append {
        /// Parent.
        container: HostRef,
        /// Appended or moved child.
        child: HostRef,
    },
    /// `insert_before`.
    InsertBefore {
        /// Inserted or moved child.
        child: HostRef,
        /// Parent.
        container: HostRef,
        /// Anchor.
        before: HostRef,
    },
    /// `remove_child`.
    Remove {
        /// Removed child.
        child: HostRef,
        /// Parent it was removed from.
        container: HostRef,
    },
    /// `apply_text_update`.
    TextUpdate {
        /// Patched text instance.
        instance: HostRef,
        /// New content.
        text: String,
    },
    /// `apply_props_update`.
    PropsUpdate {
        /// Patched element instance.
        instance: HostRef,
    },
}

/// Per-call counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MutationCounts {
    /// Element and text instances created.
    pub created: u32,
    /// `append_child_initial` calls.
    pub appended_initial: u32,
    /// `append_child` calls.
    pub appended: u32,
    /// `insert_before` calls.
    pub inserted: u32,
    /// `remove_child` calls.
    pub removed: u32,
    /// `apply_text_update` calls.
    pub text_updates: u32,
    /// `apply_props_update` calls.
    pub props_updates: u32,
}

impl MutationCounts {
    /// Returns the number of calls that touched the visible tree.
    #[must_use]
    pub const fn visible(&self) -> u32 {
        self.appended + self.inserted + self.removed + self.text_updates + self.props_updates
    }
}

#[derive(Debug)]
enum Content {
    Element {
        tag: String,
        attrs: BTreeMap<String, String>,
    },
    Text(String),
}

#[derive(Debug)]
struct Instance {
    content: Content,
    parent: Option<HostRef>,
    children: Vec<HostRef>,
}

/// A DOM-like host tree held in memory.
///
/// Instance `HostRef(0)` is the container, created by [`MemoryHost::new`].
#[derive(Debug)]
pub struct MemoryHost {
    instances: Vec<Instance>,
    ops: Vec<HostOp>,
    counts: MutationCounts,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates a host with an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self {
            instances: alloc::vec![Instance {
                content: Content::Element {
                    tag: "#root".to_string(),
                    attrs: BTreeMap::new(),
                },
                parent: None,
                children: Vec::new(),
            }],
            ops: Vec::new(),
            counts: MutationCounts::default(),
        }
    }

    /// Returns the container instance.
    #[must_use]
    pub const fn container(&self) -> HostRef {
        HostRef(0)
    }

    /// Returns every call recorded since the last [`take_ops`](Self::take_ops).
    #[must_use]
    pub fn ops(&self) -> &[HostOp] {
        &self.ops
    }

    /// Returns and clears the recorded calls and counters.
    pub fn take_ops(&mut self) -> Vec<HostOp> {
        self.counts = MutationCounts::default();
        core::mem::take(&mut self.ops)
    }

    /// Returns the counters accumulated since the last
    /// [`take_ops`](Self::take_ops).
    #[must_use]
    pub fn counts(&self) -> MutationCounts {
        self.counts
    }

    /// Returns the number of instances ever created, the container included.
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Returns the children of an instance.
    #[must_use]
    pub fn children(&self, instance: HostRef) -> &[HostRef] {
        self.get(instance).map_or(&[], |i| &i.children)
    }

    /// Returns the parent of an instance, if attached.
    #[must_use]
    pub fn parent(&self, instance: HostRef) -> Option<HostRef> {
        self.get(instance).and_then(|i| i.parent)
    }

    /// Returns the tag of an element instance.
    #[must_use]
    pub fn tag(&self, instance: HostRef) -> Option<&str> {
        match &self.get(instance)?.content {
            Content::Element { tag, .. } => Some(tag),
            Content::Text(_) => None,
        }
    }

    /// Returns the content of a text instance.
    #[must_use]
    pub fn text(&self, instance: HostRef) -> Option<&str> {
        match &self.get(instance)?.content {
            Content::Text(text) => Some(text),
            Content::Element { .. } => None,
        }
    }

    /// Returns a rendered attribute of an element instance.
    #[must_use]
    pub fn attr(&self, instance: HostRef, name: &str) -> Option<&str> {
        match &self.get(instance)?.content {
            Content::Element { attrs, .. } => attrs.get(name).map(String::as_str),
            Content::Text(_) => None,
        }
    }

    /// Finds the first attached element, in document order, whose attribute
    /// `name` equals `value`.
    #[must_use]
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<HostRef> {
        let mut stack = alloc::vec![self.container()];
        while let Some(node) = stack.pop() {
            if self.attr(node, name) == Some(value) {
                return Some(node);
            }
            stack.extend(self.children(node).iter().rev().copied());
        }
        None
    }

    /// Serializes the container's content as HTML-like markup.
    ///
    /// Attributes are written in name order; callbacks are omitted.
    #[must_use]
    pub fn to_markup(&self) -> String {
        let mut out = String::new();
        for &child in self.children(self.container()) {
            self.write_markup(&mut out, child);
        }
        out
    }

    fn write_markup(&self, out: &mut String, instance: HostRef) {
        let Some(node) = self.get(instance) else {
            return;
        };
        match &node.content {
            Content::Text(text) => out.push_str(text),
            Content::Element { tag, attrs } => {
                let _ = write!(out, "<{tag}");
                for (name, value) in attrs {
                    let _ = write!(out, " {name}=\"{value}\"");
                }
                out.push('>');
                for &child in &node.children {
                    self.write_markup(out, child);
                }
                let _ = write!(out, "</{tag}>");
            }
        }
    }

    fn get(&self, instance: HostRef) -> Option<&Instance> {
        self.instances.get(instance.0 as usize)
    }

    fn push(&mut self, content: Content) -> HostRef {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "test hosts never hold u32::MAX instances"
        )]
        let instance = HostRef(self.instances.len() as u32);
        self.instances.push(Instance {
            content,
            parent: None,
            children: Vec::new(),
        });
        self.counts.created += 1;
        instance
    }

    fn detach(&mut self, child: HostRef) {
        let Some(parent) = self.get(child).and_then(|i| i.parent) else {
            return;
        };
        self.instances[parent.0 as usize]
            .children
            .retain(|&c| c != child);
        self.instances[child.0 as usize].parent = None;
    }

    fn attach(&mut self, container: HostRef, child: HostRef, at: Option<usize>) {
        if self.get(container).is_none() || self.get(child).is_none() {
            tracing::warn!(?container, ?child, "attach of unknown instance ignored");
            return;
        }
        self.detach(child);
        let children = &mut self.instances[container.0 as usize].children;
        match at {
            Some(index) => children.insert(index, child),
            None => children.push(child),
        }
        self.instances[child.0 as usize].parent = Some(container);
    }
}

fn render_attrs(props: &Props) -> BTreeMap<String, String> {
    props
        .attrs()
        .filter_map(|(name, value)| {
            let rendered = match value {
                PropValue::Str(s) => s.to_string(),
                PropValue::Int(i) => i.to_string(),
                PropValue::Float(f) => f.to_string(),
                PropValue::Bool(b) => b.to_string(),
                PropValue::Callback(_) => return None,
            };
            Some((name.to_string(), rendered))
        })
        .collect()
}

impl HostAdapter for MemoryHost {
    fn create_element_instance(&mut self, ty: &str, props: &Props) -> HostRef {
        let instance = self.push(Content::Element {
            tag: ty.to_string(),
            attrs: render_attrs(props),
        });
        self.ops.push(HostOp::CreateElement {
            instance,
            tag: ty.to_string(),
        });
        instance
    }

    fn create_text_instance(&mut self, text: &str) -> HostRef {
        let instance = self.push(Content::Text(text.to_string()));
        self.ops.push(HostOp::CreateText {
            instance,
            text: text.to_string(),
        });
        instance
    }

    fn append_child_initial(&mut self, parent: HostRef, child: HostRef) {
        self.attach(parent, child, None);
        self.counts.appended_initial += 1;
        self.ops.push(HostOp::AppendInitial { parent, child });
    }

    fn append_child(&mut self, container: HostRef, child: HostRef) {
        self.attach(container, child, None);
        self.counts.appended += 1;
        self.ops.push(HostOp::Append { container, child });
    }

    fn insert_before(&mut self, child: HostRef, container: HostRef, before: HostRef) {
        self.detach(child);
        let at = self
            .children(container)
            .iter()
            .position(|&c| c == before);
        if at.is_none() {
            tracing::warn!(?container, ?before, "anchor is not a child; appending");
        }
        self.attach(container, child, at);
        self.counts.inserted += 1;
        self.ops.push(HostOp::InsertBefore {
            child,
            container,
            before,
        });
    }

    fn remove_child(&mut self, child: HostRef, container: HostRef) {
        if self.parent(child) == Some(container) {
            self.detach(child);
        } else {
            tracing::warn!(?container, ?child, "removal of a non-child ignored");
        }
        self.counts.removed += 1;
        self.ops.push(HostOp::Remove { child, container });
    }

    fn apply_text_update(&mut self, instance: HostRef, text: &str) {
        if let Some(Instance {
            content: Content::Text(content),
            ..
        }) = self.instances.get_mut(instance.0 as usize)
        {
            *content = text.to_string();
        }
        self.counts.text_updates += 1;
        self.ops.push(HostOp::TextUpdate {
            instance,
            text: text.to_string(),
        });
    }

    fn apply_props_update(&mut self, instance: HostRef, _prev: &Props, next: &Props) {
        if let Some(Instance {
            content: Content::Element { attrs, .. },
            ..
        }) = self.instances.get_mut(instance.0 as usize)
        {
            *attrs = render_attrs(next);
        }
        self.counts.props_updates += 1;
        self.ops.push(HostOp::PropsUpdate { instance });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_before_moves_an_attached_child() {
        let mut host = MemoryHost::new();
        let root = host.container();
        let a = host.create_text_instance("a");
        let b = host.create_text_instance("b");
        let c = host.create_text_instance("c");
        host.append_child(root, a);
        host.append_child(root, b);
        host.append_child(root, c);

        host.insert_before(c, root, a);
        assert_eq!(host.to_markup(), "cab");
        assert_eq!(host.children(root), &[c, a, b]);
        assert_eq!(host.counts().visible(), 4);
    }

    #[test]
    fn markup_renders_attributes_in_order() {
        let mut host = MemoryHost::new();
        let props = trellis_core::element::Element::host("a")
            .attr("href", "/x")
            .attr("class", "link")
            .on("onClick", |_| {})
            .build();
        let a = host.create_element_instance("a", props.props());
        let t = host.create_text_instance("go");
        host.append_child_initial(a, t);
        host.append_child(host.container(), a);

        assert_eq!(host.to_markup(), "<a class=\"link\" href=\"/x\">go</a>");
        assert_eq!(host.find_by_attr("href", "/x"), Some(a));
    }

    #[test]
    fn remove_detaches_subtree_root() {
        let mut host = MemoryHost::new();
        let root = host.container();
        let div = host.create_element_instance("div", &Props::default());
        let t = host.create_text_instance("x");
        host.append_child_initial(div, t);
        host.append_child(root, div);

        host.remove_child(div, root);
        assert_eq!(host.to_markup(), "");
        assert_eq!(host.parent(div), None);
        assert_eq!(host.parent(t), Some(div), "removal leaves the subtree intact");
    }
}
