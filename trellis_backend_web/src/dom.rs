// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! DOM node management.
//!
//! Maps [`HostRef`] handles to live DOM nodes and applies the reconciler's
//! mutations to them.

use alloc::borrow::Cow;
use alloc::format;
use alloc::vec::Vec;

use trellis_core::element::{PropValue, Props};
use trellis_core::host::{HostAdapter, HostRef};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, Element, Node};

/// A [`HostAdapter`] over a live DOM.
///
/// Instances live in a slab indexed by [`HostRef`]; slot 0 is the container
/// element the tree is mounted into. Slots are never reused, so a handle
/// stays valid for as long as the host exists.
///
/// The slab only grows: [`HostAdapter`] has no destroy call, so removed
/// nodes stay referenced until the host is dropped, and
/// [`host_ref_of`](Self::host_ref_of) scans them too. Recreate the host
/// (and its root) when a long-lived page churns through many nodes.
pub struct DomHost {
    document: Document,
    nodes: Vec<Node>,
}

impl core::fmt::Debug for DomHost {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DomHost")
            .field("document", &"Document")
            .field("nodes_len", &self.nodes.len())
            .finish()
    }
}

impl DomHost {
    /// Creates a host that mounts into `container`, creating new nodes with
    /// `document`.
    #[must_use]
    pub fn new(document: Document, container: Element) -> Self {
        Self {
            document,
            nodes: alloc::vec![container.unchecked_into()],
        }
    }

    /// Returns the handle of the container element.
    #[must_use]
    pub fn container(&self) -> HostRef {
        HostRef(0)
    }

    /// Returns the DOM node behind `instance`.
    #[must_use]
    pub fn node(&self, instance: HostRef) -> Option<&Node> {
        self.nodes.get(instance.0 as usize)
    }

    /// Finds the handle of a node created by this host.
    ///
    /// This is a linear scan; event layers call it once per dispatched event.
    #[must_use]
    pub fn host_ref_of(&self, node: &Node) -> Option<HostRef> {
        let idx = self
            .nodes
            .iter()
            .position(|candidate| candidate.is_same_node(Some(node)))?;
        #[expect(
            clippy::cast_possible_truncation,
            reason = "slot count is bounded by the u32 handles handed out"
        )]
        Some(HostRef(idx as u32))
    }

    fn push(&mut self, node: Node) -> HostRef {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "more than u32::MAX live DOM nodes is not a supported configuration"
        )]
        let instance = HostRef(self.nodes.len() as u32);
        self.nodes.push(node);
        instance
    }

    fn element(&self, instance: HostRef) -> Option<&Element> {
        self.node(instance)?.dyn_ref::<Element>()
    }

    /// Runs a DOM mutation on two known nodes, logging failures.
    fn with_pair(
        &self,
        op: &'static str,
        parent: HostRef,
        child: HostRef,
        f: impl FnOnce(&Node, &Node) -> Result<Node, JsValue>,
    ) {
        let (Some(p), Some(c)) = (self.node(parent), self.node(child)) else {
            tracing::warn!(op, ?parent, ?child, "unknown host instance");
            return;
        };
        if let Err(error) = f(p, c) {
            tracing::warn!(op, ?parent, ?child, ?error, "DOM mutation failed");
        }
    }
}

/// Renders a property as a DOM attribute value.
///
/// Returns `None` when the attribute should be absent: callbacks are event
/// handlers, not attributes, and `false` booleans mean "not set".
#[must_use]
pub fn attribute_value(value: &PropValue) -> Option<Cow<'_, str>> {
    match value {
        PropValue::Str(s) => Some(Cow::Borrowed(&**s)),
        PropValue::Int(i) => Some(Cow::Owned(format!("{i}"))),
        PropValue::Float(v) => Some(Cow::Owned(format!("{v}"))),
        PropValue::Bool(true) => Some(Cow::Borrowed("")),
        PropValue::Bool(false) | PropValue::Callback(_) => None,
    }
}

fn set_attributes(element: &Element, props: &Props) {
    for (name, value) in props.attrs() {
        if let Some(text) = attribute_value(value) {
            if let Err(error) = element.set_attribute(name, &text) {
                tracing::warn!(name, ?error, "set_attribute failed");
            }
        }
    }
}

impl HostAdapter for DomHost {
    fn create_element_instance(&mut self, ty: &str, props: &Props) -> HostRef {
        match self.document.create_element(ty) {
            Ok(element) => {
                set_attributes(&element, props);
                self.push(element.unchecked_into())
            }
            Err(error) => {
                // Keep the tree shape intact with an empty placeholder.
                tracing::warn!(ty, ?error, "create_element failed");
                let placeholder = self.document.create_text_node("");
                self.push(placeholder.unchecked_into())
            }
        }
    }

    fn create_text_instance(&mut self, text: &str) -> HostRef {
        let node = self.document.create_text_node(text);
        self.push(node.unchecked_into())
    }

    fn append_child_initial(&mut self, parent: HostRef, child: HostRef) {
        self.with_pair("append_child_initial", parent, child, |p, c| {
            p.append_child(c)
        });
    }

    fn append_child(&mut self, container: HostRef, child: HostRef) {
        self.with_pair("append_child", container, child, |p, c| p.append_child(c));
    }

    fn insert_before(&mut self, child: HostRef, container: HostRef, before: HostRef) {
        let Some(anchor) = self.node(before) else {
            tracing::warn!(?before, "unknown anchor instance");
            return;
        };
        self.with_pair("insert_before", container, child, |p, c| {
            p.insert_before(c, Some(anchor))
        });
    }

    fn remove_child(&mut self, child: HostRef, container: HostRef) {
        self.with_pair("remove_child", container, child, |p, c| p.remove_child(c));
    }

    fn apply_text_update(&mut self, instance: HostRef, text: &str) {
        match self.node(instance) {
            Some(node) => node.set_text_content(Some(text)),
            None => tracing::warn!(?instance, "text update on unknown instance"),
        }
    }

    fn apply_props_update(&mut self, instance: HostRef, prev: &Props, next: &Props) {
        let Some(element) = self.element(instance) else {
            tracing::warn!(?instance, "props update on a non-element instance");
            return;
        };
        for (name, _) in prev.attrs() {
            let gone = next.get(name).and_then(attribute_value).is_none();
            if gone {
                if let Err(error) = element.remove_attribute(name) {
                    tracing::warn!(name, ?error, "remove_attribute failed");
                }
            }
        }
        for (name, value) in next.attrs() {
            let Some(text) = attribute_value(value) else {
                continue;
            };
            let unchanged = prev.get(name).and_then(attribute_value).as_deref() == Some(&*text);
            if unchanged {
                continue;
            }
            if let Err(error) = element.set_attribute(name, &text) {
                tracing::warn!(name, ?error, "set_attribute failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::element::Callback;

    #[test]
    fn strings_and_numbers_become_attributes() {
        assert_eq!(attribute_value(&PropValue::from("x")).as_deref(), Some("x"));
        assert_eq!(attribute_value(&PropValue::Int(-3)).as_deref(), Some("-3"));
        assert_eq!(attribute_value(&PropValue::Float(1.5)).as_deref(), Some("1.5"));
    }

    #[test]
    fn booleans_toggle_presence() {
        assert_eq!(attribute_value(&PropValue::Bool(true)).as_deref(), Some(""));
        assert_eq!(attribute_value(&PropValue::Bool(false)), None);
    }

    #[test]
    fn callbacks_are_not_attributes() {
        let cb = PropValue::Callback(Callback::new(|_| {}));
        assert_eq!(attribute_value(&cb), None);
    }
}
