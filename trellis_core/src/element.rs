// Copyright 2026 the Trellis Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Declarative tree descriptions.
//!
//! A [`Markup`] value describes what a subtree should look like *now*. It is
//! cheap to clone: element properties live behind an [`Rc`], so a description
//! can be kept as a root's committed state and compared against the next one
//! without deep copies.
//!
//! Elements are built with [`Element::host`] (a native element such as
//! `"div"`) or [`Element::component`] (a [`Component`] function that renders
//! its own [`Markup`]):
//!
//! ```rust
//! use trellis_core::element::{Element, Markup};
//!
//! let list: Markup = Element::host("ul")
//!     .child(Element::host("li").key("a").child("first"))
//!     .child(Element::host("li").key("b").child("second"))
//!     .into();
//! assert!(matches!(list, Markup::Element(_)));
//! ```

use alloc::collections::BTreeMap;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use crate::error::RenderError;
use crate::state::RenderContext;

/// Identity of a child among its siblings.
///
/// Children with equal keys (and equal element types) are matched across
/// renders and keep their host instances.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(Rc<str>);

impl Key {
    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Key({:?})", &*self.0)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self(Rc::from(value))
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self(Rc::from(value))
    }
}

macro_rules! key_from_integer {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Key {
                fn from(value: $ty) -> Self {
                    Self(Rc::from(value.to_string()))
                }
            }
        )*
    };
}

key_from_integer!(i32, i64, u32, u64, usize);

/// An event or render callback attached to an element as a property.
///
/// Two callbacks compare equal only if they share the same allocation, so a
/// closure recreated on every render is reported as a property change and the
/// attached props seen by the event layer stay fresh.
#[derive(Clone)]
pub struct Callback(Rc<dyn Fn(&dyn Any)>);

impl Callback {
    /// Wraps a closure.
    pub fn new(f: impl Fn(&dyn Any) + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the callback with an opaque event payload.
    pub fn call(&self, event: &dyn Any) {
        (self.0)(event);
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback(..)")
    }
}

/// A single property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    /// A string value.
    Str(Rc<str>),
    /// An integer value.
    Int(i64),
    /// A floating-point value.
    Float(f64),
    /// A boolean value.
    Bool(bool),
    /// A callback, typically an event handler such as `onClick`.
    Callback(Callback),
}

impl PropValue {
    /// Returns the string payload, if this is a [`PropValue::Str`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the callback, if this is a [`PropValue::Callback`].
    #[must_use]
    pub fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(cb) => Some(cb),
            _ => None,
        }
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        Self::Str(Rc::from(value))
    }
}

impl From<i64> for PropValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Callback> for PropValue {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

/// Input of an element: named attributes plus its declarative children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    attrs: BTreeMap<Rc<str>, PropValue>,
    children: Markup,
}

impl Props {
    /// Returns the attribute with the given name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropValue> {
        self.attrs.get(name)
    }

    /// Returns the string attribute with the given name.
    #[must_use]
    pub fn str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropValue::as_str)
    }

    /// Iterates attributes in name order.
    pub fn attrs(&self) -> impl Iterator<Item = (&str, &PropValue)> {
        self.attrs.iter().map(|(k, v)| (&**k, v))
    }

    /// Returns the declarative children.
    #[must_use]
    pub fn children(&self) -> &Markup {
        &self.children
    }

    /// Returns whether the attributes (children excluded) are equal.
    ///
    /// This is the comparison used to decide whether a host element needs an
    /// update; children are diffed separately by the reconciler.
    #[must_use]
    pub fn attrs_eq(&self, other: &Self) -> bool {
        self.attrs == other.attrs
    }
}

/// Signature of a component's render function.
pub type RenderFn = fn(&Props, &mut RenderContext<'_>) -> Result<Markup, RenderError>;

/// A function component.
///
/// Identity is the render function's address, so two [`Component`] values
/// built from the same function are the same element type.
#[derive(Clone, Copy)]
pub struct Component {
    name: &'static str,
    render: RenderFn,
}

impl Component {
    /// Creates a component from a diagnostic name and its render function.
    #[must_use]
    pub const fn new(name: &'static str, render: RenderFn) -> Self {
        Self { name, render }
    }

    /// Returns the diagnostic name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn render(
        &self,
        props: &Props,
        cx: &mut RenderContext<'_>,
    ) -> Result<Markup, RenderError> {
        (self.render)(props, cx)
    }
}

impl PartialEq for Component {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::fn_addr_eq(self.render, other.render)
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self.name)
    }
}

/// What an element renders as.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A native element, identified by tag name.
    Host(Rc<str>),
    /// A function component.
    Component(Component),
}

/// A single declarative element.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
    pub(crate) ty: ElementType,
    pub(crate) key: Option<Key>,
    pub(crate) props: Rc<Props>,
}

impl Element {
    /// Starts building a native element with the given tag name.
    #[must_use]
    pub fn host(tag: &str) -> ElementBuilder {
        ElementBuilder::new(ElementType::Host(Rc::from(tag)))
    }

    /// Starts building a component element.
    #[must_use]
    pub fn component(component: Component) -> ElementBuilder {
        ElementBuilder::new(ElementType::Component(component))
    }

    /// Returns the element type.
    #[must_use]
    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// Returns the key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    /// Returns the element's props.
    #[must_use]
    pub fn props(&self) -> &Props {
        &self.props
    }
}

/// Builder returned by [`Element::host`] and [`Element::component`].
#[derive(Debug)]
pub struct ElementBuilder {
    ty: ElementType,
    key: Option<Key>,
    props: Props,
}

impl ElementBuilder {
    fn new(ty: ElementType) -> Self {
        Self {
            ty,
            key: None,
            props: Props::default(),
        }
    }

    /// Sets the element's key.
    #[must_use]
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets an attribute.
    #[must_use]
    pub fn attr(mut self, name: &str, value: impl Into<PropValue>) -> Self {
        self.props.attrs.insert(Rc::from(name), value.into());
        self
    }

    /// Attaches a callback under the given property name (e.g. `onClick`).
    #[must_use]
    pub fn on(self, name: &str, f: impl Fn(&dyn Any) + 'static) -> Self {
        self.attr(name, Callback::new(f))
    }

    /// Replaces the children.
    #[must_use]
    pub fn children(mut self, children: impl Into<Markup>) -> Self {
        self.props.children = children.into();
        self
    }

    /// Appends a child.
    ///
    /// A single child stays a single child; a second one turns the children
    /// into a [`Markup::List`].
    #[must_use]
    pub fn child(mut self, child: impl Into<Markup>) -> Self {
        let child = child.into();
        self.props.children = match core::mem::take(&mut self.props.children) {
            Markup::Empty => child,
            Markup::List(mut list) => {
                list.push(child);
                Markup::List(list)
            }
            single => Markup::List(alloc::vec![single, child]),
        };
        self
    }

    /// Finishes the element.
    #[must_use]
    pub fn build(self) -> Element {
        Element {
            ty: self.ty,
            key: self.key,
            props: Rc::new(self.props),
        }
    }
}

impl From<ElementBuilder> for Element {
    fn from(builder: ElementBuilder) -> Self {
        builder.build()
    }
}

/// A declarative (sub)tree.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Markup {
    /// Nothing.
    #[default]
    Empty,
    /// A single element.
    Element(Element),
    /// A text node.
    Text(Rc<str>),
    /// An ordered sequence of children.
    List(Vec<Markup>),
}

impl From<Element> for Markup {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

impl From<ElementBuilder> for Markup {
    fn from(builder: ElementBuilder) -> Self {
        Self::Element(builder.build())
    }
}

impl From<&str> for Markup {
    fn from(text: &str) -> Self {
        Self::Text(Rc::from(text))
    }
}

impl From<String> for Markup {
    fn from(text: String) -> Self {
        Self::Text(Rc::from(text))
    }
}

impl From<Vec<Self>> for Markup {
    fn from(list: Vec<Self>) -> Self {
        Self::List(list)
    }
}

impl<T: Into<Self>> From<Option<T>> for Markup {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Empty, Into::into)
    }
}

macro_rules! markup_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Markup {
                fn from(value: $ty) -> Self {
                    Self::Text(Rc::from(value.to_string()))
                }
            }
        )*
    };
}

markup_from_number!(i32, i64, u32, u64, usize);

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn noop(_: &Props, _: &mut RenderContext<'_>) -> Result<Markup, RenderError> {
        Ok(Markup::Empty)
    }

    fn other(_: &Props, _: &mut RenderContext<'_>) -> Result<Markup, RenderError> {
        Ok(Markup::from("other"))
    }

    #[test]
    fn child_accumulates_into_list() {
        let el = Element::host("div").child("a").child("b").build();
        assert_eq!(
            el.props().children(),
            &Markup::List(vec![Markup::from("a"), Markup::from("b")])
        );
    }

    #[test]
    fn single_child_stays_single() {
        let el = Element::host("p").child(7_i32).build();
        assert_eq!(el.props().children(), &Markup::from("7"));
    }

    #[test]
    fn component_identity_is_function_address() {
        let a = Component::new("A", noop);
        let b = Component::new("renamed", noop);
        let c = Component::new("A", other);
        assert_eq!(a, b, "same function is the same type");
        assert_ne!(a, c, "different functions differ");
    }

    #[test]
    fn callbacks_compare_by_allocation() {
        let cb = Callback::new(|_| {});
        assert_eq!(cb.clone(), cb);
        assert_ne!(Callback::new(|_| {}), cb);
    }

    #[test]
    fn attrs_eq_ignores_children() {
        let a = Element::host("div").attr("id", "x").child("1").build();
        let b = Element::host("div").attr("id", "x").child("2").build();
        let c = Element::host("div").attr("id", "y").child("1").build();
        assert!(a.props().attrs_eq(b.props()));
        assert!(!a.props().attrs_eq(c.props()));
    }

    #[test]
    fn integer_keys_stringify() {
        assert_eq!(Key::from(3_u32), Key::from("3"));
    }
}
