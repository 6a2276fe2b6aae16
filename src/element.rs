//! The description model: immutable elements the caller builds for each pass.
//!
//! An [`Element`] pairs an [`ElementType`] with shared [`Props`]. Cloning an
//! element is cheap, which lets fibers keep the props of the pass they were
//! built from without copying.
//!
//! Type identity drives reconciliation, so each variant of [`ElementType`] has a
//! precise notion of equality:
//! - host tags compare by string value,
//! - function components compare by identity of their [`FunctionComponent`],
//! - class components compare by the Rust type implementing [`Component`],
//! - `Text` and `Fragment` are equal to themselves.

use crate::hooks::{SetState, use_state};
use crate::props::{Props, TEXT_PROP, Value};
use std::any::TypeId;
use std::fmt;
use std::rc::Rc;

type RenderFn = dyn Fn(&Props) -> Element;

/// A component function with a stable identity.
///
/// Create it once and reuse the handle across passes; a second
/// `FunctionComponent::new` with the same closure is a different type as far
/// as reconciliation is concerned and replaces the first one's subtree.
#[derive(Clone)]
pub struct FunctionComponent {
    name: &'static str,
    render: Rc<RenderFn>,
}

impl FunctionComponent {
    /// Wrap a render function. `name` is used only in logs and errors.
    pub fn new<F>(name: &'static str, render: F) -> Self
    where
        F: Fn(&Props) -> Element + 'static,
    {
        Self {
            name,
            render: Rc::new(render),
        }
    }

    /// Name given at construction.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Element with this component as its type.
    pub fn element(&self, props: Props) -> Element {
        Element::new(ElementType::Function(self.clone()), props)
    }

    pub(crate) fn call(&self, props: &Props) -> Element {
        (self.render)(props)
    }
}

impl PartialEq for FunctionComponent {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.render), Rc::as_ptr(&other.render))
    }
}

impl fmt::Debug for FunctionComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FunctionComponent").field(&self.name).finish()
    }
}

/// A stateful component type.
///
/// Each render constructs a fresh instance from the props; the state lives in a
/// hook slot of the component's fiber, so it survives across passes even
/// though the instance does not.
pub trait Component: 'static {
    /// Local state kept across passes.
    type State: Clone + 'static;

    /// Construct an instance for this render.
    fn create(props: &Props) -> Self;

    /// State used on first mount.
    fn initial_state(&self) -> Self::State;

    /// Produce the child element.
    fn render(&self, props: &Props, state: &Self::State, set_state: &SetState<Self::State>)
    -> Element;
}

/// Type-erased handle to a [`Component`] implementation.
#[derive(Clone)]
pub struct ClassComponent {
    type_id: TypeId,
    name: &'static str,
    render: Rc<RenderFn>,
}

impl ClassComponent {
    /// Handle for the component type `C`.
    pub fn of<C: Component>() -> Self {
        Self {
            type_id: TypeId::of::<C>(),
            name: std::any::type_name::<C>(),
            render: Rc::new(render_class::<C>),
        }
    }

    /// Rust type name of the component.
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn call(&self, props: &Props) -> Element {
        (self.render)(props)
    }
}

fn render_class<C: Component>(props: &Props) -> Element {
    let instance = C::create(props);
    let (state, set_state) = use_state(instance.initial_state());
    instance.render(props, &state, &set_state)
}

impl PartialEq for ClassComponent {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl fmt::Debug for ClassComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassComponent").field(&self.name).finish()
    }
}

/// What an element describes.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementType {
    /// A host node with the given tag.
    Host(Rc<str>),
    /// A host text node; its content is the [`TEXT_PROP`] prop.
    Text,
    /// Groups children without a host node of its own.
    Fragment,
    /// A function component.
    Function(FunctionComponent),
    /// A stateful component.
    Class(ClassComponent),
}

impl ElementType {
    /// Whether fibers of this type own a host node.
    pub fn is_host(&self) -> bool {
        matches!(self, ElementType::Host(_) | ElementType::Text)
    }

    /// Short label used in logs and errors.
    pub fn label(&self) -> &str {
        match self {
            ElementType::Host(tag) => tag,
            ElementType::Text => "#text",
            ElementType::Fragment => "#fragment",
            ElementType::Function(f) => f.name(),
            ElementType::Class(c) => c.name(),
        }
    }
}

/// Immutable description of one node for one pass.
#[derive(Clone, Debug)]
pub struct Element {
    ty: ElementType,
    props: Rc<Props>,
}

impl Element {
    /// Element of any type.
    pub fn new(ty: ElementType, props: Props) -> Self {
        Self {
            ty,
            props: Rc::new(props),
        }
    }

    /// Host element with the given tag and no props.
    pub fn host(tag: impl Into<Rc<str>>) -> Self {
        Self::new(ElementType::Host(tag.into()), Props::new())
    }

    /// Text element.
    pub fn text(content: impl Into<Value>) -> Self {
        let content = content.into();
        let content = match content {
            Value::Str(_) => content,
            other => Value::from(other.to_text()),
        };
        Self::new(ElementType::Text, Props::new().with(TEXT_PROP, content))
    }

    /// Fragment grouping `children`.
    pub fn fragment<I>(children: I) -> Self
    where
        I: IntoIterator<Item = Element>,
    {
        let mut props = Props::new();
        props.extend_children(children);
        Self::new(ElementType::Fragment, props)
    }

    /// Element rendering the class component `C`.
    pub fn class<C: Component>(props: Props) -> Self {
        Self::new(ElementType::Class(ClassComponent::of::<C>()), props)
    }

    /// Builder-style prop.
    pub fn prop(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        Rc::make_mut(&mut self.props).insert(name, value);
        self
    }

    /// Builder-style child. Anything convertible to an element is accepted, so
    /// strings and numbers become text children.
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        Rc::make_mut(&mut self.props).push_child(child.into());
        self
    }

    /// Builder-style optional child; `None` adds nothing.
    pub fn maybe_child(self, child: Option<impl Into<Element>>) -> Self {
        match child {
            Some(child) => self.child(child),
            None => self,
        }
    }

    /// Builder-style children.
    pub fn children<I, E>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: Into<Element>,
    {
        Rc::make_mut(&mut self.props).extend_children(children.into_iter().map(Into::into));
        self
    }

    /// The element type.
    pub fn ty(&self) -> &ElementType {
        &self.ty
    }

    /// The element props.
    pub fn props(&self) -> &Props {
        &self.props
    }

    pub(crate) fn shared_props(&self) -> Rc<Props> {
        Rc::clone(&self.props)
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ty == other.ty && (Rc::ptr_eq(&self.props, &other.props) || self.props == other.props)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Element::text(value)
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Element::text(value)
    }
}

impl From<i64> for Element {
    fn from(value: i64) -> Self {
        Element::text(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Element::text(value)
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Element::text(value)
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Element::text(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_types_compare_by_tag() {
        assert_eq!(Element::host("div").ty(), Element::host("div").ty());
        assert_ne!(Element::host("div").ty(), Element::host("span").ty());
    }

    #[test]
    fn function_components_compare_by_identity() {
        let a = FunctionComponent::new("A", |_| Element::text("a"));
        let a2 = a.clone();
        let b = FunctionComponent::new("A", |_| Element::text("a"));
        assert_eq!(a, a2);
        assert_ne!(a, b);
    }

    #[test]
    fn non_string_text_is_coerced() {
        let el: Element = 42.into();
        assert_eq!(el.ty(), &ElementType::Text);
        assert_eq!(el.props().get(TEXT_PROP), Some(&Value::from("42")));
    }

    #[test]
    fn builder_keeps_child_order() {
        let el = Element::host("ul")
            .prop("id", "list")
            .child(Element::host("li"))
            .child("text")
            .maybe_child(None::<Element>)
            .children([Element::host("li"), Element::host("li")]);
        let labels: Vec<_> = el.props().children().iter().map(|c| c.ty().label()).collect();
        assert_eq!(labels, ["li", "#text", "li", "li"]);
    }
}
