//! Prop values and the prop diff shared with host renderers.
//!
//! Props are an ordered mapping of named [`Value`]s plus an ordered list of
//! child [`Element`]s. Children never take part in attribute diffing; they are
//! handled by reconciliation.
//!
//! A prop whose name starts with `on` and whose value is a [`Handler`] is an
//! event listener: `onClick` registers a listener for the `click` event.
//! [`prop_patches`] turns a pair of prop sets into the list of host operations
//! a renderer has to apply, so hosts only decide *how* to apply each patch.

use crate::element::Element;
use crate::hash::FastHashBuilder;
use indexmap::IndexMap;
use std::any::Any;
use std::fmt;
use std::rc::Rc;

/// Name of the prop holding the content of a text element.
pub const TEXT_PROP: &str = "text";

/// Prefix marking a prop as an event listener rather than an attribute.
pub const EVENT_PREFIX: &str = "on";

/// Ordered map of prop names to values.
pub type ValueMap = IndexMap<Rc<str>, Value, FastHashBuilder>;

/// Event handler stored in a prop.
///
/// Handlers compare by identity: two handlers are equal only when they are
/// clones of the same closure. A component that builds a new closure on every
/// render therefore produces a listener patch on every update.
#[derive(Clone)]
pub struct Handler(Rc<dyn Fn(&dyn Any)>);

impl Handler {
    /// Wrap a closure receiving the host's event payload.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&dyn Any) + 'static,
    {
        Self(Rc::new(f))
    }

    /// Invoke the handler with an event payload.
    pub fn call(&self, event: &dyn Any) {
        (self.0)(event);
    }

    /// Whether both handles point at the same closure.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0))
    }
}

/// A single prop value.
///
/// Floats compare by bit pattern, so a `NaN` prop equals itself and an
/// unchanged description never produces a patch.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent or cleared value.
    #[default]
    Null,
    /// Boolean attribute.
    Bool(bool),
    /// Integer attribute.
    Int(i64),
    /// Floating point attribute.
    Float(f64),
    /// String attribute.
    Str(Rc<str>),
    /// Event handler, see [`Handler`].
    Handler(Handler),
    /// Nested mapping, e.g. a style object.
    Map(ValueMap),
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Handler(a), Value::Handler(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// String content, if this is a [`Value::Str`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is a [`Value::Int`].
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Boolean content, if this is a [`Value::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Handler content, if this is a [`Value::Handler`].
    pub fn as_handler(&self) -> Option<&Handler> {
        match self {
            Value::Handler(h) => Some(h),
            _ => None,
        }
    }

    /// Map content, if this is a [`Value::Map`].
    pub fn as_map(&self) -> Option<&ValueMap> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Render the value the way a text node displays it.
    pub fn to_text(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Bool(b) => b.to_string(),
            Value::Int(i) => i.to_string(),
            Value::Float(f) => f.to_string(),
            Value::Str(s) => s.to_string(),
            Value::Handler(_) => "[handler]".to_owned(),
            Value::Map(_) => "[map]".to_owned(),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Value::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(Rc::from(value))
    }
}

impl From<Rc<str>> for Value {
    fn from(value: Rc<str>) -> Self {
        Value::Str(value)
    }
}

impl From<Handler> for Value {
    fn from(value: Handler) -> Self {
        Value::Handler(value)
    }
}

impl From<ValueMap> for Value {
    fn from(value: ValueMap) -> Self {
        Value::Map(value)
    }
}

/// Props of one element: named values and ordered children.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Props {
    values: ValueMap,
    children: Vec<Element>,
}

impl Props {
    /// Empty props.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    /// Insert or replace a named value, keeping its original position.
    pub fn insert(&mut self, name: impl Into<Rc<str>>, value: impl Into<Value>) {
        self.values.insert(name.into(), value.into());
    }

    /// Look up a named value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Iterate named values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (&**k, v))
    }

    /// Number of named values (children excluded).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether there are no named values (children excluded).
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Child elements in order.
    pub fn children(&self) -> &[Element] {
        &self.children
    }

    /// Append a child element.
    pub fn push_child(&mut self, child: Element) {
        self.children.push(child);
    }

    /// Append several child elements.
    pub fn extend_children<I>(&mut self, children: I)
    where
        I: IntoIterator<Item = Element>,
    {
        self.children.extend(children);
    }

    /// Whether both prop sets carry the same named values.
    ///
    /// Children are ignored; reconciliation diffs them separately.
    pub fn attrs_eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

/// Derive the event name of a listener prop (`onClick` -> `click`).
///
/// Returns `None` for names without the [`EVENT_PREFIX`] or with nothing after it.
pub fn event_name(prop: &str) -> Option<String> {
    prop.strip_prefix(EVENT_PREFIX)
        .filter(|rest| !rest.is_empty())
        .map(str::to_lowercase)
}

/// One host operation produced by [`prop_patches`].
#[derive(Clone, Debug, PartialEq)]
pub enum PropPatch<'a> {
    /// Unregister a listener that is gone or replaced.
    RemoveListener {
        /// Event name, already stripped of the prefix.
        event: String,
        /// The previously registered handler.
        handler: &'a Handler,
    },
    /// Clear an attribute that no longer appears in the next props.
    Reset {
        /// Attribute name.
        name: &'a str,
    },
    /// Register a new or replaced listener.
    AddListener {
        /// Event name, already stripped of the prefix.
        event: String,
        /// The handler to register.
        handler: &'a Handler,
    },
    /// Set a new or changed attribute.
    Set {
        /// Attribute name.
        name: &'a str,
        /// The new value.
        value: &'a Value,
    },
}

fn listener<'a>(name: &str, value: &'a Value) -> Option<(String, &'a Handler)> {
    let handler = value.as_handler()?;
    Some((event_name(name)?, handler))
}

/// Compute the host operations turning `prev` into `next`.
///
/// Removals come first (listeners that changed or disappeared, attributes that
/// disappeared), then additions (listeners and attributes that are new or
/// changed). Unchanged entries produce nothing.
pub fn prop_patches<'a>(prev: &'a Props, next: &'a Props) -> Vec<PropPatch<'a>> {
    let mut patches = Vec::new();

    for (name, old) in prev.iter() {
        let new = next.get(name);
        if new == Some(old) {
            continue;
        }
        if let Some((event, handler)) = listener(name, old) {
            patches.push(PropPatch::RemoveListener { event, handler });
        } else if new.is_none() {
            patches.push(PropPatch::Reset { name });
        }
    }

    for (name, new) in next.iter() {
        if prev.get(name) == Some(new) {
            continue;
        }
        if let Some((event, handler)) = listener(name, new) {
            patches.push(PropPatch::AddListener { event, handler });
        } else {
            patches.push(PropPatch::Set { name, value: new });
        }
    }

    patches
}
