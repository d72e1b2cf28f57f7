//! Prop values carried by hyperscript nodes and virtual nodes.
//!
//! Props are an ordered map from key to [`Value`]. Most values are plain
//! primitives that end up as attributes or DOM properties, but a few keys carry
//! richer payloads: `style` may hold a [`StyleMap`], `on` holds a map of
//! [`Handler`]s and `singultus/on-render` holds a [`Callback`].

use core::{
    any::{Any, type_name},
    fmt::{self, Debug, Display},
};
use std::rc::Rc;

use indexmap::IndexMap;

use crate::action::EventAction;

/// Ordered mapping of prop keys to values. Iteration follows insertion order.
pub type Props = IndexMap<String, Value>;

/// Ordered mapping of CSS property names (camelCase or kebab-case) to values.
pub type StyleMap = IndexMap<String, String>;

/// Ordered mapping of event types to their handlers, stored under the `on` prop.
pub type Handlers = IndexMap<String, Handler>;

/// A type-erased, reference-counted callback taking a single borrowed argument.
///
/// The argument type is chosen at construction time and checked again at call
/// time, so hyperscript trees stay independent of the host node type. Two
/// callbacks are equal only if they are clones of the same allocation.
#[derive(Clone)]
pub struct Callback(Rc<dyn Any>);

impl Callback {
    /// Wraps a closure receiving `&A`.
    pub fn new<A: 'static>(f: impl Fn(&A) + 'static) -> Self {
        let f: Rc<dyn Fn(&A)> = Rc::new(f);
        Self(Rc::new(f))
    }

    /// Invokes the callback if it was created for argument type `A`.
    ///
    /// Returns `false` without calling anything when the argument type does not match.
    pub fn call<A: 'static>(&self, arg: &A) -> bool {
        self.0
            .downcast_ref::<Rc<dyn Fn(&A)>>()
            .map(|f| f(arg))
            .is_some()
    }

    /// Returns `true` if this callback expects an argument of type `A`.
    #[must_use]
    pub fn accepts<A: 'static>(&self) -> bool {
        self.0.is::<Rc<dyn Fn(&A)>>()
    }

    /// Returns `true` if both callbacks share the same allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }

    /// Stable address of the shared allocation, usable as an identity key.
    #[must_use]
    pub fn addr(&self) -> usize {
        Rc::as_ptr(&self.0).cast::<()>() as usize
    }
}

impl Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({:#x})", type_name::<Self>(), self.addr())
    }
}

impl PartialEq for Callback {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

/// Reaction bound to one event type under the `on` prop.
#[derive(Debug, Clone, PartialEq)]
pub enum Handler {
    /// A plain listener attached directly to the element.
    Listener(Callback),
    /// A serializable action routed through event delegation.
    Action(EventAction),
}

impl From<EventAction> for Handler {
    fn from(value: EventAction) -> Self {
        Self::Action(value)
    }
}

impl From<Callback> for Handler {
    fn from(value: Callback) -> Self {
        Self::Listener(value)
    }
}

/// A single prop value.
///
/// Equality follows what the diff engine needs: primitives compare by value,
/// style maps structurally, callbacks by identity and handler maps entry-wise.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Value {
    /// Absent value. Attributes holding it are removed.
    #[default]
    Null,
    /// Boolean flag.
    Bool(bool),
    /// Numeric value.
    Number(f64),
    /// String value.
    Str(String),
    /// Inline style declarations.
    Style(StyleMap),
    /// Event handlers keyed by event type.
    On(Handlers),
    /// Arbitrary callback (used by `singultus/on-render`).
    Callback(Callback),
}

impl Value {
    /// Returns `true` for [`Value::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Truthiness as the DOM sees it: `null`, `false`, `0`, `NaN` and `""` are falsy.
    #[must_use]
    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Null => false,
            Self::Bool(value) => *value,
            Self::Number(value) => *value != 0.0 && !value.is_nan(),
            Self::Str(value) => !value.is_empty(),
            Self::Style(_) | Self::On(_) | Self::Callback(_) => true,
        }
    }

    /// Borrows the string payload, if any.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Borrows the style map, if any.
    #[must_use]
    pub const fn as_style(&self) -> Option<&StyleMap> {
        match self {
            Self::Style(style) => Some(style),
            _ => None,
        }
    }

    /// Borrows the handler map, if any.
    #[must_use]
    pub const fn as_handlers(&self) -> Option<&Handlers> {
        match self {
            Self::On(handlers) => Some(handlers),
            _ => None,
        }
    }

    /// Borrows the callback, if any.
    #[must_use]
    pub const fn as_callback(&self) -> Option<&Callback> {
        match self {
            Self::Callback(callback) => Some(callback),
            _ => None,
        }
    }
}

impl Display for Value {
    /// Formats the value the way it is written into an attribute.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Number(value) => f.write_str(&format_number(*value)),
            Self::Str(value) => f.write_str(value),
            Self::Style(style) => f.write_str(&style_to_css(style)),
            Self::On(_) => f.write_str("[object Object]"),
            Self::Callback(_) => f.write_str("[function]"),
        }
    }
}

/// Formats a number the way script engines stringify it (`16`, not `16.0`).
#[must_use]
pub fn format_number(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        if value.is_sign_positive() {
            "Infinity".to_string()
        } else {
            "-Infinity".to_string()
        }
    } else if value == 0.0 {
        "0".to_string()
    } else {
        value.to_string()
    }
}

/// Converts a camelCase CSS property name to kebab-case (`fontSize` → `font-size`).
#[must_use]
pub fn to_kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            out.push('-');
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// Serializes a style map as inline CSS text (`color: red; font-size: 16px;`).
#[must_use]
pub fn style_to_css(style: &StyleMap) -> String {
    style
        .iter()
        .map(|(name, value)| format!("{}: {value};", to_kebab_case(name)))
        .collect::<Vec<_>>()
        .join(" ")
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Value {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<usize> for Value {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<StyleMap> for Value {
    fn from(value: StyleMap) -> Self {
        Self::Style(value)
    }
}

impl From<Handlers> for Value {
    fn from(value: Handlers) -> Self {
        Self::On(value)
    }
}

impl From<Callback> for Value {
    fn from(value: Callback) -> Self {
        Self::Callback(value)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
