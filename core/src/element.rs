//! Hyperscript input: the lightweight description of UI structure handed to the renderer.
//!
//! An [`Element`] is either a primitive (rendered as text), a [`Node`] (a tag
//! with props and children) or a fragment of sibling elements. Nodes are
//! usually assembled with [`h`]:
//!
//! ```
//! use singultus_core::{h, Element};
//!
//! let list: Element = h("ul.todo")
//!     .child(h("li").key("a").child("First"))
//!     .child(h("li").key("b").child("Second"))
//!     .into();
//! ```

use serde_json::Value as Json;

use crate::{
    EventAction,
    value::{Callback, Handler, Handlers, Props, StyleMap, Value},
    vnode::Key,
};

/// Prefix reserved for engine-private prop keys.
pub const RESERVED_PREFIX: &str = "singultus/";
/// Prop key holding the sibling identity used by the diff engine.
pub const KEY_PROP: &str = "singultus/key";
/// Prop key holding the callback invoked with the live element after it is rendered.
pub const ON_RENDER_PROP: &str = "singultus/on-render";

/// A hyperscript element. Never mutated by the engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Element {
    /// Renders nothing. Dropped entirely when it appears as a child.
    #[default]
    Null,
    /// Renders nothing but still occupies a position at the top level.
    Bool(bool),
    /// Rendered as its textual form.
    Number(f64),
    /// Rendered as a text node.
    Text(String),
    /// A tagged node.
    Node(Node),
    /// Adjacent siblings without an owning element.
    Fragment(Vec<Element>),
}

impl Element {
    /// Returns `true` for [`Element::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Converts the literal array-based JSON form into an element.
    ///
    /// An array whose first item is a string is a node; a plain object in the
    /// second slot holds its props. Other arrays are fragments. Objects found
    /// anywhere else are rendered as their JSON text.
    #[must_use]
    pub fn from_json(value: &Json) -> Self {
        match value {
            Json::Null => Self::Null,
            Json::Bool(value) => Self::Bool(*value),
            Json::Number(number) => number
                .as_f64()
                .map_or_else(|| Self::Text(number.to_string()), Self::Number),
            Json::String(text) => Self::Text(text.clone()),
            Json::Array(items) => match items.split_first() {
                Some((Json::String(tag), rest)) => {
                    let (props, children) = match rest.split_first() {
                        Some((Json::Object(props), children)) => (props_from_json(props), children),
                        _ => (Props::new(), rest),
                    };
                    Self::Node(Node {
                        tag: tag.clone(),
                        props,
                        children: children.iter().map(Self::from_json).collect(),
                    })
                }
                _ => Self::Fragment(items.iter().map(Self::from_json).collect()),
            },
            Json::Object(_) => Self::Text(value.to_string()),
        }
    }
}

fn props_from_json(map: &serde_json::Map<String, Json>) -> Props {
    map.iter()
        .map(|(key, value)| {
            let value = match (key.as_str(), value) {
                ("style", Json::Object(style)) => Value::Style(
                    style
                        .iter()
                        .map(|(name, value)| (name.clone(), json_to_text(value)))
                        .collect(),
                ),
                ("on", Json::Object(handlers)) => Value::On(
                    handlers
                        .iter()
                        .filter_map(|(event, action)| {
                            serde_json::from_value::<EventAction>(action.clone())
                                .ok()
                                .map(|action| (event.clone(), Handler::Action(action)))
                        })
                        .collect(),
                ),
                _ => value_from_json(value),
            };
            (key.clone(), value)
        })
        .collect()
}

fn value_from_json(value: &Json) -> Value {
    match value {
        Json::Null => Value::Null,
        Json::Bool(value) => Value::Bool(*value),
        Json::Number(number) => number
            .as_f64()
            .map_or_else(|| Value::Str(number.to_string()), Value::Number),
        Json::String(text) => Value::Str(text.clone()),
        Json::Array(_) | Json::Object(_) => Value::Str(value.to_string()),
    }
}

fn json_to_text(value: &Json) -> String {
    match value {
        Json::String(text) => text.clone(),
        Json::Number(number) => number
            .as_f64()
            .map_or_else(|| number.to_string(), crate::value::format_number),
        other => other.to_string(),
    }
}

/// A tagged hyperscript node: selector-like tag, props and children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Node {
    /// Tag string, optionally carrying `#id` and `.class` tokens.
    pub tag: String,
    /// Props in insertion order.
    pub props: Props,
    /// Child elements.
    pub children: Vec<Element>,
}

/// Starts building a node for the given selector-like tag.
pub fn h(tag: impl Into<String>) -> Node {
    Node {
        tag: tag.into(),
        props: Props::new(),
        children: Vec::new(),
    }
}

impl Node {
    /// Sets a prop.
    #[must_use]
    pub fn prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Sets a prop to the textual form of `value`.
    #[must_use]
    pub fn attr(self, name: impl Into<String>, value: impl ToString) -> Self {
        self.prop(name, value.to_string())
    }

    /// Sets the `id` prop.
    #[must_use]
    pub fn id(self, id: impl Into<String>) -> Self {
        self.prop("id", id.into())
    }

    /// Sets the `class` prop.
    #[must_use]
    pub fn class(self, class: impl Into<String>) -> Self {
        self.prop("class", class.into())
    }

    /// Adds one declaration to the `style` map, replacing a string style if one was set.
    #[must_use]
    pub fn style(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        let entry = self
            .props
            .entry("style".to_string())
            .or_insert_with(|| Value::Style(StyleMap::new()));
        if !matches!(entry, Value::Style(_)) {
            *entry = Value::Style(StyleMap::new());
        }
        if let Value::Style(style) = entry {
            style.insert(name.into(), value.to_string());
        }
        self
    }

    /// Binds a handler for an event type under the `on` prop.
    #[must_use]
    pub fn handler(mut self, event: impl Into<String>, handler: impl Into<Handler>) -> Self {
        let entry = self
            .props
            .entry("on".to_string())
            .or_insert_with(|| Value::On(Handlers::new()));
        if !matches!(entry, Value::On(_)) {
            *entry = Value::On(Handlers::new());
        }
        if let Value::On(handlers) = entry {
            handlers.insert(event.into(), handler.into());
        }
        self
    }

    /// Attaches a plain listener. `E` is the host's event type, e.g. `DomEvent<NodeId>`.
    #[must_use]
    pub fn on<E: 'static>(self, event: impl Into<String>, listener: impl Fn(&E) + 'static) -> Self {
        self.handler(event, Handler::Listener(Callback::new(listener)))
    }

    /// Attaches a delegated, serializable action.
    #[must_use]
    pub fn action(self, event: impl Into<String>, action: EventAction) -> Self {
        self.handler(event, Handler::Action(action))
    }

    /// Sets the sibling identity used during child reconciliation.
    #[must_use]
    pub fn key(self, key: impl Into<Key>) -> Self {
        let value = match key.into() {
            Key::Str(key) => Value::Str(key),
            Key::Int(key) => Value::from(key),
        };
        self.prop(KEY_PROP, value)
    }

    /// Registers the callback run with the live element after creation and after updates.
    /// `N` is the host's node handle type.
    #[must_use]
    pub fn on_render<N: 'static>(self, hook: impl Fn(&N) + 'static) -> Self {
        self.prop(ON_RENDER_PROP, Callback::new(hook))
    }

    /// Appends one child.
    #[must_use]
    pub fn child(mut self, child: impl Into<Element>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Appends several children.
    #[must_use]
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Element>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }
}

impl From<Node> for Element {
    fn from(value: Node) -> Self {
        Self::Node(value)
    }
}

impl From<&str> for Element {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Element {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for Element {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Element {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i32> for Element {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<u32> for Element {
    fn from(value: u32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<usize> for Element {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: usize) -> Self {
        Self::Number(value as f64)
    }
}

impl From<()> for Element {
    fn from((): ()) -> Self {
        Self::Null
    }
}

impl<T: Into<Self>> From<Option<T>> for Element {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Self>> From<Vec<T>> for Element {
    fn from(value: Vec<T>) -> Self {
        Self::Fragment(value.into_iter().map(Into::into).collect())
    }
}

impl From<Json> for Element {
    fn from(value: Json) -> Self {
        Self::from_json(&value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_node_with_props_and_children() {
        let element = Element::from_json(&json!(["div#main", { "class": "box" }, "Hello", null]));
        let Element::Node(node) = element else {
            panic!("expected a node");
        };
        assert_eq!(node.tag, "div#main");
        assert_eq!(node.props.get("class"), Some(&Value::from("box")));
        assert_eq!(node.children, vec![Element::from("Hello"), Element::Null]);
    }

    #[test]
    fn json_node_without_props_treats_rest_as_children() {
        let Element::Node(node) = Element::from_json(&json!(["ul", ["li", "a"], ["li", "b"]])) else {
            panic!("expected a node");
        };
        assert!(node.props.is_empty());
        assert_eq!(node.children.len(), 2);
    }

    #[test]
    fn json_array_without_tag_is_fragment() {
        let element = Element::from_json(&json!([["h1", "Title"], ["p", "Body"]]));
        assert!(matches!(element, Element::Fragment(ref items) if items.len() == 2));
    }

    #[test]
    fn json_style_and_actions() {
        let Element::Node(node) = Element::from_json(&json!([
            "button",
            {
                "style": { "fontSize": 16, "color": "red" },
                "on": { "click": { "type": "CLICKED" }, "bogus": 3 }
            }
        ])) else {
            panic!("expected a node");
        };

        let style = node.props["style"].as_style().unwrap();
        assert_eq!(style["fontSize"], "16");
        assert_eq!(style["color"], "red");

        let handlers = node.props["on"].as_handlers().unwrap();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers["click"], Handler::Action(EventAction::new("CLICKED")));
    }

    #[test]
    fn json_object_child_becomes_text() {
        let element = Element::from_json(&json!({ "a": 1 }));
        assert_eq!(element, Element::Text("{\"a\":1}".to_string()));
    }

    #[test]
    fn builder_merges_style_and_handlers() {
        let node = h("div")
            .prop("style", "color: blue")
            .style("color", "red")
            .handler("click", EventAction::new("A"))
            .handler("input", EventAction::new("B"));
        assert_eq!(node.props["style"].as_style().unwrap()["color"], "red");
        assert_eq!(node.props["on"].as_handlers().unwrap().len(), 2);
    }

    #[test]
    fn key_is_stored_under_reserved_prop() {
        let node = h("li").key(7);
        assert_eq!(node.props.get(KEY_PROP), Some(&Value::Number(7.0)));
    }
}
