//! Virtual nodes and the builder turning hyperscript into them.

use core::fmt::{self, Display};
use std::rc::Rc;

use crate::{
    element::{Element, KEY_PROP, Node, ON_RENDER_PROP},
    tag::{Selector, parse_tag},
    value::{Callback, Props, Value, format_number},
};

/// Tag used for virtual elements that group siblings without an owning element.
pub const FRAGMENT_TAG: &str = "fragment";

/// Tags created in the SVG namespace. Descendants of these stay SVG regardless of their own tag.
pub const SVG_TAGS: &[&str] = &[
    "svg",
    "g",
    "path",
    "circle",
    "ellipse",
    "line",
    "rect",
    "polyline",
    "polygon",
    "text",
    "tspan",
    "textPath",
    "marker",
    "defs",
    "clipPath",
    "mask",
    "pattern",
    "image",
    "switch",
    "foreignObject",
    "use",
    "symbol",
    "linearGradient",
    "radialGradient",
    "stop",
    "animate",
    "animateTransform",
    "animateMotion",
];

/// Returns `true` if `tag` is created in the SVG namespace.
#[must_use]
pub fn is_svg_tag(tag: &str) -> bool {
    SVG_TAGS.contains(&tag)
}

/// Stable identity of a child among its siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// String key.
    Str(String),
    /// Integral key.
    Int(i64),
}

impl Key {
    /// Extracts a key from a prop value. Strings and finite numbers qualify.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(key) => Some(Self::Str(key.clone())),
            Value::Number(number) if number.fract() == 0.0 && number.abs() < 9.0e15 => {
                Some(Self::Int(*number as i64))
            }
            Value::Number(number) if number.is_finite() => Some(Self::Str(format_number(*number))),
            _ => None,
        }
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(key) => f.write_str(key),
            Self::Int(key) => write!(f, "{key}"),
        }
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<usize> for Key {
    #[allow(clippy::cast_possible_wrap)]
    fn from(value: usize) -> Self {
        Self::Int(value as i64)
    }
}

/// Text payload of a virtual text node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VText {
    /// The text content.
    pub text: String,
}

/// A virtual element (or fragment, see [`FRAGMENT_TAG`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VElement {
    /// Tag name, already stripped of selector tokens.
    pub tag: String,
    /// Props including the `id`/`class` resolved from the selector.
    pub props: Props,
    /// Children in order.
    pub children: Vec<Rc<VNode>>,
    /// Identity among siblings, taken from `singultus/key`.
    pub key: Option<Key>,
    /// Whether this node lives in an SVG subtree.
    pub is_svg: bool,
}

impl VElement {
    /// Returns `true` for fragments.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.tag == FRAGMENT_TAG
    }

    /// The `singultus/on-render` callback, if set.
    #[must_use]
    pub fn on_render(&self) -> Option<&Callback> {
        self.props.get(ON_RENDER_PROP).and_then(Value::as_callback)
    }
}

/// A normalized virtual node.
///
/// The text/element split makes "text with children" unrepresentable.
#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    /// A text node.
    Text(VText),
    /// An element or fragment.
    Element(VElement),
}

impl VNode {
    /// Creates a text node.
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(VText { text: text.into() })
    }

    /// Borrows the element payload.
    #[must_use]
    pub const fn as_element(&self) -> Option<&VElement> {
        match self {
            Self::Element(element) => Some(element),
            Self::Text(_) => None,
        }
    }

    /// Borrows the text content of a text node.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(&text.text),
            Self::Element(_) => None,
        }
    }

    /// Returns `true` for text nodes.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Returns `true` for fragments.
    #[must_use]
    pub fn is_fragment(&self) -> bool {
        self.as_element().is_some_and(VElement::is_fragment)
    }

    /// The element tag, `None` for text nodes.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.as_element().map(|element| element.tag.as_str())
    }

    /// The sibling key, if any.
    #[must_use]
    pub fn key(&self) -> Option<&Key> {
        self.as_element().and_then(|element| element.key.as_ref())
    }

    /// Whether the node lives in an SVG subtree.
    #[must_use]
    pub fn is_svg(&self) -> bool {
        self.as_element().is_some_and(|element| element.is_svg)
    }

    /// Children of an element, empty for text nodes.
    #[must_use]
    pub fn children(&self) -> &[Rc<Self>] {
        self.as_element()
            .map_or(&[], |element| element.children.as_slice())
    }
}

/// Builds the virtual tree for a hyperscript element.
#[must_use]
pub fn build(element: &Element) -> VNode {
    build_with(element, false)
}

/// Builds the virtual tree for a hyperscript element nested under `parent_is_svg`.
#[must_use]
pub fn build_with(element: &Element, parent_is_svg: bool) -> VNode {
    match element {
        Element::Null | Element::Bool(_) => VNode::text(""),
        Element::Number(number) => VNode::text(format_number(*number)),
        Element::Text(text) => VNode::text(text.clone()),
        Element::Node(node) => VNode::Element(build_node(node, parent_is_svg)),
        Element::Fragment(items) => VNode::Element(VElement {
            tag: FRAGMENT_TAG.to_string(),
            props: Props::new(),
            children: build_children(items, parent_is_svg),
            key: None,
            is_svg: false,
        }),
    }
}

fn build_node(node: &Node, parent_is_svg: bool) -> VElement {
    let selector = parse_tag(&node.tag);
    let is_svg = parent_is_svg || is_svg_tag(&selector.tag_name);
    let props = resolve_props(&selector, node.props.clone());
    let key = props.get(KEY_PROP).and_then(Key::from_value);

    VElement {
        tag: selector.tag_name,
        children: build_children(&node.children, is_svg),
        props,
        key,
        is_svg,
    }
}

fn build_children(children: &[Element], is_svg: bool) -> Vec<Rc<VNode>> {
    children
        .iter()
        .filter(|child| !child.is_null())
        .map(|child| Rc::new(build_with(child, is_svg)))
        .collect()
}

/// Folds the selector's id and classes into the props.
///
/// The id overwrites any `id` prop. Selector classes are prepended to an
/// existing `class` (or, failing that, `className`) value.
#[must_use]
pub fn resolve_props(selector: &Selector, mut props: Props) -> Props {
    if let Some(id) = &selector.id {
        props.insert("id".to_string(), Value::Str(id.clone()));
    }
    if let Some(classes) = selector.class_list() {
        let existing = ["class", "className"]
            .iter()
            .filter_map(|name| props.get(*name))
            .find(|value| value.is_truthy())
            .map(ToString::to_string);
        let all = match existing {
            Some(existing) => format!("{classes} {existing}"),
            None => classes,
        };
        props.insert("class".to_string(), Value::Str(all));
    }
    props
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::h;

    fn element(vnode: &VNode) -> &VElement {
        vnode.as_element().expect("expected an element")
    }

    #[test]
    fn primitives_become_text() {
        assert_eq!(build(&Element::Null), VNode::text(""));
        assert_eq!(build(&Element::Bool(true)), VNode::text(""));
        assert_eq!(build(&Element::from(42)), VNode::text("42"));
        assert_eq!(build(&Element::from("hi")), VNode::text("hi"));
    }

    #[test]
    fn selector_tokens_fold_into_props() {
        let vnode = build(&h("div#main.a.b").prop("class", "extra").into());
        let el = element(&vnode);
        assert_eq!(el.tag, "div");
        assert_eq!(el.props["id"], Value::from("main"));
        assert_eq!(el.props["class"], Value::from("a b extra"));
    }

    #[test]
    fn class_name_is_used_when_class_is_missing() {
        let vnode = build(&h("p.x").prop("className", "y").into());
        assert_eq!(element(&vnode).props["class"], Value::from("x y"));
    }

    #[test]
    fn null_children_are_dropped() {
        let vnode = build(
            &h("div")
                .child(Element::Null)
                .child("Hello")
                .child(Option::<&str>::None)
                .child("World")
                .into(),
        );
        assert_eq!(vnode.children().len(), 2);
        assert_eq!(vnode.children()[1].as_text(), Some("World"));
    }

    #[test]
    fn false_children_keep_their_position() {
        let vnode = build(&h("div").child(false).child("x").into());
        assert_eq!(vnode.children().len(), 2);
        assert_eq!(vnode.children()[0].as_text(), Some(""));
    }

    #[test]
    fn keys_are_extracted() {
        let vnode = build(&h("li").key("a").into());
        assert_eq!(vnode.key(), Some(&Key::from("a")));
        let vnode = build(&h("li").key(3).into());
        assert_eq!(vnode.key(), Some(&Key::Int(3)));
    }

    #[test]
    fn svg_is_sticky_for_descendants() {
        let vnode = build(
            &h("svg")
                .child(h("g").child(h("div").child(h("span"))))
                .into(),
        );
        assert!(vnode.is_svg());
        let div = &vnode.children()[0].children()[0];
        assert_eq!(div.tag(), Some("div"));
        assert!(div.is_svg());
        assert!(div.children()[0].is_svg());
    }

    #[test]
    fn svg_tag_below_html_starts_svg_subtree() {
        let vnode = build(&h("div").child(h("circle")).into());
        assert!(!vnode.is_svg());
        assert!(vnode.children()[0].is_svg());
    }

    #[test]
    fn fragments_keep_parent_svg_flag() {
        let fragment = Element::Fragment(vec![h("path").into(), Element::Null, h("div").into()]);
        let vnode = build_with(&fragment, true);
        assert!(vnode.is_fragment());
        assert_eq!(vnode.children().len(), 2);
        assert!(vnode.children()[1].is_svg());
        assert!(element(&vnode).props.is_empty());
    }
}
