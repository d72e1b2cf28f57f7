//! Applying props to live elements.
//!
//! Each prop key is classified once ([`classify`]) and the class decides
//! whether it becomes an attribute, a live property, style declarations,
//! event bindings, or nothing at all.

use singultus_core::{
    Dom, DomError, Handler, Props, RESERVED_PREFIX, Value, value::to_kebab_case,
};

use crate::events::EventSystem;

/// Attributes written as `name="name"` when truthy and removed otherwise.
pub const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "autofocus",
    "autoplay",
    "async",
    "checked",
    "controls",
    "defer",
    "disabled",
    "hidden",
    "loop",
    "multiple",
    "muted",
    "open",
    "readonly",
    "required",
    "reversed",
    "selected",
    "scoped",
    "seamless",
    "itemScope",
    "noValidate",
    "allowFullscreen",
    "formNoValidate",
    "default",
    "capture",
    "autocomplete",
];

/// Keys assigned as live properties on HTML elements.
pub const DOM_PROPERTIES: &[&str] = &[
    "value",
    "checked",
    "selected",
    "defaultValue",
    "defaultChecked",
    "defaultSelected",
    "innerHTML",
    "textContent",
    "innerText",
    "htmlFor",
    "className",
    "tabIndex",
    "contentEditable",
    "draggable",
    "spellcheck",
    "translate",
];

/// How a prop key is applied to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropKind {
    /// Inline style, either CSS text or per-property declarations.
    Style,
    /// Raw markup.
    InnerHtml,
    /// Escaped text content.
    TextContent,
    /// The `on` handler map.
    Events,
    /// Engine-private `singultus/` keys.
    Reserved,
    /// `class` or `className`.
    Class,
    /// `htmlFor` on a `<label>`.
    LabelFor,
    /// A live DOM property.
    Property,
    /// An HTML boolean attribute.
    BooleanAttribute,
    /// A `data-*` or `aria-*` attribute.
    DataOrAria,
    /// Any other attribute.
    Attribute,
}

/// Classifies a prop key. The first matching rule wins.
#[must_use]
pub fn classify(key: &str, value: &Value, is_svg: bool, is_label: bool) -> PropKind {
    match key {
        "style" => PropKind::Style,
        "innerHTML" => PropKind::InnerHtml,
        "textContent" => PropKind::TextContent,
        "on" if matches!(value, Value::On(_)) => PropKind::Events,
        _ if key.starts_with(RESERVED_PREFIX) => PropKind::Reserved,
        "class" | "className" => PropKind::Class,
        "htmlFor" if is_label => PropKind::LabelFor,
        _ if !is_svg && DOM_PROPERTIES.contains(&key) => PropKind::Property,
        _ if BOOLEAN_ATTRIBUTES.contains(&key) => PropKind::BooleanAttribute,
        _ if key.starts_with("data-") || key.starts_with("aria-") => PropKind::DataOrAria,
        _ => PropKind::Attribute,
    }
}

/// Writes props onto elements, registering listeners and delegated actions on the way.
#[derive(Debug)]
pub struct AttributeReconciler<'a, D: Dom> {
    dom: &'a D,
    events: &'a EventSystem<D>,
}

impl<'a, D: Dom> AttributeReconciler<'a, D> {
    /// Creates a reconciler writing through `dom` and registering actions with `events`.
    pub const fn new(dom: &'a D, events: &'a EventSystem<D>) -> Self {
        Self { dom, events }
    }

    /// Applies every prop in insertion order.
    ///
    /// # Errors
    ///
    /// Propagates the first DOM failure; props before it stay applied.
    pub fn apply(&self, element: &D::Node, props: &Props, is_svg: bool) -> Result<(), DomError> {
        let is_label = self.dom.tag_name(element).as_deref() == Some("label");
        for (key, value) in props {
            self.apply_one(element, key, value, is_svg, is_label)?;
        }
        Ok(())
    }

    fn apply_one(
        &self,
        element: &D::Node,
        key: &str,
        value: &Value,
        is_svg: bool,
        is_label: bool,
    ) -> Result<(), DomError> {
        let dom = self.dom;
        match classify(key, value, is_svg, is_label) {
            PropKind::Style => match value {
                Value::Str(css) => dom.set_attribute(element, "style", css)?,
                Value::Style(style) => {
                    for (name, value) in style {
                        dom.set_style_property(element, &to_kebab_case(name), value)?;
                    }
                }
                _ => {}
            },
            PropKind::InnerHtml => dom.set_inner_html(element, &value.to_string())?,
            PropKind::TextContent => dom.set_text_content(element, &value.to_string())?,
            PropKind::Events => {
                if let Value::On(handlers) = value {
                    for (event_type, handler) in handlers {
                        match handler {
                            Handler::Listener(listener) => {
                                dom.add_event_listener(element, event_type, listener, false)?;
                            }
                            Handler::Action(action) => {
                                self.events
                                    .attach_action(element, event_type, action.clone())?;
                            }
                        }
                    }
                }
            }
            PropKind::Reserved => {}
            PropKind::Class => {
                if value.is_truthy() {
                    if is_svg {
                        dom.set_attribute(element, "class", &value.to_string())?;
                    } else {
                        dom.set_property(element, "className", &Value::Str(value.to_string()))?;
                    }
                }
            }
            PropKind::LabelFor => {
                dom.set_property(element, "htmlFor", &Value::Str(value.to_string()))?;
            }
            PropKind::Property => dom.set_property(element, key, value)?,
            PropKind::BooleanAttribute => {
                if value.is_truthy() {
                    dom.set_attribute(element, key, key)?;
                } else {
                    dom.remove_attribute(element, key)?;
                }
            }
            PropKind::DataOrAria | PropKind::Attribute => {
                if value.is_null() {
                    dom.remove_attribute(element, key)?;
                } else {
                    dom.set_attribute(element, key, &value.to_string())?;
                }
            }
        }
        Ok(())
    }

    /// Moves an element from `old` props to `new` props.
    ///
    /// Old handlers are always detached first, then keys missing from `new`
    /// are cleared, then `new` is applied in full.
    ///
    /// # Errors
    ///
    /// Propagates the first DOM failure.
    pub fn update(
        &self,
        element: &D::Node,
        old: &Props,
        new: &Props,
        is_svg: bool,
    ) -> Result<(), DomError> {
        let dom = self.dom;

        if let Some(Value::On(handlers)) = old.get("on") {
            for (event_type, handler) in handlers {
                match handler {
                    Handler::Listener(listener) => {
                        dom.remove_event_listener(element, event_type, listener, false)?;
                    }
                    Handler::Action(_) => self.events.remove_action(element, event_type),
                }
            }
        }

        for key in old.keys() {
            if new.contains_key(key) || key == "on" || key.starts_with(RESERVED_PREFIX) {
                continue;
            }
            match key.as_str() {
                "style" => dom.set_attribute(element, "style", "")?,
                "class" | "className" if is_svg => dom.remove_attribute(element, "class")?,
                "class" | "className" => {
                    dom.set_property(element, "className", &Value::Str(String::new()))?;
                }
                _ if !is_svg && DOM_PROPERTIES.contains(&key.as_str()) => {
                    dom.set_property(element, key, &Value::Str(String::new()))?;
                }
                _ => dom.remove_attribute(element, key)?,
            }
        }

        self.apply(element, new, is_svg)
    }
}
