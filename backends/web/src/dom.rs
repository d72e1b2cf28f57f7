use core::{
    cell::{Cell, RefCell},
    hash::{Hash, Hasher},
};
use std::{collections::HashMap, rc::Rc};

use js_sys::{Object, Reflect, WeakMap};
use singultus::{Callback, Dom, DomError, DomEvent, NodeKind, Value, value::style_to_css};
use wasm_bindgen::{JsCast, JsValue, closure::Closure};
use web_sys::{CssStyleDeclaration, Document, Element, Event, HtmlInputElement, Node, Window};

use crate::error::{WebError, js_error};

thread_local! {
    static NEXT_NODE_ID: Cell<u32> = const { Cell::new(1) };
    static NODE_IDS: WeakMap = WeakMap::new();
}

/// A live browser node with a stable identity.
///
/// JavaScript objects cannot be hashed, so each node gets a numeric id the
/// first time it is wrapped. Ids live in a `WeakMap` keyed by the node, so
/// later wrappers reuse them and discarded nodes take their id with them.
#[derive(Debug, Clone)]
pub struct WebNode {
    id: u32,
    node: Node,
}

impl WebNode {
    /// Wraps `node`, assigning an id if it has none yet.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(node: Node) -> Self {
        let id = NODE_IDS.with(|ids| {
            let key: &Object = node.as_ref();
            if let Some(id) = ids.get(key).as_f64() {
                return id as u32;
            }
            let id = NEXT_NODE_ID.with(|next| {
                let id = next.get();
                next.set(id.wrapping_add(1));
                id
            });
            ids.set(key, &JsValue::from(id));
            id
        });
        Self { id, node }
    }

    /// The wrapped node.
    #[must_use]
    pub const fn node(&self) -> &Node {
        &self.node
    }

    /// The wrapped node as an element, if it is one.
    #[must_use]
    pub fn element(&self) -> Option<&Element> {
        self.node.dyn_ref::<Element>()
    }
}

impl PartialEq for WebNode {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for WebNode {}

impl Hash for WebNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl From<Node> for WebNode {
    fn from(value: Node) -> Self {
        Self::new(value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ListenerKey {
    node: u32,
    event_type: String,
    capture: bool,
    callback: usize,
}

type ListenerClosure = Closure<dyn FnMut(Event)>;

/// [`Dom`] implementation over the browser document.
#[derive(Debug, Clone)]
pub struct WebDom {
    window: Window,
    document: Document,
    listeners: Rc<RefCell<HashMap<ListenerKey, ListenerClosure>>>,
}

impl WebDom {
    /// Binds to the document of the current window.
    ///
    /// # Errors
    ///
    /// Returns [`WebError::DomUnavailable`] outside of a browser.
    pub fn new() -> Result<Self, WebError> {
        let window = web_sys::window().ok_or(WebError::DomUnavailable)?;
        let document = window.document().ok_or(WebError::DomUnavailable)?;
        Ok(Self {
            window,
            document,
            listeners: Rc::default(),
        })
    }

    /// The underlying document.
    #[must_use]
    pub const fn raw_document(&self) -> &Document {
        &self.document
    }

    /// The underlying window.
    #[must_use]
    pub const fn window(&self) -> &Window {
        &self.window
    }

    /// Wraps the element with the given id.
    #[must_use]
    pub fn element_by_id(&self, id: &str) -> Option<WebNode> {
        self.document
            .get_element_by_id(id)
            .map(|element| WebNode::new(element.into()))
    }

    fn expect_element<'a>(
        &self,
        node: &'a WebNode,
        operation: &'static str,
    ) -> Result<&'a Element, DomError> {
        node.element().ok_or_else(|| DomError::WrongKind {
            operation,
            kind: self.node_kind(node),
        })
    }

    fn style(&self, element: &WebNode) -> Result<CssStyleDeclaration, DomError> {
        self.expect_element(element, "set a style property")?;
        let style = Reflect::get(element.node(), &JsValue::from_str("style")).map_err(js_error)?;
        style
            .dyn_into::<CssStyleDeclaration>()
            .map_err(|_| DomError::Unsupported("element has no inline style".to_string()))
    }
}

fn to_js(value: &Value) -> JsValue {
    match value {
        Value::Null => JsValue::NULL,
        Value::Bool(value) => JsValue::from_bool(*value),
        Value::Number(value) => JsValue::from_f64(*value),
        Value::Str(value) => JsValue::from_str(value),
        Value::Style(style) => JsValue::from_str(&style_to_css(style)),
        Value::On(_) | Value::Callback(_) => JsValue::UNDEFINED,
    }
}

impl Dom for WebDom {
    type Node = WebNode;

    fn create_text_node(&self, text: &str) -> Result<WebNode, DomError> {
        Ok(WebNode::new(self.document.create_text_node(text).into()))
    }

    fn create_element(&self, tag: &str) -> Result<WebNode, DomError> {
        let element = self.document.create_element(tag).map_err(js_error)?;
        Ok(WebNode::new(element.into()))
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<WebNode, DomError> {
        let element = self
            .document
            .create_element_ns(Some(namespace), tag)
            .map_err(js_error)?;
        Ok(WebNode::new(element.into()))
    }

    fn node_kind(&self, node: &WebNode) -> NodeKind {
        match node.node().node_type() {
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            Node::DOCUMENT_NODE => NodeKind::Document,
            _ => NodeKind::Other,
        }
    }

    fn tag_name(&self, node: &WebNode) -> Option<String> {
        node.element().map(Element::local_name)
    }

    fn set_attribute(&self, element: &WebNode, name: &str, value: &str) -> Result<(), DomError> {
        self.expect_element(element, "set an attribute")?
            .set_attribute(name, value)
            .map_err(js_error)
    }

    fn remove_attribute(&self, element: &WebNode, name: &str) -> Result<(), DomError> {
        self.expect_element(element, "remove an attribute")?
            .remove_attribute(name)
            .map_err(js_error)
    }

    fn get_attribute(&self, element: &WebNode, name: &str) -> Option<String> {
        element.element()?.get_attribute(name)
    }

    fn set_property(&self, element: &WebNode, name: &str, value: &Value) -> Result<(), DomError> {
        self.expect_element(element, "set a property")?;
        Reflect::set(element.node(), &JsValue::from_str(name), &to_js(value))
            .map_err(js_error)
            .map(|_| ())
    }

    fn set_style_property(&self, element: &WebNode, name: &str, value: &str) -> Result<(), DomError> {
        let style = self.style(element)?;
        if value.is_empty() {
            style.remove_property(name).map_err(js_error)?;
            Ok(())
        } else {
            style.set_property(name, value).map_err(js_error)
        }
    }

    fn set_inner_html(&self, element: &WebNode, html: &str) -> Result<(), DomError> {
        self.expect_element(element, "set inner HTML")?
            .set_inner_html(html);
        Ok(())
    }

    fn set_text_content(&self, node: &WebNode, text: &str) -> Result<(), DomError> {
        node.node().set_text_content(Some(text));
        Ok(())
    }

    fn append_child(&self, parent: &WebNode, child: &WebNode) -> Result<(), DomError> {
        parent
            .node()
            .append_child(child.node())
            .map_err(js_error)
            .map(|_| ())
    }

    fn insert_before(
        &self,
        parent: &WebNode,
        child: &WebNode,
        reference: Option<&WebNode>,
    ) -> Result<(), DomError> {
        parent
            .node()
            .insert_before(child.node(), reference.map(WebNode::node))
            .map_err(js_error)
            .map(|_| ())
    }

    fn remove_child(&self, parent: &WebNode, child: &WebNode) -> Result<(), DomError> {
        parent
            .node()
            .remove_child(child.node())
            .map_err(js_error)
            .map(|_| ())
    }

    fn replace_child(
        &self,
        parent: &WebNode,
        new_child: &WebNode,
        old_child: &WebNode,
    ) -> Result<(), DomError> {
        parent
            .node()
            .replace_child(new_child.node(), old_child.node())
            .map_err(js_error)
            .map(|_| ())
    }

    fn parent_node(&self, node: &WebNode) -> Option<WebNode> {
        node.node().parent_node().map(WebNode::new)
    }

    fn child_nodes(&self, node: &WebNode) -> Vec<WebNode> {
        let list = node.node().child_nodes();
        (0..list.length())
            .filter_map(|index| list.get(index))
            .map(WebNode::new)
            .collect()
    }

    fn first_child(&self, node: &WebNode) -> Option<WebNode> {
        node.node().first_child().map(WebNode::new)
    }

    fn parent_element(&self, node: &WebNode) -> Option<WebNode> {
        node.node()
            .parent_element()
            .map(|element| WebNode::new(element.into()))
    }

    fn document(&self) -> WebNode {
        WebNode::new(self.document.clone().into())
    }

    fn body(&self) -> Option<WebNode> {
        self.document
            .body()
            .map(|body| WebNode::new(body.into()))
    }

    fn add_event_listener(
        &self,
        target: &WebNode,
        event_type: &str,
        listener: &Callback,
        capture: bool,
    ) -> Result<(), DomError> {
        let key = ListenerKey {
            node: target.id,
            event_type: event_type.to_string(),
            capture,
            callback: listener.addr(),
        };
        if self.listeners.borrow().contains_key(&key) {
            return Ok(());
        }

        let callback = listener.clone();
        let closure = Closure::<dyn FnMut(Event)>::new(move |event: Event| {
            let Some(target) = event.target().and_then(|target| target.dyn_into::<Node>().ok())
            else {
                return;
            };
            let raw = event.clone();
            let dom_event = DomEvent::new(event.type_(), WebNode::new(target), event.time_stamp())
                .with_prevent_default(move || raw.prevent_default());
            if !callback.call(&dom_event) {
                tracing::warn!(event = dom_event.event_type(), "listener expects a different event type");
            }
        });

        target
            .node()
            .add_event_listener_with_callback_and_bool(
                event_type,
                closure.as_ref().unchecked_ref(),
                capture,
            )
            .map_err(js_error)?;
        self.listeners.borrow_mut().insert(key, closure);
        Ok(())
    }

    fn remove_event_listener(
        &self,
        target: &WebNode,
        event_type: &str,
        listener: &Callback,
        capture: bool,
    ) -> Result<(), DomError> {
        let key = ListenerKey {
            node: target.id,
            event_type: event_type.to_string(),
            capture,
            callback: listener.addr(),
        };
        let Some(closure) = self.listeners.borrow_mut().remove(&key) else {
            return Ok(());
        };
        target
            .node()
            .remove_event_listener_with_callback_and_bool(
                event_type,
                closure.as_ref().unchecked_ref(),
                capture,
            )
            .map_err(js_error)
    }

    fn input_value(&self, node: &WebNode) -> Option<String> {
        node.node()
            .dyn_ref::<HtmlInputElement>()
            .map(HtmlInputElement::value)
    }

    fn input_checked(&self, node: &WebNode) -> Option<bool> {
        node.node()
            .dyn_ref::<HtmlInputElement>()
            .map(HtmlInputElement::checked)
    }

    fn now(&self) -> f64 {
        js_sys::Date::now()
    }
}
