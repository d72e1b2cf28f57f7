use core::cell::{RefCell, RefMut};
use std::{rc::Rc, time::Instant};

use singultus_core::{
    Callback, Dom, DomError, DomEvent, NodeKind, Value, value::to_kebab_case,
};

use crate::node::{
    ElementData, Listener, NodeData, NodeEntry, NodeId, write_children, write_html, write_text,
};

/// Events that do not bubble after reaching their target.
const NON_BUBBLING_EVENTS: &[&str] = &["focus", "blur", "load", "mouseenter", "mouseleave"];

#[derive(Debug)]
enum Clock {
    Monotonic(Instant),
    Fixed(f64),
}

#[derive(Debug)]
struct Document {
    nodes: Vec<NodeEntry>,
    root: NodeId,
    body: NodeId,
    mutations: usize,
    fail_next: bool,
    clock: Clock,
}

impl Document {
    fn new() -> Self {
        let mut document = Self {
            nodes: Vec::new(),
            root: NodeId::new(0),
            body: NodeId::new(0),
            mutations: 0,
            fail_next: false,
            clock: Clock::Monotonic(Instant::now()),
        };
        let root = document.push(NodeData::Document);
        let html = document.push(NodeData::Element(ElementData::new("html", None)));
        let head = document.push(NodeData::Element(ElementData::new("head", None)));
        let body = document.push(NodeData::Element(ElementData::new("body", None)));
        document.link(root, html);
        document.link(html, head);
        document.link(html, body);
        document.root = root;
        document.body = body;
        document
    }

    fn push(&mut self, data: NodeData) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        self.nodes.push(NodeEntry::new(data));
        id
    }

    fn link(&mut self, parent: NodeId, child: NodeId) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    fn entry(&self, id: NodeId) -> Result<&NodeEntry, DomError> {
        self.nodes
            .get(id.index())
            .ok_or_else(|| DomError::MissingNode(format!("{id:?}")))
    }

    fn entry_mut(&mut self, id: NodeId) -> Result<&mut NodeEntry, DomError> {
        self.nodes
            .get_mut(id.index())
            .ok_or_else(|| DomError::MissingNode(format!("{id:?}")))
    }

    fn element_mut(
        &mut self,
        id: NodeId,
        operation: &'static str,
    ) -> Result<&mut ElementData, DomError> {
        let kind = self.kind(id);
        self.entry_mut(id)?
            .element_mut()
            .ok_or(DomError::WrongKind { operation, kind })
    }

    fn kind(&self, id: NodeId) -> NodeKind {
        self.nodes
            .get(id.index())
            .map_or(NodeKind::Other, |entry| match entry.data {
                NodeData::Document => NodeKind::Document,
                NodeData::Element(_) => NodeKind::Element,
                NodeData::Text(_) => NodeKind::Text,
                NodeData::Raw(_) => NodeKind::Other,
            })
    }

    fn check_container(&self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.entry(child)?;
        let kind = self.kind(parent);
        if !matches!(kind, NodeKind::Element | NodeKind::Document) {
            return Err(DomError::WrongKind {
                operation: "insert a child",
                kind,
            });
        }

        let mut cursor = Some(parent);
        while let Some(node) = cursor {
            if node == child {
                return Err(DomError::Host(format!(
                    "cannot insert {child:?} into its own descendant {parent:?}"
                )));
            }
            cursor = self.entry(node)?.parent;
        }
        Ok(())
    }

    fn position(&self, parent: NodeId, child: NodeId) -> Result<usize, DomError> {
        self.entry(parent)?
            .children
            .iter()
            .position(|candidate| *candidate == child)
            .ok_or_else(|| DomError::NotAChild {
                parent: format!("{parent:?}"),
                child: format!("{child:?}"),
            })
    }

    fn detach(&mut self, child: NodeId) -> Result<(), DomError> {
        if let Some(parent) = self.entry(child)?.parent {
            let index = self.position(parent, child)?;
            self.nodes[parent.index()].children.remove(index);
            self.nodes[child.index()].parent = None;
        }
        Ok(())
    }

    fn insert_at(&mut self, parent: NodeId, child: NodeId, index: usize) {
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.insert(index, child);
    }

    fn replace_children_with(&mut self, parent: NodeId, data: Option<NodeData>) -> Result<(), DomError> {
        let children = core::mem::take(&mut self.entry_mut(parent)?.children);
        for child in children {
            self.nodes[child.index()].parent = None;
        }
        if let Some(data) = data {
            let child = self.push(data);
            self.link(parent, child);
        }
        Ok(())
    }

    fn now(&self) -> f64 {
        match self.clock {
            Clock::Monotonic(origin) => origin.elapsed().as_secs_f64() * 1000.0,
            Clock::Fixed(now) => now,
        }
    }
}

/// A headless, in-memory document implementing [`Dom`].
///
/// Nodes live in an arena owned by the document and are never freed;
/// detached nodes simply lose their parent. Cloning yields another handle to
/// the same document.
///
/// Attributes and live properties are stored separately, the way browsers do:
/// assigning the `checked` or `value` property of an input changes its live
/// state without touching the attribute. Markup assigned through `innerHTML`
/// is stored verbatim and serialized as-is.
#[derive(Debug, Clone)]
pub struct MemoryDom {
    inner: Rc<RefCell<Document>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    /// Creates a document containing `<html><head></head><body></body></html>`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(Document::new())),
        }
    }

    /// Creates a `<div>` appended to the body, ready to be used as a render container.
    ///
    /// # Errors
    ///
    /// Returns an error if an injected failure is pending.
    pub fn create_container(&self) -> Result<NodeId, DomError> {
        let container = self.create_element("div")?;
        let body = self.inner.borrow().body;
        self.append_child(&body, &container)?;
        Ok(container)
    }

    /// Freezes the clock at `millis`.
    pub fn set_time(&self, millis: f64) {
        self.inner.borrow_mut().clock = Clock::Fixed(millis);
    }

    /// Number of mutating calls made so far.
    #[must_use]
    pub fn mutation_count(&self) -> usize {
        self.inner.borrow().mutations
    }

    /// Resets the mutation counter to zero.
    pub fn reset_mutation_count(&self) {
        self.inner.borrow_mut().mutations = 0;
    }

    /// Makes the next mutating call fail with [`DomError::Host`].
    pub fn fail_next_mutation(&self) {
        self.inner.borrow_mut().fail_next = true;
    }

    fn mutate(&self) -> Result<RefMut<'_, Document>, DomError> {
        let mut document = self.inner.borrow_mut();
        if document.fail_next {
            document.fail_next = false;
            return Err(DomError::Host("injected mutation failure".to_string()));
        }
        document.mutations += 1;
        Ok(document)
    }

    /// Serializes a node and its subtree.
    #[must_use]
    pub fn outer_html(&self, node: NodeId) -> String {
        let mut out = String::new();
        write_html(&self.inner.borrow().nodes, node, &mut out);
        out
    }

    /// Serializes the children of a node.
    #[must_use]
    pub fn inner_html(&self, node: NodeId) -> String {
        let document = self.inner.borrow();
        let mut out = String::new();
        if let Some(entry) = document.nodes.get(node.index()) {
            write_children(&document.nodes, entry, &mut out);
        }
        out
    }

    /// Concatenated text of the subtree.
    #[must_use]
    pub fn text_content(&self, node: NodeId) -> String {
        let mut out = String::new();
        write_text(&self.inner.borrow().nodes, node, &mut out);
        out
    }

    /// Attributes of an element in insertion order.
    #[must_use]
    pub fn attributes(&self, node: NodeId) -> Vec<(String, String)> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(NodeEntry::element)
            .map(|element| {
                element
                    .attributes
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Value last assigned to a live property that has no attribute reflection.
    #[must_use]
    pub fn property(&self, node: NodeId, name: &str) -> Option<Value> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(NodeEntry::element)
            .and_then(|element| element.properties.get(name).cloned())
    }

    /// A single style declaration; `name` may be camelCase or kebab-case.
    #[must_use]
    pub fn style_property(&self, node: NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(NodeEntry::element)
            .and_then(|element| element.style.get(&to_kebab_case(name)).cloned())
    }

    /// Namespace URI of an element, `None` for HTML elements.
    #[must_use]
    pub fn namespace(&self, node: NodeId) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(NodeEntry::element)
            .and_then(|element| element.namespace.clone())
    }

    /// Child elements, skipping text and raw markup.
    #[must_use]
    pub fn element_children(&self, node: NodeId) -> Vec<NodeId> {
        self.child_nodes(&node)
            .into_iter()
            .filter(|child| self.node_kind(child) == NodeKind::Element)
            .collect()
    }

    /// Elements with the given tag in document order, starting at `root` inclusive.
    #[must_use]
    pub fn find_by_tag(&self, root: NodeId, tag: &str) -> Vec<NodeId> {
        let mut found = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            if self.tag_name(&node).as_deref() == Some(tag) {
                found.push(node);
            }
            stack.extend(self.child_nodes(&node).into_iter().rev());
        }
        found
    }

    /// First element with the given tag below or at `root`.
    #[must_use]
    pub fn first_by_tag(&self, root: NodeId, tag: &str) -> Option<NodeId> {
        self.find_by_tag(root, tag).into_iter().next()
    }

    /// Whether the node is reachable from the document root.
    #[must_use]
    pub fn is_connected(&self, node: NodeId) -> bool {
        let root = self.inner.borrow().root;
        let mut cursor = Some(node);
        while let Some(current) = cursor {
            if current == root {
                return true;
            }
            cursor = self.parent_node(&current);
        }
        false
    }

    /// Number of listeners registered on `node`, optionally for one event type.
    #[must_use]
    pub fn listener_count(&self, node: NodeId, event_type: Option<&str>) -> usize {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .map_or(0, |entry| {
                entry
                    .listeners
                    .iter()
                    .filter(|listener| event_type.is_none_or(|ty| listener.event_type == ty))
                    .count()
            })
    }

    /// Fires an event of `event_type` at `target` through capture, target and bubble phases.
    ///
    /// Returns `false` if a listener prevented the default action.
    pub fn dispatch_event(&self, target: NodeId, event_type: &str) -> bool {
        let event = DomEvent::new(event_type, target, self.now());

        let mut path = Vec::new();
        let mut cursor = self.parent_node(&target);
        while let Some(node) = cursor {
            cursor = self.parent_node(&node);
            path.push(node);
        }

        for node in path.iter().rev() {
            self.invoke(*node, &event, Some(true));
        }
        self.invoke(target, &event, None);
        if !NON_BUBBLING_EVENTS.contains(&event_type) {
            for node in &path {
                self.invoke(*node, &event, Some(false));
            }
        }

        !event.default_prevented()
    }

    /// Fires a `click` at `target`.
    pub fn click(&self, target: NodeId) -> bool {
        self.dispatch_event(target, "click")
    }

    /// Types `value` into an input and fires `input`.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is not an element.
    pub fn input(&self, target: NodeId, value: &str) -> Result<bool, DomError> {
        self.set_property(&target, "value", &Value::from(value))?;
        Ok(self.dispatch_event(target, "input"))
    }

    /// Toggles a checkbox to `checked` and fires `change`.
    ///
    /// # Errors
    ///
    /// Returns an error if `target` is not an element.
    pub fn check(&self, target: NodeId, checked: bool) -> Result<bool, DomError> {
        self.set_property(&target, "checked", &Value::Bool(checked))?;
        Ok(self.dispatch_event(target, "change"))
    }

    /// Runs matching listeners of one node. `capture` selects the phase;
    /// `None` is the target phase where every listener runs.
    fn invoke(&self, node: NodeId, event: &DomEvent<NodeId>, capture: Option<bool>) {
        let listeners: Vec<Callback> = self
            .inner
            .borrow()
            .nodes
            .get(node.index())
            .map(|entry| {
                entry
                    .listeners
                    .iter()
                    .filter(|listener| {
                        listener.event_type == event.event_type()
                            && capture.is_none_or(|capture| listener.capture == capture)
                    })
                    .map(|listener| listener.callback.clone())
                    .collect()
            })
            .unwrap_or_default();

        for listener in listeners {
            if !listener.call(event) {
                tracing::warn!(?node, event = event.event_type(), "listener expects a different event type");
            }
        }
    }
}

fn property_text(value: &Value) -> String {
    if value.is_null() {
        String::new()
    } else {
        value.to_string()
    }
}

impl Dom for MemoryDom {
    type Node = NodeId;

    fn create_text_node(&self, text: &str) -> Result<NodeId, DomError> {
        Ok(self.mutate()?.push(NodeData::Text(text.to_string())))
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        Ok(self
            .mutate()?
            .push(NodeData::Element(ElementData::new(tag, None))))
    }

    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<NodeId, DomError> {
        Ok(self
            .mutate()?
            .push(NodeData::Element(ElementData::new(tag, Some(namespace)))))
    }

    fn node_kind(&self, node: &NodeId) -> NodeKind {
        self.inner.borrow().kind(*node)
    }

    fn tag_name(&self, node: &NodeId) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(NodeEntry::element)
            .map(|element| element.tag.clone())
    }

    fn set_attribute(&self, element: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.mutate()?
            .element_mut(*element, "set an attribute")?
            .set_attribute(name, value);
        Ok(())
    }

    fn remove_attribute(&self, element: &NodeId, name: &str) -> Result<(), DomError> {
        self.mutate()?
            .element_mut(*element, "remove an attribute")?
            .remove_attribute(name);
        Ok(())
    }

    fn get_attribute(&self, element: &NodeId, name: &str) -> Option<String> {
        self.inner
            .borrow()
            .nodes
            .get(element.index())
            .and_then(NodeEntry::element)
            .and_then(|data| data.attributes.get(name).cloned())
    }

    fn set_property(&self, element: &NodeId, name: &str, value: &Value) -> Result<(), DomError> {
        match name {
            "innerHTML" => return self.set_inner_html(element, &property_text(value)),
            "textContent" | "innerText" => {
                return self.set_text_content(element, &property_text(value));
            }
            _ => {}
        }

        let mut document = self.mutate()?;
        let data = document.element_mut(*element, "set a property")?;
        match name {
            "className" => data.set_attribute("class", &property_text(value)),
            "htmlFor" => data.set_attribute("for", &property_text(value)),
            "tabIndex" => data.set_attribute("tabindex", &property_text(value)),
            "defaultValue" => data.set_attribute("value", &property_text(value)),
            "contentEditable" => data.set_attribute("contenteditable", &property_text(value)),
            "defaultChecked" | "defaultSelected" => {
                let attribute = if name == "defaultChecked" { "checked" } else { "selected" };
                if value.is_truthy() {
                    data.set_attribute(attribute, "");
                } else {
                    data.remove_attribute(attribute);
                }
            }
            "draggable" | "spellcheck" => {
                data.set_attribute(&name.to_ascii_lowercase(), if value.is_truthy() { "true" } else { "false" });
            }
            "translate" => data.set_attribute(name, if value.is_truthy() { "yes" } else { "no" }),
            "checked" | "selected" => {
                data.properties
                    .insert(name.to_string(), Value::Bool(value.is_truthy()));
            }
            "value" => {
                data.properties
                    .insert(name.to_string(), Value::Str(property_text(value)));
            }
            _ => {
                data.properties.insert(name.to_string(), value.clone());
            }
        }
        Ok(())
    }

    fn set_style_property(&self, element: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        self.mutate()?
            .element_mut(*element, "set a style property")?
            .set_style(to_kebab_case(name), value);
        Ok(())
    }

    fn set_inner_html(&self, element: &NodeId, html: &str) -> Result<(), DomError> {
        let mut document = self.mutate()?;
        document.element_mut(*element, "set inner HTML")?;
        let raw = (!html.is_empty()).then(|| NodeData::Raw(html.to_string()));
        document.replace_children_with(*element, raw)
    }

    fn set_text_content(&self, node: &NodeId, text: &str) -> Result<(), DomError> {
        let mut document = self.mutate()?;
        match document.kind(*node) {
            NodeKind::Element => {
                let text = (!text.is_empty()).then(|| NodeData::Text(text.to_string()));
                document.replace_children_with(*node, text)
            }
            NodeKind::Document => Err(DomError::WrongKind {
                operation: "set text content",
                kind: NodeKind::Document,
            }),
            NodeKind::Text | NodeKind::Other => {
                if let NodeData::Text(data) | NodeData::Raw(data) =
                    &mut document.entry_mut(*node)?.data
                {
                    *data = text.to_string();
                }
                Ok(())
            }
        }
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let mut document = self.mutate()?;
        document.check_container(*parent, *child)?;
        document.detach(*child)?;
        let index = document.entry(*parent)?.children.len();
        document.insert_at(*parent, *child, index);
        Ok(())
    }

    fn insert_before(
        &self,
        parent: &NodeId,
        child: &NodeId,
        reference: Option<&NodeId>,
    ) -> Result<(), DomError> {
        let Some(reference) = reference else {
            return self.append_child(parent, child);
        };
        if reference == child {
            return Ok(());
        }

        let mut document = self.mutate()?;
        document.check_container(*parent, *child)?;
        document.position(*parent, *reference)?;
        document.detach(*child)?;
        let index = document.position(*parent, *reference)?;
        document.insert_at(*parent, *child, index);
        Ok(())
    }

    fn remove_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        let mut document = self.mutate()?;
        let index = document.position(*parent, *child)?;
        document.nodes[parent.index()].children.remove(index);
        document.nodes[child.index()].parent = None;
        Ok(())
    }

    fn replace_child(
        &self,
        parent: &NodeId,
        new_child: &NodeId,
        old_child: &NodeId,
    ) -> Result<(), DomError> {
        if new_child == old_child {
            return Ok(());
        }

        let mut document = self.mutate()?;
        document.check_container(*parent, *new_child)?;
        document.position(*parent, *old_child)?;
        document.detach(*new_child)?;
        let index = document.position(*parent, *old_child)?;
        document.nodes[parent.index()].children[index] = *new_child;
        document.nodes[new_child.index()].parent = Some(*parent);
        document.nodes[old_child.index()].parent = None;
        Ok(())
    }

    fn parent_node(&self, node: &NodeId) -> Option<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(|entry| entry.parent)
    }

    fn child_nodes(&self, node: &NodeId) -> Vec<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .map(|entry| entry.children.clone())
            .unwrap_or_default()
    }

    fn first_child(&self, node: &NodeId) -> Option<NodeId> {
        self.inner
            .borrow()
            .nodes
            .get(node.index())
            .and_then(|entry| entry.children.first().copied())
    }

    fn document(&self) -> NodeId {
        self.inner.borrow().root
    }

    fn body(&self) -> Option<NodeId> {
        Some(self.inner.borrow().body)
    }

    fn add_event_listener(
        &self,
        target: &NodeId,
        event_type: &str,
        listener: &Callback,
        capture: bool,
    ) -> Result<(), DomError> {
        let mut document = self.mutate()?;
        let entry = document.entry_mut(*target)?;
        let exists = entry.listeners.iter().any(|existing| {
            existing.event_type == event_type
                && existing.capture == capture
                && existing.callback.ptr_eq(listener)
        });
        if !exists {
            entry.listeners.push(Listener {
                event_type: event_type.to_string(),
                callback: listener.clone(),
                capture,
            });
        }
        Ok(())
    }

    fn remove_event_listener(
        &self,
        target: &NodeId,
        event_type: &str,
        listener: &Callback,
        capture: bool,
    ) -> Result<(), DomError> {
        let mut document = self.mutate()?;
        document.entry_mut(*target)?.listeners.retain(|existing| {
            !(existing.event_type == event_type
                && existing.capture == capture
                && existing.callback.ptr_eq(listener))
        });
        Ok(())
    }

    fn input_value(&self, node: &NodeId) -> Option<String> {
        let document = self.inner.borrow();
        let element = document.nodes.get(node.index())?.element()?;
        if element.tag != "input" {
            return None;
        }
        let live = element.properties.get("value").map(property_text);
        Some(live.unwrap_or_else(|| element.attributes.get("value").cloned().unwrap_or_default()))
    }

    fn input_checked(&self, node: &NodeId) -> Option<bool> {
        let document = self.inner.borrow();
        let element = document.nodes.get(node.index())?.element()?;
        if element.tag != "input" {
            return None;
        }
        Some(
            element
                .properties
                .get("checked")
                .map_or_else(|| element.attributes.contains_key("checked"), Value::is_truthy),
        )
    }

    fn now(&self) -> f64 {
        self.inner.borrow().now()
    }
}
