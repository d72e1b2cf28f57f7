//! The host document surface the engine mutates.
//!
//! The engine never talks to a concrete DOM. Every backend implements [`Dom`]
//! for its own node handle type; `singultus-memory` provides an in-memory
//! document and `singultus-web` wraps the browser through `web-sys`.

use core::{
    cell::Cell,
    fmt::{self, Debug},
    hash::Hash,
};
use std::rc::Rc;

use crate::value::{Callback, Value};

/// Namespace URI used for elements inside SVG subtrees.
pub const SVG_NAMESPACE: &str = "http://www.w3.org/2000/svg";

/// Error raised by a [`Dom`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    /// The node handle does not refer to a live node.
    #[error("node `{0}` does not exist")]
    MissingNode(String),
    /// The node is not a child of the given parent.
    #[error("node `{child}` is not a child of `{parent}`")]
    NotAChild {
        /// Debug form of the expected parent.
        parent: String,
        /// Debug form of the child.
        child: String,
    },
    /// The operation is not valid for this kind of node.
    #[error("cannot {operation} on a {kind} node")]
    WrongKind {
        /// What was attempted.
        operation: &'static str,
        /// Kind of the node it was attempted on.
        kind: NodeKind,
    },
    /// The host does not support the operation.
    #[error("unsupported operation: {0}")]
    Unsupported(String),
    /// The host raised an exception.
    #[error("host error: {0}")]
    Host(String),
}

/// Coarse classification of a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document root.
    Document,
    /// An element.
    Element,
    /// A text node.
    Text,
    /// Comments, raw markup and anything else.
    Other,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Document => "document",
            Self::Element => "element",
            Self::Text => "text",
            Self::Other => "non-element",
        })
    }
}

/// An event as delivered to listeners registered through [`Dom::add_event_listener`].
///
/// Listener callbacks take `&DomEvent<D::Node>`.
pub struct DomEvent<N> {
    event_type: String,
    target: N,
    timestamp: f64,
    default_prevented: Cell<bool>,
    on_prevent_default: Option<Rc<dyn Fn()>>,
}

impl<N: Debug> Debug for DomEvent<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomEvent")
            .field("event_type", &self.event_type)
            .field("target", &self.target)
            .field("timestamp", &self.timestamp)
            .field("default_prevented", &self.default_prevented.get())
            .finish_non_exhaustive()
    }
}

impl<N> DomEvent<N> {
    /// Creates an event of `event_type` targeting `target`.
    pub fn new(event_type: impl Into<String>, target: N, timestamp: f64) -> Self {
        Self {
            event_type: event_type.into(),
            target,
            timestamp,
            default_prevented: Cell::new(false),
            on_prevent_default: None,
        }
    }

    /// Forwards [`prevent_default`](Self::prevent_default) to the host event.
    #[must_use]
    pub fn with_prevent_default(mut self, hook: impl Fn() + 'static) -> Self {
        self.on_prevent_default = Some(Rc::new(hook));
        self
    }

    /// The event type, e.g. `"click"`.
    #[must_use]
    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    /// The node the event was fired on.
    #[must_use]
    pub const fn target(&self) -> &N {
        &self.target
    }

    /// Milliseconds since the host's time origin at which the event was created.
    #[must_use]
    pub const fn timestamp(&self) -> f64 {
        self.timestamp
    }

    /// Suppresses the host's default action for this event.
    pub fn prevent_default(&self) {
        self.default_prevented.set(true);
        if let Some(hook) = &self.on_prevent_default {
            hook();
        }
    }

    /// Whether [`prevent_default`](Self::prevent_default) was called.
    #[must_use]
    pub fn default_prevented(&self) -> bool {
        self.default_prevented.get()
    }
}

/// A live document the engine can read and mutate.
///
/// Implementations are cheap handles (usually an `Rc` around shared state);
/// cloning must yield a handle to the same document.
pub trait Dom: Clone + 'static {
    /// Handle to a live node. Equal handles refer to the same node.
    type Node: Clone + Eq + Hash + Debug + 'static;

    /// Creates a detached text node.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to create the node.
    fn create_text_node(&self, text: &str) -> Result<Self::Node, DomError>;

    /// Creates a detached element in the HTML namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to create the node.
    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;

    /// Creates a detached element in `namespace`.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to create the node.
    fn create_element_ns(&self, namespace: &str, tag: &str) -> Result<Self::Node, DomError>;

    /// Classifies a node.
    fn node_kind(&self, node: &Self::Node) -> NodeKind;

    /// Lower-case tag name of an element, `None` for other nodes.
    fn tag_name(&self, node: &Self::Node) -> Option<String>;

    /// Sets an attribute.
    ///
    /// # Errors
    ///
    /// Returns an error if `element` is not an element.
    fn set_attribute(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// Removes an attribute. Removing a missing attribute is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if `element` is not an element.
    fn remove_attribute(&self, element: &Self::Node, name: &str) -> Result<(), DomError>;

    /// Reads an attribute.
    fn get_attribute(&self, element: &Self::Node, name: &str) -> Option<String>;

    /// Assigns a live property, with script assignment semantics.
    ///
    /// # Errors
    ///
    /// Returns an error if `element` is not an element or the host rejects the value.
    fn set_property(&self, element: &Self::Node, name: &str, value: &Value) -> Result<(), DomError>;

    /// Sets one declaration through the style API. `name` may be camelCase or kebab-case.
    ///
    /// # Errors
    ///
    /// Returns an error if `element` is not an element.
    fn set_style_property(&self, element: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;

    /// Replaces the children of `element` with parsed markup.
    ///
    /// # Errors
    ///
    /// Returns an error if `element` is not an element.
    fn set_inner_html(&self, element: &Self::Node, html: &str) -> Result<(), DomError>;

    /// Sets the text of a text node, or replaces an element's children with one text node.
    ///
    /// # Errors
    ///
    /// Returns an error if the node cannot hold text.
    fn set_text_content(&self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    /// Appends `child` to `parent`, detaching it from its previous parent first.
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` cannot hold children.
    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Inserts `child` before `reference`, or appends it when `reference` is `None`.
    ///
    /// # Errors
    ///
    /// Returns an error if `reference` is not a child of `parent`.
    fn insert_before(
        &self,
        parent: &Self::Node,
        child: &Self::Node,
        reference: Option<&Self::Node>,
    ) -> Result<(), DomError>;

    /// Detaches `child` from `parent`.
    ///
    /// # Errors
    ///
    /// Returns an error if `child` is not a child of `parent`.
    fn remove_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;

    /// Puts `new_child` in place of `old_child`.
    ///
    /// # Errors
    ///
    /// Returns an error if `old_child` is not a child of `parent`.
    fn replace_child(
        &self,
        parent: &Self::Node,
        new_child: &Self::Node,
        old_child: &Self::Node,
    ) -> Result<(), DomError>;

    /// Parent of a node, including the document.
    fn parent_node(&self, node: &Self::Node) -> Option<Self::Node>;

    /// Children of a node in order.
    fn child_nodes(&self, node: &Self::Node) -> Vec<Self::Node>;

    /// First child of a node.
    fn first_child(&self, node: &Self::Node) -> Option<Self::Node> {
        self.child_nodes(node).into_iter().next()
    }

    /// Parent of a node if that parent is an element.
    fn parent_element(&self, node: &Self::Node) -> Option<Self::Node> {
        self.parent_node(node)
            .filter(|parent| self.node_kind(parent) == NodeKind::Element)
    }

    /// Detaches every child of `node`.
    ///
    /// # Errors
    ///
    /// Propagates the first failed removal.
    fn clear_children(&self, node: &Self::Node) -> Result<(), DomError> {
        while let Some(child) = self.first_child(node) {
            self.remove_child(node, &child)?;
        }
        Ok(())
    }

    /// The document root, used as the delegation target.
    fn document(&self) -> Self::Node;

    /// The `<body>` element, where the delegation walk stops.
    fn body(&self) -> Option<Self::Node>;

    /// Registers `listener` for `event_type` on `target`. The callback is
    /// invoked with a `&DomEvent<Self::Node>`. Registering the same callback
    /// twice for the same type and phase has no effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot install the listener.
    fn add_event_listener(
        &self,
        target: &Self::Node,
        event_type: &str,
        listener: &Callback,
        capture: bool,
    ) -> Result<(), DomError>;

    /// Unregisters a listener previously added with the same arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if the host cannot remove the listener.
    fn remove_event_listener(
        &self,
        target: &Self::Node,
        event_type: &str,
        listener: &Callback,
        capture: bool,
    ) -> Result<(), DomError>;

    /// Current `value` of an `<input>` element, `None` for anything else.
    fn input_value(&self, node: &Self::Node) -> Option<String>;

    /// Current `checked` state of an `<input>` element, `None` for anything else.
    fn input_checked(&self, node: &Self::Node) -> Option<bool>;

    /// Milliseconds since the host's time origin.
    fn now(&self) -> f64;
}
