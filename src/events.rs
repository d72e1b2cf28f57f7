//! Delegated handling of serializable [`EventAction`]s.
//!
//! Instead of installing one listener per element, the event system installs
//! a single capturing listener per delegated event type on the document. When
//! an event fires, it walks from the target towards `<body>` and dispatches
//! the action registered by the nearest element for that event type.
//!
//! Actions live in a side table keyed by node, so the live elements stay
//! untouched. Each [`EventSystem`] is an independent context; a renderer owns
//! one, and several renderers over different documents do not interfere.

use core::{
    cell::{Cell, RefCell},
    fmt::{self, Debug},
};
use std::{
    collections::HashMap,
    rc::{Rc, Weak},
};

use serde_json::{Map, Value as Json};
use singultus_core::{
    Callback, DEFAULT_ENRICHMENT_NAMESPACE, Dom, DomError, DomEvent, EventAction,
};
use tracing::{debug, trace};

/// Event types delegated by default.
pub const DELEGATED_EVENTS: &[&str] = &[
    "click",
    "input",
    "change",
    "submit",
    "focus",
    "blur",
    "keydown",
    "keyup",
    "mousedown",
    "mouseup",
];

/// Maximum number of ancestors visited when looking for an action.
pub const MAX_BUBBLE_DEPTH: usize = 50;

/// Sink receiving dispatched actions.
pub trait EventDispatcher {
    /// Delivers an action to the application.
    fn dispatch(&self, action: &EventAction);

    /// Registers a handler receiving every dispatched action.
    fn subscribe(&self, handler: Box<dyn Fn(&EventAction)>) -> Subscription;
}

/// Handle returned by [`EventDispatcher::subscribe`].
///
/// Dropping the handle keeps the subscription alive; call
/// [`unsubscribe`](Self::unsubscribe) to end it.
pub struct Subscription {
    cancel: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.is_active())
            .finish()
    }
}

impl Subscription {
    /// Creates a subscription that runs `cancel` on the first unsubscribe.
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: RefCell::new(Some(Box::new(cancel))),
        }
    }

    /// Ends the subscription. Calling it again has no effect.
    pub fn unsubscribe(&self) {
        let cancel = self.cancel.borrow_mut().take();
        if let Some(cancel) = cancel {
            cancel();
        }
    }

    /// Whether [`unsubscribe`](Self::unsubscribe) has not been called yet.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.cancel.borrow().is_some()
    }
}

type HandlerList = Vec<(u64, Rc<dyn Fn(&EventAction)>)>;

/// Synchronous fan-out to every subscriber in subscription order.
#[derive(Default)]
pub struct DefaultEventDispatcher {
    handlers: Rc<RefCell<HandlerList>>,
    next_id: Cell<u64>,
}

impl Debug for DefaultEventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultEventDispatcher")
            .field("subscribers", &self.handlers.borrow().len())
            .finish()
    }
}

impl DefaultEventDispatcher {
    /// Creates a dispatcher without subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of active subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.handlers.borrow().len()
    }
}

impl EventDispatcher for DefaultEventDispatcher {
    fn dispatch(&self, action: &EventAction) {
        // Handlers may subscribe or unsubscribe while running.
        let handlers: Vec<_> = self
            .handlers
            .borrow()
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();
        for handler in handlers {
            handler(action);
        }
    }

    fn subscribe(&self, handler: Box<dyn Fn(&EventAction)>) -> Subscription {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.handlers.borrow_mut().push((id, Rc::from(handler)));

        let handlers = Rc::downgrade(&self.handlers);
        Subscription::new(move || {
            if let Some(handlers) = handlers.upgrade() {
                handlers.borrow_mut().retain(|(existing, _)| *existing != id);
            }
        })
    }
}

/// Settings of an [`EventSystem`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventConfig {
    /// Event types that get a delegated listener on the document.
    pub events: Vec<String>,
    /// Maximum number of ancestors visited per event.
    pub max_depth: usize,
    /// Namespace used for enrichment data when an action does not name one.
    pub namespace: String,
}

impl Default for EventConfig {
    fn default() -> Self {
        Self {
            events: DELEGATED_EVENTS.iter().map(ToString::to_string).collect(),
            max_depth: MAX_BUBBLE_DEPTH,
            namespace: DEFAULT_ENRICHMENT_NAMESPACE.to_string(),
        }
    }
}

impl EventConfig {
    /// Adds an event type to delegate.
    #[must_use]
    pub fn with_event(mut self, event_type: impl Into<String>) -> Self {
        let event_type = event_type.into();
        if !self.events.contains(&event_type) {
            self.events.push(event_type);
        }
        self
    }

    /// Sets the maximum bubble depth.
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Sets the default enrichment namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }
}

struct EventState<D: Dom> {
    dispatcher: Rc<dyn EventDispatcher>,
    initialized: bool,
    actions: HashMap<D::Node, HashMap<String, EventAction>>,
    listeners: Vec<(String, Callback)>,
}

impl<D: Dom> EventState<D> {
    fn new() -> Self {
        Self {
            dispatcher: Rc::new(DefaultEventDispatcher::new()),
            initialized: false,
            actions: HashMap::new(),
            listeners: Vec::new(),
        }
    }
}

struct Shared<D: Dom> {
    dom: D,
    config: EventConfig,
    state: RefCell<EventState<D>>,
}

/// Delegated event handling for one document.
///
/// Cloning yields another handle to the same context.
pub struct EventSystem<D: Dom> {
    shared: Rc<Shared<D>>,
}

impl<D: Dom> Clone for EventSystem<D> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<D: Dom> Debug for EventSystem<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("EventSystem")
            .field("config", &self.shared.config)
            .field("initialized", &state.initialized)
            .field("elements", &state.actions.len())
            .finish_non_exhaustive()
    }
}

impl<D: Dom> EventSystem<D> {
    /// Creates an uninitialized event system with the default configuration.
    pub fn new(dom: D) -> Self {
        Self::with_config(dom, EventConfig::default())
    }

    /// Creates an uninitialized event system.
    pub fn with_config(dom: D, config: EventConfig) -> Self {
        Self {
            shared: Rc::new(Shared {
                dom,
                config,
                state: RefCell::new(EventState::new()),
            }),
        }
    }

    /// The configuration in use.
    #[must_use]
    pub fn config(&self) -> &EventConfig {
        &self.shared.config
    }

    /// Replaces the dispatcher receiving actions.
    pub fn set_dispatcher(&self, dispatcher: Rc<dyn EventDispatcher>) {
        self.shared.state.borrow_mut().dispatcher = dispatcher;
    }

    /// The dispatcher receiving actions.
    #[must_use]
    pub fn dispatcher(&self) -> Rc<dyn EventDispatcher> {
        self.shared.state.borrow().dispatcher.clone()
    }

    /// Whether the delegated listeners are installed.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.shared.state.borrow().initialized
    }

    /// Installs the delegated listeners on the document. Does nothing if they are installed.
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses a listener.
    pub fn initialize(&self) -> Result<(), DomError> {
        if self.is_initialized() {
            return Ok(());
        }

        let dom = &self.shared.dom;
        let document = dom.document();
        let mut listeners = Vec::with_capacity(self.shared.config.events.len());
        for event_type in &self.shared.config.events {
            let shared = Rc::downgrade(&self.shared);
            let listener = Callback::new(move |event: &DomEvent<D::Node>| {
                handle_event(&shared, event);
            });
            dom.add_event_listener(&document, event_type, &listener, true)?;
            listeners.push((event_type.clone(), listener));
        }

        let mut state = self.shared.state.borrow_mut();
        state.listeners = listeners;
        state.initialized = true;
        debug!(events = state.listeners.len(), "event delegation initialized");
        Ok(())
    }

    /// Registers `action` for `event_type` on `element`, initializing the system if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if initialization fails.
    pub fn attach_action(
        &self,
        element: &D::Node,
        event_type: &str,
        action: EventAction,
    ) -> Result<(), DomError> {
        self.initialize()?;
        self.shared
            .state
            .borrow_mut()
            .actions
            .entry(element.clone())
            .or_default()
            .insert(event_type.to_string(), action);
        Ok(())
    }

    /// Removes the action for `event_type` on `element`, dropping the element's table once empty.
    pub fn remove_action(&self, element: &D::Node, event_type: &str) {
        let mut state = self.shared.state.borrow_mut();
        if let Some(actions) = state.actions.get_mut(element) {
            actions.remove(event_type);
            if actions.is_empty() {
                state.actions.remove(element);
            }
        }
    }

    /// The action registered for `event_type` on `element`.
    #[must_use]
    pub fn action(&self, element: &D::Node, event_type: &str) -> Option<EventAction> {
        self.shared
            .state
            .borrow()
            .actions
            .get(element)
            .and_then(|actions| actions.get(event_type))
            .cloned()
    }

    /// Every action registered on `element`.
    #[must_use]
    pub fn actions_for(&self, element: &D::Node) -> Option<HashMap<String, EventAction>> {
        self.shared.state.borrow().actions.get(element).cloned()
    }

    /// Drops the actions of `node` and all of its descendants.
    pub fn release(&self, node: &D::Node) {
        let dom = &self.shared.dom;
        let mut stack = vec![node.clone()];
        let mut state = self.shared.state.borrow_mut();
        while let Some(node) = stack.pop() {
            state.actions.remove(&node);
            stack.extend(dom.child_nodes(&node));
        }
    }

    /// Detaches the delegated listeners and restores the default dispatcher.
    ///
    /// Actions registered on elements are kept; delegation resumes with the
    /// next [`attach_action`](Self::attach_action) or [`initialize`](Self::initialize).
    ///
    /// # Errors
    ///
    /// Returns an error if the host refuses to remove a listener.
    pub fn reset(&self) -> Result<(), DomError> {
        let listeners = {
            let mut state = self.shared.state.borrow_mut();
            state.dispatcher = Rc::new(DefaultEventDispatcher::new());
            state.initialized = false;
            core::mem::take(&mut state.listeners)
        };

        let dom = &self.shared.dom;
        let document = dom.document();
        for (event_type, listener) in &listeners {
            dom.remove_event_listener(&document, event_type, listener, true)?;
        }
        Ok(())
    }
}

fn handle_event<D: Dom>(shared: &Weak<Shared<D>>, event: &DomEvent<D::Node>) {
    let Some(shared) = shared.upgrade() else {
        return;
    };
    let dom = &shared.dom;
    let body = dom.body();

    let mut current = Some(event.target().clone());
    let mut depth = 0;
    while let Some(node) = current {
        if body.as_ref() == Some(&node) || depth >= shared.config.max_depth {
            break;
        }

        let action = shared
            .state
            .borrow()
            .actions
            .get(&node)
            .and_then(|actions| actions.get(event.event_type()))
            .cloned();

        if let Some(action) = action {
            event.prevent_default();
            let action = enrich(dom, &shared.config.namespace, action, &node);
            let dispatcher = shared.state.borrow().dispatcher.clone();
            trace!(kind = %action.kind, event = event.event_type(), depth, "dispatching action");
            dispatcher.dispatch(&action);
            return;
        }

        current = dom.parent_element(&node);
        depth += 1;
    }
}

/// Merges the live state requested by the action's enrichment descriptor into its data.
///
/// Actions without a descriptor are returned unchanged. Value and checked
/// state are read from `element` and only present when it is an `<input>`.
#[allow(clippy::cast_possible_truncation)]
pub fn enrich<D: Dom>(
    dom: &D,
    default_namespace: &str,
    action: EventAction,
    element: &D::Node,
) -> EventAction {
    let Some(enrichment) = &action.enrichment else {
        return action;
    };

    let namespace = enrichment
        .namespace
        .clone()
        .filter(|namespace| !namespace.is_empty())
        .unwrap_or_else(|| default_namespace.to_string());

    let mut extra = Map::new();
    if enrichment.include_value {
        if let Some(value) = dom.input_value(element) {
            extra.insert("value".to_string(), Json::String(value));
        }
    }
    if enrichment.include_checked {
        if let Some(checked) = dom.input_checked(element) {
            extra.insert("checked".to_string(), Json::Bool(checked));
        }
    }
    if enrichment.include_timestamp {
        extra.insert("timestamp".to_string(), Json::from(dom.now().floor() as i64));
    }

    let mut data = action.data.clone().unwrap_or_default();
    if !extra.is_empty() {
        data.insert(namespace, Json::Object(extra));
    }

    EventAction {
        data: Some(data),
        ..action
    }
}
