use singultus::{
    Element, EventConfig, PatchError, RenderOutcome, Renderer, RendererBuilder, Subscription,
};
use wasm_bindgen::prelude::*;

use crate::{
    dom::{WebDom, WebNode},
    error::WebError,
};

/// Id given to the container created when no root id is configured.
pub const DEFAULT_ROOT_ID: &str = "singultus-root";

/// Builder for [`WebMount`].
#[derive(Debug, Clone)]
pub struct MountBuilder {
    root_id: Option<String>,
    events: EventConfig,
    fallback: bool,
}

impl Default for MountBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MountBuilder {
    /// Creates a builder that mounts into a fresh `div` appended to the body.
    #[must_use]
    pub fn new() -> Self {
        Self {
            root_id: None,
            events: EventConfig::default(),
            fallback: true,
        }
    }

    /// Mounts into the existing element with this id instead.
    #[must_use]
    pub fn with_root_id(mut self, id: impl Into<String>) -> Self {
        self.root_id = Some(id.into());
        self
    }

    /// Sets the delegated event configuration.
    #[must_use]
    pub fn with_event_config(mut self, config: EventConfig) -> Self {
        self.events = config;
        self
    }

    /// Enables or disables the full re-render after a failed patch.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Locates the container and creates the [`WebMount`].
    ///
    /// # Errors
    ///
    /// Returns [`WebError::RootNotFound`] if the configured element does not
    /// exist, or [`WebError::DomUnavailable`] outside of a browser.
    pub fn build(self) -> Result<WebMount, WebError> {
        console_error_panic_hook::set_once();

        let dom = WebDom::new()?;
        let container = match self.root_id.as_deref() {
            Some(id) => dom
                .element_by_id(id)
                .ok_or_else(|| WebError::RootNotFound(id.to_string()))?,
            None => {
                let document = dom.raw_document();
                let body = document.body().ok_or(WebError::DomUnavailable)?;
                let host = document.create_element("div")?;
                host.set_id(DEFAULT_ROOT_ID);
                body.append_child(&host)?;
                WebNode::new(host.into())
            }
        };

        let renderer = RendererBuilder::new()
            .with_event_config(self.events)
            .with_fallback(self.fallback)
            .build(dom);
        Ok(WebMount {
            renderer,
            container,
            subscriptions: Vec::new(),
        })
    }
}

/// A renderer bound to one container element of the page.
#[wasm_bindgen]
#[derive(Debug)]
pub struct WebMount {
    renderer: Renderer<WebDom>,
    container: WebNode,
    subscriptions: Vec<Subscription>,
}

impl WebMount {
    /// Renders `element`, patching whatever was rendered before.
    pub fn render(&mut self, element: impl Into<Element>) -> RenderOutcome {
        self.renderer.render(&self.container, element)
    }

    /// Rebuilds the container from scratch without diffing.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    pub fn render_simple(&mut self, element: impl Into<Element>) -> Result<(), PatchError> {
        self.renderer.render_simple(&self.container, element)
    }

    /// The underlying renderer.
    #[must_use]
    pub const fn renderer(&self) -> &Renderer<WebDom> {
        &self.renderer
    }

    /// The container element.
    #[must_use]
    pub const fn container(&self) -> &WebNode {
        &self.container
    }
}

fn parse_markup(json: &str) -> Result<Element, WebError> {
    serde_json::from_str::<serde_json::Value>(json)
        .map(|value| Element::from_json(&value))
        .map_err(|err| WebError::InvalidMarkup(err.to_string()))
}

#[wasm_bindgen]
impl WebMount {
    /// Mounts into the element with `root_id`, or into a new `div` when no
    /// id is given.
    ///
    /// # Errors
    ///
    /// Returns an error if the element cannot be found.
    #[wasm_bindgen(constructor)]
    pub fn new(root_id: Option<String>) -> Result<Self, WebError> {
        let builder = MountBuilder::new();
        match root_id {
            Some(id) => builder.with_root_id(id).build(),
            None => builder.build(),
        }
    }

    /// Renders hyperscript given as JSON and returns the outcome's name
    /// (`"mounted"`, `"unchanged"`, `"patched"`, `"cleared"`, `"recovered"`
    /// or `"failed"`).
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not valid JSON.
    #[wasm_bindgen(js_name = render)]
    pub fn render_json(&mut self, json: &str) -> Result<String, WebError> {
        let element = parse_markup(json)?;
        Ok(self.render(element).name().to_string())
    }

    /// Rebuilds from hyperscript given as JSON, without diffing.
    ///
    /// # Errors
    ///
    /// Returns an error if `json` is not valid JSON or the DOM rejects a
    /// mutation.
    #[wasm_bindgen(js_name = renderSimple)]
    pub fn render_simple_json(&mut self, json: &str) -> Result<(), WebError> {
        let element = parse_markup(json)?;
        self.render_simple(element)
            .map_err(|err| WebError::Js(err.to_string()))
    }

    /// Calls `callback` with every dispatched action, as a plain object.
    pub fn subscribe(&mut self, callback: js_sys::Function) {
        let subscription = self
            .renderer
            .events()
            .dispatcher()
            .subscribe(Box::new(move |action| {
                let payload = serde_json::to_string(action)
                    .ok()
                    .and_then(|json| js_sys::JSON::parse(&json).ok());
                let Some(payload) = payload else {
                    tracing::warn!(kind = %action.kind, "action could not be converted");
                    return;
                };
                if let Err(err) = callback.call1(&JsValue::NULL, &payload) {
                    tracing::warn!(error = ?err, "action subscriber threw");
                }
            }));
        self.subscriptions.push(subscription);
    }

    /// Drops every subscription made through [`WebMount::subscribe`].
    pub fn unsubscribe_all(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.unsubscribe();
        }
    }

    /// Empties the container, releasing the listeners and actions of
    /// everything rendered into it.
    ///
    /// # Errors
    ///
    /// Returns an error if a child cannot be removed.
    pub fn clear(&mut self) -> Result<(), WebError> {
        self.renderer
            .try_render(&self.container, Element::Null)
            .map(|_| ())
            .map_err(|err| WebError::Js(err.to_string()))
    }
}
