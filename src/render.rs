//! The render orchestrator: diff against the previous tree, patch, fall back.

use std::{collections::HashMap, rc::Rc};

use singultus_core::{Dom, Element, Patch, VNode, build, diff};
use tracing::{debug, error, warn};

use crate::{
    error::{PatchError, RenderError},
    events::{EventConfig, EventSystem},
    legacy,
    patch::{NodeMap, Patcher, index_nodes, run_render_hook},
};

/// What a call to [`Renderer::render`] did to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenderOutcome {
    /// Nothing was rendered before; the tree was built from scratch.
    Mounted,
    /// The new tree equals the previous one; the DOM was not touched.
    Unchanged,
    /// The given number of root patches were applied.
    Patched(usize),
    /// The element was null; the container was emptied.
    Cleared,
    /// Patching failed and the container was rebuilt from scratch.
    Recovered,
    /// Rendering failed; the error was logged.
    Failed,
}

impl RenderOutcome {
    /// A stable lower-case name for the outcome, without the patch count.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Mounted => "mounted",
            Self::Unchanged => "unchanged",
            Self::Patched(_) => "patched",
            Self::Cleared => "cleared",
            Self::Recovered => "recovered",
            Self::Failed => "failed",
        }
    }

    /// Number of root patches applied, zero unless [`RenderOutcome::Patched`].
    #[must_use]
    pub const fn patch_count(self) -> usize {
        match self {
            Self::Patched(count) => count,
            _ => 0,
        }
    }
}

/// Per-container state kept between renders.
#[derive(Debug)]
struct RenderState<N> {
    vnode: Rc<VNode>,
    nodes: NodeMap<N>,
}

/// Builder for [`Renderer`].
#[derive(Debug, Clone)]
pub struct RendererBuilder {
    events: EventConfig,
    fallback: bool,
}

impl Default for RendererBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RendererBuilder {
    /// Creates a builder with the default event configuration and fallback enabled.
    #[must_use]
    pub fn new() -> Self {
        Self {
            events: EventConfig::default(),
            fallback: true,
        }
    }

    /// Sets the event delegation configuration.
    #[must_use]
    pub fn with_event_config(mut self, config: EventConfig) -> Self {
        self.events = config;
        self
    }

    /// Whether a failed patch falls back to rebuilding the container.
    #[must_use]
    pub const fn with_fallback(mut self, fallback: bool) -> Self {
        self.fallback = fallback;
        self
    }

    /// Creates the renderer for `dom`.
    pub fn build<D: Dom>(self, dom: D) -> Renderer<D> {
        Renderer {
            events: EventSystem::with_config(dom.clone(), self.events),
            dom,
            fallback: self.fallback,
            states: HashMap::new(),
            direct: HashMap::new(),
        }
    }
}

/// Renders hyperscript into containers, patching incrementally between calls.
///
/// State is tracked per container, so one renderer can drive several
/// independent regions of the same document.
#[derive(Debug)]
pub struct Renderer<D: Dom> {
    dom: D,
    events: EventSystem<D>,
    fallback: bool,
    states: HashMap<D::Node, RenderState<D::Node>>,
    // Node maps of trees built by `render_simple`, kept only for release.
    direct: HashMap<D::Node, NodeMap<D::Node>>,
}

impl<D: Dom> Renderer<D> {
    /// Creates a renderer with default settings.
    pub fn new(dom: D) -> Self {
        RendererBuilder::new().build(dom)
    }

    /// The document this renderer writes to.
    pub const fn dom(&self) -> &D {
        &self.dom
    }

    /// The event system receiving the actions of rendered elements.
    pub const fn events(&self) -> &EventSystem<D> {
        &self.events
    }

    /// The tree last rendered into `container`.
    #[must_use]
    pub fn last_vnode(&self, container: &D::Node) -> Option<Rc<VNode>> {
        self.states.get(container).map(|state| state.vnode.clone())
    }

    /// The node map recorded for `container`.
    #[must_use]
    pub fn node_map(&self, container: &D::Node) -> Option<&NodeMap<D::Node>> {
        self.states.get(container).map(|state| &state.nodes)
    }

    /// Renders `element` into `container`.
    ///
    /// Failures never escape: a failed patch falls back to a full rebuild
    /// and anything that still fails is logged and reported as
    /// [`RenderOutcome::Failed`].
    pub fn render(&mut self, container: &D::Node, element: impl Into<Element>) -> RenderOutcome {
        match self.try_render(container, element) {
            Ok(outcome) => outcome,
            Err(err) => {
                error!(error = %err, "render failed");
                RenderOutcome::Failed
            }
        }
    }

    /// Renders `element` into `container`, reporting failures.
    ///
    /// # Errors
    ///
    /// Fails if mounting fails, or if patching fails and either the fallback
    /// is disabled or the fallback mount fails too. The container's state is
    /// dropped on failure.
    pub fn try_render(
        &mut self,
        container: &D::Node,
        element: impl Into<Element>,
    ) -> Result<RenderOutcome, RenderError> {
        let element = element.into();
        let new = (!element.is_null()).then(|| Rc::new(build(&element)));

        let Some(state) = self.states.remove(container) else {
            let nodes = self.direct.remove(container).unwrap_or_default();
            return self
                .mount(container, new.as_ref(), nodes)
                .map_err(RenderError::Mount);
        };

        let patches = diff(Some(&state.vnode), new.as_ref());
        if patches.is_empty() {
            debug!("render skipped, tree unchanged");
            self.states.insert(container.clone(), state);
            return Ok(RenderOutcome::Unchanged);
        }

        debug!(patches = patches.len(), "patching container");
        let RenderState { vnode: old, mut nodes } = state;
        match self.patch_root(container, &old, &mut nodes, new.as_ref(), &patches) {
            Ok(()) => {
                if let Some(vnode) = new {
                    self.store(container, vnode, nodes);
                }
                Ok(RenderOutcome::Patched(patches.len()))
            }
            Err(patch) if self.fallback => {
                warn!(error = %patch, "patch failed, re-rendering from scratch");
                match self.mount(container, new.as_ref(), nodes) {
                    Ok(_) => Ok(RenderOutcome::Recovered),
                    Err(fallback) => Err(RenderError::FallbackFailed { patch, fallback }),
                }
            }
            Err(patch) => Err(RenderError::Patch(patch)),
        }
    }

    /// Renders without diffing: the container is cleared and rebuilt
    /// straight from the hyperscript, and any state it had is dropped.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    pub fn render_simple(
        &mut self,
        container: &D::Node,
        element: impl Into<Element>,
    ) -> Result<(), PatchError> {
        let mut nodes = match self.states.remove(container) {
            Some(state) => state.nodes,
            None => self.direct.remove(container).unwrap_or_default(),
        };
        Patcher::new(&self.dom, &self.events, &mut nodes).clear(container)?;

        let element = element.into();
        legacy::render_simple(&self.dom, &self.events, container, &element)?;

        nodes.clear();
        if !element.is_null() {
            self.index(container, &Rc::new(build(&element)), &mut nodes);
        }
        self.direct.insert(container.clone(), nodes);
        Ok(())
    }

    fn mount(
        &mut self,
        container: &D::Node,
        vnode: Option<&Rc<VNode>>,
        mut nodes: NodeMap<D::Node>,
    ) -> Result<RenderOutcome, PatchError> {
        let mut patcher = Patcher::new(&self.dom, &self.events, &mut nodes);
        patcher.clear(container)?;

        let Some(vnode) = vnode else {
            return Ok(RenderOutcome::Cleared);
        };
        patcher.mount(container, vnode)?;

        self.store(container, vnode.clone(), nodes);
        Ok(RenderOutcome::Mounted)
    }

    fn store(&mut self, container: &D::Node, vnode: Rc<VNode>, mut nodes: NodeMap<D::Node>) {
        nodes.clear();
        self.index(container, &vnode, &mut nodes);
        self.states.insert(container.clone(), RenderState { vnode, nodes });
    }

    fn index(&self, container: &D::Node, vnode: &Rc<VNode>, nodes: &mut NodeMap<D::Node>) {
        if vnode.is_fragment() {
            index_nodes(&self.dom, container, vnode, nodes);
        } else if let Some(root) = self.dom.first_child(container) {
            index_nodes(&self.dom, &root, vnode, nodes);
        }
    }

    fn patch_root(
        &self,
        container: &D::Node,
        old: &VNode,
        nodes: &mut NodeMap<D::Node>,
        new: Option<&Rc<VNode>>,
        patches: &[Patch],
    ) -> Result<(), PatchError> {
        let dom = &self.dom;
        let mut patcher = Patcher::new(dom, &self.events, nodes);

        let root = || -> Result<D::Node, PatchError> {
            if old.is_fragment() {
                Ok(container.clone())
            } else {
                dom.first_child(container)
                    .ok_or_else(|| PatchError::MissingRoot(format!("{container:?}")))
            }
        };

        for patch in patches {
            match patch {
                Patch::Create(vnode) => patcher.mount(container, vnode)?,
                Patch::Remove => patcher.clear(container)?,
                Patch::Replace(vnode) => {
                    patcher.clear(container)?;
                    patcher.mount(container, vnode)?;
                }
                Patch::UpdateText { new, .. } => dom.set_text_content(&root()?, new)?,
                Patch::UpdateProps { old: before, new: after } => {
                    let is_svg = new.is_some_and(|vnode| vnode.is_svg());
                    patcher.update_props(&root()?, before, after, is_svg)?;
                }
                Patch::Reorder(ops) => {
                    let root = root()?;
                    patcher.apply_child_patches(&root, ops)?;
                    if let Some(element) = new.and_then(|vnode| vnode.as_element()) {
                        run_render_hook(&element.props, &root);
                    }
                }
            }
        }
        Ok(())
    }
}
