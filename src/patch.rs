//! Turning virtual nodes and patches into DOM mutations.

use std::{collections::HashMap, rc::Rc};

use singultus_core::{
    Dom, Handler, NodeKind, ON_RENDER_PROP, Patch, PatchOp, Props, SVG_NAMESPACE, VNode, Value,
    diff,
};
use tracing::{trace, warn};

use crate::{attributes::AttributeReconciler, error::PatchError, events::EventSystem};

/// Side table from live nodes to the virtual node each one currently represents.
pub type NodeMap<N> = HashMap<N, Rc<VNode>>;

/// Records `node` and its descendants, pairing live children with virtual
/// children by position.
pub fn index_nodes<D: Dom>(dom: &D, node: &D::Node, vnode: &Rc<VNode>, nodes: &mut NodeMap<D::Node>) {
    nodes.insert(node.clone(), vnode.clone());
    if vnode.is_text() {
        return;
    }
    for (child, child_vnode) in dom.child_nodes(node).iter().zip(vnode.children()) {
        index_nodes(dom, child, child_vnode, nodes);
    }
}

/// Applies patches against a live tree while keeping the [`NodeMap`] current.
#[derive(Debug)]
pub struct Patcher<'a, D: Dom> {
    dom: &'a D,
    events: &'a EventSystem<D>,
    nodes: &'a mut NodeMap<D::Node>,
}

impl<'a, D: Dom> Patcher<'a, D> {
    /// Creates a patcher over `dom` recording into `nodes`.
    pub const fn new(dom: &'a D, events: &'a EventSystem<D>, nodes: &'a mut NodeMap<D::Node>) -> Self {
        Self { dom, events, nodes }
    }

    fn reconciler(&self) -> AttributeReconciler<'a, D> {
        AttributeReconciler::new(self.dom, self.events)
    }

    /// Creates the live subtree for `vnode`.
    ///
    /// Fragments become a `<div>` with `display: contents` holding the
    /// children. Elements get their props and children before the
    /// `singultus/on-render` hook runs.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures; the partially built subtree is left detached.
    pub fn materialize(&mut self, vnode: &Rc<VNode>) -> Result<D::Node, PatchError> {
        let dom = self.dom;
        let node = match vnode.as_ref() {
            VNode::Text(text) => dom.create_text_node(&text.text)?,
            VNode::Element(element) if element.is_fragment() => {
                let wrapper = dom.create_element("div")?;
                dom.set_style_property(&wrapper, "display", "contents")?;
                self.append_children(&wrapper, &element.children)?;
                wrapper
            }
            VNode::Element(element) => {
                let node = if element.is_svg {
                    dom.create_element_ns(SVG_NAMESPACE, &element.tag)?
                } else {
                    dom.create_element(&element.tag)?
                };
                self.reconciler().apply(&node, &element.props, element.is_svg)?;
                self.append_children(&node, &element.children)?;
                run_render_hook(&element.props, &node);
                node
            }
        };
        self.nodes.insert(node.clone(), vnode.clone());
        Ok(node)
    }

    fn append_children(&mut self, parent: &D::Node, children: &[Rc<VNode>]) -> Result<(), PatchError> {
        for child in children {
            let node = self.materialize(child)?;
            self.dom.append_child(parent, &node)?;
        }
        Ok(())
    }

    /// Mounts `vnode` at the end of `container`. A fragment contributes its
    /// children directly instead of a wrapper.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    pub fn mount(&mut self, container: &D::Node, vnode: &Rc<VNode>) -> Result<(), PatchError> {
        if vnode.is_fragment() {
            self.append_children(container, vnode.children())?;
            self.nodes.insert(container.clone(), vnode.clone());
        } else {
            let node = self.materialize(vnode)?;
            self.dom.append_child(container, &node)?;
        }
        Ok(())
    }

    /// Applies `patches` to `node`.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures and inconsistent child operations.
    pub fn apply_patches(&mut self, node: &D::Node, patches: &[Patch]) -> Result<(), PatchError> {
        self.patch_node(node, patches).map(|_| ())
    }

    /// Applies `patches` and returns the node that occupies the position afterwards.
    fn patch_node(&mut self, node: &D::Node, patches: &[Patch]) -> Result<Option<D::Node>, PatchError> {
        let dom = self.dom;
        let mut current = Some(node.clone());

        for patch in patches {
            let Some(node) = current.clone() else {
                break;
            };
            match patch {
                Patch::Create(vnode) => {
                    let child = self.materialize(vnode)?;
                    dom.append_child(&node, &child)?;
                }
                Patch::Remove => {
                    if let Some(parent) = dom.parent_node(&node) {
                        dom.remove_child(&parent, &node)?;
                        self.release(&node);
                        current = None;
                    }
                }
                Patch::Replace(vnode) => {
                    if let Some(parent) = dom.parent_node(&node) {
                        let replacement = self.materialize(vnode)?;
                        dom.replace_child(&parent, &replacement, &node)?;
                        self.release(&node);
                        current = Some(replacement);
                    }
                }
                Patch::UpdateText { new, .. } => {
                    if dom.node_kind(&node) == NodeKind::Text {
                        dom.set_text_content(&node, new)?;
                    }
                }
                Patch::UpdateProps { old, new } => {
                    let is_svg = self.nodes.get(&node).is_some_and(|vnode| vnode.is_svg());
                    self.update_props(&node, old, new, is_svg)?;
                }
                Patch::Reorder(ops) => self.apply_child_patches(&node, ops)?,
            }
        }

        Ok(current)
    }

    /// Reconciles an element's props and runs its `singultus/on-render` hook.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    pub fn update_props(&self, node: &D::Node, old: &Props, new: &Props, is_svg: bool) -> Result<(), PatchError> {
        self.reconciler().update(node, old, new, is_svg)?;
        run_render_hook(new, node);
        Ok(())
    }

    /// Applies child operations to `parent`.
    ///
    /// Operations run in reverse list order against a snapshot of the
    /// children taken up front: removals detach, inserts materialize and moves
    /// update content in place. A final pass then puts every child at its new
    /// index, relocating only the children that are out of place, so kept
    /// nodes retain their identity.
    ///
    /// # Errors
    ///
    /// Fails on DOM errors and when the operations do not match the live children.
    pub fn apply_child_patches(&mut self, parent: &D::Node, ops: &[PatchOp]) -> Result<(), PatchError> {
        let dom = self.dom;
        let snapshot = dom.child_nodes(parent);
        let mut current: Vec<Option<D::Node>> = snapshot.into_iter().map(Some).collect();
        let mut moved = vec![false; current.len()];
        let mut placed = Vec::new();

        for op in ops.iter().rev() {
            trace!(?op, "child patch");
            match op {
                PatchOp::Remove { old_index } => {
                    let Some(child) = current.get_mut(*old_index).and_then(Option::take) else {
                        continue;
                    };
                    if dom.parent_node(&child).as_ref() == Some(parent) {
                        dom.remove_child(parent, &child)?;
                    }
                    self.release(&child);
                }
                PatchOp::Insert { new_index, node, .. } => {
                    let child = self.materialize(node)?;
                    placed.push((*new_index, child));
                }
                PatchOp::Move {
                    old_index,
                    new_index,
                    node,
                    ..
                } => {
                    let child = current
                        .get(*old_index)
                        .cloned()
                        .flatten()
                        .ok_or(PatchError::MissingChild { index: *old_index })?;
                    let child = self.update_node(&child, node)?;
                    current[*old_index] = Some(child.clone());
                    if !moved[*old_index] {
                        moved[*old_index] = true;
                        placed.push((*new_index, child));
                    }
                }
            }
        }

        let order = self.final_order(parent, current, &moved, placed)?;
        self.arrange(parent, &order)
    }

    /// Works out the child list after all operations. Moved and inserted
    /// children go to their new index; untouched keyed children stay at their
    /// index; untouched un-keyed children fill the remaining slots in order.
    fn final_order(
        &self,
        parent: &D::Node,
        current: Vec<Option<D::Node>>,
        moved: &[bool],
        placed: Vec<(usize, D::Node)>,
    ) -> Result<Vec<D::Node>, PatchError> {
        let misaligned = || PatchError::Misaligned(format!("{parent:?}"));

        let untouched: Vec<(usize, D::Node)> = current
            .into_iter()
            .enumerate()
            .filter(|(index, _)| !moved[*index])
            .filter_map(|(index, child)| child.map(|child| (index, child)))
            .collect();

        let mut order: Vec<Option<D::Node>> = vec![None; placed.len() + untouched.len()];
        for (index, child) in placed {
            match order.get_mut(index) {
                Some(slot @ None) => *slot = Some(child),
                _ => return Err(misaligned()),
            }
        }

        let mut leftovers = Vec::new();
        for (index, child) in untouched {
            let keyed = self.nodes.get(&child).is_some_and(|vnode| vnode.key().is_some());
            match order.get_mut(index) {
                Some(slot @ None) if keyed => *slot = Some(child),
                _ => leftovers.push(child),
            }
        }

        let mut leftovers = leftovers.into_iter();
        for slot in &mut order {
            if slot.is_none() {
                *slot = leftovers.next();
            }
        }

        order.into_iter().collect::<Option<Vec<_>>>().ok_or_else(misaligned)
    }

    fn arrange(&self, parent: &D::Node, order: &[D::Node]) -> Result<(), PatchError> {
        let dom = self.dom;
        let mut live = dom.child_nodes(parent);
        for (index, child) in order.iter().enumerate() {
            if live.get(index) == Some(child) {
                continue;
            }
            let reference = live.get(index).cloned();
            dom.insert_before(parent, child, reference.as_ref())?;
            if let Some(position) = live.iter().position(|node| node == child) {
                live.remove(position);
            }
            live.insert(index.min(live.len()), child.clone());
        }
        Ok(())
    }

    /// Brings `node` up to date with `vnode`, returning the node now in its place.
    fn update_node(&mut self, node: &D::Node, vnode: &Rc<VNode>) -> Result<D::Node, PatchError> {
        let dom = self.dom;
        let current = match self.nodes.get(node).cloned() {
            Some(previous) => {
                let patches = diff(Some(&previous), Some(vnode));
                self.patch_node(node, &patches)?.unwrap_or_else(|| node.clone())
            }
            None => match vnode.as_text() {
                Some(text) if dom.node_kind(node) == NodeKind::Text => {
                    dom.set_text_content(node, text)?;
                    node.clone()
                }
                _ => {
                    let parent = dom
                        .parent_node(node)
                        .ok_or_else(|| PatchError::Detached(format!("{node:?}")))?;
                    let replacement = self.materialize(vnode)?;
                    dom.replace_child(&parent, &replacement, node)?;
                    self.release(node);
                    replacement
                }
            },
        };
        self.nodes.insert(current.clone(), vnode.clone());
        Ok(current)
    }

    /// Forgets `node` and its descendants in the node map and the action
    /// table, detaching the plain listeners their recorded vnodes carry.
    pub fn release(&mut self, node: &D::Node) {
        let mut stack = vec![node.clone()];
        while let Some(node) = stack.pop() {
            if let Some(vnode) = self.nodes.remove(&node) {
                self.detach_listeners(&node, &vnode);
            }
            stack.extend(self.dom.child_nodes(&node));
        }
        self.events.release(node);
    }

    fn detach_listeners(&self, node: &D::Node, vnode: &VNode) {
        let Some(Value::On(handlers)) = vnode.as_element().and_then(|element| element.props.get("on"))
        else {
            return;
        };
        for (event_type, handler) in handlers {
            if let Handler::Listener(listener) = handler {
                if let Err(err) = self.dom.remove_event_listener(node, event_type, listener, false) {
                    warn!(error = %err, event = %event_type, "failed to detach listener");
                }
            }
        }
    }

    /// Detaches every child of `container`, releasing each subtree.
    ///
    /// # Errors
    ///
    /// Propagates DOM failures.
    pub fn clear(&mut self, container: &D::Node) -> Result<(), PatchError> {
        while let Some(child) = self.dom.first_child(container) {
            self.release(&child);
            self.dom.remove_child(container, &child)?;
        }
        Ok(())
    }
}

/// Runs the `singultus/on-render` callback in `props` with `node`, if any.
pub fn run_render_hook<N: 'static>(props: &Props, node: &N) {
    if let Some(hook) = props.get(ON_RENDER_PROP).and_then(Value::as_callback) {
        if !hook.call(node) {
            warn!(
                expected = core::any::type_name::<N>(),
                "on-render hook was registered for a different node type"
            );
        }
    }
}
