//! Direct rendering from hyperscript without virtual nodes or diff state.

use singultus_core::{
    Dom, Element, Node, SVG_NAMESPACE, is_svg_tag, parse_tag, value::format_number,
    vnode::resolve_props,
};

use crate::{attributes::AttributeReconciler, error::PatchError, events::EventSystem, patch::run_render_hook};

/// Clears `container` and builds `element` into it.
///
/// A top-level fragment contributes its children directly; a null element
/// leaves the container empty.
///
/// # Errors
///
/// Propagates DOM failures.
pub fn render_simple<D: Dom>(
    dom: &D,
    events: &EventSystem<D>,
    container: &D::Node,
    element: &Element,
) -> Result<(), PatchError> {
    while let Some(child) = dom.first_child(container) {
        events.release(&child);
        dom.remove_child(container, &child)?;
    }

    let builder = DirectBuilder { dom, events };
    match element {
        Element::Fragment(items) => builder.append_all(container, items, false),
        element => {
            if let Some(node) = builder.create(element, false)? {
                dom.append_child(container, &node)?;
            }
            Ok(())
        }
    }
}

struct DirectBuilder<'a, D: Dom> {
    dom: &'a D,
    events: &'a EventSystem<D>,
}

impl<D: Dom> DirectBuilder<'_, D> {
    fn create(&self, element: &Element, parent_is_svg: bool) -> Result<Option<D::Node>, PatchError> {
        let dom = self.dom;
        let node = match element {
            Element::Null => return Ok(None),
            Element::Bool(_) => dom.create_text_node("")?,
            Element::Number(number) => dom.create_text_node(&format_number(*number))?,
            Element::Text(text) => dom.create_text_node(text)?,
            Element::Node(node) => self.create_node(node, parent_is_svg)?,
            Element::Fragment(items) => {
                let wrapper = dom.create_element("div")?;
                dom.set_style_property(&wrapper, "display", "contents")?;
                self.append_all(&wrapper, items, parent_is_svg)?;
                wrapper
            }
        };
        Ok(Some(node))
    }

    fn create_node(&self, node: &Node, parent_is_svg: bool) -> Result<D::Node, PatchError> {
        let dom = self.dom;
        let selector = parse_tag(&node.tag);
        let is_svg = parent_is_svg || is_svg_tag(&selector.tag_name);
        let props = resolve_props(&selector, node.props.clone());

        let element = if is_svg {
            dom.create_element_ns(SVG_NAMESPACE, &selector.tag_name)?
        } else {
            dom.create_element(&selector.tag_name)?
        };
        AttributeReconciler::new(dom, self.events).apply(&element, &props, is_svg)?;
        self.append_all(&element, &node.children, is_svg)?;
        run_render_hook(&props, &element);
        Ok(element)
    }

    fn append_all(&self, parent: &D::Node, items: &[Element], is_svg: bool) -> Result<(), PatchError> {
        for item in items {
            if let Some(child) = self.create(item, is_svg)? {
                self.dom.append_child(parent, &child)?;
            }
        }
        Ok(())
    }
}
