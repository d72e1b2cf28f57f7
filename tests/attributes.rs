use std::{cell::Cell, rc::Rc};

use singultus::{Dom, DomEvent, Renderer, SVG_NAMESPACE, Value, h};
use singultus_memory::{MemoryDom, NodeId};

fn setup() -> (MemoryDom, NodeId, Renderer<MemoryDom>) {
    let dom = MemoryDom::new();
    let container = dom.create_container().unwrap();
    let renderer = Renderer::new(dom.clone());
    (dom, container, renderer)
}

fn has_attribute(dom: &MemoryDom, node: NodeId, name: &str) -> bool {
    dom.attributes(node).iter().any(|(key, _)| key == name)
}

#[test]
fn checked_toggles_the_live_property() {
    let (dom, container, mut renderer) = setup();
    let checkbox = |checked: bool| h("input").attr("type", "checkbox").prop("checked", checked);

    renderer.render(&container, checkbox(true));
    let input = dom.first_child(&container).unwrap();
    assert_eq!(dom.property(input, "checked"), Some(Value::Bool(true)));
    assert_eq!(dom.input_checked(&input), Some(true));
    assert!(!has_attribute(&dom, input, "checked"));

    renderer.render(&container, checkbox(false));
    assert_eq!(dom.property(input, "checked"), Some(Value::Bool(false)));
    assert_eq!(dom.input_checked(&input), Some(false));
    assert!(!has_attribute(&dom, input, "checked"));
}

#[test]
fn value_is_a_property_not_an_attribute() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("input").prop("value", "draft"));
    let input = dom.first_child(&container).unwrap();

    assert_eq!(dom.input_value(&input).as_deref(), Some("draft"));
    assert_eq!(dom.outer_html(input), "<input>");
}

#[test]
fn boolean_attributes_are_added_and_removed() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("button").prop("disabled", true).child("Go"));
    let button = dom.first_child(&container).unwrap();
    assert_eq!(dom.get_attribute(&button, "disabled").as_deref(), Some("disabled"));

    renderer.render(&container, h("button").prop("disabled", false).child("Go"));
    assert!(!has_attribute(&dom, button, "disabled"));
}

#[test]
fn style_maps_and_css_text() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("div").style("backgroundColor", "blue").style("width", 10),
    );
    let div = dom.first_child(&container).unwrap();
    assert_eq!(dom.style_property(div, "background-color").as_deref(), Some("blue"));
    assert_eq!(dom.style_property(div, "width").as_deref(), Some("10"));

    renderer.render(&container, h("div").prop("style", "margin: 0"));
    assert_eq!(dom.style_property(div, "margin").as_deref(), Some("0"));
    assert_eq!(dom.style_property(div, "background-color"), None);

    renderer.render(&container, h("div"));
    assert_eq!(dom.style_property(div, "margin"), None);
}

#[test]
fn removed_props_are_cleared() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("a")
            .prop("class", "link")
            .attr("href", "/home")
            .attr("data-id", 7)
            .prop("tabIndex", 2),
    );
    let link = dom.first_child(&container).unwrap();
    assert_eq!(
        dom.outer_html(link),
        r#"<a class="link" href="/home" data-id="7" tabindex="2"></a>"#
    );

    renderer.render(&container, h("a"));
    assert_eq!(dom.get_attribute(&link, "class").as_deref(), Some(""));
    assert!(!has_attribute(&dom, link, "href"));
    assert!(!has_attribute(&dom, link, "data-id"));
    assert_eq!(dom.get_attribute(&link, "tabindex").as_deref(), Some(""));
}

#[test]
fn null_and_false_class_are_skipped() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("p").prop("class", false).prop("title", Value::Null).child("x"),
    );

    assert_eq!(dom.inner_html(container), "<p>x</p>");
}

#[test]
fn inner_html_and_text_content() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("div")
            .child(h("section").prop("innerHTML", "<b>raw</b>"))
            .child(h("pre").prop("textContent", "<b>escaped</b>")),
    );

    assert_eq!(
        dom.inner_html(container),
        "<div><section><b>raw</b></section><pre>&lt;b&gt;escaped&lt;/b&gt;</pre></div>"
    );
}

#[test]
fn label_for_becomes_the_for_attribute() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("label").prop("htmlFor", "email").child("Email"));

    assert_eq!(dom.inner_html(container), r#"<label for="email">Email</label>"#);
}

#[test]
fn svg_subtrees_use_the_svg_namespace() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("svg")
            .attr("viewBox", "0 0 10 10")
            .child(h("circle.dot").attr("r", 4).prop("checked", true)),
    );
    let svg = dom.first_child(&container).unwrap();
    let circle = dom.first_child(&svg).unwrap();

    assert_eq!(dom.namespace(svg).as_deref(), Some(SVG_NAMESPACE));
    assert_eq!(dom.namespace(circle).as_deref(), Some(SVG_NAMESPACE));
    assert_eq!(
        dom.outer_html(svg),
        r#"<svg viewBox="0 0 10 10"><circle r="4" checked="checked" class="dot"></circle></svg>"#
    );

    renderer.render(&container, h("svg").attr("viewBox", "0 0 10 10").child(h("circle")));
    assert!(!has_attribute(&dom, circle, "class"));
}

#[test]
fn listeners_are_replaced_on_update() {
    let (dom, container, mut renderer) = setup();
    let clicks = Rc::new(Cell::new(0));

    let view = || {
        let clicks = clicks.clone();
        h("button").on("click", move |_: &DomEvent<NodeId>| clicks.set(clicks.get() + 1))
    };

    renderer.render(&container, view());
    let button = dom.first_child(&container).unwrap();
    renderer.render(&container, view());

    assert_eq!(dom.listener_count(button, Some("click")), 1);
    dom.click(button);
    assert_eq!(clicks.get(), 1);

    renderer.render(&container, h("button"));
    assert_eq!(dom.listener_count(button, Some("click")), 0);
}

#[test]
fn removed_elements_lose_their_listeners() {
    let (dom, container, mut renderer) = setup();
    let view = |with_button: bool| {
        let panel = h("div");
        if with_button {
            panel.child(h("button").on("click", |_: &DomEvent<NodeId>| {}))
        } else {
            panel
        }
    };

    renderer.render(&container, view(true));
    let button = dom.first_by_tag(container, "button").unwrap();
    assert_eq!(dom.listener_count(button, None), 1);

    renderer.render(&container, view(false));
    assert!(!dom.is_connected(button));
    assert_eq!(dom.listener_count(button, None), 0);
}

#[test]
fn replaced_roots_lose_their_listeners() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("button").on("click", |_: &DomEvent<NodeId>| {}));
    let button = dom.first_child(&container).unwrap();
    renderer.render(&container, h("a").child("link"));

    assert_eq!(dom.inner_html(container), "<a>link</a>");
    assert_eq!(dom.listener_count(button, None), 0);
}

#[test]
fn direct_rendering_detaches_listeners_of_the_diffed_tree() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("form").child(h("input").on("input", |_: &DomEvent<NodeId>| {})),
    );
    let input = dom.first_by_tag(container, "input").unwrap();
    renderer.render_simple(&container, h("p")).unwrap();

    assert_eq!(dom.inner_html(container), "<p></p>");
    assert_eq!(dom.listener_count(input, None), 0);
}

#[test]
fn reserved_props_never_reach_the_dom() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("ul").child(h("li").key(1).prop("singultus/custom", "x").child("one")),
    );

    assert_eq!(dom.inner_html(container), "<ul><li>one</li></ul>");
}
