use std::{cell::RefCell, rc::Rc};

use singultus::{
    Dom, DomError, Element, EventAction, PatchError, RenderError, RenderOutcome, Renderer,
    RendererBuilder, h,
};
use singultus_memory::{MemoryDom, NodeId};

fn setup() -> (MemoryDom, NodeId, Renderer<MemoryDom>) {
    let dom = MemoryDom::new();
    let container = dom.create_container().unwrap();
    let renderer = Renderer::new(dom.clone());
    (dom, container, renderer)
}

fn todo_list(items: &[(&str, bool)]) -> Element {
    h("ul.todos")
        .style("color", "red")
        .children(items.iter().map(|(label, done)| {
            h("li")
                .key(*label)
                .prop("class", if *done { "done" } else { "open" })
                .action("click", EventAction::new("TOGGLE").with_datum("id", *label))
                .child(*label)
        }))
        .into()
}

#[test]
fn first_render_mounts_the_tree() {
    let (dom, container, mut renderer) = setup();

    let outcome = renderer.render(&container, h("p#intro.note").child("hi"));

    assert_eq!(outcome, RenderOutcome::Mounted);
    assert_eq!(
        dom.inner_html(container),
        r#"<p id="intro" class="note">hi</p>"#
    );
    assert!(renderer.last_vnode(&container).is_some());
}

#[test]
fn repeat_render_touches_nothing() {
    let (dom, container, mut renderer) = setup();
    let items = [("milk", false), ("eggs", true)];

    renderer.render(&container, todo_list(&items));
    let before = dom.inner_html(container);
    dom.reset_mutation_count();

    let outcome = renderer.render(&container, todo_list(&items));

    assert_eq!(outcome, RenderOutcome::Unchanged);
    assert_eq!(dom.mutation_count(), 0);
    assert_eq!(dom.inner_html(container), before);
}

#[test]
fn equal_styles_do_not_update() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("p").style("fontSize", "12px"));
    dom.reset_mutation_count();
    let outcome = renderer.render(&container, h("p").style("fontSize", "12px"));

    assert_eq!(outcome, RenderOutcome::Unchanged);
    assert_eq!(dom.mutation_count(), 0);
}

#[test]
fn text_changes_keep_nodes() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("p").child("before"));
    let paragraph = dom.first_child(&container).unwrap();
    let text = dom.first_child(&paragraph).unwrap();

    let outcome = renderer.render(&container, h("p").child("after"));

    assert!(matches!(outcome, RenderOutcome::Patched(_)));
    assert_eq!(dom.inner_html(container), "<p>after</p>");
    assert_eq!(dom.first_child(&container), Some(paragraph));
    assert_eq!(dom.first_child(&paragraph), Some(text));
}

#[test]
fn root_text_node_is_updated_in_place() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, "hello");
    let text = dom.first_child(&container).unwrap();
    renderer.render(&container, "world");

    assert_eq!(dom.inner_html(container), "world");
    assert_eq!(dom.first_child(&container), Some(text));
}

#[test]
fn changing_the_root_tag_replaces_it() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("p").child("x"));
    let outcome = renderer.render(&container, h("section").child("x"));

    assert_eq!(outcome, RenderOutcome::Patched(1));
    assert_eq!(dom.inner_html(container), "<section>x</section>");
}

#[test]
fn root_props_update_in_place() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, h("div").attr("title", "one").child("body"));
    let root = dom.first_child(&container).unwrap();
    renderer.render(&container, h("div").attr("title", "two").child("body"));

    assert_eq!(dom.first_child(&container), Some(root));
    assert_eq!(dom.get_attribute(&root, "title").as_deref(), Some("two"));
}

#[test]
fn null_clears_the_container_and_its_state() {
    let (dom, container, mut renderer) = setup();

    assert_eq!(renderer.render(&container, ()), RenderOutcome::Cleared);
    assert!(renderer.last_vnode(&container).is_none());

    renderer.render(&container, h("p"));
    assert_eq!(renderer.render(&container, ()), RenderOutcome::Patched(1));
    assert_eq!(dom.inner_html(container), "");
    assert!(renderer.last_vnode(&container).is_none());

    assert_eq!(renderer.render(&container, h("p")), RenderOutcome::Mounted);
}

#[test]
fn first_render_discards_foreign_content() {
    let (dom, container, mut renderer) = setup();
    let stale = dom.create_text_node("server markup").unwrap();
    dom.append_child(&container, &stale).unwrap();

    renderer.render(&container, h("main"));

    assert_eq!(dom.inner_html(container), "<main></main>");
}

#[test]
fn keyed_reorder_keeps_identity() {
    let (dom, container, mut renderer) = setup();
    let list = |keys: &[&str]| h("ul").children(keys.iter().map(|key| h("li").key(*key).child(*key)));

    renderer.render(&container, list(&["a", "b"]));
    let ul = dom.first_child(&container).unwrap();
    let before = dom.child_nodes(&ul);

    renderer.render(&container, list(&["b", "a"]));
    let after = dom.child_nodes(&ul);

    assert_eq!(dom.inner_html(ul), "<li>b</li><li>a</li>");
    assert_eq!(after, vec![before[1], before[0]]);
}

#[test]
fn keyed_items_survive_edits_around_them() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, todo_list(&[("milk", false), ("eggs", false), ("tea", false)]));
    let ul = dom.first_child(&container).unwrap();
    let eggs = dom.child_nodes(&ul)[1];

    renderer.render(&container, todo_list(&[("bread", false), ("eggs", true)]));

    assert_eq!(
        dom.inner_html(ul),
        r#"<li class="open">bread</li><li class="done">eggs</li>"#
    );
    assert_eq!(dom.child_nodes(&ul)[1], eggs);
}

#[test]
fn top_level_fragment_has_no_wrapper() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, vec![h("li").child("a"), h("li").child("b")]);
    assert_eq!(dom.inner_html(container), "<li>a</li><li>b</li>");
    assert_eq!(dom.element_children(container).len(), 2);
    let first = dom.child_nodes(&container)[0];

    renderer.render(
        &container,
        vec![h("li").child("a"), h("li").child("B"), h("li").child("c")],
    );
    assert_eq!(dom.inner_html(container), "<li>a</li><li>B</li><li>c</li>");
    assert_eq!(dom.child_nodes(&container)[0], first);
}

#[test]
fn nested_fragments_use_a_transparent_wrapper() {
    let (dom, container, mut renderer) = setup();

    renderer.render(
        &container,
        h("div").child(vec![h("span").child("a"), h("span").child("b")]),
    );

    assert_eq!(
        dom.inner_html(container),
        r#"<div><div style="display: contents;"><span>a</span><span>b</span></div></div>"#
    );
}

#[test]
fn switching_between_fragment_and_element_roots() {
    let (dom, container, mut renderer) = setup();

    renderer.render(&container, vec!["a", "b"]);
    renderer.render(&container, h("p").child("c"));
    assert_eq!(dom.inner_html(container), "<p>c</p>");

    renderer.render(&container, vec!["d", "e"]);
    assert_eq!(dom.inner_html(container), "de");
}

#[test]
fn injected_failure_falls_back_to_full_render() {
    let (dom, container, mut renderer) = setup();
    renderer.render(&container, todo_list(&[("milk", false), ("eggs", false)]));

    dom.fail_next_mutation();
    let latest = todo_list(&[("eggs", true), ("milk", false), ("tea", false)]);
    let outcome = renderer.render(&container, latest.clone());

    assert_eq!(outcome, RenderOutcome::Recovered);
    let reference = dom.create_container().unwrap();
    Renderer::new(dom.clone()).render(&reference, latest);
    assert_eq!(dom.inner_html(container), dom.inner_html(reference));

    // State is consistent again: the next render patches normally.
    let outcome = renderer.render(&container, todo_list(&[("eggs", true)]));
    assert!(matches!(outcome, RenderOutcome::Patched(_)));
    assert_eq!(
        dom.inner_html(container),
        r#"<ul style="color: red;" class="todos"><li class="done">eggs</li></ul>"#
    );
}

#[test]
fn missing_root_falls_back_to_full_render() {
    let (dom, container, mut renderer) = setup();
    renderer.render(&container, h("p"));
    let root = dom.first_child(&container).unwrap();
    dom.remove_child(&container, &root).unwrap();

    let outcome = renderer.render(&container, h("p.moved"));

    assert_eq!(outcome, RenderOutcome::Recovered);
    assert_eq!(dom.inner_html(container), r#"<p class="moved"></p>"#);
}

#[test]
fn disabled_fallback_reports_the_error() {
    let dom = MemoryDom::new();
    let container = dom.create_container().unwrap();
    let mut renderer = RendererBuilder::new().with_fallback(false).build(dom.clone());

    renderer.render(&container, h("p").child("a"));
    dom.fail_next_mutation();
    let result = renderer.try_render(&container, h("p").child("b"));

    assert!(matches!(
        result,
        Err(RenderError::Patch(PatchError::Dom(DomError::Host(_))))
    ));
    assert!(renderer.last_vnode(&container).is_none());

    dom.fail_next_mutation();
    assert_eq!(renderer.render(&container, h("p")), RenderOutcome::Failed);
}

#[test]
fn render_hook_sees_the_element_on_mount_and_update() {
    let (dom, container, mut renderer) = setup();
    let seen = Rc::new(RefCell::new(Vec::new()));

    let view = |label: &str| {
        let seen = seen.clone();
        h("canvas")
            .attr("aria-label", label)
            .on_render(move |node: &NodeId| seen.borrow_mut().push(*node))
    };

    renderer.render(&container, view("first"));
    let canvas = dom.first_child(&container).unwrap();
    renderer.render(&container, view("second"));

    assert_eq!(*seen.borrow(), vec![canvas, canvas]);
}

#[test]
fn containers_are_independent() {
    let (dom, first, mut renderer) = setup();
    let second = dom.create_container().unwrap();

    renderer.render(&first, h("p").child("one"));
    renderer.render(&second, h("p").child("two"));
    renderer.render(&first, h("p").child("uno"));

    assert_eq!(dom.inner_html(first), "<p>uno</p>");
    assert_eq!(dom.inner_html(second), "<p>two</p>");
}

#[test]
fn json_input_renders() {
    let (dom, container, mut renderer) = setup();
    let view = serde_json::json!([
        "form#login",
        {"data-step": 1},
        ["label", {"htmlFor": "user"}, "User"],
        ["input#user", {"type": "text", "value": "ada"}]
    ]);

    renderer.render(&container, view.clone());
    assert_eq!(
        dom.inner_html(container),
        r#"<form data-step="1" id="login"><label for="user">User</label><input type="text" id="user"></form>"#
    );

    dom.reset_mutation_count();
    assert_eq!(renderer.render(&container, view), RenderOutcome::Unchanged);
    assert_eq!(dom.mutation_count(), 0);
}

#[test]
fn outcomes_have_stable_names() {
    let (_dom, container, mut renderer) = setup();

    let mounted = renderer.render(&container, h("p").child("a"));
    let patched = renderer.render(&container, h("p").child("b"));
    let unchanged = renderer.render(&container, h("p").child("b"));

    assert_eq!(mounted.name(), "mounted");
    assert_eq!(patched.name(), "patched");
    assert!(patched.patch_count() >= 1);
    assert_eq!(unchanged.name(), "unchanged");
    assert_eq!(unchanged.patch_count(), 0);
    assert_eq!(RenderOutcome::Patched(3).name(), "patched");
    assert_eq!(RenderOutcome::Patched(3).patch_count(), 3);
    assert_eq!(RenderOutcome::Cleared.name(), "cleared");
    assert_eq!(RenderOutcome::Recovered.name(), "recovered");
    assert_eq!(RenderOutcome::Failed.name(), "failed");
}
