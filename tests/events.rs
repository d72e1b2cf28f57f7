use std::{cell::RefCell, rc::Rc};

use serde_json::json;
use singultus::{
    Dom, Enrichment, EventAction, EventConfig, EventDispatcher, EventSystem, Renderer,
    RendererBuilder, Subscription, h,
};
use singultus_memory::{MemoryDom, NodeId};

type Log = Rc<RefCell<Vec<EventAction>>>;

fn setup() -> (MemoryDom, NodeId, Renderer<MemoryDom>) {
    let dom = MemoryDom::new();
    let container = dom.create_container().unwrap();
    let renderer = Renderer::new(dom.clone());
    (dom, container, renderer)
}

fn record(events: &EventSystem<MemoryDom>) -> (Log, Subscription) {
    let log: Log = Rc::default();
    let sink = log.clone();
    let subscription = events
        .dispatcher()
        .subscribe(Box::new(move |action| sink.borrow_mut().push(action.clone())));
    (log, subscription)
}

fn kinds(log: &Log) -> Vec<String> {
    log.borrow().iter().map(|action| action.kind.clone()).collect()
}

#[test]
fn nearest_action_wins() {
    let (dom, container, mut renderer) = setup();
    renderer.render(
        &container,
        h("div")
            .action("click", EventAction::new("OUTER"))
            .child(
                h("button")
                    .action("click", EventAction::new("INNER"))
                    .child(h("span").child("label")),
            ),
    );
    let (log, _subscription) = record(renderer.events());

    let span = dom.first_by_tag(container, "span").unwrap();
    let not_prevented = dom.click(span);

    assert_eq!(kinds(&log), ["INNER"]);
    assert!(!not_prevented);

    let div = dom.first_by_tag(container, "div").unwrap();
    dom.click(div);
    assert_eq!(kinds(&log), ["INNER", "OUTER"]);
}

#[test]
fn events_without_actions_are_ignored() {
    let (dom, container, mut renderer) = setup();
    renderer.render(
        &container,
        h("div")
            .child(h("button").action("click", EventAction::new("GO")))
            .child(h("p").child("plain")),
    );
    let (log, _subscription) = record(renderer.events());

    let paragraph = dom.first_by_tag(container, "p").unwrap();
    assert!(dom.click(paragraph));
    assert!(dom.dispatch_event(paragraph, "keydown"));
    assert!(log.borrow().is_empty());
}

#[test]
fn one_listener_per_event_type_on_the_document() {
    let (dom, container, mut renderer) = setup();
    renderer.render(
        &container,
        h("ul").children((0..5).map(|index| h("li").action("click", EventAction::new("PICK").with_datum("index", index)))),
    );

    assert!(renderer.events().is_initialized());
    assert_eq!(dom.listener_count(dom.document(), Some("click")), 1);
    assert_eq!(dom.listener_count(dom.document(), None), 10);

    let items = dom.find_by_tag(container, "li");
    assert_eq!(items.len(), 5);
    for item in items {
        assert_eq!(dom.listener_count(item, None), 0);
    }
}

#[test]
fn enrichment_uses_its_own_namespace() {
    let (dom, container, mut renderer) = setup();
    let action = EventAction::new("TYPED")
        .with_datum("bioroid", json!({"keep": true}))
        .with_datum("field", "name")
        .with_enrichment(Enrichment::default().value().namespace("custom"));
    renderer.render(&container, h("input").attr("type", "text").action("input", action.clone()));
    let (log, _subscription) = record(renderer.events());

    let input = dom.first_child(&container).unwrap();
    dom.input(input, "x").unwrap();

    let dispatched = log.borrow()[0].clone();
    assert_eq!(dispatched.datum("custom"), Some(&json!({"value": "x"})));
    assert_eq!(dispatched.datum("bioroid"), Some(&json!({"keep": true})));
    assert_eq!(dispatched.datum("field"), Some(&json!("name")));

    let stored = renderer.events().action(&input, "input").unwrap();
    assert_eq!(stored, action);
    assert!(stored.datum("custom").is_none());
}

#[test]
fn enrichment_defaults_to_the_configured_namespace() {
    let (dom, container, mut renderer) = setup();
    dom.set_time(1_700.9);
    renderer.render(
        &container,
        h("input").attr("type", "checkbox").action(
            "change",
            EventAction::new("TOGGLED")
                .with_enrichment(Enrichment::default().checked().value().timestamp()),
        ),
    );
    let (log, _subscription) = record(renderer.events());

    let input = dom.first_child(&container).unwrap();
    dom.check(input, true).unwrap();

    let dispatched = log.borrow()[0].clone();
    assert_eq!(
        dispatched.datum("bioroid"),
        Some(&json!({"value": "", "checked": true, "timestamp": 1700}))
    );
}

#[test]
fn enrichment_skips_input_state_on_other_elements() {
    let (dom, container, mut renderer) = setup();
    renderer.render(
        &container,
        h("button").action(
            "click",
            EventAction::new("PRESSED").with_enrichment(Enrichment::default().value().checked()),
        ),
    );
    let (log, _subscription) = record(renderer.events());

    let button = dom.first_child(&container).unwrap();
    dom.click(button);

    let dispatched = log.borrow()[0].clone();
    assert!(dispatched.datum("bioroid").is_none());
    assert!(dispatched.data.is_some());
}

#[test]
fn actions_without_enrichment_are_dispatched_unchanged() {
    let (dom, container, mut renderer) = setup();
    let action = EventAction::new("SAVE").with_datum("id", 3);
    renderer.render(&container, h("form").action("submit", action.clone()));
    let (log, _subscription) = record(renderer.events());

    let form = dom.first_child(&container).unwrap();
    dom.dispatch_event(form, "submit");

    assert_eq!(*log.borrow(), vec![action]);
}

#[test]
fn updated_actions_replace_old_ones() {
    let (dom, container, mut renderer) = setup();
    let view = |kind: &str| h("button").action("click", EventAction::new(kind));

    renderer.render(&container, view("FIRST"));
    renderer.render(&container, view("SECOND"));
    let (log, _subscription) = record(renderer.events());

    let button = dom.first_child(&container).unwrap();
    dom.click(button);
    assert_eq!(kinds(&log), ["SECOND"]);

    renderer.render(&container, h("button"));
    assert!(renderer.events().actions_for(&button).is_none());
    dom.click(button);
    assert_eq!(kinds(&log), ["SECOND"]);
}

#[test]
fn removed_elements_release_their_actions() {
    let (dom, container, mut renderer) = setup();
    let list = |keys: &[&str]| {
        h("ul").children(
            keys.iter()
                .map(|key| h("li").key(*key).action("click", EventAction::new(*key))),
        )
    };

    renderer.render(&container, list(&["a", "b"]));
    let removed = dom.find_by_tag(container, "li")[1];
    assert!(renderer.events().actions_for(&removed).is_some());

    renderer.render(&container, list(&["a"]));
    assert!(renderer.events().actions_for(&removed).is_none());
}

#[test]
fn reset_detaches_listeners_and_keeps_actions() {
    let (dom, container, mut renderer) = setup();
    renderer.render(&container, h("button").action("click", EventAction::new("GO")));
    let (before, subscription) = record(renderer.events());
    let button = dom.first_child(&container).unwrap();

    renderer.events().reset().unwrap();
    assert!(!renderer.events().is_initialized());
    assert_eq!(dom.listener_count(dom.document(), None), 0);
    dom.click(button);
    assert!(before.borrow().is_empty());

    renderer.events().initialize().unwrap();
    let (after, _subscription) = record(renderer.events());
    dom.click(button);
    assert_eq!(kinds(&after), ["GO"]);
    assert!(before.borrow().is_empty());
    subscription.unsubscribe();
}

#[test]
fn custom_dispatcher_receives_actions() {
    #[derive(Default)]
    struct Queue(RefCell<Vec<String>>);

    impl EventDispatcher for Queue {
        fn dispatch(&self, action: &EventAction) {
            self.0.borrow_mut().push(action.kind.clone());
        }

        fn subscribe(&self, _handler: Box<dyn Fn(&EventAction)>) -> Subscription {
            Subscription::new(|| {})
        }
    }

    let (dom, container, mut renderer) = setup();
    let queue = Rc::new(Queue::default());
    renderer.events().set_dispatcher(queue.clone());
    renderer.render(&container, h("a").action("click", EventAction::new("NAVIGATE")));

    dom.click(dom.first_child(&container).unwrap());

    assert_eq!(*queue.0.borrow(), ["NAVIGATE"]);
}

#[test]
fn configuration_controls_types_and_depth() {
    let dom = MemoryDom::new();
    let container = dom.create_container().unwrap();
    let config = EventConfig::default().with_event("dblclick").with_max_depth(2);
    let mut renderer = RendererBuilder::new().with_event_config(config).build(dom.clone());

    renderer.render(
        &container,
        h("section")
            .action("dblclick", EventAction::new("ZOOM"))
            .action("click", EventAction::new("FAR"))
            .child(h("div").child(h("em").child("deep"))),
    );
    let (log, _subscription) = record(renderer.events());
    let section = dom.first_child(&container).unwrap();
    let div = dom.first_by_tag(container, "div").unwrap();
    let em = dom.first_by_tag(container, "em").unwrap();

    dom.dispatch_event(div, "dblclick");
    assert_eq!(kinds(&log), ["ZOOM"]);

    // Two hops above the target is out of reach.
    dom.click(em);
    assert_eq!(kinds(&log), ["ZOOM"]);

    dom.click(section);
    assert_eq!(kinds(&log), ["ZOOM", "FAR"]);
}

#[test]
fn event_systems_are_independent() {
    let dom = MemoryDom::new();
    let first = EventSystem::new(dom.clone());
    let second = EventSystem::new(dom.clone());
    let button = dom.create_element("button").unwrap();
    dom.append_child(&dom.body().unwrap(), &button).unwrap();

    first.attach_action(&button, "click", EventAction::new("A")).unwrap();
    let (first_log, _first) = record(&first);
    let (second_log, _second) = record(&second);

    dom.click(button);

    assert_eq!(kinds(&first_log), ["A"]);
    assert!(second_log.borrow().is_empty());
    assert!(!second.is_initialized());
}
