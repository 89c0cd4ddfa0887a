#![forbid(unsafe_code)]

//! End-to-end scenarios: open, layer, click, act and close modals through a
//! container bound to the in-memory document.

use modstack::simple::{PRIMARY_ACTION, SECONDARY_ACTION};
use modstack::{
    ClickArea, CloseMode, ContainerConfig, CreateOptions, HandlerError, Layer, ModalEvent,
    ModalKey, ModalService, OptionsPatch, SignalTarget, SimpleContent, SimpleOptions,
    TransitionName,
};
use modstack_harness::{CallLog, StackHarness};

// ============================================================================
// Stack view
// ============================================================================

#[test]
fn count_and_active_follow_registry() {
    let h = StackHarness::new();
    assert_eq!(h.container.count(), 0);
    assert_eq!(h.container.active_id(), None);

    let _a = h.open("A");
    let b = h.open("B");
    assert_eq!(h.container.count(), 2);
    assert_eq!(h.container.active_id(), Some(ModalKey::for_modal("main", &b)));
    assert_eq!(h.topics(), ["added", "added"]);
}

#[test]
fn add_then_remove_restores_snapshot() {
    let h = StackHarness::new();
    h.open("A");
    let before = h.service.registry().snapshot("main");

    let id = h.service.create(
        SimpleContent::new("B"),
        Default::default(),
        CreateOptions::new(),
    );
    assert!(h.service.registry().remove_modal("main", &id));
    assert_eq!(h.service.registry().snapshot("main"), before);
    assert!(!h.container.needs_reconcile());
}

#[test]
fn four_modals_fill_every_layer() {
    let h = StackHarness::new();
    for title in ["A", "B", "C", "D"] {
        h.open(title);
    }
    h.assert_layers(&[Layer::Hidden, Layer::Tertiary, Layer::Secondary, Layer::Active]);
    assert_eq!(h.container.layer_class(0), "modal-hidden");
    assert_eq!(h.container.layer_class(3), "modal-active");
}

#[test]
fn layer_signals_target_siblings_only() {
    let h = StackHarness::new();
    let a = h.open("A");
    h.clear_events();
    let b = h.open("B");

    let layer_events: Vec<ModalEvent> = h
        .events()
        .into_iter()
        .filter(|event| matches!(event, ModalEvent::Layer { .. }))
        .collect();
    assert_eq!(
        layer_events,
        [ModalEvent::Layer {
            target: SignalTarget::Identifier(a),
            layer: Layer::Secondary,
        }]
    );
    assert_eq!(h.instance(&b).map(|i| i.layer()), Some(Layer::Active));
}

#[test]
fn closing_top_reactivates_the_one_below() {
    let h = StackHarness::new();
    let a = h.open("A");
    let b = h.open("B");
    let c = h.open("C");
    h.assert_layers(&[Layer::Tertiary, Layer::Secondary, Layer::Active]);

    h.close(&c, CloseMode::Manual);
    h.assert_layers(&[Layer::Secondary, Layer::Active]);
    assert_eq!(h.container.active_id(), Some(ModalKey::for_modal("main", &b)));

    h.close(&b, CloseMode::Manual);
    h.assert_layers(&[Layer::Active]);
    assert!(h.instance(&a).is_some());
}

#[test]
fn hidden_modal_resurfaces() {
    let h = StackHarness::new();
    let ids: Vec<_> = ["A", "B", "C", "D", "E"].iter().map(|t| h.open(t)).collect();
    h.assert_layers(&[
        Layer::Hidden,
        Layer::Hidden,
        Layer::Tertiary,
        Layer::Secondary,
        Layer::Active,
    ]);

    h.close(&ids[4], CloseMode::Manual);
    h.assert_layers(&[Layer::Hidden, Layer::Tertiary, Layer::Secondary, Layer::Active]);
}

// ============================================================================
// Close lifecycle
// ============================================================================

#[test]
fn double_close_runs_once() {
    let h = StackHarness::new();
    let log = CallLog::new();
    let sink = log.clone();
    let id = h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new().on_close(move |mode| sink.push(mode.as_str())),
    );
    let instance = h.instance(&id).expect("mounted");

    h.platform.animator.hold(true);
    let first = instance.clone();
    h.platform.spawn(async move { first.close(CloseMode::Manual).await });
    let second = instance.clone();
    h.platform.spawn(async move { second.close(CloseMode::Click).await });
    h.platform.settle();
    assert!(instance.is_closing());
    assert_eq!(h.platform.animator.pending(), 1);

    h.platform.animator.complete_all();
    h.platform.animator.hold(false);
    h.sync();

    assert_eq!(log.entries(), ["manual"]);
    assert_eq!(h.topics(), ["added", "beforeRemove"]);
    assert_eq!(h.container.count(), 0);
}

#[test]
fn overlay_click_closes_closable_modal() {
    let h = StackHarness::new();
    let log = CallLog::new();
    let sink = log.clone();
    h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new().on_close(move |mode| sink.push(mode.as_str())),
    );

    h.click_overlay();
    assert_eq!(log.entries(), ["overlay"]);
    assert_eq!(h.topics(), ["added", "beforeRemove"]);
    assert!(h.container.is_empty());
    assert!(h.container.instances().is_empty());
}

#[test]
fn overlay_click_only_reaches_active_modal() {
    let h = StackHarness::new();
    let a = h.open("A");
    let b = h.open("B");

    h.click_overlay();
    assert_eq!(h.container.count(), 1);
    assert!(h.instance(&a).is_some());
    assert!(h.instance(&b).is_none());
    h.assert_layers(&[Layer::Active]);
}

#[test]
fn non_closable_defaults_refuse_overlay_click() {
    let service = ModalService::default();
    service.set_default_options(&OptionsPatch::new().closable(false));
    let h = StackHarness::with_config(service, ContainerConfig::default());
    let id = h.open("A");
    h.platform.animator.clear();

    h.click_overlay();
    assert_eq!(h.container.count(), 1);
    assert!(h.instance(&id).is_some());
    assert_eq!(
        h.platform.animator.transitions(),
        [Some(TransitionName::Refuse)]
    );
    assert_eq!(h.topics(), ["added"]);
}

#[test]
fn content_click_without_handler_is_ignored() {
    let h = StackHarness::new();
    let id = h.open("A");
    h.platform.animator.clear();

    h.click_inside(&id);
    assert_eq!(h.container.count(), 1);
    assert!(h.platform.animator.calls().is_empty());
}

#[test]
fn click_handler_false_refuses() {
    let h = StackHarness::new();
    let log = CallLog::new();
    let sink = log.clone();
    let id = h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new()
            .on_click(move |area: ClickArea| {
                sink.push(area.as_str());
                async { Ok::<bool, HandlerError>(false) }
            })
            .on_close(|_| panic!("must stay open")),
    );
    h.platform.animator.clear();

    h.click_overlay();
    assert_eq!(log.entries(), ["overlay"]);
    assert!(h.instance(&id).is_some());
    assert_eq!(
        h.platform.animator.transitions(),
        [Some(TransitionName::Refuse)]
    );

    h.click_inside(&id);
    assert_eq!(log.entries(), ["overlay", "modal"]);
    assert_eq!(h.platform.animator.calls().len(), 1, "content refusal does not shake");
}

#[test]
fn click_handler_true_closes_with_click_mode() {
    let h = StackHarness::new();
    let log = CallLog::new();
    let sink = log.clone();
    let id = h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new()
            .on_click(|area: ClickArea| async move {
                Ok::<bool, HandlerError>(area == ClickArea::Modal)
            })
            .on_close(move |mode| sink.push(mode.as_str())),
    );

    h.click_inside(&id);
    assert_eq!(log.entries(), ["click"]);
    assert!(h.container.is_empty());
}

#[test]
fn click_handler_error_keeps_modal_open() {
    let h = StackHarness::new();
    let id = h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new().on_click(|_area: ClickArea| async {
            Err::<bool, HandlerError>("backend down".into())
        }),
    );

    h.click_overlay();
    let instance = h.instance(&id).expect("still mounted");
    assert!(!instance.is_loading());
    assert!(!instance.is_closing());
}

// ============================================================================
// Actions
// ============================================================================

#[test]
fn primary_action_closes_once() {
    let h = StackHarness::new();
    let log = CallLog::new();
    let actions = log.clone();
    let closes = log.clone();
    let id = h.open_with(
        SimpleContent::confirm("Delete?", "Sure?"),
        CreateOptions::new()
            .on_action(move |key: &str, _data| {
                actions.push(format!("action:{key}"));
                let approve = key == PRIMARY_ACTION;
                async move { Ok::<bool, HandlerError>(approve) }
            })
            .on_close(move |mode| closes.push(format!("close:{}", mode.as_str()))),
    );

    h.action(&id, SECONDARY_ACTION, None);
    assert!(h.instance(&id).is_some());

    h.action(&id, PRIMARY_ACTION, Some(serde_json::json!({"confirmed": true})));
    assert_eq!(
        log.entries(),
        ["action:secondary", "action:primary", "close:action"]
    );
    assert_eq!(log.count("close:action"), 1);
    assert!(h.container.is_empty());
}

#[test]
fn simple_modal_through_service() {
    let h = StackHarness::new();
    let id = h.service.simple(
        "Saved.",
        SimpleOptions::new().title("Done").primary_action("OK"),
    );
    h.sync();

    let instance = h.instance(&id).expect("mounted");
    let content = instance
        .descriptor()
        .content
        .downcast_ref::<SimpleContent>()
        .expect("simple content");
    assert_eq!(content.message, "Saved.");
    assert_eq!(instance.layer(), Layer::Active);
}

// ============================================================================
// Open callback and document state
// ============================================================================

#[test]
fn on_open_fires_after_enter() {
    let h = StackHarness::new();
    let log = CallLog::new();
    let sink = log.clone();
    let id = h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new().on_open(move || sink.push("open")),
    );
    assert_eq!(log.entries(), ["open"]);
    assert_eq!(
        h.platform.animator.transitions().first().copied().flatten(),
        Some(TransitionName::Enter)
    );
    h.close(&id, CloseMode::Manual);
    assert_eq!(log.count("open"), 1);
}

#[test]
fn failed_enter_skips_on_open() {
    let h = StackHarness::new();
    h.platform.animator.fail_all(true);
    let log = CallLog::new();
    let sink = log.clone();
    h.open_with(
        SimpleContent::new("A"),
        CreateOptions::new().on_open(move || sink.push("open")),
    );
    assert!(log.entries().is_empty());
}

#[test]
fn mobile_uses_mobile_variants() {
    let h = StackHarness::new();
    h.platform.document.set_mobile(true);
    let id = h.open("A");
    h.close(&id, CloseMode::Manual);
    assert_eq!(
        h.platform.animator.transitions(),
        [Some(TransitionName::EnterMobile), Some(TransitionName::LeaveMobile)]
    );
}

#[test]
fn body_class_tracks_open_modals() {
    let h = StackHarness::new();
    assert!(!h.platform.document.has_body_class("modal-open"));
    let a = h.open("A");
    let b = h.open("B");
    assert!(h.platform.document.has_body_class("modal-open"));

    h.close(&b, CloseMode::Manual);
    assert!(h.platform.document.has_body_class("modal-open"));
    h.close(&a, CloseMode::Manual);
    assert!(!h.platform.document.has_body_class("modal-open"));
    assert_eq!(
        h.platform.document.class_log(),
        ["+modal-open", "-modal-open"]
    );
}

#[test]
fn container_options_override_defaults() {
    let service = ModalService::default();
    let config = ContainerConfig::default().options(OptionsPatch::new().body_class("dialog-open"));
    let h = StackHarness::with_config(service, config);
    h.open("A");
    assert!(h.platform.document.has_body_class("dialog-open"));
    assert!(!h.platform.document.has_body_class("modal-open"));
}
