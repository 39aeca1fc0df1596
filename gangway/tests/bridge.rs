//! End-to-end bridge scenarios driven through the public API, with a
//! [`FakeHost`] playing the far side of the channel.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::json;
use gangway::{
    toggle_incoming_audio, toggle_incoming_audio_request, Bridge, BridgeError, BridgeRequest,
    ErrorCode, FakeHost, HostError, HostSink, LifecycleState, ReplyError, ToggleAudioResponse,
};

fn ready_bridge(host: &Rc<FakeHost>) -> Bridge {
    let bridge = Bridge::new();
    bridge
        .initialize(Rc::clone(host) as Rc<dyn HostSink>)
        .expect("initialize should post");
    assert!(host.complete_initialize(&bridge, "content"));
    bridge
}

#[test]
fn null_callback_is_rejected_and_nothing_is_sent() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);
    let posted_before = host.posted_count();

    let err = toggle_incoming_audio(&bridge, None).expect_err("must fail");
    assert_eq!(
        err.to_string(),
        "[toggle incoming audio] Callback cannot be null"
    );
    assert_eq!(host.posted_count(), posted_before, "no envelope may leave");
}

#[test]
fn calls_before_initialization_are_rejected_and_nothing_is_sent() {
    let bridge = Bridge::new();

    let err = toggle_incoming_audio(&bridge, Some(Box::new(|_| {}))).expect_err("must fail");
    assert_eq!(err.to_string(), "The library has not yet been initialized");
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn toggle_succeeds_with_combined_response_form() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let seen: Rc<RefCell<Option<ToggleAudioResponse>>> = Rc::new(RefCell::new(None));
    let seen_in_callback = Rc::clone(&seen);
    toggle_incoming_audio(
        &bridge,
        Some(Box::new(move |response| {
            *seen_in_callback.borrow_mut() = Some(response);
        })),
    )
    .expect("dispatch should succeed");

    assert_eq!(bridge.pending_count(), 1);
    let envelope = host
        .find_by_func("toggleIncomingAudio")
        .expect("envelope posted");

    host.respond(
        &bridge,
        envelope.id,
        vec![json!({ "error": null, "result": true })],
    );

    let seen = seen.borrow();
    let response = seen.as_ref().expect("callback fired exactly once");
    assert!(response.error.is_none());
    assert_eq!(response.result, Some(true));
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn toggle_reports_internal_error_with_positional_form() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let seen: Rc<RefCell<Option<ToggleAudioResponse>>> = Rc::new(RefCell::new(None));
    let seen_in_callback = Rc::clone(&seen);
    toggle_incoming_audio(
        &bridge,
        Some(Box::new(move |response| {
            *seen_in_callback.borrow_mut() = Some(response);
        })),
    )
    .expect("dispatch should succeed");

    let envelope = host
        .find_by_func("toggleIncomingAudio")
        .expect("envelope posted");
    host.respond(
        &bridge,
        envelope.id,
        vec![json!({ "errorCode": 500 }), json!(null)],
    );

    let seen = seen.borrow();
    let response = seen.as_ref().expect("callback fired exactly once");
    assert_eq!(
        response.error,
        Some(HostError::from_code(ErrorCode::INTERNAL_ERROR))
    );
    assert_eq!(response.result, None);
}

#[test]
fn concurrent_requests_get_distinct_ids_and_resolve_out_of_order() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let order = Rc::new(RefCell::new(Vec::new()));
    for name in ["a", "b", "c"] {
        let order = Rc::clone(&order);
        bridge
            .dispatch(
                BridgeRequest::new(name),
                Some(Box::new(move |_| order.borrow_mut().push(name))),
            )
            .expect("dispatch should succeed");
    }

    let ids: Vec<_> = ["a", "b", "c"]
        .iter()
        .map(|name| host.find_by_func(name).expect("posted").id)
        .collect();
    assert!(ids[0] < ids[1] && ids[1] < ids[2], "ids must be distinct");

    // Resolve c, a, b: callbacks fire in arrival order, each with its
    // own correct payload.
    host.respond(&bridge, ids[2], vec![json!(null)]);
    host.respond(&bridge, ids[0], vec![json!(null)]);
    host.respond(&bridge, ids[1], vec![json!(null)]);

    assert_eq!(*order.borrow(), vec!["c", "a", "b"]);
}

#[test]
fn unmatched_and_duplicate_responses_are_silent_noops() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let count = Rc::new(RefCell::new(0u32));
    let count_in_callback = Rc::clone(&count);
    bridge
        .dispatch(
            BridgeRequest::new("toggleIncomingAudio"),
            Some(Box::new(move |_| *count_in_callback.borrow_mut() += 1)),
        )
        .expect("dispatch should succeed");
    let envelope = host
        .find_by_func("toggleIncomingAudio")
        .expect("envelope posted");

    // Never-registered id: no-op, registry untouched.
    bridge.deliver(&json!({ "id": 987654, "args": [null, true] }));
    assert_eq!(bridge.pending_count(), 1);

    // Real response, then a duplicate of it.
    host.respond(&bridge, envelope.id, vec![json!(null), json!(true)]);
    host.respond(&bridge, envelope.id, vec![json!(null), json!(true)]);

    assert_eq!(*count.borrow(), 1);
    assert_eq!(bridge.pending_count(), 0);
}

#[test]
fn teardown_abandons_pending_calls_without_invoking_them() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let fired = Rc::new(RefCell::new(0u32));
    let mut ids = Vec::new();
    for name in ["first", "second"] {
        let fired = Rc::clone(&fired);
        bridge
            .dispatch(
                BridgeRequest::new(name),
                Some(Box::new(move |_| *fired.borrow_mut() += 1)),
            )
            .expect("dispatch should succeed");
        ids.push(host.find_by_func(name).expect("posted").id);
    }
    assert_eq!(bridge.pending_count(), 2);

    bridge.uninitialize();

    for id in ids {
        bridge.deliver(&json!({ "id": id, "args": [null, true] }));
    }
    assert_eq!(*fired.borrow(), 0, "abandoned callbacks must stay silent");

    let err = bridge
        .dispatch(BridgeRequest::new("first"), Some(Box::new(|_| {})))
        .expect_err("must fail before re-initialize");
    assert_eq!(err.to_string(), "The library has not yet been initialized");
}

#[test]
fn a_full_session_can_be_torn_down_and_restarted() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);
    assert_eq!(bridge.frame_context().as_deref(), Some("content"));

    bridge.uninitialize();
    assert_eq!(bridge.state(), LifecycleState::Uninitialized);
    assert_eq!(bridge.frame_context(), None);

    let second_host = FakeHost::new();
    bridge
        .initialize(Rc::clone(&second_host) as Rc<dyn HostSink>)
        .expect("re-initialize should post");
    assert_eq!(bridge.state(), LifecycleState::Initializing);
    assert!(second_host.complete_initialize(&bridge, "settings"));
    assert_eq!(bridge.frame_context().as_deref(), Some("settings"));

    // The fresh session carries traffic normally.
    let seen = Rc::new(RefCell::new(false));
    let seen_in_callback = Rc::clone(&seen);
    toggle_incoming_audio(
        &bridge,
        Some(Box::new(move |_| *seen_in_callback.borrow_mut() = true)),
    )
    .expect("dispatch should succeed");
    let envelope = second_host
        .find_by_func("toggleIncomingAudio")
        .expect("envelope posted");
    second_host.respond(&bridge, envelope.id, vec![json!(null), json!(true)]);
    assert!(*seen.borrow());
}

#[test]
fn shared_channel_noise_is_absorbed() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    bridge
        .dispatch(
            BridgeRequest::new("toggleIncomingAudio"),
            Some(Box::new(|_| {})),
        )
        .expect("dispatch should succeed");

    // Unrelated traffic on the same channel, in assorted shapes.
    bridge.deliver(&json!(null));
    bridge.deliver(&json!("presence-ping"));
    bridge.deliver(&json!([1, 2, 3]));
    bridge.deliver(&json!({ "kind": "telemetry", "value": 3 }));
    bridge.deliver(&json!({ "id": "nan", "args": [] }));

    assert_eq!(bridge.pending_count(), 1, "pending call must survive noise");
}

#[tokio::test]
async fn handle_based_toggle_resolves_once() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let future = toggle_incoming_audio_request(&bridge).expect("request should post");
    let envelope = host
        .find_by_func("toggleIncomingAudio")
        .expect("envelope posted");
    host.respond(
        &bridge,
        envelope.id,
        vec![json!({ "error": null, "result": true })],
    );

    let response = future.await.expect("should resolve");
    assert_eq!(response.into_result().expect("no host error"), Some(true));
}

#[tokio::test]
async fn handle_based_toggle_observes_teardown() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);

    let future = toggle_incoming_audio_request(&bridge).expect("request should post");
    bridge.uninitialize();

    assert_eq!(future.await, Err(ReplyError::Abandoned));
}

#[test]
fn send_failure_is_synchronous_and_leaves_no_residue() {
    let host = FakeHost::new();
    let bridge = ready_bridge(&host);
    host.close();

    let err = bridge
        .dispatch(
            BridgeRequest::new("toggleIncomingAudio"),
            Some(Box::new(|_| {})),
        )
        .expect_err("must fail");
    assert!(matches!(err, BridgeError::SendFailed { .. }));
    assert_eq!(bridge.pending_count(), 0);
}
