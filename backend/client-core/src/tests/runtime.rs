// Unit tests for the page runtime: dispatch, delivery rules and scripted input

use crate::events::BrowserEvent;
use crate::runtime::{Flow, PageExit, Task, UserInput};
use crate::session::SESSION_ID_KEY;
use crate::tests::support::{FORM_PAGE, RecordingHost, context, open_runtime, runtime};

use serde_json::Value;

/// **VALUE**: Verifies opening the transport sends exactly one handshake snapshot.
///
/// **WHY THIS MATTERS**: The server bootstraps its state for this client from the
/// handshake; without it no template or subscription list is ever pushed.
#[test]
fn given_new_page_when_transport_opens_then_handshake_is_sent() {
    // GIVEN: A page whose transport is not yet open, with one failed reconnect on record
    let mut context = context();
    context.reconnect.next_delay();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = runtime(&mut context, &mut host, FORM_PAGE);
    assert!(!runtime.is_ready());

    // WHEN: The transport opens
    let flow = runtime.handle(Task::Opened);

    // THEN: One empty event record went out with the page markup
    assert_eq!(flow, Flow::Continue);
    let frames = wire.drain();
    assert_eq!(frames.len(), 1);
    let handshake = &frames[0];
    assert!(handshake["type"].is_null());
    assert!(handshake["event_ref"].is_null());
    assert!(handshake["sessionId"].is_null());
    assert_eq!(handshake["route"], "/app/home");
    assert!(handshake["template"].as_str().is_some_and(|t| t.contains("uuid=\"btn\"")));

    // THEN: The reconnect budget is restored
    drop(runtime);
    assert_eq!(context.reconnect.attempts(), 0);
}

#[test]
fn given_session_assignments_when_dispatched_then_only_first_is_kept_and_sent() {
    // GIVEN: An open page
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    // WHEN: Two session ids arrive and a marked element is clicked
    runtime.dispatch(r#"{"setSessionId":"s-1"}"#);
    runtime.dispatch(r#"{"setSessionId":"s-2"}"#);
    runtime.capture(BrowserEvent::document("click", "btn"));

    // THEN: The event carries the first id
    let frames = wire.drain();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["sessionId"], "s-1");
    drop(runtime);
    assert_eq!(context.session_storage.get(SESSION_ID_KEY), Some("s-1"));
}

/// **VALUE**: Verifies document events are sent if and only if the target is marked.
#[test]
fn given_open_page_when_document_events_fire_then_only_marked_targets_are_sent() {
    // GIVEN: An open page with a marked button and an unmarked span
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    // WHEN: Clicking both, and double-clicking the button
    runtime.capture(BrowserEvent::document("click", "plain"));
    runtime.capture(BrowserEvent::document("dblclick", "btn"));
    runtime.capture(BrowserEvent::document("click", "btn").with_position(4.0, 2.0));

    // THEN: Only the marked click went out
    let frames = wire.drain();
    assert_eq!(frames.len(), 1);
    let event = &frames[0];
    assert_eq!(event["type"], "click");
    assert_eq!(event["event_ref"], "document");
    assert_eq!(event["target_uuid"], "btn");
    assert_eq!(event["event_data"]["clientX"], 4.0);
    assert!(event["window_event"].is_null());
}

#[test]
fn given_transport_not_open_when_marked_event_fires_then_nothing_is_sent() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = runtime(&mut context, &mut host, FORM_PAGE);

    runtime.capture(BrowserEvent::document("click", "btn"));

    assert!(wire.drain().is_empty());
}

/// **VALUE**: Verifies a window event fired before the subscription list is delivered
/// exactly once after the list subscribes to it.
#[test]
fn given_buffered_window_click_when_list_subscribes_click_then_one_window_message_is_sent() {
    // GIVEN: An open page where a window click fired before any list
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);
    runtime.capture(BrowserEvent::window("click"));
    assert!(wire.drain().is_empty());

    // WHEN: The server subscribes to click and scroll
    runtime.dispatch(r#"{"window": ["click","scroll"]}"#);

    // THEN: Exactly one window click is sent, and the buffer is gone
    let frames = wire.drain();
    assert_eq!(frames.len(), 1);
    assert_eq!(frames[0]["event_ref"], "window");
    assert_eq!(frames[0]["type"], "click");
    assert_eq!(frames[0]["window_event"], "click");
    assert!(!runtime.gate().is_buffering());

    // WHEN: Another list arrives
    runtime.dispatch(r#"{"window": ["click"]}"#);

    // THEN: Nothing is replayed again
    assert!(wire.drain().is_empty());
}

#[test]
fn given_buffered_events_when_list_subscribes_some_then_replay_keeps_order_and_filters() {
    // GIVEN: scroll, resize, hashchange fired before the list
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);
    for event_type in ["scroll", "resize", "hashchange"] {
        runtime.capture(BrowserEvent::window(event_type));
    }

    // WHEN: The list subscribes hashchange and scroll with handler markers
    runtime.dispatch(r#"{"window": ["onhashchange_77","onscroll_12"]}"#);

    // THEN: scroll then hashchange are sent, in firing order, with their markers
    let frames = wire.drain();
    let sent: Vec<(&str, &str)> = frames
        .iter()
        .map(|frame| {
            (
                frame["type"].as_str().unwrap_or_default(),
                frame["window_event"].as_str().unwrap_or_default(),
            )
        })
        .collect();
    assert_eq!(sent, vec![("scroll", "onscroll_12"), ("hashchange", "onhashchange_77")]);
}

#[test]
fn given_untracked_event_type_when_captured_then_ignored_even_if_subscribed() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);
    runtime.dispatch(r#"{"window": ["scroll"]}"#);

    runtime.capture(BrowserEvent::window("not-an-event"));
    runtime.capture(BrowserEvent::document("popstate", "btn"));

    assert!(wire.drain().is_empty());
    assert_eq!(runtime.gate().buffered(), 0);
}

#[test]
fn given_bare_reload_text_when_handled_then_page_exits_for_reload_without_other_effects() {
    // GIVEN: An open page
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);
    let before = runtime.document().clone();

    // WHEN: The server sends the bare literal
    let flow = runtime.handle(Task::Inbound("reload".into()));

    // THEN: The page ends with a reload and nothing else happened
    assert_eq!(flow, Flow::Exit(PageExit::Reload));
    assert!(wire.drain().is_empty());
    assert_eq!(runtime.document(), &before);
}

#[test]
fn given_structured_reload_when_dispatched_then_page_exits_for_reload() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, _wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    assert_eq!(runtime.dispatch(r#"{"reload": true}"#), Flow::Exit(PageExit::Reload));
}

#[test]
fn given_garbage_and_unknown_frames_when_dispatched_then_dropped_and_page_continues() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    assert_eq!(runtime.dispatch("{not json"), Flow::Continue);
    assert_eq!(runtime.dispatch(r#"{"unknown": 1}"#), Flow::Continue);
    assert_eq!(runtime.dispatch(r#"{"Error": "server side failure"}"#), Flow::Continue);
    assert!(wire.drain().is_empty());
    assert!(runtime.is_ready());
}

#[test]
fn given_template_message_when_dispatched_then_document_is_patched() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, _wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    runtime.dispatch(
        r#"{"template": {"e1": {"status":"Added","parent":"root","element":"<div uuid=\"e1\">hi</div>"}}}"#,
    );

    let added = runtime.document().find("e1").expect("e1 added");
    assert_eq!(added.text_content(), "hi");
}

/// **BUG THIS CATCHES**: A single unknown status in a batch used to drop every
/// change sent alongside it.
#[test]
fn given_template_batch_with_bad_entry_when_dispatched_then_valid_entries_still_apply() {
    // GIVEN: An open page
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, _wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    // WHEN: A batch arrives with one good addition and one malformed entry
    let flow = runtime.dispatch(
        r#"{"template": {"e1": {"status":"Added","parent":"root","element":"<div uuid=\"e1\">hi</div>"}, "e2": {"status":"Moved","element":"<p></p>"}}}"#,
    );

    // THEN: The good addition is in the tree and the page keeps running
    assert_eq!(flow, Flow::Continue);
    assert!(runtime.document().find("e1").is_some());
    assert!(runtime.document().find("root").is_some());
}

/// **BUG THIS CATCHES**: An empty template string used to become a root
/// replacement with no markup and blank the whole page.
#[test]
fn given_empty_template_when_dispatched_then_document_is_unchanged() {
    // GIVEN: An open page
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, _wire) = open_runtime(&mut context, &mut host, FORM_PAGE);
    let before = runtime.document().clone();

    // WHEN: The server pushes an empty template
    runtime.dispatch(r#"{"template": ""}"#);

    // THEN: Nothing was replaced
    assert_eq!(runtime.document(), &before);
    assert!(runtime.document().find("btn").is_some());
}

#[test]
fn given_transport_failure_then_close_when_handled_then_page_exits_transport_lost() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, _wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    assert_eq!(runtime.handle(Task::TransportFailed("reset".into())), Flow::Continue);
    assert!(runtime.is_ready());
    assert_eq!(runtime.handle(Task::Closed), Flow::Exit(PageExit::TransportLost));
    assert!(!runtime.is_ready());
}

#[test]
fn given_scripted_edits_when_event_sent_then_values_reflect_them() {
    // GIVEN: A form page whose submit button is marked for click
    let page = r#"<body><form uuid="f">
        <input uuid="name" value="">
        <input uuid="a" type="radio" name="g" value="1" checked>
        <input uuid="b" type="radio" name="g" value="2">
        <select uuid="s"><option value="x">X</option><option value="y">Y</option></select>
        <button uuid="go" _onclick="submit-1">Go</button></form></body>"#;
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, mut wire) = open_runtime(&mut context, &mut host, page);

    // WHEN: Typing, picking radio b and option y, then clicking go
    runtime.handle_input(UserInput::SetValue {
        uuid: "name".into(),
        value: "Ana".into(),
    });
    runtime.handle_input(UserInput::SetChecked {
        uuid: "b".into(),
        checked: true,
    });
    runtime.handle_input(UserInput::Select {
        uuid: "s".into(),
        value: "y".into(),
    });
    runtime.handle_input(UserInput::Fire(BrowserEvent::document("click", "go")));

    // THEN: The snapshot reports the edits and the radio group is exclusive
    let frames = wire.drain();
    assert_eq!(frames.len(), 1);
    let values: Value = serde_json::from_str(frames[0]["values"].as_str().expect("values text")).expect("json");
    assert_eq!(values["name"], "Ana");
    assert_eq!(values["b"], "2");
    assert!(values.get("a").is_none());
    assert_eq!(values["s"], "y");
}

#[test]
fn given_quit_input_when_handled_then_page_exits_quit() {
    let mut context = context();
    let mut host = RecordingHost::default();
    let (mut runtime, _wire) = open_runtime(&mut context, &mut host, FORM_PAGE);

    assert_eq!(runtime.handle_input(UserInput::Dump), Flow::Continue);
    assert_eq!(runtime.handle_input(UserInput::Quit), Flow::Exit(PageExit::Quit));
}

#[tokio::test]
async fn given_running_page_when_server_closes_window_then_run_returns_window_closed() {
    // GIVEN: A runtime with an open transport and a queued close command
    let mut context = context();
    let mut host = RecordingHost::default();
    let (runtime, mut wire) = runtime(&mut context, &mut host, FORM_PAGE);
    let tasks = runtime.tasks.clone();
    tasks.send(Task::Opened).expect("queued");
    tasks.send(Task::Inbound(r#"{"close": true}"#.into())).expect("queued");

    // WHEN: Running the page
    let mut input = None;
    let exit = runtime.run(&mut wire.queue, &mut input).await;

    // THEN: The page ends because the window closed
    assert_eq!(exit, PageExit::WindowClosed);
    assert!(host.closed);
}
