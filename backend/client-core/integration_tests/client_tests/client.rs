use crate::client_tests::helpers::{
    CountingHost, STEP_TIMEOUT, TestServer, client_config, headless_client, unused_port,
};

use client_core::client::{Client, ClientExit};
use client_core::connection::ReconnectPolicy;
use client_core::error::{CoreError, TransportError};
use client_core::runtime::UserInput;
use client_core::session::SESSION_ID_KEY;
use client_core::events::BrowserEvent;

use std::time::Duration;

use tokio::sync::mpsc::unbounded_channel;
use tokio::time::timeout;

// ============================================================================
// Client::run() against a live websocket server
// ============================================================================

/// **VALUE**: Verifies the full conversation of one page: handshake, session
/// assignment, template patch, a correlated confirm and a server-initiated close.
///
/// **WHY THIS MATTERS**: Each piece has unit coverage, but only a real socket proves
/// the transport worker, task queue and runtime agree on ordering and framing.
///
/// **BUG THIS CATCHES**: Would catch if:
/// - The handshake is not the first frame after the upgrade
/// - Inbound frames are applied out of arrival order
/// - Responses lose the session id assigned earlier on the same connection
/// - A close command does not end `run()`
#[tokio::test]
async fn given_live_server_when_page_runs_then_handshake_patch_confirm_and_close_round_trip() {
    // GIVEN: A test server scripted to drive one page
    let server = TestServer::start().await;
    let mut client = headless_client(client_config(server.port()));

    let script = tokio::spawn(async move {
        let mut connection = server.accept().await;

        let handshake = connection.recv_json().await;

        connection.send(r#"{"setSessionId": "s-42"}"#).await;
        connection
            .send(r#"{"template": "<html><head></head><body uuid=\"b\"><p uuid=\"p1\">hello</p></body></html>"}"#)
            .await;
        connection
            .send(r#"{"confirm": "Proceed?", "confirm_id": "c1"}"#)
            .await;
        let confirm = connection.recv_json().await;

        connection.send(r#"{"close": true}"#).await;
        (handshake, confirm)
    });

    // WHEN: Running the client
    let exit = timeout(STEP_TIMEOUT, client.run(None))
        .await
        .expect("Client finished in time")
        .expect("Client ran without error");
    let (handshake, confirm) = script.await.expect("Server script completed");

    // THEN: The handshake is an empty event for the configured route
    assert!(handshake["type"].is_null());
    assert!(handshake["sessionId"].is_null());
    assert_eq!(handshake["route"], "/app");

    // THEN: The confirm answer carries the id, the session and the patched markup
    assert_eq!(confirm["type"], "confirm");
    assert_eq!(confirm["window_response"]["confirm_result"], true);
    assert_eq!(confirm["window_response"]["confirm_id"], "c1");
    assert_eq!(confirm["sessionId"], "s-42");
    let template = confirm["template"].as_str().expect("template text");
    assert!(template.contains(r#"<p uuid="p1">hello</p>"#));

    // THEN: The window closed and the session id stays stored
    assert_eq!(exit, ClientExit::WindowClosed);
    assert_eq!(
        client.context().session_storage.get(SESSION_ID_KEY),
        Some("s-42")
    );
}

/// **VALUE**: Verifies a reload rebuilds the page while keeping the browsing context.
///
/// **BUG THIS CATCHES**: Would catch if session storage were recreated per page, which
/// would make the server treat every reload as a brand new client.
#[tokio::test]
async fn given_assigned_session_when_server_requests_reload_then_next_handshake_keeps_it() {
    // GIVEN: A server that assigns a session then asks for a reload
    let server = TestServer::start().await;
    let mut client = headless_client(client_config(server.port()));

    let script = tokio::spawn(async move {
        let mut first = server.accept().await;
        let _ = first.recv_json().await;
        first.send(r#"{"setSessionId": "s-7"}"#).await;
        first.send("reload").await;

        let mut second = server.accept().await;
        let handshake = second.recv_json().await;
        second.send(r#"{"close": true}"#).await;
        first.close().await;
        handshake
    });

    // WHEN: Running the client through both pages
    let exit = timeout(STEP_TIMEOUT, client.run(None))
        .await
        .expect("Client finished in time")
        .expect("Client ran without error");
    let handshake = script.await.expect("Server script completed");

    // THEN: The second page introduced itself with the stored session
    assert!(handshake["type"].is_null());
    assert_eq!(handshake["sessionId"], "s-7");
    assert_eq!(exit, ClientExit::WindowClosed);
}

#[tokio::test]
async fn given_subscribed_window_event_when_user_fires_it_then_server_receives_window_snapshot() {
    // GIVEN: A server that subscribes to window scroll
    let server = TestServer::start().await;
    let mut client = headless_client(client_config(server.port()));
    let (input, input_rx) = unbounded_channel();

    let script = tokio::spawn(async move {
        let mut connection = server.accept().await;
        let _ = connection.recv_json().await;
        connection.send(r#"{"window": ["onscroll_3"]}"#).await;
        // Round trip a prompt so the subscription is known to be applied.
        connection.send(r#"{"prompt": "ready?", "prompt_id": 1}"#).await;
        let _ = connection.recv_json().await;
        input
            .send(UserInput::Fire(BrowserEvent::window("scroll")))
            .expect("Client is listening");
        let event = connection.recv_json().await;
        input.send(UserInput::Quit).expect("Client is listening");
        event
    });

    // WHEN: The user scrolls the window
    let exit = timeout(STEP_TIMEOUT, client.run(Some(input_rx)))
        .await
        .expect("Client finished in time")
        .expect("Client ran without error");
    let event = script.await.expect("Server script completed");

    // THEN: One window snapshot names the subscribed handler
    assert_eq!(event["event_ref"], "window");
    assert_eq!(event["type"], "scroll");
    assert_eq!(event["window_event"], "onscroll_3");
    assert_eq!(exit, ClientExit::Quit);
}

/// **VALUE**: Verifies the client gives up after its reconnect budget.
///
/// **WHY THIS MATTERS**: Without a bound the client would spin forever against a dead
/// server, reloading the page every second.
///
/// **BUG THIS CATCHES**: The close that spends the budget used to skip its reload,
/// so the host saw one reload fewer than the number of closes.
#[tokio::test]
async fn given_no_server_when_client_runs_then_retries_are_exhausted() {
    // GIVEN: A port nobody listens on and a short reconnect policy
    let port = unused_port().await;
    let mut client = Client::new(client_config(port), CountingHost::default())
        .expect("Valid client config")
        .with_reconnect_policy(ReconnectPolicy::new(2, Duration::from_millis(10)));

    // WHEN: Running the client
    let result = timeout(STEP_TIMEOUT, client.run(None))
        .await
        .expect("Client gave up in time");

    // THEN: It fails with an exhausted retry budget after using every attempt
    assert!(matches!(
        result,
        Err(CoreError::Transport(TransportError::RetriesExhausted { .. }))
    ));
    assert_eq!(client.context().reconnect.attempts(), 2);

    // THEN: Every one of the three closes reloaded the page
    assert_eq!(client.host().reloads, 3);
}
