// Unit tests for endpoint derivation and the reconnect policy

use crate::connection::{
    ConnectionManager, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY, ReconnectPolicy, endpoint_for,
};
use crate::error::TransportError;

use std::time::Duration;

use tokio::sync::mpsc::unbounded_channel;
use url::Url;

fn url(text: &str) -> Url {
    Url::parse(text).expect("valid url")
}

#[test]
fn given_http_page_when_endpoint_derived_then_ws_on_configured_port() {
    let endpoint = endpoint_for(&url("http://localhost:8000/app?q=1"), 8765).expect("endpoint");

    assert_eq!(endpoint.as_str(), "ws://localhost:8765/");
}

#[test]
fn given_https_page_when_endpoint_derived_then_secure_socket() {
    let endpoint = endpoint_for(&url("https://example.test/"), 9443).expect("endpoint");

    assert_eq!(endpoint.scheme(), "wss");
    assert_eq!(endpoint.host_str(), Some("example.test"));
    assert_eq!(endpoint.port(), Some(9443));
}

#[test]
fn given_non_http_page_when_endpoint_derived_then_endpoint_error() {
    let result = endpoint_for(&url("file:///tmp/page.html"), 8765);

    assert!(matches!(result, Err(TransportError::Endpoint { .. })));
}

/// **VALUE**: Verifies the retry budget: two extra attempts, one second apart.
///
/// **WHY THIS MATTERS**: Without a cap a dead server would be hammered forever; a larger
/// delay or budget changes how quickly users see the client give up.
#[test]
fn given_default_policy_when_attempts_consumed_then_budget_is_two_fixed_delays() {
    // GIVEN: A fresh policy
    let mut policy = ReconnectPolicy::default();

    // WHEN/THEN: Two delays of one second, then nothing
    assert_eq!(MAX_RECONNECT_ATTEMPTS, 2);
    assert_eq!(policy.next_delay(), Some(RECONNECT_DELAY));
    assert_eq!(policy.next_delay(), Some(Duration::from_secs(1)));
    assert_eq!(policy.next_delay(), None);
    assert_eq!(policy.attempts(), 2);
}

#[test]
fn given_spent_policy_when_reset_then_budget_is_restored() {
    let mut policy = ReconnectPolicy::new(1, Duration::from_millis(5));
    policy.next_delay();
    assert_eq!(policy.next_delay(), None);

    policy.reset();

    assert_eq!(policy.attempts(), 0);
    assert_eq!(policy.next_delay(), Some(Duration::from_millis(5)));
}

#[test]
fn given_manager_not_open_when_sending_then_closed_error_and_nothing_queued() {
    let (sink, mut sent) = unbounded_channel();
    let manager = ConnectionManager::with_sink(sink);

    let result = manager.send("frame".into());

    assert!(matches!(result, Err(TransportError::Closed { .. })));
    assert!(sent.try_recv().is_err());
}

#[test]
fn given_open_manager_when_sending_then_frame_is_queued_until_closed() {
    // GIVEN: An open manager
    let (sink, mut sent) = unbounded_channel();
    let mut manager = ConnectionManager::with_sink(sink);
    manager.mark_open();

    // WHEN: Sending, then closing and sending again
    manager.send("one".into()).expect("queued");
    manager.mark_closed();
    let after_close = manager.send("two".into());

    // THEN: Only the first frame went out
    assert_eq!(sent.try_recv().ok().as_deref(), Some("one"));
    assert!(after_close.is_err());
    assert!(sent.try_recv().is_err());
}
