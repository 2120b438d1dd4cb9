use client_core::connection::endpoint_for;
use client_core::error::TransportError;
use common::ErrorLocation;

use std::panic::Location;

use url::Url;

/// **VALUE**: Verifies that `TransportError::RetriesExhausted` includes location tracking.
///
/// **WHY THIS MATTERS**: This is the only transport error that ends the client, so the
/// message a user sees must say where the driver gave up.
#[test]
#[track_caller]
fn given_retries_exhausted_error_when_formatted_then_includes_location() {
    // GIVEN: A RetriesExhausted error with location
    let location = ErrorLocation::from(Location::caller());
    let err = TransportError::RetriesExhausted {
        message: "gave up after 2 reconnect attempt(s)".to_string(),
        location,
    };

    // WHEN: Formatting the error as string
    let error_string = format!("{}", err);

    // THEN: Should include error type, message, and file location
    assert!(error_string.contains("Retries Exhausted Error"));
    assert!(error_string.contains("gave up after 2"));
    assert!(error_string.contains("transport.rs"));
}

#[test]
fn given_file_url_when_endpoint_derived_then_endpoint_error_is_returned() {
    // GIVEN: A page url with an unsupported scheme
    let page = Url::parse("file:///tmp/index.html").expect("url");

    // WHEN: Deriving the websocket endpoint
    let err = endpoint_for(&page, 8765).expect_err("file pages have no endpoint");

    // THEN: The failure is an endpoint error naming the scheme
    assert!(matches!(err, TransportError::Endpoint { .. }));
    assert!(err.to_string().contains("file"));
}
