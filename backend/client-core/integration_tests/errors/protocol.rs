use client_core::error::ProtocolError;
use client_core::protocol::ServerMessage;

/// **VALUE**: Verifies decode failures of inbound frames are typed and carry a location.
///
/// **BUG THIS CATCHES**: Would catch if the serde conversion loses `#[track_caller]`,
/// leaving dropped-frame warnings with no hint of where decoding failed.
#[test]
fn given_malformed_frame_when_decoded_then_decode_error_includes_location() {
    // GIVEN: A frame that is not JSON
    let frame = "{\"template\": ";

    // WHEN: Decoding it
    let err = ServerMessage::from_wire(frame).expect_err("malformed frame");

    // THEN: It is a decode error that names a source file
    assert!(matches!(err, ProtocolError::Decode { .. }));
    let error_string = err.to_string();
    assert!(error_string.contains("Decode Error"));
    assert!(error_string.contains(".rs"));
}

#[test]
fn given_confirm_without_id_when_decoded_then_invalid_field_names_it() {
    let err = ServerMessage::from_wire(r#"{"confirm": "Sure?"}"#).expect_err("missing id");

    match err {
        ProtocolError::InvalidField { field, .. } => assert_eq!(field, "confirm_id"),
        other => panic!("Expected InvalidField, got {other:?}"),
    }
}
