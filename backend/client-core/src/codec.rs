//! Wire codec.
//!
//! Structured payloads travel as JSON text. Values that may carry control
//! characters or arbitrary bytes can additionally be wrapped in standard
//! base64 so they survive any text-only hop. Only the decoding direction is
//! needed here; the server does the wrapping.

use crate::error::ProtocolError;

use common::ErrorLocation;

use std::panic::Location;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encode a structured value as wire text.
pub fn encode<T: Serialize>(value: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(value).map_err(|e| ProtocolError::Decode {
        message: format!("failed to encode payload: {e}"),
        location: ErrorLocation::from(Location::caller()),
    })
}

/// Decode wire text into a structured value.
#[track_caller]
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ProtocolError> {
    Ok(serde_json::from_str(text)?)
}

/// base64 → UTF-8 text.
#[track_caller]
pub fn from_base64(encoded: &str) -> Result<String, ProtocolError> {
    let bytes = STANDARD.decode(encoded)?;
    Ok(String::from_utf8(bytes)?)
}
