use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;

/// An inbound message that could not be understood.
///
/// Protocol errors are logged and the message is dropped; the connection stays open.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
    #[error("Decode Error: {message} {location}")]
    Decode {
        message: String,
        location: ErrorLocation,
    },

    #[error("Unrecognized Shape Error: {message} {location}")]
    UnrecognizedShape {
        message: String,
        location: ErrorLocation,
    },

    #[error("Invalid Field Error: {field}: {message} {location}")]
    InvalidField {
        field: &'static str,
        message: String,
        location: ErrorLocation,
    },
}

impl From<serde_json::Error> for ProtocolError {
    #[track_caller]
    fn from(error: serde_json::Error) -> Self {
        ProtocolError::Decode {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<base64::DecodeError> for ProtocolError {
    #[track_caller]
    fn from(error: base64::DecodeError) -> Self {
        ProtocolError::Decode {
            message: format!("invalid base64 payload: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<std::string::FromUtf8Error> for ProtocolError {
    #[track_caller]
    fn from(error: std::string::FromUtf8Error) -> Self {
        ProtocolError::Decode {
            message: format!("payload is not valid UTF-8: {error}"),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
