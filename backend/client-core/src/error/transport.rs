use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error as ThisError;
use tokio_tungstenite::tungstenite::Error as WsError;

/// Failures of the websocket transport.
///
/// None of these reach the user: the connection manager recovers by
/// reconnecting and reloading, and only gives up once the retry budget is spent.
#[derive(Debug, ThisError)]
pub enum TransportError {
    #[error("Endpoint Error: {message} {location}")]
    Endpoint {
        message: String,
        location: ErrorLocation,
    },

    #[error("Connect Error: {message} {location}")]
    Connect {
        message: String,
        location: ErrorLocation,
    },

    #[error("Send Error: {message} {location}")]
    Send {
        message: String,
        location: ErrorLocation,
    },

    #[error("Closed Error: {message} {location}")]
    Closed {
        message: String,
        location: ErrorLocation,
    },

    #[error("Retries Exhausted Error: {message} {location}")]
    RetriesExhausted {
        message: String,
        location: ErrorLocation,
    },
}

impl From<WsError> for TransportError {
    #[track_caller]
    fn from(error: WsError) -> Self {
        TransportError::Connect {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}

impl From<url::ParseError> for TransportError {
    #[track_caller]
    fn from(error: url::ParseError) -> Self {
        TransportError::Endpoint {
            message: error.to_string(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
