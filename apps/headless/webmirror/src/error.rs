use client_core::error::{ConfigError, CoreError};

use common::ErrorLocation;

use std::panic::Location;

use thiserror::Error;

/// Errors surfaced by the webmirror binary.
#[derive(Debug, Error)]
pub enum WebmirrorError {
    /// Error from this App
    #[error("Webmirror Error: {message} {location}")]
    Webmirror {
        message: String,
        location: ErrorLocation,
    },

    /// A scripted input line that does not parse
    #[error("Input Error: {message} {location}")]
    Input {
        message: String,
        location: ErrorLocation,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl WebmirrorError {
    #[track_caller]
    pub fn input(message: impl Into<String>) -> Self {
        WebmirrorError::Input {
            message: message.into(),
            location: ErrorLocation::from(Location::caller()),
        }
    }
}
