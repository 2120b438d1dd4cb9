//! Shared building blocks for the webmirror workspace.
//!
//! - **common** (this crate): error location tracking shared by every crate
//! - **client-core**: the synchronization protocol, document model and runtime
//! - **webmirror**: the headless client binary wiring everything together

pub mod error;

pub use error::error_location::ErrorLocation;
