//! Client side of the webmirror synchronization protocol.
//!
//! The server owns application state and renders HTML; this crate mirrors that
//! HTML in a local [`dom::Document`], reports interaction back as snapshots and
//! executes the browser-level commands the server pushes.
//!
//! # Layout
//!
//! - [`codec`] / [`protocol`]: wire encoding and the inbound/outbound message shapes
//! - [`storage`] / [`session`]: scoped storage and the persisted session identifier
//! - [`connection`]: websocket transport, endpoint derivation and reconnect policy
//! - [`events`]: event capture and the window-subscription gate
//! - [`snapshot`]: outbound payload assembly
//! - [`patch`]: diff application against the live document
//! - [`commands`]: remote command execution and pending timer handles
//! - [`runtime`] / [`client`]: the per-page runtime and the reconnecting driver

pub mod client;
pub mod codec;
pub mod commands;
pub mod config;
pub mod connection;
pub mod dom;
pub mod error;
pub mod events;
pub mod host;
pub mod patch;
pub mod protocol;
pub mod runtime;
pub mod session;
pub mod snapshot;
pub mod storage;
pub mod window;

#[cfg(test)]
mod tests;

pub const APP_NAME: &str = "webmirror";
pub const DEFAULT_WS_PORT: u16 = 8765;
pub const DEFAULT_PAGE_PORT: u16 = 8000;
pub const DEFAULT_PAGE_URL: &str = const_format::concatcp!("http://localhost:", DEFAULT_PAGE_PORT, "/");
