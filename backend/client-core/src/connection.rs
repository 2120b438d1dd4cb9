//! Websocket transport to the rendering server.
//!
//! One [`ConnectionManager`] exists per page. It owns a background worker that
//! connects, forwards inbound frames onto the page's task queue and drains an
//! outbound channel. Sends never wait for the network.
//!
//! Every closure ends the page: the driver reloads and, while the
//! [`ReconnectPolicy`] allows it, connects again after a fixed delay.

use crate::error::TransportError;
use crate::runtime::Task;

use common::ErrorLocation;

use std::panic::Location;
use std::time::Duration;

use backoff::backoff::{Backoff, Constant};
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, trace, warn};
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use url::Url;

/// Reconnect attempts allowed after the first connection fails or drops.
pub const MAX_RECONNECT_ATTEMPTS: u32 = 2;

pub const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Websocket endpoint for a page: same host, `wss` for `https` pages, the configured port.
///
/// # Errors
///
/// Returns [`TransportError::Endpoint`] if the page URL has no host or an unsupported scheme.
pub fn endpoint_for(page_url: &Url, port: u16) -> Result<Url, TransportError> {
    let scheme = match page_url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(TransportError::Endpoint {
                message: format!("unsupported page scheme {other:?}"),
                location: ErrorLocation::from(Location::caller()),
            });
        }
    };

    let host = page_url.host_str().ok_or_else(|| TransportError::Endpoint {
        message: format!("page url {page_url} has no host"),
        location: ErrorLocation::from(Location::caller()),
    })?;

    // IPv6 hosts come back bracketed from host_str, which Url::parse expects.
    Ok(Url::parse(&format!("{scheme}://{host}:{port}/"))?)
}

/// Bounded, fixed-delay reconnection.
#[derive(Debug)]
pub struct ReconnectPolicy {
    attempts: u32,
    max_attempts: u32,
    backoff: Constant,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::new(MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY)
    }
}

impl ReconnectPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            attempts: 0,
            max_attempts,
            backoff: Constant::new(delay),
        }
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the next attempt, or `None` once the budget is spent.
    pub fn next_delay(&mut self) -> Option<Duration> {
        if self.attempts >= self.max_attempts {
            return None;
        }
        self.attempts += 1;
        self.backoff.next_backoff()
    }

    /// A successful open restores the full budget.
    pub fn reset(&mut self) {
        if self.attempts > 0 {
            debug!("Connection restored after {} attempt(s)", self.attempts);
        }
        self.attempts = 0;
        self.backoff.reset();
    }
}

pub struct ConnectionManager {
    outbound: UnboundedSender<String>,
    ready: bool,
    worker: Option<JoinHandle<()>>,
}

impl ConnectionManager {
    /// Start connecting to `endpoint`. Progress arrives on `tasks` as
    /// `Opened`, `Inbound`, `TransportFailed` and finally `Closed`.
    pub fn connect(endpoint: Url, tasks: UnboundedSender<Task>) -> Self {
        let (outbound, outbound_rx) = unbounded_channel();
        info!("Connecting to {endpoint}");
        let worker = TokioSpawn(run_transport(endpoint, outbound_rx, tasks));
        Self {
            outbound,
            ready: false,
            worker: Some(worker),
        }
    }

    /// A manager whose frames go straight to `outbound`, with no socket behind it.
    pub fn with_sink(outbound: UnboundedSender<String>) -> Self {
        Self {
            outbound,
            ready: false,
            worker: None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn mark_open(&mut self) {
        self.ready = true;
    }

    pub fn mark_closed(&mut self) {
        self.ready = false;
    }

    /// Queue one text frame.
    ///
    /// # Errors
    ///
    /// - [`TransportError::Closed`] if the transport is not open
    /// - [`TransportError::Send`] if the worker has already stopped
    pub fn send(&self, text: String) -> Result<(), TransportError> {
        if !self.ready {
            return Err(TransportError::Closed {
                message: "transport is not open".to_string(),
                location: ErrorLocation::from(Location::caller()),
            });
        }

        self.outbound.send(text).map_err(|_| TransportError::Send {
            message: "transport worker has stopped".to_string(),
            location: ErrorLocation::from(Location::caller()),
        })
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn run_transport(
    endpoint: Url,
    mut outbound: UnboundedReceiver<String>,
    tasks: UnboundedSender<Task>,
) {
    let stream = match connect_async(endpoint.as_str()).await {
        Ok((stream, _response)) => stream,
        Err(e) => {
            let error = TransportError::from(e);
            warn!("Failed to connect to {endpoint}: {error}");
            let _ = tasks.send(Task::TransportFailed(error.to_string()));
            let _ = tasks.send(Task::Closed);
            return;
        }
    };

    info!("Connected to {endpoint}");
    if tasks.send(Task::Opened).is_err() {
        return;
    }

    let (mut write, mut read) = stream.split();

    loop {
        tokio::select! {
            outgoing = outbound.recv() => match outgoing {
                Some(text) => {
                    if let Err(e) = write.send(Message::Text(text.into())).await {
                        let _ = tasks.send(Task::TransportFailed(format!("send failed: {e}")));
                        break;
                    }
                }
                None => {
                    // The page went away first; nobody is left to tell.
                    let _ = write.close().await;
                    return;
                }
            },
            incoming = read.next() => match incoming {
                Some(Ok(Message::Text(text))) => {
                    trace!("Inbound frame ({} bytes)", text.len());
                    if tasks.send(Task::Inbound(text.to_string())).is_err() {
                        return;
                    }
                }
                Some(Ok(Message::Binary(bytes))) => match String::from_utf8(bytes.to_vec()) {
                    Ok(text) => {
                        if tasks.send(Task::Inbound(text)).is_err() {
                            return;
                        }
                    }
                    Err(_) => warn!("Dropping non UTF-8 binary frame ({} bytes)", bytes.len()),
                },
                Some(Ok(Message::Close(frame))) => {
                    debug!("Server closed the connection: {frame:?}");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    let _ = tasks.send(Task::TransportFailed(format!("read failed: {e}")));
                    break;
                }
                None => break,
            },
        }
    }

    info!("Disconnected from {endpoint}");
    let _ = tasks.send(Task::Closed);
}
