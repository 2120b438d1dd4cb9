//! Test helpers for client integration tests.
//!
//! A minimal websocket server stands in for the rendering server:
//! - Binding to an ephemeral localhost port
//! - Accepting one client connection at a time
//! - Sending raw text frames and receiving decoded JSON snapshots

use client_core::client::Client;
use client_core::config::ClientConfig;
use client_core::host::{HeadlessHost, Host};
use client_core::protocol::ScrollBehavior;

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::{WebSocketStream, accept_async, tungstenite::Message};
use url::Url;

/// Upper bound for any single wait in these tests.
pub const STEP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct TestServer {
    listener: TcpListener,
    port: u16,
}

impl TestServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let port = listener.local_addr().expect("Bound address").port();
        Self { listener, port }
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Wait for the next client and complete the websocket upgrade.
    pub async fn accept(&self) -> ServerConnection {
        let (stream, _) = timeout(STEP_TIMEOUT, self.listener.accept())
            .await
            .expect("Client did not connect in time")
            .expect("Failed to accept TCP connection");
        let ws = accept_async(stream)
            .await
            .expect("Failed to complete websocket handshake");
        ServerConnection { ws }
    }
}

pub struct ServerConnection {
    ws: WebSocketStream<TcpStream>,
}

impl ServerConnection {
    pub async fn send(&mut self, text: &str) {
        self.ws
            .send(Message::Text(text.to_string().into()))
            .await
            .expect("Failed to send frame");
    }

    /// Next snapshot from the client, skipping control frames.
    pub async fn recv_json(&mut self) -> Value {
        loop {
            let message = timeout(STEP_TIMEOUT, self.ws.next())
                .await
                .expect("No frame received in time")
                .expect("Connection ended")
                .expect("Error receiving frame");
            if let Message::Text(text) = message {
                return serde_json::from_str(&text).expect("Client frame is JSON");
            }
        }
    }

    pub async fn close(mut self) {
        let _ = self.ws.close(None).await;
    }
}

/// Config pointing a client at a local server on `port`.
pub fn client_config(port: u16) -> ClientConfig {
    let mut config = ClientConfig::default();
    config.server.page_url = format!("http://127.0.0.1:{port}/app");
    config.server.ws_port = port;
    config.dialogs.confirm_answer = true;
    config
}

pub fn headless_client(config: ClientConfig) -> Client<HeadlessHost> {
    let host = HeadlessHost::new(config.dialogs.clone());
    Client::new(config, host).expect("Valid client config")
}

/// Headless host that also counts page reloads.
#[derive(Debug, Default)]
pub struct CountingHost {
    inner: HeadlessHost,
    pub reloads: usize,
}

impl Host for CountingHost {
    fn alert(&mut self, message: &str) {
        self.inner.alert(message);
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.inner.confirm(message)
    }

    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        self.inner.prompt(message, default)
    }

    fn open(&mut self, url: &Url, new_page: bool) {
        self.inner.open(url, new_page);
    }

    fn close(&mut self) {
        self.inner.close();
    }

    fn scroll(&mut self, x: f64, y: f64, behavior: ScrollBehavior) {
        self.inner.scroll(x, y, behavior);
    }

    fn reload(&mut self) {
        self.reloads += 1;
        self.inner.reload();
    }
}

/// A port nothing is listening on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind throwaway listener");
    listener.local_addr().expect("Bound address").port()
}
