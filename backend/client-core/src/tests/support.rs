// Shared fixtures for runtime-level unit tests

use crate::client::BrowsingContext;
use crate::config::WindowConfig;
use crate::connection::ConnectionManager;
use crate::dom::Document;
use crate::host::Host;
use crate::protocol::ScrollBehavior;
use crate::runtime::{ClientRuntime, Task};
use crate::window::WindowState;

use serde_json::Value;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use url::Url;

pub const PAGE_URL: &str = "http://localhost:8000/app/home";

pub const FORM_PAGE: &str = r#"<!DOCTYPE html><html><head></head><body uuid="body">
<div uuid="root"><button uuid="btn" _onclick="handler-1">Go</button><span uuid="plain">x</span></div>
</body></html>"#;

/// Host that records every effect and answers dialogs with preset values.
#[derive(Debug, Default)]
pub struct RecordingHost {
    pub alerts: Vec<String>,
    pub confirms: Vec<String>,
    pub confirm_answer: bool,
    pub prompts: Vec<(String, Option<String>)>,
    pub prompt_answer: Option<String>,
    pub opened: Vec<(Url, bool)>,
    pub closed: bool,
    pub scrolls: Vec<(f64, f64, ScrollBehavior)>,
    pub reloads: usize,
}

impl Host for RecordingHost {
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }

    fn confirm(&mut self, message: &str) -> bool {
        self.confirms.push(message.to_string());
        self.confirm_answer
    }

    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        self.prompts
            .push((message.to_string(), default.map(str::to_string)));
        self.prompt_answer.clone()
    }

    fn open(&mut self, url: &Url, new_page: bool) {
        self.opened.push((url.clone(), new_page));
    }

    fn close(&mut self) {
        self.closed = true;
    }

    fn scroll(&mut self, x: f64, y: f64, behavior: ScrollBehavior) {
        self.scrolls.push((x, y, behavior));
    }

    fn reload(&mut self) {
        self.reloads += 1;
    }
}

pub fn context() -> BrowsingContext {
    BrowsingContext::new(Url::parse(PAGE_URL).expect("valid test url"))
}

pub struct Wire {
    pub sent: UnboundedReceiver<String>,
    pub queue: UnboundedReceiver<Task>,
}

impl Wire {
    /// Every frame sent so far, decoded.
    pub fn drain(&mut self) -> Vec<Value> {
        let mut frames = Vec::new();
        while let Ok(text) = self.sent.try_recv() {
            frames.push(serde_json::from_str(&text).expect("outbound frame is JSON"));
        }
        frames
    }
}

/// A runtime over `markup` whose transport writes into [`Wire::sent`].
pub fn runtime<'a>(
    context: &'a mut BrowsingContext,
    host: &'a mut RecordingHost,
    markup: &str,
) -> (ClientRuntime<'a, RecordingHost>, Wire) {
    let (sink, sent) = unbounded_channel();
    let (tasks, queue) = unbounded_channel();
    let runtime = ClientRuntime::new(
        context,
        host,
        Document::parse(markup),
        WindowState::from_config(&WindowConfig::default()),
        ConnectionManager::with_sink(sink),
        tasks,
    );
    (runtime, Wire { sent, queue })
}

/// Same as [`runtime`], with the transport already open and the handshake drained.
pub fn open_runtime<'a>(
    context: &'a mut BrowsingContext,
    host: &'a mut RecordingHost,
    markup: &str,
) -> (ClientRuntime<'a, RecordingHost>, Wire) {
    let (mut runtime, mut wire) = runtime(context, host, markup);
    runtime.handle(Task::Opened);
    let handshake = wire.drain();
    assert_eq!(handshake.len(), 1, "opening sends exactly one handshake");
    (runtime, wire)
}
