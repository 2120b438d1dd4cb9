//! The per-page client runtime.
//!
//! Every input to a page (transport progress, inbound frames, browser events,
//! timer firings) is a [`Task`] on one queue. Tasks run to completion one at a
//! time, so the document, the gate and the pending handles need no locking.

use crate::client::BrowsingContext;
use crate::codec;
use crate::commands::PendingHandles;
use crate::connection::ConnectionManager;
use crate::dom::{Document, Element};
use crate::events::capture::document_event_wanted;
use crate::events::{BrowserEvent, EventRecord, GateDecision, WindowSubscriptionGate, catalog};
use crate::host::Host;
use crate::patch;
use crate::protocol::{CorrelationId, ReferenceScope, ServerMessage};
use crate::session::SessionStore;
use crate::snapshot::{Environment, build_snapshot};
use crate::window::WindowState;

use log::{debug, error, info, trace, warn};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum Task {
    Opened,
    Inbound(String),
    TransportFailed(String),
    Closed,
    Browser(BrowserEvent),
    /// Firings carry the generation of the registration that scheduled them.
    TimeoutFired(CorrelationId, u64),
    IntervalFired(CorrelationId, u64),
    FrameFired(CorrelationId, u64),
}

/// Scripted user interaction with the page.
#[derive(Debug, Clone, PartialEq)]
pub enum UserInput {
    Fire(BrowserEvent),
    SetValue { uuid: String, value: String },
    SetChecked { uuid: String, checked: bool },
    Select { uuid: String, value: String },
    Dump,
    Quit,
}

/// Why a page ended.
#[derive(Debug, Clone, PartialEq)]
pub enum PageExit {
    Reload,
    Navigate(Url),
    WindowClosed,
    TransportLost,
    Quit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Continue,
    Exit(PageExit),
}

enum Wake {
    Task(Option<Task>),
    Input(Option<UserInput>),
}

pub struct ClientRuntime<'a, H: Host> {
    pub(crate) context: &'a mut BrowsingContext,
    pub(crate) host: &'a mut H,
    pub(crate) document: Document,
    pub(crate) window: WindowState,
    pub(crate) gate: WindowSubscriptionGate,
    pub(crate) handles: PendingHandles,
    pub(crate) connection: ConnectionManager,
    pub(crate) tasks: UnboundedSender<Task>,
}

impl<'a, H: Host> ClientRuntime<'a, H> {
    pub fn new(
        context: &'a mut BrowsingContext,
        host: &'a mut H,
        document: Document,
        window: WindowState,
        connection: ConnectionManager,
        tasks: UnboundedSender<Task>,
    ) -> Self {
        Self {
            context,
            host,
            document,
            window,
            gate: WindowSubscriptionGate::new(),
            handles: PendingHandles::default(),
            connection,
            tasks,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn window(&self) -> &WindowState {
        &self.window
    }

    pub fn gate(&self) -> &WindowSubscriptionGate {
        &self.gate
    }

    pub fn handles(&self) -> &PendingHandles {
        &self.handles
    }

    pub fn context(&self) -> &BrowsingContext {
        self.context
    }

    pub fn is_ready(&self) -> bool {
        self.connection.is_ready()
    }

    /// Process tasks and scripted input until the page ends.
    pub async fn run(
        mut self,
        tasks: &mut UnboundedReceiver<Task>,
        input: &mut Option<UnboundedReceiver<UserInput>>,
    ) -> PageExit {
        loop {
            let wake = tokio::select! {
                task = tasks.recv() => Wake::Task(task),
                user_input = next_input(input) => Wake::Input(user_input),
            };

            let flow = match wake {
                Wake::Task(Some(task)) => self.handle(task),
                Wake::Task(None) => Flow::Exit(PageExit::TransportLost),
                Wake::Input(Some(user_input)) => self.handle_input(user_input),
                Wake::Input(None) => {
                    debug!("Input closed, continuing without it");
                    *input = None;
                    Flow::Continue
                }
            };

            if let Flow::Exit(exit) = flow {
                info!("Page ended: {exit:?}");
                return exit;
            }
        }
    }

    pub fn handle(&mut self, task: Task) -> Flow {
        match task {
            Task::Opened => {
                self.connection.mark_open();
                self.context.reconnect.reset();
                self.send(EventRecord::handshake());
                Flow::Continue
            }
            Task::Inbound(text) => self.dispatch(&text),
            Task::TransportFailed(reason) => {
                warn!("Transport error: {reason}");
                Flow::Continue
            }
            Task::Closed => {
                self.connection.mark_closed();
                Flow::Exit(PageExit::TransportLost)
            }
            Task::Browser(event) => {
                self.capture(event);
                Flow::Continue
            }
            Task::TimeoutFired(id, generation) => {
                self.timeout_fired(id, generation);
                Flow::Continue
            }
            Task::IntervalFired(id, generation) => {
                self.interval_fired(id, generation);
                Flow::Continue
            }
            Task::FrameFired(id, generation) => {
                self.frame_fired(id, generation);
                Flow::Continue
            }
        }
    }

    /// Route one inbound frame. Undecodable frames are logged and dropped.
    pub fn dispatch(&mut self, text: &str) -> Flow {
        let message = match ServerMessage::from_wire(text) {
            Ok(message) => message,
            Err(e) => {
                warn!("Dropping inbound message: {e}");
                return Flow::Continue;
            }
        };

        match message {
            ServerMessage::SetSessionId(id) => {
                SessionStore::new(&mut self.context.session_storage).set(&id);
            }
            ServerMessage::WindowSubscriptions(entries) => {
                let released = self
                    .gate
                    .apply_subscriptions(&entries, &mut self.context.session_storage);
                for event in released {
                    self.admit_window_event(event);
                }
            }
            ServerMessage::Patch(batch) => {
                let report = patch::apply_batch(&mut self.document, &batch);
                debug!(
                    "Applied {} diff entr(ies), skipped {}",
                    report.applied,
                    report.skipped.len()
                );
            }
            ServerMessage::Reload => return Flow::Exit(PageExit::Reload),
            ServerMessage::Command(command) => return self.execute(command),
            ServerMessage::Error(payload) => error!("Server reported an error: {payload}"),
        }

        Flow::Continue
    }

    /// Apply the delivery rule for the event's scope.
    pub fn capture(&mut self, event: BrowserEvent) {
        if !catalog::is_tracked(event.scope, &event.event_type) {
            trace!("No {} listener for {:?}", event.scope, event.event_type);
            return;
        }

        match event.scope {
            ReferenceScope::Document => {
                if self.connection.is_ready() && document_event_wanted(&self.document, &event) {
                    self.send(EventRecord::from_event(&event, None));
                }
            }
            ReferenceScope::Window => self.admit_window_event(event),
        }
    }

    fn admit_window_event(&mut self, event: BrowserEvent) {
        match self.gate.admit(event, &self.context.session_storage) {
            GateDecision::Buffered => {}
            GateDecision::Deliver { event, marker } => {
                self.send(EventRecord::from_event(&event, Some(marker)));
            }
            GateDecision::Suppressed(event) => {
                trace!("Window event {} not subscribed", event.event_type);
            }
        }
    }

    /// Build a snapshot around `record` and hand it to the transport.
    pub(crate) fn send(&mut self, record: EventRecord) {
        if !self.connection.is_ready() {
            debug!("Transport not open, dropping {:?} event", record.event_type);
            return;
        }

        let environment = Environment {
            window: &self.window,
            location: &self.context.location,
            local: &self.context.local_storage,
            session: &self.context.session_storage,
        };

        let text = build_snapshot(record, &mut self.document, environment)
            .and_then(|snapshot| codec::encode(&snapshot));
        let text = match text {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to encode snapshot: {e}");
                return;
            }
        };

        if let Err(e) = self.connection.send(text) {
            warn!("{e}");
        }
    }

    pub fn handle_input(&mut self, input: UserInput) -> Flow {
        match input {
            UserInput::Fire(event) => self.capture(event),
            UserInput::SetValue { uuid, value } | UserInput::Select { uuid, value } => {
                match self.document.find_mut(&uuid) {
                    Some(element) => element.set_value(value),
                    None => warn!("No element with uuid {uuid}"),
                }
            }
            UserInput::SetChecked { uuid, checked } => self.set_checked(&uuid, checked),
            UserInput::Dump => info!("{}", self.document.outer_html()),
            UserInput::Quit => return Flow::Exit(PageExit::Quit),
        }
        Flow::Continue
    }

    /// Checking a radio unchecks the rest of its group.
    fn set_checked(&mut self, uuid: &str, checked: bool) {
        let Some(element) = self.document.find_mut(uuid) else {
            warn!("No element with uuid {uuid}");
            return;
        };
        element.set_checked(checked);

        let group = (checked && element.input_type() == "radio")
            .then(|| element.attr("name").map(str::to_string))
            .flatten();
        if let Some(group) = group {
            self.document.root_mut().walk_mut(&mut |other: &mut Element| {
                if other.tag() == "input"
                    && other.input_type() == "radio"
                    && other.attr("name") == Some(group.as_str())
                    && other.uuid() != Some(uuid)
                {
                    other.set_checked(false);
                }
            });
        }
    }
}

async fn next_input(input: &mut Option<UnboundedReceiver<UserInput>>) -> Option<UserInput> {
    match input {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
