//! Normalised browser events and the document-scope delivery rule.

use crate::dom::Document;
use crate::protocol::{EventData, ReferenceScope, WindowResponse};

use std::time::{SystemTime, UNIX_EPOCH};

/// A browser event as it reaches the client, before any delivery decision.
#[derive(Debug, Clone, PartialEq)]
pub struct BrowserEvent {
    pub event_type: String,
    pub scope: ReferenceScope,
    /// Identifier of the originating element. Window events have none.
    pub target: Option<String>,
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
    pub key: Option<String>,
    pub delta_x: Option<f64>,
    pub delta_y: Option<f64>,
    pub touches: Option<u32>,
}

impl BrowserEvent {
    pub fn document(event_type: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(event_type, ReferenceScope::Document, Some(target.into()))
    }

    pub fn window(event_type: impl Into<String>) -> Self {
        Self::new(event_type, ReferenceScope::Window, None)
    }

    fn new(event_type: impl Into<String>, scope: ReferenceScope, target: Option<String>) -> Self {
        Self {
            event_type: event_type.into(),
            scope,
            target,
            client_x: None,
            client_y: None,
            key: None,
            delta_x: None,
            delta_y: None,
            touches: None,
        }
    }

    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.client_x = Some(x);
        self.client_y = Some(y);
        self
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_delta(mut self, x: f64, y: f64) -> Self {
        self.delta_x = Some(x);
        self.delta_y = Some(y);
        self
    }

    pub fn with_touches(mut self, touches: u32) -> Self {
        self.touches = Some(touches);
        self
    }

    /// Interaction fields stamped with the current time.
    pub fn event_data(&self) -> EventData {
        EventData {
            client_x: self.client_x,
            client_y: self.client_y,
            key: self.key.clone(),
            delta_x: self.delta_x,
            delta_y: self.delta_y,
            touches: self.touches,
            timestamp: now_millis(),
        }
    }
}

/// What goes into one outbound snapshot besides page state.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EventRecord {
    pub event_type: Option<String>,
    pub scope: Option<ReferenceScope>,
    pub target_uuid: Option<String>,
    pub event_data: EventData,
    pub window_response: Option<WindowResponse>,
    pub window_event: Option<String>,
}

impl EventRecord {
    /// The empty record sent right after the transport opens.
    pub fn handshake() -> Self {
        Self {
            event_data: EventData {
                timestamp: now_millis(),
                ..EventData::default()
            },
            ..Self::default()
        }
    }

    pub fn from_event(event: &BrowserEvent, window_event: Option<String>) -> Self {
        Self {
            event_type: Some(event.event_type.clone()),
            scope: Some(event.scope),
            target_uuid: event.target.clone(),
            event_data: event.event_data(),
            window_response: None,
            window_event,
        }
    }

    /// Correlated result of a response-obligated command.
    pub fn response(command_tag: &str, response: WindowResponse) -> Self {
        Self {
            event_type: Some(command_tag.to_string()),
            scope: Some(ReferenceScope::Window),
            target_uuid: None,
            event_data: EventData {
                timestamp: now_millis(),
                ..EventData::default()
            },
            window_response: Some(response),
            window_event: None,
        }
    }
}

/// Attribute the server puts on elements it wants to hear `event_type` from.
pub fn marker_attribute(event_type: &str) -> String {
    format!("_on{event_type}")
}

/// A document event is delivered only when its target carries a non-empty marker.
pub fn document_event_wanted(document: &Document, event: &BrowserEvent) -> bool {
    let Some(target) = event.target.as_deref() else {
        return false;
    };

    document
        .find(target)
        .and_then(|element| element.attr(&marker_attribute(&event.event_type)))
        .is_some_and(|marker| !marker.is_empty())
}

pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as u64)
        .unwrap_or_default()
}
