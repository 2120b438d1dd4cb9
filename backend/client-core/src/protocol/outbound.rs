//! Client → server messages.

use crate::protocol::ReferenceScope;

use serde::Serialize;

/// Raw interaction fields of the event that triggered a send.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventData {
    pub client_x: Option<f64>,
    pub client_y: Option<f64>,
    pub key: Option<String>,
    pub delta_x: Option<f64>,
    pub delta_y: Option<f64>,
    pub touches: Option<u32>,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

/// Result of a response-obligated remote command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WindowResponse {
    Confirm {
        confirm_result: bool,
        confirm_id: String,
    },
    Prompt {
        prompt_result: Option<String>,
        prompt_id: String,
    },
    Timeout {
        timeout_id: String,
        timeout_executed: bool,
    },
    Interval {
        interval_id: String,
        interval_executed: bool,
    },
    AnimationFrame {
        animation_frame_id: String,
        animation_frame_executed: bool,
        timestamp: u64,
    },
}

/// The single flat message the client ever sends.
///
/// `values` and `window_data` travel as JSON text nested inside the outer object.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutboundSnapshot {
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub event_ref: Option<ReferenceScope>,
    pub route: String,
    pub target_uuid: Option<String>,
    pub template: String,
    pub values: String,
    pub event_data: EventData,
    pub window_data: String,
    pub window_response: Option<WindowResponse>,
    pub window_event: Option<String>,
    #[serde(rename = "sessionId")]
    pub session_id: Option<String>,
}
