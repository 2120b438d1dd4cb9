//! Server → client messages.
//!
//! A message is routed by which top-level field it carries. Several fields can
//! be present at once; the first match in [`ROUTING_ORDER`] wins and the rest
//! of the message is ignored.

use crate::codec;
use crate::error::ProtocolError;

use common::ErrorLocation;

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FormatResult};
use std::panic::Location;

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Bare text frame that forces an immediate reload.
pub const RELOAD_LITERAL: &str = "reload";

/// Top-level fields recognised on inbound messages, in routing priority.
pub const ROUTING_ORDER: [&str; 20] = [
    "setSessionId",
    "window",
    "template",
    "reload",
    "alert",
    "open",
    "confirm",
    "prompt",
    "close",
    "scroll_to",
    "scroll_by",
    "set_timeout",
    "set_interval",
    "clear_timeout",
    "clear_interval",
    "request_animation_frame",
    "cancel_animation_frame",
    "localstorage",
    "sessionstorage",
    "Error",
];

/// Identifier correlating a command with its response.
///
/// Servers send these as strings or numbers; both normalise to text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CorrelationId(String);

impl CorrelationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for CorrelationId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> FormatResult {
        formatter.write_str(&self.0)
    }
}

impl From<&str> for CorrelationId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl<'de> Deserialize<'de> for CorrelationId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Text(String),
            Number(serde_json::Number),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Text(text) => CorrelationId(text),
            RawId::Number(number) => CorrelationId(number.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DiffStatus {
    Added,
    Removed,
    Changed,
}

/// One structural change, keyed by the identifier of the element it targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiffEntry {
    pub target: String,
    pub status: DiffStatus,
    /// Absent only for a root-level `Changed`.
    pub parent: Option<String>,
    /// Markup for `Added`/`Changed`, the removed child's identifier for `Removed`.
    pub element: String,
}

impl DiffEntry {
    /// Whole-document replacement.
    pub fn root_replacement(markup: impl Into<String>) -> Self {
        Self {
            target: String::new(),
            status: DiffStatus::Changed,
            parent: None,
            element: markup.into(),
        }
    }

    pub fn is_root_replacement(&self) -> bool {
        self.status == DiffStatus::Changed && self.parent.is_none()
    }
}

#[derive(Deserialize)]
struct RawDiffEntry {
    status: DiffStatus,
    #[serde(default)]
    parent: Option<String>,
    element: String,
}

/// Diff entries applied as one unit.
pub type DiffBatch = Vec<DiffEntry>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollBehavior {
    #[default]
    Auto,
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ScrollCommand {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    #[serde(default)]
    pub behavior: ScrollBehavior,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OpenTarget {
    pub path: String,
    #[serde(default)]
    pub new_page: bool,
}

#[derive(Deserialize)]
struct PromptBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    default: Option<String>,
}

#[derive(Deserialize)]
struct TimeoutBody {
    id: CorrelationId,
    #[serde(default)]
    delay: f64,
}

#[derive(Deserialize)]
struct IntervalBody {
    id: CorrelationId,
    #[serde(default)]
    interval: f64,
}

#[derive(Deserialize)]
struct HandleBody {
    id: CorrelationId,
}

/// Browser-level instruction pushed by the server.
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteCommand {
    Alert(String),
    Navigate(OpenTarget),
    Confirm {
        message: String,
        id: CorrelationId,
    },
    Prompt {
        message: String,
        default: Option<String>,
        id: CorrelationId,
    },
    Close,
    ScrollTo(ScrollCommand),
    ScrollBy(ScrollCommand),
    SetTimeout {
        id: CorrelationId,
        delay_ms: u64,
    },
    SetInterval {
        id: CorrelationId,
        interval_ms: u64,
    },
    ClearTimeout(CorrelationId),
    ClearInterval(CorrelationId),
    RequestAnimationFrame(CorrelationId),
    CancelAnimationFrame(CorrelationId),
    ReplaceLocalStorage(BTreeMap<String, String>),
    ReplaceSessionStorage(BTreeMap<String, String>),
}

impl RemoteCommand {
    /// Wire tag, also used as the `type` of response events.
    pub fn tag(&self) -> &'static str {
        match self {
            RemoteCommand::Alert(_) => "alert",
            RemoteCommand::Navigate(_) => "open",
            RemoteCommand::Confirm { .. } => "confirm",
            RemoteCommand::Prompt { .. } => "prompt",
            RemoteCommand::Close => "close",
            RemoteCommand::ScrollTo(_) => "scroll_to",
            RemoteCommand::ScrollBy(_) => "scroll_by",
            RemoteCommand::SetTimeout { .. } => "set_timeout",
            RemoteCommand::SetInterval { .. } => "set_interval",
            RemoteCommand::ClearTimeout(_) => "clear_timeout",
            RemoteCommand::ClearInterval(_) => "clear_interval",
            RemoteCommand::RequestAnimationFrame(_) => "request_animation_frame",
            RemoteCommand::CancelAnimationFrame(_) => "cancel_animation_frame",
            RemoteCommand::ReplaceLocalStorage(_) => "localstorage",
            RemoteCommand::ReplaceSessionStorage(_) => "sessionstorage",
        }
    }
}

/// A decoded inbound message. Exactly one variant per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerMessage {
    SetSessionId(String),
    WindowSubscriptions(Vec<String>),
    Patch(DiffBatch),
    Reload,
    Command(RemoteCommand),
    Error(Value),
}

impl ServerMessage {
    /// Decode one text frame.
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::Decode`] if the frame is not a JSON object
    /// - [`ProtocolError::UnrecognizedShape`] if no routing field is present
    /// - [`ProtocolError::InvalidField`] if the routing field has the wrong shape
    pub fn from_wire(text: &str) -> Result<Self, ProtocolError> {
        if text == RELOAD_LITERAL {
            return Ok(ServerMessage::Reload);
        }

        let mut object: Map<String, Value> = codec::decode(text)?;

        let Some(field) = ROUTING_ORDER.iter().find(|f| object.contains_key(**f)) else {
            let keys: Vec<&str> = object.keys().map(String::as_str).collect();
            return Err(ProtocolError::UnrecognizedShape {
                message: format!("no routing field among {keys:?}"),
                location: ErrorLocation::from(Location::caller()),
            });
        };

        let value = object.remove(*field).unwrap_or(Value::Null);

        let message = match *field {
            "setSessionId" => ServerMessage::SetSessionId(field_as("setSessionId", value)?),
            "window" => ServerMessage::WindowSubscriptions(field_as("window", value)?),
            "template" => ServerMessage::Patch(decode_template(value)?),
            "reload" => ServerMessage::Reload,
            "alert" => ServerMessage::Command(RemoteCommand::Alert(text_of(value))),
            "open" => ServerMessage::Command(RemoteCommand::Navigate(field_as("open", value)?)),
            "confirm" => ServerMessage::Command(RemoteCommand::Confirm {
                message: text_of(value),
                id: required(&mut object, "confirm_id")?,
            }),
            "prompt" => {
                let body = match value {
                    Value::String(message) => PromptBody {
                        message,
                        default: None,
                    },
                    other => field_as("prompt", other)?,
                };
                ServerMessage::Command(RemoteCommand::Prompt {
                    message: body.message,
                    default: body.default,
                    id: required(&mut object, "prompt_id")?,
                })
            }
            "close" => ServerMessage::Command(RemoteCommand::Close),
            "scroll_to" => ServerMessage::Command(RemoteCommand::ScrollTo(field_as("scroll_to", value)?)),
            "scroll_by" => ServerMessage::Command(RemoteCommand::ScrollBy(field_as("scroll_by", value)?)),
            "set_timeout" => {
                let body: TimeoutBody = field_as("set_timeout", value)?;
                ServerMessage::Command(RemoteCommand::SetTimeout {
                    id: body.id,
                    delay_ms: millis(body.delay),
                })
            }
            "set_interval" => {
                let body: IntervalBody = field_as("set_interval", value)?;
                ServerMessage::Command(RemoteCommand::SetInterval {
                    id: body.id,
                    interval_ms: millis(body.interval),
                })
            }
            "clear_timeout" => {
                ServerMessage::Command(RemoteCommand::ClearTimeout(handle_id("clear_timeout", value)?))
            }
            "clear_interval" => {
                ServerMessage::Command(RemoteCommand::ClearInterval(handle_id("clear_interval", value)?))
            }
            "request_animation_frame" => ServerMessage::Command(RemoteCommand::RequestAnimationFrame(
                handle_id("request_animation_frame", value)?,
            )),
            "cancel_animation_frame" => ServerMessage::Command(RemoteCommand::CancelAnimationFrame(
                handle_id("cancel_animation_frame", value)?,
            )),
            "localstorage" => ServerMessage::Command(RemoteCommand::ReplaceLocalStorage(
                storage_map("localstorage", value)?,
            )),
            "sessionstorage" => ServerMessage::Command(RemoteCommand::ReplaceSessionStorage(
                storage_map("sessionstorage", value)?,
            )),
            _ => ServerMessage::Error(value),
        };

        Ok(message)
    }
}

#[track_caller]
fn field_as<T: DeserializeOwned>(field: &'static str, value: Value) -> Result<T, ProtocolError> {
    serde_json::from_value(value).map_err(|e| ProtocolError::InvalidField {
        field,
        message: e.to_string(),
        location: ErrorLocation::from(Location::caller()),
    })
}

#[track_caller]
fn required(object: &mut Map<String, Value>, field: &'static str) -> Result<CorrelationId, ProtocolError> {
    match object.remove(field) {
        Some(value) => field_as(field, value),
        None => Err(ProtocolError::InvalidField {
            field,
            message: "missing correlation id".to_string(),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

/// `{"id": ..}` or a bare id.
fn handle_id(field: &'static str, value: Value) -> Result<CorrelationId, ProtocolError> {
    match value {
        Value::Object(_) => field_as::<HandleBody>(field, value).map(|body| body.id),
        other => field_as(field, other),
    }
}

fn text_of(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn millis(value: f64) -> u64 {
    if value.is_finite() && value > 0.0 {
        value.round() as u64
    } else {
        0
    }
}

fn storage_map(field: &'static str, value: Value) -> Result<BTreeMap<String, String>, ProtocolError> {
    match value {
        Value::Object(entries) => Ok(entries
            .into_iter()
            .map(|(key, value)| (key, text_of(value)))
            .collect()),
        Value::Null => Ok(BTreeMap::new()),
        other => Err(ProtocolError::InvalidField {
            field,
            message: format!("expected an object, got {other}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}

fn decode_template(value: Value) -> Result<DiffBatch, ProtocolError> {
    match value {
        Value::Object(entries) => Ok(entries
            .into_iter()
            .filter_map(|(target, raw)| match field_as::<RawDiffEntry>("template", raw) {
                Ok(raw) => Some(DiffEntry {
                    target,
                    status: raw.status,
                    parent: raw.parent,
                    element: raw.element,
                }),
                Err(e) => {
                    warn!("Skipping diff entry for {target}: {e}");
                    None
                }
            })
            .collect()),
        Value::Null => Ok(Vec::new()),
        Value::String(markup) if markup.trim().is_empty() => Ok(Vec::new()),
        Value::String(markup) => {
            let markup = if markup.trim_start().starts_with('<') {
                markup
            } else {
                codec::from_base64(markup.trim())?
            };
            Ok(vec![DiffEntry::root_replacement(markup)])
        }
        other => Err(ProtocolError::InvalidField {
            field: "template",
            message: format!("expected a diff batch or markup, got {other}"),
            location: ErrorLocation::from(Location::caller()),
        }),
    }
}
