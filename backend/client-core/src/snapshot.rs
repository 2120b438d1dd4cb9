//! Outbound payload assembly.
//!
//! A snapshot is built fresh for every send and never cached. Building one has
//! a visible side effect on the document: the `checked` and `selected`
//! attributes of form controls are synchronised with their live state, so the
//! markup the server receives agrees with the reported values.

use crate::codec;
use crate::dom::{Document, Element};
use crate::error::ProtocolError;
use crate::events::EventRecord;
use crate::protocol::OutboundSnapshot;
use crate::session;
use crate::storage::Storage;
use crate::window::WindowState;

use std::collections::BTreeMap;

use url::Url;

/// Everything outside the document that a snapshot reports.
#[derive(Debug, Clone, Copy)]
pub struct Environment<'a> {
    pub window: &'a WindowState,
    pub location: &'a Url,
    pub local: &'a Storage,
    pub session: &'a Storage,
}

pub fn build_snapshot(
    record: EventRecord,
    document: &mut Document,
    environment: Environment<'_>,
) -> Result<OutboundSnapshot, ProtocolError> {
    let values = form_values(document);
    let window_data = environment
        .window
        .data(environment.location, environment.local, environment.session);

    Ok(OutboundSnapshot {
        event_type: record.event_type,
        event_ref: record.scope,
        route: environment.location.path().to_string(),
        target_uuid: record.target_uuid,
        template: document.outer_html(),
        values: codec::encode(&values)?,
        event_data: record.event_data,
        window_data: codec::encode(&window_data)?,
        window_response: record.window_response,
        window_event: record.window_event,
        session_id: session::session_id(environment.session).map(str::to_string),
    })
}

/// Current value of every identified `input`, `textarea` and `select`.
pub fn form_values(document: &mut Document) -> BTreeMap<String, String> {
    let mut values = BTreeMap::new();
    document.root_mut().walk_mut(&mut |element| {
        let Some(id) = element.uuid().map(str::to_string) else {
            return;
        };
        match element.tag() {
            "input" => {
                if let Some(value) = input_value(element) {
                    values.insert(id, value);
                }
            }
            "textarea" => {
                values.insert(id, element.value());
            }
            "select" => {
                if let Some(value) = select_value(element) {
                    values.insert(id, value);
                }
            }
            _ => {}
        }
    });
    values
}

fn input_value(input: &mut Element) -> Option<String> {
    if !matches!(input.input_type().as_str(), "checkbox" | "radio") {
        return Some(input.value());
    }

    if input.is_checked() {
        input.set_attr("checked", "");
        Some(input.value())
    } else {
        input.remove_attr("checked");
        None
    }
}

/// Value of the option matching the select's current value; that option alone ends up `selected`.
fn select_value(select: &mut Element) -> Option<String> {
    let current = select.value();
    let mut matched = None;
    for option in select.options_mut() {
        let option_value = option.value();
        if matched.is_none() && option_value == current {
            option.set_attr("selected", "");
            matched = Some(option_value);
        } else {
            option.remove_attr("selected");
        }
    }
    matched
}
