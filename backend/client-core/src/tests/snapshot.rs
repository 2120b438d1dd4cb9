// Unit tests for snapshot assembly and form value collection

use crate::config::WindowConfig;
use crate::dom::Document;
use crate::events::{BrowserEvent, EventRecord};
use crate::protocol::ReferenceScope;
use crate::session::SESSION_ID_KEY;
use crate::snapshot::{Environment, build_snapshot, form_values};
use crate::storage::Storage;
use crate::window::WindowState;

use serde_json::Value;
use url::Url;

const FORM: &str = r#"<body>
<input uuid="name" value="Ana">
<textarea uuid="bio">hello</textarea>
<input uuid="agree" type="checkbox" value="yes">
<input uuid="news" type="checkbox" checked>
<input uuid="r1" type="radio" name="size" value="s">
<input uuid="r2" type="radio" name="size" value="m">
<select uuid="color"><option value="red" selected>Red</option><option value="blue">Blue</option></select>
<input type="text" value="anonymous">
</body>"#;

#[test]
fn given_form_when_values_collected_then_each_identified_control_reports() {
    let mut document = Document::parse(FORM);

    let values = form_values(&mut document);

    assert_eq!(values.get("name").map(String::as_str), Some("Ana"));
    assert_eq!(values.get("bio").map(String::as_str), Some("hello"));
    assert_eq!(values.get("news").map(String::as_str), Some("on"));
    assert_eq!(values.get("color").map(String::as_str), Some("red"));
    // Unchecked boxes and radios, and controls without an identifier, report nothing.
    assert!(!values.contains_key("agree"));
    assert!(!values.contains_key("r1"));
    assert_eq!(values.len(), 4);
}

/// **VALUE**: Verifies collecting values synchronises checked/selected attributes.
///
/// **WHY THIS MATTERS**: The server diffs against the markup it receives. If live state
/// were not reflected in attributes, its next diff would revert the user's choices.
#[test]
fn given_user_edits_when_values_collected_then_attributes_follow_live_state() {
    // GIVEN: The user checked `agree`, unchecked `news`, picked radio m and colour blue
    let mut document = Document::parse(FORM);
    for (uuid, checked) in [("agree", true), ("news", false), ("r2", true)] {
        if let Some(input) = document.find_mut(uuid) {
            input.set_checked(checked);
        }
    }
    if let Some(select) = document.find_mut("color") {
        select.set_value("blue");
    }

    // WHEN: Collecting values
    let values = form_values(&mut document);

    // THEN: Values and attributes agree with the live state
    assert_eq!(values.get("agree").map(String::as_str), Some("yes"));
    assert_eq!(values.get("r2").map(String::as_str), Some("m"));
    assert_eq!(values.get("color").map(String::as_str), Some("blue"));
    assert!(!values.contains_key("news"));

    assert!(document.find("agree").is_some_and(|e| e.has_attr("checked")));
    assert!(document.find("news").is_some_and(|e| !e.has_attr("checked")));
    let select = document.find("color").expect("select");
    let selected: Vec<String> = select
        .options()
        .iter()
        .filter(|option| option.has_attr("selected"))
        .map(|option| option.value())
        .collect();
    assert_eq!(selected, vec!["blue".to_string()]);
}

#[test]
fn given_select_value_matching_no_option_when_collected_then_select_reports_nothing() {
    let mut document = Document::parse(FORM);
    if let Some(select) = document.find_mut("color") {
        select.set_value("green");
    }

    let values = form_values(&mut document);

    assert!(!values.contains_key("color"));
}

/// **VALUE**: Verifies a full snapshot: route, target, nested values and window data.
#[test]
fn given_document_event_when_snapshot_built_then_payload_describes_page_and_environment() {
    // GIVEN: A page, its location and storage scopes
    let mut document = Document::parse(FORM);
    let window = WindowState::from_config(&WindowConfig::default());
    let location = Url::parse("https://example.test:8443/shop/cart?x=1").expect("url");
    let mut local = Storage::new();
    local.set("theme", "dark");
    let mut session = Storage::new();
    session.set(SESSION_ID_KEY, "sid-1");
    let event = BrowserEvent::document("click", "name").with_position(10.0, 20.0);

    // WHEN: Building the snapshot
    let snapshot = build_snapshot(
        EventRecord::from_event(&event, None),
        &mut document,
        Environment {
            window: &window,
            location: &location,
            local: &local,
            session: &session,
        },
    )
    .expect("builds");

    // THEN: Event fields, route and session are set
    assert_eq!(snapshot.event_type.as_deref(), Some("click"));
    assert_eq!(snapshot.event_ref, Some(ReferenceScope::Document));
    assert_eq!(snapshot.route, "/shop/cart");
    assert_eq!(snapshot.target_uuid.as_deref(), Some("name"));
    assert_eq!(snapshot.session_id.as_deref(), Some("sid-1"));
    assert_eq!(snapshot.event_data.client_x, Some(10.0));
    assert!(snapshot.template.starts_with("<html>"));

    // THEN: values and window_data are JSON text
    let values: Value = serde_json::from_str(&snapshot.values).expect("values json");
    assert_eq!(values["name"], "Ana");

    let window_data: Value = serde_json::from_str(&snapshot.window_data).expect("window json");
    assert_eq!(window_data["width"], 1280);
    assert_eq!(window_data["innerHeight"], 720);
    assert_eq!(window_data["scrollX"], 0.0);
    assert_eq!(window_data["location"]["protocol"], "https:");
    assert_eq!(window_data["location"]["host"], "example.test:8443");
    assert_eq!(window_data["location"]["port"], "8443");
    assert_eq!(window_data["location"]["pathname"], "/shop/cart");
    assert_eq!(window_data["location"]["origin"], "https://example.test:8443");
    assert_eq!(window_data["localStorage"], r#"{"theme":"dark"}"#);
    assert!(window_data["sessionStorage"].as_str().is_some_and(|s| s.contains("sid-1")));
    assert_eq!(window_data["screen"]["colorDepth"], 24);
    assert_eq!(window_data["screen"]["orientation"]["type"], "landscape-primary");
    assert!(window_data["screen"]["orientation"]["on_change"].is_null());
}

#[test]
fn given_handshake_record_when_snapshot_built_then_event_fields_are_empty() {
    let mut document = Document::default();
    let window = WindowState::from_config(&WindowConfig::default());
    let location = Url::parse("http://localhost:8000/").expect("url");
    let storage = Storage::new();

    let snapshot = build_snapshot(
        EventRecord::handshake(),
        &mut document,
        Environment {
            window: &window,
            location: &location,
            local: &storage,
            session: &storage,
        },
    )
    .expect("builds");

    assert_eq!(snapshot.event_type, None);
    assert_eq!(snapshot.event_ref, None);
    assert_eq!(snapshot.target_uuid, None);
    assert_eq!(snapshot.window_response, None);
    assert_eq!(snapshot.session_id, None);
    assert_eq!(snapshot.values, "{}");
}
