//! Window and environment metrics reported with every snapshot.

use crate::config::WindowConfig;
use crate::protocol::ScrollCommand;
use crate::storage::Storage;

use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    pub outer_width: u32,
    pub outer_height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub screen: ScreenData,
}

impl WindowState {
    pub fn from_config(config: &WindowConfig) -> Self {
        Self {
            outer_width: config.outer_width,
            outer_height: config.outer_height,
            inner_width: config.inner_width,
            inner_height: config.inner_height,
            scroll_x: 0.0,
            scroll_y: 0.0,
            screen: ScreenData {
                width: config.screen_width,
                height: config.screen_height,
                color_depth: config.color_depth,
                pixel_depth: config.pixel_depth,
                screen_x: config.screen_x,
                screen_y: config.screen_y,
                orientation: Orientation {
                    angle: config.orientation_angle,
                    kind: config.orientation_type.clone(),
                    on_change: None,
                },
            },
        }
    }

    /// Offsets never go negative.
    pub fn scroll_to(&mut self, command: &ScrollCommand) {
        self.scroll_x = command.x.max(0.0);
        self.scroll_y = command.y.max(0.0);
    }

    pub fn scroll_by(&mut self, command: &ScrollCommand) {
        self.scroll_x = (self.scroll_x + command.x).max(0.0);
        self.scroll_y = (self.scroll_y + command.y).max(0.0);
    }

    pub fn data<'a>(&'a self, location: &Url, local: &Storage, session: &Storage) -> WindowData<'a> {
        WindowData {
            width: self.outer_width,
            height: self.outer_height,
            inner_width: self.inner_width,
            inner_height: self.inner_height,
            scroll_x: self.scroll_x,
            scroll_y: self.scroll_y,
            location: LocationData::from_url(location),
            local_storage: local.to_json(),
            session_storage: session.to_json(),
            screen: &self.screen,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenData {
    pub width: u32,
    pub height: u32,
    pub color_depth: u32,
    pub pixel_depth: u32,
    pub screen_x: i32,
    pub screen_y: i32,
    pub orientation: Orientation,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Orientation {
    pub angle: u16,
    #[serde(rename = "type")]
    pub kind: String,
    /// Always null; kept so the payload shape matches what servers expect.
    pub on_change: Option<String>,
}

/// Components of the page location, as `window.location` exposes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationData {
    pub href: String,
    pub protocol: String,
    pub host: String,
    pub port: String,
    pub pathname: String,
    pub origin: String,
}

impl LocationData {
    pub fn from_url(url: &Url) -> Self {
        let hostname = url.host_str().unwrap_or_default();
        let port = url.port().map(|port| port.to_string()).unwrap_or_default();
        let host = if port.is_empty() {
            hostname.to_string()
        } else {
            format!("{hostname}:{port}")
        };

        Self {
            href: url.as_str().to_string(),
            protocol: format!("{}:", url.scheme()),
            host,
            port,
            pathname: url.path().to_string(),
            origin: url.origin().ascii_serialization(),
        }
    }
}

/// The `window_data` payload. Storage scopes travel as nested JSON text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowData<'a> {
    pub width: u32,
    pub height: u32,
    pub inner_width: u32,
    pub inner_height: u32,
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub location: LocationData,
    pub local_storage: String,
    pub session_storage: String,
    pub screen: &'a ScreenData,
}
