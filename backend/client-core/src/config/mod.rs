use crate::error::config::ConfigError;
use crate::{APP_NAME, DEFAULT_PAGE_URL, DEFAULT_WS_PORT};

use common::ErrorLocation;

use std::panic::Location;
use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

const CONFIG_FILE_NAME: &str = "client.toml";

pub const ENV_PAGE_URL: &str = "WEBMIRROR_PAGE_URL";
pub const ENV_WS_PORT: &str = "WEBMIRROR_WS_PORT";
pub const ENV_LOG_LEVEL: &str = "WEBMIRROR_LOG_LEVEL";

// ============================================
// CONFIG STRUCTS
// ============================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address of the mirrored page; also decides `ws` vs `wss`.
    #[serde(default = "default_page_url")]
    pub page_url: String,
    #[serde(default = "default_ws_port")]
    pub ws_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            page_url: default_page_url(),
            ws_port: default_ws_port(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageConfig {
    /// HTML file every page load starts from. An empty document when unset.
    #[serde(default)]
    pub bootstrap_html: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_outer_width")]
    pub outer_width: u32,
    #[serde(default = "default_outer_height")]
    pub outer_height: u32,
    #[serde(default = "default_inner_width")]
    pub inner_width: u32,
    #[serde(default = "default_inner_height")]
    pub inner_height: u32,
    #[serde(default = "default_outer_width")]
    pub screen_width: u32,
    #[serde(default = "default_screen_height")]
    pub screen_height: u32,
    #[serde(default = "default_color_depth")]
    pub color_depth: u32,
    #[serde(default = "default_color_depth")]
    pub pixel_depth: u32,
    #[serde(default)]
    pub screen_x: i32,
    #[serde(default)]
    pub screen_y: i32,
    #[serde(default)]
    pub orientation_angle: u16,
    #[serde(default = "default_orientation_type")]
    pub orientation_type: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            outer_width: default_outer_width(),
            outer_height: default_outer_height(),
            inner_width: default_inner_width(),
            inner_height: default_inner_height(),
            screen_width: default_outer_width(),
            screen_height: default_screen_height(),
            color_depth: default_color_depth(),
            pixel_depth: default_color_depth(),
            screen_x: 0,
            screen_y: 0,
            orientation_angle: 0,
            orientation_type: default_orientation_type(),
        }
    }
}

/// Canned answers for server-requested dialogs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DialogConfig {
    #[serde(default)]
    pub confirm_answer: bool,
    /// `None` answers a prompt as if it was cancelled.
    #[serde(default)]
    pub prompt_answer: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// One of `error`, `warn`, `info`, `debug`, `trace`.
    #[serde(default)]
    pub level: Option<String>,
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub page: PageConfig,

    #[serde(default)]
    pub window: WindowConfig,

    #[serde(default)]
    pub dialogs: DialogConfig,

    #[serde(default)]
    pub log: LogConfig,
}

// ============================================
// DEFAULT FUNCTIONS
// ============================================

fn default_page_url() -> String {
    DEFAULT_PAGE_URL.to_string()
}
fn default_ws_port() -> u16 {
    DEFAULT_WS_PORT
}
fn default_outer_width() -> u32 {
    1280
}
fn default_outer_height() -> u32 {
    800
}
fn default_inner_width() -> u32 {
    1280
}
fn default_inner_height() -> u32 {
    720
}
fn default_screen_height() -> u32 {
    800
}
fn default_color_depth() -> u32 {
    24
}
fn default_orientation_type() -> String {
    "landscape-primary".to_string()
}

// ============================================
// IMPLEMENTATION
// ============================================

impl ClientConfig {
    /// `{config_dir}/webmirror/client.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::DirectoryNotFound`] when the platform has no config directory.
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::DirectoryNotFound {
            location: ErrorLocation::from(Location::caller()),
        })?;
        Ok(config_dir.join(APP_NAME).join(CONFIG_FILE_NAME))
    }

    /// Load from an explicit file, or from [`Self::default_path`] when `path` is `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    /// Environment overrides are applied and the result validated either way.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let path = Self::default_path()?;
                if path.exists() {
                    Self::load_from(&path)?
                } else {
                    info!("Config file not found at {}, using defaults", path.display());
                    Self::default()
                }
            }
        };

        if let Ok(env_path) = dotenvy::dotenv() {
            debug!("Loaded environment from {}", env_path.display());
        }
        config.apply_overrides(|key| std::env::var(key).ok())?;

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file without applying overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            warn!("Failed to read config file {}: {e}", path.display());
            ConfigError::ReadError {
                location: ErrorLocation::from(Location::caller()),
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let config: ClientConfig = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            location: ErrorLocation::from(Location::caller()),
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        info!("Config loaded from {}", path.display());
        Ok(config)
    }

    /// Apply `WEBMIRROR_*` overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if the port override is not a number.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(page_url) = lookup(ENV_PAGE_URL) {
            debug!("{ENV_PAGE_URL} overrides page url");
            self.server.page_url = page_url;
        }

        if let Some(port) = lookup(ENV_WS_PORT) {
            self.server.ws_port = port.trim().parse().map_err(|_| ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("{ENV_WS_PORT} is not a port number: {port}"),
            })?;
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.log.level = Some(level);
        }

        Ok(())
    }

    /// Validate config values.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.ws_port == 0 {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: "ws_port cannot be 0".to_string(),
            });
        }

        let page_url = url::Url::parse(&self.server.page_url).map_err(|e| ConfigError::ValidationError {
            location: ErrorLocation::from(Location::caller()),
            reason: format!("Invalid page url {}: {e}", self.server.page_url),
        })?;
        if !matches!(page_url.scheme(), "http" | "https") || page_url.host_str().is_none() {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("Page url must be http(s) with a host: {}", self.server.page_url),
            });
        }

        let window = &self.window;
        let geometry = [
            ("outer_width", window.outer_width),
            ("outer_height", window.outer_height),
            ("inner_width", window.inner_width),
            ("inner_height", window.inner_height),
            ("screen_width", window.screen_width),
            ("screen_height", window.screen_height),
        ];
        if let Some((name, _)) = geometry.iter().find(|(_, value)| *value == 0) {
            return Err(ConfigError::ValidationError {
                location: ErrorLocation::from(Location::caller()),
                reason: format!("{name} must be positive"),
            });
        }

        if let Some(level) = &self.log.level {
            if level.parse::<log::LevelFilter>().is_err() {
                return Err(ConfigError::ValidationError {
                    location: ErrorLocation::from(Location::caller()),
                    reason: format!("Unknown log level: {level}"),
                });
            }
        }

        Ok(())
    }

    /// Configured log level, if any.
    pub fn log_level(&self) -> Option<log::LevelFilter> {
        self.log.level.as_deref().and_then(|level| level.parse().ok())
    }
}
