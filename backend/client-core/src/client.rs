//! The reconnecting driver.
//!
//! A [`Client`] owns the browsing context, which outlives every page: storage
//! scopes, the current location and the reconnect budget. Each page gets a
//! fresh document, task queue and connection. Reloads, navigation and
//! transport loss all tear the page down and build the next one.

use crate::config::{ClientConfig, PageConfig};
use crate::connection::{ConnectionManager, ReconnectPolicy, endpoint_for};
use crate::dom::Document;
use crate::error::{CoreError, PageError, TransportError};
use crate::host::Host;
use crate::runtime::{ClientRuntime, PageExit, UserInput};
use crate::storage::Storage;
use crate::window::WindowState;

use common::ErrorLocation;

use std::panic::Location;
use std::path::PathBuf;

use log::{info, warn};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::sleep as TokioSleep;
use url::Url;

const EMPTY_PAGE: &str = "<html><head></head><body></body></html>";

/// State that survives reloads and reconnects.
#[derive(Debug)]
pub struct BrowsingContext {
    pub session_storage: Storage,
    pub local_storage: Storage,
    pub location: Url,
    pub reconnect: ReconnectPolicy,
}

impl BrowsingContext {
    pub fn new(location: Url) -> Self {
        Self {
            session_storage: Storage::new(),
            local_storage: Storage::new(),
            location,
            reconnect: ReconnectPolicy::default(),
        }
    }
}

/// Where the baseline document of every page load comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageSource {
    Empty,
    Markup(String),
    File(PathBuf),
}

impl PageSource {
    pub fn from_config(config: &PageConfig) -> Self {
        match &config.bootstrap_html {
            Some(path) => PageSource::File(path.clone()),
            None => PageSource::Empty,
        }
    }

    /// # Errors
    ///
    /// Returns [`PageError::Source`] if the bootstrap file cannot be read.
    pub fn load(&self) -> Result<Document, PageError> {
        match self {
            PageSource::Empty => Ok(Document::parse(EMPTY_PAGE)),
            PageSource::Markup(markup) => Ok(Document::parse(markup)),
            PageSource::File(path) => {
                let markup = std::fs::read_to_string(path).map_err(|e| PageError::Source {
                    location: ErrorLocation::from(Location::caller()),
                    path: path.clone(),
                    source: e,
                })?;
                Ok(Document::parse(&markup))
            }
        }
    }
}

/// How the client stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientExit {
    WindowClosed,
    Quit,
}

pub struct Client<H: Host> {
    config: ClientConfig,
    host: H,
    context: BrowsingContext,
    source: PageSource,
}

impl<H: Host> Client<H> {
    /// # Errors
    ///
    /// Returns [`TransportError::Endpoint`] if the configured page url does not parse.
    pub fn new(config: ClientConfig, host: H) -> Result<Self, CoreError> {
        let location = Url::parse(&config.server.page_url).map_err(TransportError::from)?;
        let source = PageSource::from_config(&config.page);
        Ok(Self {
            config,
            host,
            context: BrowsingContext::new(location),
            source,
        })
    }

    pub fn with_page_source(mut self, source: PageSource) -> Self {
        self.source = source;
        self
    }

    pub fn with_reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.context.reconnect = policy;
        self
    }

    pub fn context(&self) -> &BrowsingContext {
        &self.context
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Drive pages until the window closes, input asks to quit or reconnection gives up.
    ///
    /// # Errors
    ///
    /// - [`TransportError::RetriesExhausted`] once the reconnect budget is spent
    /// - [`PageError::Source`] if the baseline document cannot be loaded
    pub async fn run(
        &mut self,
        mut input: Option<UnboundedReceiver<UserInput>>,
    ) -> Result<ClientExit, CoreError> {
        loop {
            let document = self.source.load()?;
            let endpoint = endpoint_for(&self.context.location, self.config.server.ws_port)?;

            let (tasks, mut task_queue) = unbounded_channel();
            let connection = ConnectionManager::connect(endpoint, tasks.clone());
            let window = WindowState::from_config(&self.config.window);
            let runtime = ClientRuntime::new(
                &mut self.context,
                &mut self.host,
                document,
                window,
                connection,
                tasks,
            );

            let exit = runtime.run(&mut task_queue, &mut input).await;
            match exit {
                PageExit::Reload => self.host.reload(),
                PageExit::Navigate(url) => {
                    info!("Navigating to {url}");
                    self.context.location = url;
                }
                PageExit::WindowClosed => return Ok(ClientExit::WindowClosed),
                PageExit::Quit => return Ok(ClientExit::Quit),
                PageExit::TransportLost => {
                    // Every close reloads, including the one that exhausts the budget.
                    self.host.reload();
                    let Some(delay) = self.context.reconnect.next_delay() else {
                        return Err(TransportError::RetriesExhausted {
                            message: format!(
                                "gave up after {} reconnect attempt(s)",
                                self.context.reconnect.max_attempts()
                            ),
                            location: ErrorLocation::from(Location::caller()),
                        }
                        .into());
                    };

                    warn!(
                        "Connection lost, reloading and reconnecting in {delay:?} (attempt {}/{})",
                        self.context.reconnect.attempts(),
                        self.context.reconnect.max_attempts()
                    );
                    TokioSleep(delay).await;
                }
            }
        }
    }
}
