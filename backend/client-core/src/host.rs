//! The browser chrome around a mirrored page.
//!
//! Commands that would show UI or move the user somewhere are delegated to a
//! [`Host`]. Document and storage effects stay inside the runtime.

use crate::config::DialogConfig;
use crate::protocol::ScrollBehavior;

use log::info;
use url::Url;

pub trait Host {
    fn alert(&mut self, message: &str);

    /// `true` when the user accepts.
    fn confirm(&mut self, message: &str) -> bool;

    /// `None` when the user cancels.
    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String>;

    /// Open `url`; `new_page` keeps the current page alive.
    fn open(&mut self, url: &Url, new_page: bool);

    fn close(&mut self);

    fn scroll(&mut self, x: f64, y: f64, behavior: ScrollBehavior);

    /// Called right before the page is torn down and rebuilt.
    fn reload(&mut self);
}

/// Logs every effect and answers dialogs from configuration.
#[derive(Debug, Clone, Default)]
pub struct HeadlessHost {
    dialogs: DialogConfig,
}

impl HeadlessHost {
    pub fn new(dialogs: DialogConfig) -> Self {
        Self { dialogs }
    }
}

impl Host for HeadlessHost {
    fn alert(&mut self, message: &str) {
        info!("alert: {message}");
    }

    fn confirm(&mut self, message: &str) -> bool {
        info!("confirm: {message} -> {}", self.dialogs.confirm_answer);
        self.dialogs.confirm_answer
    }

    fn prompt(&mut self, message: &str, default: Option<&str>) -> Option<String> {
        let answer = self.dialogs.prompt_answer.clone();
        info!("prompt: {message} (default {default:?}) -> {answer:?}");
        answer
    }

    fn open(&mut self, url: &Url, new_page: bool) {
        if new_page {
            info!("Opening {url} in a new page");
        } else {
            info!("Navigating to {url}");
        }
    }

    fn close(&mut self) {
        info!("Window closed by server");
    }

    fn scroll(&mut self, x: f64, y: f64, behavior: ScrollBehavior) {
        info!("Scrolled to ({x}, {y}) {behavior:?}");
    }

    fn reload(&mut self) {
        info!("Reloading page");
    }
}
