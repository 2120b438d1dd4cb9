//! Window-scope subscription gate.
//!
//! The server announces which window events it wants once per connection.
//! Until that list arrives, window events are held back in arrival order.
//! The first list releases them exactly once; from then on every window event
//! is checked against the stored subscriptions directly.
//!
//! Subscriptions live in session storage, one entry per event type whose value
//! is the marker echoed back as `window_event`.

use crate::events::capture::BrowserEvent;
use crate::events::catalog;
use crate::storage::Storage;

use log::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub enum GateDecision {
    /// Held until the first subscription list arrives.
    Buffered,
    Deliver { event: BrowserEvent, marker: String },
    Suppressed(BrowserEvent),
}

#[derive(Debug)]
pub struct WindowSubscriptionGate {
    /// `Some` until the first subscription list of this connection.
    pending: Option<Vec<BrowserEvent>>,
}

impl Default for WindowSubscriptionGate {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowSubscriptionGate {
    pub fn new() -> Self {
        Self {
            pending: Some(Vec::new()),
        }
    }

    pub fn is_buffering(&self) -> bool {
        self.pending.is_some()
    }

    pub fn buffered(&self) -> usize {
        self.pending.as_ref().map_or(0, Vec::len)
    }

    /// Decide what happens to a window-scope event.
    pub fn admit(&mut self, event: BrowserEvent, session: &Storage) -> GateDecision {
        if let Some(pending) = self.pending.as_mut() {
            trace!("Buffering window event {} until subscriptions arrive", event.event_type);
            pending.push(event);
            return GateDecision::Buffered;
        }

        match subscription_marker(session, &event.event_type) {
            Some(marker) => GateDecision::Deliver { event, marker },
            None => GateDecision::Suppressed(event),
        }
    }

    /// Replace the stored subscriptions with `entries`.
    ///
    /// Returns the events buffered before the first list, in arrival order.
    /// Later lists return nothing.
    pub fn apply_subscriptions(&mut self, entries: &[String], session: &mut Storage) -> Vec<BrowserEvent> {
        let subscriptions: Vec<(String, String)> = entries
            .iter()
            .filter_map(|entry| {
                let parsed = parse_entry(entry);
                if parsed.is_none() {
                    debug!("Ignoring subscription for unknown window event {entry:?}");
                }
                parsed
            })
            .collect();

        session.retain(|key| {
            !catalog::is_window_event(key) || subscriptions.iter().any(|(event_type, _)| event_type == key)
        });
        for (event_type, marker) in subscriptions {
            session.set(event_type, marker);
        }

        let released = self.pending.take().unwrap_or_default();
        if !released.is_empty() {
            debug!("Replaying {} buffered window event(s)", released.len());
        }
        released
    }
}

/// Stored marker for `event_type`, when subscribed.
pub fn subscription_marker(session: &Storage, event_type: &str) -> Option<String> {
    if !catalog::is_window_event(event_type) {
        return None;
    }
    session
        .get(event_type)
        .filter(|marker| !marker.is_empty())
        .map(str::to_string)
}

/// `click` or `onclick_<marker>` → (`click`, entry).
pub fn parse_entry(entry: &str) -> Option<(String, String)> {
    if catalog::is_window_event(entry) {
        return Some((entry.to_string(), entry.to_string()));
    }

    let handler = entry.strip_prefix("on")?;
    let (event_type, marker) = handler.split_once('_')?;
    if marker.is_empty() || !catalog::is_window_event(event_type) {
        return None;
    }
    Some((event_type.to_string(), entry.to_string()))
}
