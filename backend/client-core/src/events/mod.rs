//! Event capture and the window-subscription gate.

pub mod capture;
pub mod catalog;
pub mod gate;

pub use capture::{BrowserEvent, EventRecord, marker_attribute};
pub use gate::{GateDecision, WindowSubscriptionGate};
