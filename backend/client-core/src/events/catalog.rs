//! Event types the client listens for, per reference scope.
//!
//! Anything outside these lists is never captured.

use crate::protocol::ReferenceScope;

use std::collections::HashSet;

use once_cell::sync::Lazy;

pub const DOCUMENT_EVENTS: &[&str] = &[
    // pointer
    "click", "dblclick", "mousedown", "mouseup", "mousemove", "mouseover", "mouseout",
    "mouseenter", "mouseleave", "contextmenu", "wheel",
    // keyboard
    "keydown", "keyup", "keypress",
    // form
    "focus", "blur", "change", "input", "submit", "reset", "select",
    // drag and drop
    "drag", "dragstart", "dragend", "dragover", "dragenter", "dragleave", "drop",
    // scroll and resize
    "scroll", "resize",
    // media
    "play", "pause", "ended", "volumechange", "seeked", "seeking", "timeupdate",
    // touch
    "touchstart", "touchmove", "touchend", "touchcancel",
];

pub const WINDOW_EVENTS: &[&str] = &[
    // lifecycle and navigation
    "afterprint", "beforeprint", "beforeunload", "hashchange", "load", "pageshow", "pagehide",
    "popstate", "resize", "scroll", "DOMContentLoaded",
    "focus", "blur",
    // network
    "online", "offline",
    "storage",
    "message", "messageerror",
    // resources
    "error", "abort", "loadstart", "progress", "loadend", "timeout",
    // animation and transition
    "animationstart", "animationend", "animationiteration", "transitionstart", "transitionend",
    "transitioncancel",
    "fullscreenchange", "fullscreenerror", "pointerlockchange", "pointerlockerror",
    // device
    "devicemotion", "deviceorientation", "deviceorientationabsolute",
    "gamepadconnected", "gamepaddisconnected",
    // service worker and cache
    "install", "activate", "fetch", "notificationclick", "notificationclose", "push",
    "pushsubscriptionchange", "sync", "periodicsync", "backgroundfetchsuccess",
    "backgroundfetchfailure", "backgroundfetchabort", "backgroundfetchclick", "contentdelete",
    // clipboard and selection
    "cut", "copy", "paste", "select", "selectionchange",
    // form
    "submit", "reset", "input", "change", "invalid", "search", "toggle", "formdata",
    // media
    "play", "pause", "ended", "volumechange", "seeked", "seeking", "timeupdate", "canplay",
    "canplaythrough", "cuechange", "durationchange", "emptied", "loadeddata", "loadedmetadata",
    "stalled", "suspend", "waiting",
    // touch and pointer
    "touchstart", "touchend", "touchmove", "touchcancel",
    "pointerover", "pointerenter", "pointerdown", "pointermove", "pointerup", "pointercancel",
    "pointerout", "pointerleave", "gotpointercapture", "lostpointercapture",
    // drag and drop
    "drag", "dragstart", "dragend", "dragover", "dragenter", "dragleave", "drop",
    // mouse and keyboard, bubbled up from the document
    "click", "dblclick", "mousedown", "mouseup", "mousemove", "mouseover", "mouseout",
    "contextmenu", "wheel", "keydown", "keyup", "keypress",
    // composition
    "compositionstart", "compositionupdate", "compositionend",
    "visibilitychange",
    "rejectionhandled", "unhandledrejection",
    "securitypolicyviolation",
];

static DOCUMENT_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| DOCUMENT_EVENTS.iter().copied().collect());
static WINDOW_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| WINDOW_EVENTS.iter().copied().collect());

/// Whether a listener exists for `event_type` in `scope`.
pub fn is_tracked(scope: ReferenceScope, event_type: &str) -> bool {
    match scope {
        ReferenceScope::Document => DOCUMENT_SET.contains(event_type),
        ReferenceScope::Window => WINDOW_SET.contains(event_type),
    }
}

pub fn is_window_event(event_type: &str) -> bool {
    WINDOW_SET.contains(event_type)
}
