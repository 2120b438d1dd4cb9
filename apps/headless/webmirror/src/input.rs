//! Scripted user input from stdin.
//!
//! One command per line:
//!
//! ```text
//! fire <type> <uuid> [x=.. y=.. key=.. dx=.. dy=.. touches=..]
//! window <type> [same options]
//! set <uuid> <value...>
//! check <uuid> on|off
//! select <uuid> <value>
//! dump
//! quit
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::error::WebmirrorError;

use client_core::events::BrowserEvent;
use client_core::runtime::UserInput;

use log::{debug, warn};
use tokio::io::{AsyncBufReadExt, BufReader, stdin};
use tokio::spawn as TokioSpawn;
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};

/// Parse one line. `Ok(None)` for blank lines and comments.
///
/// # Errors
///
/// Returns [`WebmirrorError::Input`] for unknown commands, missing arguments
/// or malformed options.
pub fn parse_line(line: &str) -> Result<Option<UserInput>, WebmirrorError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (command, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut words = rest.split_whitespace();

    let input = match command {
        "fire" => {
            let event_type = required(words.next(), "fire needs an event type")?;
            let target = required(words.next(), "fire needs a target uuid")?;
            let event = apply_options(BrowserEvent::document(event_type, target), words)?;
            UserInput::Fire(event)
        }
        "window" => {
            let event_type = required(words.next(), "window needs an event type")?;
            UserInput::Fire(apply_options(BrowserEvent::window(event_type), words)?)
        }
        "set" => {
            let uuid = required(words.next(), "set needs a uuid")?;
            // Everything after the uuid, spaces included.
            let value = rest[uuid.len()..].trim_start();
            UserInput::SetValue {
                uuid: uuid.to_string(),
                value: value.to_string(),
            }
        }
        "check" => {
            let uuid = required(words.next(), "check needs a uuid")?;
            let checked = match words.next() {
                Some("on") => true,
                Some("off") => false,
                other => {
                    return Err(WebmirrorError::input(format!(
                        "check expects on|off, got {other:?}"
                    )));
                }
            };
            UserInput::SetChecked {
                uuid: uuid.to_string(),
                checked,
            }
        }
        "select" => {
            let uuid = required(words.next(), "select needs a uuid")?;
            let value = required(words.next(), "select needs a value")?;
            UserInput::Select {
                uuid: uuid.to_string(),
                value: value.to_string(),
            }
        }
        "dump" => UserInput::Dump,
        "quit" | "exit" => UserInput::Quit,
        other => return Err(WebmirrorError::input(format!("unknown command {other:?}"))),
    };

    Ok(Some(input))
}

#[track_caller]
fn required<'a>(word: Option<&'a str>, message: &str) -> Result<&'a str, WebmirrorError> {
    word.ok_or_else(|| WebmirrorError::input(message))
}

fn apply_options<'a>(
    mut event: BrowserEvent,
    options: impl Iterator<Item = &'a str>,
) -> Result<BrowserEvent, WebmirrorError> {
    let mut position = (None, None);
    let mut delta = (None, None);

    for option in options {
        let (key, value) = option
            .split_once('=')
            .ok_or_else(|| WebmirrorError::input(format!("expected key=value, got {option:?}")))?;
        match key {
            "x" => position.0 = Some(number(key, value)?),
            "y" => position.1 = Some(number(key, value)?),
            "dx" => delta.0 = Some(number(key, value)?),
            "dy" => delta.1 = Some(number(key, value)?),
            "key" => event = event.with_key(value),
            "touches" => {
                let touches = value.parse().map_err(|_| {
                    WebmirrorError::input(format!("touches must be a whole number, got {value:?}"))
                })?;
                event = event.with_touches(touches);
            }
            other => return Err(WebmirrorError::input(format!("unknown option {other:?}"))),
        }
    }

    if position != (None, None) {
        event = event.with_position(position.0.unwrap_or(0.0), position.1.unwrap_or(0.0));
    }
    if delta != (None, None) {
        event = event.with_delta(delta.0.unwrap_or(0.0), delta.1.unwrap_or(0.0));
    }
    Ok(event)
}

#[track_caller]
fn number(key: &str, value: &str) -> Result<f64, WebmirrorError> {
    value
        .parse()
        .map_err(|_| WebmirrorError::input(format!("{key} must be a number, got {value:?}")))
}

/// Read stdin line by line until EOF, forwarding parsed commands.
pub fn spawn_stdin_reader() -> UnboundedReceiver<UserInput> {
    let (sender, receiver) = unbounded_channel();
    TokioSpawn(async move {
        let mut lines = BufReader::new(stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match parse_line(&line) {
                    Ok(Some(input)) => {
                        if sender.send(input).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("{e}"),
                },
                Ok(None) => {
                    debug!("Stdin closed");
                    break;
                }
                Err(e) => {
                    warn!("Failed to read stdin: {e}");
                    break;
                }
            }
        }
    });
    receiver
}
