//! `MM:SS` time text <-> whole seconds.
//!
//! Event rows carry their timestamp as `MM:SS` text. Seconds are derived once
//! at load time and cached on the model; display keeps the original text.

use thiserror::Error;

/// Time text that is not two non-negative integer components split by `:`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed time {text:?}: {reason}")]
pub struct MalformedTimeError {
    pub text: String,
    pub reason: &'static str,
}

impl MalformedTimeError {
    fn new(text: &str, reason: &'static str) -> Self {
        Self {
            text: text.to_string(),
            reason,
        }
    }
}

/// Parse `MM:SS` into whole seconds. Minutes may exceed 59; so may seconds.
pub fn parse(text: &str) -> Result<u32, MalformedTimeError> {
    let mut parts = text.trim().split(':');
    let (Some(minutes), Some(seconds), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(MalformedTimeError::new(text, "expected exactly two components"));
    };
    let minutes = parse_component(text, minutes)?;
    let seconds = parse_component(text, seconds)?;
    minutes
        .checked_mul(60)
        .and_then(|m| m.checked_add(seconds))
        .ok_or_else(|| MalformedTimeError::new(text, "value out of range"))
}

fn parse_component(text: &str, component: &str) -> Result<u32, MalformedTimeError> {
    let component = component.trim();
    if component.is_empty() || !component.bytes().all(|b| b.is_ascii_digit()) {
        return Err(MalformedTimeError::new(text, "component is not a non-negative integer"));
    }
    component
        .parse::<u32>()
        .map_err(|_| MalformedTimeError::new(text, "value out of range"))
}

/// Format whole seconds as `MM:SS`; minutes grow past two digits when needed.
pub fn format(seconds: u32) -> String {
    format!("{:02}:{:02}", seconds / 60, seconds % 60)
}
