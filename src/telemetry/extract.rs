//! Minimal scalar field scanner for the backend's flat telemetry object.
//!
//! This is not a JSON parser. It finds the first quoted occurrence of a key and reads
//! the numeric run that follows the next colon. Known limitations:
//!
//! - Structure is never validated; a key inside a nested object or inside a string
//!   value matches just the same, and only the first match is considered.
//! - Quoted numbers (`"power_W":"12"`) and `null` are reported as
//!   [`ParseError::InvalidNumber`].
//!
//! The backend emits flat objects of bare numbers, so both are acceptable.

use super::error::ParseError;
use super::types::{Channel, PowerSample};

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E')
}

/// Extract the numeric value of `field` from `body`.
///
/// # Examples
///
/// ```text
/// extract(r#"{"current_A":3,"power_W":12.34}"#, "power_W") == Ok(12.34)
/// ```
pub fn extract(body: &str, field: &str) -> Result<f64, ParseError> {
    let key = format!("\"{}\"", field);
    let key_start = body.find(&key).ok_or_else(|| ParseError::FieldNotFound(field.to_string()))?;

    let colon = body[key_start..]
        .find(':')
        .map(|offset| key_start + offset)
        .ok_or_else(|| ParseError::MalformedPayload(field.to_string()))?;

    let rest = body[colon + 1..].trim_start();
    let run_len = rest.find(|c: char| !is_number_char(c)).unwrap_or(rest.len());
    let raw = rest[..run_len].trim();

    raw.parse::<f64>().map_err(|_| ParseError::InvalidNumber {
        field: field.to_string(),
        raw: raw.to_string(),
    })
}

/// Build a [`PowerSample`] from a telemetry body. Fails on the first missing or
/// unreadable channel; no partial sample is ever produced.
pub fn parse_sample(body: &str) -> Result<PowerSample, ParseError> {
    let current = extract(body, Channel::Current.field_name())?;
    let voltage = extract(body, Channel::Voltage.field_name())?;
    let power = extract(body, Channel::Power.field_name())?;
    Ok(PowerSample::new(current, voltage, power))
}
