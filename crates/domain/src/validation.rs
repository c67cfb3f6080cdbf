//! Presence and format checks for incoming requests
//!
//! Checks push human-readable messages onto a shared list so a request
//! with several problems reports all of them at once.

use std::collections::BTreeSet;

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

use crate::model::{Platform, TimeInput};

/// Return the trimmed value, or record `"{label} is required"`
pub fn require_text(label: &str, value: Option<&str>, errors: &mut Vec<String>) -> Option<String> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Some(v.to_string()),
        _ => {
            errors.push(format!("{} is required", label));
            None
        }
    }
}

/// Parse a non-empty list of platform names into a set
pub fn require_platforms(
    values: Option<&[String]>,
    errors: &mut Vec<String>,
) -> Option<BTreeSet<Platform>> {
    let values = match values {
        Some(v) if !v.is_empty() => v,
        _ => {
            errors.push("At least one platform is required".to_string());
            return None;
        }
    };

    let mut platforms = BTreeSet::new();
    let mut ok = true;
    for value in values {
        match value.parse::<Platform>() {
            Ok(p) => {
                platforms.insert(p);
            }
            Err(e) => {
                errors.push(e.to_string());
                ok = false;
            }
        }
    }
    ok.then_some(platforms)
}

/// Parse a required scheduled time
pub fn require_time(
    label: &str,
    value: Option<&TimeInput>,
    errors: &mut Vec<String>,
) -> Option<OffsetDateTime> {
    let Some(value) = value else {
        errors.push(format!("{} is required", label));
        return None;
    };
    match parse_time(value) {
        Ok(t) => Some(t),
        Err(e) => {
            errors.push(e);
            None
        }
    }
}

/// Interpret RFC 3339 text or unix milliseconds
pub fn parse_time(value: &TimeInput) -> Result<OffsetDateTime, String> {
    match value {
        TimeInput::Millis(ms) => OffsetDateTime::from_unix_timestamp_nanos(*ms as i128 * 1_000_000)
            .map_err(|_| format!("Invalid timestamp: {}", ms)),
        TimeInput::Text(text) => OffsetDateTime::parse(text.trim(), &Rfc3339)
            .map_err(|_| format!("Invalid timestamp: {}", text)),
    }
}
