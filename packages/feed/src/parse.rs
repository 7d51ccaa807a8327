#![allow(clippy::module_name_repetitions)]
//! Tolerant parsing of the feed's JSON payload.
//!
//! The feed wraps incidents in `{"success": ..., "data": [...]}`. Records
//! are parsed individually: one without a usable id is skipped with a
//! warning, missing optional fields get defaults. One bad record must never
//! cost a whole cycle.

use fogo_watch_incident_models::{District, Incident};
use serde_json::Value;

use crate::FeedError;

/// Status shown when the feed omits one.
const STATUS_UNKNOWN: &str = "Desconhecido";

/// Extracts the incident list from a feed response body, preserving feed
/// order.
///
/// # Errors
///
/// Returns [`FeedError::Malformed`] if the body has no `data` array.
pub fn parse_incidents(body: &Value) -> Result<Vec<Incident>, FeedError> {
    let records = body
        .get("data")
        .and_then(Value::as_array)
        .ok_or_else(|| FeedError::Malformed {
            message: "response has no `data` array".to_string(),
        })?;

    Ok(records.iter().filter_map(parse_incident).collect())
}

/// Parses one feed record, or `None` if it has no usable id.
fn parse_incident(record: &Value) -> Option<Incident> {
    let Some(id) = id_string(record.get("id")) else {
        log::warn!("Skipping feed record without id: {record}");
        return None;
    };

    let status = str_field(record, "status").trim();
    let status = if status.is_empty() {
        STATUS_UNKNOWN
    } else {
        status
    };

    Some(Incident {
        id,
        district: District::from_feed(str_field(record, "district")),
        location: str_field(record, "location").trim().to_string(),
        locality: str_field(record, "locality").trim().to_string(),
        parish: str_field(record, "parish").trim().to_string(),
        municipality: str_field(record, "municipality").trim().to_string(),
        date: str_field(record, "date").trim().to_string(),
        hour: str_field(record, "hour").trim().to_string(),
        man: count_field(record, "man"),
        terrain: count_field(record, "terrain"),
        aerial: count_field(record, "aerial"),
        status: status.to_string(),
    })
}

/// Stringifies an id value; the live feed sends numbers, older captures
/// send strings.
fn id_string(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}

/// Returns the string value of `field`, or `""` when absent or non-string.
fn str_field<'a>(record: &'a Value, field: &str) -> &'a str {
    record.get(field).and_then(Value::as_str).unwrap_or_default()
}

/// Returns the numeric value of `field`; accepts numbers or numeric
/// strings, defaulting to 0.
fn count_field(record: &Value, field: &str) -> u32 {
    match record.get(field) {
        Some(Value::Number(n)) => n
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}
