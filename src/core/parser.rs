//! JSON parser for timeline event files.
//!
//! This module provides functionality to parse JSON-formatted event files
//! into the internal `EventTimeline` structure.

use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use super::event::{EventTimeline, TimelineEvent};

/// Supported event file format version.
pub const SUPPORTED_VERSION: u32 = 1;

/// Largest time magnitude accepted; beyond 2^53 times no longer map exactly to `f64`.
pub const MAX_TIME_MAGNITUDE: i64 = 1 << 53;

/// Date format used for `base_date`.
const BASE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors that can occur during event file parsing.
#[derive(Debug, Error)]
pub enum ParseError {
    /// JSON syntax error
    #[error("Invalid JSON syntax: {0}")]
    JsonSyntax(#[from] serde_json::Error),

    /// Unsupported format version
    #[error("Unsupported format version {version}: expected version 1")]
    UnsupportedVersion { version: u32 },

    /// Two events share an identifier
    #[error("Duplicate event id '{id}'")]
    DuplicateId { id: String },

    /// An event ends before it starts
    #[error("Event '{id}' ends at {time_end} before it starts at {time_start}")]
    InvertedRange {
        id: String,
        time_start: i64,
        time_end: i64,
    },

    /// A time too large to lay out exactly
    #[error("Event '{id}' has time {time} outside the supported range of ±{}", MAX_TIME_MAGNITUDE)]
    TimeOutOfRange { id: String, time: i64 },

    /// An end time without a start time
    #[error("Event '{id}' has an end time but no start time")]
    EndWithoutStart { id: String },

    /// `base_date` is not a valid calendar date
    #[error("Invalid base date '{value}': expected YYYY-MM-DD")]
    InvalidBaseDate { value: String },
}

// ============================================================================
// Intermediate JSON structures for deserialization
// ============================================================================

/// Top-level JSON structure for event files.
#[derive(Debug, Deserialize)]
struct JsonTimeline {
    version: u32,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    base_date: Option<String>,
    events: Vec<JsonEvent>,
}

/// Event in JSON format.
#[derive(Debug, Deserialize)]
struct JsonEvent {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    time_start: Option<i64>,
    #[serde(default)]
    time_end: Option<i64>,
    #[serde(default)]
    parent_event_id: Option<String>,
}

// ============================================================================
// Parser implementation
// ============================================================================

/// Parse a JSON string into an `EventTimeline`.
///
/// # Arguments
/// * `content` - The JSON string to parse
///
/// # Returns
/// * `Ok(EventTimeline)` - Successfully parsed timeline
/// * `Err(ParseError)` - Parsing failed with a descriptive error
pub fn parse_json(content: &str) -> Result<EventTimeline, ParseError> {
    let json: JsonTimeline = serde_json::from_str(content)?;

    if json.version != SUPPORTED_VERSION {
        return Err(ParseError::UnsupportedVersion {
            version: json.version,
        });
    }

    let base_date = json.base_date.as_deref().map(parse_base_date).transpose()?;

    let mut seen = HashSet::with_capacity(json.events.len());
    let events = json
        .events
        .into_iter()
        .map(|event| {
            if !seen.insert(event.id.clone()) {
                return Err(ParseError::DuplicateId { id: event.id });
            }
            convert_event(event)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(EventTimeline {
        title: json.title,
        base_date,
        events,
    })
}

/// Convert a JSON event to a `TimelineEvent`.
fn convert_event(json: JsonEvent) -> Result<TimelineEvent, ParseError> {
    if let Some(time) = [json.time_start, json.time_end]
        .into_iter()
        .flatten()
        .find(|t| t.unsigned_abs() > MAX_TIME_MAGNITUDE as u64)
    {
        return Err(ParseError::TimeOutOfRange { id: json.id, time });
    }

    match (json.time_start, json.time_end) {
        (Some(time_start), Some(time_end)) if time_end < time_start => {
            return Err(ParseError::InvertedRange {
                id: json.id,
                time_start,
                time_end,
            });
        }
        (None, Some(_)) => return Err(ParseError::EndWithoutStart { id: json.id }),
        _ => {}
    }

    Ok(TimelineEvent {
        id: json.id,
        title: json.title,
        time_start: json.time_start,
        time_end: json.time_end,
        parent_event_id: json.parent_event_id,
    })
}

/// Parse a `YYYY-MM-DD` base date.
pub fn parse_base_date(value: &str) -> Result<NaiveDate, ParseError> {
    NaiveDate::parse_from_str(value, BASE_DATE_FORMAT).map_err(|_| ParseError::InvalidBaseDate {
        value: value.to_string(),
    })
}
