//! The event model and its defaulting deserializer.
//!
//! Stored and imported events arrive as loosely-typed JSON. They are read into an
//! [`EventRecord`], whose fields are all optional raw JSON values, and
//! [`Event::from_record`] is the only bridge from that untrusted shape into a
//! validated [`Event`]. `Event` itself deserializes through `EventRecord`, so any
//! `serde_json::from_str::<Event>` call gets the same defaulting. A JSON value
//! that is not an object at all reads as an empty record.

use crate::duration::{
    days_from_millis, time_of_day_from_millis, truncate_to_day, StartOffsetParts,
    MILLIS_IN_ONE_DAY, MILLIS_IN_ONE_HOUR,
};
use crate::error::Result;
use crate::events::ensure_unique_ids;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One schedulable item in a batch, positioned relative to the batch start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawEvent")]
pub struct Event {
    /// Opaque identifier, fixed at creation. Used as the edit/lookup key.
    #[serde(rename = "eventId")]
    pub id: String,
    /// Signed milliseconds from the batch start. May be negative or span weeks.
    pub start_offset: i64,
    /// Milliseconds, never negative.
    pub duration: i64,
    pub is_whole_day_event: bool,
    pub summary: String,
    /// Empty means "no description" on export.
    pub description: String,
    /// Excluded events stay in the list but are skipped on export.
    pub included: bool,
}

/// Values used for fields a new or partially-stored event does not specify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventDefaults {
    pub start_offset: i64,
    pub duration: i64,
}

impl Default for EventDefaults {
    fn default() -> Self {
        Self {
            start_offset: 0,
            duration: MILLIS_IN_ONE_HOUR,
        }
    }
}

impl EventDefaults {
    /// Defaults whose start offset is `hour` o'clock on the batch start day.
    pub fn starting_at_hour(hour: u32) -> Self {
        Self {
            start_offset: i64::from(hour) * MILLIS_IN_ONE_HOUR,
            ..Self::default()
        }
    }
}

/// An event as found in storage or an imported file: any field may be missing
/// or carry the wrong JSON type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_offset: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_whole_day_event: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub included: Option<Value>,
}

/// Any JSON value standing where an event is expected.
#[derive(Deserialize)]
#[serde(transparent)]
struct RawEvent(Value);

impl From<RawEvent> for Event {
    fn from(raw: RawEvent) -> Self {
        let record = match raw.0 {
            value @ Value::Object(_) => serde_json::from_value(value).unwrap_or_default(),
            _ => EventRecord::default(),
        };
        Self::from_record(record)
    }
}

fn new_event_id() -> String {
    Uuid::new_v4().to_string()
}

/// Integer milliseconds from a JSON number; floats are truncated.
fn millis_value(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
}

fn string_value(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

impl Event {
    /// A fresh event with a new id, zero offset and a one-hour duration.
    pub fn new() -> Self {
        Self::with_defaults(&EventDefaults::default())
    }

    pub fn with_defaults(defaults: &EventDefaults) -> Self {
        Self {
            id: new_event_id(),
            start_offset: defaults.start_offset,
            duration: defaults.duration,
            is_whole_day_event: false,
            summary: String::new(),
            description: String::new(),
            included: true,
        }
    }

    /// Build an event from an untrusted record, filling gaps with
    /// [`EventDefaults::default`].
    pub fn from_record(record: EventRecord) -> Self {
        Self::from_record_with(record, &EventDefaults::default())
    }

    /// Build an event from an untrusted record.
    ///
    /// - the id is kept when it is a non-empty string, otherwise a new one is generated
    /// - numbers may be integers or finite floats; the duration is clamped to `>= 0`
    /// - `included` is true unless the record holds the literal `false`
    pub fn from_record_with(record: EventRecord, defaults: &EventDefaults) -> Self {
        let id = record
            .event_id
            .as_ref()
            .and_then(Value::as_str)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .unwrap_or_else(new_event_id);

        let start_offset = record
            .start_offset
            .as_ref()
            .and_then(millis_value)
            .unwrap_or(defaults.start_offset);

        let duration = record
            .duration
            .as_ref()
            .and_then(millis_value)
            .unwrap_or(defaults.duration)
            .max(0);

        let is_whole_day_event = record
            .is_whole_day_event
            .as_ref()
            .and_then(Value::as_bool)
            .unwrap_or(false);

        Self {
            id,
            start_offset,
            duration,
            is_whole_day_event,
            summary: string_value(record.summary.as_ref()),
            description: string_value(record.description.as_ref()),
            included: !matches!(record.included, Some(Value::Bool(false))),
        }
    }

    /// The fully-populated storage record for this event.
    pub fn to_record(&self) -> EventRecord {
        EventRecord {
            event_id: Some(Value::from(self.id.as_str())),
            start_offset: Some(Value::from(self.start_offset)),
            duration: Some(Value::from(self.duration)),
            is_whole_day_event: Some(Value::from(self.is_whole_day_event)),
            summary: Some(Value::from(self.summary.as_str())),
            description: Some(Value::from(self.description.as_str())),
            included: Some(Value::from(self.included)),
        }
    }

    /// Switch between whole-day and timed.
    ///
    /// Turning a timed event into a whole-day one resets the duration to one day
    /// and floors the start offset to the start of its day. Re-asserting an
    /// already-set flag leaves the event untouched, so a multi-day duration
    /// survives repeated toggling of other fields.
    pub fn set_whole_day_event(&mut self, whole_day: bool) {
        if whole_day && !self.is_whole_day_event {
            self.duration = MILLIS_IN_ONE_DAY;
            self.start_offset = truncate_to_day(self.start_offset);
        }
        self.is_whole_day_event = whole_day;
    }

    pub fn start_offset_parts(&self) -> StartOffsetParts {
        StartOffsetParts::from_millis(self.start_offset)
    }

    pub fn set_start_offset_parts(&mut self, parts: &StartOffsetParts) {
        self.start_offset = parts.to_millis(self.is_whole_day_event);
    }

    /// The duration as shown in its entry field: a day count for whole-day
    /// events, an unwrapped `HH:MM` span otherwise.
    pub fn duration_entry_text(&self) -> String {
        if self.is_whole_day_event {
            days_from_millis(self.duration).to_string()
        } else {
            time_of_day_from_millis(self.duration, false)
        }
    }
}

impl Default for Event {
    fn default() -> Self {
        Self::new()
    }
}

impl From<EventRecord> for Event {
    fn from(record: EventRecord) -> Self {
        Self::from_record(record)
    }
}

/// Parse a cached event list. Empty text or `null` is an empty list.
///
/// An id held by an earlier event is replaced on its later occurrences.
pub fn parse_events(json: &str) -> Result<Vec<Event>> {
    if json.trim().is_empty() {
        return Ok(Vec::new());
    }
    let events: Option<Vec<Event>> = serde_json::from_str(json)?;
    let events = ensure_unique_ids(events.unwrap_or_default());
    tracing::debug!(count = events.len(), "parsed event list");
    Ok(events)
}

/// Serialize an event list into its cache entry.
pub fn events_to_json(events: &[Event]) -> Result<String> {
    Ok(serde_json::to_string(events)?)
}
