//! WASM bindings for calendar-batch.
//!
//! Exposes event normalization, template import, schedule resolution and
//! `.ics` export to JavaScript via `wasm-bindgen`. Events, templates and batch
//! configurations cross the boundary as JSON strings in their stored
//! camelCase shape; offsets and durations are plain millisecond numbers.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p calendar-batch-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir pkg/ \
//!   target/wasm32-unknown-unknown/release/calendar_batch_wasm.wasm
//! ```

use calendar_batch::duration;
use calendar_batch::{
    parse_batch_config, parse_events, parse_template, BatchConfig, Event, EventDefaults,
    Placement, ScheduledEvent, StartDate,
};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

/// A placed event in the shape calendar views consume: timed events carry
/// `YYYY-MM-DDTHH:MM:SS`, all-day events a bare date with an exclusive end.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ScheduledEventDto {
    id: String,
    title: String,
    start: String,
    end: String,
    all_day: bool,
}

impl From<&ScheduledEvent> for ScheduledEventDto {
    fn from(e: &ScheduledEvent) -> Self {
        Self {
            id: e.id.clone(),
            title: e.title.clone(),
            start: e.view_start(),
            end: e.view_end(),
            all_day: e.all_day,
        }
    }
}

/// An event read back from the calendar view after a drag or resize.
/// Timestamps use the same formats as [`ScheduledEventDto`].
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlacementInput {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    start: String,
    #[serde(default)]
    end: Option<String>,
    #[serde(default)]
    all_day: bool,
}

impl PlacementInput {
    fn into_placement(self) -> Result<Placement, JsValue> {
        let end = match self.end.as_deref() {
            Some(end) => Some(parse_timestamp(end)?),
            None => None,
        };
        Ok(Placement {
            id: self.id.unwrap_or_default(),
            title: self.title.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            start: parse_timestamp(&self.start)?,
            end,
            all_day: self.all_day,
        })
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `YYYY-MM-DD`, `YYYY-MM-DDTHH:MM:SS` or RFC 3339.
fn parse_timestamp(text: &str) -> Result<NaiveDateTime, JsValue> {
    StartDate::parse(text)
        .datetime()
        .ok_or_else(|| JsValue::from_str(&format!("Invalid datetime '{}'", text)))
}

fn js_error(context: &str, err: impl Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| js_error("Serialization error", e))
}

fn config_from_json(json: &str) -> Result<BatchConfig, JsValue> {
    parse_batch_config(json).map_err(|e| js_error("Invalid batch config JSON", e))
}

fn events_from_json(json: &str) -> Result<Vec<Event>, JsValue> {
    parse_events(json).map_err(|e| js_error("Invalid events JSON", e))
}

/// JS numbers are doubles; offsets are whole milliseconds.
fn millis(value: f64) -> i64 {
    value.trunc() as i64
}

// ---------------------------------------------------------------------------
// WASM exports: model
// ---------------------------------------------------------------------------

/// Create a fresh event with a new id and a one-hour duration.
///
/// With `start_hour` the event starts at that hour of the batch start day,
/// otherwise at the batch start itself.
#[wasm_bindgen(js_name = "newEvent")]
pub fn new_event(start_hour: Option<u32>) -> Result<String, JsValue> {
    let defaults = match start_hour {
        Some(hour) => EventDefaults::starting_at_hour(hour.min(23)),
        None => EventDefaults::default(),
    };
    to_json(&Event::with_defaults(&defaults))
}

/// Normalize a stored or imported event list.
///
/// Missing or mistyped fields are replaced with defaults; empty input or
/// `null` yields `[]`.
#[wasm_bindgen(js_name = "parseEvents")]
pub fn parse_events_json(json: &str) -> Result<String, JsValue> {
    to_json(&events_from_json(json)?)
}

/// Parse a template file in either the legacy (bare array) or current
/// (`{templateName, events}`) shape. Always returns the current shape.
#[wasm_bindgen(js_name = "parseTemplate")]
pub fn parse_template_json(json: &str) -> Result<String, JsValue> {
    let template = parse_template(json).map_err(|e| js_error("Invalid template JSON", e))?;
    to_json(&template)
}

/// Normalize a stored batch configuration. An unparseable start date is dropped.
#[wasm_bindgen(js_name = "parseBatchConfig")]
pub fn parse_batch_config_json(json: &str) -> Result<String, JsValue> {
    config_from_json(json)?
        .to_json()
        .map_err(|e| js_error("Serialization error", e))
}

/// Apply the whole-day flag to a single event and return the updated event.
#[wasm_bindgen(js_name = "setWholeDayEvent")]
pub fn set_whole_day_event(event_json: &str, whole_day: bool) -> Result<String, JsValue> {
    let mut event: Event =
        serde_json::from_str(event_json).map_err(|e| js_error("Invalid event JSON", e))?;
    event.set_whole_day_event(whole_day);
    to_json(&event)
}

// ---------------------------------------------------------------------------
// WASM exports: export and schedule
// ---------------------------------------------------------------------------

/// Render the iCalendar document for the included events.
///
/// Fails when the batch has no usable start date.
#[wasm_bindgen(js_name = "generateIcs")]
pub fn generate_ics(config_json: &str, events_json: &str) -> Result<String, JsValue> {
    let config = config_from_json(config_json)?;
    let events = events_from_json(events_json)?;
    calendar_batch::generate_ics(&config, &events).map_err(|e| js_error("Export failed", e))
}

/// Resolve the included events against the batch start date.
///
/// Returns a JSON array of `{id, title, start, end, allDay}` objects.
#[wasm_bindgen(js_name = "scheduleEvents")]
pub fn schedule_events(config_json: &str, events_json: &str) -> Result<String, JsValue> {
    let config = config_from_json(config_json)?;
    let events = events_from_json(events_json)?;
    let placed = calendar_batch::schedule(&config, &events)
        .map_err(|e| js_error("Scheduling failed", e))?;
    let dtos: Vec<ScheduledEventDto> = placed.iter().map(ScheduledEventDto::from).collect();
    to_json(&dtos)
}

/// Turn an event moved or resized in the calendar view back into a stored event.
///
/// `placement_json` is `{id?, title?, description?, start, end?, allDay?}`.
/// Fails when the batch has no usable start date.
#[wasm_bindgen(js_name = "eventFromPlacement")]
pub fn event_from_placement(config_json: &str, placement_json: &str) -> Result<String, JsValue> {
    let config = config_from_json(config_json)?;
    let input: PlacementInput = serde_json::from_str(placement_json)
        .map_err(|e| js_error("Invalid placement JSON", e))?;
    let event = calendar_batch::event_from_placement(&config, &input.into_placement()?)
        .map_err(|e| js_error("Placement failed", e))?;
    to_json(&event)
}

/// The suggested `.ics` file name for a batch.
#[wasm_bindgen(js_name = "exportFileName")]
pub fn export_file_name(config_json: &str) -> Result<String, JsValue> {
    let config = config_from_json(config_json)?;
    calendar_batch::export_file_name(&config).map_err(|e| js_error("Export failed", e))
}

/// The suggested file name for a saved template.
#[wasm_bindgen(js_name = "templateFileName")]
pub fn template_file_name(template_name: &str) -> String {
    calendar_batch::template_file_name(template_name)
}

// ---------------------------------------------------------------------------
// WASM exports: offset codec
// ---------------------------------------------------------------------------

#[wasm_bindgen(js_name = "timeOfDayFromMillis")]
pub fn time_of_day_from_millis(ms: f64, wrap_to_one_day: bool) -> String {
    duration::time_of_day_from_millis(millis(ms), wrap_to_one_day)
}

/// `undefined` for text that is not `HH:MM`.
#[wasm_bindgen(js_name = "millisFromTimeOfDay")]
pub fn millis_from_time_of_day(text: &str) -> Option<f64> {
    duration::millis_from_time_of_day(text).map(|ms| ms as f64)
}

#[wasm_bindgen(js_name = "daysFromMillis")]
pub fn days_from_millis(ms: f64) -> f64 {
    duration::days_from_millis(millis(ms)) as f64
}
