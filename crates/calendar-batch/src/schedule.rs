//! Resolve relative events into absolute wall-clock spans.
//!
//! All values are naive datetimes in a fixed UTC frame: an event at offset
//! `9h` starts at 09:00 on the batch start day wherever it is viewed.

use crate::config::BatchConfig;
use crate::duration::{MILLIS_IN_ONE_DAY, MILLIS_IN_ONE_HOUR};
use crate::error::{BatchError, Result};
use crate::event::Event;
use chrono::{NaiveDateTime, TimeDelta};
use serde::Serialize;

/// An included event placed on the calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledEvent {
    pub id: String,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub all_day: bool,
}

impl ScheduledEvent {
    pub fn view_start(&self) -> String {
        format_view_timestamp(self.start, self.all_day)
    }

    pub fn view_end(&self) -> String {
        format_view_timestamp(self.end, self.all_day)
    }
}

fn shift(base: NaiveDateTime, offset_millis: i64) -> Result<NaiveDateTime> {
    TimeDelta::try_milliseconds(offset_millis)
        .and_then(|delta| base.checked_add_signed(delta))
        .ok_or(BatchError::OutOfRange { offset_millis })
}

/// `(start + offset, start + offset + duration)` for one event.
pub fn resolve_span(start: NaiveDateTime, event: &Event) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let begin = shift(start, event.start_offset)?;
    let end = shift(begin, event.duration)?;
    tracing::trace!(id = %event.id, %begin, %end, "resolved event span");
    Ok((begin, end))
}

/// Place every included event, in list order.
///
/// # Errors
/// [`BatchError::MissingStartDate`] when the batch has no valid start date.
pub fn schedule(config: &BatchConfig, events: &[Event]) -> Result<Vec<ScheduledEvent>> {
    let start = config.usable_start()?;

    events
        .iter()
        .filter(|e| e.included)
        .map(|e| {
            let (begin, end) = resolve_span(start, e)?;
            Ok(ScheduledEvent {
                id: e.id.clone(),
                title: e.summary.clone(),
                start: begin,
                end,
                all_day: e.is_whole_day_event,
            })
        })
        .collect()
}

/// An event as dropped or resized in a calendar view, in absolute time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    /// Empty when the view created the event itself.
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub all_day: bool,
}

/// Signed milliseconds from the batch `start` to `placed`.
pub fn resolve_offset(start: NaiveDateTime, placed: NaiveDateTime) -> i64 {
    (placed - start).num_milliseconds()
}

/// Read a placement back into the relative model. The inverse of [`schedule`].
///
/// Without an end the duration is one day for all-day placements and one hour
/// otherwise; an end before the start gives a zero duration. An empty id gets a
/// fresh one. The result is always included.
///
/// # Errors
/// [`BatchError::MissingStartDate`] when the batch has no valid start date.
pub fn event_from_placement(config: &BatchConfig, placement: &Placement) -> Result<Event> {
    let start = config.usable_start()?;
    let duration = match placement.end {
        Some(end) => resolve_offset(placement.start, end).max(0),
        None if placement.all_day => MILLIS_IN_ONE_DAY,
        None => MILLIS_IN_ONE_HOUR,
    };

    let mut event = Event::new();
    if !placement.id.is_empty() {
        event.id = placement.id.clone();
    }
    event.start_offset = resolve_offset(start, placement.start);
    event.duration = duration;
    event.is_whole_day_event = placement.all_day;
    event.summary = placement.title.clone();
    event.description = placement.description.clone();

    tracing::trace!(id = %event.id, offset = event.start_offset, "read back placement");
    Ok(event)
}

/// `YYYYMMDD` or `YYYYMMDDTHHMMSS`.
pub fn format_ics_timestamp(dt: NaiveDateTime, date_only: bool) -> String {
    if date_only {
        dt.format("%Y%m%d").to_string()
    } else {
        dt.format("%Y%m%dT%H%M%S").to_string()
    }
}

/// `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`, as calendar widgets expect.
pub fn format_view_timestamp(dt: NaiveDateTime, date_only: bool) -> String {
    if date_only {
        dt.format("%Y-%m-%d").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S").to_string()
    }
}

/// `Mon 14 Apr 2025` or `Mon 14 Apr 2025 09:00`.
pub fn format_display(dt: NaiveDateTime, date_only: bool) -> String {
    if date_only {
        dt.format("%a %d %b %Y").to_string()
    } else {
        dt.format("%a %d %b %Y %H:%M").to_string()
    }
}

/// Human-readable start of `event`, or `None` while the batch has no usable date.
pub fn display_start(config: &BatchConfig, event: &Event) -> Option<String> {
    let start = config.usable_start().ok()?;
    let (begin, _) = resolve_span(start, event).ok()?;
    Some(format_display(begin, event.is_whole_day_event))
}
