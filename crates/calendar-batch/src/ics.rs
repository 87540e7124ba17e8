//! iCalendar export.
//!
//! The output is built line by line rather than through a general iCalendar
//! writer so it stays byte-identical for identical inputs: no `DTSTAMP`, no
//! current time, no locale. Lines are joined with `\n` and the body has no
//! trailing newline.

use crate::config::BatchConfig;
use crate::error::Result;
use crate::event::Event;
use crate::schedule::{format_ics_timestamp, resolve_span};
use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

pub const PRODID: &str = "a26ee00a-2410-4fa5-966f-df02886bd7e7/rmarch/calendar-creator";

static UNSAFE_FILE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9 .\-_()]+").expect("file name pattern is valid"));

/// Render the batch as an `.ics` body.
///
/// Only events with `included == true` are emitted, in list order.
///
/// # Errors
/// Returns [`BatchError::MissingStartDate`](crate::BatchError::MissingStartDate)
/// before producing any output when the batch has no valid start date, and
/// [`BatchError::OutOfRange`](crate::BatchError::OutOfRange) if an offset
/// leaves the supported calendar range.
pub fn generate_ics(config: &BatchConfig, events: &[Event]) -> Result<String> {
    let start = config.usable_start()?;

    let mut lines: Vec<String> = vec![
        "BEGIN:VCALENDAR".to_string(),
        format!("PRODID:{}", PRODID),
        "VERSION:2.0".to_string(),
        "METHOD:PUBLISH".to_string(),
        String::new(),
    ];

    let mut emitted = 0usize;
    for event in events.iter().filter(|e| e.included) {
        lines.extend(event_lines(config, start, event)?);
        emitted += 1;
    }

    lines.push("END:VCALENDAR".to_string());

    tracing::debug!(
        emitted,
        skipped = events.len() - emitted,
        batch = %config.batch_name,
        "generated ics"
    );

    Ok(lines.join("\n"))
}

fn event_lines(config: &BatchConfig, start: NaiveDateTime, event: &Event) -> Result<Vec<String>> {
    let (begin, end) = resolve_span(start, event)?;
    let whole_day = event.is_whole_day_event;
    let dtstart = format_ics_timestamp(begin, whole_day);
    let dtend = format_ics_timestamp(end, whole_day);
    let value_param = if whole_day { ";VALUE=DATE" } else { "" };
    let transp = if whole_day { "TRANSPARENT" } else { "OPAQUE" };

    let uid = format!(
        "{}-{}-{}_{}-{}",
        config.template_name, config.batch_name, event.summary, dtstart, dtend
    );

    let mut lines = vec![
        "BEGIN:VEVENT".to_string(),
        format!("DTSTART{}:{}", value_param, dtstart),
        format!("DTEND{}:{}", value_param, dtend),
        "STATUS:CONFIRMED".to_string(),
        format!("TRANSP:{}", transp),
        format!(
            "SUMMARY:{}",
            escape_line_breaks(&format!("{} {}", config.batch_name, event.summary))
        ),
        format!("UID:{}", escape_line_breaks(&uid)),
    ];

    if !event.description.is_empty() {
        lines.push(format!("DESCRIPTION:{}", escape_line_breaks(&event.description)));
    }

    lines.push("END:VEVENT".to_string());
    Ok(lines)
}

/// A raw line break would end the property early; write it as the RFC 5545 `\n` escape.
fn escape_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\\n")
        .replace('\n', "\\n")
        .replace('\r', "\\n")
}

/// Replace every run of characters outside `[A-Za-z0-9 .\-_()]` with a single `_`.
pub fn escape_file_name(name: &str) -> String {
    UNSAFE_FILE_NAME_CHARS.replace_all(name, "_").into_owned()
}

/// `calendar_<template>_<batch>_<YYYYMMDD>.ics`, escaped.
///
/// # Errors
/// [`BatchError::MissingStartDate`](crate::BatchError::MissingStartDate) without a valid start date.
pub fn export_file_name(config: &BatchConfig) -> Result<String> {
    let start = config.usable_start()?;
    Ok(escape_file_name(&format!(
        "calendar_{}_{}_{}.ics",
        config.template_name,
        config.batch_name,
        format_ics_timestamp(start, true)
    )))
}

/// `<template> - template.json`, escaped.
pub fn template_file_name(template_name: &str) -> String {
    escape_file_name(&format!("{} - template.json", template_name))
}
