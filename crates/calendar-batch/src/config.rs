//! Batch configuration: the parameters shared by every event in an export.

use crate::error::{BatchError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored form of a valid start date: millisecond precision, `Z` suffix.
const STORED_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// A batch start date as loaded from storage or typed by a user.
///
/// Parsing never fails: text that is not a recognised date is kept as
/// [`StartDate::Invalid`] so the loader can carry on and the problem surfaces
/// at the point of use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartDate {
    /// Wall-clock instant in the fixed UTC frame.
    Valid(NaiveDateTime),
    Invalid(String),
}

impl StartDate {
    /// Accepts RFC 3339 (the offset is applied to reach UTC), a naive
    /// `YYYY-MM-DDTHH:MM:SS[.fff]`, or a bare `YYYY-MM-DD` meaning midnight.
    pub fn parse(text: &str) -> Self {
        let trimmed = text.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
            return StartDate::Valid(dt.naive_utc());
        }
        if let Ok(ndt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
            return StartDate::Valid(ndt);
        }
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
            return StartDate::Valid(date.and_time(NaiveTime::MIN));
        }

        StartDate::Invalid(text.to_string())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        StartDate::Valid(date.and_time(NaiveTime::MIN))
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, StartDate::Valid(_))
    }

    pub fn datetime(&self) -> Option<NaiveDateTime> {
        match self {
            StartDate::Valid(dt) => Some(*dt),
            StartDate::Invalid(_) => None,
        }
    }
}

/// Shared parameters of one batch export. Replaced wholesale on every edit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BatchConfigRecord", into = "BatchConfigRecord")]
pub struct BatchConfig {
    /// `None` until the user picks a date.
    pub start_date: Option<StartDate>,
    /// Prefixed onto every exported title and folded into each UID.
    pub batch_name: String,
    /// Only used for naming saved and exported files.
    pub template_name: String,
}

/// A batch configuration as found in storage; every field may be missing or mistyped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchConfigRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_name: Option<Value>,
}

impl BatchConfig {
    /// Build a config from an untrusted record. Never fails.
    pub fn from_record(record: BatchConfigRecord) -> Self {
        let start_date = record
            .start_date
            .as_ref()
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(StartDate::parse);

        Self {
            start_date,
            batch_name: text_or_empty(record.batch_name.as_ref()),
            template_name: text_or_empty(record.template_name.as_ref()),
        }
    }

    /// The storage record. An invalid start date is dropped.
    pub fn to_record(&self) -> BatchConfigRecord {
        BatchConfigRecord {
            start_date: self
                .start_date
                .as_ref()
                .and_then(StartDate::datetime)
                .map(|dt| Value::from(dt.format(STORED_DATE_FORMAT).to_string())),
            batch_name: Some(Value::from(self.batch_name.as_str())),
            template_name: Some(Value::from(self.template_name.as_str())),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// The start date if it is present and valid.
    pub fn usable_start(&self) -> Result<NaiveDateTime> {
        self.start_date
            .as_ref()
            .and_then(StartDate::datetime)
            .ok_or(BatchError::MissingStartDate)
    }

    pub fn has_usable_start(&self) -> bool {
        self.usable_start().is_ok()
    }

    pub fn with_start_date(&self, start_date: Option<StartDate>) -> Self {
        Self {
            start_date,
            ..self.clone()
        }
    }

    pub fn with_batch_name(&self, batch_name: impl Into<String>) -> Self {
        Self {
            batch_name: batch_name.into(),
            ..self.clone()
        }
    }

    pub fn with_template_name(&self, template_name: impl Into<String>) -> Self {
        Self {
            template_name: template_name.into(),
            ..self.clone()
        }
    }
}

impl From<BatchConfigRecord> for BatchConfig {
    fn from(record: BatchConfigRecord) -> Self {
        Self::from_record(record)
    }
}

impl From<BatchConfig> for BatchConfigRecord {
    fn from(config: BatchConfig) -> Self {
        config.to_record()
    }
}

fn text_or_empty(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

/// Parse the cached batch configuration. Empty text or `null` gives the default.
pub fn parse_batch_config(json: &str) -> Result<BatchConfig> {
    if json.trim().is_empty() {
        return Ok(BatchConfig::default());
    }
    let config: Option<BatchConfig> = serde_json::from_str(json)?;
    Ok(config.unwrap_or_default())
}
