//! Named, storable bundles of events.
//!
//! Two JSON shapes are accepted on import:
//!
//! - legacy: a bare array of event records
//! - current: `{"templateName": "...", "events": [...]}`
//!
//! Export always writes the current shape.

use crate::config::BatchConfig;
use crate::error::Result;
use crate::event::Event;
use crate::events::ensure_unique_ids;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A template owns copies of its events; it is not a live view of any list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Template {
    pub template_name: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TemplateRecord {
    #[serde(default)]
    template_name: Option<Value>,
    #[serde(default)]
    events: Option<Vec<Event>>,
}

/// The shapes a template payload can take, decided once when parsing.
#[derive(Debug)]
enum TemplatePayload {
    /// Empty text or JSON `null`.
    Empty,
    Legacy(Vec<Event>),
    Current(TemplateRecord),
}

impl TemplatePayload {
    fn from_json(json: &str) -> Result<Self> {
        if json.trim().is_empty() {
            return Ok(TemplatePayload::Empty);
        }
        let payload = match serde_json::from_str::<Value>(json)? {
            Value::Null => TemplatePayload::Empty,
            value @ Value::Array(_) => TemplatePayload::Legacy(serde_json::from_value(value)?),
            value => TemplatePayload::Current(serde_json::from_value(value)?),
        };
        Ok(payload)
    }

    fn into_template(self) -> Template {
        match self {
            TemplatePayload::Empty => Template::default(),
            TemplatePayload::Legacy(events) => Template {
                template_name: String::new(),
                events,
            },
            TemplatePayload::Current(record) => Template {
                template_name: record
                    .template_name
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_default(),
                events: record.events.unwrap_or_default(),
            },
        }
    }
}

/// Parse an imported or stored template.
///
/// Every event goes through the defaulting deserializer (an entry that is not
/// a JSON object becomes a default event), and an id that appears twice is
/// replaced on its later occurrences.
///
/// # Errors
/// [`BatchError::JsonParse`](crate::BatchError::JsonParse) for malformed JSON or a
/// payload that is neither an array nor an object.
pub fn parse_template(json: &str) -> Result<Template> {
    let payload = TemplatePayload::from_json(json)?;
    let shape = match payload {
        TemplatePayload::Empty => "empty",
        TemplatePayload::Legacy(_) => "legacy",
        TemplatePayload::Current(_) => "current",
    };

    let mut template = payload.into_template();
    template.events = ensure_unique_ids(template.events);

    tracing::debug!(
        shape,
        name = %template.template_name,
        count = template.events.len(),
        "parsed template"
    );
    Ok(template)
}

impl Template {
    pub fn new(template_name: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            template_name: template_name.into(),
            events,
        }
    }

    /// Snapshot the current batch's events under its template name.
    pub fn from_batch(config: &BatchConfig, events: &[Event]) -> Self {
        Self::new(config.template_name.clone(), events.to_vec())
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}
