//! Process-local application state backed by an opaque key/value store.
//!
//! A [`Session`] owns the working event list and batch configuration. It loads
//! both once at start and writes the affected entry through to the store on
//! every change, before publishing the new snapshot.

use crate::config::{parse_batch_config, BatchConfig};
use crate::error::Result;
use crate::event::{events_to_json, parse_events, Event};
use crate::events;
use crate::ics;
use crate::schedule::{self, ScheduledEvent};
use crate::template::Template;
use std::collections::HashMap;

/// Store key of the serialized event list.
pub const EVENTS_KEY: &str = "events";
/// Store key of the serialized batch configuration.
pub const BATCH_CONFIG_KEY: &str = "batch-config";

/// Minimal string key/value persistence.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
}

/// A store that lives only as long as the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug)]
pub struct Session<S: KeyValueStore> {
    store: S,
    events: Vec<Event>,
    batch_config: BatchConfig,
}

impl<S: KeyValueStore> Session<S> {
    /// Read the cached events and configuration. Missing entries start empty.
    ///
    /// # Errors
    /// A cached entry holding malformed JSON is reported, not discarded.
    pub fn load(store: S) -> Result<Self> {
        let events = match store.get(EVENTS_KEY)? {
            Some(json) => parse_events(&json)?,
            None => Vec::new(),
        };
        let batch_config = match store.get(BATCH_CONFIG_KEY)? {
            Some(json) => parse_batch_config(&json)?,
            None => BatchConfig::default(),
        };

        tracing::debug!(events = events.len(), "session loaded");
        Ok(Self {
            store,
            events,
            batch_config,
        })
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn batch_config(&self) -> &BatchConfig {
        &self.batch_config
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Publish a new event list. Ids already held by an earlier event are
    /// replaced, so every id in the working list stays unique.
    pub fn set_events(&mut self, events: Vec<Event>) -> Result<()> {
        let events = events::ensure_unique_ids(events);
        self.store.set(EVENTS_KEY, &events_to_json(&events)?)?;
        self.events = events;
        Ok(())
    }

    pub fn set_batch_config(&mut self, batch_config: BatchConfig) -> Result<()> {
        self.store.set(BATCH_CONFIG_KEY, &batch_config.to_json()?)?;
        self.batch_config = batch_config;
        Ok(())
    }

    pub fn add_event(&mut self, event: Event) -> Result<()> {
        let next = events::add_event(&self.events, event);
        self.set_events(next)
    }

    /// Replace the event with the same id. Returns `false` if no such event exists.
    pub fn update_event(&mut self, event: Event) -> Result<bool> {
        if events::find_event(&self.events, &event.id).is_none() {
            return Ok(false);
        }
        let next = events::replace_event(&self.events, event);
        self.set_events(next)?;
        Ok(true)
    }

    /// Remove the event with `id`. Returns `false` if no such event exists.
    pub fn remove_event(&mut self, id: &str) -> Result<bool> {
        if events::find_event(&self.events, id).is_none() {
            return Ok(false);
        }
        let next = events::remove_event(&self.events, id);
        self.set_events(next)?;
        Ok(true)
    }

    pub fn sort_events(&mut self) -> Result<()> {
        let next = events::sort_by_start_offset(&self.events);
        self.set_events(next)
    }

    /// Replace the working list with the template's events.
    ///
    /// A non-empty template name is adopted into the batch configuration; a
    /// legacy template carries no name and leaves the current one in place.
    ///
    /// The events are written first. If adopting the name then fails, the
    /// previous event list is written back before the error is returned.
    pub fn import_template(&mut self, template: Template) -> Result<()> {
        let Template {
            template_name,
            events,
        } = template;
        let previous = self.events.clone();
        self.set_events(events)?;

        if template_name.is_empty() {
            return Ok(());
        }
        let next = self.batch_config.with_template_name(template_name);
        if let Err(err) = self.set_batch_config(next) {
            tracing::warn!(error = %err, "template name not stored, restoring previous events");
            self.set_events(previous)?;
            return Err(err);
        }
        Ok(())
    }

    pub fn export_template(&self) -> Template {
        Template::from_batch(&self.batch_config, &self.events)
    }

    pub fn export_ics(&self) -> Result<String> {
        ics::generate_ics(&self.batch_config, &self.events)
    }

    pub fn export_file_name(&self) -> Result<String> {
        ics::export_file_name(&self.batch_config)
    }

    pub fn schedule(&self) -> Result<Vec<ScheduledEvent>> {
        schedule::schedule(&self.batch_config, &self.events)
    }
}
