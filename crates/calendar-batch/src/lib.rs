//! # calendar-batch
//!
//! Reusable batches of calendar events, defined relative to a batch start date and
//! exported as deterministic iCalendar text.
//!
//! Events carry a signed millisecond offset from the batch start and a duration.
//! A [`BatchConfig`] supplies the start date and the name prefix; the serializer
//! resolves every included event against it and renders a byte-stable `.ics` body.
//! All arithmetic is wall-clock: timestamps are rendered in a fixed UTC frame and
//! never shift with the viewer's timezone.
//!
//! ## Quick start
//!
//! ```rust
//! use calendar_batch::{generate_ics, BatchConfig, Event, StartDate};
//!
//! let config = BatchConfig::default()
//!     .with_start_date(Some(StartDate::parse("2025-04-14")))
//!     .with_batch_name("Trip");
//!
//! let mut kickoff = Event::new();
//! kickoff.summary = "Kickoff".to_string();
//!
//! let ics = generate_ics(&config, &[kickoff]).unwrap();
//! assert!(ics.contains("DTSTART:20250414T000000"));
//! assert!(ics.contains("SUMMARY:Trip Kickoff"));
//! ```
//!
//! ## Modules
//!
//! - [`duration`]: millisecond offsets ↔ weeks/days/`HH:MM` entry fields
//! - [`event`]: `Event`, its untrusted `EventRecord` and defaulting
//! - [`events`]: snapshot-style editing of an event list
//! - [`config`]: `BatchConfig` and its tolerant start-date parsing
//! - [`schedule`]: relative events ↔ absolute wall-clock spans
//! - [`ics`]: iCalendar export and export file naming
//! - [`template`]: named event bundles, legacy and current JSON shapes
//! - [`session`]: process-local state persisted through a key/value store
//! - [`error`]: Error types

pub mod config;
pub mod duration;
pub mod error;
pub mod event;
pub mod events;
pub mod ics;
pub mod schedule;
pub mod session;
pub mod template;

pub use config::{parse_batch_config, BatchConfig, StartDate};
pub use error::BatchError;
pub use event::{events_to_json, parse_events, Event, EventDefaults, EventRecord};
pub use ics::{export_file_name, generate_ics, template_file_name};
pub use schedule::{event_from_placement, schedule, Placement, ScheduledEvent};
pub use session::{KeyValueStore, MemoryStore, Session};
pub use template::{parse_template, Template};
