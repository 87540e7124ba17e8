//! Editing an event list as a sequence of snapshots.
//!
//! Nothing here mutates the list it is given. Each operation returns the next
//! list, which the caller publishes (and persists) wholesale.

use crate::event::Event;
use std::collections::HashSet;
use uuid::Uuid;

/// Append `event` to the end of the list.
pub fn add_event(events: &[Event], event: Event) -> Vec<Event> {
    let mut next = events.to_vec();
    next.push(event);
    next
}

/// Replace the event sharing `updated.id`, keeping its position.
///
/// An unknown id leaves the list unchanged.
pub fn replace_event(events: &[Event], updated: Event) -> Vec<Event> {
    let mut next = events.to_vec();
    match next.iter_mut().find(|e| e.id == updated.id) {
        Some(slot) => *slot = updated,
        None => tracing::debug!(id = %updated.id, "replace skipped: no event with this id"),
    }
    next
}

/// Drop the event with `id`, if present.
pub fn remove_event(events: &[Event], id: &str) -> Vec<Event> {
    events.iter().filter(|e| e.id != id).cloned().collect()
}

/// Order by start offset. Events with equal offsets keep their relative order.
pub fn sort_by_start_offset(events: &[Event]) -> Vec<Event> {
    let mut next = events.to_vec();
    next.sort_by_key(|e| e.start_offset);
    next
}

pub fn find_event<'a>(events: &'a [Event], id: &str) -> Option<&'a Event> {
    events.iter().find(|e| e.id == id)
}

/// Give every event after the first holder of an id a fresh id.
pub fn ensure_unique_ids(events: Vec<Event>) -> Vec<Event> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .map(|mut event| {
            if !seen.insert(event.id.clone()) {
                let fresh = Uuid::new_v4().to_string();
                tracing::warn!(duplicate = %event.id, replacement = %fresh, "duplicate event id");
                event.id = fresh.clone();
                seen.insert(fresh);
            }
            event
        })
        .collect()
}
