//! Tests for list editing, schedule resolution and the cached session.

use calendar_batch::duration::{MILLIS_IN_ONE_DAY, MILLIS_IN_ONE_HOUR};
use calendar_batch::events::{
    add_event, ensure_unique_ids, find_event, remove_event, replace_event, sort_by_start_offset,
};
use calendar_batch::schedule::{display_start, format_display, format_view_timestamp};
use calendar_batch::session::{BATCH_CONFIG_KEY, EVENTS_KEY};
use calendar_batch::{
    event_from_placement, schedule, BatchConfig, BatchError, Event, KeyValueStore, MemoryStore,
    Placement, Session, StartDate, Template,
};

fn event(id: &str, start_offset: i64) -> Event {
    let mut event = Event::new();
    event.id = id.to_string();
    event.start_offset = start_offset;
    event.summary = id.to_uppercase();
    event
}

fn dated_config() -> BatchConfig {
    BatchConfig::default()
        .with_start_date(Some(StartDate::parse("2025-04-14")))
        .with_batch_name("Trip")
}

// ---------------------------------------------------------------------------
// List editing
// ---------------------------------------------------------------------------

#[test]
fn add_appends_without_touching_input() {
    let events = vec![event("a", 0)];
    let next = add_event(&events, event("b", 0));
    assert_eq!(events.len(), 1);
    assert_eq!(next.len(), 2);
    assert_eq!(next[1].id, "b");
}

#[test]
fn replace_keeps_position() {
    let events = vec![event("a", 0), event("b", 0), event("c", 0)];
    let mut updated = event("b", 5);
    updated.summary = "changed".to_string();

    let next = replace_event(&events, updated);

    assert_eq!(next[1].summary, "changed");
    assert_eq!(next[1].start_offset, 5);
    assert_eq!(next.len(), 3);
}

#[test]
fn replace_with_unknown_id_changes_nothing() {
    let events = vec![event("a", 0), event("b", 0)];
    let next = replace_event(&events, event("zzz", 0));
    assert_eq!(next, events);
}

#[test]
fn remove_drops_only_matching_event() {
    let events = vec![event("a", 0), event("b", 0)];
    let next = remove_event(&events, "a");
    assert_eq!(next.len(), 1);
    assert_eq!(next[0].id, "b");
    assert_eq!(remove_event(&events, "missing"), events);
}

#[test]
fn sort_is_stable_by_offset() {
    let events = vec![event("late", 10), event("tie1", 5), event("early", -5), event("tie2", 5)];
    let ids: Vec<String> = sort_by_start_offset(&events).into_iter().map(|e| e.id).collect();
    assert_eq!(ids, vec!["early", "tie1", "tie2", "late"]);
}

#[test]
fn find_by_id() {
    let events = vec![event("a", 0), event("b", 7)];
    assert_eq!(find_event(&events, "b").map(|e| e.start_offset), Some(7));
    assert!(find_event(&events, "c").is_none());
}

#[test]
fn unique_ids_keep_first_occurrence() {
    let events = vec![event("a", 1), event("a", 2)];
    let fixed = ensure_unique_ids(events);
    assert_eq!(fixed[0].id, "a");
    assert_ne!(fixed[1].id, "a");
    assert_eq!(fixed[1].start_offset, 2);
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

#[test]
fn schedule_places_included_events() {
    let mut hidden = event("hidden", 0);
    hidden.included = false;
    let mut hike = event("hike", MILLIS_IN_ONE_DAY);
    hike.set_whole_day_event(true);
    let events = vec![event("kickoff", 9 * MILLIS_IN_ONE_HOUR), hidden, hike];

    let placed = schedule(&dated_config(), &events).unwrap();

    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].title, "KICKOFF");
    assert_eq!(placed[0].view_start(), "2025-04-14T09:00:00");
    assert_eq!(placed[0].view_end(), "2025-04-14T10:00:00");
    assert!(placed[1].all_day);
    assert_eq!(placed[1].view_start(), "2025-04-15");
    assert_eq!(placed[1].view_end(), "2025-04-16");
}

#[test]
fn schedule_requires_start_date() {
    let result = schedule(&BatchConfig::default(), &[event("a", 0)]);
    assert!(matches!(result, Err(BatchError::MissingStartDate)));
}

fn placement(id: &str, start: &str, end: Option<&str>, all_day: bool) -> Placement {
    let at = |text: &str| StartDate::parse(text).datetime().unwrap();
    Placement {
        id: id.to_string(),
        title: "Moved".to_string(),
        description: String::new(),
        start: at(start),
        end: end.map(at),
        all_day,
    }
}

#[test]
fn placements_read_back_what_schedule_placed() {
    let mut hike = event("hike", MILLIS_IN_ONE_DAY);
    hike.set_whole_day_event(true);
    let events = vec![event("kickoff", 9 * MILLIS_IN_ONE_HOUR + 30 * 60_000), hike];

    for placed in schedule(&dated_config(), &events).unwrap() {
        let back = event_from_placement(
            &dated_config(),
            &Placement {
                id: placed.id.clone(),
                title: placed.title.clone(),
                description: String::new(),
                start: placed.start,
                end: Some(placed.end),
                all_day: placed.all_day,
            },
        )
        .unwrap();
        let original = events.iter().find(|e| e.id == back.id).unwrap();
        assert_eq!(back.start_offset, original.start_offset);
        assert_eq!(back.duration, original.duration);
        assert_eq!(back.is_whole_day_event, original.is_whole_day_event);
        assert_eq!(back.summary, original.summary);
    }
}

#[test]
fn placement_without_end_gets_default_duration() {
    let timed = event_from_placement(
        &dated_config(),
        &placement("a", "2025-04-14T10:00:00", None, false),
    )
    .unwrap();
    assert_eq!(timed.start_offset, 10 * MILLIS_IN_ONE_HOUR);
    assert_eq!(timed.duration, MILLIS_IN_ONE_HOUR);

    let all_day =
        event_from_placement(&dated_config(), &placement("b", "2025-04-16", None, true)).unwrap();
    assert_eq!(all_day.start_offset, 2 * MILLIS_IN_ONE_DAY);
    assert_eq!(all_day.duration, MILLIS_IN_ONE_DAY);
    assert!(all_day.is_whole_day_event);
}

#[test]
fn placement_before_batch_start_is_negative() {
    let moved = event_from_placement(
        &dated_config(),
        &placement("a", "2025-04-13T22:00:00", Some("2025-04-13T21:00:00"), false),
    )
    .unwrap();
    assert_eq!(moved.start_offset, -2 * MILLIS_IN_ONE_HOUR);
    assert_eq!(moved.duration, 0);
    assert!(moved.included);
}

#[test]
fn placement_keeps_id_or_generates_one() {
    let kept = event_from_placement(&dated_config(), &placement("a", "2025-04-14", None, false))
        .unwrap();
    assert_eq!(kept.id, "a");
    let fresh = event_from_placement(&dated_config(), &placement("", "2025-04-14", None, false))
        .unwrap();
    assert!(!fresh.id.is_empty());
}

#[test]
fn placement_requires_start_date() {
    let result = event_from_placement(
        &BatchConfig::default(),
        &placement("a", "2025-04-14", None, false),
    );
    assert!(matches!(result, Err(BatchError::MissingStartDate)));
}

#[test]
fn display_formats() {
    let dt = StartDate::parse("2025-04-14T09:05:00").datetime().unwrap();
    assert_eq!(format_display(dt, false), "Mon 14 Apr 2025 09:05");
    assert_eq!(format_display(dt, true), "Mon 14 Apr 2025");
    assert_eq!(format_view_timestamp(dt, false), "2025-04-14T09:05:00");
}

#[test]
fn display_start_needs_usable_date() {
    let e = event("a", 9 * MILLIS_IN_ONE_HOUR);
    assert_eq!(display_start(&dated_config(), &e).as_deref(), Some("Mon 14 Apr 2025 09:00"));
    assert_eq!(display_start(&BatchConfig::default(), &e), None);
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[test]
fn fresh_store_gives_empty_session() {
    let session = Session::load(MemoryStore::new()).unwrap();
    assert!(session.events().is_empty());
    assert_eq!(session.batch_config(), &BatchConfig::default());
}

#[test]
fn changes_are_written_through_and_reloaded() {
    let mut session = Session::load(MemoryStore::new()).unwrap();
    session.set_batch_config(dated_config()).unwrap();
    session.add_event(event("a", MILLIS_IN_ONE_HOUR)).unwrap();
    session.add_event(event("b", 0)).unwrap();
    session.sort_events().unwrap();

    let store = session.into_store();
    assert!(store.get(EVENTS_KEY).unwrap().is_some());
    assert!(store.get(BATCH_CONFIG_KEY).unwrap().is_some());

    let reloaded = Session::load(store).unwrap();
    let ids: Vec<&str> = reloaded.events().iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a"]);
    assert_eq!(reloaded.batch_config(), &dated_config());
}

#[test]
fn adding_a_taken_id_gets_a_fresh_one() {
    let mut session = Session::load(MemoryStore::new()).unwrap();
    session.add_event(event("a", 0)).unwrap();
    session.add_event(event("a", 5)).unwrap();

    let events = session.events();
    assert_eq!(events[0].id, "a");
    assert_ne!(events[1].id, "a");
    assert_eq!(events[1].start_offset, 5);
}

#[test]
fn duplicate_ids_in_cache_are_made_unique_on_load() {
    let mut store = MemoryStore::new();
    store
        .set(EVENTS_KEY, r#"[{"eventId":"x"},{"eventId":"x"}]"#)
        .unwrap();
    let session = Session::load(store).unwrap();
    assert_eq!(session.events()[0].id, "x");
    assert_ne!(session.events()[1].id, "x");
}

#[test]
fn update_and_remove_report_unknown_ids() {
    let mut session = Session::load(MemoryStore::new()).unwrap();
    session.add_event(event("a", 0)).unwrap();

    let mut changed = event("a", 0);
    changed.summary = "new".to_string();
    assert!(session.update_event(changed).unwrap());
    assert_eq!(session.events()[0].summary, "new");

    assert!(!session.update_event(event("nope", 0)).unwrap());
    assert!(!session.remove_event("nope").unwrap());
    assert!(session.remove_event("a").unwrap());
    assert!(session.events().is_empty());
}

#[test]
fn importing_named_template_adopts_name() {
    let mut session = Session::load(MemoryStore::new()).unwrap();
    session.set_batch_config(dated_config().with_template_name("Old")).unwrap();

    session
        .import_template(Template::new("Travel", vec![event("a", 0)]))
        .unwrap();

    assert_eq!(session.batch_config().template_name, "Travel");
    assert_eq!(session.events().len(), 1);
}

#[test]
fn importing_legacy_template_keeps_name() {
    let mut session = Session::load(MemoryStore::new()).unwrap();
    session.set_batch_config(dated_config().with_template_name("Old")).unwrap();

    session.import_template(Template::new("", vec![event("a", 0)])).unwrap();

    assert_eq!(session.batch_config().template_name, "Old");
}

#[test]
fn session_exports() {
    let mut session = Session::load(MemoryStore::new()).unwrap();
    session.set_batch_config(dated_config().with_template_name("Travel")).unwrap();
    session.add_event(event("kickoff", 0)).unwrap();

    let ics = session.export_ics().unwrap();
    assert!(ics.contains("SUMMARY:Trip KICKOFF"));
    assert_eq!(session.export_file_name().unwrap(), "calendar_Travel_Trip_20250414.ics");

    let template = session.export_template();
    assert_eq!(template.template_name, "Travel");
    assert_eq!(template.events, session.events());
    assert_eq!(session.schedule().unwrap().len(), 1);
}

#[test]
fn corrupt_cache_entry_is_reported() {
    let mut store = MemoryStore::new();
    store.set(EVENTS_KEY, "[{").unwrap();
    assert!(matches!(Session::load(store), Err(BatchError::JsonParse(_))));
}

struct FailingStore;

impl KeyValueStore for FailingStore {
    fn get(&self, _key: &str) -> calendar_batch::error::Result<Option<String>> {
        Ok(None)
    }

    fn set(&mut self, key: &str, _value: &str) -> calendar_batch::error::Result<()> {
        Err(BatchError::Store(format!("read-only: {}", key)))
    }
}

/// Accepts writes except to one key.
struct RejectingStore {
    inner: MemoryStore,
    rejected: &'static str,
}

impl RejectingStore {
    fn new(rejected: &'static str) -> Self {
        Self {
            inner: MemoryStore::new(),
            rejected,
        }
    }
}

impl KeyValueStore for RejectingStore {
    fn get(&self, key: &str) -> calendar_batch::error::Result<Option<String>> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> calendar_batch::error::Result<()> {
        if key == self.rejected {
            return Err(BatchError::Store(format!("rejected: {}", key)));
        }
        self.inner.set(key, value)
    }
}

#[test]
fn failed_event_write_keeps_template_name() {
    let mut session = Session::load(RejectingStore::new(EVENTS_KEY)).unwrap();

    let result = session.import_template(Template::new("Travel", vec![event("a", 0)]));

    assert!(matches!(result, Err(BatchError::Store(_))));
    assert_eq!(session.batch_config().template_name, "");
    assert!(session.events().is_empty());
    let store = session.into_store();
    assert_eq!(store.get(BATCH_CONFIG_KEY).unwrap(), None);
}

#[test]
fn failed_name_write_restores_previous_events() {
    let mut store = RejectingStore::new(BATCH_CONFIG_KEY);
    store
        .set(EVENTS_KEY, r#"[{"eventId":"old","summary":"Old"}]"#)
        .unwrap();
    let mut session = Session::load(store).unwrap();

    let result = session.import_template(Template::new("Travel", vec![event("new", 0)]));

    assert!(matches!(result, Err(BatchError::Store(_))));
    assert_eq!(session.events().len(), 1);
    assert_eq!(session.events()[0].id, "old");
    let reloaded = Session::load(session.into_store()).unwrap();
    assert_eq!(reloaded.events()[0].id, "old");
}

#[test]
fn failed_write_leaves_state_unchanged() {
    let mut session = Session::load(FailingStore).unwrap();
    let result = session.add_event(event("a", 0));
    assert!(matches!(result, Err(BatchError::Store(_))));
    assert!(session.events().is_empty());
}
