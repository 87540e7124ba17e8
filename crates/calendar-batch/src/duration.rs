//! Millisecond offsets and durations ↔ the compound fields people type.
//!
//! Start offsets are entered as weeks + days + a time of day; durations as a
//! day count (whole-day events) or an `HH:MM` span (timed events). All divisions
//! floor toward negative infinity so an offset of -1ms lands on the previous day.

pub const MILLIS_IN_ONE_MINUTE: i64 = 60 * 1000;
pub const MILLIS_IN_ONE_HOUR: i64 = 60 * MILLIS_IN_ONE_MINUTE;
pub const MILLIS_IN_ONE_DAY: i64 = 24 * MILLIS_IN_ONE_HOUR;
pub const MILLIS_IN_ONE_WEEK: i64 = 7 * MILLIS_IN_ONE_DAY;

/// Whole days contained in `ms`, floored (`-1` → `-1`, not `0`).
pub fn days_from_millis(ms: i64) -> i64 {
    ms.div_euclid(MILLIS_IN_ONE_DAY)
}

/// Floor `ms` down to the start of its day.
pub fn truncate_to_day(ms: i64) -> i64 {
    days_from_millis(ms) * MILLIS_IN_ONE_DAY
}

/// Render `ms` as `HH:MM`.
///
/// With `wrap_to_one_day` the hour count is reduced modulo 24 (always
/// non-negative), which is what a start-offset editor shows. Without it the
/// hours keep counting past 24, which suits durations such as `"36:30"`.
/// Minutes are always in `0..60`.
pub fn time_of_day_from_millis(ms: i64, wrap_to_one_day: bool) -> String {
    let mut hours = ms.div_euclid(MILLIS_IN_ONE_HOUR);
    if wrap_to_one_day {
        hours = hours.rem_euclid(24);
    }
    let minutes = ms.div_euclid(MILLIS_IN_ONE_MINUTE).rem_euclid(60);
    format!("{:02}:{:02}", hours, minutes)
}

/// Parse `HH:MM` into milliseconds.
///
/// Returns `None` when either component is missing or not an integer, so an
/// unparseable entry stays distinguishable from midnight (`Some(0)`). Callers
/// editing an event fall back to a safe default themselves; see
/// [`StartOffsetParts::to_millis`] and [`duration_from_time_entry`].
/// Anything after the minutes (e.g. `:SS` from a time picker) is ignored.
pub fn millis_from_time_of_day(text: &str) -> Option<i64> {
    let mut parts = text.split(':');
    let hours = parse_entry(parts.next()?)?;
    let minutes = parse_entry(parts.next()?)?;

    hours
        .checked_mul(60)?
        .checked_add(minutes)?
        .checked_mul(MILLIS_IN_ONE_MINUTE)
}

/// Duration for a whole-day event from a typed day count. At least one day.
pub fn duration_from_days_entry(text: &str) -> i64 {
    let days = parse_entry(text).map(|d| d.max(1)).unwrap_or(1);
    days.saturating_mul(MILLIS_IN_ONE_DAY)
}

/// Duration for a timed event from a typed `HH:MM` span. Unparseable or negative → 0.
pub fn duration_from_time_entry(text: &str) -> i64 {
    millis_from_time_of_day(text).map(|ms| ms.max(0)).unwrap_or(0)
}

fn parse_entry(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// A start offset split into the three fields of the offset editor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartOffsetParts {
    pub weeks: i64,
    /// Remainder days, `0..7`.
    pub days: i64,
    /// Time of day as `HH:MM`, wrapped to one day.
    pub time: String,
}

impl StartOffsetParts {
    pub fn from_millis(ms: i64) -> Self {
        let total_days = days_from_millis(ms);
        Self {
            weeks: total_days.div_euclid(7),
            days: total_days.rem_euclid(7),
            time: time_of_day_from_millis(ms, true),
        }
    }

    /// Recompose the offset: `(weeks * 7 + days) * day + time`.
    ///
    /// Whole-day events ignore the time field. An unparseable time counts as zero.
    pub fn to_millis(&self, whole_day: bool) -> i64 {
        let day_millis = self
            .weeks
            .saturating_mul(7)
            .saturating_add(self.days)
            .saturating_mul(MILLIS_IN_ONE_DAY);
        if whole_day {
            return day_millis;
        }
        day_millis.saturating_add(millis_from_time_of_day(&self.time).unwrap_or(0))
    }

    /// Apply a typed weeks value. Empty or invalid entry → 0; negatives clamp to 0.
    pub fn with_weeks_entry(&self, text: &str) -> Self {
        Self {
            weeks: parse_entry(text).map(|w| w.max(0)).unwrap_or(0),
            ..self.clone()
        }
    }

    /// Apply a typed days value. Whole-day events need at least one day.
    pub fn with_days_entry(&self, text: &str, whole_day: bool) -> Self {
        let min = if whole_day { 1 } else { 0 };
        Self {
            days: parse_entry(text).map(|d| d.max(min)).unwrap_or(min),
            ..self.clone()
        }
    }

    /// Apply a typed time of day. An empty entry means midnight.
    pub fn with_time_entry(&self, text: &str) -> Self {
        let time = if text.trim().is_empty() {
            "00:00".to_string()
        } else {
            text.trim().to_string()
        };
        Self {
            time,
            ..self.clone()
        }
    }
}
