//! Recurrence Engine (C2): expands a template schedule entry into the one
//! occurrence covering "now".

use crate::model::{Occurrence, RecurrenceType, ScheduleEntry};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc, Weekday};

/// Resolve the single occurrence of `entry` whose `[occ_start, occ_end]`
/// overlaps `[now-2s, now]`. Returns `None` if no candidate date survives
/// the template floor, recurrence-end, weekday, or overlap filters.
pub fn resolve_occurrence(entry: &ScheduleEntry, now: DateTime<Utc>) -> Option<Occurrence> {
    let dur = entry.ends_at - entry.starts_at;
    if dur <= Duration::zero() {
        return None;
    }

    let today = now.date_naive();
    let yesterday = today - Duration::days(1);

    let mut best: Option<Occurrence> = None;

    for date in [today, yesterday] {
        let occ_start = match date.and_time(entry.starts_at.time()).and_local_timezone(Utc) {
            chrono::LocalResult::Single(t) => t,
            _ => continue,
        };
        let occ_end = occ_start + dur;

        if occ_start < entry.starts_at {
            continue;
        }
        if let Some(end_date) = entry.recurrence_end_date {
            if occ_start > end_date {
                continue;
            }
        }
        if !weekday_allowed(entry, occ_start) {
            continue;
        }
        if occ_start > now || occ_end < now - Duration::seconds(2) {
            continue;
        }

        best = match best {
            Some(b) if b.start >= occ_start => Some(b),
            _ => Some(Occurrence { start: occ_start, end: occ_end }),
        };
    }

    best
}

fn weekday_allowed(entry: &ScheduleEntry, occ_start: DateTime<Utc>) -> bool {
    match entry.recurrence_type {
        RecurrenceType::None => true,
        RecurrenceType::Daily => true,
        RecurrenceType::Weekdays => {
            !matches!(occ_start.weekday(), Weekday::Sat | Weekday::Sun)
        }
        RecurrenceType::Weekly => occ_start.weekday() == entry.starts_at.weekday(),
        RecurrenceType::Custom => {
            if entry.recurrence_days.is_empty() {
                true
            } else {
                // recurrence_days uses Go `time.Weekday` numbering
                // (Sunday=0, Monday=1, ..., Saturday=6), not chrono's
                // Monday=0 convention.
                let dow = occ_start.weekday().num_days_from_sunday() as u8;
                entry.recurrence_days.contains(&dow)
            }
        }
    }
}
