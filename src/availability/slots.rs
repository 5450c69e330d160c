//! Slot generation over a resolved day window.
//!
//! Slots are contiguous fixed-length intervals anchored at the window start.
//! A trailing partial slot is dropped, and any slot overlapping the break
//! window is excluded entirely, even when it only grazes it.

use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::conflict::intervals_overlap;
use super::resolver::DayWindow;
use crate::models::appointment;

/// One bookable slot in a provider's day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub available: bool,
}

fn times_overlap(start_a: NaiveTime, end_a: NaiveTime, start_b: NaiveTime, end_b: NaiveTime) -> bool {
    start_a < end_b && start_b < end_a
}

/// Generate the slot grid for a day window. All slots start out available.
pub fn generate_slots(window: &DayWindow) -> Vec<TimeSlot> {
    let duration = Duration::minutes(window.slot_duration_minutes as i64);
    if duration <= Duration::zero() {
        return Vec::new();
    }

    let mut slots = Vec::new();
    let mut cursor = window.start;

    loop {
        // overflowing_add_signed reports wrapped seconds; a wrap past
        // midnight ends the walk.
        let (slot_end, wrapped_secs) = cursor.overflowing_add_signed(duration);
        if wrapped_secs != 0 || slot_end > window.end {
            break;
        }

        let excluded = window
            .break_window
            .map(|(break_start, break_end)| {
                times_overlap(cursor, slot_end, break_start, break_end)
            })
            .unwrap_or(false);

        if !excluded {
            slots.push(TimeSlot {
                start: cursor,
                end: slot_end,
                available: true,
            });
        }

        cursor = slot_end;
    }

    slots
}

/// Mark slots that collide with blocking appointments as unavailable.
///
/// Slot times are local to the provider's timezone; appointments are stored
/// in UTC, so each slot is projected into UTC for the comparison.
pub fn mark_conflicts(
    slots: &mut [TimeSlot],
    date: NaiveDate,
    timezone: Tz,
    blocking: &[appointment::Model],
) {
    for slot in slots.iter_mut() {
        let start = project_local(timezone, date.and_time(slot.start));
        let end = project_local(timezone, date.and_time(slot.end));

        let taken = blocking.iter().any(|appointment| {
            appointment.status.blocks_time()
                && intervals_overlap(
                    start,
                    end,
                    appointment.date_time.with_timezone(&Utc),
                    appointment.end_time().with_timezone(&Utc),
                )
        });

        if taken {
            slot.available = false;
        }
    }
}

/// Project a provider-local wall-clock time into UTC.
///
/// Ambiguous local times (DST fold) take the earlier instant; nonexistent
/// local times (DST gap) are interpreted as UTC, which only shifts the
/// comparison window, never the stored data. Every slot therefore gets
/// checked against appointments, DST transitions included.
pub(crate) fn project_local(timezone: Tz, local: NaiveDateTime) -> DateTime<Utc> {
    match timezone.from_local_datetime(&local) {
        LocalResult::Single(instant) => instant.with_timezone(&Utc),
        LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
        LocalResult::None => Utc.from_utc_datetime(&local),
    }
}

/// Whether the interval `[start, end)` lies inside the working window and
/// clear of the break window.
pub fn fits_window(window: &DayWindow, start: NaiveTime, end: NaiveTime) -> bool {
    if start < window.start || end > window.end || start >= end {
        return false;
    }

    match window.break_window {
        Some((break_start, break_end)) => !times_overlap(start, end, break_start, break_end),
        None => true,
    }
}
