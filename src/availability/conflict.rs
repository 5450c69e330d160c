//! Interval overlap detection against existing appointments.
//!
//! Intervals are half-open `[start, end)`: an appointment ending at 10:00
//! does not conflict with one starting at 10:00.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::appointment;

/// Half-open interval overlap test.
pub fn intervals_overlap(
    start_a: DateTime<Utc>,
    end_a: DateTime<Utc>,
    start_b: DateTime<Utc>,
    end_b: DateTime<Utc>,
) -> bool {
    start_a < end_b && start_b < end_a
}

/// Find the first existing appointment whose interval overlaps
/// `[start, end)`.
///
/// Only appointments whose status blocks time participate; `exclude` skips
/// one appointment by id, used when re-validating an update against the
/// record being updated.
pub fn find_conflict<'a>(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    existing: &'a [appointment::Model],
    exclude: Option<Uuid>,
) -> Option<&'a appointment::Model> {
    existing.iter().find(|appointment| {
        if Some(appointment.id) == exclude {
            return false;
        }
        if !appointment.status.blocks_time() {
            return false;
        }
        intervals_overlap(
            start,
            end,
            appointment.date_time.with_timezone(&Utc),
            appointment.end_time().with_timezone(&Utc),
        )
    })
}
