//! Effective-schedule resolution for one provider and calendar date.
//!
//! Precedence: a date-specific exception beats the recurring weekly
//! schedule. Whole-day exception types (day_off, vacation, holiday) make the
//! date unavailable outright; custom_hours replaces the day's window, field
//! by field, falling back to the recurring row for anything it leaves unset.

use chrono::NaiveTime;
use serde::Serialize;
use utoipa::ToSchema;

use super::horizon::HorizonViolation;
use crate::models::schedule_exception::ExceptionType;
use crate::models::{schedule_exception, work_schedule};

/// Why a date has no bookable slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnavailableReason {
    DayOff,
    Vacation,
    Holiday,
    NoSchedule,
    PastDate,
    SameDayDisabled,
    BeyondHorizon,
}

impl UnavailableReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnavailableReason::DayOff => "day_off",
            UnavailableReason::Vacation => "vacation",
            UnavailableReason::Holiday => "holiday",
            UnavailableReason::NoSchedule => "no_schedule",
            UnavailableReason::PastDate => "past_date",
            UnavailableReason::SameDayDisabled => "same_day_disabled",
            UnavailableReason::BeyondHorizon => "beyond_horizon",
        }
    }
}

impl From<HorizonViolation> for UnavailableReason {
    fn from(violation: HorizonViolation) -> Self {
        match violation {
            HorizonViolation::PastDate => UnavailableReason::PastDate,
            HorizonViolation::SameDayDisabled => UnavailableReason::SameDayDisabled,
            HorizonViolation::BeyondHorizon => UnavailableReason::BeyondHorizon,
        }
    }
}

/// The working window in effect for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub slot_duration_minutes: u32,
    pub break_window: Option<(NaiveTime, NaiveTime)>,
}

/// Outcome of resolving a provider's schedule for one date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayAvailability {
    Available(DayWindow),
    Unavailable(UnavailableReason),
}

/// Resolve the effective working window for a date.
///
/// `schedules` holds the provider's active recurring rows for the date's
/// weekday; when duplicates exist the newest row wins (`created_at`, then
/// `id`). `default_slot_duration` is the provider-level fallback, itself
/// already resolved from settings or the configured default.
pub fn resolve_day(
    schedules: &[work_schedule::Model],
    exception: Option<&schedule_exception::Model>,
    default_slot_duration: u32,
) -> DayAvailability {
    let recurring = schedules
        .iter()
        .filter(|row| row.is_active)
        .max_by_key(|row| (row.created_at, row.id));

    if let Some(exception) = exception {
        match exception.exception_type {
            ExceptionType::DayOff => return DayAvailability::Unavailable(UnavailableReason::DayOff),
            ExceptionType::Vacation => {
                return DayAvailability::Unavailable(UnavailableReason::Vacation);
            }
            ExceptionType::Holiday => {
                return DayAvailability::Unavailable(UnavailableReason::Holiday);
            }
            ExceptionType::CustomHours => {
                let start = exception.start_time.or(recurring.map(|r| r.start_time));
                let end = exception.end_time.or(recurring.map(|r| r.end_time));
                let slot = exception
                    .slot_duration_minutes
                    .or(recurring.map(|r| r.slot_duration_minutes))
                    .map(|minutes| minutes as u32)
                    .unwrap_or(default_slot_duration);

                return match (start, end) {
                    (Some(start), Some(end)) if start < end => {
                        // Custom hours replace the day wholesale; the
                        // recurring break window does not carry over.
                        DayAvailability::Available(DayWindow {
                            start,
                            end,
                            slot_duration_minutes: slot,
                            break_window: None,
                        })
                    }
                    _ => DayAvailability::Unavailable(UnavailableReason::NoSchedule),
                };
            }
        }
    }

    match recurring {
        Some(row) if row.start_time < row.end_time => DayAvailability::Available(DayWindow {
            start: row.start_time,
            end: row.end_time,
            slot_duration_minutes: if row.slot_duration_minutes > 0 {
                row.slot_duration_minutes as u32
            } else {
                default_slot_duration
            },
            break_window: row.break_window(),
        }),
        _ => DayAvailability::Unavailable(UnavailableReason::NoSchedule),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn schedule_row(
        start: NaiveTime,
        end: NaiveTime,
        slot: i32,
        created_offset_secs: i64,
    ) -> work_schedule::Model {
        let created = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
            + Duration::seconds(created_offset_secs);
        work_schedule::Model {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            day_of_week: 1,
            start_time: start,
            end_time: end,
            slot_duration_minutes: slot,
            is_active: true,
            break_start: None,
            break_end: None,
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    fn exception(
        exception_type: ExceptionType,
        start: Option<NaiveTime>,
        end: Option<NaiveTime>,
        slot: Option<i32>,
    ) -> schedule_exception::Model {
        let created = Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap();
        schedule_exception::Model {
            id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            date: chrono::NaiveDate::from_ymd_opt(2025, 7, 21).unwrap(),
            exception_type,
            start_time: start,
            end_time: end,
            slot_duration_minutes: slot,
            reason: None,
            created_at: created.into(),
            updated_at: created.into(),
        }
    }

    #[test]
    fn test_whole_day_exception_wins_over_schedule() {
        let schedules = vec![schedule_row(time(9, 0), time(17, 0), 30, 0)];
        let day_off = exception(ExceptionType::DayOff, None, None, None);

        assert_eq!(
            resolve_day(&schedules, Some(&day_off), 30),
            DayAvailability::Unavailable(UnavailableReason::DayOff)
        );
    }

    #[test]
    fn test_custom_hours_field_fallback_chain() {
        let schedules = vec![schedule_row(time(9, 0), time(17, 0), 30, 0)];

        // Exception sets only the end time; start and slot come from the
        // recurring row.
        let custom = exception(ExceptionType::CustomHours, None, Some(time(13, 0)), None);
        assert_eq!(
            resolve_day(&schedules, Some(&custom), 45),
            DayAvailability::Available(DayWindow {
                start: time(9, 0),
                end: time(13, 0),
                slot_duration_minutes: 30,
                break_window: None,
            })
        );

        // Exception sets everything itself.
        let custom = exception(
            ExceptionType::CustomHours,
            Some(time(10, 0)),
            Some(time(14, 0)),
            Some(20),
        );
        assert_eq!(
            resolve_day(&schedules, Some(&custom), 45),
            DayAvailability::Available(DayWindow {
                start: time(10, 0),
                end: time(14, 0),
                slot_duration_minutes: 20,
                break_window: None,
            })
        );
    }

    #[test]
    fn test_custom_hours_without_any_window_is_no_schedule() {
        let custom = exception(ExceptionType::CustomHours, None, None, Some(30));
        assert_eq!(
            resolve_day(&[], Some(&custom), 30),
            DayAvailability::Unavailable(UnavailableReason::NoSchedule)
        );
    }

    #[test]
    fn test_custom_hours_slot_falls_back_to_default() {
        let custom = exception(
            ExceptionType::CustomHours,
            Some(time(10, 0)),
            Some(time(12, 0)),
            None,
        );
        match resolve_day(&[], Some(&custom), 25) {
            DayAvailability::Available(window) => {
                assert_eq!(window.slot_duration_minutes, 25);
            }
            other => panic!("expected available day, got {:?}", other),
        }
    }

    #[test]
    fn test_no_schedule_for_weekday() {
        assert_eq!(
            resolve_day(&[], None, 30),
            DayAvailability::Unavailable(UnavailableReason::NoSchedule)
        );
    }

    #[test]
    fn test_newest_duplicate_row_wins() {
        let older = schedule_row(time(9, 0), time(17, 0), 30, 0);
        let newer = schedule_row(time(10, 0), time(15, 0), 60, 3600);
        let schedules = vec![older, newer];

        assert_eq!(
            resolve_day(&schedules, None, 30),
            DayAvailability::Available(DayWindow {
                start: time(10, 0),
                end: time(15, 0),
                slot_duration_minutes: 60,
                break_window: None,
            })
        );
    }

    #[test]
    fn test_inactive_rows_are_ignored() {
        let mut row = schedule_row(time(9, 0), time(17, 0), 30, 0);
        row.is_active = false;

        assert_eq!(
            resolve_day(&[row], None, 30),
            DayAvailability::Unavailable(UnavailableReason::NoSchedule)
        );
    }

    #[test]
    fn test_break_window_carried_from_recurring_row() {
        let mut row = schedule_row(time(9, 0), time(17, 0), 30, 0);
        row.break_start = Some(time(12, 0));
        row.break_end = Some(time(13, 0));

        match resolve_day(&[row], None, 30) {
            DayAvailability::Available(window) => {
                assert_eq!(window.break_window, Some((time(12, 0), time(13, 0))));
            }
            other => panic!("expected available day, got {:?}", other),
        }
    }
}
