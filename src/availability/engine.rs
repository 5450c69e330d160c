//! Orchestration of the availability core over the repositories.
//!
//! The engine answers two questions: "what does this provider's day look
//! like" (resolved window plus slot grid with conflicts marked) and "is this
//! exact booking allowed" (horizon, working hours, conflicts — in that
//! order).

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use sea_orm::DatabaseConnection;
use uuid::Uuid;

use super::conflict::find_conflict;
use super::horizon::BookingPolicy;
use super::resolver::{DayAvailability, DayWindow, UnavailableReason, resolve_day};
use super::slots::{TimeSlot, fits_window, generate_slots, mark_conflicts, project_local};
use crate::config::BookingDefaultsConfig;
use crate::error::{ApiError, BookingError};
use crate::repositories::{
    AppointmentRepository, ProviderSettingsRepository, ScheduleExceptionRepository,
    WorkScheduleRepository,
};

/// A provider's booking policy with the slot-duration fallback resolved.
#[derive(Debug, Clone, Copy)]
pub struct EffectivePolicy {
    pub policy: BookingPolicy,
    pub default_slot_duration: u32,
}

/// Availability answer for one provider and date.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub timezone: Tz,
    pub window: Option<DayWindow>,
    pub reason: Option<UnavailableReason>,
    pub slots: Vec<TimeSlot>,
}

impl DayReport {
    /// True when the date has at least one open slot.
    pub fn is_available(&self) -> bool {
        self.reason.is_none() && self.slots.iter().any(|slot| slot.available)
    }
}

/// Availability engine combining schedules, exceptions, settings, and
/// existing appointments.
pub struct AvailabilityEngine {
    schedules: WorkScheduleRepository,
    exceptions: ScheduleExceptionRepository,
    settings: ProviderSettingsRepository,
    appointments: AppointmentRepository,
    defaults: BookingDefaultsConfig,
}

impl AvailabilityEngine {
    /// Create an engine over the given connection and configured defaults.
    pub fn new(db: DatabaseConnection, defaults: BookingDefaultsConfig) -> Self {
        Self {
            schedules: WorkScheduleRepository::new(db.clone()),
            exceptions: ScheduleExceptionRepository::new(db.clone()),
            settings: ProviderSettingsRepository::new(db.clone()),
            appointments: AppointmentRepository::new(db),
            defaults,
        }
    }

    /// Resolve the booking policy for a provider, falling back to the
    /// configured defaults when no settings row exists.
    pub async fn effective_policy(&self, provider_id: Uuid) -> Result<EffectivePolicy, ApiError> {
        let stored = self.settings.get(provider_id).await?;

        let (advance_days, same_day, timezone_name, default_slot) = match stored {
            Some(settings) => (
                settings.advance_booking_days.max(0) as u32,
                settings.same_day_booking,
                settings.timezone,
                settings.default_slot_duration.max(1) as u32,
            ),
            None => (
                self.defaults.advance_booking_days,
                self.defaults.same_day_booking,
                self.defaults.timezone.clone(),
                self.defaults.slot_duration_minutes,
            ),
        };

        let timezone = timezone_name.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(
                provider_id = %provider_id,
                timezone = %timezone_name,
                fallback = %self.defaults.timezone,
                "Stored timezone is not a valid IANA name, using configured default"
            );
            self.defaults.timezone.parse::<Tz>().unwrap_or(chrono_tz::UTC)
        });

        Ok(EffectivePolicy {
            policy: BookingPolicy {
                advance_booking_days: advance_days,
                same_day_booking: same_day,
                timezone,
            },
            default_slot_duration: default_slot,
        })
    }

    /// Full availability picture for a provider's date.
    pub async fn day_availability(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<DayReport, ApiError> {
        let effective = self.effective_policy(provider_id).await?;
        let timezone = effective.policy.timezone;

        let unavailable = |reason: UnavailableReason| DayReport {
            provider_id,
            date,
            timezone,
            window: None,
            reason: Some(reason),
            slots: Vec::new(),
        };

        if let Err(violation) = effective.policy.check_date(now, date) {
            return Ok(unavailable(violation.into()));
        }

        let weekday = date.weekday().num_days_from_sunday() as i16;
        let schedules = self
            .schedules
            .find_active_for_weekday(provider_id, weekday)
            .await?;
        let exception = self.exceptions.find_for_date(provider_id, date).await?;

        let window = match resolve_day(
            &schedules,
            exception.as_ref(),
            effective.default_slot_duration,
        ) {
            DayAvailability::Available(window) => window,
            DayAvailability::Unavailable(reason) => return Ok(unavailable(reason)),
        };

        let mut slots = generate_slots(&window);

        let day_start = project_local(timezone, date.and_hms_opt(0, 0, 0).unwrap_or_default());
        let day_end = project_local(
            timezone,
            (date + Duration::days(1))
                .and_hms_opt(0, 0, 0)
                .unwrap_or_default(),
        );
        let blocking = self
            .appointments
            .list_blocking_between(provider_id, day_start, day_end)
            .await?;
        mark_conflicts(&mut slots, date, timezone, &blocking);

        Ok(DayReport {
            provider_id,
            date,
            timezone,
            window: Some(window),
            reason: None,
            slots,
        })
    }

    /// Validate an exact booking request: horizon first, then working
    /// hours, then conflicts. `exclude` skips one appointment id when
    /// re-validating an update against itself.
    pub async fn validate_booking(
        &self,
        provider_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: i32,
        now: DateTime<Utc>,
        exclude: Option<Uuid>,
    ) -> Result<(), ApiError> {
        if duration_minutes <= 0 || duration_minutes > 24 * 60 {
            return Err(BookingError::InvalidInterval {
                message: "duration must be between 1 and 1440 minutes".to_string(),
            }
            .into());
        }

        let effective = self.effective_policy(provider_id).await?;
        let local = start.with_timezone(&effective.policy.timezone);
        let date = local.date_naive();

        effective
            .policy
            .check_date(now, date)
            .map_err(|violation| BookingError::OutsideBookingHorizon {
                reason: violation.reason_code(),
            })?;

        let start_time = local.time();
        let (end_time, wrapped_secs) =
            start_time.overflowing_add_signed(Duration::minutes(duration_minutes as i64));
        if wrapped_secs != 0 {
            // Interval crosses local midnight; no working window can hold it.
            return Err(BookingError::OutsideWorkingHours.into());
        }

        let weekday = date.weekday().num_days_from_sunday() as i16;
        let schedules = self
            .schedules
            .find_active_for_weekday(provider_id, weekday)
            .await?;
        let exception = self.exceptions.find_for_date(provider_id, date).await?;

        let window = match resolve_day(
            &schedules,
            exception.as_ref(),
            effective.default_slot_duration,
        ) {
            DayAvailability::Available(window) => window,
            DayAvailability::Unavailable(_) => {
                return Err(BookingError::OutsideWorkingHours.into());
            }
        };

        if !fits_window(&window, start_time, end_time) {
            return Err(BookingError::OutsideWorkingHours.into());
        }

        let end = start + Duration::minutes(duration_minutes as i64);
        let blocking = self
            .appointments
            .list_blocking_between(provider_id, start, end)
            .await?;

        if let Some(conflict) = find_conflict(start, end, &blocking, exclude) {
            return Err(BookingError::ConflictingAppointment {
                conflicting_id: conflict.id,
            }
            .into());
        }

        Ok(())
    }
}
