//! Booking-horizon enforcement.
//!
//! "Today" is computed in the provider's timezone, so a provider in
//! America/Mexico_City does not lose their evening slots when the server
//! clock has already rolled into tomorrow UTC.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

/// Effective booking policy for one provider, after falling back to the
/// configured defaults where the provider has no settings row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookingPolicy {
    pub advance_booking_days: u32,
    pub same_day_booking: bool,
    pub timezone: Tz,
}

/// Ways a requested date can fall outside the booking horizon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizonViolation {
    PastDate,
    SameDayDisabled,
    BeyondHorizon,
}

impl HorizonViolation {
    /// Stable reason-code string reported in availability responses.
    pub fn reason_code(&self) -> &'static str {
        match self {
            HorizonViolation::PastDate => "past_date",
            HorizonViolation::SameDayDisabled => "same_day_disabled",
            HorizonViolation::BeyondHorizon => "beyond_horizon",
        }
    }
}

impl BookingPolicy {
    /// Today's calendar date in the policy's timezone.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// Check whether `date` is bookable under this policy at instant `now`.
    pub fn check_date(&self, now: DateTime<Utc>, date: NaiveDate) -> Result<(), HorizonViolation> {
        let today = self.today(now);

        if date < today {
            return Err(HorizonViolation::PastDate);
        }
        if date == today && !self.same_day_booking {
            return Err(HorizonViolation::SameDayDisabled);
        }
        let horizon_end = today + chrono::Duration::days(self.advance_booking_days as i64);
        if date > horizon_end {
            return Err(HorizonViolation::BeyondHorizon);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn policy(advance_days: u32, same_day: bool) -> BookingPolicy {
        BookingPolicy {
            advance_booking_days: advance_days,
            same_day_booking: same_day,
            timezone: chrono_tz::UTC,
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_past_date_rejected() {
        let now = Utc.with_ymd_and_hms(2025, 7, 21, 12, 0, 0).unwrap();
        assert_eq!(
            policy(30, true).check_date(now, date(2025, 7, 20)),
            Err(HorizonViolation::PastDate)
        );
    }

    #[test]
    fn test_same_day_switch() {
        let now = Utc.with_ymd_and_hms(2025, 7, 21, 12, 0, 0).unwrap();
        let today = date(2025, 7, 21);

        assert_eq!(policy(30, true).check_date(now, today), Ok(()));
        assert_eq!(
            policy(30, false).check_date(now, today),
            Err(HorizonViolation::SameDayDisabled)
        );
    }

    #[test]
    fn test_horizon_boundary_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2025, 7, 21, 12, 0, 0).unwrap();
        let p = policy(30, true);

        assert_eq!(p.check_date(now, date(2025, 8, 20)), Ok(()));
        assert_eq!(
            p.check_date(now, date(2025, 8, 21)),
            Err(HorizonViolation::BeyondHorizon)
        );
    }

    #[test]
    fn test_today_uses_provider_timezone() {
        // 03:00 UTC on July 22 is still the evening of July 21 in Mexico City.
        let now = Utc.with_ymd_and_hms(2025, 7, 22, 3, 0, 0).unwrap();
        let p = BookingPolicy {
            advance_booking_days: 30,
            same_day_booking: true,
            timezone: chrono_tz::America::Mexico_City,
        };

        assert_eq!(p.today(now), date(2025, 7, 21));
        // July 21 is "today" locally, not a past date.
        assert_eq!(p.check_date(now, date(2025, 7, 21)), Ok(()));
    }
}
