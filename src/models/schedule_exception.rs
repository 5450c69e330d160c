//! ScheduleException entity model
//!
//! This module contains the SeaORM entity model for the schedule_exceptions
//! table: date-specific overrides to a provider's recurring schedule. At most
//! one exception exists per provider and calendar date.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Date-specific override to a provider's recurring schedule
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "schedule_exceptions")]
pub struct Model {
    /// Unique identifier for the exception (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Provider this exception belongs to
    pub provider_id: Uuid,

    /// Calendar date the exception applies to
    pub date: Date,

    /// Kind of override this exception applies
    pub exception_type: ExceptionType,

    /// Override start of the working window (custom_hours only)
    pub start_time: Option<Time>,

    /// Override end of the working window (custom_hours only)
    pub end_time: Option<Time>,

    /// Override slot length in minutes (custom_hours only)
    pub slot_duration_minutes: Option<i32>,

    /// Free-text reason shown to staff
    pub reason: Option<String>,

    /// Timestamp when the exception was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the exception was last updated
    pub updated_at: DateTimeWithTimeZone,
}

/// Kinds of date-specific schedule overrides
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum ExceptionType {
    /// Provider is off for the whole day
    #[sea_orm(string_value = "day_off")]
    DayOff,
    /// Provider is on vacation; day is wholly unavailable
    #[sea_orm(string_value = "vacation")]
    Vacation,
    /// Public holiday; day is wholly unavailable
    #[sea_orm(string_value = "holiday")]
    Holiday,
    /// Day is available with replacement hours from this row
    #[sea_orm(string_value = "custom_hours")]
    CustomHours,
}

impl ExceptionType {
    /// True for types that make the entire day unavailable regardless of
    /// the recurring schedule.
    pub fn makes_day_unavailable(&self) -> bool {
        !matches!(self, ExceptionType::CustomHours)
    }

    /// Stable reason-code string reported in availability responses.
    pub fn reason_code(&self) -> &'static str {
        match self {
            ExceptionType::DayOff => "day_off",
            ExceptionType::Vacation => "vacation",
            ExceptionType::Holiday => "holiday",
            ExceptionType::CustomHours => "custom_hours",
        }
    }
}

impl std::fmt::Display for ExceptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.reason_code())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_day_types() {
        assert!(ExceptionType::DayOff.makes_day_unavailable());
        assert!(ExceptionType::Vacation.makes_day_unavailable());
        assert!(ExceptionType::Holiday.makes_day_unavailable());
        assert!(!ExceptionType::CustomHours.makes_day_unavailable());
    }

    #[test]
    fn test_serde_representation() {
        let json = serde_json::to_string(&ExceptionType::CustomHours).unwrap();
        assert_eq!(json, "\"custom_hours\"");

        let parsed: ExceptionType = serde_json::from_str("\"day_off\"").unwrap();
        assert_eq!(parsed, ExceptionType::DayOff);
    }
}
