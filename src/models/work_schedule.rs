//! WorkSchedule entity model
//!
//! This module contains the SeaORM entity model for the work_schedules table,
//! which holds a provider's recurring weekly working hours: one row per
//! provider and weekday, with optional break window and per-row slot length.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Recurring weekly working-hours row for one provider and weekday
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "work_schedules")]
pub struct Model {
    /// Unique identifier for the schedule row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Provider this schedule belongs to
    pub provider_id: Uuid,

    /// Day of week, 0 = Sunday through 6 = Saturday
    pub day_of_week: i16,

    /// Start of the working window (local, time-of-day)
    pub start_time: Time,

    /// End of the working window (exclusive)
    pub end_time: Time,

    /// Slot length in minutes for this weekday
    pub slot_duration_minutes: i32,

    /// Whether this row currently participates in availability
    pub is_active: bool,

    /// Start of the break window, if the day has one
    pub break_start: Option<Time>,

    /// End of the break window (exclusive)
    pub break_end: Option<Time>,

    /// Timestamp when the row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// True when the row defines a break window with both bounds set.
    pub fn break_window(&self) -> Option<(Time, Time)> {
        match (self.break_start, self.break_end) {
            (Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}
