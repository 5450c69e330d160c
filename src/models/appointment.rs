//! Appointment entity model
//!
//! This module contains the SeaORM entity model for the appointments table,
//! plus the appointment status state machine. Pending and confirmed
//! appointments block their time interval; cancelled and completed ones do
//! not.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Booked appointment between a client and a provider
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "appointments")]
pub struct Model {
    /// Unique identifier for the appointment (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Client who booked the appointment
    pub client_id: Uuid,

    /// Provider the appointment is with
    pub provider_id: Uuid,

    /// Short title shown in listings
    pub title: String,

    /// Longer free-text description
    pub description: Option<String>,

    /// Start instant of the appointment (UTC)
    pub date_time: DateTimeWithTimeZone,

    /// Length of the appointment in minutes
    pub duration_minutes: i32,

    /// Current lifecycle status
    pub status: AppointmentStatus,

    /// Timestamp when the appointment was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the appointment was last updated
    pub updated_at: Option<DateTimeWithTimeZone>,
}

impl Model {
    /// End instant of the appointment (exclusive).
    pub fn end_time(&self) -> DateTimeWithTimeZone {
        self.date_time + chrono::Duration::minutes(self.duration_minutes as i64)
    }
}

/// Appointment lifecycle status
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, awaiting provider confirmation
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Confirmed by the provider
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    /// Cancelled by either party (terminal)
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
    /// Took place and was marked done (terminal)
    #[sea_orm(string_value = "completed")]
    Completed,
}

impl AppointmentStatus {
    /// Statuses this one may legally transition to.
    pub fn valid_transitions(&self) -> &'static [AppointmentStatus] {
        match self {
            AppointmentStatus::Pending => {
                &[AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Confirmed => {
                &[AppointmentStatus::Completed, AppointmentStatus::Cancelled]
            }
            AppointmentStatus::Cancelled | AppointmentStatus::Completed => &[],
        }
    }

    /// Whether the transition `self -> target` is allowed.
    pub fn can_transition_to(&self, target: AppointmentStatus) -> bool {
        self.valid_transitions().contains(&target)
    }

    /// Whether an appointment in this status blocks its time interval.
    pub fn blocks_time(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Pending | AppointmentStatus::Confirmed
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Completed => "completed",
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_transition_table() {
        use AppointmentStatus::*;

        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(!Pending.can_transition_to(Completed));

        assert!(Confirmed.can_transition_to(Completed));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(!Confirmed.can_transition_to(Pending));

        assert!(Cancelled.valid_transitions().is_empty());
        assert!(Completed.valid_transitions().is_empty());
    }

    #[test]
    fn test_blocking_statuses() {
        use AppointmentStatus::*;

        assert!(Pending.blocks_time());
        assert!(Confirmed.blocks_time());
        assert!(!Cancelled.blocks_time());
        assert!(!Completed.blocks_time());
    }

    #[test]
    fn test_end_time() {
        let start = Utc.with_ymd_and_hms(2025, 7, 21, 9, 0, 0).unwrap();
        let appointment = Model {
            id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            provider_id: Uuid::new_v4(),
            title: "Consultation".to_string(),
            description: None,
            date_time: start.into(),
            duration_minutes: 45,
            status: AppointmentStatus::Pending,
            created_at: start.into(),
            updated_at: None,
        };

        assert_eq!(
            appointment.end_time(),
            Utc.with_ymd_and_hms(2025, 7, 21, 9, 45, 0).unwrap()
        );
    }
}
