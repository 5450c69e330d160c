//! ProviderSettings entity model
//!
//! Per-provider booking policy: default slot length, booking horizon,
//! same-day switch, and the provider's timezone. One row per provider;
//! providers without a row fall back to the configured defaults.

use sea_orm::ActiveModelBehavior;
use sea_orm::entity::prelude::*;
use sea_orm::prelude::DateTimeWithTimeZone;
use uuid::Uuid;

/// Per-provider booking policy row
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "provider_settings")]
pub struct Model {
    /// Unique identifier for the settings row (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Provider these settings belong to (unique)
    pub provider_id: Uuid,

    /// Default slot length in minutes, used when a schedule row does not
    /// define one
    pub default_slot_duration: i32,

    /// How many days ahead of today bookings are accepted
    pub advance_booking_days: i32,

    /// Whether bookings for today are accepted
    pub same_day_booking: bool,

    /// IANA timezone name the provider operates in
    pub timezone: String,

    /// Timestamp when the row was created
    pub created_at: DateTimeWithTimeZone,

    /// Timestamp when the row was last updated
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
