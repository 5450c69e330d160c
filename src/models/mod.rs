//! # Data Models
//!
//! This module contains all the data models used throughout the Bookings API.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub mod appointment;
pub mod provider_settings;
pub mod schedule_exception;
pub mod work_schedule;

pub use appointment::Entity as Appointment;
pub use provider_settings::Entity as ProviderSettings;
pub use schedule_exception::Entity as ScheduleException;
pub use work_schedule::Entity as WorkSchedule;

pub use appointment::AppointmentStatus;
pub use schedule_exception::ExceptionType;

/// Basic service information response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    /// The name of the service
    pub service: String,
    /// The version of the service
    pub version: String,
}

impl Default for ServiceInfo {
    fn default() -> Self {
        Self {
            service: "bookings".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
