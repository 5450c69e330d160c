//! # API Handlers
//!
//! This module contains all the HTTP endpoint handlers for the Bookings API.

use axum::response::Json;
use chrono::NaiveTime;
use serde::{Deserialize, Deserializer};
use serde_json::json;

use crate::error::{ApiError, validation_error};
use crate::models::ServiceInfo;

pub mod appointments;
pub mod availability;
pub mod provider_settings;
pub mod schedule_exceptions;
pub mod work_schedules;

/// Root handler that returns basic service information
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 200, description = "Service information", body = ServiceInfo)
    ),
    tag = "root"
)]
pub async fn root() -> Json<ServiceInfo> {
    Json(ServiceInfo::default())
}

/// Parse an `HH:MM` (or `HH:MM:SS`) wall-clock field.
pub(crate) fn parse_time_field(value: &str, field: &str) -> Result<NaiveTime, ApiError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .map_err(|_| {
            validation_error(
                "Invalid time value",
                json!({ field: "must be a time in HH:MM format" }),
            )
        })
}

/// Format a wall-clock time as `HH:MM` for responses.
pub(crate) fn format_time(value: NaiveTime) -> String {
    value.format("%H:%M").to_string()
}

/// Deserializer distinguishing an absent field from an explicit `null`,
/// so PUT payloads can clear nullable columns.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Deserialize::deserialize(deserializer).map(Some)
}
