//! # Availability API Handlers
//!
//! Handlers answering "what slots does this provider have" and "is this
//! exact booking allowed".

use axum::{
    extract::{Path, State},
    response::Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::format_time;
use crate::availability::AvailabilityEngine;
use crate::availability::engine::DayReport;
use crate::error::ApiError;
use crate::server::AppState;

/// One slot in an availability response
#[derive(Debug, Serialize, ToSchema)]
pub struct SlotDto {
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "09:30")]
    pub end_time: String,
    /// False when an existing appointment occupies the slot
    pub available: bool,
}

/// Availability picture for one provider and date
#[derive(Debug, Serialize, ToSchema)]
pub struct AvailabilityDto {
    pub provider_id: Uuid,
    #[schema(example = "2025-07-21")]
    pub date: NaiveDate,
    /// Timezone the slot times are expressed in
    #[schema(example = "America/Mexico_City")]
    pub timezone: String,
    pub is_available: bool,
    /// Why the date has no slots, when it does not
    #[schema(example = "day_off")]
    pub reason: Option<String>,
    pub available_slots: Vec<SlotDto>,
}

impl From<DayReport> for AvailabilityDto {
    fn from(report: DayReport) -> Self {
        let is_available = report.is_available();
        Self {
            provider_id: report.provider_id,
            date: report.date,
            timezone: report.timezone.name().to_string(),
            is_available,
            reason: report.reason.map(|r| r.as_str().to_string()),
            available_slots: report
                .slots
                .into_iter()
                .map(|slot| SlotDto {
                    start_time: format_time(slot.start),
                    end_time: format_time(slot.end),
                    available: slot.available,
                })
                .collect(),
        }
    }
}

/// Request payload for validating an exact booking interval
#[derive(Debug, Deserialize, ToSchema)]
pub struct ValidateAvailabilityRequest {
    pub provider_id: Uuid,
    /// Requested start instant (RFC 3339, UTC)
    #[schema(example = "2025-07-21T15:00:00Z")]
    pub date_time: DateTime<Utc>,
    /// Requested length in minutes
    #[schema(example = 30)]
    pub duration_minutes: i32,
}

/// Outcome of validating a booking interval
#[derive(Debug, Serialize, ToSchema)]
pub struct ValidateAvailabilityResponse {
    /// True when the interval can be booked right now
    pub valid: bool,
    /// Stable error code when the interval is not bookable
    #[schema(example = "OUTSIDE_WORKING_HOURS")]
    pub code: Option<String>,
    /// Human-readable explanation when the interval is not bookable
    pub message: Option<String>,
    /// Structured context, e.g. the conflicting appointment id
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

/// Get the slot grid for a provider's date
#[utoipa::path(
    get,
    path = "/api/v1/work-schedules/availability/{provider_id}/{date}",
    params(
        ("provider_id" = Uuid, Path, description = "Provider identifier"),
        ("date" = String, Path, description = "Calendar date (YYYY-MM-DD)")
    ),
    responses(
        (status = 200, description = "Availability for the date", body = AvailabilityDto),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "availability"
)]
pub async fn get_availability(
    State(state): State<AppState>,
    Path((provider_id, date)): Path<(Uuid, NaiveDate)>,
) -> Result<Json<AvailabilityDto>, ApiError> {
    let engine = AvailabilityEngine::new(state.db.clone(), state.config.booking.clone());
    let report = engine
        .day_availability(provider_id, date, Utc::now())
        .await?;

    Ok(Json(report.into()))
}

/// Validate an exact booking interval without booking it
#[utoipa::path(
    post,
    path = "/api/v1/work-schedules/validate-availability",
    request_body = ValidateAvailabilityRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidateAvailabilityResponse),
        (status = 400, description = "Malformed request", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "availability"
)]
pub async fn validate_availability(
    State(state): State<AppState>,
    Json(request): Json<ValidateAvailabilityRequest>,
) -> Result<Json<ValidateAvailabilityResponse>, ApiError> {
    let engine = AvailabilityEngine::new(state.db.clone(), state.config.booking.clone());

    match engine
        .validate_booking(
            request.provider_id,
            request.date_time,
            request.duration_minutes,
            Utc::now(),
            None,
        )
        .await
    {
        Ok(()) => Ok(Json(ValidateAvailabilityResponse {
            valid: true,
            code: None,
            message: None,
            details: None,
        })),
        Err(error) if error.status.is_client_error() => {
            Ok(Json(ValidateAvailabilityResponse {
                valid: false,
                code: Some(error.code.into_string()),
                message: Some(error.message.into_string()),
                details: error.details.map(|details| *details),
            }))
        }
        Err(error) => Err(error),
    }
}
