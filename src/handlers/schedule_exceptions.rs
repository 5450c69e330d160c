//! # Schedule Exception API Handlers
//!
//! Handlers for date-specific overrides: days off, vacations, holidays, and
//! custom hours.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::{double_option, format_time, parse_time_field};
use crate::error::ApiError;
use crate::models::schedule_exception::{self, ExceptionType};
use crate::repositories::schedule_exception::{NewScheduleException, ScheduleExceptionChanges};
use crate::repositories::ScheduleExceptionRepository;
use crate::server::AppState;

/// Request payload for creating a schedule exception
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateScheduleExceptionRequest {
    /// Provider the exception belongs to
    pub provider_id: Uuid,
    /// Calendar date the exception applies to
    #[schema(example = "2025-07-21")]
    pub date: NaiveDate,
    /// Kind of override
    pub exception_type: ExceptionType,
    /// Override start of the working window (custom_hours only)
    #[schema(example = "10:00")]
    pub start_time: Option<String>,
    /// Override end of the working window (custom_hours only)
    #[schema(example = "14:00")]
    pub end_time: Option<String>,
    /// Override slot length in minutes (custom_hours only)
    pub slot_duration_minutes: Option<i32>,
    /// Free-text reason shown to staff
    pub reason: Option<String>,
}

/// Request payload for updating an exception; absent fields are untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateScheduleExceptionRequest {
    pub exception_type: Option<ExceptionType>,
    /// Override start; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub start_time: Option<Option<String>>,
    /// Override end; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub end_time: Option<Option<String>>,
    /// Override slot length; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub slot_duration_minutes: Option<Option<i32>>,
    /// Reason; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub reason: Option<Option<String>>,
}

/// Date range filter for listing exceptions
#[derive(Debug, Deserialize, IntoParams)]
pub struct ExceptionRangeQuery {
    /// Earliest date to include
    pub start_date: Option<NaiveDate>,
    /// Latest date to include
    pub end_date: Option<NaiveDate>,
}

/// Schedule exception as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct ScheduleExceptionDto {
    pub id: Uuid,
    pub provider_id: Uuid,
    #[schema(example = "2025-07-21")]
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub slot_duration_minutes: Option<i32>,
    pub reason: Option<String>,
    pub created_at: String,
}

impl From<schedule_exception::Model> for ScheduleExceptionDto {
    fn from(model: schedule_exception::Model) -> Self {
        Self {
            id: model.id,
            provider_id: model.provider_id,
            date: model.date,
            exception_type: model.exception_type,
            start_time: model.start_time.map(format_time),
            end_time: model.end_time.map(format_time),
            slot_duration_minutes: model.slot_duration_minutes,
            reason: model.reason,
            created_at: model.created_at.to_rfc3339(),
        }
    }
}

/// Create a schedule exception
#[utoipa::path(
    post,
    path = "/api/v1/schedule-exceptions",
    request_body = CreateScheduleExceptionRequest,
    responses(
        (status = 201, description = "Exception created", body = ScheduleExceptionDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "An exception already exists for the date", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "schedule-exceptions"
)]
pub async fn create_schedule_exception(
    State(state): State<AppState>,
    Json(request): Json<CreateScheduleExceptionRequest>,
) -> Result<(StatusCode, Json<ScheduleExceptionDto>), ApiError> {
    let start_time = request
        .start_time
        .as_deref()
        .map(|v| parse_time_field(v, "start_time"))
        .transpose()?;
    let end_time = request
        .end_time
        .as_deref()
        .map(|v| parse_time_field(v, "end_time"))
        .transpose()?;

    let repo = ScheduleExceptionRepository::new(state.db.clone());
    let created = repo
        .create(NewScheduleException {
            provider_id: request.provider_id,
            date: request.date,
            exception_type: request.exception_type,
            start_time,
            end_time,
            slot_duration_minutes: request.slot_duration_minutes,
            reason: request.reason,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List a provider's exceptions, optionally bounded to a date range
#[utoipa::path(
    get,
    path = "/api/v1/schedule-exceptions/provider/{provider_id}",
    params(
        ("provider_id" = Uuid, Path, description = "Provider identifier"),
        ExceptionRangeQuery
    ),
    responses(
        (status = 200, description = "Exceptions for the provider", body = [ScheduleExceptionDto]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "schedule-exceptions"
)]
pub async fn list_schedule_exceptions(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Query(range): Query<ExceptionRangeQuery>,
) -> Result<Json<Vec<ScheduleExceptionDto>>, ApiError> {
    let repo = ScheduleExceptionRepository::new(state.db.clone());
    let rows = repo
        .list_by_provider(provider_id, range.start_date, range.end_date)
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Update a schedule exception
#[utoipa::path(
    put,
    path = "/api/v1/schedule-exceptions/{id}",
    params(
        ("id" = Uuid, Path, description = "Exception identifier")
    ),
    request_body = UpdateScheduleExceptionRequest,
    responses(
        (status = 200, description = "Exception updated", body = ScheduleExceptionDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Exception not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "schedule-exceptions"
)]
pub async fn update_schedule_exception(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateScheduleExceptionRequest>,
) -> Result<Json<ScheduleExceptionDto>, ApiError> {
    let start_time = match request.start_time {
        None => None,
        Some(None) => Some(None),
        Some(Some(value)) => Some(Some(parse_time_field(&value, "start_time")?)),
    };
    let end_time = match request.end_time {
        None => None,
        Some(None) => Some(None),
        Some(Some(value)) => Some(Some(parse_time_field(&value, "end_time")?)),
    };

    let repo = ScheduleExceptionRepository::new(state.db.clone());
    let updated = repo
        .update(
            id,
            ScheduleExceptionChanges {
                exception_type: request.exception_type,
                start_time,
                end_time,
                slot_duration_minutes: request.slot_duration_minutes,
                reason: request.reason,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a schedule exception
#[utoipa::path(
    delete,
    path = "/api/v1/schedule-exceptions/{id}",
    params(
        ("id" = Uuid, Path, description = "Exception identifier")
    ),
    responses(
        (status = 204, description = "Exception deleted"),
        (status = 404, description = "Exception not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "schedule-exceptions"
)]
pub async fn delete_schedule_exception(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = ScheduleExceptionRepository::new(state.db.clone());
    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
