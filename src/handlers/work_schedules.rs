//! # Work Schedule API Handlers
//!
//! Handlers for managing a provider's recurring weekly working hours.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::{double_option, format_time, parse_time_field};
use crate::error::ApiError;
use crate::models::work_schedule;
use crate::repositories::work_schedule::{NewWorkSchedule, WorkScheduleChanges};
use crate::repositories::WorkScheduleRepository;
use crate::server::AppState;

/// Request payload for creating a recurring schedule row
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateWorkScheduleRequest {
    /// Provider the schedule belongs to
    pub provider_id: Uuid,
    /// Day of week, 0 = Sunday through 6 = Saturday
    #[schema(example = 1)]
    pub day_of_week: i16,
    /// Start of the working window
    #[schema(example = "09:00")]
    pub start_time: String,
    /// End of the working window
    #[schema(example = "17:00")]
    pub end_time: String,
    /// Slot length in minutes; defaults to the configured slot duration
    #[schema(example = 30)]
    pub slot_duration_minutes: Option<i32>,
    /// Whether the row participates in availability (defaults to true)
    pub is_active: Option<bool>,
    /// Start of the break window
    #[schema(example = "12:00")]
    pub break_start: Option<String>,
    /// End of the break window
    #[schema(example = "13:00")]
    pub break_end: Option<String>,
}

/// Request payload for updating a schedule row; absent fields are untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateWorkScheduleRequest {
    pub day_of_week: Option<i16>,
    #[schema(example = "09:00")]
    pub start_time: Option<String>,
    #[schema(example = "17:00")]
    pub end_time: Option<String>,
    pub slot_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
    /// Break start; send `null` to clear the break window
    #[serde(default, deserialize_with = "double_option")]
    pub break_start: Option<Option<String>>,
    /// Break end; send `null` to clear the break window
    #[serde(default, deserialize_with = "double_option")]
    pub break_end: Option<Option<String>>,
}

/// Recurring schedule row as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct WorkScheduleDto {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub day_of_week: i16,
    #[schema(example = "09:00")]
    pub start_time: String,
    #[schema(example = "17:00")]
    pub end_time: String,
    pub slot_duration_minutes: i32,
    pub is_active: bool,
    pub break_start: Option<String>,
    pub break_end: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<work_schedule::Model> for WorkScheduleDto {
    fn from(model: work_schedule::Model) -> Self {
        Self {
            id: model.id,
            provider_id: model.provider_id,
            day_of_week: model.day_of_week,
            start_time: format_time(model.start_time),
            end_time: format_time(model.end_time),
            slot_duration_minutes: model.slot_duration_minutes,
            is_active: model.is_active,
            break_start: model.break_start.map(format_time),
            break_end: model.break_end.map(format_time),
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// One weekday in the aggregated weekly view
#[derive(Debug, Serialize, ToSchema)]
pub struct WeekdayScheduleDto {
    /// Day of week, 0 = Sunday through 6 = Saturday
    pub day_of_week: i16,
    /// Weekday name in English
    #[schema(example = "Monday")]
    pub day_name: String,
    /// Schedule rows configured for this weekday
    pub schedules: Vec<WorkScheduleDto>,
}

/// Aggregated weekly view of a provider's recurring hours and policy
#[derive(Debug, Serialize, ToSchema)]
pub struct WeeklyScheduleDto {
    pub provider_id: Uuid,
    pub days: Vec<WeekdayScheduleDto>,
    /// The provider's stored booking policy, when one exists
    pub settings: Option<super::provider_settings::ProviderSettingsDto>,
}

const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Create a recurring schedule row
#[utoipa::path(
    post,
    path = "/api/v1/work-schedules",
    request_body = CreateWorkScheduleRequest,
    responses(
        (status = 201, description = "Schedule created", body = WorkScheduleDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Active schedule already exists for the weekday", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "work-schedules"
)]
pub async fn create_work_schedule(
    State(state): State<AppState>,
    Json(request): Json<CreateWorkScheduleRequest>,
) -> Result<(StatusCode, Json<WorkScheduleDto>), ApiError> {
    let start_time = parse_time_field(&request.start_time, "start_time")?;
    let end_time = parse_time_field(&request.end_time, "end_time")?;
    let break_start = request
        .break_start
        .as_deref()
        .map(|v| parse_time_field(v, "break_start"))
        .transpose()?;
    let break_end = request
        .break_end
        .as_deref()
        .map(|v| parse_time_field(v, "break_end"))
        .transpose()?;

    let repo = WorkScheduleRepository::new(state.db.clone());
    let created = repo
        .create(NewWorkSchedule {
            provider_id: request.provider_id,
            day_of_week: request.day_of_week,
            start_time,
            end_time,
            slot_duration_minutes: request
                .slot_duration_minutes
                .unwrap_or(state.config.booking.slot_duration_minutes as i32),
            is_active: request.is_active.unwrap_or(true),
            break_start,
            break_end,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List a provider's schedule rows
#[utoipa::path(
    get,
    path = "/api/v1/work-schedules/provider/{provider_id}",
    params(
        ("provider_id" = Uuid, Path, description = "Provider identifier")
    ),
    responses(
        (status = 200, description = "Schedule rows for the provider", body = [WorkScheduleDto]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "work-schedules"
)]
pub async fn list_work_schedules(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<Vec<WorkScheduleDto>>, ApiError> {
    let repo = WorkScheduleRepository::new(state.db.clone());
    let rows = repo.list_by_provider(provider_id).await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Aggregated weekly view of a provider's recurring hours
#[utoipa::path(
    get,
    path = "/api/v1/work-schedules/weekly-schedule/{provider_id}",
    params(
        ("provider_id" = Uuid, Path, description = "Provider identifier")
    ),
    responses(
        (status = 200, description = "Weekly schedule grouped by weekday", body = WeeklyScheduleDto),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "work-schedules"
)]
pub async fn weekly_schedule(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<WeeklyScheduleDto>, ApiError> {
    let repo = WorkScheduleRepository::new(state.db.clone());
    let rows = repo.list_by_provider(provider_id).await?;
    let settings = crate::repositories::ProviderSettingsRepository::new(state.db.clone())
        .get(provider_id)
        .await?;

    let mut days: Vec<WeekdayScheduleDto> = (0..7)
        .map(|day| WeekdayScheduleDto {
            day_of_week: day as i16,
            day_name: DAY_NAMES[day].to_string(),
            schedules: Vec::new(),
        })
        .collect();

    for row in rows {
        let index = row.day_of_week as usize;
        if index < days.len() {
            days[index].schedules.push(row.into());
        }
    }

    Ok(Json(WeeklyScheduleDto {
        provider_id,
        days,
        settings: settings.map(Into::into),
    }))
}

/// Update a schedule row
#[utoipa::path(
    put,
    path = "/api/v1/work-schedules/{id}",
    params(
        ("id" = Uuid, Path, description = "Schedule row identifier")
    ),
    request_body = UpdateWorkScheduleRequest,
    responses(
        (status = 200, description = "Schedule updated", body = WorkScheduleDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Schedule not found", body = ApiError),
        (status = 409, description = "Active schedule already exists for the weekday", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "work-schedules"
)]
pub async fn update_work_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateWorkScheduleRequest>,
) -> Result<Json<WorkScheduleDto>, ApiError> {
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

    let break_start = match request.break_start {
        None => None,
        Some(None) => Some(None),
        Some(Some(value)) => Some(Some(parse_time_field(&value, "break_start")?)),
    };
    let break_end = match request.break_end {
        None => None,
        Some(None) => Some(None),
        Some(Some(value)) => Some(Some(parse_time_field(&value, "break_end")?)),
    };

    let repo = WorkScheduleRepository::new(state.db.clone());
    let updated = repo
        .update(
            id,
            WorkScheduleChanges {
                day_of_week: request.day_of_week,
                start_time,
                end_time,
                slot_duration_minutes: request.slot_duration_minutes,
                is_active: request.is_active,
                break_start,
                break_end,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Delete a schedule row
#[utoipa::path(
    delete,
    path = "/api/v1/work-schedules/{id}",
    params(
        ("id" = Uuid, Path, description = "Schedule row identifier")
    ),
    responses(
        (status = 204, description = "Schedule deleted"),
        (status = 404, description = "Schedule not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "work-schedules"
)]
pub async fn delete_work_schedule(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let repo = WorkScheduleRepository::new(state.db.clone());
    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}
