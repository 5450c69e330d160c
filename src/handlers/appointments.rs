//! # Appointment API Handlers
//!
//! Handlers for booking, listing, rescheduling, and moving appointments
//! through their lifecycle. Booking and rescheduling validate against the
//! availability engine before touching the table.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use super::double_option;
use crate::availability::AvailabilityEngine;
use crate::error::{ApiError, BookingError, validation_error};
use crate::models::appointment::{self, AppointmentStatus};
use crate::repositories::appointment::{AppointmentChanges, AppointmentFilter, NewAppointment};
use crate::repositories::AppointmentRepository;
use crate::server::AppState;

/// Request payload for booking an appointment
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    /// Client booking the appointment
    pub client_id: Uuid,
    /// Provider the appointment is with
    pub provider_id: Uuid,
    /// Short title shown in listings
    #[schema(example = "Initial consultation")]
    pub title: String,
    /// Longer free-text description
    pub description: Option<String>,
    /// Requested start instant (RFC 3339, UTC)
    #[schema(example = "2025-07-21T15:00:00Z")]
    pub date_time: DateTime<Utc>,
    /// Length in minutes; defaults to the provider's slot duration
    #[schema(example = 30)]
    pub duration_minutes: Option<i32>,
}

/// Request payload for editing an appointment; absent fields are untouched
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateAppointmentRequest {
    pub title: Option<String>,
    /// Description; send `null` to clear it
    #[serde(default, deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[schema(example = "2025-07-22T16:00:00Z")]
    pub date_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
}

/// Filters accepted when listing appointments
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListAppointmentsQuery {
    pub client_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Appointment as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct AppointmentDto {
    pub id: Uuid,
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "2025-07-21T15:00:00Z")]
    pub date_time: String,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<appointment::Model> for AppointmentDto {
    fn from(model: appointment::Model) -> Self {
        Self {
            id: model.id,
            client_id: model.client_id,
            provider_id: model.provider_id,
            title: model.title,
            description: model.description,
            date_time: model.date_time.to_rfc3339(),
            duration_minutes: model.duration_minutes,
            status: model.status,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

fn validate_title(title: &str) -> Result<(), ApiError> {
    if title.trim().is_empty() {
        return Err(validation_error(
            "Invalid appointment",
            json!({ "title": "must not be empty" }),
        ));
    }
    if title.len() > 255 {
        return Err(validation_error(
            "Invalid appointment",
            json!({ "title": "must not exceed 255 characters" }),
        ));
    }
    Ok(())
}

/// Book an appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment booked", body = AppointmentDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 409, description = "Interval conflicts with an existing appointment", body = ApiError),
        (status = 422, description = "Interval is outside working hours or the booking horizon", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn create_appointment(
    State(state): State<AppState>,
    Json(request): Json<CreateAppointmentRequest>,
) -> Result<(StatusCode, Json<AppointmentDto>), ApiError> {
    validate_title(&request.title)?;

    let engine = AvailabilityEngine::new(state.db.clone(), state.config.booking.clone());
    let duration_minutes = match request.duration_minutes {
        Some(minutes) => minutes,
        None => {
            engine
                .effective_policy(request.provider_id)
                .await?
                .default_slot_duration as i32
        }
    };

    engine
        .validate_booking(
            request.provider_id,
            request.date_time,
            duration_minutes,
            Utc::now(),
            None,
        )
        .await?;

    let repo = AppointmentRepository::new(state.db.clone());
    let created = repo
        .create(NewAppointment {
            client_id: request.client_id,
            provider_id: request.provider_id,
            title: request.title.trim().to_string(),
            description: request.description,
            date_time: request.date_time,
            duration_minutes,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// List appointments
#[utoipa::path(
    get,
    path = "/api/v1/appointments",
    params(ListAppointmentsQuery),
    responses(
        (status = 200, description = "Appointments matching the filters", body = [AppointmentDto]),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn list_appointments(
    State(state): State<AppState>,
    Query(query): Query<ListAppointmentsQuery>,
) -> Result<Json<Vec<AppointmentDto>>, ApiError> {
    let repo = AppointmentRepository::new(state.db.clone());
    let rows = repo
        .list(AppointmentFilter {
            client_id: query.client_id,
            provider_id: query.provider_id,
            status: query.status,
            limit: query.limit,
            offset: query.offset,
        })
        .await?;

    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// Get one appointment
#[utoipa::path(
    get,
    path = "/api/v1/appointments/{id}",
    params(
        ("id" = Uuid, Path, description = "Appointment identifier")
    ),
    responses(
        (status = 200, description = "The appointment", body = AppointmentDto),
        (status = 404, description = "Appointment not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn get_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDto>, ApiError> {
    let repo = AppointmentRepository::new(state.db.clone());
    let appointment = repo.find_by_id(id).await?.ok_or(BookingError::NotFound {
        entity: "appointment",
    })?;

    Ok(Json(appointment.into()))
}

/// Edit or reschedule an appointment
#[utoipa::path(
    put,
    path = "/api/v1/appointments/{id}",
    params(
        ("id" = Uuid, Path, description = "Appointment identifier")
    ),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Appointment updated", body = AppointmentDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 404, description = "Appointment not found", body = ApiError),
        (status = 409, description = "Interval conflicts with an existing appointment", body = ApiError),
        (status = 422, description = "Interval is outside working hours or the booking horizon", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn update_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentDto>, ApiError> {
    if let Some(title) = &request.title {
        validate_title(title)?;
    }

    let repo = AppointmentRepository::new(state.db.clone());
    let existing = repo.find_by_id(id).await?.ok_or(BookingError::NotFound {
        entity: "appointment",
    })?;

    let interval_changed = request.date_time.is_some() || request.duration_minutes.is_some();
    if interval_changed {
        let date_time = request
            .date_time
            .unwrap_or_else(|| existing.date_time.with_timezone(&Utc));
        let duration_minutes = request.duration_minutes.unwrap_or(existing.duration_minutes);

        let engine = AvailabilityEngine::new(state.db.clone(), state.config.booking.clone());
        engine
            .validate_booking(
                existing.provider_id,
                date_time,
                duration_minutes,
                Utc::now(),
                Some(id),
            )
            .await?;
    }

    let updated = repo
        .update(
            id,
            AppointmentChanges {
                title: request.title,
                description: request.description,
                date_time: request.date_time,
                duration_minutes: request.duration_minutes,
            },
        )
        .await?;

    Ok(Json(updated.into()))
}

/// Confirm a pending appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/confirm",
    params(
        ("id" = Uuid, Path, description = "Appointment identifier")
    ),
    responses(
        (status = 200, description = "Appointment confirmed", body = AppointmentDto),
        (status = 404, description = "Appointment not found", body = ApiError),
        (status = 409, description = "Transition not allowed from the current status", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn confirm_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDto>, ApiError> {
    transition(state, id, AppointmentStatus::Confirmed).await
}

/// Mark a confirmed appointment as completed
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Appointment identifier")
    ),
    responses(
        (status = 200, description = "Appointment completed", body = AppointmentDto),
        (status = 404, description = "Appointment not found", body = ApiError),
        (status = 409, description = "Transition not allowed from the current status", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn complete_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDto>, ApiError> {
    transition(state, id, AppointmentStatus::Completed).await
}

/// Cancel an appointment
#[utoipa::path(
    post,
    path = "/api/v1/appointments/{id}/cancel",
    params(
        ("id" = Uuid, Path, description = "Appointment identifier")
    ),
    responses(
        (status = 200, description = "Appointment cancelled", body = AppointmentDto),
        (status = 404, description = "Appointment not found", body = ApiError),
        (status = 409, description = "Transition not allowed from the current status", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "appointments"
)]
pub async fn cancel_appointment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<AppointmentDto>, ApiError> {
    transition(state, id, AppointmentStatus::Cancelled).await
}

async fn transition(
    state: AppState,
    id: Uuid,
    target: AppointmentStatus,
) -> Result<Json<AppointmentDto>, ApiError> {
    let repo = AppointmentRepository::new(state.db.clone());
    let updated = repo.update_status(id, target).await?;

    Ok(Json(updated.into()))
}
