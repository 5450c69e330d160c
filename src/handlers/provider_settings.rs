//! # Provider Settings API Handlers
//!
//! Handlers for reading and saving a provider's booking policy.

use axum::{
    extract::{Path, State},
    response::Json,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::provider_settings;
use crate::repositories::provider_settings::SettingsUpsert;
use crate::repositories::ProviderSettingsRepository;
use crate::server::AppState;

/// Request payload for saving a provider's booking policy
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveProviderSettingsRequest {
    /// Default slot length in minutes
    #[schema(example = 30)]
    pub default_slot_duration: i32,
    /// How many days ahead of today bookings are accepted
    #[schema(example = 30)]
    pub advance_booking_days: i32,
    /// Whether bookings for today are accepted
    pub same_day_booking: bool,
    /// IANA timezone name the provider operates in
    #[schema(example = "America/Mexico_City")]
    pub timezone: String,
}

/// Provider booking policy as returned by the API
#[derive(Debug, Serialize, ToSchema)]
pub struct ProviderSettingsDto {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub default_slot_duration: i32,
    pub advance_booking_days: i32,
    pub same_day_booking: bool,
    #[schema(example = "America/Mexico_City")]
    pub timezone: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<provider_settings::Model> for ProviderSettingsDto {
    fn from(model: provider_settings::Model) -> Self {
        Self {
            id: model.id,
            provider_id: model.provider_id,
            default_slot_duration: model.default_slot_duration,
            advance_booking_days: model.advance_booking_days,
            same_day_booking: model.same_day_booking,
            timezone: model.timezone,
            created_at: model.created_at.to_rfc3339(),
            updated_at: model.updated_at.to_rfc3339(),
        }
    }
}

/// Get a provider's booking policy
#[utoipa::path(
    get,
    path = "/api/v1/provider-settings/{provider_id}",
    params(
        ("provider_id" = Uuid, Path, description = "Provider identifier")
    ),
    responses(
        (status = 200, description = "Provider settings", body = ProviderSettingsDto),
        (status = 404, description = "Provider settings not found", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "provider-settings"
)]
pub async fn get_provider_settings(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
) -> Result<Json<ProviderSettingsDto>, ApiError> {
    let repo = ProviderSettingsRepository::new(state.db.clone());
    let settings = repo.get_required(provider_id).await?;

    Ok(Json(settings.into()))
}

/// Create or replace a provider's booking policy
#[utoipa::path(
    put,
    path = "/api/v1/provider-settings/{provider_id}",
    params(
        ("provider_id" = Uuid, Path, description = "Provider identifier")
    ),
    request_body = SaveProviderSettingsRequest,
    responses(
        (status = 200, description = "Settings saved", body = ProviderSettingsDto),
        (status = 400, description = "Validation failed", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    ),
    tag = "provider-settings"
)]
pub async fn save_provider_settings(
    State(state): State<AppState>,
    Path(provider_id): Path<Uuid>,
    Json(request): Json<SaveProviderSettingsRequest>,
) -> Result<Json<ProviderSettingsDto>, ApiError> {
    let repo = ProviderSettingsRepository::new(state.db.clone());
    let saved = repo
        .upsert(
            provider_id,
            SettingsUpsert {
                default_slot_duration: request.default_slot_duration,
                advance_booking_days: request.advance_booking_days,
                same_day_booking: request.same_day_booking,
                timezone: request.timezone,
            },
        )
        .await?;

    Ok(Json(saved.into()))
}
