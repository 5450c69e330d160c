//! # ProviderSettings Repository
//!
//! Repository operations for the provider_settings table. Settings are
//! upserted: a provider has at most one row, and saving again replaces the
//! stored policy.

use axum::http::StatusCode;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::models::provider_settings::{ActiveModel, Column, Entity, Model};

/// Booking policy fields accepted on upsert.
#[derive(Debug, Clone)]
pub struct SettingsUpsert {
    pub default_slot_duration: i32,
    pub advance_booking_days: i32,
    pub same_day_booking: bool,
    pub timezone: String,
}

/// Repository for per-provider booking policy
pub struct ProviderSettingsRepository {
    db: DatabaseConnection,
}

impl ProviderSettingsRepository {
    /// Create a new ProviderSettingsRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// The stored policy for a provider, if one exists.
    pub async fn get(&self, provider_id: Uuid) -> Result<Option<Model>, ApiError> {
        Entity::find()
            .filter(Column::ProviderId.eq(provider_id))
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load provider settings: {}", e);
                ApiError::from(e)
            })
    }

    /// The stored policy for a provider, or 404.
    pub async fn get_required(&self, provider_id: Uuid) -> Result<Model, ApiError> {
        self.get(provider_id).await?.ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Provider settings not found",
            )
        })
    }

    /// Create or replace a provider's policy.
    pub async fn upsert(
        &self,
        provider_id: Uuid,
        settings: SettingsUpsert,
    ) -> Result<Model, ApiError> {
        validate_settings(&settings)?;

        let now = Utc::now().fixed_offset();

        let result = match self.get(provider_id).await? {
            Some(existing) => {
                let mut row: ActiveModel = existing.into();
                row.default_slot_duration = Set(settings.default_slot_duration);
                row.advance_booking_days = Set(settings.advance_booking_days);
                row.same_day_booking = Set(settings.same_day_booking);
                row.timezone = Set(settings.timezone);
                row.updated_at = Set(now);
                row.update(&self.db).await
            }
            None => {
                let row = ActiveModel {
                    id: Set(Uuid::new_v4()),
                    provider_id: Set(provider_id),
                    default_slot_duration: Set(settings.default_slot_duration),
                    advance_booking_days: Set(settings.advance_booking_days),
                    same_day_booking: Set(settings.same_day_booking),
                    timezone: Set(settings.timezone),
                    created_at: Set(now),
                    updated_at: Set(now),
                };
                row.insert(&self.db).await
            }
        }
        .map_err(|e| {
            tracing::error!("Failed to save provider settings: {}", e);
            ApiError::from(e)
        })?;

        tracing::info!(
            provider_id = %result.provider_id,
            timezone = %result.timezone,
            "Provider settings saved"
        );

        Ok(result)
    }
}

fn validate_settings(settings: &SettingsUpsert) -> Result<(), ApiError> {
    if settings.default_slot_duration <= 0 || settings.default_slot_duration > 24 * 60 {
        return Err(validation_error(
            "Invalid provider settings",
            json!({ "default_slot_duration": "must be between 1 and 1440" }),
        ));
    }

    if settings.advance_booking_days < 0 {
        return Err(validation_error(
            "Invalid provider settings",
            json!({ "advance_booking_days": "must not be negative" }),
        ));
    }

    if settings.timezone.parse::<chrono_tz::Tz>().is_err() {
        return Err(validation_error(
            "Invalid provider settings",
            json!({ "timezone": "must be a valid IANA timezone name" }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> SettingsUpsert {
        SettingsUpsert {
            default_slot_duration: 30,
            advance_booking_days: 30,
            same_day_booking: true,
            timezone: "America/Mexico_City".to_string(),
        }
    }

    #[test]
    fn test_valid_settings_pass() {
        assert!(validate_settings(&settings()).is_ok());
    }

    #[test]
    fn test_bad_timezone_rejected() {
        let mut s = settings();
        s.timezone = "Central Time".to_string();
        assert!(validate_settings(&s).is_err());
    }

    #[test]
    fn test_bounds() {
        let mut s = settings();
        s.default_slot_duration = 0;
        assert!(validate_settings(&s).is_err());

        let mut s = settings();
        s.advance_booking_days = -1;
        assert!(validate_settings(&s).is_err());

        let mut s = settings();
        s.advance_booking_days = 0; // same-day only, still legal
        assert!(validate_settings(&s).is_ok());
    }
}
