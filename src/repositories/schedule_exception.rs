//! # ScheduleException Repository
//!
//! Repository operations for the schedule_exceptions table. The table's
//! unique index on (provider_id, date) guarantees at most one exception per
//! provider and day; a duplicate insert surfaces as a 409.

use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, is_unique_violation, validation_error};
use crate::models::schedule_exception::{ActiveModel, Column, Entity, ExceptionType, Model};

/// Fields accepted when creating a schedule exception.
#[derive(Debug, Clone)]
pub struct NewScheduleException {
    pub provider_id: Uuid,
    pub date: NaiveDate,
    pub exception_type: ExceptionType,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub slot_duration_minutes: Option<i32>,
    pub reason: Option<String>,
}

/// Partial update to an exception. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct ScheduleExceptionChanges {
    pub exception_type: Option<ExceptionType>,
    pub start_time: Option<Option<NaiveTime>>,
    pub end_time: Option<Option<NaiveTime>>,
    pub slot_duration_minutes: Option<Option<i32>>,
    pub reason: Option<Option<String>>,
}

/// Repository for date-specific schedule overrides
pub struct ScheduleExceptionRepository {
    db: DatabaseConnection,
}

impl ScheduleExceptionRepository {
    /// Create a new ScheduleExceptionRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create an exception; rejects a second exception for the same date.
    pub async fn create(&self, new: NewScheduleException) -> Result<Model, ApiError> {
        validate_override(
            new.exception_type,
            new.start_time,
            new.end_time,
            new.slot_duration_minutes,
        )?;

        let now = Utc::now().fixed_offset();
        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_id: Set(new.provider_id),
            date: Set(new.date),
            exception_type: Set(new.exception_type),
            start_time: Set(new.start_time),
            end_time: Set(new.end_time),
            slot_duration_minutes: Set(new.slot_duration_minutes),
            reason: Set(new.reason),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = row.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                return ApiError::new(
                    StatusCode::CONFLICT,
                    "DUPLICATE_EXCEPTION",
                    "An exception already exists for this date",
                )
                .with_details(json!({ "date": new.date }));
            }
            tracing::error!("Failed to create schedule exception: {}", e);
            ApiError::from(e)
        })?;

        tracing::info!(
            provider_id = %result.provider_id,
            date = %result.date,
            exception_type = %result.exception_type,
            "Schedule exception created"
        );

        Ok(result)
    }

    /// The exception in effect for one provider and date, if any.
    pub async fn find_for_date(
        &self,
        provider_id: Uuid,
        date: NaiveDate,
    ) -> Result<Option<Model>, ApiError> {
        Entity::find()
            .filter(Column::ProviderId.eq(provider_id))
            .filter(Column::Date.eq(date))
            .one(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to find schedule exception: {}", e);
                ApiError::from(e)
            })
    }

    /// List a provider's exceptions, optionally bounded to a date range.
    pub async fn list_by_provider(
        &self,
        provider_id: Uuid,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<Model>, ApiError> {
        let mut query = Entity::find()
            .filter(Column::ProviderId.eq(provider_id))
            .order_by_asc(Column::Date);

        if let Some(start) = start_date {
            query = query.filter(Column::Date.gte(start));
        }
        if let Some(end) = end_date {
            query = query.filter(Column::Date.lte(end));
        }

        query.all(&self.db).await.map_err(|e| {
            tracing::error!("Failed to list schedule exceptions: {}", e);
            ApiError::from(e)
        })
    }

    /// Apply a partial update, re-validating the merged override.
    pub async fn update(
        &self,
        id: Uuid,
        changes: ScheduleExceptionChanges,
    ) -> Result<Model, ApiError> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Schedule exception not found",
            )
        })?;

        let exception_type = changes.exception_type.unwrap_or(existing.exception_type);
        let start_time = changes.start_time.unwrap_or(existing.start_time);
        let end_time = changes.end_time.unwrap_or(existing.end_time);
        let slot_duration = changes
            .slot_duration_minutes
            .unwrap_or(existing.slot_duration_minutes);
        let reason = changes.reason.unwrap_or_else(|| existing.reason.clone());

        validate_override(exception_type, start_time, end_time, slot_duration)?;

        let mut row: ActiveModel = existing.into();
        row.exception_type = Set(exception_type);
        row.start_time = Set(start_time);
        row.end_time = Set(end_time);
        row.slot_duration_minutes = Set(slot_duration);
        row.reason = Set(reason);
        row.updated_at = Set(Utc::now().fixed_offset());

        let result = row.update(&self.db).await.map_err(|e| {
            tracing::error!("Failed to update schedule exception: {}", e);
            ApiError::from(e)
        })?;

        Ok(result)
    }

    /// Find an exception by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, ApiError> {
        Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to find schedule exception: {}", e);
            ApiError::from(e)
        })
    }

    /// Delete an exception.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = Entity::delete_by_id(id).exec(&self.db).await.map_err(|e| {
            tracing::error!("Failed to delete schedule exception: {}", e);
            ApiError::from(e)
        })?;

        if result.rows_affected == 0 {
            return Err(ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Schedule exception not found",
            ));
        }

        Ok(())
    }
}

fn validate_override(
    exception_type: ExceptionType,
    start_time: Option<NaiveTime>,
    end_time: Option<NaiveTime>,
    slot_duration_minutes: Option<i32>,
) -> Result<(), ApiError> {
    if let (Some(start), Some(end)) = (start_time, end_time) {
        if start >= end {
            return Err(validation_error(
                "Invalid schedule exception",
                json!({ "start_time": "must be before end_time" }),
            ));
        }
    }

    if let Some(slot) = slot_duration_minutes {
        if slot <= 0 || slot > 24 * 60 {
            return Err(validation_error(
                "Invalid schedule exception",
                json!({ "slot_duration_minutes": "must be between 1 and 1440" }),
            ));
        }
    }

    if exception_type.makes_day_unavailable()
        && (start_time.is_some() || end_time.is_some() || slot_duration_minutes.is_some())
    {
        return Err(validation_error(
            "Invalid schedule exception",
            json!({ "exception_type": "override hours are only valid for custom_hours" }),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn test_custom_hours_may_be_partial() {
        assert!(validate_override(ExceptionType::CustomHours, None, Some(time(13, 0)), None).is_ok());
        assert!(validate_override(ExceptionType::CustomHours, None, None, Some(20)).is_ok());
    }

    #[test]
    fn test_inverted_override_hours_rejected() {
        assert!(
            validate_override(
                ExceptionType::CustomHours,
                Some(time(14, 0)),
                Some(time(10, 0)),
                None,
            )
            .is_err()
        );
    }

    #[test]
    fn test_whole_day_types_reject_override_hours() {
        assert!(validate_override(ExceptionType::DayOff, Some(time(9, 0)), None, None).is_err());
        assert!(validate_override(ExceptionType::Vacation, None, None, Some(30)).is_err());
        assert!(validate_override(ExceptionType::Holiday, None, None, None).is_ok());
    }
}
