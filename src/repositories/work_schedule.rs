//! # WorkSchedule Repository
//!
//! Repository operations for the work_schedules table. Invariants are
//! enforced at write time: the working window must be non-empty, a break
//! window must sit inside it, and a provider gets at most one active row per
//! weekday.

use axum::http::StatusCode;
use chrono::{NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde_json::json;
use uuid::Uuid;

use crate::error::{ApiError, validation_error};
use crate::models::work_schedule::{ActiveModel, Column, Entity, Model};

/// Fields accepted when creating a recurring schedule row.
#[derive(Debug, Clone)]
pub struct NewWorkSchedule {
    pub provider_id: Uuid,
    pub day_of_week: i16,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_duration_minutes: i32,
    pub is_active: bool,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
}

/// Partial update to a schedule row. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct WorkScheduleChanges {
    pub day_of_week: Option<i16>,
    pub start_time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub slot_duration_minutes: Option<i32>,
    pub is_active: Option<bool>,
    pub break_start: Option<Option<NaiveTime>>,
    pub break_end: Option<Option<NaiveTime>>,
}

/// Repository for recurring weekly schedule rows
pub struct WorkScheduleRepository {
    db: DatabaseConnection,
}

impl WorkScheduleRepository {
    /// Create a new WorkScheduleRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Create a recurring schedule row after validating its window.
    pub async fn create(&self, new: NewWorkSchedule) -> Result<Model, ApiError> {
        validate_window(
            new.day_of_week,
            new.start_time,
            new.end_time,
            new.slot_duration_minutes,
            new.break_start,
            new.break_end,
        )?;

        if new.is_active {
            self.ensure_no_active_row(new.provider_id, new.day_of_week, None)
                .await?;
        }

        let now = Utc::now().fixed_offset();
        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            provider_id: Set(new.provider_id),
            day_of_week: Set(new.day_of_week),
            start_time: Set(new.start_time),
            end_time: Set(new.end_time),
            slot_duration_minutes: Set(new.slot_duration_minutes),
            is_active: Set(new.is_active),
            break_start: Set(new.break_start),
            break_end: Set(new.break_end),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let result = row.insert(&self.db).await.map_err(|e| {
            tracing::error!("Failed to create work schedule: {}", e);
            ApiError::from(e)
        })?;

        tracing::info!(
            provider_id = %result.provider_id,
            day_of_week = result.day_of_week,
            schedule_id = %result.id,
            "Work schedule created"
        );

        Ok(result)
    }

    /// Apply a partial update, re-validating the merged row.
    pub async fn update(&self, id: Uuid, changes: WorkScheduleChanges) -> Result<Model, ApiError> {
        let existing = self.find_by_id(id).await?.ok_or_else(|| {
            ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", "Work schedule not found")
        })?;

        let day_of_week = changes.day_of_week.unwrap_or(existing.day_of_week);
        let start_time = changes.start_time.unwrap_or(existing.start_time);
        let end_time = changes.end_time.unwrap_or(existing.end_time);
        let slot_duration = changes
            .slot_duration_minutes
            .unwrap_or(existing.slot_duration_minutes);
        let is_active = changes.is_active.unwrap_or(existing.is_active);
        let break_start = changes.break_start.unwrap_or(existing.break_start);
        let break_end = changes.break_end.unwrap_or(existing.break_end);

        validate_window(
            day_of_week,
            start_time,
            end_time,
            slot_duration,
            break_start,
            break_end,
        )?;

        if is_active {
            self.ensure_no_active_row(existing.provider_id, day_of_week, Some(id))
                .await?;
        }

        let mut row: ActiveModel = existing.into();
        row.day_of_week = Set(day_of_week);
        row.start_time = Set(start_time);
        row.end_time = Set(end_time);
        row.slot_duration_minutes = Set(slot_duration);
        row.is_active = Set(is_active);
        row.break_start = Set(break_start);
        row.break_end = Set(break_end);
        row.updated_at = Set(Utc::now().fixed_offset());

        let result = row.update(&self.db).await.map_err(|e| {
            tracing::error!("Failed to update work schedule: {}", e);
            ApiError::from(e)
        })?;

        Ok(result)
    }

    /// Find a schedule row by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, ApiError> {
        Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to find work schedule: {}", e);
            ApiError::from(e)
        })
    }

    /// List all schedule rows for a provider, ordered by weekday.
    pub async fn list_by_provider(&self, provider_id: Uuid) -> Result<Vec<Model>, ApiError> {
        Entity::find()
            .filter(Column::ProviderId.eq(provider_id))
            .order_by_asc(Column::DayOfWeek)
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to list work schedules: {}", e);
                ApiError::from(e)
            })
    }

    /// Active rows for one provider and weekday.
    pub async fn find_active_for_weekday(
        &self,
        provider_id: Uuid,
        day_of_week: i16,
    ) -> Result<Vec<Model>, ApiError> {
        Entity::find()
            .filter(Column::ProviderId.eq(provider_id))
            .filter(Column::DayOfWeek.eq(day_of_week))
            .filter(Column::IsActive.eq(true))
            .order_by_asc(Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load weekday schedule: {}", e);
                ApiError::from(e)
            })
    }

    /// Delete a schedule row.
    pub async fn delete(&self, id: Uuid) -> Result<(), ApiError> {
        let result = Entity::delete_by_id(id).exec(&self.db).await.map_err(|e| {
            tracing::error!("Failed to delete work schedule: {}", e);
            ApiError::from(e)
        })?;

        if result.rows_affected == 0 {
            return Err(ApiError::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                "Work schedule not found",
            ));
        }

        Ok(())
    }

    async fn ensure_no_active_row(
        &self,
        provider_id: Uuid,
        day_of_week: i16,
        exclude: Option<Uuid>,
    ) -> Result<(), ApiError> {
        let mut query = Entity::find()
            .filter(Column::ProviderId.eq(provider_id))
            .filter(Column::DayOfWeek.eq(day_of_week))
            .filter(Column::IsActive.eq(true));

        if let Some(id) = exclude {
            query = query.filter(Column::Id.ne(id));
        }

        let existing = query.one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to check for duplicate schedule: {}", e);
            ApiError::from(e)
        })?;

        match existing {
            Some(row) => Err(ApiError::new(
                StatusCode::CONFLICT,
                "DUPLICATE_SCHEDULE",
                "An active schedule already exists for this weekday",
            )
            .with_details(json!({ "existing_schedule_id": row.id }))),
            None => Ok(()),
        }
    }
}

fn validate_window(
    day_of_week: i16,
    start_time: NaiveTime,
    end_time: NaiveTime,
    slot_duration_minutes: i32,
    break_start: Option<NaiveTime>,
    break_end: Option<NaiveTime>,
) -> Result<(), ApiError> {
    if !(0..=6).contains(&day_of_week) {
        return Err(validation_error(
            "Invalid work schedule",
            json!({ "day_of_week": "must be between 0 (Sunday) and 6 (Saturday)" }),
        ));
    }

    if start_time >= end_time {
        return Err(validation_error(
            "Invalid work schedule",
            json!({ "start_time": "must be before end_time" }),
        ));
    }

    if slot_duration_minutes <= 0 || slot_duration_minutes > 24 * 60 {
        return Err(validation_error(
            "Invalid work schedule",
            json!({ "slot_duration_minutes": "must be between 1 and 1440" }),
        ));
    }

    match (break_start, break_end) {
        (None, None) => {}
        (Some(bs), Some(be)) => {
            if bs >= be {
                return Err(validation_error(
                    "Invalid work schedule",
                    json!({ "break_start": "must be before break_end" }),
                ));
            }
            if bs < start_time || be > end_time {
                return Err(validation_error(
                    "Invalid work schedule",
                    json!({ "break_start": "break window must lie within working hours" }),
                ));
            }
        }
        _ => {
            return Err(validation_error(
                "Invalid work schedule",
                json!({ "break_start": "break_start and break_end must be set together" }),
            ));
        }
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
    fn test_validate_window_accepts_plain_day() {
        assert!(validate_window(1, time(9, 0), time(17, 0), 30, None, None).is_ok());
    }

    #[test]
    fn test_validate_window_rejects_inverted_hours() {
        let err = validate_window(1, time(17, 0), time(9, 0), 30, None, None).unwrap_err();
        assert_eq!(err.code, Box::from("VALIDATION_FAILED"));
    }

    #[test]
    fn test_validate_window_rejects_weekday_out_of_range() {
        assert!(validate_window(7, time(9, 0), time(17, 0), 30, None, None).is_err());
        assert!(validate_window(-1, time(9, 0), time(17, 0), 30, None, None).is_err());
    }

    #[test]
    fn test_validate_window_break_containment() {
        // break outside working hours
        assert!(
            validate_window(
                1,
                time(9, 0),
                time(17, 0),
                30,
                Some(time(8, 0)),
                Some(time(9, 30)),
            )
            .is_err()
        );

        // half-specified break
        assert!(validate_window(1, time(9, 0), time(17, 0), 30, Some(time(12, 0)), None).is_err());

        // well-formed break
        assert!(
            validate_window(
                1,
                time(9, 0),
                time(17, 0),
                30,
                Some(time(12, 0)),
                Some(time(13, 0)),
            )
            .is_ok()
        );
    }
}
