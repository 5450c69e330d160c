//! # Appointment Repository
//!
//! Repository operations for the appointments table. Writes that could race
//! with other bookings take a per-provider advisory lock and re-check
//! conflicts inside the transaction; the partial unique index on
//! (provider_id, date_time) backstops the exact-same-start shape at the
//! database level.

use axum::http::StatusCode;
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbBackend, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::availability::conflict::find_conflict;
use crate::error::{ApiError, BookingError};
use crate::models::appointment::{ActiveModel, AppointmentStatus, Column, Entity, Model};

/// Fields accepted when booking an appointment.
#[derive(Debug, Clone)]
pub struct NewAppointment {
    pub client_id: Uuid,
    pub provider_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date_time: DateTime<Utc>,
    pub duration_minutes: i32,
}

/// Partial reschedule/edit of an appointment. `None` leaves the field as is.
#[derive(Debug, Clone, Default)]
pub struct AppointmentChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub date_time: Option<DateTime<Utc>>,
    pub duration_minutes: Option<i32>,
}

/// Filters for listing appointments.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub client_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

/// Repository for appointment database operations
pub struct AppointmentRepository {
    db: DatabaseConnection,
}

impl AppointmentRepository {
    /// Create a new AppointmentRepository with the given database connection
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert a new appointment, re-checking conflicts inside the
    /// transaction.
    ///
    /// The caller is expected to have already validated the booking against
    /// the provider's schedule and horizon; this method repeats only the
    /// race-sensitive overlap check so a concurrent booking between
    /// validation and insert still loses.
    pub async fn create(&self, new: NewAppointment) -> Result<Model, ApiError> {
        let start = new.date_time;
        let end = start + Duration::minutes(new.duration_minutes as i64);

        let txn = self.db.begin().await.map_err(|e| {
            tracing::error!("Failed to open booking transaction: {}", e);
            ApiError::from(e)
        })?;

        lock_provider(&txn, new.provider_id)
            .await
            .map_err(ApiError::from)?;

        let existing = blocking_between(&txn, new.provider_id, start, end)
            .await
            .map_err(|e| {
                tracing::error!("Failed to re-check conflicts: {}", e);
                ApiError::from(e)
            })?;

        if let Some(conflict) = find_conflict(start, end, &existing, None) {
            return Err(BookingError::ConflictingAppointment {
                conflicting_id: conflict.id,
            }
            .into());
        }

        let now = Utc::now().fixed_offset();
        let row = ActiveModel {
            id: Set(Uuid::new_v4()),
            client_id: Set(new.client_id),
            provider_id: Set(new.provider_id),
            title: Set(new.title),
            description: Set(new.description),
            date_time: Set(start.fixed_offset()),
            duration_minutes: Set(new.duration_minutes),
            status: Set(AppointmentStatus::Pending),
            created_at: Set(now),
            updated_at: Set(None),
        };

        // A unique-violation here means another transaction inserted the
        // same slot start first; From<DbErr> maps it onto
        // CONFLICTING_APPOINTMENT.
        let result = row.insert(&txn).await.map_err(ApiError::from)?;

        txn.commit().await.map_err(|e| {
            tracing::error!("Failed to commit booking: {}", e);
            ApiError::from(e)
        })?;

        tracing::info!(
            appointment_id = %result.id,
            provider_id = %result.provider_id,
            client_id = %result.client_id,
            date_time = %result.date_time,
            "Appointment booked"
        );

        Ok(result)
    }

    /// Reschedule or edit an appointment, re-checking conflicts inside the
    /// transaction when the interval changes.
    pub async fn update(&self, id: Uuid, changes: AppointmentChanges) -> Result<Model, ApiError> {
        let txn = self.db.begin().await.map_err(ApiError::from)?;

        let existing = Entity::find_by_id(id)
            .one(&txn)
            .await
            .map_err(ApiError::from)?
            .ok_or(BookingError::NotFound {
                entity: "appointment",
            })?;

        if !existing.status.blocks_time() {
            return Err(ApiError::new(
                StatusCode::CONFLICT,
                "APPOINTMENT_NOT_EDITABLE",
                "Cancelled or completed appointments cannot be edited",
            ));
        }

        let date_time = changes
            .date_time
            .unwrap_or_else(|| existing.date_time.with_timezone(&Utc));
        let duration_minutes = changes.duration_minutes.unwrap_or(existing.duration_minutes);
        let interval_changed = changes.date_time.is_some() || changes.duration_minutes.is_some();

        if interval_changed {
            lock_provider(&txn, existing.provider_id)
                .await
                .map_err(ApiError::from)?;

            let end = date_time + Duration::minutes(duration_minutes as i64);
            let others = blocking_between(&txn, existing.provider_id, date_time, end)
                .await
                .map_err(ApiError::from)?;

            if let Some(conflict) = find_conflict(date_time, end, &others, Some(id)) {
                return Err(BookingError::ConflictingAppointment {
                    conflicting_id: conflict.id,
                }
                .into());
            }
        }

        let mut row: ActiveModel = existing.into();
        if let Some(title) = changes.title {
            row.title = Set(title);
        }
        if let Some(description) = changes.description {
            row.description = Set(description);
        }
        row.date_time = Set(date_time.fixed_offset());
        row.duration_minutes = Set(duration_minutes);
        row.updated_at = Set(Some(Utc::now().fixed_offset()));

        let result = row.update(&txn).await.map_err(ApiError::from)?;
        txn.commit().await.map_err(ApiError::from)?;

        Ok(result)
    }

    /// Move an appointment through its lifecycle.
    pub async fn update_status(
        &self,
        id: Uuid,
        target: AppointmentStatus,
    ) -> Result<Model, ApiError> {
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or(BookingError::NotFound {
                entity: "appointment",
            })?;

        if !existing.status.can_transition_to(target) {
            return Err(BookingError::InvalidTransition {
                from: existing.status,
                to: target,
            }
            .into());
        }

        let from = existing.status;
        let mut row: ActiveModel = existing.into();
        row.status = Set(target);
        row.updated_at = Set(Some(Utc::now().fixed_offset()));

        let result = row.update(&self.db).await.map_err(|e| {
            tracing::error!("Failed to update appointment status: {}", e);
            ApiError::from(e)
        })?;

        tracing::info!(
            appointment_id = %result.id,
            from = %from,
            to = %result.status,
            "Appointment status changed"
        );

        Ok(result)
    }

    /// Find an appointment by id.
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Model>, ApiError> {
        Entity::find_by_id(id).one(&self.db).await.map_err(|e| {
            tracing::error!("Failed to find appointment: {}", e);
            ApiError::from(e)
        })
    }

    /// List appointments with optional filters, ordered by start time.
    pub async fn list(&self, filter: AppointmentFilter) -> Result<Vec<Model>, ApiError> {
        let mut query = Entity::find().order_by_asc(Column::DateTime);

        if let Some(client_id) = filter.client_id {
            query = query.filter(Column::ClientId.eq(client_id));
        }
        if let Some(provider_id) = filter.provider_id {
            query = query.filter(Column::ProviderId.eq(provider_id));
        }
        if let Some(status) = filter.status {
            query = query.filter(Column::Status.eq(status));
        }
        if let Some(limit) = filter.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = filter.offset {
            query = query.offset(offset);
        }

        query.all(&self.db).await.map_err(|e| {
            tracing::error!("Failed to list appointments: {}", e);
            ApiError::from(e)
        })
    }

    /// Blocking appointments that could overlap `[from, to)` for a provider.
    pub async fn list_blocking_between(
        &self,
        provider_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Model>, ApiError> {
        blocking_between(&self.db, provider_id, from, to)
            .await
            .map_err(|e| {
                tracing::error!("Failed to load blocking appointments: {}", e);
                ApiError::from(e)
            })
    }
}

/// Query blocking (pending/confirmed) appointments whose interval could
/// overlap `[from, to)`.
///
/// Rows are selected by start time widened by the maximum appointment span;
/// the precise half-open overlap test happens in Rust against the row's
/// duration.
async fn blocking_between<C: ConnectionTrait>(
    conn: &C,
    provider_id: Uuid,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<Model>, sea_orm::DbErr> {
    // Appointments are capped at 24 hours by validation, so widening the
    // window by that span catches every row whose interval could reach into
    // [from, to).
    let lower = (from - Duration::hours(24)).fixed_offset();
    let upper = to.fixed_offset();

    Entity::find()
        .filter(Column::ProviderId.eq(provider_id))
        .filter(Column::Status.is_in([AppointmentStatus::Pending, AppointmentStatus::Confirmed]))
        .filter(Column::DateTime.gte(lower))
        .filter(Column::DateTime.lt(upper))
        .order_by_asc(Column::DateTime)
        .all(conn)
        .await
}

/// Serialize booking writes for one provider.
///
/// Under READ COMMITTED, two concurrent transactions can each miss the
/// other's uncommitted row in the overlap re-check and both commit, and the
/// unique index only catches identical start times. A transaction-scoped
/// advisory lock keyed on the provider makes the check-then-insert section
/// mutually exclusive; Postgres releases it at commit or rollback. SQLite's
/// single-writer transaction already serializes writers, so no lock is
/// needed there.
async fn lock_provider<C: ConnectionTrait>(
    conn: &C,
    provider_id: Uuid,
) -> Result<(), sea_orm::DbErr> {
    if conn.get_database_backend() == DbBackend::Postgres {
        conn.execute(Statement::from_sql_and_values(
            DbBackend::Postgres,
            "SELECT pg_advisory_xact_lock($1)",
            [provider_lock_key(provider_id).into()],
        ))
        .await?;
    }

    Ok(())
}

/// Stable 64-bit advisory-lock key for a provider, folding the full uuid so
/// both halves contribute.
fn provider_lock_key(provider_id: Uuid) -> i64 {
    let bytes = provider_id.as_bytes();
    let mut folded = [0u8; 8];
    for (i, byte) in bytes.iter().enumerate() {
        folded[i % 8] ^= byte;
    }

    i64::from_be_bytes(folded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_lock_key_is_stable() {
        let provider_id = Uuid::new_v4();
        assert_eq!(provider_lock_key(provider_id), provider_lock_key(provider_id));
    }

    #[test]
    fn test_provider_lock_key_uses_the_whole_uuid() {
        // Two uuids sharing the first eight bytes must still get distinct
        // keys, otherwise unrelated providers would contend on one lock.
        let a = Uuid::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, 0, 0, 0, 1]);
        let b = Uuid::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert_ne!(provider_lock_key(a), provider_lock_key(b));
    }
}
