//! Adds a partial unique index preventing two blocking appointments from
//! starting at the same instant for one provider.
//!
//! The application re-validates overlap inside the creation transaction;
//! this index is the database-level backstop for the common double-booking
//! shape (two concurrent requests for the same slot start). Only rows whose
//! status still blocks time (pending, confirmed) participate.

use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Statement;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        manager
            .get_connection()
            .execute(Statement::from_string(
                backend,
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_appointments_provider_slot_guard \
                 ON appointments (provider_id, date_time) \
                 WHERE status IN ('pending','confirmed')"
                    .to_string(),
            ))
            .await
            .map(|_| ())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute(Statement::from_string(
                manager.get_database_backend(),
                "DROP INDEX IF EXISTS idx_appointments_provider_slot_guard",
            ))
            .await
            .map(|_| ())
    }
}
