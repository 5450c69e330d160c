//! Migration to create the work_schedules table.
//!
//! Each row is one provider's recurring availability window for a single
//! weekday, with slot sizing and an optional break window.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(WorkSchedules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WorkSchedules::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WorkSchedules::ProviderId).uuid().not_null())
                    .col(
                        ColumnDef::new(WorkSchedules::DayOfWeek)
                            .small_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(WorkSchedules::StartTime).time().not_null())
                    .col(ColumnDef::new(WorkSchedules::EndTime).time().not_null())
                    .col(
                        ColumnDef::new(WorkSchedules::SlotDurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(WorkSchedules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(WorkSchedules::BreakStart).time().null())
                    .col(ColumnDef::new(WorkSchedules::BreakEnd).time().null())
                    .col(
                        ColumnDef::new(WorkSchedules::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(WorkSchedules::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_work_schedules_provider_day")
                    .table(WorkSchedules::Table)
                    .col(WorkSchedules::ProviderId)
                    .col(WorkSchedules::DayOfWeek)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WorkSchedules::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum WorkSchedules {
    Table,
    Id,
    ProviderId,
    DayOfWeek,
    StartTime,
    EndTime,
    SlotDurationMinutes,
    IsActive,
    BreakStart,
    BreakEnd,
    CreatedAt,
    UpdatedAt,
}
