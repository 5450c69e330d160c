//! Migration to create the schedule_exceptions table.
//!
//! Per-date overrides of the recurring schedule: whole-day closures
//! (day_off, vacation, holiday) or custom hours for a single date.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduleExceptions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduleExceptions::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ScheduleExceptions::ProviderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduleExceptions::Date).date().not_null())
                    .col(
                        ColumnDef::new(ScheduleExceptions::ExceptionType)
                            .text()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScheduleExceptions::StartTime).time().null())
                    .col(ColumnDef::new(ScheduleExceptions::EndTime).time().null())
                    .col(
                        ColumnDef::new(ScheduleExceptions::SlotDurationMinutes)
                            .integer()
                            .null(),
                    )
                    .col(ColumnDef::new(ScheduleExceptions::Reason).text().null())
                    .col(
                        ColumnDef::new(ScheduleExceptions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScheduleExceptions::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // One exception per provider per date keeps resolution unambiguous.
        manager
            .create_index(
                Index::create()
                    .name("idx_schedule_exceptions_provider_date")
                    .table(ScheduleExceptions::Table)
                    .col(ScheduleExceptions::ProviderId)
                    .col(ScheduleExceptions::Date)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduleExceptions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ScheduleExceptions {
    Table,
    Id,
    ProviderId,
    Date,
    ExceptionType,
    StartTime,
    EndTime,
    SlotDurationMinutes,
    Reason,
    CreatedAt,
    UpdatedAt,
}
