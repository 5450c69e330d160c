//! Migration to create the appointments table.
//!
//! An appointment occupies the half-open interval
//! [date_time, date_time + duration_minutes) for one provider.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Appointments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Appointments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Appointments::ClientId).uuid().not_null())
                    .col(ColumnDef::new(Appointments::ProviderId).uuid().not_null())
                    .col(ColumnDef::new(Appointments::Title).text().not_null())
                    .col(ColumnDef::new(Appointments::Description).text().null())
                    .col(
                        ColumnDef::new(Appointments::DateTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::DurationMinutes)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Appointments::Status)
                            .text()
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Appointments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Appointments::UpdatedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_provider_start")
                    .table(Appointments::Table)
                    .col(Appointments::ProviderId)
                    .col(Appointments::DateTime)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_appointments_client")
                    .table(Appointments::Table)
                    .col(Appointments::ClientId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Appointments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Appointments {
    Table,
    Id,
    ClientId,
    ProviderId,
    Title,
    Description,
    DateTime,
    DurationMinutes,
    Status,
    CreatedAt,
    UpdatedAt,
}
