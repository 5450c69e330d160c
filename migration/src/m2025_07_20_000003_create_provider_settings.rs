//! Migration to create the provider_settings table.
//!
//! Booking policy per provider: default slot sizing, advance-booking
//! horizon, same-day policy, and the provider's timezone.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ProviderSettings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ProviderSettings::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(ProviderSettings::ProviderId)
                            .uuid()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderSettings::DefaultSlotDuration)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderSettings::AdvanceBookingDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ProviderSettings::SameDayBooking)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ProviderSettings::Timezone).text().not_null())
                    .col(
                        ColumnDef::new(ProviderSettings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ProviderSettings::UpdatedAt)
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
                    .name("idx_provider_settings_provider")
                    .table(ProviderSettings::Table)
                    .col(ProviderSettings::ProviderId)
                    .unique()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ProviderSettings::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ProviderSettings {
    Table,
    Id,
    ProviderId,
    DefaultSlotDuration,
    AdvanceBookingDays,
    SameDayBooking,
    Timezone,
    CreatedAt,
    UpdatedAt,
}
