//! Database migrations for the Bookings API.
//!
//! This module contains all database migrations using SeaORM Migration.

pub use sea_orm_migration::prelude::*;

mod m2025_07_20_000001_create_work_schedules;
mod m2025_07_20_000002_create_schedule_exceptions;
mod m2025_07_20_000003_create_provider_settings;
mod m2025_07_20_000004_create_appointments;
mod m2025_07_21_000001_add_appointment_overlap_guard;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m2025_07_20_000001_create_work_schedules::Migration),
            Box::new(m2025_07_20_000002_create_schedule_exceptions::Migration),
            Box::new(m2025_07_20_000003_create_provider_settings::Migration),
            Box::new(m2025_07_20_000004_create_appointments::Migration),
            Box::new(m2025_07_21_000001_add_appointment_overlap_guard::Migration),
        ]
    }
}
