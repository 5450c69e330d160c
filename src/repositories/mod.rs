//! # Repository Layer
//!
//! This module contains repository implementations that encapsulate SeaORM
//! operations for database entities, providing a clean API for data access
//! with write-time invariant validation.

pub mod appointment;
pub mod provider_settings;
pub mod schedule_exception;
pub mod work_schedule;

pub use appointment::AppointmentRepository;
pub use provider_settings::ProviderSettingsRepository;
pub use schedule_exception::ScheduleExceptionRepository;
pub use work_schedule::WorkScheduleRepository;
