//! # Bookings API Library
//!
//! This library provides the core functionality for the Bookings API
//! service: provider schedules, availability resolution, and appointment
//! booking.

pub mod availability;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod server;
pub mod telemetry;
pub use migration;
