//! # Availability Engine
//!
//! Core scheduling logic: resolving a provider's effective schedule for a
//! date, enforcing the booking horizon, generating bookable slots, and
//! detecting conflicts with existing appointments. The submodules here are
//! pure; [`engine`] wires them to the repositories.

pub mod conflict;
pub mod engine;
pub mod horizon;
pub mod resolver;
pub mod slots;

pub use engine::AvailabilityEngine;
pub use horizon::{BookingPolicy, HorizonViolation};
pub use resolver::{DayAvailability, DayWindow, UnavailableReason};
pub use slots::TimeSlot;
