//! End-to-end availability and booking flows over an in-memory SQLite
//! database: schedule setup, exception precedence, slot generation, horizon
//! enforcement, conflict detection, and the appointment lifecycle.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use sea_orm::DatabaseConnection;
use tower::ServiceExt;
use uuid::Uuid;

use bookings::availability::engine::AvailabilityEngine;
use bookings::availability::resolver::UnavailableReason;
use bookings::config::{AppConfig, BookingDefaultsConfig};
use bookings::db::init_pool;
use bookings::migration::{Migrator, MigratorTrait};
use bookings::models::appointment::AppointmentStatus;
use bookings::models::schedule_exception::ExceptionType;
use bookings::repositories::appointment::{AppointmentChanges, NewAppointment};
use bookings::repositories::provider_settings::SettingsUpsert;
use bookings::repositories::schedule_exception::NewScheduleException;
use bookings::repositories::work_schedule::NewWorkSchedule;
use bookings::repositories::{
    AppointmentRepository, ProviderSettingsRepository, ScheduleExceptionRepository,
    WorkScheduleRepository,
};
use bookings::server::{AppState, create_app};

async fn setup_db() -> DatabaseConnection {
    let mut config = AppConfig::default();
    config.database_url = "sqlite::memory:".to_string();
    // A single connection keeps every query on the same in-memory database.
    config.db_max_connections = 1;

    let db = init_pool(&config).await.expect("connect to sqlite");
    Migrator::up(&db, None).await.expect("run migrations");
    db
}

fn defaults() -> BookingDefaultsConfig {
    BookingDefaultsConfig::default()
}

fn time(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
}

/// A date one week out, so it always sits inside the default 30-day horizon.
fn target_date() -> NaiveDate {
    Utc::now().date_naive() + Duration::days(7)
}

fn weekday_of(date: NaiveDate) -> i16 {
    date.weekday().num_days_from_sunday() as i16
}

async fn standard_schedule(db: &DatabaseConnection, provider_id: Uuid, date: NaiveDate) {
    let schedules = WorkScheduleRepository::new(db.clone());
    schedules
        .create(NewWorkSchedule {
            provider_id,
            day_of_week: weekday_of(date),
            start_time: time(9, 0),
            end_time: time(17, 0),
            slot_duration_minutes: 30,
            is_active: true,
            break_start: Some(time(12, 0)),
            break_end: Some(time(13, 0)),
        })
        .await
        .expect("create schedule");
}

#[tokio::test]
async fn full_day_with_break_produces_fourteen_slots() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let engine = AvailabilityEngine::new(db.clone(), defaults());
    let report = engine
        .day_availability(provider_id, date, Utc::now())
        .await
        .expect("resolve day");

    assert!(report.is_available());
    assert_eq!(report.slots.len(), 14);
    assert!(report.slots.iter().all(|s| s.available));
    assert!(!report.slots.iter().any(|s| s.start == time(12, 0)));
    assert!(!report.slots.iter().any(|s| s.start == time(12, 30)));
}

#[tokio::test]
async fn day_off_exception_beats_recurring_schedule() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let exceptions = ScheduleExceptionRepository::new(db.clone());
    exceptions
        .create(NewScheduleException {
            provider_id,
            date,
            exception_type: ExceptionType::DayOff,
            start_time: None,
            end_time: None,
            slot_duration_minutes: None,
            reason: Some("Personal day".to_string()),
        })
        .await
        .expect("create exception");

    let engine = AvailabilityEngine::new(db.clone(), defaults());
    let report = engine
        .day_availability(provider_id, date, Utc::now())
        .await
        .expect("resolve day");

    assert!(!report.is_available());
    assert_eq!(report.reason, Some(UnavailableReason::DayOff));
    assert!(report.slots.is_empty());
}

#[tokio::test]
async fn custom_hours_override_falls_back_per_field() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    // Only the end time is overridden; start and slot duration come from
    // the recurring row.
    let exceptions = ScheduleExceptionRepository::new(db.clone());
    exceptions
        .create(NewScheduleException {
            provider_id,
            date,
            exception_type: ExceptionType::CustomHours,
            start_time: None,
            end_time: Some(time(12, 0)),
            slot_duration_minutes: None,
            reason: None,
        })
        .await
        .expect("create exception");

    let engine = AvailabilityEngine::new(db.clone(), defaults());
    let report = engine
        .day_availability(provider_id, date, Utc::now())
        .await
        .expect("resolve day");

    // 09:00-12:00 with 30-minute slots and no break: 6 slots.
    assert_eq!(report.slots.len(), 6);
    assert_eq!(report.slots[0].start, time(9, 0));
    assert_eq!(report.slots.last().unwrap().end, time(12, 0));
}

#[tokio::test]
async fn duplicate_exception_for_same_date_is_rejected() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();

    let exceptions = ScheduleExceptionRepository::new(db.clone());
    let new = NewScheduleException {
        provider_id,
        date,
        exception_type: ExceptionType::Holiday,
        start_time: None,
        end_time: None,
        slot_duration_minutes: None,
        reason: None,
    };

    exceptions.create(new.clone()).await.expect("first insert");
    let error = exceptions.create(new).await.unwrap_err();
    assert_eq!(error.code, Box::from("DUPLICATE_EXCEPTION"));
}

#[tokio::test]
async fn second_active_schedule_for_weekday_is_rejected() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let schedules = WorkScheduleRepository::new(db.clone());
    let error = schedules
        .create(NewWorkSchedule {
            provider_id,
            day_of_week: weekday_of(date),
            start_time: time(8, 0),
            end_time: time(16, 0),
            slot_duration_minutes: 60,
            is_active: true,
            break_start: None,
            break_end: None,
        })
        .await
        .unwrap_err();

    assert_eq!(error.code, Box::from("DUPLICATE_SCHEDULE"));
}

#[tokio::test]
async fn overlapping_booking_is_rejected_with_conflict_reference() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let start = Utc
        .from_utc_datetime(&date.and_time(time(10, 0)));
    let appointments = AppointmentRepository::new(db.clone());
    let engine = AvailabilityEngine::new(db.clone(), defaults());

    engine
        .validate_booking(provider_id, start, 30, Utc::now(), None)
        .await
        .expect("first booking validates");
    let first = appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Consultation".to_string(),
            description: None,
            date_time: start,
            duration_minutes: 30,
        })
        .await
        .expect("first booking inserts");

    // Second request overlapping by 15 minutes fails validation and names
    // the appointment in the way.
    let error = engine
        .validate_booking(
            provider_id,
            start + Duration::minutes(15),
            30,
            Utc::now(),
            None,
        )
        .await
        .unwrap_err();

    assert_eq!(error.code, Box::from("CONFLICTING_APPOINTMENT"));
    let details = error.details.expect("conflict carries details");
    assert_eq!(
        details["conflicting_appointment_id"],
        serde_json::json!(first.id)
    );

    // The transactional re-check also refuses the raw insert.
    let error = appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Sneaky double booking".to_string(),
            description: None,
            date_time: start + Duration::minutes(15),
            duration_minutes: 30,
        })
        .await
        .unwrap_err();
    assert_eq!(error.code, Box::from("CONFLICTING_APPOINTMENT"));
}

#[tokio::test]
async fn cancelled_appointment_frees_its_slot() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let start = Utc.from_utc_datetime(&date.and_time(time(14, 0)));
    let appointments = AppointmentRepository::new(db.clone());
    let booked = appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Session".to_string(),
            description: None,
            date_time: start,
            duration_minutes: 30,
        })
        .await
        .expect("book");

    let engine = AvailabilityEngine::new(db.clone(), defaults());
    assert!(
        engine
            .validate_booking(provider_id, start, 30, Utc::now(), None)
            .await
            .is_err()
    );

    appointments
        .update_status(booked.id, AppointmentStatus::Cancelled)
        .await
        .expect("cancel");

    engine
        .validate_booking(provider_id, start, 30, Utc::now(), None)
        .await
        .expect("slot is free again");
}

#[tokio::test]
async fn booking_horizon_is_enforced() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let engine = AvailabilityEngine::new(db.clone(), defaults());
    let now = Utc::now();

    // Past date.
    let yesterday = now - Duration::days(1);
    let error = engine
        .validate_booking(provider_id, yesterday, 30, now, None)
        .await
        .unwrap_err();
    assert_eq!(error.code, Box::from("OUTSIDE_BOOKING_HORIZON"));
    assert_eq!(
        error.details.expect("horizon reason")["reason"],
        serde_json::json!("past_date")
    );

    // Beyond the 30-day default horizon.
    let far_out = now + Duration::days(45);
    let error = engine
        .validate_booking(provider_id, far_out, 30, now, None)
        .await
        .unwrap_err();
    assert_eq!(error.code, Box::from("OUTSIDE_BOOKING_HORIZON"));
    assert_eq!(
        error.details.expect("horizon reason")["reason"],
        serde_json::json!("beyond_horizon")
    );
}

#[tokio::test]
async fn provider_settings_override_the_defaults() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let settings = ProviderSettingsRepository::new(db.clone());
    settings
        .upsert(
            provider_id,
            SettingsUpsert {
                default_slot_duration: 30,
                advance_booking_days: 30,
                same_day_booking: false,
                timezone: "UTC".to_string(),
            },
        )
        .await
        .expect("save settings");

    let engine = AvailabilityEngine::new(db.clone(), defaults());
    // Pin "now" to mid-morning so the request stays on the same UTC day.
    let now = Utc.from_utc_datetime(&Utc::now().date_naive().and_time(time(8, 0)));

    // Same-day bookings are now refused for this provider.
    let later_today = now + Duration::minutes(30);
    let error = engine
        .validate_booking(provider_id, later_today, 30, now, None)
        .await
        .unwrap_err();
    assert_eq!(error.code, Box::from("OUTSIDE_BOOKING_HORIZON"));
    assert_eq!(
        error.details.expect("horizon reason")["reason"],
        serde_json::json!("same_day_disabled")
    );

    // Upsert replaces the stored row instead of duplicating it.
    let updated = settings
        .upsert(
            provider_id,
            SettingsUpsert {
                default_slot_duration: 45,
                advance_booking_days: 60,
                same_day_booking: true,
                timezone: "UTC".to_string(),
            },
        )
        .await
        .expect("replace settings");
    assert_eq!(updated.default_slot_duration, 45);

    let stored = settings.get(provider_id).await.expect("load").unwrap();
    assert_eq!(stored.advance_booking_days, 60);
}

#[tokio::test]
async fn appointment_lifecycle_transitions() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let start = Utc.from_utc_datetime(&date.and_time(time(9, 0)));
    let appointments = AppointmentRepository::new(db.clone());
    let booked = appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Session".to_string(),
            description: None,
            date_time: start,
            duration_minutes: 30,
        })
        .await
        .expect("book");
    assert_eq!(booked.status, AppointmentStatus::Pending);

    // pending -> completed is not allowed.
    let error = appointments
        .update_status(booked.id, AppointmentStatus::Completed)
        .await
        .unwrap_err();
    assert_eq!(error.code, Box::from("INVALID_TRANSITION"));

    let confirmed = appointments
        .update_status(booked.id, AppointmentStatus::Confirmed)
        .await
        .expect("confirm");
    assert_eq!(confirmed.status, AppointmentStatus::Confirmed);

    let completed = appointments
        .update_status(booked.id, AppointmentStatus::Completed)
        .await
        .expect("complete");
    assert_eq!(completed.status, AppointmentStatus::Completed);

    // Completed is terminal.
    let error = appointments
        .update_status(booked.id, AppointmentStatus::Cancelled)
        .await
        .unwrap_err();
    assert_eq!(error.code, Box::from("INVALID_TRANSITION"));
}

#[tokio::test]
async fn reschedule_excludes_the_appointment_itself() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let start = Utc.from_utc_datetime(&date.and_time(time(10, 0)));
    let appointments = AppointmentRepository::new(db.clone());
    let booked = appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Session".to_string(),
            description: None,
            date_time: start,
            duration_minutes: 30,
        })
        .await
        .expect("book");

    // Extending the same appointment in place does not conflict with
    // itself.
    let engine = AvailabilityEngine::new(db.clone(), defaults());
    engine
        .validate_booking(provider_id, start, 60, Utc::now(), Some(booked.id))
        .await
        .expect("self-overlap is allowed");

    let updated = appointments
        .update(
            booked.id,
            AppointmentChanges {
                duration_minutes: Some(60),
                ..Default::default()
            },
        )
        .await
        .expect("reschedule");
    assert_eq!(updated.duration_minutes, 60);
    assert!(updated.updated_at.is_some());
}

#[tokio::test]
async fn slot_grid_marks_booked_slots_unavailable() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let start = Utc.from_utc_datetime(&date.and_time(time(9, 0)));
    let appointments = AppointmentRepository::new(db.clone());
    appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Session".to_string(),
            description: None,
            date_time: start,
            duration_minutes: 30,
        })
        .await
        .expect("book");

    let engine = AvailabilityEngine::new(db.clone(), defaults());
    let report = engine
        .day_availability(provider_id, date, Utc::now())
        .await
        .expect("resolve day");

    let first = report
        .slots
        .iter()
        .find(|s| s.start == time(9, 0))
        .expect("first slot exists");
    assert!(!first.available);
    assert!(report.slots.iter().filter(|s| !s.available).count() == 1);
}

#[tokio::test]
async fn validate_endpoint_names_the_conflicting_appointment() {
    let db = setup_db().await;
    let provider_id = Uuid::new_v4();
    let date = target_date();
    standard_schedule(&db, provider_id, date).await;

    let start = Utc.from_utc_datetime(&date.and_time(time(10, 0)));
    let appointments = AppointmentRepository::new(db.clone());
    let booked = appointments
        .create(NewAppointment {
            client_id: Uuid::new_v4(),
            provider_id,
            title: "Session".to_string(),
            description: None,
            date_time: start,
            duration_minutes: 30,
        })
        .await
        .expect("book");

    let app = create_app(AppState {
        db: db.clone(),
        config: Arc::new(AppConfig::default()),
    });

    let body = serde_json::json!({
        "provider_id": provider_id,
        "date_time": start + Duration::minutes(15),
        "duration_minutes": 30,
    });
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/work-schedules/validate-availability")
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();

    assert_eq!(json["valid"], serde_json::json!(false));
    assert_eq!(json["code"], serde_json::json!("CONFLICTING_APPOINTMENT"));
    assert_eq!(
        json["details"]["conflicting_appointment_id"],
        serde_json::json!(booked.id)
    );
}
