//! # Error Handling
//!
//! This module provides unified error handling for the Bookings API,
//! implementing a consistent problem+json response format with trace ID
//! propagation, plus the domain error taxonomy for availability and
//! appointment lifecycle failures.

use axum::{
    extract::rejection::JsonRejection,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::appointment::AppointmentStatus;
use crate::telemetry;

/// Unified API error response structure
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ApiError {
    /// HTTP status code for the response
    #[serde(skip_serializing)]
    pub status: StatusCode,
    /// Error code for programmatic handling
    pub code: Box<str>,
    /// Human-readable error message
    pub message: Box<str>,
    /// Additional error details (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Box<serde_json::Value>>,
    /// Correlation trace ID for debugging (optional)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<Box<str>>,
}

impl ApiError {
    /// Create a new API error with the given status code and message
    pub fn new<C: Into<String>, M: Into<String>>(status: StatusCode, code: C, message: M) -> Self {
        Self {
            status,
            code: code.into().into_boxed_str(),
            message: message.into().into_boxed_str(),
            details: None,
            trace_id: Self::current_trace_id(),
        }
    }

    /// Add details to the error
    pub fn with_details<V: Into<serde_json::Value>>(mut self, details: V) -> Self {
        self.details = Some(Box::new(details.into()));
        self
    }

    /// Extract current trace ID from the active tracing span (falls back to generated correlation ID)
    fn current_trace_id() -> Option<Box<str>> {
        telemetry::current_trace_id()
            .map(|trace_id| trace_id.into_boxed_str())
            .or_else(|| {
                // Fallback: generate a correlation ID for basic client-server log correlation
                Some(format!("corr-{}", &Uuid::new_v4().to_string()[..8]).into_boxed_str())
            })
    }
}

/// Domain errors for scheduling, availability, and appointment lifecycle.
///
/// All variants are recoverable and user-facing: the caller is expected to
/// surface the reason and let the user pick another slot.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("requested interval falls outside the provider's working hours")]
    OutsideWorkingHours,
    #[error("requested date is outside the provider's booking horizon ({reason})")]
    OutsideBookingHorizon { reason: &'static str },
    #[error("requested interval overlaps an existing appointment")]
    ConflictingAppointment { conflicting_id: Uuid },
    #[error("appointment status cannot change from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },
    #[error("{entity} not found")]
    NotFound { entity: &'static str },
    #[error("invalid interval: {message}")]
    InvalidInterval { message: String },
}

impl BookingError {
    /// Stable error code string (SCREAMING_SNAKE_CASE).
    pub fn error_code(&self) -> &'static str {
        match self {
            BookingError::OutsideWorkingHours => "OUTSIDE_WORKING_HOURS",
            BookingError::OutsideBookingHorizon { .. } => "OUTSIDE_BOOKING_HORIZON",
            BookingError::ConflictingAppointment { .. } => "CONFLICTING_APPOINTMENT",
            BookingError::InvalidTransition { .. } => "INVALID_TRANSITION",
            BookingError::NotFound { .. } => "NOT_FOUND",
            BookingError::InvalidInterval { .. } => "INVALID_INTERVAL",
        }
    }

    /// HTTP status the variant maps onto.
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::OutsideWorkingHours | BookingError::OutsideBookingHorizon { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            BookingError::ConflictingAppointment { .. }
            | BookingError::InvalidTransition { .. } => StatusCode::CONFLICT,
            BookingError::NotFound { .. } => StatusCode::NOT_FOUND,
            BookingError::InvalidInterval { .. } => StatusCode::BAD_REQUEST,
        }
    }
}

impl From<BookingError> for ApiError {
    fn from(error: BookingError) -> Self {
        let api_error = ApiError::new(error.status_code(), error.error_code(), error.to_string());

        match error {
            BookingError::ConflictingAppointment { conflicting_id } => {
                api_error.with_details(json!({ "conflicting_appointment_id": conflicting_id }))
            }
            BookingError::OutsideBookingHorizon { reason } => {
                api_error.with_details(json!({ "reason": reason }))
            }
            BookingError::InvalidTransition { from, to } => api_error.with_details(json!({
                "from": from,
                "to": to,
            })),
            _ => api_error,
        }
    }
}

pub(crate) fn is_unique_violation(error: &sea_orm::DbErr) -> bool {
    use sea_orm::RuntimeErr;

    const PG_UNIQUE: &str = "23505";
    const SQLITE_DUPLICATE_CODES: &[&str] = &["1555", "2067"];

    let runtime_err = match error {
        sea_orm::DbErr::Query(RuntimeErr::SqlxError(sqlx_err))
        | sea_orm::DbErr::Exec(RuntimeErr::SqlxError(sqlx_err)) => sqlx_err,
        _ => return false,
    };

    let Some(db_error) = runtime_err.as_database_error() else {
        return false;
    };

    if db_error.is_unique_violation() {
        return true;
    }

    if let Some(code) = db_error.code() {
        let code_str = code.as_ref();
        if code_str == PG_UNIQUE || SQLITE_DUPLICATE_CODES.contains(&code_str) {
            return true;
        }
    }

    false
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        headers.insert(
            "content-type",
            HeaderValue::from_static("application/problem+json"),
        );

        (self.status, headers, axum::Json(self)).into_response()
    }
}

// Error mappers for common sources

impl From<anyhow::Error> for ApiError {
    fn from(error: anyhow::Error) -> Self {
        // Log the full error for debugging
        tracing::error!("Internal error: {:?}", error);

        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "An internal error occurred",
        )
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        let message = match rejection {
            JsonRejection::JsonDataError(err) => format!("Invalid JSON: {}", err),
            JsonRejection::JsonSyntaxError(err) => format!("JSON syntax error: {}", err),
            JsonRejection::MissingJsonContentType(_) => {
                "Missing 'Content-Type: application/json' header".to_string()
            }
            _ => "Invalid request body".to_string(),
        };

        Self::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message)
    }
}

impl From<sea_orm::DbErr> for ApiError {
    fn from(error: sea_orm::DbErr) -> Self {
        if is_unique_violation(&error) {
            // The only unique guard on a hot write path is the appointment
            // overlap index, so surface it as a booking conflict.
            tracing::debug!(?error, "Unique constraint violation detected");
            return Self::new(
                StatusCode::CONFLICT,
                "CONFLICTING_APPOINTMENT",
                "The requested interval was booked concurrently",
            );
        }

        match error {
            sea_orm::DbErr::RecordNotFound(record) => Self::new(
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("Record not found: {}", record),
            ),
            sea_orm::DbErr::Conn(connection_err) => {
                tracing::error!("Database connection error: {:?}", connection_err);
                Self::new(
                    StatusCode::SERVICE_UNAVAILABLE,
                    "SERVICE_UNAVAILABLE",
                    "Database service unavailable",
                )
            }
            _ => {
                tracing::error!("Database error: {:?}", error);
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_SERVER_ERROR",
                    "Database error occurred",
                )
            }
        }
    }
}

/// Create a validation error with field details
pub fn validation_error(message: &str, field_errors: serde_json::Value) -> ApiError {
    ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", message).with_details(field_errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use serde_json::json;

    #[test]
    fn test_api_error_basic() {
        let error = ApiError::new(
            StatusCode::BAD_REQUEST,
            "VALIDATION_FAILED",
            "Test error message",
        );

        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.message, Box::from("Test error message"));
        assert_eq!(error.details, None);
    }

    #[test]
    fn test_api_error_with_details() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", "Test error message")
            .with_details(json!({"field": "value"}));

        assert_eq!(error.details, Some(Box::new(json!({"field": "value"}))));
    }

    #[test]
    fn test_booking_error_codes_and_statuses() {
        let cases: Vec<(BookingError, &str, StatusCode)> = vec![
            (
                BookingError::OutsideWorkingHours,
                "OUTSIDE_WORKING_HOURS",
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BookingError::OutsideBookingHorizon {
                    reason: "beyond_horizon",
                },
                "OUTSIDE_BOOKING_HORIZON",
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                BookingError::ConflictingAppointment {
                    conflicting_id: Uuid::new_v4(),
                },
                "CONFLICTING_APPOINTMENT",
                StatusCode::CONFLICT,
            ),
            (
                BookingError::InvalidTransition {
                    from: AppointmentStatus::Completed,
                    to: AppointmentStatus::Confirmed,
                },
                "INVALID_TRANSITION",
                StatusCode::CONFLICT,
            ),
            (
                BookingError::NotFound {
                    entity: "appointment",
                },
                "NOT_FOUND",
                StatusCode::NOT_FOUND,
            ),
            (
                BookingError::InvalidInterval {
                    message: "duration must be positive".to_string(),
                },
                "INVALID_INTERVAL",
                StatusCode::BAD_REQUEST,
            ),
        ];

        for (error, code, status) in cases {
            assert_eq!(error.error_code(), code);
            assert_eq!(error.status_code(), status);

            let api_error: ApiError = error.into();
            assert_eq!(api_error.code, Box::from(code));
            assert_eq!(api_error.status, status);
            assert!(api_error.trace_id.is_some());
        }
    }

    #[test]
    fn test_conflicting_appointment_details_reference() {
        let conflicting_id = Uuid::new_v4();
        let api_error: ApiError = BookingError::ConflictingAppointment { conflicting_id }.into();

        let details = api_error.details.expect("conflict carries details");
        assert_eq!(
            details["conflicting_appointment_id"],
            json!(conflicting_id)
        );
    }

    #[test]
    fn test_from_anyhow() {
        let anyhow_error = anyhow::anyhow!("Something went wrong");
        let api_error: ApiError = anyhow_error.into();

        assert_eq!(api_error.code, Box::from("INTERNAL_SERVER_ERROR"));
        assert_eq!(api_error.message, Box::from("An internal error occurred"));
    }

    #[test]
    fn test_content_type_header() {
        let error = ApiError::new(StatusCode::BAD_REQUEST, "VALIDATION_FAILED", "Test error");

        let response = error.into_response();

        assert_eq!(
            response.headers().get("content-type").unwrap(),
            "application/problem+json"
        );
    }

    #[test]
    fn test_status_code_preservation() {
        let error = ApiError::new(
            StatusCode::CONFLICT,
            "CONFLICTING_APPOINTMENT",
            "Slot already booked",
        );

        let response = error.into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_trace_id_generation() {
        let error = ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "INTERNAL_SERVER_ERROR",
            "Test error",
        );

        assert!(error.trace_id.is_some());
        let trace_id = error.trace_id.unwrap();
        assert!(trace_id.starts_with("corr-"));
        assert_eq!(trace_id.len(), 13); // "corr-" + 8 chars
    }

    #[test]
    fn test_database_error_mapping() {
        let db_error = sea_orm::DbErr::RecordNotFound("appointment".to_string());
        let api_error: ApiError = db_error.into();

        assert_eq!(api_error.status, StatusCode::NOT_FOUND);
        assert_eq!(api_error.code, Box::from("NOT_FOUND"));
        assert!(api_error.message.contains("appointment"));
    }

    #[test]
    fn test_validation_error_with_details() {
        let field_errors = json!({
            "start_time": "must be before end_time",
        });

        let error = validation_error("Validation failed", field_errors.clone());

        assert_eq!(error.status, StatusCode::BAD_REQUEST);
        assert_eq!(error.code, Box::from("VALIDATION_FAILED"));
        assert_eq!(error.details, Some(Box::new(field_errors)));
    }
}
