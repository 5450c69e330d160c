//! # Server Configuration
//!
//! This module contains the server setup and configuration for the Bookings API.

use std::sync::Arc;

use axum::{
    Router,
    extract::Request,
    http::HeaderValue,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
};
use sea_orm::DatabaseConnection;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::error::ApiError;
use crate::handlers;
use crate::telemetry::{self, TraceContext};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<AppConfig>,
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(health))
        .route(
            "/api/v1/work-schedules",
            post(handlers::work_schedules::create_work_schedule),
        )
        .route(
            "/api/v1/work-schedules/provider/{provider_id}",
            get(handlers::work_schedules::list_work_schedules),
        )
        .route(
            "/api/v1/work-schedules/weekly-schedule/{provider_id}",
            get(handlers::work_schedules::weekly_schedule),
        )
        .route(
            "/api/v1/work-schedules/availability/{provider_id}/{date}",
            get(handlers::availability::get_availability),
        )
        .route(
            "/api/v1/work-schedules/validate-availability",
            post(handlers::availability::validate_availability),
        )
        .route(
            "/api/v1/work-schedules/{id}",
            put(handlers::work_schedules::update_work_schedule)
                .delete(handlers::work_schedules::delete_work_schedule),
        )
        .route(
            "/api/v1/schedule-exceptions",
            post(handlers::schedule_exceptions::create_schedule_exception),
        )
        .route(
            "/api/v1/schedule-exceptions/provider/{provider_id}",
            get(handlers::schedule_exceptions::list_schedule_exceptions),
        )
        .route(
            "/api/v1/schedule-exceptions/{id}",
            put(handlers::schedule_exceptions::update_schedule_exception)
                .delete(handlers::schedule_exceptions::delete_schedule_exception),
        )
        .route(
            "/api/v1/provider-settings/{provider_id}",
            get(handlers::provider_settings::get_provider_settings)
                .put(handlers::provider_settings::save_provider_settings),
        )
        .route(
            "/api/v1/appointments",
            post(handlers::appointments::create_appointment)
                .get(handlers::appointments::list_appointments),
        )
        .route(
            "/api/v1/appointments/{id}",
            get(handlers::appointments::get_appointment)
                .put(handlers::appointments::update_appointment),
        )
        .route(
            "/api/v1/appointments/{id}/confirm",
            post(handlers::appointments::confirm_appointment),
        )
        .route(
            "/api/v1/appointments/{id}/complete",
            post(handlers::appointments::complete_appointment),
        )
        .route(
            "/api/v1/appointments/{id}/cancel",
            post(handlers::appointments::cancel_appointment),
        )
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
}

/// Health endpoint verifying database connectivity
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
        (status = 503, description = "Database unreachable", body = ApiError)
    ),
    tag = "root"
)]
async fn health(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> Result<axum::Json<serde_json::Value>, ApiError> {
    crate::db::health_check(&state.db).await.map_err(|e| {
        tracing::error!("Health check failed: {:?}", e);
        ApiError::new(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "SERVICE_UNAVAILABLE",
            "Database unreachable",
        )
    })?;

    Ok(axum::Json(serde_json::json!({ "status": "ok" })))
}

/// Assign each request a trace id, propagate it through task-local storage,
/// and echo it back in the `X-Trace-Id` response header.
async fn trace_context_middleware(request: Request, next: Next) -> Response {
    let trace_id = request
        .headers()
        .get("x-trace-id")
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let context = TraceContext {
        trace_id: trace_id.clone(),
    };

    let mut response = telemetry::with_trace_context(context, next.run(request))
        .await
        .into_response();

    if let Ok(header_value) = HeaderValue::from_str(&trace_id) {
        response.headers_mut().insert("x-trace-id", header_value);
    }

    response
}

/// Starts the server with the given configuration
pub async fn run_server(
    config: AppConfig,
    db: DatabaseConnection,
) -> Result<(), Box<dyn std::error::Error>> {
    // Resolve the configured bind address
    let addr = config
        .bind_addr()
        .map_err(|e| format!("Invalid server address: {}", e))?;

    let profile = config.profile.clone();
    let state = AppState {
        db,
        config: Arc::new(config),
    };
    let app = create_app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app).await?;

    Ok(())
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        health,
        crate::handlers::work_schedules::create_work_schedule,
        crate::handlers::work_schedules::list_work_schedules,
        crate::handlers::work_schedules::weekly_schedule,
        crate::handlers::work_schedules::update_work_schedule,
        crate::handlers::work_schedules::delete_work_schedule,
        crate::handlers::schedule_exceptions::create_schedule_exception,
        crate::handlers::schedule_exceptions::list_schedule_exceptions,
        crate::handlers::schedule_exceptions::update_schedule_exception,
        crate::handlers::schedule_exceptions::delete_schedule_exception,
        crate::handlers::provider_settings::get_provider_settings,
        crate::handlers::provider_settings::save_provider_settings,
        crate::handlers::availability::get_availability,
        crate::handlers::availability::validate_availability,
        crate::handlers::appointments::create_appointment,
        crate::handlers::appointments::list_appointments,
        crate::handlers::appointments::get_appointment,
        crate::handlers::appointments::update_appointment,
        crate::handlers::appointments::confirm_appointment,
        crate::handlers::appointments::complete_appointment,
        crate::handlers::appointments::cancel_appointment,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::models::AppointmentStatus,
            crate::models::ExceptionType,
            crate::error::ApiError,
            crate::handlers::work_schedules::CreateWorkScheduleRequest,
            crate::handlers::work_schedules::UpdateWorkScheduleRequest,
            crate::handlers::work_schedules::WorkScheduleDto,
            crate::handlers::work_schedules::WeekdayScheduleDto,
            crate::handlers::work_schedules::WeeklyScheduleDto,
            crate::handlers::schedule_exceptions::CreateScheduleExceptionRequest,
            crate::handlers::schedule_exceptions::UpdateScheduleExceptionRequest,
            crate::handlers::schedule_exceptions::ScheduleExceptionDto,
            crate::handlers::provider_settings::SaveProviderSettingsRequest,
            crate::handlers::provider_settings::ProviderSettingsDto,
            crate::handlers::availability::SlotDto,
            crate::handlers::availability::AvailabilityDto,
            crate::handlers::availability::ValidateAvailabilityRequest,
            crate::handlers::availability::ValidateAvailabilityResponse,
            crate::handlers::appointments::CreateAppointmentRequest,
            crate::handlers::appointments::UpdateAppointmentRequest,
            crate::handlers::appointments::AppointmentDto,
        )
    ),
    info(
        title = "Bookings API",
        description = "API for provider schedules, availability, and appointment booking",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
