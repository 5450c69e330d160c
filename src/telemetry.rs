//! Tracing setup and request-scoped trace ids for the bookings service.
//!
//! The subscriber is installed once per process (JSON for deployments,
//! pretty for local work). Each request's trace id lives in task-local
//! storage so error responses can stamp it without threading it through
//! every repository call.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::task_local;
use tracing_log::LogTracer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::{SubscriberInitExt, TryInitError},
};

use crate::config::AppConfig;

/// Correlation data carried for the duration of one request.
#[derive(Debug, Clone)]
pub struct TraceContext {
    pub trace_id: String,
}

task_local! {
    static ACTIVE_TRACE_CONTEXT: TraceContext;
}

/// Errors raised while installing the global subscriber.
#[derive(Debug, Error)]
pub enum TelemetryInitError {
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(#[from] TryInitError),
}

static TRACING_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Directives used when neither `RUST_LOG` nor the configured level parses.
const FALLBACK_FILTER: &str = "bookings=info,tower_http=info,sea_orm=warn";

/// Install the global subscriber once. Later calls are no-ops so tests
/// sharing a process can each call through their setup path.
pub fn init_tracing(config: &AppConfig) -> Result<(), TelemetryInitError> {
    if TRACING_INSTALLED.swap(true, Ordering::SeqCst) {
        return Ok(());
    }

    // Route legacy log:: macros (sqlx, sea-orm internals) through tracing.
    // A logger may already be registered in test binaries; that is fine.
    let _ = LogTracer::init();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_FILTER));

    let fmt_layer = if config.log_format == "pretty" {
        fmt::layer().pretty().boxed()
    } else {
        fmt::layer().json().with_current_span(false).boxed()
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()?;

    Ok(())
}

/// Run `future` with `context` available through task-local storage.
pub async fn with_trace_context<Fut, R>(context: TraceContext, future: Fut) -> R
where
    Fut: std::future::Future<Output = R>,
{
    ACTIVE_TRACE_CONTEXT.scope(context, future).await
}

/// The trace id of the running request, if one was set.
pub fn current_trace_id() -> Option<String> {
    ACTIVE_TRACE_CONTEXT
        .try_with(|ctx| ctx.trace_id.clone())
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_filter_parses() {
        assert!(EnvFilter::try_new(FALLBACK_FILTER).is_ok());
    }

    #[tokio::test]
    async fn test_trace_id_is_scoped_to_the_task() {
        assert_eq!(current_trace_id(), None);

        let context = TraceContext {
            trace_id: "trace-xyz".to_string(),
        };
        let seen = with_trace_context(context, async { current_trace_id() }).await;

        assert_eq!(seen, Some("trace-xyz".to_string()));
        assert_eq!(current_trace_id(), None);
    }
}
