//! Shared logging utilities for consistent tracing across all binaries

use crate::types::ServiceId;
use chrono::{DateTime, Utc};
use tracing::{error, info};

/// Filter directives for the given service at the given base level
pub fn filter_directives(service: ServiceId, base_level: &str) -> String {
    match service {
        ServiceId::Engine => {
            format!("engine={base_level},shared={base_level}")
        }
        ServiceId::WebServer => {
            format!(
                "webserver={base_level},engine={base_level},shared={base_level},tower_http=debug,axum={base_level}"
            )
        }
        ServiceId::Client => {
            format!("client={base_level},quote_client={base_level},shared={base_level},reqwest=warn")
        }
        ServiceId::Library => base_level.to_string(),
    }
}

/// Initialize tracing subscriber with service-specific filtering.
/// `RUST_LOG` takes precedence when set.
pub fn init_tracing_with_level(log_level: Option<&str>) {
    use tracing_subscriber::{fmt, EnvFilter};

    let service = *ServiceId::current();
    let base_level = log_level.unwrap_or("info");
    let directives = filter_directives(service, base_level);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    // A second init (e.g. from tests) keeps the first subscriber
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .try_init();
}

/// Initialize tracing at `info` for the current service
pub fn init_tracing() {
    init_tracing_with_level(None);
}

/// Get formatted timestamp for consistent logging
pub fn format_timestamp() -> String {
    let now: DateTime<Utc> = Utc::now();
    now.format("%H:%M:%S%.3f").to_string()
}

/// Macro for service-aware info logging
#[macro_export]
macro_rules! service_info {
    ($service_id:expr, $($arg:tt)*) => {
        tracing::info!(
            service = %$service_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for service-aware warning logging
#[macro_export]
macro_rules! service_warn {
    ($service_id:expr, $($arg:tt)*) => {
        tracing::warn!(
            service = %$service_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for service-aware error logging
#[macro_export]
macro_rules! service_error {
    ($service_id:expr, $($arg:tt)*) => {
        tracing::error!(
            service = %$service_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Macro for service-aware debug logging
#[macro_export]
macro_rules! service_debug {
    ($service_id:expr, $($arg:tt)*) => {
        tracing::debug!(
            service = %$service_id,
            timestamp = $crate::logging::format_timestamp(),
            $($arg)*
        );
    };
}

/// Contextual logging helper for startup messages
pub fn log_startup(service_id: &ServiceId, details: &str) {
    info!(
        service = %service_id,
        timestamp = format_timestamp(),
        "🚀 Starting {}",
        details
    );
}

/// Contextual logging helper for shutdown messages
pub fn log_shutdown(service_id: &ServiceId, reason: &str) {
    info!(
        service = %service_id,
        timestamp = format_timestamp(),
        "🛑 Shutting down: {}",
        reason
    );
}

/// Contextual logging helper for error conditions
pub fn log_error(service_id: &ServiceId, context: &str, error: &dyn std::fmt::Display) {
    error!(
        service = %service_id,
        timestamp = format_timestamp(),
        error = %error,
        "❌ {} failed: {}",
        context,
        error
    );
}

/// Contextual logging helper for success conditions
pub fn log_success(service_id: &ServiceId, message: &str) {
    info!(
        service = %service_id,
        timestamp = format_timestamp(),
        "✅ {}",
        message
    );
}

/// Contextual logging helper for progress updates
pub fn log_progress(service_id: &ServiceId, action: &str, details: &str) {
    info!(
        service = %service_id,
        timestamp = format_timestamp(),
        "📋 {}: {}",
        action,
        details
    );
}
