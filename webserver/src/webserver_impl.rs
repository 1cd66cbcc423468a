//! Main webserver implementation
//!
//! `WebServer` wraps a `QuoteService` and exposes it over HTTP. The service is
//! injected, so handlers run against the real engine or a mock alike.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use engine::QuoteService;
use shared::{logging, service_info, ServiceId};

use crate::error::{WebServerError, WebServerResult};
use crate::state::WebServerState;
use crate::web::handlers::counties::counties;
use crate::web::handlers::health::health_check;
use crate::web::handlers::quotes::{
    benchmark, filter_options, latest_quotes, preview_quotes, quote_history, run_quotes,
};
use crate::web::handlers::summary::employee_summary;

/// HTTP front end over an injected quote service
pub struct WebServer<Q>
where
    Q: QuoteService,
{
    state: Arc<WebServerState>,
    quotes: Arc<Q>,
}

impl<Q: QuoteService> Clone for WebServer<Q> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            quotes: Arc::clone(&self.quotes),
        }
    }
}

impl<Q> WebServer<Q>
where
    Q: QuoteService + 'static,
{
    pub fn new(bind_address: SocketAddr, quotes: Q) -> Self {
        Self::with_shared_service(bind_address, Arc::new(quotes))
    }

    pub fn with_shared_service(bind_address: SocketAddr, quotes: Arc<Q>) -> Self {
        Self {
            state: Arc::new(WebServerState::new(bind_address)),
            quotes,
        }
    }

    pub fn quotes(&self) -> &Q {
        &self.quotes
    }

    pub fn state(&self) -> &Arc<WebServerState> {
        &self.state
    }

    /// Build the Axum router with all routes
    pub fn build_router(&self) -> Router {
        Router::new()
            .route("/groups/:id/quotes", post(run_quotes::<Q>).get(latest_quotes::<Q>))
            .route("/groups/:id/quotes/history", get(quote_history::<Q>))
            .route("/groups/:id/quotes/preview", post(preview_quotes::<Q>))
            .route("/groups/:id/quotes/benchmark", post(benchmark::<Q>))
            .route("/groups/:id/quotes/filters", get(filter_options::<Q>))
            .route(
                "/groups/:id/summary/employees",
                get(employee_summary::<Q>).post(employee_summary::<Q>),
            )
            .route("/counties", get(counties::<Q>))
            .route("/health", get(health_check::<Q>))
            .layer(
                ServiceBuilder::new()
                    .layer(TraceLayer::new_for_http())
                    .layer(CorsLayer::permissive()),
            )
            .with_state(self.clone())
    }

    /// Serve until Ctrl+C
    pub async fn run(&self) -> WebServerResult<()> {
        let address = self.state.bind_address;
        let listener = tokio::net::TcpListener::bind(address)
            .await
            .map_err(|e| WebServerError::ServerStartup(format!("Failed to bind to {address}: {e}")))?;

        service_info!(ServiceId::current(), "🌐 Web server listening on http://{}", address);

        axum::serve(listener, self.build_router())
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| WebServerError::ServerStartup(format!("Server error: {e}")))?;

        Ok(())
    }
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => logging::log_shutdown(ServiceId::current(), "Received Ctrl+C signal"),
        Err(err) => logging::log_error(ServiceId::current(), "Signal handling", &err),
    }
}
