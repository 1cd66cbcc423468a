//! Health check endpoint

use axum::extract::State;
use axum::response::Json;
use chrono::Utc;
use serde_json::{json, Value};

use engine::QuoteService;

use crate::webserver_impl::WebServer;

pub async fn health_check<Q>(State(server): State<WebServer<Q>>) -> Json<Value>
where
    Q: QuoteService + 'static,
{
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "uptime": server.state().get_uptime_seconds(),
        "runs_in_flight": server.state().runs_in_flight(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
