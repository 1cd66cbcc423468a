//! HTTP surface of the quote engine
//!
//! Routes requests for quote runs, history, previews, benchmarks and county
//! lookups to a `QuoteService`.

pub mod error;
pub mod state;
pub mod web;
pub mod webserver_impl;

// Re-export main types
pub use error::{WebServerError, WebServerResult};
pub use state::WebServerState;
pub use webserver_impl::WebServer;
