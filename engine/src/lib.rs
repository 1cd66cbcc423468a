//! Quote generation and subsidy engine
//!
//! Prices every member of an employer group against the plans available in
//! their rating county, estimates the premium tax credit from the second
//! lowest cost silver plan, and records each run as an immutable batch.

pub mod config;
pub mod core;
pub mod error;
pub mod orchestrator;
pub mod services;
pub mod setup;
pub mod traits;

// Re-export commonly used types
pub use config::{AffordabilityApiConfig, EngineConfig};
pub use error::{BenchmarkError, EngineError, EngineResult, LookupError, SubsidyError};
pub use orchestrator::QuoteEngine;
pub use setup::{EngineSources, FileQuoteEngine};
pub use traits::{
    AffordabilityProvider, BatchStore, MemberDirectory, MockAffordabilityProvider,
    MockBatchStore, MockMemberDirectory, MockQuoteService, MockReferenceStore, QuoteService,
    ReferenceStore,
};
