//! Common test utilities and infrastructure
//!
//! Shared fixtures and helpers used across the engine test suites.

pub mod builders;
pub mod fixtures;
pub mod helpers;

// Re-export commonly used items for convenience
pub use builders::{sample_plan, ReferenceDataBuilder};
pub use fixtures::TestFixtures;
pub use helpers::{SlowProvider, TestHelpers};
