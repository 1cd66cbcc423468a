//! Test helpers for engine tests
//!
//! Engines are assembled from the fixture reference data and member list,
//! with the batch store and affordability provider swappable per test.

use std::time::Duration;

use async_trait::async_trait;

use engine::services::{
    DisabledAffordabilityProvider, DirectoryData, GroupRecord, InMemoryBatchStore,
    RealMemberDirectory, RealReferenceStore,
};
use engine::traits::{AffordabilityRequest, ExternalAffordability};
use engine::{AffordabilityProvider, BatchStore, EngineConfig, EngineResult, QuoteEngine};
use shared::{MemberId, MemberQuoteEntry, QuoteBatch, RunQuotesRequest};

use super::builders::ReferenceDataBuilder;
use super::fixtures::TestFixtures;

pub type TestEngine<B, A> = QuoteEngine<RealReferenceStore, RealMemberDirectory, B, A>;

/// Provider that answers only after a delay
pub struct SlowProvider(pub Duration);

#[async_trait]
impl AffordabilityProvider for SlowProvider {
    async fn determine(&self, _request: &AffordabilityRequest) -> EngineResult<Option<ExternalAffordability>> {
        tokio::time::sleep(self.0).await;
        Ok(Some(ExternalAffordability {
            premium_tax_credit: Some(999.0),
            ..ExternalAffordability::default()
        }))
    }
}

/// Common test utilities
pub struct TestHelpers;

impl TestHelpers {
    pub fn directory() -> RealMemberDirectory {
        RealMemberDirectory::from_data(DirectoryData {
            groups: vec![
                GroupRecord {
                    id: TestFixtures::group_id(),
                    name: "Test Group".to_string(),
                    members: TestFixtures::members(),
                },
                GroupRecord {
                    id: TestFixtures::EMPTY_GROUP.into(),
                    name: "Empty Group".to_string(),
                    members: Vec::new(),
                },
            ],
        })
    }

    pub fn config() -> EngineConfig {
        EngineConfig::default()
            .with_max_concurrency(4)
            .with_provider_timeout(Duration::from_millis(200))
    }

    pub fn engine_with_config<B, A>(store: B, provider: A, config: EngineConfig) -> TestEngine<B, A>
    where
        B: BatchStore + 'static,
        A: AffordabilityProvider + 'static,
    {
        QuoteEngine::new(
            TestFixtures::reference_data().into_store(),
            Self::directory(),
            store,
            provider,
            config,
        )
    }

    pub fn engine_with<B, A>(store: B, provider: A) -> TestEngine<B, A>
    where
        B: BatchStore + 'static,
        A: AffordabilityProvider + 'static,
    {
        Self::engine_with_config(store, provider, Self::config())
    }

    /// Engine with an in-memory store and no external provider
    pub fn engine() -> TestEngine<InMemoryBatchStore, DisabledAffordabilityProvider> {
        Self::engine_with(InMemoryBatchStore::new(), DisabledAffordabilityProvider)
    }

    pub fn run_request() -> RunQuotesRequest {
        RunQuotesRequest {
            effective_date: Some(TestFixtures::effective_date()),
            ..RunQuotesRequest::default()
        }
    }

    pub fn entry<'a>(batch: &'a QuoteBatch, member_id: &str) -> &'a MemberQuoteEntry {
        batch
            .entry(&MemberId::from(member_id))
            .unwrap_or_else(|| panic!("no entry for member {member_id}"))
    }

    pub fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 0.01,
            "expected {expected}, got {actual}"
        );
    }
}
