//! Trait definitions with mockall annotations for testing
//!
//! Every I/O seam of the engine is a trait so the quote pipeline can be driven
//! against in-memory data in tests and against real stores in the binaries.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::EngineResult;
use shared::{
    BenchmarkRequest, BenchmarkResponse, County, CountyCandidates, CountyId, EmployeeSummary,
    EmployeeSummaryRequest, FilterOptions, GroupId, Member, MemberQuoteEntry, Plan, PlanId, PreviewRequest,
    PricingRow, QuoteBatch, RunQuotesRequest, ZipCode,
};

/// Read-only plan, pricing and geography reference tables
#[mockall::automock]
#[async_trait::async_trait]
pub trait ReferenceStore: Send + Sync {
    /// County ids mapped to a ZIP, as stored (may contain duplicates)
    async fn counties_for_zip(&self, zip_code: &ZipCode) -> EngineResult<Vec<CountyId>>;

    /// Plan ids offered in a county
    async fn plan_ids_in_county(&self, county_id: &CountyId) -> EngineResult<Vec<PlanId>>;

    /// Plan metadata for the given ids; unknown ids are omitted
    async fn plans(&self, plan_ids: &[PlanId]) -> EngineResult<Vec<Plan>>;

    /// Pricing rows matching exactly (plan id in `plan_ids`, age, tobacco)
    async fn pricing(&self, plan_ids: &[PlanId], age: u32, tobacco: bool) -> EngineResult<Vec<PricingRow>>;

    /// County records for the given ids; unknown ids are omitted
    async fn counties(&self, county_ids: &[CountyId]) -> EngineResult<Vec<County>>;
}

/// Read-only view of groups and their members
#[mockall::automock]
#[async_trait::async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Members of a group in directory order, or `None` for an unknown group
    async fn members_of(&self, group_id: &GroupId) -> EngineResult<Option<Vec<Member>>>;
}

/// Append-only store of quote batches
#[mockall::automock]
#[async_trait::async_trait]
pub trait BatchStore: Send + Sync {
    /// Persist one complete batch in a single write
    async fn append(&self, batch: &QuoteBatch) -> EngineResult<()>;

    /// Most recently created batch for the group
    async fn latest(&self, group_id: &GroupId) -> EngineResult<Option<QuoteBatch>>;

    /// All batches for the group, newest first
    async fn history(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>>;
}

/// Where the external service should resolve the member's rating area
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RatingLocation {
    /// Literal accepted by the service, e.g. `"home"` or `"work"`
    Named(String),
    Zip { zip_code: ZipCode },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffordabilityRequest {
    /// Shared by every member of one batch run; providers may reuse
    /// group-wide work across requests with the same run id
    pub run_id: Uuid,
    pub group_id: GroupId,
    pub member: Member,
    pub effective_date: NaiveDate,
    pub plan_year: i32,
    pub rating_location: RatingLocation,
}

/// Determination returned by an external affordability service.
/// Monetary amounts are monthly.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExternalAffordability {
    pub premium_tax_credit: Option<f64>,
    pub benchmark_plan_id: Option<PlanId>,
    pub benchmark_premium: Option<f64>,
    pub fpl_percent: Option<f64>,
    pub expected_contribution: Option<f64>,
    pub affordable: Option<bool>,
}

/// Optional third-party affordability determination
#[mockall::automock]
#[async_trait::async_trait]
pub trait AffordabilityProvider: Send + Sync {
    /// `Ok(None)` when the service has nothing for this member
    async fn determine(&self, request: &AffordabilityRequest) -> EngineResult<Option<ExternalAffordability>>;
}

/// The quote operations exposed over HTTP
#[mockall::automock]
#[async_trait::async_trait]
pub trait QuoteService: Send + Sync {
    /// Price every member of the group and persist one new batch
    async fn generate_batch(&self, group_id: &GroupId, request: RunQuotesRequest) -> EngineResult<QuoteBatch>;

    async fn latest_batch(&self, group_id: &GroupId) -> EngineResult<Option<QuoteBatch>>;

    /// Newest first
    async fn batch_history(&self, group_id: &GroupId) -> EngineResult<Vec<QuoteBatch>>;

    /// Price one member against one county without persisting anything
    async fn preview_member(&self, group_id: &GroupId, request: PreviewRequest) -> EngineResult<MemberQuoteEntry>;

    async fn benchmark_for_member(
        &self,
        group_id: &GroupId,
        request: BenchmarkRequest,
    ) -> EngineResult<BenchmarkResponse>;

    async fn counties_for_zip(&self, zip_code: &ZipCode) -> EngineResult<CountyCandidates>;

    /// Display names by id; unknown ids map to themselves
    async fn county_names(&self, county_ids: Vec<CountyId>) -> EngineResult<BTreeMap<CountyId, String>>;

    /// Carriers, metal levels and markets present in the latest batch
    async fn filter_options(&self, group_id: &GroupId) -> EngineResult<FilterOptions>;

    /// Per-member cost comparison against the latest batch
    async fn employee_summary(
        &self,
        group_id: &GroupId,
        request: EmployeeSummaryRequest,
    ) -> EngineResult<EmployeeSummary>;
}
