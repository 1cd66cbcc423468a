//! Request and response bodies of the HTTP surface

use crate::types::{CountyId, MemberId, MemberSnapshot, PlanId, ZipCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Body of `POST /groups/{id}/quotes`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunQuotesRequest {
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    /// Overrides every member's tobacco flag when set
    #[serde(default)]
    pub tobacco: Option<bool>,
    /// Applied to members whose county is otherwise unresolved
    #[serde(default)]
    pub county_id: Option<CountyId>,
    /// Explicit per-member county choices
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub county_choices: BTreeMap<MemberId, CountyId>,
}

/// Body of `POST /groups/{id}/quotes/preview`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreviewRequest {
    #[serde(default)]
    pub member_id: Option<MemberId>,
    #[serde(default)]
    pub county_id: Option<CountyId>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub tobacco: Option<bool>,
}

/// Body of `POST /groups/{id}/quotes/benchmark`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkRequest {
    #[serde(default)]
    pub member_id: Option<MemberId>,
    #[serde(default)]
    pub county_id: Option<CountyId>,
    #[serde(default)]
    pub effective_date: Option<NaiveDate>,
    #[serde(default)]
    pub tobacco: Option<bool>,
    /// Overrides the member's state for the poverty-line lookup
    #[serde(default)]
    pub state_code: Option<String>,
}

/// A priced on-market silver plan considered for the benchmark
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SilverCandidate {
    pub plan_id: PlanId,
    pub premium: f64,
    pub carrier: String,
    pub display_name: String,
}

/// Second-lowest-cost silver plan, or the only silver plan when there is one
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Benchmark {
    pub plan_id: PlanId,
    pub premium: f64,
    /// 2 normally, 1 when only one priced silver plan exists
    pub slcsp_rank: u8,
    /// All priced silver plans, ascending by premium
    pub silver_candidates: Vec<SilverCandidate>,
}

/// Every intermediate value of the premium tax credit calculation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubsidyBreakdown {
    pub magi: f64,
    pub household_size: u32,
    pub tax_year: i32,
    pub state_code: Option<String>,
    pub fpl_annual: f64,
    pub fpl_percent: f64,
    /// Decimal, e.g. 0.085
    pub applicable_percentage: f64,
    pub expected_annual_contribution: f64,
    pub expected_monthly_contribution: f64,
    pub benchmark_premium: f64,
    /// Monthly
    pub premium_tax_credit: f64,
}

/// Response of `POST /groups/{id}/quotes/benchmark`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkResponse {
    pub member: MemberSnapshot,
    pub county_id: CountyId,
    pub age: u32,
    pub tobacco: bool,
    pub benchmark: Benchmark,
    pub subsidy: Option<SubsidyBreakdown>,
    pub subsidy_error: Option<String>,
}

/// Response of `GET /counties?zip=`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountyCandidates {
    pub zip_code: ZipCode,
    pub ids: Vec<CountyId>,
    pub names: BTreeMap<CountyId, String>,
}

/// Response of `GET /groups/{id}/quotes/filters`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub carriers: Vec<String>,
    /// Lowercase metal levels
    pub levels: Vec<String>,
    /// Market flags present, `false` sorting first
    pub on_market: Vec<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}
