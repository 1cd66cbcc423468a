//! Quote batch snapshots and per-member entries

use crate::types::{CountyId, GroupId, MemberId, MemberSnapshot, Plan, PlanId, ZipCode};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

/// One plan priced for one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteLine {
    pub plan_id: PlanId,
    pub premium: f64,
    /// Premium net of the tax credit; equals `premium` for off-market plans
    pub adjusted_cost: f64,
    pub benchmark_plan_id: Option<PlanId>,
    pub benchmark_premium: Option<f64>,
    pub plan_details: Plan,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AffordabilitySource {
    External,
    Internal,
}

/// Affordability determination for one member. Monetary amounts are monthly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilitySummary {
    pub fpl_percent: Option<f64>,
    pub expected_contribution: Option<f64>,
    pub benchmark_plan_id: Option<PlanId>,
    pub benchmark_premium: Option<f64>,
    pub premium_tax_credit: f64,
    pub affordable: Option<bool>,
    pub source: AffordabilitySource,
}

/// Coarse error class of a skip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipCategory {
    MissingInputData,
    NoDataAvailable,
}

/// Why a member could not be priced in this run
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("Missing member.zip_code")]
    MissingZipCode,

    #[error("Invalid member.zip_code {zip_code:?}")]
    InvalidZipCode { zip_code: String },

    #[error("Missing member.date_of_birth")]
    MissingDateOfBirth,

    #[error("Could not compute age")]
    AgeUncomputable,

    #[error("No counties for ZIP {zip_code}")]
    NoCountiesForZip { zip_code: ZipCode },

    #[error("No plans in county_id {county_id}")]
    NoPlansInCounty { county_id: CountyId },

    #[error("No pricing for age {age} (tobacco={tobacco}) in county_id {county_id}")]
    NoPricingForParameters {
        county_id: CountyId,
        age: u32,
        tobacco: bool,
    },

    #[error("No on-market Silver plans in county_id {county_id}")]
    NoSilverPlans { county_id: CountyId },

    #[error("No pricing for Silver plans in county_id {county_id}")]
    NoSilverPricing { county_id: CountyId },

    #[error("No priced Silver plans in county_id {county_id}")]
    NoPricedSilverPlans { county_id: CountyId },

    #[error("No poverty guidelines for tax year {tax_year}")]
    FplTableUnavailable { tax_year: i32 },
}

impl SkipReason {
    pub fn category(&self) -> SkipCategory {
        match self {
            SkipReason::MissingZipCode
            | SkipReason::InvalidZipCode { .. }
            | SkipReason::MissingDateOfBirth
            | SkipReason::AgeUncomputable => SkipCategory::MissingInputData,
            _ => SkipCategory::NoDataAvailable,
        }
    }
}

/// How the county used for pricing was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CountySource {
    /// Supplied by the caller for this member
    Explicit,
    /// Already stored on the member record
    Stored,
    /// The ZIP maps to exactly one county
    Unique,
    /// Run-level county applied to a member whose geography was unresolved
    RunOverride,
}

/// Outcome of the per-member pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QuoteOutcome {
    Skipped {
        reason: SkipReason,
        detail: String,
    },
    NeedsCounty {
        zip_code: ZipCode,
        county_ids: Vec<CountyId>,
    },
    Priced {
        county_id: CountyId,
        county_source: CountySource,
        age: u32,
        tobacco: bool,
        affordability: AffordabilitySummary,
        quotes: Vec<QuoteLine>,
    },
}

impl QuoteOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        let detail = reason.to_string();
        QuoteOutcome::Skipped { reason, detail }
    }
}

/// Exactly one per member per batch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberQuoteEntry {
    pub member: MemberSnapshot,
    #[serde(flatten)]
    pub outcome: QuoteOutcome,
}

impl MemberQuoteEntry {
    pub fn member_id(&self) -> &MemberId {
        &self.member.id
    }

    pub fn is_priced(&self) -> bool {
        matches!(self.outcome, QuoteOutcome::Priced { .. })
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self.outcome, QuoteOutcome::Skipped { .. })
    }

    /// Candidate counties when the entry still needs a county choice
    pub fn pending_counties(&self) -> Option<&[CountyId]> {
        match &self.outcome {
            QuoteOutcome::NeedsCounty { county_ids, .. } => Some(county_ids),
            _ => None,
        }
    }

    pub fn quotes(&self) -> &[QuoteLine] {
        match &self.outcome {
            QuoteOutcome::Priced { quotes, .. } => quotes,
            _ => &[],
        }
    }

    pub fn status_label(&self) -> &'static str {
        match self.outcome {
            QuoteOutcome::Skipped { .. } => "skipped",
            QuoteOutcome::NeedsCounty { .. } => "needs_county",
            QuoteOutcome::Priced { .. } => "priced",
        }
    }
}

/// Inputs a batch was generated with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunContext {
    pub member_count: usize,
    pub effective_date: NaiveDate,
    pub tobacco: Option<bool>,
    pub county_override: Option<CountyId>,
    #[serde(default)]
    pub county_choices: BTreeMap<MemberId, CountyId>,
}

/// Immutable snapshot of one full run for a group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuoteBatch {
    pub id: Uuid,
    pub group_id: GroupId,
    pub created_at: DateTime<Utc>,
    pub entries: Vec<MemberQuoteEntry>,
    pub run_context: RunContext,
}

impl QuoteBatch {
    pub fn entry(&self, member_id: &MemberId) -> Option<&MemberQuoteEntry> {
        self.entries.iter().find(|entry| &entry.member.id == member_id)
    }

    /// Entries still waiting on a county choice, in batch order
    pub fn pending_county_entries(&self) -> impl Iterator<Item = &MemberQuoteEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.pending_counties().is_some())
    }

    pub fn is_fully_resolved(&self) -> bool {
        self.pending_county_entries().next().is_none()
    }
}
