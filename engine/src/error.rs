//! Engine-specific error types

use shared::{CountyId, GroupId, MemberId, SharedError, SkipReason};
use thiserror::Error;

/// Plan/pricing lookup failures for one (county, age, tobacco) tuple
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LookupError {
    #[error("No plans in county_id {county_id}")]
    NoPlansInCounty { county_id: CountyId },

    #[error("No pricing for age {age} (tobacco={tobacco}) in county_id {county_id}")]
    NoPricingForParameters {
        county_id: CountyId,
        age: u32,
        tobacco: bool,
    },
}

impl From<LookupError> for SkipReason {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::NoPlansInCounty { county_id } => SkipReason::NoPlansInCounty { county_id },
            LookupError::NoPricingForParameters {
                county_id,
                age,
                tobacco,
            } => SkipReason::NoPricingForParameters {
                county_id,
                age,
                tobacco,
            },
        }
    }
}

/// Benchmark (SLCSP) failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BenchmarkError {
    #[error("No plans in county_id {county_id}")]
    NoPlansInCounty { county_id: CountyId },

    #[error("No on-market Silver plans in county_id {county_id}")]
    NoSilverPlans { county_id: CountyId },

    #[error("No pricing for Silver plans in county_id {county_id}")]
    NoSilverPricing { county_id: CountyId },

    #[error("No priced Silver plans in county_id {county_id}")]
    NoPricedSilverPlans { county_id: CountyId },
}

impl From<BenchmarkError> for SkipReason {
    fn from(error: BenchmarkError) -> Self {
        match error {
            BenchmarkError::NoPlansInCounty { county_id } => SkipReason::NoPlansInCounty { county_id },
            BenchmarkError::NoSilverPlans { county_id } => SkipReason::NoSilverPlans { county_id },
            BenchmarkError::NoSilverPricing { county_id } => SkipReason::NoSilverPricing { county_id },
            BenchmarkError::NoPricedSilverPlans { county_id } => {
                SkipReason::NoPricedSilverPlans { county_id }
            }
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SubsidyError {
    #[error("No poverty guidelines for tax year {tax_year}")]
    FplTableUnavailable { tax_year: i32 },
}

impl From<SubsidyError> for SkipReason {
    fn from(error: SubsidyError) -> Self {
        match error {
            SubsidyError::FplTableUnavailable { tax_year } => SkipReason::FplTableUnavailable { tax_year },
        }
    }
}

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Group not found: {group_id}")]
    GroupNotFound { group_id: GroupId },

    #[error("No members found for group {group_id}")]
    NoMembers { group_id: GroupId },

    #[error("Member {member_id} not found in group {group_id}")]
    MemberNotFound { group_id: GroupId, member_id: MemberId },

    #[error("Missing required input: {field}")]
    MissingInput { field: String },

    #[error("Could not compute age for member {member_id}")]
    AgeUncomputable { member_id: MemberId },

    #[error("Plan lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("Benchmark calculation failed: {0}")]
    Benchmark(#[from] BenchmarkError),

    #[error("Subsidy calculation failed: {0}")]
    Subsidy(#[from] SubsidyError),

    #[error("External affordability service unavailable: {message}")]
    ExternalServiceUnavailable { message: String },

    #[error("Failed to persist quote batch: {message}")]
    Persistence { message: String },

    #[error("Reference data error: {message}")]
    ReferenceData { message: String },

    #[error("Configuration error: {field}")]
    ConfigurationError { field: String },

    #[error("Shared component error: {0}")]
    SharedError(#[from] SharedError),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl EngineError {
    pub fn missing(field: impl Into<String>) -> Self {
        EngineError::MissingInput { field: field.into() }
    }

    pub fn config(field: impl Into<String>) -> Self {
        EngineError::ConfigurationError { field: field.into() }
    }

    pub fn persistence(message: impl std::fmt::Display) -> Self {
        EngineError::Persistence {
            message: message.to_string(),
        }
    }

    pub fn external(message: impl std::fmt::Display) -> Self {
        EngineError::ExternalServiceUnavailable {
            message: message.to_string(),
        }
    }

    /// True for errors the HTTP surface reports as not-found
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            EngineError::GroupNotFound { .. }
                | EngineError::NoMembers { .. }
                | EngineError::MemberNotFound { .. }
        )
    }

    /// True for errors caused by the caller's input
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            EngineError::MissingInput { .. }
                | EngineError::AgeUncomputable { .. }
                | EngineError::Benchmark(_)
                | EngineError::SharedError(_)
        )
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
