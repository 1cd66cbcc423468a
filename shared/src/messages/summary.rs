//! Employee cost comparison over the latest batch

use crate::types::{GroupId, MemberId, PlanId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Split a comma-separated filter value, dropping blanks
pub fn parse_filter_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

/// Market flag from text. `any`, blanks and unknown words mean no filter.
pub fn parse_market_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawList {
    Many(Vec<String>),
    One(String),
}

fn deserialize_filter_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(RawList::One(raw)) => parse_filter_list(&raw),
        Some(RawList::Many(values)) => values
            .into_iter()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .collect(),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawFlag {
    Flag(bool),
    Text(String),
}

fn deserialize_market_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<RawFlag>::deserialize(deserializer)? {
        None => None,
        Some(RawFlag::Flag(flag)) => Some(flag),
        Some(RawFlag::Text(raw)) => parse_market_flag(&raw),
    })
}

/// Plan filters for the comparison. Empty lists and `None` match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryFilters {
    /// Carrier names, matched case-insensitively
    #[serde(deserialize_with = "deserialize_filter_list")]
    pub carrier: Vec<String>,
    /// Metal levels, matched case-insensitively
    #[serde(deserialize_with = "deserialize_filter_list")]
    pub level: Vec<String>,
    #[serde(deserialize_with = "deserialize_market_flag")]
    pub on_market: Option<bool>,
}

impl SummaryFilters {
    /// Field by field, `self` wins wherever it is set
    pub fn or(self, fallback: SummaryFilters) -> SummaryFilters {
        SummaryFilters {
            carrier: if self.carrier.is_empty() { fallback.carrier } else { self.carrier },
            level: if self.level.is_empty() { fallback.level } else { self.level },
            on_market: self.on_market.or(fallback.on_market),
        }
    }
}

/// Body of `POST /groups/{id}/summary/employees`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmployeeSummaryRequest {
    /// Explicit plan choices; ignored for members not quoted that plan
    pub selected: BTreeMap<MemberId, PlanId>,
    pub filters: SummaryFilters,
    /// Monthly employer allowance per member; absent members get none
    pub allowances: BTreeMap<MemberId, f64>,
}

/// How the compared plan was picked for a member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChosenBy {
    Selected,
    CheapestFiltered,
    CheapestOverall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChosenPlan {
    pub carrier: String,
    pub display_name: String,
    pub metal_level: String,
    pub on_market: bool,
}

/// One member's old versus new monthly cost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRow {
    pub member_id: MemberId,
    pub name: String,
    pub selected_plan_id: Option<PlanId>,
    pub selected_plan: Option<ChosenPlan>,
    /// `None` when the member has no quotes to choose from
    pub chosen_by: Option<ChosenBy>,
    pub allowance_monthly: f64,
    pub old_out_of_pocket_monthly: f64,
    pub new_out_of_pocket_monthly: f64,
    pub monthly_savings: f64,
    pub annual_savings: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SummaryTotals {
    pub old_out_of_pocket_monthly: f64,
    pub new_out_of_pocket_monthly: f64,
    pub monthly_savings: f64,
    pub old_out_of_pocket_annual: f64,
    pub new_out_of_pocket_annual: f64,
    pub annual_savings: f64,
}

/// Response of `GET|POST /groups/{id}/summary/employees`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmployeeSummary {
    pub group_id: GroupId,
    /// Batch the rows were computed from; `None` before the first run
    pub batch_id: Option<Uuid>,
    pub filters_applied: SummaryFilters,
    pub employees: Vec<EmployeeRow>,
    pub totals: SummaryTotals,
}
