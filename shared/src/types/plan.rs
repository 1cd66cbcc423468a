//! Plan reference records

use super::{CountyId, PlanId};
use serde::{Deserialize, Serialize};

/// Plan metadata. Immutable reference data; a clone is snapshotted onto every quote line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    pub id: PlanId,
    pub carrier: String,
    pub display_name: String,
    #[serde(default)]
    pub plan_type: Option<String>,
    pub metal_level: String,
    /// Sold through the public exchange (subsidy-eligible)
    pub on_market: bool,
    #[serde(default)]
    pub network_name: Option<String>,
    #[serde(default)]
    pub summary_url: Option<String>,
}

impl Plan {
    pub fn is_silver(&self) -> bool {
        self.metal_level.trim().eq_ignore_ascii_case("silver")
    }
}

/// Premium for one (plan, age, tobacco) tuple
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingRow {
    pub plan_id: PlanId,
    pub age: u32,
    pub tobacco: bool,
    pub premium: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct County {
    pub id: CountyId,
    pub name: String,
    #[serde(default)]
    pub state_code: Option<String>,
}
