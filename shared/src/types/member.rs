//! Member records as read from the member directory

use super::{CountyId, MemberId, MemberZip, ZipCode};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Annual income components summed into the MAGI proxy
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IncomeComponents {
    pub adjusted_gross_income: f64,
    pub nontaxable_social_security: f64,
    pub tax_exempt_interest: f64,
    pub foreign_earned_income: f64,
}

impl IncomeComponents {
    pub fn magi(&self) -> f64 {
        self.adjusted_gross_income
            + self.nontaxable_social_security
            + self.tax_exempt_interest
            + self.foreign_earned_income
    }
}

fn default_household_size() -> u32 {
    1
}

/// A group member. Owned by member management; read-only here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    /// Identifier the external affordability service knows this member by
    #[serde(default)]
    pub external_id: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub zip_code: MemberZip,
    #[serde(default)]
    pub tobacco: bool,
    /// County already stored on the member record, if any
    #[serde(default)]
    pub county_id: Option<CountyId>,
    #[serde(default = "default_household_size")]
    pub household_size: u32,
    #[serde(default)]
    pub income: IncomeComponents,
    #[serde(default)]
    pub tax_year: Option<i32>,
    #[serde(default)]
    pub state_code: Option<String>,
    /// Monthly amount the member paid under the previous arrangement
    #[serde(default)]
    pub old_employee_contribution: f64,
}

impl Member {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name).trim().to_string()
    }
}

/// The member fields echoed back on every batch entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberSnapshot {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub zip_code: Option<ZipCode>,
    pub tobacco: bool,
    pub county_id: Option<CountyId>,
}

impl From<&Member> for MemberSnapshot {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            first_name: member.first_name.clone(),
            last_name: member.last_name.clone(),
            date_of_birth: member.date_of_birth,
            zip_code: member.zip_code.valid().cloned(),
            tobacco: member.tobacco,
            county_id: member.county_id.clone(),
        }
    }
}
