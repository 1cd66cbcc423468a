//! Service-specific tests
//!
//! Each store or provider has its own test file; shared builders live in
//! `common`, including the `ReferenceData` builders the core tests use.

#[cfg(test)]
mod affordability;
#[cfg(test)]
mod batch_store;

// Common test utilities for services
#[cfg(test)]
pub mod common {
    use std::collections::BTreeMap;

    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    use shared::{
        County, CountyId, GroupId, IncomeComponents, Member, MemberId, Plan, PlanId, PricingRow,
        QuoteBatch, RunContext, ZipCode,
    };

    use crate::services::reference_store::{PlanCounty, RealReferenceStore, ReferenceData, ZipCounty};

    /// Dataset builders for unit tests across the crate
    impl ReferenceData {
        /// Add a plan offered in the given counties
        pub fn with_plan(mut self, plan: Plan, county_ids: &[&str]) -> Self {
            for county_id in county_ids {
                self.plan_counties.push(PlanCounty {
                    plan_id: plan.id.clone(),
                    county_id: CountyId::from(*county_id),
                });
            }
            self.plans.push(plan);
            self
        }

        pub fn with_price(mut self, plan_id: &str, age: u32, tobacco: bool, premium: f64) -> Self {
            self.pricing.push(PricingRow {
                plan_id: PlanId::from(plan_id),
                age,
                tobacco,
                premium,
            });
            self
        }

        pub fn with_zip(mut self, zip_code: ZipCode, county_id: &str) -> Self {
            self.zip_counties.push(ZipCounty {
                zip_code,
                county_id: CountyId::from(county_id),
            });
            self
        }

        pub fn with_county(mut self, county_id: &str, name: &str, state_code: &str) -> Self {
            self.counties.push(County {
                id: CountyId::from(county_id),
                name: name.to_string(),
                state_code: Some(state_code.to_string()),
            });
            self
        }

        /// Plan record with placeholder display fields
        pub fn sample_plan(id: &str, carrier: &str, metal_level: &str, on_market: bool) -> Plan {
            Plan {
                id: PlanId::from(id),
                carrier: carrier.to_string(),
                display_name: format!("{carrier} {metal_level} {id}"),
                plan_type: Some("HMO".to_string()),
                metal_level: metal_level.to_string(),
                on_market,
                network_name: None,
                summary_url: None,
            }
        }

        pub fn into_store(self) -> RealReferenceStore {
            RealReferenceStore::from_data(self)
        }
    }

    pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).expect("valid test date")
    }

    pub fn test_member(id: &str, first_name: &str, last_name: &str) -> Member {
        Member {
            id: MemberId::from(id),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            external_id: None,
            date_of_birth: Some(date(1985, 6, 15)),
            zip_code: ZipCode::parse("30301").expect("valid test ZIP").into(),
            tobacco: false,
            county_id: None,
            household_size: 1,
            income: IncomeComponents {
                adjusted_gross_income: 30_000.0,
                ..IncomeComponents::default()
            },
            tax_year: None,
            state_code: Some("GA".to_string()),
            old_employee_contribution: 0.0,
        }
    }

    /// Empty batch created `minute` minutes past a fixed hour
    pub fn test_batch(group_id: &str, minute: u32) -> QuoteBatch {
        QuoteBatch {
            id: Uuid::new_v4(),
            group_id: GroupId::from(group_id),
            created_at: Utc
                .with_ymd_and_hms(2025, 1, 1, 12, minute, 0)
                .single()
                .expect("valid test timestamp"),
            entries: Vec::new(),
            run_context: RunContext {
                member_count: 0,
                effective_date: date(2025, 1, 1),
                tobacco: None,
                county_override: None,
                county_choices: BTreeMap::new(),
            },
        }
    }
}
