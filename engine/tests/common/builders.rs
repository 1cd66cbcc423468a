//! Reference dataset builders for engine tests

use engine::services::reference_store::{PlanCounty, ZipCounty};
use engine::services::{RealReferenceStore, ReferenceData};
use shared::{County, CountyId, Plan, PlanId, PricingRow, ZipCode};

/// Builder methods for small reference datasets
pub trait ReferenceDataBuilder: Sized {
    fn with_plan(self, plan: Plan, county_ids: &[&str]) -> Self;
    fn with_price(self, plan_id: &str, age: u32, tobacco: bool, premium: f64) -> Self;
    fn with_zip(self, zip_code: ZipCode, county_id: &str) -> Self;
    fn with_county(self, county_id: &str, name: &str, state_code: &str) -> Self;
    fn into_store(self) -> RealReferenceStore;
}

impl ReferenceDataBuilder for ReferenceData {
    fn with_plan(mut self, plan: Plan, county_ids: &[&str]) -> Self {
        for county_id in county_ids {
            self.plan_counties.push(PlanCounty {
                plan_id: plan.id.clone(),
                county_id: CountyId::from(*county_id),
            });
        }
        self.plans.push(plan);
        self
    }

    fn with_price(mut self, plan_id: &str, age: u32, tobacco: bool, premium: f64) -> Self {
        self.pricing.push(PricingRow {
            plan_id: PlanId::from(plan_id),
            age,
            tobacco,
            premium,
        });
        self
    }

    fn with_zip(mut self, zip_code: ZipCode, county_id: &str) -> Self {
        self.zip_counties.push(ZipCounty {
            zip_code,
            county_id: CountyId::from(county_id),
        });
        self
    }

    fn with_county(mut self, county_id: &str, name: &str, state_code: &str) -> Self {
        self.counties.push(County {
            id: CountyId::from(county_id),
            name: name.to_string(),
            state_code: Some(state_code.to_string()),
        });
        self
    }

    fn into_store(self) -> RealReferenceStore {
        RealReferenceStore::from_data(self)
    }
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
