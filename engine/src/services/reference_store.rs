//! Reference data store backed by a JSON dataset loaded into memory
//!
//! The dataset is produced elsewhere (bulk import); it is only read here.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::{EngineError, EngineResult};
use crate::traits::ReferenceStore;
use shared::{service_debug, County, CountyId, Plan, PlanId, PricingRow, ServiceId, ZipCode};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanCounty {
    pub plan_id: PlanId,
    pub county_id: CountyId,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZipCounty {
    pub zip_code: ZipCode,
    pub county_id: CountyId,
}

/// On-disk shape of the reference dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReferenceData {
    pub plans: Vec<Plan>,
    pub pricing: Vec<PricingRow>,
    pub plan_counties: Vec<PlanCounty>,
    pub zip_counties: Vec<ZipCounty>,
    pub counties: Vec<County>,
}

/// In-memory indexes over a [`ReferenceData`] snapshot
pub struct RealReferenceStore {
    plans: HashMap<PlanId, Plan>,
    premiums: HashMap<(PlanId, u32, bool), f64>,
    plans_by_county: HashMap<CountyId, Vec<PlanId>>,
    counties_by_zip: HashMap<ZipCode, Vec<CountyId>>,
    counties: HashMap<CountyId, County>,
}

impl RealReferenceStore {
    pub fn from_data(data: ReferenceData) -> Self {
        let mut premiums = HashMap::with_capacity(data.pricing.len());
        for row in data.pricing {
            premiums
                .entry((row.plan_id, row.age, row.tobacco))
                .or_insert(row.premium);
        }

        let mut plans_by_county: HashMap<CountyId, Vec<PlanId>> = HashMap::new();
        for link in data.plan_counties {
            plans_by_county.entry(link.county_id).or_default().push(link.plan_id);
        }

        let mut counties_by_zip: HashMap<ZipCode, Vec<CountyId>> = HashMap::new();
        for link in data.zip_counties {
            counties_by_zip.entry(link.zip_code).or_default().push(link.county_id);
        }

        Self {
            plans: data.plans.into_iter().map(|plan| (plan.id.clone(), plan)).collect(),
            premiums,
            plans_by_county,
            counties_by_zip,
            counties: data
                .counties
                .into_iter()
                .map(|county| (county.id.clone(), county))
                .collect(),
        }
    }

    /// Load the dataset from a JSON file
    pub async fn load(path: &Path) -> EngineResult<Self> {
        let content = fs::read_to_string(path).await.map_err(|e| EngineError::ReferenceData {
            message: format!("reading {}: {e}", path.display()),
        })?;
        let data: ReferenceData =
            serde_json::from_str(&content).map_err(|e| EngineError::ReferenceData {
                message: format!("parsing {}: {e}", path.display()),
            })?;

        service_debug!(
            ServiceId::current(),
            "📚 Loaded reference data: {} plans, {} pricing rows, {} ZIP links",
            data.plans.len(),
            data.pricing.len(),
            data.zip_counties.len()
        );
        Ok(Self::from_data(data))
    }
}

#[async_trait]
impl ReferenceStore for RealReferenceStore {
    async fn counties_for_zip(&self, zip_code: &ZipCode) -> EngineResult<Vec<CountyId>> {
        Ok(self.counties_by_zip.get(zip_code).cloned().unwrap_or_default())
    }

    async fn plan_ids_in_county(&self, county_id: &CountyId) -> EngineResult<Vec<PlanId>> {
        Ok(self.plans_by_county.get(county_id).cloned().unwrap_or_default())
    }

    async fn plans(&self, plan_ids: &[PlanId]) -> EngineResult<Vec<Plan>> {
        let mut seen = HashSet::new();
        Ok(plan_ids
            .iter()
            .filter(|plan_id| seen.insert(*plan_id))
            .filter_map(|plan_id| self.plans.get(plan_id).cloned())
            .collect())
    }

    async fn pricing(&self, plan_ids: &[PlanId], age: u32, tobacco: bool) -> EngineResult<Vec<PricingRow>> {
        let mut seen = HashSet::new();
        Ok(plan_ids
            .iter()
            .filter(|plan_id| seen.insert(*plan_id))
            .filter_map(|plan_id| {
                self.premiums
                    .get(&(plan_id.clone(), age, tobacco))
                    .map(|&premium| PricingRow {
                        plan_id: plan_id.clone(),
                        age,
                        tobacco,
                        premium,
                    })
            })
            .collect())
    }

    async fn counties(&self, county_ids: &[CountyId]) -> EngineResult<Vec<County>> {
        Ok(county_ids
            .iter()
            .filter_map(|county_id| self.counties.get(county_id).cloned())
            .collect())
    }
}
