//! Plan and pricing join for one (county, age, tobacco) tuple

use std::collections::{HashMap, HashSet};

use crate::error::{EngineResult, LookupError};
use crate::traits::ReferenceStore;
use shared::{service_debug, CountyId, Plan, PlanId, PricingRow, ServiceId};

/// A plan together with its premium for the requested tuple
#[derive(Debug, Clone, PartialEq)]
pub struct PricedPlan {
    pub plan: Plan,
    pub premium: f64,
}

/// Plan ids in first-seen order without repeats
pub(crate) fn unique_plan_ids(plan_ids: Vec<PlanId>) -> Vec<PlanId> {
    let mut seen = HashSet::new();
    plan_ids
        .into_iter()
        .filter(|plan_id| seen.insert(plan_id.clone()))
        .collect()
}

/// Premium per plan; the first row wins when a tuple is duplicated
pub(crate) fn premiums_by_plan(rows: Vec<PricingRow>) -> HashMap<PlanId, f64> {
    let mut premiums = HashMap::with_capacity(rows.len());
    for row in rows {
        premiums.entry(row.plan_id).or_insert(row.premium);
    }
    premiums
}

/// Every plan in the county priced at (age, tobacco).
///
/// Plans without a price for the tuple are left out rather than reported;
/// partial availability is normal. Errors only when the county has no plans
/// or none of them is priced.
pub async fn priced_plans<R>(
    store: &R,
    county_id: &CountyId,
    age: u32,
    tobacco: bool,
) -> EngineResult<Vec<PricedPlan>>
where
    R: ReferenceStore + ?Sized,
{
    let plan_ids = unique_plan_ids(store.plan_ids_in_county(county_id).await?);
    if plan_ids.is_empty() {
        return Err(LookupError::NoPlansInCounty {
            county_id: county_id.clone(),
        }
        .into());
    }

    let rows = store.pricing(&plan_ids, age, tobacco).await?;
    if rows.is_empty() {
        return Err(LookupError::NoPricingForParameters {
            county_id: county_id.clone(),
            age,
            tobacco,
        }
        .into());
    }

    let premiums = premiums_by_plan(rows);
    let priced_ids: Vec<PlanId> = plan_ids
        .into_iter()
        .filter(|plan_id| premiums.contains_key(plan_id))
        .collect();

    let mut plans_by_id: HashMap<PlanId, Plan> = store
        .plans(&priced_ids)
        .await?
        .into_iter()
        .map(|plan| (plan.id.clone(), plan))
        .collect();

    let mut priced = Vec::with_capacity(priced_ids.len());
    for plan_id in priced_ids {
        match (plans_by_id.remove(&plan_id), premiums.get(&plan_id)) {
            (Some(plan), Some(&premium)) => priced.push(PricedPlan { plan, premium }),
            _ => {
                service_debug!(
                    ServiceId::current(),
                    "Priced plan {} has no metadata in county {}",
                    plan_id,
                    county_id
                );
            }
        }
    }

    Ok(priced)
}
