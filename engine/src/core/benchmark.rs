//! Second-lowest-cost silver plan (SLCSP) benchmark

use crate::core::lookup::{premiums_by_plan, unique_plan_ids};
use crate::error::{BenchmarkError, EngineResult};
use crate::traits::ReferenceStore;
use shared::{Benchmark, CountyId, PlanId, SilverCandidate};

/// Rank priced silver candidates and pick the benchmark.
///
/// Candidates are ordered by premium, then plan id. The second entry is the
/// benchmark when there are at least two; a lone candidate falls back to rank 1.
pub fn select_benchmark(mut candidates: Vec<SilverCandidate>) -> Option<Benchmark> {
    candidates.sort_by(|a, b| {
        a.premium
            .total_cmp(&b.premium)
            .then_with(|| a.plan_id.cmp(&b.plan_id))
    });

    let index = match candidates.len() {
        0 => return None,
        1 => 0,
        _ => 1,
    };
    let chosen = &candidates[index];

    Some(Benchmark {
        plan_id: chosen.plan_id.clone(),
        premium: chosen.premium,
        slcsp_rank: index as u8 + 1,
        silver_candidates: candidates,
    })
}

/// Benchmark for (county, age, tobacco), considering on-market silver plans only
pub async fn benchmark_silver<R>(
    store: &R,
    county_id: &CountyId,
    age: u32,
    tobacco: bool,
) -> EngineResult<Benchmark>
where
    R: ReferenceStore + ?Sized,
{
    let plan_ids = unique_plan_ids(store.plan_ids_in_county(county_id).await?);
    if plan_ids.is_empty() {
        return Err(BenchmarkError::NoPlansInCounty {
            county_id: county_id.clone(),
        }
        .into());
    }

    let silver: Vec<_> = store
        .plans(&plan_ids)
        .await?
        .into_iter()
        .filter(|plan| plan.on_market && plan.is_silver())
        .collect();
    if silver.is_empty() {
        return Err(BenchmarkError::NoSilverPlans {
            county_id: county_id.clone(),
        }
        .into());
    }

    let silver_ids: Vec<PlanId> = silver.iter().map(|plan| plan.id.clone()).collect();
    let rows = store.pricing(&silver_ids, age, tobacco).await?;
    if rows.is_empty() {
        return Err(BenchmarkError::NoSilverPricing {
            county_id: county_id.clone(),
        }
        .into());
    }

    let premiums = premiums_by_plan(rows);
    let candidates: Vec<SilverCandidate> = silver
        .into_iter()
        .filter_map(|plan| {
            premiums.get(&plan.id).map(|&premium| SilverCandidate {
                plan_id: plan.id,
                premium,
                carrier: plan.carrier,
                display_name: plan.display_name,
            })
        })
        .collect();

    select_benchmark(candidates).ok_or_else(|| {
        BenchmarkError::NoPricedSilverPlans {
            county_id: county_id.clone(),
        }
        .into()
    })
}
