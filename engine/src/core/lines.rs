//! Quote line assembly and batch-level summaries

use std::collections::BTreeSet;

use crate::core::lookup::PricedPlan;
use shared::{AffordabilitySummary, FilterOptions, Plan, QuoteBatch, QuoteLine};

/// Cost after the tax credit. Only on-market plans are reduced.
pub fn adjusted_cost(plan: &Plan, premium: f64, premium_tax_credit: f64) -> f64 {
    if plan.on_market {
        (premium - premium_tax_credit).max(0.0)
    } else {
        premium
    }
}

/// One line per priced plan, ascending by adjusted cost (ties: premium, then plan id)
pub fn build_quote_lines(priced: Vec<PricedPlan>, affordability: &AffordabilitySummary) -> Vec<QuoteLine> {
    let mut lines: Vec<QuoteLine> = priced
        .into_iter()
        .map(|PricedPlan { plan, premium }| QuoteLine {
            plan_id: plan.id.clone(),
            premium,
            adjusted_cost: adjusted_cost(&plan, premium, affordability.premium_tax_credit),
            benchmark_plan_id: affordability.benchmark_plan_id.clone(),
            benchmark_premium: affordability.benchmark_premium,
            plan_details: plan,
        })
        .collect();

    lines.sort_by(|a, b| {
        a.adjusted_cost
            .total_cmp(&b.adjusted_cost)
            .then_with(|| a.premium.total_cmp(&b.premium))
            .then_with(|| a.plan_id.cmp(&b.plan_id))
    });
    lines
}

/// Distinct carriers, lowercase metal levels and market flags across a batch
pub fn filter_options(batch: &QuoteBatch) -> FilterOptions {
    let mut carriers = BTreeSet::new();
    let mut levels = BTreeSet::new();
    let mut markets = BTreeSet::new();

    for line in batch.entries.iter().flat_map(|entry| entry.quotes()) {
        let plan = &line.plan_details;
        if !plan.carrier.is_empty() {
            carriers.insert(plan.carrier.clone());
        }
        if !plan.metal_level.is_empty() {
            levels.insert(plan.metal_level.to_lowercase());
        }
        markets.insert(plan.on_market);
    }

    FilterOptions {
        carriers: carriers.into_iter().collect(),
        levels: levels.into_iter().collect(),
        on_market: markets.into_iter().collect(),
    }
}
