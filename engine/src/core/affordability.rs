//! Affordability summaries from internal and external determinations

use crate::traits::ExternalAffordability;
use shared::{AffordabilitySource, AffordabilitySummary, Benchmark, SubsidyBreakdown};

/// Summary computed from the benchmark and the subsidy calculation
pub fn internal_summary(benchmark: &Benchmark, breakdown: &SubsidyBreakdown) -> AffordabilitySummary {
    AffordabilitySummary {
        fpl_percent: Some(breakdown.fpl_percent),
        expected_contribution: Some(breakdown.expected_monthly_contribution),
        benchmark_plan_id: Some(benchmark.plan_id.clone()),
        benchmark_premium: Some(benchmark.premium),
        premium_tax_credit: breakdown.premium_tax_credit,
        affordable: Some(breakdown.premium_tax_credit == 0.0),
        source: AffordabilitySource::Internal,
    }
}

/// Use the external credit when present; fields it leaves out are filled
/// from the internal summary. `None` when the external determination has no credit.
pub fn merge_external(
    external: &ExternalAffordability,
    internal: Option<&AffordabilitySummary>,
) -> Option<AffordabilitySummary> {
    let premium_tax_credit = external.premium_tax_credit?;

    Some(AffordabilitySummary {
        fpl_percent: external
            .fpl_percent
            .or_else(|| internal.and_then(|s| s.fpl_percent)),
        expected_contribution: external
            .expected_contribution
            .or_else(|| internal.and_then(|s| s.expected_contribution)),
        benchmark_plan_id: external
            .benchmark_plan_id
            .clone()
            .or_else(|| internal.and_then(|s| s.benchmark_plan_id.clone())),
        benchmark_premium: external
            .benchmark_premium
            .or_else(|| internal.and_then(|s| s.benchmark_premium)),
        premium_tax_credit,
        affordable: external.affordable.or_else(|| internal.and_then(|s| s.affordable)),
        source: AffordabilitySource::External,
    })
}
