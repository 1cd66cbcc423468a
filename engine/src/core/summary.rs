//! Employee cost comparison over one batch

use std::collections::BTreeMap;

use shared::{
    ChosenBy, ChosenPlan, EmployeeRow, EmployeeSummary, EmployeeSummaryRequest, GroupId, Member, MemberId,
    PlanId, QuoteBatch, QuoteLine, SummaryFilters, SummaryTotals,
};

/// Round to whole cents
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// Whether a quote line passes every set filter
pub fn passes_filters(line: &QuoteLine, filters: &SummaryFilters) -> bool {
    let plan = &line.plan_details;
    let listed = |allowed: &[String], value: &str| {
        allowed.is_empty() || allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(value))
    };

    listed(&filters.carrier, &plan.carrier)
        && listed(&filters.level, &plan.metal_level)
        && filters.on_market.map_or(true, |on_market| plan.on_market == on_market)
}

fn cheapest<'a>(lines: impl Iterator<Item = &'a QuoteLine>) -> Option<&'a QuoteLine> {
    lines.min_by(|a, b| a.adjusted_cost.total_cmp(&b.adjusted_cost))
}

/// The plan compared for one member: an explicit selection the member was
/// quoted, else the cheapest line passing the filters, else the cheapest line.
pub fn choose_plan<'a>(
    quotes: &'a [QuoteLine],
    selected: Option<&PlanId>,
    filters: &SummaryFilters,
) -> Option<(&'a QuoteLine, ChosenBy)> {
    if let Some(line) = selected.and_then(|plan_id| quotes.iter().find(|line| &line.plan_id == plan_id)) {
        return Some((line, ChosenBy::Selected));
    }
    cheapest(quotes.iter().filter(|line| passes_filters(line, filters)))
        .map(|line| (line, ChosenBy::CheapestFiltered))
        .or_else(|| cheapest(quotes.iter()).map(|line| (line, ChosenBy::CheapestOverall)))
}

/// Unrounded monthly costs of one member
struct MonthlyCosts {
    old: f64,
    new: f64,
}

fn employee_row(member: &Member, quotes: &[QuoteLine], request: &EmployeeSummaryRequest) -> (EmployeeRow, MonthlyCosts) {
    let allowance = request.allowances.get(&member.id).copied().unwrap_or(0.0);
    let chosen = choose_plan(quotes, request.selected.get(&member.id), &request.filters);

    // Adjusted cost is already net of the tax credit
    let plan_cost = chosen.map_or(0.0, |(line, _)| line.adjusted_cost);
    let costs = MonthlyCosts {
        old: member.old_employee_contribution,
        new: (plan_cost - allowance).max(0.0),
    };
    let savings = costs.old - costs.new;

    let row = EmployeeRow {
        member_id: member.id.clone(),
        name: member.full_name(),
        selected_plan_id: chosen.map(|(line, _)| line.plan_id.clone()),
        selected_plan: chosen.map(|(line, _)| ChosenPlan {
            carrier: line.plan_details.carrier.clone(),
            display_name: line.plan_details.display_name.clone(),
            metal_level: line.plan_details.metal_level.clone(),
            on_market: line.plan_details.on_market,
        }),
        chosen_by: chosen.map(|(_, chosen_by)| chosen_by),
        allowance_monthly: round_cents(allowance),
        old_out_of_pocket_monthly: round_cents(costs.old),
        new_out_of_pocket_monthly: round_cents(costs.new),
        monthly_savings: round_cents(savings),
        annual_savings: round_cents(savings * 12.0),
    };
    (row, costs)
}

/// One row per member of the group, priced against `batch` when there is one.
/// Totals are summed before rounding.
pub fn employee_summary(
    group_id: &GroupId,
    members: &[Member],
    batch: Option<&QuoteBatch>,
    request: &EmployeeSummaryRequest,
) -> EmployeeSummary {
    let quotes_by_member: BTreeMap<&MemberId, &[QuoteLine]> = batch
        .map(|batch| {
            batch
                .entries
                .iter()
                .map(|entry| (&entry.member.id, entry.quotes()))
                .collect()
        })
        .unwrap_or_default();

    let mut old_total = 0.0;
    let mut new_total = 0.0;
    let mut employees = Vec::with_capacity(members.len());
    for member in members {
        let quotes = quotes_by_member.get(&member.id).copied().unwrap_or(&[]);
        let (row, costs) = employee_row(member, quotes, request);
        old_total += costs.old;
        new_total += costs.new;
        employees.push(row);
    }

    let savings_total = old_total - new_total;
    EmployeeSummary {
        group_id: group_id.clone(),
        batch_id: batch.map(|batch| batch.id),
        filters_applied: request.filters.clone(),
        employees,
        totals: SummaryTotals {
            old_out_of_pocket_monthly: round_cents(old_total),
            new_out_of_pocket_monthly: round_cents(new_total),
            monthly_savings: round_cents(savings_total),
            old_out_of_pocket_annual: round_cents(old_total * 12.0),
            new_out_of_pocket_annual: round_cents(new_total * 12.0),
            annual_savings: round_cents(savings_total * 12.0),
        },
    }
}
