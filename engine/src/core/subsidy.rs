//! Premium tax credit calculation (pure, no I/O)

use crate::core::poverty::PovertyGuidelines;
use crate::error::SubsidyError;
use shared::{IncomeComponents, SubsidyBreakdown};

/// (percent of FPL, applicable percentage) breakpoints; linear between them,
/// flat past the last one
const APPLICABLE_PERCENTAGE_SCALE: [(f64, f64); 5] = [
    (150.0, 0.0),
    (200.0, 0.02),
    (250.0, 0.04),
    (300.0, 0.06),
    (400.0, 0.085),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SubsidyInput {
    pub income: IncomeComponents,
    pub household_size: u32,
    pub tax_year: i32,
    pub state_code: Option<String>,
    /// Monthly
    pub benchmark_premium: f64,
}

/// Share of income the household is expected to contribute, as a decimal
pub fn applicable_percentage(fpl_percent: f64) -> f64 {
    let mut lower = APPLICABLE_PERCENTAGE_SCALE[0];
    if fpl_percent.is_nan() || fpl_percent <= lower.0 {
        return 0.0;
    }

    for &upper in &APPLICABLE_PERCENTAGE_SCALE[1..] {
        if fpl_percent <= upper.0 {
            let t = (fpl_percent - lower.0) / (upper.0 - lower.0);
            return lower.1 + t * (upper.1 - lower.1);
        }
        lower = upper;
    }
    lower.1
}

/// Monthly premium tax credit with every intermediate value
pub fn calculate_subsidy(
    input: &SubsidyInput,
    guidelines: &PovertyGuidelines,
) -> Result<SubsidyBreakdown, SubsidyError> {
    let magi = input.income.magi();
    let household_size = input.household_size.max(1);
    let fpl_annual =
        guidelines.annual_fpl(input.tax_year, household_size, input.state_code.as_deref())?;

    let fpl_percent = if fpl_annual > 0.0 {
        magi / fpl_annual * 100.0
    } else {
        0.0
    };
    let applicable = applicable_percentage(fpl_percent);
    let expected_annual = magi * applicable;
    let expected_monthly = expected_annual / 12.0;
    let premium_tax_credit = (input.benchmark_premium - expected_monthly).max(0.0);

    Ok(SubsidyBreakdown {
        magi,
        household_size,
        tax_year: input.tax_year,
        state_code: input.state_code.clone(),
        fpl_annual,
        fpl_percent,
        applicable_percentage: applicable,
        expected_annual_contribution: expected_annual,
        expected_monthly_contribution: expected_monthly,
        benchmark_premium: input.benchmark_premium,
        premium_tax_credit,
    })
}
