//! Plain-text rendering of a quote batch for the terminal

use std::fmt::Write;

use shared::{QuoteBatch, QuoteOutcome};

/// One line per member, preceded by a header with the run totals
pub fn render_summary(batch: &QuoteBatch) -> String {
    let priced = batch.entries.iter().filter(|entry| entry.is_priced()).count();
    let skipped = batch.entries.iter().filter(|entry| entry.is_skipped()).count();
    let pending = batch.entries.len() - priced - skipped;

    let mut out = String::new();
    let _ = writeln!(
        out,
        "Batch {} for group {} (effective {}): {} priced, {} need a county, {} skipped",
        batch.id, batch.group_id, batch.run_context.effective_date, priced, pending, skipped
    );

    for entry in &batch.entries {
        let name = format!("{} {}", entry.member.first_name, entry.member.last_name);
        let detail = match &entry.outcome {
            QuoteOutcome::Priced {
                county_id,
                affordability,
                quotes,
                ..
            } => match quotes.first() {
                Some(lowest) => format!(
                    "county {}, {} plans, lowest {} at ${:.2}/mo after ${:.2} credit",
                    county_id,
                    quotes.len(),
                    lowest.plan_id,
                    lowest.adjusted_cost,
                    affordability.premium_tax_credit
                ),
                None => format!("county {county_id}, no plans"),
            },
            QuoteOutcome::NeedsCounty { zip_code, county_ids } => {
                let ids: Vec<&str> = county_ids.iter().map(|id| id.as_str()).collect();
                format!("ZIP {} spans counties {}", zip_code, ids.join(", "))
            }
            QuoteOutcome::Skipped { detail, .. } => detail.clone(),
        };
        let _ = writeln!(
            out,
            "  {:<12} {:<24} {:<13} {}",
            entry.member.id.as_str(),
            name.trim(),
            entry.status_label(),
            detail
        );
    }
    out
}
