use std::collections::BTreeMap;

use pipecost_core::{
    AttributionKey, MonthSummary, MonthlyBreakdown, RankedContributor, month_key, percent_of,
    round_to,
};

use crate::attribution::AttributionMap;

/// Buckets attributed credit shares by calendar month and ranks the top
/// `top_n` contributors of each month.
///
/// The overall total is summed from the attribution totals, not from the
/// month buckets, so the two can be reconciled against each other.
pub fn monthly_breakdown(attributions: &AttributionMap, top_n: usize) -> MonthlyBreakdown {
    let mut monthly: BTreeMap<String, BTreeMap<&AttributionKey, f64>> = BTreeMap::new();
    let mut total_credits = 0.0;

    for (key, attribution) in attributions {
        for query in &attribution.queries {
            *monthly
                .entry(month_key(&query.start_time))
                .or_default()
                .entry(key)
                .or_insert(0.0) += query.credits_share;
        }
        total_credits += attribution.total_credits;
    }

    let months = monthly
        .into_iter()
        .map(|(month, contributions)| {
            let month_total: f64 = contributions.values().sum();
            let mut ranked: Vec<(&AttributionKey, f64)> = contributions.into_iter().collect();
            ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
            ranked.truncate(top_n);
            let top_models = ranked
                .into_iter()
                .map(|(model, credits)| RankedContributor {
                    model: model.clone(),
                    credits: round_to(credits, 4),
                    pct: round_to(percent_of(credits, month_total), 2),
                })
                .collect();
            let summary = MonthSummary {
                total_credits: round_to(month_total, 4),
                top_models,
            };
            (month, summary)
        })
        .collect();

    MonthlyBreakdown {
        total_credits: round_to(total_credits, 4),
        months,
    }
}
