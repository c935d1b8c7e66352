mod patterns;

use std::collections::{BTreeMap, HashMap};

use chrono::Utc;
use pipecost_core::{
    AttributedQuery, Attribution, AttributionKey, AttributionSummary, QueryRecord, Unit,
    UsageEvent, parse_timestamp,
};
use tracing::debug;

use crate::error::Result;

pub use patterns::PatternIndex;

/// Attributions keyed by unit, plus the unattributed bucket when any query
/// matched nothing.
pub type AttributionMap = BTreeMap<AttributionKey, Attribution>;

/// Splits each query's credits across the units its text references.
///
/// A query matching `n` units adds `credits / n` and `bytes / n` (truncated)
/// to each of them and counts once for each. Execution time is not split; it
/// is averaged per unit over every query that touched it.
pub fn attribute_costs(queries: &[QueryRecord], index: &PatternIndex) -> AttributionMap {
    let mut attributions = AttributionMap::new();
    let mut execution_totals: HashMap<AttributionKey, f64> = HashMap::new();
    let mut unmatched = 0usize;

    for query in queries {
        let matched = index.match_units(&query.query_text);
        let keys: Vec<AttributionKey> = if matched.is_empty() {
            unmatched += 1;
            vec![AttributionKey::Unattributed]
        } else {
            matched.into_iter().map(AttributionKey::Unit).collect()
        };
        let ways = keys.len();
        let credits_share = query.credits_used / ways as f64;
        let bytes_share = query.bytes_scanned / ways as u64;

        for key in keys {
            *execution_totals.entry(key.clone()).or_insert(0.0) += query.execution_time as f64;
            let attribution = attributions
                .entry(key.clone())
                .or_insert_with(|| Attribution::new(key));
            attribution.total_credits += credits_share;
            attribution.query_count += 1;
            attribution.total_bytes_scanned =
                attribution.total_bytes_scanned.saturating_add(bytes_share);
            attribution.queries.push(AttributedQuery {
                query_id: query.query_id.clone(),
                credits_share,
                start_time: query.start_time.clone(),
                warehouse_name: query.warehouse_name.clone(),
            });
            if !query.warehouse_name.is_empty() {
                attribution.warehouses.push(query.warehouse_name.clone());
            }
        }
    }

    for (key, total) in execution_totals {
        if let Some(attribution) = attributions.get_mut(&key)
            && attribution.query_count > 0
        {
            attribution.avg_execution_time = total / attribution.query_count as f64;
        }
    }

    debug!(
        queries = queries.len(),
        keys = attributions.len(),
        unmatched,
        "attributed query costs"
    );
    attributions
}

/// Builds the pattern index for `units` and attributes `queries` against it.
pub fn attribute_to_units(queries: &[QueryRecord], units: &[Unit]) -> Result<AttributionMap> {
    let index = PatternIndex::new(units)?;
    Ok(attribute_costs(queries, &index))
}

/// Serialized attributions, highest spend first.
pub fn attribution_summaries(attributions: &AttributionMap) -> Vec<AttributionSummary> {
    let mut summaries: Vec<AttributionSummary> =
        attributions.values().map(Attribution::summary).collect();
    summaries.sort_by(|a, b| b.total_credits.total_cmp(&a.total_credits));
    summaries
}

/// Credits that matched no unit.
pub fn unattributed_credits(attributions: &AttributionMap) -> f64 {
    attributions
        .get(&AttributionKey::Unattributed)
        .map_or(0.0, |bucket| bucket.total_credits)
}

/// One usage event per attributed query share, skipping the unattributed
/// bucket. Shares whose start time cannot be parsed keep no timestamp.
pub fn usage_events_from_attributions(attributions: &AttributionMap) -> Vec<UsageEvent> {
    attributions
        .values()
        .filter_map(|attribution| {
            attribution
                .key
                .unit_name()
                .map(|unit| (unit, &attribution.queries))
        })
        .flat_map(|(unit, queries)| {
            queries.iter().map(move |query| UsageEvent {
                unit: unit.to_string(),
                credits: query.credits_share,
                start_time: parse_timestamp(&query.start_time)
                    .map(|parsed| parsed.with_timezone(&Utc)),
                warehouse: query.warehouse_name.clone(),
            })
        })
        .collect()
}
