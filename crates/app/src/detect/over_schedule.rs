use std::collections::HashMap;

use chrono::{DateTime, Utc};
use pipecost_core::{Finding, FindingCategory, Severity, UsageEvent, percent_of, round_to};
use tracing::warn;

use crate::config::WastePolicy;
use crate::detect::{CostMap, sort_by_savings};

const HOURS_PER_DAY: f64 = 24.0;
const MIN_GAP_FOR_RATE_HOURS: f64 = 0.1;

fn mean_gap_hours(times: &mut [DateTime<Utc>]) -> Option<f64> {
    if times.len() < 2 {
        return None;
    }
    times.sort();
    let gaps: Vec<f64> = times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / 3_600_000.0)
        .collect();
    Some(gaps.iter().sum::<f64>() / gaps.len() as f64)
}

/// Runs grouped by unit name, in first-seen order.
fn runs_by_unit(events: &[UsageEvent]) -> Vec<(&str, Vec<DateTime<Utc>>)> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut runs: Vec<(&str, Vec<DateTime<Utc>>)> = Vec::new();
    let mut undated = 0usize;
    for event in events {
        let Some(start_time) = event.start_time else {
            undated += 1;
            continue;
        };
        let slot = *index.entry(event.unit.as_str()).or_insert_with(|| {
            runs.push((event.unit.as_str(), Vec::new()));
            runs.len() - 1
        });
        runs[slot].1.push(start_time);
    }
    if undated > 0 {
        warn!(undated, "events without a start time are left out of schedule checks");
    }
    runs
}

/// Units whose runs come, on average, every few hours or more often.
pub fn detect_over_scheduling(events: &[UsageEvent], policy: &WastePolicy) -> Vec<Finding> {
    over_scheduled_by_cost(events, &CostMap::from_events(events), policy)
}

pub(crate) fn over_scheduled_by_cost(
    events: &[UsageEvent],
    costs: &CostMap<'_>,
    policy: &WastePolicy,
) -> Vec<Finding> {
    let min_runs = policy.over_schedule_min_runs.max(2);
    let mut findings = Vec::new();
    for (unit, mut times) in runs_by_unit(events) {
        if times.len() < min_runs {
            continue;
        }
        let Some(gap) = mean_gap_hours(&mut times) else {
            continue;
        };
        if gap > policy.over_schedule_max_gap_hours {
            continue;
        }
        let credits = costs.credits(unit);
        let runs_per_day = HOURS_PER_DAY / gap.max(MIN_GAP_FOR_RATE_HOURS);
        let savings = percent_of(credits, costs.total()) * policy.over_schedule_recovery_ratio;
        let severity = if gap <= policy.over_schedule_critical_gap_hours {
            Severity::Critical
        } else {
            Severity::Warning
        };
        let interval = (gap * policy.suggested_interval_multiplier)
            .max(policy.suggested_interval_floor_hours);
        findings.push(Finding {
            category: FindingCategory::OverSchedule,
            severity,
            units: vec![unit.to_string()],
            detail: format!("Every {gap:.1}h ({runs_per_day:.0}x/day), {credits:.1} credits"),
            estimated_savings_pct: round_to(savings, 1),
            recommendation: format!("Reduce to every {interval:.0}h + switch to incremental"),
        });
    }
    sort_by_savings(&mut findings);
    findings
}
