use pipecost_core::{Finding, FindingSummary, Unit, UsageEvent, WasteReport, round_to};
use tracing::info;

use crate::config::WastePolicy;
use crate::detect::{CostMap, over_scheduled_by_cost, redundant_by_cost, zombies_by_cost};

/// Runs every detector and assembles the report. The detectors are
/// independent, so they run side by side; the result does not depend on it.
///
/// `unattributed_credits` is spend that matched no unit. It has no events of
/// its own but still counts toward the total every share is measured against.
pub fn analyze(
    units: &[Unit],
    events: &[UsageEvent],
    unattributed_credits: f64,
    policy: &WastePolicy,
) -> WasteReport {
    let costs = CostMap::from_events(events).with_unattributed(unattributed_credits);
    let (zombies, (over_scheduled, redundant)) = rayon::join(
        || zombies_by_cost(units, &costs, policy),
        || {
            rayon::join(
                || over_scheduled_by_cost(events, &costs, policy),
                || redundant_by_cost(units, &costs, policy),
            )
        },
    );
    let report = assemble_report(costs.total(), zombies, over_scheduled, redundant, policy);
    info!(
        units = units.len(),
        events = events.len(),
        unattributed_credits,
        findings = report.findings.len(),
        savings_pct = report.savings_pct,
        "analysis complete"
    );
    report
}

/// Concatenates findings category by category, keeping each detector's own
/// order, and caps the summed savings at the policy ceiling.
pub fn assemble_report(
    total_credits: f64,
    zombies: Vec<Finding>,
    over_scheduled: Vec<Finding>,
    redundant: Vec<Finding>,
    policy: &WastePolicy,
) -> WasteReport {
    let summary = FindingSummary {
        zombies: zombies.len(),
        over_scheduled: over_scheduled.len(),
        redundant: redundant.len(),
    };
    let findings: Vec<Finding> = zombies
        .into_iter()
        .chain(over_scheduled)
        .chain(redundant)
        .collect();
    let raw_savings: f64 = findings
        .iter()
        .map(|finding| finding.estimated_savings_pct)
        .sum();
    WasteReport {
        total_credits,
        findings,
        savings_pct: round_to(raw_savings.min(policy.savings_cap_pct), 1),
        summary,
    }
}
