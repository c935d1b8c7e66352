use pipecost_core::{Finding, FindingCategory, Severity, Unit, UsageEvent, percent_of, round_to};

use crate::config::WastePolicy;
use crate::detect::{CostMap, sort_by_savings};

/// Units that feed nothing downstream yet still spend a noticeable share of
/// all credits.
pub fn detect_zombies(
    units: &[Unit],
    events: &[UsageEvent],
    policy: &WastePolicy,
) -> Vec<Finding> {
    zombies_by_cost(units, &CostMap::from_events(events), policy)
}

pub(crate) fn zombies_by_cost(
    units: &[Unit],
    costs: &CostMap<'_>,
    policy: &WastePolicy,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for unit in units {
        let credits = costs.credits(&unit.name);
        if !unit.downstream.is_empty() || credits <= 0.0 {
            continue;
        }
        let pct = percent_of(credits, costs.total());
        if pct < policy.zombie_min_pct {
            continue;
        }
        let severity = if pct >= policy.zombie_critical_pct {
            Severity::Critical
        } else {
            Severity::Warning
        };
        findings.push(Finding {
            category: FindingCategory::Zombie,
            severity,
            units: vec![unit.name.clone()],
            detail: format!("Costs {pct:.1}% ({credits:.1} credits), zero downstream"),
            estimated_savings_pct: round_to(pct, 1),
            recommendation: format!("Archive '{}' to save ~{pct:.1}%", unit.name),
        });
    }
    sort_by_savings(&mut findings);
    findings
}
