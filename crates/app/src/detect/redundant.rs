use std::collections::HashMap;

use pipecost_core::{Finding, FindingCategory, Severity, Unit, UsageEvent, percent_of, round_to};

use crate::config::WastePolicy;
use crate::detect::{CostMap, sort_by_savings};

/// Unit names sharing a fingerprint, groups and members both in input order.
fn fingerprint_groups(units: &[Unit]) -> Vec<Vec<&str>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&str>> = Vec::new();
    for unit in units.iter().filter(|unit| !unit.fingerprint.is_empty()) {
        let slot = *index.entry(unit.fingerprint.as_str()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(unit.name.as_str());
    }
    groups
}

/// Units with identical defining SQL. All but one copy of the group's cost is
/// counted as recoverable; the first member listed is the one to keep.
pub fn detect_redundant(
    units: &[Unit],
    events: &[UsageEvent],
    policy: &WastePolicy,
) -> Vec<Finding> {
    redundant_by_cost(units, &CostMap::from_events(events), policy)
}

pub(crate) fn redundant_by_cost(
    units: &[Unit],
    costs: &CostMap<'_>,
    policy: &WastePolicy,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    for names in fingerprint_groups(units) {
        if names.len() < 2 {
            continue;
        }
        let members = names.len() as f64;
        let cost: f64 = names.iter().map(|name| costs.credits(name)).sum();
        let savings = percent_of(cost * (members - 1.0) / members, costs.total());
        let severity = if savings > policy.redundant_critical_pct {
            Severity::Critical
        } else {
            Severity::Warning
        };
        findings.push(Finding {
            category: FindingCategory::Redundant,
            severity,
            units: names.iter().map(|name| name.to_string()).collect(),
            detail: format!("{} models, identical SQL, {cost:.1} credits", names.len()),
            estimated_savings_pct: round_to(savings, 1),
            recommendation: format!("Consolidate into '{}'", names[0]),
        });
    }
    sort_by_savings(&mut findings);
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::fixtures::{base, pipeline};

    fn revenue_models() -> (Vec<Unit>, Vec<UsageEvent>) {
        let units = vec![
            Unit::new("revenue_v1", "table").with_fingerprint("same_hash_abc"),
            Unit::new("revenue_v2", "table").with_fingerprint("same_hash_abc"),
            Unit::new("revenue_v3", "table").with_fingerprint("same_hash_abc"),
            Unit::new("costs", "table").with_fingerprint("unique_hash"),
        ];
        let events = vec![
            UsageEvent::new("revenue_v1", 10.0, base()),
            UsageEvent::new("revenue_v2", 10.0, base()),
            UsageEvent::new("revenue_v3", 10.0, base()),
            UsageEvent::new("costs", 5.0, base()),
        ];
        (units, events)
    }

    #[test]
    fn one_finding_covers_whole_group() {
        let (units, events) = revenue_models();
        let findings = detect_redundant(&units, &events, &WastePolicy::default());
        assert_eq!(findings.len(), 1);
        let finding = &findings[0];
        assert_eq!(finding.category, FindingCategory::Redundant);
        assert_eq!(finding.units, ["revenue_v1", "revenue_v2", "revenue_v3"]);
        assert_eq!(finding.subject(), "revenue_v1, revenue_v2, revenue_v3");
        assert!(finding.estimated_savings_pct > 40.0);
        // 30 credits, two thirds recoverable, of 35 total.
        assert!((finding.estimated_savings_pct - 57.1).abs() < 1e-9);
        assert_eq!(finding.severity, Severity::Critical);
        assert_eq!(finding.recommendation, "Consolidate into 'revenue_v1'");
        assert_eq!(finding.detail, "3 models, identical SQL, 30.0 credits");
    }

    #[test]
    fn first_member_follows_input_order() {
        let (mut units, events) = revenue_models();
        units.swap(0, 2);
        let findings = detect_redundant(&units, &events, &WastePolicy::default());
        assert_eq!(findings[0].recommendation, "Consolidate into 'revenue_v3'");
    }

    #[test]
    fn empty_fingerprints_never_group() {
        let units = vec![Unit::new("a", "view"), Unit::new("b", "view")];
        let events = vec![
            UsageEvent::new("a", 1.0, base()),
            UsageEvent::new("b", 1.0, base()),
        ];
        assert!(detect_redundant(&units, &events, &WastePolicy::default()).is_empty());
    }

    #[test]
    fn distinct_fingerprints_are_not_redundant() {
        let (units, events) = pipeline();
        assert!(detect_redundant(&units, &events, &WastePolicy::default()).is_empty());
    }

    #[test]
    fn cheap_duplicates_are_warnings() {
        let units = vec![
            Unit::new("copy_a", "view").with_fingerprint("dup"),
            Unit::new("copy_b", "view").with_fingerprint("dup"),
            Unit::new("main", "table").with_fingerprint("main"),
        ];
        let events = vec![
            UsageEvent::new("copy_a", 1.0, base()),
            UsageEvent::new("copy_b", 1.0, base()),
            UsageEvent::new("main", 98.0, base()),
        ];
        let findings = detect_redundant(&units, &events, &WastePolicy::default());
        assert_eq!(findings[0].severity, Severity::Warning);
        assert!((findings[0].estimated_savings_pct - 1.0).abs() < 1e-9);
    }

    fn duplicates_costing(each: f64) -> Vec<Finding> {
        let units = vec![
            Unit::new("copy_a", "view").with_fingerprint("dup"),
            Unit::new("copy_b", "view").with_fingerprint("dup"),
            Unit::new("main", "table").with_fingerprint("main"),
        ];
        let events = vec![
            UsageEvent::new("copy_a", each, base()),
            UsageEvent::new("copy_b", each, base()),
            UsageEvent::new("main", 100.0 - 2.0 * each, base()),
        ];
        detect_redundant(&units, &events, &WastePolicy::default())
    }

    #[test]
    fn critical_threshold_is_strict() {
        // Half of 2 x 5.0 credits is recoverable: exactly 5% of 100.
        let at_threshold = duplicates_costing(5.0);
        assert!((at_threshold[0].estimated_savings_pct - 5.0).abs() < 1e-9);
        assert_eq!(at_threshold[0].severity, Severity::Warning);

        let above = duplicates_costing(6.0);
        assert!((above[0].estimated_savings_pct - 6.0).abs() < 1e-9);
        assert_eq!(above[0].severity, Severity::Critical);
    }
}
