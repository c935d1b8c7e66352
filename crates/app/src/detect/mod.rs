mod over_schedule;
mod redundant;
mod zombie;

use std::collections::HashMap;

use pipecost_core::{Finding, UsageEvent};

pub use over_schedule::detect_over_scheduling;
pub use redundant::detect_redundant;
pub use zombie::detect_zombies;

pub(crate) use over_schedule::over_scheduled_by_cost;
pub(crate) use redundant::redundant_by_cost;
pub(crate) use zombie::zombies_by_cost;

/// Credits per unit name, and the overall total every share is measured
/// against.
pub(crate) struct CostMap<'a> {
    by_unit: HashMap<&'a str, f64>,
    total: f64,
}

impl<'a> CostMap<'a> {
    pub(crate) fn from_events(events: &'a [UsageEvent]) -> Self {
        let mut by_unit = HashMap::new();
        for event in events {
            *by_unit.entry(event.unit.as_str()).or_insert(0.0) += event.credits;
        }
        let total = by_unit.values().sum();
        Self { by_unit, total }
    }

    /// Adds spend that matched no unit to the total only.
    pub(crate) fn with_unattributed(mut self, credits: f64) -> Self {
        self.total += credits;
        self
    }

    pub(crate) fn credits(&self, unit: &str) -> f64 {
        self.by_unit.get(unit).copied().unwrap_or(0.0)
    }

    pub(crate) fn total(&self) -> f64 {
        self.total
    }
}

/// Stable sort, highest estimated savings first; ties keep detection order.
pub(crate) fn sort_by_savings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| b.estimated_savings_pct.total_cmp(&a.estimated_savings_pct));
}
