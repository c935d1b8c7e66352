use serde::{Deserialize, Serialize};

/// Minimum share of total credits before a zombie is reported.
pub const ZOMBIE_MIN_PCT: f64 = 1.0;
pub const ZOMBIE_CRITICAL_PCT: f64 = 5.0;
/// Runs needed before a schedule has enough signal.
pub const OVER_SCHEDULE_MIN_RUNS: usize = 3;
pub const OVER_SCHEDULE_MAX_GAP_HOURS: f64 = 4.0;
pub const OVER_SCHEDULE_CRITICAL_GAP_HOURS: f64 = 1.0;
/// Fraction of a unit's cost recovered by moving it to a day-scale cadence.
pub const OVER_SCHEDULE_RECOVERY_RATIO: f64 = 0.75;
pub const SUGGESTED_INTERVAL_MULTIPLIER: f64 = 4.0;
pub const SUGGESTED_INTERVAL_FLOOR_HOURS: f64 = 6.0;
pub const REDUNDANT_CRITICAL_PCT: f64 = 5.0;
/// Policy ceiling on the report's aggregate savings.
pub const SAVINGS_CAP_PCT: f64 = 75.0;
pub const DEFAULT_TOP_N: usize = 10;
pub const FREE_UNIT_LIMIT: usize = 50;

/// Tunable detector thresholds. Percentages are of total credits.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct WastePolicy {
    pub zombie_min_pct: f64,
    pub zombie_critical_pct: f64,
    pub over_schedule_min_runs: usize,
    pub over_schedule_max_gap_hours: f64,
    pub over_schedule_critical_gap_hours: f64,
    pub over_schedule_recovery_ratio: f64,
    pub suggested_interval_multiplier: f64,
    pub suggested_interval_floor_hours: f64,
    pub redundant_critical_pct: f64,
    pub savings_cap_pct: f64,
}

impl Default for WastePolicy {
    fn default() -> Self {
        Self {
            zombie_min_pct: ZOMBIE_MIN_PCT,
            zombie_critical_pct: ZOMBIE_CRITICAL_PCT,
            over_schedule_min_runs: OVER_SCHEDULE_MIN_RUNS,
            over_schedule_max_gap_hours: OVER_SCHEDULE_MAX_GAP_HOURS,
            over_schedule_critical_gap_hours: OVER_SCHEDULE_CRITICAL_GAP_HOURS,
            over_schedule_recovery_ratio: OVER_SCHEDULE_RECOVERY_RATIO,
            suggested_interval_multiplier: SUGGESTED_INTERVAL_MULTIPLIER,
            suggested_interval_floor_hours: SUGGESTED_INTERVAL_FLOOR_HOURS,
            redundant_critical_pct: REDUNDANT_CRITICAL_PCT,
            savings_cap_pct: SAVINGS_CAP_PCT,
        }
    }
}
