use pipecost_core::{Unit, WasteReport};
use serde::Serialize;
use tracing::info;

/// Recommendation text shown in place of the real one without a token.
pub const UPGRADE_NOTICE: &str = "Upgrade to Pro";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Free,
    Pro,
}

impl Tier {
    pub fn from_key(key: Option<&str>) -> Self {
        match key.map(str::trim) {
            Some(key) if !key.is_empty() => Self::Pro,
            _ => Self::Free,
        }
    }

    pub fn is_pro(&self) -> bool {
        matches!(self, Self::Pro)
    }
}

/// How many units were analyzed out of how many the manifest held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Truncation {
    pub analyzed: usize,
    pub total: usize,
}

/// Keeps the first `limit` units for the free tier.
pub fn limit_units(mut units: Vec<Unit>, tier: Tier, limit: usize) -> (Vec<Unit>, Option<Truncation>) {
    if tier.is_pro() || units.len() <= limit {
        return (units, None);
    }
    let total = units.len();
    units.truncate(limit);
    info!(analyzed = limit, total, "free tier unit limit applied");
    (
        units,
        Some(Truncation {
            analyzed: limit,
            total,
        }),
    )
}

/// Hides details and recommendations from a free-tier report. Category,
/// severity, subject and savings stay visible.
pub fn redact(report: &mut WasteReport, tier: Tier) {
    if tier.is_pro() {
        return;
    }
    for finding in &mut report.findings {
        finding.detail = UPGRADE_NOTICE.to_string();
        finding.recommendation = UPGRADE_NOTICE.to_string();
    }
}
