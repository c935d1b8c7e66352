use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Display name of the bucket holding queries that matched no unit.
pub const UNATTRIBUTED_LABEL: &str = "__unattributed__";
/// Month key for per-event records whose start time could not be parsed.
pub const UNKNOWN_MONTH: &str = "unknown";

/// A named transformation model from the dependency manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    pub name: String,
    pub materialization: String,
    /// Lower-hex SHA-256 of the defining SQL, empty when the manifest carries none.
    pub fingerprint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub upstream: Vec<String>,
    pub downstream: Vec<String>,
}

impl Unit {
    pub fn new(name: impl Into<String>, materialization: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            materialization: materialization.into(),
            fingerprint: String::new(),
            alias: None,
            schema: None,
            upstream: Vec::new(),
            downstream: Vec::new(),
        }
    }

    pub fn with_fingerprint(mut self, fingerprint: impl Into<String>) -> Self {
        self.fingerprint = fingerprint.into();
        self
    }

    pub fn with_upstream<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.upstream = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_downstream<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.downstream = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }
}

/// One warehouse query in canonical form, before attribution.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRecord {
    pub query_id: String,
    pub query_text: String,
    pub warehouse_name: String,
    pub bytes_scanned: u64,
    pub credits_used: f64,
    pub execution_time: u64,
    pub start_time: String,
}

/// Credits consumed by one run of a known unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageEvent {
    pub unit: String,
    pub credits: f64,
    pub start_time: Option<DateTime<Utc>>,
    pub warehouse: String,
}

impl UsageEvent {
    pub fn new(unit: impl Into<String>, credits: f64, start_time: DateTime<Utc>) -> Self {
        Self {
            unit: unit.into(),
            credits,
            start_time: Some(start_time),
            warehouse: "default".to_string(),
        }
    }
}

/// Key of the attribution map. The unattributed bucket is its own variant so a
/// unit can never collide with it, whatever its name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AttributionKey {
    Unit(String),
    Unattributed,
}

impl AttributionKey {
    pub fn unit(name: impl Into<String>) -> Self {
        Self::Unit(name.into())
    }

    pub fn unit_name(&self) -> Option<&str> {
        match self {
            Self::Unit(name) => Some(name),
            Self::Unattributed => None,
        }
    }
}

impl fmt::Display for AttributionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unit(name) => f.write_str(name),
            Self::Unattributed => f.write_str(UNATTRIBUTED_LABEL),
        }
    }
}

impl Serialize for AttributionKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A single query's share as recorded against one attribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributedQuery {
    pub query_id: String,
    pub credits_share: f64,
    pub start_time: String,
    pub warehouse_name: String,
}

/// Accumulated cost of everything attributed to one key.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribution {
    pub key: AttributionKey,
    pub total_credits: f64,
    pub query_count: u64,
    pub total_bytes_scanned: u64,
    pub avg_execution_time: f64,
    /// Warehouse labels in arrival order, duplicates included.
    pub warehouses: Vec<String>,
    pub queries: Vec<AttributedQuery>,
}

impl Attribution {
    pub fn new(key: AttributionKey) -> Self {
        Self {
            key,
            total_credits: 0.0,
            query_count: 0,
            total_bytes_scanned: 0,
            avg_execution_time: 0.0,
            warehouses: Vec::new(),
            queries: Vec::new(),
        }
    }

    pub fn summary(&self) -> AttributionSummary {
        let warehouses = self
            .warehouses
            .iter()
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        AttributionSummary {
            model_name: self.key.clone(),
            total_credits: round_to(self.total_credits, 6),
            query_count: self.query_count,
            total_bytes_scanned: self.total_bytes_scanned,
            avg_execution_time: round_to(self.avg_execution_time, 2),
            warehouses,
        }
    }
}

/// Serialized view of an [`Attribution`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributionSummary {
    pub model_name: AttributionKey,
    pub total_credits: f64,
    pub query_count: u64,
    pub total_bytes_scanned: u64,
    pub avg_execution_time: f64,
    pub warehouses: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedContributor {
    pub model: AttributionKey,
    pub credits: f64,
    pub pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub total_credits: f64,
    pub top_models: Vec<RankedContributor>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MonthlyBreakdown {
    pub total_credits: f64,
    /// Keyed by `YYYY-MM`, or [`UNKNOWN_MONTH`].
    pub months: std::collections::BTreeMap<String, MonthSummary>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingCategory {
    Zombie,
    OverSchedule,
    Redundant,
}

impl FindingCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zombie => "zombie",
            Self::OverSchedule => "over_schedule",
            Self::Redundant => "redundant",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Warning => "warning",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub category: FindingCategory,
    pub severity: Severity,
    pub units: Vec<String>,
    pub detail: String,
    pub estimated_savings_pct: f64,
    pub recommendation: String,
}

impl Finding {
    /// Subject line, unit names joined in their recorded order.
    pub fn subject(&self) -> String {
        self.units.join(", ")
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingSummary {
    pub zombies: usize,
    pub over_scheduled: usize,
    pub redundant: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WasteReport {
    pub total_credits: f64,
    pub findings: Vec<Finding>,
    pub savings_pct: f64,
    pub summary: FindingSummary,
}

/// Rounds half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

/// `part` as a percentage of `total`, zero when `total` is not positive.
pub fn percent_of(part: f64, total: f64) -> f64 {
    if total > 0.0 { part / total * 100.0 } else { 0.0 }
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parses an ISO-8601 style start time. Offsets are kept as written; naive
/// values and bare dates are read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed);
    }
    let utc = FixedOffset::east_opt(0)?;
    for format in NAIVE_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(DateTime::from_naive_utc_and_offset(parsed, utc));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let parsed = NaiveDateTime::new(date, NaiveTime::from_hms_opt(0, 0, 0)?);
        return Some(DateTime::from_naive_utc_and_offset(parsed, utc));
    }
    None
}

/// `YYYY-MM` for a parseable start time, [`UNKNOWN_MONTH`] otherwise.
pub fn month_key(raw: &str) -> String {
    match parse_timestamp(raw) {
        Some(parsed) => parsed.format("%Y-%m").to_string(),
        None => UNKNOWN_MONTH.to_string(),
    }
}
