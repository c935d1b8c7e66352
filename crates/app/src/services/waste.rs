use std::path::PathBuf;

use pipecost_core::{Unit, UsageEvent, WasteReport};
use serde::Serialize;

use crate::attribution::{
    attribute_to_units, unattributed_credits, usage_events_from_attributions,
};
use crate::error::Result;
use crate::report::analyze;
use crate::services::SharedConfig;
use crate::tier::{Tier, Truncation, limit_units, redact};

/// Shape of the query file handed to a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum QuerySource {
    /// Records already naming the model they ran.
    #[default]
    UsageRecords,
    /// Raw warehouse query history, attributed by query text first.
    QueryHistory,
}

#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub manifest_path: PathBuf,
    pub queries_path: PathBuf,
    pub source: QuerySource,
    pub access_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanOutcome {
    pub tier: Tier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncation: Option<Truncation>,
    #[serde(flatten)]
    pub report: WasteReport,
}

struct Usage {
    events: Vec<UsageEvent>,
    unattributed_credits: f64,
}

#[derive(Clone)]
pub struct WasteService {
    config: SharedConfig,
}

impl WasteService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    pub fn scan(&self, request: &ScanRequest) -> Result<ScanOutcome> {
        let tier = Tier::from_key(request.access_key.as_deref());
        let units = ingest::parse_manifest(&request.manifest_path)?;
        let usage = load_usage(request, &units)?;
        let (units, truncation) = limit_units(units, tier, self.config.free_unit_limit);
        let mut report = analyze(
            &units,
            &usage.events,
            usage.unattributed_credits,
            &self.config.policy,
        );
        redact(&mut report, tier);
        Ok(ScanOutcome {
            tier,
            truncation,
            report,
        })
    }
}

/// Attribution, when needed, sees every unit in the manifest even if the
/// tier later limits which of them are analyzed.
fn load_usage(request: &ScanRequest, units: &[Unit]) -> Result<Usage> {
    match request.source {
        QuerySource::UsageRecords => Ok(Usage {
            events: ingest::parse_usage_records(&request.queries_path)?,
            unattributed_credits: 0.0,
        }),
        QuerySource::QueryHistory => {
            let queries = ingest::parse_query_history(&request.queries_path)?;
            let attributions = attribute_to_units(&queries, units)?;
            Ok(Usage {
                events: usage_events_from_attributions(&attributions),
                unattributed_credits: unattributed_credits(&attributions),
            })
        }
    }
}
