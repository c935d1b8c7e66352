use std::path::Path;

use pipecost_core::{AttributionSummary, MonthlyBreakdown};
use serde::Serialize;

use crate::attribution::{attribute_to_units, attribution_summaries};
use crate::error::{AppError, Result};
use crate::monthly::monthly_breakdown;
use crate::services::SharedConfig;

/// Attribution results for one query history.
#[derive(Debug, Clone, Serialize)]
pub struct AttributionRun {
    pub attributions: Vec<AttributionSummary>,
    pub monthly: MonthlyBreakdown,
}

#[derive(Clone)]
pub struct AttributionService {
    config: SharedConfig,
}

impl AttributionService {
    pub(super) fn new(config: SharedConfig) -> Self {
        Self { config }
    }

    /// Attributes a raw query history to the manifest's models and breaks
    /// the result down by month. `top_n` overrides the configured default.
    pub fn attribute(
        &self,
        manifest_path: &Path,
        history_path: &Path,
        top_n: Option<usize>,
    ) -> Result<AttributionRun> {
        let top_n = top_n.unwrap_or(self.config.top_n);
        if top_n == 0 {
            return Err(AppError::InvalidInput(
                "top_n must be at least 1".to_string(),
            ));
        }
        let units = ingest::parse_manifest(manifest_path)?;
        let queries = ingest::parse_query_history(history_path)?;
        let attributions = attribute_to_units(&queries, &units)?;
        Ok(AttributionRun {
            attributions: attribution_summaries(&attributions),
            monthly: monthly_breakdown(&attributions, top_n),
        })
    }
}
