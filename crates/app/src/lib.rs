pub mod app;
pub mod attribution;
pub mod config;
pub mod detect;
pub mod error;
pub mod monthly;
pub mod report;
pub mod services;
pub mod tier;

pub use app::{AppConfig, AppState};
pub use attribution::{
    AttributionMap, PatternIndex, attribute_costs, attribute_to_units, attribution_summaries,
    unattributed_credits, usage_events_from_attributions,
};
pub use config::WastePolicy;
pub use detect::{detect_over_scheduling, detect_redundant, detect_zombies};
pub use error::{ApiError, AppError, Result};
pub use monthly::monthly_breakdown;
pub use report::{analyze, assemble_report};
pub use services::{
    AppServices, AttributionRun, AttributionService, QuerySource, ScanOutcome, ScanRequest,
    WasteService,
};
pub use tier::{Tier, Truncation, UPGRADE_NOTICE, limit_units, redact};
