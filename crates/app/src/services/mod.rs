mod attribution;
mod waste;

use std::sync::Arc;

use crate::app::AppConfig;

pub use attribution::{AttributionRun, AttributionService};
pub use waste::{QuerySource, ScanOutcome, ScanRequest, WasteService};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub attribution: AttributionService,
    pub waste: WasteService,
}

impl AppServices {
    pub fn new(config: &AppConfig) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            attribution: AttributionService::new(shared.clone()),
            waste: WasteService::new(shared),
        }
    }
}
