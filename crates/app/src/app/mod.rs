use serde::{Deserialize, Serialize};

use crate::config::{DEFAULT_TOP_N, FREE_UNIT_LIMIT, WastePolicy};
use crate::services::AppServices;

/// Settings shared by every analysis run.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppConfig {
    pub policy: WastePolicy,
    /// Contributors kept per month in the monthly breakdown.
    pub top_n: usize,
    /// Units analyzed without an access token.
    pub free_unit_limit: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            policy: WastePolicy::default(),
            top_n: DEFAULT_TOP_N,
            free_unit_limit: FREE_UNIT_LIMIT,
        }
    }
}

/// Application state shared by frontends.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let services = AppServices::new(&config);
        Self { config, services }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(AppConfig::default())
    }
}
