use std::sync::Arc;

use stockpulse_core::{MarketDataSource, PipelineConfig};
use stockpulse_warehouse::Warehouse;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub warehouse: Warehouse,
    pub provider: Arc<dyn MarketDataSource>,
    pub config: PipelineConfig,
}

impl AppState {
    pub fn new(
        warehouse: Warehouse,
        provider: Arc<dyn MarketDataSource>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            warehouse,
            provider,
            config,
        }
    }
}
