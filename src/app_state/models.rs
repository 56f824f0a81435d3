use crate::db::clickhouse::repository::price_repository::PriceRepository;
use crate::env_config::models::app_setting::AppSettings;
use crate::services::ingestion::pool::IngestionPool;

use std::sync::Arc;

/// Everything a handler needs, built once at startup.
pub struct AppState {
    pub settings: Arc<AppSettings>,
    pub price_repository: Arc<dyn PriceRepository + Send + Sync>,
    pub ingestion_pool: Arc<IngestionPool>,
}

impl AppState {
    pub fn new(
        settings: Arc<AppSettings>,
        price_repository: Arc<dyn PriceRepository + Send + Sync>,
        ingestion_pool: Arc<IngestionPool>,
    ) -> Self {
        Self {
            settings,
            price_repository,
            ingestion_pool,
        }
    }
}
