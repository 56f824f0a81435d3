use crate::db::clickhouse::connection::ClickhouseConnection;
use crate::db::clickhouse::error::StoreError;
use crate::db::clickhouse::repository::price_repository::{
    ClickhousePriceRepository, PriceRepository,
};
use crate::env_config::models::app_setting::AppSettings;
use std::sync::Arc;
use tracing::{error, info};

pub struct ClickhouseService {
    pub repository_price: Arc<dyn PriceRepository + Send + Sync>,
}

impl ClickhouseService {
    pub async fn new(settings: &Arc<AppSettings>) -> Result<Self, StoreError> {
        info!("Initializing database service components");

        let clickhouse_connection = match ClickhouseConnection::new(settings.clone()).await {
            Ok(conn) => {
                info!("ClickHouse connection established successfully");
                Arc::new(conn)
            }
            Err(e) => {
                error!("Failed to establish ClickHouse connection: {}", e);
                return Err(e);
            }
        };

        info!("Initialize repositories (ClickHouse)");

        let price_repository = ClickhousePriceRepository::new(
            clickhouse_connection,
            settings.app_config.clickhouse.table.clone(),
        );
        price_repository.ensure_schema().await?;

        info!("Database service initialized successfully");

        Ok(Self {
            repository_price: Arc::new(price_repository),
        })
    }
}
