// File: src/services/ingestion/writer.rs
use super::models::IngestionOutcome;
use crate::db::clickhouse::error::StoreError;
use crate::db::clickhouse::models::price_point::DbPricePoint;
use crate::db::clickhouse::repository::price_repository::PriceRepository;
use std::sync::Arc;
use tracing::{error, info};

pub struct PointWriter {
    repository: Arc<dyn PriceRepository + Send + Sync>,
}

impl PointWriter {
    pub fn new(repository: Arc<dyn PriceRepository + Send + Sync>) -> Self {
        Self { repository }
    }

    /// Writes one symbol's points in a single store call. No retry and no
    /// rollback of whatever the store applied before failing.
    pub async fn write(
        &self,
        symbol: &str,
        points: Vec<DbPricePoint>,
    ) -> Result<IngestionOutcome, StoreError> {
        if points.is_empty() {
            info!(ticker = symbol, "No new data to write");
            return Ok(IngestionOutcome::NoNewData);
        }

        let count = points.len();
        match self.repository.insert_points(points).await {
            Ok(_) => {
                info!(ticker = symbol, count, "Points written");
                Ok(IngestionOutcome::Written(count))
            }
            Err(e) => {
                error!(ticker = symbol, error = %e, "Failed to write points");
                Err(e)
            }
        }
    }
}
