// File: src/db/clickhouse/repository/price_repository.rs
use crate::db::clickhouse::connection::ClickhouseConnection;
use crate::db::clickhouse::error::StoreError;
use crate::db::clickhouse::models::price_point::DbPricePoint;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, error, info};

#[async_trait]
pub trait PriceRepository {
    /// Time of the newest stored bar for `ticker` at or after `since`
    async fn latest_time(&self, ticker: &str, since: i64) -> Result<Option<i64>, StoreError>;

    /// Writes all points in a single insert. Returns the number written.
    async fn insert_points(&self, points: Vec<DbPricePoint>) -> Result<u64, StoreError>;

    /// Bars for `ticker` in `[from_time, to_time]`, oldest first
    async fn get_range(
        &self,
        ticker: &str,
        from_time: i64,
        to_time: i64,
    ) -> Result<Vec<DbPricePoint>, StoreError>;

    async fn check(&self) -> Result<bool, StoreError>;
}

pub struct ClickhousePriceRepository {
    connection: Arc<ClickhouseConnection>,
    table: String,
}

impl ClickhousePriceRepository {
    pub fn new(connection: Arc<ClickhouseConnection>, table: impl Into<String>) -> Self {
        Self {
            connection,
            table: table.into(),
        }
    }

    /// Creates the price table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        let client = self.connection.get_client();

        // ReplacingMergeTree collapses re-written (ticker, time) rows on merge
        let ddl = format!(
            "CREATE TABLE IF NOT EXISTS {} (
                ticker String,
                time Int64,
                open Float64,
                high Float64,
                low Float64,
                close Float64,
                adj_close Float64,
                volume Int64
            )
            ENGINE = ReplacingMergeTree
            ORDER BY (ticker, time)",
            self.table
        );

        debug!("Ensuring table {} exists", self.table);
        client.query(&ddl).execute().await?;
        info!("Table {} is ready", self.table);

        Ok(())
    }
}

#[async_trait]
impl PriceRepository for ClickhousePriceRepository {
    async fn latest_time(&self, ticker: &str, since: i64) -> Result<Option<i64>, StoreError> {
        let client = self.connection.get_client();

        #[derive(Debug, Deserialize, clickhouse::Row)]
        struct TimeRow {
            time: i64,
        }

        let query = format!(
            "SELECT time FROM {} WHERE ticker = ? AND time >= ? ORDER BY time DESC LIMIT 1",
            self.table
        );

        debug!("Fetching latest bar time for ticker={} since {}", ticker, since);

        let row = client
            .query(&query)
            .bind(ticker)
            .bind(since)
            .fetch_optional::<TimeRow>()
            .await?;

        match &row {
            Some(row) => debug!("Latest bar for ticker={} at {}", ticker, row.time),
            None => debug!("No recent bars for ticker={}", ticker),
        }

        Ok(row.map(|row| row.time))
    }

    async fn insert_points(&self, points: Vec<DbPricePoint>) -> Result<u64, StoreError> {
        if points.is_empty() {
            debug!("No points to insert");
            return Ok(0);
        }

        let client = self.connection.get_client();
        let total_count = points.len() as u64;

        info!("Inserting {} points into {}", total_count, self.table);

        let mut insert = client.insert::<DbPricePoint>(&self.table)?;
        for point in &points {
            insert.write(point).await?;
        }

        if let Err(e) = insert.end().await {
            error!("Insert into {} failed: {}", self.table, e);
            return Err(e.into());
        }

        debug!("Inserted {} points into {}", total_count, self.table);
        Ok(total_count)
    }

    async fn get_range(
        &self,
        ticker: &str,
        from_time: i64,
        to_time: i64,
    ) -> Result<Vec<DbPricePoint>, StoreError> {
        let client = self.connection.get_client();

        // FINAL applies pending ReplacingMergeTree deduplication at read time
        let query = format!(
            "SELECT ?fields FROM {} FINAL
             WHERE ticker = ? AND time >= ? AND time <= ?
             ORDER BY time ASC",
            self.table
        );

        debug!(
            "Fetching bars for ticker={} from {} to {}",
            ticker, from_time, to_time
        );

        let rows = client
            .query(&query)
            .bind(ticker)
            .bind(from_time)
            .bind(to_time)
            .fetch_all::<DbPricePoint>()
            .await?;

        info!("Fetched {} bars for ticker={}", rows.len(), ticker);

        Ok(rows)
    }

    async fn check(&self) -> Result<bool, StoreError> {
        self.connection.ping().await?;
        Ok(true)
    }
}
