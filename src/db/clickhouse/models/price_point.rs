// File: src/db/clickhouse/models/price_point.rs
use clickhouse::Row;
use serde::{Deserialize, Serialize};

/// One stored bar. `ticker` is the tag, `time` is epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Row)]
pub struct DbPricePoint {
    pub ticker: String,
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}
