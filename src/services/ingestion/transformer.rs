// File: src/services/ingestion/transformer.rs
use super::models::PriceBar;
use crate::db::clickhouse::models::price_point::DbPricePoint;
use crate::services::quotes::models::{AdjCloseSeries, ChartResult, QuoteSeries};
use tracing::{debug, warn};

/// Tag rewrite applied to every stored point: `BTC-USD` becomes `BTCUSDT`.
pub fn normalize_ticker(symbol: &str) -> String {
    symbol.replace("-USD", "USDT")
}

/// Converts the parallel arrays of a chart response into storage points.
///
/// An index is kept only when all six value arrays have a non-null element
/// there; other indices are skipped with a warning and the rest of the series
/// is still returned.
pub fn to_storage_points(symbol: &str, result: &ChartResult) -> Vec<DbPricePoint> {
    let (Some(quote), Some(adj_close)) = (
        result.indicators.quote.first(),
        result.indicators.adjclose.first(),
    ) else {
        warn!(ticker = symbol, "Chart result has no indicator arrays");
        return Vec::new();
    };

    let ticker = normalize_ticker(symbol);
    let mut points = Vec::with_capacity(result.timestamp.len());

    for (index, &timestamp) in result.timestamp.iter().enumerate() {
        match bar_at(quote, adj_close, index, timestamp) {
            Some(bar) => points.push(storage_point(&ticker, bar)),
            None => warn!(ticker = symbol, timestamp, "Skipping incomplete data point"),
        }
    }

    debug!(
        ticker = symbol,
        kept = points.len(),
        skipped = result.timestamp.len() - points.len(),
        "Transformed chart series"
    );

    points
}

fn bar_at(
    quote: &QuoteSeries,
    adj_close: &AdjCloseSeries,
    index: usize,
    timestamp: i64,
) -> Option<PriceBar> {
    Some(PriceBar {
        timestamp,
        open: value_at(&quote.open, index)?,
        high: value_at(&quote.high, index)?,
        low: value_at(&quote.low, index)?,
        close: value_at(&quote.close, index)?,
        adj_close: value_at(&adj_close.adjclose, index)?,
        volume: value_at(&quote.volume, index)?,
    })
}

fn value_at<T: Copy>(series: &[Option<T>], index: usize) -> Option<T> {
    series.get(index).copied().flatten()
}

fn storage_point(ticker: &str, bar: PriceBar) -> DbPricePoint {
    DbPricePoint {
        ticker: ticker.to_string(),
        time: bar.timestamp,
        open: bar.open,
        high: bar.high,
        low: bar.low,
        close: bar.close,
        adj_close: bar.adj_close,
        volume: bar.volume,
    }
}
