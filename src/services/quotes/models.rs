// File: src/services/quotes/models.rs
use serde::Deserialize;

/// Top level of the v8 chart response.
#[derive(Debug, Deserialize)]
pub struct ChartResponse {
    pub chart: ChartEnvelope,
}

#[derive(Debug, Deserialize)]
pub struct ChartEnvelope {
    #[serde(default)]
    pub result: Option<Vec<ChartResult>>,
    #[serde(default)]
    pub error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
pub struct ChartError {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartResult {
    #[serde(default)]
    pub meta: ChartMeta,
    // Absent when the window holds no bars
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChartMeta {
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub symbol: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseSeries>,
}

/// Parallel OHLCV arrays. Upstream uses `null` for gaps.
#[derive(Debug, Default, Deserialize)]
pub struct QuoteSeries {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<i64>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AdjCloseSeries {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}
