// File: src/services/quotes/fetcher.rs
use super::error::QuoteError;
use super::http_client::HttpClient;
use super::models::{ChartResponse, ChartResult};
use chrono::{DateTime, Utc};
use reqwest::header::{HeaderValue, USER_AGENT};
use reqwest::{Method, Request, StatusCode, Url};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct QuoteFetcher {
    http_client: Arc<dyn HttpClient + Send + Sync>,
    base_url: String,
    user_agent: String,
}

impl QuoteFetcher {
    pub fn new(
        http_client: Arc<dyn HttpClient + Send + Sync>,
        base_url: impl Into<String>,
        user_agent: impl Into<String>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            user_agent: user_agent.into(),
        }
    }

    /// Downloads bars for `symbol` from `start` until now.
    ///
    /// Returns `Ok(None)` without touching the network when `start` lies in
    /// the future: the window is empty, which is not an error. Any other
    /// problem, including an API-reported error or a response without
    /// indicator arrays, fails the whole symbol.
    pub async fn fetch(
        &self,
        symbol: &str,
        start: DateTime<Utc>,
        interval: &str,
    ) -> Result<Option<ChartResult>, QuoteError> {
        let period1 = start.timestamp();
        let period2 = Utc::now().timestamp();

        if period1 > period2 {
            debug!(ticker = symbol, period1, period2, "Start time is in the future, nothing to fetch");
            return Ok(None);
        }

        let url = self.chart_url(symbol, period1, period2, interval)?;
        debug!(ticker = symbol, %url, "Requesting quote chart");

        let mut request = Request::new(Method::GET, url);
        match HeaderValue::from_str(&self.user_agent) {
            Ok(value) => {
                request.headers_mut().insert(USER_AGENT, value);
            }
            Err(_) => warn!("Configured user agent is not a valid header value, sending none"),
        }

        let response = self.http_client.execute(request).await?;
        let status = response.status();
        if status != StatusCode::OK {
            return Err(QuoteError::Status(status));
        }

        let body = response.bytes().await?;
        let chart: ChartResponse = serde_json::from_slice(&body)?;

        if let Some(err) = chart.chart.error {
            return Err(QuoteError::Api(format!("{}: {}", err.code, err.description)));
        }

        let result = chart
            .chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| QuoteError::EmptyResult(symbol.to_string()))?;

        if result.indicators.quote.is_empty() || result.indicators.adjclose.is_empty() {
            return Err(QuoteError::IncompleteIndicators(symbol.to_string()));
        }

        debug!(ticker = symbol, bars = result.timestamp.len(), "Quote chart received");
        Ok(Some(result))
    }

    fn chart_url(
        &self,
        symbol: &str,
        period1: i64,
        period2: i64,
        interval: &str,
    ) -> Result<Url, QuoteError> {
        let invalid = |reason: String| QuoteError::InvalidUrl {
            url: self.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.base_url).map_err(|e| invalid(e.to_string()))?;

        // Pushed as a segment so `/`, `?` and `#` in a symbol stay inside the path
        url.path_segments_mut()
            .map_err(|()| invalid("base URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .push("chart")
            .push(symbol);

        url.query_pairs_mut()
            .append_pair("period1", &period1.to_string())
            .append_pair("period2", &period2.to_string())
            .append_pair("interval", interval)
            .append_pair("events", "history");

        Ok(url)
    }
}
