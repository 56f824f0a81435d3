use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};

use super::error::ApiError;
use crate::app_state::models::AppState;
use crate::db::clickhouse::models::price_point::DbPricePoint;
use crate::services::ingestion::resolver::parse_date;

#[derive(Debug, Deserialize)]
pub struct DataQueryRequest {
    #[serde(default)]
    pub ticker: String,
    #[serde(default)]
    pub days: i64,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Serialize)]
pub struct DataPoint {
    pub time: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
    pub adj_close: f64,
}

#[derive(Debug, Serialize)]
pub struct DataQueryResponse {
    pub ticker: String,
    pub data: Vec<DataPoint>,
    pub count: usize,
}

impl From<DbPricePoint> for DataPoint {
    fn from(point: DbPricePoint) -> Self {
        let time = DateTime::<Utc>::from_timestamp(point.time, 0)
            .unwrap_or_default()
            .format("%Y-%m-%dT%H:%M:%SZ")
            .to_string();

        Self {
            time,
            open: point.open,
            high: point.high,
            low: point.low,
            close: point.close,
            volume: point.volume,
            adj_close: point.adj_close,
        }
    }
}

/// POST /query: the most recent `days` bars for a ticker, oldest first.
pub async fn query_data(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<DataQueryRequest>, JsonRejection>,
) -> Result<Json<DataQueryResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    })?;

    let ticker = request.ticker.trim().to_string();
    if ticker.is_empty() {
        return Err(ApiError::bad_request("Ticker is required"));
    }

    let query_config = &app_state.settings.app_config.query;
    let days = if request.days <= 0 {
        query_config.default_days
    } else {
        request.days
    };

    let end = resolve_end(&request.end_date);
    let start = lookback_start(end, days, query_config.buffer_days);

    info!(ticker = %ticker, days, %start, %end, "Querying price store");

    let mut points = app_state
        .price_repository
        .get_range(&ticker, start.timestamp(), end.timestamp())
        .await
        .map_err(|e| {
            error!(ticker = %ticker, error = %e, "Query failed");
            ApiError::internal("Query failed").with_details(e.to_string())
        })?;

    points.sort_by_key(|point| point.time);
    let keep = usize::try_from(days).unwrap_or(usize::MAX);
    if points.len() > keep {
        points.drain(..points.len() - keep);
    }

    let data: Vec<DataPoint> = points.into_iter().map(DataPoint::from).collect();
    info!(ticker = %ticker, points_returned = data.len(), "Query complete");

    Ok(Json(DataQueryResponse {
        ticker,
        count: data.len(),
        data,
    }))
}

/// Calendar days hold fewer bars than trading days, so the range is widened by
/// `buffer_days`. Spans past chrono's range clamp to the earliest instant.
fn lookback_start(end: DateTime<Utc>, days: i64, buffer_days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days.saturating_add(buffer_days))
        .and_then(|span| end.checked_sub_signed(span))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

/// End of the given day, or now when the date is blank or unparseable.
fn resolve_end(raw: &str) -> DateTime<Utc> {
    parse_date(raw)
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(Utc::now)
}
