use axum::{
    Json,
    extract::{Extension, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use super::error::ApiError;
use crate::app_state::models::AppState;

#[derive(Debug, Deserialize)]
pub struct DataFetchRequest {
    #[serde(default)]
    pub names: Vec<String>,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub interval: String,
}

#[derive(Debug, Serialize)]
pub struct DataFetchResponse {
    pub status: String,
    pub message: String,
    pub details: BTreeMap<String, String>,
}

/// POST /fetch: ingest every named symbol and report one outcome per symbol.
pub async fn fetch_data(
    Extension(app_state): Extension<Arc<AppState>>,
    payload: Result<Json<DataFetchRequest>, JsonRejection>,
) -> Result<Json<DataFetchResponse>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::bad_request("Invalid request body").with_details(rejection.body_text())
    })?;

    if request.names.is_empty() {
        return Err(ApiError::bad_request("No tickers provided"));
    }

    let interval = match request.interval.trim() {
        "" => app_state.settings.app_config.ingestion.default_interval.clone(),
        interval => interval.to_string(),
    };

    info!(
        tickers = ?request.names,
        interval = %interval,
        "Handling data fetch request"
    );

    let report = app_state
        .ingestion_pool
        .run(&request.names, &request.start_date, &interval)
        .await;

    Ok(Json(DataFetchResponse {
        status: "success".to_string(),
        message: format!(
            "Data fetch cycle completed for {} tickers",
            request.names.len()
        ),
        details: report.into_details(),
    }))
}
