//! Test doubles shared by the unit tests.

use crate::db::clickhouse::error::StoreError;
use crate::db::clickhouse::models::price_point::DbPricePoint;
use crate::db::clickhouse::repository::price_repository::PriceRepository;
use crate::env_config::models::app_config::AppConfig;
use crate::env_config::models::app_env::{AppEnv, Env};
use crate::env_config::models::app_setting::AppSettings;
use crate::services::ingestion::pipeline::SymbolPipeline;
use crate::services::ingestion::resolver::StartResolver;
use crate::services::ingestion::writer::PointWriter;
use crate::services::quotes::fetcher::QuoteFetcher;
use crate::services::quotes::http_client::HttpClient;
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Request, Response, StatusCode, Url};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

type Responder = Box<dyn Fn(&Request) -> (StatusCode, String) + Send + Sync>;

/// Answers every request with a canned status and body, recording URLs.
pub struct FakeHttpClient {
    responder: Responder,
    requests: Mutex<Vec<(String, Option<String>)>>,
}

impl FakeHttpClient {
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&Request) -> (StatusCode, String) + Send + Sync + 'static,
    {
        Self {
            responder: Box::new(responder),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn ok(body: impl Into<String>) -> Self {
        Self::with_status(StatusCode::OK, body)
    }

    pub fn with_status(status: StatusCode, body: impl Into<String>) -> Self {
        let body = body.into();
        Self::new(move |_| (status, body.clone()))
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    pub fn user_agents(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter_map(|(_, agent)| agent.clone())
            .collect()
    }
}

#[async_trait]
impl HttpClient for FakeHttpClient {
    async fn execute(&self, request: Request) -> Result<Response, reqwest::Error> {
        let agent = request
            .headers()
            .get(USER_AGENT)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        self.requests
            .lock()
            .unwrap()
            .push((request.url().to_string(), agent));

        let (status, body) = (self.responder)(&request);
        let response = axum::http::Response::builder()
            .status(status)
            .body(body)
            .unwrap();
        Ok(Response::from(response))
    }
}

/// Chart JSON with one complete bar per timestamp.
pub fn chart_json(timestamps: &[i64]) -> String {
    let series = |offset: f64| -> Vec<f64> {
        (0..timestamps.len()).map(|i| 100.0 + i as f64 + offset).collect()
    };
    let volumes: Vec<i64> = (0..timestamps.len()).map(|i| 1_000_000 + i as i64).collect();

    serde_json::json!({
        "chart": {
            "result": [{
                "meta": {"currency": "USD", "symbol": "TEST"},
                "timestamp": timestamps,
                "indicators": {
                    "quote": [{
                        "open": series(0.0),
                        "high": series(5.0),
                        "low": series(-1.0),
                        "close": series(2.0),
                        "volume": volumes,
                    }],
                    "adjclose": [{"adjclose": series(2.0)}]
                }
            }],
            "error": null
        }
    })
    .to_string()
}

pub fn query_param(url: &str, name: &str) -> Option<i64> {
    Url::parse(url)
        .ok()?
        .query_pairs()
        .find(|(key, _)| key == name)
        .and_then(|(_, value)| value.parse().ok())
}

/// Serves one bar per UTC midnight inside the requested period, the way the
/// real API answers a daily window.
pub fn daily_bars_responder() -> impl Fn(&Request) -> (StatusCode, String) + Send + Sync + 'static
{
    |request: &Request| {
        let url = request.url().to_string();
        let (Some(period1), Some(period2)) = (query_param(&url, "period1"), query_param(&url, "period2"))
        else {
            return (StatusCode::BAD_REQUEST, String::new());
        };

        const DAY: i64 = 86_400;
        let first_midnight = (period1 + DAY - 1).div_euclid(DAY) * DAY;
        let timestamps: Vec<i64> = (first_midnight..=period2).step_by(DAY as usize).collect();
        (StatusCode::OK, chart_json(&timestamps))
    }
}

pub fn point_at(ticker: &str, time: i64) -> DbPricePoint {
    DbPricePoint {
        ticker: ticker.to_string(),
        time,
        open: 100.0,
        high: 105.0,
        low: 99.0,
        close: 102.0,
        adj_close: 102.0,
        volume: 1_000,
    }
}

/// Store double with switchable query and write failures.
#[derive(Default)]
pub struct InMemoryPriceRepository {
    points: Mutex<Vec<DbPricePoint>>,
    fail_queries: AtomicBool,
    fail_writes: AtomicBool,
    insert_calls: AtomicUsize,
}

impl InMemoryPriceRepository {
    pub fn with_points(points: Vec<DbPricePoint>) -> Self {
        Self {
            points: Mutex::new(points),
            ..Self::default()
        }
    }

    pub fn fail_queries(&self) {
        self.fail_queries.store(true, Ordering::SeqCst);
    }

    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }

    pub fn points(&self) -> Vec<DbPricePoint> {
        self.points.lock().unwrap().clone()
    }

    fn check_queries(&self) -> Result<(), StoreError> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("query refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl PriceRepository for InMemoryPriceRepository {
    async fn latest_time(&self, ticker: &str, since: i64) -> Result<Option<i64>, StoreError> {
        self.check_queries()?;
        Ok(self
            .points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.ticker == ticker && p.time >= since)
            .map(|p| p.time)
            .max())
    }

    async fn insert_points(&self, points: Vec<DbPricePoint>) -> Result<u64, StoreError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write refused".to_string()));
        }
        let count = points.len() as u64;
        self.points.lock().unwrap().extend(points);
        Ok(count)
    }

    async fn get_range(
        &self,
        ticker: &str,
        from_time: i64,
        to_time: i64,
    ) -> Result<Vec<DbPricePoint>, StoreError> {
        self.check_queries()?;
        let mut rows: Vec<DbPricePoint> = self
            .points
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.ticker == ticker && p.time >= from_time && p.time <= to_time)
            .cloned()
            .collect();
        rows.sort_by_key(|p| p.time);
        Ok(rows)
    }

    async fn check(&self) -> Result<bool, StoreError> {
        self.check_queries()?;
        Ok(true)
    }
}

pub fn pipeline_with(
    repository: Arc<InMemoryPriceRepository>,
    client: Arc<FakeHttpClient>,
) -> SymbolPipeline {
    let repository: Arc<dyn PriceRepository + Send + Sync> = repository;
    SymbolPipeline::new(
        StartResolver::new(repository.clone(), 30),
        QuoteFetcher::new(client, "https://quotes.test/v8/finance", "test-agent"),
        PointWriter::new(repository),
    )
}

pub fn test_settings() -> AppSettings {
    AppSettings {
        app_config: AppConfig::default(),
        app_env: AppEnv {
            env: Env::Local,
            server_address: "127.0.0.1".to_string(),
            server_port: 0,
            config_dir: "config".to_string(),
            clickhouse_url: "http://localhost:8123".to_string(),
            clickhouse_user: "default".to_string(),
            clickhouse_password: String::new(),
            clickhouse_database: "market_data".to_string(),
        },
    }
}

pub fn app_state_with(
    repository: Arc<InMemoryPriceRepository>,
    client: Arc<FakeHttpClient>,
) -> Arc<crate::app_state::models::AppState> {
    let settings = Arc::new(test_settings());
    let workers = settings.app_config.ingestion.workers;
    let pipeline = Arc::new(pipeline_with(repository.clone(), client));

    Arc::new(crate::app_state::models::AppState::new(
        settings,
        repository,
        Arc::new(crate::services::ingestion::pool::IngestionPool::new(pipeline, workers)),
    ))
}
