use crate::db::clickhouse::error::StoreError;
use crate::env_config::models::app_setting::AppSettings;
use clickhouse::Client;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct ClickhouseConnection {
    client: Client,
}

impl ClickhouseConnection {
    /// Builds the client and waits for the server to answer a health probe,
    /// retrying a fixed number of times with a fixed delay.
    pub async fn new(settings: Arc<AppSettings>) -> Result<Self, StoreError> {
        info!("Initializing ClickHouse connection...");

        let clickhouse_config = &settings.app_config.clickhouse;
        let timeout = clickhouse_config.timeout.to_string();

        let client = Client::default()
            .with_url(&settings.app_env.clickhouse_url)
            .with_user(&settings.app_env.clickhouse_user)
            .with_password(&settings.app_env.clickhouse_password)
            .with_database(&settings.app_env.clickhouse_database)
            .with_option("connect_timeout", timeout.clone())
            .with_option("receive_timeout", timeout.clone())
            .with_option("send_timeout", timeout);

        let connection = Self { client };
        let delay = Duration::from_secs(clickhouse_config.retry_delay_seconds);

        info!("Waiting for ClickHouse to be ready...");
        let ready =
            with_startup_retries(clickhouse_config.startup_retries, delay, || connection.ping()).await;
        match ready {
            Ok(()) => {
                info!("ClickHouse connection successful");
                Ok(connection)
            }
            Err(e) => {
                let err = StoreError::from(e);
                error!("Failed to connect to ClickHouse after all retries: {}", err);
                Err(err)
            }
        }
    }

    pub async fn ping(&self) -> Result<(), clickhouse::error::Error> {
        let test_query = "SELECT 1";
        debug!("Executing test query: {}", test_query);
        self.client.query(test_query).execute().await
    }

    pub fn get_client(&self) -> Client {
        self.client.clone()
    }
}

/// Runs `op` up to `attempts` times (at least once), sleeping `delay` between
/// failures. Returns the last error once attempts are exhausted.
async fn with_startup_retries<T, E, F, Fut>(
    attempts: u32,
    delay: Duration,
    mut op: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if attempt < attempts => {
                warn!(attempt, max_attempts = attempts, error = %e, "ClickHouse not ready, retrying...");
                attempt += 1;
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
}
