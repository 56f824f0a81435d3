use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("clickhouse error: {0}")]
    Clickhouse(#[from] clickhouse::error::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}
