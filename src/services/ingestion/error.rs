use crate::db::clickhouse::error::StoreError;
use crate::services::quotes::error::QuoteError;
use thiserror::Error;

/// Hard failures that end a symbol's job early.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] QuoteError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
