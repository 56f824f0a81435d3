use reqwest::StatusCode;
use thiserror::Error;

/// Reasons a quote download fails. All of them fail the symbol's job.
#[derive(Debug, Error)]
pub enum QuoteError {
    #[error("invalid quote URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("failed to call quote API: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("quote API returned status {0}")]
    Status(StatusCode),

    #[error("failed to decode quote JSON: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("quote API error: {0}")]
    Api(String),

    #[error("no results in quote response for ticker {0}")]
    EmptyResult(String),

    #[error("incomplete indicators in quote response for ticker {0}")]
    IncompleteIndicators(String),
}
