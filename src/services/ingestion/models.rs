// File: src/services/ingestion/models.rs
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// One unit of work: ingest `symbol` from `start_date` at `interval`.
#[derive(Debug, Clone)]
pub struct FetchJob {
    pub symbol: String,
    pub start_date: String,
    pub interval: String,
}

/// A bar whose six source values were all present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceBar {
    pub timestamp: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Pending,
    Resolving,
    Fetching,
    Transforming,
    Writing,
    Done,
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            JobStage::Pending => "pending",
            JobStage::Resolving => "resolving",
            JobStage::Fetching => "fetching",
            JobStage::Transforming => "transforming",
            JobStage::Writing => "writing",
            JobStage::Done => "done",
        };
        f.write_str(name)
    }
}

/// Terminal status of one job. Rendered as the report string callers see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestionOutcome {
    Written(usize),
    NoNewData,
    Failed(String),
}

impl IngestionOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, IngestionOutcome::Failed(_))
    }
}

impl fmt::Display for IngestionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionOutcome::Written(count) => write!(f, "{count} points written"),
            IngestionOutcome::NoNewData => write!(f, "No new data"),
            IngestionOutcome::Failed(message) => write!(f, "Error: {message}"),
        }
    }
}

/// Symbol -> outcome string for one fetch cycle.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct IngestionReport {
    details: BTreeMap<String, String>,
    #[serde(skip)]
    outcomes_received: usize,
}

impl IngestionReport {
    /// Arrival order does not matter; a repeated symbol keeps the last outcome.
    pub fn merge(&mut self, symbol: String, outcome: &IngestionOutcome) {
        self.details.insert(symbol, outcome.to_string());
        self.outcomes_received += 1;
    }

    pub fn outcomes_received(&self) -> usize {
        self.outcomes_received
    }

    pub fn len(&self) -> usize {
        self.details.len()
    }

    pub fn get(&self, symbol: &str) -> Option<&str> {
        self.details.get(symbol).map(String::as_str)
    }

    pub fn into_details(self) -> BTreeMap<String, String> {
        self.details
    }
}
