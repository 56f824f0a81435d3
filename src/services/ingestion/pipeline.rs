// File: src/services/ingestion/pipeline.rs
use super::error::IngestError;
use super::models::{FetchJob, IngestionOutcome, JobStage};
use super::resolver::StartResolver;
use super::transformer::to_storage_points;
use super::writer::PointWriter;
use crate::services::quotes::fetcher::QuoteFetcher;
use chrono::{DateTime, Utc};
use tracing::{debug, error};

/// Resolve -> fetch -> transform -> write for a single symbol.
pub struct SymbolPipeline {
    resolver: StartResolver,
    fetcher: QuoteFetcher,
    writer: PointWriter,
}

impl SymbolPipeline {
    pub fn new(resolver: StartResolver, fetcher: QuoteFetcher, writer: PointWriter) -> Self {
        Self {
            resolver,
            fetcher,
            writer,
        }
    }

    /// Runs one job to completion. Never fails: a hard error in fetching or
    /// writing becomes an `IngestionOutcome::Failed` for this symbol only.
    pub async fn process(&self, worker_id: usize, job: &FetchJob) -> IngestionOutcome {
        let ticker = job.symbol.as_str();
        debug!(worker_id, ticker, stage = %JobStage::Resolving, "Resolving start time");

        let resolved = self.resolver.resolve(ticker, &job.start_date).await;

        match self.run_stages(worker_id, job, resolved.start).await {
            Ok(outcome) => {
                debug!(worker_id, ticker, stage = %JobStage::Done, outcome = %outcome, "Job finished");
                outcome
            }
            Err(e) => {
                error!(worker_id, ticker, error = %e, "Job failed");
                let mut message = e.to_string();
                if let Some(lookup_error) = &resolved.lookup_error {
                    message.push_str(&format!(" (start lookup failed: {lookup_error})"));
                }
                IngestionOutcome::Failed(message)
            }
        }
    }

    async fn run_stages(
        &self,
        worker_id: usize,
        job: &FetchJob,
        start: DateTime<Utc>,
    ) -> Result<IngestionOutcome, IngestError> {
        let ticker = job.symbol.as_str();

        debug!(worker_id, ticker, stage = %JobStage::Fetching, %start, "Fetching quotes");
        let Some(result) = self.fetcher.fetch(ticker, start, &job.interval).await? else {
            return Ok(IngestionOutcome::NoNewData);
        };

        debug!(worker_id, ticker, stage = %JobStage::Transforming, "Transforming response");
        let points = to_storage_points(ticker, &result);

        debug!(worker_id, ticker, stage = %JobStage::Writing, points = points.len(), "Writing points");
        Ok(self.writer.write(ticker, points).await?)
    }
}
