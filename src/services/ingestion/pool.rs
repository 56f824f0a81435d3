// File: src/services/ingestion/pool.rs
use super::models::{FetchJob, IngestionOutcome, IngestionReport, JobStage};
use super::pipeline::SymbolPipeline;
use std::sync::Arc;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument};
use uuid::Uuid;

type JobQueue = Arc<Mutex<mpsc::Receiver<FetchJob>>>;

/// Fixed-width pool that runs one `SymbolPipeline` job per requested symbol.
pub struct IngestionPool {
    pipeline: Arc<SymbolPipeline>,
    workers: usize,
}

impl IngestionPool {
    pub fn new(pipeline: Arc<SymbolPipeline>, workers: usize) -> Self {
        Self {
            pipeline,
            workers: workers.max(1),
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Fans the symbols out over the workers and blocks until every job has
    /// reported. Symbols are not deduplicated.
    #[instrument(skip_all, fields(cycle_id = %Uuid::new_v4(), symbols = symbols.len()))]
    pub async fn run(&self, symbols: &[String], start_date: &str, interval: &str) -> IngestionReport {
        let job_count = symbols.len();
        let mut report = IngestionReport::default();
        if job_count == 0 {
            return report;
        }

        // Pre-filled and closed before any worker starts
        let (job_tx, job_rx) = mpsc::channel::<FetchJob>(job_count);
        for symbol in symbols {
            let job = FetchJob {
                symbol: symbol.clone(),
                start_date: start_date.to_string(),
                interval: interval.to_string(),
            };
            if job_tx.send(job).await.is_err() {
                error!(ticker = %symbol, "Job queue closed before dispatch");
            }
        }
        drop(job_tx);

        let job_queue: JobQueue = Arc::new(Mutex::new(job_rx));
        let (result_tx, mut result_rx) = mpsc::channel::<(String, IngestionOutcome)>(job_count);

        let mut workers = JoinSet::new();
        for worker_id in 0..self.workers {
            workers.spawn(run_worker(
                worker_id,
                self.pipeline.clone(),
                job_queue.clone(),
                result_tx.clone(),
            ));
        }
        drop(result_tx);

        // Barrier: every worker has drained the queue and dropped its sender
        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(handled) => debug!(handled, "Worker exited"),
                Err(e) => error!(error = %e, "Worker task aborted"),
            }
        }

        let mut failed = 0;
        while let Some((symbol, outcome)) = result_rx.recv().await {
            if outcome.is_error() {
                failed += 1;
            }
            report.merge(symbol, &outcome);
        }

        // A worker that panicked took its job's outcome with it
        if report.outcomes_received() < job_count {
            let lost =
                IngestionOutcome::Failed("worker stopped before reporting an outcome".to_string());
            for symbol in symbols {
                if report.get(symbol).is_none() {
                    error!(ticker = %symbol, "No outcome received");
                    report.merge(symbol.clone(), &lost);
                    failed += 1;
                }
            }
        }

        info!(
            outcomes = report.outcomes_received(),
            tickers = report.len(),
            failed,
            "Data fetch cycle completed"
        );
        report
    }
}

async fn run_worker(
    worker_id: usize,
    pipeline: Arc<SymbolPipeline>,
    jobs: JobQueue,
    results: mpsc::Sender<(String, IngestionOutcome)>,
) -> usize {
    let mut handled = 0;
    loop {
        // Guard is released before the job runs
        let next = jobs.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };

        debug!(worker_id, ticker = %job.symbol, stage = %JobStage::Pending, "Job dequeued");
        info!(worker_id, ticker = %job.symbol, "Worker processing");
        let outcome = pipeline.process(worker_id, &job).await;
        handled += 1;

        if results.send((job.symbol, outcome)).await.is_err() {
            error!(worker_id, "Results channel closed, dropping outcome");
        }
    }
    handled
}
