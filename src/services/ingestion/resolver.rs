// File: src/services/ingestion/resolver.rs
use super::transformer::normalize_ticker;
use crate::db::clickhouse::error::StoreError;
use crate::db::clickhouse::repository::price_repository::PriceRepository;
use chrono::{DateTime, Duration, Months, NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y%m%d"];

/// Effective fetch start for one job. `lookup_error` is set when the store
/// could not be asked; the start then falls back to the requested date.
#[derive(Debug)]
pub struct ResolvedStart {
    pub start: DateTime<Utc>,
    pub lookup_error: Option<StoreError>,
}

pub struct StartResolver {
    repository: Arc<dyn PriceRepository + Send + Sync>,
    lookback: Duration,
}

impl StartResolver {
    pub fn new(repository: Arc<dyn PriceRepository + Send + Sync>, lookback_days: i64) -> Self {
        Self {
            repository,
            lookback: Duration::days(lookback_days.max(1)),
        }
    }

    pub async fn resolve(&self, symbol: &str, requested_start: &str) -> ResolvedStart {
        let default_start = parse_start_date(requested_start);
        let since = (Utc::now() - self.lookback).timestamp();
        let ticker = normalize_ticker(symbol);

        match self.repository.latest_time(&ticker, since).await {
            Ok(Some(record_time)) => {
                // +1 day so the boundary bar is not written again
                let advanced = DateTime::<Utc>::from_timestamp(record_time, 0)
                    .map(|time| time + Duration::days(1));

                match advanced {
                    Some(advanced) if advanced > default_start => {
                        debug!(ticker = symbol, %advanced, "Resuming after latest stored bar");
                        ResolvedStart {
                            start: advanced,
                            lookup_error: None,
                        }
                    }
                    _ => ResolvedStart {
                        start: default_start,
                        lookup_error: None,
                    },
                }
            }
            Ok(None) => {
                debug!(ticker = symbol, %default_start, "No recent bars, using requested start");
                ResolvedStart {
                    start: default_start,
                    lookup_error: None,
                }
            }
            Err(e) => {
                warn!(ticker = symbol, error = %e, "Failed to get latest timestamp, using requested start");
                ResolvedStart {
                    start: default_start,
                    lookup_error: Some(e),
                }
            }
        }
    }
}

/// Parses `YYYY-MM-DD` or `YYYYMMDD` as UTC midnight. Anything else means
/// one year before now.
pub fn parse_start_date(raw: &str) -> DateTime<Utc> {
    parse_date(raw)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_else(one_year_ago)
}

pub(crate) fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(raw, format).ok())
}

fn one_year_ago() -> DateTime<Utc> {
    let now = Utc::now();
    now.checked_sub_months(Months::new(12))
        .unwrap_or(now - Duration::days(365))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{InMemoryPriceRepository, point_at};
    use chrono::TimeZone;

    fn resolver(repository: Arc<InMemoryPriceRepository>) -> StartResolver {
        StartResolver::new(repository, 30)
    }

    #[test]
    fn test_parse_both_accepted_formats() {
        let expected = Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(parse_start_date("2020-01-01"), expected);
        assert_eq!(parse_start_date("20200101"), expected);
        assert_eq!(parse_start_date(" 2020-01-01 "), expected);
    }

    #[test]
    fn test_bad_date_falls_back_to_one_year_ago() {
        for raw in ["bad-date", "", "2020/01/01", "2020-13-01"] {
            let parsed = parse_start_date(raw);
            let expected = Utc::now() - Duration::days(365);
            let drift = (parsed - expected).num_hours().abs();
            assert!(drift <= 48, "{raw:?} resolved to {parsed}");
        }
    }

    #[tokio::test]
    async fn test_recent_record_advances_start_by_one_day() {
        let last = Utc::now() - Duration::days(3);
        let repository = Arc::new(InMemoryPriceRepository::with_points(vec![point_at(
            "SPY",
            last.timestamp(),
        )]));

        let resolved = resolver(repository).resolve("SPY", "2020-01-01").await;

        assert_eq!(resolved.start.timestamp(), (last + Duration::days(1)).timestamp());
        assert!(resolved.lookup_error.is_none());
    }

    #[tokio::test]
    async fn test_requested_start_wins_when_newer_than_record() {
        let last = Utc::now() - Duration::days(10);
        let requested = (Utc::now() - Duration::days(2)).date_naive();
        let repository = Arc::new(InMemoryPriceRepository::with_points(vec![point_at(
            "SPY",
            last.timestamp(),
        )]));

        let resolved = resolver(repository)
            .resolve("SPY", &requested.format("%Y-%m-%d").to_string())
            .await;

        assert_eq!(resolved.start.date_naive(), requested);
    }

    #[tokio::test]
    async fn test_records_outside_lookback_are_ignored() {
        let stale = Utc::now() - Duration::days(90);
        let repository = Arc::new(InMemoryPriceRepository::with_points(vec![point_at(
            "SPY",
            stale.timestamp(),
        )]));

        let resolved = resolver(repository).resolve("SPY", "20200101").await;

        assert_eq!(resolved.start, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
    }

    #[tokio::test]
    async fn test_lookup_uses_normalized_ticker() {
        let last = Utc::now() - Duration::days(1);
        let repository = Arc::new(InMemoryPriceRepository::with_points(vec![point_at(
            "BTCUSDT",
            last.timestamp(),
        )]));

        let resolved = resolver(repository).resolve("BTC-USD", "2020-01-01").await;

        assert_eq!(resolved.start.timestamp(), (last + Duration::days(1)).timestamp());
    }

    #[tokio::test]
    async fn test_query_failure_falls_back_and_reports() {
        let repository = Arc::new(InMemoryPriceRepository::default());
        repository.fail_queries();

        let resolved = resolver(repository).resolve("SPY", "2020-01-01").await;

        assert_eq!(resolved.start, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        assert!(resolved.lookup_error.is_some());
    }
}
