use spreadlab_domain::errors::{IngestError, StorageError};
use spreadlab_domain::repositories::ticks::TickRepository;
use spreadlab_domain::value_objects::tick::{RawTick, Tick};
use std::time::Instant;
use tracing::info_span;

/// Validates one collector tick and appends it to the store.
pub fn ingest_tick(repo: &dyn TickRepository, raw: &RawTick) -> Result<Tick, IngestError> {
    let tick = match raw.validate() {
        Ok(tick) => tick,
        Err(err) => {
            metrics::counter!("spreadlab.ingest.ticks_total", "result" => "invalid").increment(1);
            return Err(IngestError::InvalidTick(err));
        }
    };

    let start = Instant::now();
    let res = repo.insert(&tick);
    metrics::histogram!("spreadlab.ingest.insert_ms").record(start.elapsed().as_secs_f64() * 1000.0);
    match res {
        Ok(()) => {
            metrics::counter!("spreadlab.ingest.ticks_total", "result" => "ok").increment(1);
            Ok(tick)
        }
        Err(err) => {
            metrics::counter!("spreadlab.ingest.ticks_total", "result" => "err").increment(1);
            Err(IngestError::Storage(err))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub failed: usize,
    pub retried: usize,
}

/// Feeds a batch through `ingest_tick`. Invalid ticks are counted and
/// skipped; a storage failure is retried up to `retries` times before the
/// tick counts as failed. Nothing is silently dropped: every outcome lands in
/// the summary.
pub fn ingest_batch<I>(repo: &dyn TickRepository, ticks: I, retries: u32) -> IngestSummary
where
    I: IntoIterator<Item = Result<RawTick, String>>,
{
    let _span = info_span!("app.ingest.batch", retries = retries).entered();
    let mut summary = IngestSummary::default();

    for (line, item) in ticks.into_iter().enumerate() {
        let raw = match item {
            Ok(raw) => raw,
            Err(err) => {
                tracing::warn!(line = line + 1, error = %err, "skipping unreadable tick");
                summary.rejected += 1;
                continue;
            }
        };

        let mut attempt = 0u32;
        loop {
            match ingest_tick(repo, &raw) {
                Ok(_) => {
                    summary.accepted += 1;
                    break;
                }
                Err(IngestError::InvalidTick(err)) => {
                    tracing::warn!(line = line + 1, error = %err, "rejecting invalid tick");
                    summary.rejected += 1;
                    break;
                }
                Err(IngestError::Storage(err)) if attempt < retries && is_retryable(&err) => {
                    attempt += 1;
                    summary.retried += 1;
                    tracing::warn!(line = line + 1, attempt, error = %err, "retrying tick insert");
                }
                Err(IngestError::Storage(err)) => {
                    tracing::error!(line = line + 1, error = %err, "tick insert failed");
                    summary.failed += 1;
                    break;
                }
            }
        }
    }

    tracing::info!(
        accepted = summary.accepted,
        rejected = summary.rejected,
        failed = summary.failed,
        "ingest batch finished"
    );
    summary
}

fn is_retryable(err: &StorageError) -> bool {
    !matches!(err, StorageError::Config(_))
}

#[cfg(test)]
mod tests {
    use super::*;
    use spreadlab_domain::repositories::ticks::PairTickQuery;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FlakyRepo {
        failures_left: AtomicUsize,
        stored: Mutex<Vec<Tick>>,
    }

    impl FlakyRepo {
        fn new(failures: usize) -> Self {
            Self {
                failures_left: AtomicUsize::new(failures),
                stored: Mutex::new(Vec::new()),
            }
        }
    }

    impl TickRepository for FlakyRepo {
        fn insert(&self, tick: &Tick) -> Result<(), StorageError> {
            if self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StorageError::Write("connection reset".to_string()));
            }
            self.stored.lock().unwrap().push(tick.clone());
            Ok(())
        }

        fn query_pair(&self, _query: &PairTickQuery) -> Result<Vec<Tick>, StorageError> {
            Ok(Vec::new())
        }

        fn distinct_symbols(&self) -> Vec<String> {
            Vec::new()
        }

        fn count(&self) -> u64 {
            self.stored.lock().unwrap().len() as u64
        }
    }

    fn raw(symbol: &str, price: f64) -> RawTick {
        RawTick {
            symbol: symbol.to_string(),
            ts: "2024-01-01T00:00:00.123".to_string(),
            price,
            size: 0.01,
        }
    }

    #[test]
    fn invalid_tick_never_reaches_storage() {
        let repo = FlakyRepo::new(0);
        let err = ingest_tick(&repo, &raw("btcusdt", -1.0)).unwrap_err();
        assert!(matches!(err, IngestError::InvalidTick(_)));
        assert_eq!(repo.count(), 0);
    }

    #[test]
    fn storage_failure_is_surfaced() {
        let repo = FlakyRepo::new(1);
        let err = ingest_tick(&repo, &raw("btcusdt", 1.0)).unwrap_err();
        assert!(matches!(err, IngestError::Storage(StorageError::Write(_))));
    }

    #[test]
    fn batch_retries_then_records_every_outcome() {
        let repo = FlakyRepo::new(2);
        let items = vec![
            Ok(raw("BTCUSDT", 42_000.5)),
            Err("line 2: expected value".to_string()),
            Ok(raw("ethusdt", 0.0)),
            Ok(raw("ethusdt", 2_300.0)),
        ];
        let summary = ingest_batch(&repo, items, 3);
        assert_eq!(
            summary,
            IngestSummary {
                accepted: 2,
                rejected: 2,
                failed: 0,
                retried: 2,
            }
        );
        assert_eq!(repo.stored.lock().unwrap()[0].symbol, "btcusdt");
    }

    #[test]
    fn batch_without_retries_counts_failures() {
        let repo = FlakyRepo::new(1);
        let summary = ingest_batch(&repo, vec![Ok(raw("a", 1.0)), Ok(raw("a", 2.0))], 0);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.accepted, 1);
    }
}
