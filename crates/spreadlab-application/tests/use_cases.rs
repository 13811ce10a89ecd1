use spreadlab_application::analytics::{run_pair_analytics, AnalyticsParams};
use spreadlab_application::catalog::{list_symbols, tick_count};
use spreadlab_application::config::Config;
use spreadlab_application::export::export_pair_data;
use spreadlab_application::ingestion::{ingest_batch, ingest_tick};
use spreadlab_domain::errors::{AnalyticsError, ExportError, StorageError};
use spreadlab_domain::repositories::exports::PairDataExporter;
use spreadlab_domain::repositories::ticks::{PairTickQuery, RowCapPolicy, TickRepository};
use spreadlab_domain::services::alerts::AlertOperator;
use spreadlab_domain::services::sanitize::PairRowPayload;
use spreadlab_domain::value_objects::tick::{format_timestamp_ms, RawTick, Tick};
use spreadlab_infrastructure::persistence::memory_ticks::InMemoryTickRepository;
use std::cell::RefCell;
use std::path::{Path, PathBuf};

struct FailingRepo;

impl TickRepository for FailingRepo {
    fn insert(&self, _tick: &Tick) -> Result<(), StorageError> {
        Err(StorageError::Write("disk full".to_string()))
    }

    fn query_pair(&self, _query: &PairTickQuery) -> Result<Vec<Tick>, StorageError> {
        Err(StorageError::Query("connection refused".to_string()))
    }

    fn distinct_symbols(&self) -> Vec<String> {
        Vec::new()
    }

    fn count(&self) -> u64 {
        0
    }
}

#[derive(Default)]
struct RecordingExporter {
    ensured_dirs: RefCell<Vec<PathBuf>>,
    written: RefCell<Option<(PathBuf, Vec<PairRowPayload>)>>,
}

impl PairDataExporter for RecordingExporter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        self.ensured_dirs.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn write_pair_data_csv(&self, path: &Path, rows: &[PairRowPayload]) -> Result<(), String> {
        *self.written.borrow_mut() = Some((path.to_path_buf(), rows.to_vec()));
        Ok(())
    }
}

fn raw(symbol: &str, ts_ms: i64, price: f64) -> RawTick {
    RawTick {
        symbol: symbol.to_string(),
        ts: format_timestamp_ms(ts_ms),
        price,
        size: 0.5,
    }
}

fn params(a: &str, b: &str) -> AnalyticsParams {
    AnalyticsParams {
        symbol_a: a.to_string(),
        symbol_b: b.to_string(),
        ..AnalyticsParams::default()
    }
}

/// Thirty one-minute buckets; `a` tracks `b` closely until a jump in the last bucket.
fn seed_pair(repo: &InMemoryTickRepository) {
    for i in 0..30i64 {
        let b = 50.0 + (i % 3) as f64;
        let mut a = 100.0 + if i % 2 == 0 { 0.1 } else { -0.1 };
        if i == 29 {
            a += 10.0;
        }
        let ts = 1_704_067_200_000 + i * 60_000;
        ingest_tick(repo, &raw("BTCUSDT", ts + 5_000, a)).unwrap();
        ingest_tick(repo, &raw("ethusdt", ts + 7_000, b)).unwrap();
    }
}

#[test]
fn ingest_then_analytics_end_to_end() {
    let repo = InMemoryTickRepository::new();
    seed_pair(&repo);
    assert_eq!(tick_count(&repo), 60);

    let outcome = run_pair_analytics(&Config::default(), &repo, &params("btcusdt", "ethusdt")).unwrap();
    let payload = &outcome.payload;
    assert_eq!(payload.status, "success");
    assert_eq!(payload.controls.timeframe, "1min");
    assert_eq!(payload.controls.rolling_window, 20);
    assert_eq!(payload.charts.pair_data.len(), 30);
    assert_eq!(payload.charts.pair_data[0].timestamp, "2024-01-01T00:00:00.000Z");
    assert!(payload.charts.pair_data[..19].iter().all(|r| r.rolling_corr.is_none()));
    assert!(payload.analytics.hedge_ratio.is_some());
    assert_eq!(payload.analytics.stats_a.count, 30);

    let json = serde_json::to_value(payload).unwrap();
    assert!(json["analytics"]["adf_test_spread"].get("test_statistic").is_some());
    assert!(json["analytics"]["stats_b"].get("75%").is_some());
}

#[test]
fn jump_in_last_bucket_triggers_upper_alert() {
    let repo = InMemoryTickRepository::new();
    seed_pair(&repo);

    let outcome = run_pair_analytics(&Config::default(), &repo, &params("btcusdt", "ethusdt")).unwrap();
    assert_eq!(outcome.alerts.len(), 1);
    assert_eq!(outcome.alerts[0].rule.operator, AlertOperator::Above);
    assert!(outcome.alerts[0].value > 2.0);
}

#[test]
fn combined_cap_can_starve_a_symbol_while_per_symbol_keeps_both() {
    let repo = InMemoryTickRepository::new();
    for i in 0..5i64 {
        ingest_tick(&repo, &raw("ethusdt", i * 60_000 + 30_000, 2_000.0 + i as f64)).unwrap();
    }
    for i in 0..600i64 {
        ingest_tick(&repo, &raw("btcusdt", i * 1_000, 40_000.0 + (i % 7) as f64)).unwrap();
    }

    let mut config = Config::default();
    config.query.max_rows = 200;
    let mut p = params("btcusdt", "ethusdt");
    p.timeframe = Some("1H".to_string());
    p.rolling_window = Some(1);

    let err = run_pair_analytics(&config, &repo, &p).unwrap_err();
    assert_eq!(err.to_string(), "Data missing for one or both symbols.");
    assert_eq!(err.kind(), "insufficient_data");

    config.query.row_cap_policy = RowCapPolicy::PerSymbol;
    let outcome = run_pair_analytics(&config, &repo, &p).unwrap();
    assert_eq!(outcome.payload.charts.pair_data.len(), 1);
}

#[test]
fn rolling_window_beyond_aligned_rows_is_insufficient() {
    let repo = InMemoryTickRepository::new();
    seed_pair(&repo);
    let mut p = params("btcusdt", "ethusdt");
    p.rolling_window = Some(31);

    let err = run_pair_analytics(&Config::default(), &repo, &p).unwrap_err();
    assert_eq!(
        err,
        AnalyticsError::Insufficient(
            spreadlab_domain::errors::InsufficientDataError::NotEnoughAligned {
                required: 31,
                available: 30,
            }
        )
    );
}

#[test]
fn stray_epoch_zero_tick_is_reported_as_invalid_request() {
    let repo = InMemoryTickRepository::new();
    seed_pair(&repo);
    ingest_tick(&repo, &raw("btcusdt", 0, 100.0)).unwrap();

    let err = run_pair_analytics(&Config::default(), &repo, &params("btcusdt", "ethusdt")).unwrap_err();
    assert_eq!(err.kind(), "invalid_request");
    assert!(err.to_string().contains("1970-01-01T00:00:00.000Z"), "{err}");

    let mut p = params("btcusdt", "ethusdt");
    p.timeframe = Some("1D".to_string());
    let err = run_pair_analytics(&Config::default(), &repo, &p).unwrap_err();
    assert_eq!(err.kind(), "insufficient_data");

    let mut config = Config::default();
    config.query.max_buckets = 10_000;
    let err = run_pair_analytics(&config, &repo, &p).unwrap_err();
    assert_eq!(err.kind(), "invalid_request");
}

#[test]
fn empty_store_reports_no_data_and_default_symbols() {
    let repo = InMemoryTickRepository::new();
    let err = run_pair_analytics(&Config::default(), &repo, &params("btcusdt", "ethusdt")).unwrap_err();
    assert_eq!(err.to_string(), "No data available.");
    assert_eq!(list_symbols(&Config::default(), &repo), vec!["btcusdt", "ethusdt"]);
}

#[test]
fn storage_failures_surface_on_reads_and_writes_but_metadata_degrades() {
    let err = run_pair_analytics(&Config::default(), &FailingRepo, &params("a", "b")).unwrap_err();
    assert_eq!(err.kind(), "storage");

    let summary = ingest_batch(&FailingRepo, vec![Ok(raw("a", 0, 1.0))], 0);
    assert_eq!(summary.failed, 1);

    assert_eq!(tick_count(&FailingRepo), 0);
    assert_eq!(list_symbols(&Config::default(), &FailingRepo).len(), 2);
}

#[test]
fn export_writes_sanitized_rows_to_pair_file() {
    let repo = InMemoryTickRepository::new();
    seed_pair(&repo);
    let exporter = RecordingExporter::default();
    let out_dir = Path::new("exports");

    let path = export_pair_data(
        &Config::default(),
        &repo,
        &exporter,
        &params("BTCUSDT", "ethusdt"),
        out_dir,
    )
    .unwrap();

    assert_eq!(path, out_dir.join("analytics_btcusdt_ethusdt.csv"));
    assert_eq!(exporter.ensured_dirs.borrow().as_slice(), &[out_dir.to_path_buf()]);
    let written = exporter.written.borrow();
    let (written_path, rows) = written.as_ref().unwrap();
    assert_eq!(written_path, &path);
    assert_eq!(rows.len(), 30);
    assert!(rows[0].rolling_corr.is_none());
}

#[test]
fn export_propagates_analytics_errors() {
    let repo = InMemoryTickRepository::new();
    let exporter = RecordingExporter::default();
    let err = export_pair_data(
        &Config::default(),
        &repo,
        &exporter,
        &params("btcusdt", "ethusdt"),
        Path::new("exports"),
    )
    .unwrap_err();
    assert!(matches!(err, ExportError::Analytics(_)));
    assert!(exporter.written.borrow().is_none());
}
