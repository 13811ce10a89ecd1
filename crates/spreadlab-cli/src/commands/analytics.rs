use super::common::{print_config_summary, print_json};
use crate::infra::{build_export_deps, build_tick_repo};
use spreadlab_application::analytics::{run_pair_analytics, AnalyticsParams, PairAnalyticsOutcome};
use spreadlab_application::config::Config;
use spreadlab_application::export::export_pair_data;
use spreadlab_application::ingestion::ingest_batch;
use spreadlab_domain::errors::{AnalyticsError, ExportError};
use spreadlab_domain::repositories::ticks::TickRepository;
use spreadlab_domain::services::sanitize::ErrorPayload;
use spreadlab_infrastructure::persistence::memory_ticks::InMemoryTickRepository;
use spreadlab_infrastructure::ticks_jsonl::read_ticks_file;
use std::path::Path;

pub(super) fn run_analytics(
    config: &Config,
    params: &AnalyticsParams,
    pretty: bool,
) -> Result<(), String> {
    let repo = build_tick_repo(config)?;
    analyze(config, repo.as_ref(), params, pretty)
}

pub(super) fn run_analyze_file(
    config: &Config,
    input: &Path,
    params: &AnalyticsParams,
    pretty: bool,
) -> Result<(), String> {
    let items = read_ticks_file(input)?;
    let repo = InMemoryTickRepository::new();
    let summary = ingest_batch(&repo, items, 0);
    eprintln!(
        "loaded {} tick(s) from {} ({} rejected)",
        summary.accepted,
        input.display(),
        summary.rejected
    );
    analyze(config, &repo, params, pretty)
}

pub(super) fn run_export(
    config: &Config,
    params: &AnalyticsParams,
    out_dir: &Path,
) -> Result<(), String> {
    print_config_summary("export", config);
    let deps = build_export_deps(config)?;
    match export_pair_data(
        config,
        deps.ticks.as_ref(),
        deps.exporter.as_ref(),
        params,
        out_dir,
    ) {
        Ok(path) => {
            println!("wrote {}", path.display());
            Ok(())
        }
        Err(ExportError::Analytics(err)) => Err(describe(&err)),
        Err(err) => Err(err.to_string()),
    }
}

/// Prints the payload (or the error payload) as JSON on stdout. Alerts go to
/// stderr so stdout stays a single JSON document.
fn analyze(
    config: &Config,
    repo: &dyn TickRepository,
    params: &AnalyticsParams,
    pretty: bool,
) -> Result<(), String> {
    match run_pair_analytics(config, repo, params) {
        Ok(PairAnalyticsOutcome { payload, alerts }) => {
            print_json(&payload, pretty)?;
            for alert in &alerts {
                eprintln!(
                    "alert: {} (value={:.4}, at {})",
                    alert.rule.describe(),
                    alert.value,
                    alert.timestamp
                );
            }
            Ok(())
        }
        Err(err) => {
            print_json(&ErrorPayload::from(&err), pretty)?;
            Err(describe(&err))
        }
    }
}

fn describe(err: &AnalyticsError) -> String {
    format!("{} ({})", err, err.kind())
}
