use crate::analytics::{run_pair_analytics, AnalyticsParams};
use crate::config::Config;
use spreadlab_domain::errors::ExportError;
use spreadlab_domain::repositories::exports::PairDataExporter;
use spreadlab_domain::repositories::ticks::TickRepository;
use std::path::{Path, PathBuf};
use tracing::info_span;

pub fn export_file_name(symbol_a: &str, symbol_b: &str) -> String {
    format!("analytics_{symbol_a}_{symbol_b}.csv")
}

/// Computes pair analytics and writes the sanitized pair rows as CSV into
/// `out_dir`. Returns the written path.
pub fn export_pair_data(
    config: &Config,
    repo: &dyn TickRepository,
    exporter: &dyn PairDataExporter,
    params: &AnalyticsParams,
    out_dir: &Path,
) -> Result<PathBuf, ExportError> {
    let _span = info_span!("app.export.pair_data", out_dir = %out_dir.display()).entered();

    let outcome = run_pair_analytics(config, repo, params)?;
    let controls = &outcome.payload.controls;
    let path = out_dir.join(export_file_name(&controls.symbol_a, &controls.symbol_b));

    exporter.ensure_dir(out_dir).map_err(ExportError::Io)?;
    exporter
        .write_pair_data_csv(&path, &outcome.payload.charts.pair_data)
        .map_err(ExportError::Io)?;

    metrics::counter!("spreadlab.export.files_total").increment(1);
    tracing::info!(
        path = %path.display(),
        rows = outcome.payload.charts.pair_data.len(),
        "pair data exported"
    );
    Ok(path)
}
