use spreadlab_domain::repositories::exports::PairDataExporter;
use spreadlab_domain::services::sanitize::PairRowPayload;
use std::fs;
use std::path::Path;

pub const PAIR_DATA_HEADER: [&str; 8] = [
    "timestamp",
    "price_a",
    "price_b",
    "volume_a",
    "volume_b",
    "spread",
    "z_score",
    "rolling_corr",
];

#[derive(Debug, Default, Clone, Copy)]
pub struct CsvPairDataExporter;

impl CsvPairDataExporter {
    pub fn new() -> Self {
        Self
    }
}

fn cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn write_pair_data_csv(path: &Path, rows: &[PairRowPayload]) -> Result<(), String> {
    let mut wtr = csv::Writer::from_path(path)
        .map_err(|err| format!("failed to create pair data csv {}: {}", path.display(), err))?;
    wtr.write_record(PAIR_DATA_HEADER)
        .map_err(|err| format!("failed to write pair data csv header: {}", err))?;

    for row in rows {
        wtr.write_record([
            row.timestamp.clone(),
            cell(row.price_a),
            cell(row.price_b),
            cell(row.volume_a),
            cell(row.volume_b),
            cell(row.spread),
            cell(row.z_score),
            cell(row.rolling_corr),
        ])
        .map_err(|err| format!("failed to write pair data row: {}", err))?;
    }

    wtr.flush()
        .map_err(|err| format!("failed to flush pair data csv: {}", err))
}

impl PairDataExporter for CsvPairDataExporter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        fs::create_dir_all(path)
            .map_err(|err| format!("failed to create dir {}: {}", path.display(), err))
    }

    fn write_pair_data_csv(&self, path: &Path, rows: &[PairRowPayload]) -> Result<(), String> {
        write_pair_data_csv(path, rows)
    }
}
