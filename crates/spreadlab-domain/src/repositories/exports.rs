use crate::services::sanitize::PairRowPayload;
use std::path::Path;

pub trait PairDataExporter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String>;
    fn write_pair_data_csv(&self, path: &Path, rows: &[PairRowPayload]) -> Result<(), String>;
}
