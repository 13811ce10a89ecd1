use super::common::print_config_summary;
use crate::infra::build_tick_repo;
use spreadlab_application::config::Config;
use spreadlab_application::ingestion::{ingest_batch, IngestSummary};
use spreadlab_infrastructure::ticks_jsonl::{read_ticks, read_ticks_file};
use std::path::Path;

pub(super) fn run_migrate(config: &Config) -> Result<(), String> {
    print_config_summary("migrate", config);
    let repo = build_tick_repo(config)?;
    repo.migrate().map_err(|err| err.to_string())?;
    println!("migrated table {}", config.db.ticks_table);
    Ok(())
}

pub(super) fn run_ingest(config: &Config, input: &Path, retries: u32) -> Result<(), String> {
    print_config_summary("ingest", config);
    let repo = build_tick_repo(config)?;
    let items = if input == Path::new("-") {
        read_ticks(std::io::stdin().lock())?
    } else {
        read_ticks_file(input)?
    };

    let summary = ingest_batch(repo.as_ref(), items, retries);
    print_summary(&summary);
    if summary.failed > 0 {
        return Err(format!(
            "{} tick(s) could not be stored after {} retries",
            summary.failed, retries
        ));
    }
    Ok(())
}

fn print_summary(summary: &IngestSummary) {
    println!(
        "ingest: accepted={} rejected={} failed={} retried={}",
        summary.accepted, summary.rejected, summary.failed, summary.retried
    );
}
