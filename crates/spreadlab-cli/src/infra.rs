use spreadlab_application::config::{Config, StorageBackend};
use spreadlab_domain::repositories::exports::PairDataExporter;
use spreadlab_domain::repositories::ticks::TickRepository;
use spreadlab_infrastructure::export::CsvPairDataExporter;
use spreadlab_infrastructure::persistence::memory_ticks::InMemoryTickRepository;
use spreadlab_infrastructure::persistence::postgres_ticks::PostgresTickRepository;
use std::env;

pub struct ExportDeps {
    pub ticks: Box<dyn TickRepository>,
    pub exporter: Box<dyn PairDataExporter>,
}

pub fn build_tick_repo(config: &Config) -> Result<Box<dyn TickRepository>, String> {
    match config.db.backend {
        StorageBackend::Postgres => {
            let db_url = resolve_db_url(config, env::var("SPREADLAB_DB_URL").ok())?;
            let pool_max_size = config.db.pool_max_size.unwrap_or(8);
            Ok(Box::new(PostgresTickRepository::new(
                db_url,
                config.db.ticks_table.to_string(),
                pool_max_size,
            )?))
        }
        StorageBackend::Memory => {
            tracing::warn!("db.backend = \"memory\": ticks are not kept after this process exits");
            Ok(Box::new(InMemoryTickRepository::new()))
        }
    }
}

pub fn build_export_deps(config: &Config) -> Result<ExportDeps, String> {
    Ok(ExportDeps {
        ticks: build_tick_repo(config)?,
        exporter: Box::new(CsvPairDataExporter::new()),
    })
}

fn resolve_db_url(config: &Config, env_url: Option<String>) -> Result<String, String> {
    match config.db.url.as_deref() {
        Some(url) if !url.trim().is_empty() => Ok(url.to_string()),
        _ => env_url
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                "missing db.url in config and env SPREADLAB_DB_URL is not set".to_string()
            }),
    }
}
