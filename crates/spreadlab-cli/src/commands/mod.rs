mod analytics;
mod catalog;
mod common;
mod ingest;

use spreadlab_application::analytics::AnalyticsParams;
use spreadlab_application::config::Config;
use std::path::PathBuf;

pub use common::load_or_default;

#[derive(Debug)]
pub enum Command {
    Migrate,
    Ingest {
        input: PathBuf,
        retries: u32,
    },
    Analytics {
        params: AnalyticsParams,
        pretty: bool,
    },
    Export {
        params: AnalyticsParams,
        out_dir: PathBuf,
    },
    Symbols,
    Count,
    AnalyzeFile {
        input: PathBuf,
        params: AnalyticsParams,
        pretty: bool,
    },
    ShowConfig,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::Migrate => "migrate",
            Command::Ingest { .. } => "ingest",
            Command::Analytics { .. } => "analytics",
            Command::Export { .. } => "export",
            Command::Symbols => "symbols",
            Command::Count => "count",
            Command::AnalyzeFile { .. } => "analyze-file",
            Command::ShowConfig => "show-config",
        }
    }
}

pub fn run(config: &Config, command: Command) -> Result<(), String> {
    let name = command.name();
    let _span = tracing::info_span!("cli.command", command = name).entered();

    let res = match command {
        Command::Migrate => ingest::run_migrate(config),
        Command::Ingest { input, retries } => ingest::run_ingest(config, &input, retries),
        Command::Analytics { params, pretty } => {
            analytics::run_analytics(config, &params, pretty)
        }
        Command::Export { params, out_dir } => analytics::run_export(config, &params, &out_dir),
        Command::Symbols => catalog::run_symbols(config),
        Command::Count => catalog::run_count(config),
        Command::AnalyzeFile {
            input,
            params,
            pretty,
        } => analytics::run_analyze_file(config, &input, &params, pretty),
        Command::ShowConfig => common::print_config(config),
    };

    let result = if res.is_ok() { "ok" } else { "err" };
    metrics::counter!("spreadlab.cli.commands_total", "command" => name, "result" => result)
        .increment(1);
    res
}
