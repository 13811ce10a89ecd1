mod commands;
mod infra;
mod obs;

use clap::{Args, Parser, Subcommand};
use commands::Command;
use spreadlab_application::analytics::AnalyticsParams;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "spreadlab")]
#[command(about = "Spreadlab pair analytics CLI", version, arg_required_else_help = true)]
#[command(
    after_help = "Examples:\n  spreadlab --config configs/sample.toml migrate\n  spreadlab --config configs/sample.toml ingest --input ticks.jsonl\n  spreadlab --config configs/sample.toml analytics --symbol-a btcusdt --symbol-b ethusdt --timeframe 5min\n  spreadlab analyze-file --input ticks.jsonl --symbol-a btcusdt --symbol-b ethusdt\n"
)]
struct Cli {
    /// Config file path (TOML). If omitted, uses env SPREADLAB_CONFIG, else built-in defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter used when SPREADLAB_LOG is unset (default from `[log] level`).
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log output format (default from `[log] format`).
    #[arg(long, global = true, value_parser = ["text", "json"])]
    log_format: Option<String>,

    /// Serve Prometheus metrics on host:port.
    #[arg(long, global = true)]
    metrics_addr: Option<String>,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Args, Debug, Clone)]
struct PairArgs {
    #[arg(long)]
    symbol_a: String,
    #[arg(long)]
    symbol_b: String,
    /// Resampling timeframe, e.g. 1s, 1min, 5min, 1H (default from config).
    #[arg(long)]
    timeframe: Option<String>,
    #[arg(long)]
    rolling_window: Option<usize>,
    /// Hedge ratio estimator (only "ols" is supported).
    #[arg(long)]
    regression: Option<String>,
}

impl From<PairArgs> for AnalyticsParams {
    fn from(args: PairArgs) -> Self {
        AnalyticsParams {
            symbol_a: args.symbol_a,
            symbol_b: args.symbol_b,
            timeframe: args.timeframe,
            rolling_window: args.rolling_window,
            regression: args.regression,
        }
    }
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Create the tick table and index if missing.
    Migrate,
    /// Store JSON-lines ticks from a file ("-" reads stdin).
    Ingest {
        #[arg(long)]
        input: PathBuf,
        /// Extra attempts per tick after a storage failure.
        #[arg(long, default_value_t = 2)]
        retries: u32,
    },
    /// Compute pair analytics from stored ticks and print the JSON payload.
    Analytics {
        #[command(flatten)]
        pair: PairArgs,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Write the pair rows of an analytics run as CSV.
    Export {
        #[command(flatten)]
        pair: PairArgs,
        #[arg(long, default_value = "exports")]
        out_dir: PathBuf,
    },
    /// List stored symbols (configured defaults when the store is empty).
    Symbols,
    /// Print the number of stored ticks.
    Count,
    /// Run pair analytics over a JSON-lines file without touching storage.
    AnalyzeFile {
        #[arg(long)]
        input: PathBuf,
        #[command(flatten)]
        pair: PairArgs,
        #[arg(long, default_value_t = false)]
        pretty: bool,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

impl From<CliCommand> for Command {
    fn from(command: CliCommand) -> Self {
        match command {
            CliCommand::Migrate => Command::Migrate,
            CliCommand::Ingest { input, retries } => Command::Ingest { input, retries },
            CliCommand::Analytics { pair, pretty } => Command::Analytics {
                params: pair.into(),
                pretty,
            },
            CliCommand::Export { pair, out_dir } => Command::Export {
                params: pair.into(),
                out_dir,
            },
            CliCommand::Symbols => Command::Symbols,
            CliCommand::Count => Command::Count,
            CliCommand::AnalyzeFile {
                input,
                pair,
                pretty,
            } => Command::AnalyzeFile {
                input,
                params: pair.into(),
                pretty,
            },
            CliCommand::ShowConfig => Command::ShowConfig,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {}", err);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    let config_path = cli.config.or_else(|| {
        std::env::var("SPREADLAB_CONFIG")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
    });
    let config = commands::load_or_default(config_path.as_deref())?;

    let settings = obs::resolve_log_settings(
        std::env::var("SPREADLAB_LOG").ok(),
        cli.log_level.as_deref(),
        cli.log_format.as_deref(),
        &config.log,
    )?;
    obs::init_tracing(&settings)?;
    obs::init_metrics(cli.metrics_addr.as_deref())?;
    tracing::debug!(config = ?config_path, log_filter = %settings.filter, "config loaded");

    commands::run(&config, cli.command.into())
}
