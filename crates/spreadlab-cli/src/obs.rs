use spreadlab_application::config::{LogConfig, LogFormat};
use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub filter: String,
    pub format: LogFormat,
}

/// Filter precedence: `SPREADLAB_LOG`, then `--log-level`, then `[log] level`.
/// Format: `--log-format`, then `[log] format`.
pub fn resolve_log_settings(
    env_filter: Option<String>,
    cli_level: Option<&str>,
    cli_format: Option<&str>,
    config: &LogConfig,
) -> Result<LogSettings, String> {
    let filter = env_filter
        .filter(|v| !v.trim().is_empty())
        .or_else(|| cli_level.map(str::to_string))
        .unwrap_or_else(|| config.level.clone());
    let format = match cli_format {
        Some(raw) => LogFormat::parse(raw)?,
        None => config.format,
    };
    Ok(LogSettings { filter, format })
}

pub fn init_tracing(settings: &LogSettings) -> Result<(), String> {
    let env_filter = tracing_subscriber::EnvFilter::try_new(&settings.filter)
        .map_err(|err| format!("invalid log filter {:?}: {err}", settings.filter))?;

    // stdout carries command output, logs go to stderr.
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    match settings.format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Text => builder.init(),
    }
    Ok(())
}

#[cfg(feature = "prometheus")]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let Some(raw) = metrics_addr else {
        return Ok(None);
    };
    let addr: SocketAddr = raw
        .parse()
        .map_err(|err| format!("invalid --metrics-addr (expected host:port): {err}"))?;

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|err| format!("failed to install prometheus exporter: {err}"))?;

    tracing::info!(metrics_addr = %addr, "prometheus metrics exporter enabled");
    Ok(Some(addr))
}

#[cfg(not(feature = "prometheus"))]
pub fn init_metrics(metrics_addr: Option<&str>) -> Result<Option<SocketAddr>, String> {
    if metrics_addr.is_some() {
        return Err("--metrics-addr needs spreadlab-cli built with feature `prometheus`".to_string());
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_log() -> LogConfig {
        LogConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
        }
    }

    #[test]
    fn config_supplies_defaults() {
        let settings = resolve_log_settings(None, None, None, &config_log()).unwrap();
        assert_eq!(settings.filter, "warn");
        assert_eq!(settings.format, LogFormat::Json);
    }

    #[test]
    fn env_beats_flag_beats_config() {
        let cfg = config_log();
        let flag = resolve_log_settings(None, Some("debug"), Some("text"), &cfg).unwrap();
        assert_eq!(flag.filter, "debug");
        assert_eq!(flag.format, LogFormat::Text);

        let env = resolve_log_settings(Some("spreadlab=trace".to_string()), Some("debug"), None, &cfg)
            .unwrap();
        assert_eq!(env.filter, "spreadlab=trace");

        let blank_env = resolve_log_settings(Some(" ".to_string()), None, None, &cfg).unwrap();
        assert_eq!(blank_env.filter, "warn");
    }

    #[test]
    fn unknown_format_flag_is_an_error() {
        assert!(resolve_log_settings(None, None, Some("xml"), &config_log()).is_err());
    }
}
