use serde::Serialize;
use spreadlab_application::config::{load_config, to_toml_pretty, validate_config, Config};
use spreadlab_application::meta::{engine_name, engine_version};
use std::path::Path;

pub fn load_or_default(path: Option<&Path>) -> Result<Config, String> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = Config::default();
            validate_config(&config)?;
            Ok(config)
        }
    }
}

pub(super) fn print_config_summary(command: &str, config: &Config) {
    eprintln!(
        "{} {} cli: {} (backend={:?}, table={}, max_rows={}, row_cap_policy={})",
        engine_name(),
        engine_version(),
        command,
        config.db.backend,
        config.db.ticks_table,
        config.query.max_rows,
        config.query.row_cap_policy.as_str()
    );
}

pub(super) fn print_config(config: &Config) -> Result<(), String> {
    print!("{}", to_toml_pretty(config)?);
    Ok(())
}

pub(super) fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<(), String> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|err| format!("failed to serialize json output: {err}"))?;
    println!("{text}");
    Ok(())
}
