use crate::infra::build_tick_repo;
use spreadlab_application::catalog::{list_symbols, tick_count};
use spreadlab_application::config::Config;

pub(super) fn run_symbols(config: &Config) -> Result<(), String> {
    let repo = build_tick_repo(config)?;
    for symbol in list_symbols(config, repo.as_ref()) {
        println!("{symbol}");
    }
    Ok(())
}

pub(super) fn run_count(config: &Config) -> Result<(), String> {
    let repo = build_tick_repo(config)?;
    println!("{}", tick_count(repo.as_ref()));
    Ok(())
}
