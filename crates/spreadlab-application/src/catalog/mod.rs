use crate::config::Config;
use spreadlab_domain::repositories::ticks::TickRepository;

/// Distinct stored symbols, or the configured defaults when the store has
/// none (or the lookup failed soft).
pub fn list_symbols(config: &Config, repo: &dyn TickRepository) -> Vec<String> {
    let symbols = repo.distinct_symbols();
    metrics::gauge!("spreadlab.catalog.symbols").set(symbols.len() as f64);
    if symbols.is_empty() {
        tracing::debug!("no stored symbols; returning configured defaults");
        return config.catalog.default_symbols.clone();
    }
    symbols
}

pub fn tick_count(repo: &dyn TickRepository) -> u64 {
    let count = repo.count();
    metrics::gauge!("spreadlab.catalog.tick_count").set(count as f64);
    count
}
