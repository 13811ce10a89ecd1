use crate::config::Config;
use serde::{Deserialize, Serialize};
use spreadlab_domain::entities::analytics::RegressionKind;
use spreadlab_domain::errors::AnalyticsError;
use spreadlab_domain::repositories::ticks::{PairTickQuery, TickRepository};
use spreadlab_domain::services::alerts::{evaluate_alerts, TriggeredAlert};
use spreadlab_domain::services::analytics::{compute_pair_analytics, PairRequest};
use spreadlab_domain::services::sanitize::{sanitize, AnalyticsPayload};
use spreadlab_domain::value_objects::timeframe::Timeframe;
use std::time::Instant;
use tracing::info_span;

/// Caller-facing analytics parameters. Unset fields fall back to
/// `[analytics]` in the config.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsParams {
    pub symbol_a: String,
    pub symbol_b: String,
    pub timeframe: Option<String>,
    pub rolling_window: Option<usize>,
    pub regression: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PairAnalyticsOutcome {
    pub payload: AnalyticsPayload,
    pub alerts: Vec<TriggeredAlert>,
}

pub fn parse_request(params: &AnalyticsParams, config: &Config) -> Result<PairRequest, AnalyticsError> {
    let symbol_a = normalize_symbol(&params.symbol_a)?;
    let symbol_b = normalize_symbol(&params.symbol_b)?;
    let timeframe_raw = params
        .timeframe
        .as_deref()
        .unwrap_or(&config.analytics.timeframe);
    let timeframe = Timeframe::parse(timeframe_raw).map_err(AnalyticsError::InvalidRequest)?;
    let rolling_window = params
        .rolling_window
        .unwrap_or(config.analytics.rolling_window);
    if rolling_window == 0 {
        return Err(AnalyticsError::InvalidRequest(
            "rolling_window must be >= 1".to_string(),
        ));
    }
    let regression = RegressionKind::parse(
        params
            .regression
            .as_deref()
            .unwrap_or(&config.analytics.regression),
    )
    .map_err(AnalyticsError::InvalidRequest)?;

    Ok(PairRequest {
        symbol_a,
        symbol_b,
        timeframe,
        rolling_window,
        regression,
        max_buckets: config.query.max_buckets,
    })
}

fn normalize_symbol(value: &str) -> Result<String, AnalyticsError> {
    let symbol = value.trim().to_lowercase();
    if symbol.is_empty() {
        return Err(AnalyticsError::InvalidRequest("symbol is empty".to_string()));
    }
    Ok(symbol)
}

/// Loads the pair snapshot, computes analytics and evaluates the configured
/// alert rules against the sanitized result.
pub fn run_pair_analytics(
    config: &Config,
    repo: &dyn TickRepository,
    params: &AnalyticsParams,
) -> Result<PairAnalyticsOutcome, AnalyticsError> {
    let request = match parse_request(params, config) {
        Ok(request) => request,
        Err(err) => {
            metrics::counter!("spreadlab.analytics.requests_total", "result" => err.kind())
                .increment(1);
            return Err(err);
        }
    };

    let _span = info_span!(
        "app.analytics.pair",
        symbol_a = %request.symbol_a,
        symbol_b = %request.symbol_b,
        timeframe = %request.timeframe.label,
        rolling_window = request.rolling_window,
        row_cap_policy = config.query.row_cap_policy.as_str()
    )
    .entered();

    let res = compute(config, repo, &request);
    let label = match &res {
        Ok(_) => "ok",
        Err(err) => err.kind(),
    };
    metrics::counter!("spreadlab.analytics.requests_total", "result" => label).increment(1);
    if let Err(err) = &res {
        tracing::info!(kind = err.kind(), error = %err, "pair analytics not computed");
    }
    res
}

fn compute(
    config: &Config,
    repo: &dyn TickRepository,
    request: &PairRequest,
) -> Result<PairAnalyticsOutcome, AnalyticsError> {
    let load_start = Instant::now();
    let ticks = repo.query_pair(&PairTickQuery {
        symbol_a: request.symbol_a.clone(),
        symbol_b: request.symbol_b.clone(),
        max_rows: config.query.max_rows,
        policy: config.query.row_cap_policy,
    })?;
    metrics::histogram!("spreadlab.analytics.load_ticks_ms")
        .record(load_start.elapsed().as_secs_f64() * 1000.0);
    metrics::gauge!("spreadlab.analytics.ticks_loaded").set(ticks.len() as f64);

    let compute_start = Instant::now();
    let result = compute_pair_analytics(&ticks, request)?;
    let payload = sanitize(&result);
    metrics::histogram!("spreadlab.analytics.compute_ms")
        .record(compute_start.elapsed().as_secs_f64() * 1000.0);
    metrics::gauge!("spreadlab.analytics.pair_rows").set(result.pair_data.len() as f64);

    let alerts = evaluate_alerts(&payload, &config.alerts);
    for alert in &alerts {
        metrics::counter!("spreadlab.analytics.alerts_total").increment(1);
        tracing::warn!(
            rule = %alert.rule.describe(),
            value = alert.value,
            timestamp = %alert.timestamp,
            "z-score alert triggered"
        );
    }

    tracing::info!(
        ticks = ticks.len(),
        rows = result.pair_data.len(),
        hedge_ratio = result.hedge.hedge_ratio,
        "pair analytics computed"
    );
    Ok(PairAnalyticsOutcome { payload, alerts })
}
