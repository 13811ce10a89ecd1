use crate::entities::analytics::{
    AlignedRow, AnalyticsControls, AnalyticsResult, HedgeEstimate, PairRow, RegressionKind,
};
use crate::errors::{AnalyticsError, InsufficientDataError};
use crate::services::adf::adfuller;
use crate::services::align::align_pair;
use crate::services::regression::simple_ols;
use crate::services::resample::{resample_ticks, select_symbol};
use crate::services::stats::{describe, rolling_correlation, z_scores};
use crate::value_objects::tick::Tick;
use crate::value_objects::timeframe::Timeframe;

#[derive(Debug, Clone, PartialEq)]
pub struct PairRequest {
    pub symbol_a: String,
    pub symbol_b: String,
    pub timeframe: Timeframe,
    pub rolling_window: usize,
    pub regression: RegressionKind,
    /// Upper bound on resampled buckets per symbol.
    pub max_buckets: usize,
}

/// Resamples, aligns and estimates one symbol pair over a tick snapshot.
///
/// Only missing input is fatal. Regression and stationarity faults are
/// folded into the result with explicit defaults.
pub fn compute_pair_analytics(
    ticks: &[Tick],
    request: &PairRequest,
) -> Result<AnalyticsResult, AnalyticsError> {
    if request.rolling_window == 0 {
        return Err(AnalyticsError::InvalidRequest(
            "rolling_window must be >= 1".to_string(),
        ));
    }
    if ticks.is_empty() {
        return Err(InsufficientDataError::NoTicks.into());
    }

    let ticks_a = select_symbol(ticks, &request.symbol_a);
    let ticks_b = select_symbol(ticks, &request.symbol_b);
    let mut missing = Vec::new();
    if ticks_a.is_empty() {
        missing.push(request.symbol_a.clone());
    }
    if ticks_b.is_empty() {
        missing.push(request.symbol_b.clone());
    }
    if !missing.is_empty() {
        return Err(InsufficientDataError::MissingSymbols { missing }.into());
    }

    let step_ms = request.timeframe.step_ms;
    let resampled_a =
        resample_ticks(&request.symbol_a, &ticks_a, step_ms, request.max_buckets)
            .map_err(AnalyticsError::InvalidRequest)?;
    let resampled_b =
        resample_ticks(&request.symbol_b, &ticks_b, step_ms, request.max_buckets)
            .map_err(AnalyticsError::InvalidRequest)?;

    let aligned = align_pair(&resampled_a, &resampled_b, request.rolling_window)?;
    let prices_a: Vec<f64> = aligned.iter().map(|r| r.price_a).collect();
    let prices_b: Vec<f64> = aligned.iter().map(|r| r.price_b).collect();

    let hedge = estimate_hedge(&prices_a, &prices_b, request);
    let spread: Vec<f64> = prices_a
        .iter()
        .zip(&prices_b)
        .map(|(a, b)| a - hedge.hedge_ratio * b)
        .collect();
    let z = z_scores(&spread);
    let corr = rolling_correlation(&prices_a, &prices_b, request.rolling_window);

    let stationarity = adfuller(&spread);
    if let Err(fault) = &stationarity {
        tracing::warn!(
            symbol_a = %request.symbol_a,
            symbol_b = %request.symbol_b,
            error = %fault,
            "stationarity test skipped"
        );
    }

    let pair_data = build_rows(&aligned, &spread, &z, &corr);
    let stats_a = describe(&resampled_a.closes());
    let stats_b = describe(&resampled_b.closes());

    Ok(AnalyticsResult {
        controls: AnalyticsControls {
            symbol_a: request.symbol_a.clone(),
            symbol_b: request.symbol_b.clone(),
            timeframe: request.timeframe.label.clone(),
            rolling_window: request.rolling_window,
            regression: request.regression,
        },
        hedge,
        stationarity,
        stats_a,
        stats_b,
        resampled_a,
        resampled_b,
        pair_data,
    })
}

fn estimate_hedge(prices_a: &[f64], prices_b: &[f64], request: &PairRequest) -> HedgeEstimate {
    match request.regression {
        RegressionKind::Ols => match simple_ols(prices_b, prices_a) {
            Ok(fit) => HedgeEstimate {
                hedge_ratio: fit.slope,
                intercept: Some(fit.intercept),
                fault: None,
            },
            Err(fault) => {
                tracing::warn!(
                    symbol_a = %request.symbol_a,
                    symbol_b = %request.symbol_b,
                    error = %fault,
                    "hedge ratio regression failed; using 0.0"
                );
                HedgeEstimate {
                    hedge_ratio: 0.0,
                    intercept: None,
                    fault: Some(fault),
                }
            }
        },
    }
}

fn build_rows(
    aligned: &[AlignedRow],
    spread: &[f64],
    z: &[f64],
    corr: &[Option<f64>],
) -> Vec<PairRow> {
    aligned
        .iter()
        .enumerate()
        .map(|(i, row)| PairRow {
            timestamp_ms: row.timestamp_ms,
            price_a: row.price_a,
            price_b: row.price_b,
            volume_a: row.volume_a,
            volume_b: row.volume_b,
            spread: spread[i],
            z_score: z[i],
            rolling_corr: corr.get(i).copied().flatten(),
        })
        .collect()
}
