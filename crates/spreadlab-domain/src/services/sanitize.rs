use crate::entities::analytics::{
    AnalyticsResult, PairRow, ResampledSeries, SeriesSummary, StationarityOutcome,
};
use crate::errors::AnalyticsError;
use crate::value_objects::tick::format_timestamp_ms;
use serde::{Deserialize, Serialize};

pub fn finite(value: f64) -> Option<f64> {
    value.is_finite().then_some(value)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsPayload {
    pub status: String,
    pub controls: ControlsPayload,
    pub analytics: AnalyticsSection,
    pub charts: ChartsPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlsPayload {
    pub symbol_a: String,
    pub symbol_b: String,
    pub timeframe: String,
    pub rolling_window: usize,
    pub regression_type: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsSection {
    pub hedge_ratio: Option<f64>,
    pub intercept: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hedge_ratio_error: Option<String>,
    pub adf_test_spread: AdfPayload,
    pub stats_a: StatsPayload,
    pub stats_b: StatsPayload,
}

/// Stationarity block. A skipped test keeps `test_statistic` and `p_value`
/// as null and carries `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdfPayload {
    pub test_statistic: Option<f64>,
    pub p_value: Option<f64>,
    #[serde(rename = "1%_critical_value", default, skip_serializing_if = "Option::is_none")]
    pub critical_value_1pct: Option<f64>,
    #[serde(rename = "5%_critical_value", default, skip_serializing_if = "Option::is_none")]
    pub critical_value_5pct: Option<f64>,
    #[serde(rename = "10%_critical_value", default, skip_serializing_if = "Option::is_none")]
    pub critical_value_10pct: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub used_lag: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nobs: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_stationary_99_conf: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsPayload {
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    #[serde(rename = "25%")]
    pub q25: Option<f64>,
    #[serde(rename = "50%")]
    pub q50: Option<f64>,
    #[serde(rename = "75%")]
    pub q75: Option<f64>,
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartsPayload {
    pub resampled_a: Vec<ResampledPointPayload>,
    pub resampled_b: Vec<ResampledPointPayload>,
    pub pair_data: Vec<PairRowPayload>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledPointPayload {
    pub timestamp: String,
    pub close: Option<f64>,
    pub volume: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairRowPayload {
    pub timestamp: String,
    pub price_a: Option<f64>,
    pub price_b: Option<f64>,
    pub volume_a: Option<f64>,
    pub volume_b: Option<f64>,
    pub spread: Option<f64>,
    pub z_score: Option<f64>,
    pub rolling_corr: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub error: String,
    pub kind: String,
}

impl From<&AnalyticsError> for ErrorPayload {
    fn from(err: &AnalyticsError) -> Self {
        Self {
            error: err.to_string(),
            kind: err.kind().to_string(),
        }
    }
}

impl AnalyticsPayload {
    /// Most recent defined z-score in the pair rows, with its timestamp.
    pub fn latest_z_score(&self) -> Option<(f64, &str)> {
        self.charts
            .pair_data
            .iter()
            .rev()
            .find_map(|row| row.z_score.map(|z| (z, row.timestamp.as_str())))
    }
}

pub fn sanitize(result: &AnalyticsResult) -> AnalyticsPayload {
    AnalyticsPayload {
        status: "success".to_string(),
        controls: ControlsPayload {
            symbol_a: result.controls.symbol_a.clone(),
            symbol_b: result.controls.symbol_b.clone(),
            timeframe: result.controls.timeframe.clone(),
            rolling_window: result.controls.rolling_window,
            regression_type: result.controls.regression.as_str().to_string(),
        },
        analytics: AnalyticsSection {
            hedge_ratio: finite(result.hedge.hedge_ratio),
            intercept: result.hedge.intercept.and_then(finite),
            hedge_ratio_error: result.hedge.fault.as_ref().map(|f| f.to_string()),
            adf_test_spread: adf_payload(&result.stationarity),
            stats_a: stats_payload(&result.stats_a),
            stats_b: stats_payload(&result.stats_b),
        },
        charts: ChartsPayload {
            resampled_a: resampled_payload(&result.resampled_a),
            resampled_b: resampled_payload(&result.resampled_b),
            pair_data: result.pair_data.iter().map(pair_row_payload).collect(),
        },
    }
}

fn adf_payload(outcome: &StationarityOutcome) -> AdfPayload {
    match outcome {
        Ok(report) => {
            let statistic = finite(report.statistic);
            let crit = finite(report.critical_values.one_pct);
            AdfPayload {
                test_statistic: statistic,
                p_value: finite(report.p_value),
                critical_value_1pct: crit,
                critical_value_5pct: finite(report.critical_values.five_pct),
                critical_value_10pct: finite(report.critical_values.ten_pct),
                used_lag: Some(report.used_lag),
                nobs: Some(report.nobs),
                is_stationary_99_conf: Some(report.is_stationary_99),
                error: None,
            }
        }
        Err(fault) => AdfPayload {
            test_statistic: None,
            p_value: None,
            critical_value_1pct: None,
            critical_value_5pct: None,
            critical_value_10pct: None,
            used_lag: None,
            nobs: None,
            is_stationary_99_conf: None,
            error: Some(fault.to_string()),
        },
    }
}

fn stats_payload(summary: &SeriesSummary) -> StatsPayload {
    StatsPayload {
        count: summary.count,
        mean: finite(summary.mean),
        std: finite(summary.std),
        min: finite(summary.min),
        q25: finite(summary.q25),
        q50: finite(summary.q50),
        q75: finite(summary.q75),
        max: finite(summary.max),
    }
}

fn resampled_payload(series: &ResampledSeries) -> Vec<ResampledPointPayload> {
    series
        .buckets
        .iter()
        .map(|b| ResampledPointPayload {
            timestamp: format_timestamp_ms(b.timestamp_ms),
            close: finite(b.close),
            volume: finite(b.volume),
        })
        .collect()
}

pub fn pair_row_payload(row: &PairRow) -> PairRowPayload {
    PairRowPayload {
        timestamp: format_timestamp_ms(row.timestamp_ms),
        price_a: finite(row.price_a),
        price_b: finite(row.price_b),
        volume_a: finite(row.volume_a),
        volume_b: finite(row.volume_b),
        spread: finite(row.spread),
        z_score: finite(row.z_score),
        rolling_corr: row.rolling_corr.and_then(finite),
    }
}
