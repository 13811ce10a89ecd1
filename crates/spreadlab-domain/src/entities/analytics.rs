use crate::errors::EstimationFault;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampledBucket {
    pub timestamp_ms: i64,
    pub close: f64,
    pub volume: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResampledSeries {
    pub symbol: String,
    pub step_ms: i64,
    pub buckets: Vec<ResampledBucket>,
}

impl ResampledSeries {
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.buckets.iter().map(|b| b.close).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub timestamp_ms: i64,
    pub price_a: f64,
    pub price_b: f64,
    pub volume_a: f64,
    pub volume_b: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PairRow {
    pub timestamp_ms: i64,
    pub price_a: f64,
    pub price_b: f64,
    pub volume_a: f64,
    pub volume_b: f64,
    pub spread: f64,
    pub z_score: f64,
    /// `None` while the trailing window is still filling.
    pub rolling_corr: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegressionKind {
    #[default]
    Ols,
}

impl RegressionKind {
    pub fn parse(value: &str) -> Result<Self, String> {
        match value.trim().to_lowercase().as_str() {
            "ols" => Ok(RegressionKind::Ols),
            other => Err(format!("unsupported regression type: {other} (use: ols)")),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RegressionKind::Ols => "OLS",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HedgeEstimate {
    pub hedge_ratio: f64,
    pub intercept: Option<f64>,
    pub fault: Option<EstimationFault>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CriticalValues {
    pub one_pct: f64,
    pub five_pct: f64,
    pub ten_pct: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdfReport {
    pub statistic: f64,
    pub p_value: f64,
    pub critical_values: CriticalValues,
    pub used_lag: usize,
    pub nobs: usize,
    pub is_stationary_99: bool,
}

pub type StationarityOutcome = Result<AdfReport, EstimationFault>;

/// count / mean / std (ddof 1) / min / quartiles / max of one series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeriesSummary {
    pub count: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub q25: f64,
    pub q50: f64,
    pub q75: f64,
    pub max: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalyticsControls {
    pub symbol_a: String,
    pub symbol_b: String,
    pub timeframe: String,
    pub rolling_window: usize,
    pub regression: RegressionKind,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsResult {
    pub controls: AnalyticsControls,
    pub hedge: HedgeEstimate,
    pub stationarity: StationarityOutcome,
    pub stats_a: SeriesSummary,
    pub stats_b: SeriesSummary,
    pub resampled_a: ResampledSeries,
    pub resampled_b: ResampledSeries,
    pub pair_data: Vec<PairRow>,
}

#[cfg(test)]
mod tests {
    use super::RegressionKind;

    #[test]
    fn regression_kind_accepts_only_ols() {
        assert_eq!(RegressionKind::parse("OLS").unwrap(), RegressionKind::Ols);
        assert_eq!(RegressionKind::parse(" ols ").unwrap(), RegressionKind::Ols);
        assert!(RegressionKind::parse("kalman").is_err());
    }
}
