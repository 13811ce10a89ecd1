use crate::entities::analytics::{AdfReport, CriticalValues, StationarityOutcome};
use crate::errors::EstimationFault;
use crate::services::regression::{cholesky, cholesky_solve, inverse_diagonal, SquareMatrix};
use crate::services::stats::{mean, std_dev};
use std::f64::consts::{PI, SQRT_2};

/// Relative tolerance under which a series counts as constant.
const ZERO_VARIANCE_RTOL: f64 = 1e-10;

// MacKinnon (1994) response surface, constant-only regression, one series.
const TAU_MAX: f64 = 2.74;
const TAU_MIN: f64 = -18.83;
const TAU_STAR: f64 = -1.61;
const TAU_SMALL_P: [f64; 3] = [2.1659, 1.4412, 0.038269];
const TAU_LARGE_P: [f64; 4] = [1.7339, 0.93202, -0.12745, -0.010368];

// MacKinnon (2010) finite-sample critical values, constant-only regression.
const CRIT_1PCT: [f64; 4] = [-3.43035, -6.5393, -16.786, -79.433];
const CRIT_5PCT: [f64; 4] = [-2.86154, -2.8903, -4.234, -40.040];
const CRIT_10PCT: [f64; 4] = [-2.56677, -1.5384, -2.809, 0.0];

/// Augmented Dickey-Fuller test with a constant, lag order chosen by AIC.
///
/// Non-finite values are dropped first. An empty or constant series is a
/// `DegenerateInput` fault, which callers report as a skipped test.
pub fn adfuller(series: &[f64]) -> StationarityOutcome {
    let x: Vec<f64> = series.iter().copied().filter(|v| v.is_finite()).collect();
    if x.is_empty() {
        return Err(EstimationFault::DegenerateInput(
            "spread is empty; stationarity test skipped".to_string(),
        ));
    }
    let scale = (x.iter().map(|v| v.abs()).sum::<f64>() / x.len() as f64).max(1.0);
    if std_dev(&x, 0) <= ZERO_VARIANCE_RTOL * scale {
        return Err(EstimationFault::DegenerateInput(
            "spread has zero variance; stationarity test skipped".to_string(),
        ));
    }

    let n = x.len();
    let max_lag = max_lag_for(n)?;
    let diffs: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();

    let used_lag = select_lag_by_aic(&x, &diffs, max_lag)?;
    let fit = fit_level_regression(&x, &diffs, used_lag, used_lag)?;
    if !fit.t_level.is_finite() {
        return Err(EstimationFault::NonFinite(format!(
            "adf statistic={}",
            fit.t_level
        )));
    }

    let critical_values = critical_values(fit.nobs);
    Ok(AdfReport {
        statistic: fit.t_level,
        p_value: mackinnon_p_value(fit.t_level),
        critical_values,
        used_lag,
        nobs: fit.nobs,
        is_stationary_99: fit.t_level < critical_values.one_pct,
    })
}

/// `ceil(12 * (n/100)^(1/4))`, capped at `n/2 - 2`.
pub fn max_lag_for(n: usize) -> Result<usize, EstimationFault> {
    let schwert = (12.0 * (n as f64 / 100.0).powf(0.25)).ceil() as i64;
    let cap = (n / 2) as i64 - 2;
    let lag = schwert.min(cap);
    if lag < 0 {
        return Err(EstimationFault::TooShort { nobs: n });
    }
    Ok(lag as usize)
}

/// Standard normal CDF of MacKinnon's polynomial in the statistic.
pub fn mackinnon_p_value(stat: f64) -> f64 {
    if stat.is_nan() {
        return f64::NAN;
    }
    if stat > TAU_MAX {
        return 1.0;
    }
    if stat < TAU_MIN {
        return 0.0;
    }
    let coefs: &[f64] = if stat <= TAU_STAR {
        &TAU_SMALL_P
    } else {
        &TAU_LARGE_P
    };
    normal_cdf(polyval(coefs, stat))
}

pub fn critical_values(nobs: usize) -> CriticalValues {
    let inv = 1.0 / nobs.max(1) as f64;
    CriticalValues {
        one_pct: polyval(&CRIT_1PCT, inv),
        five_pct: polyval(&CRIT_5PCT, inv),
        ten_pct: polyval(&CRIT_10PCT, inv),
    }
}

fn normal_cdf(x: f64) -> f64 {
    0.5 * statrs::function::erf::erfc(-x / SQRT_2)
}

/// `c[0] + c[1] x + c[2] x^2 + ...`
fn polyval(coefs: &[f64], x: f64) -> f64 {
    coefs.iter().rev().fold(0.0, |acc, c| acc * x + c)
}

/// Regressor row for diff index `i`: level `x[i]` then `lags` lagged diffs.
fn regressors(x: &[f64], diffs: &[f64], i: usize, lags: usize) -> Vec<f64> {
    let mut row = Vec::with_capacity(lags + 1);
    row.push(x[i]);
    for j in 1..=lags {
        row.push(diffs[i - j]);
    }
    row
}

/// Centered cross-products over diff indices `start..diffs.len()`.
struct CenteredMoments {
    nobs: usize,
    xtx: SquareMatrix,
    xty: Vec<f64>,
    yty: f64,
    x_means: Vec<f64>,
    y_mean: f64,
}

fn centered_moments(x: &[f64], diffs: &[f64], start: usize, lags: usize) -> CenteredMoments {
    let dim = lags + 1;
    let rows: Vec<Vec<f64>> = (start..diffs.len())
        .map(|i| regressors(x, diffs, i, lags))
        .collect();
    let ys = &diffs[start..];
    let nobs = ys.len();

    let y_mean = mean(ys);
    let x_means: Vec<f64> = (0..dim)
        .map(|c| rows.iter().map(|r| r[c]).sum::<f64>() / nobs as f64)
        .collect();

    let mut xtx = SquareMatrix::zeros(dim);
    let mut xty = vec![0.0; dim];
    let mut yty = 0.0;
    for (row, y) in rows.iter().zip(ys) {
        let yc = y - y_mean;
        yty += yc * yc;
        for r in 0..dim {
            let xr = row[r] - x_means[r];
            xty[r] += xr * yc;
            for c in 0..=r {
                let v = xtx.get(r, c) + xr * (row[c] - x_means[c]);
                xtx.set(r, c, v);
            }
        }
    }
    for r in 0..dim {
        for c in 0..r {
            let v = xtx.get(r, c);
            xtx.set(c, r, v);
        }
    }

    CenteredMoments {
        nobs,
        xtx,
        xty,
        yty,
        x_means,
        y_mean,
    }
}

/// Fits every lag order `0..=max_lag` on the common sample and returns the
/// order with the smallest AIC; ties keep the smaller order.
fn select_lag_by_aic(x: &[f64], diffs: &[f64], max_lag: usize) -> Result<usize, EstimationFault> {
    let moments = centered_moments(x, diffs, max_lag, max_lag);
    let nobs = moments.nobs as f64;
    let mut best: Option<(f64, usize)> = None;

    for lags in 0..=max_lag {
        let dim = lags + 1;
        let Ok(l) = cholesky(&moments.xtx.leading(dim)) else {
            continue;
        };
        let beta = cholesky_solve(&l, &moments.xty[..dim]);
        let explained: f64 = beta.iter().zip(&moments.xty).map(|(b, v)| b * v).sum();
        let ssr = (moments.yty - explained).max(f64::MIN_POSITIVE);
        // Regressors are the constant, the level and `lags` diffs.
        let k = (dim + 1) as f64;
        let aic = nobs * ((2.0 * PI).ln() + (ssr / nobs).ln() + 1.0) + 2.0 * k;
        if !aic.is_finite() {
            continue;
        }
        match best {
            Some((best_aic, _)) if aic >= best_aic => {}
            _ => best = Some((aic, lags)),
        }
    }

    best.map(|(_, lags)| lags).ok_or_else(|| {
        EstimationFault::Singular("no lag order produced a full-rank regression".to_string())
    })
}

struct LevelFit {
    t_level: f64,
    nobs: usize,
}

fn fit_level_regression(
    x: &[f64],
    diffs: &[f64],
    start: usize,
    lags: usize,
) -> Result<LevelFit, EstimationFault> {
    let moments = centered_moments(x, diffs, start, lags);
    let k = lags + 2;
    if moments.nobs <= k {
        return Err(EstimationFault::TooShort { nobs: moments.nobs });
    }

    let l = cholesky(&moments.xtx)?;
    let beta = cholesky_solve(&l, &moments.xty);

    let mut ssr = 0.0;
    for i in start..diffs.len() {
        let row = regressors(x, diffs, i, lags);
        let fitted: f64 = row
            .iter()
            .zip(&moments.x_means)
            .zip(&beta)
            .map(|((v, m), b)| (v - m) * b)
            .sum();
        let resid = (diffs[i] - moments.y_mean) - fitted;
        ssr += resid * resid;
    }

    let sigma2 = ssr / (moments.nobs - k) as f64;
    let se_level = (sigma2 * inverse_diagonal(&l)[0]).sqrt();
    Ok(LevelFit {
        t_level: beta[0] / se_level,
        nobs: moments.nobs,
    })
}
