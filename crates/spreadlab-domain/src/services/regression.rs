use crate::errors::EstimationFault;

/// Relative tolerance below which a centered sum of squares counts as zero.
const ZERO_VARIANCE_RTOL: f64 = 1e-20;
/// Relative tolerance for Cholesky pivots.
const PIVOT_RTOL: f64 = 1e-12;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimpleFit {
    pub slope: f64,
    pub intercept: f64,
}

/// OLS of `ys` on `xs` with an intercept.
pub fn simple_ols(xs: &[f64], ys: &[f64]) -> Result<SimpleFit, EstimationFault> {
    if xs.len() != ys.len() {
        return Err(EstimationFault::DegenerateInput(format!(
            "length mismatch: {} vs {}",
            xs.len(),
            ys.len()
        )));
    }
    if xs.len() < 2 {
        return Err(EstimationFault::DegenerateInput(format!(
            "need at least 2 observations, got {}",
            xs.len()
        )));
    }
    let n = xs.len() as f64;
    let mx = xs.iter().sum::<f64>() / n;
    let my = ys.iter().sum::<f64>() / n;
    let mut sxx = 0.0;
    let mut sxy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        sxx += (x - mx) * (x - mx);
        sxy += (x - mx) * (y - my);
    }
    let scale = xs.iter().map(|x| x * x).sum::<f64>().max(f64::MIN_POSITIVE);
    if sxx.is_nan() || sxx <= ZERO_VARIANCE_RTOL * scale {
        return Err(EstimationFault::DegenerateInput(
            "regressor has zero variance".to_string(),
        ));
    }
    let slope = sxy / sxx;
    let intercept = my - slope * mx;
    if !slope.is_finite() || !intercept.is_finite() {
        return Err(EstimationFault::NonFinite(format!(
            "slope={slope} intercept={intercept}"
        )));
    }
    Ok(SimpleFit { slope, intercept })
}

/// Symmetric positive-definite matrix stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    pub dim: usize,
    pub data: Vec<f64>,
}

impl SquareMatrix {
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            data: vec![0.0; dim * dim],
        }
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.dim + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.dim + col] = value;
    }

    /// Leading `k x k` block.
    pub fn leading(&self, k: usize) -> Self {
        let mut out = Self::zeros(k);
        for r in 0..k {
            for c in 0..k {
                out.set(r, c, self.get(r, c));
            }
        }
        out
    }
}

/// Lower-triangular Cholesky factor of `a`.
pub fn cholesky(a: &SquareMatrix) -> Result<SquareMatrix, EstimationFault> {
    let n = a.dim;
    let mut l = SquareMatrix::zeros(n);
    for j in 0..n {
        let mut diag = a.get(j, j);
        for k in 0..j {
            diag -= l.get(j, k) * l.get(j, k);
        }
        let pivot_floor = PIVOT_RTOL * a.get(j, j).abs().max(f64::MIN_POSITIVE);
        if diag.is_nan() || diag <= pivot_floor {
            return Err(EstimationFault::Singular(format!(
                "non-positive pivot at column {j}"
            )));
        }
        let ljj = diag.sqrt();
        l.set(j, j, ljj);
        for i in (j + 1)..n {
            let mut v = a.get(i, j);
            for k in 0..j {
                v -= l.get(i, k) * l.get(j, k);
            }
            l.set(i, j, v / ljj);
        }
    }
    Ok(l)
}

/// Solves `L L^T x = b`.
pub fn cholesky_solve(l: &SquareMatrix, b: &[f64]) -> Vec<f64> {
    let n = l.dim;
    let mut y = vec![0.0; n];
    for i in 0..n {
        let mut v = b[i];
        for k in 0..i {
            v -= l.get(i, k) * y[k];
        }
        y[i] = v / l.get(i, i);
    }
    let mut x = vec![0.0; n];
    for i in (0..n).rev() {
        let mut v = y[i];
        for k in (i + 1)..n {
            v -= l.get(k, i) * x[k];
        }
        x[i] = v / l.get(i, i);
    }
    x
}

/// Diagonal of `(L L^T)^-1`, used for coefficient standard errors.
pub fn inverse_diagonal(l: &SquareMatrix) -> Vec<f64> {
    let n = l.dim;
    (0..n)
        .map(|j| {
            let mut e = vec![0.0; n];
            e[j] = 1.0;
            cholesky_solve(l, &e)[j]
        })
        .collect()
}
