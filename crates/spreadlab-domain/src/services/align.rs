use crate::entities::analytics::{AlignedRow, ResampledSeries};
use crate::errors::InsufficientDataError;
use std::cmp::Ordering;

/// Inner-joins two resampled series on bucket timestamp. Rows where either
/// close is still undefined are dropped.
pub fn align_pair(
    series_a: &ResampledSeries,
    series_b: &ResampledSeries,
    min_rows: usize,
) -> Result<Vec<AlignedRow>, InsufficientDataError> {
    let mut missing = Vec::new();
    if series_a.is_empty() {
        missing.push(series_a.symbol.clone());
    }
    if series_b.is_empty() {
        missing.push(series_b.symbol.clone());
    }
    if !missing.is_empty() {
        return Err(InsufficientDataError::MissingSymbols { missing });
    }

    let mut rows = Vec::with_capacity(series_a.len().min(series_b.len()));
    let (mut i, mut j) = (0usize, 0usize);
    while i < series_a.buckets.len() && j < series_b.buckets.len() {
        let a = &series_a.buckets[i];
        let b = &series_b.buckets[j];
        match a.timestamp_ms.cmp(&b.timestamp_ms) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                if a.close.is_finite() && b.close.is_finite() {
                    rows.push(AlignedRow {
                        timestamp_ms: a.timestamp_ms,
                        price_a: a.close,
                        price_b: b.close,
                        volume_a: a.volume,
                        volume_b: b.volume,
                    });
                }
                i += 1;
                j += 1;
            }
        }
    }

    if rows.is_empty() || rows.len() < min_rows {
        return Err(InsufficientDataError::NotEnoughAligned {
            required: min_rows,
            available: rows.len(),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::analytics::ResampledBucket;

    fn series(symbol: &str, points: &[(i64, f64)]) -> ResampledSeries {
        ResampledSeries {
            symbol: symbol.to_string(),
            step_ms: 1_000,
            buckets: points
                .iter()
                .map(|&(ts, close)| ResampledBucket {
                    timestamp_ms: ts,
                    close,
                    volume: 1.0,
                })
                .collect(),
        }
    }

    #[test]
    fn keeps_only_shared_buckets() {
        let a = series("a", &[(0, 1.0), (1_000, 2.0), (2_000, 3.0), (3_000, 4.0)]);
        let b = series("b", &[(2_000, 30.0), (3_000, 40.0), (4_000, 50.0)]);
        let rows = align_pair(&a, &b, 1).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].timestamp_ms, 2_000);
        assert_eq!(rows[0].price_a, 3.0);
        assert_eq!(rows[0].price_b, 30.0);
        assert!(rows.len() <= a.len().min(b.len()));
    }

    #[test]
    fn names_missing_symbols() {
        let a = series("a", &[(0, 1.0)]);
        let b = series("b", &[]);
        let err = align_pair(&a, &b, 1).unwrap_err();
        assert_eq!(
            err,
            InsufficientDataError::MissingSymbols {
                missing: vec!["b".to_string()]
            }
        );
    }

    #[test]
    fn rejects_fewer_rows_than_window() {
        let a = series("a", &[(0, 1.0), (1_000, 2.0)]);
        let b = series("b", &[(0, 1.0), (1_000, 2.0)]);
        let err = align_pair(&a, &b, 3).unwrap_err();
        assert_eq!(
            err,
            InsufficientDataError::NotEnoughAligned {
                required: 3,
                available: 2
            }
        );
    }

    #[test]
    fn disjoint_series_are_insufficient_even_for_window_one() {
        let a = series("a", &[(0, 1.0)]);
        let b = series("b", &[(5_000, 1.0)]);
        assert!(matches!(
            align_pair(&a, &b, 1),
            Err(InsufficientDataError::NotEnoughAligned { available: 0, .. })
        ));
    }

    #[test]
    fn drops_rows_with_undefined_close() {
        let a = series("a", &[(0, f64::NAN), (1_000, 2.0)]);
        let b = series("b", &[(0, 1.0), (1_000, 2.0)]);
        let rows = align_pair(&a, &b, 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].timestamp_ms, 1_000);
    }
}
