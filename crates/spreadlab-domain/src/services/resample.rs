use crate::entities::analytics::{ResampledBucket, ResampledSeries};
use crate::value_objects::tick::{format_timestamp_ms, Tick};

pub const DEFAULT_MAX_BUCKETS: usize = 1_000_000;

/// Ticks of one symbol in ascending time order. The sort is stable, so ticks
/// sharing a timestamp keep their relative order.
pub fn select_symbol(ticks: &[Tick], symbol: &str) -> Vec<Tick> {
    let mut selected: Vec<Tick> = ticks.iter().filter(|t| t.symbol == symbol).cloned().collect();
    selected.sort_by_key(|t| t.timestamp_ms);
    selected
}

pub fn bucket_start(timestamp_ms: i64, step_ms: i64) -> i64 {
    timestamp_ms.saturating_sub(timestamp_ms.rem_euclid(step_ms))
}

/// Buckets one symbol's ticks onto an epoch-aligned grid of `step_ms`.
///
/// Every bucket between the first and last tick is emitted. Close is the last
/// price seen in the bucket, forward-filled across empty buckets and then
/// back-filled at the head; volume is the summed size, zero when empty.
/// `ticks` must already be in ascending time order. A span wider than
/// `max_buckets` steps is rejected before anything is allocated.
pub fn resample_ticks(
    symbol: &str,
    ticks: &[Tick],
    step_ms: i64,
    max_buckets: usize,
) -> Result<ResampledSeries, String> {
    if step_ms <= 0 {
        return Err("step_ms must be > 0".to_string());
    }
    let empty = ResampledSeries {
        symbol: symbol.to_string(),
        step_ms,
        buckets: Vec::new(),
    };
    let (Some(first), Some(last)) = (ticks.first(), ticks.last()) else {
        return Ok(empty);
    };

    let first_bucket = bucket_start(first.timestamp_ms, step_ms);
    let last_bucket = bucket_start(last.timestamp_ms, step_ms);
    if last_bucket < first_bucket {
        return Err("ticks must be sorted by timestamp".to_string());
    }
    let bucket_count = last_bucket
        .checked_sub(first_bucket)
        .map(|span| span / step_ms)
        .and_then(|steps| usize::try_from(steps).ok())
        .and_then(|steps| steps.checked_add(1))
        .filter(|count| *count <= max_buckets)
        .ok_or_else(|| {
            format!(
                "{symbol}: ticks from {} to {} span more than {max_buckets} buckets of {step_ms}ms",
                format_timestamp_ms(first.timestamp_ms),
                format_timestamp_ms(last.timestamp_ms),
            )
        })?;

    let mut closes: Vec<Option<f64>> = vec![None; bucket_count];
    let mut volumes = vec![0.0f64; bucket_count];
    for tick in ticks {
        let idx = bucket_start(tick.timestamp_ms, step_ms)
            .checked_sub(first_bucket)
            .and_then(|offset| usize::try_from(offset / step_ms).ok())
            .filter(|idx| *idx < bucket_count)
            .ok_or_else(|| "ticks must be sorted by timestamp".to_string())?;
        closes[idx] = Some(tick.price);
        volumes[idx] += tick.size;
    }

    forward_fill(&mut closes);
    back_fill(&mut closes);

    let buckets = closes
        .into_iter()
        .zip(volumes)
        .enumerate()
        .map(|(idx, (close, volume))| ResampledBucket {
            timestamp_ms: first_bucket + idx as i64 * step_ms,
            close: close.unwrap_or(f64::NAN),
            volume,
        })
        .collect();

    Ok(ResampledSeries {
        symbol: symbol.to_string(),
        step_ms,
        buckets,
    })
}

fn forward_fill(values: &mut [Option<f64>]) {
    let mut last: Option<f64> = None;
    for value in values.iter_mut() {
        match value {
            Some(v) => last = Some(*v),
            None => *value = last,
        }
    }
}

fn back_fill(values: &mut [Option<f64>]) {
    let mut next: Option<f64> = None;
    for value in values.iter_mut().rev() {
        match value {
            Some(v) => next = Some(*v),
            None => *value = next,
        }
    }
}
