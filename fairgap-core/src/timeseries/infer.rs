use chrono::TimeDelta;
use fairgap_types::{Candle, FairGapError, Granularity};

/// Estimate a representative step (in seconds) from positive adjacent timestamp
/// deltas in the input series.
///
/// Prefer the mode (most frequent positive delta); if there is no unique mode,
/// return the lower median. Closures and missing bars only ever lengthen a
/// delta, so for a mostly complete series the mode is the bar interval.
///
/// Examples
///
/// ```
/// use chrono::DateTime;
/// use fairgap_core::estimate_step_seconds;
/// use fairgap_types::Candle;
/// use rust_decimal::Decimal;
///
/// let mk = |ts: i64| {
///     let p = Decimal::ONE;
///     Candle::new(DateTime::from_timestamp(ts, 0).unwrap(), p, p, p, p)
/// };
/// // Adjacent deltas: 60,60,60,120,180  => unique mode is 60
/// let candles = vec![mk(0), mk(60), mk(120), mk(180), mk(300), mk(480)];
/// assert_eq!(estimate_step_seconds(&candles), Some(60));
///
/// // Adjacent deltas: 60,60,120,120  => lower median is 60
/// let candles = vec![mk(0), mk(60), mk(120), mk(240), mk(360)];
/// assert_eq!(estimate_step_seconds(&candles), Some(60));
/// ```
///
/// The input order does not matter; duplicates are ignored. Returns `None` if
/// fewer than two distinct timestamps are present.
#[must_use]
pub fn estimate_step_seconds(candles: &[Candle]) -> Option<i64> {
    if candles.len() < 2 {
        return None;
    }
    let mut ts: Vec<_> = candles.iter().map(|c| c.ts).collect();
    ts.sort_unstable();

    let mut deltas: Vec<i64> = Vec::with_capacity(ts.len().saturating_sub(1));
    let mut last = ts[0];
    for &cur in ts.iter().skip(1) {
        let dt: TimeDelta = cur - last;
        if dt > TimeDelta::zero() {
            deltas.push(dt.num_seconds());
            last = cur;
        }
    }
    if deltas.is_empty() {
        return None;
    }
    deltas.sort_unstable();

    let mut best_delta: i64 = deltas[0];
    let mut best_count: usize = 0;
    let mut num_best_candidates: usize = 0;

    let mut cur_delta: i64 = deltas[0];
    let mut cur_count: usize = 1;
    for &d in deltas.iter().skip(1) {
        if d == cur_delta {
            cur_count += 1;
            continue;
        }
        if cur_count > best_count {
            best_count = cur_count;
            best_delta = cur_delta;
            num_best_candidates = 1;
        } else if cur_count == best_count {
            num_best_candidates = num_best_candidates.saturating_add(1);
        }
        cur_delta = d;
        cur_count = 1;
    }
    if cur_count > best_count {
        best_delta = cur_delta;
        num_best_candidates = 1;
    } else if cur_count == best_count {
        num_best_candidates = num_best_candidates.saturating_add(1);
    }

    if num_best_candidates == 1 {
        return Some(best_delta);
    }

    let mid = deltas.len() / 2;
    if deltas.len() % 2 == 1 {
        Some(deltas[mid])
    } else {
        Some(deltas[mid - 1])
    }
}

/// Resolve the granularity of an unlabelled series from its estimated step.
///
/// # Errors
/// - `Data` if fewer than two distinct timestamps are present.
/// - `UnsupportedGranularity` if the step is not a known interval.
pub fn infer_granularity(candles: &[Candle]) -> Result<Granularity, FairGapError> {
    let step = estimate_step_seconds(candles).ok_or_else(|| {
        FairGapError::Data("need at least two distinct timestamps to infer an interval".into())
    })?;
    if step % 60 != 0 {
        return Err(FairGapError::unsupported_granularity(
            u32::try_from(step / 60).unwrap_or(u32::MAX),
        ));
    }
    let minutes = u32::try_from(step / 60).unwrap_or(u32::MAX);
    Granularity::from_minutes(minutes)
}
