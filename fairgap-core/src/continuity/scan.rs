//! The four scan strategies.
//!
//! Every strategy returns one [`Gap`] per abnormal consecutive pair, ordered
//! by `start_index`, and all four return identical lists for the same input.
//! They differ only in how they find the abnormal pairs.

use std::ops::Range;

use chrono::{NaiveDate, TimeDelta};
use fairgap_types::{Candle, FairGapError, Gap, GapKind, Granularity};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::calendar::TradingCalendar;

/// Borrowed inputs shared by every strategy.
#[derive(Clone, Copy)]
pub(crate) struct ScanInput<'a> {
    pub calendar: &'a TradingCalendar,
    pub candles: &'a [Candle],
    pub granularity: Granularity,
}

impl ScanInput<'_> {
    fn pair_count(&self) -> usize {
        self.candles.len().saturating_sub(1)
    }

    fn delta(&self, i: usize) -> TimeDelta {
        self.candles[i + 1].ts - self.candles[i].ts
    }

    fn is_anomaly(&self, delta: TimeDelta) -> bool {
        delta == TimeDelta::zero() || delta > self.granularity.step()
    }

    fn gap(&self, i: usize, kind: GapKind, missing_bars: u64) -> Gap {
        Gap {
            start: self.candles[i].ts,
            end: self.candles[i + 1].ts,
            start_index: i,
            end_index: i + 1,
            missing_bars,
            kind,
        }
    }

    /// Classify pair `(i, i + 1)` through the calendar.
    fn classify_pair(&self, i: usize) -> Result<Option<Gap>, FairGapError> {
        let (a, b) = (&self.candles[i], &self.candles[i + 1]);
        Ok(self
            .calendar
            .classify_gap(a.ts, b.ts, self.granularity)?
            .map(|v| self.gap(i, v.kind, v.missing_bars)))
    }
}

/// Bar-by-bar pass; every pair goes through the calendar.
pub(crate) fn naive(input: ScanInput<'_>) -> Result<Vec<Gap>, FairGapError> {
    let mut out = Vec::new();
    for i in 0..input.pair_count() {
        if let Some(g) = input.classify_pair(i)? {
            out.push(g);
        }
    }
    Ok(out)
}

/// Delta-first pass over the whole series.
pub(crate) fn batch(input: ScanInput<'_>) -> Result<Vec<Gap>, FairGapError> {
    batch_range(input, 0..input.pair_count())
}

/// Delta-first pass over the pairs `(i, i + 1)` for `i` in `pairs`.
fn batch_range(input: ScanInput<'_>, pairs: Range<usize>) -> Result<Vec<Gap>, FairGapError> {
    if pairs.is_empty() {
        return Ok(Vec::new());
    }
    let deltas: Vec<TimeDelta> = input.candles[pairs.start..=pairs.end]
        .windows(2)
        .map(|w| w[1].ts - w[0].ts)
        .collect();
    let anomalies: Vec<usize> = deltas
        .iter()
        .enumerate()
        .filter(|(_, d)| input.is_anomaly(**d))
        .map(|(k, _)| pairs.start + k)
        .collect();

    let mut out = Vec::with_capacity(anomalies.len());
    for i in anomalies {
        if let Some(g) = input.classify_pair(i)? {
            out.push(g);
        }
    }
    Ok(out)
}

/// Slots strictly between two bars `delta` apart, `ceil(delta / step) - 1`.
fn slots_between(delta: TimeDelta, step: TimeDelta) -> u64 {
    let nanos = |d: TimeDelta| {
        i128::from(d.num_seconds()) * 1_000_000_000 + i128::from(d.subsec_nanos())
    };
    let (d, s) = (nanos(delta), nanos(step));
    let ceil = (d + s - 1) / s;
    u64::try_from(ceil - 1).unwrap_or(0)
}

/// Split the series into maximal runs of bars that share one trading
/// session; off-session bars form runs of their own. Daily bars never share
/// a session.
fn session_runs(input: ScanInput<'_>) -> Result<Vec<Range<usize>>, FairGapError> {
    let n = input.candles.len();
    let keys: Vec<Option<NaiveDate>> = if input.granularity.is_daily() {
        vec![None; n]
    } else {
        input
            .candles
            .iter()
            .map(|c| input.calendar.session_date(c.ts))
            .collect::<Result<_, _>>()?
    };

    let mut runs = Vec::new();
    let mut lo = 0;
    for i in 1..=n {
        let same = i < n && keys[i].is_some() && keys[i] == keys[i - 1];
        if !same {
            runs.push(lo..i);
            lo = i;
        }
    }
    Ok(runs)
}

/// Segment first: pairs inside one session cannot straddle a closure, so
/// they are settled from the delta alone; only the pairs joining two runs are
/// put to the calendar.
pub(crate) fn closure_skipping(input: ScanInput<'_>) -> Result<Vec<Gap>, FairGapError> {
    let step = input.granularity.step();
    let runs = session_runs(input)?;
    let mut out = Vec::new();
    for (r, run) in runs.iter().enumerate() {
        for i in run.start..run.end.saturating_sub(1) {
            let delta = input.delta(i);
            if delta == TimeDelta::zero() {
                out.push(input.gap(i, GapKind::DuplicateTimestamp, 0));
            } else if delta > step {
                out.push(input.gap(i, GapKind::DataMissing, slots_between(delta, step)));
            }
        }
        if r + 1 < runs.len() {
            let seam = run.end - 1;
            if input.is_anomaly(input.delta(seam))
                && let Some(g) = input.classify_pair(seam)?
            {
                out.push(g);
            }
        }
    }
    Ok(out)
}

/// Chunked pass on a worker pool. Each chunk settles its internal pairs; the
/// pair joining two chunks is classified once after the join.
pub(crate) fn partitioned(
    input: ScanInput<'_>,
    chunk_size: usize,
    pool: Option<&ThreadPool>,
) -> Result<Vec<Gap>, FairGapError> {
    let n = input.candles.len();
    let chunk_size = chunk_size.max(1);
    let chunks: Vec<Range<usize>> = (0..n)
        .step_by(chunk_size)
        .map(|lo| lo..(lo + chunk_size).min(n))
        .collect();

    let run = || -> Vec<Result<Vec<Gap>, FairGapError>> {
        chunks
            .par_iter()
            .map(|c| batch_range(input, c.start..c.end - 1))
            .collect()
    };
    let per_chunk = match pool {
        Some(p) => p.install(run),
        None => run(),
    };

    let mut out = Vec::new();
    for found in per_chunk {
        out.extend(found?);
    }
    for c in chunks.iter().filter(|c| c.end < n) {
        let seam = c.end - 1;
        if let Some(g) = input.classify_pair(seam)? {
            out.push(g);
        }
    }
    out.sort_by_key(|g| g.start_index);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slots_between_rounds_up() {
        let m = TimeDelta::minutes;
        assert_eq!(slots_between(m(60), m(15)), 3);
        assert_eq!(slots_between(m(61), m(15)), 4);
        assert_eq!(slots_between(m(16), m(15)), 1);
        assert_eq!(slots_between(m(15), m(15)), 0);
    }
}
