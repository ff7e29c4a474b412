use std::collections::HashSet;

use fairgap_types::{
    FairGapError, FillMode, Fvg, FvgConfig, FvgKind, FvgOrigin, FvgReport, FvgState,
};
use rust_decimal::Decimal;

use crate::series::CandleSeries;

/// Deduplicates raw detections and replays later bars to fill or expire them.
///
/// Behavior and trade-offs:
/// - Deduplication runs before any fill check, so one physical gap is never
///   tracked twice under two near-identical detections.
/// - Gaps that are already `Filled` or `Expired` pass through unchanged.
/// - Nothing is mutated in place; every call returns fresh records.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FvgLifecycleTracker {
    config: FvgConfig,
}

impl FvgLifecycleTracker {
    /// Tracker for `config`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the config does not validate.
    pub fn new(config: FvgConfig) -> Result<Self, FairGapError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Same tracker with another age window.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a window shorter than two bars.
    pub fn with_max_age_bars(self, max_age_bars: usize) -> Result<Self, FairGapError> {
        Self::new(FvgConfig {
            max_age_bars,
            ..self.config
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &FvgConfig {
        &self.config
    }

    /// Deduplicate `raw`, then fill or expire each survivor against `series`.
    ///
    /// The report keeps the full history ordered by `(kind, left_index)`;
    /// use [`FvgReport::active`] for the gaps still open.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap_core::fvg::resolve",
            skip(self, series, raw),
            fields(bars = series.len(), raw = raw.len(), max_age_bars = self.config.max_age_bars),
        )
    )]
    #[must_use]
    pub fn resolve(&self, series: &CandleSeries, raw: Vec<Fvg>) -> FvgReport {
        let mut fvgs = self.dedup(series, raw);
        for f in &mut fvgs {
            if f.is_active() {
                self.replay(series, f);
            }
        }
        fvgs.sort_by_key(|f| (f.kind, f.left_index));
        let report = FvgReport::new(fvgs, series.warnings().to_vec());
        #[cfg(feature = "tracing")]
        tracing::debug!(
            total = report.stats.total,
            valid = report.stats.valid,
            filled = report.stats.filled,
            expired = report.stats.expired,
            "fvg lifecycle resolved"
        );
        report
    }

    /// Merge same-kind detections whose ranges overlap at or above the
    /// threshold, repeating until no pair qualifies.
    ///
    /// A single-bar gap beats a three-bar pattern; otherwise the wider range
    /// wins. The survivor takes the earliest `left_index`. Single-bar gaps are
    /// also unique per `(kind, left_index)`.
    #[must_use]
    pub fn dedup(&self, series: &CandleSeries, raw: Vec<Fvg>) -> Vec<Fvg> {
        let mut current = raw;
        loop {
            let before = current.len();
            current = self.merge_pass(series, current);
            if current.len() == before {
                return current;
            }
        }
    }

    fn merge_pass(&self, series: &CandleSeries, mut fvgs: Vec<Fvg>) -> Vec<Fvg> {
        fvgs.sort_by_key(|f| (f.kind, f.left_index));
        let mut seen_gaps: HashSet<(FvgKind, usize)> = HashSet::new();
        let mut kept: Vec<Fvg> = Vec::with_capacity(fvgs.len());

        for f in fvgs {
            if f.origin == FvgOrigin::SingleBarGap && !seen_gaps.insert((f.kind, f.left_index)) {
                continue;
            }
            let target = kept.iter_mut().find(|k| {
                k.kind == f.kind && k.overlap_ratio(&f) >= self.config.overlap_threshold
            });
            let Some(k) = target else {
                kept.push(f);
                continue;
            };
            let left_index = k.left_index.min(f.left_index);
            let left_time = series.get(left_index).map_or(k.left_time.min(f.left_time), |c| c.ts);
            let f_wins = match (f.origin, k.origin) {
                (FvgOrigin::SingleBarGap, FvgOrigin::ThreeBar) => true,
                (FvgOrigin::ThreeBar, FvgOrigin::SingleBarGap) => false,
                _ => f.gap_size() > k.gap_size(),
            };
            if f_wins {
                k.origin = f.origin;
                k.formation_index = f.formation_index;
                k.formation_time = f.formation_time;
                k.end_time = f.end_time;
                k.rebound(f.top, f.bottom, left_index, left_time);
            } else {
                let (top, bottom) = (k.top, k.bottom);
                k.rebound(top, bottom, left_index, left_time);
            }
        }
        kept
    }

    /// Walk bars after formation up to `left_index + max_age_bars`. A merge
    /// can pull `left_index` back, so the horizon never precedes formation.
    fn replay(&self, series: &CandleSeries, f: &mut Fvg) {
        let bars = series.as_slice();
        let Some(last) = bars.len().checked_sub(1) else {
            return;
        };
        let horizon = f
            .left_index
            .saturating_add(self.config.max_age_bars)
            .max(f.formation_index);
        let end = last.min(horizon);

        let mut uncovered: Vec<(Decimal, Decimal)> = vec![(f.bottom, f.top)];
        for (j, bar) in bars
            .iter()
            .enumerate()
            .take(end + 1)
            .skip(f.formation_index + 1)
        {
            let (lo, hi) = (bar.body_low(), bar.body_high());
            let filled = match self.config.fill_mode {
                FillMode::Single => lo <= f.bottom && hi >= f.top,
                FillMode::Accumulating => {
                    uncovered = carve(&uncovered, lo, hi);
                    uncovered.is_empty()
                }
            };
            if filled {
                f.state = FvgState::Filled;
                f.filled_at = Some(j);
                f.end_time = bar.ts;
                return;
            }
        }

        if horizon <= last {
            f.state = FvgState::Expired;
            f.expired_at = Some(horizon);
        }
        if let Some(bar) = bars.get(end) {
            f.end_time = bar.ts;
        }
    }
}

/// Remove the body `[lo, hi]` from each uncovered range.
fn carve(ranges: &[(Decimal, Decimal)], lo: Decimal, hi: Decimal) -> Vec<(Decimal, Decimal)> {
    let mut out = Vec::with_capacity(ranges.len() + 1);
    for &(bottom, top) in ranges {
        if hi < bottom || lo > top {
            out.push((bottom, top));
            continue;
        }
        if bottom < lo {
            out.push((bottom, lo.min(top)));
        }
        if top > hi {
            out.push((hi.max(bottom), top));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeDelta, TimeZone, Utc};
    use fairgap_types::{Candle, Granularity};

    fn t(k: usize) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 6, 15, 0, 0).unwrap() + TimeDelta::minutes(15 * k as i64)
    }

    fn d(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn flat(n: usize, px: i64) -> Vec<Candle> {
        (0..n)
            .map(|k| Candle::new(t(k), d(px), d(px), d(px), d(px)))
            .collect()
    }

    fn fvg(kind: FvgKind, origin: FvgOrigin, lo: i64, hi: i64, left: usize) -> Fvg {
        let formation = match origin {
            FvgOrigin::ThreeBar => left + 2,
            FvgOrigin::SingleBarGap => left + 1,
        };
        Fvg::new(kind, origin, d(lo), d(hi), left, formation, t(left), t(formation)).unwrap()
    }

    fn tracker() -> FvgLifecycleTracker {
        FvgLifecycleTracker::new(FvgConfig::default()).unwrap()
    }

    #[test]
    fn gap_beats_three_bar_and_takes_earliest_index() {
        let s = CandleSeries::new(Granularity::M15, flat(10, 50));
        let out = tracker().dedup(
            &s,
            vec![
                fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 10, 20, 2),
                fvg(FvgKind::Bull, FvgOrigin::SingleBarGap, 11, 20, 3),
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].origin, FvgOrigin::SingleBarGap);
        assert_eq!((out[0].bottom, out[0].top), (d(11), d(20)));
        assert_eq!(out[0].left_index, 2);
        assert_eq!(out[0].left_time, t(2));
        assert_eq!(out[0].id, "bull_2_20_11");
    }

    #[test]
    fn same_origin_keeps_wider() {
        let s = CandleSeries::new(Granularity::M15, flat(10, 50));
        let out = tracker().dedup(
            &s,
            vec![
                fvg(FvgKind::Bear, FvgOrigin::ThreeBar, 10, 19, 1),
                fvg(FvgKind::Bear, FvgOrigin::ThreeBar, 10, 20, 4),
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].top, d(20));
        assert_eq!(out[0].left_index, 1);
        assert_eq!(out[0].formation_index, 6);
    }

    #[test]
    fn kinds_never_merge_and_low_overlap_survives() {
        let s = CandleSeries::new(Granularity::M15, flat(10, 50));
        let out = tracker().dedup(
            &s,
            vec![
                fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 10, 20, 1),
                fvg(FvgKind::Bear, FvgOrigin::ThreeBar, 10, 20, 1),
                fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 15, 25, 3),
            ],
        );
        assert_eq!(out.len(), 3);
    }

    #[test]
    fn gaps_are_unique_per_kind_and_index() {
        let s = CandleSeries::new(Granularity::M15, flat(10, 50));
        let out = tracker().dedup(
            &s,
            vec![
                fvg(FvgKind::Bull, FvgOrigin::SingleBarGap, 10, 20, 1),
                fvg(FvgKind::Bull, FvgOrigin::SingleBarGap, 30, 40, 1),
            ],
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bottom, d(10));
    }

    #[test]
    fn body_fill_but_not_wick() {
        let mut bars = flat(6, 14);
        // Wick spans the range, body does not.
        bars[3] = Candle::new(t(3), d(14), d(30), d(5), d(15));
        // Body covers [12, 16].
        bars[4] = Candle::new(t(4), d(11), d(17), d(10), d(17));
        let s = CandleSeries::new(Granularity::M15, bars);
        let report = tracker().resolve(&s, vec![fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 12, 16, 0)]);
        let f = &report.fvgs[0];
        assert_eq!(f.state, FvgState::Filled);
        assert_eq!(f.filled_at, Some(4));
        assert_eq!(f.end_time, t(4));
        assert_eq!(report.active().count(), 0);
    }

    #[test]
    fn formation_bars_never_fill() {
        let mut bars = flat(3, 14);
        bars[2] = Candle::new(t(2), d(11), d(17), d(10), d(17));
        let s = CandleSeries::new(Granularity::M15, bars);
        let report = tracker().resolve(&s, vec![fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 12, 16, 0)]);
        assert_eq!(report.fvgs[0].state, FvgState::Valid);
        assert_eq!(report.fvgs[0].end_time, t(2));
    }

    #[test]
    fn accumulating_mode_combines_bodies() {
        let mut bars = flat(8, 50);
        bars[3] = Candle::new(t(3), d(11), d(14), d(11), d(14));
        bars[4] = Candle::new(t(4), d(17), d(17), d(13), d(13));
        let s = CandleSeries::new(Granularity::M15, bars);
        let raw = vec![fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 12, 16, 0)];

        let single = tracker().resolve(&s, raw.clone());
        assert_eq!(single.fvgs[0].state, FvgState::Valid);

        let acc = FvgLifecycleTracker::new(FvgConfig {
            fill_mode: FillMode::Accumulating,
            ..FvgConfig::default()
        })
        .unwrap()
        .resolve(&s, raw);
        assert_eq!(acc.fvgs[0].state, FvgState::Filled);
        assert_eq!(acc.fvgs[0].filled_at, Some(4));
    }

    #[test]
    fn expires_exactly_at_horizon() {
        let s = CandleSeries::new(Granularity::M15, flat(50, 50));
        let report = tracker().resolve(&s, vec![fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 12, 16, 3)]);
        let f = &report.fvgs[0];
        assert_eq!(f.state, FvgState::Expired);
        assert_eq!(f.expired_at, Some(43));
        assert_eq!(f.end_time, t(43));
    }

    #[test]
    fn merged_gap_never_expires_before_formation() {
        let s = CandleSeries::new(Granularity::M15, flat(30, 50));
        let short = tracker().with_max_age_bars(2).unwrap();
        let report = short.resolve(
            &s,
            vec![
                fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 10, 20, 2),
                fvg(FvgKind::Bull, FvgOrigin::SingleBarGap, 11, 20, 9),
            ],
        );
        let f = &report.fvgs[0];
        assert_eq!((f.left_index, f.formation_index), (2, 10));
        assert_eq!(f.state, FvgState::Expired);
        assert_eq!(f.expired_at, Some(10));
        assert!(tracker().with_max_age_bars(1).is_err());
    }

    #[test]
    fn open_window_stays_valid() {
        let s = CandleSeries::new(Granularity::M15, flat(20, 50));
        let report = tracker().resolve(&s, vec![fvg(FvgKind::Bull, FvgOrigin::ThreeBar, 12, 16, 3)]);
        assert_eq!(report.fvgs[0].state, FvgState::Valid);
        assert_eq!(report.fvgs[0].end_time, t(19));
    }

    #[test]
    fn carve_splits_ranges() {
        let r = carve(&[(d(10), d(20))], d(12), d(15));
        assert_eq!(r, vec![(d(10), d(12)), (d(15), d(20))]);
        assert!(carve(&[(d(10), d(20))], d(9), d(21)).is_empty());
        assert_eq!(carve(&[(d(10), d(20))], d(21), d(25)), vec![(d(10), d(20))]);
    }
}
