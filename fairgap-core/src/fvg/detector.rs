use fairgap_types::{Candle, Fvg, FvgKind, FvgOrigin, RuleSet};

use crate::series::CandleSeries;

/// Scans a series for three-bar and single-bar-gap imbalances.
///
/// The rule set is fixed at construction. Detection is a pure function of the
/// series: it never mutates input and never consults later bars beyond `R`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FvgDetector {
    rules: RuleSet,
}

impl FvgDetector {
    /// Detector for `rules`.
    #[must_use]
    pub const fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    /// Active rules.
    #[must_use]
    pub const fn rules(&self) -> RuleSet {
        self.rules
    }

    /// Every raw detection in `series`, in bar order. Fewer than three bars
    /// yield an empty list.
    ///
    /// For each triple `L = i - 1`, `C = i`, `R = i + 1`:
    /// - bull three-bar: `L.high < R.low`, range `[L.high, R.low]`
    /// - bear three-bar: `L.low > R.high`, range `[R.high, L.low]`
    /// - bull gap: `C.open > L.high` and `C` closes up, range `[L.high, C.open]`
    /// - bear gap: `C.open < L.low` and `C` closes down, range `[C.open, L.low]`
    ///
    /// With directional continuity required, triples whose `L` and `C` differ
    /// in body color are skipped entirely.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap_core::fvg::detect",
            skip(self, series),
            fields(bars = series.len(), granularity = %series.granularity()),
        )
    )]
    #[must_use]
    pub fn detect(&self, series: &CandleSeries) -> Vec<Fvg> {
        let bars = series.as_slice();
        let mut out = Vec::new();
        for (left, w) in bars.windows(3).enumerate() {
            self.scan_triple(left, &w[0], &w[1], &w[2], &mut out);
        }
        #[cfg(feature = "tracing")]
        tracing::debug!(raw = out.len(), "fvg scan complete");
        out
    }

    fn scan_triple(&self, left: usize, l: &Candle, c: &Candle, r: &Candle, out: &mut Vec<Fvg>) {
        if self.rules.require_directional_continuity && l.color() != c.color() {
            return;
        }
        let (center, right) = (left + 1, left + 2);

        let three = if l.high < r.low {
            Some((FvgKind::Bull, l.high, r.low))
        } else if l.low > r.high {
            Some((FvgKind::Bear, r.high, l.low))
        } else {
            None
        };
        if let Some((kind, a, b)) = three {
            out.extend(Fvg::new(
                kind,
                FvgOrigin::ThreeBar,
                a,
                b,
                left,
                right,
                l.ts,
                r.ts,
            ));
        }

        if !self.rules.single_bar_gaps {
            return;
        }
        if c.open > l.high && c.close > c.open {
            out.extend(Fvg::new(
                FvgKind::Bull,
                FvgOrigin::SingleBarGap,
                l.high,
                c.open,
                left,
                center,
                l.ts,
                c.ts,
            ));
        }
        if c.open < l.low && c.close < c.open {
            out.extend(Fvg::new(
                FvgKind::Bear,
                FvgOrigin::SingleBarGap,
                c.open,
                l.low,
                left,
                center,
                l.ts,
                c.ts,
            ));
        }
    }
}
