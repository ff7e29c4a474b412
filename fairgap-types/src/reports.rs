//! Report envelopes produced by the analysis engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::candle::{DataWarning, Granularity};
use crate::fvg::{Fvg, FvgKind, FvgState};
use crate::gap::Gap;

/// Whether a report carries a full analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ReportStatus {
    /// The analysis ran over the whole series.
    #[default]
    Completed,
    /// The series had fewer than three bars; no findings were produced.
    InsufficientData,
}

/// Result of a continuity audit.
///
/// Trading closures are listed for context but never count as missing data;
/// `continuity_pct` is `total_bars / (total_bars + missing_bar_total) * 100`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityReport {
    /// Granularity the series was audited at.
    pub granularity: Granularity,
    /// Completion status.
    pub status: ReportStatus,
    /// Bars present in the series.
    pub total_bars: usize,
    /// Open time of the first bar.
    pub first_ts: Option<DateTime<Utc>>,
    /// Open time of the last bar.
    pub last_ts: Option<DateTime<Utc>>,
    /// Expected non-trading intervals, ordered by `start_index`.
    pub closures: Vec<Gap>,
    /// Gaps where in-session bars are absent, ordered by `start_index`.
    pub data_missing: Vec<Gap>,
    /// Consecutive bars sharing a timestamp, ordered by `start_index`.
    pub duplicates: Vec<Gap>,
    /// Sum of `missing_bars` over `data_missing`.
    pub missing_bar_total: u64,
    /// Share of present bars over present plus missing bars.
    pub continuity_pct: f64,
    /// Data-quality warnings carried over from series construction.
    pub warnings: Vec<DataWarning>,
}

impl ContinuityReport {
    /// Empty report for a series too short to audit.
    #[must_use]
    pub fn insufficient(
        granularity: Granularity,
        total_bars: usize,
        first_ts: Option<DateTime<Utc>>,
        last_ts: Option<DateTime<Utc>>,
        warnings: Vec<DataWarning>,
    ) -> Self {
        Self {
            granularity,
            status: ReportStatus::InsufficientData,
            total_bars,
            first_ts,
            last_ts,
            closures: Vec::new(),
            data_missing: Vec::new(),
            duplicates: Vec::new(),
            missing_bar_total: 0,
            continuity_pct: 0.0,
            warnings,
        }
    }

    /// Data gaps with at least `min_missing` absent bars.
    pub fn severe_gaps(&self, min_missing: u64) -> impl Iterator<Item = &Gap> {
        self.data_missing
            .iter()
            .filter(move |g| g.missing_bars >= min_missing)
    }

    /// True when no bars are missing and no timestamps repeat.
    #[must_use]
    pub fn is_continuous(&self) -> bool {
        self.status == ReportStatus::Completed
            && self.data_missing.is_empty()
            && self.duplicates.is_empty()
    }
}

/// Counts over a set of fair value gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct FvgStats {
    /// All gaps.
    pub total: usize,
    /// Bullish gaps.
    pub bullish: usize,
    /// Bearish gaps.
    pub bearish: usize,
    /// Gaps still open.
    pub valid: usize,
    /// Gaps covered by a later body.
    pub filled: usize,
    /// Gaps that aged out.
    pub expired: usize,
}

impl FvgStats {
    /// Tally `fvgs`.
    #[must_use]
    pub fn from_fvgs(fvgs: &[Fvg]) -> Self {
        fvgs.iter().fold(Self::default(), |mut s, f| {
            s.total += 1;
            match f.kind {
                FvgKind::Bull => s.bullish += 1,
                FvgKind::Bear => s.bearish += 1,
            }
            match f.state {
                FvgState::Valid => s.valid += 1,
                FvgState::Filled => s.filled += 1,
                FvgState::Expired => s.expired += 1,
            }
            s
        })
    }
}

/// Full lifecycle history of the gaps found in one series.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FvgReport {
    /// Every surviving gap after deduplication, ordered by `(kind, left_index)`.
    pub fvgs: Vec<Fvg>,
    /// Counts over `fvgs`.
    pub stats: FvgStats,
    /// Data-quality warnings carried over from series construction.
    pub warnings: Vec<DataWarning>,
}

impl FvgReport {
    /// Build a report and its stats from resolved gaps.
    #[must_use]
    pub fn new(fvgs: Vec<Fvg>, warnings: Vec<DataWarning>) -> Self {
        let stats = FvgStats::from_fvgs(&fvgs);
        Self {
            fvgs,
            stats,
            warnings,
        }
    }

    /// Gaps still in the `Valid` state.
    pub fn active(&self) -> impl Iterator<Item = &Fvg> {
        self.fvgs.iter().filter(|f| f.is_active())
    }
}
