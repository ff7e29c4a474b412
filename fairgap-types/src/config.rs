//! Configuration types for detection, continuity scans, the calendar and caching.

use std::time::Duration;

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::FairGapError;

/// Which fair value gap detection rules are active.
///
/// Selected once per detector; never branched per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RuleSet {
    /// Also detect single-bar opening gaps, not only three-bar wick gaps.
    pub single_bar_gaps: bool,
    /// Require `L` and `C` to share body color.
    pub require_directional_continuity: bool,
}

impl RuleSet {
    /// Three-bar wick gaps only.
    pub const THREE_BAR_ONLY: Self = Self {
        single_bar_gaps: false,
        require_directional_continuity: false,
    };
    /// Three-bar wick gaps plus single-bar opening gaps.
    pub const THREE_BAR_AND_GAP: Self = Self {
        single_bar_gaps: true,
        require_directional_continuity: false,
    };
    /// Both rules, and `L`/`C` must share body color.
    pub const DIRECTIONAL: Self = Self {
        single_bar_gaps: true,
        require_directional_continuity: true,
    };
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::THREE_BAR_AND_GAP
    }
}

/// How later bars are judged to fill a gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillMode {
    /// One bar body must cover the whole range.
    #[default]
    Single,
    /// Bodies of successive bars may cover the range piecewise.
    Accumulating,
}

/// Options for fair value gap detection and lifecycle tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FvgConfig {
    /// Bars after `left_index` before an unfilled gap expires.
    pub max_age_bars: usize,
    /// Intersection-over-union at or above which two same-kind gaps merge.
    pub overlap_threshold: f64,
    /// Active detection rules.
    pub rules: RuleSet,
    /// Fill judgement.
    pub fill_mode: FillMode,
}

impl FvgConfig {
    /// Default age window in bars.
    pub const DEFAULT_MAX_AGE_BARS: usize = 40;
    /// Default merge threshold.
    pub const DEFAULT_OVERLAP_THRESHOLD: f64 = 0.75;
    /// Smallest age window: a three-bar gap forms two bars after its left bar.
    pub const MIN_MAX_AGE_BARS: usize = 2;

    /// Check option ranges.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `max_age_bars` is below
    /// [`Self::MIN_MAX_AGE_BARS`] or `overlap_threshold` is not within
    /// `(0, 1]`.
    pub fn validate(&self) -> Result<(), FairGapError> {
        if self.max_age_bars < Self::MIN_MAX_AGE_BARS {
            return Err(FairGapError::invalid_arg(format!(
                "max_age_bars must be at least {}, got {}",
                Self::MIN_MAX_AGE_BARS,
                self.max_age_bars
            )));
        }
        if !(self.overlap_threshold > 0.0 && self.overlap_threshold <= 1.0) {
            return Err(FairGapError::invalid_arg(format!(
                "overlap_threshold must be in (0, 1], got {}",
                self.overlap_threshold
            )));
        }
        Ok(())
    }
}

impl Default for FvgConfig {
    fn default() -> Self {
        Self {
            max_age_bars: Self::DEFAULT_MAX_AGE_BARS,
            overlap_threshold: Self::DEFAULT_OVERLAP_THRESHOLD,
            rules: RuleSet::default(),
            fill_mode: FillMode::default(),
        }
    }
}

/// Control flow used by the continuity scan. All strategies yield identical
/// reports; they differ only in cost profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ScanStrategy {
    /// Bar-by-bar pass, consulting the calendar for every anomaly.
    Naive,
    /// Segment into continuous sessions first; only segment boundaries need
    /// the calendar.
    ClosureSkipping,
    /// Compute every delta up front, then classify only anomalies.
    #[default]
    Batch,
    /// Scan contiguous chunks on a worker pool, then classify chunk seams.
    Partitioned,
}

impl ScanStrategy {
    /// Every strategy, for equivalence checks.
    pub const ALL: [Self; 4] = [
        Self::Naive,
        Self::ClosureSkipping,
        Self::Batch,
        Self::Partitioned,
    ];

    /// Pick a strategy from the series size. Below 10k bars closure skipping
    /// wins; up to 100k bars, or for any high-frequency intraday series, the
    /// batch pass; beyond that the partitioned scan.
    #[must_use]
    pub const fn for_size(bars: usize, intraday_high_freq: bool) -> Self {
        if bars < 10_000 {
            Self::ClosureSkipping
        } else if bars < 100_000 || intraday_high_freq {
            Self::Batch
        } else {
            Self::Partitioned
        }
    }
}

/// Options for the continuity scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContinuityConfig {
    /// Control flow to use.
    pub strategy: ScanStrategy,
    /// Worker threads for [`ScanStrategy::Partitioned`]; `None` uses the
    /// shared global pool.
    pub workers: Option<usize>,
    /// Bars per chunk for [`ScanStrategy::Partitioned`].
    pub chunk_size: usize,
}

impl ContinuityConfig {
    /// Default bars per partition.
    pub const DEFAULT_CHUNK_SIZE: usize = 1000;

    /// Check option ranges.
    ///
    /// # Errors
    /// Returns `InvalidArg` for a zero chunk size or zero workers.
    pub fn validate(&self) -> Result<(), FairGapError> {
        if self.chunk_size == 0 {
            return Err(FairGapError::invalid_arg("chunk_size must be positive"));
        }
        if self.workers == Some(0) {
            return Err(FairGapError::invalid_arg("workers must be positive"));
        }
        Ok(())
    }
}

impl Default for ContinuityConfig {
    fn default() -> Self {
        Self {
            strategy: ScanStrategy::default(),
            workers: None,
            chunk_size: Self::DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Trading calendar parameters.
///
/// The defaults describe a Sunday-evening to Friday-afternoon futures week in
/// New York time with a one-hour daily break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CalendarConfig {
    /// First year the holiday table covers.
    pub first_year: i32,
    /// Last year the holiday table covers.
    pub last_year: i32,
    /// Exchange time zone.
    pub timezone: Tz,
    /// Daily close, exchange-local.
    pub daily_close: NaiveTime,
    /// Daily reopen, exchange-local.
    pub daily_open: NaiveTime,
    /// Close on early-close days, exchange-local.
    pub early_close: NaiveTime,
}

impl CalendarConfig {
    /// Check option ranges.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the year range is inverted or the session
    /// times are not ordered `early_close <= daily_close <= daily_open`.
    pub fn validate(&self) -> Result<(), FairGapError> {
        if self.first_year > self.last_year {
            return Err(FairGapError::invalid_arg(format!(
                "calendar year range inverted: {}..={}",
                self.first_year, self.last_year
            )));
        }
        if !(self.early_close <= self.daily_close && self.daily_close <= self.daily_open) {
            return Err(FairGapError::invalid_arg(
                "session times must satisfy early_close <= daily_close <= daily_open",
            ));
        }
        Ok(())
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self {
            first_year: 2000,
            last_year: 2100,
            timezone: chrono_tz::America::New_York,
            daily_close: NaiveTime::from_hms_opt(17, 0, 0).unwrap_or(NaiveTime::MIN),
            daily_open: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            early_close: NaiveTime::from_hms_opt(13, 0, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

/// Bounds for the report cache service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Maximum number of cached reports per report type.
    pub max_entries: u64,
    /// Optional time-to-live per entry.
    pub ttl: Option<Duration>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: 256,
            ttl: None,
        }
    }
}
