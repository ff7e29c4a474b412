//! fairgap finds fair value gaps in OHLCV candle series and audits those
//! series for continuity against an exchange trading calendar.
//!
//! Overview
//! - Detects three-bar and single-bar-gap imbalances, merges near-duplicate
//!   detections and tracks each gap until a later bar body fills it or it
//!   ages out.
//! - Sorts every abnormal step between bars into a trading closure (weekend,
//!   holiday, early close, daily break), missing data or a duplicate
//!   timestamp, and reports how much of the expected data is present.
//! - All analyses are pure functions of the series and an explicit config.
//!
//! Key behaviors and trade-offs
//! - Rule set: three-bar only is the classic definition; adding single-bar
//!   gaps catches opening gaps; directional continuity trades recall for
//!   fewer counter-trend detections.
//! - Fill mode: `Single` needs one bar body to cover the gap; `Accumulating`
//!   lets several bodies cover it piecewise.
//! - Scan strategy: `Naive`, `ClosureSkipping`, `Batch` and `Partitioned`
//!   produce identical reports. `Partitioned` runs on rayon and pays off for
//!   very long series; `adaptive_strategy` picks by series size.
//! - Cache: an optional bounded [`ReportCache`] keyed by series content and
//!   options. It is injected through the builder, never global.
//!
//! Examples
//! ```rust
//! use fairgap::{CandleSeries, FairGap, Granularity};
//!
//! let fg = FairGap::builder().build()?;
//! let series = CandleSeries::new(Granularity::M15, Vec::new());
//! let fvgs = fg.detect_fvgs(&series)?;
//! assert!(fvgs.fvgs.is_empty());
//! let audit = fg.analyze_continuity(&series, 15)?;
//! assert_eq!(audit.status, fairgap::ReportStatus::InsufficientData);
//! # Ok::<(), fairgap::FairGapError>(())
//! ```
//!
//! See `fairgap/examples/` for a runnable end-to-end demonstration.
#![warn(missing_docs)]

pub(crate) mod core;

pub use crate::core::{FairGap, FairGapBuilder};
pub use fairgap_cache::{ReportCache, ReportKey};

pub use fairgap_core::{
    // Engines
    ContinuityAnalyzer,
    FvgDetector,
    FvgLifecycleTracker,
    GapVerdict,
    TradingCalendar,
    // Series and helpers
    CandleSeries,
    estimate_step_seconds,
    infer_granularity,
    resample,
    // Data types
    Candle,
    CandleColor,
    ClosureReason,
    DataWarning,
    DayStatus,
    Fvg,
    FvgKind,
    FvgOrigin,
    FvgState,
    Gap,
    GapKind,
    Granularity,
    Holiday,
    MalformedReason,
    // Reports
    ContinuityReport,
    FvgReport,
    FvgStats,
    ReportStatus,
    // Configuration
    CacheConfig,
    CalendarConfig,
    ContinuityConfig,
    FillMode,
    FvgConfig,
    RuleSet,
    ScanStrategy,
    // Errors
    FairGapError,
};
