//! fairgap-core
//!
//! Analysis engines over in-memory candle series.
//!
//! - `series`: validated, time-ordered bars for one granularity.
//! - `calendar`: the exchange holiday and session oracle.
//! - `fvg`: fair value gap detection and lifecycle tracking.
//! - `continuity`: calendar-aware gap auditing under four scan strategies.
//! - `timeseries`: interval inference and resampling.
//!
//! Concurrency
//! -----------
//! `CandleSeries` and `TradingCalendar` are immutable once built, so both can
//! be shared across threads without locking. The only parallel code path is
//! the partitioned continuity scan, which runs on `rayon`: workers read the
//! shared series and calendar, write disjoint result buffers, and the caller
//! merges them after a join.
//!
#![warn(missing_docs)]

/// Trading calendar: holidays, early closes and the weekly session template.
pub mod calendar;
/// Continuity analyzer and its scan strategies.
pub mod continuity;
/// Fair value gap detector and lifecycle tracker.
pub mod fvg;
/// Validated candle series.
pub mod series;
/// Time-series utilities for interval inference and resampling.
pub mod timeseries;

pub use calendar::{GapVerdict, TradingCalendar};
pub use continuity::ContinuityAnalyzer;
pub use fvg::{FvgDetector, FvgLifecycleTracker};
pub use series::CandleSeries;
pub use timeseries::infer::{estimate_step_seconds, infer_granularity};
pub use timeseries::resample::resample;

pub use fairgap_types::*;
