//! Fairgap data transfer objects and configuration primitives.
//!
//! Every type here is plain data: serde-serializable, free of analysis logic
//! beyond small accessors, and shared by `fairgap-core`, `fairgap-cache` and
//! the `fairgap` facade.
#![warn(missing_docs)]

mod calendar;
mod candle;
mod config;
mod error;
mod fvg;
mod gap;
mod reports;

pub use calendar::{ClosureReason, DayStatus, Holiday};
pub use candle::{Candle, CandleColor, DataWarning, Granularity, MalformedReason};
pub use config::{
    CacheConfig, CalendarConfig, ContinuityConfig, FillMode, FvgConfig, RuleSet, ScanStrategy,
};
pub use error::FairGapError;
pub use fvg::{Fvg, FvgKind, FvgOrigin, FvgState};
pub use gap::{Gap, GapKind};
pub use reports::{ContinuityReport, FvgReport, FvgStats, ReportStatus};
