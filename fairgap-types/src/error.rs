use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unified error type for the fairgap workspace.
///
/// Only conditions the caller must act on are errors. Malformed bars and
/// series that are too short are reported through warnings and report status
/// instead, so that a scan never aborts half-way over recoverable data issues.
#[derive(Debug, Error, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum FairGapError {
    /// The requested bar interval is not one of the known granularities.
    #[error("unsupported granularity: {minutes} minutes")]
    UnsupportedGranularity {
        /// Interval length in minutes as supplied by the caller.
        minutes: u32,
    },

    /// A date fell outside the years the trading calendar was built for.
    #[error("calendar range exceeded: {date} is outside {first_year}..={last_year}")]
    CalendarRangeExceeded {
        /// Offending exchange-local date.
        date: NaiveDate,
        /// First year covered by the calendar.
        first_year: i32,
        /// Last year covered by the calendar.
        last_year: i32,
    },

    /// Invalid input argument.
    #[error("invalid argument: {0}")]
    InvalidArg(String),

    /// Issues with the supplied data that cannot be recovered from.
    #[error("data issue: {0}")]
    Data(String),

    /// A parallel scan worker pool could not be built or a worker failed.
    #[error("worker failure: {0}")]
    Worker(String),
}

impl FairGapError {
    /// Helper: build an `UnsupportedGranularity` error.
    #[must_use]
    pub const fn unsupported_granularity(minutes: u32) -> Self {
        Self::UnsupportedGranularity { minutes }
    }

    /// Helper: build a `CalendarRangeExceeded` error.
    #[must_use]
    pub const fn calendar_range(date: NaiveDate, first_year: i32, last_year: i32) -> Self {
        Self::CalendarRangeExceeded {
            date,
            first_year,
            last_year,
        }
    }

    /// Helper: build an `InvalidArg` error from any message.
    pub fn invalid_arg(msg: impl Into<String>) -> Self {
        Self::InvalidArg(msg.into())
    }

    /// Returns true if retrying with different input (another granularity or
    /// a wider calendar) could succeed.
    #[must_use]
    pub const fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedGranularity { .. }
                | Self::CalendarRangeExceeded { .. }
                | Self::InvalidArg(_)
        )
    }
}
