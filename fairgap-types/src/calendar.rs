//! Market calendar vocabulary shared by the calendar oracle and reports.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Exchange holidays with a full-day closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Holiday {
    /// January 1st, rolled forward off weekends.
    NewYear,
    /// Third Monday of January.
    MartinLutherKing,
    /// Third Monday of February.
    Presidents,
    /// Friday before Easter Sunday.
    GoodFriday,
    /// Last Monday of May.
    Memorial,
    /// July 4th, rolled forward off weekends.
    Independence,
    /// First Monday of September.
    Labor,
    /// Fourth Thursday of November.
    Thanksgiving,
    /// December 25th, rolled forward off weekends.
    Christmas,
}

impl Holiday {
    /// Human-readable name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::NewYear => "New Year's Day",
            Self::MartinLutherKing => "Martin Luther King Jr. Day",
            Self::Presidents => "Presidents' Day",
            Self::GoodFriday => "Good Friday",
            Self::Memorial => "Memorial Day",
            Self::Independence => "Independence Day",
            Self::Labor => "Labor Day",
            Self::Thanksgiving => "Thanksgiving Day",
            Self::Christmas => "Christmas Day",
        }
    }
}

impl fmt::Display for Holiday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Why the market is closed at a given instant or across a gap.
///
/// Variants are ordered by precedence: when several apply to one gap, the
/// smallest wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ClosureReason {
    /// Full-day exchange holiday.
    Holiday(Holiday),
    /// Weekly closure between the Friday close and the Sunday open.
    Weekend,
    /// Shortened session before or after a holiday.
    EarlyClose,
    /// Daily maintenance break between close and reopen.
    DailyClose,
}

impl fmt::Display for ClosureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Holiday(h) => write!(f, "holiday: {h}"),
            Self::Weekend => f.write_str("weekend"),
            Self::EarlyClose => f.write_str("early close"),
            Self::DailyClose => f.write_str("daily close"),
        }
    }
}

/// Trading status of a calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayStatus {
    /// Normal session.
    Regular,
    /// Session ends early.
    EarlyClose,
    /// Full-day holiday.
    Holiday(Holiday),
    /// Saturday or Sunday.
    Weekend,
}

impl DayStatus {
    /// True unless the whole day is closed.
    #[must_use]
    pub const fn is_trading_day(self) -> bool {
        matches!(self, Self::Regular | Self::EarlyClose)
    }
}
