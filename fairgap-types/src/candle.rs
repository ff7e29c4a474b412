//! Price bars and the fixed set of bar granularities.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::FairGapError;

/// One OHLCV price bar, stamped with its open time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candle {
    /// Bar open time (UTC).
    pub ts: DateTime<Utc>,
    /// First traded price.
    pub open: Decimal,
    /// Highest traded price.
    pub high: Decimal,
    /// Lowest traded price.
    pub low: Decimal,
    /// Last traded price.
    pub close: Decimal,
    /// Traded volume, when the source provides it.
    pub volume: Option<u64>,
}

/// Direction of a single bar's body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandleColor {
    /// `close > open`
    Bull,
    /// `close < open`
    Bear,
    /// `close == open`
    Doji,
}

impl Candle {
    /// Construct a bar without a volume figure.
    #[must_use]
    pub const fn new(
        ts: DateTime<Utc>,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        Self {
            ts,
            open,
            high,
            low,
            close,
            volume: None,
        }
    }

    /// Attach a volume figure.
    #[must_use]
    pub const fn with_volume(mut self, volume: u64) -> Self {
        self.volume = Some(volume);
        self
    }

    /// Lower edge of the real body, `min(open, close)`.
    #[must_use]
    pub fn body_low(&self) -> Decimal {
        self.open.min(self.close)
    }

    /// Upper edge of the real body, `max(open, close)`.
    #[must_use]
    pub fn body_high(&self) -> Decimal {
        self.open.max(self.close)
    }

    /// Body color by comparing close against open.
    #[must_use]
    pub fn color(&self) -> CandleColor {
        match self.close.cmp(&self.open) {
            std::cmp::Ordering::Greater => CandleColor::Bull,
            std::cmp::Ordering::Less => CandleColor::Bear,
            std::cmp::Ordering::Equal => CandleColor::Doji,
        }
    }

    /// Check the OHLC envelope invariant.
    ///
    /// Returns the first violated rule, or `None` for a well-formed bar.
    #[must_use]
    pub fn malformation(&self) -> Option<MalformedReason> {
        if self.high < self.low {
            return Some(MalformedReason::HighBelowLow);
        }
        if self.body_high() > self.high {
            return Some(MalformedReason::BodyAboveHigh);
        }
        if self.body_low() < self.low {
            return Some(MalformedReason::BodyBelowLow);
        }
        None
    }
}

/// Why a bar failed the OHLC envelope check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MalformedReason {
    /// `high < low`
    HighBelowLow,
    /// `max(open, close) > high`
    BodyAboveHigh,
    /// `min(open, close) < low`
    BodyBelowLow,
}

impl fmt::Display for MalformedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::HighBelowLow => "high below low",
            Self::BodyAboveHigh => "body above high",
            Self::BodyBelowLow => "body below low",
        };
        f.write_str(s)
    }
}

/// Non-fatal data-quality finding attached to a series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DataWarning {
    /// A bar violated the OHLC envelope and was excluded from analysis.
    MalformedBar {
        /// Position of the bar in the raw input, before sorting.
        index: usize,
        /// Timestamp of the excluded bar.
        ts: DateTime<Utc>,
        /// Violated rule.
        reason: MalformedReason,
    },
}

/// Known bar granularities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Granularity {
    /// 1 minute
    M1,
    /// 5 minutes
    M5,
    /// 15 minutes
    M15,
    /// 1 hour
    H1,
    /// 4 hours
    H4,
    /// 1 day
    D1,
}

impl Granularity {
    /// Every supported granularity, finest first.
    pub const ALL: [Self; 6] = [Self::M1, Self::M5, Self::M15, Self::H1, Self::H4, Self::D1];

    /// Nominal bar length in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::M1 => 1,
            Self::M5 => 5,
            Self::M15 => 15,
            Self::H1 => 60,
            Self::H4 => 240,
            Self::D1 => 1440,
        }
    }

    /// Nominal bar length in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.minutes() as i64 * 60
    }

    /// Nominal bar length as a `TimeDelta`.
    #[must_use]
    pub const fn step(self) -> chrono::TimeDelta {
        chrono::TimeDelta::seconds(self.seconds())
    }

    /// Whether bars are whole trading days rather than intraday slots.
    #[must_use]
    pub const fn is_daily(self) -> bool {
        matches!(self, Self::D1)
    }

    /// Resolve a granularity from its length in minutes.
    ///
    /// # Errors
    /// Returns `UnsupportedGranularity` for any length outside the known set.
    pub const fn from_minutes(minutes: u32) -> Result<Self, FairGapError> {
        match minutes {
            1 => Ok(Self::M1),
            5 => Ok(Self::M5),
            15 => Ok(Self::M15),
            60 => Ok(Self::H1),
            240 => Ok(Self::H4),
            1440 => Ok(Self::D1),
            other => Err(FairGapError::unsupported_granularity(other)),
        }
    }

    /// Short label such as `"M15"`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::M1 => "M1",
            Self::M5 => "M5",
            Self::M15 => "M15",
            Self::H1 => "H1",
            Self::H4 => "H4",
            Self::D1 => "D1",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = FairGapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "M1" | "1M" => Ok(Self::M1),
            "M5" | "5M" => Ok(Self::M5),
            "M15" | "15M" => Ok(Self::M15),
            "H1" | "1H" | "60M" => Ok(Self::H1),
            "H4" | "4H" | "240M" => Ok(Self::H4),
            "D1" | "1D" => Ok(Self::D1),
            other => Err(FairGapError::invalid_arg(format!(
                "unknown granularity label: {other}"
            ))),
        }
    }
}

impl TryFrom<u32> for Granularity {
    type Error = FairGapError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(minutes)
    }
}
