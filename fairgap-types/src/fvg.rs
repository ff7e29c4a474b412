//! Fair value gap records and their lifecycle state.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Direction of the imbalance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FvgKind {
    /// Price jumped up, leaving an unfilled range below.
    Bull,
    /// Price jumped down, leaving an unfilled range above.
    Bear,
}

impl FvgKind {
    /// Lowercase label used in identifiers.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bull => "bull",
            Self::Bear => "bear",
        }
    }
}

impl fmt::Display for FvgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which detection rule produced the gap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FvgOrigin {
    /// `L` and `R` wicks do not overlap.
    ThreeBar,
    /// `C` opened beyond `L`'s wick and closed further in the same direction.
    SingleBarGap,
}

/// Lifecycle state. `Filled` and `Expired` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FvgState {
    /// Still open.
    Valid,
    /// Covered by later bar bodies.
    Filled,
    /// Aged out without being covered.
    Expired,
}

/// One detected fair value gap.
///
/// `top > bottom` always holds; [`Fvg::new`] normalizes the two prices and
/// refuses degenerate (zero-height) ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fvg {
    /// Stable identifier, `"{kind}_{left_index}_{top}_{bottom}"`.
    pub id: String,
    /// Direction.
    pub kind: FvgKind,
    /// Upper price of the unfilled range.
    pub top: Decimal,
    /// Lower price of the unfilled range.
    pub bottom: Decimal,
    /// Detection rule.
    pub origin: FvgOrigin,
    /// Index of the left bar `L`; all ordering and windowing is anchored here.
    pub left_index: usize,
    /// Index of the bar that completed the pattern (`R`, or `C` for gaps).
    pub formation_index: usize,
    /// Open time of `L`.
    pub left_time: DateTime<Utc>,
    /// Open time of the completing bar.
    pub formation_time: DateTime<Utc>,
    /// Open time of the bar where tracking stopped: the fill or expiry bar,
    /// otherwise the end of the tracking window clamped to the series.
    pub end_time: DateTime<Utc>,
    /// Lifecycle state.
    pub state: FvgState,
    /// Index of the bar that filled the gap.
    pub filled_at: Option<usize>,
    /// Index at which the gap expired.
    pub expired_at: Option<usize>,
}

impl Fvg {
    /// Build a fresh `Valid` gap between two prices in either order.
    ///
    /// Returns `None` when both prices are equal.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        kind: FvgKind,
        origin: FvgOrigin,
        price_a: Decimal,
        price_b: Decimal,
        left_index: usize,
        formation_index: usize,
        left_time: DateTime<Utc>,
        formation_time: DateTime<Utc>,
    ) -> Option<Self> {
        let top = price_a.max(price_b);
        let bottom = price_a.min(price_b);
        if top <= bottom {
            return None;
        }
        Some(Self {
            id: make_id(kind, left_index, top, bottom),
            kind,
            top,
            bottom,
            origin,
            left_index,
            formation_index,
            left_time,
            formation_time,
            end_time: formation_time,
            state: FvgState::Valid,
            filled_at: None,
            expired_at: None,
        })
    }

    /// Height of the range, `top - bottom`.
    #[must_use]
    pub fn gap_size(&self) -> Decimal {
        self.top - self.bottom
    }

    /// True while the gap is still `Valid`.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.state == FvgState::Valid
    }

    /// True once the gap is `Filled` or `Expired`.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Intersection over union of the two `[bottom, top]` ranges, in `[0, 1]`.
    #[must_use]
    pub fn overlap_ratio(&self, other: &Self) -> f64 {
        let hi = self.top.min(other.top);
        let lo = self.bottom.max(other.bottom);
        let inter = (hi - lo).max(Decimal::ZERO);
        let union = self.gap_size() + other.gap_size() - inter;
        if union <= Decimal::ZERO {
            return 0.0;
        }
        (inter / union).to_f64().unwrap_or(0.0)
    }

    /// Replace the price range and index anchors, keeping the id in sync.
    pub fn rebound(
        &mut self,
        top: Decimal,
        bottom: Decimal,
        left_index: usize,
        left_time: DateTime<Utc>,
    ) {
        self.top = top;
        self.bottom = bottom;
        self.left_index = left_index;
        self.left_time = left_time;
        self.id = make_id(self.kind, left_index, top, bottom);
    }
}

fn make_id(kind: FvgKind, left_index: usize, top: Decimal, bottom: Decimal) -> String {
    format!("{kind}_{left_index}_{top}_{bottom}")
}
