//! Continuity findings between consecutive bars.

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use crate::calendar::ClosureReason;

/// Classification of an abnormal step between two consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GapKind {
    /// Expected non-trading interval; not counted as missing data.
    TradingClosure(ClosureReason),
    /// In-session bars are absent.
    DataMissing,
    /// Two bars share one timestamp.
    DuplicateTimestamp,
}

/// One continuity finding between bar `start_index` and bar `end_index`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Gap {
    /// Open time of the bar before the gap.
    pub start: DateTime<Utc>,
    /// Open time of the bar after the gap.
    pub end: DateTime<Utc>,
    /// Index of the bar before the gap.
    pub start_index: usize,
    /// Index of the bar after the gap.
    pub end_index: usize,
    /// In-session bars expected between the two bars but absent. Always zero
    /// for closures and duplicates.
    pub missing_bars: u64,
    /// Classification.
    pub kind: GapKind,
}

impl Gap {
    /// Wall-clock span between the two bars.
    #[must_use]
    pub fn duration(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Short reason label.
    #[must_use]
    pub fn reason(&self) -> String {
        match self.kind {
            GapKind::TradingClosure(r) => r.to_string(),
            GapKind::DataMissing => "data missing".to_string(),
            GapKind::DuplicateTimestamp => "duplicate timestamp".to_string(),
        }
    }
}
