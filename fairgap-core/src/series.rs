//! Validated, time-ordered candle series for one granularity.

use std::ops::Index;

use chrono::{DateTime, Utc};
use fairgap_types::{Candle, DataWarning, Granularity};
use serde::Serialize;

/// An immutable, ascending sequence of bars at one granularity.
///
/// Construction drops bars that violate the OHLC envelope and records each
/// one as a [`DataWarning::MalformedBar`]. Equal timestamps are kept in input
/// order so a continuity audit can report them; use [`CandleSeries::dedup`]
/// for a strictly increasing copy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CandleSeries {
    granularity: Granularity,
    candles: Vec<Candle>,
    warnings: Vec<DataWarning>,
}

impl CandleSeries {
    /// Validate and order `candles`.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap_core::series::new",
            skip(candles),
            fields(granularity = %granularity, raw_len = candles.len()),
        )
    )]
    #[must_use]
    pub fn new(granularity: Granularity, candles: Vec<Candle>) -> Self {
        let mut warnings = Vec::new();
        let mut kept = Vec::with_capacity(candles.len());
        for (index, c) in candles.into_iter().enumerate() {
            match c.malformation() {
                None => kept.push(c),
                Some(reason) => {
                    #[cfg(feature = "tracing")]
                    tracing::warn!(index, ts = %c.ts, %reason, "excluding malformed bar");
                    warnings.push(DataWarning::MalformedBar {
                        index,
                        ts: c.ts,
                        reason,
                    });
                }
            }
        }
        // Stable: equal timestamps keep their input order.
        kept.sort_by_key(|c| c.ts);
        Self {
            granularity,
            candles: kept,
            warnings,
        }
    }

    /// Granularity the bars were recorded at.
    #[must_use]
    pub const fn granularity(&self) -> Granularity {
        self.granularity
    }

    /// Number of bars kept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    /// True if no bar survived validation.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    /// Bar at `index`, if any.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    /// All bars in time order.
    #[must_use]
    pub fn as_slice(&self) -> &[Candle] {
        &self.candles
    }

    /// Iterate bars in time order.
    pub fn iter(&self) -> std::slice::Iter<'_, Candle> {
        self.candles.iter()
    }

    /// Data-quality warnings collected at construction.
    #[must_use]
    pub fn warnings(&self) -> &[DataWarning] {
        &self.warnings
    }

    /// Open time of the first bar.
    #[must_use]
    pub fn first_ts(&self) -> Option<DateTime<Utc>> {
        self.candles.first().map(|c| c.ts)
    }

    /// Open time of the last bar.
    #[must_use]
    pub fn last_ts(&self) -> Option<DateTime<Utc>> {
        self.candles.last().map(|c| c.ts)
    }

    /// True if any two neighbouring bars share a timestamp.
    #[must_use]
    pub fn has_duplicates(&self) -> bool {
        self.candles.windows(2).any(|w| w[0].ts == w[1].ts)
    }

    /// Strictly increasing copy; the first bar of each timestamp wins.
    #[must_use]
    pub fn dedup(&self) -> Self {
        let mut candles = self.candles.clone();
        candles.dedup_by_key(|c| c.ts);
        Self {
            granularity: self.granularity,
            candles,
            warnings: self.warnings.clone(),
        }
    }

    /// Cheap content fingerprint: length, granularity and the hash of every
    /// bar. Equal series always share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};
        let mut h = DefaultHasher::new();
        self.granularity.hash(&mut h);
        self.candles.hash(&mut h);
        h.finish()
    }
}

impl Index<usize> for CandleSeries {
    type Output = Candle;

    fn index(&self, index: usize) -> &Candle {
        &self.candles[index]
    }
}

impl<'a> IntoIterator for &'a CandleSeries {
    type Item = &'a Candle;
    type IntoIter = std::slice::Iter<'a, Candle>;

    fn into_iter(self) -> Self::IntoIter {
        self.candles.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fairgap_types::MalformedReason;
    use rust_decimal::Decimal;

    fn c(min: u32, o: i64, h: i64, l: i64, cl: i64) -> Candle {
        Candle::new(
            Utc.with_ymd_and_hms(2024, 3, 5, 14, min, 0).unwrap(),
            Decimal::from(o),
            Decimal::from(h),
            Decimal::from(l),
            Decimal::from(cl),
        )
    }

    #[test]
    fn drops_malformed_and_sorts() {
        let s = CandleSeries::new(
            Granularity::M1,
            vec![c(2, 10, 12, 9, 11), c(0, 10, 8, 9, 9), c(1, 10, 12, 9, 11)],
        );
        assert_eq!(s.len(), 2);
        assert!(s[0].ts < s[1].ts);
        assert_eq!(s.warnings().len(), 1);
        assert!(matches!(
            s.warnings()[0],
            DataWarning::MalformedBar {
                index: 1,
                reason: MalformedReason::HighBelowLow,
                ..
            }
        ));
    }

    #[test]
    fn keeps_duplicates_until_dedup() {
        let s = CandleSeries::new(
            Granularity::M1,
            vec![c(0, 10, 12, 9, 11), c(0, 20, 22, 19, 21), c(1, 10, 12, 9, 11)],
        );
        assert!(s.has_duplicates());
        assert_eq!(s.len(), 3);
        assert_eq!(s[0].open, Decimal::from(10));

        let d = s.dedup();
        assert!(!d.has_duplicates());
        assert_eq!(d.len(), 2);
        assert_eq!(d[0].open, Decimal::from(10));
    }

    #[test]
    fn fingerprint_tracks_content() {
        let a = CandleSeries::new(Granularity::M1, vec![c(0, 10, 12, 9, 11)]);
        let b = CandleSeries::new(Granularity::M1, vec![c(0, 10, 12, 9, 11)]);
        let other = CandleSeries::new(Granularity::M5, vec![c(0, 10, 12, 9, 11)]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), other.fingerprint());
    }
}
