use chrono::{DateTime, Utc};
use fairgap_types::{Candle, FairGapError, Granularity};
use rust_decimal::Decimal;

use crate::series::CandleSeries;

const DAY: i64 = 86_400;

/// Aggregate `series` into `target` buckets aligned on UTC multiples of the
/// target interval (UTC midnight for daily bars).
///
/// Each bucket takes the first open, the highest high, the lowest low, the
/// last close and the summed volume. Only present bars are aggregated; empty
/// buckets produce no bar, so gaps survive resampling.
///
/// # Errors
/// Returns `InvalidArg` if `target` is finer than the series granularity.
#[cfg_attr(
    feature = "tracing",
    tracing::instrument(
        name = "fairgap_core::timeseries::resample",
        skip(series),
        fields(from = %series.granularity(), to = %target, bars = series.len()),
        err,
    )
)]
pub fn resample(series: &CandleSeries, target: Granularity) -> Result<CandleSeries, FairGapError> {
    let source = series.granularity();
    if target < source {
        return Err(FairGapError::invalid_arg(format!(
            "cannot resample {source} down to finer {target}"
        )));
    }
    if target == source {
        return Ok(series.clone());
    }
    let step = target.seconds();
    let candles = resample_by(series.as_slice(), |ts| {
        let secs = ts.timestamp();
        let bucket = if target.is_daily() {
            secs.div_euclid(DAY) * DAY
        } else {
            secs - secs.rem_euclid(step)
        };
        DateTime::from_timestamp(bucket, 0)
    });
    Ok(CandleSeries::new(target, candles))
}

/// Group time-ordered candles by a bucket function and aggregate OHLCV within
/// each bucket. Candles whose bucket cannot be represented are skipped.
fn resample_by<F>(candles: &[Candle], bucket_of: F) -> Vec<Candle>
where
    F: Fn(DateTime<Utc>) -> Option<DateTime<Utc>>,
{
    let mut out: Vec<Candle> = Vec::new();
    let mut iter = candles.iter().filter_map(|c| bucket_of(c.ts).map(|b| (b, c)));
    let Some((first_bucket, first)) = iter.next() else {
        return out;
    };

    let mut agg = BucketAgg::start(first_bucket, first);
    for (bucket, c) in iter {
        if bucket == agg.bucket {
            agg.absorb(c);
        } else {
            out.push(agg.finish());
            agg = BucketAgg::start(bucket, c);
        }
    }
    out.push(agg.finish());
    out
}

struct BucketAgg {
    bucket: DateTime<Utc>,
    open: Decimal,
    high: Decimal,
    low: Decimal,
    close: Decimal,
    vol_sum: Option<u128>,
}

impl BucketAgg {
    fn start(bucket: DateTime<Utc>, c: &Candle) -> Self {
        Self {
            bucket,
            open: c.open,
            high: c.high,
            low: c.low,
            close: c.close,
            vol_sum: c.volume.map(u128::from),
        }
    }

    fn absorb(&mut self, c: &Candle) {
        self.high = self.high.max(c.high);
        self.low = self.low.min(c.low);
        self.close = c.close;
        if let Some(v) = c.volume {
            self.vol_sum = Some(self.vol_sum.unwrap_or(0) + u128::from(v));
        }
    }

    fn finish(self) -> Candle {
        Candle {
            ts: self.bucket,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.close,
            volume: self
                .vol_sum
                .and_then(|v| u64::try_from(v.min(u128::from(u64::MAX))).ok()),
        }
    }
}
