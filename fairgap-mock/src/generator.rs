use std::collections::BTreeSet;
use std::ops::Range;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use fairgap_core::{Candle, CandleSeries, FairGapError, Granularity, TradingCalendar};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

/// Builder for a seeded random-walk candle series.
///
/// The same settings always produce the same bars. When session-aware, bar
/// slots the calendar marks as closed are skipped, so the series has no
/// missing data until bars are dropped on purpose.
#[derive(Debug, Clone)]
pub struct SeriesFixture {
    granularity: Granularity,
    start: DateTime<Utc>,
    bars: usize,
    seed: u64,
    start_cents: i64,
    max_move_cents: i64,
    calendar: Option<Arc<TradingCalendar>>,
    dropped: BTreeSet<usize>,
    duplicated: BTreeSet<usize>,
    overrides: Vec<(usize, [Decimal; 4])>,
    extra: Vec<Candle>,
}

impl SeriesFixture {
    /// 100 session-aware bars from `start`, seed 7, starting at 100.00.
    #[must_use]
    pub fn new(granularity: Granularity, start: DateTime<Utc>) -> Self {
        Self {
            granularity,
            start,
            bars: 100,
            seed: 7,
            start_cents: 10_000,
            max_move_cents: 50,
            calendar: Some(Arc::new(TradingCalendar::default())),
            dropped: BTreeSet::new(),
            duplicated: BTreeSet::new(),
            overrides: Vec::new(),
            extra: Vec::new(),
        }
    }

    /// Number of bars generated before drops and duplicates.
    #[must_use]
    pub const fn bars(mut self, n: usize) -> Self {
        self.bars = n;
        self
    }

    /// Random walk seed.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Opening price in cents.
    #[must_use]
    pub const fn start_cents(mut self, cents: i64) -> Self {
        self.start_cents = cents;
        self
    }

    /// Largest close-to-close move per bar, in cents.
    #[must_use]
    pub const fn max_move_cents(mut self, cents: i64) -> Self {
        self.max_move_cents = cents;
        self
    }

    /// Skip closed slots according to `calendar`.
    #[must_use]
    pub fn calendar(mut self, calendar: Arc<TradingCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Emit one bar per slot, ignoring trading sessions.
    #[must_use]
    pub fn continuous(mut self) -> Self {
        self.calendar = None;
        self
    }

    /// Remove the generated bars in `range`.
    #[must_use]
    pub fn drop_range(mut self, range: Range<usize>) -> Self {
        self.dropped.extend(range);
        self
    }

    /// Repeat the generated bar at `index` with the same timestamp.
    #[must_use]
    pub fn duplicate(mut self, index: usize) -> Self {
        self.duplicated.insert(index);
        self
    }

    /// Replace the prices of the generated bar at `index`.
    #[must_use]
    pub fn with_prices(
        mut self,
        index: usize,
        open: Decimal,
        high: Decimal,
        low: Decimal,
        close: Decimal,
    ) -> Self {
        self.overrides.push((index, [open, high, low, close]));
        self
    }

    /// Add an explicit candle. It is placed by timestamp when the series is
    /// built and may be malformed on purpose.
    #[must_use]
    pub fn insert(mut self, candle: Candle) -> Self {
        self.extra.push(candle);
        self
    }

    /// Generate the bars, followed by any inserted candles.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` if a session-aware walk leaves the
    /// calendar window.
    pub fn build(&self) -> Result<Vec<Candle>, FairGapError> {
        let mut rng = StdRng::seed_from_u64(self.seed);
        let step = self.granularity.step();
        let mut slot = self.start;
        let mut close = self.start_cents;
        let mut out = Vec::with_capacity(self.bars + self.duplicated.len() + self.extra.len());

        for index in 0..self.bars {
            slot = self.next_open_slot(slot)?;
            let open = close;
            let mv = rng.random_range(-self.max_move_cents..=self.max_move_cents);
            close = (open + mv).max(1);
            let up = rng.random_range(0..=self.max_move_cents / 2);
            let down = rng.random_range(0..=self.max_move_cents / 2);
            let high = open.max(close) + up;
            let low = (open.min(close) - down).max(1);
            let mut candle = Candle::new(
                slot,
                Decimal::new(open, 2),
                Decimal::new(high, 2),
                Decimal::new(low, 2),
                Decimal::new(close, 2),
            )
            .with_volume(rng.random_range(100..10_000));

            if let Some((_, [o, h, l, c])) = self.overrides.iter().rev().find(|(i, _)| *i == index) {
                candle.open = *o;
                candle.high = *h;
                candle.low = *l;
                candle.close = *c;
            }
            if !self.dropped.contains(&index) {
                if self.duplicated.contains(&index) {
                    out.push(candle.clone());
                }
                out.push(candle);
            }
            slot += step;
        }
        out.extend(self.extra.iter().cloned());
        Ok(out)
    }

    /// Generate the bars and wrap them in a validated series.
    ///
    /// # Errors
    /// See [`SeriesFixture::build`].
    pub fn build_series(&self) -> Result<CandleSeries, FairGapError> {
        Ok(CandleSeries::new(self.granularity, self.build()?))
    }

    fn next_open_slot(&self, mut slot: DateTime<Utc>) -> Result<DateTime<Utc>, FairGapError> {
        let Some(cal) = &self.calendar else {
            return Ok(slot);
        };
        loop {
            let open = if self.granularity.is_daily() {
                cal.is_trading_day(slot.date_naive())?
            } else {
                cal.is_in_session(slot)?
            };
            if open {
                return Ok(slot);
            }
            slot += self.granularity.step();
        }
    }
}
