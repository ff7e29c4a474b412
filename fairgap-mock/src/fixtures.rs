//! Hand-built series for the reference detection and continuity cases.
//!
//! Prices are given in tenths so the fixtures stay exact decimals.

use chrono::{DateTime, TimeDelta, Utc};
use fairgap_core::{Candle, CandleSeries, Granularity};
use rust_decimal::Decimal;

/// Tue 2024-02-06 10:00 America/New_York.
pub const TUESDAY_MORNING: i64 = 1_707_231_600;
/// Fri 2024-02-09 16:00 America/New_York, one hour before the weekly close.
pub const FRIDAY_LATE: i64 = 1_707_512_400;
/// Sun 2024-02-11 18:00 America/New_York, the weekly reopen.
pub const SUNDAY_OPEN: i64 = 1_707_692_400;
/// Fri 2024-02-16 16:00 America/New_York, before the Presidents' Day weekend.
pub const HOLIDAY_FRIDAY_LATE: i64 = 1_708_117_200;
/// Mon 2024-02-19 18:00 America/New_York, the reopen after Presidents' Day.
pub const HOLIDAY_EVENING_OPEN: i64 = 1_708_383_600;
/// Tue 2024-12-24 12:00 America/New_York, an hour before the early close.
pub const CHRISTMAS_EVE_NOON: i64 = 1_735_059_600;
/// Wed 2024-12-25 18:00 America/New_York, the reopen after Christmas.
pub const CHRISTMAS_EVENING_OPEN: i64 = 1_735_167_600;

type Tenths = (i64, i64, i64, i64);

const LEFT: Tenths = (100, 120, 90, 110);
const CENTER_IMPULSE: Tenths = (110, 150, 110, 150);
const RIGHT_IMPULSE: Tenths = (160, 170, 160, 165);
const WICK_INTRUDER: Tenths = (155, 165, 154, 164);
const DRIFT: Tenths = (162, 165, 148, 163);
const FLAT: Tenths = (1000, 1010, 990, 1005);

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_default()
}

fn bar(at: DateTime<Utc>, (o, h, l, c): Tenths) -> Candle {
    let d = |v| Decimal::new(v, 1);
    Candle::new(at, d(o), d(h), d(l), d(c)).with_volume(1_000)
}

/// Consecutive M15 bars starting at `start_secs`.
fn m15(start_secs: i64, prices: &[Tenths]) -> Vec<Candle> {
    let t0 = ts(start_secs);
    prices
        .iter()
        .enumerate()
        .map(|(k, p)| bar(t0 + TimeDelta::minutes(15 * k as i64), *p))
        .collect()
}

/// One bull three-bar gap with range `[12, 16]`.
#[must_use]
pub fn bull_three_bar() -> CandleSeries {
    CandleSeries::new(
        Granularity::M15,
        m15(TUESDAY_MORNING, &[LEFT, CENTER_IMPULSE, RIGHT_IMPULSE]),
    )
}

/// One bull single-bar gap `[12, 13]`: the center bar opens above the left
/// high and closes up. The right bar neither forms a three-bar gap nor fills.
#[must_use]
pub fn bull_single_bar_gap() -> CandleSeries {
    CandleSeries::new(
        Granularity::M15,
        m15(TUESDAY_MORNING, &[LEFT, (130, 140, 130, 135), (135, 136, 118, 122)]),
    )
}

/// [`bull_three_bar`] followed by a bar whose wick reaches into the gap while
/// its body `[15.5, 16.4]` does not cover it. The intruding bar's low also opens a
/// small bull three-bar gap `[15, 15.4]` anchored on the center bar.
#[must_use]
pub fn wick_only_intrusion() -> CandleSeries {
    CandleSeries::new(
        Granularity::M15,
        m15(
            TUESDAY_MORNING,
            &[LEFT, CENTER_IMPULSE, RIGHT_IMPULSE, WICK_INTRUDER],
        ),
    )
}

/// [`bull_three_bar`] followed by a bar whose body spans `[11.5, 16.5]`.
#[must_use]
pub fn body_fill() -> CandleSeries {
    CandleSeries::new(
        Granularity::M15,
        m15(
            TUESDAY_MORNING,
            &[LEFT, CENTER_IMPULSE, RIGHT_IMPULSE, (165, 168, 110, 115)],
        ),
    )
}

/// [`bull_three_bar`] followed by `drift_bars` bars that never cover the gap.
/// With 40 or more drift bars the gap ages out at index 40.
#[must_use]
pub fn unfilled_drift(drift_bars: usize) -> CandleSeries {
    let mut prices = vec![LEFT, CENTER_IMPULSE, RIGHT_IMPULSE];
    prices.extend(std::iter::repeat_n(DRIFT, drift_bars));
    CandleSeries::new(Granularity::M15, m15(TUESDAY_MORNING, &prices))
}

/// Four M15 bars up to the Friday close, then four from the Sunday reopen.
#[must_use]
pub fn weekend_break() -> CandleSeries {
    let mut bars = m15(FRIDAY_LATE, &[FLAT; 4]);
    bars.extend(m15(SUNDAY_OPEN, &[FLAT; 4]));
    CandleSeries::new(Granularity::M15, bars)
}

/// Four M15 bars up to the Friday close before Presidents' Day, then four
/// from the Monday evening reopen. The step is at index 3.
#[must_use]
pub fn holiday_weekend() -> CandleSeries {
    let mut bars = m15(HOLIDAY_FRIDAY_LATE, &[FLAT; 4]);
    bars.extend(m15(HOLIDAY_EVENING_OPEN, &[FLAT; 4]));
    CandleSeries::new(Granularity::M15, bars)
}

/// Four M15 bars up to the Christmas Eve early close, then four from the
/// Christmas evening reopen. The step is at index 3.
#[must_use]
pub fn christmas_break() -> CandleSeries {
    let mut bars = m15(CHRISTMAS_EVE_NOON, &[FLAT; 4]);
    bars.extend(m15(CHRISTMAS_EVENING_OPEN, &[FLAT; 4]));
    CandleSeries::new(Granularity::M15, bars)
}

/// Four M15 bars, a two-hour hole in the Tuesday session, then four more.
/// The hole is seven missing bars.
#[must_use]
pub fn session_hole() -> CandleSeries {
    let mut bars = m15(TUESDAY_MORNING, &[FLAT; 4]);
    bars.extend(m15(TUESDAY_MORNING + 9_900, &[FLAT; 4]));
    CandleSeries::new(Granularity::M15, bars)
}

/// [`session_hole`] with its first bar repeated.
#[must_use]
pub fn with_duplicate() -> CandleSeries {
    let mut bars = session_hole().as_slice().to_vec();
    bars.insert(1, bars[0].clone());
    CandleSeries::new(Granularity::M15, bars)
}
