//! Holiday rules: fixed dates rolled off weekends, nth-weekday floaters and
//! Good Friday from the Gregorian Easter computus.

use chrono::{Datelike, Days, NaiveDate, Weekday};
use fairgap_types::Holiday;

/// Easter Sunday for `year` (anonymous Gregorian algorithm).
#[must_use]
pub fn easter_sunday(year: i32) -> Option<NaiveDate> {
    let a = year.rem_euclid(19);
    let b = year.div_euclid(100);
    let c = year.rem_euclid(100);
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, u32::try_from(month).ok()?, u32::try_from(day).ok()?)
}

/// The `n`th (1-based) `weekday` of `month`.
#[must_use]
pub fn nth_weekday(year: i32, month: u32, weekday: Weekday, n: u8) -> Option<NaiveDate> {
    NaiveDate::from_weekday_of_month_opt(year, month, weekday, n)
}

/// The last `weekday` of `month`.
#[must_use]
pub fn last_weekday(year: i32, month: u32, weekday: Weekday) -> Option<NaiveDate> {
    let next_month = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };
    let last = next_month.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    last.checked_sub_days(Days::new(u64::from(back)))
}

/// Roll a fixed-date holiday forward to the following Monday when it falls on
/// a weekend.
#[must_use]
pub fn observed(date: NaiveDate) -> Option<NaiveDate> {
    match date.weekday() {
        Weekday::Sat => date.checked_add_days(Days::new(2)),
        Weekday::Sun => date.checked_add_days(Days::new(1)),
        _ => Some(date),
    }
}

/// Every full-day holiday observed in `year`.
#[must_use]
pub fn holidays_in_year(year: i32) -> Vec<(NaiveDate, Holiday)> {
    let fixed = |month, day| NaiveDate::from_ymd_opt(year, month, day).and_then(observed);
    let candidates = [
        (fixed(1, 1), Holiday::NewYear),
        (
            nth_weekday(year, 1, Weekday::Mon, 3),
            Holiday::MartinLutherKing,
        ),
        (nth_weekday(year, 2, Weekday::Mon, 3), Holiday::Presidents),
        (
            easter_sunday(year).and_then(|e| e.checked_sub_days(Days::new(2))),
            Holiday::GoodFriday,
        ),
        (last_weekday(year, 5, Weekday::Mon), Holiday::Memorial),
        (fixed(7, 4), Holiday::Independence),
        (nth_weekday(year, 9, Weekday::Mon, 1), Holiday::Labor),
        (nth_weekday(year, 11, Weekday::Thu, 4), Holiday::Thanksgiving),
        (fixed(12, 25), Holiday::Christmas),
    ];
    candidates
        .into_iter()
        .filter_map(|(date, h)| date.map(|d| (d, h)))
        .collect()
}

/// Shortened sessions in `year`: the day after Thanksgiving, Christmas Eve and
/// New Year's Eve, when they fall on a weekday that is not itself a holiday.
#[must_use]
pub fn early_closes_in_year(year: i32, holidays: &[(NaiveDate, Holiday)]) -> Vec<NaiveDate> {
    let black_friday = nth_weekday(year, 11, Weekday::Thu, 4)
        .and_then(|t| t.checked_add_days(Days::new(1)));
    [
        black_friday,
        NaiveDate::from_ymd_opt(year, 12, 24),
        NaiveDate::from_ymd_opt(year, 12, 31),
    ]
    .into_iter()
    .flatten()
    .filter(|d| !matches!(d.weekday(), Weekday::Sat | Weekday::Sun))
    .filter(|d| !holidays.iter().any(|(h, _)| h == d))
    .collect()
}
