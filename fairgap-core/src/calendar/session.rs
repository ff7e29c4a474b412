//! Weekly session template and gap classification.
//!
//! Intraday instants are judged in the exchange time zone. Daily bars are
//! judged by their UTC calendar date: a date is in session iff it is a
//! weekday and not a holiday.

use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveTime, TimeDelta, TimeZone, Utc, Weekday};
use fairgap_types::{ClosureReason, DayStatus, FairGapError, GapKind, Granularity};

use super::TradingCalendar;

/// Classification of one abnormal step between consecutive bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GapVerdict {
    /// Closure, missing data or duplicate.
    pub kind: GapKind,
    /// In-session slots strictly between the two bars; zero unless
    /// `kind == DataMissing`.
    pub missing_bars: u64,
}

// Days scanned forward when looking for the next open; covers a long weekend
// next to a holiday with room to spare.
const NEXT_OPEN_HORIZON_DAYS: u64 = 14;

impl TradingCalendar {
    fn local_parts(&self, instant: DateTime<Utc>) -> (NaiveDate, NaiveTime) {
        let local = instant.with_timezone(&self.config.timezone);
        (local.date_naive(), local.time())
    }

    fn closure_at_local(
        &self,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<Option<ClosureReason>, FairGapError> {
        self.check_range(date)?;
        let cfg = &self.config;
        if time >= cfg.daily_open {
            // The evening opens the session of the next date.
            let next = date.succ_opt().ok_or_else(|| {
                FairGapError::calendar_range(date, cfg.first_year, cfg.last_year)
            })?;
            return Ok(match self.status_of(next) {
                DayStatus::Holiday(h) => Some(ClosureReason::Holiday(h)),
                DayStatus::Weekend => Some(ClosureReason::Weekend),
                _ => None,
            });
        }
        let reason = match self.status_of(date) {
            DayStatus::Holiday(h) => Some(ClosureReason::Holiday(h)),
            DayStatus::Weekend => Some(ClosureReason::Weekend),
            status => {
                let early = status == DayStatus::EarlyClose;
                let close = if early { cfg.early_close } else { cfg.daily_close };
                if time < close {
                    None
                } else if date.weekday() == Weekday::Fri {
                    Some(ClosureReason::Weekend)
                } else if early {
                    Some(ClosureReason::EarlyClose)
                } else {
                    Some(ClosureReason::DailyClose)
                }
            }
        };
        Ok(reason)
    }

    /// Why the market is closed at `instant`, or `None` while it trades.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn closure_reason_at(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<Option<ClosureReason>, FairGapError> {
        let (date, time) = self.local_parts(instant);
        self.closure_at_local(date, time)
    }

    /// Whether the market trades at `instant`.
    ///
    /// The session of trading date `D` runs from the daily open on the
    /// evening before `D` to the close on `D` (the early-close time on
    /// early-close days). Dates that are weekends or holidays have no
    /// session, so a Monday holiday keeps the market shut from the Friday
    /// close until the holiday evening.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn is_in_session(&self, instant: DateTime<Utc>) -> Result<bool, FairGapError> {
        Ok(self.closure_reason_at(instant)?.is_none())
    }

    /// Trading date of the session containing `instant`, or `None` while
    /// closed. Sessions opening in the evening belong to the next date.
    ///
    /// Two in-session instants with the same trading date have no closure
    /// between them.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn session_date(&self, instant: DateTime<Utc>) -> Result<Option<NaiveDate>, FairGapError> {
        let (date, time) = self.local_parts(instant);
        if self.closure_at_local(date, time)?.is_some() {
            return Ok(None);
        }
        if time >= self.config.daily_open {
            return Ok(date.succ_opt());
        }
        Ok(Some(date))
    }

    /// Check that every slot between `first` and `last` lies inside the
    /// configured years, so a scan over that span cannot fail half-way.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` for the first endpoint out of range.
    pub fn check_span(
        &self,
        first: DateTime<Utc>,
        last: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<(), FairGapError> {
        for instant in [first, last] {
            let date = if granularity.is_daily() {
                instant.date_naive()
            } else {
                self.local_parts(instant).0
            };
            self.check_range(date)?;
        }
        Ok(())
    }

    /// Closure reason for one bar slot at `granularity`.
    fn slot_closure(
        &self,
        slot: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Option<ClosureReason>, FairGapError> {
        if !granularity.is_daily() {
            return self.closure_reason_at(slot);
        }
        Ok(match self.day_status(slot.date_naive())? {
            DayStatus::Holiday(h) => Some(ClosureReason::Holiday(h)),
            DayStatus::Weekend => Some(ClosureReason::Weekend),
            _ => None,
        })
    }

    /// Classify the step from a bar at `start` to the next bar at `end`.
    ///
    /// Returns `None` for a regular step (`0 < Δt <= interval`). Equal
    /// timestamps are a duplicate. Otherwise the slots strictly between the
    /// two bars decide: any in-session slot makes the gap `DataMissing`
    /// counting only in-session slots; if every slot is closed the gap is a
    /// closure whose reason is the highest-precedence reason among them.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `end < start`, or `CalendarRangeExceeded` if
    /// a slot falls outside the configured years.
    pub fn classify_gap(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
    ) -> Result<Option<GapVerdict>, FairGapError> {
        let delta = end - start;
        if delta < TimeDelta::zero() {
            return Err(FairGapError::invalid_arg(format!(
                "gap end {end} precedes start {start}"
            )));
        }
        if delta == TimeDelta::zero() {
            return Ok(Some(GapVerdict {
                kind: GapKind::DuplicateTimestamp,
                missing_bars: 0,
            }));
        }
        let step = granularity.step();
        if delta <= step {
            return Ok(None);
        }

        let mut missing = 0u64;
        let mut reason: Option<ClosureReason> = None;
        let mut slot = start + step;
        while slot < end {
            match self.slot_closure(slot, granularity)? {
                None => missing += 1,
                Some(r) => reason = Some(reason.map_or(r, |cur| cur.min(r))),
            }
            slot += step;
        }

        if missing > 0 {
            return Ok(Some(GapVerdict {
                kind: GapKind::DataMissing,
                missing_bars: missing,
            }));
        }
        Ok(reason.map(|r| GapVerdict {
            kind: GapKind::TradingClosure(r),
            missing_bars: 0,
        }))
    }

    /// In-session bar slots `start + k * interval < end` for `k >= 0`.
    ///
    /// # Errors
    /// Returns `UnsupportedGranularity` for an unknown interval, or
    /// `CalendarRangeExceeded` if a slot falls outside the configured years.
    pub fn expected_bar_count(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        interval_minutes: u32,
    ) -> Result<u64, FairGapError> {
        let granularity = Granularity::from_minutes(interval_minutes)?;
        let step = granularity.step();
        let mut count = 0u64;
        let mut slot = start;
        while slot < end {
            if self.slot_closure(slot, granularity)?.is_none() {
                count += 1;
            }
            slot += step;
        }
        Ok(count)
    }

    /// First instant at or after `instant` when the market trades.
    ///
    /// Returns `instant` itself while in session, and `None` if no session
    /// opens within two weeks.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` when the search leaves the configured
    /// years.
    pub fn next_session_open(
        &self,
        instant: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, FairGapError> {
        if self.is_in_session(instant)? {
            return Ok(Some(instant));
        }
        let tz = self.config.timezone;
        let (date, _) = self.local_parts(instant);
        for offset in 0..=NEXT_OPEN_HORIZON_DAYS {
            let Some(day) = date.checked_add_days(Days::new(offset)) else {
                break;
            };
            for t in [NaiveTime::MIN, self.config.daily_open] {
                let Some(local) = tz.from_local_datetime(&day.and_time(t)).earliest() else {
                    continue;
                };
                let candidate = local.with_timezone(&Utc);
                if candidate > instant && self.is_in_session(candidate)? {
                    return Ok(Some(candidate));
                }
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fairgap_types::Holiday;

    // February 2024 is on EST (UTC-5).
    fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    #[test]
    fn weekly_template() {
        let cal = TradingCalendar::default();
        // Tue 2024-02-06 10:00 ET
        assert!(cal.is_in_session(utc(2024, 2, 6, 15, 0)).unwrap());
        // Tue 17:30 ET
        assert_eq!(
            cal.closure_reason_at(utc(2024, 2, 6, 22, 30)).unwrap(),
            Some(ClosureReason::DailyClose)
        );
        // Tue 18:00 ET reopens
        assert!(cal.is_in_session(utc(2024, 2, 6, 23, 0)).unwrap());
        // Fri 17:00 ET closes for the weekend
        assert_eq!(
            cal.closure_reason_at(utc(2024, 2, 9, 22, 0)).unwrap(),
            Some(ClosureReason::Weekend)
        );
        // Sat noon
        assert!(!cal.is_in_session(utc(2024, 2, 10, 17, 0)).unwrap());
        // Sun 17:59 ET closed, 18:00 ET open
        assert!(!cal.is_in_session(utc(2024, 2, 11, 22, 59)).unwrap());
        assert!(cal.is_in_session(utc(2024, 2, 11, 23, 0)).unwrap());
    }

    #[test]
    fn holidays_and_early_closes() {
        let cal = TradingCalendar::default();
        // Presidents' Day, Mon 2024-02-19, noon ET
        assert_eq!(
            cal.closure_reason_at(utc(2024, 2, 19, 17, 0)).unwrap(),
            Some(ClosureReason::Holiday(Holiday::Presidents))
        );
        // Tue 2024-12-24 12:59 ET open, 13:00 ET closed, evening still closed
        assert!(cal.is_in_session(utc(2024, 12, 24, 17, 59)).unwrap());
        assert_eq!(
            cal.closure_reason_at(utc(2024, 12, 24, 18, 0)).unwrap(),
            Some(ClosureReason::EarlyClose)
        );
        assert!(!cal.is_in_session(utc(2024, 12, 25, 0, 0)).unwrap());
    }

    #[test]
    fn session_dates() {
        let cal = TradingCalendar::default();
        let tue = NaiveDate::from_ymd_opt(2024, 2, 6).unwrap();
        let wed = NaiveDate::from_ymd_opt(2024, 2, 7).unwrap();
        assert_eq!(cal.session_date(utc(2024, 2, 6, 15, 0)).unwrap(), Some(tue));
        assert_eq!(cal.session_date(utc(2024, 2, 7, 0, 0)).unwrap(), Some(wed));
        assert_eq!(cal.session_date(utc(2024, 2, 6, 22, 30)).unwrap(), None);
    }

    #[test]
    fn weekend_gap_is_closure() {
        let cal = TradingCalendar::default();
        // Fri 16:45 ET -> Sun 18:00 ET at M15
        let v = cal
            .classify_gap(utc(2024, 2, 9, 21, 45), utc(2024, 2, 11, 23, 0), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(v.kind, GapKind::TradingClosure(ClosureReason::Weekend));
        assert_eq!(v.missing_bars, 0);
    }

    #[test]
    fn daily_break_is_closure() {
        let cal = TradingCalendar::default();
        let v = cal
            .classify_gap(utc(2024, 2, 6, 21, 45), utc(2024, 2, 6, 23, 0), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(v.kind, GapKind::TradingClosure(ClosureReason::DailyClose));
    }

    #[test]
    fn in_session_gap_counts_missing_slots() {
        let cal = TradingCalendar::default();
        let v = cal
            .classify_gap(utc(2024, 2, 6, 15, 0), utc(2024, 2, 6, 16, 0), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(v.kind, GapKind::DataMissing);
        assert_eq!(v.missing_bars, 3);
    }

    #[test]
    fn straddling_gap_counts_only_open_slots() {
        let cal = TradingCalendar::default();
        // Tue 16:00 ET -> 18:30 ET: 16:15..16:45 and 18:00..18:15 are open.
        let v = cal
            .classify_gap(utc(2024, 2, 6, 21, 0), utc(2024, 2, 6, 23, 30), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(v.kind, GapKind::DataMissing);
        assert_eq!(v.missing_bars, 5);
    }

    #[test]
    fn holiday_outranks_early_close() {
        let cal = TradingCalendar::default();
        // Tue 2024-12-24 12:45 ET -> Wed 2024-12-25 18:00 ET
        let v = cal
            .classify_gap(utc(2024, 12, 24, 17, 45), utc(2024, 12, 25, 23, 0), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(
            v.kind,
            GapKind::TradingClosure(ClosureReason::Holiday(Holiday::Christmas))
        );
    }

    #[test]
    fn holiday_closes_its_trading_session() {
        let cal = TradingCalendar::default();
        let presidents = ClosureReason::Holiday(Holiday::Presidents);
        // Sun 2024-02-18 18:00 ET would open Monday's session.
        assert_eq!(cal.closure_reason_at(utc(2024, 2, 18, 23, 0)).unwrap(), Some(presidents));
        assert_eq!(cal.session_date(utc(2024, 2, 18, 23, 0)).unwrap(), None);
        // Sun 17:00 ET is still the weekend.
        assert_eq!(
            cal.closure_reason_at(utc(2024, 2, 18, 22, 0)).unwrap(),
            Some(ClosureReason::Weekend)
        );
        assert_eq!(cal.closure_reason_at(utc(2024, 2, 19, 17, 0)).unwrap(), Some(presidents));
        // Mon 18:00 ET opens Tuesday's session.
        assert!(cal.is_in_session(utc(2024, 2, 19, 23, 0)).unwrap());
        assert_eq!(
            cal.session_date(utc(2024, 2, 19, 23, 0)).unwrap(),
            chrono::NaiveDate::from_ymd_opt(2024, 2, 20)
        );

        // Fri 16:45 ET -> Mon 18:00 ET spans the weekend and the holiday only.
        let v = cal
            .classify_gap(utc(2024, 2, 16, 21, 45), utc(2024, 2, 19, 23, 0), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(v.kind, GapKind::TradingClosure(presidents));
        assert_eq!(v.missing_bars, 0);
    }

    #[test]
    fn christmas_eve_evening_is_closed() {
        let cal = TradingCalendar::default();
        let christmas = ClosureReason::Holiday(Holiday::Christmas);
        assert!(cal.is_in_session(utc(2024, 12, 24, 17, 45)).unwrap());
        assert_eq!(
            cal.closure_reason_at(utc(2024, 12, 24, 18, 0)).unwrap(),
            Some(ClosureReason::EarlyClose)
        );
        // Tue 18:00 ET belongs to Christmas Day.
        assert_eq!(cal.closure_reason_at(utc(2024, 12, 24, 23, 0)).unwrap(), Some(christmas));
        assert!(cal.is_in_session(utc(2024, 12, 25, 23, 0)).unwrap());
        // Reopening one bar late is missing data, not a closure.
        let v = cal
            .classify_gap(utc(2024, 12, 24, 17, 45), utc(2024, 12, 25, 23, 15), Granularity::M15)
            .unwrap()
            .unwrap();
        assert_eq!(v.kind, GapKind::DataMissing);
        assert_eq!(v.missing_bars, 1);
    }

    #[test]
    fn regular_step_and_duplicates() {
        let cal = TradingCalendar::default();
        let t = utc(2024, 2, 6, 15, 0);
        assert_eq!(cal.classify_gap(t, t + TimeDelta::minutes(15), Granularity::M15).unwrap(), None);
        assert_eq!(
            cal.classify_gap(t, t, Granularity::M15).unwrap().unwrap().kind,
            GapKind::DuplicateTimestamp
        );
        assert!(cal.classify_gap(t, t - TimeDelta::minutes(1), Granularity::M15).is_err());
    }

    #[test]
    fn daily_bars_use_trading_days() {
        let cal = TradingCalendar::default();
        let weekend = cal
            .classify_gap(utc(2024, 2, 9, 0, 0), utc(2024, 2, 12, 0, 0), Granularity::D1)
            .unwrap()
            .unwrap();
        assert_eq!(weekend.kind, GapKind::TradingClosure(ClosureReason::Weekend));

        let long_weekend = cal
            .classify_gap(utc(2024, 2, 16, 0, 0), utc(2024, 2, 20, 0, 0), Granularity::D1)
            .unwrap()
            .unwrap();
        assert_eq!(
            long_weekend.kind,
            GapKind::TradingClosure(ClosureReason::Holiday(Holiday::Presidents))
        );

        let missing = cal
            .classify_gap(utc(2024, 2, 2, 0, 0), utc(2024, 2, 7, 0, 0), Granularity::D1)
            .unwrap()
            .unwrap();
        assert_eq!(missing.kind, GapKind::DataMissing);
        assert_eq!(missing.missing_bars, 2);
    }

    #[test]
    fn expected_bar_count_over_a_week() {
        let cal = TradingCalendar::default();
        // Sun 2024-02-04 18:00 ET .. Fri 2024-02-09 17:00 ET at H1:
        // 23 hourly slots per full day, four daily breaks removed.
        let n = cal
            .expected_bar_count(utc(2024, 2, 4, 23, 0), utc(2024, 2, 9, 22, 0), 60)
            .unwrap();
        assert_eq!(n, 5 * 23);
        assert!(matches!(
            cal.expected_bar_count(utc(2024, 2, 4, 23, 0), utc(2024, 2, 9, 22, 0), 30),
            Err(FairGapError::UnsupportedGranularity { minutes: 30 })
        ));
    }

    #[test]
    fn next_open_after_closures() {
        let cal = TradingCalendar::default();
        // Saturday -> Sunday 18:00 ET
        assert_eq!(
            cal.next_session_open(utc(2024, 2, 10, 17, 0)).unwrap(),
            Some(utc(2024, 2, 11, 23, 0))
        );
        // Holiday Monday noon -> Monday 18:00 ET, Tuesday's session
        assert_eq!(
            cal.next_session_open(utc(2024, 2, 19, 17, 0)).unwrap(),
            Some(utc(2024, 2, 19, 23, 0))
        );
        // Sunday afternoon before the holiday skips to the holiday evening
        assert_eq!(
            cal.next_session_open(utc(2024, 2, 18, 20, 0)).unwrap(),
            Some(utc(2024, 2, 19, 23, 0))
        );
        // Daily break -> 18:00 ET
        assert_eq!(
            cal.next_session_open(utc(2024, 2, 6, 22, 30)).unwrap(),
            Some(utc(2024, 2, 6, 23, 0))
        );
        let open = utc(2024, 2, 6, 15, 0);
        assert_eq!(cal.next_session_open(open).unwrap(), Some(open));
    }
}
