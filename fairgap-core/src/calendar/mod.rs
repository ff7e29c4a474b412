//! Exchange trading calendar.
//!
//! The holiday table for the configured year window is computed once at
//! construction. After that the calendar is read-only, so one instance can be
//! shared through an `Arc` by any number of concurrent analyses.
//!
//! Date queries (`is_holiday`, `day_status`, ...) take exchange-local dates.
//! Instant queries (`is_in_session`, `classify_gap`, ...) live in `session`.

/// Holiday and early-close rules.
pub mod holidays;
mod session;

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate, Weekday};
use fairgap_types::{CalendarConfig, DayStatus, FairGapError, Holiday};

pub use session::GapVerdict;

/// Immutable holiday and session oracle.
#[derive(Debug, Clone)]
pub struct TradingCalendar {
    config: CalendarConfig,
    holidays: BTreeMap<NaiveDate, Holiday>,
    early_closes: BTreeSet<NaiveDate>,
}

impl TradingCalendar {
    /// Build the holiday table for `config.first_year..=config.last_year`.
    ///
    /// # Errors
    /// Returns `InvalidArg` if the configuration does not validate.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap_core::calendar::new",
            skip(config),
            fields(first_year = config.first_year, last_year = config.last_year),
        )
    )]
    pub fn new(config: CalendarConfig) -> Result<Self, FairGapError> {
        config.validate()?;
        let cal = Self::build(config);
        #[cfg(feature = "tracing")]
        tracing::debug!(
            holidays = cal.holidays.len(),
            early_closes = cal.early_closes.len(),
            "trading calendar built"
        );
        Ok(cal)
    }

    fn build(config: CalendarConfig) -> Self {
        let mut holidays = BTreeMap::new();
        let mut early_closes = BTreeSet::new();
        for year in config.first_year..=config.last_year {
            let hs = holidays::holidays_in_year(year);
            early_closes.extend(holidays::early_closes_in_year(year, &hs));
            holidays.extend(hs);
        }
        Self {
            config,
            holidays,
            early_closes,
        }
    }

    /// Configuration the calendar was built from.
    #[must_use]
    pub const fn config(&self) -> &CalendarConfig {
        &self.config
    }

    pub(crate) fn check_range(&self, date: NaiveDate) -> Result<(), FairGapError> {
        let year = date.year();
        if year < self.config.first_year || year > self.config.last_year {
            return Err(FairGapError::calendar_range(
                date,
                self.config.first_year,
                self.config.last_year,
            ));
        }
        Ok(())
    }

    /// Whether `date` is a full-day holiday.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn is_holiday(&self, date: NaiveDate) -> Result<bool, FairGapError> {
        Ok(self.holiday_name(date)?.is_some())
    }

    /// The holiday observed on `date`, if any.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn holiday_name(&self, date: NaiveDate) -> Result<Option<Holiday>, FairGapError> {
        self.check_range(date)?;
        Ok(self.holidays.get(&date).copied())
    }

    /// Whether the session on `date` ends at the early-close time.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn is_early_close_day(&self, date: NaiveDate) -> Result<bool, FairGapError> {
        self.check_range(date)?;
        Ok(self.early_closes.contains(&date))
    }

    /// Trading status of `date`.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn day_status(&self, date: NaiveDate) -> Result<DayStatus, FairGapError> {
        self.check_range(date)?;
        Ok(self.status_of(date))
    }

    /// Day status without the window check. Dates past the window read as
    /// having no holidays.
    pub(crate) fn status_of(&self, date: NaiveDate) -> DayStatus {
        if let Some(h) = self.holidays.get(&date) {
            return DayStatus::Holiday(*h);
        }
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return DayStatus::Weekend;
        }
        if self.early_closes.contains(&date) {
            return DayStatus::EarlyClose;
        }
        DayStatus::Regular
    }

    /// Weekday that is not a holiday.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` outside the configured years.
    pub fn is_trading_day(&self, date: NaiveDate) -> Result<bool, FairGapError> {
        Ok(self.day_status(date)?.is_trading_day())
    }

    /// Holidays observed between `from` and `to` inclusive. An inverted
    /// range yields nothing.
    ///
    /// # Errors
    /// Returns `CalendarRangeExceeded` if either end lies outside the
    /// configured years.
    pub fn holidays_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<impl Iterator<Item = (NaiveDate, Holiday)> + '_, FairGapError> {
        self.check_range(from)?;
        self.check_range(to)?;
        let hits = (from <= to).then(|| self.holidays.range(from..=to)).into_iter().flatten();
        Ok(hits.map(|(d, h)| (*d, *h)))
    }
}

impl Default for TradingCalendar {
    fn default() -> Self {
        Self::build(CalendarConfig::default())
    }
}
