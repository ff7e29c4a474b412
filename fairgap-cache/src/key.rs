use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use fairgap_core::{CalendarConfig, CandleSeries, FvgConfig, Granularity};

/// Identity of one cached report: the series content plus every parameter
/// that can change the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ReportKey {
    fingerprint: u64,
    granularity: Granularity,
    params: u64,
}

impl ReportKey {
    /// Key for an FVG report over `series` under `config`.
    #[must_use]
    pub fn fvg(series: &CandleSeries, config: &FvgConfig) -> Self {
        let mut h = DefaultHasher::new();
        config.max_age_bars.hash(&mut h);
        config.overlap_threshold.to_bits().hash(&mut h);
        config.rules.hash(&mut h);
        std::mem::discriminant(&config.fill_mode).hash(&mut h);
        Self::new(series, h.finish())
    }

    /// Key for a continuity report over `series` at `interval_minutes`
    /// against a calendar built from `calendar`.
    ///
    /// The scan strategy is not part of the key: every strategy produces the
    /// same report.
    #[must_use]
    pub fn continuity(
        series: &CandleSeries,
        interval_minutes: u32,
        calendar: &CalendarConfig,
    ) -> Self {
        let mut h = DefaultHasher::new();
        interval_minutes.hash(&mut h);
        calendar.first_year.hash(&mut h);
        calendar.last_year.hash(&mut h);
        calendar.timezone.hash(&mut h);
        calendar.daily_close.hash(&mut h);
        calendar.daily_open.hash(&mut h);
        calendar.early_close.hash(&mut h);
        Self::new(series, h.finish())
    }

    fn new(series: &CandleSeries, params: u64) -> Self {
        Self {
            fingerprint: series.fingerprint(),
            granularity: series.granularity(),
            params,
        }
    }

    /// Content fingerprint of the keyed series.
    #[must_use]
    pub const fn fingerprint(&self) -> u64 {
        self.fingerprint
    }
}
