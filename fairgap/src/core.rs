use std::sync::Arc;

use fairgap_cache::{ReportCache, ReportKey};
use fairgap_core::{
    CacheConfig, CalendarConfig, Candle, CandleSeries, ContinuityAnalyzer, ContinuityConfig,
    ContinuityReport, FairGapError, FillMode, FvgConfig, FvgDetector, FvgLifecycleTracker,
    FvgReport, Granularity, RuleSet, ScanStrategy, TradingCalendar, infer_granularity,
};

/// Entry point that runs FVG detection and continuity audits against one
/// shared trading calendar.
///
/// A `FairGap` is immutable after [`FairGapBuilder::build`] and cheap to
/// clone; clones share the calendar, the scan worker pool and the cache.
#[derive(Debug, Clone)]
pub struct FairGap {
    calendar: Arc<TradingCalendar>,
    fvg: FvgConfig,
    detector: FvgDetector,
    tracker: FvgLifecycleTracker,
    analyzer: ContinuityAnalyzer,
    adaptive_strategy: bool,
    cache: Option<ReportCache>,
}

/// Builder for constructing a [`FairGap`] with custom configuration.
#[derive(Debug, Clone, Default)]
pub struct FairGapBuilder {
    calendar_cfg: CalendarConfig,
    calendar: Option<Arc<TradingCalendar>>,
    fvg: FvgConfig,
    continuity: ContinuityConfig,
    adaptive_strategy: bool,
    cache_cfg: Option<CacheConfig>,
    cache: Option<ReportCache>,
}

impl FairGapBuilder {
    /// Create a new builder with the documented defaults.
    ///
    /// Behavior and trade-offs:
    /// - Defaults: three-bar plus single-bar-gap rules, a 40-bar age window,
    ///   0.75 overlap threshold, single-bar fills, batch continuity scans on
    ///   the global rayon pool and a 2000..=2100 New York calendar.
    /// - No cache is attached; every call recomputes.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parameters for the calendar built at [`build`](Self::build).
    ///
    /// Ignored when a prebuilt calendar is supplied with
    /// [`calendar`](Self::calendar).
    #[must_use]
    pub const fn calendar_config(mut self, cfg: CalendarConfig) -> Self {
        self.calendar_cfg = cfg;
        self
    }

    /// Share an already built calendar.
    ///
    /// Behavior and trade-offs:
    /// - Holiday tables are computed once per calendar; sharing one across
    ///   several `FairGap` instances avoids rebuilding them.
    /// - Takes precedence over [`calendar_config`](Self::calendar_config).
    #[must_use]
    pub fn calendar(mut self, calendar: Arc<TradingCalendar>) -> Self {
        self.calendar = Some(calendar);
        self
    }

    /// Replace the whole FVG configuration.
    #[must_use]
    pub const fn fvg_config(mut self, cfg: FvgConfig) -> Self {
        self.fvg = cfg;
        self
    }

    /// Bars after the left bar during which a gap can still be filled.
    #[must_use]
    pub const fn max_age_bars(mut self, bars: usize) -> Self {
        self.fvg.max_age_bars = bars;
        self
    }

    /// Intersection-over-union at or above which two detections merge.
    ///
    /// Behavior and trade-offs:
    /// - Lower values merge more aggressively and report fewer, wider gaps.
    /// - Must lie in `(0, 1]`; checked at [`build`](Self::build).
    #[must_use]
    pub const fn overlap_threshold(mut self, threshold: f64) -> Self {
        self.fvg.overlap_threshold = threshold;
        self
    }

    /// Detection rules.
    #[must_use]
    pub const fn rules(mut self, rules: RuleSet) -> Self {
        self.fvg.rules = rules;
        self
    }

    /// How later bars fill a gap.
    ///
    /// Behavior and trade-offs:
    /// - `Single`: one bar body must cover the whole range.
    /// - `Accumulating`: bodies of several bars may cover it piecewise, so
    ///   gaps fill earlier and more often.
    #[must_use]
    pub const fn fill_mode(mut self, mode: FillMode) -> Self {
        self.fvg.fill_mode = mode;
        self
    }

    /// Replace the whole continuity configuration.
    #[must_use]
    pub const fn continuity_config(mut self, cfg: ContinuityConfig) -> Self {
        self.continuity = cfg;
        self
    }

    /// Fixed scan strategy for continuity audits.
    ///
    /// Every strategy returns the same report; they differ only in speed.
    /// Turns off [`adaptive_strategy`](Self::adaptive_strategy).
    #[must_use]
    pub const fn strategy(mut self, strategy: ScanStrategy) -> Self {
        self.continuity.strategy = strategy;
        self.adaptive_strategy = false;
        self
    }

    /// Choose the scan strategy per call from the series size.
    ///
    /// See [`ScanStrategy::for_size`]. One- and five-minute series count as
    /// high frequency.
    #[must_use]
    pub const fn adaptive_strategy(mut self, yes: bool) -> Self {
        self.adaptive_strategy = yes;
        self
    }

    /// Run partitioned scans on a dedicated pool of `n` threads.
    ///
    /// Behavior and trade-offs:
    /// - Without this, partitioned scans use rayon's global pool.
    /// - The pool lives as long as the `FairGap` and its clones.
    #[must_use]
    pub const fn workers(mut self, n: usize) -> Self {
        self.continuity.workers = Some(n);
        self
    }

    /// Bars per partition for the partitioned scan.
    #[must_use]
    pub const fn chunk_size(mut self, bars: usize) -> Self {
        self.continuity.chunk_size = bars;
        self
    }

    /// Attach a fresh report cache sized by `cfg`.
    #[must_use]
    pub const fn cache_config(mut self, cfg: CacheConfig) -> Self {
        self.cache_cfg = Some(cfg);
        self
    }

    /// Attach an existing cache, shared with whoever else holds it.
    ///
    /// Takes precedence over [`cache_config`](Self::cache_config).
    #[must_use]
    pub fn cache(mut self, cache: ReportCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Build the `FairGap` instance.
    ///
    /// # Errors
    /// - `InvalidArg` if any configuration fails validation.
    /// - `Worker` if a dedicated scan pool cannot be started.
    pub fn build(self) -> Result<FairGap, FairGapError> {
        let calendar = match self.calendar {
            Some(c) => c,
            None => Arc::new(TradingCalendar::new(self.calendar_cfg)?),
        };
        let tracker = FvgLifecycleTracker::new(self.fvg)?;
        let analyzer = ContinuityAnalyzer::new(Arc::clone(&calendar), self.continuity)?;
        let cache = self
            .cache
            .or_else(|| self.cache_cfg.as_ref().map(ReportCache::new));

        #[cfg(feature = "tracing")]
        tracing::debug!(
            strategy = ?self.continuity.strategy,
            adaptive = self.adaptive_strategy,
            cached = cache.is_some(),
            "fairgap built"
        );

        Ok(FairGap {
            calendar,
            fvg: self.fvg,
            detector: FvgDetector::new(self.fvg.rules),
            tracker,
            analyzer,
            adaptive_strategy: self.adaptive_strategy,
            cache,
        })
    }
}

impl FairGap {
    /// Start building a new `FairGap` instance.
    ///
    /// ```rust
    /// use fairgap::{FairGap, FillMode, ScanStrategy};
    ///
    /// let fg = FairGap::builder()
    ///     .max_age_bars(60)
    ///     .fill_mode(FillMode::Accumulating)
    ///     .strategy(ScanStrategy::Partitioned)
    ///     .workers(2)
    ///     .build()?;
    /// # Ok::<(), fairgap::FairGapError>(())
    /// ```
    #[must_use]
    pub fn builder() -> FairGapBuilder {
        FairGapBuilder::new()
    }

    /// Shared trading calendar.
    #[must_use]
    pub fn calendar(&self) -> &Arc<TradingCalendar> {
        &self.calendar
    }

    /// FVG configuration used by [`detect_fvgs`](Self::detect_fvgs).
    #[must_use]
    pub const fn fvg_config(&self) -> &FvgConfig {
        &self.fvg
    }

    /// Continuity configuration.
    #[must_use]
    pub const fn continuity_config(&self) -> &ContinuityConfig {
        self.analyzer.config()
    }

    /// Attached report cache, if any.
    #[must_use]
    pub const fn cache(&self) -> Option<&ReportCache> {
        self.cache.as_ref()
    }

    /// Drop every cached report. No-op without a cache.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    /// Wrap unlabelled candles in a series, inferring the granularity from
    /// their spacing.
    ///
    /// # Errors
    /// - `Data` with fewer than two distinct timestamps.
    /// - `UnsupportedGranularity` if the dominant spacing is not a known
    ///   interval.
    pub fn series_from_candles(&self, candles: Vec<Candle>) -> Result<CandleSeries, FairGapError> {
        let granularity = infer_granularity(&candles)?;
        Ok(CandleSeries::new(granularity, candles))
    }

    /// Detect, deduplicate and track fair value gaps with the configured
    /// options.
    ///
    /// Bars repeating a timestamp are dropped first, keeping the first bar
    /// of each timestamp, so every index in the report refers to the
    /// strictly increasing series.
    ///
    /// # Errors
    /// None with the current detectors: detection and tracking cannot fail
    /// once the facade is built. The signature matches
    /// [`detect_fvgs_with`](Self::detect_fvgs_with).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap::detect_fvgs",
            skip(self, series),
            fields(bars = series.len(), granularity = %series.granularity()),
            err,
        )
    )]
    pub fn detect_fvgs(&self, series: &CandleSeries) -> Result<FvgReport, FairGapError> {
        self.run_fvg(series, &self.fvg, self.detector, self.tracker)
    }

    /// Same as [`detect_fvgs`](Self::detect_fvgs) with one-off options.
    ///
    /// # Errors
    /// Returns `InvalidArg` if `cfg` fails validation.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap::detect_fvgs_with",
            skip(self, series, cfg),
            fields(bars = series.len(), max_age_bars = cfg.max_age_bars),
            err,
        )
    )]
    pub fn detect_fvgs_with(
        &self,
        series: &CandleSeries,
        cfg: &FvgConfig,
    ) -> Result<FvgReport, FairGapError> {
        let tracker = FvgLifecycleTracker::new(*cfg)?;
        self.run_fvg(series, cfg, FvgDetector::new(cfg.rules), tracker)
    }

    fn run_fvg(
        &self,
        series: &CandleSeries,
        cfg: &FvgConfig,
        detector: FvgDetector,
        tracker: FvgLifecycleTracker,
    ) -> Result<FvgReport, FairGapError> {
        let compute = || {
            let strict = series.has_duplicates().then(|| series.dedup());
            let bars = strict.as_ref().unwrap_or(series);
            Ok(tracker.resolve(bars, detector.detect(bars)))
        };
        match &self.cache {
            Some(cache) => cache
                .fvg_report(ReportKey::fvg(series, cfg), compute)
                .map(Arc::unwrap_or_clone),
            None => compute(),
        }
    }

    /// Audit `series`, recorded at `interval_minutes`, against the calendar.
    ///
    /// # Errors
    /// - `UnsupportedGranularity` for an unknown interval.
    /// - `InvalidArg` if the interval disagrees with the series.
    /// - `CalendarRangeExceeded` if the series leaves the calendar window.
    /// - `Worker` if a partitioned scan fails.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "fairgap::analyze_continuity",
            skip(self, series),
            fields(bars = series.len(), interval_minutes = interval_minutes),
            err,
        )
    )]
    pub fn analyze_continuity(
        &self,
        series: &CandleSeries,
        interval_minutes: u32,
    ) -> Result<ContinuityReport, FairGapError> {
        let compute = || self.analyzer_for(series).analyze(series, interval_minutes);
        match &self.cache {
            Some(cache) => cache
                .continuity_report(
                    ReportKey::continuity(series, interval_minutes, self.calendar.config()),
                    compute,
                )
                .map(Arc::unwrap_or_clone),
            None => compute(),
        }
    }

    /// Audit `series` at its own granularity.
    ///
    /// # Errors
    /// See [`analyze_continuity`](Self::analyze_continuity).
    pub fn analyze_series(&self, series: &CandleSeries) -> Result<ContinuityReport, FairGapError> {
        self.analyze_continuity(series, series.granularity().minutes())
    }

    fn analyzer_for(&self, series: &CandleSeries) -> ContinuityAnalyzer {
        if !self.adaptive_strategy {
            return self.analyzer.clone();
        }
        let high_freq = series.granularity() <= Granularity::M5;
        let strategy = ScanStrategy::for_size(series.len(), high_freq);
        #[cfg(feature = "tracing")]
        tracing::debug!(?strategy, "adaptive strategy selected");
        self.analyzer.with_strategy(strategy)
    }
}
